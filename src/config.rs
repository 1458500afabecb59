// config.rs - configuration
//
// irc-state - IRC client state model
// Copyright (C) 2022  Mateusz Szpakowski
//
// This library is free software; you can redistribute it and/or
// modify it under the terms of the GNU Lesser General Public
// License as published by the Free Software Foundation; either
// version 2.1 of the License, or (at your option) any later version.
//
// This library is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public
// License along with this library; if not, write to the Free Software
// Foundation, Inc., 51 Franklin Street, Fifth Floor, Boston, MA  02110-1301  USA

use std::error::Error;
use std::fs::File;
use std::io::{self, Read};
use clap;
use toml;
use serde_derive::Deserialize;
use validator::{Validate, ValidationError};

use crate::casemap;

pub const DEFAULT_CONFIG_PATH: &str = "irc-state.toml";

#[derive(clap::Parser, Clone, Debug, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    #[clap(short, long, help="Configuration file path")]
    pub config: Option<String>,
    #[clap(short, long, help="RPL_MYINFO line")]
    pub myinfo: Option<String>,
    #[clap(short, long, help="RPL_ISUPPORT line", multiple_occurrences = true)]
    pub isupport: Vec<String>,
    #[clap(short, long, help="Join channel", multiple_occurrences = true)]
    pub join: Vec<String>,
    #[clap(short, long, help="Add user netmask", multiple_occurrences = true)]
    pub user: Vec<String>,
    #[clap(short, long, help="Find users matching netmask")]
    pub find: Option<String>,
    #[clap(short, long, help="Debug logging")]
    pub verbose: bool,
}

pub(crate) fn validate_casemap_name(name: &str) -> Result<(), ValidationError> {
    if !name.is_empty() && name.chars().all(|c| c.is_ascii_graphic()) {
        Ok(())
    } else {
        Err(ValidationError::new("Casemap name must be non-empty and without spaces."))
    }
}

pub(crate) fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    match level {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ValidationError::new("Log level must be one of trace, debug, info, \
                warn and error.")),
    }
}

pub(crate) fn validate_chantypes(chantypes: &str) -> Result<(), ValidationError> {
    if chantypes.chars().all(|c| c.is_ascii_graphic() && c != ',') {
        Ok(())
    } else {
        Err(ValidationError::new("Channel types must not contain spaces or ','."))
    }
}

/// Extra casemap, sets in `tr` range notation like `A-Z`.
#[derive(PartialEq, Eq, Deserialize, Debug, Validate, Clone)]
pub struct CasemapConfig {
    #[validate(custom = "validate_casemap_name")]
    pub name: String,
    #[validate(length(min = 1))]
    pub upper: String,
    #[validate(length(min = 1))]
    pub lower: String,
}

/// Values used before the server tells otherwise.
#[derive(PartialEq, Eq, Deserialize, Debug, Validate, Clone, Default)]
pub struct SupportsConfig {
    #[validate(range(min = 1))]
    pub nicklen: Option<u32>,
    #[validate(range(min = 1))]
    pub channellen: Option<u32>,
    #[validate(custom = "validate_chantypes")]
    pub chantypes: Option<String>,
    #[validate(custom = "validate_casemap_name")]
    pub casemapping: Option<String>,
}

/// Main configuration structure.
#[derive(PartialEq, Eq, Deserialize, Debug, Validate, Clone)]
#[serde(default)]
pub struct Config {
    #[validate(custom = "validate_casemap_name")]
    pub default_casemap: String,
    pub strict: bool,
    #[validate(custom = "validate_log_level")]
    pub log_level: String,
    #[validate]
    pub casemaps: Option<Vec<CasemapConfig>>,
    #[validate]
    pub supports: Option<SupportsConfig>,
}

impl Config {
    pub fn new(cli: Cli) -> Result<Config, Box<dyn Error>> {
        let config_str = match cli.config.as_deref() {
            Some(path) => read_file(path)?,
            None => match read_file(DEFAULT_CONFIG_PATH) {
                Ok(s) => s,
                // no configuration file, defaults
                Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
                Err(e) => return Err(Box::new(e)),
            },
        };
        let mut config: Config = toml::from_str(&config_str)?;
        if cli.verbose {
            config.log_level = "debug".to_string();
        }
        if let Err(e) = config.validate() {
            Err(Box::new(e))
        } else { Ok(config) }
    }

    /// Register the extra casemaps. The configured casemap names must be
    /// known afterwards.
    pub fn register_casemaps(&self) -> crate::error::Result<()> {
        for cm in self.casemaps.iter().flatten() {
            casemap::register(&cm.name, &cm.upper, &cm.lower)?;
        }
        casemap::lookup(&self.default_casemap)?;
        if let Some(name) = self.supports.as_ref().and_then(|s| s.casemapping.as_ref()) {
            casemap::lookup(name)?;
        }
        Ok(())
    }

    /// The configured defaults as an ISUPPORT line for a fresh server.
    pub fn isupport_line(&self) -> String {
        let mut tokens = vec![format!("CASEMAPPING={}", self.default_casemap)];
        if let Some(supports) = &self.supports {
            if let Some(nicklen) = supports.nicklen {
                tokens.push(format!("NICKLEN={}", nicklen));
            }
            if let Some(channellen) = supports.channellen {
                tokens.push(format!("CHANNELLEN={}", channellen));
            }
            match supports.chantypes.as_deref() {
                Some("") => tokens.push("CHANTYPES".to_string()),
                Some(chantypes) => tokens.push(format!("CHANTYPES={}", chantypes)),
                None => {}
            }
            if let Some(casemapping) = &supports.casemapping {
                tokens.push(format!("CASEMAPPING={}", casemapping));
            }
        }
        tokens.join(" ")
    }
}

fn read_file(path: &str) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut s = String::new();
    file.read_to_string(&mut s)?;
    Ok(s)
}

impl Default for Config {
    fn default() -> Self {
        Config{ default_casemap: casemap::RFC1459.to_string(),
            strict: false,
            log_level: "info".to_string(),
            casemaps: None,
            supports: None }
    }
}
