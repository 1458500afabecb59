// isupport.rs - ISUPPORT, MYINFO and capability parsing
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

//! Parsers for the lines a server sends about itself: RPL_MYINFO (004),
//! RPL_ISUPPORT (005) and the capability lists of `CAP LS`.
//!
//! Malformed ISUPPORT tokens never stop parsing of a line: each one is
//! reported with `warn!` and the previous value is kept.

use const_table::const_table;
use std::collections::BTreeMap;
use tracing::*;

use crate::casemap::RFC1459;
use crate::error::{Error, Result};

#[const_table]
pub enum IsupportKey {
    KeyName{ name: &'static str },
    CASEMAPPINGKey = KeyName{ name: "CASEMAPPING" },
    NETWORKKey = KeyName{ name: "NETWORK" },
    CHANLIMITKey = KeyName{ name: "CHANLIMIT" },
    IDCHANKey = KeyName{ name: "IDCHAN" },
    MAXLISTKey = KeyName{ name: "MAXLIST" },
    TARGMAXKey = KeyName{ name: "TARGMAX" },
    MAXCHANNELSKey = KeyName{ name: "MAXCHANNELS" },
    MAXTARGETSKey = KeyName{ name: "MAXTARGETS" },
    CHANMODESKey = KeyName{ name: "CHANMODES" },
    CHANNELLENKey = KeyName{ name: "CHANNELLEN" },
    KICKLENKey = KeyName{ name: "KICKLEN" },
    MODESKey = KeyName{ name: "MODES" },
    TOPICLENKey = KeyName{ name: "TOPICLEN" },
    CHANTYPESKey = KeyName{ name: "CHANTYPES" },
    EXCEPTSKey = KeyName{ name: "EXCEPTS" },
    INVEXKey = KeyName{ name: "INVEX" },
    NICKLENKey = KeyName{ name: "NICKLEN" },
    PREFIXKey = KeyName{ name: "PREFIX" },
    SAFELISTKey = KeyName{ name: "SAFELIST" },
    STATUSMSGKey = KeyName{ name: "STATUSMSG" },
    STDKey = KeyName{ name: "STD" },
}

use IsupportKey::*;

impl IsupportKey {
    /// Key for an upper-case token name.
    pub fn from_name(name: &str) -> Option<IsupportKey> {
        match name {
            "CASEMAPPING" => Some(CASEMAPPINGKey),
            "NETWORK" => Some(NETWORKKey),
            "CHANLIMIT" => Some(CHANLIMITKey),
            "IDCHAN" => Some(IDCHANKey),
            "MAXLIST" => Some(MAXLISTKey),
            "TARGMAX" => Some(TARGMAXKey),
            "MAXCHANNELS" => Some(MAXCHANNELSKey),
            "MAXTARGETS" => Some(MAXTARGETSKey),
            "CHANMODES" => Some(CHANMODESKey),
            "CHANNELLEN" => Some(CHANNELLENKey),
            "KICKLEN" => Some(KICKLENKey),
            "MODES" => Some(MODESKey),
            "TOPICLEN" => Some(TOPICLENKey),
            "CHANTYPES" => Some(CHANTYPESKey),
            "EXCEPTS" => Some(EXCEPTSKey),
            "INVEX" => Some(INVEXKey),
            "NICKLEN" => Some(NICKLENKey),
            "PREFIX" => Some(PREFIXKey),
            "SAFELIST" => Some(SAFELISTKey),
            "STATUSMSG" => Some(STATUSMSGKey),
            "STD" => Some(STDKey),
            _ => None,
        }
    }
}

/// Channel mode letters by CHANMODES group. `None` means not advertised.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChanModes {
    /// address lists
    pub typea: Option<Vec<char>>,
    /// parameter on set and unset
    pub typeb: Option<Vec<char>>,
    /// parameter on set only
    pub typec: Option<Vec<char>>,
    /// flags
    pub typed: Option<Vec<char>>,
}

/// PREFIX: mode letters and their symbols, highest first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prefix {
    pub modes: Vec<char>,
    pub prefixes: Vec<char>,
}

impl Prefix {
    pub fn symbol(&self, mode: char) -> Option<char> {
        self.modes.iter().position(|m| *m == mode).and_then(|i| self.prefixes.get(i).copied())
    }

    pub fn mode(&self, symbol: char) -> Option<char> {
        self.prefixes.iter().position(|p| *p == symbol).and_then(|i| self.modes.get(i).copied())
    }
}

impl Default for Prefix {
    fn default() -> Self {
        Prefix { modes: vec!['o', 'v'], prefixes: vec!['@', '+'] }
    }
}

/// Value of a token this crate does not interpret.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IsupportValue {
    Bool(bool),
    Value(String),
}

/// What a server supports, as learnt from ISUPPORT.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Supports {
    pub casemapping: String,
    pub chanlimit: BTreeMap<String, u32>,
    pub chanmodes: ChanModes,
    pub channellen: Option<u32>,
    /// `None`: the server has no channels.
    pub chantypes: Option<String>,
    pub excepts: Option<String>,
    pub idchan: BTreeMap<String, u32>,
    pub invex: Option<String>,
    pub kicklen: Option<u32>,
    pub maxlist: BTreeMap<String, u32>,
    pub modes: Option<u32>,
    pub network: Option<String>,
    pub nicklen: u32,
    pub prefix: Prefix,
    pub safelist: Option<bool>,
    pub statusmsg: Option<Vec<char>>,
    pub std: Option<Vec<String>>,
    pub targmax: BTreeMap<String, u32>,
    pub topiclen: Option<u32>,
    pub other: BTreeMap<String, IsupportValue>,
}

impl Default for Supports {
    fn default() -> Self {
        Supports {
            casemapping: RFC1459.to_string(),
            chanlimit: BTreeMap::new(),
            chanmodes: ChanModes::default(),
            channellen: Some(200),
            chantypes: Some("#&".to_string()),
            excepts: None,
            idchan: BTreeMap::new(),
            invex: None,
            kicklen: None,
            maxlist: BTreeMap::new(),
            modes: Some(3),
            network: None,
            nicklen: 9,
            prefix: Prefix::default(),
            safelist: None,
            statusmsg: None,
            std: None,
            targmax: BTreeMap::new(),
            topiclen: None,
            other: BTreeMap::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TokenValue<'a> {
    Value(&'a str),
    NoValue,
    Negated,
}

// "KEY=VALUE", "KEY" or "-KEY". "KEY=" has no value.
fn split_token(token: &str) -> (String, TokenValue<'_>) {
    if let Some(key) = token.strip_prefix('-') {
        return (key.to_ascii_uppercase(), TokenValue::Negated);
    }
    match token.split_once('=') {
        Some((key, "")) => (key.to_ascii_uppercase(), TokenValue::NoValue),
        Some((key, val)) => (key.to_ascii_uppercase(), TokenValue::Value(val)),
        None => (token.to_ascii_uppercase(), TokenValue::NoValue),
    }
}

fn no_value(key: IsupportKey) {
    warn!("No {} value", key.name);
}

fn parse_count(key: &str, val: &str) -> Option<u32> {
    match val.parse::<u32>() {
        Ok(n) => Some(n),
        Err(_) => {
            warn!("Malformed {} value {:?}", key, val);
            None
        }
    }
}

// comma separated "letters:count" groups; an empty count means no limit
fn merge_limits(map: &mut BTreeMap<String, u32>, key: &str, val: &str) {
    for group in val.split(',').filter(|g| !g.is_empty()) {
        match group.split_once(':') {
            Some((k, "")) => {
                map.remove(k);
            }
            Some((k, v)) => {
                if let Some(n) = parse_count(key, v) {
                    map.insert(k.to_string(), n);
                }
            }
            None => warn!("Malformed {} group {:?}", key, group),
        }
    }
}

fn parse_prefix(val: &str) -> Option<Prefix> {
    let rest = val.strip_prefix('(')?;
    let (modes, prefixes) = rest.split_once(')')?;
    let modes = modes.chars().collect::<Vec<_>>();
    let prefixes = prefixes.chars().collect::<Vec<_>>();
    if modes.len() != prefixes.len() {
        return None;
    }
    Some(Prefix { modes, prefixes })
}

impl Supports {
    /// Merge an RPL_ISUPPORT line (only the tokens) into the table.
    pub fn parse_isupport(&mut self, line: &str) {
        debug!("Parsing ISUPPORT {:?}", line);
        let mut maxchannels = vec![];
        for token in line.split_whitespace() {
            let (name, value) = split_token(token);
            match IsupportKey::from_name(&name) {
                Some(MAXCHANNELSKey) => match value {
                    TokenValue::Value(v) => maxchannels.push(v),
                    _ => no_value(MAXCHANNELSKey),
                },
                Some(key) => self.merge(key, value),
                None => {
                    let v = match value {
                        TokenValue::Value(v) => IsupportValue::Value(v.to_string()),
                        TokenValue::NoValue => IsupportValue::Bool(true),
                        TokenValue::Negated => IsupportValue::Bool(false),
                    };
                    self.other.insert(name, v);
                }
            }
        }
        // MAXCHANNELS is CHANLIMIT for all channel types
        for val in maxchannels {
            match self.chantypes.as_deref() {
                Some(types) if !types.is_empty() => {
                    let group = format!("{}:{}", types, val);
                    debug!("MAXCHANNELS={} as CHANLIMIT={}", val, group);
                    merge_limits(&mut self.chanlimit, CHANLIMITKey.name, &group);
                }
                _ => warn!("MAXCHANNELS={} without channel types", val),
            }
        }
    }

    fn merge(&mut self, key: IsupportKey, value: TokenValue<'_>) {
        let val = match value {
            TokenValue::Value(v) => Some(v),
            _ => None,
        };
        match key {
            CASEMAPPINGKey => match val {
                Some(v) => self.casemapping = v.to_string(),
                None => no_value(key),
            },
            NETWORKKey => match val {
                Some(v) => self.network = Some(v.to_string()),
                None => no_value(key),
            },
            CHANLIMITKey | IDCHANKey | MAXLISTKey | TARGMAXKey => match val {
                Some(v) => {
                    let map = match key {
                        CHANLIMITKey => &mut self.chanlimit,
                        IDCHANKey => &mut self.idchan,
                        MAXLISTKey => &mut self.maxlist,
                        _ => &mut self.targmax,
                    };
                    merge_limits(map, key.name, v);
                }
                None => no_value(key),
            },
            MAXTARGETSKey => match val {
                Some(v) => {
                    if let Some(n) = parse_count(key.name, v) {
                        self.targmax.insert("PRIVMSG".to_string(), n);
                        self.targmax.insert("NOTICE".to_string(), n);
                    }
                }
                None => no_value(key),
            },
            CHANMODESKey => match val {
                Some(v) => self.merge_chanmodes(v),
                None => no_value(key),
            },
            CHANNELLENKey | KICKLENKey | MODESKey | TOPICLENKey => {
                let n = val.and_then(|v| parse_count(key.name, v));
                match key {
                    CHANNELLENKey => self.channellen = n,
                    KICKLENKey => self.kicklen = n,
                    MODESKey => self.modes = n,
                    _ => self.topiclen = n,
                }
            }
            CHANTYPESKey => self.chantypes = val.map(str::to_string),
            // without a value the standard letter applies, negated or not
            EXCEPTSKey => self.excepts = Some(val.unwrap_or("e").to_string()),
            INVEXKey => self.invex = Some(val.unwrap_or("I").to_string()),
            NICKLENKey => match val {
                Some(v) => {
                    if let Some(n) = parse_count(key.name, v) {
                        self.nicklen = n;
                    }
                }
                None => no_value(key),
            },
            PREFIXKey => match val {
                Some(v) => match parse_prefix(v) {
                    Some(prefix) => self.prefix = prefix,
                    None => warn!("Malformed PREFIX value {:?}", v),
                },
                None => self.prefix = Prefix { modes: vec![], prefixes: vec![] },
            },
            SAFELISTKey => match value {
                TokenValue::Value(v) => warn!("SAFELIST takes no value, got {:?}", v),
                TokenValue::NoValue => self.safelist = Some(true),
                TokenValue::Negated => self.safelist = Some(false),
            },
            STATUSMSGKey => match val {
                Some(v) => self.statusmsg = Some(v.chars().collect()),
                None => no_value(key),
            },
            STDKey => match val {
                Some(v) => self.std = Some(v.split(',').map(str::to_string).collect()),
                None => no_value(key),
            },
            // collected by parse_isupport
            MAXCHANNELSKey => {}
        }
    }

    fn merge_chanmodes(&mut self, val: &str) {
        let groups = val.split(',').collect::<Vec<_>>();
        if groups.len() < 4 {
            warn!("CHANMODES {:?} has only {} groups", val, groups.len());
        }
        let group = |i: usize| -> Option<Vec<char>> {
            Some(groups.get(i).map(|g| g.chars().collect()).unwrap_or_default())
        };
        self.chanmodes = ChanModes {
            typea: group(0),
            typeb: group(1),
            typec: group(2),
            typed: group(3),
        };
    }
}

/// RPL_MYINFO: `<hostname> <version> <usermodes> <chanmodes>`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MyInfo {
    pub hostname: Option<String>,
    pub version: Option<String>,
    pub usermodes: Option<String>,
    pub chanmodes: Option<String>,
}

impl MyInfo {
    pub fn parse(line: &str) -> Result<MyInfo> {
        debug!("Parsing MYINFO {:?}", line);
        let mut it = line.split_whitespace().map(str::to_string);
        let hostname = it.next();
        if hostname.is_none() {
            return Err(Error::InvalidMyInfo(line.to_string()));
        }
        Ok(MyInfo {
            hostname,
            version: it.next(),
            usermodes: it.next(),
            chanmodes: it.next(),
        })
    }
}

/// Merge a capability list: `name` or `name=value` adds, `-name` removes.
pub fn parse_capabilities(caps: &mut BTreeMap<String, Option<String>>, line: &str) {
    debug!("Parsing capabilities {:?}", line);
    for token in line.split_whitespace() {
        let token = token.strip_prefix(':').unwrap_or(token);
        if token.is_empty() {
            continue;
        }
        if let Some(name) = token.strip_prefix('-') {
            caps.remove(name);
            continue;
        }
        match token.split_once('=') {
            Some((name, value)) => caps.insert(name.to_string(), Some(value.to_string())),
            None => caps.insert(token.to_string(), None),
        };
    }
}
