// main.rs - main program
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

use clap::Parser;
use std::error::Error;
use tracing::*;
use tracing_subscriber::EnvFilter;

use irc_state::config::{Cli, Config};
use irc_state::Server;

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = Config::new(cli.clone())?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    config.register_casemaps()?;
    let mut server = Server::new();
    server.parse_isupport(&config.isupport_line());
    if let Some(line) = &cli.myinfo {
        server.parse_my_info(line)?;
    }
    for line in &cli.isupport {
        server.parse_isupport(line);
    }
    for mask in &cli.user {
        server.new_user(mask, config.strict)?;
    }
    for name in &cli.join {
        server.new_channel(name, None, &[], config.strict)?;
    }
    info!("{} has {} channels and {} users", server, server.channels().len(),
            server.users().len());

    println!("{}", server.inspect());
    println!("{:#?}", server.supports());
    if let Some(mask) = &cli.find {
        for user in server.find_users(mask)? {
            println!("{}", user.fullform());
        }
    }
    Ok(())
}
