// lib.rs - library root
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

//! Client side model of an IRC network: casemaps and globs for comparing
//! names, netmasks and users, channels with their modes, and the server that
//! owns them all, fed with RPL_MYINFO and RPL_ISUPPORT lines.

pub mod casemap;
pub mod channel;
pub mod config;
pub mod error;
pub mod glob;
pub mod list;
pub mod netmask;
pub mod server;
pub mod user;

pub use crate::casemap::{Casemap, IrcCase};
pub use crate::channel::{Channel, Mode, ModeArg, ModeKind, Topic};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::glob::{has_glob, Glob};
pub use crate::list::ListOf;
pub use crate::netmask::{Binding, Netmask, ServerId};
pub use crate::server::{Server, Supports, Target};
pub use crate::user::{User, UserId};
