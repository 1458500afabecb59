// user.rs - IRC users
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

//! An IRC user is a netmask without globs. Its nick can be known well before
//! its user and host, and some networks rewrite the host after the user
//! identifies, so user and host may change later. The only glob allowed is
//! a whole `*` standing for an unknown part.

use std::fmt;

use crate::casemap::Casemap;
use crate::error::{Error, Result};
use crate::glob::has_glob;
use crate::list::Member;
use crate::netmask::{Binding, Netmask, ServerId};

/// Handle of a user owned by a server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId {
    server: ServerId,
    serial: u64,
}

impl UserId {
    pub(crate) fn new(server: ServerId, serial: u64) -> UserId {
        UserId { server, serial }
    }

    pub fn server(&self) -> ServerId {
        self.server
    }
}

impl Member for UserId {
    fn server_id(&self) -> Option<ServerId> {
        Some(self.server)
    }

    fn describe(&self) -> String {
        format!("user#{}@{}", self.serial, self.server)
    }
}

fn committed(part: &str) -> bool {
    part == "*" || !has_glob(part)
}

#[derive(Clone)]
pub struct User {
    id: Option<UserId>,
    mask: Netmask,
    // Some("") is away without a message
    away: Option<String>,
}

impl User {
    /// Stand-alone user with the rfc1459 casemap.
    pub fn new(s: &str) -> Result<User> {
        User::with_binding(s, Binding::default())
    }

    pub fn with_casemap(s: &str, casemap: &Casemap) -> Result<User> {
        User::with_binding(s, Binding::casemap(Some(casemap)))
    }

    pub fn with_binding(s: &str, binding: Binding) -> Result<User> {
        let mask = Netmask::with_binding(s, binding)?;
        if !committed(mask.nick()) || !committed(mask.user()) || !committed(mask.host()) {
            return Err(Error::InvalidUser(s.to_string()));
        }
        Ok(User { id: None, mask, away: None })
    }

    /// User nobody knows anything about, `*!*@*`.
    pub fn unknown() -> User {
        User { id: None, mask: Netmask::everybody(Binding::default()), away: None }
    }

    pub(crate) fn set_id(&mut self, id: UserId) {
        self.id = Some(id);
    }

    /// Set for users owned by a server.
    pub fn id(&self) -> Option<UserId> {
        self.id
    }

    pub fn nick(&self) -> &str {
        self.mask.nick()
    }

    pub fn user(&self) -> &str {
        self.mask.user()
    }

    pub fn host(&self) -> &str {
        self.mask.host()
    }

    pub fn netmask(&self) -> &Netmask {
        &self.mask
    }

    pub fn fullform(&self) -> String {
        self.mask.fullform()
    }

    pub fn casemap(&self) -> &Casemap {
        self.mask.casemap()
    }

    pub fn binding(&self) -> &Binding {
        self.mask.binding()
    }

    pub(crate) fn set_casemap(&mut self, casemap: &Casemap) {
        self.mask.set_casemap(casemap);
    }

    /// Folded nick.
    pub fn downcase(&self) -> String {
        self.casemap().downcase(self.nick())
    }

    /// The nick can change freely but never to a glob.
    pub fn set_nick(&mut self, nick: &str) -> Result<()> {
        if nick.is_empty() || has_glob(nick)
                || nick.contains(|c: char| c == '!' || c == '@' || c.is_whitespace()) {
            return Err(Error::InvalidUser(nick.to_string()));
        }
        self.mask.set_nick(nick);
        Ok(())
    }

    pub fn set_user(&mut self, user: &str) -> Result<()> {
        if !committed(user) {
            return Err(Error::InvalidUser(user.to_string()));
        }
        self.mask.set_user(user);
        Ok(())
    }

    pub fn set_host(&mut self, host: &str) -> Result<()> {
        if !committed(host) {
            return Err(Error::InvalidUser(host.to_string()));
        }
        self.mask.set_host(host);
        Ok(())
    }

    /// Nick, user and host are all known.
    pub fn is_known(&self) -> bool {
        self.nick() != "*" && self.user() != "*" && self.host() != "*"
    }

    pub fn is_away(&self) -> bool {
        self.away.is_some()
    }

    pub fn away(&self) -> Option<&str> {
        self.away.as_deref()
    }

    /// `None` clears the away status, `Some("")` is away without a message.
    pub fn set_away(&mut self, msg: Option<&str>) {
        self.away = msg.map(|m| m.to_string());
    }

    /// Copy nick, user, host and away status from `other`, keeping our binding
    /// and identity.
    pub fn replace(&mut self, other: &User) -> Result<()> {
        self.casemap().must_be(other.casemap())?;
        self.mask.replace(&other.mask);
        self.away = other.away.clone();
        Ok(())
    }

    // a server learnt more about this user
    pub(crate) fn set_netmask(&mut self, mask: &Netmask) {
        self.mask.replace(mask);
    }

    pub fn matches(&self, other: &Netmask) -> Result<bool> {
        self.mask.matches(other)
    }

    pub fn inspect(&self) -> String {
        let mut s = "<User:".to_string();
        if let Some(id) = self.mask.server_id() {
            s.push_str(&format!(" @server={}", id));
        }
        s.push_str(&format!(" @nick={:?} @user={:?} @host={:?} casemap={}",
                self.nick(), self.user(), self.host(), self.casemap()));
        if let Some(ref away) = self.away {
            s.push_str(&format!(" @away={:?}", away));
        }
        s.push('>');
        s
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.mask == other.mask
    }
}

impl Eq for User {}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.nick())
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inspect())
    }
}

impl Member for User {
    fn server_id(&self) -> Option<ServerId> {
        self.mask.server_id()
    }

    fn describe(&self) -> String {
        self.inspect()
    }
}
