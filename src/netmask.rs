// netmask.rs - netmasks
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

use std::cmp::Ordering;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use tracing::*;

use crate::casemap::Casemap;
use crate::error::{Error, Result};
use crate::glob::{compile_folded, has_glob, unescape};
use crate::list::Member;
use crate::user::User;

static NEXT_SERVER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a Server. Entities refer to their server by id, never by ownership.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServerId(u64);

impl ServerId {
    pub(crate) fn next() -> ServerId {
        ServerId(NEXT_SERVER_ID.fetch_add(1, AtomicOrdering::Relaxed))
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "server#{}", self.0)
    }
}

/// Netmasks, users and channels belong either to a server (and use its casemap)
/// or stand alone with their own casemap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Binding {
    Server { id: ServerId, casemap: Casemap },
    Casemap(Casemap),
}

impl Binding {
    /// Bind to a server. An explicitly given casemap must be the server's one.
    pub fn server(id: ServerId, server_casemap: &Casemap, casemap: Option<&Casemap>)
            -> Result<Binding> {
        if let Some(cm) = casemap {
            server_casemap.must_be(cm)?;
        }
        Ok(Binding::Server { id, casemap: server_casemap.clone() })
    }

    /// Stand-alone binding, rfc1459 if no casemap is given.
    pub fn casemap(casemap: Option<&Casemap>) -> Binding {
        Binding::Casemap(casemap.cloned().unwrap_or_default())
    }

    pub fn get_casemap(&self) -> &Casemap {
        match self {
            Binding::Server { casemap, .. } => casemap,
            Binding::Casemap(casemap) => casemap,
        }
    }

    pub fn server_id(&self) -> Option<ServerId> {
        match self {
            Binding::Server { id, .. } => Some(*id),
            Binding::Casemap(_) => None,
        }
    }

    /// True if this binding agrees with the given server and casemap; `None`
    /// means "don't care" for the casemap and "stand-alone" for the server.
    pub fn fits(&self, server: Option<ServerId>, casemap: Option<&Casemap>) -> bool {
        let casemap_ok = casemap.map(|cm| cm == self.get_casemap()).unwrap_or(true);
        match server {
            None => casemap_ok,
            Some(id) => self.server_id() == Some(id) && casemap_ok,
        }
    }

    // server changed its casemapping
    pub(crate) fn set_casemap(&mut self, cm: &Casemap) {
        match self {
            Binding::Server { casemap, .. } => *casemap = cm.clone(),
            Binding::Casemap(casemap) => *casemap = cm.clone(),
        }
    }
}

impl Default for Binding {
    fn default() -> Self {
        Binding::casemap(None)
    }
}

fn glob_or_value(s: &str) -> String {
    if s.is_empty() {
        "*".to_string()
    } else {
        s.to_string()
    }
}

// split "nick!user@host": the nick is the shortest prefix after which the rest
// is "!user@host" with a non-empty user. Without such a split, the whole string
// is the nick.
fn split_netmask(s: &str) -> Result<(&str, &str, &str)> {
    if s.chars().any(char::is_whitespace) {
        return Err(Error::InvalidNetmask(s.to_string()));
    }
    if s.is_empty() {
        return Ok(("", "", ""));
    }
    for (pos, _) in s.match_indices('!').filter(|(pos, _)| *pos > 0) {
        let rest = &s[pos + 1..];
        if let Some(at) = rest.rfind('@') {
            if at > 0 {
                return Ok((&s[..pos], &rest[..at], &rest[at + 1..]));
            }
        }
    }
    Ok((s, "", ""))
}

/// A `nick!user@host` triple, possibly with globs. Empty parts become `*`.
///
/// Examples:
/// * `*!*@*` refers to everybody
/// * `*!someuser@somehost` refers to user `someuser` on host `somehost`
///   regardless of the nick used.
#[derive(Clone)]
pub struct Netmask {
    nick: String,
    user: String,
    host: String,
    binding: Binding,
}

impl Netmask {
    /// Parse a stand-alone netmask with the rfc1459 casemap.
    pub fn new(s: &str) -> Result<Netmask> {
        Netmask::with_binding(s, Binding::default())
    }

    pub fn with_casemap(s: &str, casemap: &Casemap) -> Result<Netmask> {
        Netmask::with_binding(s, Binding::casemap(Some(casemap)))
    }

    pub fn with_binding(s: &str, binding: Binding) -> Result<Netmask> {
        let (nick, user, host) = split_netmask(s)?;
        trace!("Netmask {:?}: {:?} {:?} {:?}", s, nick, user, host);
        Ok(Netmask {
            nick: glob_or_value(nick),
            user: glob_or_value(user),
            host: glob_or_value(host),
            binding,
        })
    }

    /// `*!*@*`
    pub fn everybody(binding: Binding) -> Netmask {
        Netmask {
            nick: "*".to_string(),
            user: "*".to_string(),
            host: "*".to_string(),
            binding,
        }
    }

    pub fn nick(&self) -> &str {
        &self.nick
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn set_nick(&mut self, nick: &str) {
        self.nick = glob_or_value(nick);
    }

    pub fn set_user(&mut self, user: &str) {
        self.user = glob_or_value(user);
    }

    pub fn set_host(&mut self, host: &str) {
        self.host = glob_or_value(host);
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    pub fn casemap(&self) -> &Casemap {
        self.binding.get_casemap()
    }

    pub fn server_id(&self) -> Option<ServerId> {
        self.binding.server_id()
    }

    pub(crate) fn set_casemap(&mut self, casemap: &Casemap) {
        self.binding.set_casemap(casemap);
    }

    pub fn fullform(&self) -> String {
        format!("{}!{}@{}", self.nick, self.user, self.host)
    }

    /// Full form folded with the netmask's casemap.
    pub fn downcase(&self) -> String {
        self.casemap().downcase(&self.fullform())
    }

    /// True if any of nick, user or host has a glob.
    pub fn has_glob(&self) -> bool {
        has_glob(&self.nick) || has_glob(&self.user) || has_glob(&self.host)
    }

    /// Same netmask under another binding; the parts are kept as they are.
    pub fn rebind(&self, binding: Binding) -> Netmask {
        Netmask { binding, ..self.clone() }
    }

    /// Take nick, user and host from another netmask, keeping our binding.
    pub fn replace(&mut self, other: &Netmask) {
        self.nick = other.nick.clone();
        self.user = other.user.clone();
        self.host = other.host.clone();
    }

    pub fn to_user(&self) -> Result<User> {
        User::with_binding(&self.fullform(), self.binding.clone())
    }

    /// Check whether the receiver matches `other`, component by component and
    /// folded with the receiver's casemap:
    /// * neither has a glob: the components must be equal;
    /// * only the receiver has a glob: the other's component must match it;
    /// * only the other has a glob: no match.
    ///
    /// Both masks having globs is not supported.
    pub fn matches(&self, other: &Netmask) -> Result<bool> {
        if self.has_glob() && other.has_glob() {
            return Err(Error::UnsupportedGlobVsGlob(self.fullform(), other.fullform()));
        }
        let cm = self.casemap();
        for (us, them) in &[
            (&self.nick, &other.nick),
            (&self.user, &other.user),
            (&self.host, &other.host),
        ] {
            // globs are found before folding, rfc1459 folds the escape char
            let matched = match (has_glob(us), has_glob(them)) {
                (false, false) => cm.downcase(us) == cm.downcase(them),
                (true, false) => compile_folded(us, |c| cm.downcase_char(c))?
                    .is_match(&cm.downcase(&unescape(them))),
                (false, true) => false,
                (true, true) => {
                    return Err(Error::UnsupportedGlobVsGlob(self.fullform(), other.fullform()));
                }
            };
            if !matched {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Case equality: true if `arg` matches the receiver.
    pub fn case_matches(&self, arg: &Netmask) -> Result<bool> {
        arg.rebind(self.binding.clone()).matches(self)
    }

    pub fn inspect(&self) -> String {
        let mut s = "<Netmask:".to_string();
        if let Some(id) = self.server_id() {
            s.push_str(&format!(" @server={}", id));
        }
        s.push_str(&format!(" @nick={:?} @user={:?} @host={:?} casemap={}>",
                self.nick, self.user, self.host, self.casemap()));
        s
    }
}

impl PartialEq for Netmask {
    fn eq(&self, other: &Self) -> bool {
        self.downcase() == self.casemap().downcase(&other.fullform())
    }
}

impl Eq for Netmask {}

impl PartialOrd for Netmask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Netmask {
    fn cmp(&self, other: &Self) -> Ordering {
        self.downcase().cmp(&self.casemap().downcase(&other.fullform()))
    }
}

impl fmt::Display for Netmask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}@{}", self.nick, self.user, self.host)
    }
}

impl fmt::Debug for Netmask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inspect())
    }
}

impl Member for Netmask {
    fn server_id(&self) -> Option<ServerId> {
        self.binding.server_id()
    }

    fn describe(&self) -> String {
        self.inspect()
    }
}
