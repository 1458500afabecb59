// channel.rs - IRC channels
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

//! A channel is identified by its name and carries a topic, a user list and
//! a set of modes. Which modes exist depends on the server, so a channel
//! starts without any and the server creates them.

mod mode;

pub use self::mode::{ArgKind, Mode, ModeArg, ModeKind};

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use tracing::*;

use crate::casemap::Casemap;
use crate::error::{Error, Result};
use crate::list::{ListOf, Member};
use crate::netmask::{Binding, ServerId};
use crate::user::{User, UserId};

pub const CHANNEL_PREFIXES: &str = "#&+!";

/// Kind of a channel given by its first character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    /// `#`
    Normal,
    /// `&`, local to a server
    Local,
    /// `+`, no modes
    Modeless,
    /// `!`
    Safe,
    Other(char),
}

impl ChannelKind {
    pub fn from_prefix(c: char) -> ChannelKind {
        match c {
            '#' => ChannelKind::Normal,
            '&' => ChannelKind::Local,
            '+' => ChannelKind::Modeless,
            '!' => ChannelKind::Safe,
            c => ChannelKind::Other(c),
        }
    }
}

/// Check a channel name. An unknown prefix is only a warning.
pub fn validate_channel_name(name: &str) -> Result<()> {
    let first = match name.chars().next() {
        Some(c) => c,
        None => return Err(Error::InvalidChannelName(name.to_string())),
    };
    if name.contains(|c| c == ' ' || c == ',' || c == '\x07') {
        return Err(Error::InvalidChannelName(name.to_string()));
    }
    if !CHANNEL_PREFIXES.contains(first) {
        warn!("Unknown channel prefix {} in {}", first, name);
    }
    Ok(())
}

/// Topic text, who set it and when.
#[derive(Clone, Debug, PartialEq)]
pub struct Topic {
    pub text: String,
    pub set_by: User,
    pub set_on: DateTime<Utc>,
}

impl Topic {
    pub fn new(text: &str, set_by: User, set_on: DateTime<Utc>) -> Topic {
        Topic { text: text.to_string(), set_by, set_on }
    }

    /// Topic with an unknown setter, set now.
    pub fn with_text(text: &str) -> Topic {
        Topic::new(text, User::unknown(), Utc::now())
    }

    pub fn replace(&mut self, topic: Topic) {
        *self = topic;
    }
}

impl Default for Topic {
    fn default() -> Self {
        Topic::with_text("")
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Clone, Debug)]
pub struct Channel {
    name: String,
    topic: Topic,
    modes: BTreeMap<char, Mode>,
    users: ListOf<UserId>,
    binding: Binding,
}

impl Channel {
    pub fn new(name: &str, topic: Option<Topic>, users: Vec<UserId>, binding: Binding)
            -> Result<Channel> {
        validate_channel_name(name)?;
        let users = ListOf::from_vec(binding.server_id(), users)?;
        Ok(Channel {
            name: name.to_string(),
            topic: topic.unwrap_or_default(),
            modes: BTreeMap::new(),
            users,
            binding,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn downcase(&self) -> String {
        self.casemap().downcase(&self.name)
    }

    pub fn casemap(&self) -> &Casemap {
        self.binding.get_casemap()
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    pub fn server_id(&self) -> Option<ServerId> {
        self.binding.server_id()
    }

    pub(crate) fn set_casemap(&mut self, casemap: &Casemap) {
        self.binding.set_casemap(casemap);
        for mode in self.modes.values_mut() {
            if let Mode::TypeA(list) = mode {
                list.iter_mut().for_each(|nm| nm.set_casemap(casemap));
            }
        }
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn set_topic(&mut self, topic: Topic) {
        self.topic.replace(topic);
    }

    pub fn users(&self) -> &ListOf<UserId> {
        &self.users
    }

    pub fn has_user(&self, user: UserId) -> bool {
        self.users.contains(&user)
    }

    pub fn add_user(&mut self, user: UserId) -> Result<bool> {
        self.users.push_unique(user)
    }

    /// Remove a user from all user modes, then from the user list.
    pub fn delete_user(&mut self, user: UserId) -> bool {
        for mode in self.modes.values_mut() {
            if let Mode::UserMode(list) = mode {
                list.delete(&user);
            }
        }
        self.users.delete(&user).is_some()
    }

    /// Create the mode for `letter`, replacing any previous one.
    pub fn create_mode(&mut self, letter: char, kind: ModeKind) {
        self.modes.insert(letter, Mode::new(kind, self.binding.server_id()));
    }

    pub fn mode(&self, letter: char) -> Option<&Mode> {
        self.modes.get(&letter)
    }

    pub fn modes(&self) -> &BTreeMap<char, Mode> {
        &self.modes
    }

    fn mode_mut(&mut self, letter: char) -> Result<&mut Mode> {
        let name = &self.name;
        self.modes.get_mut(&letter).ok_or_else(|| Error::UnknownMode {
            channel: name.clone(),
            letter,
        })
    }

    pub fn set_mode(&mut self, letter: char, arg: ModeArg) -> Result<()> {
        self.mode_mut(letter)?.set(letter, arg)
    }

    pub fn reset_mode(&mut self, letter: char, arg: ModeArg) -> Result<()> {
        self.mode_mut(letter)?.reset(letter, arg)
    }

    /// Flag modes that are set and modes with a value, like `+ntk key`.
    pub fn mode_string(&self) -> String {
        let mut flags = "+".to_string();
        let mut args = vec![];
        for (letter, mode) in &self.modes {
            match mode {
                Mode::TypeD(true) => flags.push(*letter),
                Mode::TypeB(Some(v)) | Mode::TypeC(Some(v)) => {
                    flags.push(*letter);
                    args.push(v.as_str());
                }
                _ => {}
            }
        }
        args.iter().fold(flags, |mut s, a| {
            s.push(' ');
            s.push_str(a);
            s
        })
    }

    pub fn prefix(&self) -> char {
        // name is never empty
        self.name.chars().next().unwrap_or('#')
    }

    pub fn kind(&self) -> ChannelKind {
        ChannelKind::from_prefix(self.prefix())
    }

    pub fn is_local(&self) -> bool {
        self.kind() == ChannelKind::Local
    }

    pub fn is_modeless(&self) -> bool {
        self.kind() == ChannelKind::Modeless
    }

    pub fn is_safe(&self) -> bool {
        self.kind() == ChannelKind::Safe
    }

    pub fn is_normal(&self) -> bool {
        self.kind() == ChannelKind::Normal
    }

    /// Debug string; `nicks` resolves user handles.
    pub fn inspect_with<F: Fn(UserId) -> Option<String>>(&self, nicks: F) -> String {
        let mut names = self.users.iter()
            .map(|id| nicks(*id).unwrap_or_else(|| id.describe()))
            .collect::<Vec<_>>();
        names.sort_by_key(|n| self.casemap().downcase(n));
        let mut s = "<Channel:".to_string();
        if let Some(id) = self.server_id() {
            s.push_str(&format!(" on server {}", id));
        }
        s.push_str(&format!(" @name={:?} @topic={:?} @users=<{}>>",
                self.name, self.topic.text, names.join(", ")));
        s
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Member for Channel {
    fn server_id(&self) -> Option<ServerId> {
        self.binding.server_id()
    }

    fn describe(&self) -> String {
        self.inspect_with(|_| None)
    }
}
