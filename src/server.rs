// server.rs - IRC server state
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

//! The server is the owner of everything a client knows about a network: what
//! the server supports, which channels are joined and which users are seen.
//! Channels and users are only created and removed through the server, so the
//! uniqueness of names and the references between them stay consistent.

mod isupport;

pub use self::isupport::{parse_capabilities, ChanModes, IsupportKey, IsupportValue, MyInfo,
        Prefix, Supports};

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use tracing::*;

use crate::casemap::{self, Casemap};
use crate::channel::{validate_channel_name, Channel, ModeArg, ModeKind, Topic, ArgKind};
use crate::error::{Error, Result};
use crate::glob;
use crate::list::ListOf;
use crate::netmask::{Binding, Netmask, ServerId};
use crate::user::{User, UserId};

/// Result of `Server::user_or_channel`.
#[derive(Debug)]
pub enum Target<'a> {
    Channel(&'a Channel),
    User(&'a User),
}

pub struct Server {
    id: ServerId,
    casemap: Casemap,
    last_user: u64,
    myinfo: MyInfo,
    supports: Supports,
    capabilities: BTreeMap<String, Option<String>>,
    channels: ListOf<Channel>,
    users: ListOf<User>,
}

impl Server {
    pub fn new() -> Server {
        let id = ServerId::next();
        Server {
            id,
            casemap: Casemap::default(),
            last_user: 0,
            myinfo: MyInfo::default(),
            supports: Supports::default(),
            capabilities: BTreeMap::new(),
            channels: ListOf::for_server(id),
            users: ListOf::for_server(id),
        }
    }

    pub fn id(&self) -> ServerId {
        self.id
    }

    pub fn hostname(&self) -> Option<&str> {
        self.myinfo.hostname.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.myinfo.version.as_deref()
    }

    pub fn usermodes(&self) -> Option<&str> {
        self.myinfo.usermodes.as_deref()
    }

    pub fn chanmodes(&self) -> Option<&str> {
        self.myinfo.chanmodes.as_deref()
    }

    pub fn supports(&self) -> &Supports {
        &self.supports
    }

    pub fn capabilities(&self) -> &BTreeMap<String, Option<String>> {
        &self.capabilities
    }

    pub fn channels(&self) -> &ListOf<Channel> {
        &self.channels
    }

    pub fn users(&self) -> &ListOf<User> {
        &self.users
    }

    pub fn casemap(&self) -> &Casemap {
        &self.casemap
    }

    fn binding(&self) -> Binding {
        Binding::Server { id: self.id, casemap: self.casemap.clone() }
    }

    /// Forget everything learnt from MYINFO, ISUPPORT and CAP.
    pub fn reset_capabilities(&mut self) {
        self.myinfo = MyInfo::default();
        self.supports = Supports::default();
        self.capabilities.clear();
        self.sync_casemap();
    }

    pub fn reset_lists(&mut self) {
        info!("Forgetting {} users and {} channels on {}", self.users.len(),
                self.channels.len(), self);
        self.users.clear();
        self.channels.clear();
    }

    pub fn clear(&mut self) {
        self.reset_lists();
        self.reset_capabilities();
    }

    pub fn parse_my_info(&mut self, line: &str) -> Result<()> {
        self.myinfo = MyInfo::parse(line)?;
        Ok(())
    }

    pub fn parse_isupport(&mut self, line: &str) {
        self.supports.parse_isupport(line);
        self.sync_casemap();
    }

    pub fn parse_capabilities(&mut self, line: &str) {
        parse_capabilities(&mut self.capabilities, line);
    }

    // follow CASEMAPPING: every owned entity folds with the server's casemap
    fn sync_casemap(&mut self) {
        if self.supports.casemapping == self.casemap.name() {
            return;
        }
        match casemap::lookup(&self.supports.casemapping) {
            Ok(cm) => {
                info!("{} now uses casemap {}", self, cm);
                self.users.iter_mut().for_each(|u| u.set_casemap(&cm));
                self.channels.iter_mut().for_each(|ch| ch.set_casemap(&cm));
                self.casemap = cm;
                self.drop_folded_duplicates();
            }
            Err(e) => warn!("{}, keeping {} (known: {})", e, self.casemap,
                    casemap::names().join(", ")),
        }
    }

    // names that were distinct under the old casemap may collide now:
    // the first entry wins
    fn drop_folded_duplicates(&mut self) {
        let mut seen = HashSet::new();
        let mut dropped = vec![];
        for user in self.users.iter() {
            if !seen.insert(user.downcase()) {
                warn!("User {} collides with another nick under {}, dropping it",
                        user.fullform(), self.casemap);
                dropped.extend(user.id());
            }
        }
        if !dropped.is_empty() {
            self.users.retain(|u| u.id().map_or(true, |id| !dropped.contains(&id)));
            for channel in self.channels.iter_mut() {
                for id in &dropped {
                    channel.delete_user(*id);
                }
            }
        }

        let mut seen = HashSet::new();
        let mut keep = vec![];
        for channel in self.channels.iter() {
            let fresh = seen.insert(channel.downcase());
            if !fresh {
                warn!("Channel {} collides with another channel under {}, dropping it",
                        channel.name(), self.casemap);
            }
            keep.push(fresh);
        }
        let mut keep = keep.into_iter();
        self.channels.retain(|_| keep.next().unwrap_or(true));
    }

    /// Folded names of all channels.
    pub fn channel_names(&self) -> Vec<String> {
        self.channels.iter().map(Channel::downcase).collect()
    }

    /// Folded nicks of all users.
    pub fn user_nicks(&self) -> Vec<String> {
        self.users.iter().map(User::downcase).collect()
    }

    fn channel_index(&self, name: &str) -> Option<usize> {
        let name = self.casemap.downcase(name);
        self.channels.position(|ch| ch.downcase() == name)
    }

    // accepts a nick or a full netmask
    fn user_index(&self, nick: &str) -> Option<usize> {
        let nick = match Netmask::new(nick) {
            Ok(nm) => self.casemap.downcase(nm.nick()),
            Err(_) => return None,
        };
        self.users.position(|u| u.downcase() == nick)
    }

    pub fn has_channel(&self, name: &str) -> bool {
        self.channel_index(name).is_some()
    }

    pub fn get_channel(&self, name: &str) -> Option<&Channel> {
        self.channel_index(name).map(|idx| &self.channels[idx])
    }

    fn channel_mut(&mut self, name: &str) -> Result<&mut Channel> {
        let idx = self.channel_index(name);
        idx.and_then(move |idx| self.channels.get_mut(idx))
            .ok_or_else(|| Error::UnmanagedChannel(name.to_string()))
    }

    pub fn has_user(&self, nick: &str) -> bool {
        self.user_index(nick).is_some()
    }

    pub fn get_user(&self, nick: &str) -> Option<&User> {
        self.user_index(nick).map(|idx| &self.users[idx])
    }

    pub fn user_by_id(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id() == Some(id))
    }

    fn user_id(&self, nick: &str) -> Result<UserId> {
        self.get_user(nick).and_then(User::id)
            .ok_or_else(|| Error::UnmanagedUser(nick.to_string()))
    }

    /// Netmask folding with this server's casemap.
    pub fn new_netmask(&self, mask: &str) -> Result<Netmask> {
        Netmask::with_binding(mask, self.binding())
    }

    /// True if `name` starts with one of the channel types.
    pub fn is_channel_prefix(&self, name: &str) -> bool {
        match (self.supports.chantypes.as_deref(), name.chars().next()) {
            (Some(types), Some(c)) => types.contains(c),
            _ => false,
        }
    }

    fn is_channel_name(&self, name: &str) -> bool {
        self.is_channel_prefix(name) && name.chars().count() >= 2
    }

    /// Create a channel on this server. An existing channel is returned
    /// unchanged unless `fail_on_exists` is set. Users are given as nicks or
    /// netmasks and are created as needed.
    pub fn new_channel(&mut self, name: &str, topic: Option<Topic>, users: &[&str],
                fail_on_exists: bool) -> Result<&Channel> {
        if let Some(idx) = self.channel_index(name) {
            if fail_on_exists {
                return Err(Error::DuplicateChannel {
                    channel: name.to_string(),
                    server: self.to_string(),
                });
            }
            return Ok(&self.channels[idx]);
        }

        validate_channel_name(name)?;
        let prefix = name.chars().next().unwrap_or('#');
        if !self.is_channel_prefix(name) {
            warn!("{} doesn't support channel prefix {}", self, prefix);
        }
        if let Some(len) = self.supports.channellen {
            let length = name.chars().count();
            if length > len as usize {
                warn!("{} doesn't support channel names this long ({} > {})", self, length, len);
            }
        }
        for (prefixes, limit) in &self.supports.chanlimit {
            if !prefixes.contains(prefix) {
                continue;
            }
            let count = self.channels.iter()
                .filter(|ch| prefixes.contains(ch.prefix()))
                .count();
            if count >= *limit as usize {
                return Err(Error::ChannelLimitExceeded { prefixes: prefixes.clone(), count });
            }
        }

        let binding = self.binding();
        for user in users {
            User::with_binding(user, binding.clone())?;
        }
        let mut ids = vec![];
        for user in users {
            let id = self.user(user)?.id().ok_or_else(|| Error::UnmanagedUser(user.to_string()))?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        let mut channel = Channel::new(name, topic, ids, binding)?;
        for mode in &self.supports.prefix.modes {
            channel.create_mode(*mode, ModeKind::UserMode);
        }
        let chanmodes = &self.supports.chanmodes;
        for (letters, kind) in &[
            (&chanmodes.typea, ModeKind::TypeA),
            (&chanmodes.typeb, ModeKind::TypeB),
            (&chanmodes.typec, ModeKind::TypeC),
            (&chanmodes.typed, ModeKind::TypeD),
        ] {
            for letter in letters.iter().flatten() {
                channel.create_mode(*letter, *kind);
            }
        }
        info!("New channel {} on {}", name, self);
        self.channels.push(channel)?;
        let idx = self.channels.len() - 1;
        Ok(&self.channels[idx])
    }

    /// The channel called `name`, created if needed.
    pub fn channel(&mut self, name: &str) -> Result<&Channel> {
        self.new_channel(name, None, &[], false)
    }

    pub fn delete_channel(&mut self, name: &str) -> Result<Channel> {
        let channel = self.channel_index(name)
            .and_then(|idx| self.channels.remove(idx))
            .ok_or_else(|| Error::UnmanagedChannel(name.to_string()))?;
        info!("Deleted channel {} on {}", channel, self);
        Ok(channel)
    }

    /// Create a user from a netmask. A user with the same nick is returned
    /// instead; when both are fully known it counts as already existing, and
    /// a differing netmask replaces the old one.
    pub fn new_user(&mut self, mask: &str, fail_on_exists: bool) -> Result<&User> {
        let mut user = User::with_binding(mask, self.binding())?;
        if let Some(idx) = self.user_index(user.nick()) {
            if user.is_known() {
                let old = &self.users[idx];
                if old.is_known() {
                    if *old != user {
                        warn!("User {} has inconsistent netmasks! {} knows {} but access was \
                                tried with {}", user.nick(), self, old.fullform(), user.fullform());
                    }
                    if fail_on_exists {
                        return Err(Error::DuplicateUser {
                            user: user.fullform(),
                            server: self.to_string(),
                        });
                    }
                }
                if *old != user {
                    if let Some(old) = self.users.get_mut(idx) {
                        old.set_netmask(user.netmask());
                        debug!("User improved to {}", old.fullform());
                    }
                }
            }
            return Ok(&self.users[idx]);
        }

        let length = user.nick().chars().count();
        if length > self.supports.nicklen as usize {
            warn!("{} doesn't support nicknames this long ({} > {})", self, length,
                    self.supports.nicklen);
        }
        self.last_user += 1;
        user.set_id(UserId::new(self.id, self.last_user));
        debug!("New user {} on {}", user.fullform(), self);
        self.users.push(user)?;
        let idx = self.users.len() - 1;
        Ok(&self.users[idx])
    }

    /// The user with the nick of `mask`, created if needed.
    pub fn user(&mut self, mask: &str) -> Result<&User> {
        self.new_user(mask, false)
    }

    /// Channel or user, depending on the channel types.
    pub fn user_or_channel(&mut self, name: &str) -> Result<Target<'_>> {
        if self.is_channel_prefix(name) {
            self.channel(name).map(Target::Channel)
        } else {
            self.user(name).map(Target::User)
        }
    }

    pub fn add_user_to_channel(&mut self, nick: &str, channel: &str) -> Result<bool> {
        if !self.has_channel(channel) {
            return Err(Error::UnmanagedChannel(channel.to_string()));
        }
        let id = self.user(nick)?.id().ok_or_else(|| Error::UnmanagedUser(nick.to_string()))?;
        self.channel_mut(channel)?.add_user(id)
    }

    pub fn delete_user_from_channel(&mut self, nick: &str, channel: &str) -> Result<bool> {
        let id = self.user_id(nick)?;
        Ok(self.channel_mut(channel)?.delete_user(id))
    }

    /// Remove a user from all channels and then from the server.
    pub fn delete_user(&mut self, mask: &str) -> Result<User> {
        let idx = self.user_index(mask).ok_or_else(|| Error::UnmanagedUser(mask.to_string()))?;
        if let Some(id) = self.users[idx].id() {
            for channel in self.channels.iter_mut() {
                channel.delete_user(id);
            }
        }
        let user = self.users.remove(idx).ok_or_else(|| Error::UnmanagedUser(mask.to_string()))?;
        info!("Deleted user {} on {}", user.fullform(), self);
        Ok(user)
    }

    /// Nick change: the user keeps its identity and channels.
    pub fn rename_user(&mut self, old: &str, new: &str) -> Result<&User> {
        let idx = self.user_index(old).ok_or_else(|| Error::UnmanagedUser(old.to_string()))?;
        if let Some(other) = self.user_index(new) {
            if other != idx {
                return Err(Error::DuplicateUser {
                    user: new.to_string(),
                    server: self.to_string(),
                });
            }
        }
        let nicklen = self.supports.nicklen as usize;
        if new.chars().count() > nicklen {
            warn!("{} doesn't support nicknames this long ({} > {})", self,
                    new.chars().count(), nicklen);
        }
        if let Some(user) = self.users.get_mut(idx) {
            user.set_nick(new)?;
            debug!("User {} is now {}", old, new);
        }
        Ok(&self.users[idx])
    }

    /// Users matching `mask`. Masks without user or host, and users not
    /// fully known, are matched by nick only.
    pub fn find_users(&self, mask: &str) -> Result<Vec<&User>> {
        let nm = self.new_netmask(mask)?;
        let nick_only = nm.user() == "*" || nm.host() == "*";
        let casemap = &self.casemap;
        let nick = glob::compile_folded(nm.nick(), |c| casemap.downcase_char(c))?;
        let mut found = vec![];
        for user in &self.users {
            let matched = if nick_only || !user.is_known() {
                nick.is_match(&casemap.downcase(&glob::unescape(user.nick())))
            } else {
                nm.matches(user.netmask())?
            };
            if matched {
                found.push(user);
            }
        }
        Ok(found)
    }

    /// Set a channel mode. List modes take a netmask, prefix modes a nick.
    pub fn set_mode(&mut self, channel: &str, letter: char, arg: Option<&str>) -> Result<()> {
        let kind = self.mode_kind(channel, letter)?;
        let arg = match (kind.set_arg(), arg) {
            (ArgKind::None, _) => ModeArg::None,
            (ArgKind::Text, Some(text)) => ModeArg::Text(text.to_string()),
            (ArgKind::Mask, Some(mask)) => ModeArg::Mask(self.new_netmask(mask)?),
            (ArgKind::User, Some(nick)) => ModeArg::User(
                self.user(nick)?.id().ok_or_else(|| Error::UnmanagedUser(nick.to_string()))?),
            (_, None) => return Err(Error::ModeArgument(letter)),
        };
        self.channel_mut(channel)?.set_mode(letter, arg)
    }

    /// Unset a channel mode. Unknown users hold no prefix modes.
    pub fn reset_mode(&mut self, channel: &str, letter: char, arg: Option<&str>) -> Result<()> {
        let kind = self.mode_kind(channel, letter)?;
        let arg = match (kind.reset_arg(), arg) {
            (ArgKind::None, _) => ModeArg::None,
            (ArgKind::Text, Some(text)) => ModeArg::Text(text.to_string()),
            (ArgKind::Mask, Some(mask)) => ModeArg::Mask(self.new_netmask(mask)?),
            (ArgKind::User, Some(nick)) => match self.get_user(nick).and_then(User::id) {
                Some(id) => ModeArg::User(id),
                None => {
                    debug!("Mode -{} for unknown user {} on {}", letter, nick, channel);
                    return Ok(());
                }
            },
            (_, None) => return Err(Error::ModeArgument(letter)),
        };
        self.channel_mut(channel)?.reset_mode(letter, arg)
    }

    fn mode_kind(&self, channel: &str, letter: char) -> Result<ModeKind> {
        let channel = self.get_channel(channel)
            .ok_or_else(|| Error::UnmanagedChannel(channel.to_string()))?;
        channel.mode(letter).map(|m| m.kind()).ok_or_else(|| Error::UnknownMode {
            channel: channel.name().to_string(),
            letter,
        })
    }

    pub fn set_topic(&mut self, channel: &str, text: &str, set_by: &str, set_on: DateTime<Utc>)
            -> Result<()> {
        if !self.has_channel(channel) {
            return Err(Error::UnmanagedChannel(channel.to_string()));
        }
        let setter = self.user(set_by)?.clone();
        self.channel_mut(channel)?.set_topic(Topic::new(text, setter, set_on));
        Ok(())
    }

    /// Status symbols of a user on a channel, highest first. Without
    /// `multi_prefix` only the highest one.
    pub fn user_prefixes(&self, channel: &str, nick: &str, multi_prefix: bool) -> Vec<char> {
        let (channel, id) = match (self.get_channel(channel), self.get_user(nick).and_then(User::id)) {
            (Some(channel), Some(id)) => (channel, id),
            _ => return vec![],
        };
        let prefix = &self.supports.prefix;
        let mut symbols = prefix.modes.iter().zip(prefix.prefixes.iter())
            .filter(|(mode, _)| channel.mode(**mode).map(|m| m.has_user(id)).unwrap_or(false))
            .map(|(_, symbol)| *symbol)
            .collect::<Vec<_>>();
        if !multi_prefix {
            symbols.truncate(1);
        }
        symbols
    }

    /// Split a message target like `@+#chan` into STATUSMSG symbols and the
    /// channel. Gives no symbols and an empty channel if it is not a channel.
    pub fn split_statusmsg_target<'a>(&self, target: &'a str) -> (Vec<char>, &'a str) {
        let statusmsg = self.supports.statusmsg.as_deref().unwrap_or(&[]);
        let run = target.chars().take_while(|c| statusmsg.contains(c)).count();
        let offsets = target.char_indices().map(|(i, _)| i).chain(Some(target.len()));
        let offsets = offsets.take(run + 1).collect::<Vec<_>>();
        for (n, offset) in offsets.iter().enumerate().rev() {
            let rest = &target[*offset..];
            if self.is_channel_name(rest) {
                return (target.chars().take(n).collect(), rest);
            }
        }
        (vec![], "")
    }

    pub fn inspect(&self) -> String {
        let mut channels = self.channels.iter().collect::<Vec<_>>();
        channels.sort_by_key(|ch| ch.downcase());
        let mut users = self.users.iter().collect::<Vec<_>>();
        users.sort_by_key(|u| u.downcase());
        let channels = channels.iter()
            .map(|ch| ch.inspect_with(|id| self.user_by_id(id).map(|u| u.nick().to_string())))
            .collect::<Vec<_>>();
        let users = users.iter().map(|u| u.inspect()).collect::<Vec<_>>();
        format!("<Server: {} @hostname={:?} @channels=[{}] @users=[{}]>", self.id,
                self.hostname().unwrap_or(""), channels.join(", "), users.join(", "))
    }
}

impl Default for Server {
    fn default() -> Self {
        Server::new()
    }
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.hostname() {
            Some(hostname) => f.write_str(hostname),
            None => write!(f, "{}", self.id),
        }
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inspect())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::channel::Mode;
    use crate::error::ErrorKind;
    use chrono::TimeZone;

    fn server() -> Server {
        let mut server = Server::new();
        server.parse_my_info("irc.example.net ircd-1.0 iow beIklmnopstv").unwrap();
        server.parse_isupport("CHANTYPES=#& PREFIX=(ov)@+ CHANMODES=beI,k,l,imnpst \
                STATUSMSG=@+ NICKLEN=16");
        server
    }

    fn nicks(users: &[&User]) -> Vec<String> {
        users.iter().map(|u| u.nick().to_string()).collect()
    }

    #[test]
    fn test_my_info() {
        let server = server();
        assert_eq!(Some("irc.example.net"), server.hostname());
        assert_eq!(Some("ircd-1.0"), server.version());
        assert_eq!(Some("iow"), server.usermodes());
        assert_eq!(Some("beIklmnopstv"), server.chanmodes());
        assert_eq!("irc.example.net", server.to_string());
        let mut server = Server::new();
        assert_eq!(Err(Error::InvalidMyInfo("".to_string())), server.parse_my_info(""));
        assert_eq!(format!("{}", server.id()), server.to_string());
    }

    #[test]
    fn test_new_channel_modes() {
        let mut server = server();
        let ch = server.new_channel("#test", None, &[], true).unwrap();
        assert_eq!(Some(ModeKind::UserMode), ch.mode('o').map(Mode::kind));
        assert_eq!(Some(ModeKind::UserMode), ch.mode('v').map(Mode::kind));
        assert_eq!(Some(ModeKind::TypeA), ch.mode('b').map(Mode::kind));
        assert_eq!(Some(ModeKind::TypeA), ch.mode('I').map(Mode::kind));
        assert_eq!(Some(ModeKind::TypeB), ch.mode('k').map(Mode::kind));
        assert_eq!(Some(ModeKind::TypeC), ch.mode('l').map(Mode::kind));
        assert_eq!(Some(ModeKind::TypeD), ch.mode('t').map(Mode::kind));
        assert!(ch.mode('q').is_none());
        assert_eq!(2 + 3 + 1 + 1 + 6, ch.modes().len());
    }

    #[test]
    fn test_new_channel_twice() {
        let mut server = server();
        server.new_channel("#test", None, &["alice!a@host"], true).unwrap();
        let err = server.new_channel("#TEST", None, &[], true).unwrap_err();
        assert_eq!(ErrorKind::DuplicateEntity, err.kind());
        assert_eq!(Error::DuplicateChannel { channel: "#TEST".to_string(),
                server: "irc.example.net".to_string() }, err);
        let ch = server.new_channel("#Test", Some(Topic::with_text("x")), &["bob"], false).unwrap();
        assert_eq!("#test", ch.name());
        assert_eq!("", ch.topic().text);
        assert_eq!(1, ch.users().len());
        assert_eq!(1, server.channels().len());
        assert!(!server.has_user("bob"));
    }

    #[test]
    fn test_new_channel_same_user_twice() {
        let mut server = server();
        let ch = server.new_channel("#a", None, &["alice", "ALICE", "alice!a@host"], true).unwrap();
        assert_eq!(1, ch.users().len());
        assert_eq!(1, server.users().len());
    }

    #[test]
    fn test_new_channel_invalid() {
        let mut server = server();
        assert!(matches!(server.new_channel("#a b", None, &[], true),
                Err(Error::InvalidChannelName(_))));
        assert!(matches!(server.new_channel("#ok", None, &["alice", "b*d!x@y"], true),
                Err(Error::InvalidUser(_))));
        // nothing was created
        assert!(!server.has_user("alice"));
        assert!(!server.has_channel("#ok"));
    }

    #[test]
    fn test_chanlimit() {
        let mut server = server();
        server.parse_isupport("CHANLIMIT=#:1");
        server.new_channel("#a", None, &[], true).unwrap();
        for fail in &[true, false] {
            let err = server.new_channel("#b", None, &[], *fail).unwrap_err();
            assert_eq!(ErrorKind::ResourceLimitExceeded, err.kind());
            assert_eq!(Error::ChannelLimitExceeded { prefixes: "#".to_string(), count: 1 }, err);
        }
        assert!(server.new_channel("&c", None, &[], true).is_ok());
        // existing channels are still found
        assert!(server.channel("#a").is_ok());
        server.delete_channel("#a").unwrap();
        assert!(server.new_channel("#b", None, &[], true).is_ok());
    }

    #[test]
    fn test_maxchannels_limit() {
        let mut server = server();
        server.parse_isupport("MAXCHANNELS=2");
        server.channel("#a").unwrap();
        server.channel("&b").unwrap();
        assert!(matches!(server.channel("#c"), Err(Error::ChannelLimitExceeded { .. })));
    }

    #[test]
    fn test_delete_channel() {
        let mut server = server();
        server.new_channel("#a", None, &["alice"], true).unwrap();
        let ch = server.delete_channel("#A").unwrap();
        assert_eq!("#a", ch.name());
        assert!(server.has_user("alice"));
        assert_eq!(Err(Error::UnmanagedChannel("#a".to_string())), server.delete_channel("#a")
                .map(|ch| ch.name().to_string()));
    }

    #[test]
    fn test_new_user() {
        let mut server = server();
        let id = server.new_user("Alice", true).unwrap().id();
        assert!(id.is_some());
        assert!(!server.get_user("alice").unwrap().is_known());
        // the known netmask improves the record
        let user = server.new_user("alice!a@host", true).unwrap();
        assert_eq!(id, user.id());
        assert_eq!("alice!a@host", user.fullform());
        assert_eq!(Err(Error::DuplicateUser { user: "ALICE!a@host".to_string(),
                server: "irc.example.net".to_string() }),
                server.new_user("ALICE!a@host", true).map(|u| u.fullform()));
        // hostname changed after identification
        let user = server.new_user("alice!a@cloak", false).unwrap();
        assert_eq!(id, user.id());
        assert_eq!("alice!a@cloak", user.fullform());
        // an unknown netmask never downgrades
        assert_eq!("alice!a@cloak", server.user("alice").unwrap().fullform());
        assert_eq!("alice!a@cloak", server.new_user("alice!*@cloak", true).unwrap().fullform());
        assert_eq!(1, server.users().len());
        assert!(matches!(server.new_user("b?b", true), Err(Error::InvalidUser(_))));
        assert_eq!(vec!["alice".to_string()], server.user_nicks());
    }

    #[test]
    fn test_new_user_keeps_away() {
        let mut server = server();
        server.user("alice").unwrap();
        let id = server.user_id("alice").unwrap();
        let idx = server.user_index("alice").unwrap();
        server.users.get_mut(idx).unwrap().set_away(Some("lunch"));
        server.user("alice!a@host").unwrap();
        assert_eq!(Some("lunch"), server.user_by_id(id).unwrap().away());
    }

    #[test]
    fn test_delete_user() {
        let mut server = server();
        server.new_channel("#a", None, &["alice!a@host", "bob!b@host"], true).unwrap();
        server.new_channel("#b", None, &["alice", "carol"], true).unwrap();
        server.set_mode("#a", 'o', Some("alice")).unwrap();
        server.set_mode("#b", 'v', Some("alice")).unwrap();
        let id = server.user_id("alice").unwrap();
        assert!(server.get_channel("#b").unwrap().has_user(id));

        let user = server.delete_user("alice!a@host").unwrap();
        assert_eq!("alice", user.nick());
        for name in &["#a", "#b"] {
            let ch = server.get_channel(name).unwrap();
            assert!(!ch.has_user(id));
            assert!(!ch.mode('o').unwrap().has_user(id));
            assert!(!ch.mode('v').unwrap().has_user(id));
        }
        assert!(server.find_users("alice").unwrap().is_empty());
        assert_eq!(Err(Error::UnmanagedUser("alice".to_string())),
                server.delete_user("alice").map(|u| u.fullform()));
        assert_eq!(ErrorKind::UnmanagedEntity,
                server.delete_user("alice").unwrap_err().kind());
    }

    #[test]
    fn test_delete_user_from_channel() {
        let mut server = server();
        server.new_channel("#a", None, &["alice"], true).unwrap();
        server.set_mode("#a", 'o', Some("alice")).unwrap();
        assert_eq!(Ok(true), server.delete_user_from_channel("alice", "#a"));
        assert_eq!(Ok(false), server.delete_user_from_channel("alice", "#a"));
        assert!(server.user_prefixes("#a", "alice", true).is_empty());
        assert!(server.has_user("alice"));
        assert!(matches!(server.delete_user_from_channel("bob", "#a"),
                Err(Error::UnmanagedUser(_))));
        assert!(matches!(server.delete_user_from_channel("alice", "#b"),
                Err(Error::UnmanagedChannel(_))));
        assert_eq!(Ok(true), server.add_user_to_channel("alice", "#a"));
        assert_eq!(Ok(false), server.add_user_to_channel("alice", "#a"));
    }

    #[test]
    fn test_find_users() {
        let mut server = server();
        for mask in &["alice!a@home.example", "alicia!x@work.example", "bob!b@home.example",
                "carl"] {
            server.user(mask).unwrap();
        }
        assert_eq!(vec!["alice", "alicia"], nicks(&server.find_users("ali*").unwrap()));
        // carl is not fully known, so only his nick is matched
        assert_eq!(vec!["bob", "carl"], nicks(&server.find_users("*!b@home.example").unwrap()));
        assert_eq!(vec!["alice"], nicks(&server.find_users("al*!?@home.*").unwrap()));
        // a wildcard user part matches by nick only
        assert_eq!(4, server.find_users("*!*@home.example").unwrap().len());
        // nick only: host is a wildcard
        assert_eq!(vec!["bob"], nicks(&server.find_users("BOB!b@*").unwrap()));
        assert_eq!(vec!["carl"], nicks(&server.find_users("c?rl!u@h").unwrap()));
        assert_eq!(vec!["alice"], nicks(&server.find_users("alice!a@home.example").unwrap()));
        assert!(server.find_users("alice!z@home.example").unwrap().is_empty());
    }

    #[test]
    fn test_casemap_lookup() {
        let mut server = server();
        server.new_channel("#[chan]", None, &["[nick]!u@h"], true).unwrap();
        assert!(server.has_channel("#{CHAN}"));
        assert!(server.has_user("{NICK}"));
        server.parse_isupport("CASEMAPPING=ascii");
        assert_eq!("ascii", server.casemap().name());
        assert!(!server.has_channel("#{chan}"));
        assert!(!server.has_user("{nick}"));
        assert!(server.has_user("[NICK]"));
        assert_eq!("ascii", server.get_user("[nick]").unwrap().casemap().name());
        assert_eq!("ascii", server.get_channel("#[chan]").unwrap().casemap().name());
        assert_eq!("ascii", server.new_netmask("a").unwrap().casemap().name());
        // unknown casemaps are ignored
        server.parse_isupport("CASEMAPPING=foo");
        assert_eq!("ascii", server.casemap().name());
        server.reset_capabilities();
        assert_eq!("rfc1459", server.casemap().name());
        assert!(server.has_user("{NICK}"));
    }

    #[test]
    fn test_casemap_switch_collisions() {
        let mut server = server();
        server.parse_isupport("CASEMAPPING=ascii");
        server.new_channel("#[x]", None, &["[a]!u@h"], true).unwrap();
        server.new_channel("#{x}", None, &["{a}!v@h", "[a]"], true).unwrap();
        let dropped = server.user_id("{a}").unwrap();
        assert_eq!(2, server.users().len());
        assert_eq!(2, server.channels().len());

        server.parse_isupport("CASEMAPPING=rfc1459");
        assert_eq!(vec!["{a}".to_string()], server.user_nicks());
        assert_eq!("[a]!u@h", server.get_user("{A}").unwrap().fullform());
        assert!(server.user_by_id(dropped).is_none());
        assert_eq!(vec!["#{x}".to_string()], server.channel_names());
        let ch = server.get_channel("#{x}").unwrap();
        assert_eq!("#[x]", ch.name());
        assert_eq!(1, ch.users().len());
        assert!(!ch.has_user(dropped));
    }

    #[test]
    fn test_modes() {
        let mut server = server();
        server.new_channel("#a", None, &["alice"], true).unwrap();
        server.set_mode("#a", 'b', Some("*!*@spam.example")).unwrap();
        server.set_mode("#a", 'b', Some("*!*@SPAM.example")).unwrap();
        server.set_mode("#a", 'k', Some("secret")).unwrap();
        server.set_mode("#a", 'l', Some("10")).unwrap();
        server.set_mode("#a", 'n', None).unwrap();
        server.set_mode("#a", 'o', Some("bob")).unwrap();
        {
            let ch = server.get_channel("#a").unwrap();
            assert_eq!(1, ch.mode('b').unwrap().masks().unwrap().len());
            assert_eq!(Some("secret"), ch.mode('k').unwrap().value());
            assert_eq!("+kln secret 10", ch.mode_string());
        }
        // the op was created as a user
        assert!(server.has_user("bob"));
        assert_eq!(Err(Error::ModeArgument('k')), server.set_mode("#a", 'k', None));
        assert_eq!(Err(Error::ModeArgument('b')), server.reset_mode("#a", 'b', None));
        assert_eq!(Err(Error::UnknownMode { channel: "#a".to_string(), letter: 'x' }),
                server.set_mode("#a", 'x', None));
        assert!(matches!(server.set_mode("#z", 'n', None), Err(Error::UnmanagedChannel(_))));

        server.reset_mode("#a", 'b', Some("*!*@spam.EXAMPLE")).unwrap();
        server.reset_mode("#a", 'k', Some("other")).unwrap();
        server.reset_mode("#a", 'l', None).unwrap();
        server.reset_mode("#a", 'o', Some("bob")).unwrap();
        server.reset_mode("#a", 'o', Some("nobody")).unwrap();
        assert!(!server.has_user("nobody"));
        let ch = server.get_channel("#a").unwrap();
        assert!(ch.mode('b').unwrap().masks().unwrap().is_empty());
        assert_eq!(Some("secret"), ch.mode('k').unwrap().value());
        assert_eq!(None, ch.mode('l').unwrap().value());
        assert!(!ch.mode('o').unwrap().is_set());
    }

    #[test]
    fn test_topic() {
        let mut server = server();
        server.channel("#a").unwrap();
        let when = Utc.ymd(2022, 1, 2).and_hms(3, 4, 5);
        server.set_topic("#a", "Welcome", "op!o@host", when).unwrap();
        let topic = server.get_channel("#a").unwrap().topic();
        assert_eq!("Welcome", topic.text);
        assert_eq!("op!o@host", topic.set_by.fullform());
        assert_eq!(when, topic.set_on);
        assert!(server.has_user("op"));
        assert!(matches!(server.set_topic("#b", "x", "op", when),
                Err(Error::UnmanagedChannel(_))));
    }

    #[test]
    fn test_rename_user() {
        let mut server = server();
        server.new_channel("#a", None, &["alice!a@host"], true).unwrap();
        server.set_mode("#a", 'o', Some("alice")).unwrap();
        server.user("bob").unwrap();
        let id = server.user_id("alice").unwrap();
        assert_eq!("alice2!a@host", server.rename_user("alice", "alice2").unwrap().fullform());
        assert!(!server.has_user("alice"));
        assert_eq!(Ok(id), server.user_id("ALICE2"));
        assert_eq!(vec!['@'], server.user_prefixes("#a", "alice2", false));
        // case-only change of the same user
        assert!(server.rename_user("alice2", "Alice2").is_ok());
        assert!(matches!(server.rename_user("alice2", "bob"), Err(Error::DuplicateUser { .. })));
        assert!(matches!(server.rename_user("nobody", "x"), Err(Error::UnmanagedUser(_))));
        assert!(matches!(server.rename_user("bob", "b*"), Err(Error::InvalidUser(_))));
        assert!(matches!(server.rename_user("bob", "x!y@z"), Err(Error::InvalidUser(_))));
        assert!(server.has_user("bob"));
        assert!(!server.has_user("x"));
    }

    #[test]
    fn test_user_prefixes() {
        let mut server = server();
        server.parse_isupport("PREFIX=(qov)~@+");
        server.new_channel("#a", None, &["alice", "bob"], true).unwrap();
        server.set_mode("#a", 'v', Some("alice")).unwrap();
        server.set_mode("#a", 'q', Some("alice")).unwrap();
        assert_eq!(vec!['~', '+'], server.user_prefixes("#a", "alice", true));
        assert_eq!(vec!['~'], server.user_prefixes("#a", "alice", false));
        assert!(server.user_prefixes("#a", "bob", true).is_empty());
        assert!(server.user_prefixes("#b", "alice", true).is_empty());
    }

    #[test]
    fn test_split_statusmsg_target() {
        let server = server();
        assert_eq!((vec!['@'], "#chan"), server.split_statusmsg_target("@#chan"));
        assert_eq!((vec!['@', '+'], "#chan"), server.split_statusmsg_target("@+#chan"));
        assert_eq!((vec![], "#chan"), server.split_statusmsg_target("#chan"));
        assert_eq!((vec![], "&local"), server.split_statusmsg_target("&local"));
        assert_eq!((vec![], ""), server.split_statusmsg_target("@nick"));
        assert_eq!((vec![], ""), server.split_statusmsg_target("@#"));
        assert_eq!((vec![], ""), server.split_statusmsg_target("@"));
        assert_eq!((vec![], ""), server.split_statusmsg_target(""));
        let mut server = server;
        server.parse_isupport("CHANTYPES=#+");
        // '+' is both a symbol and a channel type
        assert_eq!((vec!['@'], "+chan"), server.split_statusmsg_target("@+chan"));
        assert_eq!((vec!['+'], "#chan"), server.split_statusmsg_target("+#chan"));
    }

    #[test]
    fn test_user_or_channel() {
        let mut server = server();
        assert!(matches!(server.user_or_channel("#a"), Ok(Target::Channel(ch)) if ch.name() == "#a"));
        assert!(matches!(server.user_or_channel("alice"), Ok(Target::User(u)) if u.nick() == "alice"));
        assert!(server.has_channel("#a") && server.has_user("alice"));
    }

    #[test]
    fn test_capabilities() {
        let mut server = server();
        server.parse_capabilities("multi-prefix sasl=PLAIN");
        assert_eq!(2, server.capabilities().len());
        server.parse_capabilities("-sasl");
        assert_eq!(vec!["multi-prefix".to_string()],
                server.capabilities().keys().cloned().collect::<Vec<_>>());
    }

    #[test]
    fn test_reset_and_clear() {
        let mut server = server();
        server.new_channel("#a", None, &["alice"], true).unwrap();
        server.parse_capabilities("multi-prefix");
        server.reset_lists();
        assert!(server.channels().is_empty() && server.users().is_empty());
        assert_eq!(16, server.supports().nicklen);
        server.new_channel("#a", None, &["alice"], true).unwrap();
        server.clear();
        assert!(server.channels().is_empty() && server.users().is_empty());
        assert_eq!(Supports::default(), *server.supports());
        assert!(server.capabilities().is_empty());
        assert_eq!(None, server.hostname());
    }

    #[test]
    fn test_inspect() {
        let mut server = server();
        server.new_channel("#a", None, &["zed", "amy"], true).unwrap();
        let s = server.inspect();
        assert!(s.starts_with("<Server: server#"));
        assert!(s.contains("@hostname=\"irc.example.net\""));
        assert!(s.contains("@users=<amy, zed>"));
    }
}
