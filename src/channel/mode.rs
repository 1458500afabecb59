// mode.rs - channel modes
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

use crate::error::{Error, Result};
use crate::list::ListOf;
use crate::netmask::{Netmask, ServerId};
use crate::user::UserId;

/// Category of a channel mode, as advertised by CHANMODES and PREFIX.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModeKind {
    /// address lists (bans, exceptions)
    TypeA,
    /// needs a parameter on set and reset
    TypeB,
    /// needs a parameter when set only
    TypeC,
    /// never has a parameter
    TypeD,
    /// grants a membership prefix to users
    UserMode,
}

/// What a mode argument must resolve to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgKind {
    None,
    Text,
    Mask,
    User,
}

impl ModeKind {
    pub fn set_arg(self) -> ArgKind {
        match self {
            ModeKind::TypeA => ArgKind::Mask,
            ModeKind::TypeB | ModeKind::TypeC => ArgKind::Text,
            ModeKind::TypeD => ArgKind::None,
            ModeKind::UserMode => ArgKind::User,
        }
    }

    pub fn reset_arg(self) -> ArgKind {
        match self {
            ModeKind::TypeA => ArgKind::Mask,
            ModeKind::TypeB => ArgKind::Text,
            ModeKind::TypeC | ModeKind::TypeD => ArgKind::None,
            ModeKind::UserMode => ArgKind::User,
        }
    }
}

/// Resolved mode argument.
#[derive(Clone, Debug)]
pub enum ModeArg {
    None,
    Text(String),
    Mask(Netmask),
    User(UserId),
}

#[derive(Clone, Debug)]
pub enum Mode {
    TypeA(ListOf<Netmask>),
    TypeB(Option<String>),
    TypeC(Option<String>),
    TypeD(bool),
    UserMode(ListOf<UserId>),
}

impl Mode {
    pub fn new(kind: ModeKind, scope: Option<ServerId>) -> Mode {
        match kind {
            ModeKind::TypeA => Mode::TypeA(match scope {
                Some(id) => ListOf::for_server(id),
                None => ListOf::new(),
            }),
            ModeKind::TypeB => Mode::TypeB(None),
            ModeKind::TypeC => Mode::TypeC(None),
            ModeKind::TypeD => Mode::TypeD(false),
            ModeKind::UserMode => Mode::UserMode(match scope {
                Some(id) => ListOf::for_server(id),
                None => ListOf::new(),
            }),
        }
    }

    pub fn kind(&self) -> ModeKind {
        match self {
            Mode::TypeA(_) => ModeKind::TypeA,
            Mode::TypeB(_) => ModeKind::TypeB,
            Mode::TypeC(_) => ModeKind::TypeC,
            Mode::TypeD(_) => ModeKind::TypeD,
            Mode::UserMode(_) => ModeKind::UserMode,
        }
    }

    /// Argument of a type B or C mode.
    pub fn value(&self) -> Option<&str> {
        match self {
            Mode::TypeB(v) | Mode::TypeC(v) => v.as_deref(),
            _ => None,
        }
    }

    /// A type D flag is set, a type B/C mode has a value, a list is not empty.
    pub fn is_set(&self) -> bool {
        match self {
            Mode::TypeA(list) => !list.is_empty(),
            Mode::TypeB(v) | Mode::TypeC(v) => v.is_some(),
            Mode::TypeD(set) => *set,
            Mode::UserMode(list) => !list.is_empty(),
        }
    }

    pub fn masks(&self) -> Option<&ListOf<Netmask>> {
        match self {
            Mode::TypeA(list) => Some(list),
            _ => None,
        }
    }

    pub fn users(&self) -> Option<&ListOf<UserId>> {
        match self {
            Mode::UserMode(list) => Some(list),
            _ => None,
        }
    }

    pub fn has_user(&self, user: UserId) -> bool {
        self.users().map(|list| list.contains(&user)).unwrap_or(false)
    }

    pub fn set(&mut self, letter: char, arg: ModeArg) -> Result<()> {
        match (self, arg) {
            (Mode::TypeA(list), ModeArg::Mask(nm)) => {
                list.push_unique(nm)?;
            }
            (Mode::TypeB(v), ModeArg::Text(t)) | (Mode::TypeC(v), ModeArg::Text(t)) => {
                *v = Some(t);
            }
            (Mode::TypeD(set), _) => *set = true,
            (Mode::UserMode(list), ModeArg::User(id)) => {
                list.push_unique(id)?;
            }
            _ => return Err(Error::ModeArgument(letter)),
        }
        Ok(())
    }

    pub fn reset(&mut self, letter: char, arg: ModeArg) -> Result<()> {
        match (self, arg) {
            (Mode::TypeA(list), ModeArg::Mask(nm)) => {
                list.delete(&nm);
            }
            (Mode::TypeB(v), ModeArg::Text(t)) => {
                if v.as_deref() == Some(t.as_str()) {
                    *v = None;
                }
            }
            (Mode::TypeC(v), _) => *v = None,
            (Mode::TypeD(set), _) => *set = false,
            (Mode::UserMode(list), ModeArg::User(id)) => {
                list.delete(&id);
            }
            _ => return Err(Error::ModeArgument(letter)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_mode_kinds() {
        assert_eq!(ArgKind::Mask, ModeKind::TypeA.set_arg());
        assert_eq!(ArgKind::Text, ModeKind::TypeB.reset_arg());
        assert_eq!(ArgKind::Text, ModeKind::TypeC.set_arg());
        assert_eq!(ArgKind::None, ModeKind::TypeC.reset_arg());
        assert_eq!(ArgKind::None, ModeKind::TypeD.set_arg());
        assert_eq!(ArgKind::User, ModeKind::UserMode.reset_arg());
        assert_eq!(ModeKind::UserMode, Mode::new(ModeKind::UserMode, None).kind());
    }

    #[test]
    fn test_mode_type_a() {
        let mut mode = Mode::new(ModeKind::TypeA, None);
        mode.set('b', ModeArg::Mask(Netmask::new("*!*@bad.host").unwrap())).unwrap();
        mode.set('b', ModeArg::Mask(Netmask::new("*!*@BAD.host").unwrap())).unwrap();
        assert_eq!(1, mode.masks().unwrap().len());
        assert!(mode.is_set());
        mode.reset('b', ModeArg::Mask(Netmask::new("*!*@bad.HOST").unwrap())).unwrap();
        assert!(!mode.is_set());
        assert_eq!(Err(Error::ModeArgument('b')), mode.set('b', ModeArg::None));
    }

    #[test]
    fn test_mode_type_b() {
        let mut mode = Mode::new(ModeKind::TypeB, None);
        mode.set('k', ModeArg::Text("secret".to_string())).unwrap();
        assert_eq!(Some("secret"), mode.value());
        mode.reset('k', ModeArg::Text("wrong".to_string())).unwrap();
        assert_eq!(Some("secret"), mode.value());
        mode.reset('k', ModeArg::Text("secret".to_string())).unwrap();
        assert_eq!(None, mode.value());
        assert_eq!(Err(Error::ModeArgument('k')), mode.reset('k', ModeArg::None));
    }

    #[test]
    fn test_mode_type_c_and_d() {
        let mut mode = Mode::new(ModeKind::TypeC, None);
        mode.set('l', ModeArg::Text("10".to_string())).unwrap();
        assert_eq!(Some("10"), mode.value());
        mode.reset('l', ModeArg::None).unwrap();
        assert_eq!(None, mode.value());

        let mut mode = Mode::new(ModeKind::TypeD, None);
        assert!(!mode.is_set());
        mode.set('n', ModeArg::None).unwrap();
        assert!(mode.is_set());
        mode.reset('n', ModeArg::None).unwrap();
        assert!(!mode.is_set());
    }

    #[test]
    fn test_mode_user() {
        let server = ServerId::next();
        let other = ServerId::next();
        let mut mode = Mode::new(ModeKind::UserMode, Some(server));
        let id = UserId::new(server, 1);
        mode.set('o', ModeArg::User(id)).unwrap();
        mode.set('o', ModeArg::User(id)).unwrap();
        assert_eq!(1, mode.users().unwrap().len());
        assert!(mode.has_user(id));
        assert!(matches!(mode.set('o', ModeArg::User(UserId::new(other, 1))),
                Err(Error::TypeMismatch { .. })));
        mode.reset('o', ModeArg::User(id)).unwrap();
        assert!(!mode.has_user(id));
    }
}
