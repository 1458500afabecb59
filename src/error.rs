// error.rs - errors
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

use std::fmt;
use thiserror::Error;

/// Class of an error. Warnings never reach this type, they are only logged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidFormat,
    TypeMismatch,
    UnsupportedGlobVsGlob,
    DuplicateEntity,
    UnmanagedEntity,
    ResourceLimitExceeded,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidFormat => "invalid format",
            ErrorKind::TypeMismatch => "type mismatch",
            ErrorKind::UnsupportedGlobVsGlob => "unsupported glob against glob",
            ErrorKind::DuplicateEntity => "duplicate entity",
            ErrorKind::UnmanagedEntity => "unmanaged entity",
            ErrorKind::ResourceLimitExceeded => "resource limit exceeded",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error("{0:?} does not represent a valid netmask")]
    InvalidNetmask(String),
    #[error("{0:?} must not have globs (unescaped * or ?)")]
    InvalidUser(String),
    #[error("Invalid channel name {0:?}")]
    InvalidChannelName(String),
    #[error("Invalid glob pattern {0:?}")]
    InvalidGlob(String),
    #[error("Invalid MYINFO line {0:?}")]
    InvalidMyInfo(String),
    #[error("Mode {0} needs an argument")]
    ModeArgument(char),
    #[error("Channel {channel} has no mode {letter}")]
    UnknownMode { channel: String, letter: char },
    #[error("{element} is not bound like the list ({expected})")]
    TypeMismatch { element: String, expected: String },
    #[error("Casemap mismatch ({expected} != {got})")]
    CasemapMismatch { expected: String, got: String },
    #[error("Matching {0} against {1}: both have globs")]
    UnsupportedGlobVsGlob(String, String),
    #[error("Casemap {0:?} already exists")]
    DuplicateCasemap(String),
    #[error("Casemap {0:?} has upper and lower sets of different length")]
    InvalidCasemap(String),
    #[error("Unknown casemap {0:?}")]
    UnknownCasemap(String),
    #[error("Channel {channel} already exists on server {server}")]
    DuplicateChannel { channel: String, server: String },
    #[error("User {user} already exists on server {server}")]
    DuplicateUser { user: String, server: String },
    #[error("Tried to remove unmanaged channel {0}")]
    UnmanagedChannel(String),
    #[error("Tried to remove unmanaged user {0}")]
    UnmanagedUser(String),
    #[error("Already joined {count} channels with prefix {prefixes}")]
    ChannelLimitExceeded { prefixes: String, count: usize },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        use Error::*;
        match self {
            InvalidNetmask(_) | InvalidUser(_) | InvalidChannelName(_) | InvalidGlob(_) | InvalidMyInfo(_)
            | ModeArgument(_) | UnknownMode { .. } | InvalidCasemap(_) | UnknownCasemap(_) => {
                ErrorKind::InvalidFormat
            }
            TypeMismatch { .. } | CasemapMismatch { .. } => ErrorKind::TypeMismatch,
            UnsupportedGlobVsGlob(_, _) => ErrorKind::UnsupportedGlobVsGlob,
            DuplicateCasemap(_) | DuplicateChannel { .. } | DuplicateUser { .. } => {
                ErrorKind::DuplicateEntity
            }
            UnmanagedChannel(_) | UnmanagedUser(_) => ErrorKind::UnmanagedEntity,
            ChannelLimitExceeded { .. } => ErrorKind::ResourceLimitExceeded,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
