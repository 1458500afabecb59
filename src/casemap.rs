// casemap.rs - IRC casemaps
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

//! Due to its Scandinavian origins, IRC considers `{}|^` to be the lowercase
//! equivalents of `[]\~`. Not every server agrees: some use plain ASCII folding,
//! others leave `^`/`~` alone. A casemap names one such folding table.

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};
use tracing::*;

use crate::error::{Error, Result};

pub const RFC1459: &str = "rfc1459";
pub const STRICT_RFC1459: &str = "strict-rfc1459";
pub const ASCII: &str = "ascii";

/// Direction of a fold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fold {
    Down,
    Up,
}

#[derive(Debug)]
struct CasemapTable {
    name: String,
    upper: String,
    lower: String,
    downcase: HashMap<char, char>,
    upcase: HashMap<char, char>,
}

/// Handle to a registered casemap. Cloning is cheap, equality is by name.
#[derive(Clone)]
pub struct Casemap(Arc<CasemapTable>);

lazy_static! {
    static ref CASEMAPS: RwLock<HashMap<String, Casemap>> = {
        let mut map = HashMap::new();
        for (name, upper, lower) in &[
            (RFC1459, "A-^", "a-~"),
            (STRICT_RFC1459, "A-]", "a-}"),
            (ASCII, "A-Z", "a-z"),
        ] {
            map.insert(name.to_string(), Casemap::from_sets(name, upper, lower));
        }
        RwLock::new(map)
    };
}

// expand tr-style character sets: "A-Z" is the range, a leading or trailing '-'
// is literal.
fn expand_set(set: &str) -> Vec<char> {
    let chars = set.chars().collect::<Vec<_>>();
    let mut out = vec![];
    let mut i = 0;
    while i < chars.len() {
        if i + 2 < chars.len() && chars[i + 1] == '-' && chars[i] <= chars[i + 2] {
            out.extend(chars[i]..=chars[i + 2]);
            i += 3;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

/// Register a new casemap. Upper and lower sets use `tr` notation and must expand
/// to the same length.
pub fn register(name: &str, upper: &str, lower: &str) -> Result<Casemap> {
    let mut casemaps = CASEMAPS.write().unwrap_or_else(|e| e.into_inner());
    if casemaps.contains_key(name) {
        return Err(Error::DuplicateCasemap(name.to_string()));
    }
    let cm = Casemap::build(name, upper, lower)?;
    debug!("Registered casemap {:?}", cm);
    casemaps.insert(name.to_string(), cm.clone());
    Ok(cm)
}

/// Find a registered casemap by name.
pub fn lookup(name: &str) -> Result<Casemap> {
    let casemaps = CASEMAPS.read().unwrap_or_else(|e| e.into_inner());
    casemaps
        .get(name)
        .cloned()
        .ok_or_else(|| Error::UnknownCasemap(name.to_string()))
}

/// Names of all registered casemaps, sorted.
pub fn names() -> Vec<String> {
    let casemaps = CASEMAPS.read().unwrap_or_else(|e| e.into_inner());
    let mut names = casemaps.keys().cloned().collect::<Vec<_>>();
    names.sort();
    names
}

impl Casemap {
    fn build(name: &str, upper: &str, lower: &str) -> Result<Casemap> {
        if expand_set(upper).len() != expand_set(lower).len() {
            return Err(Error::InvalidCasemap(name.to_string()));
        }
        Ok(Casemap::from_sets(name, upper, lower))
    }

    // pairs positions up to the shorter set
    fn from_sets(name: &str, upper: &str, lower: &str) -> Casemap {
        let up = expand_set(upper);
        let low = expand_set(lower);
        let mut downcase = HashMap::new();
        let mut upcase = HashMap::new();
        for (u, l) in up.iter().zip(low.iter()) {
            downcase.entry(*u).or_insert(*l);
            upcase.entry(*l).or_insert(*u);
        }
        Casemap(Arc::new(CasemapTable {
            name: name.to_string(),
            upper: upper.to_string(),
            lower: lower.to_string(),
            downcase,
            upcase,
        }))
    }

    pub fn rfc1459() -> Casemap {
        Casemap::default()
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn upper(&self) -> &str {
        &self.0.upper
    }

    pub fn lower(&self) -> &str {
        &self.0.lower
    }

    pub fn fold(&self, s: &str, dir: Fold) -> String {
        let table = match dir {
            Fold::Down => &self.0.downcase,
            Fold::Up => &self.0.upcase,
        };
        s.chars().map(|c| *table.get(&c).unwrap_or(&c)).collect()
    }

    pub fn downcase_char(&self, c: char) -> char {
        *self.0.downcase.get(&c).unwrap_or(&c)
    }

    pub fn downcase(&self, s: &str) -> String {
        self.fold(s, Fold::Down)
    }

    pub fn upcase(&self, s: &str) -> String {
        self.fold(s, Fold::Up)
    }

    /// Case-insensitive equality under this casemap.
    pub fn eq_fold(&self, a: &str, b: &str) -> bool {
        a.chars().count() == b.chars().count() && self.downcase(a) == self.downcase(b)
    }

    pub fn must_be(&self, other: &Casemap) -> Result<()> {
        if self == other {
            Ok(())
        } else {
            Err(Error::CasemapMismatch {
                expected: self.name().to_string(),
                got: other.name().to_string(),
            })
        }
    }

    pub fn inspect(&self) -> String {
        format!("<Casemap: {:?} ~({})~ {:?}>", self.upper(), self.name(), self.lower())
    }
}

impl Default for Casemap {
    fn default() -> Self {
        lookup(RFC1459).unwrap_or_else(|_| Casemap::from_sets(RFC1459, "A-^", "a-~"))
    }
}

impl PartialEq for Casemap {
    fn eq(&self, other: &Self) -> bool {
        self.0.name == other.0.name
    }
}

impl Eq for Casemap {}

impl Hash for Casemap {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.name.hash(state);
    }
}

impl fmt::Display for Casemap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Debug for Casemap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inspect())
    }
}

/// IRC case folding on plain text with an explicit casemap.
pub trait IrcCase {
    fn irc_downcase(&self, casemap: &Casemap) -> String;
    fn irc_upcase(&self, casemap: &Casemap) -> String;
}

impl IrcCase for str {
    fn irc_downcase(&self, casemap: &Casemap) -> String {
        casemap.downcase(self)
    }

    fn irc_upcase(&self, casemap: &Casemap) -> String {
        casemap.upcase(self)
    }
}
