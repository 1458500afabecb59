// list.rs - lists of entities
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

//! `ListOf<T>` keeps entities of one type. A list that belongs to a server only
//! accepts entities bound to the same server; every inserting operation checks
//! its arguments first and changes nothing on failure.

use std::fmt;
use std::ops;
use std::slice;

use crate::error::{Error, Result};
use crate::netmask::ServerId;

/// Entity that can be kept in a `ListOf`.
pub trait Member {
    fn server_id(&self) -> Option<ServerId>;
    fn describe(&self) -> String;
}

#[derive(Clone)]
pub struct ListOf<T> {
    scope: Option<ServerId>,
    items: Vec<T>,
}

impl<T: Member> ListOf<T> {
    /// List accepting any element.
    pub fn new() -> ListOf<T> {
        ListOf { scope: None, items: vec![] }
    }

    /// List accepting only elements bound to the given server.
    pub fn for_server(id: ServerId) -> ListOf<T> {
        ListOf { scope: Some(id), items: vec![] }
    }

    pub fn from_vec(scope: Option<ServerId>, items: Vec<T>) -> Result<ListOf<T>> {
        let mut list = ListOf { scope, items: vec![] };
        list.concat(items)?;
        Ok(list)
    }

    pub fn scope(&self) -> Option<ServerId> {
        self.scope
    }

    pub fn will_accept(&self, el: &T) -> bool {
        match self.scope {
            None => true,
            Some(id) => el.server_id() == Some(id),
        }
    }

    fn check(&self, el: &T) -> Result<()> {
        if self.will_accept(el) {
            Ok(())
        } else {
            Err(Error::TypeMismatch {
                element: el.describe(),
                expected: match self.scope {
                    Some(id) => id.to_string(),
                    None => "unbound".to_string(),
                },
            })
        }
    }

    /// True if every element fits the list's scope.
    pub fn is_valid(&self) -> bool {
        self.items.iter().all(|el| self.will_accept(el))
    }

    pub fn push(&mut self, el: T) -> Result<()> {
        self.check(&el)?;
        self.items.push(el);
        Ok(())
    }

    pub fn insert(&mut self, idx: usize, el: T) -> Result<()> {
        self.check(&el)?;
        self.items.insert(idx.min(self.items.len()), el);
        Ok(())
    }

    pub fn concat(&mut self, els: Vec<T>) -> Result<()> {
        els.iter().try_for_each(|el| self.check(el))?;
        self.items.extend(els);
        Ok(())
    }

    /// Replace the whole content.
    pub fn replace(&mut self, els: Vec<T>) -> Result<()> {
        els.iter().try_for_each(|el| self.check(el))?;
        self.items = els;
        Ok(())
    }

    pub fn remove(&mut self, idx: usize) -> Option<T> {
        if idx < self.items.len() {
            Some(self.items.remove(idx))
        } else {
            None
        }
    }

    pub fn retain<F: FnMut(&T) -> bool>(&mut self, f: F) {
        self.items.retain(f);
    }

    pub fn position<P: FnMut(&T) -> bool>(&self, p: P) -> Option<usize> {
        self.items.iter().position(p)
    }

    pub fn get(&self, idx: usize) -> Option<&T> {
        self.items.get(idx)
    }

    pub(crate) fn get_mut(&mut self, idx: usize) -> Option<&mut T> {
        self.items.get_mut(idx)
    }

    pub(crate) fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T: Member + PartialEq> ListOf<T> {
    pub fn contains(&self, el: &T) -> bool {
        self.items.contains(el)
    }

    /// Append unless an equal element is already there.
    pub fn push_unique(&mut self, el: T) -> Result<bool> {
        if self.contains(&el) {
            self.check(&el)?;
            Ok(false)
        } else {
            self.push(el)?;
            Ok(true)
        }
    }

    /// Remove all elements equal to `el`; returns the last removed.
    pub fn delete(&mut self, el: &T) -> Option<T> {
        let mut removed = None;
        let mut i = 0;
        while i < self.items.len() {
            if &self.items[i] == el {
                removed = Some(self.items.remove(i));
            } else {
                i += 1;
            }
        }
        removed
    }
}

impl<T: Member> Default for ListOf<T> {
    fn default() -> Self {
        ListOf::new()
    }
}

impl<T> ops::Index<usize> for ListOf<T> {
    type Output = T;

    fn index(&self, idx: usize) -> &T {
        &self.items[idx]
    }
}

impl<'a, T> IntoIterator for &'a ListOf<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Member> fmt::Debug for ListOf<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scope = self.scope.map(|id| id.to_string()).unwrap_or_else(|| "*".to_string());
        write!(f, "<ListOf[{}]: ", scope)?;
        f.debug_list().entries(self.items.iter().map(|el| el.describe())).finish()?;
        f.write_str(">")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::casemap::Casemap;
    use crate::netmask::{Binding, Netmask};

    fn bound(s: &str, id: ServerId) -> Netmask {
        Netmask::with_binding(s, Binding::server(id, &Casemap::default(), None).unwrap())
            .unwrap()
    }

    #[test]
    fn test_unscoped_list() {
        let id = ServerId::next();
        let mut list = ListOf::new();
        list.push(Netmask::new("a!b@c").unwrap()).unwrap();
        list.push(bound("d!e@f", id)).unwrap();
        assert_eq!(2, list.len());
        assert!(list.is_valid());
    }

    #[test]
    fn test_scoped_list() {
        let id = ServerId::next();
        let other = ServerId::next();
        let mut list = ListOf::for_server(id);
        assert!(list.push(bound("a!b@c", id)).is_ok());
        assert!(matches!(list.push(bound("a!b@c", other)), Err(Error::TypeMismatch { .. })));
        assert!(matches!(list.push(Netmask::new("x!y@z").unwrap()),
                Err(Error::TypeMismatch { .. })));
        // all or nothing
        assert!(list.concat(vec![bound("q!q@q", id), bound("r!r@r", other)]).is_err());
        assert_eq!(1, list.len());
        assert!(list.replace(vec![bound("q!q@q", id), bound("r!r@r", id)]).is_ok());
        assert_eq!(vec!["q!q@q", "r!r@r"],
                list.iter().map(|n| n.fullform()).collect::<Vec<_>>());
        assert!(list.insert(0, bound("s!s@s", id)).is_ok());
        assert_eq!("s!s@s", list.first().unwrap().fullform());
    }

    #[test]
    fn test_push_unique_and_delete() {
        let mut list = ListOf::new();
        assert_eq!(Ok(true), list.push_unique(Netmask::new("a!b@c").unwrap()));
        assert_eq!(Ok(false), list.push_unique(Netmask::new("A!B@C").unwrap()));
        assert_eq!(1, list.len());
        assert!(list.contains(&Netmask::new("a!b@C").unwrap()));
        assert!(list.delete(&Netmask::new("a!B@c").unwrap()).is_some());
        assert!(list.is_empty());
        assert!(list.delete(&Netmask::new("a!B@c").unwrap()).is_none());
        assert!(list.remove(3).is_none());
    }
}
