// glob.rs - IRC glob patterns
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

//! IRC has a very primitive concept of globs: `*` stands for any number of
//! arbitrary characters and `?` for exactly one. Both can be escaped with a
//! backslash. There is no way to escape the backslash itself, so a pattern
//! can not express a literal backslash followed by a wildcard.

use regex::Regex;
use std::fmt;

use crate::error::{Error, Result};

fn is_glob_char(c: char) -> bool {
    c == '*' || c == '?'
}

/// True if the string has an unescaped `*` or `?`.
pub fn has_glob(s: &str) -> bool {
    let mut prev: Option<char> = None;
    for c in s.chars() {
        if is_glob_char(c) && prev != Some('\\') {
            return true;
        }
        prev = Some(c);
    }
    false
}

/// Drop the backslash in front of escaped wildcards.
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' && chars.peek().map_or(false, |&n| is_glob_char(n)) {
            continue;
        }
        out.push(c);
    }
    out
}

/// Compiled glob pattern.
#[derive(Clone)]
pub struct Glob {
    source: String,
    regex: Regex,
}

impl Glob {
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whole-string match of a candidate.
    pub fn is_match(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }
}

impl fmt::Debug for Glob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Glob")
            .field("source", &self.source)
            .field("regex", &self.regex.as_str())
            .finish()
    }
}

impl fmt::Display for Glob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Compile a glob. Escaped wildcards become literal characters.
pub fn compile(s: &str) -> Result<Glob> {
    compile_folded(s, |c| c)
}

/// Compile a glob, passing every literal character through `fold` after the
/// escapes are resolved. Folding never turns a literal into a wildcard.
pub fn compile_folded<F: Fn(char) -> char>(s: &str, fold: F) -> Result<Glob> {
    let mut pattern = String::with_capacity(s.len() + 2);
    pattern.push('^');
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                Some(&next) if is_glob_char(next) => {
                    pattern.push_str(&regex::escape(&fold(next).to_string()));
                    chars.next();
                }
                _ => pattern.push_str(&regex::escape(&fold('\\').to_string())),
            },
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            _ => pattern.push_str(&regex::escape(&fold(c).to_string())),
        }
    }
    pattern.push('$');
    let regex = Regex::new(&pattern).map_err(|_| Error::InvalidGlob(s.to_string()))?;
    Ok(Glob { source: s.to_string(), regex })
}

/// Compile `pattern` and match `candidate` against it.
pub fn glob_match(pattern: &str, candidate: &str) -> Result<bool> {
    Ok(compile(pattern)?.is_match(candidate))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_has_glob() {
        assert!(has_glob("*"));
        assert!(has_glob("?abc"));
        assert!(has_glob("ab*c"));
        assert!(has_glob("abc?"));
        assert!(!has_glob("abc"));
        assert!(!has_glob(""));
        assert!(!has_glob("ab\\*c"));
        assert!(!has_glob("\\?"));
        assert!(has_glob("\\**"));
        // backslash can not be escaped
        assert!(!has_glob("a\\\\*"));
        assert!(!has_glob("x\\*"));
    }

    #[test]
    fn test_compile() {
        let g = compile("ni*k").unwrap();
        assert!(g.is_match("nik"));
        assert!(g.is_match("nick"));
        assert!(g.is_match("nixxxk"));
        assert!(!g.is_match("nic"));
        assert!(!g.is_match("xnick"));

        let g = compile("n?ck").unwrap();
        assert!(g.is_match("nick"));
        assert!(g.is_match("neck"));
        assert!(!g.is_match("nck"));
        assert!(!g.is_match("niick"));

        let g = compile("*").unwrap();
        assert!(g.is_match(""));
        assert!(g.is_match("anything at all"));
    }

    #[test]
    fn test_compile_escapes() {
        let g = compile("a\\*b").unwrap();
        assert!(g.is_match("a*b"));
        assert!(!g.is_match("axb"));
        let g = compile("what\\?").unwrap();
        assert!(g.is_match("what?"));
        assert!(!g.is_match("whats"));
        // regex metacharacters are literal
        let g = compile("a.b[c]+(d)|e^$").unwrap();
        assert!(g.is_match("a.b[c]+(d)|e^$"));
        assert!(!g.is_match("axb[c]+(d)|e^$"));
        // a backslash not before a wildcard is literal
        let g = compile("a\\b").unwrap();
        assert!(g.is_match("a\\b"));
        // the first backslash stays literal, the second escapes the star
        let g = compile("a\\\\*").unwrap();
        assert!(g.is_match("a\\*"));
        assert!(!g.is_match("a\\xyz"));
    }

    #[test]
    fn test_literal_matches_only_itself() {
        for s in &["nick", "Nick[away]", "a.b", "foo-bar_baz"] {
            let g = compile(s).unwrap();
            assert!(g.is_match(s));
            assert!(!g.is_match(&format!("{}x", s)));
            assert!(!g.is_match(&format!("x{}", s)));
        }
    }

    #[test]
    fn test_unescape() {
        assert_eq!("a*b", unescape("a\\*b"));
        assert_eq!("what?", unescape("what\\?"));
        assert_eq!("a\\b", unescape("a\\b"));
        assert_eq!("plain", unescape("plain"));
    }

    #[test]
    fn test_compile_folded() {
        let fold = |c: char| if c == '\\' { '|' } else { c.to_ascii_lowercase() };
        let g = compile_folded("Ni\\?K*", fold).unwrap();
        assert!(g.is_match("ni?kname"));
        assert!(!g.is_match("nixkname"));
        let g = compile_folded("A\\B*", fold).unwrap();
        assert!(g.is_match("a|b"));
        assert!(!g.is_match("a\\b"));
    }

    #[test]
    fn test_glob_match() {
        assert_eq!(Ok(true), glob_match("*.example.org", "irc.example.org"));
        assert_eq!(Ok(false), glob_match("*.example.org", "example.org"));
        assert_eq!("*.org", compile("*.org").unwrap().to_string());
    }
}
