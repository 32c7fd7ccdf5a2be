// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Case-insensitive SQL identifiers.
//!
//! Oracle (and PostgreSQL) fold unquoted identifiers to a canonical case and
//! compare them case-insensitively, but leave quoted identifiers exactly as
//! written. [`SqlIdent`] is the single key type used by the metadata index,
//! scope engine and package context store so that every layer agrees on what
//! "the same name" means.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

#[derive(Clone, Debug, Eq, Serialize, Deserialize)]
pub struct SqlIdent {
    name: String,
    is_quoted: bool,
}

impl SqlIdent {
    pub fn new<S>(name: S, is_quoted: bool) -> Self
    where
        S: Into<String>,
    {
        Self {
            name: name.into(),
            is_quoted,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// The canonical lower-cased form used as a map key.
    pub fn canonical(&self) -> String {
        if self.is_quoted {
            self.name.clone()
        } else {
            self.name.to_lowercase()
        }
    }
}

impl From<&str> for SqlIdent {
    fn from(s: &str) -> Self {
        if s.starts_with('"') && s.ends_with('"') && s.len() >= 2 {
            Self::new(s[1..s.len() - 1].replace("\"\"", "\""), true)
        } else {
            Self::new(s, false)
        }
    }
}

impl From<String> for SqlIdent {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl fmt::Display for SqlIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_quoted {
            write!(f, "\"{}\"", self.name.replace('\"', "\"\""))
        } else {
            write!(f, "{}", self.name)
        }
    }
}

impl PartialEq for SqlIdent {
    fn eq(&self, other: &Self) -> bool {
        if self.is_quoted != other.is_quoted {
            return false;
        }
        if self.is_quoted {
            self.name == other.name
        } else {
            self.name.eq_ignore_ascii_case(&other.name)
        }
    }
}

impl Hash for SqlIdent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.is_quoted.hash(state);
        if self.is_quoted {
            self.name.hash(state);
        } else {
            self.name.to_lowercase().hash(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unquoted_idents_compare_case_insensitively() {
        assert_eq!(SqlIdent::from("Foo_Bar"), SqlIdent::from("FOO_BAR"));
        assert_eq!(SqlIdent::from("foo_bar"), SqlIdent::from("foo_bar"));
    }

    #[test]
    fn quoted_idents_compare_exactly() {
        assert_ne!(SqlIdent::from("\"Foo\""), SqlIdent::from("\"foo\""));
        assert_eq!(SqlIdent::from("\"Foo\""), SqlIdent::from("\"Foo\""));
        assert_ne!(SqlIdent::from("\"Foo\""), SqlIdent::from("Foo"));
    }
}
