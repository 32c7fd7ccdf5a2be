// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Type Descriptor, Inline Type Definition and the position-keyed Type
//! Cache.

use std::collections::HashMap;

use rowan::TextRange;
use serde::{Deserialize, Serialize};

use crate::ident::SqlIdent;

/// An immutable tagged type value. Two `Type`s of the same tag with
/// different payloads are still comparable as "the same shape" via
/// `precedence_rank`; exact equality is only used by tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Type {
    Unknown,
    Numeric { precision: Option<(u8, u8)> },
    Text,
    Date,
    Timestamp,
    Boolean,
    Null,
    Record(Vec<(SqlIdent, Type)>),
    Collection(Box<Type>),
    Object(SqlIdent, SqlIdent),
    LobBinary,
    LobText,
    Cursor,
    Xml,
}

impl Type {
    pub fn numeric() -> Self {
        Self::Numeric { precision: None }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_date_like(&self) -> bool {
        matches!(self, Self::Date | Self::Timestamp)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Numeric { .. })
    }

    /// Precedence used by `NVL`/`COALESCE`/`DECODE` and CASE-branch
    /// unification: `TIMESTAMP > DATE > NUMERIC > TEXT`. Types
    /// outside this chain rank below `TEXT` but are never compared against
    /// each other by the emitter.
    fn precedence_rank(&self) -> u8 {
        match self {
            Self::Timestamp => 4,
            Self::Date => 3,
            Self::Numeric { .. } => 2,
            Self::Text => 1,
            _ => 0,
        }
    }

    /// Returns the higher-precedence of `self` and `other`. Symmetric by
    /// construction: `higher(a, b) == higher(b, a)`.
    pub fn higher<'a>(&'a self, other: &'a Self) -> &'a Self {
        if other.precedence_rank() > self.precedence_rank() {
            other
        } else {
            self
        }
    }
}

/// Inline composite/collection type definitions. All map to
/// the same semi-structured document representation at emission time; only
/// the field/element access compiled from them differs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InlineType {
    Record(Vec<(SqlIdent, String)>),
    TableOf(Box<InlineType>),
    /// Scalar element type named by its source type text, e.g. `NUMBER`.
    Scalar(String),
    Varray { element: String, bound: u32 },
    IndexBy { key_is_text: bool, element: String },
    RowType(SqlIdent),
    TypeRef(SqlIdent),
}

impl InlineType {
    /// Array-shaped collections (TABLE OF / VARRAY / INDEX BY integer) use
    /// 0-based array indices after the base shift; INDEX BY text collections
    /// are map-shaped and use the key verbatim.
    pub fn is_array_shaped(&self) -> bool {
        !matches!(self, Self::IndexBy { key_is_text: true, .. })
    }
}

/// Write-once map from a node's position span to its inferred [`Type`].
#[derive(Debug, Default)]
pub struct TypeCache {
    entries: HashMap<(u32, u32), Type>,
}

impl TypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(range: TextRange) -> (u32, u32) {
        (range.start().into(), range.end().into())
    }

    /// Records `ty` for `range`. Panics if an entry already exists for this
    /// span within the current analysis pass -- a write-once violation is a
    /// programming bug in the analyzer, not a translation failure.
    pub fn insert(&mut self, range: TextRange, ty: Type) {
        let key = Self::key(range);
        let previous = self.entries.insert(key, ty);
        assert!(
            previous.is_none(),
            "type cache is write-once per position span; {key:?} was written twice"
        );
    }

    pub fn get(&self, range: TextRange) -> Option<&Type> {
        self.entries.get(&Self::key(range))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_is_symmetric() {
        let pairs = [
            (Type::Timestamp, Type::Date),
            (Type::Date, Type::numeric()),
            (Type::numeric(), Type::Text),
            (Type::Text, Type::Unknown),
        ];
        for (a, b) in pairs {
            assert_eq!(a.higher(&b) == &a, b.higher(&a) == &a);
        }
    }

    #[test]
    fn higher_prefers_timestamp_over_date() {
        assert!(matches!(Type::Date.higher(&Type::Timestamp), Type::Timestamp));
    }

    #[test]
    #[should_panic(expected = "write-once")]
    fn cache_rejects_double_write() {
        let mut cache = TypeCache::new();
        let range = TextRange::new(0.into(), 1.into());
        cache.insert(range, Type::numeric());
        cache.insert(range, Type::Text);
    }

    #[test]
    fn index_by_text_is_map_shaped() {
        let map = InlineType::IndexBy {
            key_is_text: true,
            element: "NUMBER".to_owned(),
        };
        assert!(!map.is_array_shaped());

        let array = InlineType::IndexBy {
            key_is_text: false,
            element: "NUMBER".to_owned(),
        };
        assert!(array.is_array_shaped());
    }
}
