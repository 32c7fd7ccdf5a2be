// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Pseudo-column and builtin-function return-type rules.
//! A process-level, read-only registry -- every translation consults the
//! same tables, so lookups never depend on session state.

use std::collections::HashSet;

use lazy_static::lazy_static;

use crate::types::Type;

lazy_static! {
    static ref BUILTIN_FUNCTION_NAMES: HashSet<&'static str> = HashSet::from([
        "ROUND", "TRUNC", "NVL", "COALESCE", "DECODE", "SUM", "AVG", "MIN", "MAX", "COUNT",
        "TO_CHAR", "TO_NUMBER", "TO_DATE", "TO_TIMESTAMP", "NULLIF", "LENGTH", "SUBSTR", "UPPER",
        "LOWER", "TRIM", "LPAD", "RPAD", "INSTR", "REPLACE", "NVL2",
    ]);
    static ref PSEUDO_COLUMN_NAMES: HashSet<&'static str> =
        HashSet::from(["SYSDATE", "SYSTIMESTAMP", "ROWNUM", "LEVEL", "UID", "USER", "ROWID", "SESSIONTIMEZONE"]);
}

/// `true` when `name` is a recognized builtin or pseudo-column -- used by the
/// emitter to decide whether an unresolved bare name is an external callable
/// or genuinely unknown.
pub fn is_builtin_name(name: &str) -> bool {
    let upper = name.to_uppercase();
    BUILTIN_FUNCTION_NAMES.contains(upper.as_str()) || PSEUDO_COLUMN_NAMES.contains(upper.as_str())
}

pub fn pseudo_column_type(name: &str) -> Option<Type> {
    match name.to_uppercase().as_str() {
        "SYSDATE" => Some(Type::Date),
        "SYSTIMESTAMP" => Some(Type::Timestamp),
        "ROWNUM" | "LEVEL" | "UID" => Some(Type::numeric()),
        "USER" | "ROWID" | "SESSIONTIMEZONE" => Some(Type::Text),
        _ => None,
    }
}

/// Return type of a builtin function call given its already-analyzed
/// argument types. `None` means "not a recognized builtin" -- the caller
/// falls through to schema-function / unknown-name handling.
pub fn builtin_return_type(name: &str, args: &[Type]) -> Option<Type> {
    match name.to_uppercase().as_str() {
        "ROUND" | "TRUNC" => Some(args.first().cloned().unwrap_or(Type::Unknown)),
        "NVL" | "COALESCE" | "DECODE" | "NVL2" => Some(highest_precedence(args)),
        "SUM" | "AVG" | "MIN" | "MAX" => Some(args.first().cloned().unwrap_or(Type::Unknown)),
        "COUNT" => Some(Type::numeric()),
        "TO_CHAR" | "UPPER" | "LOWER" | "TRIM" | "LPAD" | "RPAD" | "SUBSTR" | "REPLACE" => {
            Some(Type::Text)
        }
        "TO_NUMBER" | "LENGTH" | "INSTR" => Some(Type::numeric()),
        "TO_DATE" => Some(Type::Date),
        "TO_TIMESTAMP" => Some(Type::Timestamp),
        "NULLIF" => Some(args.first().cloned().unwrap_or(Type::Unknown)),
        _ => None,
    }
}

fn highest_precedence(args: &[Type]) -> Type {
    let mut iter = args.iter();
    let Some(first) = iter.next() else { return Type::Unknown };
    let mut acc = first.clone();
    for ty in iter {
        acc = acc.higher(ty).clone();
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_returns_first_argument_type() {
        assert_eq!(builtin_return_type("ROUND", &[Type::Date]), Some(Type::Date));
        assert_eq!(builtin_return_type("round", &[Type::numeric(), Type::numeric()]), Some(Type::numeric()));
    }

    #[test]
    fn nvl_returns_highest_precedence_operand() {
        assert_eq!(builtin_return_type("NVL", &[Type::Text, Type::Date]), Some(Type::Date));
    }

    #[test]
    fn count_is_always_numeric() {
        assert_eq!(builtin_return_type("COUNT", &[Type::Text]), Some(Type::numeric()));
    }

    #[test]
    fn unknown_name_is_not_a_builtin() {
        assert_eq!(builtin_return_type("calculate_bonus", &[]), None);
        assert!(!is_builtin_name("calculate_bonus"));
        assert!(is_builtin_name("sysdate"));
    }
}
