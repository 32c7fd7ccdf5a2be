// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Source -> target type text mapping. Every inline shape --
//! `RECORD`, `TABLE OF`, `VARRAY`, `INDEX BY`, `%ROWTYPE`, `%TYPE` -- collapses
//! to the same semi-structured document representation; only the read/write
//! access compiled around a variable differs by its declared shape, not its
//! storage type.

use crate::analyzer::resolve_declared_type;
use crate::types::Type;

/// The semi-structured document type every inline or opaque shape maps to.
pub const DOCUMENT_TYPE: &str = "jsonb";

/// Maps a raw `TypeName` token phrase, as it appears after a declaration's
/// identifier or a parameter's name, to its PL/pgSQL target type text.
pub fn target_type_text(raw: &str) -> String {
    let (resolved, inline) = resolve_declared_type(raw);
    if inline.is_some() {
        return DOCUMENT_TYPE.to_owned();
    }
    scalar_target_text(&resolved, raw)
}

/// Maps an already-resolved [`Type`] (e.g. from the type cache, where no raw
/// source text is available) to the cast suffix used when reading a document
/// field or collection element back out to a scalar.
pub fn scalar_cast_type(ty: &Type) -> String {
    scalar_target_text(ty, "")
}

fn scalar_target_text(resolved: &Type, raw: &str) -> String {
    match resolved {
        Type::Numeric { .. } => "numeric".to_owned(),
        Type::Text => "text".to_owned(),
        Type::Date => "timestamp".to_owned(),
        Type::Timestamp => {
            if raw.to_uppercase().contains("WITH TIME ZONE") {
                "timestamptz".to_owned()
            } else {
                "timestamp".to_owned()
            }
        }
        Type::Boolean => "boolean".to_owned(),
        Type::LobText => "text".to_owned(),
        Type::LobBinary => "bytea".to_owned(),
        Type::Xml => "xml".to_owned(),
        Type::Cursor => "refcursor".to_owned(),
        Type::Object(schema, name) => {
            format!("{}.{}", schema.as_str().to_lowercase(), name.as_str().to_lowercase())
        }
        // Opaque/unresolved scalars and genuine composite/collection types
        // all fall back to the document representation -- the same
        // simplification the declaration-level mapping above makes.
        Type::Record(_) | Type::Collection(_) | Type::Null | Type::Unknown => DOCUMENT_TYPE.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_types_map_directly() {
        assert_eq!(target_type_text("NUMBER(10,2)"), "numeric");
        assert_eq!(target_type_text("VARCHAR2(100)"), "text");
        assert_eq!(target_type_text("DATE"), "timestamp");
        assert_eq!(target_type_text("CLOB"), "text");
        assert_eq!(target_type_text("BLOB"), "bytea");
        assert_eq!(target_type_text("XMLTYPE"), "xml");
    }

    #[test]
    fn timestamp_with_time_zone_maps_to_timestamptz() {
        assert_eq!(target_type_text("TIMESTAMP WITH TIME ZONE"), "timestamptz");
        assert_eq!(target_type_text("TIMESTAMP"), "timestamp");
    }

    #[test]
    fn inline_shapes_all_map_to_the_document_type() {
        assert_eq!(target_type_text("employees%ROWTYPE"), DOCUMENT_TYPE);
        assert_eq!(target_type_text("v_salary%TYPE"), DOCUMENT_TYPE);
        assert_eq!(target_type_text("TABLE OF NUMBER"), DOCUMENT_TYPE);
        assert_eq!(target_type_text("VARRAY(10) OF VARCHAR2(20)"), DOCUMENT_TYPE);
        assert_eq!(target_type_text("RECORD(empno NUMBER)"), DOCUMENT_TYPE);
    }

    #[test]
    fn user_defined_object_type_is_schema_qualified() {
        assert_eq!(target_type_text("hr.address_t"), "hr.address_t");
    }
}
