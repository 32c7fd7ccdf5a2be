// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Additional functions needed for a clean Rust <-> JS interface. Only
//! compiled for `wasm32`, matching the non-wasm build's plain Rust API.

use wasm_bindgen::prelude::*;

use crate::metadata::MetadataIndex;
use crate::session::Session;
use crate::translate::translate;

/// WASM export of [`crate::translate::translate`]. Should _never_ be
/// called from other Rust code -- [`translate`] is the host-agnostic entry
/// point for that. `metadata` crosses the JS boundary directly through its
/// own `tsify` conversion rather than an intermediate `Js*` wrapper type,
/// since every field of [`MetadataIndex`] is already wasm-safe.
#[wasm_bindgen(js_name = "translate")]
pub fn js_translate(schema: &str, source: &str, metadata: MetadataIndex) -> Result<String, JsValue> {
    let mut session = Session::new(metadata);
    translate(&mut session, schema, source).map_err(|err| {
        let text = err.to_string();
        serde_wasm_bindgen::to_value(&err).unwrap_or_else(|_| JsValue::from_str(&text))
    })
}
