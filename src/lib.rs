// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Translates Oracle PL/SQL stored functions, procedures and packages into
//! PostgreSQL PL/pgSQL. [`translate::translate`] is the
//! single pure entry point: one source unit in, one translated string or a
//! [`TranslationError`] out. Everything else below is implementation detail
//! -- lexer, parser, typed AST, type analyzer, scope engine, package
//! context and code emitter -- exposed for embedding and testing rather
//! than as a stable public surface in its own right.

pub mod analyzer;
pub mod ast;
pub mod emitter;
pub mod error;
pub mod grammar;
pub mod ident;
pub mod lexer;
pub mod metadata;
pub mod package_context;
pub mod parser;
pub mod scope;
pub mod session;
pub mod syntax;
pub mod translate;
pub mod types;

#[cfg(target_arch = "wasm32")]
mod wasm_bindings;

pub use error::{Diagnostic, ErrorCategory};
pub use session::Session;
pub use translate::{
    translate, translate_with_metadata, TranslationError, TranslationMetadata, TranslationOutcome,
    TranslationResult,
};
