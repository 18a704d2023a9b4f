#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by the fskv infrastructure crates.
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! fskv-derive = { path = "../derive" }
//! thiserror = "2"
//! ```
//!
//! The generated code names `::thiserror` directly, so consumers must depend on it.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Attribute macro for defining crate-level error enums.
///
/// Turns a plain enum of struct variants into a `thiserror` error wired for the
/// `message` / `source` + `context` convention used across the workspace.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]` unless present.
/// * **Context Support**: Generates a companion `<Name>Ext` trait that adds `.context()`
///   to `Result<T, Name>` and to results of every unambiguous source type.
/// * **Conversions**: Implements `From<Source>` for a variant holding a `source` field
///   (or a field marked `#[source]`/`#[from]`), enabling `?` on upstream errors.
/// * **Ambiguity Guard**: When the same source type is carried by more than one variant,
///   neither `From` nor the `.context()` bridge is generated for it; those variants are
///   built explicitly at the call site.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum**.
/// 2. Variants with a source must also carry `context: Option<Cow<'static, str>>`.
/// 3. Tuple and unit variants are rejected.
///
/// # Example
///
/// ```rust,ignore
/// use fskv_derive::fskv_error;
/// use std::borrow::Cow;
///
/// #[fskv_error]
/// pub enum DiskError {
///     #[error("I/O failure{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Missing{}: {message}", format_context(.context))]
///     Missing { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn load(path: &std::path::Path) -> Result<Vec<u8>, DiskError> {
///     std::fs::read(path).context("Loading record")
/// }
/// ```
#[proc_macro_attribute]
pub fn fskv_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}
