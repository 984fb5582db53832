//! Derive macro for keyseek entity schemas.
//!
//! Use it through the `keyseek` crate, which re-exports [`macro@Entity`].

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod debug;
mod entity;

/// Derive `keyseek::Entity` for a struct with named fields.
///
/// # Example
/// ```ignore
/// #[derive(Entity)]
/// #[entity(name = "user")]
/// struct User {
///     id: i64,
///     #[entity(rename = "createdAt")]
///     created_at: i64,
///     #[entity(nested)]
///     address: Option<Address>,
///     #[entity(skip)]
///     password_hash: String,
/// }
/// ```
#[proc_macro_derive(Entity, attributes(entity))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    entity::derive_entity_impl(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
