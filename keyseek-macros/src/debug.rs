//! Print generated code while working on the derive.
//!
//! Enable with `--features debug-expand`.

use proc_macro2::TokenStream;

/// Print the pretty-formatted expansion of `name` to stderr.
#[cfg(feature = "debug-expand")]
pub(crate) fn debug_tokens(name: &str, tokens: &TokenStream) {
    eprintln!("\n=== DERIVE {name} ===");
    match syn::parse2::<syn::File>(tokens.clone()) {
        Ok(file) => eprintln!("{}", prettyplease::unparse(&file)),
        Err(_) => eprintln!("{tokens}"),
    }
    eprintln!("=== END {name} ===\n");
}

#[cfg(not(feature = "debug-expand"))]
#[inline]
pub(crate) const fn debug_tokens(_name: &str, _tokens: &TokenStream) {}
