//! `#[derive(Entity)]` implementation.

use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Attribute, Data, DeriveInput, Fields, LitStr, Type};

use crate::debug::debug_tokens;

// ============================================================================
// ATTRIBUTES
// ============================================================================

#[derive(Default)]
struct ContainerAttrs {
    name: Option<String>,
}

#[derive(Default)]
struct FieldAttrs {
    rename: Option<String>,
    skip: bool,
    nested: bool,
}

fn parse_container_attrs(attrs: &[Attribute]) -> syn::Result<ContainerAttrs> {
    let mut result = ContainerAttrs::default();

    for attr in attrs {
        if !attr.path().is_ident("entity") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                result.name = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unknown entity attribute. Valid options: name"))
            }
        })?;
    }

    Ok(result)
}

fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut result = FieldAttrs::default();

    for attr in attrs {
        if !attr.path().is_ident("entity") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                if value.value().is_empty() || value.value().contains('.') {
                    return Err(syn::Error::new_spanned(
                        value,
                        "field name must be non-empty and must not contain '.'",
                    ));
                }
                result.rename = Some(value.value());
            } else if meta.path.is_ident("skip") {
                result.skip = true;
            } else if meta.path.is_ident("nested") {
                result.nested = true;
            } else {
                return Err(meta.error("unknown field attribute. Valid options: rename, skip, nested"));
            }
            Ok(())
        })?;
    }

    Ok(result)
}

// ============================================================================
// TYPE HELPERS
// ============================================================================

fn option_inner(ty: &Type) -> Option<&Type> {
    if let Type::Path(type_path) = ty
        && let Some(segment) = type_path.path.segments.last()
        && segment.ident == "Option"
        && let syn::PathArguments::AngleBracketed(args) = &segment.arguments
        && let Some(syn::GenericArgument::Type(inner)) = args.args.first()
    {
        return Some(inner);
    }
    None
}

// ============================================================================
// DERIVE ENTITY
// ============================================================================

pub(crate) fn derive_entity_impl(input: &DeriveInput) -> syn::Result<TokenStream> {
    let ident = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Entity derive does not support generic structs. \
             Hint: implement `Entity` by hand with `Schema::builder`.",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Entity derive only supports structs with named fields. \
                     Example: `struct User { id: i64, name: String }`",
                ));
            },
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Entity derive only supports structs. \
                 Hint: use `#[derive(Entity)]` on the struct you want to sort and page.",
            ));
        },
    };

    let container = parse_container_attrs(&input.attrs)?;
    let entity_name = container
        .name
        .unwrap_or_else(|| ident.unraw().to_string());

    let mut registrations = Vec::new();
    for field in fields {
        let attrs = parse_field_attrs(&field.attrs)?;
        if attrs.skip {
            continue;
        }
        let Some(member) = &field.ident else {
            continue;
        };
        let path = attrs.rename.unwrap_or_else(|| member.unraw().to_string());

        let registration = match (attrs.nested, option_inner(&field.ty)) {
            (false, _) => quote! {
                .field(#path, |__e: &#ident| &__e.#member)
            },
            (true, Some(_)) => quote! {
                .nested_opt(#path, |__e: &#ident| __e.#member.as_ref())
            },
            (true, None) => quote! {
                .nested(#path, |__e: &#ident| &__e.#member)
            },
        };
        registrations.push(registration);
    }

    let tokens = quote! {
        impl ::keyseek::Entity for #ident {
            fn schema() -> &'static ::keyseek::Schema<Self> {
                static SCHEMA: ::keyseek::__private::Lazy<::keyseek::Schema<#ident>> =
                    ::keyseek::__private::Lazy::new(|| {
                        ::keyseek::Schema::builder(#entity_name)
                            #(#registrations)*
                            .build()
                    });
                &SCHEMA
            }
        }
    };

    debug_tokens("Entity", &tokens);
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(input: TokenStream) -> String {
        let input: DeriveInput = syn::parse2(input).unwrap();
        derive_entity_impl(&input).unwrap().to_string()
    }

    fn expand_err(input: TokenStream) -> String {
        let input: DeriveInput = syn::parse2(input).unwrap();
        derive_entity_impl(&input).unwrap_err().to_string()
    }

    #[test]
    fn test_plain_fields() {
        let out = expand(quote! {
            struct User { id: i64, name: String }
        });
        assert!(out.contains(". field (\"id\""));
        assert!(out.contains(". field (\"name\""));
        assert!(out.contains("builder (\"User\")"));
    }

    #[test]
    fn test_rename_skip_and_raw_ident() {
        let out = expand(quote! {
            struct Item {
                #[entity(rename = "createdAt")]
                created_at: i64,
                #[entity(skip)]
                secret: String,
                r#type: String,
            }
        });
        assert!(out.contains("\"createdAt\""));
        assert!(!out.contains("\"secret\""));
        assert!(out.contains("\"type\""));
    }

    #[test]
    fn test_nested_fields() {
        let out = expand(quote! {
            struct User {
                #[entity(nested)]
                address: Address,
                #[entity(nested)]
                manager: Option<Manager>,
            }
        });
        assert!(out.contains(". nested (\"address\""));
        assert!(out.contains(". nested_opt (\"manager\""));
        assert!(out.contains("as_ref ()"));
    }

    #[test]
    fn test_container_name() {
        let out = expand(quote! {
            #[entity(name = "customer")]
            struct CustomerRow { id: i64 }
        });
        assert!(out.contains("builder (\"customer\")"));
    }

    #[test]
    fn test_rejects_tuple_struct() {
        let err = expand_err(quote! { struct Pair(i64, i64); });
        assert!(err.contains("named fields"));
    }

    #[test]
    fn test_rejects_enum() {
        let err = expand_err(quote! { enum Kind { A, B } });
        assert!(err.contains("only supports structs"));
    }

    #[test]
    fn test_rejects_generics() {
        let err = expand_err(quote! { struct Wrapper<T> { inner: T } });
        assert!(err.contains("generic"));
    }

    #[test]
    fn test_rejects_unknown_attribute() {
        let err = expand_err(quote! {
            struct User {
                #[entity(flatten)]
                id: i64,
            }
        });
        assert!(err.contains("unknown field attribute"));
    }

    #[test]
    fn test_rejects_dotted_rename() {
        let err = expand_err(quote! {
            struct User {
                #[entity(rename = "a.b")]
                id: i64,
            }
        });
        assert!(err.contains("must not contain"));
    }
}
