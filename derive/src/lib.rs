mod bind;

use proc_macro2::TokenStream;
use quote::{quote, ToTokens};
use syn::spanned::Spanned;
use syn::DeriveInput;

/// Derives `Bind` along with `Record`, `Enumeration` or `Polymorphic`, depending on the shape of
/// the type:
///
/// * A struct with named fields becomes a `Record`.
/// * An enum whose variants are all units becomes an `Enumeration`.
/// * An enum whose variants each wrap a single record becomes a `Polymorphic` type.
#[proc_macro_derive(Bind, attributes(json))]
pub fn derive_bind(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    bind::expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Describes how a struct is bound.
struct RecordRepr {
    /// The name of the record, as used in type tags.
    name: String,

    /// Indicates whether the record is built from constructor arguments.
    constructor: bool,
}

/// Describes how an enum is bound.
enum EnumRepr {
    /// The enum is bound from a number or a member name.
    Enumeration { name: String },

    /// The enum is bound from an object whose type tag selects a variant.
    Polymorphic { name: String },
}

/// Describes how an enum variant is bound.
struct VariantRepr {
    /// The member name or type tag of this variant.
    name: String,

    /// The underlying value of this variant, for enumerations.
    value: i64,

    /// Indicates whether this is the variant used for untagged objects.
    is_default: bool,
}

/// Describes how a field is bound.
struct FieldRepr {
    /// The JSON member name of the field.
    name: String,
}

impl RecordRepr {
    /// Gets the representation for the given struct.
    pub fn get(attrs: &[syn::Attribute], ident: &syn::Ident) -> syn::Result<Self> {
        let mut name = None;
        let mut constructor = false;
        for attr in attrs.iter() {
            if attr.path().is_ident("json") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("name") {
                        let lit: syn::LitStr = meta.value()?.parse()?;
                        name = Some(lit.value());
                    } else if meta.path.is_ident("constructor") {
                        constructor = true;
                    } else {
                        let path = meta.path.to_token_stream().to_string().replace(' ', "");
                        return Err(
                            meta.error(format_args!("unknown json struct attribute `{}`", path))
                        );
                    }
                    Ok(())
                })?;
            }
        }
        Ok(RecordRepr {
            name: name.unwrap_or_else(|| ident.to_string()),
            constructor,
        })
    }
}

impl EnumRepr {
    /// Gets the representation for the given enum.
    pub fn get(
        attrs: &[syn::Attribute],
        ident: &syn::Ident,
        en: &syn::DataEnum,
    ) -> syn::Result<Self> {
        let mut rename = None;
        for attr in attrs.iter() {
            if attr.path().is_ident("json") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("name") {
                        let lit: syn::LitStr = meta.value()?.parse()?;
                        rename = Some(lit.value());
                    } else {
                        let path = meta.path.to_token_stream().to_string().replace(' ', "");
                        return Err(
                            meta.error(format_args!("unknown json enum attribute `{}`", path))
                        );
                    }
                    Ok(())
                })?;
            }
        }
        let name = rename.unwrap_or_else(|| ident.to_string());
        if en.variants.is_empty() {
            return Err(syn::Error::new(ident.span(), "cannot bind an empty enum"));
        }
        if en.variants.iter().all(|v| matches!(v.fields, syn::Fields::Unit)) {
            return Ok(EnumRepr::Enumeration { name });
        }
        for variant in en.variants.iter() {
            if !matches!(&variant.fields, syn::Fields::Unnamed(f) if f.unnamed.len() == 1) {
                return Err(syn::Error::new(
                    variant.span(),
                    "enum variants must either all be units or all wrap a single record",
                ));
            }
        }
        Ok(EnumRepr::Polymorphic { name })
    }
}

impl VariantRepr {
    /// Gets the representation for the given variant. `value` is the underlying value implied
    /// by the previous variant, and is updated by an explicit discriminant.
    pub fn get(variant: &syn::Variant, value: &mut i64) -> syn::Result<Self> {
        let mut rename = None;
        let mut is_default = false;
        for attr in variant.attrs.iter() {
            if attr.path().is_ident("json") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("rename") {
                        let lit: syn::LitStr = meta.value()?.parse()?;
                        rename = Some(lit.value());
                    } else if meta.path.is_ident("default") {
                        is_default = true;
                    } else {
                        let path = meta.path.to_token_stream().to_string().replace(' ', "");
                        return Err(
                            meta.error(format_args!("unknown json variant attribute `{}`", path))
                        );
                    }
                    Ok(())
                })?;
            }
        }

        // Parse discriminant
        if let Some((_, discriminant)) = &variant.discriminant {
            *value = parse_discriminant(discriminant)?;
        }

        Ok(VariantRepr {
            name: rename.unwrap_or_else(|| variant.ident.to_string()),
            value: *value,
            is_default,
        })
    }
}

/// Gets the value of an integer literal discriminant, which may be negated.
fn parse_discriminant(expr: &syn::Expr) -> syn::Result<i64> {
    match expr {
        syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Int(int),
            ..
        }) => int.base10_parse(),
        syn::Expr::Unary(syn::ExprUnary {
            op: syn::UnOp::Neg(_),
            expr,
            ..
        }) => Ok(-parse_discriminant(expr)?),
        _ => Err(syn::Error::new(
            expr.span(),
            "binding requires an integer literal for enum discriminant",
        )),
    }
}

impl FieldRepr {
    /// Gets the representation for the given field.
    pub fn get(field: &syn::Field) -> syn::Result<Self> {
        let mut rename = None;
        for attr in field.attrs.iter() {
            if attr.path().is_ident("json") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("rename") {
                        let lit: syn::LitStr = meta.value()?.parse()?;
                        rename = Some(lit.value());
                    } else {
                        let path = meta.path.to_token_stream().to_string().replace(' ', "");
                        return Err(
                            meta.error(format_args!("unknown json field attribute `{}`", path))
                        );
                    }
                    Ok(())
                })?;
            }
        }
        let name = match (rename, &field.ident) {
            (Some(name), _) => name,
            (None, Some(ident)) => ident.to_string(),
            (None, None) => {
                return Err(syn::Error::new(
                    field.span(),
                    "records require named fields",
                ))
            }
        };
        Ok(FieldRepr { name })
    }
}
