use super::*;

/// Generates the `Bind` implementation for a type, along with its `Record`, `Enumeration` or
/// `Polymorphic` implementation.
pub fn expand(input: &syn::DeriveInput) -> syn::Result<TokenStream> {
    let jb = quote! { ::jsonbind };
    let mut ctx = BindImplContext::new(input, &jb);
    match &input.data {
        syn::Data::Struct(st) => {
            let repr = RecordRepr::get(&input.attrs, &input.ident)?;
            expand_record(ctx, &repr, &st.fields)
        }
        syn::Data::Enum(en) => match EnumRepr::get(&input.attrs, &input.ident, en)? {
            EnumRepr::Enumeration { name } => {
                let mut value = 0;
                let mut names = Vec::new();
                let mut values = Vec::new();
                let mut idents = Vec::new();
                for variant in en.variants.iter() {
                    let repr = VariantRepr::get(variant, &mut value)?;
                    names.push(repr.name);
                    values.push(value_tokens(repr.value));
                    idents.push(&variant.ident);
                    value = value.wrapping_add(1);
                }
                let body = quote! {
                    const NAME: &'static str = #name;
                    const MEMBERS: &'static [(&'static str, i64)] = &[
                        #( (#names, #values) ),*
                    ];
                    #[allow(unreachable_patterns)]
                    fn from_value(value: i64) -> ::core::option::Option<Self> {
                        match value {
                            #( #values => ::core::option::Option::Some(Self::#idents), )*
                            _ => ::core::option::Option::None,
                        }
                    }
                };
                Ok(ctx.generate(
                    quote! { #jb::Describe::enumeration::<Self>() },
                    quote! { p.parse_enum::<Self>(handle) },
                    quote! { #jb::Enumeration },
                    body,
                ))
            }
            EnumRepr::Polymorphic { name } => {
                let mut value = 0;
                let mut default = None;
                let mut variants = Vec::new();
                for (index, variant) in en.variants.iter().enumerate() {
                    let repr = VariantRepr::get(variant, &mut value)?;
                    if repr.is_default {
                        if default.is_some() {
                            return Err(syn::Error::new(
                                variant.span(),
                                "only one variant can be the default",
                            ));
                        }
                        default = Some(index);
                    }
                    let syn::Fields::Unnamed(fields) = &variant.fields else {
                        return Err(syn::Error::new(variant.span(), "expected a single record"));
                    };
                    let field_ty = &fields.unnamed[0].ty;
                    let variant_ident = &variant.ident;
                    let variant_name = repr.name;
                    ctx.bound(syn::parse_quote! { #field_ty: #jb::Record });
                    variants.push(quote! {
                        #jb::Variant {
                            name: #variant_name,
                            link: #jb::Registry::resolve::<#field_ty>,
                            resume: |p, handle, resume| {
                                ::core::result::Result::Ok(Self::#variant_ident(
                                    p.resume_record::<#field_ty>(handle, resume)?,
                                ))
                            },
                        }
                    });
                }
                let default = match default {
                    Some(index) => quote! { ::core::option::Option::Some(#index) },
                    None => quote! { ::core::option::Option::None },
                };
                let body = quote! {
                    const NAME: &'static str = #name;
                    const VARIANTS: &'static [#jb::Variant<Self>] = &[ #(#variants),* ];
                    const DEFAULT: ::core::option::Option<usize> = #default;
                };
                Ok(ctx.generate(
                    quote! { #jb::Describe::polymorphic::<Self>() },
                    quote! { p.parse_polymorphic::<Self>(handle) },
                    quote! { #jb::Polymorphic },
                    body,
                ))
            }
        },
        syn::Data::Union(un) => Err(syn::Error::new(
            un.union_token.span(),
            "cannot bind a union",
        )),
    }
}

/// Gets the tokens for an `i64` literal. Negative values are emitted as a negation, since a
/// negative literal token is not accepted everywhere.
fn value_tokens(value: i64) -> TokenStream {
    let abs = proc_macro2::Literal::u64_unsuffixed(value.unsigned_abs());
    if value < 0 {
        quote! { -#abs }
    } else {
        quote! { #abs }
    }
}

/// Generates the `Record` implementation for a struct.
fn expand_record(
    mut ctx: BindImplContext<'_>,
    repr: &RecordRepr,
    fields: &syn::Fields,
) -> syn::Result<TokenStream> {
    let jb = ctx.jb;
    let fields: Vec<&syn::Field> = match fields {
        syn::Fields::Named(fields) => fields.named.iter().collect(),
        syn::Fields::Unit => Vec::new(),
        syn::Fields::Unnamed(fields) => {
            return Err(syn::Error::new(
                fields.span(),
                "records require named fields",
            ))
        }
    };
    let mut bindings = Vec::new();
    for (index, field) in fields.iter().enumerate() {
        let name = FieldRepr::get(field)?.name;
        let field_ty = &field.ty;
        let target = if repr.constructor {
            let index = syn::Index::from(index);
            quote! { builder.#index = ::core::option::Option::Some(value) }
        } else {
            let field_ident = &field.ident;
            quote! { builder.#field_ident = value }
        };
        bindings.push(quote! {
            #jb::Field {
                name: #name,
                link: #jb::Registry::resolve::<#field_ty>,
                set: |builder, p, handle| {
                    let value = <#field_ty as #jb::Bind>::parse(p, handle)?;
                    #target;
                    ::core::result::Result::Ok(())
                },
            }
        });
    }
    let name = &repr.name;
    let constructor = repr.constructor;
    let builder = if constructor {
        let field_ty = fields.iter().map(|f| &f.ty);
        let none = fields.iter().map(|_| quote! { ::core::option::Option::None });
        let field_ident = fields.iter().map(|f| &f.ident);
        let index = (0..fields.len()).map(syn::Index::from);
        for param in ctx.type_params() {
            ctx.bound(syn::parse_quote! { #param: ::core::default::Default });
        }
        quote! {
            type Builder = ( #( ::core::option::Option<#field_ty>, )* );
            fn builder() -> Self::Builder {
                ( #( #none, )* )
            }
            fn finish(builder: Self::Builder) -> Self {
                Self {
                    #( #field_ident: builder.#index.unwrap_or_default(), )*
                }
            }
        }
    } else {
        ctx.bound(syn::parse_quote! { Self: ::core::default::Default });
        quote! {
            type Builder = Self;
            fn builder() -> Self {
                ::core::default::Default::default()
            }
            fn finish(builder: Self) -> Self {
                builder
            }
        }
    };
    let body = quote! {
        const NAME: &'static str = #name;
        const CONSTRUCTOR: bool = #constructor;
        const FIELDS: &'static [#jb::Field<Self>] = &[ #(#bindings),* ];
        #builder
    };
    Ok(ctx.generate(
        quote! { #jb::Describe::record::<Self>() },
        quote! { p.parse_record::<Self>(handle) },
        quote! { #jb::Record },
        body,
    ))
}

/// Encapsulates the context information required to generate a `Bind` implementation.
struct BindImplContext<'a> {
    jb: &'a TokenStream,
    generics: &'a syn::Generics,
    ident: &'a syn::Ident,
    where_clause: syn::WhereClause,
}

impl<'a> BindImplContext<'a> {
    /// Creates a new [`BindImplContext`] for the given input. Every type parameter is required
    /// to be `Bind`.
    pub fn new(input: &'a syn::DeriveInput, jb: &'a TokenStream) -> Self {
        let mut where_clause = input
            .generics
            .where_clause
            .clone()
            .unwrap_or(syn::WhereClause {
                where_token: Default::default(),
                predicates: syn::punctuated::Punctuated::new(),
            });
        for param in input.generics.type_params() {
            let param = &param.ident;
            where_clause
                .predicates
                .push(syn::parse_quote! { #param: #jb::Bind });
        }
        Self {
            jb,
            generics: &input.generics,
            ident: &input.ident,
            where_clause,
        }
    }

    /// Gets the type parameters of the input.
    fn type_params(&self) -> Vec<syn::Ident> {
        self.generics
            .type_params()
            .map(|param| param.ident.clone())
            .collect()
    }

    /// Adds a predicate to the `where` clause of the generated implementations.
    fn bound(&mut self, predicate: syn::WherePredicate) {
        self.where_clause.predicates.push(predicate);
    }

    /// Generates the `Bind` implementation and the implementation of `kind` with the given body.
    pub fn generate(
        self,
        describe: TokenStream,
        parse: TokenStream,
        kind: TokenStream,
        body: TokenStream,
    ) -> TokenStream {
        let Self {
            jb,
            generics,
            ident,
            where_clause,
        } = self;
        let (impl_generics, ty_generics, _) = generics.split_for_impl();
        quote! {
            #[automatically_derived]
            impl #impl_generics #jb::Bind for #ident #ty_generics
                #where_clause
            {
                fn describe() -> #jb::Describe {
                    #describe
                }

                fn parse(p: &mut #jb::Parser<'_>, handle: #jb::TypeHandle)
                    -> ::core::result::Result<Self, #jb::Error>
                {
                    #parse
                }
            }

            #[automatically_derived]
            impl #impl_generics #kind for #ident #ty_generics
                #where_clause
            {
                #body
            }
        }
    }
}
