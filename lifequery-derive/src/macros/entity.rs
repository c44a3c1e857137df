//! Derive macro for `Entity`
//!
//! Generates both `lifequery::Entity` (table, columns, primary key and the
//! values written on insert/update) and `lifequery::FromRow`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Type};

use crate::attributes;
use crate::utils;

struct Column<'a> {
    field: &'a syn::Ident,
    ty: &'a Type,
    name: String,
    is_primary_key: bool,
    is_auto_increment: bool,
}

pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;

    let fields = match &input.data {
        Data::Struct(syn::DataStruct {
            fields: Fields::Named(fields),
            ..
        }) => &fields.named,
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Entity can only be derived for structs with named fields",
            ))
        }
    };

    let table_name = attributes::extract_table_name(&input.attrs)
        .unwrap_or_else(|| utils::snake_case(&struct_name.to_string()));

    let mut columns = Vec::with_capacity(fields.len());
    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let attrs = attributes::parse_column_attributes(field)?;
        columns.push(Column {
            field: ident,
            ty: &field.ty,
            name: attrs
                .column_name
                .unwrap_or_else(|| utils::snake_case(&ident.to_string())),
            is_primary_key: attrs.is_primary_key,
            is_auto_increment: attrs.is_auto_increment,
        });
    }

    let primary_key = primary_key(struct_name, &columns)?;
    let pk_field = primary_key.field;
    let pk_type = primary_key.ty;
    let pk_column = primary_key.name.as_str();

    let column_names = columns.iter().map(|c| c.name.as_str());

    let values = columns.iter().filter(|c| !c.is_auto_increment).map(|c| {
        let field = c.field;
        let name = c.name.as_str();
        quote! {
            (#name, ::lifequery::sea_query::Value::from(::std::clone::Clone::clone(&self.#field)))
        }
    });

    let from_row_fields = columns.iter().map(|c| {
        let field = c.field;
        let name = c.name.as_str();
        let ty = c.ty;
        if is_unsigned(ty) {
            quote! {
                #field: {
                    let val: ::lifequery::entity::Unsigned<#ty> = row.try_get(#name)?;
                    val.0
                },
            }
        } else {
            quote! {
                #field: row.try_get(#name)?,
            }
        }
    });

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::lifequery::entity::Entity for #struct_name #ty_generics #where_clause {
            type Id = #pk_type;

            const TABLE_NAME: &'static str = #table_name;
            const COLUMNS: &'static [&'static str] = &[#(#column_names),*];
            const PRIMARY_KEY: &'static str = #pk_column;

            fn primary_key(&self) -> Self::Id {
                ::std::clone::Clone::clone(&self.#pk_field)
            }

            fn values(&self) -> ::std::vec::Vec<(&'static str, ::lifequery::sea_query::Value)> {
                ::std::vec![#(#values),*]
            }
        }

        impl #impl_generics ::lifequery::entity::FromRow for #struct_name #ty_generics #where_clause {
            fn from_row(
                row: &::lifequery::may_postgres::Row,
            ) -> ::std::result::Result<Self, ::lifequery::may_postgres::Error> {
                ::std::result::Result::Ok(Self {
                    #(#from_row_fields)*
                })
            }
        }
    })
}

/// The `#[primary_key]` field, or the field whose column is `id`
fn primary_key<'c, 'a>(
    struct_name: &syn::Ident,
    columns: &'c [Column<'a>],
) -> syn::Result<&'c Column<'a>> {
    let marked: Vec<_> = columns.iter().filter(|c| c.is_primary_key).collect();
    match marked.as_slice() {
        [one] => Ok(*one),
        [] => columns.iter().find(|c| c.field == "id").ok_or_else(|| {
            syn::Error::new_spanned(
                struct_name,
                "Entity needs a #[primary_key] field or a field named `id`",
            )
        }),
        [_, second, ..] => Err(syn::Error::new_spanned(
            second.field,
            "composite primary keys are not supported",
        )),
    }
}

/// PostgreSQL has no unsigned integers, so unsigned fields are read through
/// `lifequery::entity::Unsigned`, which checks the range of the signed column
fn is_unsigned(ty: &Type) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };
    if path.qself.is_some() || path.path.segments.len() != 1 {
        return false;
    }
    matches!(
        path.path.segments[0].ident.to_string().as_str(),
        "u8" | "u16" | "u32" | "u64"
    )
}
