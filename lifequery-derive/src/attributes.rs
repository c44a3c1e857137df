//! Attribute parsing utilities

use syn::{Attribute, ExprLit, Field, Lit};

fn string_value(attr: &Attribute) -> Option<String> {
    let meta = attr.meta.require_name_value().ok()?;
    match &meta.value {
        syn::Expr::Lit(ExprLit {
            lit: Lit::Str(s), ..
        }) => Some(s.value()),
        _ => None,
    }
}

/// Extract table name from struct attributes
pub fn extract_table_name(attrs: &[Attribute]) -> Option<String> {
    attrs
        .iter()
        .find(|attr| attr.path().is_ident("table_name"))
        .and_then(string_value)
}

/// Check if field has a specific attribute
pub fn has_attribute(field: &Field, attr_name: &str) -> bool {
    field.attrs.iter().any(|attr| attr.path().is_ident(attr_name))
}

/// Column-related attributes of one field
pub struct ColumnAttributes {
    pub is_primary_key: bool,
    pub column_name: Option<String>,
    pub is_auto_increment: bool,
}

/// Parse all column attributes from a field
pub fn parse_column_attributes(field: &Field) -> syn::Result<ColumnAttributes> {
    let mut attrs = ColumnAttributes {
        is_primary_key: has_attribute(field, "primary_key"),
        column_name: None,
        is_auto_increment: has_attribute(field, "auto_increment"),
    };

    for attr in &field.attrs {
        if attr.path().is_ident("column_name") {
            match string_value(attr) {
                Some(name) => attrs.column_name = Some(name),
                None => {
                    return Err(syn::Error::new_spanned(
                        attr,
                        "expected #[column_name = \"...\"]",
                    ))
                }
            }
        }
    }

    Ok(attrs)
}
