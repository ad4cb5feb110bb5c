use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Lit, LitStr, Meta, Type};

/// Derive macro that generates an explicit, ordered column list for a record type.
///
/// For each named field, in declaration order:
/// - Column name (respects `#[serde(rename = "...")]`)
/// - Required (true if not `Option<T>`)
/// - Description (from doc comments)
///
/// Generates two inherent methods:
/// - `csv_columns() -> &'static [CsvColumn]`
/// - `csv_values(&self) -> Vec<String>`, one cell per column via `CsvCell`
///
/// Both `CsvColumn` and `CsvCell` are resolved from `crate::columns`.
#[proc_macro_derive(CsvColumns, attributes(serde))]
pub fn derive_csv_columns(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "CsvColumns only supports structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "CsvColumns only supports structs",
            ))
        }
    };

    let mut columns = Vec::with_capacity(fields.len());
    let mut cells = Vec::with_capacity(fields.len());

    for field in fields {
        let ident = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "unnamed field"))?;
        let column = serde_rename(&field.attrs)?.unwrap_or_else(|| ident.to_string());
        let required = !is_option(&field.ty);
        let description = doc_comment(&field.attrs);

        columns.push(quote! {
            crate::columns::CsvColumn {
                name: #column,
                required: #required,
                description: #description,
            }
        });
        cells.push(quote! {
            crate::columns::CsvCell::cell(&self.#ident)
        });
    }

    Ok(quote! {
        impl #impl_generics #name #ty_generics #where_clause {
            pub fn csv_columns() -> &'static [crate::columns::CsvColumn] {
                static COLUMNS: &[crate::columns::CsvColumn] = &[
                    #(#columns),*
                ];
                COLUMNS
            }

            pub fn csv_values(&self) -> ::std::vec::Vec<::std::string::String> {
                ::std::vec![#(#cells),*]
            }
        }
    })
}

fn serde_rename(attrs: &[syn::Attribute]) -> syn::Result<Option<String>> {
    let mut rename = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                rename = Some(value.value());
            } else if meta.input.peek(syn::Token![=]) {
                // other key = value pairs (e.g. `with = "..."`) are not ours
                let _: syn::Expr = meta.value()?.parse()?;
            }
            Ok(())
        })?;
    }
    Ok(rename)
}

fn doc_comment(attrs: &[syn::Attribute]) -> String {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(nv) => match &nv.value {
                syn::Expr::Lit(syn::ExprLit {
                    lit: Lit::Str(s), ..
                }) => Some(s.value().trim().to_string()),
                _ => None,
            },
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_option(ty: &Type) -> bool {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Option"),
        _ => false,
    }
}
