//! `#[derive(EnumFromStr)]`: generates a case-matched `enum_from_str` plus a
//! delegating `std::str::FromStr` impl, one match arm per variant, matching
//! against the variant's name lowercased. Used for mnemonic and register
//! name lookup tables, where the enum variants already spell the assembly
//! keyword (`Mov`, `Add`, `Al`, `Bh`, ...).

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput};

#[proc_macro_derive(EnumFromStr)]
pub fn derive_enum_from_str(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    let name = &ast.ident;

    let variants = match &ast.data {
        Data::Enum(data) => &data.variants,
        _ => panic!("EnumFromStr can only be derived for enums"),
    };

    let match_arms = variants.iter().map(|v| {
        let variant_name = &v.ident;
        let variant_str = variant_name.to_string().to_lowercase();
        quote! { #variant_str => Ok(#name::#variant_name), }
    });

    let expanded = quote! {
        impl s86_util::EnumFromStr for #name {
            fn enum_from_str(s: &str) -> Result<Self, s86_util::ParseEnumError> {
                match s {
                    #(#match_arms)*
                    _ => Err(s86_util::ParseEnumError {
                        value: s.to_string(),
                        enum_name: stringify!(#name),
                    }),
                }
            }
        }

        impl std::str::FromStr for #name {
            type Err = s86_util::ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <#name as s86_util::EnumFromStr>::enum_from_str(s)
            }
        }
    };

    expanded.into()
}
