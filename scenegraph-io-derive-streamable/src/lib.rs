extern crate proc_macro2;

use proc_macro_crate::{FoundCrate, crate_name};
use proc_macro2::{Span, TokenStream};
use quote::{quote, quote_spanned};
use syn::{Data, DeriveInput, Fields, Ident, parse_macro_input, spanned::Spanned};

#[proc_macro_derive(Streamable)]
pub fn derive_streamable(item: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    derive_streamable_internal(input).into()
}

pub(crate) fn derive_streamable_internal(input: DeriveInput) -> TokenStream {
    let found_crate = crate_name("scenegraph-io").expect("scenegraph-io is present in `Cargo.toml`");

    let crate_name = match found_crate {
        FoundCrate::Itself => quote!(crate),
        FoundCrate::Name(name) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(#ident)
        }
    };

    let ident = input.ident;
    let (encode_impl, decode_impl) = match input.data {
        Data::Union(_) => panic!("`#[derive(Streamable)]` is only available on structs: {}", ident),
        Data::Struct(s) => match s.fields {
            Fields::Named(ref fields) => {
                let encodes = fields.named.iter().map(|f| {
                    let name = &f.ident;
                    quote_spanned! {f.span()=>
                        #crate_name::common::codec::Streamable::encode(&self.#name, wtr)?;
                    }
                });
                let decodes = fields.named.iter().map(|f| {
                    let name = &f.ident;
                    let ftype = &f.ty;
                    // The qualified form keeps generic field types (e.g. Vec<T>) valid call syntax.
                    quote_spanned! {f.span()=>
                        #name: <#ftype as #crate_name::common::codec::Streamable>::decode(rdr)?,
                    }
                });
                (quote! { #(#encodes)* }, quote! { #(#decodes)* })
            }
            _ => panic!(
                "`#[derive(Streamable)]` only supports named struct fields at the moment: {}",
                ident
            ),
        },
        Data::Enum(_) => panic!("`#[derive(Streamable)]` is only available on structs: {}", ident),
    };

    quote!(
        impl #crate_name::common::codec::Streamable for #ident {
            fn encode<W: ::std::io::Write + ?Sized>(&self, wtr: &mut W) -> Result<(), #crate_name::SceneIoError> {
                #encode_impl
                Ok(())
            }

            fn decode<R: ::std::io::Read + ?Sized>(rdr: &mut R) -> Result<#ident, #crate_name::SceneIoError> {
                Ok(#ident {
                    #decode_impl
                })
            }
        }
    )
}
