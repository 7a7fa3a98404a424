// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! This crate provides procedural macros for Herald.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Field, Fields, Index, Member, Type};

/// A derive macro that implements the `herald_core::Evented` trait.
///
/// The emitter is taken from the field marked `#[events]`, or, without a
/// marker, from the single field whose type is named `Events`.
#[proc_macro_derive(Evented, attributes(events))]
pub fn derive_evented(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let member = match events_member(&input) {
        Ok(member) => member,
        Err(e) => return e.to_compile_error().into(),
    };

    let expanded = quote! {
        impl #impl_generics ::herald_core::Evented for #name #ty_generics #where_clause {
            fn events(&self) -> &::herald_core::Events {
                &self.#member
            }
        }
    };

    TokenStream::from(expanded)
}

fn events_member(input: &DeriveInput) -> syn::Result<Member> {
    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Evented can only be derived for structs",
            ))
        }
    };

    let members: Vec<(Member, &Field)> = match fields {
        Fields::Named(named) => named
            .named
            .iter()
            .filter_map(|f| f.ident.clone().map(|ident| (Member::Named(ident), f)))
            .collect(),
        Fields::Unnamed(unnamed) => unnamed
            .unnamed
            .iter()
            .enumerate()
            .map(|(i, f)| (Member::Unnamed(Index::from(i)), f))
            .collect(),
        Fields::Unit => Vec::new(),
    };

    let marked: Vec<&(Member, &Field)> = members
        .iter()
        .filter(|(_, f)| f.attrs.iter().any(|a| a.path().is_ident("events")))
        .collect();
    match marked.as_slice() {
        [(member, _)] => return Ok(member.clone()),
        [] => {}
        [_, (_, second), ..] => {
            return Err(syn::Error::new_spanned(
                second,
                "only one field may be marked #[events]",
            ))
        }
    }

    let typed: Vec<&(Member, &Field)> = members
        .iter()
        .filter(|(_, f)| is_events_type(&f.ty))
        .collect();
    match typed.as_slice() {
        [(member, _)] => Ok(member.clone()),
        [] => Err(syn::Error::new_spanned(
            &input.ident,
            "Evented needs a field of type `Events` or a field marked #[events]",
        )),
        [_, (_, second), ..] => Err(syn::Error::new_spanned(
            second,
            "several `Events` fields found; mark the one to use with #[events]",
        )),
    }
}

fn is_events_type(ty: &Type) -> bool {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Events"),
        _ => false,
    }
}
