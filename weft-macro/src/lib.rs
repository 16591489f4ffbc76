/*
 * Copyright (c) 2025. The Weft Authors
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */
#![forbid(unsafe_code)]

//! Weft Macro Library
//!
//! This library provides the procedural macro that removes the derive
//! boilerplate from Weft message payload types.
//!
//! # Message Macro
//!
//! The [`weft_message`] macro prepares a plain struct for use as a message
//! payload:
//!
//! ```ignore
//! #[weft_message]
//! pub struct CreateProject {
//!     pub title: String,
//! }
//!
//! impl TypedPayload for CreateProject {
//!     const NAME: &'static str = "command/project/create";
//!     const FAMILY: MessageFamily = MessageFamily::Command;
//! }
//! ```

use proc_macro::TokenStream;

use quote::quote;
use syn::{parse_macro_input, DeriveInput};

fn has_derive(input: &DeriveInput, trait_name: &str) -> bool {
    input.attrs.iter().any(|attr| {
        if attr.path().is_ident("derive") {
            let mut found = false;
            let _ = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident(trait_name) {
                    found = true;
                }
                Ok(())
            });
            found
        } else {
            false
        }
    })
}

/// A procedural macro preparing a struct for use as a Weft message payload.
///
/// Every payload crosses the wire as JSON and is cloned into each handler,
/// so payload types must be `Clone`, `Debug`, `Serialize` and `Deserialize`.
/// This macro derives whichever of the four are not already present and adds
/// a compile-time assertion that the type is `Send + Sync + 'static`, so an
/// invalid payload type fails with a clear message at its definition site
/// rather than deep inside a trait bound.
///
/// # Usage
///
/// ```ignore
/// use weft::prelude::*;
///
/// #[weft_message]
/// pub struct PingCommand {
///     pub payload: String,
/// }
/// ```
///
/// The serde derives are emitted with absolute paths (`::serde::...`), so
/// `serde` must be a dependency of the using crate, which it always is when
/// depending on `weft`.
#[proc_macro_attribute]
pub fn weft_message(_attr: TokenStream, item: TokenStream) -> TokenStream {
    // Parse the input tokens into a syntax tree.
    let input = parse_macro_input!(item as DeriveInput);

    // Get the name and generics of the struct.
    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    // Determine which traits need to be derived
    let need_clone = !has_derive(&input, "Clone");
    let need_debug = !has_derive(&input, "Debug");
    let need_serialize = !has_derive(&input, "Serialize");
    let need_deserialize = !has_derive(&input, "Deserialize");

    // Build the list of traits to derive
    let derives = {
        let mut traits = Vec::new();
        if need_clone {
            traits.push(quote!(Clone));
        }
        if need_debug {
            traits.push(quote!(Debug));
        }
        if need_serialize {
            traits.push(quote!(::serde::Serialize));
        }
        if need_deserialize {
            traits.push(quote!(::serde::Deserialize));
        }
        if traits.is_empty() {
            quote!()
        } else {
            quote!(#[derive(#(#traits),*)])
        }
    };

    // Generate a unique identifier for the static assertion to avoid conflicts
    let assert_ident = quote::format_ident!("_AssertWeftMessage_{}", name);

    let expanded = quote! {
        #derives
        #input

        // Compile-time assertion that the payload type satisfies
        // Send + Sync + 'static.
        #[doc(hidden)]
        #[allow(dead_code, non_camel_case_types, non_snake_case, clippy::needless_lifetimes)]
        const _: () = {
            fn #assert_ident #impl_generics () #where_clause {
                fn assert_bounds<T: Send + Sync + 'static>() {}
                assert_bounds::<#name #ty_generics>();
            }
        };
    };

    // Return the generated tokens.
    TokenStream::from(expanded)
}
