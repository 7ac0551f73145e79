//! `#[conformance(name = "category.case")]`: registers an async scenario.
//!
//! The annotated function must be `async fn name(cx: &Interop) -> TestResult`.
//! Next to it the macro emits a `NAME: ConformanceTest` constant that the
//! category module lists in its `CASES` table.

use proc_macro::TokenStream;
use proc_macro2::{Ident, Literal, TokenStream as TokenStream2, TokenTree};
use quote::{format_ident, quote};

#[proc_macro_attribute]
pub fn conformance(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr = TokenStream2::from(attr);
    let item = TokenStream2::from(item);

    match expand(attr, item.clone()) {
        Ok(tokens) => tokens.into(),
        Err(message) => quote! {
            ::core::compile_error!(#message);
            #item
        }
        .into(),
    }
}

fn expand(attr: TokenStream2, item: TokenStream2) -> Result<TokenStream2, String> {
    let name = case_name(attr)?;
    let func = async_fn_ident(item.clone())?;

    let wrapper = format_ident!("__{}_case", func);
    let registration = format_ident!("{}", func.to_string().to_uppercase());
    let doc = format!("Registration of `{}`.", name);

    Ok(quote! {
        #item

        #[doc(hidden)]
        pub fn #wrapper(cx: &crate::harness::Interop) -> crate::CaseFuture<'_> {
            ::std::boxed::Box::pin(#func(cx))
        }

        #[doc = #doc]
        pub const #registration: crate::ConformanceTest = crate::ConformanceTest {
            name: #name,
            func: #wrapper,
        };
    })
}

/// Parse `name = "category.case"`.
fn case_name(attr: TokenStream2) -> Result<String, String> {
    let tokens: Vec<TokenTree> = attr.into_iter().collect();
    let name = match tokens.as_slice() {
        [TokenTree::Ident(key), TokenTree::Punct(eq), TokenTree::Literal(value)]
            if key == "name" && eq.as_char() == '=' =>
        {
            unquote(value)?
        }
        _ => return Err("expected `#[conformance(name = \"category.case\")]`".to_string()),
    };

    match name.split_once('.') {
        Some((category, case)) if !category.is_empty() && !case.is_empty() => Ok(name),
        _ => Err(format!("case name `{}` must look like `category.case`", name)),
    }
}

fn unquote(literal: &Literal) -> Result<String, String> {
    let text = literal.to_string();
    text.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .filter(|inner| !inner.contains('\\'))
        .map(str::to_string)
        .ok_or_else(|| format!("expected a plain string literal, found {}", text))
}

/// Find the identifier after `fn`, requiring an `async` before it.
fn async_fn_ident(item: TokenStream2) -> Result<Ident, String> {
    let mut saw_async = false;
    let mut tokens = item.into_iter();

    while let Some(token) = tokens.next() {
        if let TokenTree::Ident(ident) = &token {
            if ident == "async" {
                saw_async = true;
            } else if ident == "fn" {
                return match tokens.next() {
                    Some(TokenTree::Ident(name)) if saw_async => Ok(name),
                    Some(TokenTree::Ident(_)) => {
                        Err("conformance cases must be `async fn`".to_string())
                    }
                    _ => Err("expected a function name after `fn`".to_string()),
                };
            }
        }
    }

    Err("#[conformance] can only be applied to functions".to_string())
}
