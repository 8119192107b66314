use crate::utils::{apply_derives, to_kebab_case};
use proc_macro::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Item, LitStr, Result, Token, parse::Parse, parse::ParseStream, parse_macro_input};

/// #[event_payload] 宏实现
/// - 仅支持结构体
/// - 合并/追加派生：Debug, Clone, Serialize, Deserialize
/// - 实现 `::relay_domain::event::Event`：`NAME` 取 `name` 参数，缺省为类型名的 kebab-case
/// - `validate` 开启时以类型本身作为载荷 schema
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as EventPayloadAttrConfig);
    let input = parse_macro_input!(item as Item);

    let mut st = match input {
        Item::Struct(s) => s,
        other => {
            return syn::Error::new(other.span(), "#[event_payload] only on struct")
                .to_compile_error()
                .into();
        }
    };

    apply_derives(
        &mut st.attrs,
        vec![
            syn::parse_quote!(Debug),
            syn::parse_quote!(Clone),
            syn::parse_quote!(serde::Serialize),
            syn::parse_quote!(serde::Deserialize),
        ],
    );

    let ident = &st.ident;
    let name = cfg
        .name
        .map(|lit| lit.value())
        .unwrap_or_else(|| to_kebab_case(&ident.to_string()));
    let (impl_generics, ty_generics, where_clause) = st.generics.split_for_impl();

    let definition = if cfg.validate {
        quote! {
            fn definition() -> ::relay_domain::event::PayloadDefinition {
                ::relay_domain::event::PayloadDefinition::typed::<Self>()
            }
        }
    } else {
        quote! {}
    };

    let expanded = quote! {
        #st

        impl #impl_generics ::relay_domain::event::Event for #ident #ty_generics #where_clause {
            const NAME: &'static str = #name;

            #definition
        }
    };

    TokenStream::from(expanded)
}

// -------- parsing --------

struct EventPayloadAttrConfig {
    name: Option<LitStr>,
    validate: bool,
}

impl Parse for EventPayloadAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut name: Option<LitStr> = None;
        let mut validate: Option<bool> = None;

        let elems: Punctuated<EventPayloadAttrElem, Token![,]> =
            Punctuated::parse_terminated(input)?;
        for elem in elems {
            match elem {
                EventPayloadAttrElem::Name(lit) => {
                    if name.is_some() {
                        return Err(syn::Error::new(lit.span(), "duplicate key 'name' in attribute"));
                    }
                    if lit.value().trim().is_empty() {
                        return Err(syn::Error::new(lit.span(), "event name must not be empty"));
                    }
                    name = Some(lit);
                }
                EventPayloadAttrElem::Validate(span, b) => {
                    if validate.is_some() {
                        return Err(syn::Error::new(span, "duplicate key 'validate' in attribute"));
                    }
                    validate = Some(b);
                }
            }
        }

        Ok(Self {
            name,
            validate: validate.unwrap_or(false),
        })
    }
}

enum EventPayloadAttrElem {
    Name(LitStr),
    Validate(proc_macro2::Span, bool),
}

impl Parse for EventPayloadAttrElem {
    fn parse(input: ParseStream) -> Result<Self> {
        let key: syn::Ident = input.parse()?;
        if key == "name" {
            let _eq: Token![=] = input.parse()?;
            Ok(Self::Name(input.parse()?))
        } else if key == "validate" {
            // 支持 `validate` 与 `validate = true|false`
            if !input.peek(Token![=]) {
                return Ok(Self::Validate(key.span(), true));
            }
            let _eq: Token![=] = input.parse()?;
            let lit: syn::LitBool = input.parse()?;
            Ok(Self::Validate(key.span(), lit.value()))
        } else {
            Err(syn::Error::new(
                key.span(),
                "unknown key in attribute; expected 'name' or 'validate'",
            ))
        }
    }
}
