use quote::ToTokens;
use syn::{Attribute, Token};

// 提取非 derive 属性与已有 derive 列表
pub(crate) fn split_derives(attrs: &[Attribute]) -> (Vec<Attribute>, Vec<syn::Path>) {
    let mut retained = Vec::new();
    let mut existing = Vec::new();
    for attr in attrs.iter() {
        if attr.path().is_ident("derive") {
            if let Ok(list) = attr.parse_args_with(
                syn::punctuated::Punctuated::<syn::Path, Token![,]>::parse_terminated,
            ) {
                existing.extend(list);
            }
        } else {
            retained.push(attr.clone());
        }
    }
    (retained, existing)
}

// 合并默认与已有 derive（去重，优先保留 required）
pub(crate) fn merge_derives(existing: Vec<syn::Path>, required: Vec<syn::Path>) -> Attribute {
    let mut seen = std::collections::HashSet::<String>::new();
    let final_list: Vec<syn::Path> = required
        .into_iter()
        .chain(existing)
        .filter(|p| seen.insert(derive_key(p)))
        .collect();
    syn::parse_quote!(#[derive(#(#final_list),*)])
}

// 归一化 derive 的 key，避免 Serialize/serde::Serialize 重复
pub(crate) fn derive_key(p: &syn::Path) -> String {
    match p.segments.last() {
        Some(last) => {
            let last_ident = last.ident.to_string();
            match last_ident.as_str() {
                "Serialize" | "Deserialize" => format!("serde::{last_ident}"),
                _ => last_ident,
            }
        }
        None => p.to_token_stream().to_string(),
    }
}

// derive 必须位于 serde 等辅助属性之前，合并后的 derive 放在最前
pub(crate) fn apply_derives(attrs: &mut Vec<Attribute>, required: Vec<syn::Path>) {
    let (retained, existing) = split_derives(attrs);
    let merged = merge_derives(existing, required);
    *attrs = std::iter::once(merged).chain(retained).collect();
}

/// `UploadPdf` -> `upload-pdf`
pub(crate) fn to_kebab_case(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len() + 4);
    let mut prev_lower = false;
    for ch in ident.chars() {
        if ch.is_ascii_uppercase() {
            if prev_lower {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
            prev_lower = false;
        } else if ch == '_' {
            out.push('-');
            prev_lower = false;
        } else {
            out.push(ch);
            prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kebab_case_from_type_name() {
        assert_eq!(to_kebab_case("UploadPdf"), "upload-pdf");
        assert_eq!(to_kebab_case("RateAnswers"), "rate-answers");
        assert_eq!(to_kebab_case("Order2Placed"), "order2-placed");
        assert_eq!(to_kebab_case("Pdf"), "pdf");
    }

    #[test]
    fn serde_derives_are_deduplicated() {
        let attrs: Vec<Attribute> = vec![
            syn::parse_quote!(#[derive(Serialize, Default)]),
            syn::parse_quote!(#[serde(rename_all = "camelCase")]),
        ];
        let mut attrs = attrs;
        apply_derives(
            &mut attrs,
            vec![
                syn::parse_quote!(Debug),
                syn::parse_quote!(serde::Serialize),
            ],
        );

        assert_eq!(attrs.len(), 2);
        let (_, derives) = split_derives(&attrs);
        let keys: Vec<_> = derives.iter().map(derive_key).collect();
        assert_eq!(keys, vec!["Debug", "serde::Serialize", "Default"]);
        assert!(attrs[1].path().is_ident("serde"));
    }
}
