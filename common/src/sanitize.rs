//! 危険なマークアップの除去とHTMLエスケープ
//!
//! すべてのテンプレートはこのモジュールを通して値を出力する。

use crate::diagnostics::Diagnostics;
use crate::types::{CanonicalField, FieldMap, ProductInfo};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// (パターン, 説明)
    static ref DISALLOWED: Vec<(Regex, &'static str)> = vec![
        (Regex::new(r"(?is)<script\b.*?</script\s*>").unwrap(), "scriptタグ"),
        (Regex::new(r"(?is)<style\b.*?</style\s*>").unwrap(), "styleタグ"),
        (Regex::new(r"(?i)</?\s*(script|style|iframe|object|embed)\b[^>]*>").unwrap(), "埋め込みタグ"),
        (Regex::new(r"(?i)\bon[a-z]+\s*=").unwrap(), "イベント属性"),
        (Regex::new(r"(?i)(javascript|vbscript)\s*:").unwrap(), "スクリプトURL"),
    ];
}

/// 値から危険なマークアップを取り除く
///
/// 除去で新たなタグが組み上がることがあるため、何も除去しなくなるまで繰り返す。
/// 除去した種類を返す（なければ空）。
pub fn strip_disallowed(value: &str) -> (String, Vec<&'static str>) {
    let mut cleaned = value.to_string();
    let mut found = Vec::new();
    loop {
        let mut removed = false;
        for (pattern, description) in DISALLOWED.iter() {
            if pattern.is_match(&cleaned) {
                cleaned = pattern.replace_all(&cleaned, "").into_owned();
                removed = true;
                if !found.contains(description) {
                    found.push(*description);
                }
            }
        }
        if !removed {
            break;
        }
    }
    (cleaned, found)
}

/// HTMLエスケープ（改行は `<br>`）
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '\n' => out.push_str("<br>"),
            _ => out.push(c),
        }
    }
    out
}

/// 商品情報の全項目を無害化する
///
/// 除去のたびに警告を残す。除去後に空になった項目は取り除く。
pub fn sanitize_product(product: &ProductInfo, diag: &mut Diagnostics) -> ProductInfo {
    let mut clean = product.clone();

    for field in CanonicalField::ALL {
        let Some(value) = product.get(field) else {
            continue;
        };
        let sanitized = sanitize_value(field.key(), field.display_label(), value, diag);
        clean.clear(field);
        if let Some(v) = sanitized {
            clean.set(field, &v);
        }
    }

    clean.nutrition = sanitize_map(&product.nutrition, "nutrition", diag);
    clean.extra_fields = sanitize_map(&product.extra_fields, "extra", diag);
    clean.notice = product
        .notice
        .as_deref()
        .and_then(|v| sanitize_value("notice", "注意事項", v, diag));
    clean.nutrition_basis = product
        .nutrition_basis
        .as_deref()
        .and_then(|v| sanitize_value("nutrition", "栄養成分表示の基準", v, diag));

    clean
}

fn sanitize_map(map: &FieldMap, prefix: &str, diag: &mut Diagnostics) -> FieldMap {
    let mut clean = FieldMap::new();
    for (key, value) in map.iter() {
        let (label, label_hits) = strip_disallowed(key);
        let field = format!("{}.{}", prefix, label.trim());
        if !label_hits.is_empty() {
            diag.warn_for(
                field.clone(),
                format!("ラベルから{}を除去しました", label_hits.join("・")),
            );
        }
        if label.trim().is_empty() {
            continue;
        }
        if let Some(v) = sanitize_value(&field, label.trim(), value, diag) {
            clean.insert(label.trim(), v);
        }
    }
    clean
}

fn sanitize_value(field: &str, label: &str, value: &str, diag: &mut Diagnostics) -> Option<String> {
    let (cleaned, hits) = strip_disallowed(value);
    if !hits.is_empty() {
        diag.warn_for(
            field,
            format!("{}から{}を除去しました（セキュリティ）", label, hits.join("・")),
        );
    }
    let trimmed = cleaned.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
