//! product-html-rust
//!
//! 商品説明テキスト解析・モール別HTML生成ツールのCLI側ライブラリ。
//! 解析本体は `product_html_common` にある。

pub mod batch;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod scanner;

use cli::InputKind;
use product_html_common::InputType;
use std::path::Path;

/// 指定された入力種別を確定する（auto は拡張子 → 内容の順に判定）
pub fn resolve_input_type(kind: InputKind, path: &Path, content: &str) -> InputType {
    match kind {
        InputKind::Text => InputType::Text,
        InputKind::Csv => InputType::Csv,
        InputKind::Auto => scanner::input_type_for_path(path).unwrap_or_else(|| {
            // 拡張子で決まらなければ、1行目にタブがあればCSVとみなす
            let first = content.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
            if first.contains('\t') {
                InputType::Csv
            } else {
                InputType::Text
            }
        }),
    }
}
