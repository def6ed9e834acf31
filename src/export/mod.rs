pub mod summary;
pub mod viewer;

use crate::error::Result;
use product_html_common::pipeline::success_response;
use product_html_common::{HtmlBundle, ParseResult};
use std::path::{Path, PathBuf};

/// 一覧（summary.csv / viewer.html）の1行
#[derive(Debug, Clone, Default)]
pub struct SummaryRow {
    /// 入力ファイル名
    pub source: String,
    pub product_name: String,
    pub warnings: usize,
    pub html: HtmlBundle,
    /// 致命的エラー（あればHTMLは空）
    pub error: Option<String>,
}

impl SummaryRow {
    pub fn from_result(source: &str, result: &ParseResult) -> Self {
        Self {
            source: source.to_string(),
            product_name: result.product_info.product_name.clone().unwrap_or_default(),
            warnings: result.warning_count(),
            html: result.html.clone(),
            error: None,
        }
    }

    pub fn failed(source: &str, message: String) -> Self {
        Self {
            source: source.to_string(),
            error: Some(message),
            ..Self::default()
        }
    }
}

/// HTMLファイルのパス（{stem}_{rakuten_pc,...}.html）
pub fn html_path(output_dir: &Path, stem: &str, variant: &str) -> PathBuf {
    output_dir.join(format!("{}_{}.html", stem, variant))
}

/// 1件分の結果を書き出す
///
/// 4種類のHTMLと、応答と同じ形のJSON（{stem}.json）を出力する。
pub fn write_result(result: &ParseResult, output_dir: &Path, stem: &str) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;
    let mut written = Vec::with_capacity(5);

    for (variant, html) in result.html.variants() {
        let path = html_path(output_dir, stem, variant);
        std::fs::write(&path, html)?;
        written.push(path);
    }

    let json_path = output_dir.join(format!("{}.json", stem));
    let json = serde_json::to_string_pretty(&success_response(result))?;
    std::fs::write(&json_path, json)?;
    written.push(json_path);

    Ok(written)
}
