//! 一覧CSV出力
//!
//! 入力ごとに4種類のHTMLを1行にまとめる（Excelで開けるようBOM付きUTF-8）。

use super::SummaryRow;
use crate::error::Result;
use csv::WriterBuilder;
use std::io::Write;
use std::path::Path;

pub const SUMMARY_HEADERS: [&str; 8] = [
    "入力ファイル",
    "商品名",
    "警告数",
    "エラー",
    "楽天パソコン",
    "楽天スマホ",
    "Yahooパソコン",
    "Yahooスマホ",
];

pub fn write_summary_csv(rows: &[SummaryRow], path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    // UTF-8 BOMを先頭に追加
    file.write_all("\u{FEFF}".as_bytes())?;

    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
    writer.write_record(SUMMARY_HEADERS)?;

    for row in rows {
        let warnings = row.warnings.to_string();
        writer.write_record([
            row.source.as_str(),
            row.product_name.as_str(),
            warnings.as_str(),
            row.error.as_deref().unwrap_or(""),
            row.html.rakuten_pc.as_str(),
            row.html.rakuten_sp.as_str(),
            row.html.yahoo_pc.as_str(),
            row.html.yahoo_sp.as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
