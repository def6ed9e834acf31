//! HTML・一覧出力の統合テスト

use product_html_common::{InputType, Pipeline};
use product_html_rust::export::summary::{write_summary_csv, SUMMARY_HEADERS};
use product_html_rust::export::viewer::render_viewer;
use product_html_rust::export::{html_path, write_result, SummaryRow};
use std::fs;
use tempfile::tempdir;

fn sample_rows() -> Vec<SummaryRow> {
    let result = Pipeline::builtin()
        .process("商品名：チョコ\n内容量：300g", InputType::Text)
        .expect("解析失敗");
    vec![
        SummaryRow::from_result("choco.txt", &result),
        SummaryRow::failed("empty.txt", "入力テキストが空です".to_string()),
    ]
}

#[test]
fn test_write_result_files() {
    let dir = tempdir().expect("Failed to create temp dir");
    let result = Pipeline::builtin()
        .process("商品名：チョコ", InputType::Text)
        .unwrap();

    let written = write_result(&result, dir.path(), "choco").unwrap();
    assert_eq!(written.len(), 5);

    let pc = fs::read_to_string(html_path(dir.path(), "choco", "rakuten_pc")).unwrap();
    assert_eq!(pc, result.html.rakuten_pc);
    assert!(dir.path().join("choco_yahoo_sp.html").exists());

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("choco.json")).unwrap()).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["product_info"]["product_name"], "チョコ");
}

#[test]
fn test_summary_csv_has_bom_and_rows() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("summary.csv");
    write_summary_csv(&sample_rows(), &path).unwrap();

    let bytes = fs::read(&path).unwrap();
    assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);

    let content = String::from_utf8(bytes[3..].to_vec()).unwrap();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(content.as_bytes());
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.iter().collect::<Vec<_>>(), SUMMARY_HEADERS.to_vec());

    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 2);
    assert_eq!(&records[0][1], "チョコ");
    assert!(records[0][4].contains("チョコ"));
    assert_eq!(&records[1][3], "入力テキストが空です");
    assert_eq!(&records[1][4], "");
}

#[test]
fn test_viewer_lists_products() {
    let html = render_viewer(&sample_rows());

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("（2件）"));
    assert!(html.contains("choco.txt"));
    assert!(html.contains("tab-1-rakuten_pc"));
    assert!(html.contains("入力テキストが空です"));
    // 失敗した入力にはタブを出さない
    assert!(!html.contains("tab-2-rakuten_pc"));
}

#[test]
fn test_viewer_escapes_source() {
    let html = render_viewer(&sample_rows());
    // ソース表示はエスケープ済み
    assert!(html.contains("&lt;div"));
}
