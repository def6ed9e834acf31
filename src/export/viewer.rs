//! 生成結果ビューアー（viewer.html）
//!
//! 入力ごとに折りたたみ可能なカードを作り、4種類のHTMLをタブで切り替えて
//! プレビューとソースを確認できるようにする。

use super::SummaryRow;
use crate::error::Result;
use product_html_common::sanitize::escape_html;
use std::fmt::Write as _;
use std::path::Path;

const TABS: [(&str, &str); 4] = [
    ("rakuten_pc", "楽天PC"),
    ("rakuten_sp", "楽天スマホ"),
    ("yahoo_pc", "Yahoo! PC"),
    ("yahoo_sp", "Yahoo! スマホ"),
];

const STYLE: &str = r#"
* { margin: 0; padding: 0; box-sizing: border-box; }
body { font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; background: #f5f5f5; padding: 20px; }
.container { max-width: 1400px; margin: 0 auto; }
h1 { color: #333; margin-bottom: 30px; text-align: center; }
.product-item { background: white; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); margin-bottom: 40px; overflow: hidden; }
.product-header { background: #2c3e50; color: white; padding: 15px 20px; cursor: pointer; display: flex; justify-content: space-between; align-items: center; }
.product-header:hover { background: #34495e; }
.product-meta { font-size: 0.9em; opacity: 0.8; }
.product-error { color: #ff6b6b; }
.product-content { display: none; }
.product-content.open { display: block; }
.tabs { display: flex; border-bottom: 2px solid #ddd; background: #fafafa; padding: 10px 20px 0; }
.tab-button { padding: 10px 20px; border: none; background: none; cursor: pointer; border-bottom: 3px solid transparent; font-weight: 500; color: #666; }
.tab-button.active { color: #2c3e50; border-bottom-color: #3498db; }
.tab-content { display: none; padding: 20px; }
.tab-content.active { display: block; }
.preview-section { border: 1px solid #ddd; border-radius: 4px; padding: 20px; background: white; margin-bottom: 20px; }
.preview-section h3 { color: #2c3e50; margin-bottom: 15px; font-size: 1.1em; }
pre { background: #f8f8f8; padding: 15px; border-radius: 4px; white-space: pre-wrap; word-wrap: break-word; font-size: 0.85em; line-height: 1.5; max-height: 400px; overflow-y: auto; }
"#;

const SCRIPT: &str = r#"
function toggleProduct(idx) {
  document.getElementById('content-' + idx).classList.toggle('open');
}
function showTab(idx, name) {
  document.querySelectorAll('#content-' + idx + ' .tab-button').forEach(function (b) {
    b.classList.toggle('active', b.dataset.tab === name);
  });
  document.querySelectorAll('#content-' + idx + ' .tab-content').forEach(function (c) {
    c.classList.toggle('active', c.id === 'tab-' + idx + '-' + name);
  });
}
"#;

pub fn render_viewer(rows: &[SummaryRow]) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"ja\">\n<head>\n<meta charset=\"UTF-8\">\n<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n<title>HTML生成結果ビューアー</title>\n<style>{}</style>\n</head>\n<body>\n<div class=\"container\">\n<h1>HTML生成結果ビューアー（{}件）</h1>\n",
        STYLE,
        rows.len()
    );

    for (i, row) in rows.iter().enumerate() {
        let idx = i + 1;
        let title = if row.product_name.is_empty() {
            "（商品名なし）"
        } else {
            row.product_name.as_str()
        };
        let meta = match &row.error {
            Some(error) => format!("<span class=\"product-error\">{}</span>", escape_html(error)),
            None => format!("警告 {}件", row.warnings),
        };
        let _ = write!(
            html,
            "<div class=\"product-item\">\n<div class=\"product-header\" onclick=\"toggleProduct({idx})\">\n<div><strong>{}</strong><br><span class=\"product-meta\">{} / {}</span></div>\n<span>▼</span>\n</div>\n<div class=\"product-content\" id=\"content-{idx}\">\n",
            escape_html(title),
            escape_html(&row.source),
            meta,
            idx = idx
        );

        if row.error.is_none() {
            html.push_str("<div class=\"tabs\">\n");
            for (n, (key, label)) in TABS.iter().enumerate() {
                let active = if n == 0 { " active" } else { "" };
                let _ = writeln!(
                    html,
                    "<button class=\"tab-button{}\" data-tab=\"{}\" onclick=\"showTab({}, '{}')\">{}</button>",
                    active, key, idx, key, label
                );
            }
            html.push_str("</div>\n");

            for (n, (key, content)) in row.html.variants().iter().enumerate() {
                let active = if n == 0 { " active" } else { "" };
                let _ = write!(
                    html,
                    "<div class=\"tab-content{}\" id=\"tab-{}-{}\">\n<div class=\"preview-section\"><h3>プレビュー</h3>\n{}\n</div>\n<div class=\"preview-section\"><h3>HTMLソース</h3><pre>{}</pre></div>\n</div>\n",
                    active,
                    idx,
                    key,
                    content,
                    escape_html(content)
                );
            }
        }

        html.push_str("</div>\n</div>\n");
    }

    let _ = write!(html, "</div>\n<script>{}</script>\n</body>\n</html>\n", SCRIPT);
    html
}

pub fn write_viewer(rows: &[SummaryRow], path: &Path) -> Result<()> {
    std::fs::write(path, render_viewer(rows))?;
    Ok(())
}
