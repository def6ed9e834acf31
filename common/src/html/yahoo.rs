//! Yahoo!ショッピング用テンプレート

use super::colors::{BORDER, NOTICE_BG, NOTICE_BORDER};
use super::rakuten::{sp_item, sp_notice};
use super::{Escaped, SectionKind, Template};

/// Yahoo PC（section + 定義リスト）
pub struct YahooPc;

impl Template for YahooPc {
    fn key(&self) -> &'static str {
        "yahoo_pc"
    }

    fn row(&self, label: &Escaped, value: &Escaped) -> String {
        format!(
            "<dt style=\"font-weight:bold;color:#444;margin-bottom:4px;\">{}</dt><dd style=\"margin:0 0 12px 0;padding-bottom:12px;border-bottom:1px solid {};\">{}</dd>",
            label.as_str(),
            BORDER,
            value.as_str()
        )
    }

    fn section(&self, _kind: SectionKind, title: &Escaped, rows: &[String]) -> String {
        format!(
            "<section style=\"margin-bottom:24px;font-family:'ヒラギノ角ゴ ProN',sans-serif;\">\n  <h2 style=\"font-size:18px;border-bottom:2px solid #333;padding-bottom:6px;\">{}</h2>\n  <dl style=\"margin:16px 0;\">{}</dl>\n</section>",
            title.as_str(),
            rows.concat()
        )
    }

    fn notice(&self, notice: &Escaped) -> String {
        format!(
            "<section style=\"border:2px solid {};padding:16px;background:{};\">\n  <h2 style=\"margin-top:0;\">注意事項</h2>\n  <p style=\"margin:0;\">{}</p>\n</section>",
            NOTICE_BORDER,
            NOTICE_BG,
            notice.as_str()
        )
    }

    fn wrap(&self, sections: &[String]) -> String {
        sections.concat()
    }

    fn empty(&self) -> &'static str {
        "<div style=\"padding:16px;color:#666;\">情報を抽出できませんでした</div>"
    }
}

/// Yahoo スマートフォン（商品情報は見出しなしで並べる）
pub struct YahooSp;

impl Template for YahooSp {
    fn key(&self) -> &'static str {
        "yahoo_sp"
    }

    fn row(&self, label: &Escaped, value: &Escaped) -> String {
        sp_item(label, value)
    }

    fn section(&self, kind: SectionKind, title: &Escaped, rows: &[String]) -> String {
        match kind {
            SectionKind::Product => rows.join("<br>"),
            SectionKind::Nutrition => format!(
                "<table width=\"100%\" cellpadding=\"0\" cellspacing=\"0\" style=\"margin-top:16px;\"><tr><td style=\"font-weight:bold;padding-bottom:8px;\">{}</td></tr><tr><td>{}</td></tr></table>",
                title.as_str(),
                rows.concat()
            ),
        }
    }

    fn notice(&self, notice: &Escaped) -> String {
        sp_notice(notice)
    }

    fn wrap(&self, sections: &[String]) -> String {
        sections.join("<br>")
    }

    fn empty(&self) -> &'static str {
        "<p>情報を抽出できませんでした</p>"
    }
}
