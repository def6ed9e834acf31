//! 楽天用テンプレート

use super::colors::{BORDER, HEADER_BG, LABEL_BG, NOTICE_BG, NOTICE_BORDER};
use super::{Escaped, SectionKind, Template};

/// 楽天 PC（表組み）
pub struct RakutenPc;

impl Template for RakutenPc {
    fn key(&self) -> &'static str {
        "rakuten_pc"
    }

    fn row(&self, label: &Escaped, value: &Escaped) -> String {
        format!(
            "<tr>\n      <th style=\"background:{};padding:10px;border:1px solid {};text-align:left;width:25%;\">{}</th>\n      <td style=\"padding:10px;border:1px solid {};\">{}</td>\n    </tr>",
            LABEL_BG,
            BORDER,
            label.as_str(),
            BORDER,
            value.as_str()
        )
    }

    fn section(&self, _kind: SectionKind, title: &Escaped, rows: &[String]) -> String {
        format!(
            "<div style=\"margin-bottom:20px;\">\n  <div style=\"background:{};padding:12px 16px;border:1px solid {};font-weight:bold;\">{}</div>\n  <table style=\"width:100%;border-collapse:collapse;font-size:14px;\">\n    {}\n  </table>\n</div>",
            HEADER_BG,
            BORDER,
            title.as_str(),
            rows.join("\n    ")
        )
    }

    fn notice(&self, notice: &Escaped) -> String {
        format!(
            "<div style=\"border:2px solid {};background:{};padding:16px;margin-top:20px;\">\n  <strong>注意事項</strong><br>{}\n</div>",
            NOTICE_BORDER,
            NOTICE_BG,
            notice.as_str()
        )
    }

    fn wrap(&self, sections: &[String]) -> String {
        format!(
            "<div style=\"margin:20px auto;max-width:800px;font-family:'メイリオ',Meiryo,sans-serif;\">\n  {}\n</div>",
            sections.join("\n  ")
        )
    }

    fn empty(&self) -> &'static str {
        "<div style=\"padding:20px;color:#999;\">情報を抽出できませんでした</div>"
    }
}

/// 楽天 スマートフォン（table のみ、style属性は最小限）
pub struct RakutenSp;

/// SP共通の1項目（楽天SP・Yahoo SPで共用）
pub(super) fn sp_item(label: &Escaped, value: &Escaped) -> String {
    format!(
        "<table width=\"100%\" cellpadding=\"10\" cellspacing=\"0\" style=\"border:1px solid {};background:#fff;margin-bottom:8px;\"><tr><td style=\"font-weight:bold;color:#555;border-bottom:1px solid #ddd;\">{}</td></tr><tr><td style=\"line-height:1.6;\">{}</td></tr></table>",
        BORDER,
        label.as_str(),
        value.as_str()
    )
}

/// SP共通の注意事項
pub(super) fn sp_notice(notice: &Escaped) -> String {
    format!(
        "<table width=\"100%\" cellpadding=\"12\" cellspacing=\"0\" style=\"border:2px solid {};background:{};margin-top:16px;\"><tr><td><b>注意事項</b><br>{}</td></tr></table>",
        NOTICE_BORDER,
        NOTICE_BG,
        notice.as_str()
    )
}

impl Template for RakutenSp {
    fn key(&self) -> &'static str {
        "rakuten_sp"
    }

    fn row(&self, label: &Escaped, value: &Escaped) -> String {
        sp_item(label, value)
    }

    fn section(&self, _kind: SectionKind, title: &Escaped, rows: &[String]) -> String {
        format!(
            "<table width=\"100%\" cellpadding=\"0\" cellspacing=\"0\" style=\"margin-bottom:16px;\"><tr><td style=\"background:{};padding:10px 12px;font-weight:bold;\">{}</td></tr><tr><td style=\"padding:12px;background:#fafafa;\">{}</td></tr></table>",
            HEADER_BG,
            title.as_str(),
            rows.concat()
        )
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pc_row_is_table_row() {
        let row = RakutenPc.row(&Escaped::new("商品名"), &Escaped::new("チョコ"));
        assert!(row.starts_with("<tr>"));
        assert!(row.contains("<th style="));
        assert!(row.contains(">チョコ</td>"));
    }

    #[test]
    fn test_sp_has_no_div() {
        let rows = vec![RakutenSp.row(&Escaped::new("商品名"), &Escaped::new("チョコ"))];
        let html = RakutenSp.wrap(&[RakutenSp.section(SectionKind::Product, &Escaped::new("商品情報"), &rows)]);
        assert!(!html.contains("<div"));
        assert!(html.contains("商品情報"));
    }
}
