//! 未知項目・注意事項の収集
//!
//! 抽出・栄養成分のどちらにも使われなかった行を拾う。
//! - `ラベル:値` の形で辞書にないもの → `extra_fields`
//! - `※` 行や `注意` / `アレルギー` ラベル → `notice`
//! - 区切りのない自由記述は無視

use crate::alias::AliasDictionary;
use crate::diagnostics::{preview, Diagnostics};
use crate::normalizer::{LineMarker, LogicalLine};
use crate::types::ProductInfo;
use std::collections::BTreeSet;

/// 注意事項とみなすラベルの先頭
const NOTICE_LABELS: [&str; 2] = ["注意", "アレルギー"];

pub struct UnknownFieldCollector<'a> {
    dict: &'a AliasDictionary,
}

impl<'a> UnknownFieldCollector<'a> {
    pub fn new(dict: &'a AliasDictionary) -> Self {
        Self { dict }
    }

    pub fn collect(
        &self,
        lines: &[LogicalLine],
        consumed: &mut BTreeSet<usize>,
        product: &mut ProductInfo,
        diag: &mut Diagnostics,
    ) {
        let mut notices: Vec<String> = Vec::new();

        for line in lines {
            if consumed.contains(&line.index) || line.is_blank() {
                continue;
            }

            if line.marker == LineMarker::Note && !line.separator.has_label() {
                notices.push(line.text.clone());
                consumed.insert(line.index);
                continue;
            }

            let Some((label, value)) = line.pair() else {
                continue;
            };
            if !line.separator.is_explicit() {
                continue;
            }
            if self.dict.is_known_label(label)
                || self.dict.fuzzy_field(label).is_some()
                || self.dict.fuzzy_nutrition(label).is_some()
            {
                continue;
            }

            if line.marker == LineMarker::Note || NOTICE_LABELS.iter().any(|p| label.starts_with(p)) {
                notices.push(format!("{}:{}", label, value));
                consumed.insert(line.index);
                continue;
            }

            let key = label.trim().to_string();
            if let Some(previous) = product.extra_fields.insert(key.clone(), value.trim()) {
                diag.warn_for(
                    format!("extra.{}", key),
                    format!("項目「{}」が重複しています。「{}」を後の値で上書きしました", key, previous),
                );
            }
            diag.info_for(
                format!("extra.{}", key),
                format!("未知の項目『{}』: {}", key, preview(value, 30)),
            );
            consumed.insert(line.index);
        }

        if !notices.is_empty() {
            let notice = notices.join("\n");
            diag.info_for("notice", format!("注意書きを抽出: {}", preview(&notice, 50)));
            product.notice = Some(notice);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::TextNormalizer;

    fn run(raw: &str) -> (ProductInfo, Diagnostics) {
        let dict = AliasDictionary::builtin();
        let normalized = TextNormalizer::new(dict).normalize(raw);
        let mut consumed = BTreeSet::new();
        let mut product = ProductInfo::default();
        let mut diag = Diagnostics::new();
        UnknownFieldCollector::new(dict).collect(&normalized.lines, &mut consumed, &mut product, &mut diag);
        (product, diag)
    }

    #[test]
    fn test_unknown_label_captured() {
        let (product, diag) = run("産地：岡山県\nお届け：冷蔵便");
        assert_eq!(product.extra_fields.get("産地"), Some("岡山県"));
        assert_eq!(product.extra_fields.get("お届け"), Some("冷蔵便"));
        assert_eq!(diag.logs().len(), 2);
    }

    #[test]
    fn test_free_text_ignored() {
        let (product, _) = run("とてもおいしいチョコレートです");
        assert!(product.extra_fields.is_empty());
        assert!(product.notice.is_none());
    }

    #[test]
    fn test_known_labels_skipped() {
        let (product, _) = run("商品名：チョコ\nエネルギー：595kcal");
        assert!(product.extra_fields.is_empty());
    }

    #[test]
    fn test_note_lines_become_notice() {
        let (product, _) = run("※本品製造工場では卵を含む製品を製造しています\n※直射日光を避けてください");
        assert_eq!(
            product.notice.as_deref(),
            Some("本品製造工場では卵を含む製品を製造しています\n直射日光を避けてください")
        );
    }

    #[test]
    fn test_notice_label() {
        let (product, _) = run("アレルギー：卵・乳");
        assert_eq!(product.notice.as_deref(), Some("アレルギー:卵・乳"));
        assert!(product.extra_fields.is_empty());
    }
}
