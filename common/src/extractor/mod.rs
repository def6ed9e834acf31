//! 項目抽出モジュール
//!
//! 論理行を辞書と照合して正規項目を埋める。
//!
//! ## 処理フロー
//! 1. ラベル行ごとに戦略（完全一致 → 部分一致）を順に試す
//! 2. 同じ項目が再度現れたら後の値で上書きし、警告を残す
//! 3. 商品名が埋まらなければ先頭の自由記述行を商品名とみなす
//! 4. 重要項目の欠落を警告する

pub mod strategy;

use crate::alias::AliasDictionary;
use crate::diagnostics::{preview, Diagnostics};
use crate::normalizer::LogicalLine;
use crate::types::{CanonicalField, ProductInfo};
use std::collections::BTreeSet;
use strategy::{default_strategies, FieldMatch, LineStrategy, PositionalFallback, POSITIONAL_CONFIDENCE};

/// 抽出結果
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// 正規項目のみを埋めた商品情報
    pub product: ProductInfo,
    /// 採用した行番号
    pub consumed: BTreeSet<usize>,
    /// (行番号, 照合結果)
    pub matches: Vec<(usize, FieldMatch)>,
}

/// 項目抽出器
pub struct FieldExtractor<'a> {
    dict: &'a AliasDictionary,
    strategies: Vec<Box<dyn LineStrategy>>,
    fallback: PositionalFallback,
}

impl<'a> FieldExtractor<'a> {
    pub fn new(dict: &'a AliasDictionary) -> Self {
        Self::with_strategies(dict, default_strategies())
    }

    pub fn with_strategies(dict: &'a AliasDictionary, strategies: Vec<Box<dyn LineStrategy>>) -> Self {
        Self {
            dict,
            strategies,
            fallback: PositionalFallback,
        }
    }

    /// 1つのラベルを戦略順に照合
    pub fn match_label(&self, label: &str) -> Option<FieldMatch> {
        self.strategies
            .iter()
            .find_map(|s| s.match_label(label, self.dict))
    }

    pub fn extract(&self, lines: &[LogicalLine], diag: &mut Diagnostics) -> Extraction {
        let mut extraction = Extraction::default();
        // 項目ごとに最後に採用したラベル
        let mut seen: Vec<(CanonicalField, String)> = Vec::new();

        for line in lines {
            let Some((label, value)) = line.pair() else {
                continue;
            };
            if self.belongs_to_nutrition(label) {
                continue;
            }
            let Some(hit) = self.match_label(label) else {
                continue;
            };

            let field = hit.field;
            let previous = extraction.product.set(field, value);
            extraction.consumed.insert(line.index);

            if previous.is_some() {
                let first_label = seen
                    .iter()
                    .rev()
                    .find(|(f, _)| *f == field)
                    .map(|(_, l)| l.clone())
                    .unwrap_or_default();
                diag.warn_for(
                    field.key(),
                    format!(
                        "{}のラベルが重複しています（「{}」→「{}」）。後の値「{}」で上書きしました",
                        field.display_label(),
                        first_label,
                        label,
                        preview(value, 30)
                    ),
                );
            }

            if hit.strategy == "exact" {
                diag.info_for(
                    field.key(),
                    format!("{}を抽出: {}", field.display_label(), preview(value, 30)),
                );
            } else {
                diag.info_for(
                    field.key(),
                    format!(
                        "「{}」を{}として抽出（{}一致「{}」, 確度{:.2}）: {}",
                        label,
                        field.display_label(),
                        hit.strategy,
                        hit.alias,
                        hit.confidence,
                        preview(value, 30)
                    ),
                );
            }

            seen.push((field, label.to_string()));
            extraction.matches.push((line.index, hit));
        }

        if extraction.product.product_name.is_none() {
            self.apply_fallback(lines, &mut extraction, diag);
        }

        for field in self.dict.important_fields() {
            if extraction.product.get(field).is_none() {
                diag.warn_for(
                    field.key(),
                    format!("{}が見つかりませんでした", field.display_label()),
                );
            }
        }

        extraction
    }

    /// 栄養成分に任せるラベルか
    fn belongs_to_nutrition(&self, label: &str) -> bool {
        if label.contains("栄養成分") {
            return true;
        }
        self.dict.exact_field(label).is_none() && self.dict.exact_nutrition(label).is_some()
    }

    fn apply_fallback(&self, lines: &[LogicalLine], extraction: &mut Extraction, diag: &mut Diagnostics) {
        let Some(line) = self.fallback.find(lines) else {
            return;
        };
        if extraction.product.set(CanonicalField::ProductName, &line.text).is_none()
            && extraction.product.product_name.is_some()
        {
            extraction.consumed.insert(line.index);
            extraction.matches.push((
                line.index,
                FieldMatch {
                    field: CanonicalField::ProductName,
                    alias: String::new(),
                    confidence: POSITIONAL_CONFIDENCE,
                    strategy: self.fallback.name(),
                },
            ));
            diag.warn_for(
                CanonicalField::ProductName.key(),
                format!(
                    "ラベルがないため先頭行「{}」を商品名とみなしました（確度{:.1}）",
                    preview(&line.text, 30),
                    POSITIONAL_CONFIDENCE
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::TextNormalizer;
    use crate::types::LogLevel;

    fn run(raw: &str) -> (Extraction, Diagnostics) {
        let dict = AliasDictionary::builtin();
        let normalized = TextNormalizer::new(dict).normalize(raw);
        let mut diag = Diagnostics::new();
        let extraction = FieldExtractor::new(dict).extract(&normalized.lines, &mut diag);
        (extraction, diag)
    }

    #[test]
    fn test_extract_standard_labels() {
        let (extraction, _) = run(
            "■商品名：蒜山高原ミックスチョコレート\n■名称：チョコレート\n■内容量：300g\n■販売者：株式会社天然生活",
        );
        let product = extraction.product;
        assert_eq!(product.product_name.as_deref(), Some("蒜山高原ミックスチョコレート"));
        assert_eq!(product.product_type.as_deref(), Some("チョコレート"));
        assert_eq!(product.content.as_deref(), Some("300g"));
        assert_eq!(product.seller.as_deref(), Some("株式会社天然生活"));
        assert_eq!(extraction.consumed.len(), 4);
    }

    #[test]
    fn test_extract_label_variations() {
        let (extraction, _) = run("品名：チョコレート\n原料：砂糖\n販売元：天然生活");
        let product = extraction.product;
        assert_eq!(product.product_name.as_deref(), Some("チョコレート"));
        assert_eq!(product.ingredients.as_deref(), Some("砂糖"));
        assert_eq!(product.seller.as_deref(), Some("天然生活"));
    }

    #[test]
    fn test_duplicate_label_last_write_wins() {
        let (extraction, diag) = run("販売者：A商店\n販売者：B商店");
        assert_eq!(extraction.product.seller.as_deref(), Some("B商店"));
        let duplicates: Vec<_> = diag
            .logs()
            .iter()
            .filter(|l| l.level == LogLevel::Warning && l.message.contains("重複"))
            .collect();
        assert_eq!(duplicates.len(), 1);
        assert!(duplicates[0].message.contains("販売者"));
    }

    #[test]
    fn test_fuzzy_match_logged_with_confidence() {
        let (extraction, diag) = run("販売者名：天然生活");
        assert_eq!(extraction.product.seller.as_deref(), Some("天然生活"));
        assert!(diag.logs().iter().any(|l| l.message.contains("fuzzy")));
    }

    #[test]
    fn test_positional_fallback_warns() {
        let (extraction, diag) = run("蒜山高原ミックスチョコレート\n\n■名称：菓子");
        assert_eq!(
            extraction.product.product_name.as_deref(),
            Some("蒜山高原ミックスチョコレート")
        );
        assert!(extraction.consumed.contains(&0));
        assert!(diag
            .logs()
            .iter()
            .any(|l| l.level == LogLevel::Warning && l.message.contains("先頭行")));
    }

    #[test]
    fn test_nutrition_labels_left_alone() {
        let (extraction, _) = run("商品名：チョコ\nエネルギー：595kcal\n食塩相当量：0.3g");
        assert_eq!(extraction.consumed.len(), 1);
        assert!(extraction.product.content.is_none());
    }

    #[test]
    fn test_missing_seller_warned() {
        let (_, diag) = run("商品名：チョコ");
        assert!(diag
            .logs()
            .iter()
            .any(|l| l.field.as_deref() == Some("seller") && l.level == LogLevel::Warning));
    }

    #[test]
    fn test_unknown_label_not_consumed() {
        let (extraction, _) = run("商品名：チョコ\n産地：岡山県");
        assert!(!extraction.consumed.contains(&1));
    }
}
