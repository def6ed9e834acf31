//! 照合戦略
//!
//! 1行ずつ適用する戦略（完全一致・部分一致）と、
//! 文書全体を見て最後に適用する位置推定を定義する。

use crate::alias::AliasDictionary;
use crate::normalizer::{is_nutrition_heading, LineMarker, LogicalLine, Separator};
use crate::types::CanonicalField;

/// 照合結果
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMatch {
    pub field: CanonicalField,
    /// 一致した辞書側の表記
    pub alias: String,
    pub confidence: f32,
    pub strategy: &'static str,
}

/// 1行に対する照合戦略
pub trait LineStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// ラベルを正規項目に対応付ける
    fn match_label(&self, label: &str, dict: &AliasDictionary) -> Option<FieldMatch>;
}

/// 完全一致（幅・大小文字を無視）
pub struct ExactMatch;

impl LineStrategy for ExactMatch {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn match_label(&self, label: &str, dict: &AliasDictionary) -> Option<FieldMatch> {
        dict.exact_field(label).map(|hit| FieldMatch {
            field: hit.target,
            alias: hit.alias,
            confidence: hit.confidence,
            strategy: self.name(),
        })
    }
}

/// 部分一致（ラベルが表記を含む、または表記に含まれる）
///
/// 栄養成分の表記の方が長く一致する場合は譲る。
pub struct FuzzyMatch;

impl LineStrategy for FuzzyMatch {
    fn name(&self) -> &'static str {
        "fuzzy"
    }

    fn match_label(&self, label: &str, dict: &AliasDictionary) -> Option<FieldMatch> {
        let hit = dict.fuzzy_field(label)?;
        if let Some(nutrition) = dict.fuzzy_nutrition(label) {
            if nutrition.alias.chars().count() > hit.alias.chars().count() {
                return None;
            }
        }
        Some(FieldMatch {
            field: hit.target,
            alias: hit.alias,
            confidence: hit.confidence,
            strategy: self.name(),
        })
    }
}

/// 既定の戦略列（この順に試し、最初の一致を採用）
pub fn default_strategies() -> Vec<Box<dyn LineStrategy>> {
    vec![Box::new(ExactMatch), Box::new(FuzzyMatch)]
}

/// 位置による商品名推定
///
/// 商品名がどのラベルにも一致しなかったとき、最初の空でない行が
/// 区切りのない自由記述なら、その行全体を商品名とみなす。
pub struct PositionalFallback;

/// 位置推定の確度
pub const POSITIONAL_CONFIDENCE: f32 = 0.3;

impl PositionalFallback {
    pub fn name(&self) -> &'static str {
        "positional"
    }

    /// 採用する行を返す
    pub fn find<'l>(&self, lines: &'l [LogicalLine]) -> Option<&'l LogicalLine> {
        let first = lines.iter().find(|l| !l.is_blank())?;
        let usable = first.separator == Separator::None
            && !matches!(first.marker, LineMarker::Note | LineMarker::Bracket)
            && !is_nutrition_heading(&first.text);
        usable.then_some(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::TextNormalizer;

    #[test]
    fn test_exact_match() {
        let dict = AliasDictionary::builtin();
        let hit = ExactMatch.match_label("原材料名", dict).unwrap();
        assert_eq!(hit.field, CanonicalField::Ingredients);
        assert_eq!(hit.strategy, "exact");
        assert!(ExactMatch.match_label("原材料の産地", dict).is_none());
    }

    #[test]
    fn test_fuzzy_match_contains() {
        let dict = AliasDictionary::builtin();
        let hit = FuzzyMatch.match_label("販売者名", dict).unwrap();
        assert_eq!(hit.field, CanonicalField::Seller);
        assert_eq!(hit.strategy, "fuzzy");
    }

    #[test]
    fn test_fuzzy_match_contained_by_alias() {
        let dict = AliasDictionary::builtin();
        let hit = FuzzyMatch.match_label("保存方", dict).unwrap();
        assert_eq!(hit.field, CanonicalField::Storage);
    }

    #[test]
    fn test_fuzzy_yields_to_nutrition() {
        let dict = AliasDictionary::from_json(r#"{"fields": {"storage": ["相当量"]}}"#).unwrap();
        assert!(dict.fuzzy_field("食塩相当量").is_some());
        // 栄養成分側の「食塩相当量」の方が長く一致する
        assert!(FuzzyMatch.match_label("食塩相当量", &dict).is_none());
    }

    #[test]
    fn test_positional_fallback_first_free_line() {
        let dict = AliasDictionary::builtin();
        let normalized = TextNormalizer::new(dict).normalize("\n蒜山高原チョコ\n■名称：菓子");
        let line = PositionalFallback.find(&normalized.lines).unwrap();
        assert_eq!(line.text, "蒜山高原チョコ");
    }

    #[test]
    fn test_positional_fallback_skips_labeled_first_line() {
        let dict = AliasDictionary::builtin();
        let normalized = TextNormalizer::new(dict).normalize("■名称：菓子\n蒜山高原チョコ");
        assert!(PositionalFallback.find(&normalized.lines).is_none());
    }
}
