//! 栄養成分ブロックの解析
//!
//! `【栄養成分表示(100g当たり)】` や `栄養成分表示` で始まるブロックを探し、
//! 続く `ラベル:値` 行を栄養成分キーごとに取り込む。値（単位を含む）は加工しない。

use crate::alias::AliasDictionary;
use crate::diagnostics::{preview, Diagnostics};
use crate::normalizer::{is_nutrition_heading, LineMarker, LogicalLine, Separator};
use crate::options::NutritionOptions;
use crate::types::ProductInfo;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;

lazy_static! {
    static ref NUMBER_RE: Regex = Regex::new(r"(\d+\.?\d*)").unwrap();
}

/// 栄養成分パーサー
pub struct NutritionParser<'a> {
    dict: &'a AliasDictionary,
    options: &'a NutritionOptions,
}

impl<'a> NutritionParser<'a> {
    pub fn new(dict: &'a AliasDictionary, options: &'a NutritionOptions) -> Self {
        Self { dict, options }
    }

    /// ブロックを解析して `product.nutrition` を埋める
    ///
    /// 取り込んだ行（見出しを含む）は `consumed` に加える。
    pub fn parse(
        &self,
        lines: &[LogicalLine],
        consumed: &mut BTreeSet<usize>,
        product: &mut ProductInfo,
        diag: &mut Diagnostics,
    ) {
        let mut i = 0;
        let mut found_marker = false;
        while i < lines.len() {
            let line = &lines[i];
            if consumed.contains(&line.index) || !self.is_marker(line) {
                i += 1;
                continue;
            }

            found_marker = true;
            consumed.insert(line.index);
            if product.nutrition_basis.is_none() {
                if let Some(basis) = basis_of(&line.text) {
                    diag.info_for("nutrition", format!("栄養成分の表示基準: {}", basis));
                    product.nutrition_basis = Some(basis);
                }
            }

            i += 1;
            // 項目として抽出済みの行でもブロックは終わる
            while i < lines.len() && !consumed.contains(&lines[i].index) && !self.ends_block(&lines[i]) {
                let entry = &lines[i];
                if let Some((label, value)) = self.entry_of(entry) {
                    self.insert(label, value, product, diag);
                    consumed.insert(entry.index);
                }
                i += 1;
            }
        }

        self.handle_unmarked(lines, consumed, product, diag, found_marker);

        if self.options.derive_salt_from_sodium {
            derive_salt(product, diag);
        }

        if product.nutrition.is_empty() {
            diag.info_for("nutrition", "栄養成分が見つかりませんでした");
        }
    }

    fn is_marker(&self, line: &LogicalLine) -> bool {
        match &line.label {
            Some(label) if line.separator.has_label() => label.trim_start().starts_with("栄養成分"),
            _ => is_nutrition_heading(&line.text),
        }
    }

    /// ブロックの終わり（空行・次の見出し・見出し記号の行・正規項目のラベル）
    fn ends_block(&self, line: &LogicalLine) -> bool {
        if line.is_blank() || self.is_marker(line) {
            return true;
        }
        if let Some(label) = &line.label {
            if self.dict.exact_nutrition(label).is_some() {
                return false;
            }
        }
        if line.marker.starts_block() {
            return true;
        }
        match &line.label {
            Some(label) => {
                self.dict.exact_field(label).is_some()
                    || (self.dict.fuzzy_field(label).is_some() && self.dict.fuzzy_nutrition(label).is_none())
            }
            None => false,
        }
    }

    /// ブロック内の1行をラベルと値に分ける
    ///
    /// `エネルギー595kcal` のように区切りがない行は数字の直前で分ける。
    fn entry_of<'l>(&self, line: &'l LogicalLine) -> Option<(&'l str, &'l str)> {
        if let Some(pair) = line.pair() {
            return Some(pair);
        }
        if line.separator != Separator::None || line.marker == LineMarker::Note {
            return None;
        }
        let text = line.text.as_str();
        let pos = text.find(|c: char| c.is_ascii_digit())?;
        let (label, value) = text.split_at(pos);
        let label = label.trim();
        self.dict.exact_nutrition(label).map(|_| (label, value.trim()))
    }

    fn insert(&self, label: &str, value: &str, product: &mut ProductInfo, diag: &mut Diagnostics) {
        let key = match self.dict.exact_nutrition(label) {
            Some(hit) => hit.target.key.clone(),
            None => match self.dict.fuzzy_nutrition(label) {
                Some(hit) => {
                    diag.info_for(
                        format!("nutrition.{}", hit.target.key),
                        format!(
                            "「{}」を{}として扱いました（確度{:.2}）",
                            label, hit.target.label, hit.confidence
                        ),
                    );
                    hit.target.key.clone()
                }
                None => label.to_string(),
            },
        };

        let field = format!("nutrition.{}", key);
        if let Some(previous) = product.nutrition.insert(key.clone(), value.trim()) {
            diag.warn_for(
                field.clone(),
                format!(
                    "栄養成分「{}」が重複しています。「{}」を後の値で上書きしました",
                    label, previous
                ),
            );
        }
        diag.info_for(
            field,
            format!("栄養成分 {}: {}", self.dict.nutrition_label(&key), preview(value, 30)),
        );
    }

    /// 見出しの外にある栄養成分行
    fn handle_unmarked(
        &self,
        lines: &[LogicalLine],
        consumed: &mut BTreeSet<usize>,
        product: &mut ProductInfo,
        diag: &mut Diagnostics,
        found_marker: bool,
    ) {
        for line in lines {
            if consumed.contains(&line.index) {
                continue;
            }
            let Some((label, value)) = line.pair() else {
                continue;
            };
            if self.dict.exact_field(label).is_some() || self.dict.exact_nutrition(label).is_none() {
                continue;
            }
            if self.options.collect_unmarked {
                self.insert(label, value, product, diag);
                consumed.insert(line.index);
            } else {
                let place = if found_marker { "栄養成分表示の外" } else { "栄養成分表示の見出しがない位置" };
                diag.warn_for(
                    "nutrition",
                    format!("{}に栄養成分「{}」があります。取り込みませんでした", place, label),
                );
            }
        }
    }
}

/// 見出しの括弧内（例: 100g当たり）
///
/// `1袋(50g)当たり` のような入れ子は外側の括弧でまとめて取る。
fn basis_of(marker: &str) -> Option<String> {
    outer_parentheticals(marker)
        .into_iter()
        .map(str::trim)
        .find(|b| !b.is_empty() && *b != "推定値")
        .map(str::to_string)
}

/// 最も外側の `(...)` の中身を順に返す（閉じていない括弧は無視）
fn outer_parentheticals(text: &str) -> Vec<&str> {
    let mut groups = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (pos, c) in text.char_indices() {
        match c {
            '(' => {
                if depth == 0 {
                    start = pos + c.len_utf8();
                }
                depth += 1;
            }
            ')' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    groups.push(&text[start..pos]);
                }
            }
            _ => {}
        }
    }
    groups
}

/// ナトリウムから食塩相当量を算出（食塩相当量 = ナトリウム × 2.54）
fn derive_salt(product: &mut ProductInfo, diag: &mut Diagnostics) {
    if product.nutrition.contains_key("salt") {
        return;
    }
    let Some(sodium) = product.nutrition.get("sodium") else {
        return;
    };
    let Some(salt) = sodium_to_salt(sodium) else {
        diag.warn_for("nutrition.salt", format!("ナトリウム値「{}」を数値として読めませんでした", sodium));
        return;
    };
    diag.info_for(
        "nutrition.salt",
        format!("ナトリウム {} から食塩相当量 {} を算出しました", sodium, salt),
    );
    product.nutrition.insert("salt", salt);
}

/// ナトリウム表記を食塩相当量（g）に換算
pub fn sodium_to_salt(sodium: &str) -> Option<String> {
    let caps = NUMBER_RE.captures(sodium)?;
    let amount: f64 = caps[1].parse().ok()?;
    let lower = sodium.to_lowercase();
    let grams = if lower.contains("mg") {
        amount / 1000.0
    } else if lower.contains('g') {
        amount
    } else {
        amount / 1000.0
    };
    Some(format!("{:.1}g", grams * 2.54))
}
