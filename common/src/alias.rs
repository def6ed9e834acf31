//! ラベル辞書モジュール
//!
//! 商品情報ラベル・栄養成分ラベルの表記ゆれを正規項目へ対応付ける。
//! 辞書は起動時に一度だけ構築し、解析中は読み取り専用で共有する。

use crate::error::{Error, Result};
use crate::normalizer::fold_label;
use crate::types::CanonicalField;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 正規項目ごとのラベル表記
#[derive(Debug, Clone, Serialize)]
pub struct FieldAliases {
    pub field: CanonicalField,
    pub aliases: Vec<String>,
}

/// 栄養成分キーごとのラベル表記
#[derive(Debug, Clone, Serialize)]
pub struct NutritionAliases {
    /// 正規キー（energy, protein, ...）
    pub key: String,
    /// 表示ラベル
    pub label: String,
    pub aliases: Vec<String>,
}

/// ラベル照合結果
#[derive(Debug, Clone, PartialEq)]
pub struct AliasHit<T> {
    pub target: T,
    /// 一致した表記（辞書側の正規化済み文字列）
    pub alias: String,
    /// 一致の確からしさ（完全一致は1.0）
    pub confidence: f32,
}

/// 利用者が追加するエイリアス（JSON）
///
/// ```json
/// {"fields": {"seller": ["取扱者"]}, "nutrition": {"vitamin_c": ["ビタミンC"]}}
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AliasOverrides {
    #[serde(default)]
    pub fields: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub nutrition: BTreeMap<String, Vec<String>>,
    /// 欠落時に警告する項目（未指定なら既定値）
    #[serde(default)]
    pub important_fields: Option<Vec<String>>,
}

impl AliasOverrides {
    /// JSON文字列から読み込み
    pub fn from_json(json: &str) -> Result<Self> {
        let overrides: Self = serde_json::from_str(json)?;
        Ok(overrides)
    }

    /// JSONファイルから読み込み（非WASM環境のみ）
    #[cfg(not(feature = "wasm"))]
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

/// 栄養成分の表示優先順
pub const NUTRITION_PRIORITY: [&str; 5] = ["energy", "protein", "fat", "carbs", "salt"];

/// ラベル辞書
#[derive(Debug, Clone, Serialize)]
pub struct AliasDictionary {
    fields: Vec<FieldAliases>,
    nutrition: Vec<NutritionAliases>,
    important_fields: Vec<CanonicalField>,
    #[serde(skip)]
    field_index: Vec<(String, CanonicalField)>,
    #[serde(skip)]
    nutrition_index: Vec<(String, usize)>,
}

lazy_static::lazy_static! {
    static ref BUILTIN: AliasDictionary = AliasDictionary::food_preset();
}

impl Default for AliasDictionary {
    fn default() -> Self {
        Self::food_preset()
    }
}

impl AliasDictionary {
    /// プロセス共有の組み込み辞書
    pub fn builtin() -> &'static AliasDictionary {
        &BUILTIN
    }

    /// 組み込みプリセットを取得
    pub fn from_preset(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "food" | "食品" | "default" => Some(Self::food_preset()),
            _ => None,
        }
    }

    /// 既定辞書にJSONの追加分を重ねて構築
    pub fn from_json(json: &str) -> Result<Self> {
        let mut dict = Self::food_preset();
        dict.merge(&AliasOverrides::from_json(json)?)?;
        Ok(dict)
    }

    /// 既定辞書にファイルの追加分を重ねて構築（非WASM環境のみ）
    #[cfg(not(feature = "wasm"))]
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let mut dict = Self::food_preset();
        dict.merge(&AliasOverrides::from_file(path)?)?;
        Ok(dict)
    }

    /// 食品表示用プリセット
    fn food_preset() -> Self {
        let fields = vec![
            field(CanonicalField::ProductName, &[
                "商品名", "品名", "製品名", "名前", "商品", "品目",
                "product name", "product", "name", "商品の名前",
            ]),
            field(CanonicalField::ProductType, &[
                "名称", "品種", "種類", "type", "分類", "品目名",
                "商品の種類", "商品種別", "category",
            ]),
            field(CanonicalField::Ingredients, &[
                "原材料", "原材料名", "原料", "成分", "ingredients",
                "使用原材料", "材料", "配合成分", "原材料等",
            ]),
            field(CanonicalField::Content, &[
                "内容量", "容量", "量", "volume", "content", "内容",
                "正味量", "net weight", "入数", "個数",
            ]),
            field(CanonicalField::Expiry, &[
                "賞味期限", "消費期限", "期限", "expiry", "best before",
                "賞味", "消費", "有効期限", "保存期間",
            ]),
            field(CanonicalField::Storage, &[
                "保存方法", "保管方法", "保存", "storage",
                "貯蔵方法", "取扱方法", "保存の方法", "保管の方法",
            ]),
            field(CanonicalField::Seller, &[
                "販売者", "売主", "販売", "seller", "販売元", "販売業者",
                "販売会社", "distributor", "発売元", "販売店",
            ]),
            field(CanonicalField::Manufacturer, &[
                "製造者", "製造元", "製造", "manufacturer", "製造業者",
                "製造会社", "maker", "メーカー", "製造場所",
            ]),
            field(CanonicalField::Processor, &[
                "加工者", "加工元", "加工", "processor", "加工業者",
                "加工会社", "加工場所",
            ]),
            field(CanonicalField::Importer, &[
                "輸入者", "輸入元", "輸入", "importer", "輸入業者",
                "輸入会社", "輸入元会社",
            ]),
        ];

        // 「糖質」は炭水化物側を優先（先に登録したものが勝つ）
        let nutrition = vec![
            nutrient("energy", "エネルギー", &[
                "エネルギー", "energy", "カロリー", "calorie", "kcal",
                "熱量", "calories", "エネルギー量",
            ]),
            nutrient("protein", "たんぱく質", &[
                "たんぱく質", "タンパク質", "蛋白質", "protein",
                "たんぱく", "タンパク", "プロテイン",
            ]),
            nutrient("fat", "脂質", &["脂質", "脂肪", "fat", "lipid", "油脂", "脂肪分"]),
            nutrient("carbs", "炭水化物", &[
                "炭水化物", "糖質", "carbohydrate", "carbs", "炭水化物量",
            ]),
            nutrient("salt", "食塩相当量", &["食塩相当量", "食塩", "塩分", "salt"]),
            nutrient("sodium", "ナトリウム", &["ナトリウム", "ナトリウム量", "sodium", "na"]),
            nutrient("sugar", "糖類", &["糖類", "sugar", "sugars", "炭水化物(糖質)"]),
            nutrient("fiber", "食物繊維", &[
                "食物繊維", "繊維", "fiber", "dietary fiber", "繊維質",
            ]),
        ];

        let important_fields = vec![
            CanonicalField::ProductName,
            CanonicalField::ProductType,
            CanonicalField::Ingredients,
            CanonicalField::Content,
            CanonicalField::Expiry,
            CanonicalField::Storage,
            CanonicalField::Seller,
        ];

        let mut dict = Self {
            fields,
            nutrition,
            important_fields,
            field_index: Vec::new(),
            nutrition_index: Vec::new(),
        };
        dict.rebuild_index();
        dict
    }

    /// 追加分をマージ（追加した表記は既存の後ろに並ぶ）
    pub fn merge(&mut self, overrides: &AliasOverrides) -> Result<()> {
        for (key, aliases) in &overrides.fields {
            let target = CanonicalField::from_key(key)
                .ok_or_else(|| Error::Config(format!("不明な項目キー '{}'", key)))?;
            if let Some(entry) = self.fields.iter_mut().find(|e| e.field == target) {
                extend_unique(&mut entry.aliases, aliases);
            }
        }

        for (key, aliases) in &overrides.nutrition {
            match self.nutrition.iter_mut().find(|e| e.key == *key) {
                Some(entry) => extend_unique(&mut entry.aliases, aliases),
                None => {
                    let label = aliases.first().cloned().unwrap_or_else(|| key.clone());
                    self.nutrition.push(NutritionAliases {
                        key: key.clone(),
                        label,
                        aliases: aliases.clone(),
                    });
                }
            }
        }

        if let Some(keys) = &overrides.important_fields {
            let mut important = Vec::with_capacity(keys.len() + 1);
            for key in keys {
                let target = CanonicalField::from_key(key)
                    .ok_or_else(|| Error::Config(format!("不明な項目キー '{}'", key)))?;
                if !important.contains(&target) {
                    important.push(target);
                }
            }
            self.important_fields = important;
        }

        self.rebuild_index();
        Ok(())
    }

    fn rebuild_index(&mut self) {
        self.field_index = self
            .fields
            .iter()
            .flat_map(|e| e.aliases.iter().map(move |a| (fold_label(a), e.field)))
            .filter(|(a, _)| !a.is_empty())
            .collect();
        self.nutrition_index = self
            .nutrition
            .iter()
            .enumerate()
            .flat_map(|(i, e)| e.aliases.iter().map(move |a| (fold_label(a), i)))
            .filter(|(a, _)| !a.is_empty())
            .collect();
    }

    /// 欠落時に警告する項目（販売者は常に含む）
    pub fn important_fields(&self) -> Vec<CanonicalField> {
        let mut fields = self.important_fields.clone();
        if !fields.contains(&CanonicalField::Seller) {
            fields.push(CanonicalField::Seller);
        }
        fields
    }

    /// 正規項目の完全一致
    pub fn exact_field(&self, label: &str) -> Option<AliasHit<CanonicalField>> {
        let folded = fold_label(label);
        self.field_index
            .iter()
            .find(|(alias, _)| *alias == folded)
            .map(|(alias, field)| AliasHit {
                target: *field,
                alias: alias.clone(),
                confidence: 1.0,
            })
    }

    /// 正規項目の部分一致（最長一致）
    pub fn fuzzy_field(&self, label: &str) -> Option<AliasHit<CanonicalField>> {
        best_fuzzy(&self.field_index, label).map(|(alias, field, confidence)| AliasHit {
            target: *field,
            alias: alias.to_string(),
            confidence,
        })
    }

    /// 栄養成分の完全一致
    pub fn exact_nutrition(&self, label: &str) -> Option<AliasHit<&NutritionAliases>> {
        let folded = fold_label(label);
        self.nutrition_index
            .iter()
            .find(|(alias, _)| *alias == folded)
            .map(|(alias, i)| AliasHit {
                target: &self.nutrition[*i],
                alias: alias.clone(),
                confidence: 1.0,
            })
    }

    /// 栄養成分の部分一致（最長一致）
    pub fn fuzzy_nutrition(&self, label: &str) -> Option<AliasHit<&NutritionAliases>> {
        best_fuzzy(&self.nutrition_index, label).map(|(alias, i, confidence)| AliasHit {
            target: &self.nutrition[*i],
            alias: alias.to_string(),
            confidence,
        })
    }

    /// 辞書に完全一致するラベルか
    pub fn is_known_label(&self, label: &str) -> bool {
        self.exact_field(label).is_some() || self.exact_nutrition(label).is_some()
    }

    /// 栄養成分キーの表示ラベル（未登録キーはそのまま）
    pub fn nutrition_label<'a>(&'a self, key: &'a str) -> &'a str {
        self.nutrition
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.label.as_str())
            .unwrap_or(key)
    }

    pub fn fields(&self) -> &[FieldAliases] {
        &self.fields
    }

    pub fn nutrition(&self) -> &[NutritionAliases] {
        &self.nutrition
    }
}

fn field(target: CanonicalField, aliases: &[&str]) -> FieldAliases {
    FieldAliases {
        field: target,
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
    }
}

fn nutrient(key: &str, label: &str, aliases: &[&str]) -> NutritionAliases {
    NutritionAliases {
        key: key.into(),
        label: label.into(),
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
    }
}

fn extend_unique(target: &mut Vec<String>, extra: &[String]) {
    for alias in extra {
        if !target.contains(alias) {
            target.push(alias.clone());
        }
    }
}

/// 括弧内の補足（例: 賞味期限(製造日より)）を除いたラベル
fn strip_parenthetical(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut depth = 0usize;
    for c in label.chars() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

/// 部分一致の最良候補
///
/// - 表記側・ラベル側とも2文字以上
/// - 短い方が長い方の半分を超えて覆っていること
/// - 重なりの長い順、同長なら登録順
fn best_fuzzy<'a, T>(index: &'a [(String, T)], label: &str) -> Option<(&'a str, &'a T, f32)> {
    let folded = strip_parenthetical(&fold_label(label));
    let label_len = folded.chars().count();
    if label_len < 2 {
        return None;
    }

    let mut best: Option<(&str, &T, usize, f32)> = None;
    for (alias, target) in index {
        let alias_len = alias.chars().count();
        if alias_len < 2 {
            continue;
        }
        let overlaps = folded.contains(alias.as_str()) || alias.contains(folded.as_str());
        if !overlaps {
            continue;
        }
        let overlap = alias_len.min(label_len);
        let ratio = overlap as f32 / alias_len.max(label_len) as f32;
        if ratio <= 0.5 {
            continue;
        }
        let better = match best {
            None => true,
            Some((_, _, best_overlap, best_ratio)) => {
                overlap > best_overlap || (overlap == best_overlap && ratio > best_ratio)
            }
        };
        if better {
            best = Some((alias.as_str(), target, overlap, ratio));
        }
    }

    best.map(|(alias, target, _, ratio)| (alias, target, ratio))
}
