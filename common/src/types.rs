//! 商品情報・診断ログ・解析結果の型定義
//!
//! CLIとリクエストハンドラで共有される型:
//! - ProductInfo: 抽出された商品レコード
//! - LogEntry: 段階ごとの診断メッセージ
//! - ParseResult: 1リクエスト分の最終出力

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// 正規項目
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    ProductName,
    ProductType,
    Ingredients,
    Content,
    Expiry,
    Storage,
    Seller,
    Manufacturer,
    Processor,
    Importer,
}

impl CanonicalField {
    /// 出力・照合の順序
    pub const ALL: [CanonicalField; 10] = [
        CanonicalField::ProductName,
        CanonicalField::ProductType,
        CanonicalField::Ingredients,
        CanonicalField::Content,
        CanonicalField::Expiry,
        CanonicalField::Storage,
        CanonicalField::Seller,
        CanonicalField::Manufacturer,
        CanonicalField::Processor,
        CanonicalField::Importer,
    ];

    /// JSONキー名
    pub fn key(self) -> &'static str {
        match self {
            CanonicalField::ProductName => "product_name",
            CanonicalField::ProductType => "product_type",
            CanonicalField::Ingredients => "ingredients",
            CanonicalField::Content => "content",
            CanonicalField::Expiry => "expiry",
            CanonicalField::Storage => "storage",
            CanonicalField::Seller => "seller",
            CanonicalField::Manufacturer => "manufacturer",
            CanonicalField::Processor => "processor",
            CanonicalField::Importer => "importer",
        }
    }

    /// HTML上の表示ラベル
    pub fn display_label(self) -> &'static str {
        match self {
            CanonicalField::ProductName => "商品名",
            CanonicalField::ProductType => "名称",
            CanonicalField::Ingredients => "原材料",
            CanonicalField::Content => "内容量",
            CanonicalField::Expiry => "賞味期限",
            CanonicalField::Storage => "保存方法",
            CanonicalField::Seller => "販売者",
            CanonicalField::Manufacturer => "製造者",
            CanonicalField::Processor => "加工者",
            CanonicalField::Importer => "輸入者",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.key() == key)
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_label())
    }
}

/// 挿入順を保持する文字列マップ
///
/// 同じキーへの再挿入は位置を変えずに値だけを置き換える。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    entries: Vec<(String, String)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 値を挿入し、置き換えた場合は以前の値を返す
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for FieldMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FieldMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldMapVisitor;

        impl<'de> Visitor<'de> for FieldMapVisitor {
            type Value = FieldMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of strings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FieldMap, A::Error> {
                let mut map = FieldMap::new();
                while let Some((k, v)) = access.next_entry::<String, String>()? {
                    map.insert(k, v);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(FieldMapVisitor)
    }
}

/// 抽出された商品情報
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub importer: Option<String>,

    /// 栄養成分（正規キーまたは元のラベル → 値）
    pub nutrition: FieldMap,
    /// 栄養成分表示の基準（例: 100g当たり）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nutrition_basis: Option<String>,
    /// 注意事項（※行）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    /// 辞書にないラベルの項目
    pub extra_fields: FieldMap,
}

impl ProductInfo {
    pub fn get(&self, field: CanonicalField) -> Option<&str> {
        self.slot(field).as_deref()
    }

    /// 値を設定する。トリム後に空なら何もしない。
    ///
    /// 以前の値があれば返す。
    pub fn set(&mut self, field: CanonicalField, value: &str) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }
        self.slot_mut(field).replace(trimmed.to_string())
    }

    pub fn clear(&mut self, field: CanonicalField) {
        *self.slot_mut(field) = None;
    }

    /// 設定済みの正規項目を出力順に返す
    pub fn populated(&self) -> impl Iterator<Item = (CanonicalField, &str)> {
        CanonicalField::ALL
            .into_iter()
            .filter_map(move |f| self.get(f).map(|v| (f, v)))
    }

    /// 何も抽出できていないか
    pub fn is_empty(&self) -> bool {
        self.populated().next().is_none()
            && self.nutrition.is_empty()
            && self.extra_fields.is_empty()
            && self.notice.is_none()
    }

    fn slot(&self, field: CanonicalField) -> &Option<String> {
        match field {
            CanonicalField::ProductName => &self.product_name,
            CanonicalField::ProductType => &self.product_type,
            CanonicalField::Ingredients => &self.ingredients,
            CanonicalField::Content => &self.content,
            CanonicalField::Expiry => &self.expiry,
            CanonicalField::Storage => &self.storage,
            CanonicalField::Seller => &self.seller,
            CanonicalField::Manufacturer => &self.manufacturer,
            CanonicalField::Processor => &self.processor,
            CanonicalField::Importer => &self.importer,
        }
    }

    fn slot_mut(&mut self, field: CanonicalField) -> &mut Option<String> {
        match field {
            CanonicalField::ProductName => &mut self.product_name,
            CanonicalField::ProductType => &mut self.product_type,
            CanonicalField::Ingredients => &mut self.ingredients,
            CanonicalField::Content => &mut self.content,
            CanonicalField::Expiry => &mut self.expiry,
            CanonicalField::Storage => &mut self.storage,
            CanonicalField::Seller => &mut self.seller,
            CanonicalField::Manufacturer => &mut self.manufacturer,
            CanonicalField::Processor => &mut self.processor,
            CanonicalField::Importer => &mut self.importer,
        }
    }
}

/// ログレベル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

/// 診断ログの1件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// 入力種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    #[default]
    Text,
    Csv,
}

impl InputType {
    pub fn as_str(self) -> &'static str {
        match self {
            InputType::Text => "text",
            InputType::Csv => "csv",
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// モール別HTML
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlBundle {
    pub rakuten_pc: String,
    pub rakuten_sp: String,
    pub yahoo_pc: String,
    pub yahoo_sp: String,
}

impl HtmlBundle {
    /// (キー, HTML) を出力順に返す
    pub fn variants(&self) -> [(&'static str, &str); 4] {
        [
            ("rakuten_pc", self.rakuten_pc.as_str()),
            ("rakuten_sp", self.rakuten_sp.as_str()),
            ("yahoo_pc", self.yahoo_pc.as_str()),
            ("yahoo_sp", self.yahoo_sp.as_str()),
        ]
    }
}

/// 1リクエスト分の解析結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseResult {
    pub product_info: ProductInfo,
    pub html: HtmlBundle,
    pub logs: Vec<LogEntry>,
    pub user_logs: Vec<String>,
    pub normalized_text: String,
    pub input_type: InputType,
}

impl ParseResult {
    pub fn warning_count(&self) -> usize {
        self.logs
            .iter()
            .filter(|log| log.level == LogLevel::Warning)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_map_keeps_insertion_order() {
        let mut map = FieldMap::new();
        map.insert("energy", "595kcal");
        map.insert("protein", "6.7g");
        map.insert("fat", "41.0g");

        let keys: Vec<&str> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["energy", "protein", "fat"]);
    }

    #[test]
    fn test_field_map_replace_keeps_position() {
        let mut map = FieldMap::new();
        map.insert("a", "1");
        map.insert("b", "2");
        let previous = map.insert("a", "3");

        assert_eq!(previous, Some("1".to_string()));
        assert_eq!(map.iter().next(), Some(("a", "3")));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_field_map_json_order() {
        let mut map = FieldMap::new();
        map.insert("z", "1");
        map.insert("a", "2");
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"z":"1","a":"2"}"#);

        let back: FieldMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn test_product_info_set_ignores_blank() {
        let mut info = ProductInfo::default();
        assert_eq!(info.set(CanonicalField::Seller, "   "), None);
        assert!(info.seller.is_none());

        info.set(CanonicalField::Seller, " 株式会社天然生活 ");
        assert_eq!(info.seller.as_deref(), Some("株式会社天然生活"));

        let previous = info.set(CanonicalField::Seller, "別会社");
        assert_eq!(previous.as_deref(), Some("株式会社天然生活"));
    }

    #[test]
    fn test_product_info_omits_absent_fields() {
        let mut info = ProductInfo::default();
        info.set(CanonicalField::ProductName, "チョコレート");

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["product_name"], "チョコレート");
        assert!(json.get("seller").is_none());
        assert!(json["nutrition"].as_object().unwrap().is_empty());
        assert!(json["extra_fields"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_canonical_field_from_key() {
        assert_eq!(CanonicalField::from_key("seller"), Some(CanonicalField::Seller));
        assert_eq!(CanonicalField::from_key("unknown"), None);
        assert_eq!(CanonicalField::Importer.display_label(), "輸入者");
    }

    #[test]
    fn test_log_level_serialization() {
        let entry = LogEntry {
            level: LogLevel::Warning,
            message: "販売者が見つかりませんでした".into(),
            field: None,
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"level":"warning","message":"販売者が見つかりませんでした"}"#);
    }
}
