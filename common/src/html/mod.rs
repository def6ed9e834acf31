//! モール別HTML生成
//!
//! 4種類のテンプレート（楽天PC/SP、Yahoo PC/SP）は外枠のマークアップだけが異なる。
//! 項目の並び順とエスケープはすべて `HtmlGenerator::render` で共通。
//!
//! 並び順:
//! 1. 正規項目（商品名 → 輸入者）
//! 2. 未知項目（出現順）
//! 3. 栄養成分（エネルギー・たんぱく質・脂質・炭水化物・食塩相当量 → その他）
//! 4. 注意事項

mod rakuten;
mod yahoo;

pub use rakuten::{RakutenPc, RakutenSp};
pub use yahoo::{YahooPc, YahooSp};

use crate::alias::{AliasDictionary, NUTRITION_PRIORITY};
use crate::sanitize::escape_html;
use crate::types::{HtmlBundle, ProductInfo};

/// 配色
pub(crate) mod colors {
    pub const HEADER_BG: &str = "#f5f5f5";
    pub const LABEL_BG: &str = "#e8e8e8";
    pub const BORDER: &str = "#333";
    pub const NOTICE_BORDER: &str = "#ff6b6b";
    pub const NOTICE_BG: &str = "#fff5f5";
}

/// 見出しの既定の表示基準
pub const DEFAULT_NUTRITION_BASIS: &str = "100g当たり";

/// エスケープ済み文字列
///
/// テンプレートはこの型しか受け取らないため、未エスケープの値は出力されない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Escaped(String);

impl Escaped {
    pub fn new(raw: &str) -> Self {
        Self(escape_html(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// セクションの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Product,
    Nutrition,
}

/// モール別テンプレート
pub trait Template: Send + Sync {
    /// 出力キー（rakuten_pc など）
    fn key(&self) -> &'static str;

    /// 1項目分
    fn row(&self, label: &Escaped, value: &Escaped) -> String;

    /// 項目をまとめた1セクション
    fn section(&self, kind: SectionKind, title: &Escaped, rows: &[String]) -> String;

    /// 注意事項
    fn notice(&self, notice: &Escaped) -> String;

    /// セクション全体の外枠
    fn wrap(&self, sections: &[String]) -> String;

    /// 何も出力する項目がない場合
    fn empty(&self) -> &'static str;
}

/// HTML生成器
pub struct HtmlGenerator<'a> {
    dict: &'a AliasDictionary,
}

impl<'a> HtmlGenerator<'a> {
    pub fn new(dict: &'a AliasDictionary) -> Self {
        Self { dict }
    }

    /// 4種類すべてを生成
    pub fn generate_all(&self, product: &ProductInfo) -> HtmlBundle {
        HtmlBundle {
            rakuten_pc: self.render(product, &RakutenPc),
            rakuten_sp: self.render(product, &RakutenSp),
            yahoo_pc: self.render(product, &YahooPc),
            yahoo_sp: self.render(product, &YahooSp),
        }
    }

    /// 1テンプレート分を生成
    pub fn render(&self, product: &ProductInfo, template: &dyn Template) -> String {
        let mut sections = Vec::new();

        let product_rows: Vec<String> = self
            .product_entries(product)
            .into_iter()
            .map(|(label, value)| template.row(&Escaped::new(&label), &Escaped::new(&value)))
            .collect();
        if !product_rows.is_empty() {
            sections.push(template.section(
                SectionKind::Product,
                &Escaped::new("商品情報"),
                &product_rows,
            ));
        }

        let nutrition_rows: Vec<String> = self
            .nutrition_entries(product)
            .into_iter()
            .map(|(label, value)| template.row(&Escaped::new(label), &Escaped::new(value)))
            .collect();
        if !nutrition_rows.is_empty() {
            sections.push(template.section(
                SectionKind::Nutrition,
                &Escaped::new(&nutrition_title(product)),
                &nutrition_rows,
            ));
        }

        if let Some(notice) = &product.notice {
            sections.push(template.notice(&Escaped::new(notice)));
        }

        if sections.is_empty() {
            template.empty().to_string()
        } else {
            template.wrap(&sections)
        }
    }

    /// (表示ラベル, 値) を正規項目 → 未知項目の順に
    fn product_entries(&self, product: &ProductInfo) -> Vec<(String, String)> {
        product
            .populated()
            .map(|(field, value)| (field.display_label().to_string(), value.to_string()))
            .chain(
                product
                    .extra_fields
                    .iter()
                    .map(|(label, value)| (label.to_string(), value.to_string())),
            )
            .collect()
    }

    /// 栄養成分を表示優先順に
    pub fn nutrition_entries<'p>(&'p self, product: &'p ProductInfo) -> Vec<(&'p str, &'p str)> {
        let nutrition = &product.nutrition;
        let mut entries: Vec<(&str, &str)> = NUTRITION_PRIORITY
            .iter()
            .filter_map(|key| nutrition.get(key).map(|v| (self.dict.nutrition_label(key), v)))
            .collect();
        entries.extend(
            nutrition
                .iter()
                .filter(|(key, _)| !NUTRITION_PRIORITY.iter().any(|p| p == key))
                .map(|(key, value)| (self.dict.nutrition_label(key), value)),
        );
        entries
    }
}

/// 栄養成分セクションの見出し
pub fn nutrition_title(product: &ProductInfo) -> String {
    let basis = product
        .nutrition_basis
        .as_deref()
        .unwrap_or(DEFAULT_NUTRITION_BASIS);
    format!("栄養成分表示（{}）推定値", basis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CanonicalField;

    fn sample() -> ProductInfo {
        let mut product = ProductInfo::default();
        product.set(CanonicalField::ProductName, "蒜山高原ミックスチョコレート");
        product.set(CanonicalField::Seller, "株式会社天然生活");
        product.extra_fields.insert("産地", "岡山県");
        product.nutrition.insert("sodium", "118mg");
        product.nutrition.insert("energy", "595kcal");
        product.notice = Some("卵を含む製品と同じ工場で製造".to_string());
        product
    }

    #[test]
    fn test_all_variants_contain_values() {
        let bundle = HtmlGenerator::new(AliasDictionary::builtin()).generate_all(&sample());
        for (key, html) in bundle.variants() {
            assert!(html.contains("蒜山高原ミックスチョコレート"), "{}", key);
            assert!(html.contains("産地"), "{}", key);
            assert!(html.contains("595kcal"), "{}", key);
            assert!(html.contains("注意事項"), "{}", key);
        }
    }

    #[test]
    fn test_binding_order() {
        let generator = HtmlGenerator::new(AliasDictionary::builtin());
        let html = generator.render(&sample(), &RakutenPc);
        let name = html.find("商品名").unwrap();
        let seller = html.find("販売者").unwrap();
        let extra = html.find("産地").unwrap();
        let energy = html.find("エネルギー").unwrap();
        let sodium = html.find("ナトリウム").unwrap();
        let notice = html.find("注意事項").unwrap();
        assert!(name < seller && seller < extra && extra < energy);
        assert!(energy < sodium && sodium < notice);
    }

    #[test]
    fn test_values_escaped() {
        let mut product = ProductInfo::default();
        product.set(CanonicalField::ProductName, "A&B <特製>");
        let bundle = HtmlGenerator::new(AliasDictionary::builtin()).generate_all(&product);
        for (_, html) in bundle.variants() {
            assert!(html.contains("A&amp;B &lt;特製&gt;"));
            assert!(!html.contains("<特製>"));
        }
    }

    #[test]
    fn test_empty_product_placeholder() {
        let bundle = HtmlGenerator::new(AliasDictionary::builtin()).generate_all(&ProductInfo::default());
        for (_, html) in bundle.variants() {
            assert!(html.contains("情報を抽出できませんでした"));
        }
    }

    #[test]
    fn test_nutrition_title_basis() {
        let mut product = ProductInfo::default();
        assert_eq!(nutrition_title(&product), "栄養成分表示（100g当たり）推定値");
        product.nutrition_basis = Some("1袋(50g)当たり".to_string());
        assert_eq!(nutrition_title(&product), "栄養成分表示（1袋(50g)当たり）推定値");
    }

    #[test]
    fn test_nutrition_priority_order() {
        let generator = HtmlGenerator::new(AliasDictionary::builtin());
        let product = sample();
        let entries = generator.nutrition_entries(&product);
        assert_eq!(entries, vec![("エネルギー", "595kcal"), ("ナトリウム", "118mg")]);
    }

    #[test]
    fn test_template_keys() {
        let keys: Vec<&str> = [
            &RakutenPc as &dyn Template,
            &RakutenSp,
            &YahooPc,
            &YahooSp,
        ]
        .iter()
        .map(|t| t.key())
        .collect();
        assert_eq!(keys, vec!["rakuten_pc", "rakuten_sp", "yahoo_pc", "yahoo_sp"]);
    }
}
