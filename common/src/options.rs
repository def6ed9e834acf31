//! パイプライン設定

use serde::{Deserialize, Serialize};

/// 入力の最大文字数
pub const DEFAULT_MAX_INPUT_LENGTH: usize = 100_000;

/// 応答に含めるログの上限
pub const MAX_LOG_ENTRIES: usize = 100;

/// 栄養成分の解析設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NutritionOptions {
    /// ナトリウムのみの場合に食塩相当量を算出する
    pub derive_salt_from_sodium: bool,
    /// 見出しのない栄養成分行も取り込む
    pub collect_unmarked: bool,
}

impl Default for NutritionOptions {
    fn default() -> Self {
        Self {
            derive_salt_from_sodium: true,
            collect_unmarked: false,
        }
    }
}

/// CSV取り込み設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    /// 区切り文字判定に使う先頭行数
    pub sniff_rows: usize,
    /// ヘッダーとみなす辞書一致率
    pub header_threshold: f32,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            sniff_rows: 10,
            header_threshold: 0.5,
        }
    }
}

/// パイプライン全体の設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    pub max_input_length: usize,
    pub csv: CsvOptions,
    pub nutrition: NutritionOptions,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_input_length: DEFAULT_MAX_INPUT_LENGTH,
            csv: CsvOptions::default(),
            nutrition: NutritionOptions::default(),
        }
    }
}
