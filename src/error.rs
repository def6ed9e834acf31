use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProductHtmlError {
    /// 解析パイプラインのエラー（入力・CSV形式など）
    #[error(transparent)]
    Pipeline(#[from] product_html_common::Error),

    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("入力ファイル（.txt/.csv/.tsv）が見つかりません: {0}")]
    NoInputsFound(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("CSV出力エラー: {0}")]
    Csv(#[from] csv::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

impl ProductHtmlError {
    /// 入力内容による失敗か（処理を続けてよい）
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ProductHtmlError::Pipeline(
                product_html_common::Error::Validation(_) | product_html_common::Error::CsvFormat(_)
            )
        )
    }
}

pub type Result<T> = std::result::Result<T, ProductHtmlError>;
