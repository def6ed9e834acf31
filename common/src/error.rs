//! エラー型定義
//!
//! 致命的なエラーのみをここで表す。項目の欠落や重複などの
//! 回復可能な状態は `LogEntry` として診断ログに積む。

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    /// 空入力・長すぎる入力
    #[error("入力エラー: {0}")]
    Validation(String),

    /// 区切り文字を判定できない・データ行がないCSV
    #[error("CSV形式エラー: {0}")]
    CsvFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// エラー分類名（レスポンス・ログ用）
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "ValidationError",
            Error::CsvFormat(_) => "CsvFormatError",
            Error::Io(_) => "IoError",
            Error::Json(_) => "JsonError",
            Error::Config(_) => "ConfigError",
        }
    }

    /// 利用者向けメッセージ（分類の接頭辞なし）
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation(msg) | Error::CsvFormat(msg) | Error::Config(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_validation() {
        let error = Error::Validation("入力テキストが空です".to_string());
        assert_eq!(format!("{}", error), "入力エラー: 入力テキストが空です");
        assert_eq!(error.kind(), "ValidationError");
        assert_eq!(error.user_message(), "入力テキストが空です");
    }

    #[test]
    fn test_error_display_csv() {
        let error = Error::CsvFormat("データ行がありません".to_string());
        assert!(format!("{}", error).contains("CSV形式エラー"));
        assert_eq!(error.kind(), "CsvFormatError");
    }

    #[test]
    fn test_error_from_io() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let error: Error = io_error.into();
        assert!(matches!(error, Error::Io(_)));
        assert!(error.user_message().contains("access denied"));
    }

    #[test]
    fn test_error_from_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: Error = json_error.into();
        assert!(matches!(error, Error::Json(_)));
        assert_eq!(error.kind(), "JsonError");
    }

    #[test]
    fn test_error_debug() {
        let error = Error::Config("テスト".to_string());
        let debug = format!("{:?}", error);
        assert!(debug.contains("Config"));
        assert!(debug.contains("テスト"));
    }
}
