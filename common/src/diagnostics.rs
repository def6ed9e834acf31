//! 診断ログ
//!
//! 各段階の判断を順番どおりに記録する。記録した内容は `tracing` にも流す。

use crate::types::{LogEntry, LogLevel};
use std::fmt;

/// パイプラインの段階
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validate,
    Normalize,
    Ingest,
    Extract,
    Nutrition,
    Unknown,
    Generate,
    Assemble,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validate => "validate",
            Stage::Normalize => "normalize",
            Stage::Ingest => "ingest",
            Stage::Extract => "extract",
            Stage::Nutrition => "nutrition",
            Stage::Unknown => "unknown",
            Stage::Generate => "generate",
            Stage::Assemble => "assemble",
        };
        f.write_str(name)
    }
}

/// 診断ログの蓄積
#[derive(Debug)]
pub struct Diagnostics {
    logs: Vec<LogEntry>,
    user_logs: Vec<String>,
    stage: Stage,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics {
    pub fn new() -> Self {
        Self {
            logs: Vec::new(),
            user_logs: Vec::new(),
            stage: Stage::Validate,
        }
    }

    pub fn enter(&mut self, stage: Stage) {
        self.stage = stage;
        tracing::debug!(stage = %stage, "段階開始");
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Info, message.into(), None);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Warning, message.into(), None);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Error, message.into(), None);
    }

    /// 項目を指定して記録
    pub fn info_for(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.push(LogLevel::Info, message.into(), Some(field.into()));
    }

    pub fn warn_for(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.push(LogLevel::Warning, message.into(), Some(field.into()));
    }

    /// 利用者向けの要約
    pub fn user(&mut self, message: impl Into<String>) {
        self.user_logs.push(message.into());
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    pub fn count(&self, level: LogLevel) -> usize {
        self.logs.iter().filter(|l| l.level == level).count()
    }

    pub fn into_parts(self) -> (Vec<LogEntry>, Vec<String>) {
        (self.logs, self.user_logs)
    }

    fn push(&mut self, level: LogLevel, message: String, field: Option<String>) {
        let stage = self.stage;
        let field_name = field.as_deref().unwrap_or("-");
        match level {
            LogLevel::Info => tracing::info!(stage = %stage, field = field_name, "{}", message),
            LogLevel::Warning => tracing::warn!(stage = %stage, field = field_name, "{}", message),
            LogLevel::Error => tracing::error!(stage = %stage, field = field_name, "{}", message),
        }
        self.logs.push(LogEntry {
            level,
            message,
            field,
        });
    }
}

/// 先頭n文字に切り詰めたプレビュー
pub fn preview(value: &str, max_chars: usize) -> String {
    let single_line = value.replace('\n', " ");
    if single_line.chars().count() <= max_chars {
        single_line
    } else {
        let head: String = single_line.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logs_keep_order() {
        let mut diag = Diagnostics::new();
        diag.info("一件目");
        diag.warn_for("seller", "二件目");
        diag.error("三件目");

        let messages: Vec<&str> = diag.logs().iter().map(|l| l.message.as_str()).collect();
        assert_eq!(messages, vec!["一件目", "二件目", "三件目"]);
        assert_eq!(diag.logs()[1].field.as_deref(), Some("seller"));
        assert_eq!(diag.count(LogLevel::Warning), 1);
    }

    #[test]
    fn test_stage_tracking() {
        let mut diag = Diagnostics::new();
        assert_eq!(diag.stage(), Stage::Validate);
        diag.enter(Stage::Extract);
        assert_eq!(diag.stage(), Stage::Extract);
        assert_eq!(Stage::Nutrition.to_string(), "nutrition");
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("短い", 30), "短い");
        assert_eq!(preview("あいうえおかきくけこ", 5), "あいうえお...");
        assert_eq!(preview("一行目\n二行目", 30), "一行目 二行目");
    }
}
