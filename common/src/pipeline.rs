//! 解析パイプライン
//!
//! Validate → Normalize/Ingest → Extract → Nutrition → Unknown → Generate → Assemble
//!
//! 致命的な誤り（空入力・長すぎる入力・読めないCSV）だけが `Err` になり、
//! それ以外はすべて診断ログとして結果に残る。

use crate::alias::AliasDictionary;
use crate::csv_ingest::CsvIngester;
use crate::diagnostics::{Diagnostics, Stage};
use crate::error::{Error, Result};
use crate::extractor::FieldExtractor;
use crate::html::HtmlGenerator;
use crate::normalizer::{NormalizedText, TextNormalizer};
use crate::nutrition::NutritionParser;
use crate::options::{PipelineOptions, MAX_LOG_ENTRIES};
use crate::sanitize::{sanitize_product, strip_disallowed};
use crate::types::{InputType, LogLevel, ParseResult};
use crate::unknown::UnknownFieldCollector;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// 解析パイプライン
///
/// 辞書と設定は読み取り専用で共有する。複数スレッドから同時に使ってよい。
pub struct Pipeline<'a> {
    dict: &'a AliasDictionary,
    options: PipelineOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(dict: &'a AliasDictionary, options: PipelineOptions) -> Self {
        Self { dict, options }
    }

    /// 組み込み辞書・既定設定
    pub fn builtin() -> Pipeline<'static> {
        Pipeline::new(AliasDictionary::builtin(), PipelineOptions::default())
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn dictionary(&self) -> &AliasDictionary {
        self.dict
    }

    /// 1入力を処理する
    pub fn process(&self, text: &str, input_type: InputType) -> Result<ParseResult> {
        let mut diag = Diagnostics::new();

        diag.enter(Stage::Validate);
        self.validate(text)?;
        diag.info(format!("入力文字数: {}", text.chars().count()));

        let normalized = match input_type {
            InputType::Text => {
                diag.enter(Stage::Normalize);
                self.normalize(text, &mut diag)
            }
            InputType::Csv => {
                diag.enter(Stage::Ingest);
                let normalized = CsvIngester::new(self.dict, &self.options.csv).ingest(text, &mut diag)?;
                diag.user("CSVを解析してテキストに変換しました。");
                normalized
            }
        };

        diag.enter(Stage::Extract);
        let extraction = FieldExtractor::new(self.dict).extract(&normalized.lines, &mut diag);
        let mut product = extraction.product;
        let mut consumed = extraction.consumed;

        diag.enter(Stage::Nutrition);
        NutritionParser::new(self.dict, &self.options.nutrition).parse(
            &normalized.lines,
            &mut consumed,
            &mut product,
            &mut diag,
        );

        diag.enter(Stage::Unknown);
        UnknownFieldCollector::new(self.dict).collect(&normalized.lines, &mut consumed, &mut product, &mut diag);

        diag.enter(Stage::Generate);
        let product = sanitize_product(&product, &mut diag);
        if product.is_empty() {
            diag.error("商品情報を1件も抽出できませんでした。入力内容を確認してください");
            diag.user("商品情報を抽出できませんでした。");
        }
        let html = HtmlGenerator::new(self.dict).generate_all(&product);

        diag.enter(Stage::Assemble);
        let populated = product.populated().count();
        diag.user(format!(
            "{}項目・栄養成分{}件・追加項目{}件を抽出しました。",
            populated,
            product.nutrition.len(),
            product.extra_fields.len()
        ));
        let warnings = diag.count(LogLevel::Warning);
        if warnings > 0 {
            diag.user(format!("{}件の警告があります。ログを確認してください。", warnings));
        }
        diag.user("解析とHTML生成が完了しました。");

        // ログと正規化テキストにも入力の断片が含まれるため同じ除去をかける
        let (mut logs, mut user_logs) = diag.into_parts();
        for log in &mut logs {
            log.message = strip_disallowed(&log.message).0;
        }
        for line in &mut user_logs {
            *line = strip_disallowed(line).0;
        }
        let normalized_text = strip_disallowed(&normalized.text).0;

        Ok(ParseResult {
            product_info: product,
            html,
            logs,
            user_logs,
            normalized_text,
            input_type,
        })
    }

    fn validate(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(Error::Validation("入力テキストが空です".into()));
        }
        let length = text.chars().count();
        if length > self.options.max_input_length {
            return Err(Error::Validation(format!(
                "入力が長すぎます（最大{}文字、入力{}文字）",
                self.options.max_input_length, length
            )));
        }
        Ok(())
    }

    fn normalize(&self, text: &str, diag: &mut Diagnostics) -> NormalizedText {
        let normalized = TextNormalizer::new(self.dict).normalize(text);
        for ambiguity in &normalized.ambiguities {
            diag.warn(format!("{}行目: {}", ambiguity.line + 1, ambiguity.message));
        }
        diag.info(format!("正規化後の行数: {}", normalized.content_lines()));
        normalized
    }
}

/// 要求JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub text: String,
    #[serde(rename = "type", default)]
    pub input_type: InputType,
}

/// 成功応答を組み立てる（ログは上限件数まで）
pub fn success_response(result: &ParseResult) -> Value {
    let logs: Vec<_> = result.logs.iter().take(MAX_LOG_ENTRIES).collect();
    let user_logs: Vec<_> = result.user_logs.iter().take(MAX_LOG_ENTRIES).collect();
    json!({
        "success": true,
        "html": result.html,
        "product_info": result.product_info,
        "logs": logs,
        "user_logs": user_logs,
        "normalized_text": result.normalized_text,
        "input_type": result.input_type,
    })
}

/// 失敗応答
pub fn failure_response(error: &Error) -> Value {
    json!({
        "success": false,
        "error": error.user_message(),
        "error_type": error.kind(),
    })
}

/// 要求を処理して応答を返す
pub fn handle_request(request: &Request, pipeline: &Pipeline) -> Value {
    match pipeline.process(&request.text, request.input_type) {
        Ok(result) => success_response(&result),
        Err(e) => {
            tracing::warn!(kind = e.kind(), "リクエスト失敗: {}", e);
            failure_response(&e)
        }
    }
}

/// JSON文字列の要求を処理する
pub fn handle_request_json(body: &str, pipeline: &Pipeline) -> Value {
    match serde_json::from_str::<Request>(body) {
        Ok(request) => handle_request(&request, pipeline),
        Err(e) => {
            tracing::warn!("要求JSONの解析に失敗: {}", e);
            json!({
                "success": false,
                "error": "JSONの解析に失敗しました",
                "error_type": "ValidationError",
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_text() {
        let pipeline = Pipeline::builtin();
        let result = pipeline
            .process("■商品名：チョコ\n■販売者：天然生活", InputType::Text)
            .unwrap();
        assert_eq!(result.product_info.product_name.as_deref(), Some("チョコ"));
        assert_eq!(result.input_type, InputType::Text);
        assert_eq!(result.normalized_text, "商品名:チョコ\n販売者:天然生活");
        assert!(result.user_logs.last().unwrap().contains("完了"));
    }

    #[test]
    fn test_validation_errors() {
        let pipeline = Pipeline::builtin();
        assert!(matches!(pipeline.process("  \n ", InputType::Text), Err(Error::Validation(_))));

        let options = PipelineOptions {
            max_input_length: 5,
            ..PipelineOptions::default()
        };
        let small = Pipeline::new(AliasDictionary::builtin(), options);
        assert!(matches!(small.process("商品名:チョコレート", InputType::Text), Err(Error::Validation(_))));
        assert!(small.process("チョコ", InputType::Text).is_ok());
    }

    #[test]
    fn test_stage_order_in_logs() {
        let pipeline = Pipeline::builtin();
        let result = pipeline
            .process("商品名：チョコ\n産地：岡山\n【栄養成分表示】\nエネルギー：595kcal", InputType::Text)
            .unwrap();
        let position = |needle: &str| {
            result
                .logs
                .iter()
                .position(|l| l.message.contains(needle))
                .unwrap()
        };
        assert!(position("商品名を抽出") < position("栄養成分 エネルギー"));
        assert!(position("栄養成分 エネルギー") < position("未知の項目"));
    }

    #[test]
    fn test_handle_request_json() {
        let pipeline = Pipeline::builtin();
        let response = handle_request_json(r#"{"text": "商品名：チョコ", "type": "text"}"#, &pipeline);
        assert_eq!(response["success"], true);
        assert_eq!(response["product_info"]["product_name"], "チョコ");
        assert_eq!(response["input_type"], "text");
        assert!(response["html"]["rakuten_pc"].as_str().unwrap().contains("チョコ"));
    }

    #[test]
    fn test_handle_request_json_defaults_to_text() {
        let pipeline = Pipeline::builtin();
        let response = handle_request_json(r#"{"text": "商品名：チョコ"}"#, &pipeline);
        assert_eq!(response["input_type"], "text");
    }

    #[test]
    fn test_malformed_json() {
        let pipeline = Pipeline::builtin();
        let response = handle_request_json("{not json", &pipeline);
        assert_eq!(response["success"], false);
        assert_eq!(response["error"], "JSONの解析に失敗しました");
    }

    #[test]
    fn test_failure_response_has_no_html() {
        let pipeline = Pipeline::builtin();
        let response = handle_request_json(r#"{"text": ""}"#, &pipeline);
        assert_eq!(response["success"], false);
        assert_eq!(response["error_type"], "ValidationError");
        assert!(response.get("html").is_none());
        assert!(response.get("product_info").is_none());
    }

    #[test]
    fn test_nothing_extracted_is_logged_as_error() {
        let pipeline = Pipeline::builtin();
        let result = pipeline.process("<script>alert(1)</script>", InputType::Text).unwrap();
        assert!(result.product_info.is_empty());
        assert_eq!(result.logs.iter().filter(|l| l.level == LogLevel::Error).count(), 1);

        let result = pipeline.process("商品名：チョコ", InputType::Text).unwrap();
        assert!(result.logs.iter().all(|l| l.level != LogLevel::Error));
    }

    #[test]
    fn test_logs_capped() {
        let text: String = (0..150).map(|i| format!("項目{}：値{}\n", i, i)).collect();
        let pipeline = Pipeline::builtin();
        let result = pipeline.process(&text, InputType::Text).unwrap();
        assert!(result.logs.len() > MAX_LOG_ENTRIES);
        let response = success_response(&result);
        assert_eq!(response["logs"].as_array().unwrap().len(), MAX_LOG_ENTRIES);
    }
}
