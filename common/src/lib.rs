//! Product HTML Common Library
//!
//! 商品説明テキスト（またはCSV）から商品情報を抽出し、モール別HTMLを生成する。
//! CLIとリクエストハンドラで共有される。I/Oは行わない。

pub mod alias;
pub mod csv_ingest;
pub mod diagnostics;
pub mod error;
pub mod extractor;
pub mod html;
pub mod normalizer;
pub mod nutrition;
pub mod options;
pub mod pipeline;
pub mod sanitize;
pub mod types;
pub mod unknown;

pub use alias::{AliasDictionary, AliasOverrides};
pub use error::{Error, Result};
pub use options::{PipelineOptions, MAX_LOG_ENTRIES};
pub use pipeline::{handle_request, handle_request_json, Pipeline, Request};
pub use types::{CanonicalField, FieldMap, HtmlBundle, InputType, LogEntry, LogLevel, ParseResult, ProductInfo};
