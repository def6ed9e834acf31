//! 解析結果キャッシュモジュール
//!
//! 入力種別と本文（および辞書・設定）のSHA-256をキーにして解析結果をキャッシュし、
//! 同じ入力の再解析をスキップする。

use crate::error::Result;
use product_html_common::{InputType, ParseResult, Pipeline};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

const CACHE_FILE_NAME: &str = ".product-html-cache.json";

/// キャッシュファイルの構造
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheFile {
    /// バージョン（互換性チェック用）
    version: u32,
    /// 入力ハッシュ → 解析結果のマップ
    entries: HashMap<String, CacheEntry>,
}

/// キャッシュエントリ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// 入力ファイル名
    pub file_name: String,
    /// 登録日時（RFC 3339）
    pub created_at: String,
    /// 解析結果
    pub result: ParseResult,
}

impl CacheFile {
    const CURRENT_VERSION: u32 = 1;

    pub fn cache_path(folder: &Path) -> PathBuf {
        folder.join(CACHE_FILE_NAME)
    }

    /// キャッシュファイルを読み込み
    pub fn load(folder: &Path) -> Self {
        let cache_path = Self::cache_path(folder);
        if !cache_path.exists() {
            return Self::default();
        }

        let file = match File::open(&cache_path) {
            Ok(f) => f,
            Err(_) => return Self::default(),
        };

        let reader = BufReader::new(file);
        match serde_json::from_reader::<_, CacheFile>(reader) {
            Ok(cache) => {
                // バージョンチェック
                if cache.version != Self::CURRENT_VERSION {
                    tracing::warn!("キャッシュバージョン不一致、再生成します");
                    return Self::default();
                }
                cache
            }
            Err(e) => {
                tracing::warn!("キャッシュを読み込めません（{}）、再生成します", e);
                Self::default()
            }
        }
    }

    /// キャッシュファイルを保存
    pub fn save(&self, folder: &Path) -> Result<()> {
        let file = File::create(Self::cache_path(folder))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// キャッシュファイルを削除（存在しなければ false）
    pub fn clear(folder: &Path) -> Result<bool> {
        let cache_path = Self::cache_path(folder);
        if !cache_path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(cache_path)?;
        Ok(true)
    }

    /// キャッシュをルックアップ
    pub fn get(&self, key: &str) -> Option<&ParseResult> {
        self.entries.get(key).map(|e| &e.result)
    }

    /// キャッシュに追加
    pub fn insert(&mut self, key: String, file_name: String, result: ParseResult) {
        self.entries.insert(
            key,
            CacheEntry {
                file_name,
                created_at: chrono::Local::now().to_rfc3339(),
                result,
            },
        );
    }

    /// キャッシュ件数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CacheFile {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            entries: HashMap::new(),
        }
    }
}

/// 辞書と設定の指紋（変わればキャッシュは別物になる）
pub fn pipeline_fingerprint(pipeline: &Pipeline) -> Result<String> {
    let config = serde_json::to_string(&(pipeline.dictionary(), pipeline.options()))?;
    Ok(hex::encode(Sha256::digest(config.as_bytes())))
}

/// 入力のキャッシュキー
pub fn compute_key(input_type: InputType, text: &str, fingerprint: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input_type.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(fingerprint.as_bytes());
    hasher.update([0u8]);
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}
