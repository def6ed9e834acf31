use crate::error::{ProductHtmlError, Result};
use product_html_common::{AliasDictionary, PipelineOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// パイプライン設定（最大文字数・CSV・栄養成分）
    pub pipeline: PipelineOptions,
    /// 追加エイリアスのJSONファイル
    pub alias_file: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ProductHtmlError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("product-html").join("config.json"))
    }

    /// 辞書を構築（引数 → 設定ファイル → 組み込みの順に優先）
    pub fn dictionary(&self, alias_override: Option<&Path>) -> Result<AliasDictionary> {
        let alias_file = alias_override.or(self.alias_file.as_deref());
        match alias_file {
            Some(path) => {
                if !path.exists() {
                    return Err(ProductHtmlError::FileNotFound(path.display().to_string()));
                }
                Ok(AliasDictionary::from_file(path)?)
            }
            None => Ok(AliasDictionary::builtin().clone()),
        }
    }

    pub fn set_max_length(&mut self, max: usize) -> Result<()> {
        if max == 0 {
            return Err(ProductHtmlError::Config("最大文字数は1以上を指定してください".into()));
        }
        self.pipeline.max_input_length = max;
        Ok(())
    }

    pub fn set_alias_file(&mut self, path: PathBuf) -> Result<()> {
        if !path.exists() {
            return Err(ProductHtmlError::FileNotFound(path.display().to_string()));
        }
        // 読めるかどうかだけ確認
        AliasDictionary::from_file(&path)?;
        self.alias_file = Some(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_returns_default() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.pipeline.max_input_length, 100_000);
        assert!(config.alias_file.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = Config::default();
        config.set_max_length(500).unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.pipeline.max_input_length, 500);
    }

    #[test]
    fn test_set_alias_file() {
        let dir = tempdir().unwrap();
        let alias = dir.path().join("alias.json");
        std::fs::write(&alias, r#"{"fields": {"seller": ["取扱者"]}}"#).unwrap();

        let mut config = Config::default();
        config.set_alias_file(alias.clone()).unwrap();
        let dict = config.dictionary(None).unwrap();
        assert!(dict.exact_field("取扱者").is_some());

        assert!(config.set_alias_file(dir.path().join("none.json")).is_err());
    }

    #[test]
    fn test_set_max_length_zero() {
        let mut config = Config::default();
        assert!(matches!(config.set_max_length(0), Err(ProductHtmlError::Config(_))));
    }
}
