use crate::error::{ProductHtmlError, Result};
use product_html_common::InputType;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct InputFile {
    pub path: PathBuf,
    pub file_name: String,
    pub input_type: InputType,
}

impl InputFile {
    /// 出力ファイル名の元（拡張子なし）
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.file_name.clone())
    }
}

const TEXT_EXTENSIONS: &[&str] = &["txt", "text"];
const CSV_EXTENSIONS: &[&str] = &["csv", "tsv"];

/// 拡張子から入力種別を判定
pub fn input_type_for_path(path: &Path) -> Option<InputType> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    if TEXT_EXTENSIONS.contains(&ext.as_str()) {
        Some(InputType::Text)
    } else if CSV_EXTENSIONS.contains(&ext.as_str()) {
        Some(InputType::Csv)
    } else {
        None
    }
}

/// 入力ファイルを読み込む（先頭のBOMは除く）
pub fn read_input(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(ProductHtmlError::FileNotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(content.trim_start_matches('\u{FEFF}').to_string())
}

pub fn scan_folder(folder: &Path, recursive: bool) -> Result<Vec<InputFile>> {
    if !folder.is_dir() {
        return Err(ProductHtmlError::FolderNotFound(folder.display().to_string()));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut inputs = Vec::new();

    for entry in WalkDir::new(folder)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        // 隠しファイル（キャッシュなど）は対象外
        if file_name.starts_with('.') {
            continue;
        }

        if let Some(input_type) = input_type_for_path(path) {
            inputs.push(InputFile {
                path: path.to_path_buf(),
                file_name,
                input_type,
            });
        }
    }

    // パスでソート
    inputs.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(inputs)
}
