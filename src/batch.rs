//! フォルダ一括処理
//!
//! 入力ファイルを並列に解析し、ファイルごとのHTML/JSONと
//! 一覧（summary.csv・viewer.html）を出力する。

use crate::cache::{compute_key, pipeline_fingerprint, CacheFile};
use crate::error::{ProductHtmlError, Result};
use crate::export::{self, summary, viewer, SummaryRow};
use crate::scanner::{self, InputFile};
use indicatif::{ProgressBar, ProgressStyle};
use product_html_common::{ParseResult, Pipeline};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// 一括処理の設定
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub output_dir: PathBuf,
    pub recursive: bool,
    pub use_cache: bool,
    pub show_progress: bool,
}

/// 1入力の処理結果
#[derive(Debug)]
pub struct BatchItem {
    pub input: InputFile,
    /// 出力ファイル名の元（入力間で重複しない）
    pub output_stem: String,
    pub outcome: std::result::Result<ParseResult, String>,
    pub from_cache: bool,
}

/// 一括処理の集計
#[derive(Debug, Default)]
pub struct BatchReport {
    pub processed: usize,
    pub failed: usize,
    pub cached: usize,
    pub warnings: usize,
    pub summary_path: PathBuf,
    pub viewer_path: PathBuf,
}

pub fn run_batch(folder: &Path, pipeline: &Pipeline, options: &BatchOptions) -> Result<BatchReport> {
    // 出力先が入力フォルダ内にある場合、前回の summary.csv を入力に含めない
    let inputs: Vec<InputFile> = scanner::scan_folder(folder, options.recursive)?
        .into_iter()
        .filter(|input| !input.path.starts_with(&options.output_dir))
        .collect();
    if inputs.is_empty() {
        return Err(ProductHtmlError::NoInputsFound(folder.display().to_string()));
    }

    let mut cache = if options.use_cache {
        CacheFile::load(folder)
    } else {
        CacheFile::default()
    };
    let fingerprint = pipeline_fingerprint(pipeline)?;

    let progress = if options.show_progress {
        let pb = ProgressBar::new(inputs.len() as u64);
        if let Ok(style) = ProgressStyle::with_template("{spinner} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}") {
            pb.set_style(style.progress_chars("=>-"));
        }
        pb
    } else {
        ProgressBar::hidden()
    };

    let stems = output_stems(&inputs, folder);
    let items: Vec<(BatchItem, Option<String>)> = inputs
        .into_par_iter()
        .zip(stems)
        .map(|(input, stem)| {
            let item = process_one(input, stem, pipeline, &cache, &fingerprint, options.use_cache);
            progress.inc(1);
            item
        })
        .collect();
    progress.finish_and_clear();

    std::fs::create_dir_all(&options.output_dir)?;
    let mut report = BatchReport::default();
    let mut rows = Vec::with_capacity(items.len());

    for (item, key) in items {
        let source = item
            .input
            .path
            .strip_prefix(folder)
            .unwrap_or(&item.input.path)
            .display()
            .to_string();
        match &item.outcome {
            Ok(result) => {
                export::write_result(result, &options.output_dir, &item.output_stem)?;
                report.processed += 1;
                report.warnings += result.warning_count();
                if item.from_cache {
                    report.cached += 1;
                } else if let Some(key) = key {
                    cache.insert(key, item.input.file_name.clone(), result.clone());
                }
                rows.push(SummaryRow::from_result(&source, result));
            }
            Err(message) => {
                tracing::warn!(file = %item.input.file_name, "処理失敗: {}", message);
                report.failed += 1;
                rows.push(SummaryRow::failed(&source, message.clone()));
            }
        }
    }

    if options.use_cache {
        cache.save(folder)?;
    }

    report.summary_path = options.output_dir.join("summary.csv");
    summary::write_summary_csv(&rows, &report.summary_path)?;
    report.viewer_path = options.output_dir.join("viewer.html");
    viewer::write_viewer(&rows, &report.viewer_path)?;

    Ok(report)
}

/// 1ファイルを処理（入力エラーは結果として返す）
fn process_one(
    input: InputFile,
    output_stem: String,
    pipeline: &Pipeline,
    cache: &CacheFile,
    fingerprint: &str,
    use_cache: bool,
) -> (BatchItem, Option<String>) {
    let text = match scanner::read_input(&input.path) {
        Ok(text) => text,
        Err(e) => {
            return (
                BatchItem {
                    input,
                    output_stem,
                    outcome: Err(e.to_string()),
                    from_cache: false,
                },
                None,
            )
        }
    };

    let key = use_cache.then(|| compute_key(input.input_type, &text, fingerprint));
    if let Some(hit) = key.as_deref().and_then(|k| cache.get(k)) {
        tracing::info!(file = %input.file_name, "キャッシュを使用");
        return (
            BatchItem {
                input,
                output_stem,
                outcome: Ok(hit.clone()),
                from_cache: true,
            },
            key,
        );
    }

    let outcome = pipeline
        .process(&text, input.input_type)
        .map_err(|e| e.user_message());
    (
        BatchItem {
            input,
            output_stem,
            outcome,
            from_cache: false,
        },
        key,
    )
}

/// 入力ごとの出力ファイル名の元
///
/// 通常は拡張子を除いたファイル名。同名が複数あれば拡張子を付け（item_txt）、
/// それでも重なればフォルダからの相対パスを `_` でつなぐ（a_item_txt）。
pub fn output_stems(inputs: &[InputFile], folder: &Path) -> Vec<String> {
    let with_extension = |input: &InputFile| match input.path.extension() {
        Some(ext) => format!("{}_{}", input.stem(), ext.to_string_lossy().to_lowercase()),
        None => input.stem(),
    };
    let with_relative_path = |input: &InputFile| {
        let relative = input.path.strip_prefix(folder).unwrap_or(&input.path);
        let mut parts: Vec<String> = relative
            .parent()
            .map(|p| p.iter().map(|c| c.to_string_lossy().to_string()).collect())
            .unwrap_or_default();
        parts.push(with_extension(input));
        parts.join("_")
    };

    let mut stems: Vec<String> = inputs.iter().map(InputFile::stem).collect();
    let renames: [&dyn Fn(&InputFile) -> String; 2] = [&with_extension, &with_relative_path];
    for rename in renames {
        let counts = count(&stems);
        for (stem, input) in stems.iter_mut().zip(inputs) {
            if counts[stem.as_str()] > 1 {
                *stem = rename(input);
            }
        }
    }

    // 別の入力の名前と偶然一致した場合は連番を付ける
    let mut taken = HashSet::new();
    for stem in stems.iter_mut() {
        if !taken.insert(stem.clone()) {
            let mut n = 2;
            while !taken.insert(format!("{}_{}", stem, n)) {
                n += 1;
            }
            *stem = format!("{}_{}", stem, n);
        }
    }
    stems
}

fn count(stems: &[String]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for stem in stems {
        *counts.entry(stem.clone()).or_insert(0) += 1;
    }
    counts
}
