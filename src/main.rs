use anyhow::Context;
use clap::Parser;
use product_html_common::pipeline::{failure_response, success_response};
use product_html_common::{handle_request_json, LogLevel, Pipeline};
use product_html_rust::{batch, cache, cli, config, export, logging, resolve_input_type, scanner};
use cli::{Cli, Commands};
use config::Config;
use std::io::Read;
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let config = Config::load().context("設定ファイルの読み込みに失敗しました")?;

    match cli.command {
        Commands::Generate { input, input_type, output, json } => {
            let dict = config.dictionary(cli.alias.as_deref())?;
            let pipeline = Pipeline::new(&dict, config.pipeline.clone());

            let text = scanner::read_input(&input)?;
            let input_type = resolve_input_type(input_type, &input, &text);

            if json {
                let response = match pipeline.process(&text, input_type) {
                    Ok(result) => success_response(&result),
                    Err(e) => failure_response(&e),
                };
                println!("{}", serde_json::to_string_pretty(&response)?);
                return Ok(());
            }

            println!("🏷  product-html - HTML生成\n");
            println!("[1/2] 解析中... ({}: {})", input_type, input.display());
            let result = pipeline
                .process(&text, input_type)
                .with_context(|| format!("{} の解析に失敗しました", input.display()))?;
            println!("✔ 解析完了（警告 {}件）\n", result.warning_count());
            for line in &result.user_logs {
                println!("  {}", line);
            }
            if cli.verbose {
                for log in &result.logs {
                    let mark = match log.level {
                        LogLevel::Info => "-",
                        LogLevel::Warning => "⚠",
                        LogLevel::Error => "✖",
                    };
                    println!("  {} {}", mark, log.message);
                }
            }

            println!("\n[2/2] 結果を保存中...");
            let output_dir = output.unwrap_or_else(|| {
                input
                    .parent()
                    .map(|p| p.to_path_buf())
                    .unwrap_or_else(|| PathBuf::from("."))
            });
            let stem = input
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "product".into());
            for path in export::write_result(&result, &output_dir, &stem)? {
                println!("✔ 出力: {}", path.display());
            }

            println!("\n✅ 生成完了");
        }

        Commands::Request { file } => {
            let dict = config.dictionary(cli.alias.as_deref())?;
            let pipeline = Pipeline::new(&dict, config.pipeline.clone());

            let body = match file {
                Some(path) => scanner::read_input(&path)?,
                None => {
                    let mut body = String::new();
                    std::io::stdin()
                        .read_to_string(&mut body)
                        .context("標準入力の読み込みに失敗しました")?;
                    body
                }
            };
            let response = handle_request_json(&body, &pipeline);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }

        Commands::Batch { folder, output, recursive, use_cache } => {
            println!("🚀 product-html - 一括処理\n");
            let dict = config.dictionary(cli.alias.as_deref())?;
            let pipeline = Pipeline::new(&dict, config.pipeline.clone());

            let options = batch::BatchOptions {
                output_dir: output.unwrap_or_else(|| folder.join("html")),
                recursive,
                use_cache,
                show_progress: true,
            };
            println!("[1/2] 解析中...{}", if use_cache { " (キャッシュ有効)" } else { "" });
            let report = batch::run_batch(&folder, &pipeline, &options)?;
            println!(
                "✔ {}件を処理（失敗 {}件、キャッシュ {}件、警告 {}件）\n",
                report.processed, report.failed, report.cached, report.warnings
            );

            println!("[2/2] 一覧を出力");
            println!("✔ 一覧CSV: {}", report.summary_path.display());
            println!("✔ ビューアー: {}", report.viewer_path.display());

            println!("\n✅ 完了");
        }

        Commands::Aliases => {
            let dict = config.dictionary(cli.alias.as_deref())?;
            println!("項目ラベル:");
            for entry in dict.fields() {
                println!("  {} ({}): {}", entry.field.display_label(), entry.field.key(), entry.aliases.join(", "));
            }
            println!("\n栄養成分ラベル:");
            for entry in dict.nutrition() {
                println!("  {} ({}): {}", entry.label, entry.key, entry.aliases.join(", "));
            }
            let important: Vec<&str> = dict.important_fields().iter().map(|f| f.display_label()).collect();
            println!("\n必須扱いの項目: {}", important.join(", "));
        }

        Commands::Config { show, set_max_length, set_alias_file } => {
            let mut config = config;
            let mut changed = false;

            if let Some(max) = set_max_length {
                config.set_max_length(max)?;
                changed = true;
                println!("✔ 最大入力文字数を設定しました: {}", max);
            }

            if let Some(path) = set_alias_file {
                config.set_alias_file(path.clone())?;
                changed = true;
                println!("✔ エイリアスファイルを設定しました: {}", path.display());
            }

            if changed {
                config.save()?;
            }

            if show || !changed {
                println!("設定:");
                println!("  最大入力文字数: {}", config.pipeline.max_input_length);
                println!("  CSV判定行数: {}", config.pipeline.csv.sniff_rows);
                println!("  ヘッダー判定閾値: {}", config.pipeline.csv.header_threshold);
                println!(
                    "  ナトリウム→食塩相当量換算: {}",
                    if config.pipeline.nutrition.derive_salt_from_sodium { "有効" } else { "無効" }
                );
                println!(
                    "  見出しなし栄養成分の取り込み: {}",
                    if config.pipeline.nutrition.collect_unmarked { "有効" } else { "無効" }
                );
                println!(
                    "  エイリアスファイル: {}",
                    config
                        .alias_file
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "未設定".into())
                );
            }
        }

        Commands::Cache { folder, info, clear } => {
            let target = folder.unwrap_or_else(|| PathBuf::from("."));
            let cache_path = cache::CacheFile::cache_path(&target);

            if info || !clear {
                // デフォルトまたは--info: 情報表示
                if cache_path.exists() {
                    let cache = cache::CacheFile::load(&target);
                    println!("キャッシュ情報:");
                    println!("  パス: {}", cache_path.display());
                    println!("  件数: {}", cache.len());
                    if let Ok(meta) = std::fs::metadata(&cache_path) {
                        println!("  サイズ: {} bytes", meta.len());
                    }
                } else {
                    println!("キャッシュファイルが存在しません: {}", cache_path.display());
                }
            }

            if clear {
                match cache::CacheFile::clear(&target) {
                    Ok(true) => println!("✔ キャッシュを削除しました: {}", cache_path.display()),
                    Ok(false) => println!("キャッシュファイルが存在しません"),
                    Err(e) => println!("キャッシュ削除エラー: {}", e),
                }
            }
        }
    }

    Ok(())
}
