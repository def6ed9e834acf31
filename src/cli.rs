use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "product-html")]
#[command(about = "商品説明テキスト解析・モール別HTML生成ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 追加エイリアスファイル（JSON、設定より優先）
    #[arg(long, global = true)]
    pub alias: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 1ファイルを解析してHTMLを生成
    Generate {
        /// 入力ファイル（.txt / .csv / .tsv）
        #[arg(required = true)]
        input: PathBuf,

        /// 入力種別（auto は拡張子で判定）
        #[arg(short = 't', long = "type", default_value = "auto")]
        input_type: InputKind,

        /// 出力ディレクトリ（デフォルト: 入力ファイルと同じ場所）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// ファイルを書かず、応答JSONを標準出力に出す
        #[arg(long)]
        json: bool,
    },

    /// JSONリクエスト（{"text": ..., "type": "text|csv"}）を処理して応答JSONを出力
    Request {
        /// リクエストファイル（省略時は標準入力）
        file: Option<PathBuf>,
    },

    /// フォルダ内の入力を一括処理
    Batch {
        /// 入力フォルダのパス
        #[arg(required = true)]
        folder: PathBuf,

        /// 出力ディレクトリ（デフォルト: 入力フォルダ/html）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// サブフォルダも再帰的にスキャン
        #[arg(short = 'r', long)]
        recursive: bool,

        /// キャッシュを使用（再解析をスキップ）
        #[arg(long)]
        use_cache: bool,
    },

    /// 有効なラベル辞書を表示
    Aliases,

    /// 設定を表示・変更
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,

        /// 最大入力文字数を設定
        #[arg(long)]
        set_max_length: Option<usize>,

        /// 追加エイリアスファイルを設定
        #[arg(long)]
        set_alias_file: Option<PathBuf>,
    },

    /// キャッシュを管理
    Cache {
        /// 対象フォルダ（デフォルト: カレント）
        folder: Option<PathBuf>,

        /// キャッシュ情報を表示
        #[arg(long)]
        info: bool,

        /// キャッシュを削除
        #[arg(long)]
        clear: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum InputKind {
    Auto,
    Text,
    Csv,
}

impl std::fmt::Display for InputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputKind::Auto => write!(f, "auto"),
            InputKind::Text => write!(f, "text"),
            InputKind::Csv => write!(f, "csv"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generate() {
        let cli = Cli::try_parse_from(["product-html", "generate", "item.txt", "-t", "csv", "--json"]).unwrap();
        match cli.command {
            Commands::Generate { input, input_type, json, .. } => {
                assert_eq!(input, PathBuf::from("item.txt"));
                assert_eq!(input_type, InputKind::Csv);
                assert!(json);
            }
            _ => panic!("generate として解析されていない"),
        }
    }

    #[test]
    fn test_parse_batch_with_global_flags() {
        let cli = Cli::try_parse_from(["product-html", "batch", "items", "-r", "--use-cache", "-v"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Batch { recursive, use_cache, output, .. } => {
                assert!(recursive);
                assert!(use_cache);
                assert!(output.is_none());
            }
            _ => panic!("batch として解析されていない"),
        }
    }

    #[test]
    fn test_default_input_kind() {
        let cli = Cli::try_parse_from(["product-html", "generate", "a.txt"]).unwrap();
        match cli.command {
            Commands::Generate { input_type, .. } => assert_eq!(input_type, InputKind::Auto),
            _ => panic!("generate として解析されていない"),
        }
    }
}
