//! CSV取り込み
//!
//! 区切り文字（カンマ・タブ・セミコロン）とヘッダーの有無を判定し、
//! テキスト入力と同じ論理行の形に変換する。
//!
//! 対応するレイアウト:
//! - 横型: 1行目がヘッダー、2行目がデータ（1商品）
//! - 縦型: 1列目がラベル、2列目が値
//! - ヘッダーなし: 1行目のセルを自由記述として位置推定に回す

use crate::alias::AliasDictionary;
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::normalizer::{normalize_fragment, LogicalLine, NormalizedText};
use crate::options::CsvOptions;
use lazy_static::lazy_static;
use regex::Regex;

/// 候補の区切り文字（同点ならこの順で優先）
const DELIMITERS: [u8; 3] = [b',', b'\t', b';'];

/// 栄養成分の前に差し込む見出し
const NUTRITION_SECTION: &str = "【栄養成分表示】";

lazy_static! {
    static ref HEADER_HINT_RE: Regex = Regex::new(r"(?i)項目|field|key|name").unwrap();
}

/// CSVの並び
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvLayout {
    Header,
    KeyValue,
    NoHeader,
}

pub struct CsvIngester<'a> {
    dict: &'a AliasDictionary,
    options: &'a CsvOptions,
}

impl<'a> CsvIngester<'a> {
    pub fn new(dict: &'a AliasDictionary, options: &'a CsvOptions) -> Self {
        Self { dict, options }
    }

    /// CSVを論理行に変換する
    pub fn ingest(&self, raw: &str, diag: &mut Diagnostics) -> Result<NormalizedText> {
        let raw = raw.trim_start_matches('\u{FEFF}');
        let sample: Vec<&str> = raw
            .lines()
            .filter(|l| !l.trim().is_empty())
            .take(self.options.sniff_rows.max(1))
            .collect();
        if sample.is_empty() {
            return Err(Error::CsvFormat("CSVにデータ行がありません".into()));
        }

        let delimiter = sniff_delimiter(&sample).ok_or_else(|| {
            Error::CsvFormat("区切り文字（カンマ・タブ・セミコロン）を判定できませんでした".into())
        })?;
        diag.info(format!("区切り文字: {}", delimiter_name(delimiter)));

        let rows = read_rows(raw, delimiter)?;
        if rows.is_empty() {
            return Err(Error::CsvFormat("CSVにデータ行がありません".into()));
        }

        let layout = self.detect_layout(&rows);
        let lines = match layout {
            CsvLayout::Header => self.from_header(&rows, diag)?,
            CsvLayout::KeyValue => self.from_key_value(&rows, diag),
            CsvLayout::NoHeader => {
                diag.warn("CSVのヘッダーを判定できませんでした。1行目を見出しなしの行として扱います");
                rows[0]
                    .iter()
                    .filter(|c| !c.is_empty())
                    .map(|c| LogicalLine::bare(c))
                    .collect()
            }
        };

        Ok(NormalizedText::from_lines(lines))
    }

    /// 辞書に載っているセルの割合
    fn known_fraction<'c>(&self, cells: impl Iterator<Item = &'c String>) -> f32 {
        let (known, total) = cells
            .filter(|c| !c.is_empty())
            .fold((0usize, 0usize), |(k, t), c| {
                (k + usize::from(self.dict.is_known_label(c)), t + 1)
            });
        if total == 0 {
            0.0
        } else {
            known as f32 / total as f32
        }
    }

    pub fn detect_layout(&self, rows: &[Vec<String>]) -> CsvLayout {
        let threshold = self.options.header_threshold;
        let header_score = self.known_fraction(rows[0].iter());

        let kv_rows = &rows[self.key_value_start(rows)..];
        let kv_score = if kv_rows.iter().any(|r| r.len() >= 2) {
            self.known_fraction(kv_rows.iter().filter_map(|r| r.first()))
        } else {
            0.0
        };

        if header_score >= threshold && header_score >= kv_score {
            CsvLayout::Header
        } else if kv_score >= threshold {
            CsvLayout::KeyValue
        } else {
            CsvLayout::NoHeader
        }
    }

    /// 縦型で読み飛ばす見出し行（項目名,値 など）
    fn key_value_start(&self, rows: &[Vec<String>]) -> usize {
        let first = rows[0].first().map(String::as_str).unwrap_or("");
        let hinted = HEADER_HINT_RE.is_match(&rows[0].join(" "));
        if rows.len() > 1 && hinted && !self.dict.is_known_label(first) {
            1
        } else {
            0
        }
    }

    fn from_header(&self, rows: &[Vec<String>], diag: &mut Diagnostics) -> Result<Vec<LogicalLine>> {
        let header = &rows[0];
        let data = rows
            .get(1)
            .ok_or_else(|| Error::CsvFormat("ヘッダー行のみでデータ行がありません".into()))?;
        if rows.len() > 2 {
            diag.warn(format!(
                "データ行が{}行あります。1行目のみ使用します",
                rows.len() - 1
            ));
        }

        let unknown: Vec<&str> = header
            .iter()
            .filter(|h| !h.is_empty() && !self.dict.is_known_label(h))
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            diag.warn(format!(
                "ヘッダー「{}」は辞書にありません。ラベルとしてそのまま扱います",
                unknown.join("」「")
            ));
        }
        diag.info("1行目をヘッダーとして読み込みました");

        let pairs = header
            .iter()
            .zip(data.iter())
            .map(|(h, v)| (h.as_str(), v.as_str()));
        Ok(self.build_lines(pairs))
    }

    fn from_key_value(&self, rows: &[Vec<String>], diag: &mut Diagnostics) -> Vec<LogicalLine> {
        diag.info("縦型（項目・値）のCSVとして読み込みました");
        let start = self.key_value_start(rows);
        let values: Vec<(String, String)> = rows[start..]
            .iter()
            .filter(|r| r.first().map_or(false, |k| !k.starts_with('#')))
            .filter_map(|r| {
                let key = r.first()?.clone();
                let value = r[1..]
                    .iter()
                    .filter(|c| !c.is_empty())
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(",");
                Some((key, value))
            })
            .collect();
        self.build_lines(values.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    /// ラベル行を並べ、栄養成分は見出しの後ろにまとめる
    fn build_lines<'p>(&self, pairs: impl Iterator<Item = (&'p str, &'p str)>) -> Vec<LogicalLine> {
        let mut fields = Vec::new();
        let mut nutrition = Vec::new();
        for (label, value) in pairs {
            if label.is_empty() || value.is_empty() {
                continue;
            }
            let line = LogicalLine::labeled(label, value);
            if self.dict.exact_field(label).is_none() && self.dict.exact_nutrition(label).is_some() {
                nutrition.push(line);
            } else {
                fields.push(line);
            }
        }
        if !nutrition.is_empty() {
            fields.push(LogicalLine::section(NUTRITION_SECTION));
            fields.extend(nutrition);
        }
        fields
    }
}

/// 区切り文字の判定
///
/// 各候補について行ごとの出現数（引用符内を除く）を数え、
/// 最頻値と一致する行の割合が最も高いものを選ぶ。
pub fn sniff_delimiter(sample: &[&str]) -> Option<u8> {
    let mut best: Option<(u8, f32)> = None;
    for delimiter in DELIMITERS {
        let counts: Vec<usize> = sample.iter().map(|l| count_unquoted(l, delimiter)).collect();
        let Some(mode) = mode_of(&counts) else {
            continue;
        };
        let consistent = counts.iter().filter(|&&c| c == mode).count();
        let score = consistent as f32 / counts.len() as f32;
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((delimiter, score));
        }
    }
    best.map(|(d, _)| d)
}

/// 0を除く最頻値（同数なら大きい方）
fn mode_of(counts: &[usize]) -> Option<usize> {
    let mut tally: Vec<(usize, usize)> = Vec::new();
    for &c in counts.iter().filter(|&&c| c > 0) {
        match tally.iter_mut().find(|(v, _)| *v == c) {
            Some((_, n)) => *n += 1,
            None => tally.push((c, 1)),
        }
    }
    tally
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)))
        .map(|(v, _)| v)
}

fn count_unquoted(line: &str, delimiter: u8) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for b in line.bytes() {
        if b == b'"' {
            in_quotes = !in_quotes;
        } else if b == delimiter && !in_quotes {
            count += 1;
        }
    }
    count
}

fn delimiter_name(delimiter: u8) -> &'static str {
    match delimiter {
        b',' => "カンマ",
        b'\t' => "タブ",
        b';' => "セミコロン",
        _ => "不明",
    }
}

/// 全行を読み、セルを正規化する（空行は除く）
fn read_rows(raw: &str, delimiter: u8) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(raw.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| Error::CsvFormat(format!("CSVの解析に失敗しました: {}", e)))?;
        let row: Vec<String> = record.iter().map(normalize_fragment).collect();
        if row.iter().any(|c| !c.is_empty()) {
            rows.push(row);
        }
    }
    Ok(rows)
}
