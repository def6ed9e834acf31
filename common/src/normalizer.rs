//! テキスト正規化モジュール
//!
//! 人手で書かれた商品説明を論理行の列に変換する。
//!
//! ## 処理内容
//! 1. 全角英数字・記号を半角に畳む（NFKC、かな・漢字はそのまま）
//! 2. 行頭の箇条書き記号（■ ● ・ - ※ など）を除去
//! 3. 連続する空白を1つにまとめる
//! 4. ラベルと値の区切り（：, :, ` - `, 【】, 空白）を `:` に統一
//! 5. 区切りのない継続行を直前の項目の値に連結

use crate::alias::AliasDictionary;
use unicode_normalization::UnicodeNormalization;

/// ラベルとして扱う最大文字数
const MAX_LABEL_CHARS: usize = 20;

/// 行頭記号の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineMarker {
    None,
    /// ● ・ - * ★ など
    Bullet,
    /// ■ □ ◆ ◇（見出し）
    Heading,
    /// ※（注意書き）
    Note,
    /// 【 または [ で始まる行（記号は残す）
    Bracket,
}

impl LineMarker {
    /// 新しいブロックの始まりを示す記号か
    pub fn starts_block(self) -> bool {
        matches!(self, LineMarker::Heading | LineMarker::Bracket | LineMarker::Note)
    }
}

/// ラベルと値の区切りの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// 区切りなし（自由記述）
    None,
    /// `:` / `：`
    Colon,
    /// ` - `
    Dash,
    /// `【ラベル】値`
    Bracket,
    /// `ラベル 値`（ラベルが辞書にある場合のみ）
    Whitespace,
    /// ラベルだけの行に続く行を値として連結
    Joined,
}

impl Separator {
    /// ラベル・値の形をしているか（空白区切りは曖昧なので含めない）
    pub fn is_explicit(self) -> bool {
        matches!(
            self,
            Separator::Colon | Separator::Dash | Separator::Bracket | Separator::Joined
        )
    }

    pub fn has_label(self) -> bool {
        self != Separator::None
    }
}

/// 論理行
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalLine {
    /// 論理行の通し番号
    pub index: usize,
    /// 正規化後の行テキスト（ラベル行は `ラベル:値`）
    pub text: String,
    pub label: Option<String>,
    pub value: Option<String>,
    pub separator: Separator,
    pub marker: LineMarker,
}

impl LogicalLine {
    /// ラベル・値の行
    pub fn labeled(label: &str, value: &str) -> Self {
        Self {
            index: 0,
            text: String::new(),
            label: Some(label.trim().to_string()),
            value: Some(value.trim().to_string()),
            separator: Separator::Colon,
            marker: LineMarker::None,
        }
        .rendered()
    }

    /// 区切りのない行
    pub fn bare(text: &str) -> Self {
        Self {
            index: 0,
            text: text.trim().to_string(),
            label: None,
            value: None,
            separator: Separator::None,
            marker: LineMarker::None,
        }
    }

    /// 見出し行（【...】）
    pub fn section(text: &str) -> Self {
        Self {
            marker: LineMarker::Bracket,
            ..Self::bare(text)
        }
    }

    pub fn blank() -> Self {
        Self::bare("")
    }

    pub fn is_blank(&self) -> bool {
        self.text.is_empty() && self.separator == Separator::None
    }

    /// ラベルと空でない値を持つか
    pub fn pair(&self) -> Option<(&str, &str)> {
        match (&self.label, &self.value) {
            (Some(label), Some(value)) if !value.trim().is_empty() => {
                Some((label.as_str(), value.as_str()))
            }
            _ => None,
        }
    }

    fn rendered(mut self) -> Self {
        if let (Some(label), Some(value)) = (&self.label, &self.value) {
            self.text = format!("{}:{}", label, value);
        }
        self
    }
}

/// 区切りが曖昧だった行
#[derive(Debug, Clone, PartialEq)]
pub struct Ambiguity {
    pub line: usize,
    pub message: String,
}

/// 正規化結果
#[derive(Debug, Clone, Default)]
pub struct NormalizedText {
    /// 論理行を改行でつないだテキスト
    pub text: String,
    pub lines: Vec<LogicalLine>,
    /// 呼び出し側でログに残す曖昧な区切り
    pub ambiguities: Vec<Ambiguity>,
}

impl NormalizedText {
    /// 組み立て済みの論理行から生成（番号を振り直す）
    pub fn from_lines(lines: Vec<LogicalLine>) -> Self {
        let mut result = Self::default();
        for line in lines {
            push_line(&mut result.lines, line);
        }
        result.text = render_text(&result.lines);
        result
    }

    /// 空行以外の行数
    pub fn content_lines(&self) -> usize {
        self.lines.iter().filter(|l| !l.is_blank()).count()
    }
}

/// 全角英数字・記号を半角に畳む（かな・漢字はそのまま）
pub fn fold_width(text: &str) -> String {
    text.nfkc().collect::<String>().replace('\u{3000}', " ")
}

/// 空白の連続を1つにまとめ、前後を除去
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 照合用にラベルを畳む（幅・大小文字・空白・行頭記号・括弧記号を無視）
pub fn fold_label(label: &str) -> String {
    let folded = fold_width(label).to_lowercase();
    let (_, rest) = strip_marker(folded.trim());
    rest.chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '【' | '】'))
        .collect()
}

/// 文字列断片を正規化（CSVセルなど）
pub fn normalize_fragment(text: &str) -> String {
    collapse_whitespace(&fold_width(text))
}

fn is_heading_glyph(c: char) -> bool {
    matches!(c, '■' | '□' | '◆' | '◇' | '▼' | '▽')
}

fn is_bullet_glyph(c: char) -> bool {
    matches!(
        c,
        '●' | '○' | '◎' | '・' | '-' | '*' | '★' | '☆' | '•' | '▪' | '▶' | '►' | '→' | '〇' | '+'
    )
}

/// 行頭の記号を除去して種類を返す
fn strip_marker(line: &str) -> (LineMarker, &str) {
    let mut marker = LineMarker::None;
    let mut rest = line;
    loop {
        let mut chars = rest.chars();
        let Some(c) = chars.next() else { break };
        let kind = if c == '※' {
            LineMarker::Note
        } else if is_heading_glyph(c) {
            LineMarker::Heading
        } else if is_bullet_glyph(c) {
            LineMarker::Bullet
        } else {
            break;
        };
        // 最初に見つかった記号を優先（※は常に注意書き扱い）
        if marker == LineMarker::None || kind == LineMarker::Note {
            marker = kind;
        }
        rest = chars.as_str().trim_start();
    }
    if marker == LineMarker::None && (rest.starts_with('【') || rest.starts_with('[')) {
        marker = LineMarker::Bracket;
    }
    (marker, rest)
}

/// 栄養成分ブロックの見出し行か
pub fn is_nutrition_heading(text: &str) -> bool {
    let body = text.trim_start_matches(|c: char| c == '【' || c == '[');
    text.contains("栄養成分") && (body.starts_with("栄養成分") || text.starts_with('【') || text.starts_with('['))
}

/// テキスト正規化器
pub struct TextNormalizer<'a> {
    dict: &'a AliasDictionary,
}

impl<'a> TextNormalizer<'a> {
    pub fn new(dict: &'a AliasDictionary) -> Self {
        Self { dict }
    }

    /// 生テキストを論理行に変換する
    pub fn normalize(&self, raw: &str) -> NormalizedText {
        let folded = fold_width(raw);
        let mut lines: Vec<LogicalLine> = Vec::new();
        let mut ambiguities = Vec::new();
        // 値を継続中の行の位置
        let mut open: Option<usize> = None;

        for raw_line in folded.lines() {
            let collapsed = collapse_whitespace(raw_line);
            if collapsed.is_empty() {
                open = None;
                if lines.last().map_or(false, |l| !l.is_blank()) {
                    push_line(&mut lines, LogicalLine::blank());
                }
                continue;
            }

            let (marker, body) = strip_marker(&collapsed);
            if body.is_empty() {
                continue;
            }

            let mut line = self.split_line(body);
            line.marker = marker;

            if line.separator == Separator::None {
                let continues = !marker.starts_block() && !is_nutrition_heading(body);
                if let (true, Some(pos)) = (continues, open) {
                    append_value(&mut lines[pos], body);
                    continue;
                }
                open = None;
                push_line(&mut lines, line);
                continue;
            }

            let index = lines.len();
            match line.separator {
                Separator::Whitespace => ambiguities.push(Ambiguity {
                    line: index,
                    message: format!("区切り記号がないため空白で分割しました: {}", body),
                }),
                Separator::Dash => ambiguities.push(Ambiguity {
                    line: index,
                    message: format!("「 - 」を区切りとして扱いました: {}", body),
                }),
                _ => {}
            }
            push_line(&mut lines, line);
            open = Some(index);
        }

        // 値の付かなかったラベルだけの行は自由記述に戻す
        for line in &mut lines {
            if line.separator == Separator::Joined && line.pair().is_none() {
                line.separator = Separator::None;
                line.value = None;
                if let Some(label) = line.label.take() {
                    line.text = label;
                }
            }
        }
        while lines.last().map_or(false, |l| l.is_blank()) {
            lines.pop();
        }

        let text = render_text(&lines);
        NormalizedText {
            text,
            lines,
            ambiguities,
        }
    }

    /// 1行をラベルと値に分ける
    fn split_line(&self, body: &str) -> LogicalLine {
        // 【ラベル】値
        if let Some(line) = split_bracket(body) {
            return line;
        }

        if let Some((label, value)) = split_at_colon(body) {
            return with_separator(label, value, Separator::Colon);
        }

        if let Some((label, value)) = body.split_once(" - ") {
            if is_label_like(label) && !value.trim().is_empty() {
                return with_separator(label, value, Separator::Dash);
            }
        }

        if let Some((label, value)) = body.split_once(' ') {
            if self.dict.is_known_label(label) && !value.trim().is_empty() {
                return with_separator(label, value, Separator::Whitespace);
            }
        }

        if self.dict.is_known_label(body) {
            return LogicalLine {
                index: 0,
                text: body.to_string(),
                label: Some(body.to_string()),
                value: Some(String::new()),
                separator: Separator::Joined,
                marker: LineMarker::None,
            };
        }

        LogicalLine::bare(body)
    }
}

fn with_separator(label: &str, value: &str, separator: Separator) -> LogicalLine {
    LogicalLine {
        separator,
        ..LogicalLine::labeled(label, value)
    }
}

fn is_label_like(label: &str) -> bool {
    let label = label.trim();
    !label.is_empty() && label.chars().count() <= MAX_LABEL_CHARS
}

/// `ラベル:値` の分割（URLのスキームは区切りとみなさない）
fn split_at_colon(body: &str) -> Option<(&str, &str)> {
    let (label, value) = body.split_once(':')?;
    if !is_label_like(label) || value.starts_with("//") {
        return None;
    }
    // 10:00 のような時刻
    let digit_before = label.chars().last().map_or(false, |c| c.is_ascii_digit());
    let digit_after = value.chars().next().map_or(false, |c| c.is_ascii_digit());
    if digit_before && digit_after {
        return None;
    }
    if value.trim().is_empty() {
        // 「商品名:」のように値が次行以降に続く形
        return Some((label, ""));
    }
    Some((label, value))
}

/// `【ラベル】値` の分割（栄養成分の見出しは除く）
fn split_bracket(body: &str) -> Option<LogicalLine> {
    let (open, close) = if body.starts_with('【') {
        ('【', '】')
    } else if body.starts_with('[') {
        ('[', ']')
    } else {
        return None;
    };
    let inner_start = open.len_utf8();
    let close_pos = body.find(close)?;
    let label = &body[inner_start..close_pos];
    let value = body[close_pos + close.len_utf8()..]
        .trim()
        .trim_start_matches(':')
        .trim();
    if value.is_empty() || label.contains("栄養成分") || !is_label_like(label) {
        return None;
    }
    Some(with_separator(label, value, Separator::Bracket))
}

fn append_value(line: &mut LogicalLine, continuation: &str) {
    let value = line.value.get_or_insert_with(String::new);
    if value.is_empty() {
        value.push_str(continuation);
    } else if line.separator == Separator::Joined {
        value.push(' ');
        value.push_str(continuation);
    } else {
        value.push('\n');
        value.push_str(continuation);
    }
    // 「商品名:」の後に値が続いた場合もラベルだけの行と同じ扱い
    if line.separator == Separator::Colon && !value.contains('\n') {
        line.separator = Separator::Joined;
    }
    *line = std::mem::replace(line, LogicalLine::blank()).rendered();
}

fn push_line(lines: &mut Vec<LogicalLine>, mut line: LogicalLine) {
    line.index = lines.len();
    lines.push(line);
}

fn render_text(lines: &[LogicalLine]) -> String {
    lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(raw: &str) -> NormalizedText {
        TextNormalizer::new(AliasDictionary::builtin()).normalize(raw)
    }

    #[test]
    fn test_fold_width_preserves_kana_kanji() {
        assert_eq!(fold_width("エネルギー：５９５ｋｃａｌ"), "エネルギー:595kcal");
        assert_eq!(fold_width("たんぱく質　６．７ｇ"), "たんぱく質 6.7g");
        assert_eq!(fold_width("蒜山高原"), "蒜山高原");
    }

    #[test]
    fn test_fold_label() {
        assert_eq!(fold_label("■ 商品名 "), "商品名");
        assert_eq!(fold_label("Product Name"), "productname");
        assert_eq!(fold_label("【原材料】"), "原材料");
    }

    #[test]
    fn test_strip_bullets_and_split() {
        let result = normalize("■商品名：チョコレート\n● 名称 : 菓子\n・内容量:300g");
        let pairs: Vec<(&str, &str)> = result.lines.iter().filter_map(|l| l.pair()).collect();
        assert_eq!(
            pairs,
            vec![("商品名", "チョコレート"), ("名称", "菓子"), ("内容量", "300g")]
        );
        assert_eq!(result.lines[0].marker, LineMarker::Heading);
        assert_eq!(result.lines[1].marker, LineMarker::Bullet);
        assert_eq!(result.text, "商品名:チョコレート\n名称:菓子\n内容量:300g");
    }

    #[test]
    fn test_continuation_lines_append_to_value() {
        let result = normalize("■原材料：砂糖、\nカカオマス、\n全粉乳\n■内容量：300g");
        assert_eq!(result.lines.len(), 2);
        assert_eq!(result.lines[0].value.as_deref(), Some("砂糖、\nカカオマス、\n全粉乳"));
        assert_eq!(result.lines[1].pair(), Some(("内容量", "300g")));
    }

    #[test]
    fn test_bare_label_joins_following_lines() {
        let result = normalize("商品名\nチョコレート\nミックス\n\n名称\n菓子");
        assert_eq!(result.lines[0].pair(), Some(("商品名", "チョコレート ミックス")));
        assert_eq!(result.lines[0].separator, Separator::Joined);
        assert!(result.lines[1].is_blank());
        assert_eq!(result.lines[2].pair(), Some(("名称", "菓子")));
    }

    #[test]
    fn test_whitespace_separator_is_flagged() {
        let result = normalize("原材料 砂糖\nエネルギー  595kcal");
        assert_eq!(result.lines[0].pair(), Some(("原材料", "砂糖")));
        assert_eq!(result.lines[0].separator, Separator::Whitespace);
        assert_eq!(result.lines[1].pair(), Some(("エネルギー", "595kcal")));
        assert_eq!(result.ambiguities.len(), 2);
    }

    #[test]
    fn test_bracket_label() {
        let result = normalize("【原材料】砂糖、カカオ\n【栄養成分表示(100g当たり)】");
        assert_eq!(result.lines[0].pair(), Some(("原材料", "砂糖、カカオ")));
        assert_eq!(result.lines[0].separator, Separator::Bracket);
        assert_eq!(result.lines[1].separator, Separator::None);
        assert_eq!(result.lines[1].marker, LineMarker::Bracket);
    }

    #[test]
    fn test_note_line_does_not_continue() {
        let result = normalize("■販売者：株式会社天然生活\n※本品製造工場では卵を含む製品を製造しています");
        assert_eq!(result.lines.len(), 2);
        assert_eq!(result.lines[0].pair(), Some(("販売者", "株式会社天然生活")));
        assert_eq!(result.lines[1].marker, LineMarker::Note);
    }

    #[test]
    fn test_url_is_not_a_label() {
        let result = normalize("https://example.com/item");
        assert_eq!(result.lines[0].separator, Separator::None);
    }

    #[test]
    fn test_unknown_bare_line_stays_free_text() {
        let result = normalize("蒜山高原ミックスチョコレート\n■名称：菓子");
        assert_eq!(result.lines[0].separator, Separator::None);
        assert_eq!(result.lines[0].text, "蒜山高原ミックスチョコレート");
    }

    #[test]
    fn test_blank_lines_collapse() {
        let result = normalize("商品名:A\n\n\n\n名称:B\n\n");
        assert_eq!(result.lines.len(), 3);
        assert!(result.lines[1].is_blank());
    }

    #[test]
    fn test_is_nutrition_heading() {
        assert!(is_nutrition_heading("【栄養成分表示(100g当たり)】(推定値)"));
        assert!(is_nutrition_heading("栄養成分表示"));
        assert!(!is_nutrition_heading("エネルギー:595kcal"));
    }
}
