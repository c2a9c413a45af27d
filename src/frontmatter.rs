use std::{
    collections::{BTreeMap, BTreeSet},
    sync::LazyLock,
};

use chrono::NaiveDate;
use regex::Regex;
use serde_yaml::Value;

/// Marker line that opens and closes a front-matter block.
pub const DELIMITER: &str = "---";

// YAML 1.1 timestamp: a date-only form with exactly 4-2-2 digits, or a
// datetime that carries a time part.
static RE_YAML_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").unwrap()
});

static RE_YAML_DATETIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{4})-(\d{1,2})-(\d{1,2})(?:[Tt]|[ \t]+)\d{1,2}:\d{2}:\d{2}(?:\.\d*)?(?:[ \t]*(?:Z|[-+]\d{1,2}(?::\d{2})?))?$",
    )
    .unwrap()
});

/// Key-value metadata parsed from a front-matter block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    fields: BTreeMap<String, Value>,
    /// Top-level keys whose value was written as a quoted string.
    quoted: BTreeSet<String>,
}

impl Metadata {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Declared `title`, coerced to a string. Empty titles count as absent.
    pub fn title(&self) -> Option<String> {
        self.scalar("title").filter(|t| !t.is_empty())
    }

    /// Declared `slug`, coerced to a string. Empty slugs count as absent.
    pub fn slug(&self) -> Option<String> {
        self.scalar("slug").filter(|s| !s.is_empty())
    }

    /// Declared `date`. Plain YAML timestamps (date or datetime) become an
    /// ISO-8601 calendar date; quoted strings and any other scalar are kept
    /// as written.
    pub fn date(&self) -> Option<String> {
        let raw = self.scalar("date")?;
        if self.quoted.contains("date") {
            return Some(raw);
        }
        Some(match yaml_timestamp_date(&raw) {
            Some(date) => date.format("%Y-%m-%d").to_string(),
            None => raw,
        })
    }

    fn scalar(&self, key: &str) -> Option<String> {
        self.fields.get(key).and_then(scalar_to_string)
    }
}

/// How the front-matter block of a document was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontMatterStatus {
    /// The document does not open with a delimiter line.
    Absent,
    /// An opening delimiter was found but never closed.
    Unterminated,
    /// The block parsed as a mapping (possibly an empty one).
    Parsed,
    /// The block was delimited but its content is not a YAML mapping.
    Malformed(String),
}

/// Result of splitting a document into front matter and body.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontMatter<'a> {
    pub metadata: Metadata,
    pub body: &'a str,
    pub status: FrontMatterStatus,
}

impl<'a> FrontMatter<'a> {
    fn without_metadata(body: &'a str, status: FrontMatterStatus) -> Self {
        Self {
            metadata: Metadata::default(),
            body,
            status,
        }
    }
}

/// Split `text` into its front-matter metadata and body.
///
/// The block opens when the first non-blank line is exactly `---` and
/// closes at the next line that is exactly `---` (surrounding whitespace
/// ignored). The body is the text strictly after the closing line. A
/// missing or unterminated block leaves the whole text as body, and a
/// block that fails to parse yields empty metadata. Neither case is an
/// error.
pub fn parse(text: &str) -> FrontMatter<'_> {
    let mut lines = LineSpans::new(text);

    let opened = lines
        .by_ref()
        .find(|(_, _, line)| !line.trim().is_empty())
        .is_some_and(|(_, _, line)| {
            line.trim_start_matches('\u{feff}').trim() == DELIMITER
        });
    if !opened {
        return FrontMatter::without_metadata(text, FrontMatterStatus::Absent);
    }

    let block_start = lines.offset;
    let Some((close_start, close_end, _)) =
        lines.find(|(_, _, line)| line.trim() == DELIMITER)
    else {
        return FrontMatter::without_metadata(
            text,
            FrontMatterStatus::Unterminated,
        );
    };

    let block = &text[block_start..close_start];
    let body = &text[close_end..];

    match parse_block(block) {
        Ok(metadata) => FrontMatter {
            metadata,
            body,
            status: FrontMatterStatus::Parsed,
        },
        Err(reason) => FrontMatter::without_metadata(
            body,
            FrontMatterStatus::Malformed(reason),
        ),
    }
}

fn parse_block(block: &str) -> Result<Metadata, String> {
    let value: Value =
        serde_yaml::from_str(block).map_err(|e| e.to_string())?;

    match value {
        Value::Null => Ok(Metadata::default()),
        Value::Mapping(mapping) => {
            let fields = mapping
                .into_iter()
                .filter_map(|(k, v)| Some((scalar_to_string(&k)?, v)))
                .collect();
            Ok(Metadata {
                fields,
                quoted: quoted_keys(block),
            })
        }
        _ => Err("front matter is not a mapping".to_string()),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// Top-level keys of a block mapping whose value starts with a quote.
///
/// `serde_yaml` resolves both `2024-03-09` and `"2024-03-09"` to the same
/// string, so the quoting has to be read off the source lines.
fn quoted_keys(block: &str) -> BTreeSet<String> {
    block
        .lines()
        .filter(|line| !line.starts_with([' ', '\t', '#', '-']))
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            let value = value.trim_start();
            value
                .starts_with(['"', '\''])
                .then(|| key.trim().trim_matches(['"', '\'']).to_string())
        })
        .collect()
}

/// Calendar date of a plain scalar matching the YAML timestamp grammar.
fn yaml_timestamp_date(raw: &str) -> Option<NaiveDate> {
    let caps = RE_YAML_DATE
        .captures(raw)
        .or_else(|| RE_YAML_DATETIME.captures(raw))?;
    let year = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let day = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Iterator over `(start, end, line)` where `end` includes the line
/// terminator. `offset` is the end of the last yielded line.
struct LineSpans<'a> {
    text: &'a str,
    offset: usize,
}

impl<'a> LineSpans<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, offset: 0 }
    }
}

impl<'a> Iterator for LineSpans<'a> {
    type Item = (usize, usize, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.text.len() {
            return None;
        }
        let start = self.offset;
        let rest = &self.text[start..];
        let end = match rest.find('\n') {
            Some(i) => start + i + 1,
            None => self.text.len(),
        };
        self.offset = end;
        Some((start, end, &self.text[start..end]))
    }
}
