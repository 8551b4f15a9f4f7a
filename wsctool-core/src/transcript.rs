use serde::Serialize;

use crate::speaker::RecordKind;
use crate::validate::ValidationResult;

/// Escape used for embedded newlines on a transcript content line.
const NEWLINE_ESCAPE: &str = "\\n";

/// One transcript record: the unit that survives the round trip.
///
/// `end_offset` is the position of the record's null terminator, so
/// `original_length` counts the content bytes alone and a faithful
/// re-encode is `original_length + 1` bytes long.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    pub start_offset: usize,
    pub end_offset: usize,
    pub content: String,
    pub is_speaker: bool,
    pub original_length: usize,
    #[serde(skip)]
    pub binary_data: Option<Vec<u8>>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl Entry {
    pub fn new(start_offset: usize, end_offset: usize, content: String, is_speaker: bool) -> Self {
        Self {
            start_offset,
            end_offset,
            content,
            is_speaker,
            original_length: end_offset.saturating_sub(start_offset),
            binary_data: None,
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// The content line as it appears in the transcript.
    pub fn transcript_line(&self) -> String {
        if self.is_speaker {
            format!(".{}", self.content)
        } else {
            self.content.clone()
        }
    }
}

/// Render one kept record: offset header, sanitized content line, blank
/// separator.
pub fn render_record(start: usize, end: usize, kind: &RecordKind) -> String {
    format!("<{start:08X}:{end:08X}>\n{}\n\n", sanitize(&kind.transcript_line()))
}

/// Render parsed entries back to transcript text (used to normalize a
/// transcript after offset recalculation).
pub fn render_entries(entries: &[Entry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&format!(
            "<{:08X}:{:08X}>\n{}\n\n",
            entry.start_offset,
            entry.end_offset,
            sanitize(&entry.transcript_line())
        ));
    }
    out
}

/// Strip carriage returns and rewrite newlines as the literal escape so
/// every record stays on a single content line.
fn sanitize(text: &str) -> String {
    text.replace('\r', "").replace('\n', NEWLINE_ESCAPE)
}

fn restore(text: &str) -> String {
    text.replace(NEWLINE_ESCAPE, "\n")
}

/// Header line shape: `<XXXXXXXX:XXXXXXXX>`, exactly 8 hex digits per side.
fn parse_header(line: &str) -> Option<(usize, usize)> {
    let inner = line.strip_prefix('<')?.strip_suffix('>')?;
    let (start_hex, end_hex) = inner.split_once(':')?;
    if start_hex.len() != 8 || end_hex.len() != 8 {
        return None;
    }
    if !start_hex.bytes().all(|b| b.is_ascii_hexdigit())
        || !end_hex.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return None;
    }
    let start = u32::from_str_radix(start_hex, 16).ok()?;
    let end = u32::from_str_radix(end_hex, 16).ok()?;
    Some((start as usize, end as usize))
}

/// Parse transcript text into entries.
///
/// Lines are read in header/content pairs with blank lines skipped. A
/// malformed header is a structural error for that line; parsing continues
/// with the next line. Non-increasing start offsets are reported as
/// warnings and flag the result for offset recalculation.
pub fn parse_transcript(text: &str) -> (Vec<Entry>, ValidationResult) {
    let mut entries = Vec::new();
    let mut result = ValidationResult::new();

    let lines: Vec<&str> = text.trim().split('\n').collect();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i].trim();

        if line.is_empty() {
            i += 1;
            continue;
        }

        if let Some((start_offset, end_offset)) = parse_header(line) {
            let content_line = if i + 1 < lines.len() {
                lines[i + 1].trim()
            } else {
                ""
            };

            let is_speaker = content_line.starts_with('.') && content_line.len() > 1;
            let stripped = if is_speaker {
                &content_line[1..]
            } else {
                content_line
            };

            entries.push(Entry::new(
                start_offset,
                end_offset,
                restore(stripped),
                is_speaker,
            ));
            i += 2;
        } else if line.starts_with('<') && line.ends_with('>') {
            result.add_error(format!("Invalid offset format on line {}: {}", i + 1, line));
            result.add_suggestion("Ensure format is <XXXXXXXX:XXXXXXXX>".to_string());
            i += 1;
        } else {
            let shown: String = line.chars().take(50).collect();
            result.add_error(format!(
                "Expected offset format on line {}, got: {shown}",
                i + 1
            ));
            i += 1;
        }
    }

    if entries.is_empty() {
        result.add_error("No valid WSC entries found".to_string());
        result.add_suggestion(
            "Ensure file contains <start:end> offset lines followed by content".to_string(),
        );
    } else {
        for i in 1..entries.len() {
            if entries[i].start_offset <= entries[i - 1].start_offset {
                result.add_warning(format!(
                    "Offset ordering issue: entry {} starts before entry {}",
                    i + 1,
                    i
                ));
                result.needs_recalculation = true;
            }
        }
    }

    (entries, result)
}
