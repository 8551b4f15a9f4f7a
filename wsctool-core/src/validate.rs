use serde::{Deserialize, Serialize};

use crate::speaker::{encode_record, infer_kind};
use crate::text::{contains_japanese, encode_strict, is_japanese_name, TextEncoding};
use crate::transcript::Entry;

/// How encodability problems are reported: errors on the strict path,
/// warnings on the lenient one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strictness {
    Strict,
    Lenient,
}

/// Findings of one validation pass. Passes are composed by merging:
/// lists concatenate and `is_valid` is recomputed from the error list.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
    pub needs_recalculation: bool,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            suggestions: Vec::new(),
            needs_recalculation: false,
        }
    }

    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
        self.is_valid = false;
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub fn add_suggestion(&mut self, suggestion: String) {
        self.suggestions.push(suggestion);
    }

    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.suggestions.extend(other.suggestions);
        self.needs_recalculation |= other.needs_recalculation;
        self.is_valid = self.errors.is_empty();
    }
}

impl std::fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} error(s), {} warning(s)",
            self.errors.len(),
            self.warnings.len()
        )
    }
}

/// Structural pass over raw transcript text: non-blank lines must alternate
/// offset header / content, and at least one entry must exist.
pub fn validate_structure(text: &str) -> ValidationResult {
    let mut result = ValidationResult::new();
    let lines: Vec<&str> = text.trim().split('\n').collect();
    let mut i = 0;
    let mut entry_count = 0usize;

    while i < lines.len() {
        let line = lines[i].trim();

        if line.is_empty() {
            i += 1;
            continue;
        }

        if !is_header_line(line) {
            let shown: String = line.chars().take(30).collect();
            result.add_error(format!("Line {}: Invalid offset format '{shown}'", i + 1));
            result.add_suggestion("Use format <XXXXXXXX:XXXXXXXX>".to_string());
            i += 1;
            continue;
        }

        if i + 1 >= lines.len() {
            result.add_error(format!("Line {}: Missing content for offset {line}", i + 1));
            result.add_suggestion("Add content line after each offset".to_string());
            break;
        }

        entry_count += 1;
        i += 2;
    }

    if entry_count == 0 {
        result.add_error("No valid WSC entries found".to_string());
        result.add_suggestion("Ensure file contains proper offset and content lines".to_string());
    }

    result
}

fn is_header_line(line: &str) -> bool {
    let Some(inner) = line.strip_prefix('<').and_then(|l| l.strip_suffix('>')) else {
        return false;
    };
    let Some((start, end)) = inner.split_once(':') else {
        return false;
    };
    start.len() == 8
        && end.len() == 8
        && start.bytes().all(|b| b.is_ascii_hexdigit())
        && end.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Content that cannot be encoded in the container's target encoding.
pub fn validate_encoding(content: &str, strictness: Strictness) -> ValidationResult {
    let mut result = ValidationResult::new();
    if encode_strict(TextEncoding::Cp932, content).is_none() {
        let message = format!("Content not compatible with CP932: {}", preview(content));
        match strictness {
            Strictness::Strict => result.add_error(message),
            Strictness::Lenient => result.add_warning(message),
        }
        result.add_suggestion(
            "Replace problematic characters with CP932-compatible alternatives".to_string(),
        );
    }
    result
}

/// Speaker entries should carry a 1-8 character East-Asian name.
pub fn validate_speaker_shape(content: &str, is_speaker: bool) -> ValidationResult {
    let mut result = ValidationResult::new();
    if !is_speaker {
        return result;
    }

    let name = content.trim();
    if name.is_empty() {
        result.add_warning("Empty speaker name detected".to_string());
        result.add_suggestion("Provide a valid speaker name or remove speaker prefix".to_string());
    } else if !is_japanese_name(name) {
        result.add_warning(format!("Unusual speaker name format: '{name}'"));
        result.add_suggestion("Speaker names should be 1-8 Japanese characters".to_string());
        result.add_suggestion(
            "Consider removing speaker prefix (.) if this is narration".to_string(),
        );
    }
    result
}

/// Category heuristics over non-speaker content: audio entries with
/// unexpected extensions, and short non-Japanese content likely to be
/// filtered on the next decompile.
pub fn validate_content_category(content: &str) -> ValidationResult {
    let mut result = ValidationResult::new();

    if content.is_empty() || (content.starts_with('.') && content.len() > 1) {
        return result;
    }

    if is_strict_audio_token(content) {
        let lower = content.to_ascii_lowercase();
        let known_extension =
            lower.ends_with(".ogg") || lower.ends_with(".wav") || lower.ends_with(".mp3");
        if !known_extension && !content.starts_with("BGM_") {
            result.add_warning(format!("Audio file may have unusual extension: {content}"));
        }
        return result;
    }

    if is_strict_resource_token(content) || is_engine_command(content) {
        return result;
    }

    if !contains_japanese(content) && content.chars().count() < 3 {
        result.add_warning(format!("Short content may be filtered: '{content}'"));
        result.add_suggestion("Consider removing or expanding this content".to_string());
    }

    result
}

fn strict_token(content: &str, prefix: &str, allowed: fn(char) -> bool) -> bool {
    content.len() > prefix.len()
        && content.is_char_boundary(prefix.len())
        && content[..prefix.len()].eq_ignore_ascii_case(prefix)
        && content[prefix.len()..].chars().all(allowed)
}

fn is_strict_resource_token(content: &str) -> bool {
    ["DAY_", "BG_", "ST_", "HOS_"]
        .iter()
        .any(|prefix| strict_token(content, prefix, |c| c.is_ascii_alphanumeric() || c == '_'))
}

fn is_strict_audio_token(content: &str) -> bool {
    ["SE_", "BGM_"].iter().any(|prefix| {
        strict_token(content, prefix, |c| {
            c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-'
        })
    })
}

fn is_engine_command(content: &str) -> bool {
    let Some(rest) = content.strip_prefix('%') else {
        return false;
    };
    let body = rest.strip_suffix('%').unwrap_or(rest);
    !body.is_empty() && body.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Offset ordering, overlap, and gap detection across the entry list.
pub fn validate_offsets(entries: &[Entry]) -> ValidationResult {
    let mut result = ValidationResult::new();

    if entries.is_empty() {
        result.add_error("No entries to validate".to_string());
        return result;
    }

    for i in 1..entries.len() {
        let prev = &entries[i - 1];
        let entry = &entries[i];

        if entry.start_offset <= prev.start_offset {
            result.add_error(format!(
                "Offset ordering issue: entry {} ({:08X}) starts before entry {} ({:08X})",
                i + 1,
                entry.start_offset,
                i,
                prev.start_offset
            ));
            result.add_suggestion("Enable offset recalculation or fix offset values".to_string());
            result.needs_recalculation = true;
        }

        if entry.start_offset <= prev.end_offset {
            result.add_error(format!("Offset overlap: entry {} overlaps with entry {}", i, i + 1));
            result.add_suggestion("Recalculate all offsets to resolve conflicts".to_string());
            result.needs_recalculation = true;
        }

        if entry.start_offset > prev.end_offset + 1 {
            let gap = entry.start_offset - prev.end_offset - 1;
            result.add_warning(format!(
                "Gap detected: {gap} bytes between entries {} and {}",
                i,
                i + 1
            ));
            if gap > 100 {
                result.add_suggestion("Large gap may indicate missing data".to_string());
            }
        }
    }

    result
}

/// Re-encode every entry and compare against its declared length. Length
/// deltas are warnings that flag the whole file for recalculation.
pub fn validate_binary_lengths(entries: &mut [Entry]) -> ValidationResult {
    let mut result = ValidationResult::new();

    for (i, entry) in entries.iter_mut().enumerate() {
        if entry.binary_data.is_none() {
            entry.binary_data = Some(encode_record(&infer_kind(&entry.content, entry.is_speaker)));
        }
        let actual = entry.binary_data.as_ref().map(Vec::len).unwrap_or(0);
        let expected = entry.original_length + 1;

        if actual != expected {
            result.add_warning(format!(
                "Entry {}: Length changed from {expected} to {actual} bytes",
                i + 1
            ));
            result.add_suggestion(format!(
                "Content: '{}' - Consider enabling offset recalculation",
                preview(&entry.content)
            ));
            result.needs_recalculation = true;
        }
    }

    result
}

/// Per-entry passes (encoding, speaker shape, category) plus the empty
/// content warning, composed into one result.
pub fn validate_entries(entries: &[Entry], strictness: Strictness) -> ValidationResult {
    let mut result = ValidationResult::new();

    for (i, entry) in entries.iter().enumerate() {
        let mut entry_result = ValidationResult::new();
        entry_result.merge(validate_encoding(&entry.content, strictness));
        entry_result.merge(validate_speaker_shape(&entry.content, entry.is_speaker));
        entry_result.merge(validate_content_category(&entry.transcript_line()));

        if entry.content.trim().is_empty() {
            entry_result.add_warning("Entry has empty content".to_string());
        }

        let prefix = format!("Entry {}: ", i + 1);
        for error in entry_result.errors {
            result.add_error(format!("{prefix}{error}"));
        }
        for warning in entry_result.warnings {
            result.add_warning(format!("{prefix}{warning}"));
        }
        result.suggestions.extend(entry_result.suggestions);
    }

    result
}

/// Whole-transcript validation: structure over the raw text, then entry,
/// offset, and binary-length passes over the parsed entries.
pub fn comprehensive_validation(
    text: &str,
    entries: &mut [Entry],
    strictness: Strictness,
) -> ValidationResult {
    let mut result = validate_structure(text);
    if !entries.is_empty() {
        result.merge(validate_entries(entries, strictness));
        result.merge(validate_offsets(entries));
        result.merge(validate_binary_lengths(entries));
    }
    result
}

fn preview(content: &str) -> String {
    let shown: String = content.chars().take(30).collect();
    if shown.len() < content.len() {
        format!("{shown}...")
    } else {
        shown
    }
}
