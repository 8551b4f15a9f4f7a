use serde::{Deserialize, Serialize};

use crate::speaker::SPEAKER_MARKER;
use crate::text::contains_japanese;

/// Tunables for the generic keep rule. The length/ratio boundary is a
/// heuristic with no hard rationale in the source format, so it is carried
/// as configuration rather than baked in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Minimum trimmed character count for the printable-ratio rule.
    pub min_keep_len: usize,
    /// Minimum fraction of printable characters.
    pub min_printable_ratio: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_keep_len: 3,
            min_printable_ratio: 0.5,
        }
    }
}

/// Decide whether a decoded record survives into the transcript.
///
/// Rule order, first match wins:
/// 1. whitespace-only text is dropped
/// 2. marker-prefixed records always survive (speaker/narration candidates)
/// 3. any CJK character keeps the record
/// 4. fixed keep-patterns (resource ids, audio names, engine tokens)
/// 5. otherwise the generic length/printable-ratio rule applies
pub fn is_meaningful(decoded: &str, raw: &[u8], config: &ClassifierConfig) -> bool {
    let trimmed = decoded.trim();
    if trimmed.is_empty() {
        return false;
    }

    if raw.first() == Some(&SPEAKER_MARKER) {
        return true;
    }

    if contains_japanese(trimmed) {
        return true;
    }

    if matches_keep_pattern(trimmed) {
        return true;
    }

    let total = trimmed.chars().count();
    if total < config.min_keep_len {
        return false;
    }
    let printable = trimmed.chars().filter(|c| !c.is_control()).count();
    printable as f64 / total as f64 >= config.min_printable_ratio
}

/// Fixed keep-patterns for asset and engine tokens.
pub fn matches_keep_pattern(text: &str) -> bool {
    is_resource_id(text) || is_audio_name(text) || has_audio_extension(text) || text.contains('%')
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_audio_char(c: char) -> bool {
    is_ident_char(c) || c == '.' || c == '-'
}

/// Case-insensitive `prefix` followed by at least one character for which
/// `allowed` holds, through to the end of the token.
fn prefixed_token(text: &str, prefix: &str, allowed: fn(char) -> bool) -> bool {
    if text.len() < prefix.len() + 1 || !text.is_char_boundary(prefix.len()) {
        return false;
    }
    let (head, rest) = text.split_at(prefix.len());
    head.eq_ignore_ascii_case(prefix) && rest.chars().all(allowed)
}

/// Day/background/sprite/hospital asset naming schemes.
pub fn is_resource_id(text: &str) -> bool {
    prefixed_token(text, "BG", |c| c.is_ascii_digit() || c == '_')
        || prefixed_token(text, "ST", is_ident_char)
        || prefixed_token(text, "DAY", is_ident_char)
        || prefixed_token(text, "HOS_", is_ident_char)
}

/// Sound-effect and BGM naming schemes.
pub fn is_audio_name(text: &str) -> bool {
    prefixed_token(text, "SE_", is_audio_char) || prefixed_token(text, "BGM_", is_audio_char)
}

fn has_audio_extension(text: &str) -> bool {
    text.len() > 4
        && text.is_char_boundary(text.len() - 4)
        && text[text.len() - 4..].eq_ignore_ascii_case(".ogg")
}
