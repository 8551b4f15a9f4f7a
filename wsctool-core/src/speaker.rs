use crate::extract::ByteRecord;
use crate::text::{contains_japanese, decode_any, encode_any};

/// Byte that prefixes dialogue-related records in the container. One marker
/// means narration, two or more mean a speaker name.
pub const SPEAKER_MARKER: u8 = 0x0F;

/// What a record means once its marker prefix has been interpreted.
///
/// Produced once per record; the encode direction consumes the same variant
/// instead of re-inspecting strings at every call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKind {
    /// Two or more leading markers: the name shown before a dialogue line.
    Speaker { name: String },
    /// Exactly one leading marker: narrated text.
    Narration { text: String },
    /// No marker: resource ids, audio names, engine tokens, or anything
    /// else the classifier kept.
    Plain { text: String },
}

impl RecordKind {
    /// The transcript content line for this record (speaker names carry a
    /// leading dot).
    pub fn transcript_line(&self) -> String {
        match self {
            RecordKind::Speaker { name } => format!(".{name}"),
            RecordKind::Narration { text } | RecordKind::Plain { text } => text.clone(),
        }
    }

    pub fn is_speaker(&self) -> bool {
        matches!(self, RecordKind::Speaker { .. })
    }
}

/// Interpret a record's marker prefix.
///
/// The remainder after the markers is decoded with the usual priority chain
/// and trimmed. A record that is nothing but markers passes through as
/// plain content with its full decoded text. Degenerate speaker names (not
/// 1-8 East-Asian characters) still resolve as `Speaker`; the shape check
/// belongs to validation.
pub fn resolve_record(record: &ByteRecord) -> RecordKind {
    let markers = record
        .raw
        .iter()
        .take_while(|&&b| b == SPEAKER_MARKER)
        .count();

    if markers == 0 {
        return RecordKind::Plain {
            text: record.decoded.clone(),
        };
    }

    let rest = &record.raw[markers..];
    if rest.is_empty() {
        return RecordKind::Plain {
            text: record.decoded.clone(),
        };
    }

    let (remainder, _) = decode_any(rest);
    let trimmed = remainder.trim().to_string();

    if markers >= 2 {
        RecordKind::Speaker { name: trimmed }
    } else {
        RecordKind::Narration { text: trimmed }
    }
}

/// Re-derive the record kind from transcript content, used when the
/// transcript is all that is left. `is_speaker` comes from the dot prefix;
/// narration-vs-plain is inferred from content shape: East-Asian text with
/// no resource/audio/command prefix regains its narration marker,
/// everything else is plain. Japanese content that happens to match a
/// resource prefix therefore encodes without a marker; that ambiguity is
/// part of the transcript contract.
pub fn infer_kind(content: &str, is_speaker: bool) -> RecordKind {
    if is_speaker {
        RecordKind::Speaker {
            name: content.to_string(),
        }
    } else if contains_japanese(content) && !has_resource_prefix(content) {
        RecordKind::Narration {
            text: content.to_string(),
        }
    } else {
        RecordKind::Plain {
            text: content.to_string(),
        }
    }
}

/// Prefixes that mark non-dialogue tokens at encode time. A bare prefix is
/// enough here ("BG" also covers "BGM"); the classifier's stricter
/// full-token shapes only matter on the decode side.
pub fn has_resource_prefix(content: &str) -> bool {
    if content.starts_with('%') {
        return true;
    }
    ["DAY", "BG", "ST", "HOS", "SE"]
        .iter()
        .any(|prefix| starts_with_ignore_case(content, prefix))
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len()
        && text.is_char_boundary(prefix.len())
        && text[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// Encode a record back to container bytes: marker prefix, encoded content,
/// null terminator. Empty content collapses to a lone terminator.
pub fn encode_record(kind: &RecordKind) -> Vec<u8> {
    match kind {
        RecordKind::Speaker { name } => {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return vec![0];
            }
            let mut out = vec![SPEAKER_MARKER, SPEAKER_MARKER];
            out.extend_from_slice(&encode_any(trimmed));
            out.push(0);
            out
        }
        RecordKind::Narration { text } => {
            if text.trim().is_empty() {
                return vec![0];
            }
            let mut out = vec![SPEAKER_MARKER];
            out.extend_from_slice(&encode_any(text));
            out.push(0);
            out
        }
        RecordKind::Plain { text } => {
            if text.trim().is_empty() {
                return vec![0];
            }
            let mut out = encode_any(text);
            out.push(0);
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_strings;
    use crate::text::encode_any;

    fn single_record(data: &[u8]) -> ByteRecord {
        let records = extract_strings(data);
        assert_eq!(records.len(), 1);
        records.into_iter().next().unwrap()
    }

    #[test]
    fn double_marker_resolves_to_speaker() {
        let mut data = vec![SPEAKER_MARKER, SPEAKER_MARKER];
        data.extend_from_slice(&encode_any("\u{7F8E}\u{91CC}"));
        data.push(0);

        let kind = resolve_record(&single_record(&data));
        assert_eq!(
            kind,
            RecordKind::Speaker {
                name: "\u{7F8E}\u{91CC}".to_string()
            }
        );
        assert_eq!(kind.transcript_line(), ".\u{7F8E}\u{91CC}");
    }

    #[test]
    fn triple_marker_still_resolves_to_speaker() {
        let mut data = vec![SPEAKER_MARKER, SPEAKER_MARKER, SPEAKER_MARKER];
        data.extend_from_slice(&encode_any("\u{591C}\u{4E45}"));
        data.push(0);

        let kind = resolve_record(&single_record(&data));
        assert!(kind.is_speaker());
    }

    #[test]
    fn single_marker_resolves_to_narration() {
        let mut data = vec![SPEAKER_MARKER];
        data.extend_from_slice(&encode_any("\u{3053}\u{3093}\u{306B}\u{3061}\u{306F}"));
        data.push(0);

        let kind = resolve_record(&single_record(&data));
        assert_eq!(
            kind,
            RecordKind::Narration {
                text: "\u{3053}\u{3093}\u{306B}\u{3061}\u{306F}".to_string()
            }
        );
    }

    #[test]
    fn unmarked_record_resolves_to_plain() {
        let kind = resolve_record(&single_record(b"DAY0904\x00"));
        assert_eq!(
            kind,
            RecordKind::Plain {
                text: "DAY0904".to_string()
            }
        );
    }

    #[test]
    fn all_marker_record_passes_through_as_plain() {
        let record = single_record(&[SPEAKER_MARKER, 0]);
        let kind = resolve_record(&record);
        assert_eq!(
            kind,
            RecordKind::Plain {
                text: record.decoded
            }
        );
    }

    #[test]
    fn speaker_round_trip_reproduces_bytes() {
        let name = "\u{7F8E}\u{91CC}";
        let mut data = vec![SPEAKER_MARKER, SPEAKER_MARKER];
        data.extend_from_slice(&encode_any(name));
        data.push(0);

        let kind = resolve_record(&single_record(&data));
        assert_eq!(encode_record(&kind), data);
    }

    #[test]
    fn narration_round_trip_reproduces_bytes() {
        let text = "\u{4ECA}\u{65E5}\u{306F}\u{826F}\u{3044}\u{5929}\u{6C17}";
        let mut data = vec![SPEAKER_MARKER];
        data.extend_from_slice(&encode_any(text));
        data.push(0);

        let kind = resolve_record(&single_record(&data));
        let rebuilt = encode_record(&infer_kind(&kind.transcript_line(), kind.is_speaker()));
        assert_eq!(rebuilt, data);
    }

    #[test]
    fn inference_marks_japanese_without_prefix_as_narration() {
        let kind = infer_kind("\u{3053}\u{3093}\u{306B}\u{3061}\u{306F}", false);
        assert!(matches!(kind, RecordKind::Narration { .. }));
    }

    #[test]
    fn inference_keeps_resource_tokens_plain() {
        assert!(matches!(
            infer_kind("DAY0904", false),
            RecordKind::Plain { .. }
        ));
        assert!(matches!(
            infer_kind("%K%P", false),
            RecordKind::Plain { .. }
        ));
        // Japanese content behind a resource prefix stays plain: the
        // transcript format cannot distinguish it from a resource token.
        assert!(matches!(
            infer_kind("BG\u{30C6}\u{30B9}\u{30C8}", false),
            RecordKind::Plain { .. }
        ));
    }

    #[test]
    fn empty_speaker_collapses_to_terminator() {
        let kind = RecordKind::Speaker {
            name: "  ".to_string(),
        };
        assert_eq!(encode_record(&kind), vec![0]);
    }
}
