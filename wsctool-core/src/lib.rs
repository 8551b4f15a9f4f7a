use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod classify;
pub mod extract;
pub mod reconcile;
pub mod speaker;
pub mod text;
pub mod transcript;
pub mod validate;

pub use classify::ClassifierConfig;
pub use extract::ByteRecord;
pub use speaker::RecordKind;
pub use transcript::Entry;
pub use validate::{Strictness, ValidationResult};

#[derive(Debug, Error)]
pub enum WscError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid transcript: {0}")]
    InvalidTranscript(ValidationResult),
}

pub type Result<T> = std::result::Result<T, WscError>;

/// Options for transcript-to-container reconstruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecompileOptions {
    /// Keep original byte offsets when no entry's length changed.
    pub preserve_offsets: bool,
    /// Whether unencodable content is an error or a warning.
    pub strictness: Strictness,
}

impl Default for RecompileOptions {
    fn default() -> Self {
        Self {
            preserve_offsets: true,
            strictness: Strictness::Lenient,
        }
    }
}

/// Counts reported by a decompilation pass.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DecompileSummary {
    pub total_records: usize,
    pub kept_records: usize,
}

/// A reconstructed container plus the validation findings that accompanied
/// it.
#[derive(Debug, Clone)]
pub struct Recompiled {
    pub data: Vec<u8>,
    pub report: ValidationResult,
}

/// Convert container bytes to transcript text.
///
/// Total: records the classifier cannot place are omitted, never reported.
pub fn decompile(data: &[u8]) -> String {
    decompile_with_summary(data).0
}

/// `decompile`, also reporting how many records were extracted and kept.
pub fn decompile_with_summary(data: &[u8]) -> (String, DecompileSummary) {
    let config = ClassifierConfig::default();
    let records = extract::extract_strings(data);
    let total_records = records.len();

    let mut out = String::new();
    let mut kept_records = 0usize;
    for record in &records {
        if !classify::is_meaningful(&record.decoded, &record.raw, &config) {
            continue;
        }
        kept_records += 1;
        let kind = speaker::resolve_record(record);
        out.push_str(&transcript::render_record(record.start, record.end, &kind));
    }

    debug!(
        total_records,
        kept_records,
        dropped = total_records - kept_records,
        "decompiled container"
    );

    (
        out,
        DecompileSummary {
            total_records,
            kept_records,
        },
    )
}

/// Convert transcript text back to container bytes.
///
/// Fails without producing a binary when the transcript has structural
/// errors (or, on the strict path, unencodable content); otherwise succeeds
/// and carries all warnings and suggestions in the report.
pub fn recompile(text: &str, options: &RecompileOptions) -> Result<Recompiled> {
    let (mut entries, parse_result) = transcript::parse_transcript(text);
    if !parse_result.is_valid {
        return Err(WscError::InvalidTranscript(parse_result));
    }

    let mut report = parse_result;
    report.merge(validate::validate_entries(&entries, options.strictness));
    report.merge(validate::validate_offsets(&entries));
    if !report.is_valid {
        return Err(WscError::InvalidTranscript(report));
    }

    let outcome = reconcile::reconstruct(&mut entries, options.preserve_offsets);
    report.add_suggestion(format!("Successfully recompiled {} entries", entries.len()));
    if options.preserve_offsets && outcome.recalculated {
        report.add_warning("Offsets were recalculated due to content changes".to_string());
    }

    Ok(Recompiled {
        data: outcome.data,
        report,
    })
}

/// Comprehensive validation without reconstruction.
pub fn validate_transcript(text: &str, strictness: Strictness) -> ValidationResult {
    let (mut entries, parse_result) = transcript::parse_transcript(text);
    let mut result = validate::comprehensive_validation(text, &mut entries, strictness);
    result.merge(parse_result);
    result
}

/// Decompile one container file to a transcript file.
pub fn decompile_file(input: &Path, output: &Path) -> Result<DecompileSummary> {
    let data = fs::read(input)?;
    let (text, summary) = decompile_with_summary(&data);
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, text)?;
    Ok(summary)
}

/// Recompile one transcript file to a container file. The output is
/// written only after the whole transcript has been processed.
pub fn recompile_file(
    input: &Path,
    output: &Path,
    options: &RecompileOptions,
) -> Result<ValidationResult> {
    let text = fs::read_to_string(input)?;
    let recompiled = recompile(&text, options)?;
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, &recompiled.data)?;
    Ok(recompiled.report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speaker::SPEAKER_MARKER;
    use crate::text::encode_any;

    const SPEAKER_NAME: &str = "\u{7F8E}\u{91CC}";
    const NARRATION: &str = "\u{3053}\u{3093}\u{306B}\u{3061}\u{306F}\u{4E16}\u{754C}";

    /// Container with a resource id, a speaker name, a narration line, an
    /// audio name, and two garbage tokens.
    fn sample_container() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"DAY0904\x00");
        data.extend_from_slice(&[SPEAKER_MARKER, SPEAKER_MARKER]);
        data.extend_from_slice(&encode_any(SPEAKER_NAME));
        data.push(0);
        data.push(SPEAKER_MARKER);
        data.extend_from_slice(&encode_any(NARRATION));
        data.push(0);
        data.extend_from_slice(b"SE_104.ogg\x00");
        data.extend_from_slice(b"I\x00");
        data.extend_from_slice(b"\x01\x02\x00");
        data
    }

    fn content_lines(text: &str) -> Vec<&str> {
        let lines: Vec<&str> = text.lines().collect();
        lines
            .chunks(3)
            .filter(|c| c.len() >= 2)
            .map(|c| c[1])
            .collect()
    }

    #[test]
    fn decompiles_the_four_record_scenario() {
        let (text, summary) = decompile_with_summary(&sample_container());
        assert_eq!(summary.total_records, 6);
        assert_eq!(summary.kept_records, 4);

        let contents = content_lines(&text);
        assert_eq!(
            contents,
            vec![
                "DAY0904",
                format!(".{SPEAKER_NAME}").as_str(),
                NARRATION,
                "SE_104.ogg",
            ]
        );
    }

    #[test]
    fn garbage_never_reaches_the_transcript() {
        let text = decompile(&sample_container());
        assert!(!content_lines(&text).contains(&"I"));
        assert!(!text.contains('\u{1}'));
    }

    #[test]
    fn unmodified_round_trip_preserves_bytes_exactly() {
        // No garbage here: every record survives classification, so the
        // preserved-offset reconstruction must reproduce the input
        // byte for byte.
        let mut data = Vec::new();
        data.extend_from_slice(b"DAY0904\x00");
        data.extend_from_slice(&[SPEAKER_MARKER, SPEAKER_MARKER]);
        data.extend_from_slice(&encode_any(SPEAKER_NAME));
        data.push(0);
        data.push(SPEAKER_MARKER);
        data.extend_from_slice(&encode_any(NARRATION));
        data.push(0);
        data.extend_from_slice(b"SE_104.ogg\x00");

        let text = decompile(&data);
        let recompiled = recompile(&text, &RecompileOptions::default()).unwrap();
        assert_eq!(recompiled.data, data);
        assert!(recompiled.report.is_valid);
        assert!(!recompiled
            .report
            .warnings
            .iter()
            .any(|w| w.contains("recalculated")));
    }

    #[test]
    fn recompiled_scenario_splits_into_the_same_strings() {
        let text = decompile(&sample_container());
        let recompiled = recompile(
            &text,
            &RecompileOptions {
                preserve_offsets: false,
                strictness: Strictness::Lenient,
            },
        )
        .unwrap();

        let terminators = recompiled.data.iter().filter(|&&b| b == 0).count();
        assert_eq!(terminators, 4);

        let rebuilt = decompile(&recompiled.data);
        assert_eq!(content_lines(&rebuilt), content_lines(&text));
    }

    #[test]
    fn editing_one_entry_recalculates_all_offsets() {
        let data = {
            let mut d = Vec::new();
            d.extend_from_slice(b"DAY0904\x00");
            d.extend_from_slice(b"SE_104.ogg\x00");
            d.extend_from_slice(b"BGM_06\x00");
            d
        };
        let text = decompile(&data);

        // Lengthen the first entry's content.
        let edited = text.replacen("DAY0904", "DAY0904_EXTENDED", 1);
        let recompiled = recompile(&edited, &RecompileOptions::default()).unwrap();
        assert!(recompiled
            .report
            .warnings
            .iter()
            .any(|w| w.contains("recalculated")));

        // Every subsequent record sits at a shifted offset.
        let rebuilt_text = decompile(&recompiled.data);
        assert!(rebuilt_text.contains("<00000011:0000001B>"));
        assert!(!rebuilt_text.contains("<00000008:00000012>"));
    }

    #[test]
    fn recompile_rejects_structurally_broken_transcripts() {
        let err = recompile("not a transcript\n", &RecompileOptions::default()).unwrap_err();
        match err {
            WscError::InvalidTranscript(report) => {
                assert!(!report.is_valid);
                assert!(!report.errors.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn recompile_rejects_overlapping_offsets() {
        let text = "<00000000:00000007>\nDAY0904\n\n<00000003:0000000D>\nSE_104.ogg\n\n";
        let err = recompile(text, &RecompileOptions::default()).unwrap_err();
        match err {
            WscError::InvalidTranscript(report) => {
                assert!(report.errors.iter().any(|e| e.contains("overlap")));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn strict_mode_rejects_unencodable_content() {
        let text = "<00000000:00000003>\nab\u{20AC}\n\n";
        let strict = RecompileOptions {
            preserve_offsets: true,
            strictness: Strictness::Strict,
        };
        assert!(recompile(text, &strict).is_err());

        let lenient = RecompileOptions::default();
        let recompiled = recompile(text, &lenient).unwrap();
        assert!(recompiled
            .report
            .warnings
            .iter()
            .any(|w| w.contains("CP932")));
    }

    #[test]
    fn decompile_is_idempotent() {
        let data = sample_container();
        assert_eq!(decompile(&data), decompile(&data));
    }

    #[test]
    fn validate_transcript_reports_comprehensively() {
        let text = "<00000000:00000007>\nDAY0904\n\n<00000008:00000012>\nSE_104.ogg\n\n";
        let result = validate_transcript(text, Strictness::Strict);
        assert!(result.is_valid, "{:?}", result.errors);
    }
}
