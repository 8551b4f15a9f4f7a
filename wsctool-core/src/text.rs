use encoding_rs::SHIFT_JIS;

/// Encodings attempted when decoding raw script bytes, in priority order.
///
/// CP932 and ShiftJis both resolve to the WHATWG Shift-JIS decoder (which
/// implements windows-31j); both tags are kept so the priority list matches
/// the engine's documented decode order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Cp932,
    ShiftJis,
    Utf8,
    Latin1,
}

impl TextEncoding {
    pub fn label(self) -> &'static str {
        match self {
            TextEncoding::Cp932 => "cp932",
            TextEncoding::ShiftJis => "shift_jis",
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Latin1 => "latin-1",
        }
    }
}

/// Strict decode attempts, tried in order. Latin-1 is not listed: it is the
/// guaranteed fallback and cannot fail.
pub const DECODE_PRIORITY: &[TextEncoding] =
    &[TextEncoding::Cp932, TextEncoding::ShiftJis, TextEncoding::Utf8];

/// Strict encode attempts, tried in order. Lossy Latin-1 is the final,
/// total fallback.
pub const ENCODE_PRIORITY: &[TextEncoding] =
    &[TextEncoding::Cp932, TextEncoding::ShiftJis, TextEncoding::Latin1];

fn decode_strict(encoding: TextEncoding, raw: &[u8]) -> Option<String> {
    match encoding {
        TextEncoding::Cp932 | TextEncoding::ShiftJis => SHIFT_JIS
            .decode_without_bom_handling_and_without_replacement(raw)
            .map(|s| s.into_owned()),
        TextEncoding::Utf8 => std::str::from_utf8(raw).ok().map(str::to_owned),
        TextEncoding::Latin1 => Some(decode_latin1(raw)),
    }
}

/// Decode a byte slice, trying each candidate in `DECODE_PRIORITY` and
/// falling back to Latin-1. Never fails: every byte slice produces text.
pub fn decode_any(raw: &[u8]) -> (String, TextEncoding) {
    for &encoding in DECODE_PRIORITY {
        if let Some(text) = decode_strict(encoding, raw) {
            return (text, encoding);
        }
    }
    (decode_latin1(raw), TextEncoding::Latin1)
}

/// Latin-1 maps every byte to the code point of the same value, so this is
/// total and byte-preserving.
pub fn decode_latin1(raw: &[u8]) -> String {
    raw.iter().map(|&b| char::from(b)).collect()
}

/// Strict encode: `None` when any character is unmappable in `encoding`.
pub fn encode_strict(encoding: TextEncoding, text: &str) -> Option<Vec<u8>> {
    match encoding {
        TextEncoding::Cp932 | TextEncoding::ShiftJis => {
            let (bytes, _, had_errors) = SHIFT_JIS.encode(text);
            if had_errors {
                None
            } else {
                Some(bytes.into_owned())
            }
        }
        TextEncoding::Utf8 => Some(text.as_bytes().to_vec()),
        TextEncoding::Latin1 => {
            let mut out = Vec::with_capacity(text.len());
            for c in text.chars() {
                let v = u32::from(c);
                if v > 0xFF {
                    return None;
                }
                out.push(v as u8);
            }
            Some(out)
        }
    }
}

/// Encode text for the container, trying each candidate in `ENCODE_PRIORITY`
/// and finishing with lossy Latin-1. Never fails.
pub fn encode_any(text: &str) -> Vec<u8> {
    for &encoding in ENCODE_PRIORITY {
        if let Some(bytes) = encode_strict(encoding, text) {
            return bytes;
        }
    }
    encode_latin1_lossy(text)
}

/// Lossy Latin-1: characters above U+00FF become `?`.
pub fn encode_latin1_lossy(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| {
            let v = u32::from(c);
            if v > 0xFF {
                b'?'
            } else {
                v as u8
            }
        })
        .collect()
}

/// CJK detection ranges: ideographic punctuation, hiragana, katakana, and
/// the unified ideograph block.
pub fn is_cjk_char(c: char) -> bool {
    matches!(c,
        '\u{3000}'..='\u{303F}'
        | '\u{3040}'..='\u{309F}'
        | '\u{30A0}'..='\u{30FF}'
        | '\u{4E00}'..='\u{9FFF}')
}

pub fn contains_japanese(text: &str) -> bool {
    text.chars().any(is_cjk_char)
}

/// Characters permitted in a speaker name: kana and ideographs, no
/// punctuation.
pub fn is_name_char(c: char) -> bool {
    matches!(c, '\u{3040}'..='\u{30FF}' | '\u{4E00}'..='\u{9FFF}')
}

/// Speaker-name shape: 1 to 8 characters, all kana or ideographs.
pub fn is_japanese_name(text: &str) -> bool {
    let count = text.chars().count();
    (1..=8).contains(&count) && text.chars().all(is_name_char)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_ascii_as_cp932() {
        let (text, encoding) = decode_any(b"DAY0904");
        assert_eq!(text, "DAY0904");
        assert_eq!(encoding, TextEncoding::Cp932);
    }

    #[test]
    fn decodes_round_trips_shift_jis() {
        let bytes = encode_any("\u{3053}\u{3093}\u{306B}\u{3061}\u{306F}");
        let (text, encoding) = decode_any(&bytes);
        assert_eq!(text, "\u{3053}\u{3093}\u{306B}\u{3061}\u{306F}");
        assert_eq!(encoding, TextEncoding::Cp932);
    }

    #[test]
    fn never_fails_on_arbitrary_bytes() {
        // 0xFF is not a valid Shift-JIS lead byte and not valid UTF-8; the
        // Latin-1 fallback must pick it up.
        let (text, encoding) = decode_any(&[0x80, 0xFF, 0x80]);
        assert_eq!(encoding, TextEncoding::Latin1);
        assert_eq!(text.chars().count(), 3);
    }

    #[test]
    fn never_fails_on_empty_slice() {
        let (text, encoding) = decode_any(b"");
        assert_eq!(text, "");
        assert_eq!(encoding, TextEncoding::Cp932);
    }

    #[test]
    fn latin1_decode_preserves_bytes() {
        let raw: Vec<u8> = (0u8..=255).collect();
        let text = decode_latin1(&raw);
        assert_eq!(encode_latin1_lossy(&text), raw);
    }

    #[test]
    fn strict_encode_rejects_unmappable() {
        // U+20AC has no CP932 mapping and is above the Latin-1 range.
        assert_eq!(encode_strict(TextEncoding::Cp932, "\u{20AC}"), None);
        assert_eq!(encode_strict(TextEncoding::Latin1, "\u{20AC}"), None);
    }

    #[test]
    fn encode_any_replaces_unmappable() {
        assert_eq!(encode_any("a\u{20AC}b"), b"a?b".to_vec());
    }

    #[test]
    fn name_shape_accepts_kana_and_ideographs() {
        assert!(is_japanese_name("\u{7F8E}\u{91CC}"));
        assert!(is_japanese_name("\u{30DF}\u{30B5}\u{30C8}"));
        assert!(!is_japanese_name(""));
        assert!(!is_japanese_name("Misato"));
        // Ideographic punctuation is CJK but not a name character.
        assert!(contains_japanese("\u{3002}"));
        assert!(!is_japanese_name("\u{7F8E}\u{3002}"));
        // Nine characters is one past the name limit.
        assert!(!is_japanese_name("\u{3042}\u{3042}\u{3042}\u{3042}\u{3042}\u{3042}\u{3042}\u{3042}\u{3042}"));
    }
}
