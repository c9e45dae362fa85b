use std::collections::HashSet;

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, BIG5, GBK, MACINTOSH, UTF_8, WINDOWS_1252};

/// Field separator chosen for a delimited text file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Byte(u8),
    Whitespace,
}

impl Delimiter {
    pub fn label(&self) -> &'static str {
        match self {
            Delimiter::Byte(b'\t') => "tab",
            Delimiter::Byte(b',') => "comma",
            Delimiter::Byte(b';') => "semicolon",
            Delimiter::Byte(_) => "custom",
            Delimiter::Whitespace => "whitespace",
        }
    }

    fn split<'a>(&self, line: &'a str) -> Vec<&'a str> {
        match self {
            Delimiter::Byte(b) => line.split(*b as char).collect(),
            Delimiter::Whitespace => line.split_whitespace().collect(),
        }
    }
}

const DELIMITER_CANDIDATES: [Delimiter; 4] = [
    Delimiter::Byte(b'\t'),
    Delimiter::Byte(b','),
    Delimiter::Byte(b';'),
    Delimiter::Whitespace,
];

/// Pick the separator from the header line and the first data line.
///
/// The first candidate that splits the header into more than one field and
/// gives the data line the same field count wins. Falls back to whitespace.
pub fn detect_delimiter(header_line: &str, data_line: &str) -> Delimiter {
    DELIMITER_CANDIDATES
        .into_iter()
        .find(|delim| {
            let header = delim.split(header_line.trim());
            let data = delim.split(data_line.trim());
            header.len() > 1 && header.len() == data.len()
        })
        .unwrap_or(Delimiter::Whitespace)
}

/// Decode file bytes. A BOM wins; otherwise the encoding guessed from the
/// content is tried first, then UTF-8, Windows-1252, GBK, Big5 and Mac Roman
/// in that order. Returns the text and the encoding used.
pub fn decode_text(bytes: &[u8]) -> (String, &'static Encoding) {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return (text.into_owned(), encoding);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let guessed = detector.guess(None, true);
    let fallbacks = [UTF_8, WINDOWS_1252, GBK, BIG5, MACINTOSH];

    std::iter::once(guessed)
        .chain(fallbacks)
        .find_map(|encoding| {
            encoding
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|text| (text.into_owned(), encoding))
        })
        .unwrap_or_else(|| {
            let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
            (text.into_owned(), WINDOWS_1252)
        })
}

/// Collapse whitespace runs and trim.
pub fn clean_column_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Repair the mojibake that GBK-exported instrument headers turn into when
/// read as Latin-1.
pub fn fix_garbled(name: &str) -> String {
    name.replace("¦È", "θ")
        .replace("¡ã", "°")
        .replace("¦¸", "Ω")
        .replace('Â', "")
        .trim()
        .to_string()
}

/// Clean every header and make the names unique: repeats get `.1`, `.2`, …
pub fn normalize_headers<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut names = Vec::with_capacity(raw.len());
    for (i, r) in raw.iter().enumerate() {
        let mut name = fix_garbled(&clean_column_name(r.as_ref()));
        if name.is_empty() {
            name = format!("Column {}", i + 1);
        }
        let mut candidate = name.clone();
        let mut suffix = 0;
        while seen.contains(&candidate) {
            suffix += 1;
            candidate = format!("{name}.{suffix}");
        }
        seen.insert(candidate.clone());
        names.push(candidate);
    }
    names
}

const LATEX_SYMBOLS: [(&str, &str); 8] = [
    (r"\theta", "\u{03B8}"),
    (r"\mu", "\u{03BC}"),
    (r"\Omega", "\u{03A9}"),
    (r"\alpha", "\u{03B1}"),
    (r"\beta", "\u{03B2}"),
    (r"\gamma", "\u{03B3}"),
    (r"\Delta", "\u{0394}"),
    (r"\sigma", "\u{03C3}"),
];

/// Display form of a column name with LaTeX symbol commands replaced.
pub fn latex_to_unicode(name: &str) -> String {
    LATEX_SYMBOLS
        .iter()
        .fold(name.to_string(), |acc, (k, v)| acc.replace(k, v))
}

/// Split one line with the chosen delimiter (used for whitespace files,
/// which the csv reader cannot express).
pub fn split_fields(line: &str, delimiter: Delimiter) -> Vec<String> {
    delimiter
        .split(line.trim())
        .into_iter()
        .map(|s| s.trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_common_delimiters() {
        assert_eq!(detect_delimiter("a\tb", "1\t2"), Delimiter::Byte(b'\t'));
        assert_eq!(detect_delimiter("a,b,c", "1,2,3"), Delimiter::Byte(b','));
        assert_eq!(detect_delimiter("a;b", "1;2"), Delimiter::Byte(b';'));
        assert_eq!(detect_delimiter("Field  Moment", "1.0   2.0"), Delimiter::Whitespace);
    }

    #[test]
    fn mismatched_counts_fall_through() {
        // Comma header but the data line only has one comma-field.
        assert_eq!(detect_delimiter("a,b", "1 2"), Delimiter::Whitespace);
    }

    #[test]
    fn headers_are_cleaned_and_deduplicated() {
        let names = normalize_headers(&["  Field   (Oe) ", "M", "M", "", "M"]);
        assert_eq!(names, vec!["Field (Oe)", "M", "M.1", "Column 4", "M.2"]);
        let names = normalize_headers(&["M", "M.1", "M"]);
        assert_eq!(names, vec!["M", "M.1", "M.2"]);
    }

    #[test]
    fn garbled_units_are_repaired() {
        assert_eq!(fix_garbled("2¦È (¡ã)"), "2θ (°)");
        assert_eq!(fix_garbled("R (¦¸)Â"), "R (Ω)");
    }

    #[test]
    fn latex_symbols_map_to_unicode() {
        assert_eq!(latex_to_unicode(r"\mu_0 H (\Omega)"), "μ_0 H (Ω)");
        assert_eq!(latex_to_unicode("plain"), "plain");
    }

    #[test]
    fn bom_selects_the_encoding() {
        assert_eq!(decode_text(b"\xEF\xBB\xBFa,b"), ("a,b".to_string(), UTF_8));
        let (text, encoding) = decode_text(b"\xFF\xFEa\x00,\x00b\x00");
        assert_eq!(text, "a,b");
        assert_eq!(encoding, encoding_rs::UTF_16LE);
    }

    #[test]
    fn plain_utf8_is_kept() {
        let (text, encoding) = decode_text("Temperature (°C),Moment (emu)\n".as_bytes());
        assert_eq!(text, "Temperature (°C),Moment (emu)\n");
        assert_eq!(encoding, UTF_8);
    }

    #[test]
    fn western_single_byte_text_decodes() {
        let bytes = b"Temp\xE9rature (\xB0C),Moment magn\xE9tique (emu),Dur\xE9e (s)\n\
                      300,1.5e-3,12\n310,1.4e-3,24\n";
        let (text, _) = decode_text(bytes);
        assert!(text.starts_with("Température (°C),Moment magnétique (emu),Durée (s)"));
    }

    #[test]
    fn gbk_headers_decode() {
        let source = "温度 (K),磁场强度 (Oe),磁矩 (emu),样品名称\n\
                      # 样品测量数据，温度单位为开尔文，磁场单位为奥斯特\n\
                      300,1000,0.0015,铁氧体薄膜样品\n\
                      310,1000,0.0014,铁氧体薄膜样品\n";
        let (bytes, _, had_errors) = GBK.encode(source);
        assert!(!had_errors);
        let (text, _) = decode_text(&bytes);
        assert_eq!(text, source);
    }
}
