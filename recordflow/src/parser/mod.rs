//! Delimited text parsing with encoding and delimiter auto-detection.
//!
//! Turns raw bytes into [`Record`]s. Nothing here touches the filesystem; see
//! [`crate::files`] for that.

use serde_json::Value;

use crate::models::Record;

/// Bytes inspected when guessing the delimiter.
pub const DELIMITER_SAMPLE_BYTES: usize = 1024;

/// Delimiters considered by [`detect_delimiter`], in tie-break order.
pub const DELIMITER_CANDIDATES: [char; 4] = [',', ';', '\t', '|'];

/// Parsing error with context
#[derive(Debug, Clone)]
pub struct CsvError {
    pub line: usize,
    pub column: Option<String>,
    pub message: String,
}

impl std::fmt::Display for CsvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.column {
            Some(col) => write!(f, "Line {}, column '{}': {}", self.line, col, self.message),
            None if self.line > 0 => write!(f, "Line {}: {}", self.line, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for CsvError {}

impl CsvError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column: None,
            message: message.into(),
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }
}

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// One record per data row, keyed by header
    pub records: Vec<Record>,
    /// Encoding used to decode the bytes
    pub encoding: String,
    /// Detected delimiter
    pub delimiter: char,
    /// Column headers, in file order
    pub headers: Vec<String>,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes with the given encoding label.
///
/// `"auto"` runs [`detect_encoding`] first. A leading BOM is dropped; bytes
/// that are invalid in the chosen encoding are an error, not replaced.
pub fn decode_content(bytes: &[u8], encoding: &str) -> Result<(String, String), CsvError> {
    let label = if encoding.eq_ignore_ascii_case("auto") {
        detect_encoding(bytes)
    } else {
        encoding.to_string()
    };

    let codec = encoding_rs::Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| CsvError::new(0, format!("Unknown encoding: {}", label)))?;

    let (text, had_errors) = codec.decode_with_bom_removal(bytes);
    if had_errors {
        return Err(CsvError::new(
            0,
            format!("Content is not valid {}", codec.name()),
        ));
    }
    Ok((text.into_owned(), label))
}

/// Encode text for writing with the given encoding label.
///
/// `"auto"` only makes sense when reading, so writes use UTF-8 for it.
pub fn encode_content(text: &str, encoding: &str) -> Result<Vec<u8>, CsvError> {
    let codec = if encoding.trim().eq_ignore_ascii_case("auto") {
        encoding_rs::UTF_8
    } else {
        encoding_rs::Encoding::for_label(encoding.trim().as_bytes())
            .ok_or_else(|| CsvError::new(0, format!("Unknown encoding: {}", encoding)))?
    };

    // encoding_rs never encodes to UTF-16; those labels fall back to UTF-8.
    let (bytes, _, had_errors) = codec.encode(text);
    if had_errors {
        return Err(CsvError::new(
            0,
            format!("Content cannot be represented in {}", codec.name()),
        ));
    }
    Ok(bytes.into_owned())
}

/// Guess the delimiter from the first [`DELIMITER_SAMPLE_BYTES`] of `content`.
///
/// A candidate that appears the same, non-zero number of times on every
/// sampled line wins (highest count first). Otherwise the candidate most
/// frequent on the first line is used, and `,` when nothing matches at all.
pub fn detect_delimiter(content: &str) -> char {
    let mut end = content.len().min(DELIMITER_SAMPLE_BYTES);
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    let sample = &content[..end];
    let truncated = end < content.len();

    let mut lines: Vec<&str> = sample.lines().filter(|l| !l.trim().is_empty()).collect();
    if truncated && lines.len() > 1 {
        // the last sampled line is probably cut short
        lines.pop();
    }

    let Some(first_line) = lines.first() else {
        return ',';
    };

    let mut best_consistent: Option<(char, usize)> = None;
    for &sep in &DELIMITER_CANDIDATES {
        let first = count_unquoted(first_line, sep);
        if first == 0 {
            continue;
        }
        let consistent = lines.iter().all(|line| count_unquoted(line, sep) == first);
        if consistent && best_consistent.map_or(true, |(_, count)| first > count) {
            best_consistent = Some((sep, first));
        }
    }
    if let Some((sep, _)) = best_consistent {
        return sep;
    }

    let mut best_sep = ',';
    let mut best_count = 0;
    for &sep in &DELIMITER_CANDIDATES {
        let count = count_unquoted(first_line, sep);
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }
    best_sep
}

/// Occurrences of `sep` outside double-quoted sections.
fn count_unquoted(line: &str, sep: char) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for c in line.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == sep && !in_quotes {
            count += 1;
        }
    }
    count
}

/// Parse delimited text into records.
///
/// Every record carries every header: short rows get `null` for the missing
/// trailing cells, extra cells are dropped, blank lines are skipped.
pub fn parse_delimited(content: &str, delimiter: char) -> Result<(Vec<String>, Vec<Record>), CsvError> {
    if content.trim().is_empty() {
        return Err(CsvError::new(1, "Empty CSV file"));
    }
    let delimiter = u8::try_from(delimiter)
        .map_err(|_| CsvError::new(0, format!("Unsupported delimiter '{}'", delimiter)))?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| CsvError::new(1, format!("Cannot read header: {}", e)))?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(CsvError::new(1, "No headers found"));
    }

    let mut records = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        let row = row.map_err(|e| {
            let line = e.position().map(|p| p.line() as usize).unwrap_or(idx + 2);
            CsvError::new(line, format!("Cannot read line: {}", e))
        })?;

        let record: Record = headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let value = row
                    .get(i)
                    .map(|cell| Value::String(cell.to_string()))
                    .unwrap_or(Value::Null);
                (header.clone(), value)
            })
            .collect();
        records.push(record);
    }

    Ok((headers, records))
}

/// Decode, detect the delimiter and parse in one go.
pub fn parse_bytes_auto(bytes: &[u8], encoding: &str) -> Result<ParseResult, CsvError> {
    let (content, encoding) = decode_content(bytes, encoding)?;
    let delimiter = detect_delimiter(&content);
    let (headers, records) = parse_delimited(&content, delimiter)?;

    Ok(ParseResult {
        records,
        encoding,
        delimiter,
        headers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_csv() {
        let (headers, rows) = parse_delimited("name;age\nAlice;30\nBob;25", ';').unwrap();

        assert_eq!(headers, vec!["name", "age"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], "Alice");
        assert_eq!(rows[0]["age"], "30");
        assert_eq!(rows[1]["name"], "Bob");
    }

    #[test]
    fn test_quoted_values_keep_delimiters() {
        let csv = "name,note\n\"Doe, John\",\"said \"\"hi\"\"\"";
        let (_, rows) = parse_delimited(csv, ',').unwrap();

        assert_eq!(rows[0]["name"], "Doe, John");
        assert_eq!(rows[0]["note"], "said \"hi\"");
    }

    #[test]
    fn test_empty_lines_skipped() {
        let (_, rows) = parse_delimited("a,b\n1,2\n\n3,4\n", ',').unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_missing_trailing_values_are_null() {
        let (_, rows) = parse_delimited("a,b,c\n1,,\n4", ',').unwrap();

        assert_eq!(rows[0]["a"], "1");
        assert_eq!(rows[0]["b"], "");
        assert_eq!(rows[1]["a"], "4");
        assert_eq!(rows[1]["b"], Value::Null);
        assert_eq!(rows[1]["c"], Value::Null);
        assert_eq!(rows[1].len(), 3);
    }

    #[test]
    fn test_extra_columns_ignored() {
        let (_, rows) = parse_delimited("a;b\n1;2;3;4", ';').unwrap();

        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[0]["b"], "2");
    }

    #[test]
    fn test_empty_csv_error() {
        let err = parse_delimited("", ',').unwrap_err();
        assert!(err.message.contains("Empty"));
    }

    #[test]
    fn test_error_message_format() {
        let err = CsvError::new(5, "Invalid value").with_column("age");
        let msg = err.to_string();
        assert!(msg.contains("Line 5"));
        assert!(msg.contains("column 'age'"));
    }

    #[test]
    fn test_detect_delimiter_candidates() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
    }

    #[test]
    fn test_detect_delimiter_prefers_consistent_columns() {
        // commas inside the note column vary per line, semicolons do not
        let content = "name;note\nAnn;a, b, c\nBob;d\n";
        assert_eq!(detect_delimiter(content), ';');
    }

    #[test]
    fn test_detect_delimiter_ignores_quoted_separators() {
        let content = "name,city\n\"Doe; John\",Paris\n\"Roe; Jane\",Oslo\n";
        assert_eq!(detect_delimiter(content), ',');
    }

    #[test]
    fn test_detect_delimiter_single_column_defaults_to_comma() {
        assert_eq!(detect_delimiter("name\nAnn\nBob"), ',');
        assert_eq!(detect_delimiter(""), ',');
    }

    #[test]
    fn test_auto_parse() {
        let result = parse_bytes_auto(b"name;age\nAlice;30\nBob;25", "utf-8").unwrap();

        assert_eq!(result.delimiter, ';');
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.headers, vec!["name", "age"]);
        assert_eq!(result.encoding, "utf-8");
    }

    #[test]
    fn test_bom_is_removed() {
        let bytes = b"\xEF\xBB\xBFname,age\nAnn,3";
        let result = parse_bytes_auto(bytes, "utf-8").unwrap();
        assert_eq!(result.headers[0], "name");
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let (decoded, _) = decode_content(bytes, "iso-8859-1").unwrap();
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_invalid_utf8_is_an_error() {
        let bytes: &[u8] = &[0x61, 0xFF, 0xFE, 0x62];
        assert!(decode_content(bytes, "utf-8").is_err());
        assert!(decode_content(b"abc", "no-such-encoding").is_err());
    }

    #[test]
    fn test_encode_auto_is_utf8() {
        assert_eq!(encode_content("Zoë", "auto").unwrap(), "Zoë".as_bytes());
        assert_eq!(encode_content("x", " AUTO ").unwrap(), b"x");
        assert!(encode_content("x", "no-such-encoding").is_err());
    }

    #[test]
    fn test_encode_round_trip_latin1() {
        let bytes = encode_content("Société", "iso-8859-1").unwrap();
        assert_eq!(bytes.len(), 7);
        let (text, _) = decode_content(&bytes, "iso-8859-1").unwrap();
        assert_eq!(text, "Société");
    }
}
