//! Wide CSV parser with encoding auto-detection.
//!
//! Converts CSV bytes into ordered [`Row`]s. Quoting follows RFC 4180 via the
//! `csv` crate, so country names such as `"Korea, South"` stay in one field.
//! No time-series logic here.

use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::models::Row;

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Parsed rows, fields in header order
    pub rows: Vec<Row>,
    /// Detected or used encoding
    pub encoding: String,
    /// Column headers
    pub headers: Vec<String>,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => match String::from_utf8(bytes.to_vec()) {
            Ok(s) => s,
            Err(_) => String::from_utf8_lossy(bytes).to_string(),
        },
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.to_string()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.to_string(),
        other => {
            let Some(enc) = encoding_rs::Encoding::for_label(other.as_bytes()) else {
                // Fallback: UTF-8 with lossy conversion
                return Ok(String::from_utf8_lossy(bytes).to_string());
            };
            let (text, _, had_errors) = enc.decode(bytes);
            if had_errors {
                return Err(CsvError::EncodingError {
                    encoding: other.to_string(),
                    message: "malformed byte sequence".to_string(),
                });
            }
            text.to_string()
        }
    };
    Ok(decoded)
}

/// Parse CSV bytes with encoding auto-detection.
pub fn parse_bytes(bytes: &[u8]) -> CsvResult<ParseResult> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(CsvError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;

    let (headers, rows) = parse_content(&content)?;

    Ok(ParseResult {
        rows,
        encoding,
        headers,
    })
}

/// Parse an already decoded CSV string.
///
/// # Example
/// ```ignore
/// use racoon::parser::parse_str;
///
/// let csv = "Province/State,Country/Region,1/22/2020\n,Germany,0";
/// let result = parse_str(csv).unwrap();
///
/// assert_eq!(result.rows.len(), 1);
/// assert_eq!(result.rows[0].get("Country/Region"), Some("Germany"));
/// ```
pub fn parse_str(content: &str) -> CsvResult<ParseResult> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }
    let (headers, rows) = parse_content(content)?;
    Ok(ParseResult {
        rows,
        encoding: "utf-8".to_string(),
        headers,
    })
}

/// Parse a CSV file from disk.
pub fn parse_file<P: AsRef<Path>>(path: P) -> CsvResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes(&bytes)
}

/// Split content into header and rows.
///
/// Rows shorter than the header only carry the cells they have; cells past
/// the last header column are ignored.
fn parse_content(content: &str) -> CsvResult<(Vec<String>, Vec<Row>)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(to_parse_error)?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::NoHeaders);
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(to_parse_error)?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.as_str(), v))
            .collect();
        rows.push(row);
    }

    Ok((headers, rows))
}

fn to_parse_error(err: csv::Error) -> CsvError {
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    CsvError::ParseError {
        line,
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "Province/State,Country/Region,Lat,Long,1/22/2020,1/23/2020
,Afghanistan,33.0,65.0,0,0
Bavaria,Germany,48.7,11.4,0,1
,\"Korea, South\",36.0,128.0,1,1
";

    #[test]
    fn test_simple_csv() {
        let result = parse_str(SAMPLE).unwrap();

        assert_eq!(result.rows.len(), 3);
        assert_eq!(result.headers.len(), 6);
        assert_eq!(result.rows[1].get("Province/State"), Some("Bavaria"));
        assert_eq!(result.rows[1].get("1/23/2020"), Some("1"));
    }

    #[test]
    fn test_quoted_country_kept_whole() {
        let result = parse_str(SAMPLE).unwrap();
        assert_eq!(result.rows[2].get("Country/Region"), Some("Korea, South"));
        assert_eq!(result.rows[2].get("Lat"), Some("36.0"));
    }

    #[test]
    fn test_empty_lines_skipped() {
        let csv = "Country/Region,1/22/2020\nA,1\n\nB,2\n";
        let result = parse_str(csv).unwrap();
        assert_eq!(result.rows.len(), 2);
    }

    #[test]
    fn test_short_row_has_missing_cells_absent() {
        let csv = "Country/Region,1/22/2020,1/23/2020\nA,1\n";
        let result = parse_str(csv).unwrap();

        assert_eq!(result.rows[0].len(), 2);
        assert_eq!(result.rows[0].get("1/23/2020"), None);
    }

    #[test]
    fn test_extra_columns_ignored() {
        let csv = "Country/Region,1/22/2020\nA,1,2,3\n";
        let result = parse_str(csv).unwrap();
        assert_eq!(result.rows[0].len(), 2);
    }

    #[test]
    fn test_empty_csv_error() {
        assert!(matches!(parse_str(""), Err(CsvError::EmptyFile)));
        assert!(matches!(parse_bytes(b"  \n"), Err(CsvError::EmptyFile)));
    }

    #[test]
    fn test_blank_header_error() {
        assert!(matches!(parse_str(",,\n1,2,3\n"), Err(CsvError::NoHeaders)));
    }

    #[test]
    fn test_parse_bytes_detects_utf8() {
        let result = parse_bytes(SAMPLE.as_bytes()).unwrap();
        assert_eq!(result.encoding, "utf-8");
        assert_eq!(result.rows.len(), 3);
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1").unwrap();
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_parse_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let result = parse_file(file.path()).unwrap();
        assert_eq!(result.rows.len(), 3);
    }
}
