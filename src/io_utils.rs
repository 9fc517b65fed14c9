//! I/O helpers for reading CSV input and writing reports.
//!
//! All file access in csv-insights flows through this module:
//!
//! - **Delimiter resolution**: extension-based auto-detection (`.tsv` → tab,
//!   anything else → comma) with manual override support.
//! - **Decoding**: an explicit `encoding_rs` label, or UTF-8 with a
//!   Windows-1252 fallback when the bytes are not valid UTF-8.
//! - **stdin/stdout**: the `-` path convention routes through standard streams.

use std::{
    borrow::Cow,
    fs::{self, File},
    io::{self, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use log::debug;

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<Option<&'static Encoding>> {
    label
        .map(|value| {
            Encoding::for_label(value.trim().as_bytes())
                .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
        })
        .transpose()
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

/// Reader tolerant of short rows; the dataset builder pads them.
pub fn open_csv_reader<R>(reader: R, delimiter: u8, has_headers: bool) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(has_headers)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn read_input(path: &Path) -> Result<Vec<u8>> {
    if is_dash(path) {
        let mut buf = Vec::new();
        io::stdin()
            .lock()
            .read_to_end(&mut buf)
            .context("Reading CSV from stdin")?;
        Ok(buf)
    } else {
        fs::read(path).with_context(|| format!("Opening input file {path:?}"))
    }
}

/// Decodes `bytes` with the requested encoding, or UTF-8 falling back to
/// Windows-1252. A leading byte-order mark is stripped.
pub fn decode_text<'a>(
    bytes: &'a [u8],
    encoding: Option<&'static Encoding>,
) -> Result<Cow<'a, str>> {
    if let Some(encoding) = encoding {
        let (text, _, had_errors) = encoding.decode(bytes);
        if had_errors {
            return Err(anyhow!(
                "Failed to decode input with encoding {}",
                encoding.name()
            ));
        }
        return Ok(text);
    }
    let (text, _, had_errors) = UTF_8.decode(bytes);
    if !had_errors {
        return Ok(text);
    }
    debug!("Input is not valid UTF-8; decoding as {}", WINDOWS_1252.name());
    let (text, _, _) = WINDOWS_1252.decode(bytes);
    Ok(text)
}

/// Writes `contents` to `path`, or stdout when `path` is `None` or `-`.
pub fn write_output(path: Option<&Path>, contents: &str) -> Result<()> {
    let mut writer: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(io::stdout().lock()),
    };
    writer.write_all(contents.as_bytes())?;
    if !contents.ends_with('\n') {
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn delimiter_follows_extension_unless_overridden() {
        assert_eq!(resolve_input_delimiter(&PathBuf::from("a.tsv"), None), b'\t');
        assert_eq!(resolve_input_delimiter(&PathBuf::from("a.TSV"), None), b'\t');
        assert_eq!(resolve_input_delimiter(&PathBuf::from("a.csv"), None), b',');
        assert_eq!(
            resolve_input_delimiter(&PathBuf::from("a.tsv"), Some(b';')),
            b';'
        );
    }

    #[test]
    fn unknown_encoding_label_is_rejected() {
        assert!(resolve_encoding(Some("klingon")).is_err());
        assert_eq!(resolve_encoding(None).unwrap(), None);
        assert_eq!(
            resolve_encoding(Some("latin1")).unwrap(),
            Some(WINDOWS_1252)
        );
    }

    #[test]
    fn invalid_utf8_falls_back_to_windows_1252() {
        let bytes = b"city\nM\xfcnchen\n";
        let text = decode_text(bytes, None).unwrap();
        assert_eq!(text, "city\nM\u{fc}nchen\n");
    }

    #[test]
    fn explicit_encoding_reports_errors() {
        let bytes = b"M\xfcnchen";
        assert!(decode_text(bytes, Some(UTF_8)).is_err());
    }

    #[test]
    fn bom_is_stripped() {
        let text = decode_text(b"\xef\xbb\xbfid\n1\n", None).unwrap();
        assert_eq!(text, "id\n1\n");
    }

    #[test]
    fn flexible_reader_accepts_short_rows() {
        let data = "a,b\n1\n2,3\n";
        let mut reader = open_csv_reader(data.as_bytes(), b',', true);
        let rows = reader
            .records()
            .map(|r| r.unwrap().len())
            .collect::<Vec<_>>();
        assert_eq!(rows, vec![1, 2]);
    }
}
