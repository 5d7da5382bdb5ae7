//! Reads uploaded lead spreadsheets into plain text cells.
//!
//! Two families of files are understood, chosen by extension:
//! - delimited text (`.csv`, `.txt`): the delimiter is guessed from the header
//!   line (`,` `;` tab or `|`) and the rows are parsed with the `csv` crate;
//! - workbooks (`.xlsx`, `.xlsm`, `.xls`, `.ods`): the first sheet is read
//!   with `calamine`.
//!
//! Either way the result is a [`SheetData`]: the trimmed header row and every
//! following row as text. Typing and validation happen later, in
//! `import::mapping`.

pub mod uploads;

use calamine::{open_workbook_auto, Data, Reader};
use std::fs;
use std::path::Path;
use thiserror::Error;

const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];
const UTF8_BOM: &str = "\u{feff}";

#[derive(Debug, Error)]
pub enum SpreadsheetError {
    #[error("Unsupported file format '{0}'. Upload a csv, txt, xlsx, xlsm, xls or ods file.")]
    UnsupportedFormat(String),
    #[error("The file could not be read as a spreadsheet: {0}")]
    CorruptFile(String),
    #[error("Invalid fileToken.")]
    InvalidToken,
    #[error("Uploaded file not found. Please re-upload.")]
    UnknownToken,
    #[error("File exceeds the upload limit of {0} bytes.")]
    TooLarge(usize),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetFormat {
    Delimited,
    Workbook,
}

impl SpreadsheetFormat {
    pub const EXTENSIONS: [&'static str; 6] = ["csv", "txt", "xlsx", "xlsm", "xls", "ods"];

    pub fn from_extension(extension: &str) -> Result<Self, SpreadsheetError> {
        match extension.to_ascii_lowercase().as_str() {
            "csv" | "txt" => Ok(SpreadsheetFormat::Delimited),
            "xlsx" | "xlsm" | "xls" | "ods" => Ok(SpreadsheetFormat::Workbook),
            other => Err(SpreadsheetError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, SpreadsheetError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::from_extension(extension)
    }
}

/// Header row plus data rows of the first sheet.
///
/// Rows keep their position in the sheet: a blank line or empty row in the
/// file is an empty entry here, so `header_row + 1 + index` is the sheet row
/// number of `rows[index]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// 1-based sheet row holding the headers.
    pub header_row: usize,
}

impl SheetData {
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }

    /// Sheet row number of the first data row.
    pub fn first_data_row(&self) -> usize {
        self.header_row + 1
    }

    /// `rows` start at sheet row `first_row`. Blank rows above the header are
    /// dropped but still counted.
    fn from_rows(rows: Vec<Vec<String>>, first_row: usize) -> Self {
        let mut rows = rows.into_iter();
        let mut header_row = first_row;
        for row in rows.by_ref() {
            if is_blank_row(&row) {
                header_row += 1;
                continue;
            }
            let headers = row.into_iter().map(|h| h.trim().to_string()).collect();
            return SheetData {
                headers,
                rows: rows.collect(),
                header_row,
            };
        }
        SheetData::default()
    }
}

fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

/// Parses the spreadsheet at `path`, dispatching on its extension.
pub fn read_sheet(path: &Path) -> Result<SheetData, SpreadsheetError> {
    match SpreadsheetFormat::from_path(path)? {
        SpreadsheetFormat::Delimited => read_delimited(path),
        SpreadsheetFormat::Workbook => read_workbook(path),
    }
}

/// Picks the most frequent candidate delimiter in the header line. Ties go to
/// the earlier candidate and a line without any candidate is comma separated.
pub fn detect_delimiter(header_line: &str) -> u8 {
    let mut best = b',';
    let mut best_count = 0;
    for delimiter in DELIMITERS {
        let count = header_line.bytes().filter(|&b| b == delimiter).count();
        if count > best_count {
            best = delimiter;
            best_count = count;
        }
    }
    best
}

fn read_delimited(path: &Path) -> Result<SheetData, SpreadsheetError> {
    let bytes = fs::read(path)?;
    let text = String::from_utf8(bytes)
        .map_err(|_| SpreadsheetError::CorruptFile("file is not valid UTF-8 text".into()))?;
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(&text);

    let header_line = text
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or_default();
    let delimiter = detect_delimiter(header_line);

    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(false).flexible(true).delimiter(delimiter);

    // The csv reader skips empty lines, so each line is parsed on its own and
    // blank ones become empty rows.
    let mut rows = Vec::new();
    for line in split_lines(text, delimiter) {
        if line.trim_end_matches('\r').is_empty() {
            rows.push(Vec::new());
            continue;
        }
        let before = rows.len();
        let mut reader = builder.from_reader(line.as_bytes());
        for record in reader.records() {
            let record = record.map_err(|e| SpreadsheetError::CorruptFile(e.to_string()))?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        if rows.len() == before {
            rows.push(Vec::new());
        }
    }
    Ok(SheetData::from_rows(rows, 1))
}

/// Splits `text` into one slice per sheet row. Newlines inside a quoted field
/// belong to that field; a quote only opens a field at its start.
fn split_lines(text: &str, delimiter: u8) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut field_start = true;
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];
        if in_quotes {
            if byte == b'"' {
                if bytes.get(i + 1) == Some(&b'"') {
                    i += 1;
                } else {
                    in_quotes = false;
                }
            }
        } else if byte == b'"' && field_start {
            in_quotes = true;
            field_start = false;
        } else if byte == b'\n' {
            lines.push(&text[start..i]);
            start = i + 1;
            field_start = true;
        } else {
            field_start = byte == delimiter;
        }
        i += 1;
    }
    if start < bytes.len() {
        lines.push(&text[start..]);
    }
    lines
}

fn read_workbook(path: &Path) -> Result<SheetData, SpreadsheetError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| SpreadsheetError::CorruptFile(e.to_string()))?;

    let Some(sheet_name) = workbook.sheet_names().first().cloned() else {
        return Ok(SheetData::default());
    };
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| SpreadsheetError::CorruptFile(e.to_string()))?;

    // The range starts at the first used cell, not at A1.
    let first_row = range.start().map_or(1, |(row, _)| row as usize + 1);
    let rows = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();
    Ok(SheetData::from_rows(rows, first_row))
}

/// Whole numbers lose their `.0` so phone numbers typed into numeric cells
/// come out as `5551234`.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::Empty | Data::Error(_) => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn delimiter_is_the_most_frequent_candidate() {
        assert_eq!(detect_delimiter("a,b,c"), b',');
        assert_eq!(detect_delimiter("a;b;c"), b';');
        assert_eq!(detect_delimiter("a\tb\tc"), b'\t');
        assert_eq!(detect_delimiter("a|b,c|d"), b'|');
        assert_eq!(detect_delimiter("single"), b',');
    }

    #[test]
    fn reads_csv_headers_trimmed_and_rows_verbatim() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "leads.csv",
            b"\xEF\xBB\xBF FullName , Mob,Notes\nAlice,5551234,\"likes a, b\"\nBob,5559876\n",
        );

        let sheet = read_sheet(&path).unwrap();
        assert_eq!(sheet.headers, vec!["FullName", "Mob", "Notes"]);
        assert_eq!(
            sheet.rows,
            vec![
                vec!["Alice".to_string(), "5551234".into(), "likes a, b".into()],
                vec!["Bob".to_string(), "5559876".into()],
            ]
        );
    }

    #[test]
    fn reads_semicolon_separated_text() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "export.TXT", b"name;mobile\nCarol;5550000\n");

        let sheet = read_sheet(&path).unwrap();
        assert_eq!(sheet.headers, vec!["name", "mobile"]);
        assert_eq!(sheet.rows, vec![vec!["Carol".to_string(), "5550000".into()]]);
    }

    #[test]
    fn blank_lines_keep_their_place_in_the_sheet() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "gaps.csv",
            b"Name,Mobile,Product\r\nAlice,1,Loan\r\n\r\nBob,2,Card\r\n",
        );

        let sheet = read_sheet(&path).unwrap();
        assert_eq!(sheet.header_row, 1);
        assert_eq!(
            sheet.rows,
            vec![
                vec!["Alice".to_string(), "1".into(), "Loan".into()],
                Vec::new(),
                vec!["Bob".to_string(), "2".into(), "Card".into()],
            ]
        );
    }

    #[test]
    fn blank_lines_above_the_header_are_counted() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "late.csv", b"\n\nName;Mobile\nAlice;1\n");

        let sheet = read_sheet(&path).unwrap();
        assert_eq!(sheet.headers, vec!["Name", "Mobile"]);
        assert_eq!(sheet.header_row, 3);
        assert_eq!(sheet.first_data_row(), 4);
        assert_eq!(sheet.rows, vec![vec!["Alice".to_string(), "1".into()]]);
    }

    #[test]
    fn quoted_newlines_stay_inside_their_row() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "notes.csv",
            b"Name,Notes\nAlice,\"line one\nline \"\"two\"\"\"\nBob,5\" screen\n",
        );

        let sheet = read_sheet(&path).unwrap();
        assert_eq!(
            sheet.rows,
            vec![
                vec!["Alice".to_string(), "line one\nline \"two\"".into()],
                vec!["Bob".to_string(), "5\" screen".into()],
            ]
        );
    }

    #[test]
    fn empty_file_yields_empty_sheet() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "empty.csv", b"");
        assert!(read_sheet(&path).unwrap().is_empty());
    }

    #[test]
    fn rejects_unknown_extensions() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "leads.pdf", b"%PDF-1.4");
        assert!(matches!(
            read_sheet(&path),
            Err(SpreadsheetError::UnsupportedFormat(ext)) if ext == "pdf"
        ));
    }

    #[test]
    fn non_utf8_text_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "latin1.csv", b"name\n\xE9l\xE8ve\n");
        assert!(matches!(
            read_sheet(&path),
            Err(SpreadsheetError::CorruptFile(_))
        ));
    }

    #[test]
    fn garbage_workbook_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "broken.xlsx", b"this is not a zip archive");
        assert!(matches!(
            read_sheet(&path),
            Err(SpreadsheetError::CorruptFile(_))
        ));
    }

    #[test]
    fn reads_first_xlsx_sheet_with_numbers_as_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("leads.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "FullName ").unwrap();
        sheet.write_string(0, 1, "Mob").unwrap();
        sheet.write_string(0, 2, "Score").unwrap();
        sheet.write_string(1, 0, "Alice").unwrap();
        sheet.write_number(1, 1, 5551234).unwrap();
        sheet.write_number(1, 2, 4.5).unwrap();
        workbook.save(&path).unwrap();

        let data = read_sheet(&path).unwrap();
        assert_eq!(data.headers, vec!["FullName", "Mob", "Score"]);
        assert_eq!(
            data.rows,
            vec![vec!["Alice".to_string(), "5551234".into(), "4.5".into()]]
        );
    }

    #[test]
    fn workbook_rows_are_numbered_from_the_sheet_top() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("offset.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(1, 0, "Name").unwrap();
        sheet.write_string(1, 1, "Mobile").unwrap();
        sheet.write_string(2, 0, "Alice").unwrap();
        sheet.write_number(2, 1, 5551111).unwrap();
        sheet.write_string(4, 0, "Bob").unwrap();
        sheet.write_number(4, 1, 5552222).unwrap();
        workbook.save(&path).unwrap();

        let data = read_sheet(&path).unwrap();
        assert_eq!(data.headers, vec!["Name", "Mobile"]);
        assert_eq!(data.header_row, 2);
        assert_eq!(data.rows.len(), 3);
        assert!(is_blank_row(&data.rows[1]));
        assert_eq!(data.rows[2], vec!["Bob".to_string(), "5552222".into()]);
    }
}
