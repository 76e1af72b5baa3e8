//! CSV codec for spreadsheet round-trips: UTF-8 with BOM, comma separated, CRLF rows,
//! RFC 4180 quoting (fields with comma, quote, CR or LF are quoted, quotes doubled).

use crate::error::AppError;
use std::borrow::Cow;

pub const BOM: char = '\u{feff}';

/// Quote a field when it contains a separator, quote or line break.
pub fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains(&[',', '"', '\r', '\n'][..]) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// Accumulates a BOM-prefixed CSV document.
pub struct CsvWriter {
    buf: String,
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvWriter {
    pub fn new() -> Self {
        let mut buf = String::new();
        buf.push(BOM);
        CsvWriter { buf }
    }

    pub fn write_record<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for (i, field) in fields.into_iter().enumerate() {
            if i > 0 {
                self.buf.push(',');
            }
            self.buf.push_str(&escape_field(field.as_ref()));
        }
        self.buf.push_str("\r\n");
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

/// Parse a CSV document into records. A leading BOM is dropped, CRLF and LF both end a
/// record, blank lines are skipped.
pub fn parse(input: &str) -> Result<Vec<Vec<String>>, AppError> {
    let input = input.strip_prefix(BOM).unwrap_or(input);
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1usize;
    let mut quote_line = 0usize;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => {
                in_quotes = true;
                quote_line = line;
            }
            ',' => record.push(std::mem::take(&mut field)),
            '\r' | '\n' => {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                line += 1;
                record.push(std::mem::take(&mut field));
                push_record(&mut records, std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }
    if in_quotes {
        return Err(AppError::Validation(format!(
            "csv: unterminated quoted field starting on line {}",
            quote_line
        )));
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        push_record(&mut records, record);
    }
    Ok(records)
}

fn push_record(records: &mut Vec<Vec<String>>, record: Vec<String>) {
    let blank = record.len() == 1 && record[0].is_empty();
    if !blank {
        records.push(record);
    }
}

/// Parsed document addressed by header name.
#[derive(Debug)]
pub struct CsvTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn parse(input: &str) -> Result<Self, AppError> {
        let mut records = parse(input)?.into_iter();
        let headers = records
            .next()
            .ok_or_else(|| AppError::Validation("csv: missing header row".into()))?
            .into_iter()
            .map(|h| h.trim().to_lowercase())
            .collect();
        Ok(CsvTable {
            headers,
            rows: records.collect(),
        })
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = CsvRow<'_>> {
        self.rows.iter().enumerate().map(move |(i, values)| CsvRow {
            headers: &self.headers,
            values,
            number: i + 2,
        })
    }
}

pub struct CsvRow<'a> {
    headers: &'a [String],
    values: &'a [String],
    /// 1-based line in the file, counting the header.
    pub number: usize,
}

impl<'a> CsvRow<'a> {
    /// Cell of column `name` as written; `None` when the column is missing or the cell is blank.
    pub fn get(&self, name: &str) -> Option<&'a str> {
        let idx = self.headers.iter().position(|h| h == name)?;
        self.values
            .get(idx)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Like `get`, trimmed. For cells that are parsed rather than stored.
    pub fn get_trimmed(&self, name: &str) -> Option<&'a str> {
        self.get(name).map(str::trim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_prefixes_bom_and_quotes_when_needed() {
        let mut w = CsvWriter::new();
        w.write_record(["id", "title"]);
        w.write_record(["1", "Casa, \"linda\"\nperto do mar"]);
        let out = w.finish();
        assert!(out.starts_with('\u{feff}'));
        assert_eq!(
            out.trim_start_matches('\u{feff}'),
            "id,title\r\n1,\"Casa, \"\"linda\"\"\nperto do mar\"\r\n"
        );
    }

    #[test]
    fn plain_fields_are_borrowed() {
        assert!(matches!(escape_field("simple text"), Cow::Borrowed(_)));
        assert_eq!(escape_field("a,b"), "\"a,b\"");
    }

    #[test]
    fn parser_recovers_escaped_fields() {
        let input = "\u{feff}a,b,c\r\n\"x, y\",\"say \"\"hi\"\"\",\"line1\r\nline2\"\r\n\r\nlast,,\n";
        let records = parse(input).unwrap();
        assert_eq!(
            records,
            vec![
                vec!["a", "b", "c"],
                vec!["x, y", "say \"hi\"", "line1\r\nline2"],
                vec!["last", "", ""],
            ]
        );
    }

    #[test]
    fn missing_trailing_newline_is_fine() {
        assert_eq!(parse("a,b\n1,2").unwrap(), vec![vec!["a", "b"], vec!["1", "2"]]);
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        let err = parse("a\n\"open,field\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn table_addresses_columns_by_header() {
        let t = CsvTable::parse("Title, Status\nCasa,venda\nApto,\n").unwrap();
        assert!(t.has_column("status"));
        let rows: Vec<_> = t.rows().collect();
        assert_eq!(rows[0].get("title"), Some("Casa"));
        assert_eq!(rows[1].get("status"), None);
        assert_eq!(rows[1].number, 3);
    }

    #[test]
    fn cells_keep_their_whitespace() {
        let t = CsvTable::parse("title,price\n\"  Casa\n\", 100 \n  ,\n").unwrap();
        let rows: Vec<_> = t.rows().collect();
        assert_eq!(rows[0].get("title"), Some("  Casa\n"));
        assert_eq!(rows[0].get_trimmed("price"), Some("100"));
        assert_eq!(rows[1].get("title"), None);
    }
}
