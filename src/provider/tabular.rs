//! Column-contract parsing for helper-tool output
//!
//! The platform adapters drive external helper processes that emit
//! comma-separated tables with a header row, quoted fields, and "Yes"/"No"
//! booleans. This layer turns that text into header-indexed rows and never
//! leaks past the `provider` module; the adapters expose only typed
//! `Monitor`/`AudioDevice` records upward.

use std::collections::HashMap;

/// A parsed table: header-indexed rows of trimmed string fields.
#[derive(Debug)]
pub(crate) struct Table {
    columns: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
}

/// One row of a [`Table`], with access by column name.
pub(crate) struct Row<'a> {
    columns: &'a HashMap<String, usize>,
    fields: &'a [String],
}

impl Table {
    /// Parse CSV text into a table. The first record is the header; rows
    /// shorter than the header keep their missing fields absent rather than
    /// failing, since helper builds differ in trailing columns.
    pub(crate) fn parse(text: &str) -> Self {
        let mut records = parse_csv(text).into_iter();

        let columns = records
            .next()
            .map(|header| {
                header
                    .into_iter()
                    .enumerate()
                    .map(|(i, name)| (name.trim().to_string(), i))
                    .collect()
            })
            .unwrap_or_default();

        let rows = records.filter(|r| !is_blank(r)).collect();

        Table { columns, rows }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True if every named column appeared in the header.
    pub(crate) fn has_columns(&self, required: &[&str]) -> bool {
        required.iter().all(|c| self.columns.contains_key(*c))
    }

    pub(crate) fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|fields| Row {
            columns: &self.columns,
            fields,
        })
    }
}

impl Row<'_> {
    /// Field by column name; `None` when the column is absent or the row is
    /// too short.
    pub(crate) fn get(&self, column: &str) -> Option<&str> {
        let idx = *self.columns.get(column)?;
        self.fields.get(idx).map(|s| s.trim())
    }

    /// Field by column name, empty string when absent.
    pub(crate) fn get_or_empty(&self, column: &str) -> &str {
        self.get(column).unwrap_or("")
    }

    /// Helper-tool boolean encoding: exactly "Yes" is true.
    pub(crate) fn get_bool(&self, column: &str) -> bool {
        self.get(column) == Some("Yes")
    }
}

fn is_blank(record: &[String]) -> bool {
    record.iter().all(|f| f.trim().is_empty())
}

/// Minimal CSV reader for the helper tools' dialect: commas, CRLF or LF line
/// ends, double-quoted fields with `""` escapes. Device names routinely
/// contain commas, so quoting must be honored.
fn parse_csv(text: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    // Final record without a trailing newline
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "\
Name,Active,Primary,Monitor Name\r\n\
\\\\.\\DISPLAY1,Yes,Yes,Dell U2720Q\r\n\
\\\\.\\DISPLAY2,No,No,\"LG, UltraWide\"\r\n";

    #[test]
    fn parses_header_and_rows() {
        let table = Table::parse(SAMPLE);
        assert!(table.has_columns(&["Name", "Active", "Primary", "Monitor Name"]));
        assert!(!table.has_columns(&["Name", "Missing Column"]));

        let rows: Vec<_> = table.rows().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Name"), Some("\\\\.\\DISPLAY1"));
        assert_eq!(rows[1].get("Monitor Name"), Some("LG, UltraWide"));
    }

    #[test]
    fn yes_no_booleans() {
        let table = Table::parse(SAMPLE);
        let rows: Vec<_> = table.rows().collect();
        assert!(rows[0].get_bool("Active"));
        assert!(!rows[1].get_bool("Primary"));
        // Absent column is false, not a panic
        assert!(!rows[0].get_bool("Disconnected"));
    }

    #[test]
    fn quoted_field_with_escaped_quote() {
        let table = Table::parse("Name,Desc\na,\"say \"\"hi\"\"\"\n");
        let rows: Vec<_> = table.rows().collect();
        assert_eq!(rows[0].get("Desc"), Some("say \"hi\""));
    }

    #[test]
    fn blank_lines_and_missing_trailing_fields_are_tolerated() {
        let table = Table::parse("A,B,C\n1,2\n\n3,4,5\n");
        let rows: Vec<_> = table.rows().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("C"), None);
        assert_eq!(rows[0].get_or_empty("C"), "");
        assert_eq!(rows[1].get("C"), Some("5"));
    }

    #[test]
    fn empty_input_yields_empty_table() {
        let table = Table::parse("");
        assert!(table.is_empty());
        assert!(!table.has_columns(&["Name"]));
    }
}
