//! Per-file summary log.

use crate::detect::ColumnMap;
use crate::error::{Result, ResultExt as _};
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRecord {
    pub file_name: String,
    pub columns: ColumnMap,
    pub rows_before: usize,
    pub rows_after: usize,
}

impl SummaryRecord {
    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }

    /// Renders the block appended to the log file.
    pub fn render(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = writeln!(out);
        let _ = writeln!(out, "--- {} ---", self.file_name);
        let _ = writeln!(out, "Detected columns:");
        for (field, column) in self.columns.iter() {
            let _ = writeln!(out, "   {field}: {}", column.unwrap_or("None"));
        }
        let _ = writeln!(out, "Rows before cleaning: {}", self.rows_before);
        let _ = writeln!(out, "Rows after cleaning:  {}", self.rows_after);
        let _ = writeln!(out, "Rows removed:         {}", self.rows_removed());
        let _ = writeln!(out, "{}", "-".repeat(40));
        out
    }
}

/// Appends a record to `path`, creating the file if needed.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or written.
pub fn append_summary(path: &Path, record: &SummaryRecord) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open summary log {}", path.display()))?;
    file.write_all(record.render().as_bytes())
        .with_context(|| format!("Failed to write summary log {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::Field;

    fn record() -> SummaryRecord {
        SummaryRecord {
            file_name: "sales".to_owned(),
            columns: [
                (Field::Date, Some("Order Date".to_owned())),
                (Field::Amount, Some("Total".to_owned())),
                (Field::Price, None),
                (Field::Name, Some("Client".to_owned())),
            ]
            .into_iter()
            .collect(),
            rows_before: 10,
            rows_after: 7,
        }
    }

    #[test]
    fn test_render_format() {
        let expected = "\n--- sales ---\n\
                        Detected columns:\n   \
                        date: Order Date\n   \
                        amount: Total\n   \
                        price: None\n   \
                        name: Client\n\
                        Rows before cleaning: 10\n\
                        Rows after cleaning:  7\n\
                        Rows removed:         3\n\
                        ----------------------------------------\n";
        assert_eq!(record().render(), expected);
    }

    #[test]
    fn test_append_accumulates() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("log_sales.txt");

        append_summary(&path, &record())?;
        append_summary(&path, &record())?;

        let contents = std::fs::read_to_string(&path)?;
        assert_eq!(contents, record().render().repeat(2));
        Ok(())
    }

    #[test]
    fn test_append_open_failure() {
        let result = append_summary(Path::new("/nonexistent-dir/log.txt"), &record());
        assert!(result.is_err());
    }

    #[test]
    fn test_rows_removed_never_underflows() {
        let mut r = record();
        r.rows_after = 12;
        assert_eq!(r.rows_removed(), 0);
    }
}
