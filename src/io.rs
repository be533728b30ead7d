//! Loading tabular inputs and writing cleaned outputs.

use crate::error::{Result, ResultExt as _, ScrubError};
use calamine::{Data, Reader as _, Xlsx, open_workbook};
use polars::prelude::*;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// Input file kinds, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Tsv,
    Xlsx,
}

impl InputFormat {
    pub const EXTENSIONS: [&'static str; 3] = ["csv", "xlsx", "tsv"];

    /// Matches the extension case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "tsv" => Some(Self::Tsv),
            "xlsx" => Some(Self::Xlsx),
            _ => None,
        }
    }
}

/// Loads a file into a `DataFrame` with its header row as column names.
///
/// # Errors
///
/// Returns an error if the extension is unsupported or the file cannot be
/// parsed.
pub fn load_df(path: &Path) -> Result<DataFrame> {
    match InputFormat::from_path(path) {
        Some(InputFormat::Csv) => read_delimited(path, b','),
        Some(InputFormat::Tsv) => read_delimited(path, b'\t'),
        Some(InputFormat::Xlsx) => read_xlsx(path),
        None => Err(ScrubError::InvalidPath(format!(
            "unsupported file extension: {}",
            path.display()
        ))),
    }
}

/// Every column is read as text; the column cleaners do all coercion, so a
/// stray value deep in a numeric-looking column becomes a null, not a load
/// failure.
fn read_delimited(path: &Path, separator: u8) -> Result<DataFrame> {
    LazyCsvReader::new(path)
        .with_separator(separator)
        .with_infer_schema_length(Some(0))
        .with_has_header(true)
        .finish()?
        .collect()
        .with_context(|| format!("Failed to read {}", path.display()))
}

/// Reads the first worksheet, keeping cells as text like delimited files.
fn read_xlsx(path: &Path) -> Result<DataFrame> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = workbook.worksheet_range_at(0).ok_or_else(|| {
        ScrubError::DataProcessing(format!("{} has no worksheet", path.display()))
    })??;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(DataFrame::empty());
    };

    let raw_headers: Vec<String> = header_row
        .iter()
        .map(|cell| cell_to_string(cell).unwrap_or_default())
        .collect();
    let headers = dedupe_headers(&raw_headers);

    let mut columns: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for row in rows {
        for (i, values) in columns.iter_mut().enumerate() {
            values.push(row.get(i).and_then(cell_to_string));
        }
    }

    let columns: Vec<Column> = headers
        .iter()
        .zip(columns)
        .map(|(name, data)| Column::new(name.as_str().into(), data))
        .collect();

    Ok(DataFrame::new(columns)?)
}

fn cell_to_string(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => Some(f.to_string()),
        Data::Bool(b) => Some(if *b { "True" } else { "False" }.to_owned()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string()),
    }
}

/// Makes spreadsheet headers usable as column names: blanks become
/// `Unnamed: <index>` and repeats get a `.<n>` suffix.
pub fn dedupe_headers(headers: &[String]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            let base = if header.trim().is_empty() {
                format!("Unnamed: {i}")
            } else {
                header.clone()
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{base}.{count}")
            };
            *count += 1;
            name
        })
        .collect()
}

/// Writes a comma-separated file with a header row and no index column.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn save_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    CsvWriter::new(file)
        .include_header(true)
        .with_separator(b',')
        .with_datetime_format(Some("%Y-%m-%d %H:%M:%S".to_owned()))
        .finish(df)
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_extension_is_case_insensitive() {
        assert_eq!(InputFormat::from_path(Path::new("a.CSV")), Some(InputFormat::Csv));
        assert_eq!(InputFormat::from_path(Path::new("b.Tsv")), Some(InputFormat::Tsv));
        assert_eq!(InputFormat::from_path(Path::new("c.xlsx")), Some(InputFormat::Xlsx));
        assert_eq!(InputFormat::from_path(Path::new("d.xls")), None);
        assert_eq!(InputFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_load_csv_and_tsv() -> Result<()> {
        let dir = tempfile::tempdir()?;

        let csv = dir.path().join("sales.csv");
        std::fs::write(&csv, "Date,Total\n2024-01-05,10\n2024-01-06,abc\n")?;
        let df = load_df(&csv)?;
        assert_eq!(df.shape(), (2, 2));
        assert_eq!(df.column("Total")?.dtype(), &DataType::String);

        let tsv = dir.path().join("stock.tsv");
        std::fs::write(&tsv, "Item\tTotal\nbolt\t3\nnut\t4\n")?;
        let df = load_df(&tsv)?;
        assert_eq!(df.shape(), (2, 2));
        assert_eq!(df.column("Total")?.dtype(), &DataType::String);
        Ok(())
    }

    #[test]
    fn test_late_non_numeric_value_loads() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("big.csv");
        let mut contents = String::from("Total Amount,Region\n");
        for i in 0..10_050 {
            contents.push_str(&format!("{i},north\n"));
        }
        contents.push_str("abc,south\n");
        std::fs::write(&path, contents)?;

        let df = load_df(&path)?;
        assert_eq!(df.height(), 10_051);

        let columns = crate::detect::ColumnDetector::default().detect(&["Total Amount", "Region"]);
        let cleaned = crate::cleaning::CleaningController::default().clean(&df, &columns)?;
        assert_eq!(cleaned.height(), 10_050);
        Ok(())
    }

    #[test]
    fn test_unsupported_extension() {
        let result = load_df(Path::new("report.pdf"));
        assert!(matches!(result, Err(ScrubError::InvalidPath(_))));
    }

    #[test]
    fn test_dedupe_headers() {
        let headers: Vec<String> = ["Name", "Name", "", "Name"]
            .iter()
            .map(|s| (*s).to_owned())
            .collect();
        assert_eq!(
            dedupe_headers(&headers),
            vec!["Name", "Name.1", "Unnamed: 2", "Name.2"]
        );
    }

    #[test]
    fn test_save_csv_writes_header_without_index() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("cleaned_sales.csv");
        let mut df = df!(
            "Customer Name" => ["Alice", "Bob"],
            "Total Amount" => [10.5, 3.0],
        )?;

        save_csv(&mut df, &path)?;

        let written = std::fs::read_to_string(&path)?;
        let mut lines = written.lines();
        assert_eq!(lines.next(), Some("Customer Name,Total Amount"));
        assert_eq!(lines.next(), Some("Alice,10.5"));
        assert_eq!(lines.count(), 1);
        Ok(())
    }
}
