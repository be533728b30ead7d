//! Per-field column cleaning and row-level tidying.
//!
//! Cleaners run one after another in the order of the detected
//! [`ColumnMap`], each on the frame left by the previous one, so a row
//! dropped by the amount cleaner is no longer seen by the name cleaner.
//! The results are therefore order dependent when a single header was
//! detected as several fields.
//!
//! | Field  | Coercion                               | Rows dropped             |
//! |--------|----------------------------------------|--------------------------|
//! | date   | text → datetime, failures become null  | none                     |
//! | amount | text → float, failures become null     | null after coercion      |
//! | price  | text → float, failures become null     | null after coercion      |
//! | name   | trim, then title case                  | null or empty after trim |
//!
//! After the column cleaners, fully empty rows are removed and then
//! duplicate rows, keeping the first occurrence.

use crate::detect::{ColumnMap, Field};
use crate::error::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::collections::HashMap;

/// Transforms one named column of a frame, possibly dropping rows.
pub type Cleaner = fn(DataFrame, &str) -> Result<DataFrame>;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// Parses a date or date-time in any of the common spellings.
///
/// Slash-separated dates are read month first. Date-only values land at
/// midnight; RFC 3339 values with an offset are converted to UTC.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parses a finite number; anything else is treated as missing.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Upper-cases the first letter of every alphabetic run and lower-cases the
/// rest. Any non-letter starts a new word.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_is_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_alpha = true;
        } else {
            out.push(c);
            prev_is_alpha = false;
        }
    }
    out
}

fn as_text(series: &Series) -> Result<StringChunked> {
    let cast = series.cast(&DataType::String)?;
    Ok(cast.str()?.clone())
}

/// Converts a column to datetimes, keeping every row.
///
/// # Errors
///
/// Returns an error if the column does not exist.
pub fn clean_date_column(mut df: DataFrame, column: &str) -> Result<DataFrame> {
    let series = df.column(column)?.as_materialized_series().clone();

    let parsed = if matches!(series.dtype(), DataType::Date | DataType::Datetime(_, None)) {
        series.cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
    } else {
        let text = as_text(&series)?;
        let millis: Int64Chunked = text
            .into_iter()
            .map(|v| {
                v.and_then(parse_datetime)
                    .map(|dt| dt.and_utc().timestamp_millis())
            })
            .collect();
        millis
            .with_name(column.into())
            .into_datetime(TimeUnit::Milliseconds, None)
            .into_series()
    };

    df.with_column(parsed)?;
    Ok(df)
}

/// Converts an amount column to numbers, dropping rows that fail.
///
/// # Errors
///
/// Returns an error if the column does not exist.
pub fn clean_amount_column(df: DataFrame, column: &str) -> Result<DataFrame> {
    clean_numeric_column(df, column)
}

/// Converts a price column to numbers, dropping rows that fail.
///
/// # Errors
///
/// Returns an error if the column does not exist.
pub fn clean_price_column(df: DataFrame, column: &str) -> Result<DataFrame> {
    clean_numeric_column(df, column)
}

fn clean_numeric_column(mut df: DataFrame, column: &str) -> Result<DataFrame> {
    let series = df.column(column)?.as_materialized_series().clone();

    let values: Float64Chunked = if series.dtype().is_primitive_numeric() {
        let cast = series.cast(&DataType::Float64)?;
        cast.f64()?
            .into_iter()
            .map(|v| v.filter(|v| v.is_finite()))
            .collect()
    } else {
        as_text(&series)?
            .into_iter()
            .map(|v| v.and_then(parse_number))
            .collect()
    };

    let keep = values.is_not_null();
    df.with_column(values.with_name(column.into()).into_series())?;
    Ok(df.filter(&keep)?)
}

/// Trims and title-cases a name column, dropping rows left empty.
///
/// # Errors
///
/// Returns an error if the column does not exist.
pub fn clean_name_column(mut df: DataFrame, column: &str) -> Result<DataFrame> {
    let series = df.column(column)?.as_materialized_series().clone();
    let text = as_text(&series)?;

    let cleaned: StringChunked = text
        .into_iter()
        .map(|v| v.map(|s| title_case(s.trim())))
        .collect();
    let keep: BooleanChunked = cleaned
        .into_iter()
        .map(|v| Some(v.is_some_and(|s| !s.is_empty())))
        .collect();

    df.with_column(cleaned.with_name(column.into()).into_series())?;
    Ok(df.filter(&keep)?)
}

/// Removes rows in which every column is null.
///
/// # Errors
///
/// Returns an error if filtering fails.
pub fn drop_empty_rows(df: DataFrame) -> Result<DataFrame> {
    if df.width() == 0 {
        return Ok(df);
    }

    let mut keep = BooleanChunked::full("keep".into(), false, df.height());
    for column in df.get_columns() {
        keep = &keep | &column.as_materialized_series().is_not_null();
    }
    Ok(df.filter(&keep)?)
}

/// Removes rows identical to an earlier row, keeping the first occurrence
/// and the original order.
///
/// # Errors
///
/// Returns an error if the de-duplication fails.
pub fn drop_duplicate_rows(df: DataFrame) -> Result<DataFrame> {
    if df.width() == 0 {
        return Ok(df);
    }
    Ok(df
        .lazy()
        .unique_stable(None, UniqueKeepStrategy::First)
        .collect()?)
}

/// Dispatches detected columns to the cleaner registered for their field.
#[derive(Debug, Clone)]
pub struct CleaningController {
    cleaners: HashMap<Field, Cleaner>,
}

impl Default for CleaningController {
    fn default() -> Self {
        Self::with_cleaners([
            (Field::Date, clean_date_column as Cleaner),
            (Field::Amount, clean_amount_column as Cleaner),
            (Field::Price, clean_price_column as Cleaner),
            (Field::Name, clean_name_column as Cleaner),
        ])
    }
}

impl CleaningController {
    pub fn with_cleaners<I>(cleaners: I) -> Self
    where
        I: IntoIterator<Item = (Field, Cleaner)>,
    {
        Self {
            cleaners: cleaners.into_iter().collect(),
        }
    }

    pub fn register(&mut self, field: Field, cleaner: Cleaner) {
        self.cleaners.insert(field, cleaner);
    }

    pub fn has_cleaner(&self, field: Field) -> bool {
        self.cleaners.contains_key(&field)
    }

    /// Cleans a copy of `df`; the input frame is left untouched.
    ///
    /// Detected columns missing from the frame, and fields without a
    /// registered cleaner, are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if a cleaner or the row-level passes fail.
    pub fn clean(&self, df: &DataFrame, columns: &ColumnMap) -> Result<DataFrame> {
        let mut cleaned = df.clone();

        for (field, column) in columns.detected() {
            if cleaned.column(column).is_err() {
                tracing::debug!("Skipping {field} cleaner: column '{column}' not present");
                continue;
            }
            let Some(cleaner) = self.cleaners.get(&field) else {
                continue;
            };

            let before = cleaned.height();
            cleaned = cleaner(cleaned, column)?;
            tracing::debug!(
                "Cleaned {field} column '{column}': {before} -> {} rows",
                cleaned.height()
            );
        }

        let cleaned = drop_empty_rows(cleaned)?;
        drop_duplicate_rows(cleaned)
    }
}
