//! Keyword-based column detection.
//!
//! Headers are matched against a [`KeywordTable`] by case-insensitive
//! substring search. Each field takes the *first* header that qualifies and
//! is never reassigned; a single header may satisfy several fields.
//!
//! ```
//! use scrubber::detect::{ColumnDetector, Field, KeywordTable};
//!
//! let detector = ColumnDetector::new(KeywordTable::default());
//! let map = detector.detect(&["Transaction Date", "Total Amount", "Customer Name"]);
//!
//! assert_eq!(map.get(Field::Date), Some("Transaction Date"));
//! assert_eq!(map.get(Field::Price), None);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Semantic category a column can be detected as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Date,
    Amount,
    Price,
    Name,
}

impl Field {
    pub const ALL: [Self; 4] = [Self::Date, Self::Amount, Self::Price, Self::Name];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Amount => "amount",
            Self::Price => "price",
            Self::Name => "name",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keywords that identify one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub field: Field,
    pub keywords: Vec<String>,
}

impl KeywordRule {
    pub fn new(field: Field, keywords: &[&str]) -> Self {
        Self {
            field,
            keywords: keywords.iter().map(|k| (*k).to_owned()).collect(),
        }
    }

    fn matches(&self, header_lower: &str) -> bool {
        self.keywords.iter().any(|k| header_lower.contains(k.as_str()))
    }
}

/// Ordered field → keywords table.
///
/// Rule order is the iteration order of every [`ColumnMap`] built from the
/// table, and therefore the order in which cleaners run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<KeywordRule>", into = "Vec<KeywordRule>")]
pub struct KeywordTable {
    rules: Vec<KeywordRule>,
}

impl KeywordTable {
    /// Builds a table, lower-casing keywords.
    ///
    /// # Errors
    ///
    /// Returns a message if a field appears twice or a keyword is blank.
    pub fn new(rules: Vec<KeywordRule>) -> Result<Self, String> {
        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(rules.len());

        for rule in rules {
            if !seen.insert(rule.field) {
                return Err(format!("field '{}' is listed more than once", rule.field));
            }
            let mut keywords = Vec::with_capacity(rule.keywords.len());
            for keyword in rule.keywords {
                let keyword = keyword.trim().to_lowercase();
                if keyword.is_empty() {
                    return Err(format!("field '{}' has a blank keyword", rule.field));
                }
                keywords.push(keyword);
            }
            normalized.push(KeywordRule {
                field: rule.field,
                keywords,
            });
        }

        Ok(Self { rules: normalized })
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self {
            rules: vec![
                KeywordRule::new(Field::Date, &["date", "time", "day", "year"]),
                KeywordRule::new(Field::Amount, &["amount", "total", "stock"]),
                KeywordRule::new(Field::Price, &["price", "cost"]),
                KeywordRule::new(Field::Name, &["name", "customer", "client", "user"]),
            ],
        }
    }
}

impl TryFrom<Vec<KeywordRule>> for KeywordTable {
    type Error = String;

    fn try_from(rules: Vec<KeywordRule>) -> Result<Self, Self::Error> {
        Self::new(rules)
    }
}

impl From<KeywordTable> for Vec<KeywordRule> {
    fn from(table: KeywordTable) -> Self {
        table.rules
    }
}

/// Per-file mapping from field to detected header.
///
/// Holds one entry per keyword rule, in table order; undetected fields are
/// kept as `None` so the summary log can report them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnMap {
    entries: Vec<(Field, Option<String>)>,
}

impl ColumnMap {
    pub fn get(&self, field: Field) -> Option<&str> {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .and_then(|(_, column)| column.as_deref())
    }

    /// All entries, detected or not, in table order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, Option<&str>)> + '_ {
        self.entries.iter().map(|(f, c)| (*f, c.as_deref()))
    }

    /// Only the detected entries, in table order.
    pub fn detected(&self) -> impl Iterator<Item = (Field, &str)> + '_ {
        self.entries
            .iter()
            .filter_map(|(f, c)| c.as_deref().map(|c| (*f, c)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(Field, Option<String>)> for ColumnMap {
    fn from_iter<I: IntoIterator<Item = (Field, Option<String>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for ColumnMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (field, column)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{field}: {}", column.unwrap_or("None"))?;
        }
        f.write_str("}")
    }
}

/// Matches headers against an injected keyword table.
#[derive(Debug, Clone, Default)]
pub struct ColumnDetector {
    table: KeywordTable,
}

impl ColumnDetector {
    pub fn new(table: KeywordTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &KeywordTable {
        &self.table
    }

    pub fn detect<S: AsRef<str>>(&self, headers: &[S]) -> ColumnMap {
        let mut entries: Vec<(Field, Option<String>)> =
            self.table.rules().iter().map(|r| (r.field, None)).collect();

        for header in headers {
            let header = header.as_ref();
            let lower = header.to_lowercase();
            for (rule, (_, slot)) in self.table.rules().iter().zip(entries.iter_mut()) {
                if slot.is_none() && rule.matches(&lower) {
                    *slot = Some(header.to_owned());
                }
            }
        }

        ColumnMap { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(headers: &[&str]) -> ColumnMap {
        ColumnDetector::default().detect(headers)
    }

    #[test]
    fn test_detects_transaction_headers() {
        let map = detect(&["Transaction Date", "Total Amount", "Customer Name"]);

        assert_eq!(map.get(Field::Date), Some("Transaction Date"));
        assert_eq!(map.get(Field::Amount), Some("Total Amount"));
        assert_eq!(map.get(Field::Price), None);
        assert_eq!(map.get(Field::Name), Some("Customer Name"));
        assert_eq!(
            map.to_string(),
            "{date: Transaction Date, amount: Total Amount, price: None, name: Customer Name}"
        );
    }

    #[test]
    fn test_first_qualifying_header_wins() {
        let map = detect(&["Order Date", "Ship Date", "Unit Cost", "Price"]);
        assert_eq!(map.get(Field::Date), Some("Order Date"));
        assert_eq!(map.get(Field::Price), Some("Unit Cost"));
    }

    #[test]
    fn test_header_can_satisfy_several_fields() {
        // "username" carries "name" and "user"; "Stock Price" is both amount and price.
        let map = detect(&["Stock Price", "username"]);
        assert_eq!(map.get(Field::Amount), Some("Stock Price"));
        assert_eq!(map.get(Field::Price), Some("Stock Price"));
        assert_eq!(map.get(Field::Name), Some("username"));
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let map = detect(&["CLIENT", "birthYEAR"]);
        assert_eq!(map.get(Field::Name), Some("CLIENT"));
        assert_eq!(map.get(Field::Date), Some("birthYEAR"));
    }

    #[test]
    fn test_empty_headers_yield_all_absent() {
        let map = detect(&[]);
        assert_eq!(map.len(), 4);
        assert_eq!(map.detected().count(), 0);
        let fields: Vec<Field> = map.iter().map(|(f, _)| f).collect();
        assert_eq!(fields, Field::ALL.to_vec());
    }

    #[test]
    fn test_detected_columns_come_from_input() {
        let headers = ["id", "Sales Total", "Daily notes", "Cost Basis", "Region"];
        let map = detect(&headers);
        for (_, column) in map.iter() {
            if let Some(column) = column {
                assert!(headers.contains(&column), "{column} is not an input header");
            }
        }
    }

    #[test]
    fn test_detection_is_idempotent() {
        let headers = ["Date", "Amount", "Price", "Name", "Updated Time"];
        assert_eq!(detect(&headers), detect(&headers));
    }

    #[test]
    fn test_custom_table_controls_order_and_keywords() {
        let table = KeywordTable::new(vec![
            KeywordRule::new(Field::Name, &["VENDOR"]),
            KeywordRule::new(Field::Price, &["rate"]),
        ])
        .expect("valid table");
        let map = ColumnDetector::new(table).detect(&["Hourly Rate", "Vendor", "Customer"]);

        let entries: Vec<(Field, Option<&str>)> = map.iter().collect();
        assert_eq!(
            entries,
            vec![(Field::Name, Some("Vendor")), (Field::Price, Some("Hourly Rate"))]
        );
        assert_eq!(map.get(Field::Date), None);
    }

    #[test]
    fn test_table_rejects_duplicate_fields() {
        let result = KeywordTable::new(vec![
            KeywordRule::new(Field::Date, &["date"]),
            KeywordRule::new(Field::Date, &["when"]),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_table_rejects_blank_keywords() {
        let result = KeywordTable::new(vec![KeywordRule::new(Field::Price, &["  "])]);
        assert!(result.is_err());
    }

    #[test]
    fn test_table_parses_from_json_lowercased() {
        let json = r#"[{"field": "price", "keywords": ["Cost"]}]"#;
        let table: KeywordTable = serde_json::from_str(json).expect("parse table");
        assert_eq!(table.rules(), &[KeywordRule::new(Field::Price, &["cost"])]);
    }
}
