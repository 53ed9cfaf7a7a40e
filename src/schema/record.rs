/// Record types produced by extraction
use std::fmt;

/// One extracted cell value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Text read from the item view (or a constant)
    Text(String),

    /// The declared field could not be located on this item
    Missing,
}

impl FieldValue {
    /// Builds a value from an optional read, mapping `None` to `Missing`
    pub fn from_read(read: Option<String>) -> Self {
        match read {
            Some(text) => Self::Text(text),
            None => Self::Missing,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Missing => None,
        }
    }

    /// Renders the cell, substituting `sentinel` for missing values
    pub fn render<'a>(&'a self, sentinel: &'a str) -> &'a str {
        self.as_text().unwrap_or(sentinel)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{}", text),
            Self::Missing => write!(f, "<missing>"),
        }
    }
}

/// A flat, ordered mapping from column name to extracted value
///
/// Every record built from a schema carries exactly that schema's columns,
/// in schema order, so exports are always rectangular.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExhibitorRecord {
    cells: Vec<(String, FieldValue)>,
}

impl ExhibitorRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, column: String, value: FieldValue) {
        self.cells.push((column, value));
    }

    /// Value of a column, `None` if the column does not exist
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Column names in order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    /// Values in column order
    pub fn values(&self) -> impl Iterator<Item = &FieldValue> {
        self.cells.iter().map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of cells holding the missing-value sentinel
    pub fn missing_count(&self) -> usize {
        self.values().filter(|value| value.is_missing()).count()
    }
}
