//! Field schema and record model
//!
//! A [`FieldSchema`] is the declarative description of what to read from every
//! item view. It is built once from configuration and shared read-only for the
//! whole run.
//!
//! # Columns
//!
//! | Kind | Columns |
//! |------|---------|
//! | `text` | `<name>` |
//! | `list` (capacity n) | `<name> 1` .. `<name> n` |
//! | `section` (capacity n) | `<name> 1` .. `<name> n` |
//! | `constant` | `<name>` |

mod record;

pub use record::{ExhibitorRecord, FieldValue};

use crate::config::{FieldKindEntry, SchemaConfig};

/// How a field is located and how many cells it fills
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Text of the first element matching the locator
    Text { locator: String },

    /// Texts of the first `capacity` elements matching the locator
    List { locator: String, capacity: usize },

    /// Entries of the aside section recognized by `heading`
    Section {
        heading: String,
        entry: String,
        capacity: usize,
    },

    /// A fixed value
    Constant { value: String },
}

impl FieldKind {
    /// Number of cells this field contributes to a record
    pub fn width(&self) -> usize {
        match self {
            Self::Text { .. } | Self::Constant { .. } => 1,
            Self::List { capacity, .. } | Self::Section { capacity, .. } => *capacity,
        }
    }
}

/// One named field of the schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    /// Column names produced by this field, in order
    pub fn columns(&self) -> Vec<String> {
        match self.kind {
            FieldKind::Text { .. } | FieldKind::Constant { .. } => vec![self.name.clone()],
            FieldKind::List { capacity, .. } | FieldKind::Section { capacity, .. } => (1
                ..=capacity)
                .map(|i| format!("{} {}", self.name, i))
                .collect(),
        }
    }
}

/// Locators for the labeled sections of an item's aside region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionLocators {
    /// Matches each section
    pub section: String,

    /// Matches the heading inside a section
    pub heading: String,
}

/// Ordered, immutable list of field descriptors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    fields: Vec<FieldDescriptor>,
    sections: Option<SectionLocators>,
    columns: Vec<String>,
}

impl FieldSchema {
    /// Builds a schema from descriptors
    pub fn new(fields: Vec<FieldDescriptor>, sections: Option<SectionLocators>) -> Self {
        let columns = fields.iter().flat_map(FieldDescriptor::columns).collect();
        Self {
            fields,
            sections,
            columns,
        }
    }

    /// Builds a schema from its configuration section
    ///
    /// The configuration is assumed to be validated (unique columns,
    /// section locators present when section fields are declared).
    pub fn from_config(config: &SchemaConfig) -> Self {
        let fields = config
            .fields
            .iter()
            .map(|entry| FieldDescriptor {
                name: entry.name.clone(),
                kind: match &entry.kind {
                    FieldKindEntry::Text { locator } => FieldKind::Text {
                        locator: locator.clone(),
                    },
                    FieldKindEntry::List { locator, capacity } => FieldKind::List {
                        locator: locator.clone(),
                        capacity: *capacity,
                    },
                    FieldKindEntry::Section {
                        heading,
                        entry,
                        capacity,
                    } => FieldKind::Section {
                        heading: heading.clone(),
                        entry: entry.clone(),
                        capacity: *capacity,
                    },
                    FieldKindEntry::Constant { value } => FieldKind::Constant {
                        value: value.clone(),
                    },
                },
            })
            .collect();

        let sections = match (&config.section, &config.section_heading) {
            (Some(section), Some(heading)) => Some(SectionLocators {
                section: section.clone(),
                heading: heading.clone(),
            }),
            _ => None,
        };

        Self::new(fields, sections)
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn sections(&self) -> Option<&SectionLocators> {
        self.sections.as_ref()
    }

    /// All column names, in export order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Finds the section field recognized by a heading text
    ///
    /// Headings are compared after trimming, ignoring ASCII case.
    pub fn section_field_for(&self, heading: &str) -> Option<&FieldDescriptor> {
        let heading = heading.trim();
        self.fields.iter().find(|field| match &field.kind {
            FieldKind::Section { heading: known, .. } => {
                known.trim().eq_ignore_ascii_case(heading)
            }
            _ => false,
        })
    }

    /// Whether any field is read from aside sections
    pub fn has_sections(&self) -> bool {
        self.fields
            .iter()
            .any(|field| matches!(field.kind, FieldKind::Section { .. }))
    }
}
