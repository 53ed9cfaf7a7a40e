//! Field extraction from an item view
//!
//! Every field is read independently. A field that cannot be located becomes
//! [`FieldValue::Missing`]; it never stops the remaining fields from being
//! read, and extraction never navigates.

use crate::browser::Browser;
use crate::crawler::ItemView;
use crate::schema::{ExhibitorRecord, FieldKind, FieldSchema, FieldValue};
use std::collections::HashMap;
use std::sync::Arc;

/// Applies a [`FieldSchema`] to the current item view
#[derive(Debug, Clone)]
pub struct Extractor {
    schema: Arc<FieldSchema>,
}

impl Extractor {
    pub fn new(schema: Arc<FieldSchema>) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Reads every declared field from the session's current view
    ///
    /// The returned record has exactly the schema's columns, in order.
    pub async fn extract<B: Browser>(&self, browser: &B, item: &ItemView) -> ExhibitorRecord {
        let sections = self.read_sections(browser).await;
        let mut record = ExhibitorRecord::new();

        for field in self.schema.fields() {
            let values = match &field.kind {
                FieldKind::Text { locator } => vec![read_first(browser, locator).await],
                FieldKind::List { locator, capacity } => {
                    read_all(browser, locator, *capacity).await
                }
                FieldKind::Section { capacity, .. } => sections
                    .get(field.name.as_str())
                    .cloned()
                    .unwrap_or_else(|| vec![FieldValue::Missing; *capacity]),
                FieldKind::Constant { value } => vec![FieldValue::Text(value.clone())],
            };

            for (column, value) in field.columns().into_iter().zip(values) {
                if value.is_missing() {
                    tracing::debug!("{} missing on {}", column, item.url);
                }
                record.push(column, value);
            }
        }

        record
    }

    /// Reads the aside sections, keyed by the name of the field each feeds
    ///
    /// Sections whose heading is not recognized are ignored; when two
    /// sections carry the same heading, the first one wins.
    async fn read_sections<B: Browser>(&self, browser: &B) -> HashMap<&str, Vec<FieldValue>> {
        let mut matched = HashMap::new();
        let Some(locators) = self.schema.sections() else {
            return matched;
        };
        if !self.schema.has_sections() {
            return matched;
        }

        let sections = match browser.find_all(&locators.section).await {
            Ok(sections) => sections,
            Err(e) => {
                tracing::debug!("Section lookup failed: {}", e);
                return matched;
            }
        };

        for section in &sections {
            let heading = match browser.find_within(section, &locators.heading).await {
                Ok(found) => match found.first() {
                    Some(element) => browser.text_of(element).await,
                    None => None,
                },
                Err(e) => {
                    tracing::debug!("Section heading lookup failed: {}", e);
                    None
                }
            };
            let Some(heading) = heading else {
                continue;
            };

            let Some(field) = self.schema.section_field_for(&heading) else {
                tracing::trace!("Ignoring unrecognized section '{}'", heading);
                continue;
            };
            let FieldKind::Section {
                entry, capacity, ..
            } = &field.kind
            else {
                continue;
            };
            if matched.contains_key(field.name.as_str()) {
                continue;
            }

            let entries = browser
                .find_within(section, entry)
                .await
                .unwrap_or_default();
            let mut values = Vec::with_capacity(*capacity);
            for element in entries.iter().take(*capacity) {
                values.push(FieldValue::from_read(browser.text_of(element).await));
            }
            values.resize(*capacity, FieldValue::Missing);

            matched.insert(field.name.as_str(), values);
        }

        matched
    }
}

async fn read_first<B: Browser>(browser: &B, locator: &str) -> FieldValue {
    match browser.find_all(locator).await {
        Ok(found) => match found.first() {
            Some(element) => FieldValue::from_read(browser.text_of(element).await),
            None => FieldValue::Missing,
        },
        Err(e) => {
            tracing::debug!("Lookup of '{}' failed: {}", locator, e);
            FieldValue::Missing
        }
    }
}

async fn read_all<B: Browser>(browser: &B, locator: &str, capacity: usize) -> Vec<FieldValue> {
    let found = match browser.find_all(locator).await {
        Ok(found) => found,
        Err(e) => {
            tracing::debug!("Lookup of '{}' failed: {}", locator, e);
            Vec::new()
        }
    };

    let mut values = Vec::with_capacity(capacity);
    for element in found.iter().take(capacity) {
        values.push(FieldValue::from_read(browser.text_of(element).await));
    }
    values.resize(capacity, FieldValue::Missing);
    values
}
