//! Variable catalog: code → descriptive label.
//!
//! Catalog labels are hierarchical, components joined by `!!`:
//!
//! ```text
//! Estimate!!Total                 -> derived "Total",        short "Total"
//! Estimate!!Total!!White alone    -> derived "Total!!White alone", short "White alone"
//! Estimate!!Male                  -> derived "Male",         short "Male"
//! ```
//!
//! `derived_name` drops everything up to the last `Estimate!!`; `short_name`
//! drops everything up to the last `Estimate!!Total!!` and falls back to
//! `derived_name` when that longer prefix is absent.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Survey, ValueColumn, ValueSuffix};

/// Prefix stripped to form `derived_name`.
pub const ESTIMATE_PREFIX: &str = "Estimate!!";

/// Prefix stripped to form `short_name`.
pub const TOTAL_PREFIX: &str = "Estimate!!Total!!";

/// Label after the last `Estimate!!`, or the whole label when absent.
pub fn derived_name(label: &str) -> &str {
    after_last(label, ESTIMATE_PREFIX).unwrap_or(label)
}

/// Label after the last `Estimate!!Total!!`, if present.
pub fn total_name(label: &str) -> Option<&str> {
    after_last(label, TOTAL_PREFIX)
}

/// `total_name` back-filled with `derived_name`.
pub fn short_name(label: &str) -> &str {
    total_name(label).unwrap_or_else(|| derived_name(label))
}

fn after_last<'a>(label: &'a str, prefix: &str) -> Option<&'a str> {
    label.rfind(prefix).map(|idx| &label[idx + prefix.len()..])
}

/// Raw catalog row as published by the provider (and as cached on disk).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawVariable {
    pub code: String,
    pub label: String,
    #[serde(default)]
    pub concept: Option<String>,
}

/// One catalog entry with its display names resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableCatalogEntry {
    pub code: String,
    pub label: String,
    pub concept: Option<String>,
    pub derived_name: String,
    pub short_name: String,
}

impl VariableCatalogEntry {
    pub fn from_raw(raw: RawVariable) -> Self {
        let derived = derived_name(&raw.label).to_string();
        let short = short_name(&raw.label).to_string();
        Self {
            code: raw.code,
            label: raw.label,
            concept: raw.concept,
            derived_name: derived,
            short_name: short,
        }
    }

    /// Name used when composing output columns.
    pub fn display_name(&self) -> &str {
        &self.short_name
    }
}

/// Immutable catalog snapshot for one vintage and survey product.
#[derive(Debug, Clone)]
pub struct Catalog {
    vintage: u16,
    survey: Survey,
    entries: Vec<VariableCatalogEntry>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog from raw rows. Entries are ordered by code; the first
    /// row seen for a code wins.
    pub fn from_raw(vintage: u16, survey: Survey, raw: impl IntoIterator<Item = RawVariable>) -> Self {
        let mut raw: Vec<RawVariable> = raw.into_iter().collect();
        raw.sort_by(|a, b| a.code.cmp(&b.code));
        raw.dedup_by(|b, a| a.code == b.code);

        let entries: Vec<VariableCatalogEntry> =
            raw.into_iter().map(VariableCatalogEntry::from_raw).collect();
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.code.clone(), i))
            .collect();

        Self {
            vintage,
            survey,
            entries,
            index,
        }
    }

    pub fn vintage(&self) -> u16 {
        self.vintage
    }

    pub fn survey(&self) -> Survey {
        self.survey
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[VariableCatalogEntry] {
        &self.entries
    }

    pub fn get(&self, code: &str) -> Option<&VariableCatalogEntry> {
        self.index.get(code).map(|&i| &self.entries[i])
    }

    /// Raw rows, suitable for caching.
    pub fn to_raw(&self) -> Vec<RawVariable> {
        self.entries
            .iter()
            .map(|e| RawVariable {
                code: e.code.clone(),
                label: e.label.clone(),
                concept: e.concept.clone(),
            })
            .collect()
    }
}

/// `variables.json` body: `{"variables": {"B02001_002E": {"label": ..., "concept": ...}, ...}}`.
#[derive(Debug, Deserialize)]
pub struct VariablesDocument {
    pub variables: HashMap<String, VariableMeta>,
}

#[derive(Debug, Deserialize)]
pub struct VariableMeta {
    pub label: String,
    #[serde(default)]
    pub concept: Option<String>,
}

impl VariablesDocument {
    /// Keep estimate keys only; the entry code is the key minus its `E`.
    pub fn into_raw(self) -> Vec<RawVariable> {
        self.variables
            .into_iter()
            .filter_map(|(key, meta)| {
                let parsed = ValueColumn::parse(&key)?;
                if parsed.suffix != ValueSuffix::Estimate {
                    return None;
                }
                Some(RawVariable {
                    code: parsed.code.to_string(),
                    label: meta.label,
                    concept: meta.concept,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(code: &str, label: &str) -> RawVariable {
        RawVariable {
            code: code.to_string(),
            label: label.to_string(),
            concept: None,
        }
    }

    #[test]
    fn total_breakdown_prefers_post_total_label() {
        let label = "Estimate!!Total!!White";
        assert_eq!(derived_name(label), "Total!!White");
        assert_eq!(total_name(label), Some("White"));
        assert_eq!(short_name(label), "White");
    }

    #[test]
    fn label_without_total_falls_back_to_derived() {
        let label = "Estimate!!Male";
        assert_eq!(derived_name(label), "Male");
        assert_eq!(total_name(label), None);
        assert_eq!(short_name(label), "Male");
    }

    #[test]
    fn bare_total_label() {
        assert_eq!(short_name("Estimate!!Total"), "Total");
    }

    #[test]
    fn nested_breakdown_keeps_lower_levels() {
        let label = "Estimate!!Total!!Male!!Under 5 years";
        assert_eq!(short_name(label), "Male!!Under 5 years");
    }

    #[test]
    fn label_without_estimate_prefix_is_kept_whole() {
        assert_eq!(derived_name("Geographic Area Name"), "Geographic Area Name");
        assert_eq!(short_name("Geographic Area Name"), "Geographic Area Name");
    }

    #[test]
    fn short_name_non_empty_for_typical_labels() {
        let labels = [
            "Estimate!!Total",
            "Estimate!!Total!!Car, truck, or van",
            "Estimate!!Median household income in the past 12 months",
            "Estimate!!Female",
        ];
        for label in labels {
            let entry = VariableCatalogEntry::from_raw(raw("X_001", label));
            assert!(!entry.short_name.is_empty(), "{label}");
        }
    }

    #[test]
    fn catalog_lookup_and_uniqueness() {
        let catalog = Catalog::from_raw(
            2018,
            Survey::Acs5,
            vec![
                raw("B02001_002", "Estimate!!Total!!White alone"),
                raw("B02001_001", "Estimate!!Total"),
                raw("B02001_002", "Estimate!!Total!!Duplicate"),
            ],
        );
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.entries()[0].code, "B02001_001");
        assert_eq!(catalog.get("B02001_002").unwrap().display_name(), "White alone");
        assert!(catalog.get("B99999_001").is_none());
        assert_eq!(catalog.to_raw().len(), 2);
    }

    #[test]
    fn variables_document_keeps_estimates_only() {
        let body = r#"{
            "variables": {
                "for": {"label": "Census API FIPS 'for' clause", "concept": "Census API Geography Specification"},
                "NAME": {"label": "Geographic Area Name"},
                "B02001_001E": {"label": "Estimate!!Total", "concept": "RACE"},
                "B02001_001M": {"label": "Margin of Error!!Total", "concept": "RACE"},
                "B02001_001EA": {"label": "Annotation of Estimate!!Total", "concept": "RACE"},
                "B02001_002E": {"label": "Estimate!!Total!!White alone", "concept": "RACE"}
            }
        }"#;
        let doc: VariablesDocument = serde_json::from_str(body).unwrap();
        let catalog = Catalog::from_raw(2018, Survey::Acs5, doc.into_raw());

        assert_eq!(catalog.len(), 2);
        let white = catalog.get("B02001_002").unwrap();
        assert_eq!(white.short_name, "White alone");
        assert_eq!(white.concept.as_deref(), Some("RACE"));
        assert!(catalog.get("B02001_001EA").is_none());
    }
}
