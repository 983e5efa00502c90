//! Line-list documents on disk: `{ "headers": {...}, "rows": [...] }` JSON.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::column::TableLayout;
use crate::error::EngineError;
use crate::row::{Headers, Row};
use crate::table::TableStore;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineListDocument {
    #[serde(default)]
    pub headers: Headers,
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl LineListDocument {
    /// Parse a document. Every group gets at least one column and rows are
    /// padded or truncated to the header widths.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let mut doc: LineListDocument = serde_json::from_str(json)?;
        doc.normalize();
        Ok(doc)
    }

    pub fn to_json_pretty(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let json = fs::read_to_string(path)?;
        let doc = Self::from_json(&json)?;
        log::debug!("loaded {} rows from {}", doc.rows.len(), path.display());
        Ok(doc)
    }

    pub fn save(&self, path: &Path) -> Result<(), EngineError> {
        fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }

    pub fn from_table(table: &TableStore) -> Self {
        Self { headers: table.headers().clone(), rows: table.rows().to_vec() }
    }

    pub fn into_table(self, layout: TableLayout) -> TableStore {
        TableStore::new(self.headers, self.rows, layout)
    }

    fn normalize(&mut self) {
        self.headers.ensure_floor();
        for row in &mut self.rows {
            row.conform(&self.headers);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "headers": { "basic": ["age"], "clinical": ["fever", "vomit"], "diet": ["rice", "soup"] },
        "rows": [
            { "isPatient": "1", "basicInfo": ["34"], "clinicalSymptoms": ["1"], "symptomOnset": "2024-05-01 18:00", "dietInfo": ["1", "0", "extra"] },
            { "isPatient": "0" }
        ]
    }"#;

    #[test]
    fn test_load_normalizes_rows() {
        let doc = LineListDocument::from_json(SAMPLE).unwrap();
        assert_eq!(doc.rows[0].clinical_symptoms, vec!["1", ""]);
        assert_eq!(doc.rows[0].diet_info, vec!["1", "0"]);
        assert_eq!(doc.rows[1].basic_info, vec![""]);
        assert_eq!(doc.rows[1].diet_info.len(), 2);
    }

    #[test]
    fn test_missing_groups_get_floor() {
        let doc = LineListDocument::from_json(r#"{"rows": []}"#).unwrap();
        assert_eq!(doc.headers.basic.len(), 1);
        assert_eq!(doc.headers.diet.len(), 1);
    }

    #[test]
    fn test_malformed_json_is_error() {
        let err = LineListDocument::from_json("{ not json").unwrap_err();
        assert!(matches!(err, EngineError::DocumentParse(_)));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outbreak.json");

        let doc = LineListDocument::from_json(SAMPLE).unwrap();
        doc.save(&path).unwrap();
        let reloaded = LineListDocument::load(&path).unwrap();
        assert_eq!(doc, reloaded);

        let table = reloaded.into_table(TableLayout::default());
        assert_eq!(table.row_count(), 2);
        assert!(table.is_consistent());
    }
}
