//! Row records and column-group headers.

use serde::{Deserialize, Serialize};

/// The three variable-width column groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnGroup {
    /// Demographic fields.
    Basic,
    /// Symptoms.
    Clinical,
    /// Food or exposure items.
    Diet,
}

impl ColumnGroup {
    pub const ALL: [ColumnGroup; 3] = [ColumnGroup::Basic, ColumnGroup::Clinical, ColumnGroup::Diet];

    /// Row field holding this group's cells.
    pub fn data_key(self) -> DataKey {
        match self {
            ColumnGroup::Basic => DataKey::BasicInfo,
            ColumnGroup::Clinical => DataKey::ClinicalSymptoms,
            ColumnGroup::Diet => DataKey::DietInfo,
        }
    }
}

/// Where in a [`Row`] a column reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DataKey {
    #[serde(rename = "isPatient")]
    IsPatient,
    #[serde(rename = "isConfirmedCase")]
    IsConfirmedCase,
    #[serde(rename = "basicInfo")]
    BasicInfo,
    #[serde(rename = "clinicalSymptoms")]
    ClinicalSymptoms,
    #[serde(rename = "symptomOnset")]
    SymptomOnset,
    #[serde(rename = "individualExposureTime")]
    IndividualExposureTime,
    #[serde(rename = "dietInfo")]
    DietInfo,
}

impl DataKey {
    /// Wire name, as used in the row shape and in filter keys.
    pub fn as_str(self) -> &'static str {
        match self {
            DataKey::IsPatient => "isPatient",
            DataKey::IsConfirmedCase => "isConfirmedCase",
            DataKey::BasicInfo => "basicInfo",
            DataKey::ClinicalSymptoms => "clinicalSymptoms",
            DataKey::SymptomOnset => "symptomOnset",
            DataKey::IndividualExposureTime => "individualExposureTime",
            DataKey::DietInfo => "dietInfo",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "isPatient" => DataKey::IsPatient,
            "isConfirmedCase" => DataKey::IsConfirmedCase,
            "basicInfo" => DataKey::BasicInfo,
            "clinicalSymptoms" => DataKey::ClinicalSymptoms,
            "symptomOnset" => DataKey::SymptomOnset,
            "individualExposureTime" => DataKey::IndividualExposureTime,
            "dietInfo" => DataKey::DietInfo,
            _ => return None,
        })
    }

    /// Column group for indexed keys, `None` for scalar fields.
    pub fn group(self) -> Option<ColumnGroup> {
        match self {
            DataKey::BasicInfo => Some(ColumnGroup::Basic),
            DataKey::ClinicalSymptoms => Some(ColumnGroup::Clinical),
            DataKey::DietInfo => Some(ColumnGroup::Diet),
            _ => None,
        }
    }

    pub fn is_timestamp(self) -> bool {
        matches!(self, DataKey::SymptomOnset | DataKey::IndividualExposureTime)
    }
}

/// Column labels for the three groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headers {
    #[serde(default)]
    pub basic: Vec<String>,
    #[serde(default)]
    pub clinical: Vec<String>,
    #[serde(default)]
    pub diet: Vec<String>,
}

impl Headers {
    /// Blank labels with the given group widths.
    pub fn blank(basic: usize, clinical: usize, diet: usize) -> Self {
        Self {
            basic: vec![String::new(); basic],
            clinical: vec![String::new(); clinical],
            diet: vec![String::new(); diet],
        }
    }

    pub fn group(&self, group: ColumnGroup) -> &Vec<String> {
        match group {
            ColumnGroup::Basic => &self.basic,
            ColumnGroup::Clinical => &self.clinical,
            ColumnGroup::Diet => &self.diet,
        }
    }

    pub fn group_mut(&mut self, group: ColumnGroup) -> &mut Vec<String> {
        match group {
            ColumnGroup::Basic => &mut self.basic,
            ColumnGroup::Clinical => &mut self.clinical,
            ColumnGroup::Diet => &mut self.diet,
        }
    }

    pub fn len(&self, group: ColumnGroup) -> usize {
        self.group(group).len()
    }

    /// Bring every group up to the one-column floor.
    pub fn ensure_floor(&mut self) {
        for group in ColumnGroup::ALL {
            let labels = self.group_mut(group);
            if labels.is_empty() {
                labels.push(String::new());
            }
        }
    }
}

/// One case record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    /// "1" case, "0" non-case, "" unknown.
    #[serde(default)]
    pub is_patient: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_confirmed_case: Option<String>,
    #[serde(default)]
    pub basic_info: Vec<String>,
    #[serde(default)]
    pub clinical_symptoms: Vec<String>,
    #[serde(default)]
    pub symptom_onset: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub individual_exposure_time: Option<String>,
    #[serde(default)]
    pub diet_info: Vec<String>,
}

impl Row {
    /// An empty row sized to the current headers.
    pub fn empty(headers: &Headers) -> Self {
        Self {
            is_patient: String::new(),
            is_confirmed_case: Some(String::new()),
            basic_info: vec![String::new(); headers.basic.len()],
            clinical_symptoms: vec![String::new(); headers.clinical.len()],
            symptom_onset: String::new(),
            individual_exposure_time: Some(String::new()),
            diet_info: vec![String::new(); headers.diet.len()],
        }
    }

    pub fn cells(&self, group: ColumnGroup) -> &Vec<String> {
        match group {
            ColumnGroup::Basic => &self.basic_info,
            ColumnGroup::Clinical => &self.clinical_symptoms,
            ColumnGroup::Diet => &self.diet_info,
        }
    }

    pub fn cells_mut(&mut self, group: ColumnGroup) -> &mut Vec<String> {
        match group {
            ColumnGroup::Basic => &mut self.basic_info,
            ColumnGroup::Clinical => &mut self.clinical_symptoms,
            ColumnGroup::Diet => &mut self.diet_info,
        }
    }

    /// Raw value at `(key, index)`. Missing values read as "".
    pub fn get(&self, key: DataKey, index: Option<usize>) -> &str {
        match key.group() {
            Some(group) => index
                .and_then(|i| self.cells(group).get(i))
                .map(String::as_str)
                .unwrap_or(""),
            None => match key {
                DataKey::IsPatient => self.is_patient.as_str(),
                DataKey::IsConfirmedCase => self.is_confirmed_case.as_deref().unwrap_or(""),
                DataKey::SymptomOnset => self.symptom_onset.as_str(),
                DataKey::IndividualExposureTime => {
                    self.individual_exposure_time.as_deref().unwrap_or("")
                }
                _ => "",
            },
        }
    }

    /// Write a scalar field or an indexed cell. Indexed writes grow the
    /// sequence up to `index` if it is short.
    pub fn set(&mut self, key: DataKey, index: Option<usize>, value: String) {
        match key.group() {
            Some(group) => {
                let Some(i) = index else {
                    return;
                };
                let cells = self.cells_mut(group);
                if cells.len() <= i {
                    cells.resize(i + 1, String::new());
                }
                cells[i] = value;
            }
            None => match key {
                DataKey::IsPatient => self.is_patient = value,
                DataKey::IsConfirmedCase => self.is_confirmed_case = Some(value),
                DataKey::SymptomOnset => self.symptom_onset = value,
                DataKey::IndividualExposureTime => self.individual_exposure_time = Some(value),
                _ => {}
            },
        }
    }

    /// Pad or truncate every group to the header widths.
    pub fn conform(&mut self, headers: &Headers) {
        for group in ColumnGroup::ALL {
            self.cells_mut(group).resize(headers.len(group), String::new());
        }
    }

    /// Blank patient status, onset, and every category cell.
    pub fn is_empty(&self) -> bool {
        is_blank(&self.is_patient)
            && is_blank(&self.symptom_onset)
            && ColumnGroup::ALL
                .iter()
                .all(|&g| self.cells(g).iter().all(|c| is_blank(c)))
    }
}

pub(crate) fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_row_matches_headers() {
        let headers = Headers::blank(2, 3, 4);
        let row = Row::empty(&headers);
        assert_eq!(row.basic_info.len(), 2);
        assert_eq!(row.clinical_symptoms.len(), 3);
        assert_eq!(row.diet_info.len(), 4);
        assert!(row.is_empty());
    }

    #[test]
    fn test_get_set_round_trip_by_key() {
        let headers = Headers::blank(1, 1, 2);
        let mut row = Row::empty(&headers);
        row.set(DataKey::IsPatient, None, "1".into());
        row.set(DataKey::DietInfo, Some(1), "0".into());
        assert_eq!(row.get(DataKey::IsPatient, None), "1");
        assert_eq!(row.get(DataKey::DietInfo, Some(1)), "0");
        assert_eq!(row.get(DataKey::DietInfo, Some(9)), "");
        assert!(!row.is_empty());
    }

    #[test]
    fn test_indexed_set_grows_short_sequence() {
        let mut row = Row::default();
        row.set(DataKey::ClinicalSymptoms, Some(2), "1".into());
        assert_eq!(row.clinical_symptoms, vec!["", "", "1"]);
    }

    #[test]
    fn test_whitespace_row_is_empty() {
        let headers = Headers::blank(1, 1, 1);
        let mut row = Row::empty(&headers);
        row.basic_info[0] = "   ".into();
        assert!(row.is_empty());
    }

    #[test]
    fn test_conform_pads_and_truncates() {
        let headers = Headers::blank(3, 1, 1);
        let mut row = Row {
            basic_info: vec!["a".into()],
            clinical_symptoms: vec!["1".into(), "0".into()],
            ..Row::default()
        };
        row.conform(&headers);
        assert_eq!(row.basic_info, vec!["a", "", ""]);
        assert_eq!(row.clinical_symptoms, vec!["1"]);
        assert_eq!(row.diet_info, vec![""]);
    }

    #[test]
    fn test_row_wire_shape() {
        let json = r#"{"isPatient":"1","basicInfo":["M"],"clinicalSymptoms":[],"symptomOnset":"","dietInfo":["1"]}"#;
        let row: Row = serde_json::from_str(json).unwrap();
        assert_eq!(row.is_patient, "1");
        assert_eq!(row.is_confirmed_case, None);
        let out = serde_json::to_string(&row).unwrap();
        assert!(out.contains("\"dietInfo\":[\"1\"]"));
        assert!(!out.contains("isConfirmedCase"));
    }
}
