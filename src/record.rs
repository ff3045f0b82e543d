//! Wire data model for profile sends.
//!
//! Everything here serializes with the webhook's original camelCase field
//! names so existing n8n workflows keep working. String fields default to
//! `""` rather than being optional: a serialized record always carries every
//! key, and a missing DOM node never produces a missing JSON key downstream.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// One scraped profile, assembled fresh for every send and discarded once
/// the webhook call resolves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileRecord {
    /// Campaign/list tag this profile is routed to. The value `"Test"` is a
    /// dry-run sentinel, see the dispatcher.
    pub list: String,
    /// User-supplied rating (free-form, usually a star count).
    pub rating: String,
    /// Free-text notes supplied in the popup at send time.
    pub notes: String,
    pub person_name: String,
    pub job: String,
    pub company: String,
    pub email: String,
    pub person_blurb: String,
    /// The page URL at extraction time.
    pub linkedin_url: String,
    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
}

/// One company block from the experience section, with its positions in
/// page order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExperienceEntry {
    pub company: String,
    pub positions: Vec<Position>,
}

/// A (title, duration) pair within an experience entry. Durations are
/// zipped to titles by index; a missing duration is `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Position {
    pub title: String,
    pub duration: String,
}

/// One education entry keyed off a school-name heading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EducationEntry {
    pub university: String,
    /// Degree name ("Degree name" label on the page).
    pub subject: String,
    /// Field of study ("Field of study" label on the page).
    pub field_of_study: String,
    /// Formatted date range, e.g. "2013 – 2017".
    pub dates: String,
}

/// Supplementary form fields collected by the popup and merged into the
/// record at extraction time (`stars` lands in [`ProfileRecord::rating`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormData {
    pub list: String,
    pub stars: String,
    pub notes: String,
}

/// Body of the settings-surface connectivity test. Fixed sample values plus
/// a fresh timestamp, posted to a candidate webhook URL to verify it is
/// reachable before saving it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestPayload {
    pub test: bool,
    /// RFC 3339 timestamp of the test send.
    pub timestamp: String,
    pub message: String,
    pub person_name: String,
    pub company: String,
    pub job: String,
    pub notes: String,
    pub linkedin_url: String,
}

impl TestPayload {
    pub fn new() -> Self {
        Self {
            test: true,
            timestamp: Utc::now().to_rfc3339(),
            message: "Test connection from leadhook".to_string(),
            person_name: "Test User".to_string(),
            company: "Test Company".to_string(),
            job: "Test Position".to_string(),
            notes: "This is a test message to verify webhook connectivity".to_string(),
            linkedin_url: "https://linkedin.com/in/test".to_string(),
        }
    }
}

impl Default for TestPayload {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_every_key() {
        let value = serde_json::to_value(ProfileRecord::default()).unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "list",
            "rating",
            "notes",
            "personName",
            "job",
            "company",
            "email",
            "personBlurb",
            "linkedinUrl",
            "experience",
            "education",
        ] {
            assert!(obj.contains_key(key), "missing key {key}");
        }
        assert_eq!(obj.len(), 11);
        assert_eq!(obj["personName"], "");
        assert!(obj["experience"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_nested_entries_use_wire_names() {
        let entry = EducationEntry {
            university: "U".into(),
            subject: "BSc".into(),
            field_of_study: "Physics".into(),
            dates: "2010 – 2014".into(),
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["fieldOfStudy"], "Physics");

        let exp = ExperienceEntry {
            company: "Acme".into(),
            positions: vec![Position {
                title: "Engineer".into(),
                duration: "2 yrs".into(),
            }],
        };
        let value = serde_json::to_value(&exp).unwrap();
        assert_eq!(value["positions"][0]["title"], "Engineer");
        assert_eq!(value["positions"][0]["duration"], "2 yrs");
    }

    #[test]
    fn test_form_data_tolerates_missing_fields() {
        let form: FormData = serde_json::from_str(r#"{"notes":"hi"}"#).unwrap();
        assert_eq!(form.notes, "hi");
        assert_eq!(form.list, "");
        assert_eq!(form.stars, "");
    }

    #[test]
    fn test_payload_shape() {
        let value = serde_json::to_value(TestPayload::new()).unwrap();
        assert_eq!(value["test"], true);
        assert_eq!(value["personName"], "Test User");
        assert_eq!(value["company"], "Test Company");
        assert_eq!(value["job"], "Test Position");
        assert_eq!(value["linkedinUrl"], "https://linkedin.com/in/test");
        assert!(value["timestamp"].as_str().unwrap().contains('T'));
    }
}
