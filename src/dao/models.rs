use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Sheet status written on fresh online registrations.
pub const STATUS_PENDING: &str = "Pending Verification";
/// Sheet status written once the payment proof has been checked.
pub const STATUS_VERIFIED: &str = "Verified";
/// Sheet status written by the event check-in action.
pub const STATUS_CHECKED_IN: &str = "Checked In";

/// One row of the registration sheet, keyed by the sheet's column headers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistrationRecord {
    /// Identifier generated by the system of record (e.g. `HTF-123456`).
    #[serde(rename = "Registration ID", deserialize_with = "required_text")]
    pub registration_id: String,
    #[serde(rename = "Timestamp", default, deserialize_with = "lenient_text")]
    pub timestamp: String,
    #[serde(rename = "Team Name", default, deserialize_with = "lenient_text")]
    pub team_name: String,
    #[serde(rename = "Leader Name", default, deserialize_with = "lenient_text")]
    pub leader_name: String,
    #[serde(rename = "Leader Email", default, deserialize_with = "lenient_text")]
    pub leader_email: String,
    #[serde(rename = "Leader Phone", default, deserialize_with = "lenient_text")]
    pub leader_phone: String,
    #[serde(rename = "Leader Branch", default, deserialize_with = "lenient_text")]
    pub leader_branch: String,
    #[serde(rename = "Leader USN", default, deserialize_with = "lenient_text")]
    pub leader_usn: String,
    #[serde(rename = "Leader Sem", default, deserialize_with = "lenient_text")]
    pub leader_semester: String,
    #[serde(rename = "Member 2 Name", default, deserialize_with = "lenient_text")]
    pub member2_name: String,
    #[serde(rename = "Member 2 Email", default, deserialize_with = "lenient_text")]
    pub member2_email: String,
    #[serde(rename = "Member 2 Phone", default, deserialize_with = "lenient_text")]
    pub member2_phone: String,
    #[serde(rename = "Member 2 Branch", default, deserialize_with = "lenient_text")]
    pub member2_branch: String,
    #[serde(rename = "Member 2 USN", default, deserialize_with = "lenient_text")]
    pub member2_usn: String,
    #[serde(rename = "Member 2 Sem", default, deserialize_with = "lenient_text")]
    pub member2_semester: String,
    #[serde(
        rename = "Payment Screenshot URL",
        default,
        deserialize_with = "lenient_text"
    )]
    pub payment_screenshot_url: String,
    #[serde(rename = "Status", default, deserialize_with = "lenient_text")]
    pub status: String,
    /// Column appended by the sheet the first time a domain is written.
    #[serde(
        rename = "Assigned Domain",
        default,
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub assigned_domain: Option<String>,
    /// Column appended by the sheet the first time a team checks in.
    #[serde(
        rename = "Event Check-In",
        default,
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub event_check_in: Option<String>,
}

impl RegistrationRecord {
    /// Whether the sheet itself already records the team as checked in.
    pub fn sheet_checked_in(&self) -> bool {
        self.status == STATUS_CHECKED_IN
            || self.event_check_in.as_deref() == Some(STATUS_CHECKED_IN)
    }
}

/// Payload of the `register` action sent to the system of record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewRegistrationEntity {
    pub team_name: String,
    pub leader_name: String,
    pub leader_phone: String,
    pub leader_email: String,
    pub leader_semester: String,
    pub leader_branch: String,
    #[serde(rename = "leaderUSN")]
    pub leader_usn: String,
    pub member2_name: String,
    pub member2_phone: String,
    pub member2_email: String,
    pub member2_semester: String,
    pub member2_branch: String,
    #[serde(rename = "member2USN")]
    pub member2_usn: String,
    /// Payment proof as a data URL or raw base64 string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_mime_type: Option<String>,
    /// Status override used by on-spot registrations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Per-team record kept in the realtime store under `registrations/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TeamOverlayEntity {
    #[serde(default)]
    pub checked_in: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_in_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_domain: Option<String>,
}

impl TeamOverlayEntity {
    /// Assigned domain, treating the empty string written by resets as absent.
    pub fn domain(&self) -> Option<&str> {
        self.assigned_domain
            .as_deref()
            .filter(|domain| !domain.is_empty())
    }
}

/// Sheets hand back numbers for phone and semester cells, so every text column
/// accepts any scalar.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_to_text(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_to_text(Value::deserialize(deserializer)?).filter(|text| !text.is_empty()))
}

fn required_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match scalar_to_text(Value::deserialize(deserializer)?) {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(serde::de::Error::custom("registration id must not be empty")),
    }
}

fn scalar_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sheet_rows_accept_numeric_cells() {
        let row = json!({
            "Registration ID": "HTF-482913",
            "Team Name": "Null Pointers",
            "Leader Phone": 9876543210u64,
            "Leader Sem": 5,
            "Status": "Verified",
            "Assigned Domain": ""
        });

        let record: RegistrationRecord = serde_json::from_value(row).unwrap();
        assert_eq!(record.leader_phone, "9876543210");
        assert_eq!(record.leader_semester, "5");
        assert_eq!(record.assigned_domain, None);
        assert!(!record.sheet_checked_in());
    }

    #[test]
    fn rows_without_identifier_are_rejected() {
        let row = json!({ "Team Name": "Ghosts", "Registration ID": "" });
        assert!(serde_json::from_value::<RegistrationRecord>(row).is_err());
    }

    #[test]
    fn check_in_column_marks_team_as_checked_in() {
        let row = json!({
            "Registration ID": "HTF-100001",
            "Status": "Verified",
            "Event Check-In": "Checked In"
        });
        let record: RegistrationRecord = serde_json::from_value(row).unwrap();
        assert!(record.sheet_checked_in());
    }

    #[test]
    fn overlay_treats_empty_domain_as_unassigned() {
        let overlay: TeamOverlayEntity =
            serde_json::from_value(json!({ "checkedIn": true, "assignedDomain": "" })).unwrap();
        assert!(overlay.checked_in);
        assert_eq!(overlay.domain(), None);
    }
}
