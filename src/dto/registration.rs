use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::{NewRegistrationEntity, RegistrationRecord},
    dto::validation::{validate_payment_image, validate_phone},
};

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
/// Payload of `POST /registrations`: one team of two.
pub struct RegistrationRequest {
    #[validate(length(min = 1, max = 100))]
    pub team_name: String,
    #[validate(length(min = 1, max = 100))]
    pub leader_name: String,
    #[validate(custom(function = "validate_phone"))]
    pub leader_phone: String,
    #[validate(email)]
    pub leader_email: String,
    #[validate(length(min = 1, max = 8))]
    pub leader_semester: String,
    #[validate(length(min = 1, max = 64))]
    pub leader_branch: String,
    #[serde(rename = "leaderUSN")]
    #[validate(length(min = 1, max = 20))]
    pub leader_usn: String,
    #[validate(length(min = 1, max = 100))]
    pub member2_name: String,
    #[validate(custom(function = "validate_phone"))]
    pub member2_phone: String,
    #[validate(email)]
    pub member2_email: String,
    #[validate(length(min = 1, max = 8))]
    pub member2_semester: String,
    #[validate(length(min = 1, max = 64))]
    pub member2_branch: String,
    #[serde(rename = "member2USN")]
    #[validate(length(min = 1, max = 20))]
    pub member2_usn: String,
    /// Payment proof as a data URL or raw base64.
    #[validate(custom(function = "validate_payment_image"))]
    pub image_base64: Option<String>,
    pub image_mime_type: Option<String>,
}

impl From<RegistrationRequest> for NewRegistrationEntity {
    fn from(request: RegistrationRequest) -> Self {
        Self {
            team_name: request.team_name.trim().to_string(),
            leader_name: request.leader_name.trim().to_string(),
            leader_phone: request.leader_phone.trim().to_string(),
            leader_email: request.leader_email.trim().to_string(),
            leader_semester: request.leader_semester,
            leader_branch: request.leader_branch,
            leader_usn: request.leader_usn.trim().to_uppercase(),
            member2_name: request.member2_name.trim().to_string(),
            member2_phone: request.member2_phone.trim().to_string(),
            member2_email: request.member2_email.trim().to_string(),
            member2_semester: request.member2_semester,
            member2_branch: request.member2_branch,
            member2_usn: request.member2_usn.trim().to_uppercase(),
            image_base64: request.image_base64,
            image_mime_type: request.image_mime_type,
            status: None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Response of a successful registration.
pub struct RegistrationCreated {
    pub registration_id: String,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
/// Payload of `POST /operator/registrations/{id}/status`.
pub struct UpdateStatusRequest {
    #[validate(length(min = 1, max = 64))]
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Registration row as shown on the verification dashboard.
pub struct RegistrationSummary {
    pub registration_id: String,
    pub timestamp: String,
    pub team_name: String,
    pub leader_name: String,
    pub leader_email: String,
    pub leader_phone: String,
    pub leader_branch: String,
    pub leader_usn: String,
    pub leader_semester: String,
    pub member2_name: String,
    pub member2_email: String,
    pub member2_phone: String,
    pub member2_branch: String,
    pub member2_usn: String,
    pub member2_semester: String,
    pub payment_screenshot_url: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_domain: Option<String>,
}

impl From<RegistrationRecord> for RegistrationSummary {
    fn from(record: RegistrationRecord) -> Self {
        Self {
            registration_id: record.registration_id,
            timestamp: record.timestamp,
            team_name: record.team_name,
            leader_name: record.leader_name,
            leader_email: record.leader_email,
            leader_phone: record.leader_phone,
            leader_branch: record.leader_branch,
            leader_usn: record.leader_usn,
            leader_semester: record.leader_semester,
            member2_name: record.member2_name,
            member2_email: record.member2_email,
            member2_phone: record.member2_phone,
            member2_branch: record.member2_branch,
            member2_usn: record.member2_usn,
            member2_semester: record.member2_semester,
            payment_screenshot_url: record.payment_screenshot_url,
            status: record.status,
            assigned_domain: record.assigned_domain,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Generic acknowledgement for fire-and-report operator actions.
pub struct ActionResponse {
    pub message: String,
}
