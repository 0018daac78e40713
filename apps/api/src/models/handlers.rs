//! Axum route handlers for profile resume management.
//!
//! The profile is owned by the caller: each handler takes it in the request
//! and returns the updated copy.

use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::UserProfile;

#[derive(Debug, Deserialize)]
pub struct AddResumeRequest {
    #[serde(default)]
    pub profile: UserProfile,
    pub name: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetActiveResumeRequest {
    #[serde(default)]
    pub profile: UserProfile,
    pub resume_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub profile: UserProfile,
    pub has_usable_resume: bool,
}

impl From<UserProfile> for ProfileResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            has_usable_resume: profile.has_usable_resume(),
            profile,
        }
    }
}

/// POST /api/v1/profile/resumes
///
/// Appends a resume. It becomes active only if it is the profile's first.
pub async fn handle_add_resume(
    Json(request): Json<AddResumeRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }

    let mut profile = request.profile;
    profile.add_resume(Uuid::new_v4().to_string(), request.name, request.content);
    Ok(Json(profile.into()))
}

/// POST /api/v1/profile/resumes/active
///
/// Makes one resume active and deactivates every other.
pub async fn handle_set_active_resume(
    Json(request): Json<SetActiveResumeRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    let mut profile = request.profile;
    if !profile.set_active_resume(&request.resume_id) {
        return Err(AppError::NotFound(format!(
            "Resume {} not found",
            request.resume_id
        )));
    }
    Ok(Json(profile.into()))
}
