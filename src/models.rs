use crate::cycle::{CycleProfile, CycleSnapshot, PhaseInfo};
use crate::messages::RotationState;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub cycle: CycleProfile,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerProfile {
    pub id: String,
    pub name: String,
    pub link_code: String,
    pub linked_at: NaiveDateTime,
    pub notifications_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodEntry {
    pub id: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub notes: String,
    pub logged_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodEntry {
    pub id: String,
    pub mood: String,
    #[serde(default)]
    pub notes: String,
    pub date: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub notifications: bool,
    pub partner_view: bool,
    pub theme: Theme,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            notifications: true,
            partner_view: true,
            theme: Theme::default(),
        }
    }
}

/// Everything the service persists, written as one JSON document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppData {
    #[serde(deserialize_with = "skip_invalid_user")]
    pub user: Option<UserProfile>,
    pub partner: Option<PartnerProfile>,
    pub periods: Vec<PeriodEntry>,
    pub moods: Vec<MoodEntry>,
    pub settings: Settings,
    pub link_code: Option<String>,
    pub rotation: RotationState,
    pub last_notified: Option<NaiveDate>,
}

// An invalid stored profile is dropped on its own.
fn skip_invalid_user<'de, D>(deserializer: D) -> Result<Option<UserProfile>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = Option::<serde_json::Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match serde_json::from_value(value) {
        Ok(user) => Ok(Some(user)),
        Err(err) => {
            warn!("discarding stored user profile: {err}");
            Ok(None)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateProfileRequest {
    pub name: String,
    pub cycle_length: Option<i64>,
    pub last_period_date: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub cycle_length: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CreateProfileResponse {
    pub profile: UserProfile,
    pub link_code: String,
}

#[derive(Debug, Deserialize)]
pub struct LogPeriodRequest {
    pub start_date: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct LogMoodRequest {
    pub mood: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct LinkPartnerRequest {
    pub name: String,
    pub link_code: String,
}

#[derive(Debug, Serialize)]
pub struct LinkCodeResponse {
    pub link_code: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub onboarded: bool,
    pub partner_linked: bool,
}

#[derive(Debug, Serialize)]
pub struct CycleResponse {
    #[serde(flatten)]
    pub snapshot: CycleSnapshot,
    pub phase_info: &'static PhaseInfo,
    pub progress_percent: u32,
}
