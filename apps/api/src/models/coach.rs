use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::FromRow;

use crate::fitscore::errors::FitScoreError;
use crate::fitscore::model::{
    Certification, CoachProfile, EngagementSignals, Location, RoleType, TimeSlot,
};

/// Row shape of the coach query in `matching::store` (coaches joined with users).
#[derive(Debug, Clone, FromRow)]
pub struct CoachRow {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub city: String,
    pub state: String,
    pub role_type: String,
    pub years_experience: i32,
    pub certifications: Value,
    pub available_times: Value,
    pub lifestyle_tags: Option<Value>,
    pub movement_tags: Option<Value>,
    pub instruction_tags: Option<Value>,
    pub bio: Option<String>,
    pub profile_image_url: Option<String>,
    pub verified_video_url: Option<String>,
    pub profile_completeness: Option<f64>,
    pub last_active: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<CoachRow> for CoachProfile {
    type Error = FitScoreError;

    fn try_from(row: CoachRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let bad = |msg: String| FitScoreError::MalformedProfile(format!("coach {id}: {msg}"));

        let role_type: RoleType = row.role_type.parse().map_err(bad)?;
        let years_experience = u32::try_from(row.years_experience)
            .map_err(|_| bad(format!("negative years_experience {}", row.years_experience)))?;
        let certifications: Vec<Certification> =
            decode_json(row.certifications, "certifications").map_err(bad)?;
        let available_times: BTreeSet<TimeSlot> =
            decode_json(row.available_times, "available_times").map_err(bad)?;

        Ok(CoachProfile {
            id,
            first_name: row.first_name.unwrap_or_default(),
            last_name: row.last_name.unwrap_or_default(),
            email: row.email,
            phone: row.phone,
            location: Location {
                city: row.city,
                state: row.state,
            },
            role_type,
            years_experience,
            certifications,
            available_times,
            lifestyle_tags: decode_tags(row.lifestyle_tags, "lifestyle_tags").map_err(bad)?,
            movement_tags: decode_tags(row.movement_tags, "movement_tags").map_err(bad)?,
            instruction_tags: decode_tags(row.instruction_tags, "instruction_tags")
                .map_err(bad)?,
            bio: row.bio,
            profile_photo_url: row.profile_image_url,
            engagement: EngagementSignals {
                profile_completeness: row.profile_completeness,
                last_active: row.last_active,
                verified_video_url: row.verified_video_url,
            },
            updated_at: row.updated_at,
        })
    }
}

/// Decodes a JSONB column, naming the column in the error.
pub(crate) fn decode_json<T: DeserializeOwned>(value: Value, column: &str) -> Result<T, String> {
    serde_json::from_value(value).map_err(|e| format!("invalid {column}: {e}"))
}

/// Nullable JSONB string arrays decode to an empty set.
pub(crate) fn decode_tags(value: Option<Value>, column: &str) -> Result<BTreeSet<String>, String> {
    match value {
        None | Some(Value::Null) => Ok(BTreeSet::new()),
        Some(v) => decode_json(v, column),
    }
}
