use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::FromRow;

use crate::fitscore::errors::FitScoreError;
use crate::fitscore::model::{Compensation, CompensationType, JobPosting, JobStatus, Location};
use crate::models::coach::{decode_json, decode_tags};

/// Row shape of the job query in `matching::store`.
#[derive(Debug, Clone, FromRow)]
pub struct JobRow {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub role_type: String,
    pub city: String,
    pub state: String,
    pub min_experience: i32,
    pub required_certifications: Value,
    pub preferred_certifications: Option<Value>,
    pub required_availability: Value,
    pub culture_tags: Option<Value>,
    pub compensation_type: Option<String>,
    pub compensation_min: Option<f64>,
    pub compensation_max: Option<f64>,
    pub weighting_preset: String,
    pub fitscore_threshold: Option<f64>,
    pub status: String,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for JobPosting {
    type Error = FitScoreError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let bad = |msg: String| FitScoreError::MalformedJob(format!("job {id}: {msg}"));

        let min_experience = u32::try_from(row.min_experience)
            .map_err(|_| bad(format!("negative min_experience {}", row.min_experience)))?;

        // A compensation type without a minimum is malformed; an untyped range is kept.
        let compensation = match (row.compensation_type, row.compensation_min) {
            (None, None) => None,
            (kind, Some(min)) => Some(Compensation {
                kind: kind
                    .map(|k| k.parse::<CompensationType>())
                    .transpose()
                    .map_err(bad)?,
                min,
                max: row.compensation_max,
            }),
            (Some(_), None) => return Err(bad("compensation_min is missing".to_string())),
        };

        Ok(JobPosting {
            id,
            title: row.title,
            description: row.description.unwrap_or_default(),
            role_type: row.role_type.parse().map_err(bad)?,
            location: Location {
                city: row.city,
                state: row.state,
            },
            min_experience,
            required_certifications: decode_json(
                row.required_certifications,
                "required_certifications",
            )
            .map_err(bad)?,
            preferred_certifications: decode_tags(
                row.preferred_certifications,
                "preferred_certifications",
            )
            .map_err(bad)?,
            required_availability: decode_json(row.required_availability, "required_availability")
                .map_err(bad)?,
            culture_tags: decode_tags(row.culture_tags, "culture_tags").map_err(bad)?,
            compensation,
            weighting_preset: row.weighting_preset,
            fitscore_threshold: row
                .fitscore_threshold
                .unwrap_or(crate::fitscore::model::DEFAULT_THRESHOLD),
            status: row.status.parse::<JobStatus>().map_err(bad)?,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    pub fn job_row(id: i64) -> JobRow {
        JobRow {
            id,
            title: "Personal Trainer".to_string(),
            description: None,
            role_type: "Personal Trainer".to_string(),
            city: "New York".to_string(),
            state: "NY".to_string(),
            min_experience: 3,
            required_certifications: json!(["NASM-CPT"]),
            preferred_certifications: None,
            required_availability: json!(["Mon AM"]),
            culture_tags: Some(json!(["Wellness-Focused"])),
            compensation_type: Some("hourly".to_string()),
            compensation_min: Some(35.0),
            compensation_max: Some(50.0),
            weighting_preset: "balanced".to_string(),
            fitscore_threshold: Some(0.6),
            status: "open".to_string(),
            updated_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }
}
