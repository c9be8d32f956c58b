//! Read-only access to coach profiles and job postings.
//!
//! Records are written elsewhere; this service only loads them and hands them to the
//! engine. Rows that fail to decode are reported per record rather than failing the
//! whole candidate set, so one corrupt profile never hides every other coach.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::warn;

use crate::errors::AppError;
use crate::fitscore::errors::FitScoreError;
use crate::fitscore::model::{CoachProfile, EntityId, JobPosting, RoleType};
use crate::models::coach::CoachRow;
use crate::models::job::JobRow;

/// A candidate set plus the records that could not be decoded.
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub records: Vec<T>,
    pub rejected: Vec<(EntityId, FitScoreError)>,
}

impl<T> Default for Loaded<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

impl<T> Loaded<T> {
    fn collect<R>(rows: Vec<R>, id_of: impl Fn(&R) -> EntityId) -> Self
    where
        T: TryFrom<R, Error = FitScoreError>,
    {
        let mut loaded = Self::default();
        for row in rows {
            let id = id_of(&row);
            match T::try_from(row) {
                Ok(record) => loaded.records.push(record),
                Err(err) => {
                    warn!("Rejected record {id}: {err}");
                    loaded.rejected.push((id, err));
                }
            }
        }
        loaded
    }
}

#[async_trait]
pub trait MatchStore: Send + Sync {
    async fn coach(&self, id: EntityId) -> Result<CoachProfile, AppError>;

    async fn job(&self, id: EntityId) -> Result<JobPosting, AppError>;

    /// Every job with status `open`.
    async fn open_jobs(&self) -> Result<Loaded<JobPosting>, AppError>;

    /// Verified coaches of one role type.
    async fn verified_coaches(&self, role: RoleType) -> Result<Loaded<CoachProfile>, AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// PostgreSQL
// ────────────────────────────────────────────────────────────────────────────

// Columns follow the `users`, `coaches` and `jobs` tables as migrated by the profile
// service. Fields those tables lack are derived: recency comes from `last_updated`,
// phone is absent, and a job is `open` while `is_active`.
const COACH_COLUMNS: &str = r#"
    c.id::int8 AS id,
    u.first_name,
    u.last_name,
    u.email,
    NULL::text AS phone,
    c.city,
    c.state,
    c.role_type,
    c.years_experience,
    c.certifications,
    c.available_times,
    c.lifestyle_tags,
    c.movement_tags,
    c.instruction_tags,
    c.bio,
    c.profile_image_url,
    c.verified_video_url,
    c.profile_completeness::float8 AS profile_completeness,
    c.last_updated AS last_active,
    c.last_updated AS updated_at
"#;

const JOB_COLUMNS: &str = r#"
    id::int8 AS id,
    title,
    description,
    role_type,
    city,
    state,
    min_experience,
    required_certifications,
    preferred_certifications,
    required_availability,
    culture_tags,
    NULL::text AS compensation_type,
    compensation_min::float8 AS compensation_min,
    compensation_max::float8 AS compensation_max,
    weighting_preset,
    fitscore_threshold::float8 AS fitscore_threshold,
    CASE WHEN is_active THEN 'open' ELSE 'closed' END AS status,
    updated_at
"#;

#[derive(Clone)]
pub struct PgMatchStore {
    db: PgPool,
}

impl PgMatchStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MatchStore for PgMatchStore {
    async fn coach(&self, id: EntityId) -> Result<CoachProfile, AppError> {
        let row: Option<CoachRow> = sqlx::query_as(&format!(
            "SELECT {COACH_COLUMNS} FROM coaches c JOIN users u ON u.id = c.user_id WHERE c.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        let row = row.ok_or_else(|| AppError::NotFound(format!("Coach {id} not found")))?;
        Ok(CoachProfile::try_from(row)?)
    }

    async fn job(&self, id: EntityId) -> Result<JobPosting, AppError> {
        let row: Option<JobRow> =
            sqlx::query_as(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.db)
                .await?;

        let row = row.ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;
        Ok(JobPosting::try_from(row)?)
    }

    async fn open_jobs(&self) -> Result<Loaded<JobPosting>, AppError> {
        let rows: Vec<JobRow> = sqlx::query_as(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE is_active ORDER BY id"
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(Loaded::collect(rows, |r: &JobRow| r.id))
    }

    async fn verified_coaches(&self, role: RoleType) -> Result<Loaded<CoachProfile>, AppError> {
        let rows: Vec<CoachRow> = sqlx::query_as(&format!(
            r#"
            SELECT {COACH_COLUMNS}
            FROM coaches c
            JOIN users u ON u.id = c.user_id
            WHERE c.verified_at IS NOT NULL AND c.role_type = $1
            ORDER BY c.id
            "#
        ))
        .bind(role.as_str())
        .fetch_all(&self.db)
        .await?;

        Ok(Loaded::collect(rows, |r: &CoachRow| r.id))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory
// ────────────────────────────────────────────────────────────────────────────

/// Store backed by maps, for router and handler tests.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct InMemoryMatchStore {
    coaches: std::collections::BTreeMap<EntityId, (CoachProfile, bool)>,
    jobs: std::collections::BTreeMap<EntityId, JobPosting>,
}

#[cfg(test)]
impl InMemoryMatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_coach(mut self, coach: CoachProfile, verified: bool) -> Self {
        self.coaches.insert(coach.id, (coach, verified));
        self
    }

    pub fn with_job(mut self, job: JobPosting) -> Self {
        self.jobs.insert(job.id, job);
        self
    }
}

#[cfg(test)]
#[async_trait]
impl MatchStore for InMemoryMatchStore {
    async fn coach(&self, id: EntityId) -> Result<CoachProfile, AppError> {
        self.coaches
            .get(&id)
            .map(|(coach, _)| coach.clone())
            .ok_or_else(|| AppError::NotFound(format!("Coach {id} not found")))
    }

    async fn job(&self, id: EntityId) -> Result<JobPosting, AppError> {
        self.jobs
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))
    }

    async fn open_jobs(&self) -> Result<Loaded<JobPosting>, AppError> {
        Ok(Loaded {
            records: self
                .jobs
                .values()
                .filter(|job| job.status == crate::fitscore::model::JobStatus::Open)
                .cloned()
                .collect(),
            rejected: Vec::new(),
        })
    }

    async fn verified_coaches(&self, role: RoleType) -> Result<Loaded<CoachProfile>, AppError> {
        Ok(Loaded {
            records: self
                .coaches
                .values()
                .filter(|(coach, verified)| *verified && coach.role_type == role)
                .map(|(coach, _)| coach.clone())
                .collect(),
            rejected: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitscore::model::JobStatus;
    use crate::fitscore::validation::fixtures::{coach, job};
    use crate::models::coach::fixtures::coach_row;

    fn store() -> InMemoryMatchStore {
        let mut yoga = coach(3);
        yoga.role_type = RoleType::YogaInstructor;
        let mut closed = job(2);
        closed.status = JobStatus::Closed;
        InMemoryMatchStore::new()
            .with_coach(coach(1), true)
            .with_coach(coach(2), false)
            .with_coach(yoga, true)
            .with_job(job(1))
            .with_job(closed)
    }

    #[tokio::test]
    async fn test_missing_records_are_not_found() {
        let store = store();
        assert!(matches!(store.coach(99).await, Err(AppError::NotFound(_))));
        assert!(matches!(store.job(99).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_only_open_jobs() {
        let ids: Vec<_> = store().open_jobs().await.unwrap().records.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[tokio::test]
    async fn test_only_verified_coaches_of_role() {
        let loaded = store()
            .verified_coaches(RoleType::PersonalTrainer)
            .await
            .unwrap();
        let ids: Vec<_> = loaded.records.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_columns_exist_in_profile_tables() {
        assert!(COACH_COLUMNS.contains("c.last_updated AS last_active"));
        assert!(COACH_COLUMNS.contains("NULL::text AS phone"));
        assert!(!COACH_COLUMNS.contains("c.phone"));
        assert!(JOB_COLUMNS.contains("WHEN is_active THEN 'open'"));
        assert!(JOB_COLUMNS.contains("NULL::text AS compensation_type"));
    }

    #[test]
    fn test_collect_separates_bad_rows() {
        let mut broken = coach_row(2);
        broken.role_type = "Unknown".to_string();
        let loaded: Loaded<CoachProfile> =
            Loaded::collect(vec![coach_row(1), broken], |r: &CoachRow| r.id);
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.rejected.len(), 1);
        assert_eq!(loaded.rejected[0].0, 2);
    }
}
