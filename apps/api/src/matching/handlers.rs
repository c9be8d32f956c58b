use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::CapabilityToken;
use crate::config::Config;
use crate::errors::AppError;
use crate::fitscore::engine::PairFailure;
use crate::fitscore::model::{CoachProfile, EntityId, FitScoreBreakdown, JobPosting};
use crate::fitscore::presets::PresetWeights;
use crate::fitscore::scoring::ScoringContext;
use crate::state::AppState;

/// `limit` is parsed by `resolve_limit`; anything unparseable is a `VALIDATION_ERROR`.
#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct JobMatch {
    pub job: JobPosting,
    pub fitscore: f64,
    pub fitscore_breakdown: FitScoreBreakdown,
    pub rank: usize,
}

#[derive(Debug, Serialize)]
pub struct CoachMatchesResponse {
    pub coach_id: EntityId,
    pub matches: Vec<JobMatch>,
    pub total_matches: usize,
    pub failures: Vec<PairFailure>,
}

#[derive(Debug, Serialize)]
pub struct CoachCandidate {
    pub coach: CoachProfile,
    pub fitscore: f64,
    pub fitscore_breakdown: FitScoreBreakdown,
    pub rank: usize,
}

#[derive(Debug, Serialize)]
pub struct JobCandidatesResponse {
    pub job_id: EntityId,
    pub candidates: Vec<CoachCandidate>,
    pub total_candidates: usize,
    pub threshold: f64,
    pub failures: Vec<PairFailure>,
}

#[derive(Debug, Serialize)]
pub struct PairScoreResponse {
    pub coach_id: EntityId,
    pub job_id: EntityId,
    pub weighting_preset: String,
    pub fitscore: f64,
    pub fitscore_breakdown: FitScoreBreakdown,
    pub threshold: f64,
    pub admitted: bool,
    pub cached: bool,
}

#[derive(Debug, Serialize)]
pub struct PresetEntry {
    pub name: String,
    pub weights: PresetWeights,
}

#[derive(Debug, Serialize)]
pub struct PresetsResponse {
    pub presets: Vec<PresetEntry>,
    pub scorer: &'static str,
}

/// `limit` defaults to `DEFAULT_MATCH_LIMIT` and must lie in `[1, MAX_MATCH_LIMIT]`.
fn resolve_limit(requested: Option<&str>, config: &Config) -> Result<usize, AppError> {
    let Some(raw) = requested else {
        return Ok(config.default_match_limit);
    };
    let invalid = || {
        AppError::Validation(format!(
            "limit must be an integer between 1 and {}, got '{raw}'",
            config.max_match_limit
        ))
    };
    let n: usize = raw.trim().parse().map_err(|_| invalid())?;
    if (1..=config.max_match_limit).contains(&n) {
        Ok(n)
    } else {
        Err(invalid())
    }
}

fn scoring_context(config: &Config) -> ScoringContext {
    ScoringContext {
        strict_certifications: config.strict_certifications,
        ..ScoringContext::now()
    }
}

/// GET /api/v1/coaches/:id/matches
pub async fn handle_coach_matches(
    State(state): State<AppState>,
    _token: CapabilityToken,
    Path(coach_id): Path<EntityId>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<CoachMatchesResponse>, AppError> {
    let limit = resolve_limit(params.limit.as_deref(), &state.config)?;
    let coach = state.store.coach(coach_id).await?;
    let jobs = state.store.open_jobs().await?;
    let ctx = scoring_context(&state.config);

    // CPU-bound scoring runs on the blocking pool.
    let engine = state.engine.clone();
    let records = jobs.records;
    let outcome = tokio::task::spawn_blocking(move || {
        engine.matches_for_coach(&coach, records, limit, &ctx)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed: {e}")))??;

    let mut failures = outcome.failures;
    failures.extend(
        jobs.rejected
            .iter()
            .map(|(job_id, err)| PairFailure::new(coach_id, *job_id, err)),
    );

    let matches: Vec<JobMatch> = outcome
        .ranking
        .iter()
        .map(|(rank, entry)| JobMatch {
            job: entry.entity.clone(),
            fitscore: entry.fitscore(),
            fitscore_breakdown: entry.score.fitscore_breakdown,
            rank,
        })
        .collect();

    info!(
        "Coach {coach_id}: {} matches from {} open jobs",
        matches.len(),
        outcome.evaluated
    );
    Ok(Json(CoachMatchesResponse {
        coach_id,
        total_matches: matches.len(),
        matches,
        failures,
    }))
}

/// GET /api/v1/jobs/:id/candidates
pub async fn handle_job_candidates(
    State(state): State<AppState>,
    _token: CapabilityToken,
    Path(job_id): Path<EntityId>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<JobCandidatesResponse>, AppError> {
    let limit = resolve_limit(params.limit.as_deref(), &state.config)?;
    let job = state.store.job(job_id).await?;
    // Bad preset or threshold fails the request before any coach is loaded.
    let resolved = state.engine.resolve(&job)?;
    let coaches = state.store.verified_coaches(job.role_type).await?;
    let ctx = scoring_context(&state.config);

    let outcome = state
        .engine
        .par_candidates_for_job(job, coaches.records, limit, ctx)
        .await?;

    let mut failures = outcome.failures;
    failures.extend(
        coaches
            .rejected
            .iter()
            .map(|(coach_id, err)| PairFailure::new(*coach_id, job_id, err)),
    );

    let candidates: Vec<CoachCandidate> = outcome
        .ranking
        .iter()
        .map(|(rank, entry)| CoachCandidate {
            coach: entry.entity.clone(),
            fitscore: entry.fitscore(),
            fitscore_breakdown: entry.score.fitscore_breakdown,
            rank,
        })
        .collect();

    info!(
        "Job {job_id}: {} candidates from {} verified coaches",
        candidates.len(),
        outcome.evaluated
    );
    Ok(Json(JobCandidatesResponse {
        job_id,
        total_candidates: candidates.len(),
        candidates,
        threshold: resolved.threshold.value(),
        failures,
    }))
}

/// GET /api/v1/coaches/:coach_id/jobs/:job_id/fitscore
pub async fn handle_pair_fitscore(
    State(state): State<AppState>,
    _token: CapabilityToken,
    Path((coach_id, job_id)): Path<(EntityId, EntityId)>,
) -> Result<Json<PairScoreResponse>, AppError> {
    let coach = state.store.coach(coach_id).await?;
    let job = state.store.job(job_id).await?;
    let resolved = state.engine.resolve(&job)?;

    let (pair, cached) = match state.cache.get(&coach, &job).await {
        Some(pair) => (pair, true),
        None => {
            let (pair, _) = state
                .engine
                .score_one(&coach, &job, &scoring_context(&state.config))?;
            state.cache.put(&coach, &job, &pair).await;
            (pair, false)
        }
    };

    Ok(Json(PairScoreResponse {
        coach_id,
        job_id,
        weighting_preset: job.weighting_preset,
        fitscore: pair.fitscore,
        fitscore_breakdown: pair.fitscore_breakdown,
        threshold: resolved.threshold.value(),
        admitted: resolved.threshold.admits(pair.fitscore),
        cached,
    }))
}

/// GET /api/v1/presets
pub async fn handle_list_presets(
    State(state): State<AppState>,
    _token: CapabilityToken,
) -> Json<PresetsResponse> {
    let presets = state
        .engine
        .catalog()
        .iter()
        .map(|(name, weights)| PresetEntry {
            name: name.to_string(),
            weights: *weights,
        })
        .collect();
    Json(PresetsResponse {
        presets,
        scorer: state.engine.scorer_backend(),
    })
}
