//! Batch matching: score many pairs, drop sub-threshold results, rank, truncate.
//!
//! # Error policy
//! - Request-level errors (the job's preset or threshold is invalid, or the batch
//!   subject itself is malformed) are returned as `Err` before any pair is scored.
//! - Pair-level errors never abort a batch: the pair is excluded and reported in
//!   `BatchOutcome::failures`.
//!
//! # Parallelism
//! Scoring is CPU-bound and pure. `par_candidates_for_job` splits the candidate set into
//! partitions, scores each inside `tokio::task::spawn_blocking`, and merges the
//! per-partition rankings with `merge_ranked`.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::fitscore::errors::FitScoreError;
use crate::fitscore::model::{CoachProfile, EntityId, JobPosting, ScoredPair};
use crate::fitscore::presets::{PresetCatalog, PresetWeights};
use crate::fitscore::ranker::{merge_ranked, rank, Ranking, ScoredEntity};
use crate::fitscore::scoring::{FitScorer, ScoringContext};
use crate::fitscore::threshold::{filter_admitted, Threshold};
use crate::fitscore::validation::{validate_job, validate_profile};

pub const DEFAULT_PARTITION_SIZE: usize = 256;

// ────────────────────────────────────────────────────────────────────────────
// Output types
// ────────────────────────────────────────────────────────────────────────────

/// A (coach, job) pair that could not be scored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairFailure {
    pub coach_id: EntityId,
    pub job_id: EntityId,
    pub code: String,
    pub message: String,
}

impl PairFailure {
    pub fn new(coach_id: EntityId, job_id: EntityId, err: &FitScoreError) -> Self {
        Self {
            coach_id,
            job_id,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

/// Result of one batch: admitted entities in rank order plus every per-pair failure.
#[derive(Debug, Clone)]
pub struct BatchOutcome<T> {
    pub ranking: Ranking<T>,
    pub failures: Vec<PairFailure>,
    /// Pairs attempted, including failures.
    pub evaluated: usize,
    /// Pairs at or above their threshold, before truncation.
    pub admitted: usize,
}

impl<T> BatchOutcome<T> {
    fn merge(parts: Vec<BatchOutcome<T>>, limit: usize) -> Self {
        let mut rankings = Vec::with_capacity(parts.len());
        let mut failures = Vec::new();
        let mut evaluated = 0;
        let mut admitted = 0;
        for part in parts {
            rankings.push(part.ranking);
            failures.extend(part.failures);
            evaluated += part.evaluated;
            admitted += part.admitted;
        }
        Self {
            ranking: merge_ranked(rankings, limit),
            failures,
            evaluated,
            admitted,
        }
    }
}

/// A job's preset and threshold, checked once per request.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedJob {
    pub weights: PresetWeights,
    pub threshold: Threshold,
}

// ────────────────────────────────────────────────────────────────────────────
// Engine
// ────────────────────────────────────────────────────────────────────────────

/// Stateless orchestrator. Cloning is cheap; all members are shared and immutable.
#[derive(Clone)]
pub struct MatchEngine {
    catalog: Arc<PresetCatalog>,
    scorer: Arc<dyn FitScorer>,
    partition_size: usize,
}

impl MatchEngine {
    pub fn new(catalog: Arc<PresetCatalog>, scorer: Arc<dyn FitScorer>) -> Self {
        Self {
            catalog,
            scorer,
            partition_size: DEFAULT_PARTITION_SIZE,
        }
    }

    pub fn with_partition_size(mut self, partition_size: usize) -> Self {
        self.partition_size = partition_size.max(1);
        self
    }

    pub fn catalog(&self) -> &PresetCatalog {
        &self.catalog
    }

    pub fn scorer_backend(&self) -> &'static str {
        self.scorer.backend()
    }

    pub fn resolve(&self, job: &JobPosting) -> Result<ResolvedJob, FitScoreError> {
        Ok(ResolvedJob {
            weights: *self.catalog.get(&job.weighting_preset)?,
            threshold: Threshold::new(job.fitscore_threshold)?,
        })
    }

    /// Scores a single pair with the job's own preset, ignoring the threshold.
    pub fn score_one(
        &self,
        coach: &CoachProfile,
        job: &JobPosting,
        ctx: &ScoringContext,
    ) -> Result<(ScoredPair, Threshold), FitScoreError> {
        let resolved = self.resolve(job)?;
        let pair = self.scorer.score(coach, job, &resolved.weights, ctx)?;
        Ok((pair, resolved.threshold))
    }

    /// Top coaches for one job. Uses the job's preset and threshold for every pair.
    pub fn candidates_for_job(
        &self,
        job: &JobPosting,
        coaches: Vec<CoachProfile>,
        limit: usize,
        ctx: &ScoringContext,
    ) -> Result<BatchOutcome<CoachProfile>, FitScoreError> {
        let resolved = self.resolve(job)?;
        validate_job(job)?;
        let outcome = score_candidates(self.scorer.as_ref(), job, resolved, coaches, limit, ctx);
        log_outcome("job", job.id, &outcome);
        Ok(outcome)
    }

    /// Top jobs for one coach. Each job brings its own preset and threshold, so a job
    /// with an invalid configuration is a pair failure rather than a request failure.
    pub fn matches_for_coach(
        &self,
        coach: &CoachProfile,
        jobs: Vec<JobPosting>,
        limit: usize,
        ctx: &ScoringContext,
    ) -> Result<BatchOutcome<JobPosting>, FitScoreError> {
        validate_profile(coach)?;

        let evaluated = jobs.len();
        let mut failures = Vec::new();
        let mut scored = Vec::new();

        for job in jobs {
            let result = self
                .resolve(&job)
                .and_then(|r| Ok((self.scorer.score(coach, &job, &r.weights, ctx)?, r.threshold)));
            match result {
                Ok((pair, threshold)) if threshold.admits(pair.fitscore) => {
                    scored.push(ScoredEntity {
                        id: job.id,
                        entity: job,
                        score: pair,
                    });
                }
                Ok(_) => {}
                Err(err) if err.is_configuration() => {
                    warn!("Job {} has an invalid configuration: {err}", job.id);
                    failures.push(PairFailure::new(coach.id, job.id, &err));
                }
                Err(err) => {
                    debug!("Skipping job {} for coach {}: {err}", job.id, coach.id);
                    failures.push(PairFailure::new(coach.id, job.id, &err));
                }
            }
        }

        let admitted = scored.len();
        let outcome = BatchOutcome {
            ranking: rank(scored, limit),
            failures,
            evaluated,
            admitted,
        };
        log_outcome("coach", coach.id, &outcome);
        Ok(outcome)
    }

    /// Parallel variant of `candidates_for_job`. Sets that fit in one partition are
    /// scored inline.
    pub async fn par_candidates_for_job(
        &self,
        job: JobPosting,
        coaches: Vec<CoachProfile>,
        limit: usize,
        ctx: ScoringContext,
    ) -> Result<BatchOutcome<CoachProfile>, AppError> {
        if coaches.len() <= self.partition_size {
            return Ok(self.candidates_for_job(&job, coaches, limit, &ctx)?);
        }

        let resolved = self.resolve(&job)?;
        validate_job(&job)?;

        let job = Arc::new(job);
        let mut handles = Vec::new();
        let mut remaining = coaches;
        while !remaining.is_empty() {
            let tail = remaining.split_off(remaining.len().min(self.partition_size));
            let partition = std::mem::replace(&mut remaining, tail);
            let scorer = Arc::clone(&self.scorer);
            let job = Arc::clone(&job);
            // CPU-bound scoring runs on the blocking pool.
            handles.push(tokio::task::spawn_blocking(move || {
                score_candidates(scorer.as_ref(), &job, resolved, partition, limit, &ctx)
            }));
        }

        let mut parts = Vec::with_capacity(handles.len());
        for handle in handles {
            let part = handle.await.map_err(|e| {
                AppError::Internal(anyhow::anyhow!("spawn_blocking failed while scoring: {e}"))
            })?;
            parts.push(part);
        }

        let outcome = BatchOutcome::merge(parts, limit);
        log_outcome("job", job.id, &outcome);
        Ok(outcome)
    }
}

/// Scores one partition of coaches against a job whose configuration is already resolved.
fn score_candidates(
    scorer: &dyn FitScorer,
    job: &JobPosting,
    resolved: ResolvedJob,
    coaches: Vec<CoachProfile>,
    limit: usize,
    ctx: &ScoringContext,
) -> BatchOutcome<CoachProfile> {
    let evaluated = coaches.len();
    let mut failures = Vec::new();
    let mut scored = Vec::with_capacity(coaches.len());

    for coach in coaches {
        match scorer.score(&coach, job, &resolved.weights, ctx) {
            Ok(pair) => scored.push(ScoredEntity {
                id: coach.id,
                entity: coach,
                score: pair,
            }),
            Err(err) => {
                debug!("Skipping coach {} for job {}: {err}", coach.id, job.id);
                failures.push(PairFailure::new(coach.id, job.id, &err));
            }
        }
    }

    let scored = filter_admitted(scored, resolved.threshold, ScoredEntity::fitscore);
    let admitted = scored.len();
    BatchOutcome {
        ranking: rank(scored, limit),
        failures,
        evaluated,
        admitted,
    }
}

fn log_outcome<T>(subject: &str, id: EntityId, outcome: &BatchOutcome<T>) {
    if !outcome.failures.is_empty() {
        warn!(
            "{} of {} pairs failed to score for {subject} {id}",
            outcome.failures.len(),
            outcome.evaluated
        );
    }
    if outcome.ranking.is_empty() && outcome.evaluated > 0 {
        debug!("No pair cleared the threshold for {subject} {id}");
    }
    debug!(
        "Ranked {subject} {id}: evaluated={} admitted={} returned={}",
        outcome.evaluated,
        outcome.admitted,
        outcome.ranking.len()
    );
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
