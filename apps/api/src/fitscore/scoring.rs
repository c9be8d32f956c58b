//! FitScore scoring: pluggable, trait-based scorer for one (coach, job) pair.
//!
//! Default: `WeightedFitScorer` (pure, deterministic, no I/O). Each of the six
//! components is computed independently, clamped to [0, 1], and combined with the
//! job's preset weights.
//!
//! `AppState` holds an `Arc<dyn FitScorer>`, so alternative scorers can be swapped in
//! without touching the engine or the handlers.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fitscore::errors::FitScoreError;
use crate::fitscore::model::{CoachProfile, FitScoreBreakdown, JobPosting, ScoredPair};
use crate::fitscore::presets::PresetWeights;
use crate::fitscore::validation::{normalize_name, profile_completeness, validate_job, validate_profile};

// ────────────────────────────────────────────────────────────────────────────
// Coefficients and per-call context
// ────────────────────────────────────────────────────────────────────────────

/// Tunable constants of the component formulas. Loaded once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringCoefficients {
    /// Certification score for holding every required certification.
    pub cert_base: f64,
    /// Extra certification credit, scaled by the fraction of preferred certifications held.
    pub cert_preferred_bonus: f64,
    /// Experience score at exactly the job's minimum.
    pub experience_base: f64,
    /// Maximum extra experience credit, approached asymptotically.
    pub experience_bonus: f64,
    /// Years of excess experience after which ~63% of the bonus is earned.
    pub experience_scale_years: f64,
    pub same_state_score: f64,
    pub other_state_score: f64,
    pub engagement_base: f64,
    pub completeness_weight: f64,
    pub recency_weight: f64,
    pub video_bonus: f64,
    /// Activity within this many days counts as fully recent.
    pub recency_grace_days: f64,
    pub recency_half_life_days: f64,
}

impl Default for ScoringCoefficients {
    fn default() -> Self {
        Self {
            cert_base: 0.7,
            cert_preferred_bonus: 0.3,
            experience_base: 0.7,
            experience_bonus: 0.3,
            experience_scale_years: 4.0,
            same_state_score: 0.5,
            other_state_score: 0.0,
            engagement_base: 0.4,
            completeness_weight: 0.3,
            recency_weight: 0.2,
            video_bonus: 0.1,
            recency_grace_days: 30.0,
            recency_half_life_days: 30.0,
        }
    }
}

impl ScoringCoefficients {
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("cert_base", self.cert_base),
            ("cert_preferred_bonus", self.cert_preferred_bonus),
            ("experience_base", self.experience_base),
            ("experience_bonus", self.experience_bonus),
            ("experience_scale_years", self.experience_scale_years),
            ("same_state_score", self.same_state_score),
            ("other_state_score", self.other_state_score),
            ("engagement_base", self.engagement_base),
            ("completeness_weight", self.completeness_weight),
            ("recency_weight", self.recency_weight),
            ("video_bonus", self.video_bonus),
            ("recency_grace_days", self.recency_grace_days),
            ("recency_half_life_days", self.recency_half_life_days),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("coefficient {name} must be a non-negative number, got {value}"));
            }
        }
        if self.experience_scale_years == 0.0 || self.recency_half_life_days == 0.0 {
            return Err("experience_scale_years and recency_half_life_days must be positive".into());
        }
        if self.other_state_score > self.same_state_score || self.same_state_score > 1.0 {
            return Err("location scores must satisfy other_state <= same_state <= 1.0".into());
        }
        Ok(())
    }
}

/// Per-call inputs that are not part of either record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringContext {
    /// Reference time for recency and certification expiry. Fixed per batch.
    pub as_of: DateTime<Utc>,
    /// Surface a missing required certification as `RequirementNotMet` instead of 0.0.
    pub strict_certifications: bool,
}

impl ScoringContext {
    pub fn at(as_of: DateTime<Utc>) -> Self {
        Self {
            as_of,
            strict_certifications: false,
        }
    }

    pub fn now() -> Self {
        Self::at(Utc::now())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// The fit scorer trait. Implementations must be pure: same inputs, same output.
pub trait FitScorer: Send + Sync {
    fn score(
        &self,
        coach: &CoachProfile,
        job: &JobPosting,
        weights: &PresetWeights,
        ctx: &ScoringContext,
    ) -> Result<ScoredPair, FitScoreError>;

    /// Label reported alongside results, e.g. "weighted".
    fn backend(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// WeightedFitScorer: default implementation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct WeightedFitScorer {
    pub coefficients: ScoringCoefficients,
}

impl WeightedFitScorer {
    pub fn new(coefficients: ScoringCoefficients) -> Self {
        Self { coefficients }
    }
}

impl FitScorer for WeightedFitScorer {
    fn score(
        &self,
        coach: &CoachProfile,
        job: &JobPosting,
        weights: &PresetWeights,
        ctx: &ScoringContext,
    ) -> Result<ScoredPair, FitScoreError> {
        score_pair(coach, job, weights, &self.coefficients, ctx)
    }

    fn backend(&self) -> &'static str {
        "weighted"
    }
}

/// Validates both records, computes the six components and their weighted total.
pub fn score_pair(
    coach: &CoachProfile,
    job: &JobPosting,
    weights: &PresetWeights,
    coeff: &ScoringCoefficients,
    ctx: &ScoringContext,
) -> Result<ScoredPair, FitScoreError> {
    validate_profile(coach)?;
    validate_job(job)?;

    let breakdown = FitScoreBreakdown {
        certification_score: certification_score(coach, job, coeff, ctx)?,
        experience_score: experience_score(coach.years_experience, job.min_experience, coeff),
        availability_score: availability_score(coach, job),
        location_score: location_score(coach, job, coeff),
        culture_score: culture_score(coach, job),
        engagement_score: engagement_score(coach, coeff, ctx.as_of),
    };

    Ok(ScoredPair {
        fitscore: weights.apply(&breakdown),
        fitscore_breakdown: breakdown,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Components
// ────────────────────────────────────────────────────────────────────────────

/// Hard gate on required certifications, then partial credit for preferred ones.
/// Certifications expired as of `ctx.as_of` do not count.
pub fn certification_score(
    coach: &CoachProfile,
    job: &JobPosting,
    coeff: &ScoringCoefficients,
    ctx: &ScoringContext,
) -> Result<f64, FitScoreError> {
    let today = ctx.as_of.date_naive();
    let held: HashSet<String> = coach
        .certifications
        .iter()
        .filter(|c| c.is_current(today))
        .map(|c| normalize_name(&c.name))
        .collect();

    let missing: Vec<String> = job
        .required_certifications
        .iter()
        .filter(|name| !held.contains(&normalize_name(name)))
        .cloned()
        .collect();

    if !missing.is_empty() {
        if ctx.strict_certifications {
            return Err(FitScoreError::RequirementNotMet { missing });
        }
        return Ok(0.0);
    }

    let preferred_ratio = if job.preferred_certifications.is_empty() {
        1.0
    } else {
        let matched = job
            .preferred_certifications
            .iter()
            .filter(|name| held.contains(&normalize_name(name)))
            .count();
        matched as f64 / job.preferred_certifications.len() as f64
    };

    Ok((coeff.cert_base + coeff.cert_preferred_bonus * preferred_ratio).clamp(0.0, 1.0))
}

/// 0.0 below the minimum; above it, diminishing returns toward
/// `experience_base + experience_bonus`.
pub fn experience_score(years: u32, min_years: u32, coeff: &ScoringCoefficients) -> f64 {
    if years < min_years {
        return 0.0;
    }
    let excess = f64::from(years - min_years);
    let saturation = 1.0 - (-excess / coeff.experience_scale_years).exp();
    (coeff.experience_base + coeff.experience_bonus * saturation).clamp(0.0, 1.0)
}

/// Share of the job's required slots the coach covers. 1.0 when none are required.
pub fn availability_score(coach: &CoachProfile, job: &JobPosting) -> f64 {
    if job.required_availability.is_empty() {
        return 1.0;
    }
    let covered = job
        .required_availability
        .intersection(&coach.available_times)
        .count();
    (covered as f64 / job.required_availability.len() as f64).clamp(0.0, 1.0)
}

pub fn location_score(coach: &CoachProfile, job: &JobPosting, coeff: &ScoringCoefficients) -> f64 {
    let same_state =
        coach.location.state.trim().to_uppercase() == job.location.state.trim().to_uppercase();
    let same_city = normalize_name(&coach.location.city) == normalize_name(&job.location.city);

    let score = match (same_state, same_city) {
        (true, true) => 1.0,
        (true, false) => coeff.same_state_score,
        (false, _) => coeff.other_state_score,
    };
    score.clamp(0.0, 1.0)
}

/// Share of the job's culture tags found among the coach's tags. 1.0 when the job
/// lists none.
pub fn culture_score(coach: &CoachProfile, job: &JobPosting) -> f64 {
    let job_tags: HashSet<String> = job.culture_tags.iter().map(|t| normalize_name(t)).collect();
    if job_tags.is_empty() {
        return 1.0;
    }
    let coach_tags: HashSet<String> = coach.all_tags().map(|t| normalize_name(t)).collect();
    let overlap = job_tags.intersection(&coach_tags).count();
    (overlap as f64 / job_tags.len() as f64).clamp(0.0, 1.0)
}

pub fn engagement_score(
    coach: &CoachProfile,
    coeff: &ScoringCoefficients,
    as_of: DateTime<Utc>,
) -> f64 {
    let completeness = coach
        .engagement
        .profile_completeness
        .unwrap_or_else(|| profile_completeness(coach))
        .clamp(0.0, 1.0);
    let recency = compute_recency_score(coach.engagement.last_active, as_of, coeff);
    let has_video = coach
        .engagement
        .verified_video_url
        .as_deref()
        .is_some_and(|url| !url.trim().is_empty());

    let score = coeff.engagement_base
        + coeff.completeness_weight * completeness
        + coeff.recency_weight * recency
        + if has_video { coeff.video_bonus } else { 0.0 };
    score.clamp(0.0, 1.0)
}

/// 1.0 within the grace window, then half-life exponential decay. 0.0 if never active.
pub fn compute_recency_score(
    last_active: Option<DateTime<Utc>>,
    as_of: DateTime<Utc>,
    coeff: &ScoringCoefficients,
) -> f64 {
    let Some(last_active) = last_active else {
        return 0.0;
    };
    let days_since = (as_of - last_active).num_seconds() as f64 / 86_400.0;
    if days_since <= coeff.recency_grace_days {
        return 1.0;
    }
    let decay_days = days_since - coeff.recency_grace_days;
    0.5_f64
        .powf(decay_days / coeff.recency_half_life_days)
        .clamp(0.0, 1.0)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitscore::model::{parse_slots, Certification, Component};
    use crate::fitscore::presets::{PresetCatalog, BALANCED};
    use crate::fitscore::validation::fixtures::{coach, job};
    use chrono::{Duration, NaiveDate, TimeZone};

    fn ctx() -> ScoringContext {
        ScoringContext::at(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap())
    }

    fn names(items: &[&str]) -> std::collections::BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_missing_required_certification_scores_zero() {
        let mut c = coach(1);
        c.certifications = vec![Certification::named("ACE")];
        let mut j = job(1);
        j.required_certifications = names(&["NASM-CPT", "ACE"]);
        let score = certification_score(&c, &j, &ScoringCoefficients::default(), &ctx()).unwrap();
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_missing_required_certification_strict_mode_errors() {
        let mut c = coach(1);
        c.certifications = vec![Certification::named("ACE")];
        let mut j = job(1);
        j.required_certifications = names(&["NASM-CPT", "ACE"]);
        let strict = ScoringContext {
            strict_certifications: true,
            ..ctx()
        };
        let err = certification_score(&c, &j, &ScoringCoefficients::default(), &strict).unwrap_err();
        assert_eq!(
            err,
            FitScoreError::RequirementNotMet {
                missing: vec!["NASM-CPT".to_string()]
            }
        );
    }

    #[test]
    fn test_all_required_no_preferred_scores_full() {
        let score =
            certification_score(&coach(1), &job(1), &ScoringCoefficients::default(), &ctx()).unwrap();
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_preferred_certifications_partial_bonus() {
        let mut j = job(1);
        j.preferred_certifications = names(&["ACE", "RYT-200"]);
        let score = certification_score(&coach(1), &j, &ScoringCoefficients::default(), &ctx()).unwrap();
        // 0.7 base + 0.3 × 1/2
        assert!((score - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_certification_names_case_insensitive() {
        let mut j = job(1);
        j.required_certifications = names(&["nasm-cpt "]);
        let score = certification_score(&coach(1), &j, &ScoringCoefficients::default(), &ctx()).unwrap();
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_expired_certification_does_not_count() {
        let mut c = coach(1);
        c.certifications[0].expiry_date = NaiveDate::from_ymd_opt(2025, 12, 31);
        let score = certification_score(&c, &job(1), &ScoringCoefficients::default(), &ctx()).unwrap();
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_removing_required_certification_drops_to_zero() {
        let mut j = job(1);
        j.required_certifications = names(&["NASM-CPT", "ACE"]);
        let c = coach(1);
        let coeff = ScoringCoefficients::default();
        assert!(certification_score(&c, &j, &coeff, &ctx()).unwrap() > 0.0);

        let mut without = c.clone();
        without.certifications.retain(|cert| cert.name != "ACE");
        assert_eq!(certification_score(&without, &j, &coeff, &ctx()).unwrap(), 0.0);
    }

    #[test]
    fn test_experience_below_minimum() {
        assert_eq!(experience_score(2, 5, &ScoringCoefficients::default()), 0.0);
    }

    #[test]
    fn test_experience_exact_minimum() {
        assert!((experience_score(3, 3, &ScoringCoefficients::default()) - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_experience_monotone_and_saturating() {
        let coeff = ScoringCoefficients::default();
        let mut previous = 0.0;
        for years in 0..60 {
            let s = experience_score(years, 5, &coeff);
            assert!(s >= previous, "score dropped at {years} years");
            assert!((0.0..=1.0).contains(&s));
            previous = s;
        }
        assert!(experience_score(40, 0, &coeff) > 0.99);
        // diminishing returns: the 2nd excess year adds less than the 1st
        let d1 = experience_score(6, 5, &coeff) - experience_score(5, 5, &coeff);
        let d2 = experience_score(7, 5, &coeff) - experience_score(6, 5, &coeff);
        assert!(d2 < d1);
    }

    #[test]
    fn test_availability_overlap_ratio() {
        let mut c = coach(1);
        c.available_times = parse_slots(&["Mon AM", "Wed PM", "Fri AM"]).unwrap();
        let mut j = job(1);
        j.required_availability = parse_slots(&["Mon AM", "Wed PM", "Fri AM", "Sat AM"]).unwrap();
        assert!((availability_score(&c, &j) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_availability_no_requirements_is_full() {
        let mut j = job(1);
        j.required_availability.clear();
        let mut c = coach(1);
        c.available_times.clear();
        assert_eq!(availability_score(&c, &j), 1.0);
        assert_eq!(availability_score(&coach(2), &j), 1.0);
    }

    #[test]
    fn test_availability_no_overlap() {
        let mut c = coach(1);
        c.available_times = parse_slots(&["Tue PM"]).unwrap();
        assert_eq!(availability_score(&c, &job(1)), 0.0);
    }

    #[test]
    fn test_location_tiers() {
        let coeff = ScoringCoefficients::default();
        let j = job(1);

        let mut c = coach(1);
        c.location.city = "new york ".to_string();
        c.location.state = "ny".to_string();
        assert_eq!(location_score(&c, &j, &coeff), 1.0);

        c.location.city = "Buffalo".to_string();
        let same_state = location_score(&c, &j, &coeff);

        c.location.city = "Boston".to_string();
        c.location.state = "MA".to_string();
        let other_state = location_score(&c, &j, &coeff);

        assert!(same_state > other_state);
        assert!(same_state < 1.0);
        assert_eq!(other_state, 0.0);
    }

    #[test]
    fn test_culture_no_requirements_is_full() {
        assert_eq!(culture_score(&coach(1), &job(1)), 1.0);
    }

    #[test]
    fn test_culture_partial_match_across_tag_groups() {
        let mut c = coach(1);
        c.lifestyle_tags = names(&["Wellness-Focused"]);
        c.movement_tags = names(&["high-energy"]);
        let mut j = job(1);
        j.culture_tags = names(&["Wellness-Focused", "High-Energy", "Motivational"]);
        assert!((culture_score(&c, &j) - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_culture_no_match() {
        let mut c = coach(1);
        c.lifestyle_tags = names(&["Technical"]);
        let mut j = job(1);
        j.culture_tags = names(&["High-Energy", "Motivational"]);
        assert_eq!(culture_score(&c, &j), 0.0);
    }

    #[test]
    fn test_engagement_minimal_profile() {
        let mut c = coach(1);
        c.engagement.profile_completeness = Some(0.0);
        let s = engagement_score(&c, &ScoringCoefficients::default(), ctx().as_of);
        assert!((s - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_engagement_maximum() {
        let mut c = coach(1);
        c.engagement.profile_completeness = Some(1.0);
        c.engagement.last_active = Some(ctx().as_of - Duration::days(2));
        c.engagement.verified_video_url = Some("https://cdn.example.com/v.mp4".to_string());
        let s = engagement_score(&c, &ScoringCoefficients::default(), ctx().as_of);
        assert!((s - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_engagement_monotone_in_completeness() {
        let coeff = ScoringCoefficients::default();
        let mut c = coach(1);
        let mut previous = -1.0;
        for step in 0..=10 {
            c.engagement.profile_completeness = Some(step as f64 / 10.0);
            let s = engagement_score(&c, &coeff, ctx().as_of);
            assert!(s > previous);
            previous = s;
        }
    }

    #[test]
    fn test_recency_decay() {
        let coeff = ScoringCoefficients::default();
        let now = ctx().as_of;
        assert_eq!(compute_recency_score(None, now, &coeff), 0.0);
        assert_eq!(compute_recency_score(Some(now - Duration::days(10)), now, &coeff), 1.0);
        let one_half_life = compute_recency_score(Some(now - Duration::days(60)), now, &coeff);
        assert!((one_half_life - 0.5).abs() < 1e-9);
        let old = compute_recency_score(Some(now - Duration::days(400)), now, &coeff);
        assert!(old < 0.001, "Score was {old}");
    }

    #[test]
    fn test_total_is_weighted_sum_of_components() {
        let mut j = job(1);
        j.culture_tags = names(&["Wellness-Focused", "Motivational"]);
        let catalog = PresetCatalog::builtin();
        let weights = catalog.get("culture_heavy").unwrap();
        let pair = score_pair(&coach(1), &j, weights, &ScoringCoefficients::default(), &ctx()).unwrap();

        let expected: f64 = Component::ALL
            .iter()
            .map(|&c| weights.get(c) * pair.fitscore_breakdown.get(c))
            .sum();
        assert!((pair.fitscore - expected).abs() < 1e-9);
    }

    #[test]
    fn test_all_scores_within_unit_interval() {
        let catalog = PresetCatalog::builtin();
        let coeff = ScoringCoefficients::default();
        let mut c = coach(1);
        c.years_experience = 30;
        c.engagement.profile_completeness = Some(1.0);
        c.engagement.verified_video_url = Some("v".to_string());
        c.engagement.last_active = Some(ctx().as_of);
        for (_, weights) in catalog.iter() {
            for candidate in [coach(2), c.clone()] {
                let pair = score_pair(&candidate, &job(1), weights, &coeff, &ctx()).unwrap();
                assert!((0.0..=1.0).contains(&pair.fitscore));
                for (_, s) in pair.fitscore_breakdown.iter() {
                    assert!((0.0..=1.0).contains(&s));
                }
            }
        }
    }

    #[test]
    fn test_perfect_match_scores_near_one() {
        let mut c = coach(1);
        c.years_experience = 40;
        c.engagement.profile_completeness = Some(1.0);
        c.engagement.last_active = Some(ctx().as_of);
        c.engagement.verified_video_url = Some("https://cdn.example.com/v.mp4".to_string());
        let mut j = job(1);
        j.preferred_certifications = names(&["ACE"]);
        j.culture_tags = names(&["Wellness-Focused"]);
        let pair = score_pair(&c, &j, &BALANCED, &ScoringCoefficients::default(), &ctx()).unwrap();
        assert!(pair.fitscore >= 0.99, "Score was {}", pair.fitscore);
    }

    #[test]
    fn test_poor_match_scores_low() {
        let mut c = coach(1);
        c.certifications = vec![Certification::named("RYT-200")];
        c.years_experience = 1;
        c.available_times = parse_slots(&["Tue PM"]).unwrap();
        c.location.city = "Boston".to_string();
        c.location.state = "MA".to_string();
        c.lifestyle_tags = names(&["Technical"]);
        c.engagement.profile_completeness = Some(0.0);
        let mut j = job(1);
        j.min_experience = 5;
        j.culture_tags = names(&["High-Energy", "Community-Oriented"]);

        let pair = score_pair(&c, &j, &BALANCED, &ScoringCoefficients::default(), &ctx()).unwrap();
        assert!(pair.fitscore < 0.1, "Score was {}", pair.fitscore);
        assert_eq!(pair.fitscore_breakdown.certification_score, 0.0);
        assert_eq!(pair.fitscore_breakdown.experience_score, 0.0);
        assert_eq!(pair.fitscore_breakdown.availability_score, 0.0);
        assert_eq!(pair.fitscore_breakdown.location_score, 0.0);
    }

    #[test]
    fn test_different_presets_produce_different_scores() {
        let mut j = job(1);
        j.culture_tags = names(&["Wellness-Focused", "High-Energy"]);
        let catalog = PresetCatalog::builtin();
        let coeff = ScoringCoefficients::default();
        let score = |name: &str| {
            score_pair(&coach(1), &j, catalog.get(name).unwrap(), &coeff, &ctx())
                .unwrap()
                .fitscore
        };
        assert!((score("balanced") - score("culture_heavy")).abs() > 1e-6);
        assert!((score("balanced") - score("experience_heavy")).abs() > 1e-6);
    }

    #[test]
    fn test_malformed_profile_is_rejected() {
        let mut c = coach(1);
        c.location.state = "NYC".to_string();
        let err = score_pair(&c, &job(1), &BALANCED, &ScoringCoefficients::default(), &ctx())
            .unwrap_err();
        assert!(matches!(err, FitScoreError::MalformedProfile(_)));
    }

    #[test]
    fn test_scorer_backend_label() {
        assert_eq!(WeightedFitScorer::default().backend(), "weighted");
    }

    #[test]
    fn test_default_coefficients_validate() {
        assert!(ScoringCoefficients::default().validate().is_ok());
        let bad = ScoringCoefficients {
            experience_scale_years: 0.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        let inverted = ScoringCoefficients {
            other_state_score: 0.8,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());
    }
}
