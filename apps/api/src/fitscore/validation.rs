use std::collections::HashSet;

use crate::fitscore::errors::FitScoreError;
use crate::fitscore::model::{CoachProfile, JobPosting};

pub const MAX_BIO_CHARS: usize = 2000;

/// Number of profile fields counted by `profile_completeness`.
const COMPLETENESS_FIELDS: usize = 10;

/// Checks the structural invariants a profile must satisfy before it can be scored.
///
/// Time slots and tags are sets by construction; certifications arrive as a list and
/// are checked for duplicate names here.
pub fn validate_profile(coach: &CoachProfile) -> Result<(), FitScoreError> {
    let malformed = |msg: String| FitScoreError::MalformedProfile(format!("coach {}: {msg}", coach.id));

    if coach.location.city.trim().is_empty() {
        return Err(malformed("city is required".to_string()));
    }
    if !is_state_code(&coach.location.state) {
        return Err(malformed(format!(
            "state '{}' is not a 2-letter code",
            coach.location.state
        )));
    }
    if let Some(bio) = &coach.bio {
        let chars = bio.chars().count();
        if chars > MAX_BIO_CHARS {
            return Err(malformed(format!(
                "bio is {chars} characters (max {MAX_BIO_CHARS})"
            )));
        }
    }
    if let Some(completeness) = coach.engagement.profile_completeness {
        if !(0.0..=1.0).contains(&completeness) {
            return Err(malformed(format!(
                "profile_completeness {completeness} is outside [0, 1]"
            )));
        }
    }

    let mut seen = HashSet::new();
    for cert in &coach.certifications {
        let key = normalize_name(&cert.name);
        if key.is_empty() {
            return Err(malformed("certification name is empty".to_string()));
        }
        if !seen.insert(key) {
            return Err(malformed(format!("duplicate certification '{}'", cert.name)));
        }
        if let (Some(issued), Some(expiry)) = (cert.issued_date, cert.expiry_date) {
            if expiry < issued {
                return Err(malformed(format!(
                    "certification '{}' expires before it was issued",
                    cert.name
                )));
            }
        }
    }

    Ok(())
}

/// Checks a job posting's structural invariants. Preset and threshold are resolved
/// separately because they are configuration errors, not data errors.
pub fn validate_job(job: &JobPosting) -> Result<(), FitScoreError> {
    let malformed = |msg: String| FitScoreError::MalformedJob(format!("job {}: {msg}", job.id));

    if job.title.trim().is_empty() {
        return Err(malformed("title is required".to_string()));
    }
    if job.location.city.trim().is_empty() {
        return Err(malformed("city is required".to_string()));
    }
    if !is_state_code(&job.location.state) {
        return Err(malformed(format!(
            "state '{}' is not a 2-letter code",
            job.location.state
        )));
    }
    if let Some(comp) = &job.compensation {
        if !comp.min.is_finite() || comp.min < 0.0 {
            return Err(malformed(format!("compensation min {} is invalid", comp.min)));
        }
        if let Some(max) = comp.max {
            if !max.is_finite() || max < comp.min {
                return Err(malformed(format!(
                    "compensation max {max} is below min {}",
                    comp.min
                )));
            }
        }
    }

    for set in [&job.required_certifications, &job.preferred_certifications] {
        let mut seen = HashSet::new();
        for name in set {
            let key = normalize_name(name);
            if key.is_empty() {
                return Err(malformed("certification name is empty".to_string()));
            }
            if !seen.insert(key) {
                return Err(malformed(format!("duplicate certification '{name}'")));
            }
        }
    }

    Ok(())
}

/// Fraction of the ten profile fields that are populated:
/// first name, last name, email, phone, bio, certifications, availability, photo,
/// verified video, and at least one tag.
pub fn profile_completeness(coach: &CoachProfile) -> f64 {
    let filled = |s: &str| !s.trim().is_empty();
    let filled_opt = |s: &Option<String>| s.as_deref().map(filled).unwrap_or(false);

    let checks = [
        filled(&coach.first_name),
        filled(&coach.last_name),
        filled(&coach.email),
        filled_opt(&coach.phone),
        filled_opt(&coach.bio),
        !coach.certifications.is_empty(),
        !coach.available_times.is_empty(),
        filled_opt(&coach.profile_photo_url),
        filled_opt(&coach.engagement.verified_video_url),
        coach.has_any_tags(),
    ];

    let completed = checks.iter().filter(|&&c| c).count();
    completed as f64 / COMPLETENESS_FIELDS as f64
}

/// Certification and tag names compare trimmed and case-insensitively.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

fn is_state_code(state: &str) -> bool {
    let state = state.trim();
    state.len() == 2 && state.chars().all(|c| c.is_ascii_alphabetic())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::collections::BTreeSet;

    use chrono::{TimeZone, Utc};

    use crate::fitscore::model::*;

    pub fn coach(id: EntityId) -> CoachProfile {
        CoachProfile {
            id,
            first_name: "Dana".to_string(),
            last_name: "Reyes".to_string(),
            email: "dana@example.com".to_string(),
            phone: None,
            location: Location {
                city: "New York".to_string(),
                state: "NY".to_string(),
            },
            role_type: RoleType::PersonalTrainer,
            years_experience: 5,
            certifications: vec![Certification::named("NASM-CPT"), Certification::named("ACE")],
            available_times: parse_slots(&["Mon AM", "Wed PM", "Fri AM"]).unwrap(),
            lifestyle_tags: ["Wellness-Focused", "Community-Oriented"]
                .into_iter()
                .map(String::from)
                .collect(),
            movement_tags: BTreeSet::new(),
            instruction_tags: BTreeSet::new(),
            bio: Some("Strength coach".to_string()),
            profile_photo_url: None,
            engagement: EngagementSignals::default(),
            updated_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    pub fn job(id: EntityId) -> JobPosting {
        JobPosting {
            id,
            title: "Personal Trainer".to_string(),
            description: "Floor coaching".to_string(),
            role_type: RoleType::PersonalTrainer,
            location: Location {
                city: "New York".to_string(),
                state: "NY".to_string(),
            },
            min_experience: 3,
            required_certifications: ["NASM-CPT".to_string()].into_iter().collect(),
            preferred_certifications: BTreeSet::new(),
            required_availability: parse_slots(&["Mon AM"]).unwrap(),
            culture_tags: BTreeSet::new(),
            compensation: None,
            weighting_preset: DEFAULT_PRESET.to_string(),
            fitscore_threshold: DEFAULT_THRESHOLD,
            status: JobStatus::Open,
            updated_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }
}
