//! Weighting presets: named, immutable mappings from the six components to weights.
//!
//! Every preset is validated when the catalog is built (weights non-negative and
//! summing to 1.0), so scoring never encounters a malformed preset.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::fitscore::errors::FitScoreError;
use crate::fitscore::model::{Component, FitScoreBreakdown};

/// Allowed deviation of a preset's weight sum from 1.0.
pub const WEIGHT_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PresetWeights {
    pub certification: f64,
    pub experience: f64,
    pub availability: f64,
    pub location: f64,
    pub culture: f64,
    pub engagement: f64,
}

impl PresetWeights {
    pub fn get(&self, component: Component) -> f64 {
        match component {
            Component::Certification => self.certification,
            Component::Experience => self.experience,
            Component::Availability => self.availability,
            Component::Location => self.location,
            Component::Culture => self.culture,
            Component::Engagement => self.engagement,
        }
    }

    pub fn sum(&self) -> f64 {
        Component::ALL.iter().map(|&c| self.get(c)).sum()
    }

    /// Weighted sum of a breakdown, clamped to [0, 1].
    pub fn apply(&self, breakdown: &FitScoreBreakdown) -> f64 {
        breakdown
            .iter()
            .map(|(component, score)| self.get(component) * score)
            .sum::<f64>()
            .clamp(0.0, 1.0)
    }

    pub fn validate(&self, name: &str) -> Result<(), FitScoreError> {
        for component in Component::ALL {
            let w = self.get(component);
            if !w.is_finite() || w < 0.0 {
                return Err(FitScoreError::InvalidPreset(format!(
                    "preset '{name}' has invalid {} weight {w}",
                    component.as_str()
                )));
            }
        }
        let total = self.sum();
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(FitScoreError::InvalidPreset(format!(
                "preset '{name}' weights sum to {total}, expected 1.0"
            )));
        }
        Ok(())
    }
}

pub const BALANCED: PresetWeights = PresetWeights {
    certification: 1.0 / 6.0,
    experience: 1.0 / 6.0,
    availability: 1.0 / 6.0,
    location: 1.0 / 6.0,
    culture: 1.0 / 6.0,
    engagement: 1.0 / 6.0,
};

pub const EXPERIENCE_HEAVY: PresetWeights = PresetWeights {
    certification: 0.20,
    experience: 0.35,
    availability: 0.10,
    location: 0.10,
    culture: 0.15,
    engagement: 0.10,
};

pub const CULTURE_HEAVY: PresetWeights = PresetWeights {
    certification: 0.15,
    experience: 0.15,
    availability: 0.10,
    location: 0.10,
    culture: 0.40,
    engagement: 0.10,
};

pub const AVAILABILITY_FOCUSED: PresetWeights = PresetWeights {
    certification: 0.20,
    experience: 0.15,
    availability: 0.35,
    location: 0.10,
    culture: 0.10,
    engagement: 0.10,
};

const BUILTIN: &[(&str, PresetWeights)] = &[
    ("balanced", BALANCED),
    ("experience_heavy", EXPERIENCE_HEAVY),
    ("culture_heavy", CULTURE_HEAVY),
    ("availability_focused", AVAILABILITY_FOCUSED),
];

/// The fixed preset catalog. Names are fixed; weights may be overridden at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct PresetCatalog {
    presets: BTreeMap<String, PresetWeights>,
}

impl PresetCatalog {
    pub fn builtin() -> Self {
        Self {
            presets: BUILTIN
                .iter()
                .map(|(name, weights)| (name.to_string(), *weights))
                .collect(),
        }
    }

    /// Replaces the weights of existing presets. Unknown names and invalid weights are
    /// rejected, leaving the catalog untouched.
    pub fn with_overrides(
        mut self,
        overrides: &BTreeMap<String, PresetWeights>,
    ) -> Result<Self, FitScoreError> {
        for (name, weights) in overrides {
            if !self.presets.contains_key(name) {
                return Err(FitScoreError::InvalidPreset(format!(
                    "cannot override unknown preset '{name}'"
                )));
            }
            weights.validate(name)?;
        }
        for (name, weights) in overrides {
            self.presets.insert(name.clone(), *weights);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), FitScoreError> {
        self.presets
            .iter()
            .try_for_each(|(name, weights)| weights.validate(name))
    }

    pub fn get(&self, name: &str) -> Result<&PresetWeights, FitScoreError> {
        self.presets.get(name.trim()).ok_or_else(|| {
            FitScoreError::InvalidPreset(format!(
                "unknown preset '{name}'. Available: {}",
                self.names().collect::<Vec<_>>().join(", ")
            ))
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PresetWeights)> {
        self.presets.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Default for PresetCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_presets_sum_to_one() {
        for (name, weights) in PresetCatalog::builtin().iter() {
            let total = weights.sum();
            assert!(
                (total - 1.0).abs() < WEIGHT_TOLERANCE,
                "preset '{name}' sums to {total}"
            );
        }
    }

    #[test]
    fn test_builtin_catalog_validates() {
        assert!(PresetCatalog::builtin().validate().is_ok());
        assert_eq!(PresetCatalog::builtin().names().count(), 4);
    }

    #[test]
    fn test_balanced_is_equal_weights() {
        let catalog = PresetCatalog::builtin();
        let balanced = catalog.get("balanced").unwrap();
        for component in Component::ALL {
            assert!((balanced.get(component) - 1.0 / 6.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_emphasis_matches_preset_name() {
        let catalog = PresetCatalog::builtin();
        let exp = catalog.get("experience_heavy").unwrap();
        assert!(Component::ALL
            .iter()
            .all(|&c| exp.get(c) <= exp.get(Component::Experience)));
        let culture = catalog.get("culture_heavy").unwrap();
        assert_eq!(culture.culture, 0.40);
        let avail = catalog.get("availability_focused").unwrap();
        assert_eq!(avail.availability, 0.35);
    }

    #[test]
    fn test_unknown_preset_is_invalid() {
        let err = PresetCatalog::builtin().get("speed_first").unwrap_err();
        assert!(matches!(err, FitScoreError::InvalidPreset(_)));
        assert!(err.to_string().contains("balanced"));
    }

    #[test]
    fn test_override_must_sum_to_one() {
        let mut overrides = BTreeMap::new();
        overrides.insert(
            "balanced".to_string(),
            PresetWeights {
                engagement: 0.5,
                ..BALANCED
            },
        );
        assert!(PresetCatalog::builtin().with_overrides(&overrides).is_err());
    }

    #[test]
    fn test_override_rejects_negative_weight() {
        let mut overrides = BTreeMap::new();
        overrides.insert(
            "culture_heavy".to_string(),
            PresetWeights {
                certification: -0.1,
                culture: 0.65,
                ..CULTURE_HEAVY
            },
        );
        assert!(PresetCatalog::builtin().with_overrides(&overrides).is_err());
    }

    #[test]
    fn test_override_rejects_unknown_name() {
        let mut overrides = BTreeMap::new();
        overrides.insert("custom".to_string(), BALANCED);
        assert!(PresetCatalog::builtin().with_overrides(&overrides).is_err());
    }

    #[test]
    fn test_valid_override_replaces_weights() {
        let mut overrides = BTreeMap::new();
        let weights = PresetWeights {
            certification: 0.5,
            experience: 0.1,
            availability: 0.1,
            location: 0.1,
            culture: 0.1,
            engagement: 0.1,
        };
        overrides.insert("balanced".to_string(), weights);
        let catalog = PresetCatalog::builtin().with_overrides(&overrides).unwrap();
        assert_eq!(catalog.get("balanced").unwrap(), &weights);
    }

    #[test]
    fn test_apply_is_weighted_sum() {
        let breakdown = FitScoreBreakdown {
            certification_score: 1.0,
            experience_score: 0.5,
            availability_score: 0.0,
            location_score: 1.0,
            culture_score: 0.5,
            engagement_score: 0.0,
        };
        // 0.2*1 + 0.35*0.5 + 0.1*0 + 0.1*1 + 0.15*0.5 + 0.1*0 = 0.55
        assert!((EXPERIENCE_HEAVY.apply(&breakdown) - 0.55).abs() < 1e-9);
    }
}
