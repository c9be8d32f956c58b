use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::fitscore::presets::{PresetCatalog, PresetWeights};
use crate::fitscore::scoring::ScoringCoefficients;

/// Optional JSON overrides, e.g.
///
/// ```json
/// { "presets": { "culture_heavy": { "certification": 0.1, ... } },
///   "coefficients": { "same_state_score": 0.4 } }
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct EngineSettingsFile {
    #[serde(default)]
    presets: BTreeMap<String, PresetWeights>,
    #[serde(default)]
    coefficients: Option<ScoringCoefficients>,
}

/// Validated engine configuration. Built once at startup; invalid input aborts boot.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub catalog: PresetCatalog,
    pub coefficients: ScoringCoefficients,
}

impl EngineSettings {
    pub fn builtin() -> Self {
        Self {
            catalog: PresetCatalog::builtin(),
            coefficients: ScoringCoefficients::default(),
        }
    }

    /// Loads overrides from `path` if given, otherwise returns the built-in settings.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::builtin());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read FitScore config '{}'", path.display()))?;
        let settings = Self::from_json(&raw)
            .with_context(|| format!("Invalid FitScore config '{}'", path.display()))?;
        info!("Loaded FitScore overrides from {}", path.display());
        Ok(settings)
    }

    /// Digest of every input that changes a score apart from the two records: preset
    /// weights, coefficients and the strict-certification flag. Versions cache keys.
    pub fn fingerprint(&self, strict_certifications: bool) -> Result<String> {
        let presets: Vec<(&str, &PresetWeights)> = self.catalog.iter().collect();
        let canonical = serde_json::to_vec(&(presets, &self.coefficients, strict_certifications))
            .context("Failed to serialize FitScore settings")?;
        let mut hasher = DefaultHasher::new();
        canonical.hash(&mut hasher);
        Ok(format!("{:016x}", hasher.finish()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let file: EngineSettingsFile = serde_json::from_str(raw)?;

        let catalog = PresetCatalog::builtin().with_overrides(&file.presets)?;
        let coefficients = file.coefficients.unwrap_or_default();
        coefficients.validate().map_err(|e| anyhow!(e))?;

        Ok(Self {
            catalog,
            coefficients,
        })
    }
}
