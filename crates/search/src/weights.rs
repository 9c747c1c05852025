use crate::error::{Result, SearchError};
use serde::{Deserialize, Serialize};

/// Tolerance on the weight-vector sum.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Below this text weight, hybrid results barely track the query.
const LOW_TEXT_WEIGHT: f64 = 0.1;

/// The six-component weight vector of the hybrid scorer. A valid
/// vector is non-negative and sums to 1 within tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub text_relevance: f64,
    pub pagerank: f64,
    pub status: f64,
    pub impact: f64,
    pub priority: f64,
    pub recency: f64,
}

impl Weights {
    pub fn sum(&self) -> f64 {
        self.text_relevance + self.pagerank + self.status + self.impact + self.priority + self.recency
    }

    /// Check non-negativity and the unit-sum constraint.
    pub fn validate(&self) -> Result<()> {
        let components = [
            ("text_relevance", self.text_relevance),
            ("pagerank", self.pagerank),
            ("status", self.status),
            ("impact", self.impact),
            ("priority", self.priority),
            ("recency", self.recency),
        ];
        for (name, value) in components {
            if value < 0.0 {
                return Err(SearchError::WeightsInvalid(format!(
                    "{name} is negative: {value}"
                )));
            }
            if !value.is_finite() {
                return Err(SearchError::WeightsInvalid(format!(
                    "{name} is not finite: {value}"
                )));
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(SearchError::WeightsInvalid(format!(
                "weights sum to {sum:.6}, expected 1.0"
            )));
        }
        if self.text_relevance < LOW_TEXT_WEIGHT {
            log::warn!(
                "text weight {:.2} is very low; hybrid ranking will mostly ignore the query text",
                self.text_relevance
            );
        }
        Ok(())
    }

    /// Rescale to sum 1. Degenerate (zero-sum) vectors are returned
    /// unchanged.
    pub fn normalize(&self) -> Weights {
        let sum = self.sum();
        if sum <= 0.0 {
            return *self;
        }
        Weights {
            text_relevance: self.text_relevance / sum,
            pagerank: self.pagerank / sum,
            status: self.status / sum,
            impact: self.impact / sum,
            priority: self.priority / sum,
            recency: self.recency / sum,
        }
    }
}

/// Named weight vectors. These are the source of truth; the viewer's
/// JS table must match them bitwise (see the parity test).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    Default,
    ImpactFirst,
    Quality,
    Velocity,
    Broad,
}

impl Preset {
    pub fn as_str(self) -> &'static str {
        match self {
            Preset::Default => "default",
            Preset::ImpactFirst => "impact-first",
            Preset::Quality => "quality",
            Preset::Velocity => "velocity",
            Preset::Broad => "broad",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "default" => Ok(Preset::Default),
            "impact-first" => Ok(Preset::ImpactFirst),
            "quality" => Ok(Preset::Quality),
            "velocity" => Ok(Preset::Velocity),
            "broad" => Ok(Preset::Broad),
            other => Err(SearchError::PresetUnknown(other.to_string())),
        }
    }

    pub fn weights(self) -> Weights {
        match self {
            Preset::Default => Weights {
                text_relevance: 0.30,
                pagerank: 0.25,
                status: 0.15,
                impact: 0.15,
                priority: 0.10,
                recency: 0.05,
            },
            Preset::ImpactFirst => Weights {
                text_relevance: 0.15,
                pagerank: 0.20,
                status: 0.10,
                impact: 0.35,
                priority: 0.15,
                recency: 0.05,
            },
            Preset::Quality => Weights {
                text_relevance: 0.35,
                pagerank: 0.15,
                status: 0.15,
                impact: 0.10,
                priority: 0.15,
                recency: 0.10,
            },
            Preset::Velocity => Weights {
                text_relevance: 0.20,
                pagerank: 0.10,
                status: 0.25,
                impact: 0.10,
                priority: 0.15,
                recency: 0.20,
            },
            Preset::Broad => Weights {
                text_relevance: 0.20,
                pagerank: 0.16,
                status: 0.16,
                impact: 0.16,
                priority: 0.16,
                recency: 0.16,
            },
        }
    }
}

/// All preset names in declaration order.
pub fn list_presets() -> Vec<Preset> {
    vec![
        Preset::Default,
        Preset::ImpactFirst,
        Preset::Quality,
        Preset::Velocity,
        Preset::Broad,
    ]
}

/// Look a preset up by wire name.
pub fn get_preset(name: &str) -> Result<Weights> {
    Ok(Preset::from_name(name)?.weights())
}
