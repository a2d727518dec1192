//! Per-strategy composite weights.

use serde::{Deserialize, Serialize};
use sources::StrategyKind;
use thiserror::Error;

const SUM_TOLERANCE: f64 = 1e-6;

#[derive(Error, Debug, PartialEq)]
pub enum WeightsError {
    #[error("Weight for {strategy} must be a non-negative number, got {weight}")]
    Invalid { strategy: StrategyKind, weight: f64 },

    #[error("Strategy weights must sum to 1.0, got {sum}")]
    NotNormalized { sum: f64 },
}

/// Weight of each strategy in the composite score.
///
/// A strategy with weight 0 still contributes candidates, it just never
/// moves their composite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyWeights {
    pub ai: f64,
    pub location: f64,
    pub popularity: f64,
    pub collaborative: f64,
}

impl Default for StrategyWeights {
    fn default() -> Self {
        Self {
            ai: 0.40,
            location: 0.25,
            popularity: 0.15,
            collaborative: 0.20,
        }
    }
}

impl StrategyWeights {
    /// Build and validate a weight set.
    pub fn new(ai: f64, location: f64, popularity: f64, collaborative: f64) -> Result<Self, WeightsError> {
        let weights = Self {
            ai,
            location,
            popularity,
            collaborative,
        };
        weights.validate()?;
        Ok(weights)
    }

    pub fn weight_for(&self, kind: StrategyKind) -> f64 {
        match kind {
            StrategyKind::Ai => self.ai,
            StrategyKind::Location => self.location,
            StrategyKind::Popularity => self.popularity,
            StrategyKind::Collaborative => self.collaborative,
        }
    }

    /// Every weight finite and non-negative, the total within 1e-6 of 1.0.
    pub fn validate(&self) -> Result<(), WeightsError> {
        for kind in StrategyKind::ALL {
            let weight = self.weight_for(kind);
            if !weight.is_finite() || weight < 0.0 {
                return Err(WeightsError::Invalid { strategy: kind, weight });
            }
        }
        let sum: f64 = StrategyKind::ALL.iter().map(|&k| self.weight_for(k)).sum();
        if (sum - 1.0).abs() > SUM_TOLERANCE {
            return Err(WeightsError::NotNormalized { sum });
        }
        Ok(())
    }
}
