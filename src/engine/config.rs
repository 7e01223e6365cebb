//! Earthworking configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decay::DecayFunction;

/// Number of cells above which large regions are partitioned by default.
pub const LARGE_REGION_CELLS: usize = 100_000;

/// Which earthworking operation to model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Cut into the topography; never raises terrain.
    Cut,
    /// Fill on top of the topography; never lowers terrain.
    Fill,
    /// Cut and fill together; the larger deviation wins per cell.
    CutFill,
}

impl Operation {
    /// Returns the name of the operation.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cut => "cut",
            Self::Fill => "fill",
            Self::CutFill => "cutfill",
        }
    }
}

/// How seed target elevations are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Targets are elevations above datum, used as given.
    Absolute,
    /// Targets are offsets from the terrain under each seed, so the
    /// landform rides on top of the existing surface.
    Relative,
}

impl Mode {
    /// Returns the name of the mode.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Absolute => "absolute",
            Self::Relative => "relative",
        }
    }
}

/// Errors raised by configuration validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("decay rate must be finite and non-negative, got {0}")]
    InvalidRate(f64),
    #[error("flat radius must be finite and non-negative, got {0}")]
    InvalidFlat(f64),
    #[error("partition threshold must be at least 1 seed")]
    ZeroThreshold,
    #[error("border must be finite and non-negative, got {0}")]
    InvalidBorder(f64),
    #[error("worker count must be at least 1")]
    ZeroWorkers,
    #[error("seed {index} has a bad decay rate ({rate})")]
    InvalidSeedRate { index: usize, rate: f64 },
    #[error("seed {index} has a non-finite target elevation")]
    InvalidSeedTarget { index: usize },
    #[error("a raster, line, or coordinate input is required")]
    MissingGeometry,
}

/// Full parameter set consumed by the transform engine and scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarthworksConfig {
    /// Earthworking operation.
    pub operation: Operation,
    /// Datum mode for seed targets.
    pub mode: Mode,
    /// Decay function applied beyond the flat radius.
    pub function: DecayFunction,
    /// Default decay rate; individual seeds may override it.
    pub rate: f64,
    /// Radius around each seed held flat at the target elevation.
    pub flat: f64,
    /// Maximum seeds per quadrant before it splits.
    pub threshold: usize,
    /// Seed-visibility padding around each quadrant, in map units.
    ///
    /// Undersized borders produce visible discontinuities at quadrant
    /// seams; that is the documented accuracy/performance trade-off, not a
    /// defect.
    pub border: f64,
    /// Force partitioning on or off; `None` applies the large-region
    /// heuristic.
    pub partition: Option<bool>,
    /// Number of parallel workers for leaf quadrants.
    pub workers: usize,
}

impl Default for EarthworksConfig {
    fn default() -> Self {
        Self {
            operation: Operation::CutFill,
            mode: Mode::Absolute,
            function: DecayFunction::Linear,
            rate: 0.1,
            flat: 0.0,
            threshold: 100,
            border: 250.0,
            partition: None,
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

impl EarthworksConfig {
    /// Validates the parameter set.
    ///
    /// A zero rate is legal and means "no decay": every seed contributes at
    /// full strength everywhere in scope.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.rate.is_finite() || self.rate < 0.0 {
            return Err(ConfigError::InvalidRate(self.rate));
        }
        if !self.flat.is_finite() || self.flat < 0.0 {
            return Err(ConfigError::InvalidFlat(self.flat));
        }
        if self.threshold == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        if !self.border.is_finite() || self.border < 0.0 {
            return Err(ConfigError::InvalidBorder(self.border));
        }
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        Ok(())
    }

    /// Whether a region/seed-set pair should be partitioned.
    pub fn should_partition(&self, cell_count: usize, seed_count: usize) -> bool {
        self.partition
            .unwrap_or(cell_count > LARGE_REGION_CELLS && seed_count > self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EarthworksConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        let mut config = EarthworksConfig::default();
        config.rate = -0.1;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidRate(_))));

        let mut config = EarthworksConfig::default();
        config.flat = f64::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidFlat(_))));

        let mut config = EarthworksConfig::default();
        config.threshold = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroThreshold)));

        let mut config = EarthworksConfig::default();
        config.border = -1.0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidBorder(_))));

        let mut config = EarthworksConfig::default();
        config.workers = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroWorkers)));
    }

    #[test]
    fn test_zero_rate_is_valid() {
        let mut config = EarthworksConfig::default();
        config.rate = 0.0;
        assert!(config.validate().is_ok(), "rate 0 means no decay, not an error");
    }

    #[test]
    fn test_partition_policy() {
        let config = EarthworksConfig::default();
        assert!(!config.should_partition(10_000, 1_000));
        assert!(!config.should_partition(1_000_000, 50));
        assert!(config.should_partition(1_000_000, 1_000));

        let mut forced = EarthworksConfig::default();
        forced.partition = Some(true);
        assert!(forced.should_partition(100, 1));
        forced.partition = Some(false);
        assert!(!forced.should_partition(1_000_000, 1_000));
    }
}
