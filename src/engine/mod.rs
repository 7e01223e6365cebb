//! Cell transform engine.
//!
//! For one cell and a set of in-scope seeds, computes the earthworked
//! elevation and the cut/fill deltas. Seed targets are resolved once per
//! run ([`resolve_seeds`]) so the per-cell path is pure arithmetic.

mod config;

pub use config::{ConfigError, EarthworksConfig, Mode, Operation, LARGE_REGION_CELLS};

use crate::grid::{Grid, Region};
use crate::seeds::SeedTable;

/// A seed with its targets resolved against the datum mode and its decay
/// rate defaulted from the configuration.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedSeed {
    pub x: f64,
    pub y: f64,
    /// Absolute target elevation when cutting.
    pub cut_z: f64,
    /// Absolute target elevation when filling.
    pub fill_z: f64,
    pub rate: f64,
    pub weight: f64,
}

/// Resolves a seed table into absolute targets.
///
/// In relative mode each target becomes an offset from the terrain under
/// the seed itself (not under the cell later being evaluated), sampled at
/// the nearest in-region cell; the landform then rides on top of the
/// existing surface. Per-seed rates are validated here so the per-cell
/// loop cannot fail.
pub fn resolve_seeds(
    table: &SeedTable,
    elevation: &Grid,
    region: &Region,
    config: &EarthworksConfig,
) -> Result<Vec<ResolvedSeed>, ConfigError> {
    let mut resolved = Vec::with_capacity(table.len());

    for (index, seed) in table.seeds().iter().enumerate() {
        let rate = seed.rate.unwrap_or(config.rate);
        if !rate.is_finite() || rate < 0.0 {
            return Err(ConfigError::InvalidSeedRate { index, rate });
        }

        let (mut cut_z, mut fill_z) = (seed.cut_z(), seed.fill_z());
        if config.mode == Mode::Relative {
            let (row, col) = region.locate_clamped(seed.x, seed.y);
            let base = elevation.get(row, col);
            cut_z += base;
            fill_z += base;
        }
        if !cut_z.is_finite() || !fill_z.is_finite() {
            return Err(ConfigError::InvalidSeedTarget { index });
        }

        resolved.push(ResolvedSeed {
            x: seed.x,
            y: seed.y,
            cut_z,
            fill_z,
            rate,
            weight: seed.weight.unwrap_or(1.0),
        });
    }

    Ok(resolved)
}

/// Per-cell transform result.
///
/// At most one of `cut`/`fill` is nonzero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellDelta {
    /// Earthworked elevation.
    pub elevation: f64,
    /// Material removed, as a positive depth.
    pub cut: f64,
    /// Material added, as a positive depth.
    pub fill: f64,
}

impl CellDelta {
    fn unchanged(base: f64) -> Self {
        Self {
            elevation: base,
            cut: 0.0,
            fill: 0.0,
        }
    }
}

/// A seed's elevation contribution at one cell.
///
/// Within the flat radius the contribution is the full target; beyond it
/// the decay weight interpolates between target and base.
fn contribution(
    base: f64,
    distance: f64,
    target: f64,
    seed: &ResolvedSeed,
    config: &EarthworksConfig,
) -> f64 {
    let weight = if distance <= config.flat {
        1.0
    } else {
        config.function.eval(distance - config.flat, seed.rate)
    };
    base + weight * seed.weight * (target - base)
}

/// Transforms a single cell against the seeds in scope.
///
/// # Arguments
/// * `x`, `y` - Map coordinates of the cell center
/// * `base` - Input elevation at the cell; NaN passes through unchanged
/// * `seeds` - Seeds visible to this cell's quadrant
/// * `config` - Operation, datum mode, decay function and radii
pub fn transform_cell(
    x: f64,
    y: f64,
    base: f64,
    seeds: &[ResolvedSeed],
    config: &EarthworksConfig,
) -> CellDelta {
    if seeds.is_empty() || !base.is_finite() {
        return CellDelta::unchanged(base);
    }

    let mut best_fill = f64::NEG_INFINITY;
    let mut best_cut = f64::INFINITY;

    for seed in seeds {
        let distance = (x - seed.x).hypot(y - seed.y);
        match config.operation {
            Operation::Fill => {
                let c = contribution(base, distance, seed.fill_z, seed, config);
                best_fill = best_fill.max(c);
            }
            Operation::Cut => {
                let c = contribution(base, distance, seed.cut_z, seed, config);
                best_cut = best_cut.min(c);
            }
            Operation::CutFill => {
                let f = contribution(base, distance, seed.fill_z, seed, config);
                let c = contribution(base, distance, seed.cut_z, seed, config);
                best_fill = best_fill.max(f);
                best_cut = best_cut.min(c);
            }
        }
    }

    let elevation = match config.operation {
        // The tallest applicable fill wins; fill never lowers terrain.
        Operation::Fill => base.max(best_fill),
        // The deepest applicable cut wins; cut never raises terrain.
        Operation::Cut => base.min(best_cut),
        // Whichever operation deviates more from the base wins the cell;
        // exact ties resolve to fill.
        Operation::CutFill => {
            let filled = base.max(best_fill);
            let cut = base.min(best_cut);
            if filled - base >= base - cut {
                filled
            } else {
                cut
            }
        }
    };

    CellDelta {
        elevation,
        cut: (base - elevation).max(0.0),
        fill: (elevation - base).max(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decay::DecayFunction;
    use crate::seeds::Seed;

    fn config(operation: Operation) -> EarthworksConfig {
        EarthworksConfig {
            operation,
            rate: 0.5,
            flat: 0.0,
            ..Default::default()
        }
    }

    fn seed(x: f64, y: f64, z: f64, config: &EarthworksConfig) -> ResolvedSeed {
        ResolvedSeed {
            x,
            y,
            cut_z: z,
            fill_z: z,
            rate: config.rate,
            weight: 1.0,
        }
    }

    #[test]
    fn test_fill_never_lowers() {
        let config = config(Operation::Fill);
        let seeds = [seed(0.0, 0.0, -10.0, &config)];
        // A fill target below the surface leaves the surface alone.
        for d in [0.0, 1.0, 5.0, 50.0] {
            let out = transform_cell(d, 0.0, 0.0, &seeds, &config);
            assert_eq!(out.elevation, 0.0);
            assert_eq!(out.fill, 0.0);
        }
    }

    #[test]
    fn test_cut_never_raises() {
        let config = config(Operation::Cut);
        let seeds = [seed(0.0, 0.0, 10.0, &config)];
        for d in [0.0, 1.0, 5.0, 50.0] {
            let out = transform_cell(d, 0.0, 0.0, &seeds, &config);
            assert_eq!(out.elevation, 0.0);
            assert_eq!(out.cut, 0.0);
        }
    }

    #[test]
    fn test_flat_radius_holds_target() {
        let mut config = config(Operation::Fill);
        config.flat = 50.0;
        let seeds = [seed(0.0, 0.0, 50.0, &config)];

        for d in [0.0, 10.0, 49.9, 50.0] {
            let out = transform_cell(d, 0.0, 0.0, &seeds, &config);
            assert_eq!(out.elevation, 50.0, "plateau within the flat radius");
            assert_eq!(out.fill, 50.0);
        }
    }

    #[test]
    fn test_linear_decay_reaches_base() {
        // Beyond the flat radius a linear fill decays to base at
        // flat + 1/rate.
        let mut config = config(Operation::Fill);
        config.flat = 50.0;
        let seeds = [seed(0.0, 0.0, 50.0, &config)];

        let out = transform_cell(51.0, 0.0, 0.0, &seeds, &config);
        assert!((out.elevation - 25.0).abs() < 1e-9);

        let out = transform_cell(52.0, 0.0, 0.0, &seeds, &config);
        assert!(out.elevation.abs() < 1e-9, "base reached at flat + 1/rate");
    }

    #[test]
    fn test_tallest_fill_wins() {
        let config = config(Operation::Fill);
        let seeds = [seed(0.0, 0.0, 3.0, &config), seed(0.0, 0.0, 7.0, &config)];
        let out = transform_cell(0.0, 0.0, 0.0, &seeds, &config);
        assert_eq!(out.elevation, 7.0);
    }

    #[test]
    fn test_deepest_cut_wins() {
        let config = config(Operation::Cut);
        let seeds = [seed(0.0, 0.0, -3.0, &config), seed(0.0, 0.0, -7.0, &config)];
        let out = transform_cell(0.0, 0.0, 0.0, &seeds, &config);
        assert_eq!(out.elevation, -7.0);
    }

    #[test]
    fn test_cutfill_dominant_operation_wins() {
        let mut config = config(Operation::CutFill);
        config.flat = 1.0;
        // Cut seed at x=0, fill seed at x=10; near the cut seed the cut
        // deviation dominates.
        let cut = seed(0.0, 0.0, -1.0, &config);
        let fill = seed(10.0, 0.0, 1.0, &config);
        let seeds = [cut, fill];

        let near_cut = transform_cell(1.0, 0.0, 0.0, &seeds, &config);
        assert!(near_cut.elevation < 0.0);
        assert!(near_cut.cut > 0.0 && near_cut.fill == 0.0);

        let near_fill = transform_cell(9.0, 0.0, 0.0, &seeds, &config);
        assert!(near_fill.elevation > 0.0);
        assert!(near_fill.fill > 0.0 && near_fill.cut == 0.0);
    }

    #[test]
    fn test_cutfill_tie_resolves_to_fill() {
        let mut config = config(Operation::CutFill);
        config.flat = 1.0;
        config.rate = 0.1;
        let cut = seed(0.0, 0.0, -1.0, &config);
        let fill = seed(10.0, 0.0, 1.0, &config);
        let seeds = [cut, fill];

        // The midpoint is equidistant with symmetric parameters, so the
        // cut and fill deviations are equal in magnitude.
        let out = transform_cell(5.0, 0.0, 0.0, &seeds, &config);
        assert!(out.elevation > 0.0, "ties must resolve to fill");
        assert_eq!(out.cut, 0.0);
        assert!((out.fill - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_deltas_mutually_exclusive() {
        let config = config(Operation::CutFill);
        let seeds = [seed(0.0, 0.0, 5.0, &config), seed(20.0, 0.0, -5.0, &config)];
        for i in 0..40 {
            let out = transform_cell(i as f64 * 0.5, 0.0, 0.0, &seeds, &config);
            assert!(
                out.cut == 0.0 || out.fill == 0.0,
                "cut and fill cannot both be nonzero"
            );
            assert!(out.cut >= 0.0 && out.fill >= 0.0);
        }
    }

    #[test]
    fn test_nan_base_passes_through() {
        let config = config(Operation::Fill);
        let seeds = [seed(0.0, 0.0, 5.0, &config)];
        let out = transform_cell(0.0, 0.0, f64::NAN, &seeds, &config);
        assert!(out.elevation.is_nan());
        assert_eq!(out.cut, 0.0);
        assert_eq!(out.fill, 0.0);
    }

    #[test]
    fn test_no_seeds_is_identity() {
        let config = config(Operation::CutFill);
        let out = transform_cell(3.0, 4.0, 1.25, &[], &config);
        assert_eq!(out, CellDelta::unchanged(1.25));
    }

    #[test]
    fn test_seed_rate_override() {
        let config = config(Operation::Fill);
        let mut fast = seed(0.0, 0.0, 10.0, &config);
        fast.rate = 1.0;
        let slow = seed(0.0, 0.0, 10.0, &config);

        let out_fast = transform_cell(1.0, 0.0, 0.0, &[fast], &config);
        let out_slow = transform_cell(1.0, 0.0, 0.0, &[slow], &config);
        assert!(out_fast.elevation < out_slow.elevation);
    }

    #[test]
    fn test_seed_weight_scales_contribution() {
        let config = config(Operation::Fill);
        let mut half = seed(0.0, 0.0, 10.0, &config);
        half.weight = 0.5;

        let out = transform_cell(0.0, 0.0, 0.0, &[half], &config);
        assert_eq!(out.elevation, 5.0, "weight scales the target gap");
    }

    #[test]
    fn test_resolve_relative_mode_samples_seed_cell() {
        let region = Region::new(30.0, 0.0, 30.0, 0.0, 10.0).unwrap();
        // Terrain sloping by row: 0, 10, 20.
        let mut elevation = Grid::new(3, 3);
        for row in 0..3 {
            for col in 0..3 {
                elevation.set(row, col, row as f64 * 10.0);
            }
        }

        let mut config = EarthworksConfig::default();
        config.mode = Mode::Relative;

        // Seed over the middle row: offset +5 on a base of 10.
        let table = SeedTable::new(vec![Seed::point(15.0, 15.0, 5.0)]);
        let resolved = resolve_seeds(&table, &elevation, &region, &config).unwrap();
        assert_eq!(resolved[0].fill_z, 15.0);
        assert_eq!(resolved[0].cut_z, 15.0);
    }

    #[test]
    fn test_resolve_rejects_bad_seed_rate() {
        let region = Region::new(10.0, 0.0, 10.0, 0.0, 10.0).unwrap();
        let elevation = Grid::new(1, 1);
        let config = EarthworksConfig::default();

        let mut seed = Seed::point(5.0, 5.0, 1.0);
        seed.rate = Some(-1.0);
        let table = SeedTable::new(vec![seed]);
        let result = resolve_seeds(&table, &elevation, &region, &config);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidSeedRate { index: 0, .. })
        ));
    }

    #[test]
    fn test_resolve_absolute_mode_keeps_targets() {
        let region = Region::new(10.0, 0.0, 10.0, 0.0, 10.0).unwrap();
        let elevation = Grid::constant(1, 1, 99.0);
        let config = EarthworksConfig::default();

        let table = SeedTable::new(vec![Seed::cut_fill(5.0, 5.0, -2.0, 3.0)]);
        let resolved = resolve_seeds(&table, &elevation, &region, &config).unwrap();
        assert_eq!(resolved[0].cut_z, -2.0);
        assert_eq!(resolved[0].fill_z, 3.0);
    }

    #[test]
    fn test_gaussian_fill_profile_monotone() {
        let mut config = config(Operation::Fill);
        config.function = DecayFunction::Gaussian;
        config.rate = 0.1;
        let seeds = [seed(0.0, 0.0, 10.0, &config)];

        let mut prev = f64::INFINITY;
        for i in 0..30 {
            let out = transform_cell(i as f64, 0.0, 0.0, &seeds, &config);
            assert!(out.elevation <= prev + 1e-12);
            prev = out.elevation;
        }
    }
}
