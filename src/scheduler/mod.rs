//! Tile scheduler.
//!
//! Fans leaf quadrants out across a rayon worker pool. Every leaf owns a
//! disjoint output sub-rectangle, so leaves run without shared mutable
//! state; merging is a sequential pass in leaf-index order, which also
//! fixes the volume reduction order and keeps totals reproducible between
//! runs at the same worker count.

use log::{debug, info};
use rayon::prelude::*;
use thiserror::Error;

use crate::engine::{self, ConfigError, EarthworksConfig, ResolvedSeed};
use crate::grid::{Grid, Region};
use crate::quadtree::{Leaf, Quadtree};
use crate::seeds::SeedTable;

/// Errors raised by a scheduler run.
#[derive(Error, Debug)]
pub enum EarthworksError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("elevation grid is {grid_rows}x{grid_cols} but the region is {region_rows}x{region_cols}")]
    GridRegionMismatch {
        grid_rows: usize,
        grid_cols: usize,
        region_rows: usize,
        region_cols: usize,
    },
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// The result of one earthworks run.
#[derive(Debug, Clone)]
pub struct EarthworksOutput {
    /// Earthworked elevation surface.
    pub elevation: Grid,
    /// Signed volumetric-change surface: earthworked minus input.
    pub volume: Grid,
    /// Total excavated volume in cubic map units, >= 0.
    pub net_cut: f64,
    /// Total deposited volume in cubic map units, >= 0.
    pub net_fill: f64,
}

impl EarthworksOutput {
    /// Net volumetric change: fill minus cut.
    pub fn net_change(&self) -> f64 {
        self.net_fill - self.net_cut
    }
}

/// Per-leaf partial result, merged after the parallel phase.
struct LeafOutput {
    row0: usize,
    col0: usize,
    cols: usize,
    elevation: Vec<f64>,
    delta: Vec<f64>,
    cut_sum: f64,
    fill_sum: f64,
}

/// Runs the full earthworks transform.
///
/// An empty seed table is a documented no-op: the input is copied through
/// unchanged and both volume totals are zero. Configuration problems are
/// reported before any computation starts; leaves themselves cannot fail,
/// so a run never surfaces a partially written grid.
pub fn run(
    elevation: &Grid,
    region: &Region,
    seeds: &SeedTable,
    config: &EarthworksConfig,
) -> Result<EarthworksOutput, EarthworksError> {
    config.validate()?;
    if elevation.rows() != region.rows || elevation.cols() != region.cols {
        return Err(EarthworksError::GridRegionMismatch {
            grid_rows: elevation.rows(),
            grid_cols: elevation.cols(),
            region_rows: region.rows,
            region_cols: region.cols,
        });
    }

    if seeds.is_empty() {
        info!("no seeds after geometry resolution; copying input through");
        return Ok(EarthworksOutput {
            elevation: elevation.clone(),
            volume: Grid::new(region.rows, region.cols),
            net_cut: 0.0,
            net_fill: 0.0,
        });
    }

    let resolved = engine::resolve_seeds(seeds, elevation, region, config)?;

    let tree = if config.should_partition(region.cell_count(), resolved.len()) {
        let positions = seeds.positions();
        Quadtree::build(region, &positions, config.threshold, config.border)
    } else {
        Quadtree::single(region, resolved.len())
    };

    // Zero-seed quadrants are dropped here; their cells pass through via
    // the initial copy of the input grid.
    let leaves: Vec<Leaf> = tree.leaves().filter(|l| !l.seeds.is_empty()).collect();
    info!(
        "processing {} leaf quadrant(s) on {} worker(s), {} seed(s)",
        leaves.len(),
        config.workers,
        resolved.len()
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .build()?;

    let partials: Vec<LeafOutput> = pool.install(|| {
        leaves
            .par_iter()
            .map(|leaf| process_leaf(leaf, elevation, region, &resolved, config))
            .collect()
    });

    // Sequential merge: leaves own disjoint rectangles, and summing the
    // partial volumes in leaf-index order keeps the reduction
    // deterministic.
    let mut out = elevation.clone();
    let mut volume = Grid::new(region.rows, region.cols);
    let mut net_cut = 0.0;
    let mut net_fill = 0.0;
    let cell_area = region.cell_area();

    for partial in &partials {
        out.write_block(partial.row0, partial.col0, partial.cols, &partial.elevation);
        volume.write_block(partial.row0, partial.col0, partial.cols, &partial.delta);
        net_cut += partial.cut_sum * cell_area;
        net_fill += partial.fill_sum * cell_area;
    }

    debug!("net cut {net_cut}, net fill {net_fill} cubic map units");

    Ok(EarthworksOutput {
        elevation: out,
        volume,
        net_cut,
        net_fill,
    })
}

/// Transforms every cell a leaf owns.
///
/// Reads may range over the padded seed set, but writes stay inside the
/// leaf's unpadded rectangle; neighboring quadrants overlap in seed
/// visibility, never in output ownership.
fn process_leaf(
    leaf: &Leaf,
    elevation: &Grid,
    region: &Region,
    resolved: &[ResolvedSeed],
    config: &EarthworksConfig,
) -> LeafOutput {
    let scope: Vec<ResolvedSeed> = leaf.seeds.iter().map(|&i| resolved[i as usize]).collect();

    let rows = leaf.row1 - leaf.row0;
    let cols = leaf.col1 - leaf.col0;
    let mut out = vec![0.0; rows * cols];
    let mut delta = vec![0.0; rows * cols];
    let mut cut_sum = 0.0;
    let mut fill_sum = 0.0;

    for r in 0..rows {
        for c in 0..cols {
            let (row, col) = (leaf.row0 + r, leaf.col0 + c);
            let (x, y) = region.cell_center(row, col);
            let base = elevation.get(row, col);

            let cell = engine::transform_cell(x, y, base, &scope, config);
            out[r * cols + c] = cell.elevation;
            delta[r * cols + c] = if base.is_finite() {
                cell.elevation - base
            } else {
                0.0
            };
            cut_sum += cell.cut;
            fill_sum += cell.fill;
        }
    }

    LeafOutput {
        row0: leaf.row0,
        col0: leaf.col0,
        cols,
        elevation: out,
        delta,
        cut_sum,
        fill_sum,
    }
}
