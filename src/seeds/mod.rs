//! Seed table: normalized extrema driving cut and fill.
//!
//! Heterogeneous geometry inputs (coordinate pairs, 3D point sets, sampled
//! polylines, spot-elevation rasters) all resolve to the uniform [`Seed`]
//! record before the engine sees them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::Operation;
use crate::grid::{Grid, Region};

/// Errors raised while building a seed table.
#[derive(Error, Debug)]
pub enum SeedError {
    #[error("{zs} z-value(s) cannot be matched to {points} input point(s)")]
    ZCountMismatch { zs: usize, points: usize },
    #[error("at least one z-value is required")]
    NoZValues,
    #[error("a polyline needs at least 2 vertices, got {0}")]
    DegenerateLine(usize),
    #[error("sampling spacing must be positive and finite, got {0}")]
    BadSpacing(f64),
}

/// One extremum: a position with one or two target elevations.
///
/// A single z drives cut-only or fill-only operations; a (cut, fill) pair
/// drives cut-fill. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seed {
    pub x: f64,
    pub y: f64,
    /// Target elevations: `[z]` or `[cut_z, fill_z]`.
    pub zs: Vec<f64>,
    /// Per-seed decay rate override.
    pub rate: Option<f64>,
    /// Optional strength multiplier on the interpolation weight.
    pub weight: Option<f64>,
}

impl Seed {
    /// Creates a single-target seed.
    pub fn point(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            zs: vec![z],
            rate: None,
            weight: None,
        }
    }

    /// Creates a cut-fill seed with distinct targets.
    pub fn cut_fill(x: f64, y: f64, cut_z: f64, fill_z: f64) -> Self {
        Self {
            x,
            y,
            zs: vec![cut_z, fill_z],
            rate: None,
            weight: None,
        }
    }

    /// Target used when cutting: the first z.
    pub fn cut_z(&self) -> f64 {
        self.zs[0]
    }

    /// Target used when filling: the last z (the sole z for single-target
    /// seeds).
    pub fn fill_z(&self) -> f64 {
        *self.zs.last().unwrap_or(&self.zs[0])
    }
}

/// An ordered, immutable collection of seeds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedTable {
    seeds: Vec<Seed>,
}

impl SeedTable {
    /// Wraps an already-resolved seed list.
    pub fn new(seeds: Vec<Seed>) -> Self {
        Self { seeds }
    }

    pub fn seeds(&self) -> &[Seed] {
        &self.seeds
    }

    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    /// Builds seeds from coordinate pairs with z-value broadcasting.
    ///
    /// Broadcasting rules, checked in order:
    /// * one z per point pairs them off;
    /// * a single z applies to every point;
    /// * for cut-fill, exactly two z-values become the (cut, fill) pair on
    ///   every point;
    /// * anything else is a [`SeedError::ZCountMismatch`].
    pub fn from_coordinates(
        coords: &[(f64, f64)],
        zs: &[f64],
        operation: Operation,
    ) -> Result<Self, SeedError> {
        if zs.is_empty() {
            return Err(SeedError::NoZValues);
        }

        let seeds = if zs.len() == coords.len() {
            coords
                .iter()
                .zip(zs)
                .map(|(&(x, y), &z)| Seed::point(x, y, z))
                .collect()
        } else if zs.len() == 1 {
            coords.iter().map(|&(x, y)| Seed::point(x, y, zs[0])).collect()
        } else if operation == Operation::CutFill && zs.len() == 2 {
            coords
                .iter()
                .map(|&(x, y)| Seed::cut_fill(x, y, zs[0], zs[1]))
                .collect()
        } else {
            return Err(SeedError::ZCountMismatch {
                zs: zs.len(),
                points: coords.len(),
            });
        };

        Ok(Self::new(seeds))
    }

    /// Builds seeds from 3D points, each carrying its own target elevation.
    pub fn from_points(points: &[(f64, f64, f64)]) -> Self {
        Self::new(points.iter().map(|&(x, y, z)| Seed::point(x, y, z)).collect())
    }

    /// Builds seeds by sampling a 2D polyline at `spacing`, broadcasting a
    /// constant z to every sampled vertex.
    pub fn from_polyline(
        vertices: &[(f64, f64)],
        z: f64,
        spacing: f64,
    ) -> Result<Self, SeedError> {
        let verts3: Vec<(f64, f64, f64)> = vertices.iter().map(|&(x, y)| (x, y, z)).collect();
        Self::from_polyline3d(&verts3, spacing)
    }

    /// Builds seeds by sampling a 3D polyline at `spacing`.
    ///
    /// One seed per sampled vertex; z is interpolated linearly along each
    /// segment, so an embankment can ramp between vertex elevations.
    pub fn from_polyline3d(
        vertices: &[(f64, f64, f64)],
        spacing: f64,
    ) -> Result<Self, SeedError> {
        if vertices.len() < 2 {
            return Err(SeedError::DegenerateLine(vertices.len()));
        }
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(SeedError::BadSpacing(spacing));
        }

        let mut seeds = Vec::new();
        for pair in vertices.windows(2) {
            let (x0, y0, z0) = pair[0];
            let (x1, y1, z1) = pair[1];
            let length = ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt();

            // Enough samples that consecutive seeds are at most `spacing`
            // apart; the segment end belongs to the next window.
            let steps = (length / spacing).ceil().max(1.0) as usize;
            for i in 0..steps {
                let t = i as f64 / steps as f64;
                seeds.push(Seed::point(
                    x0 + (x1 - x0) * t,
                    y0 + (y1 - y0) * t,
                    z0 + (z1 - z0) * t,
                ));
            }
        }
        // Close the final segment.
        let &(x, y, z) = vertices.last().unwrap();
        seeds.push(Seed::point(x, y, z));

        Ok(Self::new(seeds))
    }

    /// Builds seeds from a spot-elevation raster: every finite, nonzero
    /// cell becomes a seed at its cell center with the cell value as z.
    pub fn from_raster(raster: &Grid, region: &Region) -> Self {
        let mut seeds = Vec::new();
        for row in 0..raster.rows() {
            for col in 0..raster.cols() {
                let z = raster.get(row, col);
                if z.is_finite() && z != 0.0 {
                    let (x, y) = region.cell_center(row, col);
                    seeds.push(Seed::point(x, y, z));
                }
            }
        }
        Self::new(seeds)
    }

    /// Positions of all seeds, in table order.
    pub fn positions(&self) -> Vec<(f64, f64)> {
        self.seeds.iter().map(|s| (s.x, s.y)).collect()
    }
}
