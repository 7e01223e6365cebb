//! Quadtree partitioner.
//!
//! Recursively subdivides the region into quadrants until every quadrant
//! holds at most `threshold` seeds or is too small to split. Nodes are
//! array-backed (indices, not pointers) so the tree is cheap to build,
//! trivially traversable in parallel, and freed in one go.
//!
//! Quadrants own half-open cell rectangles, so the union of leaf rectangles
//! exactly partitions the region. Seed visibility uses the quadrant's
//! map-unit bounds expanded by `border` on every side; a seed near an edge
//! is therefore held by every neighboring quadrant that needs it, which is
//! what prevents truncation artifacts at tile seams.

use log::debug;

use crate::grid::Region;

#[derive(Debug)]
struct Node {
    row0: usize,
    row1: usize,
    col0: usize,
    col1: usize,
    /// Indices into the seed table; cleared once a node splits.
    seeds: Vec<u32>,
    children: Option<[usize; 4]>,
}

impl Node {
    fn rows(&self) -> usize {
        self.row1 - self.row0
    }

    fn cols(&self) -> usize {
        self.col1 - self.col0
    }
}

/// A leaf quadrant: an owned cell rectangle plus the seeds visible to it.
///
/// `row1`/`col1` are exclusive. The seed list may be empty; empty leaves
/// are skipped by the scheduler and contribute nothing.
#[derive(Debug, Clone, Copy)]
pub struct Leaf<'a> {
    pub row0: usize,
    pub row1: usize,
    pub col0: usize,
    pub col1: usize,
    pub seeds: &'a [u32],
}

impl Leaf<'_> {
    /// Number of cells this leaf writes.
    pub fn cell_count(&self) -> usize {
        (self.row1 - self.row0) * (self.col1 - self.col0)
    }
}

/// An array-backed quadtree over a region's cell grid.
#[derive(Debug)]
pub struct Quadtree {
    nodes: Vec<Node>,
}

impl Quadtree {
    /// Partitions a region around seed positions.
    ///
    /// The root spans the full region and holds every seed. A quadrant
    /// splits into four equal children while its seed count exceeds
    /// `threshold` and both its dimensions are at least two cells; each
    /// child receives the seeds falling inside its bounds expanded by
    /// `border` map units. Quadrants at the size floor may hold more seeds
    /// than the threshold.
    pub fn build(
        region: &Region,
        positions: &[(f64, f64)],
        threshold: usize,
        border: f64,
    ) -> Self {
        let mut nodes = vec![Node {
            row0: 0,
            row1: region.rows,
            col0: 0,
            col1: region.cols,
            seeds: (0..positions.len() as u32).collect(),
            children: None,
        }];

        let mut stack = vec![0usize];
        while let Some(index) = stack.pop() {
            if nodes[index].seeds.len() <= threshold {
                continue;
            }
            // Sub-cell quadrants cannot be represented at the grid's
            // resolution; stop recursing instead of surfacing an error.
            if nodes[index].rows() < 2 || nodes[index].cols() < 2 {
                continue;
            }

            let (row0, row1) = (nodes[index].row0, nodes[index].row1);
            let (col0, col1) = (nodes[index].col0, nodes[index].col1);
            let rmid = row0 + (row1 - row0) / 2;
            let cmid = col0 + (col1 - col0) / 2;

            let rects = [
                (row0, rmid, col0, cmid),
                (row0, rmid, cmid, col1),
                (rmid, row1, col0, cmid),
                (rmid, row1, cmid, col1),
            ];

            let parent_seeds = std::mem::take(&mut nodes[index].seeds);
            let mut children = [0usize; 4];
            for (slot, &(r0, r1, c0, c1)) in children.iter_mut().zip(&rects) {
                let (west, east, south, north) = rect_bounds(region, r0, r1, c0, c1);
                let seeds: Vec<u32> = parent_seeds
                    .iter()
                    .copied()
                    .filter(|&i| {
                        let (x, y) = positions[i as usize];
                        x >= west - border
                            && x <= east + border
                            && y >= south - border
                            && y <= north + border
                    })
                    .collect();

                let child = nodes.len();
                nodes.push(Node {
                    row0: r0,
                    row1: r1,
                    col0: c0,
                    col1: c1,
                    seeds,
                    children: None,
                });
                stack.push(child);
                *slot = child;
            }
            nodes[index].children = Some(children);
        }

        let tree = Self { nodes };
        debug!(
            "quadtree: {} nodes, {} leaves ({} active)",
            tree.nodes.len(),
            tree.leaves().count(),
            tree.leaves().filter(|l| !l.seeds.is_empty()).count()
        );
        tree
    }

    /// A degenerate tree: one quadrant spanning the whole region and
    /// holding every seed. Used when partitioning is disabled.
    pub fn single(region: &Region, seed_count: usize) -> Self {
        Self {
            nodes: vec![Node {
                row0: 0,
                row1: region.rows,
                col0: 0,
                col1: region.cols,
                seeds: (0..seed_count as u32).collect(),
                children: None,
            }],
        }
    }

    /// All leaf quadrants in node-index order, including seedless ones.
    pub fn leaves(&self) -> impl Iterator<Item = Leaf<'_>> {
        self.nodes.iter().filter(|n| n.children.is_none()).map(|n| Leaf {
            row0: n.row0,
            row1: n.row1,
            col0: n.col0,
            col1: n.col1,
            seeds: &n.seeds,
        })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Map-unit bounds (west, east, south, north) of a cell rectangle.
fn rect_bounds(
    region: &Region,
    row0: usize,
    row1: usize,
    col0: usize,
    col1: usize,
) -> (f64, f64, f64, f64) {
    let west = region.west + col0 as f64 * region.cell_size;
    let east = region.west + col1 as f64 * region.cell_size;
    let north = region.north - row0 as f64 * region.cell_size;
    let south = region.north - row1 as f64 * region.cell_size;
    (west, east, south, north)
}
