//! Raster I/O for the command-line tool.
//!
//! Only the ESRI ASCII grid format is supported; the core engine itself is
//! format-agnostic and works on in-memory grids.

mod asc;

pub use asc::{read_ascii_grid, write_ascii_grid, AscError};
