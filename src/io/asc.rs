//! ESRI ASCII grid reader/writer.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::grid::{Grid, Region, RegionError};

/// Errors that can occur while reading or writing an ASCII grid.
#[derive(Error, Debug)]
pub enum AscError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("missing header field '{0}'")]
    MissingHeader(&'static str),
    #[error("expected {expected} values, got {got}")]
    ValueCount { expected: usize, got: usize },
    #[error(transparent)]
    Region(#[from] RegionError),
}

fn parse_err(line: usize, message: impl Into<String>) -> AscError {
    AscError::Parse {
        line,
        message: message.into(),
    }
}

/// Reads an ESRI ASCII grid.
///
/// NODATA cells become NaN. The header's lower-left corner and cell size
/// define the returned [`Region`].
pub fn read_ascii_grid(path: &Path) -> Result<(Grid, Region), AscError> {
    let reader = BufReader::new(File::open(path)?);

    let mut ncols = None;
    let mut nrows = None;
    let mut xllcorner = None;
    let mut yllcorner = None;
    let mut cellsize = None;
    let mut nodata: Option<f64> = None;
    let mut values: Vec<f64> = Vec::new();
    let mut in_header = true;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if in_header {
            let mut parts = trimmed.split_whitespace();
            let key = parts.next().unwrap_or_default().to_ascii_lowercase();
            let is_header_key = matches!(
                key.as_str(),
                "ncols" | "nrows" | "xllcorner" | "yllcorner" | "cellsize" | "nodata_value"
            );
            if is_header_key {
                let value = parts
                    .next()
                    .ok_or_else(|| parse_err(line_no, format!("header '{key}' has no value")))?;
                let value: f64 = value
                    .parse()
                    .map_err(|_| parse_err(line_no, format!("bad number '{value}'")))?;
                match key.as_str() {
                    "ncols" => ncols = Some(value as usize),
                    "nrows" => nrows = Some(value as usize),
                    "xllcorner" => xllcorner = Some(value),
                    "yllcorner" => yllcorner = Some(value),
                    "cellsize" => cellsize = Some(value),
                    _ => nodata = Some(value),
                }
                continue;
            }
            in_header = false;
        }

        for token in trimmed.split_whitespace() {
            let value: f64 = token
                .parse()
                .map_err(|_| parse_err(line_no, format!("bad number '{token}'")))?;
            let value = match nodata {
                Some(nd) if value == nd => f64::NAN,
                _ => value,
            };
            values.push(value);
        }
    }

    let ncols = ncols.ok_or(AscError::MissingHeader("ncols"))?;
    let nrows = nrows.ok_or(AscError::MissingHeader("nrows"))?;
    let xllcorner = xllcorner.ok_or(AscError::MissingHeader("xllcorner"))?;
    let yllcorner = yllcorner.ok_or(AscError::MissingHeader("yllcorner"))?;
    let cellsize = cellsize.ok_or(AscError::MissingHeader("cellsize"))?;

    if values.len() != nrows * ncols {
        return Err(AscError::ValueCount {
            expected: nrows * ncols,
            got: values.len(),
        });
    }

    let region = Region::with_dimensions(
        yllcorner + nrows as f64 * cellsize,
        yllcorner,
        xllcorner + ncols as f64 * cellsize,
        xllcorner,
        nrows,
        ncols,
        cellsize,
    )?;

    Ok((Grid::from_values(nrows, ncols, values), region))
}

/// Writes a grid as an ESRI ASCII grid. NaN cells are written as the
/// NODATA value.
pub fn write_ascii_grid(
    path: &Path,
    grid: &Grid,
    region: &Region,
    nodata: f64,
) -> Result<(), AscError> {
    let mut writer = BufWriter::new(File::create(path)?);

    writeln!(writer, "ncols {}", grid.cols())?;
    writeln!(writer, "nrows {}", grid.rows())?;
    writeln!(writer, "xllcorner {}", region.west)?;
    writeln!(writer, "yllcorner {}", region.south)?;
    writeln!(writer, "cellsize {}", region.cell_size)?;
    writeln!(writer, "NODATA_value {}", nodata)?;

    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            if col > 0 {
                write!(writer, " ")?;
            }
            let v = grid.get(row, col);
            if v.is_finite() {
                write!(writer, "{}", v)?;
            } else {
                write!(writer, "{}", nodata)?;
            }
        }
        writeln!(writer)?;
    }

    Ok(())
}
