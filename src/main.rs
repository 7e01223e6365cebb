//! Earthworks CLI - cut-and-fill terrain modeling.
//!
//! Transforms an input elevation raster by cutting and filling around
//! seed geometry (coordinates, polylines, or a spot-elevation raster).

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Instant;

use earthworks::io::{read_ascii_grid, write_ascii_grid};
use earthworks::{
    ConfigError, DecayFunction, EarthworksConfig, Mode, Operation, Region, SeedTable,
};

const NODATA: f64 = -9999.0;

/// Cut-and-fill terrain modeling over elevation grids.
#[derive(Parser)]
#[command(name = "earthworks")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input elevation raster (ESRI ASCII grid).
    #[arg(short, long)]
    elevation: PathBuf,

    /// Output elevation raster.
    #[arg(short, long, default_value = "earthworks.asc")]
    output: PathBuf,

    /// Output volumetric-change raster.
    #[arg(long)]
    volume: Option<PathBuf>,

    /// Earthworking mode.
    #[arg(long, value_enum, default_value_t = ModeArg::Absolute)]
    mode: ModeArg,

    /// Earthworking operation.
    #[arg(long, value_enum, default_value_t = OperationArg::Cutfill)]
    operation: OperationArg,

    /// Growth/decay function.
    #[arg(long, value_enum, default_value_t = FunctionArg::Linear)]
    function: FunctionArg,

    /// Rate of decay.
    #[arg(long, default_value = "0.1", allow_negative_numbers = true)]
    rate: f64,

    /// Inflection distance for the logistic function, in map units.
    #[arg(long, default_value = "0.0")]
    midpoint: f64,

    /// Radius of flats around each seed, in map units.
    #[arg(long, default_value = "0.0")]
    flat: f64,

    /// Seed elevation value(s).
    #[arg(short, long, value_delimiter = ',', default_value = "1.0", allow_negative_numbers = true)]
    z: Vec<f64>,

    /// Seed point coordinates as x,y pairs.
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    coordinates: Option<Vec<f64>>,

    /// Polyline vertices as x,y pairs, sampled at the grid resolution.
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    line: Option<Vec<f64>>,

    /// 3D polyline vertices as x,y,z triples, sampled at the grid
    /// resolution with z interpolated along each segment.
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    line3d: Option<Vec<f64>>,

    /// Raster of spot elevations (ESRI ASCII grid); every finite nonzero
    /// cell becomes a seed.
    #[arg(long)]
    raster: Option<PathBuf>,

    /// Maximum seeds per quadrant before it splits.
    #[arg(long, default_value = "100")]
    threshold: usize,

    /// Seed-visibility border around quadrants, in map units.
    #[arg(long, default_value = "250.0")]
    border: f64,

    /// Force spatial partitioning on.
    #[arg(long, conflicts_with = "no_partition")]
    partition: bool,

    /// Force spatial partitioning off.
    #[arg(long)]
    no_partition: bool,

    /// Worker threads (defaults to available parallelism).
    #[arg(long)]
    workers: Option<usize>,

    /// Print net volumes.
    #[arg(short = 'p', long)]
    print_volume: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    /// At the given elevation.
    Absolute,
    /// Relative to the existing topography.
    Relative,
}

#[derive(Clone, Copy, ValueEnum)]
enum OperationArg {
    /// Cut into the topography.
    Cut,
    /// Fill on top of the topography.
    Fill,
    /// Cut and fill.
    Cutfill,
}

#[derive(Clone, Copy, ValueEnum)]
enum FunctionArg {
    Linear,
    Exponential,
    Logistic,
    Gaussian,
    Lorentz,
    Quadratic,
    Cubic,
}

impl ModeArg {
    fn into_mode(self) -> Mode {
        match self {
            Self::Absolute => Mode::Absolute,
            Self::Relative => Mode::Relative,
        }
    }
}

impl OperationArg {
    fn into_operation(self) -> Operation {
        match self {
            Self::Cut => Operation::Cut,
            Self::Fill => Operation::Fill,
            Self::Cutfill => Operation::CutFill,
        }
    }
}

impl FunctionArg {
    fn into_function(self, midpoint: f64) -> DecayFunction {
        match self {
            Self::Linear => DecayFunction::Linear,
            Self::Exponential => DecayFunction::Exponential,
            Self::Logistic => DecayFunction::Logistic { midpoint },
            Self::Gaussian => DecayFunction::Gaussian,
            Self::Lorentz => DecayFunction::Lorentz,
            Self::Quadratic => DecayFunction::Quadratic,
            Self::Cubic => DecayFunction::Cubic,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let start = Instant::now();

    // Load the input elevation surface.
    let (elevation, region) = read_ascii_grid(&cli.elevation).unwrap_or_else(|e| {
        eprintln!("Error reading elevation raster: {}", e);
        std::process::exit(1);
    });

    let operation = cli.operation.into_operation();
    let seeds = resolve_geometry(&cli, &region, operation).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let config = EarthworksConfig {
        operation,
        mode: cli.mode.into_mode(),
        function: cli.function.into_function(cli.midpoint),
        // Negative rates are folded to their magnitude, matching how the
        // rate option has always been interpreted.
        rate: cli.rate.abs(),
        flat: cli.flat,
        threshold: cli.threshold,
        border: cli.border,
        partition: match (cli.partition, cli.no_partition) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        },
        workers: cli.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }),
    };

    let output = earthworks::run(&elevation, &region, &seeds, &config).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    write_ascii_grid(&cli.output, &output.elevation, &region, NODATA).unwrap_or_else(|e| {
        eprintln!("Error writing output raster: {}", e);
        std::process::exit(1);
    });

    if let Some(volume_path) = &cli.volume {
        write_ascii_grid(volume_path, &output.volume, &region, NODATA).unwrap_or_else(|e| {
            eprintln!("Error writing volume raster: {}", e);
            std::process::exit(1);
        });
    }

    if cli.print_volume {
        if operation == Operation::CutFill {
            println!("Net change: {} cubic map units", output.net_change());
        }
        if matches!(operation, Operation::CutFill | Operation::Fill) {
            println!("Net fill: {} cubic map units", output.net_fill);
        }
        if matches!(operation, Operation::CutFill | Operation::Cut) {
            println!("Net cut: {} cubic map units", output.net_cut);
        }
    }

    println!(
        "Earthworked {} cells with {} seed(s) in {:.2?}",
        region.cell_count(),
        seeds.len(),
        start.elapsed()
    );
}

/// Resolves whichever geometry input was supplied into a seed table.
///
/// Inputs are tried in the same order as the original tool: spot raster,
/// then coordinates, then lines. Supplying none is a configuration error.
fn resolve_geometry(
    cli: &Cli,
    region: &Region,
    operation: Operation,
) -> Result<SeedTable, String> {
    if let Some(raster_path) = &cli.raster {
        let (raster, raster_region) =
            read_ascii_grid(raster_path).map_err(|e| format!("reading spot raster: {}", e))?;
        return Ok(SeedTable::from_raster(&raster, &raster_region));
    }

    if let Some(coordinates) = &cli.coordinates {
        let coords = pair_up(coordinates).ok_or("coordinates must be x,y pairs")?;
        return SeedTable::from_coordinates(&coords, &cli.z, operation)
            .map_err(|e| e.to_string());
    }

    if let Some(line) = &cli.line {
        let vertices = pair_up(line).ok_or("line vertices must be x,y pairs")?;
        return SeedTable::from_polyline(&vertices, cli.z[0], region.cell_size)
            .map_err(|e| e.to_string());
    }

    if let Some(line3d) = &cli.line3d {
        if line3d.len() % 3 != 0 {
            return Err("3D line vertices must be x,y,z triples".to_string());
        }
        let vertices: Vec<(f64, f64, f64)> = line3d
            .chunks_exact(3)
            .map(|c| (c[0], c[1], c[2]))
            .collect();
        return SeedTable::from_polyline3d(&vertices, region.cell_size)
            .map_err(|e| e.to_string());
    }

    Err(ConfigError::MissingGeometry.to_string())
}

/// Groups a flat list into (x, y) pairs; `None` for an odd count.
fn pair_up(values: &[f64]) -> Option<Vec<(f64, f64)>> {
    if values.len() % 2 != 0 || values.is_empty() {
        return None;
    }
    Some(values.chunks_exact(2).map(|c| (c[0], c[1])).collect())
}
