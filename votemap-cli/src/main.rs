//! Command line tools of votemap.
//!
//! * `prefetch` mirrors a running tile server into a static tile tree,
//! * `ingest` turns vote counts per area into dot points,
//! * `tile` runs the vector tiler over the dot points,
//! * `style` and `legend` print what the web page adds to a map of the given year.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use serde_json::Value;
use votemap::ingest::{ingest, IngestOptions, IngestOutcome};
use votemap::legend::add_dot_density_legend;
use votemap::mirror::{MirrorOptions, TileMirror, DEFAULT_OUTPUT, DEFAULT_SOURCE};
use votemap::tile::MAX_ZOOM;
use votemap::tiler::{tile, TilerOptions, TilerOutcome, TIPPECANOE};
use votemap::{
    add_dot_density_layer, ColorScale, ComparisonConfig, LegendRegistry, MemorySurface,
    RecordingEngine, TileUrlTemplate, Year,
};

#[derive(Debug, Parser)]
#[command(name = "votemap")]
#[command(author, version, about = "Dot-density election map tools", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Download every tile of a zoom range from a tile server
    Prefetch {
        /// Tile url template with {z}, {x} and {y} placeholders
        #[arg(long, default_value = DEFAULT_SOURCE)]
        source: String,
        /// Root of the static tile tree
        #[arg(short, long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,
        /// First zoom level
        #[arg(
            short = 'z',
            long,
            default_value_t = 0,
            value_parser = clap::value_parser!(u32).range(0..=i64::from(MAX_ZOOM))
        )]
        min_zoom: u32,
        /// Last zoom level (inclusive)
        #[arg(
            short = 'Z',
            long,
            default_value_t = 13,
            value_parser = clap::value_parser!(u32).range(0..=i64::from(MAX_ZOOM))
        )]
        max_zoom: u32,
        /// Number of parallel downloads
        #[arg(short = 't', long, default_value_t = 4)]
        threads: usize,
    },
    /// Convert a GeoJSON of vote counts per area into one point per vote
    Ingest {
        /// Input GeoJSON FeatureCollection of polygons
        input: PathBuf,
        /// Election year of the vote columns
        #[arg(short, long)]
        year: Year,
        /// Precinct results to spread over the census blocks of the input
        #[arg(short, long)]
        precincts: Option<PathBuf>,
        /// Output directory
        #[arg(short, long, default_value = "geojson")]
        output: PathBuf,
        /// Seed of the random generator
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Build vector tiles of the 2020 and 2016 dot points of an area
    Tile {
        /// Name of the area, the stem of the points files
        name: String,
        /// Directory with the points files
        #[arg(short, long, default_value = "geojson")]
        input: PathBuf,
        /// Directory the .mbtiles files are written to
        #[arg(short, long, default_value = "tiles")]
        output: PathBuf,
        /// Tiler executable
        #[arg(long, default_value = TIPPECANOE)]
        tiler: String,
    },
    /// Print the source and layer added to the map of the year
    Style {
        /// Year of the map
        #[arg(short, long)]
        year: Year,
        /// Page config file (JSON). Built-in config is used if not set
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the legend of the year as HTML
    Legend {
        /// Year of the map
        #[arg(short, long)]
        year: Year,
        /// Page config file (JSON). Built-in config is used if not set
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn load_config(path: Option<&Path>) -> Result<ComparisonConfig> {
    match path {
        Some(path) => ComparisonConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(ComparisonConfig::default()),
    }
}

fn style_json(config: &ComparisonConfig, year: Year) -> Result<Value> {
    let profile = config.profile(year)?;
    let mut engine = RecordingEngine::new();
    add_dot_density_layer(
        &mut engine,
        &mut LegendRegistry::new(),
        &mut MemorySurface::new(),
        &config.map,
        &config.tiles,
        profile,
    )?;

    Ok(engine.to_style_json())
}

fn legend_html(config: &ComparisonConfig, year: Year) -> Result<String> {
    let profile = config.profile(year)?;
    let mut surface = MemorySurface::new();
    add_dot_density_legend(
        &mut surface,
        &mut LegendRegistry::new(),
        &ColorScale::new(&config.map),
        config.map.legend_label(),
        profile,
    )?;

    Ok(surface.to_html())
}

async fn prefetch(options: MirrorOptions) -> Result<()> {
    let mirror = TileMirror::new(options)?;
    let report = mirror.run().await?;

    if !report.failed.is_empty() {
        for index in &report.failed {
            warn!("Tile {index} was not downloaded");
        }
        anyhow::bail!("{} tiles failed to download", report.failed.len());
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Prefetch {
            source,
            output,
            min_zoom,
            max_zoom,
            threads,
        } => {
            let source = TileUrlTemplate::new(source)?;
            let options = MirrorOptions {
                output,
                min_zoom,
                max_zoom,
                workers: threads,
                ..MirrorOptions::new(source)
            };
            prefetch(options).await?;
        }
        Commands::Ingest {
            input,
            year,
            precincts,
            output,
            seed,
        } => {
            let options = IngestOptions {
                input,
                output_dir: output,
                year,
                precincts,
                seed,
            };
            match ingest(&options)
                .with_context(|| format!("Failed to ingest {}", options.input.display()))?
            {
                IngestOutcome::Written { path, points } => {
                    info!("Wrote {points} points to {}", path.display())
                }
                IngestOutcome::Skipped(path) => info!("{} is up to date", path.display()),
            }
        }
        Commands::Tile {
            name,
            input,
            output,
            tiler,
        } => {
            let options = TilerOptions {
                input_dir: input,
                output_dir: output,
                program: tiler.into(),
                ..TilerOptions::new(name)
            };
            match tile(&options).context("Failed to build tiles")? {
                TilerOutcome::Tiled(paths) => {
                    for path in paths {
                        info!("Wrote {}", path.display());
                    }
                }
                TilerOutcome::Skipped => info!("Tiles of {} are up to date", options.name),
            }
        }
        Commands::Style { year, config } => {
            let config = load_config(config.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&style_json(&config, year)?)?);
        }
        Commands::Legend { year, config } => {
            let config = load_config(config.as_deref())?;
            print!("{}", legend_html(&config, year)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use clap::CommandFactory;

    #[test]
    fn cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn prefetch_defaults() {
        let cli = Cli::try_parse_from(["votemap", "prefetch"]).unwrap();
        assert_matches!(
            cli.command,
            Commands::Prefetch { ref source, min_zoom: 0, max_zoom: 13, threads: 4, .. } if source == DEFAULT_SOURCE
        );
    }

    #[test]
    fn prefetch_zoom_flags() {
        let cli =
            Cli::try_parse_from(["votemap", "-v", "prefetch", "-z", "2", "-Z", "5", "-t", "8"]).unwrap();
        assert!(cli.verbose);
        assert_matches!(
            cli.command,
            Commands::Prefetch { min_zoom: 2, max_zoom: 5, threads: 8, .. }
        );
    }

    #[test]
    fn zoom_beyond_tile_grid_is_rejected() {
        assert!(Cli::try_parse_from(["votemap", "prefetch", "-Z", "30"]).is_err());
        assert!(Cli::try_parse_from(["votemap", "prefetch", "-z", "25"]).is_err());
        assert!(Cli::try_parse_from(["votemap", "prefetch", "-Z", "24"]).is_ok());
    }

    #[test]
    fn tile_defaults() {
        let cli = Cli::try_parse_from(["votemap", "tile", "pa"]).unwrap();
        assert_matches!(
            cli.command,
            Commands::Tile { ref name, ref input, ref output, ref tiler }
                if name == "pa" && input == Path::new("geojson") && output == Path::new("tiles") && tiler == TIPPECANOE
        );
    }

    #[test]
    fn ingest_with_precincts() {
        let cli = Cli::try_parse_from([
            "votemap", "ingest", "data/pa_blocks.geojson", "-y", "2020", "-p", "data/pa_precincts.geojson",
        ])
        .unwrap();
        assert_matches!(
            cli.command,
            Commands::Ingest { precincts: Some(ref path), .. } if path == Path::new("data/pa_precincts.geojson")
        );
    }

    #[test]
    fn year_is_parsed() {
        let cli = Cli::try_parse_from(["votemap", "legend", "--year", "2016"]).unwrap();
        assert_matches!(cli.command, Commands::Legend { year, config: None } if year == Year::new(2016));

        assert!(Cli::try_parse_from(["votemap", "style", "--year", "twenty"]).is_err());
    }

    #[test]
    fn style_of_year() {
        let style = style_json(&ComparisonConfig::default(), Year::new(2020)).unwrap();
        assert_eq!(style["layers"][0]["source-layer"], "election_results_2020");
        assert!(style["sources"]["dot-density-source"].is_object());
    }

    #[test]
    fn legend_of_year() {
        let html = legend_html(&ComparisonConfig::default(), Year::new(2016)).unwrap();
        assert!(html.contains("map-legend-2016"));
        assert!(html.contains("Trump"));
        assert!(!html.contains("Biden"));
    }

    #[test]
    fn unknown_year_is_an_error() {
        assert!(legend_html(&ComparisonConfig::default(), Year::new(2012)).is_err());
    }

    #[test]
    fn config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.json");
        let json = serde_json::to_string(&ComparisonConfig::default()).unwrap();
        std::fs::write(&path, json).unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.before.container, "before");
        assert!(load_config(Some(&dir.path().join("missing.json"))).is_err());
    }
}
