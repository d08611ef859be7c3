//! Running the external vector tiler over the dot points.
//!
//! The points written by [`ingest`](crate::ingest::ingest) are turned into `.mbtiles` files by `tippecanoe`, one
//! file per election year with the `election_results_<year>` layer.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;

use crate::config::Year;
use crate::error::VotemapError;

/// Tiler executable.
pub const TIPPECANOE: &str = "tippecanoe";

/// Parameters of tiling the points of one area.
#[derive(Debug, Clone)]
pub struct TilerOptions {
    /// Name of the area, the stem of the points files (e.g. `pa`).
    pub name: String,
    /// Directory with the `<name>_<year>_points.geojson` files.
    pub input_dir: PathBuf,
    /// Directory the `<name>_<year>.mbtiles` files are written to.
    pub output_dir: PathBuf,
    /// Years to tile.
    pub years: Vec<Year>,
    /// Tiler executable.
    pub program: OsString,
}

impl TilerOptions {
    /// Options for the 2020 and 2016 points in `geojson/`, written to `tiles/`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input_dir: PathBuf::from("geojson"),
            output_dir: PathBuf::from("tiles"),
            years: vec![Year::new(2020), Year::new(2016)],
            program: TIPPECANOE.into(),
        }
    }

    /// Points file of the year.
    pub fn input_path(&self, year: Year) -> PathBuf {
        self.input_dir
            .join(format!("{}_{year}_points.geojson", self.name))
    }

    /// Tiles file of the year.
    pub fn output_path(&self, year: Year) -> PathBuf {
        self.output_dir.join(format!("{}_{year}.mbtiles", self.name))
    }

    /// Tiler arguments for the year.
    ///
    /// All dots are kept from zoom 9 on. Below that the tiler drops features going up a level, and with gamma 1.5
    /// it keeps more of the overlapping dots than by default.
    pub fn arguments(&self, year: Year) -> Vec<OsString> {
        let mut arguments: Vec<OsString> = vec!["-o".into(), self.output_path(year).into()];
        arguments.extend(
            [
                format!("--layer=election_results_{year}"),
                "-z13".to_string(),
                "--no-tile-size-limit".to_string(),
                "--no-feature-limit".to_string(),
                "--base-zoom=9".to_string(),
                "--gamma=1.5".to_string(),
            ]
            .map(OsString::from),
        );
        arguments.push(self.input_path(year).into());
        arguments
    }
}

/// Result of a tiling run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TilerOutcome {
    /// The tiles files were written.
    Tiled(Vec<PathBuf>),
    /// Tiles of every year already exist, the tiler was not run.
    Skipped,
}

/// Runs the tiler for every year, unless the tiles of all years already exist.
pub fn tile(options: &TilerOptions) -> Result<TilerOutcome, VotemapError> {
    if options
        .years
        .iter()
        .all(|year| options.output_path(*year).exists())
    {
        log::info!("Tiles of {} already exist, skipping", options.name);
        return Ok(TilerOutcome::Skipped);
    }

    std::fs::create_dir_all(&options.output_dir)?;

    let mut written = Vec::with_capacity(options.years.len());
    for year in &options.years {
        let arguments = options.arguments(*year);
        log::info!("Tiling {:?}", options.input_path(*year));
        log::debug!("Running {:?} {arguments:?}", options.program);

        let status = Command::new(&options.program).args(&arguments).status()?;
        if !status.success() {
            return Err(VotemapError::Tiler(format!(
                "{:?} failed for {year}: {status}",
                options.program
            )));
        }

        written.push(options.output_path(*year));
    }

    Ok(TilerOutcome::Tiled(written))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::path::Path;

    #[test]
    fn tiler_arguments() {
        let options = TilerOptions::new("pa");
        let arguments = options.arguments(Year::new(2016));
        let expected = [
            "-o",
            "tiles/pa_2016.mbtiles",
            "--layer=election_results_2016",
            "-z13",
            "--no-tile-size-limit",
            "--no-feature-limit",
            "--base-zoom=9",
            "--gamma=1.5",
            "geojson/pa_2016_points.geojson",
        ];

        assert_eq!(arguments.len(), expected.len());
        for (argument, expected) in arguments.iter().zip(expected) {
            assert_eq!(Path::new(argument), Path::new(expected));
        }
    }

    #[test]
    fn existing_tiles_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let options = TilerOptions {
            output_dir: dir.path().to_path_buf(),
            program: "votemap-missing-tiler".into(),
            ..TilerOptions::new("dc")
        };
        std::fs::write(dir.path().join("dc_2020.mbtiles"), b"").unwrap();
        std::fs::write(dir.path().join("dc_2016.mbtiles"), b"").unwrap();

        assert_matches!(tile(&options), Ok(TilerOutcome::Skipped));
    }

    #[test]
    fn tiler_runs_if_one_year_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let options = TilerOptions {
            output_dir: dir.path().to_path_buf(),
            program: "votemap-missing-tiler".into(),
            ..TilerOptions::new("dc")
        };
        std::fs::write(dir.path().join("dc_2020.mbtiles"), b"").unwrap();

        // The run is attempted and fails to start the executable.
        assert_matches!(tile(&options), Err(VotemapError::Io(_)));
    }
}
