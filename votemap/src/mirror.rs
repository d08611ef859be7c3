//! Mirroring of a tile server into a static tile tree.
//!
//! The dots are served as static files (`<root>/<z>/<x>/<y>.pbf`) from object storage. [`TileMirror`] produces that
//! tree by downloading every tile of a zoom pyramid from a dynamic tile server.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use reqwest::StatusCode;

use crate::error::VotemapError;
use crate::tile::{TileIndex, TileUrlTemplate, MAX_ZOOM};

/// Default tile server the mirror downloads from.
pub const DEFAULT_SOURCE: &str = "http://localhost:7800/services/all/tiles/{z}/{x}/{y}.pbf";
/// Default root of the static tile tree.
pub const DEFAULT_OUTPUT: &str = "tiles/static";

/// Parameters of a mirroring run.
#[derive(Debug, Clone)]
pub struct MirrorOptions {
    /// Tile server url template.
    pub source: TileUrlTemplate,
    /// Root of the static tile tree.
    pub output: PathBuf,
    /// First zoom level to download.
    pub min_zoom: u32,
    /// Last zoom level to download (inclusive).
    pub max_zoom: u32,
    /// Number of tiles downloaded at the same time.
    pub workers: usize,
    /// Number of requests made for one tile before giving up.
    pub attempts: u32,
}

impl MirrorOptions {
    /// Options with the default output, zoom levels 0 to 13, 4 workers and 3 attempts per tile.
    pub fn new(source: TileUrlTemplate) -> Self {
        Self {
            source,
            output: PathBuf::from(DEFAULT_OUTPUT),
            min_zoom: 0,
            max_zoom: 13,
            workers: 4,
            attempts: 3,
        }
    }
}

/// Result of downloading one tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileOutcome {
    /// The tile was written to the given file.
    Saved(PathBuf),
    /// The server has no data for the tile (`204 No Content`).
    Empty,
    /// All attempts failed. Contains the status of the last response if there was one.
    Failed(Option<u16>),
}

/// Summary of a mirroring run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorReport {
    /// Number of written tiles.
    pub saved: usize,
    /// Number of tiles without data.
    pub empty: usize,
    /// Tiles that could not be downloaded, sorted.
    pub failed: Vec<TileIndex>,
}

impl MirrorReport {
    fn record(&mut self, index: TileIndex, outcome: &TileOutcome) {
        match outcome {
            TileOutcome::Saved(_) => self.saved += 1,
            TileOutcome::Empty => self.empty += 1,
            TileOutcome::Failed(_) => self.failed.push(index),
        }
    }
}

/// Downloads tiles of a tile server into a static tile tree.
#[derive(Debug)]
pub struct TileMirror {
    http_client: reqwest::Client,
    options: MirrorOptions,
}

impl TileMirror {
    /// Creates a new mirror. Fails if the zoom range is empty or goes beyond [`MAX_ZOOM`].
    pub fn new(options: MirrorOptions) -> Result<Self, VotemapError> {
        if options.max_zoom > MAX_ZOOM {
            return Err(VotemapError::InvalidConfig(format!(
                "max zoom {} is above the deepest tile level {MAX_ZOOM}",
                options.max_zoom
            )));
        }
        if options.min_zoom > options.max_zoom {
            return Err(VotemapError::InvalidConfig(format!(
                "empty zoom range {}..={}",
                options.min_zoom, options.max_zoom
            )));
        }

        let http_client = reqwest::Client::builder()
            .user_agent(concat!("votemap/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            options,
        })
    }

    /// Downloads every tile of the configured zoom range.
    ///
    /// Failed tiles are reported and do not stop the run. Errors writing to the output are fatal.
    pub async fn run(&self) -> Result<MirrorReport, VotemapError> {
        let total = TileIndex::pyramid_len(self.options.min_zoom, self.options.max_zoom);
        info!(
            "Mirroring {total} tiles of zoom levels {}..={} from {} into {:?}",
            self.options.min_zoom,
            self.options.max_zoom,
            self.options.source.as_str(),
            self.options.output
        );

        let mut results = stream::iter(TileIndex::pyramid(
            self.options.min_zoom,
            self.options.max_zoom,
        ))
        .map(|index| async move { (index, self.fetch(index).await) })
        .buffer_unordered(self.options.workers.max(1));

        let mut report = MirrorReport::default();
        while let Some((index, outcome)) = results.next().await {
            report.record(index, &outcome?);
        }

        report.failed.sort();
        info!(
            "Mirroring done: {} saved, {} empty, {} failed",
            report.saved,
            report.empty,
            report.failed.len()
        );

        Ok(report)
    }

    /// Downloads one tile and writes it into the tile tree.
    pub async fn fetch(&self, index: TileIndex) -> Result<TileOutcome, VotemapError> {
        let url = self.options.source.url(index);
        let mut last_status = None;

        for attempt in 1..=self.options.attempts {
            debug!("Downloading tile {index}, attempt {attempt}");
            match self.load_from_web(&url).await {
                Ok((StatusCode::OK, bytes)) => {
                    let path = self.save(index, &bytes).await?;
                    debug!("Saved tile {index} to {path:?}");
                    return Ok(TileOutcome::Saved(path));
                }
                Ok((StatusCode::NO_CONTENT, _)) => {
                    debug!("Tile {index} is empty");
                    return Ok(TileOutcome::Empty);
                }
                Ok((status, _)) => {
                    warn!(
                        "Failed to download tile {index}: {status}. Attempt {attempt} of {}",
                        self.options.attempts
                    );
                    last_status = Some(status.as_u16());
                }
                Err(err) => {
                    warn!(
                        "Failed to download tile {index}: {err}. Attempt {attempt} of {}",
                        self.options.attempts
                    );
                }
            }
        }

        warn!("All attempts failed for tile {index}");
        Ok(TileOutcome::Failed(last_status))
    }

    async fn load_from_web(&self, url: &str) -> Result<(StatusCode, Bytes), reqwest::Error> {
        let response = self.http_client.get(url).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        Ok((status, bytes))
    }

    async fn save(&self, index: TileIndex, data: &Bytes) -> Result<PathBuf, VotemapError> {
        let path = index.path_in(&self.options.output);
        if let Some(folder) = path.parent() {
            ensure_folder_exists(folder).await?;
        }

        tokio::fs::write(&path, data).await?;
        Ok(path)
    }
}

async fn ensure_folder_exists(folder_path: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(folder_path).await
}
