//! Votemap builds side-by-side dot-density maps of election results. Every vote of an election is drawn as a dot
//! colored by the candidate it went to, and two elections are shown next to each other behind a swipe divider.
//!
//! # Quick start
//!
//! The page of two maps is described by a [`ComparisonConfig`]. Its default shows the 2016 presidential election on
//! the left and the 2020 one on the right:
//!
//! ```no_run
//! use votemap::{ComparisonConfig, MapPage, MapSide, MemorySurface, RecordingEngine};
//!
//! let mut page = MapPage::new(ComparisonConfig::default()).unwrap();
//! let mut surface = MemorySurface::new();
//! let mut map = RecordingEngine::new();
//!
//! page.on_ready(MapSide::Before, &mut map, &mut surface).unwrap();
//! println!("{}", map.to_style_json());
//! println!("{}", surface.to_html());
//! ```
//!
//! # Main components
//!
//! The crate does not render anything by itself. Drawing is done by a map engine (MapLibre in the browser), which is
//! represented by the [`MapEngine`] trait. Votemap produces what the engine needs:
//!
//! * [`config`] describes the categories of dots and their colors ([`MapConfig`]), the tile source and the two
//!   years being compared,
//! * [`expression`] and [`layer`] build the vector source and the circle layer with zoom-dependent radius and
//!   opacity and category-dependent color,
//! * [`legend`] builds the per-year legend on a [`LegendSurface`] (DOM in the browser, [`MemorySurface`] elsewhere),
//! * [`compare`] holds the options of the swipe divider between the two maps,
//! * [`MapPage`] ties everything together for the two map instances of the page.
//!
//! Data preparation tools are behind features: `ingest` turns vote counts per area into dots and runs the external
//! tiler over them, `mirror` downloads a tile server into a static tile tree.

#![warn(clippy::unwrap_used)]
#![warn(missing_docs)]

mod color;
pub mod compare;
pub mod config;
pub mod engine;
pub mod error;
pub mod expression;
pub mod layer;
pub mod legend;
mod page;
mod palette;
pub mod tile;
mod view;

#[cfg(feature = "ingest")]
pub mod ingest;
#[cfg(feature = "mirror")]
pub mod mirror;
#[cfg(feature = "ingest")]
pub mod tiler;

pub use color::Color;
pub use compare::{CompareOptions, MapSide};
pub use config::{ComparisonConfig, LegendPosition, MapConfig, Year, YearProfile};
pub use engine::{MapEngine, RecordingEngine};
pub use error::VotemapError;
pub use layer::add_dot_density_layer;
pub use legend::{LegendRegistry, LegendSurface, MemorySurface};
pub use page::{MapPage, MapSpec};
pub use palette::ColorScale;
pub use tile::{TileIndex, TileUrlTemplate};
pub use view::{LngLat, MapView};
