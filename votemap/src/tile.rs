//! Tile indices and tile url templates of the XYZ tile scheme (origin in the top left corner).

use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::VotemapError;

/// Deepest zoom level of the tile grid.
pub const MAX_ZOOM: u32 = 24;

/// Index of a tile.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileIndex {
    /// Zoom level.
    pub z: u32,
    /// Column, from west to east.
    pub x: u32,
    /// Row, from north to south.
    pub y: u32,
}

impl TileIndex {
    /// Creates a new index.
    pub const fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Number of tiles along one side of the grid at the zoom level, `None` above [`MAX_ZOOM`].
    pub fn grid_size(z: u32) -> Option<u32> {
        (z <= MAX_ZOOM).then(|| 1 << z)
    }

    /// Every tile of every zoom level from `min_zoom` to `max_zoom` inclusive, ordered by `z`, then `x`, then `y`.
    ///
    /// Levels above [`MAX_ZOOM`] are not part of the grid and are skipped.
    pub fn pyramid(min_zoom: u32, max_zoom: u32) -> impl Iterator<Item = TileIndex> {
        (min_zoom..=max_zoom.min(MAX_ZOOM)).flat_map(|z| {
            let size = Self::grid_size(z).unwrap_or_default();
            (0..size).flat_map(move |x| (0..size).map(move |y| TileIndex { z, x, y }))
        })
    }

    /// Number of tiles in the pyramid from `min_zoom` to `max_zoom` inclusive.
    pub fn pyramid_len(min_zoom: u32, max_zoom: u32) -> u64 {
        (min_zoom..=max_zoom.min(MAX_ZOOM))
            .filter_map(Self::grid_size)
            .map(|size| u64::from(size).pow(2))
            .sum()
    }

    /// Location of the tile file in a static tile tree under `root`: `root/z/x/y.pbf`.
    pub fn path_in(&self, root: impl AsRef<Path>) -> PathBuf {
        root.as_ref()
            .join(self.z.to_string())
            .join(self.x.to_string())
            .join(format!("{}.pbf", self.y))
    }
}

impl Display for TileIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Url of tiles with `{z}`, `{x}` and `{y}` placeholders, e.g. `https://host/tiles/{z}/{x}/{y}.pbf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileUrlTemplate {
    template: String,
}

impl TileUrlTemplate {
    /// Creates a template. Fails if any of the placeholders is missing.
    pub fn new(template: impl Into<String>) -> Result<Self, VotemapError> {
        let template = template.into();
        if ["{z}", "{x}", "{y}"]
            .iter()
            .any(|placeholder| !template.contains(placeholder))
        {
            return Err(VotemapError::InvalidTemplate(template));
        }

        Ok(Self { template })
    }

    /// Url of the tile.
    pub fn url(&self, index: TileIndex) -> String {
        self.template
            .replace("{z}", &index.z.to_string())
            .replace("{x}", &index.x.to_string())
            .replace("{y}", &index.y.to_string())
    }

    /// The template as given.
    pub fn as_str(&self) -> &str {
        &self.template
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn pyramid_order_and_size() {
        let tiles: Vec<_> = TileIndex::pyramid(0, 2).collect();
        assert_eq!(tiles.len(), 1 + 4 + 16);
        assert_eq!(TileIndex::pyramid_len(0, 2), 21);
        assert_eq!(tiles[0], TileIndex::new(0, 0, 0));
        assert_eq!(tiles[1], TileIndex::new(1, 0, 0));
        assert_eq!(tiles[2], TileIndex::new(1, 0, 1));
        assert_eq!(tiles[3], TileIndex::new(1, 1, 0));
        assert_eq!(*tiles.last().unwrap(), TileIndex::new(2, 3, 3));

        assert_eq!(TileIndex::pyramid(3, 3).count(), 64);
    }

    #[test]
    fn template_substitution() {
        let template = TileUrlTemplate::new("https://example.com/tiles/{z}/{x}/{y}.pbf").unwrap();
        assert_eq!(
            template.url(TileIndex::new(5, 7, 12)),
            "https://example.com/tiles/5/7/12.pbf"
        );
    }

    #[test]
    fn template_validation() {
        assert_matches!(
            TileUrlTemplate::new("https://example.com/tiles/{z}/{x}.pbf"),
            Err(VotemapError::InvalidTemplate(_))
        );
    }

    #[test]
    fn zoom_levels_beyond_the_grid() {
        assert_eq!(TileIndex::grid_size(MAX_ZOOM), Some(1 << 24));
        assert_eq!(TileIndex::grid_size(32), None);
        assert_eq!(TileIndex::pyramid_len(30, 32), 0);
        assert_eq!(TileIndex::pyramid(31, 40).count(), 0);
        assert_eq!(
            TileIndex::pyramid_len(MAX_ZOOM, 32),
            u64::from(TileIndex::grid_size(MAX_ZOOM).unwrap()).pow(2)
        );
    }

    #[test]
    fn static_tree_path() {
        let path = TileIndex::new(3, 2, 1).path_in("tiles/static");
        assert_eq!(path, Path::new("tiles/static/3/2/1.pbf"));
    }
}
