//! Static configuration of the comparison page.
//!
//! The whole page is described by [`ComparisonConfig`], which is constructed once at startup (either from
//! [`ComparisonConfig::default`] or from a JSON document) and never mutated afterwards.

use std::fmt::{Display, Formatter};
use std::path::Path;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::compare::CompareOptions;
use crate::error::VotemapError;
use crate::palette::ColorScale;
use crate::view::MapView;

/// Key of `color_associations_hex` that is treated as the fallback color instead of a category.
pub const FALLBACK_KEY: &str = "";

/// Dot-density map configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Informational tag, e.g. `dot density`.
    pub map_type: String,
    /// Scale factor of dots. Not used by the paint expressions.
    pub dot_scale: f64,
    /// Data column used as the legend label.
    pub group_by_column: String,
    /// Data column used as the legend label when `group_by_column` is empty.
    pub symbology_column: String,
    /// Informational tag, e.g. `census block`.
    pub spatial_aggregation: String,
    /// Category name to human color word.
    pub color_associations: IndexMap<String, String>,
    /// Category name to color. Defines the set and the order of categories, so it keeps the insertion order.
    pub color_associations_hex: IndexMap<String, Color>,
    /// Color used for categories that are not in `color_associations_hex`. Required if any category of
    /// `color_associations` has no hex color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_color: Option<Color>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            map_type: "dot density".into(),
            dot_scale: 1.0,
            group_by_column: "candidate".into(),
            symbology_column: "votes".into(),
            spatial_aggregation: "census block".into(),
            color_associations: [
                ("Biden", "blue"),
                ("Trump", "red"),
                ("Clinton", "blue"),
                ("Other", "yellow"),
            ]
            .into_iter()
            .map(|(key, word)| (key.to_string(), word.to_string()))
            .collect(),
            color_associations_hex: [
                ("Biden", Color::BLUE),
                ("Trump", Color::RED),
                ("Clinton", Color::BLUE),
                ("Other", Color::YELLOW),
            ]
            .into_iter()
            .map(|(key, color)| (key.to_string(), color))
            .collect(),
            fallback_color: None,
        }
    }
}

impl MapConfig {
    /// Categories in the order of `color_associations_hex`. The fallback key is not a category.
    pub fn categories(&self) -> Vec<String> {
        self.color_associations_hex
            .keys()
            .filter(|key| key.as_str() != FALLBACK_KEY)
            .cloned()
            .collect()
    }

    /// Fallback color: the explicit `fallback_color` field, or the color of the empty-string key.
    pub fn fallback_color(&self) -> Option<Color> {
        self.fallback_color
            .or_else(|| self.color_associations_hex.get(FALLBACK_KEY).copied())
    }

    /// Label of the legend: `group_by_column` if set, `symbology_column` otherwise.
    pub fn legend_label(&self) -> &str {
        if self.group_by_column.is_empty() {
            &self.symbology_column
        } else {
            &self.group_by_column
        }
    }

    /// Checks the invariants of the config:
    /// * there is at least one category;
    /// * every category of `color_associations` has a hex color or the fallback color is set;
    /// * every color word is a known color.
    pub fn validate(&self) -> Result<(), VotemapError> {
        if self.categories().is_empty() {
            return Err(VotemapError::InvalidConfig(
                "color_associations_hex has no categories".into(),
            ));
        }

        let scale = ColorScale::new(self);
        for (category, word) in &self.color_associations {
            scale.color_or_fallback(category)?;

            if Color::from_name(word).is_none() && Color::try_from_hex(word).is_none() {
                return Err(VotemapError::InvalidColor(word.clone()));
            }
        }

        Ok(())
    }
}

/// Election year tag. Serialized as a string, deserialized from a string or a number.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "YearRepr", into = "String")]
pub struct Year(u16);

#[derive(Deserialize)]
#[serde(untagged)]
enum YearRepr {
    Number(u16),
    Text(String),
}

impl Year {
    /// Creates a year tag.
    pub const fn new(year: u16) -> Self {
        Self(year)
    }

    /// Numeric value of the year.
    pub fn value(&self) -> u16 {
        self.0
    }
}

impl Display for Year {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Year {
    type Err = VotemapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse()
            .map(Self)
            .map_err(|_| VotemapError::UnknownYear(s.to_string()))
    }
}

impl TryFrom<YearRepr> for Year {
    type Error = VotemapError;

    fn try_from(value: YearRepr) -> Result<Self, Self::Error> {
        match value {
            YearRepr::Number(year) => Ok(Self(year)),
            YearRepr::Text(text) => text.parse(),
        }
    }
}

impl From<Year> for String {
    fn from(value: Year) -> Self {
        value.to_string()
    }
}

/// Side of the page the legend is pinned to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendPosition {
    /// `left: 20px; right: auto`
    Left,
    /// `left: auto; right: 20px`
    Right,
}

impl LegendPosition {
    /// Inline `left` and `right` style values.
    pub fn offsets(&self) -> (&'static str, &'static str) {
        match self {
            LegendPosition::Left => ("20px", "auto"),
            LegendPosition::Right => ("auto", "20px"),
        }
    }
}

/// Per-year presentation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearProfile {
    /// Year of the dataset.
    pub year: Year,
    /// Category that is not shown in the legend of this year (the winner of the other election).
    #[serde(default)]
    pub excluded_category: Option<String>,
    /// Where the legend is pinned.
    pub legend_position: LegendPosition,
}

impl YearProfile {
    /// Profile of the 2016 map: pinned left, Biden is not in the legend.
    pub fn election_2016() -> Self {
        Self {
            year: Year::new(2016),
            excluded_category: Some("Biden".into()),
            legend_position: LegendPosition::Left,
        }
    }

    /// Profile of the 2020 map: pinned right, Clinton is not in the legend.
    pub fn election_2020() -> Self {
        Self {
            year: Year::new(2020),
            excluded_category: Some("Clinton".into()),
            legend_position: LegendPosition::Right,
        }
    }

    /// Returns true if the category should be listed in the legend of this year.
    pub fn shows(&self, category: &str) -> bool {
        self.excluded_category.as_deref() != Some(category)
    }

    /// Name of the source layer with the dots of this year.
    pub fn source_layer(&self) -> String {
        format!("election_results_{}", self.year)
    }
}

/// Vector tile source settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSourceConfig {
    /// Url template with `{z}`, `{x}` and `{y}` placeholders.
    pub url: String,
    /// Minimum zoom level of the tiles.
    pub min_zoom: u32,
    /// Maximum zoom level of the tiles.
    pub max_zoom: u32,
}

impl Default for TileSourceConfig {
    fn default() -> Self {
        Self {
            url: "https://resultmap.s3.us-east-2.amazonaws.com/tiles/{z}/{x}/{y}.pbf".into(),
            min_zoom: 0,
            max_zoom: 10,
        }
    }
}

/// One of the two maps of the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Id of the DOM element the map is attached to.
    pub container: String,
    /// Year shown in this panel.
    pub profile: YearProfile,
}

/// Full description of the comparison page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonConfig {
    /// Dot-density map configuration shared by both maps.
    pub map: MapConfig,
    /// Url of the basemap style.
    pub style_url: String,
    /// Dot tiles.
    #[serde(default)]
    pub tiles: TileSourceConfig,
    /// Initial camera of both maps.
    #[serde(default)]
    pub view: MapView,
    /// Swipe control settings.
    #[serde(default)]
    pub compare: CompareOptions,
    /// Selector of the element wrapping both maps.
    pub comparison_container: String,
    /// Left map.
    pub before: PanelConfig,
    /// Right map.
    pub after: PanelConfig,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            map: MapConfig::default(),
            style_url: "https://tiles.stadiamaps.com/styles/alidade_smooth.json".into(),
            tiles: TileSourceConfig::default(),
            view: MapView::default(),
            compare: CompareOptions::default(),
            comparison_container: "#comparison-container".into(),
            before: PanelConfig {
                container: "before".into(),
                profile: YearProfile::election_2016(),
            },
            after: PanelConfig {
                container: "after".into(),
                profile: YearProfile::election_2020(),
            },
        }
    }
}

impl ComparisonConfig {
    /// Parses and validates a config from JSON.
    pub fn from_json(json: &str) -> Result<Self, VotemapError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, VotemapError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        log::debug!("Loaded config from {:?}", path.as_ref());
        Self::from_json(&json)
    }

    /// Profile of the given year.
    pub fn profile(&self, year: Year) -> Result<&YearProfile, VotemapError> {
        [&self.before.profile, &self.after.profile]
            .into_iter()
            .find(|profile| profile.year == year)
            .ok_or_else(|| VotemapError::UnknownYear(year.to_string()))
    }

    /// Checks the invariants of the page config.
    pub fn validate(&self) -> Result<(), VotemapError> {
        self.map.validate()?;
        crate::tile::TileUrlTemplate::new(&self.tiles.url)?;

        if self.tiles.min_zoom > self.tiles.max_zoom {
            return Err(VotemapError::InvalidConfig(format!(
                "tile zoom range {}..{} is empty",
                self.tiles.min_zoom, self.tiles.max_zoom
            )));
        }

        if self.before.profile.year == self.after.profile.year {
            return Err(VotemapError::InvalidConfig(format!(
                "both maps show year {}",
                self.before.profile.year
            )));
        }

        Ok(())
    }
}
