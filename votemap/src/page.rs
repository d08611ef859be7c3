//! See [`MapPage`].

use serde::Serialize;

use crate::compare::{CompareOptions, MapSide};
use crate::config::{ComparisonConfig, PanelConfig, YearProfile};
use crate::engine::MapEngine;
use crate::error::VotemapError;
use crate::layer::add_dot_density_layer;
use crate::legend::{LegendRegistry, LegendSurface};
use crate::view::{LngLat, MapView};

/// Options of one map instance, in the format of the renderer's map constructor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapSpec {
    /// Id of the element the map is attached to.
    pub container: String,
    /// Basemap style url.
    pub style: String,
    /// Initial center.
    pub center: LngLat,
    /// Initial zoom.
    pub zoom: f64,
    /// Zoom limit.
    pub max_zoom: f64,
}

impl MapSpec {
    fn new(panel: &PanelConfig, style_url: &str, view: &MapView) -> Self {
        Self {
            container: panel.container.clone(),
            style: style_url.to_string(),
            center: view.center,
            zoom: view.zoom,
            max_zoom: view.max_zoom,
        }
    }
}

/// Comparison page: two maps of different years behind a swipe divider, each with its own legend.
///
/// The page is created once when the document is ready. The application creates both map instances from
/// [`MapPage::map_spec`], attaches the compare widget, and calls [`MapPage::on_ready`] when a map finishes loading.
/// `C` is the legend container type of the [`LegendSurface`] the legends are built on.
#[derive(Debug)]
pub struct MapPage<C> {
    config: ComparisonConfig,
    legends: LegendRegistry<C>,
}

impl<C: Clone> MapPage<C> {
    /// Validates the config and creates the page.
    pub fn new(config: ComparisonConfig) -> Result<Self, VotemapError> {
        config.validate()?;

        Ok(Self {
            config,
            legends: LegendRegistry::new(),
        })
    }

    /// Page config.
    pub fn config(&self) -> &ComparisonConfig {
        &self.config
    }

    fn panel(&self, side: MapSide) -> &PanelConfig {
        match side {
            MapSide::Before => &self.config.before,
            MapSide::After => &self.config.after,
        }
    }

    /// Constructor options of the map. Both maps share the basemap style and the initial view.
    pub fn map_spec(&self, side: MapSide) -> MapSpec {
        MapSpec::new(self.panel(side), &self.config.style_url, &self.config.view)
    }

    /// Year shown by the map.
    pub fn profile(&self, side: MapSide) -> &YearProfile {
        &self.panel(side).profile
    }

    /// Options of the compare widget.
    pub fn compare_options(&self) -> CompareOptions {
        self.config.compare
    }

    /// Selector of the element that holds both maps.
    pub fn comparison_container(&self) -> &str {
        &self.config.comparison_container
    }

    /// Legend containers built so far.
    pub fn legends(&self) -> &LegendRegistry<C> {
        &self.legends
    }

    /// Load callback of a map: adds the dot-density layer of the map's year and builds its legend.
    pub fn on_ready<E, S>(
        &mut self,
        side: MapSide,
        map: &mut E,
        surface: &mut S,
    ) -> Result<(), VotemapError>
    where
        E: MapEngine + ?Sized,
        S: LegendSurface<Container = C>,
    {
        let profile = match side {
            MapSide::Before => &self.config.before.profile,
            MapSide::After => &self.config.after.profile,
        };
        log::debug!("Map {side:?} is ready, showing {}", profile.year);

        add_dot_density_layer(
            map,
            &mut self.legends,
            surface,
            &self.config.map,
            &self.config.tiles,
            profile,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Year;
    use crate::engine::RecordingEngine;
    use crate::legend::MemorySurface;
    use assert_matches::assert_matches;

    #[test]
    fn both_maps_share_style_and_view() {
        let page = MapPage::<usize>::new(ComparisonConfig::default()).unwrap();
        let before = page.map_spec(MapSide::Before);
        let after = page.map_spec(MapSide::After);

        assert_eq!(before.container, "before");
        assert_eq!(after.container, "after");
        assert_eq!(before.style, after.style);
        assert_eq!(before.center, LngLat::new(-98.5795, 39.8283));
        assert_eq!((before.zoom, before.max_zoom), (3.5, 10.0));
        assert_eq!((after.zoom, after.max_zoom), (3.5, 10.0));

        assert_eq!(page.comparison_container(), "#comparison-container");
        assert_eq!(page.compare_options(), CompareOptions::default());
    }

    #[test]
    fn map_spec_json() {
        let page = MapPage::<usize>::new(ComparisonConfig::default()).unwrap();
        assert_eq!(
            serde_json::to_value(page.map_spec(MapSide::Before)).unwrap(),
            serde_json::json!({
                "container": "before",
                "style": "https://tiles.stadiamaps.com/styles/alidade_smooth.json",
                "center": [-98.5795, 39.8283],
                "zoom": 3.5,
                "maxZoom": 10.0
            })
        );
    }

    #[test]
    fn ready_maps_get_layers_of_their_year() {
        let mut page = MapPage::new(ComparisonConfig::default()).unwrap();
        let mut surface = MemorySurface::new();
        let mut before = RecordingEngine::new();
        let mut after = RecordingEngine::new();

        page.on_ready(MapSide::After, &mut after, &mut surface).unwrap();
        page.on_ready(MapSide::Before, &mut before, &mut surface).unwrap();

        assert_eq!(before.layers()[0]["source-layer"], "election_results_2016");
        assert_eq!(after.layers()[0]["source-layer"], "election_results_2020");
        assert_eq!(page.legends().len(), 2);
        assert!(page.legends().get(Year::new(2016)).is_some());

        let left = surface.legend(Year::new(2016)).unwrap();
        assert_eq!(left.rows().count(), 3);
        assert_eq!(left.style("left"), Some("20px"));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = ComparisonConfig::default();
        config.tiles.url = "https://example.com/tiles.pbf".into();
        assert_matches!(
            MapPage::<usize>::new(config),
            Err(VotemapError::InvalidTemplate(_))
        );
    }
}
