//! Vector tile source and circle layer of the dot-density map.

use serde::Serialize;
use serde_json::{json, Value};

use crate::config::{MapConfig, TileSourceConfig, YearProfile};
use crate::engine::MapEngine;
use crate::error::VotemapError;
use crate::expression::{Expression, Interpolation};
use crate::legend::{add_dot_density_legend, LegendRegistry, LegendSurface};
use crate::palette::ColorScale;
use crate::tile::TileUrlTemplate;

/// Id of the dots source.
pub const SOURCE_ID: &str = "dot-density-source";
/// Id of the dots layer.
pub const LAYER_ID: &str = "dot-density-layer";
/// Feature attribute with the category of a dot.
pub const CATEGORY_ATTRIBUTE: &str = "category";

/// Vector tile source description in the renderer format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorSource {
    #[serde(rename = "type")]
    kind: &'static str,
    /// Tile url templates.
    pub tiles: Vec<String>,
    /// Minimum zoom level of tiles.
    pub minzoom: u32,
    /// Maximum zoom level of tiles. Tiles of this level are overzoomed when the map zooms further in.
    pub maxzoom: u32,
}

impl VectorSource {
    /// Creates a source from the configured tile url.
    pub fn new(tiles: &TileSourceConfig) -> Result<Self, VotemapError> {
        let template = TileUrlTemplate::new(&tiles.url)?;
        Ok(Self {
            kind: "vector",
            tiles: vec![template.as_str().to_string()],
            minzoom: tiles.min_zoom,
            maxzoom: tiles.max_zoom,
        })
    }
}

/// Paint properties of a circle layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CirclePaint {
    /// Radius in pixels.
    #[serde(rename = "circle-radius")]
    pub radius: Expression,
    /// Fill color.
    #[serde(rename = "circle-color")]
    pub color: Expression,
    /// Opacity from 0 to 1.
    #[serde(rename = "circle-opacity")]
    pub opacity: Expression,
}

/// Circle layer description in the renderer format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircleLayer {
    /// Layer id.
    pub id: String,
    #[serde(rename = "type")]
    kind: &'static str,
    /// Id of the source the layer reads from.
    pub source: String,
    /// Name of the layer inside vector tiles.
    #[serde(rename = "source-layer")]
    pub source_layer: String,
    /// Paint rules.
    pub paint: CirclePaint,
}

impl CircleLayer {
    /// Creates the dots layer of the year.
    pub fn dot_density(scale: &ColorScale, profile: &YearProfile) -> Result<Self, VotemapError> {
        Ok(Self {
            id: LAYER_ID.into(),
            kind: "circle",
            source: SOURCE_ID.into(),
            source_layer: profile.source_layer(),
            paint: CirclePaint {
                radius: radius_expression()?,
                color: color_expression(scale)?,
                opacity: opacity_expression()?,
            },
        })
    }

    /// Layer in the renderer JSON format.
    pub fn to_json(&self) -> Result<Value, VotemapError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Dots stay one pixel wide up to zoom 10, then grow exponentially up to 256 pixels at zoom 22.
pub fn radius_expression() -> Result<Expression, VotemapError> {
    Expression::interpolate_zoom(
        Interpolation::Exponential(2.0),
        [(0.0, 1.0), (8.0, 1.0), (10.0, 1.0), (22.0, 256.0)],
    )
}

/// Dots are nearly transparent at low zoom levels, so that dense areas blend into a color field.
pub fn opacity_expression() -> Result<Expression, VotemapError> {
    Expression::interpolate_zoom(
        Interpolation::Linear,
        [(0.0, 0.06), (9.0, 0.06), (13.0, 0.4)],
    )
}

/// Category color match. Features with an unknown category get the color of the first category.
pub fn color_expression(scale: &ColorScale) -> Result<Expression, VotemapError> {
    let default = scale.default_color()?;
    let arms = scale
        .iter()
        .map(|(category, color)| (category.to_string(), json!(color.to_hex())))
        .collect::<Vec<_>>();

    Ok(Expression::match_property(
        CATEGORY_ATTRIBUTE,
        arms,
        json!(default.to_hex()),
    ))
}

/// Registers the dots source and layer of the year on the map, then builds the legend of the year.
pub fn add_dot_density_layer<E, S>(
    map: &mut E,
    legends: &mut LegendRegistry<S::Container>,
    surface: &mut S,
    config: &MapConfig,
    tiles: &TileSourceConfig,
    profile: &YearProfile,
) -> Result<(), VotemapError>
where
    E: MapEngine + ?Sized,
    S: LegendSurface,
{
    config.validate()?;
    let scale = ColorScale::new(config);

    map.add_source(SOURCE_ID, &VectorSource::new(tiles)?)?;
    map.add_layer(&CircleLayer::dot_density(&scale, profile)?)?;
    log::info!(
        "Added layer {LAYER_ID} for {} with {} categories",
        profile.source_layer(),
        scale.len()
    );

    add_dot_density_legend(surface, legends, &scale, config.legend_label(), profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::EvaluationContext;
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;

    fn evaluate(expression: &Expression, zoom: f64) -> f64 {
        expression
            .evaluate(&EvaluationContext::at_zoom(zoom))
            .as_f64()
            .unwrap()
    }

    #[test]
    fn color_match_has_one_arm_per_category() {
        let scale = ColorScale::new(&MapConfig::default());
        assert_eq!(
            color_expression(&scale).unwrap().to_json(),
            json!([
                "match",
                ["get", "category"],
                "Biden",
                "#0000FF",
                "Trump",
                "#FF0000",
                "Clinton",
                "#0000FF",
                "Other",
                "#FFFF00",
                "#0000FF"
            ])
        );
    }

    #[test]
    fn unmatched_category_gets_first_color() {
        let config = MapConfig {
            color_associations_hex: [
                ("Trump", crate::Color::RED),
                ("Biden", crate::Color::BLUE),
            ]
            .into_iter()
            .map(|(category, color)| (category.to_string(), color))
            .collect(),
            color_associations: Default::default(),
            ..Default::default()
        };
        let expression = color_expression(&ColorScale::new(&config)).unwrap();
        let context = EvaluationContext::at_zoom(5.0).with_property(CATEGORY_ATTRIBUTE, "Perot");
        assert_eq!(expression.evaluate(&context), json!("#FF0000"));
    }

    #[test]
    fn radius_curve() {
        let radius = radius_expression().unwrap();
        for zoom in [0.0, 3.5, 8.0, 9.5, 10.0] {
            assert_abs_diff_eq!(evaluate(&radius, zoom), 1.0);
        }
        assert_abs_diff_eq!(evaluate(&radius, 22.0), 256.0);
        assert_abs_diff_eq!(evaluate(&radius, 24.0), 256.0);

        let mid = evaluate(&radius, 16.0);
        assert!(mid > 1.0 && mid < 10.0);
    }

    #[test]
    fn opacity_curve() {
        let opacity = opacity_expression().unwrap();
        assert_abs_diff_eq!(evaluate(&opacity, 3.5), 0.06);
        assert_abs_diff_eq!(evaluate(&opacity, 9.0), 0.06);
        assert_abs_diff_eq!(evaluate(&opacity, 13.0), 0.4);
        assert_abs_diff_eq!(evaluate(&opacity, 18.0), 0.4);
        assert_abs_diff_eq!(evaluate(&opacity, 10.0), 0.145, epsilon = 1e-9);
    }

    #[test]
    fn layer_json() {
        let scale = ColorScale::new(&MapConfig::default());
        let layer = CircleLayer::dot_density(&scale, &YearProfile::election_2020()).unwrap();
        let json = layer.to_json().unwrap();

        assert_eq!(json["id"], "dot-density-layer");
        assert_eq!(json["type"], "circle");
        assert_eq!(json["source"], "dot-density-source");
        assert_eq!(json["source-layer"], "election_results_2020");
        assert_eq!(json["paint"]["circle-radius"][0], "interpolate");
        assert_eq!(json["paint"]["circle-radius"][1], json!(["exponential", 2.0]));
        assert_eq!(json["paint"]["circle-opacity"][1], json!(["linear"]));
        assert_eq!(json["paint"]["circle-color"][0], "match");
    }

    #[test]
    fn layer_is_not_added_for_category_without_color() {
        let mut config = MapConfig::default();
        config
            .color_associations
            .insert("Stein".into(), "green".into());
        let mut map = crate::RecordingEngine::new();
        let mut surface = crate::MemorySurface::new();

        let result = add_dot_density_layer(
            &mut map,
            &mut LegendRegistry::new(),
            &mut surface,
            &config,
            &TileSourceConfig::default(),
            &YearProfile::election_2020(),
        );
        assert_matches!(result, Err(VotemapError::MissingFallbackColor(_)));
        assert!(map.layers().is_empty());

        config.fallback_color = Some(crate::Color::GRAY);
        add_dot_density_layer(
            &mut map,
            &mut LegendRegistry::new(),
            &mut surface,
            &config,
            &TileSourceConfig::default(),
            &YearProfile::election_2020(),
        )
        .unwrap();
        assert_eq!(map.layers().len(), 1);
    }

    #[test]
    fn source_json() {
        let source = VectorSource::new(&TileSourceConfig::default()).unwrap();
        assert_eq!(
            serde_json::to_value(&source).unwrap(),
            json!({
                "type": "vector",
                "tiles": ["https://resultmap.s3.us-east-2.amazonaws.com/tiles/{z}/{x}/{y}.pbf"],
                "minzoom": 0,
                "maxzoom": 10
            })
        );
    }
}
