//! Conversion of election results per area into dot-density points.
//!
//! Every area (census block, precinct) of the input is a GeoJSON polygon feature with vote count columns. Each vote
//! becomes one point placed randomly inside its area and tagged with the category of the vote. The resulting
//! FeatureCollection is tiled by an external tiler into the `election_results_<year>` source layer.
//!
//! When the results are given per precinct, the votes are first spread over census blocks (see [`disaggregate()`]) and
//! the dots are drawn inside the blocks.

use std::path::{Path, PathBuf};

use geo_types::{Geometry, MultiPolygon};
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;

use crate::config::Year;
use crate::error::VotemapError;
use crate::layer::CATEGORY_ATTRIBUTE;

mod columns;
mod disaggregate;
mod sampling;

pub use columns::{CandidateColumns, OTHER};
pub use disaggregate::{
    assign_blocks, disaggregate, population_shares, Block, Disaggregation, Precinct,
};
pub use sampling::{sample_points, stochastic_round};

/// Block property with the block identifier.
pub const BLOCK_ID_COLUMN: &str = "GEOID20";
/// Block property with the voting age population.
pub const POPULATION_COLUMN: &str = "VAP_MOD";

/// Area with its rounded vote counts.
#[derive(Debug, Clone, PartialEq)]
pub struct VotingArea {
    /// Area geometry.
    pub area: MultiPolygon<f64>,
    /// Votes per category, in the order of [`CandidateColumns::categories`].
    pub votes: Vec<u64>,
}

fn polygon_area(index: usize, feature: &Feature) -> Result<Option<MultiPolygon<f64>>, VotemapError> {
    let Some(geometry) = feature.geometry.clone() else {
        log::debug!("Feature #{index} has no geometry, skipping");
        return Ok(None);
    };

    let geometry: Geometry<f64> = geometry
        .try_into()
        .map_err(|err| VotemapError::Ingest(format!("feature #{index}: {err}")))?;
    match geometry {
        Geometry::Polygon(polygon) => Ok(Some(MultiPolygon::new(vec![polygon]))),
        Geometry::MultiPolygon(multi_polygon) => Ok(Some(multi_polygon)),
        _ => Err(VotemapError::Ingest(format!(
            "feature #{index} is not a polygon"
        ))),
    }
}

fn vote_counts(
    index: usize,
    feature: &Feature,
    columns: &CandidateColumns,
) -> Result<Vec<f64>, VotemapError> {
    let empty = JsonObject::new();
    let properties = feature.properties.as_ref().unwrap_or(&empty);
    columns
        .votes(properties)
        .map_err(|err| VotemapError::Ingest(format!("feature #{index}: {err}")))
}

/// Reads the voting areas from features. Vote counts are stochastically rounded.
///
/// Features without geometry are skipped. Non-polygon geometries are an error.
pub fn voting_areas(
    features: &[Feature],
    columns: &CandidateColumns,
    rng: &mut impl Rng,
) -> Result<Vec<VotingArea>, VotemapError> {
    let mut areas = Vec::with_capacity(features.len());
    for (i, feature) in features.iter().enumerate() {
        let Some(area) = polygon_area(i, feature)? else {
            continue;
        };

        let votes = vote_counts(i, feature, columns)?
            .into_iter()
            .map(|count| stochastic_round(count, rng))
            .collect();
        areas.push(VotingArea { area, votes });
    }

    Ok(areas)
}

/// Reads the precincts from features, keeping the vote counts unrounded.
pub fn precincts(
    features: &[Feature],
    columns: &CandidateColumns,
) -> Result<Vec<Precinct>, VotemapError> {
    let mut precincts = Vec::with_capacity(features.len());
    for (i, feature) in features.iter().enumerate() {
        if let Some(area) = polygon_area(i, feature)? {
            let votes = vote_counts(i, feature, columns)?;
            precincts.push(Precinct { area, votes });
        }
    }

    Ok(precincts)
}

/// Reads the census blocks from features with [`BLOCK_ID_COLUMN`] and [`POPULATION_COLUMN`] properties.
///
/// A missing or non-numeric population counts as zero.
pub fn blocks(features: &[Feature]) -> Result<Vec<Block>, VotemapError> {
    let mut blocks = Vec::with_capacity(features.len());
    for (i, feature) in features.iter().enumerate() {
        let Some(area) = polygon_area(i, feature)? else {
            continue;
        };

        let id = match feature.property(BLOCK_ID_COLUMN) {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => format!("#{i}"),
        };
        let population = match feature.property(POPULATION_COLUMN) {
            Some(Value::Number(value)) => value.as_f64(),
            Some(Value::String(value)) => value.trim().parse().ok(),
            _ => None,
        }
        .unwrap_or(0.0);

        blocks.push(Block {
            id,
            area,
            population,
        });
    }

    Ok(blocks)
}

/// One point feature per vote. Points are grouped by category, in the order of `categories`.
pub fn dot_features(
    areas: &[VotingArea],
    categories: &[&str],
    rng: &mut impl Rng,
) -> Vec<Feature> {
    let mut features = Vec::new();
    for (category_index, category) in categories.iter().enumerate() {
        let mut properties = JsonObject::new();
        properties.insert(CATEGORY_ATTRIBUTE.to_string(), (*category).into());

        for area in areas {
            let count = area.votes.get(category_index).copied().unwrap_or(0) as usize;
            for point in sample_points(&area.area, count, rng) {
                features.push(Feature {
                    bbox: None,
                    geometry: Some(geojson::Geometry::new(geojson::Value::from(&point))),
                    id: None,
                    properties: Some(properties.clone()),
                    foreign_members: None,
                });
            }
        }

        log::info!("Drew dots for {category}");
    }

    features
}

/// Parameters of converting one input file.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// GeoJSON FeatureCollection of voting areas.
    pub input: PathBuf,
    /// Directory the points are written to.
    pub output_dir: PathBuf,
    /// Election year of the input columns.
    pub year: Year,
    /// GeoJSON FeatureCollection of precinct results. If set, `input` contains census blocks without votes and the
    /// precinct votes are spread over them.
    pub precincts: Option<PathBuf>,
    /// Seed of the random generator. A random seed is used if not set.
    pub seed: Option<u64>,
}

impl IngestOptions {
    /// Output file: `<output_dir>/<input stem>_<year>_points.geojson`.
    pub fn output_path(&self) -> PathBuf {
        let stem = self
            .input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "areas".to_string());
        self.output_dir
            .join(format!("{stem}_{}_points.geojson", self.year))
    }
}

/// Result of an ingestion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Points were written to the file.
    Written {
        /// Output file.
        path: PathBuf,
        /// Number of points.
        points: usize,
    },
    /// The output file already exists, nothing was done.
    Skipped(PathBuf),
}

/// Converts the voting areas of the input file into a points file.
pub fn ingest(options: &IngestOptions) -> Result<IngestOutcome, VotemapError> {
    let path = options.output_path();
    if path.exists() {
        log::info!("{path:?} already exists, skipping");
        return Ok(IngestOutcome::Skipped(path));
    }

    let columns = CandidateColumns::for_year(options.year)?;
    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let features = read_features(&options.input)?;
    let areas = match &options.precincts {
        Some(precinct_path) => {
            let precincts = precincts(&read_features(precinct_path)?, &columns)?;
            log::info!(
                "Spreading votes of {} precincts over {} blocks",
                precincts.len(),
                features.len()
            );
            disaggregate(blocks(&features)?, &precincts, &mut rng).areas
        }
        None => voting_areas(&features, &columns, &mut rng)?,
    };
    let dots = dot_features(&areas, &columns.categories(), &mut rng);
    let points = dots.len();

    write_features(&path, dots)?;
    log::info!("Saved {points} points to {path:?}");

    Ok(IngestOutcome::Written { path, points })
}

fn read_features(path: &Path) -> Result<Vec<Feature>, VotemapError> {
    let text = std::fs::read_to_string(path)?;
    let geojson: GeoJson = text
        .parse()
        .map_err(|err| VotemapError::Ingest(format!("{path:?}: {err}")))?;

    match geojson {
        GeoJson::FeatureCollection(collection) => Ok(collection.features),
        GeoJson::Feature(feature) => Ok(vec![feature]),
        GeoJson::Geometry(_) => Err(VotemapError::Ingest(format!(
            "{path:?} contains a bare geometry without vote counts"
        ))),
    }
}

fn write_features(path: &Path, features: Vec<Feature>) -> Result<(), VotemapError> {
    if let Some(folder) = path.parent() {
        std::fs::create_dir_all(folder)?;
    }

    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };
    let file = std::io::BufWriter::new(std::fs::File::create(path)?);
    serde_json::to_writer(file, &collection)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use geo::Contains;
    use geo_types::Point;
    use serde_json::json;

    fn block(x: f64, votes: Value) -> Value {
        json!({
            "type": "Feature",
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[x, 0.0], [x + 1.0, 0.0], [x + 1.0, 1.0], [x, 1.0], [x, 0.0]]]
            },
            "properties": votes
        })
    }

    fn write_input(dir: &Path, blocks: Vec<Value>) -> PathBuf {
        let path = dir.join("dc.geojson");
        let collection = json!({"type": "FeatureCollection", "features": blocks});
        std::fs::write(&path, collection.to_string()).unwrap();
        path
    }

    #[test]
    fn one_point_per_vote() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(
            dir.path(),
            vec![
                block(0.0, json!({"G20PREDBID": 3, "G20PRERTRU": 2, "G20PRELJOR": 1})),
                block(5.0, json!({"G20PREDBID": 0, "G20PRERTRU": 4, "G20PREGHAW": 0})),
            ],
        );

        let options = IngestOptions {
            input,
            output_dir: dir.path().join("geojson"),
            year: Year::new(2020),
            precincts: None,
            seed: Some(11),
        };
        let outcome = ingest(&options).unwrap();
        let path = dir.path().join("geojson/dc_2020_points.geojson");
        assert_eq!(
            outcome,
            IngestOutcome::Written {
                path: path.clone(),
                points: 10
            }
        );

        let written: GeoJson = std::fs::read_to_string(&path).unwrap().parse().unwrap();
        let GeoJson::FeatureCollection(collection) = written else {
            panic!("expected a feature collection");
        };
        let categories: Vec<_> = collection
            .features
            .iter()
            .map(|feature| feature.property(CATEGORY_ATTRIBUTE).unwrap().as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            categories,
            ["Biden", "Biden", "Biden", "Trump", "Trump", "Trump", "Trump", "Trump", "Trump", "Other"]
        );

        assert_matches!(ingest(&options), Ok(IngestOutcome::Skipped(_)));
    }

    #[test]
    fn points_fall_into_their_block() {
        let mut rng = StdRng::seed_from_u64(2);
        let features: Vec<Feature> = [block(0.0, json!({"G16PREDCLI": 0, "G16PRERTRU": 5}))]
            .into_iter()
            .map(|value| serde_json::from_value(value).unwrap())
            .collect();

        let columns = CandidateColumns::election_2016();
        let areas = voting_areas(&features, &columns, &mut rng).unwrap();
        assert_eq!(areas[0].votes, [0, 5, 0]);

        let dots = dot_features(&areas, &columns.categories(), &mut rng);
        assert_eq!(dots.len(), 5);
        for dot in dots {
            let geometry: Geometry<f64> = dot.geometry.unwrap().try_into().unwrap();
            let point: Point<f64> = geometry.try_into().unwrap();
            assert!(areas[0].area.contains(&point));
        }
    }

    #[test]
    fn non_polygon_is_rejected() {
        let feature: Feature = serde_json::from_value(json!({
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [0.0, 0.0]},
            "properties": {"G20PREDBID": 1, "G20PRERTRU": 1}
        }))
        .unwrap();

        let result = voting_areas(
            &[feature],
            &CandidateColumns::election_2020(),
            &mut StdRng::seed_from_u64(0),
        );
        assert_matches!(result, Err(VotemapError::Ingest(_)));
    }

    #[test]
    fn output_path_uses_input_stem() {
        let options = IngestOptions {
            input: "data/pa_blocks.geojson".into(),
            output_dir: "geojson".into(),
            year: Year::new(2016),
            precincts: None,
            seed: None,
        };
        assert_eq!(
            options.output_path(),
            Path::new("geojson/pa_blocks_2016_points.geojson")
        );
    }

    #[test]
    fn precinct_votes_are_drawn_in_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let precinct = json!({
            "type": "Feature",
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[0.0, 0.0], [4.0, 0.0], [4.0, 1.0], [0.0, 1.0], [0.0, 0.0]]]
            },
            "properties": {"G16PREDCLI": 8, "G16PRERTRU": 4, "G16PRELJOH": 0}
        });
        let precinct_path = dir.path().join("precincts.geojson");
        std::fs::write(
            &precinct_path,
            json!({"type": "FeatureCollection", "features": [precinct]}).to_string(),
        )
        .unwrap();

        let input = write_input(
            dir.path(),
            vec![
                block(0.0, json!({"GEOID20": "110010001001000", "VAP_MOD": 3})),
                block(1.0, json!({"GEOID20": "110010001001001", "VAP_MOD": "1"})),
                block(2.0, json!({"GEOID20": "110010001001002"})),
                block(7.0, json!({"GEOID20": "110010001001003", "VAP_MOD": 2})),
            ],
        );

        let options = IngestOptions {
            input,
            output_dir: dir.path().join("geojson"),
            year: Year::new(2016),
            precincts: Some(precinct_path),
            seed: Some(4),
        };
        // 8 * 0.75 + 4 * 0.75 in the first block, 8 * 0.25 + 4 * 0.25 in the second.
        assert_matches!(ingest(&options), Ok(IngestOutcome::Written { points: 12, .. }));
    }

    #[test]
    fn block_properties() {
        let features: Vec<Feature> = [
            block(0.0, json!({"GEOID20": "110010001001000", "VAP_MOD": 12.5})),
            block(1.0, json!({"GEOID20": 110010001001001_u64, "VAP_MOD": null})),
            block(2.0, json!({})),
        ]
        .into_iter()
        .map(|value| serde_json::from_value(value).unwrap())
        .collect();

        let blocks = blocks(&features).unwrap();
        assert_eq!(blocks[0].id, "110010001001000");
        assert_eq!(blocks[0].population, 12.5);
        assert_eq!(blocks[1].id, "110010001001001");
        assert_eq!(blocks[1].population, 0.0);
        assert_eq!(blocks[2].id, "#2");
    }
}
