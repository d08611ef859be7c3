use geo::{BoundingRect, Centroid, Contains};
use geo_types::{Coord, MultiPolygon, Point};
use rand::Rng;

/// Rounds the value to one of the two nearest integers, up with the probability equal to the fractional part.
///
/// The expected value of the result is equal to the input, so totals over many areas are preserved. Negative and
/// non-finite values round to zero.
pub fn stochastic_round(value: f64, rng: &mut impl Rng) -> u64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }

    let floor = value.floor();
    let fraction = value - floor;
    floor as u64 + u64::from(rng.gen::<f64>() < fraction)
}

const ATTEMPTS_PER_POINT: usize = 1000;

/// Places `count` uniformly distributed random points inside the area.
///
/// Points are drawn from the bounding rectangle of the area and rejected if they fall outside. If the area is too
/// thin for that to succeed (e.g. a degenerate polygon), the missing points are put at the centroid.
pub fn sample_points(area: &MultiPolygon<f64>, count: usize, rng: &mut impl Rng) -> Vec<Point<f64>> {
    let mut points = Vec::with_capacity(count);
    let Some(rect) = area.bounding_rect() else {
        return points;
    };

    let (min, max) = (rect.min(), rect.max());
    let mut attempts = count.saturating_mul(ATTEMPTS_PER_POINT);
    while points.len() < count && attempts > 0 {
        attempts -= 1;
        let candidate = Point::from(Coord {
            x: rng.gen_range(min.x..=max.x),
            y: rng.gen_range(min.y..=max.y),
        });
        if area.contains(&candidate) {
            points.push(candidate);
        }
    }

    if points.len() < count {
        if let Some(centroid) = area.centroid() {
            log::warn!(
                "Could not place {} of {count} points inside the area, using its centroid",
                count - points.len()
            );
            points.resize(count, centroid);
        }
    }

    points
}
