//! Data-driven style expressions.
//!
//! [`Expression`] is a typed subset of the expression language of the map renderer. It is serialized into the
//! renderer's JSON array syntax (`["interpolate", ["linear"], ["zoom"], 0, 0.06, ...]`) and can also be evaluated
//! natively, which is used to check the paint rules without the renderer.

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

use crate::error::VotemapError;

/// Interpolation curve between stops.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Interpolation {
    /// Linear interpolation.
    Linear,
    /// Exponential interpolation with the given base. The output grows faster towards the upper stop for
    /// `base > 1`.
    Exponential(f64),
}

impl Interpolation {
    /// Interpolation factor of `input` between stop inputs `lower` and `upper`.
    fn factor(&self, input: f64, lower: f64, upper: f64) -> f64 {
        let difference = upper - lower;
        let progress = input - lower;
        if difference == 0.0 {
            return 0.0;
        }

        match *self {
            Interpolation::Exponential(base) if base != 1.0 => {
                (base.powf(progress) - 1.0) / (base.powf(difference) - 1.0)
            }
            _ => progress / difference,
        }
    }

    fn to_json(self) -> Value {
        match self {
            Interpolation::Linear => json!(["linear"]),
            Interpolation::Exponential(base) => json!(["exponential", base]),
        }
    }
}

/// Values available to an expression during evaluation.
#[derive(Debug, Clone, Default)]
pub struct EvaluationContext {
    /// Current zoom level of the map.
    pub zoom: f64,
    /// Attributes of the evaluated feature.
    pub properties: Map<String, Value>,
}

impl EvaluationContext {
    /// Context with the given zoom and no feature attributes.
    pub fn at_zoom(zoom: f64) -> Self {
        Self {
            zoom,
            properties: Map::new(),
        }
    }

    /// Sets a feature attribute.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// Style expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Value of a feature attribute: `["get", name]`.
    Get(String),
    /// Current zoom level: `["zoom"]`.
    Zoom,
    /// `["interpolate", curve, input, stop_in_0, stop_out_0, ...]`.
    Interpolate {
        /// Curve.
        interpolation: Interpolation,
        /// Input expression, must evaluate to a number.
        input: Box<Expression>,
        /// `(input, output)` stops sorted by input.
        stops: Vec<(f64, f64)>,
    },
    /// `["match", input, label_0, output_0, ..., default]`.
    Match {
        /// Input expression.
        input: Box<Expression>,
        /// `(label, output)` arms tried in order.
        arms: Vec<(String, Value)>,
        /// Output if no label is equal to the input.
        default: Value,
    },
}

impl Expression {
    /// Creates an interpolation over the zoom level.
    ///
    /// Fails if there are no stops or the stop inputs are not strictly ascending.
    pub fn interpolate_zoom(
        interpolation: Interpolation,
        stops: impl IntoIterator<Item = (f64, f64)>,
    ) -> Result<Self, VotemapError> {
        let stops: Vec<_> = stops.into_iter().collect();
        if stops.is_empty() {
            return Err(VotemapError::InvalidConfig(
                "interpolation needs at least one stop".into(),
            ));
        }

        if stops.windows(2).any(|pair| pair[0].0 >= pair[1].0) {
            return Err(VotemapError::InvalidConfig(format!(
                "interpolation stops must be ascending: {stops:?}"
            )));
        }

        Ok(Self::Interpolate {
            interpolation,
            input: Box::new(Expression::Zoom),
            stops,
        })
    }

    /// Creates a match over a feature attribute.
    pub fn match_property(
        property: impl Into<String>,
        arms: impl IntoIterator<Item = (String, Value)>,
        default: Value,
    ) -> Self {
        Self::Match {
            input: Box::new(Expression::Get(property.into())),
            arms: arms.into_iter().collect(),
            default,
        }
    }

    /// Converts the expression into the renderer JSON syntax.
    pub fn to_json(&self) -> Value {
        match self {
            Expression::Get(name) => json!(["get", name]),
            Expression::Zoom => json!(["zoom"]),
            Expression::Interpolate {
                interpolation,
                input,
                stops,
            } => {
                let mut items = vec![json!("interpolate"), interpolation.to_json(), input.to_json()];
                for (stop_input, stop_output) in stops {
                    items.push(json!(stop_input));
                    items.push(json!(stop_output));
                }
                Value::Array(items)
            }
            Expression::Match {
                input,
                arms,
                default,
            } => {
                let mut items = vec![json!("match"), input.to_json()];
                for (label, output) in arms {
                    items.push(json!(label));
                    items.push(output.clone());
                }
                items.push(default.clone());
                Value::Array(items)
            }
        }
    }

    /// Evaluates the expression.
    ///
    /// Missing attributes evaluate to `null`. Interpolation is clamped to the outer stops, and returns `null` if
    /// the input is not a number.
    pub fn evaluate(&self, context: &EvaluationContext) -> Value {
        match self {
            Expression::Get(name) => context.properties.get(name).cloned().unwrap_or(Value::Null),
            Expression::Zoom => json!(context.zoom),
            Expression::Interpolate {
                interpolation,
                input,
                stops,
            } => match input.evaluate(context).as_f64() {
                Some(x) => json!(interpolate(*interpolation, stops, x)),
                None => Value::Null,
            },
            Expression::Match {
                input,
                arms,
                default,
            } => {
                let value = input.evaluate(context);
                arms.iter()
                    .find(|(label, _)| value.as_str() == Some(label.as_str()))
                    .map(|(_, output)| output.clone())
                    .unwrap_or_else(|| default.clone())
            }
        }
    }
}

fn interpolate(interpolation: Interpolation, stops: &[(f64, f64)], x: f64) -> f64 {
    let (Some(first), Some(last)) = (stops.first(), stops.last()) else {
        return f64::NAN;
    };

    if x <= first.0 {
        return first.1;
    }
    if x >= last.0 {
        return last.1;
    }

    let upper_index = stops.iter().position(|(input, _)| *input > x).unwrap_or(stops.len() - 1);
    let (lower_in, lower_out) = stops[upper_index - 1];
    let (upper_in, upper_out) = stops[upper_index];

    let t = interpolation.factor(x, lower_in, upper_in);
    lower_out + t * (upper_out - lower_out)
}

impl Serialize for Expression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;

    fn opacity() -> Expression {
        Expression::interpolate_zoom(
            Interpolation::Linear,
            [(0.0, 0.06), (9.0, 0.06), (13.0, 0.4)],
        )
        .unwrap()
    }

    #[test]
    fn interpolation_json() {
        assert_eq!(
            opacity().to_json(),
            json!(["interpolate", ["linear"], ["zoom"], 0.0, 0.06, 9.0, 0.06, 13.0, 0.4])
        );

        let radius =
            Expression::interpolate_zoom(Interpolation::Exponential(2.0), [(0.0, 1.0), (22.0, 256.0)])
                .unwrap();
        assert_eq!(
            radius.to_json(),
            json!(["interpolate", ["exponential", 2.0], ["zoom"], 0.0, 1.0, 22.0, 256.0])
        );
    }

    #[test]
    fn linear_interpolation() {
        let expr = opacity();
        let at = |zoom| expr.evaluate(&EvaluationContext::at_zoom(zoom)).as_f64().unwrap();

        assert_abs_diff_eq!(at(-1.0), 0.06);
        assert_abs_diff_eq!(at(5.0), 0.06);
        assert_abs_diff_eq!(at(11.0), 0.23, epsilon = 1e-9);
        assert_abs_diff_eq!(at(13.0), 0.4);
        assert_abs_diff_eq!(at(20.0), 0.4);
    }

    #[test]
    fn exponential_interpolation() {
        let expr =
            Expression::interpolate_zoom(Interpolation::Exponential(2.0), [(10.0, 1.0), (22.0, 256.0)])
                .unwrap();
        let at = |zoom| expr.evaluate(&EvaluationContext::at_zoom(zoom)).as_f64().unwrap();

        assert_abs_diff_eq!(at(10.0), 1.0);
        assert_abs_diff_eq!(at(22.0), 256.0);
        // (2^6 - 1) / (2^12 - 1) of the way.
        assert_abs_diff_eq!(at(16.0), 1.0 + 255.0 * 63.0 / 4095.0, epsilon = 1e-9);
        assert!(at(16.0) < 128.5);
    }

    #[test]
    fn invalid_stops() {
        assert_matches!(
            Expression::interpolate_zoom(Interpolation::Linear, []),
            Err(VotemapError::InvalidConfig(_))
        );
        assert_matches!(
            Expression::interpolate_zoom(Interpolation::Linear, [(2.0, 1.0), (1.0, 2.0)]),
            Err(VotemapError::InvalidConfig(_))
        );
    }

    #[test]
    fn match_evaluation() {
        let expr = Expression::match_property(
            "category",
            [
                ("Biden".to_string(), json!("#0000FF")),
                ("Trump".to_string(), json!("#FF0000")),
            ],
            json!("#0000FF"),
        );

        let eval = |category: &str| {
            expr.evaluate(&EvaluationContext::at_zoom(3.0).with_property("category", category))
        };
        assert_eq!(eval("Trump"), json!("#FF0000"));
        assert_eq!(eval("trump"), json!("#0000FF"));
        assert_eq!(expr.evaluate(&EvaluationContext::at_zoom(3.0)), json!("#0000FF"));

        assert_eq!(
            expr.to_json(),
            json!(["match", ["get", "category"], "Biden", "#0000FF", "Trump", "#FF0000", "#0000FF"])
        );
    }

    #[test]
    fn interpolation_of_non_number_is_null() {
        let expr = Expression::Interpolate {
            interpolation: Interpolation::Linear,
            input: Box::new(Expression::Get("name".into())),
            stops: vec![(0.0, 0.0), (1.0, 1.0)],
        };
        let context = EvaluationContext::at_zoom(0.0).with_property("name", "x");
        assert_eq!(expr.evaluate(&context), Value::Null);
    }
}
