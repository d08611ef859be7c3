//! Boundary between the page logic and the map renderer.

use serde_json::{json, Value};

use crate::error::VotemapError;
use crate::layer::{CircleLayer, VectorSource};

/// A map instance of an external rendering engine.
///
/// The engine owns rendering, tile loading and user interaction. Failures inside the engine after a source or a
/// layer is accepted (network, missing source layers, broken tiles) are handled by the engine itself.
pub trait MapEngine {
    /// Registers a vector tile source under the given id.
    fn add_source(&mut self, id: &str, source: &VectorSource) -> Result<(), VotemapError>;
    /// Adds a layer on top of the existing ones.
    fn add_layer(&mut self, layer: &CircleLayer) -> Result<(), VotemapError>;
}

/// Engine that only remembers what was added to it.
///
/// Used to export the style of a map instead of rendering it.
#[derive(Debug, Default, Clone)]
pub struct RecordingEngine {
    sources: Vec<(String, Value)>,
    layers: Vec<Value>,
}

impl RecordingEngine {
    /// Creates an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Added layers in the renderer JSON format.
    pub fn layers(&self) -> &[Value] {
        &self.layers
    }

    /// Style fragment with all sources and layers: `{"sources": {...}, "layers": [...]}`.
    pub fn to_style_json(&self) -> Value {
        let sources: serde_json::Map<String, Value> = self.sources.iter().cloned().collect();
        json!({
            "sources": sources,
            "layers": self.layers,
        })
    }
}

impl MapEngine for RecordingEngine {
    fn add_source(&mut self, id: &str, source: &VectorSource) -> Result<(), VotemapError> {
        if self.sources.iter().any(|(existing, _)| existing == id) {
            return Err(VotemapError::Engine(format!(
                "source {id:?} is already registered"
            )));
        }

        self.sources
            .push((id.to_string(), serde_json::to_value(source)?));
        Ok(())
    }

    fn add_layer(&mut self, layer: &CircleLayer) -> Result<(), VotemapError> {
        if !self.sources.iter().any(|(id, _)| *id == layer.source) {
            return Err(VotemapError::Engine(format!(
                "layer {:?} refers to unknown source {:?}",
                layer.id, layer.source
            )));
        }

        self.layers.push(layer.to_json()?);
        Ok(())
    }
}
