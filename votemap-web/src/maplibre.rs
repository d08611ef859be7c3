//! Bindings to the `maplibregl` global of the MapLibre GL JS library and its compare plugin.

use js_sys::Function;
use serde::Serialize;
use votemap::error::VotemapError;
use votemap::layer::{CircleLayer, VectorSource};
use votemap::MapEngine;
use wasm_bindgen::prelude::*;

use crate::error::describe;

#[wasm_bindgen(js_namespace = maplibregl)]
extern "C" {
    /// `maplibregl.Map` instance.
    #[wasm_bindgen(js_name = Map)]
    #[derive(Debug, Clone)]
    pub type MaplibreMap;

    #[wasm_bindgen(constructor, js_class = "Map", catch)]
    fn construct(options: &JsValue) -> Result<MaplibreMap, JsValue>;

    #[wasm_bindgen(method, js_class = "Map", js_name = addSource, catch)]
    fn js_add_source(this: &MaplibreMap, id: &str, source: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_class = "Map", js_name = addLayer, catch)]
    fn js_add_layer(this: &MaplibreMap, layer: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_class = "Map", js_name = on)]
    fn js_on(this: &MaplibreMap, event: &str, listener: &Function);

    /// `maplibregl.Compare` swipe control.
    #[wasm_bindgen(js_name = Compare)]
    #[derive(Debug, Clone)]
    pub type MaplibreCompare;

    #[wasm_bindgen(constructor, js_class = "Compare", catch)]
    fn construct(
        before: &MaplibreMap,
        after: &MaplibreMap,
        container: &str,
        options: &JsValue,
    ) -> Result<MaplibreCompare, JsValue>;
}

/// Converts the value into a plain JS object, the way the renderer expects its option objects.
pub(crate) fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, serde_wasm_bindgen::Error> {
    value.serialize(&serde_wasm_bindgen::Serializer::json_compatible())
}

impl MaplibreMap {
    /// Creates a map from constructor options.
    pub fn new<T: Serialize + ?Sized>(options: &T) -> Result<Self, JsValue> {
        Self::construct(&to_js(options)?)
    }

    /// Registers an event listener.
    pub fn on(&self, event: &str, listener: &Function) {
        self.js_on(event, listener);
    }
}

impl MapEngine for MaplibreMap {
    fn add_source(&mut self, id: &str, source: &VectorSource) -> Result<(), VotemapError> {
        let source = to_js(source).map_err(|err| VotemapError::Engine(err.to_string()))?;
        self.js_add_source(id, &source)
            .map_err(|err| VotemapError::Engine(describe(&err)))
    }

    fn add_layer(&mut self, layer: &CircleLayer) -> Result<(), VotemapError> {
        let layer = to_js(layer).map_err(|err| VotemapError::Engine(err.to_string()))?;
        self.js_add_layer(&layer)
            .map_err(|err| VotemapError::Engine(describe(&err)))
    }
}

impl MaplibreCompare {
    /// Attaches the swipe control to the two maps inside the container.
    pub fn new<T: Serialize + ?Sized>(
        before: &MaplibreMap,
        after: &MaplibreMap,
        container: &str,
        options: &T,
    ) -> Result<Self, JsValue> {
        Self::construct(before, after, container, &to_js(options)?)
    }
}
