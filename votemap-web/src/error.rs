//! Error type of the browser binding.

use thiserror::Error;
use votemap::VotemapError;
use wasm_bindgen::{JsCast, JsValue};

/// Errors of setting up the page in the browser.
#[derive(Debug, Error)]
pub enum VotemapWebError {
    /// Error of the map configuration or while building layers and legends.
    #[error(transparent)]
    Votemap(#[from] VotemapError),
    /// A JavaScript call threw.
    #[error("javascript error: {0}")]
    Js(String),
    /// Value could not be passed to or from JavaScript.
    #[error("conversion error: {0}")]
    Conversion(#[from] serde_wasm_bindgen::Error),
    /// The page has no document or no body to attach legends to.
    #[error("document is not available")]
    NoDocument,
}

impl From<JsValue> for VotemapWebError {
    fn from(value: JsValue) -> Self {
        Self::Js(describe(&value))
    }
}

impl From<VotemapWebError> for JsValue {
    fn from(value: VotemapWebError) -> Self {
        js_sys::Error::new(&value.to_string()).into()
    }
}

/// Human readable text of a thrown JavaScript value.
pub(crate) fn describe(value: &JsValue) -> String {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }

    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_keep_their_message() {
        let err = VotemapWebError::from(VotemapError::UnknownYear("2012".into()));
        assert_eq!(err.to_string(), "no profile configured for year 2012");
    }
}
