//! Browser binding of votemap.
//!
//! The page is expected to load MapLibre GL JS and its compare plugin (the `maplibregl` global) and to contain the
//! `before` and `after` map containers inside the comparison container. [`main`] creates both maps, attaches the
//! swipe control and adds the dots and the legends when the maps are loaded.

#![warn(clippy::unwrap_used)]
#![warn(missing_docs)]

use std::cell::RefCell;
use std::rc::Rc;

use votemap::{ComparisonConfig, MapPage, MapSide};
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

mod dom;
mod error;
mod maplibre;

pub use dom::DomSurface;
pub use error::VotemapWebError;
pub use maplibre::{MaplibreCompare, MaplibreMap};

type SharedPage = Rc<RefCell<MapPage<HtmlElement>>>;

/// Shows the built-in comparison of the 2016 and 2020 elections.
#[wasm_bindgen]
pub fn main() -> Result<(), JsValue> {
    init(ComparisonConfig::default())
}

/// Shows the comparison described by the given config object.
#[wasm_bindgen(js_name = mainWithConfig)]
pub fn main_with_config(config: JsValue) -> Result<(), JsValue> {
    let config: ComparisonConfig =
        serde_wasm_bindgen::from_value(config).map_err(VotemapWebError::from)?;
    init(config)
}

fn init(config: ComparisonConfig) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    // Fails only if a logger is already set, e.g. when the page is initialized twice.
    let _ = console_log::init_with_level(log::Level::Info);

    let page = MapPage::new(config).map_err(VotemapWebError::from)?;
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or(VotemapWebError::NoDocument)?;

    if document.ready_state() == "loading" {
        let page = RefCell::new(Some(page));
        let on_content_loaded = Closure::<dyn FnMut()>::new(move || {
            if let Some(page) = page.borrow_mut().take() {
                if let Err(err) = show(page) {
                    log::error!("Failed to set up the maps: {err}");
                }
            }
        });
        document.add_event_listener_with_callback(
            "DOMContentLoaded",
            on_content_loaded.as_ref().unchecked_ref(),
        )?;
        on_content_loaded.forget();

        Ok(())
    } else {
        Ok(show(page)?)
    }
}

fn show(page: MapPage<HtmlElement>) -> Result<(), VotemapWebError> {
    let surface = Rc::new(RefCell::new(DomSurface::new()?));

    let before = MaplibreMap::new(&page.map_spec(MapSide::Before))?;
    let after = MaplibreMap::new(&page.map_spec(MapSide::After))?;
    // The control lives as long as the page, its handle is not needed.
    let _compare = MaplibreCompare::new(
        &before,
        &after,
        page.comparison_container(),
        &page.compare_options(),
    )?;
    log::info!(
        "Comparing {} with {}",
        page.profile(MapSide::Before).year,
        page.profile(MapSide::After).year
    );

    let page: SharedPage = Rc::new(RefCell::new(page));
    on_load(&before, MapSide::Before, page.clone(), surface.clone());
    on_load(&after, MapSide::After, page, surface);

    Ok(())
}

fn on_load(map: &MaplibreMap, side: MapSide, page: SharedPage, surface: Rc<RefCell<DomSurface>>) {
    let mut engine = map.clone();
    let listener = Closure::<dyn FnMut()>::new(move || {
        let result = page
            .borrow_mut()
            .on_ready(side, &mut engine, &mut *surface.borrow_mut());
        if let Err(err) = result {
            log::error!("Failed to add dots to the {side:?} map: {err}");
        }
    });

    map.on("load", listener.as_ref().unchecked_ref());
    listener.forget();
}
