use votemap::error::VotemapError;
use votemap::{Color, LegendSurface};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, HtmlElement};

use crate::error::{describe, VotemapWebError};

fn dom_error(err: JsValue) -> VotemapError {
    VotemapError::Document(describe(&err))
}

/// Legend surface on the page document. Legends are appended to the document body.
#[derive(Debug, Clone)]
pub struct DomSurface {
    document: Document,
    mount: HtmlElement,
}

impl DomSurface {
    /// Surface on the body of the current document.
    pub fn new() -> Result<Self, VotemapWebError> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or(VotemapWebError::NoDocument)?;
        let mount = document.body().ok_or(VotemapWebError::NoDocument)?;

        Ok(Self { document, mount })
    }

    fn element(&self, tag: &str, styles: &[(&str, &str)]) -> Result<HtmlElement, VotemapError> {
        let element: HtmlElement = self
            .document
            .create_element(tag)
            .map_err(dom_error)?
            .dyn_into()
            .map_err(|_| VotemapError::Document(format!("<{tag}> is not an html element")))?;

        let style = element.style();
        for (name, value) in styles {
            style.set_property(name, value).map_err(dom_error)?;
        }

        Ok(element)
    }
}

impl LegendSurface for DomSurface {
    type Container = HtmlElement;

    fn create_container(
        &mut self,
        class_name: &str,
        label: &str,
    ) -> Result<HtmlElement, VotemapError> {
        let container = self.element("div", &[])?;
        container.set_class_name(class_name);
        container
            .set_attribute("aria-label", label)
            .map_err(dom_error)?;
        self.mount.append_child(&container).map_err(dom_error)?;

        Ok(container)
    }

    fn set_offsets(
        &mut self,
        container: &HtmlElement,
        left: &str,
        right: &str,
    ) -> Result<(), VotemapError> {
        let style = container.style();
        style.set_property("left", left).map_err(dom_error)?;
        style.set_property("right", right).map_err(dom_error)
    }

    fn clear(&mut self, container: &HtmlElement) -> Result<(), VotemapError> {
        container.set_inner_html("");
        Ok(())
    }

    fn append_heading(&mut self, container: &HtmlElement, text: &str) -> Result<(), VotemapError> {
        let heading = self.element("h4", &[("margin", "0 0 10px 0"), ("padding", "0")])?;
        heading.set_text_content(Some(text));
        container.append_child(&heading).map_err(dom_error)?;
        Ok(())
    }

    fn append_row(
        &mut self,
        container: &HtmlElement,
        color: Color,
        label: &str,
    ) -> Result<(), VotemapError> {
        let row = self.element(
            "div",
            &[
                ("display", "flex"),
                ("align-items", "center"),
                ("margin-bottom", "5px"),
            ],
        )?;
        let hex = color.to_hex();
        let swatch = self.element(
            "div",
            &[
                ("width", "20px"),
                ("height", "20px"),
                ("background-color", hex.as_str()),
                ("margin-right", "5px"),
            ],
        )?;
        let text = self.element("span", &[])?;
        text.set_text_content(Some(label));

        row.append_child(&swatch).map_err(dom_error)?;
        row.append_child(&text).map_err(dom_error)?;
        container.append_child(&row).map_err(dom_error)?;
        Ok(())
    }
}
