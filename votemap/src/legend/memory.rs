use std::fmt::Write;

use crate::color::Color;
use crate::config::Year;
use crate::error::VotemapError;
use crate::legend::{class_name, LegendSurface};

/// Element of an in-memory document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    /// Tag name.
    pub tag: String,
    /// `class` attribute.
    pub class: Option<String>,
    /// Inline style properties in insertion order.
    pub style: Vec<(String, String)>,
    /// Other attributes.
    pub attributes: Vec<(String, String)>,
    /// Text content.
    pub text: Option<String>,
    /// Child elements.
    pub children: Vec<Element>,
}

impl Element {
    /// Creates an empty element.
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Default::default()
        }
    }

    fn with_style(mut self, name: &str, value: &str) -> Self {
        self.set_style(name, value);
        self
    }

    fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    /// Sets an inline style property.
    pub fn set_style(&mut self, name: &str, value: &str) {
        match self.style.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.style.push((name.to_string(), value.to_string())),
        }
    }

    /// Inline style property.
    pub fn style(&self, name: &str) -> Option<&str> {
        self.style
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns true if the `class` attribute contains the class.
    pub fn has_class(&self, class: &str) -> bool {
        self.class
            .as_deref()
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Legend rows of a legend container: swatch color and label.
    pub fn rows(&self) -> impl Iterator<Item = (Option<&str>, &str)> {
        self.children
            .iter()
            .filter(|child| child.tag == "div")
            .filter_map(|row| {
                let swatch = row.children.iter().find(|c| c.tag == "div")?;
                let label = row.children.iter().find(|c| c.tag == "span")?;
                Some((
                    swatch.style("background-color"),
                    label.text.as_deref().unwrap_or_default(),
                ))
            })
    }

    fn write_html(&self, out: &mut String) {
        let _ = write!(out, "<{}", self.tag);
        if let Some(class) = &self.class {
            let _ = write!(out, " class=\"{}\"", escape(class));
        }
        for (name, value) in &self.attributes {
            let _ = write!(out, " {name}=\"{}\"", escape(value));
        }
        if !self.style.is_empty() {
            let style = self
                .style
                .iter()
                .map(|(name, value)| format!("{name}: {value};"))
                .collect::<Vec<_>>()
                .join(" ");
            let _ = write!(out, " style=\"{}\"", escape(&style));
        }
        out.push('>');

        if let Some(text) = &self.text {
            out.push_str(&escape(text));
        }
        for child in &self.children {
            child.write_html(out);
        }

        let _ = write!(out, "</{}>", self.tag);
    }
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Legend surface that builds an in-memory element tree under a `body` mount element.
///
/// Containers are identified by their position among the children of the mount.
#[derive(Debug, Clone)]
pub struct MemorySurface {
    mount: Element,
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self {
            mount: Element::new("body"),
        }
    }
}

impl MemorySurface {
    /// Creates a surface with an empty mount.
    pub fn new() -> Self {
        Self::default()
    }

    /// The mount element.
    pub fn mount(&self) -> &Element {
        &self.mount
    }

    /// All legend containers of the year.
    pub fn legends_of(&self, year: Year) -> impl Iterator<Item = &Element> {
        let class = format!("map-legend-{year}");
        self.mount
            .children
            .iter()
            .filter(move |child| child.has_class(&class))
    }

    /// Legend container of the year.
    pub fn legend(&self, year: Year) -> Option<&Element> {
        self.legends_of(year).next()
    }

    /// Renders the children of the mount element as HTML.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for child in &self.mount.children {
            child.write_html(&mut out);
            out.push('\n');
        }
        out
    }

    fn container_mut(&mut self, container: &usize) -> Result<&mut Element, VotemapError> {
        self.mount
            .children
            .get_mut(*container)
            .ok_or_else(|| VotemapError::InvalidConfig(format!("no legend container #{container}")))
    }
}

impl LegendSurface for MemorySurface {
    type Container = usize;

    fn create_container(&mut self, class_name: &str, label: &str) -> Result<usize, VotemapError> {
        let mut element = Element::new("div");
        element.class = Some(class_name.to_string());
        element
            .attributes
            .push(("aria-label".to_string(), label.to_string()));

        self.mount.children.push(element);
        Ok(self.mount.children.len() - 1)
    }

    fn set_offsets(&mut self, container: &usize, left: &str, right: &str) -> Result<(), VotemapError> {
        let element = self.container_mut(container)?;
        element.set_style("left", left);
        element.set_style("right", right);
        Ok(())
    }

    fn clear(&mut self, container: &usize) -> Result<(), VotemapError> {
        self.container_mut(container)?.children.clear();
        Ok(())
    }

    fn append_heading(&mut self, container: &usize, text: &str) -> Result<(), VotemapError> {
        let heading = Element::new("h4")
            .with_style("margin", "0 0 10px 0")
            .with_style("padding", "0")
            .with_text(text);
        self.container_mut(container)?.children.push(heading);
        Ok(())
    }

    fn append_row(&mut self, container: &usize, color: Color, label: &str) -> Result<(), VotemapError> {
        let mut row = Element::new("div")
            .with_style("display", "flex")
            .with_style("align-items", "center")
            .with_style("margin-bottom", "5px");
        row.children.push(
            Element::new("div")
                .with_style("width", "20px")
                .with_style("height", "20px")
                .with_style("background-color", &color.to_hex())
                .with_style("margin-right", "5px"),
        );
        row.children.push(Element::new("span").with_text(label));

        self.container_mut(container)?.children.push(row);
        Ok(())
    }
}
