//! Legends of the dot-density maps.
//!
//! A legend is built through a [`LegendSurface`], which abstracts the document the legend is inserted into. The
//! containers of already built legends are kept in a [`LegendRegistry`] owned by the page, so rebuilding a legend
//! reuses its container instead of searching the document for it.

use std::collections::HashMap;

use crate::color::Color;
use crate::config::{LegendPosition, Year, YearProfile};
use crate::error::VotemapError;
use crate::palette::ColorScale;

mod memory;

pub use memory::{Element, MemorySurface};

/// Document the legends are inserted into.
///
/// Containers are appended directly to the mount element of the surface.
pub trait LegendSurface {
    /// Handle of a legend container.
    type Container: Clone;

    /// Appends a new empty container with the given class name and accessible label to the mount element.
    fn create_container(
        &mut self,
        class_name: &str,
        label: &str,
    ) -> Result<Self::Container, VotemapError>;
    /// Sets inline `left` and `right` style of the container.
    fn set_offsets(
        &mut self,
        container: &Self::Container,
        left: &str,
        right: &str,
    ) -> Result<(), VotemapError>;
    /// Removes all children of the container.
    fn clear(&mut self, container: &Self::Container) -> Result<(), VotemapError>;
    /// Appends a heading.
    fn append_heading(&mut self, container: &Self::Container, text: &str) -> Result<(), VotemapError>;
    /// Appends a row with a color swatch and a label.
    fn append_row(
        &mut self,
        container: &Self::Container,
        color: Color,
        label: &str,
    ) -> Result<(), VotemapError>;
}

/// Legend containers by year.
#[derive(Debug, Clone)]
pub struct LegendRegistry<C> {
    containers: HashMap<Year, C>,
}

impl<C> Default for LegendRegistry<C> {
    fn default() -> Self {
        Self {
            containers: HashMap::new(),
        }
    }
}

impl<C: Clone> LegendRegistry<C> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Container of the year, if the legend was built.
    pub fn get(&self, year: Year) -> Option<&C> {
        self.containers.get(&year)
    }

    /// Number of registered containers.
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    /// Returns true if no legend was built yet.
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// Returns the empty container of the year. A container created earlier is cleared and reused.
    pub fn empty_container<S>(
        &mut self,
        surface: &mut S,
        year: Year,
        position: LegendPosition,
        label: &str,
    ) -> Result<C, VotemapError>
    where
        S: LegendSurface<Container = C>,
    {
        if let Some(container) = self.containers.get(&year) {
            surface.clear(container)?;
            return Ok(container.clone());
        }

        let container = surface.create_container(&class_name(year), label)?;
        let (left, right) = position.offsets();
        surface.set_offsets(&container, left, right)?;
        self.containers.insert(year, container.clone());

        Ok(container)
    }
}

/// Class names of the legend container of the year.
pub fn class_name(year: Year) -> String {
    format!("map-legend map-legend-{year}")
}

/// Rows of the legend of the year: categories in config order, without the excluded category.
pub fn legend_rows<'a>(
    scale: &'a ColorScale,
    profile: &'a YearProfile,
) -> impl Iterator<Item = (&'a str, Color)> + 'a {
    scale
        .iter()
        .filter(move |(category, _)| profile.shows(category))
}

/// Builds the legend of the year. Previous content of the legend of the same year is replaced.
pub fn add_dot_density_legend<S: LegendSurface>(
    surface: &mut S,
    legends: &mut LegendRegistry<S::Container>,
    scale: &ColorScale,
    label: &str,
    profile: &YearProfile,
) -> Result<(), VotemapError> {
    let container =
        legends.empty_container(surface, profile.year, profile.legend_position, label)?;

    surface.append_heading(&container, &profile.year.to_string())?;
    let mut count = 0;
    for (category, color) in legend_rows(scale, profile) {
        surface.append_row(&container, color, category)?;
        count += 1;
    }

    log::debug!("Built legend of {} with {count} rows", profile.year);
    Ok(())
}
