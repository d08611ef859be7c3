//! See [`ColorScale`].

use crate::color::Color;
use crate::config::MapConfig;
use crate::error::VotemapError;

/// Maps categories to colors.
///
/// The category list is fixed by the config and never discovered from data.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    categories: Vec<(String, Color)>,
    fallback: Option<Color>,
}

impl ColorScale {
    /// Creates a color scale from the hex color associations of the config.
    pub fn new(config: &MapConfig) -> Self {
        let categories = config
            .categories()
            .into_iter()
            .filter_map(|category| {
                let color = *config.color_associations_hex.get(&category)?;
                Some((category, color))
            })
            .collect();

        Self {
            categories,
            fallback: config.fallback_color(),
        }
    }

    /// Categories in config order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|(category, _)| category.as_str())
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Returns true if there are no categories.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Color of the category, or the fallback color. Returns `None` for an unknown category if no fallback is set.
    pub fn color(&self, category: &str) -> Option<Color> {
        self.categories
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, color)| *color)
            .or(self.fallback)
    }

    /// Same as [`ColorScale::color`], but fails if no color can be resolved.
    pub fn color_or_fallback(&self, category: &str) -> Result<Color, VotemapError> {
        self.color(category)
            .ok_or_else(|| VotemapError::MissingFallbackColor(category.to_string()))
    }

    /// Color of the first category. Used for features whose category matches nothing.
    pub fn default_color(&self) -> Result<Color, VotemapError> {
        self.categories
            .first()
            .map(|(_, color)| *color)
            .ok_or_else(|| VotemapError::InvalidConfig("no categories to pick a default color".into()))
    }

    /// `(category, color)` pairs in config order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Color)> {
        self.categories
            .iter()
            .map(|(category, color)| (category.as_str(), *color))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn sample_config_colors() {
        let scale = ColorScale::new(&MapConfig::default());
        assert_eq!(scale.color("Biden").unwrap().to_hex(), "#0000FF");
        assert_eq!(scale.color("Clinton").unwrap().to_hex(), "#0000FF");
        assert_eq!(scale.color("Trump").unwrap().to_hex(), "#FF0000");
        assert_eq!(scale.color("Other").unwrap().to_hex(), "#FFFF00");
        assert_eq!(scale.color("Independent"), None);
        assert_eq!(scale.default_color().unwrap(), Color::BLUE);
    }

    #[test]
    fn unknown_category_without_fallback_fails_fast() {
        let scale = ColorScale::new(&MapConfig::default());
        assert_matches!(
            scale.color_or_fallback("Independent"),
            Err(VotemapError::MissingFallbackColor(category)) if category == "Independent"
        );
    }

    #[test]
    fn unknown_category_uses_fallback() {
        let config = MapConfig {
            fallback_color: Some(Color::GRAY),
            ..Default::default()
        };
        let scale = ColorScale::new(&config);
        assert_eq!(scale.color_or_fallback("Independent").unwrap(), Color::GRAY);
        assert_eq!(scale.color_or_fallback("Trump").unwrap(), Color::RED);
    }

    #[test]
    fn case_sensitive_lookup() {
        let scale = ColorScale::new(&MapConfig::default());
        assert_eq!(scale.color("trump"), None);
    }
}
