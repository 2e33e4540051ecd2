//! Engine Settings
//!
//! Host-supplied configuration. Every field has a default so a host can
//! pass a partial JSON document.

use serde::Deserialize;

use crate::properties::{state_index, STATES};
use crate::rank::MAX_MEDIA;

/// Named viewport breakpoint
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Breakpoint {
    pub name: String,
    /// Width in CSS pixels
    pub width: f32,
}

impl Breakpoint {
    pub fn new(name: &str, width: f32) -> Self {
        Self {
            name: name.to_string(),
            width,
        }
    }
}

/// One entry of the ordered media list
#[derive(Debug, Clone, PartialEq)]
pub struct Media {
    pub name: String,
    /// `@media` prelude, None for `all`
    pub query: Option<String>,
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub breakpoints: Vec<Breakpoint>,
    /// Reverse media order and use `max-width` queries
    pub desktop_first: bool,
    /// Enabled subset of the master state list (None = all)
    pub states: Option<Vec<String>>,
    /// Scaled unit for numeric spacing values
    pub unit: String,
    /// Attribute holding literal declarations
    pub style_attribute: String,
    /// Attribute holding mixin references
    pub apply_attribute: String,
    /// Attribute holding the active identifiers
    pub marker_attribute: String,
    pub cache_key: Option<String>,
    pub cache_version: String,
    /// Accept `x-<property>` attributes
    pub legacy_attributes: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            breakpoints: vec![
                Breakpoint::new("xs", 480.0),
                Breakpoint::new("sm", 640.0),
                Breakpoint::new("md", 768.0),
                Breakpoint::new("lg", 1024.0),
                Breakpoint::new("xl", 1280.0),
            ],
            desktop_first: false,
            states: None,
            unit: "var(--unit)".to_string(),
            style_attribute: "css".to_string(),
            apply_attribute: "apply".to_string(),
            marker_attribute: "atoms".to_string(),
            cache_key: None,
            cache_version: "1".to_string(),
            legacy_attributes: false,
        }
    }
}

impl Settings {
    /// Parse settings from JSON, filling gaps with defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Ordered media list: `all` followed by the breakpoints.
    ///
    /// Mobile-first sorts ascending with `min-width`; desktop-first sorts
    /// descending with `max-width` just below the breakpoint.
    pub fn media(&self) -> Vec<Media> {
        let mut breakpoints = self.breakpoints.clone();
        breakpoints.sort_by(|a, b| a.width.total_cmp(&b.width));
        if self.desktop_first {
            breakpoints.reverse();
        }
        if breakpoints.len() >= MAX_MEDIA {
            tracing::warn!(
                "{} breakpoints configured, keeping the first {}",
                breakpoints.len(),
                MAX_MEDIA - 1
            );
            breakpoints.truncate(MAX_MEDIA - 1);
        }

        let mut media = vec![Media {
            name: "all".to_string(),
            query: None,
        }];
        media.extend(breakpoints.into_iter().map(|bp| {
            let query = if self.desktop_first {
                format!("(max-width: {}px)", bp.width - 0.02)
            } else {
                format!("(min-width: {}px)", bp.width)
            };
            Media {
                name: bp.name,
                query: Some(query),
            }
        }));
        media
    }

    /// Whether a state name is enabled
    pub fn state_enabled(&self, name: &str) -> bool {
        if state_index(name).is_none() {
            return false;
        }
        match &self.states {
            Some(states) => name == STATES[0].0 || states.iter().any(|s| s == name),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_media_order() {
        let media = Settings::default().media();
        let names: Vec<_> = media.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["all", "xs", "sm", "md", "lg", "xl"]);
        assert_eq!(media[0].query, None);
        assert_eq!(media[3].query.as_deref(), Some("(min-width: 768px)"));
    }

    #[test]
    fn test_desktop_first_media() {
        let settings = Settings {
            desktop_first: true,
            ..Settings::default()
        };
        let media = settings.media();
        let names: Vec<_> = media.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["all", "xl", "lg", "md", "sm", "xs"]);
        assert_eq!(media[3].query.as_deref(), Some("(max-width: 767.98px)"));
    }

    #[test]
    fn test_from_partial_json() {
        let settings =
            Settings::from_json(r#"{"unit": "0.25rem", "cache_key": "atomic"}"#).unwrap();
        assert_eq!(settings.unit, "0.25rem");
        assert_eq!(settings.cache_key.as_deref(), Some("atomic"));
        assert_eq!(settings.style_attribute, "css");
        assert_eq!(settings.breakpoints.len(), 5);
    }

    #[test]
    fn test_custom_breakpoints_json() {
        let settings = Settings::from_json(
            r#"{"breakpoints": [{"name": "tb", "width": 900}, {"name": "ph", "width": 400}]}"#,
        )
        .unwrap();
        let names: Vec<_> = settings.media().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["all", "ph", "tb"]);
    }

    #[test]
    fn test_state_subset() {
        let settings = Settings {
            states: Some(vec!["hover".to_string()]),
            ..Settings::default()
        };
        assert!(settings.state_enabled("hover"));
        assert!(settings.state_enabled("normal"));
        assert!(!settings.state_enabled("focus"));
        assert!(!settings.state_enabled("bogus"));
        assert!(Settings::default().state_enabled("focus"));
    }
}
