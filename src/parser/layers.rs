//! Layer stacks for parsed records.

use semantic_config::{ConfigError, ConfigFragment, ConfigOrigin};
use serde_json::{Map, Value};

use super::document::InlineConfig;

impl InlineConfig {
    /// Fragments written on a block: shortcut properties, then `config:`.
    pub fn fragments(&self, origin: ConfigOrigin) -> Result<Vec<ConfigFragment>, ConfigError> {
        let mut shortcuts = Map::new();
        if let Some(group) = &self.group {
            shortcuts.insert("group".to_string(), group.clone());
        }
        if let Some(meta) = &self.meta {
            shortcuts.insert("meta".to_string(), meta.clone());
        }

        let mut fragments = Vec::new();
        let shortcut = ConfigFragment::from_value(origin, &Value::Object(shortcuts))?;
        if !shortcut.is_empty() {
            fragments.push(shortcut);
        }
        if let Some(config) = &self.config {
            let block = ConfigFragment::from_value(origin, config)?;
            if !block.is_empty() {
                fragments.push(block);
            }
        }
        Ok(fragments)
    }
}

/// Full stack for a top-level record: project layers, then inline layers.
pub fn record_layers(
    project: Vec<ConfigFragment>,
    inline: &InlineConfig,
) -> Result<Vec<ConfigFragment>, ConfigError> {
    let mut layers = project;
    layers.extend(inline.fragments(ConfigOrigin::Inline)?);
    Ok(layers)
}
