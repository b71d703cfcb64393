//! Recipe files.
//!
//! A recipe is a named stage list. Files are JSON or TOML, picked by
//! extension:
//!
//! ```toml
//! name = "V60 single cup"
//!
//! [[stages]]
//! cumulativeTime = 45
//! pourDuration = 10
//! cumulativeWater = "50g"
//! label = "Bloom"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::stage::Stage;
use crate::timeline::Timeline;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub stages: Vec<Stage>,
}

impl Recipe {
    /// Load a recipe, treating `.toml` as TOML and anything else as JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            Ok(toml::from_str(&content)?)
        } else {
            serde_json::from_str(&content).map_err(CoreError::from)
        }
    }

    pub fn timeline(&self) -> Timeline {
        Timeline::build(&self.stages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::PourKind;

    #[test]
    fn loads_toml_recipe() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("v60.toml");
        std::fs::write(
            &path,
            r#"
name = "V60"

[[stages]]
cumulativeTime = 30
pourDuration = 10
cumulativeWater = "50g"
label = "Bloom"

[[stages]]
cumulativeTime = 90
pourDuration = 20
cumulativeWater = "150g"
"#,
        )
        .unwrap();
        let recipe = Recipe::load(&path).unwrap();
        assert_eq!(recipe.name, "V60");
        assert_eq!(recipe.stages.len(), 2);
        assert_eq!(recipe.timeline().total_secs(), 90);
    }

    #[test]
    fn loads_json_recipe_with_untimed_stage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("americano.json");
        std::fs::write(
            &path,
            r#"{
                "name": "Americano",
                "stages": [
                    {"cumulativeTime": 28, "cumulativeWater": "36g", "label": "Shot"},
                    {"cumulativeTime": 0, "cumulativeWater": "120g", "pourKind": "untimed"}
                ]
            }"#,
        )
        .unwrap();
        let recipe = Recipe::load(&path).unwrap();
        assert_eq!(recipe.stages[1].pour_kind, PourKind::Untimed);
        assert_eq!(recipe.timeline().total_water(), 156.0);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Recipe::load(&dir.path().join("nope.json"));
        assert!(matches!(result, Err(CoreError::Io(_))));
    }
}
