/// Generation options and the settings bundle they are loaded with.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::schema::links::{ActionTable, AliasTable};

/// Keyword used when neither the action table nor the config names one.
pub const FALLBACK_ACTION: &str = "idle";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Options read for the duration of one generation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Reject emotion tags missing from the action table at validation time.
    pub strict_vocabulary: bool,
    /// Link each speaker line to its figure with `-id -figureId=...`.
    pub associate_figure_with_dialogue: bool,
    /// Drop one trailing `。` from dialogue text.
    pub strip_trailing_full_stop: bool,
    /// Action keyword used when an emotion tag has no override.
    pub default_action: String,
    /// Raw transform JSON passed to every figure change.
    pub default_transform: Option<String>,
}

impl GenerationConfig {
    /// The configured default action, or `idle` when unset.
    pub fn fallback_action(&self) -> &str {
        if self.default_action.is_empty() {
            FALLBACK_ACTION
        } else {
            &self.default_action
        }
    }

    /// The transform argument, `None` when unset or empty.
    pub fn transform(&self) -> Option<&str> {
        self.default_transform.as_deref().filter(|t| !t.is_empty())
    }
}

/// Line-ending convention of the output script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    /// The host platform's convention.
    pub fn native() -> Self {
        if cfg!(windows) {
            Self::CrLf
        } else {
            Self::Lf
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

impl Default for LineEnding {
    fn default() -> Self {
        Self::native()
    }
}

/// Everything a generation pass reads besides the script and the figures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub generation: GenerationConfig,
    pub aliases: AliasTable,
    pub actions: ActionTable,
}

impl Settings {
    /// Load settings from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<Settings, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse settings from a RON string. Missing sections keep their defaults.
    pub fn parse_ron(input: &str) -> Result<Settings, ConfigError> {
        Ok(ron::from_str(input)?)
    }
}
