use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Newtype wrapper for figure identities (the figure directory name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FigureId(pub String);

impl FigureId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FigureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named visual variant of a figure with its own motion and expression
/// vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Costume {
    pub name: String,
    /// Model file reference, relative to the game's figure directory.
    pub path: String,
    #[serde(default)]
    pub motions: Vec<String>,
    #[serde(default)]
    pub expressions: Vec<String>,
}

impl Costume {
    /// Costumes whose name contains this marker are picked by default.
    pub const PREFERRED_MARKER: &'static str = "casual";

    pub fn is_preferred(&self) -> bool {
        self.name.contains(Self::PREFERRED_MARKER)
    }
}

/// One character's visual representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FigureEntry {
    pub name: String,
    /// Figure directory relative to the figure root.
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub costumes: Vec<Costume>,
}

impl FigureEntry {
    pub fn costume(&self, name: &str) -> Option<&Costume> {
        self.costumes.iter().find(|c| c.name == name)
    }
}

/// Everything known about a game's figures, keyed by identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterKnowledgeBase {
    pub figures: FxHashMap<FigureId, FigureEntry>,
}

impl CharacterKnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: FigureId, entry: FigureEntry) {
        self.figures.insert(id, entry);
    }

    pub fn get(&self, id: &FigureId) -> Option<&FigureEntry> {
        self.figures.get(id)
    }

    pub fn contains(&self, id: &FigureId) -> bool {
        self.figures.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.figures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.figures.is_empty()
    }

    /// Parse the figure analyzer's JSON output.
    pub fn from_json_str(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    /// Normalize an empty scan to "no knowledge base".
    pub fn non_empty(self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}
