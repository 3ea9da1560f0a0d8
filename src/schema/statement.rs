use serde::{Deserialize, Serialize};

/// Writer-facing key for a background change.
pub const KEY_BACKGROUND: &str = "背景";
/// Writer-facing key for a narration line.
pub const KEY_NARRATION: &str = "旁白";
/// Writer-facing key for the speaking character.
pub const KEY_CHARACTER: &str = "角色";
/// Writer-facing key for the emotion tag of a dialogue line.
pub const KEY_EMOTION: &str = "动作";
/// Writer-facing key for the spoken text of a dialogue line.
pub const KEY_DIALOGUE: &str = "对话";

/// The three statement shapes, in dispatch precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Background,
    Narration,
    Dialogue,
}

impl StatementKind {
    /// All shapes, first match wins.
    pub const ALL: [StatementKind; 3] = [
        StatementKind::Background,
        StatementKind::Narration,
        StatementKind::Dialogue,
    ];

    /// The attribute set that must be present for a statement to take this shape.
    pub fn required_keys(&self) -> &'static [&'static str] {
        match self {
            Self::Background => &[KEY_BACKGROUND],
            Self::Narration => &[KEY_NARRATION],
            Self::Dialogue => &[KEY_CHARACTER, KEY_EMOTION, KEY_DIALOGUE],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Background => "background",
            Self::Narration => "narration",
            Self::Dialogue => "dialogue",
        }
    }
}

/// A spoken line: who says it, with which emotion, and what.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueLine {
    #[serde(rename = "角色")]
    pub character: String,
    #[serde(rename = "动作")]
    pub emotion: String,
    #[serde(rename = "对话")]
    pub text: String,
}

/// One semantic unit of a scene script.
///
/// Serializes back to the writer-facing shape (`{"背景": ...}` and so on),
/// which is what diagnostics render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SceneStatement {
    Background {
        #[serde(rename = "背景")]
        background: String,
    },
    Narration {
        #[serde(rename = "旁白")]
        narration: String,
    },
    Dialogue(DialogueLine),
}

impl SceneStatement {
    pub fn kind(&self) -> StatementKind {
        match self {
            Self::Background { .. } => StatementKind::Background,
            Self::Narration { .. } => StatementKind::Narration,
            Self::Dialogue(_) => StatementKind::Dialogue,
        }
    }
}

/// An ordered scene script. Order is display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneScript {
    pub statements: Vec<SceneStatement>,
}

impl SceneScript {
    pub fn new(statements: Vec<SceneStatement>) -> Self {
        Self { statements }
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SceneStatement> {
        self.statements.iter()
    }
}

impl<'a> IntoIterator for &'a SceneScript {
    type Item = &'a SceneStatement;
    type IntoIter = std::slice::Iter<'a, SceneStatement>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        let bg = SceneStatement::Background {
            background: "forest.png".to_string(),
        };
        assert_eq!(bg.kind(), StatementKind::Background);

        let line = SceneStatement::Dialogue(DialogueLine {
            character: "爱音".to_string(),
            emotion: "微笑".to_string(),
            text: "早上好。".to_string(),
        });
        assert_eq!(line.kind(), StatementKind::Dialogue);
    }

    #[test]
    fn dialogue_requires_all_three_keys() {
        let keys = StatementKind::Dialogue.required_keys();
        assert_eq!(keys, &["角色", "动作", "对话"]);
    }

    #[test]
    fn serializes_to_writer_keys() {
        let stmt = SceneStatement::Narration {
            narration: "It was quiet.".to_string(),
        };
        let json = serde_json::to_string(&stmt).unwrap();
        assert_eq!(json, r#"{"旁白":"It was quiet."}"#);
    }
}
