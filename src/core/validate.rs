/// Schema validation of untyped scene-script documents.

use rustc_hash::FxHashSet;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::Settings;
use crate::schema::statement::{
    DialogueLine, SceneScript, SceneStatement, StatementKind, KEY_BACKGROUND, KEY_CHARACTER,
    KEY_DIALOGUE, KEY_EMOTION, KEY_NARRATION,
};

/// Why a single statement was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatementError {
    #[error("statement is not an object")]
    NotAnObject,
    #[error("unrecognized statement with keys {keys:?}")]
    UnknownShape { keys: Vec<String> },
    #[error("incomplete {kind} statement: missing {fields:?}")]
    MissingFields {
        kind: &'static str,
        fields: Vec<&'static str>,
    },
    #[error("field '{field}' must be text or a number")]
    Mistyped { field: &'static str },
    #[error("unknown emotion tag '{tag}'")]
    UnknownEmotion { tag: String },
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("script must be a sequence of statements")]
    NotASequence,
    #[error("statement {index}: {source}")]
    Statement {
        index: usize,
        #[source]
        source: StatementError,
    },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Accepts or rejects scene-script documents.
///
/// Lenient schemas accept any text as an emotion tag; strict schemas only
/// accept tags from a closed vocabulary.
#[derive(Debug, Clone, Default)]
pub struct ScriptSchema {
    vocabulary: Option<FxHashSet<String>>,
}

impl ScriptSchema {
    pub fn lenient() -> Self {
        Self { vocabulary: None }
    }

    pub fn strict<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            vocabulary: Some(tags.into_iter().map(Into::into).collect()),
        }
    }

    /// Strict over the action table's tags when `strict_vocabulary` is set.
    pub fn from_settings(settings: &Settings) -> Self {
        if settings.generation.strict_vocabulary {
            Self::strict(settings.actions.tags())
        } else {
            Self::lenient()
        }
    }

    pub fn is_strict(&self) -> bool {
        self.vocabulary.is_some()
    }

    /// Validate a whole document. The first bad statement fails it.
    pub fn validate(&self, document: &Value) -> Result<SceneScript, ValidationError> {
        let items = document.as_array().ok_or(ValidationError::NotASequence)?;
        let statements = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                self.validate_statement(item)
                    .map_err(|source| ValidationError::Statement { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SceneScript::new(statements))
    }

    pub fn validate_statement(&self, value: &Value) -> Result<SceneStatement, StatementError> {
        let statement = classify(value)?;
        if let (Some(vocabulary), SceneStatement::Dialogue(line)) = (&self.vocabulary, &statement) {
            if !vocabulary.contains(&line.emotion) {
                return Err(StatementError::UnknownEmotion {
                    tag: line.emotion.clone(),
                });
            }
        }
        Ok(statement)
    }

    pub fn parse_json(&self, input: &str) -> Result<SceneScript, ValidationError> {
        let document: Value = serde_json::from_str(input)?;
        self.validate(&document)
    }

    pub fn parse_yaml(&self, input: &str) -> Result<SceneScript, ValidationError> {
        let document: Value = serde_yaml::from_str(input)?;
        self.validate(&document)
    }
}

/// Determine a statement's shape from the attributes it carries.
///
/// Shapes are tried in precedence order; the first whose keys are all present
/// and coerce to text wins. Extra keys are ignored.
pub fn classify(value: &Value) -> Result<SceneStatement, StatementError> {
    let object = value.as_object().ok_or(StatementError::NotAnObject)?;

    let mut first_error = None;
    for kind in StatementKind::ALL {
        if !kind.required_keys().iter().all(|k| object.contains_key(*k)) {
            continue;
        }
        match build(kind, object) {
            Ok(statement) => return Ok(statement),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    if let Some(e) = first_error {
        return Err(e);
    }

    Err(missing_fields(object))
}

fn build(kind: StatementKind, object: &Map<String, Value>) -> Result<SceneStatement, StatementError> {
    Ok(match kind {
        StatementKind::Background => SceneStatement::Background {
            background: text_field(object, KEY_BACKGROUND)?,
        },
        StatementKind::Narration => SceneStatement::Narration {
            narration: text_field(object, KEY_NARRATION)?,
        },
        StatementKind::Dialogue => SceneStatement::Dialogue(DialogueLine {
            character: text_field(object, KEY_CHARACTER)?,
            emotion: text_field(object, KEY_EMOTION)?,
            text: text_field(object, KEY_DIALOGUE)?,
        }),
    })
}

/// Text fields accept strings and numbers; numbers are coerced to text.
fn text_field(object: &Map<String, Value>, key: &'static str) -> Result<String, StatementError> {
    match object.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(number_to_text(n)),
        _ => Err(StatementError::Mistyped { field: key }),
    }
}

fn number_to_text(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        n.as_f64().map(float_to_text).unwrap_or_else(|| n.to_string())
    }
}

/// Shortest round-trip digits; exponent form outside `[1e-7, 1e21)`, as a
/// JavaScript editor would print the same number.
fn float_to_text(f: f64) -> String {
    let magnitude = f.abs();
    if f == 0.0 {
        return "0".to_string();
    }
    if magnitude >= 1e21 || magnitude < 1e-6 {
        let text = format!("{f:e}");
        return match text.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{mantissa}e+{exponent}")
            }
            _ => text,
        };
    }
    f.to_string()
}

/// Report the missing fields of the shape the statement comes closest to.
fn missing_fields(object: &Map<String, Value>) -> StatementError {
    let mut closest: Option<(StatementKind, usize)> = None;
    for kind in StatementKind::ALL {
        let present = kind
            .required_keys()
            .iter()
            .filter(|k| object.contains_key(**k))
            .count();
        if present > 0 && closest.map_or(true, |(_, best)| present > best) {
            closest = Some((kind, present));
        }
    }

    match closest {
        Some((kind, _)) => StatementError::MissingFields {
            kind: kind.name(),
            fields: kind
                .required_keys()
                .iter()
                .copied()
                .filter(|k| !object.contains_key(*k))
                .collect(),
        },
        None => StatementError::UnknownShape {
            keys: object.keys().cloned().collect(),
        },
    }
}
