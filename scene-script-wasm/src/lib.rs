//! WASM bindings for scene-script — powers the browser editor.

use wasm_bindgen::prelude::*;

use scene_script::config::{LineEnding, Settings};
use scene_script::core::generator::ScriptGenerator;
use scene_script::schema::figure::CharacterKnowledgeBase;

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Serialize)]
struct ValidationReport {
    valid: bool,
    statements: usize,
    error: Option<String>,
}

#[derive(serde::Serialize)]
struct AliasInfo<'a> {
    key: &'a str,
    aliases: &'a [String],
}

// ---------------------------------------------------------------------------
// SceneEditor — the main exported struct
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct SceneEditor {
    generator: ScriptGenerator,
    figures: Option<CharacterKnowledgeBase>,
}

#[wasm_bindgen]
impl SceneEditor {
    /// Create an editor from RON settings (empty string for the stock ones).
    #[wasm_bindgen(constructor)]
    pub fn new(settings_ron: &str, seed: Option<u64>) -> Result<SceneEditor, JsError> {
        let settings = if settings_ron.trim().is_empty() {
            Settings::default()
        } else {
            Settings::parse_ron(settings_ron)
                .map_err(|e| JsError::new(&format!("Settings parse error: {e}")))?
        };

        let mut builder = ScriptGenerator::builder()
            .with_settings(settings)
            .line_ending(LineEnding::Lf);
        if let Some(seed) = seed {
            builder = builder.seed(seed);
        }
        let generator = builder
            .build()
            .map_err(|e| JsError::new(&format!("Generator build error: {e}")))?;

        Ok(SceneEditor {
            generator,
            figures: None,
        })
    }

    /// Replace the character knowledge base with the figure analyzer's JSON.
    /// An empty object clears it.
    pub fn set_figures(&mut self, figures_json: &str) -> Result<(), JsError> {
        let figures = CharacterKnowledgeBase::from_json_str(figures_json)
            .map_err(|e| JsError::new(&format!("Invalid figures JSON: {e}")))?;
        self.figures = figures.non_empty();
        Ok(())
    }

    pub fn clear_figures(&mut self) {
        self.figures = None;
    }

    /// Validate and generate. Fails on the first bad statement.
    pub fn generate(&self, script_json: &str) -> Result<String, JsError> {
        self.generator
            .generate_json(script_json, self.figures.as_ref())
            .map_err(|e| JsError::new(&format!("Generation error: {e}")))
    }

    /// Generate, skipping statements that match no known shape.
    pub fn generate_lenient(&self, script_json: &str) -> Result<String, JsError> {
        let document: serde_json::Value = serde_json::from_str(script_json)
            .map_err(|e| JsError::new(&format!("Invalid script JSON: {e}")))?;
        self.generator
            .generate_document(&document, self.figures.as_ref())
            .map_err(|e| JsError::new(&format!("Generation error: {e}")))
    }

    /// Validate without generating. Returns a JSON report.
    pub fn validate(&self, script_json: &str) -> String {
        let report = match self.generator.schema().parse_json(script_json) {
            Ok(script) => ValidationReport {
                valid: true,
                statements: script.len(),
                error: None,
            },
            Err(e) => ValidationReport {
                valid: false,
                statements: 0,
                error: Some(e.to_string()),
            },
        };
        serde_json::to_string(&report).unwrap_or_else(|_| "{}".to_string())
    }

    /// The emotion tags of the action table, as a JSON array.
    pub fn emotion_tags(&self) -> String {
        let tags: Vec<&str> = self.generator.settings().actions.tags().collect();
        serde_json::to_string(&tags).unwrap_or_else(|_| "[]".to_string())
    }

    /// The alias table as a JSON array of `{key, aliases}`.
    pub fn aliases(&self) -> String {
        let entries: Vec<AliasInfo<'_>> = self
            .generator
            .settings()
            .aliases
            .entries
            .iter()
            .map(|(key, aliases)| AliasInfo { key, aliases })
            .collect();
        serde_json::to_string(&entries).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn is_strict(&self) -> bool {
        self.generator.schema().is_strict()
    }
}
