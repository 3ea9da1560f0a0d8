/// The script generator: scene statements → WebGAL script text.
///
/// Wires together validation, per-statement strategies, and line assembly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

use crate::config::{ConfigError, GenerationConfig, LineEnding, Settings};
use crate::core::command::ScriptLine;
use crate::core::strategy::{render_statement, GenerationContext};
use crate::core::validate::{classify, ScriptSchema, ValidationError};
use crate::schema::figure::CharacterKnowledgeBase;
use crate::schema::links::{ActionTable, AliasTable};
use crate::schema::statement::{SceneScript, SceneStatement};

/// Terminates every statement, before the line ending.
pub const STATEMENT_DELIMITER: char = ';';

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Lines for a whole script, in statement order.
pub fn generate_lines<R: Rng + ?Sized>(
    script: &SceneScript,
    ctx: &GenerationContext<'_>,
    rng: &mut R,
) -> Vec<ScriptLine> {
    script
        .iter()
        .flat_map(|statement| render_statement(statement, ctx, rng))
        .collect()
}

/// Join lines, terminating each with `;` and the line ending.
pub fn assemble(lines: &[ScriptLine], line_ending: LineEnding) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(&line.to_string());
        out.push(STATEMENT_DELIMITER);
        out.push_str(line_ending.as_str());
    }
    out
}

/// Generate script text with explicit inputs and randomness source.
pub fn generate<R: Rng + ?Sized>(
    script: &SceneScript,
    knowledge: Option<&CharacterKnowledgeBase>,
    aliases: &AliasTable,
    actions: &ActionTable,
    config: &GenerationConfig,
    line_ending: LineEnding,
    rng: &mut R,
) -> String {
    let ctx = GenerationContext {
        knowledge,
        aliases,
        actions,
        config,
    };
    assemble(&generate_lines(script, &ctx, rng), line_ending)
}

/// A configured generator. Built via `ScriptGenerator::builder()`.
#[derive(Debug, Clone)]
pub struct ScriptGenerator {
    settings: Settings,
    line_ending: LineEnding,
    seed: Option<u64>,
}

/// Builder for constructing a `ScriptGenerator`.
pub struct ScriptGeneratorBuilder {
    settings_path: Option<String>,
    line_ending: LineEnding,
    seed: Option<u64>,
    /// Directly provided settings (for use without files).
    settings: Option<Settings>,
    config: Option<GenerationConfig>,
    aliases: Option<AliasTable>,
    actions: Option<ActionTable>,
}

impl ScriptGenerator {
    pub fn builder() -> ScriptGeneratorBuilder {
        ScriptGeneratorBuilder {
            settings_path: None,
            line_ending: LineEnding::native(),
            seed: None,
            settings: None,
            config: None,
            aliases: None,
            actions: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// The schema matching this generator's strictness and vocabulary.
    pub fn schema(&self) -> ScriptSchema {
        ScriptSchema::from_settings(&self.settings)
    }

    /// Generate text for a validated script.
    ///
    /// With a seed, identical inputs give identical output.
    pub fn generate(&self, script: &SceneScript, knowledge: Option<&CharacterKnowledgeBase>) -> String {
        let mut rng = self.rng();
        self.generate_with_rng(script, knowledge, &mut rng)
    }

    /// Generate text drawing tie-breaks from `rng`.
    pub fn generate_with_rng<R: Rng + ?Sized>(
        &self,
        script: &SceneScript,
        knowledge: Option<&CharacterKnowledgeBase>,
        rng: &mut R,
    ) -> String {
        generate(
            script,
            knowledge,
            &self.settings.aliases,
            &self.settings.actions,
            &self.settings.generation,
            self.line_ending,
            rng,
        )
    }

    /// Generate text from an unvalidated document, skipping what it can't read.
    ///
    /// Statements that match no shape are logged and contribute no lines; the
    /// rest keep their order. Only a non-sequence document is an error.
    pub fn generate_document(
        &self,
        document: &Value,
        knowledge: Option<&CharacterKnowledgeBase>,
    ) -> Result<String, GeneratorError> {
        let items = document.as_array().ok_or(ValidationError::NotASequence)?;
        let statements: Vec<SceneStatement> = items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| match classify(item) {
                Ok(statement) => Some(statement),
                Err(e) => {
                    tracing::warn!(index, reason = %e, "unrecognized statement:\n{}", render_yaml(item));
                    None
                }
            })
            .collect();
        Ok(self.generate(&SceneScript::new(statements), knowledge))
    }

    /// Validate a JSON document against `schema()` and generate from it.
    pub fn generate_json(
        &self,
        input: &str,
        knowledge: Option<&CharacterKnowledgeBase>,
    ) -> Result<String, GeneratorError> {
        let script = self.schema().parse_json(input)?;
        Ok(self.generate(&script, knowledge))
    }

    /// Validate a YAML document against `schema()` and generate from it.
    pub fn generate_yaml(
        &self,
        input: &str,
        knowledge: Option<&CharacterKnowledgeBase>,
    ) -> Result<String, GeneratorError> {
        let script = self.schema().parse_yaml(input)?;
        Ok(self.generate(&script, knowledge))
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Render a statement for diagnostics; falls back to JSON if YAML fails.
fn render_yaml(value: &Value) -> String {
    serde_yaml::to_string(value).unwrap_or_else(|_| value.to_string())
}

impl ScriptGeneratorBuilder {
    /// Load settings from a RON file at build time.
    pub fn settings_file(mut self, path: &str) -> Self {
        self.settings_path = Some(path.to_string());
        self
    }

    pub fn line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Provide settings directly (for use without files).
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Override the generation options.
    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Override the alias table.
    pub fn with_aliases(mut self, aliases: AliasTable) -> Self {
        self.aliases = Some(aliases);
        self
    }

    /// Override the action table.
    pub fn with_actions(mut self, actions: ActionTable) -> Self {
        self.actions = Some(actions);
        self
    }

    /// Direct settings win over a settings file; individual overrides apply last.
    pub fn build(self) -> Result<ScriptGenerator, GeneratorError> {
        let mut settings = match (&self.settings_path, self.settings) {
            (_, Some(settings)) => settings,
            (Some(path), None) => Settings::load_from_ron(Path::new(path))?,
            (None, None) => Settings::default(),
        };

        if let Some(config) = self.config {
            settings.generation = config;
        }
        if let Some(aliases) = self.aliases {
            settings.aliases = aliases;
        }
        if let Some(actions) = self.actions {
            settings.actions = actions;
        }

        Ok(ScriptGenerator {
            settings,
            line_ending: self.line_ending,
            seed: self.seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::figure::{Costume, FigureEntry, FigureId};
    use serde_json::json;

    fn knowledge() -> CharacterKnowledgeBase {
        let mut kb = CharacterKnowledgeBase::new();
        kb.insert(
            FigureId::new("tomori"),
            FigureEntry {
                name: "tomori".to_string(),
                path: "tomori".to_string(),
                costumes: vec![
                    Costume {
                        name: "school".to_string(),
                        path: "tomori/school/model.json".to_string(),
                        motions: vec!["idle01".to_string(), "sad01".to_string(), "sad02".to_string()],
                        expressions: vec!["sad".to_string(), "smile".to_string()],
                    },
                    Costume {
                        name: "live".to_string(),
                        path: "tomori/live/model.json".to_string(),
                        motions: vec!["idle01".to_string()],
                        expressions: vec!["default".to_string()],
                    },
                ],
            },
        );
        kb
    }

    fn build_generator() -> ScriptGenerator {
        ScriptGenerator::builder()
            .seed(42)
            .line_ending(LineEnding::Lf)
            .build()
            .unwrap()
    }

    #[test]
    fn each_line_terminated() {
        let generator = build_generator();
        let script = generator
            .schema()
            .validate(&json!([
                {"背景": "forest"},
                {"旁白": "It was quiet."},
                {"角色": "路人", "动作": "微笑", "对话": "hi"},
            ]))
            .unwrap();
        let out = generator.generate(&script, None);
        assert_eq!(out, "changeBg: forest -next;\n: It was quiet.;\n路人: hi;\n");
    }

    #[test]
    fn crlf_line_endings() {
        let generator = ScriptGenerator::builder()
            .line_ending(LineEnding::CrLf)
            .build()
            .unwrap();
        let script = SceneScript::new(vec![SceneStatement::Narration {
            narration: "a".to_string(),
        }]);
        assert_eq!(generator.generate(&script, None), ": a;\r\n");
    }

    #[test]
    fn empty_script_is_empty_text() {
        let generator = build_generator();
        assert_eq!(generator.generate(&SceneScript::default(), None), "");
    }

    #[test]
    fn same_seed_same_output() {
        let kb = knowledge();
        let script = build_generator()
            .schema()
            .validate(&json!([
                {"角色": "灯", "动作": "悲伤", "对话": "……"},
                {"角色": "高松灯", "动作": "惊讶", "对话": "诶？"},
            ]))
            .unwrap();
        let first = build_generator().generate(&script, Some(&kb));
        for _ in 0..5 {
            assert_eq!(build_generator().generate(&script, Some(&kb)), first);
        }
    }

    #[test]
    fn unrecognized_statements_skipped_in_order() {
        let generator = build_generator();
        let doc = json!([
            {"背景": "a"},
            {"音乐": "bgm.mp3"},
            {"角色": "路人"},
            {"旁白": "b"},
        ]);
        let out = generator.generate_document(&doc, None).unwrap();
        assert_eq!(out, "changeBg: a -next;\n: b;\n");
    }

    #[test]
    fn document_must_be_sequence() {
        let generator = build_generator();
        let err = generator.generate_document(&json!({"背景": "a"}), None).unwrap_err();
        assert!(matches!(err, GeneratorError::Validation(ValidationError::NotASequence)));
    }

    #[test]
    fn strict_generator_rejects_unknown_tags() {
        let generator = ScriptGenerator::builder()
            .with_config(GenerationConfig {
                strict_vocabulary: true,
                ..Default::default()
            })
            .build()
            .unwrap();
        let err = generator
            .generate_json(r#"[{"角色": "灯", "动作": "跳舞", "对话": "..."}]"#, None)
            .unwrap_err();
        assert!(matches!(err, GeneratorError::Validation(_)));
    }

    #[test]
    fn builder_overrides_apply() {
        let mut aliases = AliasTable::new();
        aliases.insert("tomori", ["小灯"]);
        let generator = ScriptGenerator::builder()
            .seed(1)
            .line_ending(LineEnding::Lf)
            .with_aliases(aliases)
            .build()
            .unwrap();
        let kb = knowledge();
        let out = generator
            .generate_json(r#"[{"角色": "小灯", "动作": "悲伤", "对话": "嗯"}]"#, Some(&kb))
            .unwrap();
        assert!(out.starts_with("changeFigure: tomori/"));
        assert!(out.ends_with("小灯: 嗯;\n"));
    }

    #[test]
    fn settings_file_loaded() {
        let generator = ScriptGenerator::builder()
            .settings_file("tests/fixtures/settings.ron")
            .build()
            .unwrap();
        assert!(generator.settings().generation.associate_figure_with_dialogue);
    }

    #[test]
    fn missing_settings_file_errors() {
        let result = ScriptGenerator::builder()
            .settings_file("tests/fixtures/does_not_exist.ron")
            .build();
        assert!(matches!(result, Err(GeneratorError::Config(ConfigError::Io(_)))));
    }
}
