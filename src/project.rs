/// Game projects on disk: listing games, scanning figures, writing scripts,
/// and the workspace state that follows them.

use base64::engine::general_purpose;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::generator::{GeneratorError, ScriptGenerator};
use crate::schema::figure::{CharacterKnowledgeBase, Costume, FigureEntry, FigureId};

/// Model descriptor suffixes accepted as costumes.
const MODEL_SUFFIXES: &[&str] = &["model.json", "model3.json"];
/// Expression descriptors that sit next to models and are never models.
const EXPRESSION_SUFFIX: &str = ".exp.json";

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("IO error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("glob pattern error: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("glob walk error: {0}")]
    Walk(#[from] glob::GlobError),
    #[error("figure directory not found: {0}")]
    MissingFigureDir(PathBuf),
    #[error("file already exists: {0}")]
    FileExists(PathBuf),
    #[error("unknown game: {0}")]
    UnknownGame(String),
    #[error("no game selected")]
    NoGameSelected,
}

impl ProjectError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A game found under the engine's games directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInfo {
    /// `data:image/png;base64,...`, or empty when the game has no icon.
    pub icon: String,
    pub path: String,
}

pub type GameRecord = BTreeMap<String, GameInfo>;

/// The services a workspace needs from the outside world.
pub trait GameProject {
    /// Every game under `<base>/public/games`.
    fn list_games(&self, base_path: &Path) -> Result<GameRecord, ProjectError>;
    /// Figures and costumes found under `<game>/game/figure`.
    fn analyze_figures(&self, game_path: &Path) -> Result<CharacterKnowledgeBase, ProjectError>;
    /// Persist bytes; an existing file is only replaced with `overwrite`.
    fn write_file(&self, contents: &[u8], path: &Path, overwrite: bool) -> Result<(), ProjectError>;
}

/// `GameProject` backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProject;

impl GameProject for FsProject {
    fn list_games(&self, base_path: &Path) -> Result<GameRecord, ProjectError> {
        let games_dir = base_path.join("public").join("games");
        let entries = fs::read_dir(&games_dir).map_err(|e| ProjectError::io(&games_dir, e))?;

        let mut games = GameRecord::new();
        for entry in entries {
            let entry = entry.map_err(|e| ProjectError::io(&games_dir, e))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let icon = icon_data_url(&path.join("icons").join("icon-192.png"))?;
            games.insert(
                name.to_string(),
                GameInfo {
                    icon,
                    path: path.to_string_lossy().into_owned(),
                },
            );
        }
        Ok(games)
    }

    fn analyze_figures(&self, game_path: &Path) -> Result<CharacterKnowledgeBase, ProjectError> {
        let figure_dir = game_path.join("game").join("figure");
        if !figure_dir.is_dir() {
            return Err(ProjectError::MissingFigureDir(figure_dir));
        }

        let candidates = candidate_files(&figure_dir)?;
        let mut knowledge = CharacterKnowledgeBase::new();
        for file in candidates {
            let Some(costume) = read_costume(&figure_dir, &file) else {
                continue;
            };
            let Some((figure, figure_path)) = figure_names(&figure_dir, &file) else {
                tracing::warn!(path = %file.display(), "skipping model outside a costume directory");
                continue;
            };
            knowledge
                .figures
                .entry(FigureId::new(figure.as_str()))
                .or_insert_with(|| FigureEntry {
                    name: figure,
                    path: figure_path,
                    costumes: Vec::new(),
                })
                .costumes
                .push(costume);
        }
        tracing::info!(figures = knowledge.len(), dir = %figure_dir.display(), "analyzed figures");
        Ok(knowledge)
    }

    fn write_file(&self, contents: &[u8], path: &Path, overwrite: bool) -> Result<(), ProjectError> {
        if !overwrite && path.exists() {
            return Err(ProjectError::FileExists(path.to_path_buf()));
        }
        fs::write(path, contents).map_err(|e| ProjectError::io(path, e))
    }
}

fn icon_data_url(icon_path: &Path) -> Result<String, ProjectError> {
    if !icon_path.exists() {
        return Ok(String::new());
    }
    let data = fs::read(icon_path).map_err(|e| ProjectError::io(icon_path, e))?;
    Ok(format!(
        "data:image/png;base64,{}",
        general_purpose::STANDARD.encode(data)
    ))
}

/// Model files under the figure directory.
///
/// `.jsonl` bundles are always kept and shadow every `.json` file in their
/// directory tree.
fn candidate_files(figure_dir: &Path) -> Result<Vec<PathBuf>, ProjectError> {
    let pattern = format!(
        "{}/**/*",
        glob::Pattern::escape(&figure_dir.to_string_lossy())
    );

    let mut files = Vec::new();
    for entry in glob::glob(&pattern)? {
        let path = entry?;
        if path.is_file() {
            files.push(path);
        }
    }

    let bundle_dirs: HashSet<PathBuf> = files
        .iter()
        .filter(|p| has_extension(p, "jsonl"))
        .filter_map(|p| p.parent().map(Path::to_path_buf))
        .collect();

    Ok(files
        .into_iter()
        .filter(|path| {
            if has_extension(path, "jsonl") {
                return true;
            }
            if !has_extension(path, "json") {
                return false;
            }
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            !name.ends_with(EXPRESSION_SUFFIX)
                && !bundle_dirs.iter().any(|dir| path.starts_with(dir))
        })
        .collect())
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case(ext))
}

/// Read one model file into a costume; `None` if it isn't a usable model.
fn read_costume(figure_dir: &Path, file: &Path) -> Option<Costume> {
    let name = file.parent()?.file_name()?.to_str()?.to_string();
    let relative = file
        .strip_prefix(figure_dir)
        .ok()?
        .to_string_lossy()
        .replace('\\', "/");

    let (motions, expressions) = if has_extension(file, "jsonl") {
        read_bundle_vocabulary(file)?
    } else {
        let file_name = file.file_name()?.to_str()?;
        if !MODEL_SUFFIXES.iter().any(|s| file_name.ends_with(s)) {
            return None;
        }
        read_model_vocabulary(file)?
    };

    Some(Costume {
        name,
        path: relative,
        motions,
        expressions,
    })
}

/// Motions are the keys of `motions`; expressions are each entry's `name`.
fn read_model_vocabulary(file: &Path) -> Option<(Vec<String>, Vec<String>)> {
    let model = read_json(file)?;
    if model.get("model").is_none() || model.get("textures").is_none() {
        return None;
    }
    let motions = model
        .get("motions")
        .and_then(Value::as_object)
        .map(|m| m.keys().cloned().collect())
        .unwrap_or_default();
    let expressions = model
        .get("expressions")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|e| e.get("name").and_then(Value::as_str).map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    Some((motions, expressions))
}

/// The last line of a bundle carrying `motions` or `expressions` wins.
fn read_bundle_vocabulary(file: &Path) -> Option<(Vec<String>, Vec<String>)> {
    let content = match fs::read_to_string(file) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(path = %file.display(), error = %e, "failed to read model bundle");
            return None;
        }
    };
    let strings = |v: Option<&Value>| -> Vec<String> {
        v.and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default()
    };
    let vocabulary = content
        .lines()
        .rev()
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .find(|json| json.get("motions").is_some() || json.get("expressions").is_some())
        .map(|json| (strings(json.get("motions")), strings(json.get("expressions"))))
        .unwrap_or_default();
    Some(vocabulary)
}

fn read_json(file: &Path) -> Option<Value> {
    let content = match fs::read_to_string(file) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(path = %file.display(), error = %e, "failed to read model");
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::warn!(path = %file.display(), error = %e, "failed to parse model");
            None
        }
    }
}

/// Figure identity and figure directory for a model file.
///
/// The identity is the directory above the costume; a costume directly under
/// the figure root is its own figure.
fn figure_names(figure_dir: &Path, file: &Path) -> Option<(String, String)> {
    let relative = file.strip_prefix(figure_dir).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect();
    if parts.len() < 2 {
        return None;
    }
    let costume = parts[parts.len() - 2];
    let figure_parts = &parts[..parts.len() - 2];
    match figure_parts.last() {
        Some(figure) => Some((figure.to_string(), figure_parts.join("/"))),
        None => Some((costume.to_string(), costume.to_string())),
    }
}

/// Base path, selected game and its figures, kept consistent across
/// collaborator failures.
pub struct Workspace<P: GameProject> {
    project: P,
    generator: ScriptGenerator,
    base_path: Option<PathBuf>,
    games: GameRecord,
    selected_game: Option<String>,
    knowledge: Option<CharacterKnowledgeBase>,
}

impl<P: GameProject> Workspace<P> {
    pub fn new(project: P, generator: ScriptGenerator) -> Self {
        Self {
            project,
            generator,
            base_path: None,
            games: GameRecord::new(),
            selected_game: None,
            knowledge: None,
        }
    }

    pub fn base_path(&self) -> Option<&Path> {
        self.base_path.as_deref()
    }

    pub fn games(&self) -> &GameRecord {
        &self.games
    }

    pub fn selected_game(&self) -> Option<&str> {
        self.selected_game.as_deref()
    }

    pub fn knowledge(&self) -> Option<&CharacterKnowledgeBase> {
        self.knowledge.as_ref()
    }

    pub fn generator(&self) -> &ScriptGenerator {
        &self.generator
    }

    /// Point the workspace at an engine install and list its games.
    ///
    /// On failure the base path, listing and selection are cleared. A selection the new
    /// listing lacks is dropped along with its figures.
    pub fn set_base_path(&mut self, base_path: impl Into<PathBuf>) -> Result<(), ProjectError> {
        let base_path = base_path.into();
        match self.project.list_games(&base_path) {
            Ok(games) => {
                self.games = games;
                self.base_path = Some(base_path);
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to list games");
                self.base_path = None;
                self.games.clear();
                self.selected_game = None;
                self.knowledge = None;
                return Err(e);
            }
        }

        let still_listed = self
            .selected_game
            .as_ref()
            .map_or(true, |selected| self.games.contains_key(selected));
        if !still_listed {
            self.selected_game = None;
            self.knowledge = None;
        }
        Ok(())
    }

    /// Select a listed game and scan its figures.
    ///
    /// An empty scan means no knowledge base; a failed scan clears it.
    pub fn select_game(&mut self, game: &str) -> Result<(), ProjectError> {
        let info = self
            .games
            .get(game)
            .ok_or_else(|| ProjectError::UnknownGame(game.to_string()))?;
        self.selected_game = Some(game.to_string());

        match self.project.analyze_figures(Path::new(&info.path)) {
            Ok(knowledge) => {
                self.knowledge = knowledge.non_empty();
                Ok(())
            }
            Err(e) => {
                tracing::error!(game, error = %e, "failed to analyze figures");
                self.knowledge = None;
                Err(e)
            }
        }
    }

    /// Validate and generate a JSON scene script against the current figures.
    pub fn generate_json(&self, input: &str) -> Result<String, GeneratorError> {
        self.generator.generate_json(input, self.knowledge.as_ref())
    }

    /// Validate and generate a YAML scene script against the current figures.
    pub fn generate_yaml(&self, input: &str) -> Result<String, GeneratorError> {
        self.generator.generate_yaml(input, self.knowledge.as_ref())
    }

    /// Write generated text to `path`.
    pub fn export(&self, script: &str, path: &Path, overwrite: bool) -> Result<(), ProjectError> {
        self.project.write_file(script.as_bytes(), path, overwrite)
    }

    /// Write generated text into the selected game's scene directory.
    pub fn export_scene(&self, script: &str, file_name: &str, overwrite: bool) -> Result<PathBuf, ProjectError> {
        let selected = self.selected_game.as_deref().ok_or(ProjectError::NoGameSelected)?;
        let info = self
            .games
            .get(selected)
            .ok_or_else(|| ProjectError::UnknownGame(selected.to_string()))?;
        let path = Path::new(&info.path).join("game").join("scene").join(file_name);
        self.export(script, &path, overwrite)?;
        Ok(path)
    }
}
