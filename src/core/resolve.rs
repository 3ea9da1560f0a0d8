/// Figure, costume, and action resolution against the character knowledge base.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::GenerationConfig;
use crate::schema::figure::{CharacterKnowledgeBase, Costume, FigureEntry, FigureId};
use crate::schema::links::{ActionTable, AliasTable, NAME_PLACEHOLDER};

/// A figure found for a writer-facing name.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedFigure<'a> {
    pub id: &'a FigureId,
    pub entry: &'a FigureEntry,
    /// Set when the alias pinned a specific costume.
    pub costume: Option<&'a Costume>,
}

/// Find the figure a character name refers to.
///
/// Candidate keys are tried most specific first. A key whose figure is not in
/// the knowledge base, or whose pinned costume the figure lacks, is skipped.
pub fn resolve_figure<'a>(
    name: &str,
    knowledge: &'a CharacterKnowledgeBase,
    aliases: &AliasTable,
) -> Option<ResolvedFigure<'a>> {
    let candidates = aliases.candidates(name);
    if candidates.is_empty() {
        tracing::debug!(character = name, "no alias entry for character");
        return None;
    }
    for key in candidates {
        let Some((id, entry)) = knowledge.figures.get_key_value(&key.figure) else {
            tracing::debug!(character = name, figure = %key.figure, "alias names an unknown figure");
            continue;
        };
        match key.costume.as_deref() {
            None => {
                return Some(ResolvedFigure {
                    id,
                    entry,
                    costume: None,
                })
            }
            Some(costume_name) => match entry.costume(costume_name) {
                Some(costume) => {
                    return Some(ResolvedFigure {
                        id,
                        entry,
                        costume: Some(costume),
                    })
                }
                None => {
                    tracing::debug!(
                        character = name,
                        figure = %id,
                        costume = costume_name,
                        "alias names an unknown costume"
                    );
                }
            },
        }
    }
    tracing::debug!(character = name, "no alias candidate resolved to a figure");
    None
}

/// The costume to show: the pinned one, else the default for the figure.
pub fn select_costume<'a, R: Rng + ?Sized>(
    figure: &ResolvedFigure<'a>,
    rng: &mut R,
) -> Option<&'a Costume> {
    figure
        .costume
        .or_else(|| default_costume(&figure.entry.costumes, rng))
}

/// First "casual" costume, else a uniformly random one. `None` when empty.
pub fn default_costume<'a, R: Rng + ?Sized>(
    costumes: &'a [Costume],
    rng: &mut R,
) -> Option<&'a Costume> {
    costumes
        .iter()
        .find(|c| c.is_preferred())
        .or_else(|| costumes.choose(rng))
}

/// Map an emotion tag to an engine keyword.
///
/// The first table entry for the tag wins; `{name}` in its value becomes the
/// figure id. Unmapped or empty entries fall back to the configured default
/// action, then to `idle`.
pub fn resolve_action(
    actions: &ActionTable,
    tag: &str,
    figure: Option<&FigureId>,
    config: &GenerationConfig,
) -> String {
    match actions.find(tag).filter(|link| !link.value.is_empty()) {
        Some(link) => match figure {
            Some(id) if link.value.contains(NAME_PLACEHOLDER) => {
                link.value.replace(NAME_PLACEHOLDER, id.as_str())
            }
            _ => link.value.clone(),
        },
        None => config.fallback_action().to_string(),
    }
}

/// Pick a motion or expression for `keyword`.
///
/// Entries containing the keyword are preferred; without any, the whole list
/// is used. Both picks are uniform.
pub fn pick_variant<'a, R: Rng + ?Sized>(
    candidates: &'a [String],
    keyword: &str,
    rng: &mut R,
) -> Option<&'a str> {
    let matching: Vec<&String> = candidates.iter().filter(|c| c.contains(keyword)).collect();
    let picked = if matching.is_empty() {
        candidates.choose(rng)
    } else {
        matching.choose(rng).copied()
    };
    picked.map(String::as_str)
}
