/// Per-statement handlers: each statement becomes zero or more script lines.

use rand::Rng;

use crate::config::GenerationConfig;
use crate::core::command::{Arg, ScriptLine};
use crate::core::resolve::{pick_variant, resolve_action, resolve_figure, select_costume};
use crate::schema::figure::{CharacterKnowledgeBase, Costume, FigureId};
use crate::schema::links::{ActionTable, AliasTable};
use crate::schema::statement::{DialogueLine, SceneStatement};

/// Full-width period stripped from dialogue when configured.
pub const FULL_STOP: char = '。';

/// Read-only inputs shared by every statement of one generation pass.
#[derive(Debug, Clone, Copy)]
pub struct GenerationContext<'a> {
    /// `None` means figure resolution is unavailable.
    pub knowledge: Option<&'a CharacterKnowledgeBase>,
    pub aliases: &'a AliasTable,
    pub actions: &'a ActionTable,
    pub config: &'a GenerationConfig,
}

/// Lines for one statement, in output order.
pub fn render_statement<R: Rng + ?Sized>(
    statement: &SceneStatement,
    ctx: &GenerationContext<'_>,
    rng: &mut R,
) -> Vec<ScriptLine> {
    match statement {
        SceneStatement::Background { background } => vec![ScriptLine::change_bg(background)],
        SceneStatement::Narration { narration } => vec![ScriptLine::narration(narration)],
        SceneStatement::Dialogue(line) => dialogue_lines(line, ctx, rng),
    }
}

/// A speaker line, preceded by a figure change when the character resolves.
pub fn dialogue_lines<R: Rng + ?Sized>(
    line: &DialogueLine,
    ctx: &GenerationContext<'_>,
    rng: &mut R,
) -> Vec<ScriptLine> {
    let text = if ctx.config.strip_trailing_full_stop {
        strip_full_stop(&line.text)
    } else {
        line.text.as_str()
    };
    let mut speaker = ScriptLine::new(line.character.as_str(), text);
    let mut lines = Vec::with_capacity(2);

    let figure = match ctx.knowledge {
        Some(kb) => resolve_figure(&line.character, kb, ctx.aliases),
        None => {
            tracing::debug!(character = %line.character, "no knowledge base, plain speaker line");
            None
        }
    };
    if let Some(figure) = figure {
        match select_costume(&figure, rng) {
            Some(costume) => {
                let action = resolve_action(ctx.actions, &line.emotion, Some(figure.id), ctx.config);
                lines.push(change_figure(figure.id, costume, &action, ctx.config, rng));
                if ctx.config.associate_figure_with_dialogue {
                    speaker = speaker
                        .arg(Arg::flag("id"))
                        .arg(Arg::value("figureId", figure.id.as_str()));
                }
            }
            None => {
                tracing::debug!(figure = %figure.id, "figure has no costumes");
            }
        }
    }

    lines.push(speaker);
    lines
}

/// `changeFigure: <asset> -id=<id> [-transform=..] -next [-motion=..] [-expression=..]`
pub fn change_figure<R: Rng + ?Sized>(
    id: &FigureId,
    costume: &Costume,
    action: &str,
    config: &GenerationConfig,
    rng: &mut R,
) -> ScriptLine {
    let motion = pick_variant(&costume.motions, action, rng).map(str::to_string);
    let expression = pick_variant(&costume.expressions, action, rng).map(str::to_string);

    ScriptLine::new("changeFigure", costume.path.as_str())
        .arg(Arg::value("id", id.as_str()))
        .arg(Arg::new("transform", config.transform().map(str::to_string)))
        .arg(Arg::flag("next"))
        .arg(Arg::new("motion", motion))
        .arg(Arg::new("expression", expression))
}

/// Remove one trailing `。`, leaving any other occurrence alone.
pub fn strip_full_stop(text: &str) -> &str {
    text.strip_suffix(FULL_STOP).unwrap_or(text)
}
