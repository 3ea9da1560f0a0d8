use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::figure::FigureId;

/// Placeholder in an action value that is replaced by the resolved figure id.
pub const NAME_PLACEHOLDER: &str = "{name}";

/// Separator between figure and costume in a composite alias key.
pub const COSTUME_SEPARATOR: char = '/';

/// A parsed alias-table key: a bare figure, or a figure pinned to a costume.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FigureKey {
    pub figure: FigureId,
    pub costume: Option<String>,
}

impl FigureKey {
    /// Parse `figure` or `figure/costume`. Empty halves are treated as bare.
    pub fn parse(key: &str) -> Self {
        match key.split_once(COSTUME_SEPARATOR) {
            Some((figure, costume)) if !figure.is_empty() && !costume.is_empty() => Self {
                figure: FigureId::new(figure),
                costume: Some(costume.to_string()),
            },
            _ => Self {
                figure: FigureId::new(key),
                costume: None,
            },
        }
    }

    pub fn is_composite(&self) -> bool {
        self.costume.is_some()
    }
}

/// Writer-facing names for figures and figure/costume pairs.
///
/// Lookup is by reverse membership: which keys list this alias?
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasTable {
    pub entries: BTreeMap<String, Vec<String>>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn insert<I, S>(&mut self, key: impl Into<String>, aliases: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries
            .insert(key.into(), aliases.into_iter().map(Into::into).collect());
    }

    /// Every key listing `alias`, most specific first.
    ///
    /// Composite `figure/costume` keys come before bare figure keys; within
    /// each group keys keep their sorted order.
    pub fn candidates(&self, alias: &str) -> Vec<FigureKey> {
        let mut keys: Vec<FigureKey> = self
            .entries
            .iter()
            .filter(|(_, aliases)| aliases.iter().any(|a| a == alias))
            .map(|(key, _)| FigureKey::parse(key))
            .collect();
        // stable: preserves key order within each group
        keys.sort_by_key(|k| !k.is_composite());
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        let mut table = Self::new();
        table.insert("anon", ["千早爱音", "爱音"]);
        table.insert("soyo", ["长崎素世", "素世", "长崎爽世", "爽世"]);
        table.insert("tomori", ["高松灯", "灯"]);
        table.insert("taki", ["椎名立希", "立希"]);
        table.insert("rana", ["要乐奈", "乐奈"]);
        table.insert("sakiko", ["丰川祥子", "祥子"]);
        table.insert("umiri", ["八幡海铃", "海铃"]);
        table.insert("uika", ["三角初华", "初华"]);
        table.insert("nyamu", ["祐天寺若麦", "喵梦"]);
        table.insert("mutsumi", ["若叶睦", "睦"]);
        table.insert("mana", ["纯田真奈", "真奈"]);
        table
    }
}

/// Maps one emotion tag to an engine keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLink {
    pub key: String,
    pub value: String,
}

impl ActionLink {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Emotion overrides. Table order is precedence order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionTable {
    pub links: Vec<ActionLink>,
}

impl ActionTable {
    pub fn new(links: Vec<ActionLink>) -> Self {
        Self { links }
    }

    /// First entry for `tag`, if any.
    pub fn find(&self, tag: &str) -> Option<&ActionLink> {
        self.links.iter().find(|link| link.key == tag)
    }

    /// The known emotion tags, in table order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.links.iter().map(|link| link.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl Default for ActionTable {
    fn default() -> Self {
        Self::new(vec![
            ActionLink::new("生气", "angry"),
            ActionLink::new("告别", "bye"),
            ActionLink::new("哭泣", "cry"),
            ActionLink::new("感动", "kandou"),
            ActionLink::new("决心", "kime"),
            ActionLink::new("悲伤", "sad"),
            ActionLink::new("认真", "serious"),
            ActionLink::new("害羞", "shame"),
            ActionLink::new("微笑", "smile"),
            ActionLink::new("惊讶", "surprised"),
            ActionLink::new("思考", "thinking"),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bare_and_composite_keys() {
        let bare = FigureKey::parse("anon");
        assert_eq!(bare.figure, FigureId::new("anon"));
        assert!(bare.costume.is_none());

        let composite = FigureKey::parse("anon/school");
        assert_eq!(composite.figure, FigureId::new("anon"));
        assert_eq!(composite.costume.as_deref(), Some("school"));
    }

    #[test]
    fn trailing_separator_is_bare() {
        let key = FigureKey::parse("anon/");
        assert!(key.costume.is_none());
        assert_eq!(key.figure.as_str(), "anon/");
    }

    #[test]
    fn composite_candidates_come_first() {
        let mut table = AliasTable::new();
        table.insert("anon", ["爱音"]);
        table.insert("anon/school", ["爱音"]);
        table.insert("soyo", ["素世"]);

        let candidates = table.candidates("爱音");
        assert_eq!(candidates.len(), 2);
        assert!(candidates[0].is_composite());
        assert!(!candidates[1].is_composite());
    }

    #[test]
    fn unknown_alias_has_no_candidates() {
        assert!(AliasTable::default().candidates("路人").is_empty());
    }

    #[test]
    fn default_tables() {
        let aliases = AliasTable::default();
        assert_eq!(aliases.len(), 11);
        assert_eq!(aliases.candidates("灯")[0].figure, FigureId::new("tomori"));

        let actions = ActionTable::default();
        assert_eq!(actions.len(), 11);
        assert_eq!(actions.find("微笑").map(|l| l.value.as_str()), Some("smile"));
    }

    #[test]
    fn first_matching_action_wins() {
        let table = ActionTable::new(vec![
            ActionLink::new("微笑", "smile"),
            ActionLink::new("微笑", "grin"),
        ]);
        assert_eq!(table.find("微笑").unwrap().value, "smile");
    }

    #[test]
    fn action_table_ron_shape() {
        let table: ActionTable =
            ron::from_str(r#"[(key: "哭泣", value: "{name}_cry")]"#).unwrap();
        assert_eq!(table.links[0].value, "{name}_cry");
    }
}
