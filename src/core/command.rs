/// WebGAL statement lines: `<command>: <content> <args> -next`.

use std::fmt;

/// A `-key` or `-key=value` argument.
///
/// `None` values are dropped from the rendered line; `Some("")` renders as a
/// bare flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arg {
    pub key: &'static str,
    pub value: Option<String>,
}

impl Arg {
    pub fn new(key: &'static str, value: Option<String>) -> Self {
        Self { key, value }
    }

    pub fn value(key: &'static str, value: impl Into<String>) -> Self {
        Self::new(key, Some(value.into()))
    }

    pub fn flag(key: &'static str) -> Self {
        Self::new(key, Some(String::new()))
    }
}

/// One output statement, without its terminating separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    pub command: String,
    pub content: String,
    pub args: Vec<Arg>,
    pub next: bool,
}

impl ScriptLine {
    pub fn new(command: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            content: content.into(),
            args: Vec::new(),
            next: false,
        }
    }

    pub fn arg(mut self, arg: Arg) -> Self {
        self.args.push(arg);
        self
    }

    /// Append the trailing `-next` flag.
    pub fn next(mut self) -> Self {
        self.next = true;
        self
    }

    /// `changeBg: <background> -next`
    pub fn change_bg(background: &str) -> Self {
        Self::new("changeBg", background).next()
    }

    /// `: <text>`
    pub fn narration(text: &str) -> Self {
        Self::new("", text)
    }
}

impl fmt::Display for ScriptLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.command)?;
        if !self.content.is_empty() {
            write!(f, " {}", self.content)?;
        }
        for arg in &self.args {
            match arg.value.as_deref() {
                None => {}
                Some("") => write!(f, " -{}", arg.key)?,
                Some(value) => write!(f, " -{}={}", arg.key, value)?,
            }
        }
        if self.next {
            f.write_str(" -next")?;
        }
        Ok(())
    }
}
