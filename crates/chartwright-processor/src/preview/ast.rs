//! AST for the previewed template subset

/// A parsed template: flat sequence of text and actions
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub elements: Vec<Element>,
}

/// An element in a template: either raw text or an action
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// Raw text (not inside {{ }})
    RawText(String),
    /// An action (inside {{ }})
    Action(Action),
}

/// An action (directive inside {{ }})
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    /// Whether the action has left whitespace trimming ({{-)
    pub trim_left: bool,
    /// Whether the action has right whitespace trimming (-}})
    pub trim_right: bool,
    pub body: ActionBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionBody {
    /// {{ if .X }}
    If(Pipeline),
    /// {{ with .X }}
    With(Pipeline),
    Else,
    End,
    /// {{ .X | f }}
    Pipeline(Pipeline),
}

/// Commands separated by `|`; each result feeds the next command's last argument
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub commands: Vec<Command>,
}

/// Space-separated operands; a leading identifier makes it a function call
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub operands: Vec<Operand>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// .Values.image.tag, relative to dot
    Field(Vec<String>),
    /// .
    Dot,
    Literal(Literal),
    /// Function name
    Identifier(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Int(i64),
    Bool(bool),
}
