//! Evaluation of parsed templates

use chartwright_core::Values;
use serde_json::Value as JsonValue;

use super::ast::*;
use super::{Helpers, PreviewError, Result, parser, stub_helpers};

/// Output of a nil value, as Go templates print it
const NO_VALUE: &str = "<no value>";

/// Renders templates against values and a fixed set of helpers
#[derive(Debug, Clone, Default)]
pub struct Preview {
    helpers: Helpers,
}

impl Preview {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preview with stand-ins for `<chart>.fullname`, `.labels` and `.selectorLabels`
    pub fn for_chart(chart_name: &str) -> Self {
        Self {
            helpers: stub_helpers(chart_name),
        }
    }

    /// Register the text `include "<name>"` returns
    pub fn with_helper(mut self, name: impl Into<String>, body: impl Into<String>) -> Self {
        self.helpers.insert(name.into(), body.into());
        self
    }

    /// Render `source` with `values` available as `.Values`
    pub fn render(&self, source: &str, values: &Values) -> Result<String> {
        let template = parser::parse(source)?;
        let nodes = build_tree(apply_trim_markers(template.elements))?;

        let mut root = serde_json::Map::new();
        root.insert("Values".to_string(), values.inner().clone());
        let root = JsonValue::Object(root);

        let mut out = String::new();
        self.eval_nodes(&nodes, &root, &mut out)?;
        Ok(out)
    }

    fn eval_nodes(&self, nodes: &[Node], dot: &JsonValue, out: &mut String) -> Result<()> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Output(pipeline) => {
                    let value = self.eval_pipeline(pipeline, dot)?;
                    out.push_str(&to_text(&value));
                }
                Node::If {
                    condition,
                    then,
                    otherwise,
                } => {
                    let value = self.eval_pipeline(condition, dot)?;
                    let branch = if is_truthy(&value) { then } else { otherwise };
                    self.eval_nodes(branch, dot, out)?;
                }
                Node::With {
                    subject,
                    then,
                    otherwise,
                } => {
                    let value = self.eval_pipeline(subject, dot)?;
                    if is_truthy(&value) {
                        self.eval_nodes(then, &value, out)?;
                    } else {
                        self.eval_nodes(otherwise, dot, out)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn eval_pipeline(&self, pipeline: &Pipeline, dot: &JsonValue) -> Result<JsonValue> {
        let mut piped = None;
        for command in &pipeline.commands {
            piped = Some(self.eval_command(command, dot, piped)?);
        }
        Ok(piped.unwrap_or(JsonValue::Null))
    }

    fn eval_command(
        &self,
        command: &Command,
        dot: &JsonValue,
        piped: Option<JsonValue>,
    ) -> Result<JsonValue> {
        match command.operands.split_first() {
            Some((Operand::Identifier(name), rest)) => {
                let mut args = rest
                    .iter()
                    .map(|operand| eval_operand(operand, dot))
                    .collect::<Result<Vec<_>>>()?;
                args.extend(piped);
                self.call(name, args)
            }
            Some((operand, [])) if piped.is_none() => eval_operand(operand, dot),
            Some(_) => Err(PreviewError::WrongArguments {
                function: "<value>".to_string(),
                message: "can't give argument to non-function".to_string(),
            }),
            None => Ok(JsonValue::Null),
        }
    }

    fn call(&self, name: &str, args: Vec<JsonValue>) -> Result<JsonValue> {
        match (name, args.as_slice()) {
            ("include", [JsonValue::String(template), _]) => self
                .helpers
                .get(template)
                .map(|body| JsonValue::String(body.clone()))
                .ok_or_else(|| PreviewError::UnknownTemplate(template.clone())),
            ("nindent", [spaces, text]) => {
                let spaces = as_count(name, spaces)?;
                Ok(JsonValue::String(format!("\n{}", pad_lines(&to_text(text), spaces))))
            }
            ("indent", [spaces, text]) => {
                let spaces = as_count(name, spaces)?;
                Ok(JsonValue::String(pad_lines(&to_text(text), spaces)))
            }
            ("quote", [value]) => Ok(JsonValue::String(format!("{:?}", to_text(value)))),
            ("include" | "nindent" | "indent" | "quote", _) => Err(PreviewError::WrongArguments {
                function: name.to_string(),
                message: format!("unexpected {} argument(s)", args.len()),
            }),
            _ => Err(PreviewError::UnknownFunction(name.to_string())),
        }
    }
}

/// Go template truthiness: false, 0, nil and empty collections are false
pub fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(items) => !items.is_empty(),
        JsonValue::Object(map) => !map.is_empty(),
    }
}

/// Block structure built from the flat element list
#[derive(Debug)]
enum Node {
    Text(String),
    Output(Pipeline),
    If {
        condition: Pipeline,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
    With {
        subject: Pipeline,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

/// What ended a block
#[derive(Debug, PartialEq)]
enum Terminator {
    Else,
    End,
    Eof,
}

fn is_template_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Apply `{{-` / `-}}` to the neighbouring text
fn apply_trim_markers(mut elements: Vec<Element>) -> Vec<Element> {
    for i in 0..elements.len() {
        let (trim_left, trim_right) = match &elements[i] {
            Element::Action(action) => (action.trim_left, action.trim_right),
            Element::RawText(_) => continue,
        };
        if trim_left && i > 0 {
            if let Element::RawText(text) = &mut elements[i - 1] {
                let trimmed = text.trim_end_matches(is_template_space).len();
                text.truncate(trimmed);
            }
        }
        if trim_right {
            if let Some(Element::RawText(text)) = elements.get_mut(i + 1) {
                *text = text.trim_start_matches(is_template_space).to_string();
            }
        }
    }
    elements
}

fn build_tree(elements: Vec<Element>) -> Result<Vec<Node>> {
    let mut iter = elements.into_iter();
    let (nodes, terminator) = build_block(&mut iter)?;
    match terminator {
        Terminator::Eof => Ok(nodes),
        Terminator::Else => Err(PreviewError::UnexpectedKeyword("else")),
        Terminator::End => Err(PreviewError::UnexpectedKeyword("end")),
    }
}

fn build_block(iter: &mut impl Iterator<Item = Element>) -> Result<(Vec<Node>, Terminator)> {
    let mut nodes = Vec::new();

    while let Some(element) = iter.next() {
        let action = match element {
            Element::RawText(text) => {
                nodes.push(Node::Text(text));
                continue;
            }
            Element::Action(action) => action,
        };

        match action.body {
            ActionBody::Pipeline(pipeline) => nodes.push(Node::Output(pipeline)),
            ActionBody::Else => return Ok((nodes, Terminator::Else)),
            ActionBody::End => return Ok((nodes, Terminator::End)),
            ActionBody::If(condition) => {
                let (then, otherwise) = build_branches(iter, "if")?;
                nodes.push(Node::If {
                    condition,
                    then,
                    otherwise,
                });
            }
            ActionBody::With(subject) => {
                let (then, otherwise) = build_branches(iter, "with")?;
                nodes.push(Node::With {
                    subject,
                    then,
                    otherwise,
                });
            }
        }
    }

    Ok((nodes, Terminator::Eof))
}

fn build_branches(
    iter: &mut impl Iterator<Item = Element>,
    keyword: &'static str,
) -> Result<(Vec<Node>, Vec<Node>)> {
    let (then, terminator) = build_block(iter)?;
    match terminator {
        Terminator::End => Ok((then, Vec::new())),
        Terminator::Else => {
            let (otherwise, terminator) = build_block(iter)?;
            match terminator {
                Terminator::End => Ok((then, otherwise)),
                Terminator::Else => Err(PreviewError::UnexpectedKeyword("else")),
                Terminator::Eof => Err(PreviewError::UnclosedBlock(keyword)),
            }
        }
        Terminator::Eof => Err(PreviewError::UnclosedBlock(keyword)),
    }
}

fn eval_operand(operand: &Operand, dot: &JsonValue) -> Result<JsonValue> {
    match operand {
        Operand::Dot => Ok(dot.clone()),
        Operand::Field(path) => resolve_field(dot, path),
        Operand::Literal(Literal::String(s)) => Ok(JsonValue::String(s.clone())),
        Operand::Literal(Literal::Int(n)) => Ok(JsonValue::from(*n)),
        Operand::Literal(Literal::Bool(b)) => Ok(JsonValue::Bool(*b)),
        Operand::Identifier(name) => Err(PreviewError::WrongArguments {
            function: name.clone(),
            message: "functions can only start a command".to_string(),
        }),
    }
}

/// Follow `path` from `dot`; a missing final key is nil, a missing
/// intermediate key is a nil pointer error
fn resolve_field(dot: &JsonValue, path: &[String]) -> Result<JsonValue> {
    let mut current = dot;
    for (i, key) in path.iter().enumerate() {
        match current {
            JsonValue::Object(map) => match map.get(key) {
                Some(next) => current = next,
                None if i + 1 == path.len() => return Ok(JsonValue::Null),
                None => return Err(PreviewError::NilPointer(path[..=i].join("."))),
            },
            JsonValue::Null => return Err(PreviewError::NilPointer(path[..i].join("."))),
            other => {
                return Err(PreviewError::NotAMapping {
                    field: key.clone(),
                    kind: kind_name(other),
                });
            }
        }
    }
    Ok(current.clone())
}

fn kind_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "nil",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "list",
        JsonValue::Object(_) => "map",
    }
}

fn to_text(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => NO_VALUE.to_string(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn as_count(function: &str, value: &JsonValue) -> Result<usize> {
    value
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| PreviewError::WrongArguments {
            function: function.to_string(),
            message: format!("expected a non-negative integer, got {}", value),
        })
}

/// Helm's indent: every line, empty or not, gets the padding
fn pad_lines(text: &str, spaces: usize) -> String {
    let pad = " ".repeat(spaces);
    format!("{}{}", pad, text.replace('\n', &format!("\n{}", pad)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(value: JsonValue) -> Values {
        Values(value)
    }

    #[test]
    fn test_plain_interpolation() {
        let preview = Preview::new();
        let out = preview
            .render("replicas: {{ .Values.web.replicas }}", &values(json!({ "web": { "replicas": 3 } })))
            .unwrap();
        assert_eq!(out, "replicas: 3");
    }

    #[test]
    fn test_missing_key_prints_no_value() {
        let out = Preview::new()
            .render("x: {{ .Values.web.missing }}", &values(json!({ "web": {} })))
            .unwrap();
        assert_eq!(out, "x: <no value>");
    }

    #[test]
    fn test_missing_intermediate_is_nil_pointer() {
        let err = Preview::new()
            .render("{{ .Values.web.enabled }}", &values(json!({})))
            .unwrap_err();
        assert!(matches!(err, PreviewError::NilPointer(ref p) if p == "Values.web"));
    }

    #[test]
    fn test_field_on_scalar_fails() {
        let err = Preview::new()
            .render("{{ .Values.web.enabled }}", &values(json!({ "web": "on" })))
            .unwrap_err();
        assert!(matches!(err, PreviewError::NotAMapping { kind: "string", .. }));
    }

    #[test]
    fn test_trim_markers() {
        let out = Preview::new()
            .render("a:\n  {{- \"b\" }}  \n  {{ \"c\" -}}\n  d", &Values::new())
            .unwrap();
        assert_eq!(out, "a:b  \n  cd");
    }

    #[test]
    fn test_with_rebinds_dot_and_skips_empty() {
        let source = "{{ with .Values.a -}}\nA={{ . }}\n{{ end -}}\n{{ with .Values.b -}}\nB={{ . }}\n{{ end -}}\nrest";
        let out = Preview::new()
            .render(source, &values(json!({ "a": "1", "b": "" })))
            .unwrap();
        assert_eq!(out, "A=1\nrest");
    }

    #[test]
    fn test_if_else() {
        let source = "{{ if .Values.on }}yes{{ else }}no{{ end }}";
        let preview = Preview::new();
        assert_eq!(preview.render(source, &values(json!({ "on": true }))).unwrap(), "yes");
        assert_eq!(preview.render(source, &values(json!({ "on": false }))).unwrap(), "no");
        assert_eq!(preview.render(source, &values(json!({ "on": 0 }))).unwrap(), "no");
    }

    #[test]
    fn test_include_with_nindent() {
        let preview = Preview::new().with_helper("app.selectorLabels", "a: 1\nb: 2");
        let out = preview
            .render("labels:\n  {{- include \"app.selectorLabels\" . | nindent 4 }}", &Values::new())
            .unwrap();
        assert_eq!(out, "labels:\n    a: 1\n    b: 2");
    }

    #[test]
    fn test_unknown_include_and_function() {
        let preview = Preview::new();
        assert!(matches!(
            preview.render("{{ include \"nope\" . }}", &Values::new()).unwrap_err(),
            PreviewError::UnknownTemplate(_)
        ));
        assert!(matches!(
            preview.render("{{ toYaml . }}", &Values::new()).unwrap_err(),
            PreviewError::UnknownFunction(_)
        ));
    }

    #[test]
    fn test_quote() {
        let out = Preview::new()
            .render("{{ .Values.v | quote }}", &values(json!({ "v": "50%" })))
            .unwrap();
        assert_eq!(out, "\"50%\"");
    }

    #[test]
    fn test_unbalanced_blocks() {
        let preview = Preview::new();
        assert!(matches!(
            preview.render("{{ if true }}x", &Values::new()).unwrap_err(),
            PreviewError::UnclosedBlock("if")
        ));
        assert!(matches!(
            preview.render("x{{ end }}", &Values::new()).unwrap_err(),
            PreviewError::UnexpectedKeyword("end")
        ));
    }

    #[test]
    fn test_stub_helpers() {
        let preview = Preview::for_chart("shop");
        let out = preview
            .render("{{ include \"shop.fullname\" . }}", &Values::new())
            .unwrap();
        assert_eq!(out, "shop");
    }
}
