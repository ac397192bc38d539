//! Parser for the previewed template subset, built on pest

use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

use super::ast::*;
use super::{PreviewError, Result};

#[derive(Parser)]
#[grammar = "preview/template.pest"]
struct TemplateParser;

/// Parse template text into an AST
pub fn parse(input: &str) -> Result<Template> {
    let pairs = TemplateParser::parse(Rule::template, input)?;

    let mut elements = Vec::new();
    for pair in pairs.flat_map(|p| p.into_inner()) {
        match pair.as_rule() {
            Rule::raw_text => elements.push(Element::RawText(pair.as_str().to_string())),
            Rule::action => elements.push(Element::Action(parse_action(pair)?)),
            _ => {}
        }
    }

    Ok(Template { elements })
}

fn parse_action(pair: Pair<Rule>) -> Result<Action> {
    let mut trim_left = false;
    let mut trim_right = false;
    let mut body = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::action_start => trim_left = inner.as_str().ends_with('-'),
            Rule::action_end => trim_right = inner.as_str().starts_with('-'),
            Rule::if_action => body = Some(ActionBody::If(inner_pipeline(inner)?)),
            Rule::with_action => body = Some(ActionBody::With(inner_pipeline(inner)?)),
            Rule::else_action => body = Some(ActionBody::Else),
            Rule::end_action => body = Some(ActionBody::End),
            Rule::pipeline => body = Some(ActionBody::Pipeline(parse_pipeline(inner)?)),
            other => return Err(PreviewError::UnexpectedRule(format!("{:?}", other))),
        }
    }

    let body = body.ok_or_else(|| PreviewError::UnexpectedRule("empty action".to_string()))?;
    Ok(Action {
        trim_left,
        trim_right,
        body,
    })
}

fn inner_pipeline(pair: Pair<Rule>) -> Result<Pipeline> {
    pair.into_inner()
        .find(|p| p.as_rule() == Rule::pipeline)
        .map(parse_pipeline)
        .unwrap_or_else(|| Err(PreviewError::UnexpectedRule("missing pipeline".to_string())))
}

fn parse_pipeline(pair: Pair<Rule>) -> Result<Pipeline> {
    let commands = pair
        .into_inner()
        .filter(|p| p.as_rule() == Rule::command)
        .map(parse_command)
        .collect::<Result<Vec<_>>>()?;
    Ok(Pipeline { commands })
}

fn parse_command(pair: Pair<Rule>) -> Result<Command> {
    let operands = pair
        .into_inner()
        .map(parse_operand)
        .collect::<Result<Vec<_>>>()?;
    Ok(Command { operands })
}

fn parse_operand(pair: Pair<Rule>) -> Result<Operand> {
    let text = pair.as_str();
    match pair.as_rule() {
        Rule::field => Ok(Operand::Field(
            text.trim_start_matches('.')
                .split('.')
                .map(str::to_string)
                .collect(),
        )),
        Rule::dot => Ok(Operand::Dot),
        Rule::string_literal => Ok(Operand::Literal(Literal::String(parse_string_literal(text)?))),
        Rule::number => text
            .parse::<i64>()
            .map(|n| Operand::Literal(Literal::Int(n)))
            .map_err(|_| PreviewError::InvalidNumber(text.to_string())),
        Rule::boolean => Ok(Operand::Literal(Literal::Bool(text == "true"))),
        Rule::identifier => Ok(Operand::Identifier(text.to_string())),
        other => Err(PreviewError::UnexpectedRule(format!("{:?}", other))),
    }
}

fn parse_string_literal(text: &str) -> Result<String> {
    let inner = text
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or_else(|| PreviewError::InvalidString(text.to_string()))?;

    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('"') => result.push('"'),
            Some('\\') => result.push('\\'),
            _ => return Err(PreviewError::InvalidString(text.to_string())),
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actions(input: &str) -> Vec<Action> {
        parse(input)
            .unwrap()
            .elements
            .into_iter()
            .filter_map(|e| match e {
                Element::Action(a) => Some(a),
                Element::RawText(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_parse_text_only() {
        let template = parse("kind: Service\n").unwrap();
        assert_eq!(template.elements, vec![Element::RawText("kind: Service\n".to_string())]);
    }

    #[test]
    fn test_parse_with_and_trim_markers() {
        let parsed = actions("{{ with .Values.pdb.minAvailable -}}x{{ end -}}");
        assert_eq!(parsed.len(), 2);
        assert!(!parsed[0].trim_left);
        assert!(parsed[0].trim_right);
        assert_eq!(
            parsed[0].body,
            ActionBody::With(Pipeline {
                commands: vec![Command {
                    operands: vec![Operand::Field(vec![
                        "Values".to_string(),
                        "pdb".to_string(),
                        "minAvailable".to_string(),
                    ])],
                }],
            })
        );
        assert_eq!(parsed[1].body, ActionBody::End);
    }

    #[test]
    fn test_parse_include_pipeline() {
        let parsed = actions("{{- include \"app.selectorLabels\" . | nindent 6 }}");
        assert!(parsed[0].trim_left);
        assert!(!parsed[0].trim_right);
        let ActionBody::Pipeline(pipeline) = &parsed[0].body else {
            panic!("expected pipeline, got {:?}", parsed[0].body);
        };
        assert_eq!(pipeline.commands.len(), 2);
        assert_eq!(
            pipeline.commands[0].operands,
            vec![
                Operand::Identifier("include".to_string()),
                Operand::Literal(Literal::String("app.selectorLabels".to_string())),
                Operand::Dot,
            ]
        );
        assert_eq!(
            pipeline.commands[1].operands,
            vec![Operand::Identifier("nindent".to_string()), Operand::Literal(Literal::Int(6))]
        );
    }

    #[test]
    fn test_keywords_need_boundaries() {
        let parsed = actions("{{ endpoint }}{{ else }}{{ true }}");
        assert_eq!(
            parsed[0].body,
            ActionBody::Pipeline(Pipeline {
                commands: vec![Command {
                    operands: vec![Operand::Identifier("endpoint".to_string())],
                }],
            })
        );
        assert_eq!(parsed[1].body, ActionBody::Else);
        assert_eq!(
            parsed[2].body,
            ActionBody::Pipeline(Pipeline {
                commands: vec![Command {
                    operands: vec![Operand::Literal(Literal::Bool(true))],
                }],
            })
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(parse_string_literal(r#""a\"b\n""#).unwrap(), "a\"b\n");
        assert!(parse_string_literal(r#""bad\q""#).is_err());
    }

    #[test]
    fn test_unterminated_action_is_an_error() {
        assert!(parse("name: {{ .Values.name").is_err());
    }
}
