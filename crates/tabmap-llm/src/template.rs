//! Prompt templates with `{name}` placeholders.
//!
//! `{{` and `}}` render as literal braces, so JSON samples can be written
//! into a template verbatim.

use std::collections::BTreeMap;

use crate::error::TemplateError;

/// Values bound to template placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables(BTreeMap<String, String>);

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    source: String,
}

impl PromptTemplate {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Placeholder names in order of first appearance.
    pub fn placeholders(&self) -> Result<Vec<String>, TemplateError> {
        let mut names = Vec::new();
        self.walk(|segment| {
            if let Segment::Placeholder(name) = segment {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
            Ok(())
        })?;
        Ok(names)
    }

    pub fn render(&self, variables: &Variables) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(self.source.len());
        self.walk(|segment| {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    let value = variables
                        .get(name)
                        .ok_or_else(|| TemplateError::MissingVariable(name.to_string()))?;
                    out.push_str(value);
                }
            }
            Ok(())
        })?;
        Ok(out)
    }

    fn walk<'a>(
        &'a self,
        mut visit: impl FnMut(Segment<'a>) -> Result<(), TemplateError>,
    ) -> Result<(), TemplateError> {
        let source = self.source.as_str();
        let bytes = source.as_bytes();
        let mut literal_start = 0;
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'{' if bytes.get(i + 1) == Some(&b'{') => {
                    visit(Segment::Literal(&source[literal_start..=i]))?;
                    i += 2;
                    literal_start = i;
                }
                b'}' if bytes.get(i + 1) == Some(&b'}') => {
                    visit(Segment::Literal(&source[literal_start..=i]))?;
                    i += 2;
                    literal_start = i;
                }
                b'{' => {
                    let close = source[i + 1..]
                        .find('}')
                        .ok_or(TemplateError::UnclosedPlaceholder { position: i })?;
                    let name = &source[i + 1..i + 1 + close];
                    if name.is_empty()
                        || !name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
                    {
                        return Err(TemplateError::InvalidPlaceholder {
                            name: name.to_string(),
                        });
                    }
                    visit(Segment::Literal(&source[literal_start..i]))?;
                    visit(Segment::Placeholder(name))?;
                    i += close + 2;
                    literal_start = i;
                }
                b'}' => return Err(TemplateError::UnmatchedBrace { position: i }),
                _ => i += 1,
            }
        }
        visit(Segment::Literal(&source[literal_start..]))
    }
}

enum Segment<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_placeholders_and_escapes() {
        let template = PromptTemplate::new("Keys: {columns}\nExample: {{\"a\": 1}}");
        let rendered = template
            .render(&Variables::new().with("columns", "id, name"))
            .unwrap();
        assert_eq!(rendered, "Keys: id, name\nExample: {\"a\": 1}");
    }

    #[test]
    fn missing_variable_is_an_error() {
        let template = PromptTemplate::new("Row: {row}");
        assert_eq!(
            template.render(&Variables::new()),
            Err(TemplateError::MissingVariable("row".to_string()))
        );
    }

    #[test]
    fn rejects_malformed_templates() {
        assert_eq!(
            PromptTemplate::new("oops {row").render(&Variables::new()),
            Err(TemplateError::UnclosedPlaceholder { position: 5 })
        );
        assert_eq!(
            PromptTemplate::new("oops }").render(&Variables::new()),
            Err(TemplateError::UnmatchedBrace { position: 5 })
        );
        assert!(matches!(
            PromptTemplate::new("{not valid}").render(&Variables::new()),
            Err(TemplateError::InvalidPlaceholder { .. })
        ));
    }

    #[test]
    fn lists_placeholders_once() {
        let template = PromptTemplate::new("{a} {b} {a}");
        assert_eq!(template.placeholders().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn values_are_not_reinterpreted() {
        let template = PromptTemplate::new("{row}");
        let rendered = template
            .render(&Variables::new().with("row", "{\"x\": \"{y}\"}"))
            .unwrap();
        assert_eq!(rendered, "{\"x\": \"{y}\"}");
    }
}
