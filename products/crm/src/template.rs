//! `{{placeholder}}` substitution for email templates.

use std::collections::{BTreeMap, BTreeSet};

use entity::{email, email_template};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("no value for placeholders: {}", .0.iter().cloned().collect::<Vec<_>>().join(", "))]
    Missing(BTreeSet<String>),
    #[error("unclosed placeholder at byte {0}")]
    Unclosed(usize),
}

/// Placeholder names in order of first appearance.
pub fn placeholders(template: &str) -> Result<Vec<String>, TemplateError> {
    let mut names = Vec::new();
    scan(template, |name| {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
        Some(String::new())
    })?;
    Ok(names)
}

/// Replace every `{{name}}` with `vars[name]`. Whitespace inside the braces is
/// ignored. Every unknown name is reported, not just the first.
pub fn render(template: &str, vars: &BTreeMap<String, String>) -> Result<String, TemplateError> {
    let mut missing = BTreeSet::new();
    let rendered = scan(template, |name| match vars.get(name) {
        Some(value) => Some(value.clone()),
        None => {
            missing.insert(name.to_string());
            None
        }
    })?;
    if missing.is_empty() {
        Ok(rendered)
    } else {
        Err(TemplateError::Missing(missing))
    }
}

/// Render a stored template into an email draft addressed to `to`.
pub fn compose(
    template: &email_template::Model,
    to: impl Into<String>,
    vars: &BTreeMap<String, String>,
) -> Result<email::Draft, TemplateError> {
    Ok(email::Draft {
        to: to.into(),
        subject: render(&template.subject, vars)?,
        body: render(&template.body, vars)?,
        template_id: Some(template.id),
        ..Default::default()
    })
}

fn scan(
    template: &str,
    mut resolve: impl FnMut(&str) -> Option<String>,
) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut offset = 0;
    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let close = after
            .find("}}")
            .ok_or(TemplateError::Unclosed(offset + open))?;
        let name = after[..close].trim();
        if let Some(value) = resolve(name) {
            out.push_str(&value);
        }
        let consumed = open + 2 + close + 2;
        offset += consumed;
        rest = &rest[consumed..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_known_placeholders() {
        let out = render(
            "Hi {{ first_name }}, your {{product}} renews soon.",
            &vars(&[("first_name", "Ada"), ("product", "Gold pack")]),
        )
        .unwrap();
        assert_eq!(out, "Hi Ada, your Gold pack renews soon.");
    }

    #[test]
    fn reports_every_unknown_placeholder() {
        let err = render("{{a}} {{b}} {{a}} {{c}}", &vars(&[("b", "x")])).unwrap_err();
        assert_eq!(err.to_string(), "no value for placeholders: a, c");
    }

    #[test]
    fn unclosed_braces_are_an_error() {
        assert_eq!(
            render("Hello {{name", &vars(&[])),
            Err(TemplateError::Unclosed(6))
        );
        assert_eq!(render("no placeholders", &vars(&[])).unwrap(), "no placeholders");
    }

    #[test]
    fn lists_placeholders_once() {
        assert_eq!(
            placeholders("{{x}}{{y}}{{ x }}").unwrap(),
            vec!["x".to_string(), "y".to_string()]
        );
    }
}
