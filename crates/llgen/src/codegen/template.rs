//! Placeholder substitution in target templates.

use std::fmt;

/// The markers substituted into a template.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Placeholder {
    /// The tokenizer code, expanded before the other markers.
    Tokenizer,
    Table,
    Productions,
    ProductionHandlers,
    LexRules,
    LexHandlers,
    Metadata,
    ModuleInclude,
}

impl Placeholder {
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Tokenizer => "{{{TOKENIZER}}}",
            Self::Table => "{{{TABLE}}}",
            Self::Productions => "{{{PRODUCTIONS}}}",
            Self::ProductionHandlers => "{{{PRODUCTION_HANDLERS}}}",
            Self::LexRules => "{{{LEX_RULES}}}",
            Self::LexHandlers => "{{{LEX_HANDLERS}}}",
            Self::Metadata => "{{{METADATA}}}",
            Self::ModuleInclude => "{{{MODULE_INCLUDE}}}",
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("the template lacks the required placeholder {}", _0)]
    MissingPlaceholder(Placeholder),
}

/// Merge the values into the template.
///
/// The tokenizer is expanded first so that the markers it contains are
/// substituted together with the rest of the template. Each marker is
/// replaced in a single pass; text coming from the values is never scanned
/// again.
pub(crate) fn merge(
    template: &str,
    tokenizer: Option<&str>,
    required: &[Placeholder],
    values: &[(Placeholder, String)],
) -> Result<String, TemplateError> {
    let expanded = substitute(
        template,
        &[(Placeholder::Tokenizer, tokenizer.unwrap_or_default())],
    );

    let missing = required.iter().find(|&&p| {
        let text = match p {
            Placeholder::Tokenizer => template,
            _ => &expanded,
        };
        !text.contains(p.marker())
    });
    if let Some(&missing) = missing {
        return Err(TemplateError::MissingPlaceholder(missing));
    }

    Ok(substitute(&expanded, values))
}

fn substitute<S: AsRef<str>>(text: &str, values: &[(Placeholder, S)]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("{{{") {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match values.iter().find(|(p, _)| tail.starts_with(p.marker())) {
            Some((p, value)) => {
                out.push_str(value.as_ref());
                rest = &tail[p.marker().len()..];
            }
            None => {
                out.push_str("{{{");
                rest = &tail[3..];
            }
        }
    }
    out.push_str(rest);
    out
}
