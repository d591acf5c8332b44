//! Python target for llgen.

mod translate;

pub use crate::translate::PyHandlerTranslator;

use llgen::codegen::{Adapter, HandlerTranslator, Literal};

/// The bundled template of the generated module.
pub const TEMPLATE: &str = include_str!("../templates/ll.template.py");

/// The bundled regex-based tokenizer.
pub const TOKENIZER_TEMPLATE: &str = include_str!("../templates/tokenizer.template.py");

/// The file extension of the generated module.
pub const EXTENSION: &str = "py";

#[derive(Debug, Clone)]
pub struct PythonAdapter {
    template: String,
    tokenizer_template: String,
    translator: PyHandlerTranslator,
}

impl Default for PythonAdapter {
    fn default() -> Self {
        Self::new(TEMPLATE, TOKENIZER_TEMPLATE)
    }
}

impl PythonAdapter {
    pub fn new(template: impl Into<String>, tokenizer_template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            tokenizer_template: tokenizer_template.into(),
            translator: PyHandlerTranslator::default(),
        }
    }

    /// Replace the module template, keeping the bundled tokenizer.
    pub fn with_template(template: impl Into<String>) -> Self {
        Self::new(template, TOKENIZER_TEMPLATE)
    }
}

impl Adapter for PythonAdapter {
    fn template_text(&self) -> &str {
        &self.template
    }

    fn tokenizer_template(&self) -> Option<&str> {
        Some(&self.tokenizer_template)
    }

    fn translator(&self) -> &dyn HandlerTranslator {
        &self.translator
    }

    fn render_literal(&self, literal: &Literal) -> String {
        let mut out = String::new();
        render(&mut out, literal);
        out
    }

    /// One row per line.
    fn render_table_literal(&self, table: &Literal) -> String {
        let rows = match table {
            Literal::Map(rows) if !rows.is_empty() => rows,
            literal => return self.render_literal(literal),
        };
        let mut out = String::from("{\n");
        for (name, row) in rows {
            out.push_str("    ");
            render_str(&mut out, name);
            out.push_str(": ");
            render(&mut out, row);
            out.push_str(",\n");
        }
        out.push('}');
        out
    }
}

fn render(out: &mut String, literal: &Literal) {
    match literal {
        Literal::Null => out.push_str("None"),
        Literal::Bool(true) => out.push_str("True"),
        Literal::Bool(false) => out.push_str("False"),
        Literal::Int(i) => out.push_str(&i.to_string()),
        Literal::Str(s) => render_str(out, s),
        Literal::Ident(ident) => out.push_str(ident),
        Literal::List(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                render(out, item);
            }
            out.push(']');
        }
        Literal::Map(entries) => {
            out.push('{');
            for (i, (key, value)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                render_str(out, key);
                out.push_str(": ");
                render(out, value);
            }
            out.push('}');
        }
    }
}

// A single-quoted string literal.
fn render_str(out: &mut String, s: &str) {
    out.push('\'');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ch if ch.is_ascii_control() => out.push_str(&format!("\\x{:02x}", ch as u32)),
            ch => out.push(ch),
        }
    }
    out.push('\'');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals() {
        let adapter = PythonAdapter::default();
        let literal = Literal::List(vec![
            Literal::Null,
            Literal::Bool(true),
            Literal::Bool(false),
            Literal::Int(-3),
            Literal::str(r"\s+"),
            Literal::str("it's\n\t\x01"),
            Literal::ident("_handler0"),
            Literal::Map(vec![("$".into(), Literal::Int(2))]),
            Literal::Map(vec![]),
        ]);
        assert_eq!(
            adapter.render_literal(&literal),
            r"[None, True, False, -3, '\\s+', 'it\'s\n\t\x01', _handler0, {'$': 2}, {}]"
        );
    }

    #[test]
    fn table_literal() {
        let adapter = PythonAdapter::default();
        let table = Literal::Map(vec![
            (
                "E".into(),
                Literal::Map(vec![("NUM".into(), Literal::Int(0))]),
            ),
            (
                "Tail".into(),
                Literal::Map(vec![
                    ("+".into(), Literal::Int(1)),
                    ("$".into(), Literal::Int(2)),
                ]),
            ),
        ]);
        assert_eq!(
            adapter.render_table_literal(&table),
            "{\n    'E': {'NUM': 0},\n    'Tail': {'+': 1, '$': 2},\n}"
        );
        assert_eq!(adapter.render_table_literal(&Literal::Map(vec![])), "{}");
    }

    #[test]
    fn bundled_templates() {
        for marker in [
            "{{{TABLE}}}",
            "{{{PRODUCTIONS}}}",
            "{{{PRODUCTION_HANDLERS}}}",
            "{{{TOKENIZER}}}",
        ] {
            assert!(TEMPLATE.contains(marker), "{}", marker);
        }
        assert!(TOKENIZER_TEMPLATE.contains("{{{LEX_RULES}}}"));
        assert!(TOKENIZER_TEMPLATE.contains("{{{LEX_HANDLERS}}}"));
    }
}
