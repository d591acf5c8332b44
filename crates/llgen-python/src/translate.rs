//! Translation of the semantic actions into Python functions.

use llgen::{
    codegen::HandlerTranslator,
    grammar::{LexRuleID, ProductionID},
};

const INDENT: &str = "    ";

/// The name of the result variable in production handlers.
const RESULT_VAR: &str = "__";

/// Generates `_handler{id}(_1, .., _n)` for productions, with `$k` bound to
/// `_k` and `$$` to `__`, and `_lex_rule{id}()` for lexer rules, which
/// update the global `yytext` and may return the token type.
#[derive(Debug, Clone, Default)]
pub struct PyHandlerTranslator {
    _priv: (),
}

impl HandlerTranslator for PyHandlerTranslator {
    fn lex_handler_name(&self, rule: LexRuleID) -> String {
        format!("_lex_rule{}", rule)
    }

    fn production_handler_name(&self, production: ProductionID) -> String {
        format!("_handler{}", production)
    }

    fn translate_lex_handler(&self, rule: LexRuleID, matched_text: &str, action: &str) -> String {
        let mut out = format!("def {}():\n", self.lex_handler_name(rule));
        out.push_str(INDENT);
        out.push_str("global ");
        out.push_str(matched_text);
        out.push('\n');
        push_block(&mut out, action);
        out
    }

    fn translate_production_handler(
        &self,
        production: ProductionID,
        positional: &[String],
        result: &str,
        action: &str,
    ) -> String {
        let params: Vec<String> = (1..=positional.len()).map(|i| format!("_{}", i)).collect();

        let mut bindings: Vec<(&str, &str)> = vec![(result, RESULT_VAR)];
        bindings.extend(
            positional
                .iter()
                .zip(&params)
                .map(|(from, to)| (from.as_str(), to.as_str())),
        );
        let body = substitute(action, &bindings);

        let mut out = format!(
            "def {}({}):\n",
            self.production_handler_name(production),
            params.join(", ")
        );
        out.push_str(INDENT);
        out.push_str(RESULT_VAR);
        out.push_str(" = None\n");
        push_block(&mut out, &body);
        out.push_str(INDENT);
        out.push_str("return ");
        out.push_str(RESULT_VAR);
        out.push('\n');
        out
    }
}

/// Replace each occurrence of the bindings, preferring the longest one.
///
/// A binding ending with a digit matches only the whole number, so `$1` is
/// never taken from `$10`.
fn substitute(action: &str, bindings: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(action.len());
    let mut rest = action;
    while let Some(ch) = rest.chars().next() {
        let binding = bindings
            .iter()
            .filter(|(from, _)| matches_whole(rest, from))
            .max_by_key(|(from, _)| from.len());
        match binding {
            Some((from, to)) => {
                out.push_str(to);
                rest = &rest[from.len()..];
            }
            None => {
                out.push(ch);
                rest = &rest[ch.len_utf8()..];
            }
        }
    }
    out
}

fn matches_whole(text: &str, pattern: &str) -> bool {
    let Some(tail) = text.strip_prefix(pattern) else {
        return false;
    };
    let ends_with_digit = pattern.ends_with(|ch: char| ch.is_ascii_digit());
    !(ends_with_digit && tail.starts_with(|ch: char| ch.is_ascii_digit()))
}

/// Append the action as an indented function body.
///
/// The first line of the action starts just after `%{`, so the common
/// indentation is computed from the following lines.
fn push_block(out: &mut String, action: &str) {
    let mut lines = action.lines();
    let first = lines.next().unwrap_or_default();
    let rest: Vec<&str> = lines.collect();

    let common = rest
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let first = first.trim();
    if !first.is_empty() {
        out.push_str(INDENT);
        out.push_str(first);
        out.push('\n');
    }
    for line in rest {
        if line.trim().is_empty() {
            out.push('\n');
            continue;
        }
        out.push_str(INDENT);
        let line = line.get(common..).unwrap_or_else(|| line.trim_start());
        out.push_str(line.trim_end());
        out.push('\n');
    }
}
