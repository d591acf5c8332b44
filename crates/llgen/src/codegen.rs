//! Generation of parser source code.
//!
//! The generator itself does not know the target language. The syntax of
//! the emitted code is delegated to an [`Adapter`], which provides the
//! template, renders the serialized data and translates the semantic
//! actions into handler functions.

pub mod literal;
mod template;

pub use self::{
    literal::Literal,
    template::{Placeholder, TemplateError},
};

use crate::{
    grammar::{Grammar, GrammarError, LexRuleID, ProductionID},
    predict::{AmbiguousGrammarError, InternalIterationLimitError, PredictError, PredictionSets},
    table::{ConflictPolicy, ParsingTable, TableConflictError},
};

/// The name bound to the matched text in lexer actions.
pub const MATCHED_TEXT: &str = "yytext";

/// The name bound to the result value in production actions.
pub const RESULT: &str = "$$";

/// The capability of translating action text into handler functions.
pub trait HandlerTranslator {
    /// Return the name of the function generated for a lexer rule.
    fn lex_handler_name(&self, rule: LexRuleID) -> String;

    /// Return the name of the function generated for a production.
    fn production_handler_name(&self, production: ProductionID) -> String;

    /// Translate the action of a lexer rule into a function definition.
    ///
    /// `matched_text` is the name refering the matched input in `action`.
    fn translate_lex_handler(&self, rule: LexRuleID, matched_text: &str, action: &str) -> String;

    /// Translate the action of a production into a function definition.
    ///
    /// `positional` are the names refering the values of the right-hand
    /// side symbols (`$1`, `$2`, ...) and `result` is the name of the
    /// result value.
    fn translate_production_handler(
        &self,
        production: ProductionID,
        positional: &[String],
        result: &str,
        action: &str,
    ) -> String;
}

/// The target-specific part of the code generation.
pub trait Adapter {
    /// The template text of the generated module.
    fn template_text(&self) -> &str;

    /// The built-in tokenizer, substituted into `{{{TOKENIZER}}}` unless an
    /// external one is supplied.
    fn tokenizer_template(&self) -> Option<&str> {
        None
    }

    fn translator(&self) -> &dyn HandlerTranslator;

    /// Render a literal value in the target syntax.
    fn render_literal(&self, literal: &Literal) -> String;

    /// Render the parsing table.
    fn render_table_literal(&self, table: &Literal) -> String {
        self.render_literal(table)
    }
}

impl<T: ?Sized> Adapter for &T
where
    T: Adapter,
{
    fn template_text(&self) -> &str {
        (**self).template_text()
    }

    fn tokenizer_template(&self) -> Option<&str> {
        (**self).tokenizer_template()
    }

    fn translator(&self) -> &dyn HandlerTranslator {
        (**self).translator()
    }

    fn render_literal(&self, literal: &Literal) -> String {
        (**self).render_literal(literal)
    }

    fn render_table_literal(&self, table: &Literal) -> String {
        (**self).render_table_literal(table)
    }
}

impl<T: ?Sized> Adapter for Box<T>
where
    T: Adapter,
{
    fn template_text(&self) -> &str {
        (**self).template_text()
    }

    fn tokenizer_template(&self) -> Option<&str> {
        (**self).tokenizer_template()
    }

    fn translator(&self) -> &dyn HandlerTranslator {
        (**self).translator()
    }

    fn render_literal(&self, literal: &Literal) -> String {
        (**self).render_literal(literal)
    }

    fn render_table_literal(&self, table: &Literal) -> String {
        (**self).render_table_literal(table)
    }
}

/// A tokenizer supplied by the user in place of the built-in one.
#[derive(Debug, Clone)]
pub struct ExternalTokenizer {
    source: String,
}

impl ExternalTokenizer {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// The values collected for one generation run, before they are merged into
/// the template.
#[derive(Debug)]
pub struct EmissionContext {
    pub table: Literal,
    pub productions: Literal,
    pub lex_rules: Literal,
    pub lex_handlers: Vec<(LexRuleID, String)>,
    pub production_handlers: Vec<(ProductionID, String)>,
    pub metadata: Literal,
    pub module_include: Option<String>,
    pub tokenizer: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("invalid grammar")]
    Grammar(#[from] #[source] GrammarError),

    #[error("ambiguous grammar")]
    Ambiguous(#[from] #[source] AmbiguousGrammarError),

    #[error("conflict in the parsing table")]
    TableConflict(#[from] #[source] TableConflictError),

    #[error("internal error")]
    IterationLimit(#[from] #[source] InternalIterationLimitError),

    #[error("invalid template")]
    Template(#[from] #[source] TemplateError),
}

impl From<PredictError> for GenerationError {
    fn from(err: PredictError) -> Self {
        match err {
            PredictError::Ambiguous(err) => Self::Ambiguous(err),
            PredictError::IterationLimit(err) => Self::IterationLimit(err),
        }
    }
}

/// The code generator shared by all targets.
#[derive(Debug)]
pub struct DefaultGenerator<A> {
    adapter: A,
    policy: ConflictPolicy,
    tokenizer: Option<ExternalTokenizer>,
}

impl<A> DefaultGenerator<A>
where
    A: Adapter,
{
    pub fn new(adapter: A) -> Self {
        Self {
            adapter,
            policy: ConflictPolicy::default(),
            tokenizer: None,
        }
    }

    pub fn conflict_policy(&mut self, policy: ConflictPolicy) -> &mut Self {
        self.policy = policy;
        self
    }

    /// Use the specified tokenizer instead of the adapter's built-in one.
    ///
    /// The lexer rules of the grammar are not translated in that case.
    pub fn tokenizer(&mut self, tokenizer: ExternalTokenizer) -> &mut Self {
        self.tokenizer.replace(tokenizer);
        self
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Parse the grammar source and generate the parser.
    pub fn generate_from_source(&self, source: &str) -> Result<String, GenerationError> {
        let grammar = Grammar::from_str(source)?;
        self.generate(&grammar)
    }

    /// Generate the source code of the parser.
    ///
    /// Nothing is returned unless every stage has succeeded.
    pub fn generate(&self, g: &Grammar) -> Result<String, GenerationError> {
        let span = tracing::trace_span!("generate");
        let _entered = span.enter();

        let table = {
            let span = tracing::trace_span!("validate");
            let _entered = span.enter();
            let sets = PredictionSets::compute(g, self.policy)?;
            ParsingTable::build(g, &sets, self.policy)?
        };

        let context = {
            let span = tracing::trace_span!("translate");
            let _entered = span.enter();
            self.emission_context(g, &table)
        };

        let span = tracing::trace_span!("merge");
        let _entered = span.enter();
        let output = self.merge(&context)?;
        tracing::debug!("generated {} bytes", output.len());

        Ok(output)
    }

    /// Collect the values substituted into the template.
    pub fn emission_context(&self, g: &Grammar, table: &ParsingTable) -> EmissionContext {
        let translator = self.adapter.translator();
        let custom_tokenizer = self.tokenizer.is_some();

        let mut lex_handlers = vec![];
        if !custom_tokenizer {
            for rule in g.lex_rules() {
                if let Some(action) = rule.action() {
                    let handler = translator.translate_lex_handler(rule.id(), MATCHED_TEXT, action);
                    lex_handlers.push((rule.id(), handler));
                }
            }
        }

        let mut production_handlers = vec![];
        for production in g.productions() {
            if let Some(action) = production.action() {
                let positional: Vec<String> = (1..=production.right().len())
                    .map(|i| format!("${}", i))
                    .collect();
                let handler = translator.translate_production_handler(
                    production.id(),
                    &positional,
                    RESULT,
                    action,
                );
                production_handlers.push((production.id(), handler));
            }
        }

        let table_literal = Literal::Map(
            g.nonterminals()
                .map(|n| {
                    let row = table
                        .row(n.id())
                        .map(|(t, p)| (g.terminal(t).name().to_owned(), Literal::from(p.into_raw())))
                        .collect();
                    (n.name().to_owned(), Literal::Map(row))
                })
                .collect(),
        );

        let productions: Literal = g
            .productions()
            .map(|p| {
                let handler = Literal::option(p.action(), |_| {
                    Literal::ident(translator.production_handler_name(p.id()))
                });
                Literal::List(vec![
                    Literal::str(g.nonterminal(p.left()).name()),
                    p.right()
                        .iter()
                        .map(|&s| Literal::str(g.symbol_name(s)))
                        .collect(),
                    handler,
                ])
            })
            .collect();

        let lex_rules = if custom_tokenizer {
            Literal::List(vec![])
        } else {
            g.lex_rules()
                .map(|rule| {
                    Literal::List(vec![
                        Literal::str(rule.pattern()),
                        Literal::option(rule.token(), |t| Literal::str(g.terminal(t).name())),
                        Literal::option(rule.action(), |_| {
                            Literal::ident(translator.lex_handler_name(rule.id()))
                        }),
                    ])
                })
                .collect()
        };

        let metadata = Literal::Map(vec![
            (
                "start".into(),
                Literal::str(g.nonterminal(g.start_symbol()).name()),
            ),
            (
                "terminals".into(),
                g.terminals().map(|t| Literal::str(t.name())).collect(),
            ),
            (
                "nonterminals".into(),
                g.nonterminals().map(|n| Literal::str(n.name())).collect(),
            ),
            ("custom_tokenizer".into(), custom_tokenizer.into()),
        ]);

        let tokenizer = match self.tokenizer {
            Some(ref tokenizer) => Some(tokenizer.source().to_owned()),
            None => self.adapter.tokenizer_template().map(ToOwned::to_owned),
        };

        EmissionContext {
            table: table_literal,
            productions,
            lex_rules,
            lex_handlers,
            production_handlers,
            metadata,
            module_include: g.module_include().map(ToOwned::to_owned),
            tokenizer,
        }
    }

    fn merge(&self, cx: &EmissionContext) -> Result<String, TemplateError> {
        let mut required = vec![
            Placeholder::Table,
            Placeholder::Productions,
            Placeholder::ProductionHandlers,
        ];
        match self.tokenizer {
            Some(..) => required.push(Placeholder::Tokenizer),
            None => required.extend([Placeholder::LexRules, Placeholder::LexHandlers]),
        }

        let values = [
            (
                Placeholder::Table,
                self.adapter.render_table_literal(&cx.table),
            ),
            (
                Placeholder::Productions,
                self.adapter.render_literal(&cx.productions),
            ),
            (
                Placeholder::ProductionHandlers,
                join_handlers(&cx.production_handlers),
            ),
            (
                Placeholder::LexRules,
                self.adapter.render_literal(&cx.lex_rules),
            ),
            (Placeholder::LexHandlers, join_handlers(&cx.lex_handlers)),
            (
                Placeholder::Metadata,
                self.adapter.render_literal(&cx.metadata),
            ),
            (
                Placeholder::ModuleInclude,
                cx.module_include.clone().unwrap_or_default(),
            ),
        ];

        template::merge(
            self.adapter.template_text(),
            cx.tokenizer.as_deref(),
            &required,
            &values,
        )
    }
}

fn join_handlers<I>(handlers: &[(I, String)]) -> String {
    let bodies: Vec<&str> = handlers.iter().map(|(_, body)| body.as_str()).collect();
    bodies.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::SymbolID::{self, *};
    use std::cell::Cell;

    /// Renders the literals in JSON-like syntax and counts the translations.
    struct Mock {
        template: String,
        lex_translations: Cell<usize>,
    }

    impl Mock {
        fn new(template: &str) -> Self {
            Self {
                template: template.into(),
                lex_translations: Cell::new(0),
            }
        }
    }

    impl HandlerTranslator for Mock {
        fn lex_handler_name(&self, rule: LexRuleID) -> String {
            format!("lex{}", rule)
        }

        fn production_handler_name(&self, production: ProductionID) -> String {
            format!("handle{}", production)
        }

        fn translate_lex_handler(&self, rule: LexRuleID, matched: &str, action: &str) -> String {
            self.lex_translations.set(self.lex_translations.get() + 1);
            format!("fn {}({}) {{ {} }}", self.lex_handler_name(rule), matched, action)
        }

        fn translate_production_handler(
            &self,
            production: ProductionID,
            positional: &[String],
            result: &str,
            action: &str,
        ) -> String {
            format!(
                "fn {}({}) -> {} {{ {} }}",
                self.production_handler_name(production),
                positional.join(", "),
                result,
                action
            )
        }
    }

    impl Adapter for Mock {
        fn template_text(&self) -> &str {
            &self.template
        }

        fn tokenizer_template(&self) -> Option<&str> {
            Some("rules = {{{LEX_RULES}}}\n{{{LEX_HANDLERS}}}")
        }

        fn translator(&self) -> &dyn HandlerTranslator {
            self
        }

        fn render_literal(&self, literal: &Literal) -> String {
            match literal {
                Literal::Null => "null".into(),
                Literal::Bool(b) => b.to_string(),
                Literal::Int(i) => i.to_string(),
                Literal::Str(s) => format!("{:?}", s),
                Literal::Ident(s) => s.clone(),
                Literal::List(items) => {
                    let items: Vec<_> = items.iter().map(|i| self.render_literal(i)).collect();
                    format!("[{}]", items.join(", "))
                }
                Literal::Map(entries) => {
                    let entries: Vec<_> = entries
                        .iter()
                        .map(|(k, v)| format!("{:?}: {}", k, self.render_literal(v)))
                        .collect();
                    format!("{{{}}}", entries.join(", "))
                }
            }
        }
    }

    const TEMPLATE: &str = "\
{{{MODULE_INCLUDE}}}
{{{TOKENIZER}}}
table = {{{TABLE}}}
productions = {{{PRODUCTIONS}}}
{{{PRODUCTION_HANDLERS}}}
metadata = {{{METADATA}}}
";

    fn calc() -> Grammar {
        // E -> NUM Tail ; Tail -> '+' NUM Tail | ε
        Grammar::define(|g| {
            let num = g.terminal("NUM")?;
            let plus = g.literal("+")?;
            let e = g.nonterminal("E")?;
            let tail = g.nonterminal("Tail")?;
            g.rule(e, [T(num), N(tail)], Some("$$ = $1 + $2"))?;
            g.rule(tail, [T(plus), T(num), N(tail)], Some("$$ = $2 + $3"))?;
            g.rule(tail, [] as [SymbolID; 0], Some("$$ = 0"))?;
            g.lex_rule(r"\s+", None, None)?;
            g.lex_rule("[0-9]+", Some(num), Some("yytext = int(yytext)"))?;
            g.module_include("import math");
            Ok(())
        })
        .unwrap()
    }

    #[test]
    fn smoketest() {
        let g = calc();
        let output = DefaultGenerator::new(Mock::new(TEMPLATE))
            .generate(&g)
            .unwrap();
        eprintln!("{}", output);

        assert!(output.starts_with("import math\nrules = [[\"\\\\+\", \"+\", null], "));
        assert!(output.contains(r#"["[0-9]+", "NUM", lex2]"#));
        assert!(output.contains("fn lex2(yytext) { yytext = int(yytext) }"));
        assert!(output.contains(r#"table = {"E": {"NUM": 0}, "Tail": {"+": 1, "$": 2}}"#));
        assert!(output.contains(r#"productions = [["E", ["NUM", "Tail"], handle0], "#));
        assert!(output.contains(r#"["Tail", [], handle2]"#));
        assert!(output.contains("fn handle1($1, $2, $3) -> $$ { $$ = $2 + $3 }"));
        assert!(output.contains(r#""custom_tokenizer": false"#));
        assert!(!output.contains("{{{"));
    }

    #[test]
    fn deterministic() {
        let g = calc();
        let generator = DefaultGenerator::new(Mock::new(TEMPLATE));
        let first = generator.generate(&g).unwrap();
        let second = generator.generate(&g).unwrap();
        assert_eq!(first, second);

        let other = DefaultGenerator::new(Mock::new(TEMPLATE))
            .generate(&calc())
            .unwrap();
        assert_eq!(first, other);
    }

    #[test]
    fn missing_table_marker() {
        let template = TEMPLATE.replace("{{{TABLE}}}", "");
        let err = DefaultGenerator::new(Mock::new(&template))
            .generate(&calc())
            .unwrap_err();
        assert!(
            matches!(
                err,
                GenerationError::Template(TemplateError::MissingPlaceholder(Placeholder::Table))
            ),
            "{:?}",
            err
        );
    }

    #[test]
    fn optional_markers() {
        let template = TEMPLATE
            .replace("{{{METADATA}}}", "")
            .replace("{{{MODULE_INCLUDE}}}", "");
        DefaultGenerator::new(Mock::new(&template))
            .generate(&calc())
            .unwrap();
    }

    #[test]
    fn external_tokenizer() {
        let g = calc();
        let mut generator = DefaultGenerator::new(Mock::new(TEMPLATE));
        generator.tokenizer(ExternalTokenizer::new("import mylexer"));
        let output = generator.generate(&g).unwrap();

        assert_eq!(generator.adapter().lex_translations.get(), 0);
        assert!(output.contains("\nimport mylexer\n"));
        assert!(!output.contains("rules ="));
        assert!(output.contains(r#""custom_tokenizer": true"#));

        let cx = generator.emission_context(
            &g,
            &ParsingTable::build(
                &g,
                &PredictionSets::compute(&g, ConflictPolicy::Reject).unwrap(),
                ConflictPolicy::Reject,
            )
            .unwrap(),
        );
        assert_eq!(cx.lex_rules, Literal::List(vec![]));
        assert!(cx.lex_handlers.is_empty());
        assert_eq!(cx.production_handlers.len(), 3);
    }

    #[test]
    fn external_tokenizer_without_marker() {
        let mut generator = DefaultGenerator::new(Mock::new(
            "{{{TABLE}}} {{{PRODUCTIONS}}} {{{PRODUCTION_HANDLERS}}}",
        ));
        generator.tokenizer(ExternalTokenizer::new("import mylexer"));
        let err = generator.generate(&calc()).unwrap_err();
        assert!(matches!(
            err,
            GenerationError::Template(TemplateError::MissingPlaceholder(Placeholder::Tokenizer))
        ));
    }

    #[test]
    fn table_conflict() {
        let g = Grammar::define(|g| {
            let a = g.literal("a")?;
            let b = g.literal("b")?;
            let c = g.literal("c")?;
            let s = g.nonterminal("S")?;
            g.rule(s, [a, b], None)?;
            g.rule(s, [a, c], None)?;
            Ok(())
        })
        .unwrap();

        let err = DefaultGenerator::new(Mock::new(TEMPLATE))
            .generate(&g)
            .unwrap_err();
        assert!(matches!(err, GenerationError::TableConflict(..)));

        let mut generator = DefaultGenerator::new(Mock::new(TEMPLATE));
        generator.conflict_policy(ConflictPolicy::PreferFirst);
        let output = generator.generate(&g).unwrap();
        assert!(output.contains(r#"table = {"S": {"a": 0}}"#));
    }

    #[test]
    fn ambiguous_empty_alternatives() {
        let g = Grammar::define(|g| {
            let a = g.literal("a")?;
            let s = g.nonterminal("S")?;
            let x = g.nonterminal("X")?;
            let y = g.nonterminal("Y")?;
            g.rule(s, [N(x), T(a)], None)?;
            g.rule(x, [N(y)], None)?;
            g.rule(x, [] as [SymbolID; 0], None)?;
            g.rule(y, [] as [SymbolID; 0], None)?;
            Ok(())
        })
        .unwrap();

        let err = DefaultGenerator::new(Mock::new(TEMPLATE))
            .generate(&g)
            .unwrap_err();
        assert!(matches!(err, GenerationError::Ambiguous(..)), "{:?}", err);
    }

    #[test]
    fn grammar_error() {
        let err = DefaultGenerator::new(Mock::new(TEMPLATE))
            .generate_from_source("@terminal NUM; @rule E := E \"+\" NUM;")
            .unwrap_err();
        assert!(matches!(
            err,
            GenerationError::Grammar(GrammarError::LeftRecursion { .. })
        ));
    }
}
