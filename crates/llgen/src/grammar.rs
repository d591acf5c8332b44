//! Grammar types.

use crate::{
    predict::{self, InternalIterationLimitError},
    types::{Map, Set},
    util::display_fn,
};
use std::{fmt, fs, io, marker::PhantomData, path::Path};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TerminalID {
    raw: u16,
}
impl TerminalID {
    /// Reserved symbol used as a terminal symbol that means the end of input.
    pub const EOI: Self = Self::from_raw(0);

    const OFFSET: u16 = 1;

    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }
}

#[derive(Debug)]
pub struct Terminal {
    id: TerminalID,
    name: String,
    literal: Option<String>,
}
impl Terminal {
    pub fn id(&self) -> TerminalID {
        self.id
    }

    /// The name used to refer this terminal from generated code.
    ///
    /// For literal terminals this is the literal text itself.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The literal text used for tokenization, if any.
    pub fn literal(&self) -> Option<&str> {
        self.literal.as_deref()
    }
}
impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.literal {
            Some(ref literal) => write!(f, "{:?}", literal),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NonterminalID {
    raw: u16,
}
impl NonterminalID {
    #[inline]
    const fn new(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }
}

#[derive(Debug)]
pub struct Nonterminal {
    id: NonterminalID,
    name: String,
}
impl Nonterminal {
    pub fn id(&self) -> NonterminalID {
        self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
}
impl fmt::Display for Nonterminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SymbolID {
    T(TerminalID),
    N(NonterminalID),
}
impl From<TerminalID> for SymbolID {
    fn from(id: TerminalID) -> Self {
        Self::T(id)
    }
}
impl From<NonterminalID> for SymbolID {
    fn from(id: NonterminalID) -> Self {
        Self::N(id)
    }
}

/// The stable index of a production, equal to its declaration order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ProductionID {
    raw: u16,
}
impl ProductionID {
    #[inline]
    const fn new(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }
}
impl fmt::Display for ProductionID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.raw, f)
    }
}

/// The type that represents a production rule in grammar.
#[derive(Debug)]
pub struct Production {
    id: ProductionID,
    left: NonterminalID,
    right: Vec<SymbolID>,
    action: Option<String>,
}
impl Production {
    pub fn id(&self) -> ProductionID {
        self.id
    }

    /// Return the left-hand side of this production.
    pub fn left(&self) -> NonterminalID {
        self.left
    }

    /// Return the right-hand side of this production.
    pub fn right(&self) -> &[SymbolID] {
        &self.right[..]
    }

    /// Return the semantic action attached to this production.
    ///
    /// The text is kept as written and refers `$1`, `$2`, ... for the values
    /// of right-hand side symbols and `$$` for the result.
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    // `"LHS := R1 R2 R3"`
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            write!(f, "{} :=", g.nonterminal(self.left))?;
            if self.right.is_empty() {
                return write!(f, " @empty");
            }
            for symbol in &self.right {
                write!(f, " {}", g.symbol(*symbol))?;
            }
            Ok(())
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct LexRuleID {
    raw: u16,
}
impl LexRuleID {
    #[inline]
    const fn new(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }
}
impl fmt::Display for LexRuleID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.raw, f)
    }
}

/// A token-matching rule of the tokenizer.
#[derive(Debug)]
pub struct LexRule {
    id: LexRuleID,
    pattern: String,
    token: Option<TerminalID>,
    action: Option<String>,
}
impl LexRule {
    pub fn id(&self) -> LexRuleID {
        self.id
    }

    /// The regular expression matched against the input.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The terminal produced by this rule, unless the action decides it.
    pub fn token(&self) -> Option<TerminalID> {
        self.token
    }

    /// The action text, refering the matched text as `yytext`.
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    /// Whether the matched text is discarded.
    pub fn is_skip(&self) -> bool {
        self.token.is_none() && self.action.is_none()
    }
}

/// The grammar definition used to derive the parsing tables.
#[derive(Debug)]
pub struct Grammar {
    terminals: Map<TerminalID, Terminal>,
    nonterminals: Map<NonterminalID, Nonterminal>,
    productions: Map<ProductionID, Production>,
    lex_rules: Map<LexRuleID, LexRule>,
    start_symbol: NonterminalID,
    module_include: Option<String>,
    nullables: Set<NonterminalID>,
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## terminals:")?;
        for terminal in self.terminals.values() {
            writeln!(f, "{}", terminal)?;
        }

        writeln!(f, "\n## nonterminals:")?;
        for nonterminal in self.nonterminals.values() {
            write!(f, "{}", nonterminal)?;
            if nonterminal.id() == self.start_symbol {
                write!(f, " (start)")?;
            }
            if self.is_nullable(nonterminal.id()) {
                write!(f, " (nullable)")?;
            }
            writeln!(f)?;
        }

        writeln!(f, "\n## productions:")?;
        for production in self.productions.values() {
            writeln!(f, "{}: {}", production.id(), production.display(self))?;
        }

        writeln!(f, "\n## lex rules:")?;
        for rule in self.lex_rules.values() {
            write!(f, "{}: {:?}", rule.id(), rule.pattern())?;
            match rule.token() {
                Some(t) => write!(f, " => {}", self.terminal(t))?,
                None if rule.is_skip() => write!(f, " (skip)")?,
                None => (),
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

impl Grammar {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Grammar, GrammarError> {
        let source = fs::read_to_string(path).map_err(GrammarError::IO)?;
        Self::from_str(&source)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(source: &str) -> Result<Grammar, GrammarError> {
        let grammar = crate::syntax::parse(source).map_err(GrammarError::Syntax)?;
        Grammar::define(|g| crate::syntax::define_grammar(g, grammar))
    }

    /// Define a grammar using the specified function.
    pub fn define<F>(f: F) -> Result<Self, GrammarError>
    where
        F: FnOnce(&mut GrammarDef) -> Result<(), GrammarError>,
    {
        let mut def = GrammarDef {
            terminals: Map::default(),
            nonterminals: Map::default(),
            productions: Map::default(),
            lex_rules: vec![],
            start: None,
            module_include: None,
            next_terminal_id: TerminalID::OFFSET,
            next_nonterminal_id: 0,
            next_production_id: 0,
            _marker: PhantomData,
        };

        def.terminals.insert(
            TerminalID::EOI,
            Terminal {
                id: TerminalID::EOI,
                name: "$".into(),
                literal: None,
            },
        );

        f(&mut def)?;

        def.end()
    }

    pub fn terminals(&self) -> impl Iterator<Item = &Terminal> + '_ {
        self.terminals.values()
    }

    pub fn terminal(&self, id: TerminalID) -> &Terminal {
        &self.terminals[&id]
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = &Nonterminal> + '_ {
        self.nonterminals.values()
    }

    pub fn nonterminal(&self, id: NonterminalID) -> &Nonterminal {
        &self.nonterminals[&id]
    }

    /// Return the name of a terminal or nonterminal symbol.
    pub fn symbol_name(&self, symbol: SymbolID) -> &str {
        match symbol {
            SymbolID::T(t) => self.terminal(t).name(),
            SymbolID::N(n) => self.nonterminal(n).name(),
        }
    }

    pub fn symbol(&self, symbol: SymbolID) -> impl fmt::Display + '_ {
        display_fn(move |f| match symbol {
            SymbolID::T(t) => fmt::Display::fmt(self.terminal(t), f),
            SymbolID::N(n) => fmt::Display::fmt(self.nonterminal(n), f),
        })
    }

    /// Iterate over all productions in declaration order.
    pub fn productions(&self) -> impl Iterator<Item = &Production> + '_ {
        self.productions.values()
    }

    pub fn production(&self, id: ProductionID) -> &Production {
        &self.productions[&id]
    }

    /// Iterate over the alternatives of a nonterminal, first alternative first.
    pub fn productions_of(&self, left: NonterminalID) -> impl Iterator<Item = &Production> + '_ {
        self.productions.values().filter(move |p| p.left == left)
    }

    /// Iterate over the lexer rules in priority order.
    pub fn lex_rules(&self) -> impl Iterator<Item = &LexRule> + '_ {
        self.lex_rules.values()
    }

    pub fn start_symbol(&self) -> NonterminalID {
        self.start_symbol
    }

    /// The code inserted verbatim at the top of the generated module.
    pub fn module_include(&self) -> Option<&str> {
        self.module_include.as_deref()
    }

    pub fn is_nullable(&self, id: NonterminalID) -> bool {
        self.nullables.contains(&id)
    }

    pub fn num_terminals(&self) -> usize {
        self.terminals.len()
    }

    pub fn num_nonterminals(&self) -> usize {
        self.nonterminals.len()
    }
}

/// The contextural values for building a `Grammar`.
#[derive(Debug)]
pub struct GrammarDef<'def> {
    terminals: Map<TerminalID, Terminal>,
    nonterminals: Map<NonterminalID, Nonterminal>,
    productions: Map<ProductionID, Production>,
    lex_rules: Vec<PendingLexRule>,
    start: Option<NonterminalID>,
    module_include: Option<String>,
    next_terminal_id: u16,
    next_nonterminal_id: u16,
    next_production_id: u16,
    _marker: PhantomData<&'def mut ()>,
}

#[derive(Debug)]
struct PendingLexRule {
    pattern: String,
    token: Option<TerminalID>,
    action: Option<String>,
}

impl<'def> GrammarDef<'def> {
    /// Declare a named terminal symbol used in this grammar.
    pub fn terminal(&mut self, name: &str) -> Result<TerminalID, GrammarError> {
        if !verify_ident(name) {
            return Err(GrammarError::InvalidName { name: name.into() });
        }
        self.ensure_unused(name)?;
        self.push_terminal(name.to_owned(), None)
    }

    /// Declare a terminal symbol written as a literal, such as `"+"`.
    ///
    /// Declaring the same literal twice returns the same symbol.
    pub fn literal(&mut self, text: &str) -> Result<TerminalID, GrammarError> {
        if text.is_empty() {
            return Err(GrammarError::InvalidName { name: "\"\"".into() });
        }
        if let Some(terminal) = self
            .terminals
            .values()
            .find(|t| t.literal.as_deref() == Some(text))
        {
            return Ok(terminal.id);
        }
        self.ensure_unused(text)?;
        self.push_terminal(text.to_owned(), Some(text.to_owned()))
    }

    /// Declare a nonterminal symbol used in this grammar.
    pub fn nonterminal(&mut self, name: &str) -> Result<NonterminalID, GrammarError> {
        if !verify_ident(name) {
            return Err(GrammarError::InvalidName { name: name.into() });
        }
        self.ensure_unused(name)?;

        let id = NonterminalID::new(next_id(
            &mut self.next_nonterminal_id,
            "nonterminal symbols",
        )?);
        self.nonterminals.insert(
            id,
            Nonterminal {
                id,
                name: name.to_owned(),
            },
        );
        Ok(id)
    }

    /// Look up a symbol declared so far.
    pub fn lookup(&self, name: &str) -> Option<SymbolID> {
        let terminal = self
            .terminals
            .values()
            .find(|t| t.literal.is_none() && t.name == name)
            .map(|t| SymbolID::T(t.id));
        terminal.or_else(|| {
            self.nonterminals
                .values()
                .find(|n| n.name == name)
                .map(|n| SymbolID::N(n.id))
        })
    }

    /// Specify a production rule into this grammer.
    pub fn rule<I>(
        &mut self,
        left: NonterminalID,
        right: I,
        action: Option<&str>,
    ) -> Result<ProductionID, GrammarError>
    where
        I: IntoIterator,
        I::Item: Into<SymbolID>,
    {
        let right: Vec<SymbolID> = right.into_iter().map(Into::into).collect();
        for symbol in &right {
            let known = match symbol {
                SymbolID::T(t) => self.terminals.contains_key(t),
                SymbolID::N(n) => self.nonterminals.contains_key(n),
            };
            if !known || *symbol == SymbolID::T(TerminalID::EOI) {
                return Err(GrammarError::UnknownName {
                    name: format!("{:?}", symbol),
                });
            }
        }
        if !self.nonterminals.contains_key(&left) {
            return Err(GrammarError::UnknownName {
                name: format!("{:?}", left),
            });
        }

        if let Some(reference) = action.and_then(|action| invalid_positional(action, right.len())) {
            return Err(GrammarError::InvalidPositional {
                reference,
                production: self.display_rule(left, &right).to_string(),
            });
        }

        for production in self.productions.values() {
            if production.left == left && production.right == right {
                return Err(GrammarError::DuplicateProduction {
                    production: self.display_rule(left, &right).to_string(),
                });
            }
        }

        let id = ProductionID::new(next_id(&mut self.next_production_id, "production rules")?);
        self.productions.insert(
            id,
            Production {
                id,
                left,
                right,
                action: normalize_action(action),
            },
        );

        Ok(id)
    }

    /// Append a lexer rule.
    ///
    /// Rules are tried in the order of declaration, after the implicit rules
    /// for literal terminals.
    pub fn lex_rule(
        &mut self,
        pattern: &str,
        token: Option<TerminalID>,
        action: Option<&str>,
    ) -> Result<(), GrammarError> {
        if pattern.is_empty() {
            return Err(GrammarError::InvalidLexRule {
                msg: "the pattern must not be empty".into(),
            });
        }
        if let Some(t) = token {
            if t == TerminalID::EOI || !self.terminals.contains_key(&t) {
                return Err(GrammarError::InvalidLexRule {
                    msg: format!("unknown token {:?} for the pattern {:?}", t, pattern),
                });
            }
        }
        self.lex_rules.push(PendingLexRule {
            pattern: pattern.to_owned(),
            token,
            action: normalize_action(action),
        });
        Ok(())
    }

    /// Specify the start symbol for this grammar.
    pub fn start_symbol(&mut self, symbol: NonterminalID) -> Result<(), GrammarError> {
        if !self.nonterminals.contains_key(&symbol) {
            return Err(GrammarError::UnknownName {
                name: format!("{:?}", symbol),
            });
        }
        self.start.replace(symbol);
        Ok(())
    }

    /// Specify the code inserted at the top of the generated module.
    pub fn module_include(&mut self, code: &str) {
        self.module_include = normalize_action(Some(code));
    }

    fn push_terminal(
        &mut self,
        name: String,
        literal: Option<String>,
    ) -> Result<TerminalID, GrammarError> {
        let id = TerminalID::from_raw(next_id(&mut self.next_terminal_id, "terminal symbols")?);
        self.terminals.insert(id, Terminal { id, name, literal });
        Ok(id)
    }

    fn ensure_unused(&self, name: &str) -> Result<(), GrammarError> {
        let used = self.terminals.values().any(|t| t.name == name)
            || self.nonterminals.values().any(|n| n.name == name);
        if used {
            return Err(GrammarError::DuplicateSymbol { name: name.into() });
        }
        Ok(())
    }

    fn display_rule<'a>(
        &'a self,
        left: NonterminalID,
        right: &'a [SymbolID],
    ) -> impl fmt::Display + 'a {
        display_fn(move |f| {
            write!(f, "{} :=", self.nonterminals[&left])?;
            for symbol in right {
                match symbol {
                    SymbolID::T(t) => write!(f, " {}", self.terminals[t])?,
                    SymbolID::N(n) => write!(f, " {}", self.nonterminals[n])?,
                }
            }
            Ok(())
        })
    }

    fn end(mut self) -> Result<Grammar, GrammarError> {
        // 指定されていない場合は最初に登録されたnonterminal symbolを用いる
        let start = match self.start.take() {
            Some(start) => start,
            None => self
                .nonterminals
                .keys()
                .next()
                .copied()
                .ok_or(GrammarError::EmptyGrammar)?,
        };

        for production in self.productions.values() {
            for symbol in &production.right {
                if let SymbolID::N(n) = symbol {
                    if self.productions.values().all(|p| p.left != *n) {
                        return Err(GrammarError::UndefinedSymbol {
                            symbol: self.nonterminals[n].name.clone(),
                            production: self
                                .display_rule(production.left, &production.right)
                                .to_string(),
                        });
                    }
                }
            }
        }
        if self.productions.values().all(|p| p.left != start) {
            return Err(GrammarError::MissingStartProductions {
                symbol: self.nonterminals[&start].name.clone(),
            });
        }

        let limit = predict::iteration_limit(self.nonterminals.len(), self.terminals.len());
        let productions: Vec<&Production> = self.productions.values().collect();
        let nullables = predict::nullable_set(&productions, limit)?;

        if let Some(cycle) = find_left_recursion(&self.nonterminals, &self.productions, &nullables)
        {
            return Err(GrammarError::LeftRecursion {
                cycle: cycle
                    .into_iter()
                    .map(|n| self.nonterminals[&n].name.clone())
                    .collect(),
            });
        }

        // The rules for literal terminals take precedence over the user's rules.
        let implicit = self.terminals.values().filter_map(|t| {
            t.literal.as_ref().map(|literal| PendingLexRule {
                pattern: literal_pattern(literal),
                token: Some(t.id),
                action: None,
            })
        });
        let implicit: Vec<_> = implicit.collect();
        let lex_rules = implicit
            .into_iter()
            .chain(self.lex_rules)
            .enumerate()
            .map(|(i, rule)| -> Result<_, GrammarError> {
                let id = u16::try_from(i)
                    .map(LexRuleID::new)
                    .map_err(|_| GrammarError::TooManyItems {
                        what: "lexer rules",
                    })?;
                let rule = LexRule {
                    id,
                    pattern: rule.pattern,
                    token: rule.token,
                    action: rule.action,
                };
                Ok((id, rule))
            })
            .collect::<Result<Map<_, _>, GrammarError>>()?;

        Ok(Grammar {
            terminals: self.terminals,
            nonterminals: self.nonterminals,
            productions: self.productions,
            lex_rules,
            start_symbol: start,
            module_include: self.module_include,
            nullables,
        })
    }
}

/// Search a cycle of nonterminals that can derive themselves at the leftmost
/// position, possibly through nullable prefixes.
fn find_left_recursion(
    nonterminals: &Map<NonterminalID, Nonterminal>,
    productions: &Map<ProductionID, Production>,
    nullables: &Set<NonterminalID>,
) -> Option<Vec<NonterminalID>> {
    let mut edges: Map<NonterminalID, Set<NonterminalID>> = Map::default();
    for production in productions.values() {
        for symbol in &production.right {
            match symbol {
                SymbolID::T(..) => break,
                SymbolID::N(n) => {
                    edges.entry(production.left).or_default().insert(*n);
                    if !nullables.contains(n) {
                        break;
                    }
                }
            }
        }
    }

    #[derive(Copy, Clone, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit(
        n: NonterminalID,
        edges: &Map<NonterminalID, Set<NonterminalID>>,
        marks: &mut Map<NonterminalID, Mark>,
        path: &mut Vec<NonterminalID>,
    ) -> Option<Vec<NonterminalID>> {
        match marks.get(&n) {
            Some(Mark::Done) => return None,
            Some(Mark::Visiting) => {
                let pos = path.iter().position(|m| *m == n).unwrap_or(0);
                let mut cycle = path[pos..].to_vec();
                cycle.push(n);
                return Some(cycle);
            }
            None => (),
        }

        marks.insert(n, Mark::Visiting);
        path.push(n);
        for &next in edges.get(&n).into_iter().flatten() {
            if let Some(cycle) = visit(next, edges, marks, path) {
                return Some(cycle);
            }
        }
        path.pop();
        marks.insert(n, Mark::Done);
        None
    }

    let mut marks = Map::default();
    let mut path = vec![];
    nonterminals
        .keys()
        .find_map(|&n| visit(n, &edges, &mut marks, &mut path))
}

/// Take the current value of the ID counter and advance it.
fn next_id(counter: &mut u16, what: &'static str) -> Result<u16, GrammarError> {
    let id = *counter;
    *counter = id
        .checked_add(1)
        .ok_or(GrammarError::TooManyItems { what })?;
    Ok(id)
}

/// Find a reference `$k` in the action that is out of `1..=len`.
///
/// `$$` is the result and never checked.
fn invalid_positional(action: &str, len: usize) -> Option<String> {
    let mut rest = action;
    while let Some(pos) = rest.find('$') {
        rest = &rest[pos + 1..];
        if let Some(tail) = rest.strip_prefix('$') {
            rest = tail;
            continue;
        }
        let digits = rest
            .find(|ch: char| !ch.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits == 0 {
            continue;
        }
        let in_range = rest[..digits]
            .parse::<usize>()
            .map_or(false, |k| (1..=len).contains(&k));
        if !in_range {
            return Some(format!("${}", &rest[..digits]));
        }
        rest = &rest[digits..];
    }
    None
}

fn normalize_action(action: Option<&str>) -> Option<String> {
    action
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
}

/// The pattern matching a literal terminal.
///
/// A word-like literal must not match a prefix of a longer word, e.g. the
/// keyword `let` against `letter`.
fn literal_pattern(literal: &str) -> String {
    let mut pattern = escape_pattern(literal);
    if literal.ends_with(|ch: char| ch == '_' || ch.is_alphanumeric()) {
        pattern.push_str(r"\b");
    }
    pattern
}

/// Escape the regular expression metacharacters in a literal.
fn escape_pattern(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len());
    for ch in literal.chars() {
        if matches!(
            ch,
            '\\' | '.' | '^' | '$' | '|' | '?' | '*' | '+' | '(' | ')' | '[' | ']' | '{' | '}'
        ) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("IO error: {}", _0)]
    IO(io::Error),

    #[error("Syntax error: {}", _0)]
    Syntax(anyhow::Error),

    #[error("incorrect symbol name: `{}'", name)]
    InvalidName { name: String },

    #[error("the symbol `{}' has already been declared", name)]
    DuplicateSymbol { name: String },

    #[error("unknown symbol: `{}'", name)]
    UnknownName { name: String },

    #[error("duplicate production rule detected: {}", production)]
    DuplicateProduction { production: String },

    #[error("the nonterminal `{}' used in `{}' has no production rule", symbol, production)]
    UndefinedSymbol { symbol: String, production: String },

    #[error("the start symbol `{}' has no production rule", symbol)]
    MissingStartProductions { symbol: String },

    #[error("empty nonterminal symbols")]
    EmptyGrammar,

    #[error("invalid lexer rule: {}", msg)]
    InvalidLexRule { msg: String },

    #[error("the action of `{}' refers `{}', which is out of the right-hand side", production, reference)]
    InvalidPositional { reference: String, production: String },

    #[error("too many {} in the grammar", what)]
    TooManyItems { what: &'static str },

    #[error("left recursion detected: {}", .cycle.join(" -> "))]
    LeftRecursion { cycle: Vec<String> },

    #[error(transparent)]
    IterationLimit(#[from] InternalIterationLimitError),
}

fn verify_ident(s: &str) -> bool {
    if s.is_empty() {
        // The identifier must not be empty.
        return false;
    }

    if s.bytes().all(|b| b.is_ascii_digit()) {
        // The number must not be identifer.
        return false;
    }

    let mut chars = s.chars();
    let first = chars.next().unwrap_or_default();
    if !is_ident_start(first) {
        // The identifier must be started with XID-Start.
        return false;
    }
    if chars.any(|ch| !is_ident_continue(ch)) {
        // The idenfier must be continued with XID-Continue.
        return false;
    }

    true
}

fn is_ident_start(ch: char) -> bool {
    ch == '_' || unicode_ident::is_xid_start(ch)
}

fn is_ident_continue(ch: char) -> bool {
    unicode_ident::is_xid_continue(ch)
}
