//! Syntax support for the `.llg` grammar file.

pub mod ast;
pub mod lexer;

use self::lexer::{Keyword, Lexer, Spanned, Token};
use crate::{
    grammar::{GrammarDef, GrammarError, NonterminalID, SymbolID, TerminalID},
    types::Set,
};
use lexgen_util::Loc;

pub fn parse(source: &str) -> anyhow::Result<ast::Grammar> {
    let span = tracing::trace_span!("parse");
    let _entered = span.enter();

    let tokens = Lexer::new(source)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| {
            anyhow::anyhow!(
                "{}: lexer error: {:?}",
                display_loc(err.location),
                err.kind
            )
        })?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        eoi: source.len(),
    };

    let mut stmts = vec![];
    while let Some(&(loc, token, _)) = parser.peek() {
        let stmt = match token {
            Token::Kw(Keyword::Terminal) => {
                parser.bump();
                ast::Stmt::TerminalDesc(ast::TerminalDesc {
                    idents: parser.idents()?,
                })
            }
            Token::Kw(Keyword::Nonterminal) => {
                parser.bump();
                ast::Stmt::NonterminalDesc(ast::NonterminalDesc {
                    idents: parser.idents()?,
                })
            }
            Token::Kw(Keyword::Start) => {
                parser.bump();
                ast::Stmt::StartDesc(ast::StartDesc {
                    name: parser.ident()?.to_owned(),
                })
            }
            Token::Kw(Keyword::Module) => {
                parser.bump();
                ast::Stmt::ModuleDesc(ast::ModuleDesc {
                    code: parser.code()?.to_owned(),
                })
            }
            Token::Kw(Keyword::Lex) => {
                parser.bump();
                parser.lex_desc()?
            }
            Token::Kw(Keyword::Rule) => {
                parser.bump();
                parser.rule_desc()?
            }
            token => anyhow::bail!(
                "{}: syntax error: expecting a declaration, found {:?}",
                display_loc(loc),
                token
            ),
        };
        parser.expect(Token::Semicolon)?;
        tracing::trace!(" --> {:?}", stmt);
        stmts.push(stmt);
    }

    Ok(ast::Grammar { stmts })
}

struct Parser<'input> {
    tokens: Vec<Spanned<'input>>,
    pos: usize,
    eoi: usize,
}

impl<'input> Parser<'input> {
    fn peek(&self) -> Option<&Spanned<'input>> {
        self.tokens.get(self.pos)
    }

    fn peek_token(&self) -> Option<Token<'input>> {
        self.peek().map(|(_, t, _)| *t)
    }

    fn bump(&mut self) -> Option<Token<'input>> {
        let token = self.peek_token()?;
        self.pos += 1;
        Some(token)
    }

    fn error(&self, expected: &str) -> anyhow::Error {
        match self.peek() {
            Some((loc, token, _)) => anyhow::anyhow!(
                "{}: syntax error: expecting {}, found {:?}",
                display_loc(*loc),
                expected,
                token
            ),
            None => anyhow::anyhow!(
                "syntax error: expecting {}, found end of input (at byte {})",
                expected,
                self.eoi
            ),
        }
    }

    fn expect(&mut self, expected: Token<'_>) -> anyhow::Result<()> {
        match self.peek_token() {
            Some(token) if token == expected => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(self.error(&format!("{:?}", expected))),
        }
    }

    fn ident(&mut self) -> anyhow::Result<&'input str> {
        match self.peek_token() {
            Some(Token::Ident(ident)) => {
                self.pos += 1;
                Ok(ident)
            }
            _ => Err(self.error("an identifier")),
        }
    }

    fn code(&mut self) -> anyhow::Result<&'input str> {
        match self.peek_token() {
            Some(Token::Code(code)) => {
                self.pos += 1;
                Ok(code)
            }
            _ => Err(self.error("a code block")),
        }
    }

    fn optional_code(&mut self) -> Option<String> {
        match self.peek_token() {
            Some(Token::Code(code)) => {
                self.pos += 1;
                Some(code.to_owned())
            }
            _ => None,
        }
    }

    // IDENT ("," IDENT)* ","?
    fn idents(&mut self) -> anyhow::Result<Vec<String>> {
        let mut idents = vec![self.ident()?.to_owned()];
        while self.peek_token() == Some(Token::Comma) {
            self.pos += 1;
            match self.peek_token() {
                Some(Token::Ident(ident)) => {
                    self.pos += 1;
                    idents.push(ident.to_owned());
                }
                _ => break,
            }
        }
        Ok(idents)
    }

    // STR ("=>" IDENT)? CODE?
    fn lex_desc(&mut self) -> anyhow::Result<ast::Stmt> {
        let pattern = match self.peek_token() {
            Some(Token::Str(s)) => {
                self.pos += 1;
                unescape(s)
            }
            _ => return Err(self.error("a pattern")),
        };
        let token = match self.peek_token() {
            Some(Token::FatArrow) => {
                self.pos += 1;
                Some(self.ident()?.to_owned())
            }
            _ => None,
        };
        let action = self.optional_code();
        Ok(ast::Stmt::LexDesc(ast::LexDesc {
            pattern,
            token,
            action,
        }))
    }

    // IDENT ":=" "|"? production ("|" production)*
    fn rule_desc(&mut self) -> anyhow::Result<ast::Stmt> {
        let left = self.ident()?.to_owned();
        self.expect(Token::ColonEq)?;
        if self.peek_token() == Some(Token::VertBar) {
            self.pos += 1;
        }

        let mut productions = vec![self.production()?];
        while self.peek_token() == Some(Token::VertBar) {
            self.pos += 1;
            productions.push(self.production()?);
        }

        Ok(ast::Stmt::RuleDesc(ast::RuleDesc { left, productions }))
    }

    // ("@empty" | elem+) CODE?
    fn production(&mut self) -> anyhow::Result<ast::Production> {
        let mut elems = vec![];
        if self.peek_token() == Some(Token::Kw(Keyword::Empty)) {
            self.pos += 1;
        } else {
            loop {
                match self.peek_token() {
                    Some(Token::Ident(ident)) => {
                        elems.push(ast::ProductionElem::Ident(ident.to_owned()));
                    }
                    Some(Token::Str(s)) => {
                        elems.push(ast::ProductionElem::Literal(unescape(s)));
                    }
                    _ => break,
                }
                self.pos += 1;
            }
            if elems.is_empty() {
                return Err(self.error("a symbol or @empty"));
            }
        }
        let action = self.optional_code();
        Ok(ast::Production { elems, action })
    }
}

fn display_loc(loc: Loc) -> String {
    format!("{}:{}", loc.line + 1, loc.col + 1)
}

/// Resolve `\"` in a string literal. Other backslashes are kept as they are,
/// so that the patterns are written the same as in the generated code.
fn unescape(s: &str) -> String {
    let mut unescaped = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            unescaped.push(ch);
            continue;
        }
        match chars.next() {
            Some('"') => unescaped.push('"'),
            Some(next) => {
                unescaped.push('\\');
                unescaped.push(next);
            }
            None => unescaped.push('\\'),
        }
    }
    unescaped
}

/// Register the declarations in the syntax tree into the grammar.
///
/// Declarations are applied in the order of `@module`, `@terminal`,
/// `@nonterminal`, `@rule`, `@lex` and `@start`, so they can be written in
/// any order in the file.
pub fn define_grammar(g: &mut GrammarDef<'_>, mut grammar: ast::Grammar) -> Result<(), GrammarError> {
    fn rank(stmt: &ast::Stmt) -> u8 {
        match stmt {
            ast::Stmt::ModuleDesc(..) => 0,
            ast::Stmt::TerminalDesc(..) => 1,
            ast::Stmt::NonterminalDesc(..) => 2,
            ast::Stmt::RuleDesc(..) => 3,
            ast::Stmt::LexDesc(..) => 4,
            ast::Stmt::StartDesc(..) => 5,
        }
    }
    grammar.stmts.sort_by_key(rank);

    // 規則の左辺に現れる記号は先に非終端記号として登録しておく
    let mut lefts: Set<&str> = Set::default();
    for stmt in &grammar.stmts {
        if let ast::Stmt::RuleDesc(rule) = stmt {
            lefts.insert(&rule.left);
        }
    }

    let mut left_registered = false;
    for stmt in &grammar.stmts {
        match stmt {
            ast::Stmt::ModuleDesc(ast::ModuleDesc { code }) => {
                g.module_include(code);
            }

            ast::Stmt::TerminalDesc(ast::TerminalDesc { idents }) => {
                for name in idents {
                    g.terminal(name)?;
                }
            }

            ast::Stmt::NonterminalDesc(ast::NonterminalDesc { idents }) => {
                for name in idents {
                    g.nonterminal(name)?;
                }
            }

            ast::Stmt::RuleDesc(ast::RuleDesc { left, productions }) => {
                if !left_registered {
                    for name in &lefts {
                        if g.lookup(name).is_none() {
                            g.nonterminal(name)?;
                        }
                    }
                    left_registered = true;
                }

                let left = lookup_nonterminal(g, left)?;
                for production in productions {
                    let mut right = Vec::with_capacity(production.elems.len());
                    for elem in &production.elems {
                        let symbol = match elem {
                            ast::ProductionElem::Literal(text) => SymbolID::T(g.literal(text)?),
                            ast::ProductionElem::Ident(name) => match g.lookup(name) {
                                Some(symbol) => symbol,
                                // 未登場の記号は非終端記号と解釈する
                                None => SymbolID::N(g.nonterminal(name)?),
                            },
                        };
                        right.push(symbol);
                    }
                    g.rule(left, right, production.action.as_deref())?;
                }
            }

            ast::Stmt::LexDesc(ast::LexDesc {
                pattern,
                token,
                action,
            }) => {
                let token = match token {
                    Some(name) => Some(lookup_terminal(g, name)?),
                    None => None,
                };
                g.lex_rule(pattern, token, action.as_deref())?;
            }

            ast::Stmt::StartDesc(ast::StartDesc { name }) => {
                let start = lookup_nonterminal(g, name)?;
                g.start_symbol(start)?;
            }
        }
    }

    Ok(())
}

fn lookup_terminal(g: &GrammarDef<'_>, name: &str) -> Result<TerminalID, GrammarError> {
    match g.lookup(name) {
        Some(SymbolID::T(t)) => Ok(t),
        _ => Err(GrammarError::UnknownName { name: name.into() }),
    }
}

fn lookup_nonterminal(g: &GrammarDef<'_>, name: &str) -> Result<NonterminalID, GrammarError> {
    match g.lookup(name) {
        Some(SymbolID::N(n)) => Ok(n),
        _ => Err(GrammarError::UnknownName { name: name.into() }),
    }
}
