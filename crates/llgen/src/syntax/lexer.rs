//! Lexer implementation.

use lexgen_util::Loc;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Token<'input> {
    ColonEq,
    FatArrow,
    Comma,
    Semicolon,
    VertBar,
    Kw(Keyword),
    Ident(&'input str),
    /// The contents of a string literal, without the quotes.
    Str(&'input str),
    /// The contents of a `%{ ... %}` block, without the delimiters.
    Code(&'input str),
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Keyword {
    Terminal,
    Nonterminal,
    Lex,
    Start,
    Rule,
    Module,
    Empty,
}

pub type Spanned<'input> = (Loc, Token<'input>, Loc);

#[derive(Debug, Default)]
pub struct LexerState {
    comment_depth: usize,
}

lexgen::lexer! {
    pub Lexer(LexerState) -> Token<'input>;

    let whitespace = [' ' '\t' '\r' '\n'];
    let newline = '\r'* '\n' | '\r';
    let ident = ($$XID_Start | '_') $$XID_Continue*;

    rule Init {
        $whitespace+,
        "//" => |lexer| {
            lexer.switch(LexerRule::LineComment)
        },
        "/*" => |lexer| {
            lexer.state().comment_depth += 1;
            lexer.switch(LexerRule::BlockComment)
        },
        "%{" => |lexer| {
            lexer.switch(LexerRule::Code)
        },
        ":=" = Token::ColonEq,
        "=>" = Token::FatArrow,
        "," = Token::Comma,
        ";" = Token::Semicolon,
        "|" = Token::VertBar,
        "@terminal" = Token::Kw(Keyword::Terminal),
        "@nonterminal" = Token::Kw(Keyword::Nonterminal),
        "@lex" = Token::Kw(Keyword::Lex),
        "@start" = Token::Kw(Keyword::Start),
        "@rule" = Token::Kw(Keyword::Rule),
        "@module" = Token::Kw(Keyword::Module),
        "@empty" = Token::Kw(Keyword::Empty),
        '"' ((_ # ['"' '\\']) | ('\\' _))* '"' => |lexer| {
            let matched = lexer.match_();
            let token = Token::Str(&matched[1..matched.len() - 1]);
            lexer.return_(token)
        },
        $ident => |lexer| {
            let token = Token::Ident(lexer.match_());
            lexer.return_(token)
        },
    }

    rule LineComment {
        $newline => |lexer| {
            lexer.reset_match();
            lexer.switch(LexerRule::Init)
        },
        _,
    }

    rule BlockComment {
        "/*" => |lexer| {
            lexer.state().comment_depth += 1;
            lexer.continue_()
        },
        "*/" => |lexer| {
            let depth = &mut lexer.state().comment_depth;
            if *depth == 1 {
                *depth = 0;
                lexer.reset_match();
                lexer.switch(LexerRule::Init)
            } else {
                *depth -= 1;
                lexer.continue_()
            }
        },
        _,
    }

    rule Code {
        "%}" => |lexer| {
            let matched = lexer.match_();
            let token = Token::Code(&matched[2..matched.len() - 2]);
            lexer.switch_and_return(LexerRule::Init, token)
        },
        _ => |lexer| lexer.continue_(),
    }
}
