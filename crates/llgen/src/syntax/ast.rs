#[derive(Debug)]
pub struct Grammar {
    pub stmts: Vec<Stmt>,
}

#[derive(Debug)]
pub enum Stmt {
    TerminalDesc(TerminalDesc),
    NonterminalDesc(NonterminalDesc),
    RuleDesc(RuleDesc),
    LexDesc(LexDesc),
    StartDesc(StartDesc),
    ModuleDesc(ModuleDesc),
}

#[derive(Debug)]
pub struct TerminalDesc {
    pub idents: Vec<String>,
}

#[derive(Debug)]
pub struct NonterminalDesc {
    pub idents: Vec<String>,
}

#[derive(Debug)]
pub struct RuleDesc {
    pub left: String,
    pub productions: Vec<Production>,
}

#[derive(Debug)]
pub struct LexDesc {
    pub pattern: String,
    pub token: Option<String>,
    pub action: Option<String>,
}

#[derive(Debug)]
pub struct StartDesc {
    pub name: String,
}

#[derive(Debug)]
pub struct ModuleDesc {
    pub code: String,
}

#[derive(Debug)]
pub struct Production {
    pub elems: Vec<ProductionElem>,
    pub action: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum ProductionElem {
    Ident(String),
    Literal(String),
}
