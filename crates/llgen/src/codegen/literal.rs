//! Language-neutral literals.

/// A value tree rendered into target source syntax by the adapters.
///
/// The serialized data (parsing table, productions, lexer rules and grammar
/// metadata) is built from these, so its structure does not depend on the
/// target language.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    /// A reference to a generated function, by name.
    Ident(String),
    List(Vec<Literal>),
    /// A string-keyed map. The entries are kept in insertion order.
    Map(Vec<(String, Literal)>),
}

impl Literal {
    pub fn str(s: impl Into<String>) -> Self {
        Self::Str(s.into())
    }

    pub fn ident(s: impl Into<String>) -> Self {
        Self::Ident(s.into())
    }

    /// Convert an optional value, mapping `None` into `Literal::Null`.
    pub fn option<T>(value: Option<T>, f: impl FnOnce(T) -> Self) -> Self {
        value.map_or(Self::Null, f)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u16> for Literal {
    fn from(value: u16) -> Self {
        Self::Int(value.into())
    }
}

impl<T: Into<Literal>> FromIterator<T> for Literal {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::List(iter.into_iter().map(Into::into).collect())
    }
}
