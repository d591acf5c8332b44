//! Calculation of the LL(1) parsing table.

use crate::{
    grammar::{Grammar, NonterminalID, ProductionID, TerminalID},
    predict::PredictionSets,
    types::Map,
    util::display_fn,
};
use std::fmt;

/// How to handle two productions competing for a table cell.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Fail the table construction.
    #[default]
    Reject,

    /// Keep the alternative declared first.
    PreferFirst,
}

#[derive(Debug, thiserror::Error)]
#[error(
    "conflict on ({}, {}) between `{}' (#{}) and `{}' (#{})",
    nonterminal,
    terminal,
    existing_rule,
    existing,
    conflicting_rule,
    conflicting
)]
pub struct TableConflictError {
    pub nonterminal: String,
    pub terminal: String,
    pub existing: ProductionID,
    pub existing_rule: String,
    pub conflicting: ProductionID,
    pub conflicting_rule: String,
}

/// A conflict settled by [`ConflictPolicy::PreferFirst`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConflict {
    pub nonterminal: NonterminalID,
    pub terminal: TerminalID,
    pub kept: ProductionID,
    pub dropped: ProductionID,
}

/// The deterministic mapping `(nonterminal, lookahead) -> production`.
#[derive(Debug)]
pub struct ParsingTable {
    rows: Map<NonterminalID, Map<TerminalID, ProductionID>>,
    resolved: Vec<ResolvedConflict>,
}

impl ParsingTable {
    pub fn build(
        g: &Grammar,
        sets: &PredictionSets,
        policy: ConflictPolicy,
    ) -> Result<Self, TableConflictError> {
        let span = tracing::trace_span!("table");
        let _entered = span.enter();

        let mut rows: Map<NonterminalID, Map<TerminalID, ProductionID>> = g
            .nonterminals()
            .map(|n| (n.id(), Map::default()))
            .collect();
        let mut resolved = vec![];

        for production in g.productions() {
            let left = production.left();
            // First(α), plus Follow(N) when α is nullable.
            let lookaheads = sets.predict(production);
            let row = &mut rows[&left];

            for t in lookaheads.iter() {
                let existing = match row.get(&t).copied() {
                    None => {
                        row.insert(t, production.id());
                        continue;
                    }
                    Some(existing) => existing,
                };

                match policy {
                    ConflictPolicy::Reject => {
                        return Err(TableConflictError {
                            nonterminal: g.nonterminal(left).to_string(),
                            terminal: g.terminal(t).to_string(),
                            existing,
                            existing_rule: g.production(existing).display(g).to_string(),
                            conflicting: production.id(),
                            conflicting_rule: production.display(g).to_string(),
                        });
                    }
                    ConflictPolicy::PreferFirst => {
                        tracing::warn!(
                            "conflict on ({}, {}): keep `{}', drop `{}'",
                            g.nonterminal(left),
                            g.terminal(t),
                            g.production(existing).display(g),
                            production.display(g),
                        );
                        resolved.push(ResolvedConflict {
                            nonterminal: left,
                            terminal: t,
                            kept: existing,
                            dropped: production.id(),
                        });
                    }
                }
            }
        }

        let table = Self { rows, resolved };
        tracing::debug!("parsing table has {} entries", table.len());
        Ok(table)
    }

    /// Return the production to expand for the nonterminal on the lookahead.
    pub fn get(&self, nonterminal: NonterminalID, lookahead: TerminalID) -> Option<ProductionID> {
        self.rows.get(&nonterminal)?.get(&lookahead).copied()
    }

    /// Iterate over the populated cells of a nonterminal's row.
    pub fn row(
        &self,
        nonterminal: NonterminalID,
    ) -> impl Iterator<Item = (TerminalID, ProductionID)> + '_ {
        self.rows
            .get(&nonterminal)
            .into_iter()
            .flat_map(|row| row.iter().map(|(&t, &p)| (t, p)))
    }

    /// Iterate over all populated cells, row by row.
    pub fn entries(&self) -> impl Iterator<Item = (NonterminalID, TerminalID, ProductionID)> + '_ {
        self.rows
            .iter()
            .flat_map(|(&n, row)| row.iter().map(move |(&t, &p)| (n, t, p)))
    }

    pub fn len(&self) -> usize {
        self.rows.values().map(|row| row.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn resolved_conflicts(&self) -> &[ResolvedConflict] {
        &self.resolved[..]
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (i, (&n, row)) in self.rows.iter().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }
                writeln!(f, "#### {}", g.nonterminal(n))?;
                for (&t, &p) in row {
                    writeln!(f, "- {} => {}", g.terminal(t), g.production(p).display(g))?;
                }
            }
            for conflict in &self.resolved {
                writeln!(
                    f,
                    "## resolved conflict on ({}, {}): kept #{}, dropped #{}",
                    g.nonterminal(conflict.nonterminal),
                    g.terminal(conflict.terminal),
                    conflict.kept,
                    conflict.dropped,
                )?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::SymbolID::{self, *};

    fn build(g: &Grammar, policy: ConflictPolicy) -> Result<ParsingTable, TableConflictError> {
        let sets = PredictionSets::compute(g, policy).unwrap();
        ParsingTable::build(g, &sets, policy)
    }

    fn terminal(g: &Grammar, name: &str) -> TerminalID {
        g.terminals().find(|t| t.name() == name).unwrap().id()
    }

    fn nonterminal(g: &Grammar, name: &str) -> NonterminalID {
        g.nonterminals().find(|n| n.name() == name).unwrap().id()
    }

    #[test]
    fn nullable_prefix() {
        // S -> A 'b' ; A -> 'a' | ε
        let g = Grammar::define(|g| {
            let a = g.literal("a")?;
            let b = g.literal("b")?;
            let s = g.nonterminal("S")?;
            let a_ = g.nonterminal("A")?;
            g.rule(s, [N(a_), T(b)], None)?;
            g.rule(a_, [T(a)], None)?;
            g.rule(a_, [] as [SymbolID; 0], None)?;
            Ok(())
        })
        .unwrap();
        let table = build(&g, ConflictPolicy::Reject).unwrap();
        eprintln!("{}", table.display(&g));

        let (s, a_) = (nonterminal(&g, "S"), nonterminal(&g, "A"));
        let (a, b) = (terminal(&g, "a"), terminal(&g, "b"));
        let ids: Vec<_> = g.productions().map(|p| p.id()).collect();

        assert_eq!(table.len(), 4);
        assert_eq!(table.get(s, a), Some(ids[0]));
        assert_eq!(table.get(s, b), Some(ids[0]));
        assert_eq!(table.get(a_, a), Some(ids[1]));
        assert_eq!(table.get(a_, b), Some(ids[2]));
        assert_eq!(table.get(s, TerminalID::EOI), None);
        assert!(table.resolved_conflicts().is_empty());
    }

    #[test]
    fn first_first_conflict() {
        // S -> 'a' 'b' | 'a' 'c'
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

        let err = build(&g, ConflictPolicy::Reject).unwrap_err();
        let ids: Vec<_> = g.productions().map(|p| p.id()).collect();
        assert_eq!(err.nonterminal, "S");
        assert_eq!(err.terminal, "\"a\"");
        assert_eq!(err.existing, ids[0]);
        assert_eq!(err.conflicting, ids[1]);
        assert_eq!(err.existing_rule, "S := \"a\" \"b\"");
        assert_eq!(err.conflicting_rule, "S := \"a\" \"c\"");
    }

    #[test]
    fn first_follow_conflict() {
        // S -> A 'a' ; A -> 'a' | ε
        let g = Grammar::define(|g| {
            let a = g.literal("a")?;
            let s = g.nonterminal("S")?;
            let a_ = g.nonterminal("A")?;
            g.rule(s, [N(a_), T(a)], None)?;
            g.rule(a_, [T(a)], None)?;
            g.rule(a_, [] as [SymbolID; 0], None)?;
            Ok(())
        })
        .unwrap();

        let err = build(&g, ConflictPolicy::Reject).unwrap_err();
        assert_eq!(err.nonterminal, "A");
        assert!(err.conflicting_rule.ends_with("@empty"));

        let table = build(&g, ConflictPolicy::PreferFirst).unwrap();
        let ids: Vec<_> = g.productions().map(|p| p.id()).collect();
        let (a_, a) = (nonterminal(&g, "A"), terminal(&g, "a"));
        assert_eq!(table.get(a_, a), Some(ids[1]));
        assert_eq!(
            table.resolved_conflicts(),
            [ResolvedConflict {
                nonterminal: a_,
                terminal: a,
                kept: ids[1],
                dropped: ids[2],
            }]
        );
    }

    #[test]
    fn one_entry_per_prediction() {
        // E -> T Tail ; Tail -> '+' T Tail | ε ; T -> NUM | '(' E ')'
        let g = Grammar::define(|g| {
            let plus = g.literal("+")?;
            let lparen = g.literal("(")?;
            let rparen = g.literal(")")?;
            let num = g.terminal("NUM")?;
            let e = g.nonterminal("E")?;
            let tail = g.nonterminal("Tail")?;
            let t = g.nonterminal("T")?;
            g.rule(e, [N(t), N(tail)], None)?;
            g.rule(tail, [T(plus), N(t), N(tail)], None)?;
            g.rule(tail, [] as [SymbolID; 0], None)?;
            g.rule(t, [num], None)?;
            g.rule(t, [T(lparen), N(e), T(rparen)], None)?;
            Ok(())
        })
        .unwrap();
        let sets = PredictionSets::compute(&g, ConflictPolicy::Reject).unwrap();
        let table = ParsingTable::build(&g, &sets, ConflictPolicy::Reject).unwrap();

        let expected: usize = g.productions().map(|p| sets.predict(p).len()).sum();
        assert_eq!(table.len(), expected);

        for production in g.productions() {
            for t in sets.predict(production).iter() {
                assert_eq!(table.get(production.left(), t), Some(production.id()));
            }
        }

        // only nullable nonterminals have entries for the empty alternatives.
        for (n, t, p) in table.entries() {
            if sets.first_of(g.production(p).right()).1 {
                assert!(sets.is_nullable(n));
                assert!(sets.follow(n).contains(t));
            }
        }
        let tail = nonterminal(&g, "Tail");
        assert!(table.get(tail, TerminalID::EOI).is_some());
        assert!(table.get(nonterminal(&g, "E"), TerminalID::EOI).is_none());
    }
}
