//! Calculation of the prediction sets (nullability, FIRST and FOLLOW).

use crate::{
    grammar::{Grammar, NonterminalID, Production, ProductionID, SymbolID, TerminalID},
    table::ConflictPolicy,
    types::{Map, Set},
    util::{display_fn, join},
};
use std::fmt;

#[derive(Debug, Default, Clone)]
pub struct TerminalSet {
    inner: bit_set::BitSet,
}

impl TerminalSet {
    pub fn contains(&self, id: TerminalID) -> bool {
        self.inner.contains(id.into_raw().into())
    }
    pub fn insert(&mut self, id: TerminalID) -> bool {
        self.inner.insert(id.into_raw().into())
    }
    pub fn union_with(&mut self, other: &Self) {
        self.inner.union_with(&other.inner)
    }
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
    pub fn len(&self) -> usize {
        self.inner.len()
    }
    pub fn iter(&self) -> impl Iterator<Item = TerminalID> + '_ {
        self.inner
            .iter()
            .filter_map(|raw| raw.try_into().ok().map(TerminalID::from_raw))
    }

    /// Union the other set into this one, and report whether something was added.
    fn extend_from(&mut self, other: &Self) -> bool {
        let before = self.len();
        self.union_with(other);
        self.len() != before
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            let terminals: Vec<_> = self.iter().map(|t| g.terminal(t)).collect();
            write!(f, "{{{}}}", join(&terminals, ", "))?;
            Ok(())
        })
    }
}

impl PartialEq for TerminalSet {
    fn eq(&self, other: &Self) -> bool {
        self.inner.iter().eq(other.inner.iter())
    }
}
impl Eq for TerminalSet {}

impl FromIterator<TerminalID> for TerminalSet {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = TerminalID>,
    {
        Self {
            inner: iter.into_iter().map(|t| t.into_raw().into()).collect(),
        }
    }
}

/// The safety bound of the fixed-point iterations.
///
/// Each pass that does not reach the fixed point adds at least one terminal
/// (or the end-of-input marker) to some set, so the number of passes cannot
/// exceed the product of the alphabet sizes.
pub fn iteration_limit(num_nonterminals: usize, num_terminals: usize) -> usize {
    (num_nonterminals + 1) * (num_terminals + 1) + 1
}

#[derive(Debug, thiserror::Error)]
#[error("the computation of {} did not converge within {} iterations", stage, limit)]
pub struct InternalIterationLimitError {
    pub stage: &'static str,
    pub limit: usize,
}

#[derive(Debug, thiserror::Error)]
#[error(
    "the nonterminal `{}' has multiple alternatives deriving the empty sequence: {}",
    nonterminal,
    .alternatives.join(", ")
)]
pub struct AmbiguousGrammarError {
    pub nonterminal: String,
    pub productions: Vec<ProductionID>,
    pub alternatives: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error(transparent)]
    Ambiguous(#[from] AmbiguousGrammarError),

    #[error(transparent)]
    IterationLimit(#[from] InternalIterationLimitError),
}

/// The prediction sets of all nonterminals in a grammar.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionSets {
    nullables: Set<NonterminalID>,
    first: Map<NonterminalID, TerminalSet>,
    follow: Map<NonterminalID, TerminalSet>,
}

impl PredictionSets {
    /// Compute the prediction sets from scratch.
    pub fn compute(g: &Grammar, policy: ConflictPolicy) -> Result<Self, PredictError> {
        let span = tracing::trace_span!("predict");
        let _entered = span.enter();

        let limit = iteration_limit(g.num_nonterminals(), g.num_terminals());
        let productions: Vec<&Production> = g.productions().collect();

        let nullables = nullable_set(&productions, limit)?;
        let first = first_sets(g, &productions, &nullables, limit)?;
        let follow = follow_sets(g, &productions, &nullables, &first, limit)?;

        let sets = Self {
            nullables,
            first,
            follow,
        };
        sets.check_empty_alternatives(g, policy)?;

        tracing::debug!("prediction sets:\n{}", sets.display(g));
        Ok(sets)
    }

    pub fn is_nullable(&self, id: NonterminalID) -> bool {
        self.nullables.contains(&id)
    }

    /// The terminals that can begin a derivation of the nonterminal.
    pub fn first(&self, id: NonterminalID) -> &TerminalSet {
        &self.first[&id]
    }

    /// The terminals that can immediately follow the nonterminal.
    pub fn follow(&self, id: NonterminalID) -> &TerminalSet {
        &self.follow[&id]
    }

    /// `First(symbols)`, along with whether the whole sequence is nullable.
    pub fn first_of(&self, symbols: &[SymbolID]) -> (TerminalSet, bool) {
        first_of_sequence(symbols, &self.first, &self.nullables)
    }

    /// The lookahead terminals that select the production.
    pub fn predict(&self, production: &Production) -> TerminalSet {
        let (mut set, nullable) = self.first_of(production.right());
        if nullable {
            set.union_with(self.follow(production.left()));
        }
        set
    }

    fn check_empty_alternatives(
        &self,
        g: &Grammar,
        policy: ConflictPolicy,
    ) -> Result<(), AmbiguousGrammarError> {
        for nonterminal in g.nonterminals() {
            let empties: Vec<&Production> = g
                .productions_of(nonterminal.id())
                .filter(|p| self.first_of(p.right()).1)
                .collect();
            if empties.len() <= 1 {
                continue;
            }

            match policy {
                ConflictPolicy::Reject => {
                    return Err(AmbiguousGrammarError {
                        nonterminal: nonterminal.name().to_owned(),
                        productions: empties.iter().map(|p| p.id()).collect(),
                        alternatives: empties.iter().map(|p| p.display(g).to_string()).collect(),
                    });
                }
                ConflictPolicy::PreferFirst => {
                    tracing::warn!(
                        "`{}' has {} empty alternatives; `{}' is preferred",
                        nonterminal,
                        empties.len(),
                        empties[0].display(g)
                    );
                }
            }
        }
        Ok(())
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (i, nonterminal) in g.nonterminals().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }
                let id = nonterminal.id();
                writeln!(f, "#### {}", nonterminal)?;
                writeln!(f, "nullable: {}", self.is_nullable(id))?;
                writeln!(f, "first: {}", self.first(id).display(g))?;
                writeln!(f, "follow: {}", self.follow(id).display(g))?;
            }
            Ok(())
        })
    }
}

/// Calculate the set of nullable nonterminals.
pub(crate) fn nullable_set(
    productions: &[&Production],
    limit: usize,
) -> Result<Set<NonterminalID>, InternalIterationLimitError> {
    let mut nullables = Set::default();
    let mut iterations = 0;
    loop {
        iterations += 1;
        if iterations > limit {
            return Err(InternalIterationLimitError {
                stage: "nullable symbols",
                limit,
            });
        }

        let mut changed = false;
        for p in productions {
            if nullables.contains(&p.left()) {
                continue;
            }
            // 右辺のsymbolsがすべてnullableかどうか
            if p.right()
                .iter()
                .all(|s| matches!(s, SymbolID::N(n) if nullables.contains(n)))
            {
                changed |= nullables.insert(p.left());
            }
        }
        if !changed {
            break;
        }
    }
    Ok(nullables)
}

fn first_sets(
    g: &Grammar,
    productions: &[&Production],
    nullables: &Set<NonterminalID>,
    limit: usize,
) -> Result<Map<NonterminalID, TerminalSet>, InternalIterationLimitError> {
    let mut first: Map<NonterminalID, TerminalSet> = g
        .nonterminals()
        .map(|n| (n.id(), TerminalSet::default()))
        .collect();

    let mut iterations = 0;
    loop {
        iterations += 1;
        if iterations > limit {
            return Err(InternalIterationLimitError {
                stage: "FIRST sets",
                limit,
            });
        }

        let mut changed = false;
        for p in productions {
            let (added, _) = first_of_sequence(p.right(), &first, nullables);
            changed |= first[&p.left()].extend_from(&added);
        }
        if !changed {
            break;
        }
    }
    Ok(first)
}

fn follow_sets(
    g: &Grammar,
    productions: &[&Production],
    nullables: &Set<NonterminalID>,
    first: &Map<NonterminalID, TerminalSet>,
    limit: usize,
) -> Result<Map<NonterminalID, TerminalSet>, InternalIterationLimitError> {
    let mut follow: Map<NonterminalID, TerminalSet> = g
        .nonterminals()
        .map(|n| (n.id(), TerminalSet::default()))
        .collect();
    follow[&g.start_symbol()].insert(TerminalID::EOI);

    let mut iterations = 0;
    loop {
        iterations += 1;
        if iterations > limit {
            return Err(InternalIterationLimitError {
                stage: "FOLLOW sets",
                limit,
            });
        }

        let mut changed = false;
        for p in productions {
            for (i, symbol) in p.right().iter().enumerate() {
                let SymbolID::N(n) = *symbol else {
                    continue;
                };
                // A -> α N β : First(β) ⊆ Follow(N), and Follow(A) ⊆ Follow(N) if β is nullable
                let (mut added, rest_nullable) =
                    first_of_sequence(&p.right()[i + 1..], first, nullables);
                if rest_nullable {
                    added.union_with(&follow[&p.left()]);
                }
                changed |= follow[&n].extend_from(&added);
            }
        }
        if !changed {
            break;
        }
    }
    Ok(follow)
}

fn first_of_sequence(
    symbols: &[SymbolID],
    first: &Map<NonterminalID, TerminalSet>,
    nullables: &Set<NonterminalID>,
) -> (TerminalSet, bool) {
    let mut set = TerminalSet::default();
    for symbol in symbols {
        match *symbol {
            SymbolID::T(t) => {
                set.insert(t);
                return (set, false);
            }
            SymbolID::N(n) => {
                set.union_with(&first[&n]);
                if !nullables.contains(&n) {
                    return (set, false);
                }
            }
        }
    }
    (set, true)
}
