//! Three-valued propositions about hidden battle state.
//!
//! A [`ReasonGraph`] owns every reason of one battle. Leaves wrap a [`Fact`]
//! (a predicate over the state that can also be asserted or refuted), and
//! inner nodes combine other reasons with `and`, `or` and `not`. A reason is
//! held, rejected or still pending, and once it settles it never changes.
//!
//! Settling spreads through the graph in [`ReasonGraph::propagate`]: parents
//! settle from their children, and a pending `reject` on an `and` (or a
//! pending `assert` on an `or`) waits until exactly one child is left
//! undecided and then forces that child. Contradictory claims are a
//! [`ReasonError`].

use std::fmt;

use anyhow::Result;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReasonError {
    #[error("cannot assert '{0}': it is already known not to hold")]
    AssertRejected(String),

    #[error("cannot reject '{0}': it is already known to hold")]
    RejectHeld(String),

    #[error("'{0}' must have a child to blame, but every child holds")]
    NothingToBlame(String),

    #[error("'{0}' must have a child to credit, but every child was rejected")]
    NothingToCredit(String),
}

/// Value of a reason
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Held,
    Rejected,
    Pending,
}

impl From<Option<bool>> for Verdict {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Verdict::Held,
            Some(false) => Verdict::Rejected,
            None => Verdict::Pending,
        }
    }
}

/// A primitive proposition over the state `S`
pub trait Fact<S>: Send + Sync {
    /// What the state currently says, `None` if it can't tell yet
    fn check(&self, state: &S) -> Option<bool>;

    /// Make the state reflect that the fact holds
    fn assert(&self, state: &mut S) -> Result<()>;

    /// Make the state reflect that the fact doesn't hold
    fn reject(&self, state: &mut S) -> Result<()>;

    fn describe(&self) -> String;
}

/// Handle to a reason in a [`ReasonGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReasonId(usize);

/// Handle to a callback registered with [`ReasonGraph::delay`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayHandle {
    reason: ReasonId,
    key: u64,
}

pub type DelayCallback<S> = Box<dyn FnOnce(bool, &mut S) -> Result<()> + Send>;

enum Kind<S> {
    Fact(Box<dyn Fact<S>>),
    And(Vec<ReasonId>),
    Or(Vec<ReasonId>),
    Not(ReasonId),
}

struct Node<S> {
    kind: Kind<S>,
    settled: Option<bool>,
    /// An assert (`Some(true)`) or reject (`Some(false)`) waiting for enough
    /// children to settle before it can be pushed into the last one left
    claim: Option<bool>,
    callbacks: Vec<(u64, DelayCallback<S>)>,
}

/// Arena of reasons over a state `S`
pub struct ReasonGraph<S> {
    nodes: Vec<Node<S>>,
    next_key: u64,
}

impl<S> Default for ReasonGraph<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for ReasonGraph<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReasonGraph")
            .field("reasons", &self.nodes.len())
            .finish()
    }
}

impl<S> ReasonGraph<S> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            next_key: 0,
        }
    }

    fn push(&mut self, kind: Kind<S>) -> ReasonId {
        self.nodes.push(Node {
            kind,
            settled: None,
            claim: None,
            callbacks: Vec::new(),
        });
        ReasonId(self.nodes.len() - 1)
    }

    pub fn fact(&mut self, fact: impl Fact<S> + 'static) -> ReasonId {
        self.push(Kind::Fact(Box::new(fact)))
    }

    /// Holds iff every child holds; an empty `and` holds
    pub fn and(&mut self, children: Vec<ReasonId>) -> ReasonId {
        self.push(Kind::And(children))
    }

    /// Holds iff some child holds; an empty `or` never holds
    pub fn or(&mut self, children: Vec<ReasonId>) -> ReasonId {
        self.push(Kind::Or(children))
    }

    pub fn not(&mut self, child: ReasonId) -> ReasonId {
        self.push(Kind::Not(child))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn describe(&self, id: ReasonId) -> String {
        match &self.nodes[id.0].kind {
            Kind::Fact(fact) => fact.describe(),
            Kind::And(children) => format!("and({})", self.describe_all(children)),
            Kind::Or(children) => format!("or({})", self.describe_all(children)),
            Kind::Not(child) => format!("not({})", self.describe(*child)),
        }
    }

    fn describe_all(&self, ids: &[ReasonId]) -> String {
        ids.iter()
            .map(|id| self.describe(*id))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Current value of a reason
    pub fn can_hold(&self, id: ReasonId, state: &S) -> Verdict {
        self.evaluate(id, state).into()
    }

    fn evaluate(&self, id: ReasonId, state: &S) -> Option<bool> {
        let node = &self.nodes[id.0];
        if node.settled.is_some() {
            return node.settled;
        }
        match &node.kind {
            Kind::Fact(fact) => fact.check(state),
            Kind::And(children) => {
                let mut all_held = true;
                for child in children {
                    match self.evaluate(*child, state) {
                        Some(false) => return Some(false),
                        Some(true) => {}
                        None => all_held = false,
                    }
                }
                all_held.then_some(true)
            }
            Kind::Or(children) => {
                let mut all_rejected = true;
                for child in children {
                    match self.evaluate(*child, state) {
                        Some(true) => return Some(true),
                        Some(false) => {}
                        None => all_rejected = false,
                    }
                }
                all_rejected.then_some(false)
            }
            Kind::Not(child) => self.evaluate(*child, state).map(|v| !v),
        }
    }

    /// Claim that a reason holds
    pub fn assert(&mut self, id: ReasonId, state: &mut S) -> Result<()> {
        self.claim(id, true, state)?;
        self.propagate(state)
    }

    /// Claim that a reason doesn't hold
    pub fn reject(&mut self, id: ReasonId, state: &mut S) -> Result<()> {
        self.claim(id, false, state)?;
        self.propagate(state)
    }

    /// Run `callback` once the reason settles, right away if it already has.
    ///
    /// Returns `None` when the callback already ran.
    pub fn delay(
        &mut self,
        id: ReasonId,
        state: &mut S,
        callback: DelayCallback<S>,
    ) -> Result<Option<DelayHandle>> {
        if let Some(value) = self.evaluate(id, state) {
            self.settle(id, value);
            callback(value, state)?;
            return Ok(None);
        }

        let key = self.next_key;
        self.next_key += 1;
        self.nodes[id.0].callbacks.push((key, callback));
        Ok(Some(DelayHandle { reason: id, key }))
    }

    /// Drop a callback registered with [`delay`](Self::delay)
    pub fn cancel(&mut self, handle: DelayHandle) -> bool {
        let callbacks = &mut self.nodes[handle.reason.0].callbacks;
        let before = callbacks.len();
        callbacks.retain(|(key, _)| *key != handle.key);
        callbacks.len() != before
    }

    fn settle(&mut self, id: ReasonId, value: bool) {
        let node = &mut self.nodes[id.0];
        if node.settled.is_none() {
            node.settled = Some(value);
            node.claim = None;
        }
    }

    fn claim(&mut self, id: ReasonId, holds: bool, state: &mut S) -> Result<()> {
        match self.evaluate(id, state) {
            Some(value) if value == holds => {
                self.settle(id, value);
                return Ok(());
            }
            Some(_) => {
                let name = self.describe(id);
                return Err(if holds {
                    ReasonError::AssertRejected(name).into()
                } else {
                    ReasonError::RejectHeld(name).into()
                });
            }
            None => {}
        }

        match &self.nodes[id.0].kind {
            Kind::Fact(fact) => {
                if holds {
                    fact.assert(state)?;
                } else {
                    fact.reject(state)?;
                }
                self.settle(id, holds);
            }
            Kind::Not(child) => {
                let child = *child;
                self.claim(child, !holds, state)?;
                self.settle(id, holds);
            }
            // Asserting an `and` asserts every child, rejecting an `or`
            // rejects every child
            Kind::And(children) | Kind::Or(children)
                if self.is_and(id) == holds =>
            {
                for child in children.clone() {
                    self.claim(child, holds, state)?;
                }
                self.settle(id, holds);
            }
            // Otherwise only one child has to give, and which one is only
            // known once the others have settled
            Kind::And(_) | Kind::Or(_) => {
                self.nodes[id.0].claim = Some(holds);
                self.deduce(id, state)?;
            }
        }
        Ok(())
    }

    fn is_and(&self, id: ReasonId) -> bool {
        matches!(self.nodes[id.0].kind, Kind::And(_))
    }

    /// Push a deferred claim into the last undecided child.
    /// Returns whether anything changed.
    fn deduce(&mut self, id: ReasonId, state: &mut S) -> Result<bool> {
        let Some(holds) = self.nodes[id.0].claim else {
            return Ok(false);
        };
        let children = match &self.nodes[id.0].kind {
            Kind::And(children) | Kind::Or(children) => children.clone(),
            _ => return Ok(false),
        };

        let mut undecided = Vec::new();
        for child in children {
            match self.evaluate(child, state) {
                // Somebody already took the blame (or the credit)
                Some(value) if value == holds => {
                    self.settle(id, holds);
                    return Ok(true);
                }
                Some(_) => {}
                None => undecided.push(child),
            }
        }

        match undecided.as_slice() {
            [] => {
                let name = self.describe(id);
                Err(if holds {
                    ReasonError::NothingToCredit(name).into()
                } else {
                    ReasonError::NothingToBlame(name).into()
                })
            }
            [last] => {
                self.claim(*last, holds, state)?;
                self.settle(id, holds);
                Ok(true)
            }
            // Never guess between several candidates
            _ => Ok(false),
        }
    }

    /// Settle every reason the state now decides, push deferred claims and
    /// run callbacks, until nothing changes
    pub fn propagate(&mut self, state: &mut S) -> Result<()> {
        loop {
            let mut changed = false;
            for index in 0..self.nodes.len() {
                let id = ReasonId(index);
                if self.nodes[index].settled.is_some() {
                    continue;
                }

                if let Some(value) = self.evaluate(id, state) {
                    if let Some(holds) = self.nodes[index].claim
                        && holds != value
                    {
                        let name = self.describe(id);
                        return Err(if holds {
                            ReasonError::AssertRejected(name).into()
                        } else {
                            ReasonError::RejectHeld(name).into()
                        });
                    }
                    self.settle(id, value);
                    changed = true;
                } else if self.deduce(id, state)? {
                    changed = true;
                }
            }

            for index in 0..self.nodes.len() {
                if let Some(value) = self.nodes[index].settled
                    && !self.nodes[index].callbacks.is_empty()
                {
                    for (_, callback) in std::mem::take(&mut self.nodes[index].callbacks) {
                        callback(value, state)?;
                    }
                    changed = true;
                }
            }

            if !changed {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Test state: named booleans, unknown until set
    #[derive(Debug, Default)]
    pub(crate) struct Facts(pub BTreeMap<&'static str, bool>);

    #[derive(Default)]
    pub(crate) struct Calls {
        pub asserts: AtomicUsize,
        pub rejects: AtomicUsize,
    }

    pub(crate) struct Flag {
        pub name: &'static str,
        pub calls: Arc<Calls>,
    }

    impl Fact<Facts> for Flag {
        fn check(&self, state: &Facts) -> Option<bool> {
            state.0.get(self.name).copied()
        }

        fn assert(&self, state: &mut Facts) -> Result<()> {
            self.calls.asserts.fetch_add(1, Ordering::SeqCst);
            state.0.insert(self.name, true);
            Ok(())
        }

        fn reject(&self, state: &mut Facts) -> Result<()> {
            self.calls.rejects.fetch_add(1, Ordering::SeqCst);
            state.0.insert(self.name, false);
            Ok(())
        }

        fn describe(&self) -> String {
            self.name.to_string()
        }
    }

    pub(crate) fn flag(
        graph: &mut ReasonGraph<Facts>,
        name: &'static str,
    ) -> (ReasonId, Arc<Calls>) {
        let calls = Arc::new(Calls::default());
        let id = graph.fact(Flag {
            name,
            calls: calls.clone(),
        });
        (id, calls)
    }

    fn reason_error(err: anyhow::Error) -> ReasonError {
        err.downcast::<ReasonError>().unwrap()
    }

    #[test]
    fn test_fact_follows_state() {
        let mut graph = ReasonGraph::new();
        let mut state = Facts::default();
        let (a, _) = flag(&mut graph, "a");

        assert_eq!(graph.can_hold(a, &state), Verdict::Pending);
        state.0.insert("a", true);
        assert_eq!(graph.can_hold(a, &state), Verdict::Held);
    }

    #[test]
    fn test_and_rejects_as_soon_as_one_child_rejects() {
        let mut graph = ReasonGraph::new();
        let mut state = Facts::default();
        let (r1, _) = flag(&mut graph, "r1");
        let (r2, _) = flag(&mut graph, "r2");
        let both = graph.and(vec![r1, r2]);

        graph.reject(r1, &mut state).unwrap();
        assert_eq!(graph.can_hold(both, &state), Verdict::Rejected);
        assert_eq!(graph.can_hold(r2, &state), Verdict::Pending);

        assert_eq!(
            reason_error(graph.assert(both, &mut state).unwrap_err()),
            ReasonError::AssertRejected("and(r1, r2)".to_string())
        );
    }

    #[test]
    fn test_and_assert_pushes_into_children() {
        let mut graph = ReasonGraph::new();
        let mut state = Facts::default();
        let (r1, c1) = flag(&mut graph, "r1");
        let (r2, c2) = flag(&mut graph, "r2");
        let both = graph.and(vec![r1, r2]);

        graph.assert(both, &mut state).unwrap();
        assert_eq!(state.0.get("r1"), Some(&true));
        assert_eq!(state.0.get("r2"), Some(&true));
        assert_eq!(c1.asserts.load(Ordering::SeqCst), 1);
        assert_eq!(c2.asserts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_and_reject_waits_for_last_one_standing() {
        let mut graph = ReasonGraph::new();
        let mut state = Facts::default();
        let (r1, c1) = flag(&mut graph, "r1");
        let (r2, c2) = flag(&mut graph, "r2");
        let both = graph.and(vec![r1, r2]);

        graph.reject(both, &mut state).unwrap();
        // Two candidates to blame, so nothing is decided yet
        assert_eq!(graph.can_hold(both, &state), Verdict::Pending);
        assert_eq!(c1.rejects.load(Ordering::SeqCst), 0);
        assert_eq!(c2.rejects.load(Ordering::SeqCst), 0);

        graph.assert(r1, &mut state).unwrap();
        assert_eq!(state.0.get("r2"), Some(&false));
        assert_eq!(c2.rejects.load(Ordering::SeqCst), 1);
        assert_eq!(graph.can_hold(both, &state), Verdict::Rejected);
    }

    #[test]
    fn test_and_reject_with_every_child_held_is_a_contradiction() {
        let mut graph = ReasonGraph::new();
        let mut state = Facts::default();
        let (r1, _) = flag(&mut graph, "r1");
        let (r2, _) = flag(&mut graph, "r2");
        let both = graph.and(vec![r1, r2]);

        graph.assert(r1, &mut state).unwrap();
        graph.assert(r2, &mut state).unwrap();
        assert_eq!(
            reason_error(graph.reject(both, &mut state).unwrap_err()),
            ReasonError::RejectHeld("and(r1, r2)".to_string())
        );
    }

    #[test]
    fn test_deferred_blame_conflicts_with_later_facts() {
        let mut graph = ReasonGraph::new();
        let mut state = Facts::default();
        let (r1, _) = flag(&mut graph, "r1");
        let (r2, _) = flag(&mut graph, "r2");
        let both = graph.and(vec![r1, r2]);

        graph.reject(both, &mut state).unwrap();
        state.0.insert("r1", true);
        state.0.insert("r2", true);
        assert!(graph.propagate(&mut state).is_err());
    }

    #[test]
    fn test_or_assert_credits_last_one_standing() {
        let mut graph = ReasonGraph::new();
        let mut state = Facts::default();
        let (a, _) = flag(&mut graph, "shadowtag");
        let (b, _) = flag(&mut graph, "arenatrap");
        let (c, _) = flag(&mut graph, "magnetpull");
        let any = graph.or(vec![a, b, c]);

        graph.assert(any, &mut state).unwrap();
        assert_eq!(graph.can_hold(any, &state), Verdict::Pending);

        state.0.insert("shadowtag", false);
        graph.propagate(&mut state).unwrap();
        assert_eq!(graph.can_hold(any, &state), Verdict::Pending);

        graph.reject(c, &mut state).unwrap();
        assert_eq!(state.0.get("arenatrap"), Some(&true));
        assert_eq!(graph.can_hold(any, &state), Verdict::Held);
    }

    #[test]
    fn test_or_reject_rejects_every_child() {
        let mut graph = ReasonGraph::new();
        let mut state = Facts::default();
        let (a, ca) = flag(&mut graph, "a");
        let (b, cb) = flag(&mut graph, "b");
        let any = graph.or(vec![a, b]);

        graph.reject(any, &mut state).unwrap();
        assert_eq!(ca.rejects.load(Ordering::SeqCst), 1);
        assert_eq!(cb.rejects.load(Ordering::SeqCst), 1);
        assert_eq!(graph.can_hold(any, &state), Verdict::Rejected);
    }

    #[test]
    fn test_not_inverts() {
        let mut graph = ReasonGraph::new();
        let mut state = Facts::default();
        let (a, _) = flag(&mut graph, "a");
        let not_a = graph.not(a);

        assert_eq!(graph.can_hold(not_a, &state), Verdict::Pending);
        graph.assert(not_a, &mut state).unwrap();
        assert_eq!(state.0.get("a"), Some(&false));
        assert_eq!(graph.can_hold(not_a, &state), Verdict::Held);
        assert!(graph.assert(a, &mut state).is_err());
    }

    #[test]
    fn test_settled_value_is_final() {
        let mut graph = ReasonGraph::new();
        let mut state = Facts::default();
        let (a, _) = flag(&mut graph, "a");

        state.0.insert("a", true);
        graph.propagate(&mut state).unwrap();
        state.0.insert("a", false);
        assert_eq!(graph.can_hold(a, &state), Verdict::Held);
    }

    #[test]
    fn test_delay_runs_once_settled() {
        let mut graph = ReasonGraph::new();
        let mut state = Facts::default();
        let (a, _) = flag(&mut graph, "a");
        let (b, _) = flag(&mut graph, "b");

        let handle = graph
            .delay(
                a,
                &mut state,
                Box::new(|held, state: &mut Facts| {
                    state.0.insert("seen", held);
                    Ok(())
                }),
            )
            .unwrap();
        assert!(handle.is_some());
        assert_eq!(state.0.get("seen"), None);

        graph.reject(a, &mut state).unwrap();
        assert_eq!(state.0.get("seen"), Some(&false));

        // Canceled callbacks never run
        let handle = graph
            .delay(
                b,
                &mut state,
                Box::new(|_, state: &mut Facts| {
                    state.0.insert("canceled", true);
                    Ok(())
                }),
            )
            .unwrap()
            .unwrap();
        assert!(graph.cancel(handle));
        graph.assert(b, &mut state).unwrap();
        assert_eq!(state.0.get("canceled"), None);

        // Already settled: runs right away
        let ran = graph
            .delay(
                b,
                &mut state,
                Box::new(|held, state: &mut Facts| {
                    state.0.insert("late", held);
                    Ok(())
                }),
            )
            .unwrap();
        assert!(ran.is_none());
        assert_eq!(state.0.get("late"), Some(&true));
    }
}
