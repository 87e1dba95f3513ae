use std::sync::{Mutex, PoisonError};

use anyhow::Result;
use async_trait::async_trait;
use psai_battle::BattleState;
use psai_protocol::Choice;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::Span;

/// Picks which choice to make.
///
/// The agent sees the battle state and the legal choices, and reorders
/// `choices` in place by preference. It may also drop choices it never wants
/// to make, as long as at least one remains. The engine tries them front to
/// back, moving on when the server rejects one.
///
/// # Example
///
/// ```ignore
/// struct PreferSwitching;
///
/// #[async_trait]
/// impl BattleAgent for PreferSwitching {
///     async fn decide(&self, _: &BattleState, choices: &mut Vec<Choice>, _: &Span) -> Result<()> {
///         choices.sort_by_key(|c| !c.is_switch());
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait BattleAgent: Send + Sync {
    async fn decide(&self, state: &BattleState, choices: &mut Vec<Choice>, span: &Span)
    -> Result<()>;
}

/// Keeps the server's order
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstChoiceAgent;

#[async_trait]
impl BattleAgent for FirstChoiceAgent {
    async fn decide(&self, _: &BattleState, _: &mut Vec<Choice>, _: &Span) -> Result<()> {
        Ok(())
    }
}

/// Shuffles the choices
#[derive(Debug)]
pub struct RandomAgent {
    rng: Mutex<StdRng>,
}

impl RandomAgent {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible choices
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BattleAgent for RandomAgent {
    async fn decide(&self, _: &BattleState, choices: &mut Vec<Choice>, span: &Span) -> Result<()> {
        {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            choices.shuffle(&mut *rng);
        }
        tracing::trace!(parent: span, ?choices, "shuffled choices");
        Ok(())
    }
}

/// Wraps a closure as an agent
pub struct FnAgent<F>(F);

impl<F> FnAgent<F>
where
    F: Fn(&BattleState, &mut Vec<Choice>) -> Result<()> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> BattleAgent for FnAgent<F>
where
    F: Fn(&BattleState, &mut Vec<Choice>) -> Result<()> + Send + Sync,
{
    async fn decide(&self, state: &BattleState, choices: &mut Vec<Choice>, _: &Span) -> Result<()> {
        (self.0)(state, choices)
    }
}
