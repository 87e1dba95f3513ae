//! Narrowable candidate sets for hidden information

use std::collections::BTreeSet;

use psai_protocol::to_id;
use thiserror::Error;

/// A deduction that contradicts what is already known
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InferenceConflict {
    #[error("cannot narrow to '{name}': it was already ruled out")]
    Excluded { name: String },

    #[error("cannot narrow to '{name}': already known to be '{known}'")]
    Contradicts { name: String, known: String },

    #[error("cannot rule out '{name}': it is the only remaining candidate")]
    Exhausted { name: String },
}

/// The set of values a hidden attribute (ability, item) could still take.
///
/// An open set admits any name not explicitly excluded, which is how an
/// opponent's attributes start out without static game data. A closed set
/// only admits its listed candidates. Names are compared by protocol id, so
/// "Black Sludge" and "blacksludge" are the same candidate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Possibilities {
    candidates: Option<BTreeSet<String>>,
    excluded: BTreeSet<String>,
}

impl Possibilities {
    /// Nothing known yet
    pub fn open() -> Self {
        Self::default()
    }

    /// Restricted to the given candidates
    pub fn closed<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            candidates: Some(candidates.into_iter().map(|c| to_id(c.as_ref())).collect()),
            excluded: BTreeSet::new(),
        }
    }

    /// Exactly one value
    pub fn known(name: &str) -> Self {
        Self::closed([name])
    }

    /// The value, once only one candidate is left
    pub fn definite(&self) -> Option<&str> {
        match &self.candidates {
            Some(set) if set.len() == 1 => set.iter().next().map(String::as_str),
            _ => None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.candidates.is_none()
    }

    /// Remaining candidates of a closed set
    pub fn candidates(&self) -> Option<impl Iterator<Item = &str>> {
        self.candidates.as_ref().map(|set| set.iter().map(String::as_str))
    }

    /// Whether `name` is the value: `Some(true)` if certain, `Some(false)` if
    /// ruled out, `None` while undecided.
    pub fn can_hold(&self, name: &str) -> Option<bool> {
        let id = to_id(name);
        if self.excluded.contains(&id) {
            return Some(false);
        }
        match &self.candidates {
            Some(set) if !set.contains(&id) => Some(false),
            Some(set) if set.len() == 1 => Some(true),
            _ => None,
        }
    }

    /// Record that the value is `name`
    pub fn narrow(&mut self, name: &str) -> Result<(), InferenceConflict> {
        let id = to_id(name);
        if let Some(known) = self.definite() {
            if known == id {
                return Ok(());
            }
            return Err(InferenceConflict::Contradicts {
                name: id,
                known: known.to_string(),
            });
        }
        if self.can_hold(&id) == Some(false) {
            return Err(InferenceConflict::Excluded { name: id });
        }

        self.candidates = Some(BTreeSet::from([id]));
        Ok(())
    }

    /// Record that the value is not `name`
    pub fn remove(&mut self, name: &str) -> Result<(), InferenceConflict> {
        let id = to_id(name);
        if self.definite() == Some(id.as_str()) {
            return Err(InferenceConflict::Exhausted { name: id });
        }

        if let Some(set) = &mut self.candidates {
            set.remove(&id);
        }
        self.excluded.insert(id);
        Ok(())
    }

    /// Forget everything, e.g. after the value was swapped by an effect
    pub fn reset(&mut self) {
        *self = Self::open();
    }
}
