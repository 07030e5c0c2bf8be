//! Reaction state machine for one (author, post) pair.
//!
//! A request for type `t` moves the pair as follows:
//!
//! | current              | requested | transition          |
//! |----------------------|-----------|---------------------|
//! | `NoReaction`         | `t`       | `Create { t }`      |
//! | `HasReaction(t)`     | `t`       | `Remove`            |
//! | `HasReaction(u != t)`| `t`       | `Update { t }`      |
//!
//! `Update` keeps the reaction id and creation time. Stores compute the
//! transition while holding whatever lock serializes the pair, then execute it.

use super::Reaction;
use crate::error::AppError;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactionState {
    NoReaction,
    HasReaction { reaction_id: Uuid, kind: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactionTransition {
    Create { kind: String },
    Update { reaction_id: Uuid, kind: String },
    Remove { reaction_id: Uuid },
}

impl ReactionState {
    pub fn from_existing(existing: Option<&Reaction>) -> Self {
        match existing {
            Some(reaction) => ReactionState::HasReaction {
                reaction_id: reaction.id,
                kind: reaction.kind.clone(),
            },
            None => ReactionState::NoReaction,
        }
    }

    pub fn transition(&self, requested: &str) -> ReactionTransition {
        match self {
            ReactionState::NoReaction => ReactionTransition::Create {
                kind: requested.to_string(),
            },
            ReactionState::HasReaction { reaction_id, kind } if kind == requested => {
                ReactionTransition::Remove {
                    reaction_id: *reaction_id,
                }
            }
            ReactionState::HasReaction { reaction_id, .. } => ReactionTransition::Update {
                reaction_id: *reaction_id,
                kind: requested.to_string(),
            },
        }
    }
}

/// Result of executing a transition inside a store.
#[derive(Debug, Clone, PartialEq)]
pub enum AppliedReaction {
    /// The reaction that was deleted (toggle-off)
    Removed(Reaction),
    /// Same id, new type
    Updated(Reaction),
    Created(Reaction),
}

/// Normalize and check a requested reaction type.
pub fn normalize_kind(kind: &str) -> Result<String, AppError> {
    let kind = kind.trim();
    if kind.is_empty() {
        return Err(AppError::Validation("reaction type is required".to_string()));
    }
    if kind.chars().count() > super::MAX_REACTION_TYPE_LEN {
        return Err(AppError::Validation(format!(
            "reaction type exceeds {} characters",
            super::MAX_REACTION_TYPE_LEN
        )));
    }
    Ok(kind.to_string())
}
