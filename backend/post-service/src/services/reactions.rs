/// Reaction service - one reaction per (author, post)
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use super::enrich::enrich_reaction;
use super::EngineContext;
use crate::error::{AppError, Result};
use crate::metrics::engine::{OPERATION_DURATION_SECONDS, REACTION_OUTCOMES_TOTAL};
use crate::models::reaction::normalize_kind;
use crate::models::{AppliedReaction, ReactionView};

/// What a react call did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReactionOutcome {
    /// Same type requested again: the reaction was deleted
    Removed { reaction_id: Uuid, post_id: Uuid },
    /// Type overwritten in place, id and creation time kept
    Updated { reaction: ReactionView },
    Created { reaction: ReactionView },
}

impl ReactionOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ReactionOutcome::Removed { .. } => "removed",
            ReactionOutcome::Updated { .. } => "updated",
            ReactionOutcome::Created { .. } => "created",
        }
    }
}

#[derive(Clone)]
pub struct ReactionService {
    ctx: EngineContext,
}

impl ReactionService {
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    pub async fn react(&self, author_id: Uuid, post_id: Uuid, kind: &str) -> Result<ReactionOutcome> {
        let _timer = OPERATION_DURATION_SECONDS
            .with_label_values(&["react"])
            .start_timer();

        let kind = normalize_kind(kind)?;
        let viewer = self.ctx.require_user(author_id).await?.viewer();
        self.ctx.require_visible_post(&viewer, post_id).await?;

        let applied = self
            .ctx
            .timed(
                "store.apply_reaction",
                self.ctx.store.apply_reaction(post_id, author_id, &kind),
            )
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))?;

        let outcome = match applied {
            AppliedReaction::Removed(reaction) => ReactionOutcome::Removed {
                reaction_id: reaction.id,
                post_id: reaction.post_id,
            },
            AppliedReaction::Updated(reaction) => ReactionOutcome::Updated {
                reaction: enrich_reaction(&self.ctx, reaction).await?,
            },
            AppliedReaction::Created(reaction) => ReactionOutcome::Created {
                reaction: enrich_reaction(&self.ctx, reaction).await?,
            },
        };

        REACTION_OUTCOMES_TOTAL
            .with_label_values(&[outcome.label()])
            .inc();
        debug!(%post_id, %author_id, outcome = outcome.label(), "reaction applied");

        Ok(outcome)
    }
}
