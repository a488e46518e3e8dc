//! Rest-cycle expiration of infused items.
//!
//! Each character's deletions are independent: a failure stops the sweep but
//! does not roll back characters already cleaned up.

use alembic_types::formatting;

use crate::error::Result;
use crate::host::{ActorId, ActorSummary, ChatMessage, Host, ItemId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpirationReport {
    /// Records deleted per character, in roster order
    pub per_actor: Vec<(ActorId, usize)>,
}

impl ExpirationReport {
    pub fn total(&self) -> usize {
        self.per_actor.iter().map(|(_, n)| n).sum()
    }
}

/// Delete every infused record `creator` made, across the whole roster.
pub async fn expire_infused<H: Host>(host: &H, creator: &ActorSummary) -> Result<ExpirationReport> {
    let mut report = ExpirationReport::default();

    for actor in host.roster().await {
        let expired: Vec<ItemId> = host
            .items(&actor.id)
            .await?
            .into_iter()
            .filter(|item| item.is_infused() && item.created_by(&creator.id))
            .map(|item| item.id)
            .collect();
        if expired.is_empty() {
            continue;
        }

        let count = expired.len();
        host.delete_items(&actor.id, expired).await?;
        tracing::info!(actor = %actor.id, creator = %creator.id, count, "Expired infused items");

        if actor.has_player_owner && !actor.owners.is_empty() {
            host.post(ChatMessage::whisper(
                actor.owners.clone(),
                formatting::infused_expired_for_owner(count, &creator.name),
            ))
            .await;
        }
        report.per_actor.push((actor.id, count));
    }

    let total = report.total();
    if total > 0 {
        host.post(ChatMessage::public(
            &creator.id,
            formatting::infused_expired_summary(total),
        ))
        .await;
    }
    Ok(report)
}
