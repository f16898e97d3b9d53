// Status Transition Use Case (State Machine enforcement)

use crate::domain::{DomainError, EntryId, EntryStatus, QueueEntry};
use crate::error::{AppError, Result};
use crate::port::{QueueRepository, TimeProvider};

/// Apply one status transition through the store compare-and-swap.
///
/// Legality is checked against the domain transition table first, then
/// enforced atomically by the conditional update: when two callers race on
/// the same entry, exactly one CAS matches and the loser resolves to
/// `IllegalTransition` from the status the winner left behind.
pub async fn execute(
    repo: &dyn QueueRepository,
    time_provider: &dyn TimeProvider,
    entry_id: &EntryId,
    target: EntryStatus,
) -> Result<QueueEntry> {
    let entry = repo
        .find_by_id(entry_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Entry {} not found", entry_id)))?;

    if !entry.status.can_transition_to(target) {
        return Err(DomainError::IllegalTransition {
            from: entry.status.to_string(),
            to: target.to_string(),
        }
        .into());
    }

    let now = time_provider.now_millis();
    if repo
        .transition_status(entry_id, entry.status, target, now)
        .await?
    {
        let mut updated = entry;
        updated.transition(target, now)?;
        Ok(updated)
    } else {
        // Lost the race (or the entry vanished); re-read for an accurate refusal
        match repo.find_by_id(entry_id).await? {
            None => Err(AppError::NotFound(format!("Entry {} not found", entry_id))),
            Some(current) => Err(DomainError::IllegalTransition {
                from: current.status.to_string(),
                to: target.to_string(),
            }
            .into()),
        }
    }
}
