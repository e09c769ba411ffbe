//! Live notification delivery.
//!
//! Handlers receive the emitter as `web::Data<dyn NotificationEmitter>`; the
//! process-wide instance is built once in `main`. Delivery is fire-and-forget:
//! a user with no open socket simply misses the live event and reads the
//! persisted notification later.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::{DbPool, NewNotification};
use crate::error::AppResult;
use crate::models::NotificationEvent;

/// Pushes events to one user's live connections.
pub trait NotificationEmitter: Send + Sync {
    /// Returns the number of live subscribers the event was handed to.
    fn emit_to_user(&self, user_id: Uuid, event: NotificationEvent) -> usize;
}

/// Event tagged with its recipient, as carried on the broadcast channel.
#[derive(Debug, Clone)]
pub struct AddressedEvent {
    pub user_id: Uuid,
    pub event: NotificationEvent,
}

/// Emitter backed by a `tokio::sync::broadcast` channel. Each socket
/// subscribes for its user and keeps only events addressed to that user.
///
/// Open sockets are counted per user, so `emit_to_user` reports how many of
/// the recipient's own connections the event reached.
#[derive(Clone)]
pub struct BroadcastEmitter {
    sender: broadcast::Sender<AddressedEvent>,
    connections: Arc<Mutex<HashMap<Uuid, usize>>>,
}

impl BroadcastEmitter {
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            connections: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Subscribe one connection of `user_id`. The connection stops counting
    /// as live when the returned subscription is dropped.
    pub fn subscribe(&self, user_id: Uuid) -> UserSubscription {
        *lock_counts(&self.connections).entry(user_id).or_insert(0) += 1;
        UserSubscription {
            user_id,
            receiver: self.sender.subscribe(),
            connections: Arc::clone(&self.connections),
        }
    }

    /// Open connections of one user.
    pub fn connection_count(&self, user_id: Uuid) -> usize {
        lock_counts(&self.connections)
            .get(&user_id)
            .copied()
            .unwrap_or(0)
    }
}

fn lock_counts(counts: &Mutex<HashMap<Uuid, usize>>) -> MutexGuard<'_, HashMap<Uuid, usize>> {
    // Counts stay consistent even if a holder panicked
    counts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl NotificationEmitter for BroadcastEmitter {
    fn emit_to_user(&self, user_id: Uuid, event: NotificationEvent) -> usize {
        let live = self.connection_count(user_id);
        if live == 0 {
            return 0;
        }
        match self.sender.send(AddressedEvent { user_id, event }) {
            Ok(_) => live,
            Err(_) => 0,
        }
    }
}

/// One socket's view of the channel.
pub struct UserSubscription {
    user_id: Uuid,
    receiver: broadcast::Receiver<AddressedEvent>,
    connections: Arc<Mutex<HashMap<Uuid, usize>>>,
}

impl UserSubscription {
    /// Next event addressed to this subscription's user.
    pub async fn recv(&mut self) -> Result<NotificationEvent, RecvError> {
        loop {
            let addressed = self.receiver.recv().await?;
            if addressed.user_id == self.user_id {
                return Ok(addressed.event);
            }
        }
    }
}

impl Drop for UserSubscription {
    fn drop(&mut self) {
        let mut counts = lock_counts(&self.connections);
        if let Some(count) = counts.get_mut(&self.user_id) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                counts.remove(&self.user_id);
            }
        }
    }
}

/// Persist one notification per recipient, then push each live.
///
/// Returns how many recipients had at least one live subscriber.
pub async fn deliver(
    pool: &DbPool,
    emitter: &dyn NotificationEmitter,
    recipients: &[Uuid],
    content: &NewNotification<'_>,
) -> AppResult<usize> {
    let stored = pool.insert_notifications(recipients, content).await?;

    let live = stored
        .iter()
        .filter(|n| emitter.emit_to_user(n.recipient_user_id, NotificationEvent::from(*n)) > 0)
        .count();

    info!(
        kind = %content.kind,
        recipients = stored.len(),
        live,
        "Notifications delivered"
    );
    Ok(live)
}

/// [`deliver`] for side-effect notifications: failures are logged, never
/// surfaced to the request that triggered them.
pub async fn deliver_quietly(
    pool: &DbPool,
    emitter: &dyn NotificationEmitter,
    recipients: &[Uuid],
    content: &NewNotification<'_>,
) {
    if let Err(e) = deliver(pool, emitter, recipients, content).await {
        warn!(kind = %content.kind, error = %e, "Failed to deliver notifications");
    }
}
