//! Session identity backed by the persisted key-value store.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::dao::session_store::{
    Edit, KeyValueStore, LOGGED_IN_KEY, PLAYER_ID_KEY, PLAYER_NAME_KEY, StoreResult, StoredValue,
};

/// Logged-in participant as remembered across restarts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    /// Participant id.
    pub player_id: u32,
    /// Participant name used at check-in.
    pub name: String,
}

/// Owns the live session identity and mirrors it into the store.
pub struct SessionService {
    store: Arc<dyn KeyValueStore>,
    identity: watch::Sender<Option<SessionIdentity>>,
}

impl SessionService {
    /// Wrap `store`, starting logged out until [`SessionService::restore`] runs.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let (identity, _rx) = watch::channel(None);
        Self { store, identity }
    }

    /// Current identity, `None` when logged out.
    pub fn current_identity(&self) -> Option<SessionIdentity> {
        self.identity.borrow().clone()
    }

    /// Watch identity changes; the receiver starts at the current value.
    pub fn subscribe(&self) -> watch::Receiver<Option<SessionIdentity>> {
        self.identity.subscribe()
    }

    /// Bootstrap the identity from the store.
    ///
    /// An incomplete or inconsistent record counts as logged out.
    pub async fn restore(&self) -> StoreResult<Option<SessionIdentity>> {
        let logged_in = self
            .store
            .read(LOGGED_IN_KEY)
            .await?
            .and_then(|value| value.as_bool())
            .unwrap_or(false);
        let player_id = self
            .store
            .read(PLAYER_ID_KEY)
            .await?
            .and_then(|value| value.as_int())
            .and_then(|id| u32::try_from(id).ok());
        let name = self
            .store
            .read(PLAYER_NAME_KEY)
            .await?
            .and_then(|value| value.as_text().map(str::to_owned))
            .unwrap_or_default();

        let identity = match (logged_in, player_id) {
            (true, Some(player_id)) => Some(SessionIdentity { player_id, name }),
            (true, None) => {
                warn!("stored session is logged in without a participant id; ignoring it");
                None
            }
            _ => None,
        };

        if let Some(identity) = &identity {
            info!(player_id = identity.player_id, "restored session");
        } else {
            debug!("no stored session");
        }
        self.publish(identity.clone());
        Ok(identity)
    }

    /// Persist a logged-in identity and publish it. Saving the current identity again is a no-op
    /// for subscribers.
    pub async fn save(&self, player_id: u32, name: &str) -> StoreResult<()> {
        self.store
            .edit(vec![
                Edit::Put(PLAYER_ID_KEY, StoredValue::Int(i64::from(player_id))),
                Edit::Put(PLAYER_NAME_KEY, StoredValue::Text(name.to_string())),
                Edit::Put(LOGGED_IN_KEY, StoredValue::Bool(true)),
            ])
            .await?;
        self.publish(Some(SessionIdentity {
            player_id,
            name: name.to_string(),
        }));
        Ok(())
    }

    /// Forget the identity; clearing an empty session is a no-op.
    pub async fn clear(&self) -> StoreResult<()> {
        self.store
            .edit(vec![
                Edit::Remove(PLAYER_ID_KEY),
                Edit::Remove(PLAYER_NAME_KEY),
                Edit::Remove(LOGGED_IN_KEY),
            ])
            .await?;
        self.publish(None);
        Ok(())
    }

    fn publish(&self, identity: Option<SessionIdentity>) {
        self.identity.send_if_modified(|current| {
            if *current == identity {
                false
            } else {
                *current = identity;
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::session_store::InMemoryKeyValueStore;

    fn service() -> (SessionService, InMemoryKeyValueStore) {
        let store = InMemoryKeyValueStore::new();
        (SessionService::new(Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn save_then_restore() {
        let (service, store) = service();
        service.save(7, "mio").await.unwrap();
        assert_eq!(store.len(), 3);

        let restored = SessionService::new(Arc::new(store));
        let identity = restored.restore().await.unwrap();
        assert_eq!(
            identity,
            Some(SessionIdentity {
                player_id: 7,
                name: "mio".into()
            })
        );
        assert_eq!(restored.current_identity(), identity);
    }

    #[tokio::test]
    async fn save_is_idempotent_for_subscribers() {
        let (service, _store) = service();
        service.save(7, "mio").await.unwrap();

        let mut rx = service.subscribe();
        rx.mark_unchanged();
        service.save(7, "mio").await.unwrap();
        assert!(!rx.has_changed().unwrap());

        service.save(9, "rin").await.unwrap();
        assert!(rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn clear_removes_every_key() {
        let (service, store) = service();
        service.save(7, "mio").await.unwrap();
        service.clear().await.unwrap();
        service.clear().await.unwrap();

        assert!(store.is_empty());
        assert_eq!(service.current_identity(), None);
    }

    #[tokio::test]
    async fn logged_out_flag_wins_over_stale_id() {
        let (service, store) = service();
        store
            .edit(vec![
                Edit::Put(PLAYER_ID_KEY, StoredValue::Int(7)),
                Edit::Put(LOGGED_IN_KEY, StoredValue::Bool(false)),
            ])
            .await
            .unwrap();
        assert_eq!(service.restore().await.unwrap(), None);
    }
}
