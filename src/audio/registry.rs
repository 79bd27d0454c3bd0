use dashmap::{mapref::entry::Entry, DashMap};
use serenity::model::id::GuildId;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::sync::Mutex;
use tracing::info;

use super::session::{PlaybackSession, SessionId, SharedSession};
use crate::error::RegistryError;

#[derive(Debug)]
struct Registered {
    id: SessionId,
    session: SharedSession,
}

/// Mapa `guild → sesión` de todo el proceso.
///
/// Es el único punto donde nacen y mueren sesiones. La inserción comprueba
/// y escribe bajo el mismo lock de shard, de modo que nunca conviven dos
/// sesiones para una misma guild.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<GuildId, Registered>,
    next_id: AtomicU64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, guild_id: GuildId) -> Option<SharedSession> {
        self.sessions.get(&guild_id).map(|entry| entry.session.clone())
    }

    /// Crea la sesión de la guild si no existe ninguna
    pub fn create<F>(&self, guild_id: GuildId, factory: F) -> Result<SharedSession, RegistryError>
    where
        F: FnOnce(SessionId) -> PlaybackSession,
    {
        match self.sessions.entry(guild_id) {
            Entry::Occupied(_) => Err(RegistryError::AlreadyActive(guild_id)),
            Entry::Vacant(slot) => {
                let id = SessionId(self.next_id.fetch_add(1, Ordering::Relaxed));
                let session = Arc::new(Mutex::new(factory(id)));
                slot.insert(Registered {
                    id,
                    session: session.clone(),
                });
                info!("🆕 Sesión {:?} creada para guild {}", id, guild_id);
                Ok(session)
            }
        }
    }

    #[cfg(test)]
    pub fn remove(&self, guild_id: GuildId) -> Option<SharedSession> {
        let removed = self.sessions.remove(&guild_id).map(|(_, entry)| entry.session);
        if removed.is_some() {
            info!("🗑️ Sesión eliminada para guild {}", guild_id);
        }
        removed
    }

    /// Elimina la sesión sólo si la registrada sigue siendo `session_id`
    pub fn remove_session(&self, guild_id: GuildId, session_id: SessionId) -> bool {
        let removed = self
            .sessions
            .remove_if(&guild_id, |_, entry| entry.id == session_id)
            .is_some();
        if removed {
            info!("🗑️ Sesión {:?} eliminada para guild {}", session_id, guild_id);
        }
        removed
    }

    pub fn contains_session(&self, guild_id: GuildId, session_id: SessionId) -> bool {
        self.sessions
            .get(&guild_id)
            .is_some_and(|entry| entry.id == session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    #[cfg(test)]
    pub fn guilds(&self) -> Vec<GuildId> {
        self.sessions.iter().map(|entry| *entry.key()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::reply::{Reply, ReplySink};
    use async_trait::async_trait;
    use serenity::model::id::ChannelId;

    struct Discard;

    #[async_trait]
    impl ReplySink for Discard {
        async fn send(&self, _reply: Reply) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn session(id: SessionId, guild: GuildId) -> PlaybackSession {
        PlaybackSession::new(id, guild, ChannelId::new(10), Arc::new(Discard))
    }

    #[test]
    fn test_create_rejects_second_session() {
        let registry = SessionRegistry::new();
        let guild = GuildId::new(1);

        assert!(registry.create(guild, |id| session(id, guild)).is_ok());
        assert_eq!(
            registry.create(guild, |id| session(id, guild)).unwrap_err(),
            RegistryError::AlreadyActive(guild)
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_guilds_are_independent() {
        let registry = SessionRegistry::new();
        for raw in 1..=3 {
            let guild = GuildId::new(raw);
            registry.create(guild, |id| session(id, guild)).unwrap();
        }

        let mut guilds = registry.guilds();
        guilds.sort();
        assert_eq!(guilds, vec![GuildId::new(1), GuildId::new(2), GuildId::new(3)]);
    }

    #[test]
    fn test_remove_session_ignores_newer_session() {
        let registry = SessionRegistry::new();
        let guild = GuildId::new(1);

        let old = registry.create(guild, |id| session(id, guild)).unwrap();
        let old_id = old.try_lock().unwrap().id;
        assert!(registry.remove(guild).is_some());

        let new = registry.create(guild, |id| session(id, guild)).unwrap();
        let new_id = new.try_lock().unwrap().id;
        assert_ne!(old_id, new_id);

        assert!(!registry.remove_session(guild, old_id));
        assert!(registry.contains_session(guild, new_id));
        assert!(registry.remove_session(guild, new_id));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_concurrent_create_yields_one_session() {
        let registry = Arc::new(SessionRegistry::new());
        let guild = GuildId::new(42);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || registry.create(guild, |id| session(id, guild)).is_ok())
            })
            .collect();

        let created = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(created, 1);
        assert_eq!(registry.len(), 1);
    }
}
