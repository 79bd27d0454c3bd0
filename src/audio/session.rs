use serenity::model::id::{ChannelId, GuildId};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{device::DeviceHandle, queue::Playlist, reply::ReplySink};
use crate::sources::Track;

/// Identificador único por proceso de una sesión
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u64);

/// Estado del dispositivo según el propio motor, no según el transporte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Disconnected,
    Connecting,
    Playing,
    Paused,
}

pub type SharedSession = Arc<Mutex<PlaybackSession>>;

/// Estado de reproducción de una guild
pub struct PlaybackSession {
    pub id: SessionId,
    pub guild_id: GuildId,
    pub voice_channel: ChannelId,
    pub playlist: Playlist,
    /// Metadatos resueltos de la cabeza
    pub current_track: Option<Track>,
    pub loop_enabled: bool,
    pub device_state: DeviceState,
    pub device: Option<Arc<dyn DeviceHandle>>,
    /// Token de la reproducción en curso; sólo su `finished` avanza la cola
    pub playing_token: Option<u64>,
    pub announcements: Arc<dyn ReplySink>,
}

impl PlaybackSession {
    pub fn new(
        id: SessionId,
        guild_id: GuildId,
        voice_channel: ChannelId,
        announcements: Arc<dyn ReplySink>,
    ) -> Self {
        Self {
            id,
            guild_id,
            voice_channel,
            playlist: Playlist::new(),
            current_track: None,
            loop_enabled: false,
            device_state: DeviceState::Connecting,
            device: None,
            playing_token: None,
            announcements,
        }
    }

    /// Reproduciendo o en pausa
    pub fn is_active(&self) -> bool {
        matches!(self.device_state, DeviceState::Playing | DeviceState::Paused)
    }

    /// Nombre de la cabeza para los mensajes
    pub fn head_name(&self) -> String {
        self.current_track
            .as_ref()
            .map(|t| t.display_name.clone())
            .or_else(|| self.playlist.head().map(|e| e.display_name.clone()))
            .unwrap_or_else(|| "nothing".to_string())
    }
}

impl std::fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("id", &self.id)
            .field("guild_id", &self.guild_id)
            .field("voice_channel", &self.voice_channel)
            .field("tracks", &self.playlist.len())
            .field("loop_enabled", &self.loop_enabled)
            .field("device_state", &self.device_state)
            .field("playing_token", &self.playing_token)
            .finish()
    }
}
