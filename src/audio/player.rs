use async_trait::async_trait;
use parking_lot::Mutex as SyncMutex;
use serenity::model::id::{ChannelId, GuildId};
use songbird::{
    error::JoinError, input::File, tracks::TrackHandle, Call, Event, EventContext,
    EventHandler as VoiceEventHandler, Songbird, TrackEvent,
};
use std::{path::Path, sync::Arc};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use super::device::{DeviceHandle, FinishedNotifier, PlaybackDevice};
use crate::error::DeviceError;

/// Dispositivo de reproducción sobre Songbird
pub struct SongbirdDevice {
    manager: Arc<Songbird>,
    volume: f32,
}

impl SongbirdDevice {
    pub fn new(manager: Arc<Songbird>, volume: f32) -> Self {
        Self {
            manager,
            volume: volume.clamp(0.0, 2.0),
        }
    }
}

#[async_trait]
impl PlaybackDevice for SongbirdDevice {
    async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Arc<dyn DeviceHandle>, DeviceError> {
        let call = self.manager.join(guild_id, channel_id).await.map_err(|e| {
            error!("Error al obtener handler de voz: {:?}", e);
            DeviceError::Connect(e.to_string())
        })?;

        info!("🔊 Unido al canal {} en guild {}", channel_id, guild_id);
        Ok(Arc::new(VoiceConnection {
            manager: self.manager.clone(),
            guild_id,
            call,
            volume: self.volume,
            current: SyncMutex::new(None),
        }))
    }
}

/// Llamada de voz activa de una guild y su track en curso
pub struct VoiceConnection {
    manager: Arc<Songbird>,
    guild_id: GuildId,
    call: Arc<Mutex<Call>>,
    volume: f32,
    current: SyncMutex<Option<TrackHandle>>,
}

impl VoiceConnection {
    fn current(&self) -> Option<TrackHandle> {
        self.current.lock().clone()
    }
}

#[async_trait]
impl DeviceHandle for VoiceConnection {
    async fn play(&self, track: &Path, on_finished: FinishedNotifier) -> Result<(), DeviceError> {
        let input = File::new(track.to_path_buf());

        let handle = {
            let mut call = self.call.lock().await;
            call.play_only_input(input.into())
        };

        if let Err(e) = handle.set_volume(self.volume) {
            debug!("No se pudo ajustar el volumen: {}", e);
        }

        // End y Error pueden llegar los dos; el motor descarta el duplicado
        handle
            .add_event(
                Event::Track(TrackEvent::End),
                TrackEndHandler {
                    notifier: on_finished.clone(),
                },
            )
            .map_err(|e| DeviceError::Playback(format!("Error al agregar event handler: {}", e)))?;
        handle
            .add_event(
                Event::Track(TrackEvent::Error),
                TrackErrorHandler {
                    notifier: on_finished,
                },
            )
            .map_err(|e| DeviceError::Playback(format!("Error al agregar event handler: {}", e)))?;

        *self.current.lock() = Some(handle);
        Ok(())
    }

    async fn pause(&self) -> Result<(), DeviceError> {
        match self.current() {
            Some(track) => track.pause().map_err(|e| DeviceError::Control(e.to_string())),
            None => Ok(()),
        }
    }

    async fn resume(&self) -> Result<(), DeviceError> {
        match self.current() {
            Some(track) => track.play().map_err(|e| DeviceError::Control(e.to_string())),
            None => Ok(()),
        }
    }

    async fn stop(&self) -> Result<(), DeviceError> {
        let track = self.current.lock().take();
        match track {
            Some(track) => track.stop().map_err(|e| DeviceError::Control(e.to_string())),
            None => Ok(()),
        }
    }

    async fn disconnect(&self) -> Result<(), DeviceError> {
        self.current.lock().take();
        match self.manager.remove(self.guild_id).await {
            Ok(()) | Err(JoinError::NoCall) => {
                info!("👋 Desconectado del canal de voz en guild {}", self.guild_id);
                Ok(())
            }
            Err(e) => Err(DeviceError::Disconnect(e.to_string())),
        }
    }
}

/// Fin natural del track, o detenido con `stop`
struct TrackEndHandler {
    notifier: FinishedNotifier,
}

#[async_trait]
impl VoiceEventHandler for TrackEndHandler {
    async fn act(&self, _ctx: &EventContext<'_>) -> Option<Event> {
        debug!("Track terminado en guild {}", self.notifier.event().guild_id);
        self.notifier.notify();
        None
    }
}

struct TrackErrorHandler {
    notifier: FinishedNotifier,
}

#[async_trait]
impl VoiceEventHandler for TrackErrorHandler {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if let EventContext::Track(track_list) = ctx {
            for (state, _handle) in *track_list {
                error!(
                    "❌ Error en track para guild {}: {:?}",
                    self.notifier.event().guild_id,
                    state.playing
                );
            }
        }
        self.notifier.notify();
        None
    }
}
