//! Capacidad de reproducción que el motor usa sin conocer el transporte.
//!
//! En producción la implementa [`crate::audio::player::SongbirdDevice`]; en
//! los tests un dispositivo falso que dispara `finished` a demanda.

use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use std::{path::Path, sync::Arc};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::DeviceError;

/// Conecta una guild a un canal de voz y entrega el handle del reproductor
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlaybackDevice: Send + Sync {
    async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Arc<dyn DeviceHandle>, DeviceError>;
}

/// Reproductor conectado de una guild.
///
/// `disconnect` debe ser idempotente: el motor puede llamarlo sobre una
/// conexión ya liberada.
#[async_trait]
pub trait DeviceHandle: Send + Sync {
    /// Reproduce el archivo; `on_finished` se dispara cuando el track termina,
    /// sea de forma natural o por `stop`.
    async fn play(&self, track: &Path, on_finished: FinishedNotifier) -> Result<(), DeviceError>;
    async fn pause(&self) -> Result<(), DeviceError>;
    async fn resume(&self) -> Result<(), DeviceError>;
    async fn stop(&self) -> Result<(), DeviceError>;
    async fn disconnect(&self) -> Result<(), DeviceError>;
}

/// Notificación de fin de track que vuelve a entrar al motor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackFinished {
    pub guild_id: GuildId,
    /// Identifica la reproducción concreta que terminó
    pub token: u64,
}

/// Se entrega al dispositivo en cada `play`
#[derive(Debug, Clone)]
pub struct FinishedNotifier {
    tx: mpsc::UnboundedSender<TrackFinished>,
    event: TrackFinished,
}

impl FinishedNotifier {
    pub(crate) fn new(tx: mpsc::UnboundedSender<TrackFinished>, event: TrackFinished) -> Self {
        Self { tx, event }
    }

    pub fn event(&self) -> TrackFinished {
        self.event
    }

    pub fn notify(&self) {
        if self.tx.send(self.event).is_err() {
            debug!(
                "Canal de avance cerrado, fin de track ignorado en guild {}",
                self.event.guild_id
            );
        }
    }
}

/// Extremo receptor de las notificaciones de fin de track
pub struct FinishedEvents {
    rx: mpsc::UnboundedReceiver<TrackFinished>,
}

impl FinishedEvents {
    pub(crate) fn channel() -> (mpsc::UnboundedSender<TrackFinished>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }

    pub async fn recv(&mut self) -> Option<TrackFinished> {
        self.rx.recv().await
    }

    #[cfg(test)]
    pub fn try_recv(&mut self) -> Option<TrackFinished> {
        self.rx.try_recv().ok()
    }
}
