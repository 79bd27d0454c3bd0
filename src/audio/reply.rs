use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId, UserId};
use std::sync::Arc;
use tracing::warn;

use super::queue::QueuePage;
use crate::sources::Track;

/// Respuesta que el motor entrega al canal de texto
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    NowPlaying(Track),
    Queue(QueueView),
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

/// Página de la cola junto con el estado de la sesión
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueView {
    pub page: QueuePage,
    pub now_playing: Option<Track>,
    pub loop_enabled: bool,
    pub paused: bool,
}

/// Destino de las respuestas (una interacción, un canal de texto...)
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send(&self, reply: Reply) -> anyhow::Result<()>;
}

/// Envía y registra el fallo; una respuesta perdida no aborta la transición
pub async fn deliver(sink: &dyn ReplySink, reply: Reply) {
    if let Err(e) = sink.send(reply).await {
        warn!("⚠️ No se pudo enviar la respuesta: {:?}", e);
    }
}

/// Si una operación responde al usuario o se ejecuta en silencio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Announce {
    Verbose,
    Silent,
}

/// Quién invoca un comando y dónde contestarle
#[derive(Clone)]
pub struct CommandContext {
    pub guild_id: GuildId,
    pub user_id: UserId,
    /// Canal de voz del usuario en el momento del comando
    pub voice_channel: Option<ChannelId>,
    pub replies: Arc<dyn ReplySink>,
    /// Canal donde se anuncian los avances si este comando crea la sesión
    pub announcements: Arc<dyn ReplySink>,
}

impl CommandContext {
    pub async fn reply(&self, reply: Reply) {
        deliver(self.replies.as_ref(), reply).await;
    }

    pub async fn say(&self, text: impl Into<String>) {
        self.reply(Reply::text(text)).await;
    }
}
