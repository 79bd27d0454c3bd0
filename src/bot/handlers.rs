use anyhow::Result;
use async_trait::async_trait;
use serenity::{
    builder::{CreateInteractionResponse, CreateInteractionResponseMessage},
    http::Http,
    model::{
        application::{CommandInteraction, ComponentInteraction},
        id::ChannelId,
    },
    prelude::Context,
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::{error, info};

use super::{events::user_voice_channel, KinoBot};
use crate::{
    audio::reply::{Announce, CommandContext, Reply, ReplySink},
    error::EngineError,
    ui::{
        buttons::{QueueAction, QueueButton},
        embeds, RenderedReply,
    },
};

/// Comandos slash que entiende el bot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    Play,
    Start,
    Skip,
    Stop,
    Pause,
    Unpause,
    Shuffle,
    Reset,
    Loop,
    Queue,
    NowPlaying,
}

impl BotCommand {
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "play" => Self::Play,
            "start" => Self::Start,
            "skip" => Self::Skip,
            "stop" => Self::Stop,
            "pause" => Self::Pause,
            "unpause" => Self::Unpause,
            "shuffle" => Self::Shuffle,
            "reset" => Self::Reset,
            "loop" => Self::Loop,
            "queue" => Self::Queue,
            "nowplaying" => Self::NowPlaying,
            _ => return None,
        })
    }

    /// Comandos que leen la biblioteca antes de responder
    pub fn is_slow(self) -> bool {
        matches!(self, Self::Play | Self::Start | Self::Reset)
    }
}

/// Página pedida en `/queue`; un valor negativo cae fuera de rango
fn requested_page(command: &CommandInteraction) -> Option<usize> {
    command
        .data
        .options
        .iter()
        .find(|option| option.name == "page")
        .and_then(|option| option.value.as_i64())
        .map(|page| usize::try_from(page).unwrap_or(0))
}

/// Maneja comandos slash
pub async fn handle_command(ctx: &Context, command: CommandInteraction, bot: &KinoBot) -> Result<()> {
    let guild_id = command
        .guild_id
        .ok_or_else(|| anyhow::anyhow!("Comando usado fuera de un servidor"))?;

    info!(
        "📝 Comando /{} usado por {} en guild {}",
        command.data.name, command.user.name, guild_id
    );

    let Some(kind) = BotCommand::parse(&command.data.name) else {
        command
            .create_response(
                &ctx.http,
                CreateInteractionResponse::Message(
                    CreateInteractionResponseMessage::new()
                        .embed(embeds::create_error_embed("Unknown command", "I don't know that one."))
                        .ephemeral(true),
                ),
            )
            .await?;
        return Ok(());
    };

    let page = requested_page(&command);
    let name = command.data.name.clone();
    let channel_id = command.channel_id;
    let replies = Arc::new(InteractionReplies::new(ctx.http.clone(), command));
    if kind.is_slow() {
        // Diferir antes de escanear la biblioteca
        replies.defer().await?;
    }
    let cmd = CommandContext {
        guild_id,
        user_id: replies.interaction.user.id,
        voice_channel: user_voice_channel(ctx, guild_id, replies.interaction.user.id),
        replies: replies.clone(),
        announcements: Arc::new(ChannelReplies::new(ctx.http.clone(), channel_id)),
    };

    let engine = &bot.engine;
    let result = match kind {
        BotCommand::Play => engine.play(&cmd).await,
        BotCommand::Start => engine.start(&cmd).await,
        BotCommand::Skip => engine.skip(&cmd).await,
        BotCommand::Stop => engine.stop(&cmd).await,
        BotCommand::Pause => engine.pause(&cmd).await,
        BotCommand::Unpause => engine.unpause(&cmd).await,
        BotCommand::Shuffle => engine.shuffle(&cmd, Announce::Verbose).await,
        BotCommand::Reset => engine.reset(&cmd).await,
        BotCommand::Loop => engine.toggle_loop(&cmd, Announce::Verbose).await,
        BotCommand::Queue => engine.queue(&cmd, page).await,
        BotCommand::NowPlaying => engine.now_playing(&cmd).await,
    };

    log_engine_result(&name, guild_id, result);
    Ok(())
}

/// Maneja interacciones con componentes (botones de la tarjeta de cola)
pub async fn handle_component(
    ctx: &Context,
    component: ComponentInteraction,
    bot: &KinoBot,
) -> Result<()> {
    let guild_id = component
        .guild_id
        .ok_or_else(|| anyhow::anyhow!("Componente usado fuera de un servidor"))?;

    info!(
        "🔘 Botón {} presionado por {} en guild {}",
        component.data.custom_id, component.user.name, guild_id
    );

    let Some(action) = QueueAction::parse(&component.data.custom_id) else {
        return Ok(());
    };

    let channel_id = component.channel_id;
    let replies = Arc::new(ComponentReplies::new(ctx.http.clone(), component));
    let cmd = CommandContext {
        guild_id,
        user_id: replies.interaction.user.id,
        voice_channel: user_voice_channel(ctx, guild_id, replies.interaction.user.id),
        replies: replies.clone(),
        announcements: Arc::new(ChannelReplies::new(ctx.http.clone(), channel_id)),
    };

    if action.button == QueueButton::Shuffle {
        let result = bot.engine.shuffle(&cmd, Announce::Silent).await;
        log_engine_result("queue shuffle", guild_id, result);
        // Una mezcla silenciosa sólo responde si falló una precondición
        if replies.has_responded() {
            return Ok(());
        }
    }

    let result = bot.engine.queue(&cmd, Some(action.page)).await;
    log_engine_result("queue", guild_id, result);
    Ok(())
}

fn log_engine_result(name: &str, guild_id: serenity::model::id::GuildId, result: Result<(), EngineError>) {
    if let Err(e) = result {
        error!("❌ /{} falló en guild {}: {}", name, guild_id, e);
    }
}

/// Responde a un comando slash: la primera respuesta es la de la interacción
/// (o la edición de la respuesta diferida), las siguientes son follow-ups
pub struct InteractionReplies {
    http: Arc<Http>,
    interaction: CommandInteraction,
    deferred: AtomicBool,
    responded: AtomicBool,
}

impl InteractionReplies {
    pub fn new(http: Arc<Http>, interaction: CommandInteraction) -> Self {
        Self {
            http,
            interaction,
            deferred: AtomicBool::new(false),
            responded: AtomicBool::new(false),
        }
    }

    pub async fn defer(&self) -> Result<()> {
        self.interaction.defer(&self.http).await?;
        self.deferred.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl ReplySink for InteractionReplies {
    async fn send(&self, reply: Reply) -> Result<()> {
        let rendered = RenderedReply::render(reply).await;

        if self.responded.swap(true, Ordering::SeqCst) {
            self.interaction
                .create_followup(&self.http, rendered.into_followup())
                .await?;
        } else if self.deferred.load(Ordering::SeqCst) {
            self.interaction
                .edit_response(&self.http, rendered.into_edit())
                .await?;
        } else {
            self.interaction
                .create_response(
                    &self.http,
                    CreateInteractionResponse::Message(rendered.into_response()),
                )
                .await?;
        }
        Ok(())
    }
}

/// Responde a un botón: una tarjeta de cola reemplaza el mensaje original, el
/// resto se contesta sólo a quien pulsó
pub struct ComponentReplies {
    http: Arc<Http>,
    interaction: ComponentInteraction,
    responded: AtomicBool,
}

impl ComponentReplies {
    pub fn new(http: Arc<Http>, interaction: ComponentInteraction) -> Self {
        Self {
            http,
            interaction,
            responded: AtomicBool::new(false),
        }
    }

    pub fn has_responded(&self) -> bool {
        self.responded.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReplySink for ComponentReplies {
    async fn send(&self, reply: Reply) -> Result<()> {
        let rendered = RenderedReply::render(reply).await;

        if self.responded.swap(true, Ordering::SeqCst) {
            self.interaction
                .create_followup(&self.http, rendered.into_followup().ephemeral(true))
                .await?;
            return Ok(());
        }

        let response = if rendered.is_queue_card() {
            CreateInteractionResponse::UpdateMessage(rendered.into_response())
        } else {
            CreateInteractionResponse::Message(rendered.into_response().ephemeral(true))
        };
        self.interaction.create_response(&self.http, response).await?;
        Ok(())
    }
}

/// Anuncios de la sesión en el canal de texto donde empezó
pub struct ChannelReplies {
    http: Arc<Http>,
    channel_id: ChannelId,
}

impl ChannelReplies {
    pub fn new(http: Arc<Http>, channel_id: ChannelId) -> Self {
        Self { http, channel_id }
    }
}

#[async_trait]
impl ReplySink for ChannelReplies {
    async fn send(&self, reply: Reply) -> Result<()> {
        let rendered = RenderedReply::render(reply).await;
        self.channel_id
            .send_message(&self.http, rendered.into_message())
            .await?;
        Ok(())
    }
}
