//! # Bot Module
//!
//! Discord front end for Comfy Kino.
//!
//! [`KinoBot`] implements Serenity's [`EventHandler`] and translates gateway
//! events into [`QueueEngine`] calls:
//!
//! - `ready`: registers the slash commands (per guild or global)
//! - `interaction_create`: slash commands and queue card buttons
//! - `voice_state_update`: tears the session down when the bot is removed
//!   from its voice channel from outside

use anyhow::Result;
use serenity::{
    all::{Context, EventHandler, GuildId, Interaction, Ready, VoiceState},
    async_trait,
};
use std::sync::Arc;
use tracing::{error, info, warn};

pub mod commands;
pub mod events;
pub mod handlers;

use crate::{audio::engine::QueueEngine, config::Config};

/// Main Discord bot handler.
pub struct KinoBot {
    config: Arc<Config>,
    pub engine: Arc<QueueEngine>,
}

impl KinoBot {
    pub fn new(config: Arc<Config>, engine: Arc<QueueEngine>) -> Self {
        Self { config, engine }
    }

    /// Registers slash commands with Discord.
    ///
    /// Guild commands propagate almost instantly; global ones can take up to
    /// an hour. `GUILD_ID` picks the first.
    async fn register_commands(&self, ctx: &Context) -> Result<()> {
        info!("📝 Registrando comandos slash...");
        info!("🔧 Application ID: {}", self.config.application_id);

        match self.config.guild_id {
            Some(guild_id) => {
                let guild_id = GuildId::new(guild_id);

                if !ctx.cache.guilds().contains(&guild_id) {
                    warn!("⚠️ El bot no está en la guild especificada: {}", guild_id);
                    return Ok(());
                }

                commands::register_guild_commands(ctx, guild_id).await.map_err(|e| {
                    error!("❌ Error registrando comandos de guild: {:?}", e);
                    anyhow::anyhow!("No se pudieron registrar comandos de guild. Verifica que el bot tenga permisos de 'applications.commands' en la guild.")
                })?;
                info!("✅ Comandos de guild registrados para: {}", guild_id);
            }
            None => {
                commands::register_global_commands(ctx).await.map_err(|e| {
                    error!("❌ Error registrando comandos globales: {:?}", e);
                    anyhow::anyhow!("No se pudieron registrar comandos globales. Verifica que el bot tenga permisos de 'applications.commands'.")
                })?;
                info!("✅ Comandos globales registrados");
            }
        }

        Ok(())
    }
}

#[async_trait]
impl EventHandler for KinoBot {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🤖 {} está en línea!", ready.user.name);
        info!("📊 Conectado a {} servidores", ready.guilds.len());

        if let Err(e) = self.register_commands(&ctx).await {
            error!("Error al registrar comandos: {:?}", e);
        }
    }

    /// Errors are logged but don't crash the bot.
    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command_interaction) => {
                if let Err(e) = handlers::handle_command(&ctx, command_interaction, self).await {
                    error!("Error manejando comando: {:?}", e);
                }
            }
            Interaction::Component(component_interaction) => {
                if let Err(e) = handlers::handle_component(&ctx, component_interaction, self).await
                {
                    error!("Error manejando componente: {:?}", e);
                }
            }
            _ => {}
        }
    }

    async fn voice_state_update(&self, ctx: Context, old: Option<VoiceState>, new: VoiceState) {
        let current_user_id = ctx.cache.current_user().id;
        if let Some(guild_id) = events::bot_left_voice(current_user_id, old.as_ref(), &new) {
            info!("🔌 Bot desconectado en guild {}", guild_id);
            self.engine.abandon(guild_id).await;
        }
    }
}
