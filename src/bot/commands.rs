use anyhow::Result;
use serenity::{
    builder::{CreateCommand, CreateCommandOption},
    model::{application::CommandOptionType, id::GuildId},
    prelude::Context,
};

/// Todos los comandos slash del bot
pub fn all_commands() -> Vec<CreateCommand> {
    vec![
        play_command(),
        start_command(),
        skip_command(),
        stop_command(),
        pause_command(),
        unpause_command(),
        shuffle_command(),
        reset_command(),
        loop_command(),
        queue_command(),
        nowplaying_command(),
    ]
}

/// Registra comandos globales
pub async fn register_global_commands(ctx: &Context) -> Result<()> {
    for command in all_commands() {
        ctx.http.create_global_command(&command).await?;
    }

    Ok(())
}

/// Registra comandos para una guild específica (desarrollo)
pub async fn register_guild_commands(ctx: &Context, guild_id: GuildId) -> Result<()> {
    guild_id.set_commands(&ctx.http, all_commands()).await?;

    Ok(())
}

// Comandos de reproducción

fn play_command() -> CreateCommand {
    CreateCommand::new("play").description("Play the whole library in order")
}

fn start_command() -> CreateCommand {
    CreateCommand::new("start").description("Play the whole library shuffled, in loop mode")
}

fn skip_command() -> CreateCommand {
    CreateCommand::new("skip").description("Skip the current track")
}

fn stop_command() -> CreateCommand {
    CreateCommand::new("stop").description("Stop playing and delete the queue")
}

fn pause_command() -> CreateCommand {
    CreateCommand::new("pause").description("Pause playback")
}

fn unpause_command() -> CreateCommand {
    CreateCommand::new("unpause").description("Resume playback")
}

// Comandos de cola

fn shuffle_command() -> CreateCommand {
    CreateCommand::new("shuffle").description("Shuffle the queue, keeping the current track")
}

fn reset_command() -> CreateCommand {
    CreateCommand::new("reset").description("Restore the library order, keeping the current track")
}

fn loop_command() -> CreateCommand {
    CreateCommand::new("loop").description("Toggle loop mode")
}

fn queue_command() -> CreateCommand {
    CreateCommand::new("queue")
        .description("Show the queue")
        .add_option(
            CreateCommandOption::new(CommandOptionType::Integer, "page", "Page number")
                .min_int_value(1),
        )
}

fn nowplaying_command() -> CreateCommand {
    CreateCommand::new("nowplaying").description("Show the current track")
}
