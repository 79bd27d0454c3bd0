use serenity::{
    model::{
        id::{ChannelId, GuildId, UserId},
        voice::VoiceState,
    },
    prelude::Context,
};

/// Canal de voz en el que está el usuario, según la caché
pub fn user_voice_channel(ctx: &Context, guild_id: GuildId, user_id: UserId) -> Option<ChannelId> {
    ctx.cache
        .guild(guild_id)?
        .voice_states
        .get(&user_id)
        .and_then(|state| state.channel_id)
}

/// Guild de la que el bot fue sacado del canal de voz, si este cambio lo indica
pub fn bot_left_voice(
    bot_id: UserId,
    old: Option<&VoiceState>,
    new: &VoiceState,
) -> Option<GuildId> {
    if new.user_id != bot_id || new.channel_id.is_some() {
        return None;
    }
    let was_connected = old.is_some_and(|state| state.channel_id.is_some());
    if was_connected {
        new.guild_id
    } else {
        None
    }
}
