use serenity::{
    all::Timestamp,
    builder::{CreateEmbed, CreateEmbedFooter},
};

use crate::{
    audio::{queue::QueuePage, reply::QueueView},
    sources::Track,
};

/// Paleta de colores estandarizada para el bot
pub mod colors {
    use serenity::all::Colour;

    pub const SUCCESS_GREEN: Colour = Colour::from_rgb(67, 181, 129);
    pub const ERROR_RED: Colour = Colour::from_rgb(220, 53, 69);
    pub const INFO_BLUE: Colour = Colour::from_rgb(52, 144, 220);
    pub const NEUTRAL_GRAY: Colour = Colour::from_rgb(108, 117, 125);
}

/// Footer estandarizado para todos los embeds
const STANDARD_FOOTER: &str = "🎞️ Comfy Kino";

/// Tarjeta de "Now playing".
///
/// `cover` es el nombre del adjunto con la portada de la carpeta, si se pudo
/// leer.
pub fn create_now_playing_embed(track: &Track, cover: Option<&str>) -> CreateEmbed {
    let mut embed = CreateEmbed::default()
        .title("🎵 Now playing")
        .description(format!("**{}**", track.display_name))
        .color(colors::SUCCESS_GREEN)
        .field("🎬 From", &track.origin, true)
        .field("📅 Year", &track.year, true)
        .field("🎼 Composer", &track.composer, true);

    if let Some(cover) = cover {
        embed = embed.thumbnail(format!("attachment://{}", cover));
    }

    embed
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

/// Crea un embed para mostrar una página de la cola
pub fn create_queue_embed(view: &QueueView) -> CreateEmbed {
    let page = &view.page;

    let mut embed = CreateEmbed::default()
        .title("📋 Queue")
        .color(colors::INFO_BLUE);

    if page.total_items == 0 {
        return embed
            .description("😴 **The queue is empty**")
            .color(colors::NEUTRAL_GRAY)
            .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
            .timestamp(Timestamp::now());
    }

    if let Some(current) = &view.now_playing {
        let status = if view.paused { "⏸️" } else { "▶️" };
        embed = embed.field(
            format!("{} Now playing", status),
            format!("**{}** - {}", current.display_name, current.origin),
            false,
        );
    }

    embed = embed
        .description(format_queue_lines(page))
        .field("Info", format_queue_info(view), false);

    embed
        .footer(CreateEmbedFooter::new(format!(
            "Page {} of {} • Comfy Kino",
            page.page_number, page.total_pages
        )))
        .timestamp(Timestamp::now())
}

/// Crea un embed de error
pub fn create_error_embed(title: &str, description: &str) -> CreateEmbed {
    CreateEmbed::default()
        .title(format!("❌ {}", title))
        .description(description)
        .color(colors::ERROR_RED)
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

fn format_queue_lines(page: &QueuePage) -> String {
    page.items
        .iter()
        .map(|line| format!("**{}**. {}", line.position, line.label))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_queue_info(view: &QueueView) -> String {
    let mut info = format!("**Total:** {} tracks", view.page.total_items);
    if view.loop_enabled {
        info.push_str(" • 🔁 **Loop**");
    }
    info
}
