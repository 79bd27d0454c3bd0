//! Discord rendering of engine replies: plain text, the now playing card
//! (with the folder cover as thumbnail) and the paginated queue card.

pub mod buttons;
pub mod embeds;

use serenity::builder::{
    CreateActionRow, CreateAttachment, CreateEmbed, CreateInteractionResponseFollowup,
    CreateInteractionResponseMessage, CreateMessage, EditInteractionResponse,
};
use tracing::debug;

use crate::audio::reply::Reply;

/// Respuesta lista para cualquier vía de envío de Discord
#[derive(Debug, Default)]
pub struct RenderedReply {
    pub content: Option<String>,
    pub embed: Option<CreateEmbed>,
    pub components: Vec<CreateActionRow>,
    pub attachment: Option<CreateAttachment>,
}

impl RenderedReply {
    pub async fn render(reply: Reply) -> Self {
        match reply {
            Reply::Text(text) => Self {
                content: Some(text),
                ..Self::default()
            },
            Reply::NowPlaying(track) => {
                let attachment = match CreateAttachment::path(&track.cover_path).await {
                    Ok(attachment) => Some(attachment),
                    Err(e) => {
                        debug!("Portada no disponible en {}: {}", track.cover_path.display(), e);
                        None
                    }
                };
                let cover = attachment.as_ref().map(|a| a.filename.as_str());
                Self {
                    embed: Some(embeds::create_now_playing_embed(&track, cover)),
                    attachment,
                    ..Self::default()
                }
            }
            Reply::Queue(view) => Self {
                embed: Some(embeds::create_queue_embed(&view)),
                components: buttons::create_queue_buttons(&view.page),
                ..Self::default()
            },
        }
    }

    pub fn is_queue_card(&self) -> bool {
        !self.components.is_empty()
    }

    pub fn into_message(self) -> CreateMessage {
        let mut message = CreateMessage::new().components(self.components);
        if let Some(content) = self.content {
            message = message.content(content);
        }
        if let Some(embed) = self.embed {
            message = message.embed(embed);
        }
        if let Some(attachment) = self.attachment {
            message = message.add_file(attachment);
        }
        message
    }

    pub fn into_response(self) -> CreateInteractionResponseMessage {
        let mut message = CreateInteractionResponseMessage::new().components(self.components);
        if let Some(content) = self.content {
            message = message.content(content);
        }
        if let Some(embed) = self.embed {
            message = message.embed(embed);
        }
        if let Some(attachment) = self.attachment {
            message = message.add_file(attachment);
        }
        message
    }

    pub fn into_followup(self) -> CreateInteractionResponseFollowup {
        let mut message = CreateInteractionResponseFollowup::new().components(self.components);
        if let Some(content) = self.content {
            message = message.content(content);
        }
        if let Some(embed) = self.embed {
            message = message.embed(embed);
        }
        if let Some(attachment) = self.attachment {
            message = message.add_file(attachment);
        }
        message
    }

    /// Reemplaza la respuesta diferida ("pensando...") de una interacción
    pub fn into_edit(self) -> EditInteractionResponse {
        let mut message = EditInteractionResponse::new().components(self.components);
        if let Some(content) = self.content {
            message = message.content(content);
        }
        if let Some(embed) = self.embed {
            message = message.embed(embed);
        }
        if let Some(attachment) = self.attachment {
            message = message.new_attachment(attachment);
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::Track;
    use std::fs;
    use tempfile::tempdir;

    fn track(cover_path: std::path::PathBuf) -> Track {
        Track {
            path: "/music/Totoro/Path of the Wind.mp3".into(),
            folder: "Totoro".to_string(),
            display_name: "Path of the Wind".to_string(),
            origin: "My Neighbor Totoro".to_string(),
            year: "1988".to_string(),
            composer: "Joe Hisaishi".to_string(),
            cover_path,
        }
    }

    #[tokio::test]
    async fn test_text_renders_as_content() {
        let rendered = RenderedReply::render(Reply::text("Queue initialized.")).await;
        assert_eq!(rendered.content.as_deref(), Some("Queue initialized."));
        assert!(rendered.embed.is_none());
        assert!(!rendered.is_queue_card());
    }

    #[tokio::test]
    async fn test_now_playing_attaches_cover() {
        let dir = tempdir().unwrap();
        let cover = dir.path().join("cover.jpg");
        fs::write(&cover, b"jpeg").unwrap();

        let rendered = RenderedReply::render(Reply::NowPlaying(track(cover))).await;
        assert!(rendered.embed.is_some());
        assert_eq!(rendered.attachment.unwrap().filename, "cover.jpg");
    }

    #[tokio::test]
    async fn test_now_playing_without_cover_still_renders() {
        let dir = tempdir().unwrap();
        let rendered =
            RenderedReply::render(Reply::NowPlaying(track(dir.path().join("cover.jpg")))).await;
        assert!(rendered.embed.is_some());
        assert!(rendered.attachment.is_none());
    }
}
