use serenity::{
    all::ButtonStyle,
    builder::{CreateActionRow, CreateButton},
};

use crate::audio::queue::QueuePage;

/// Prefijo de los `custom_id` de la tarjeta de cola: `queue:<acción>:<página>`
pub const QUEUE_PREFIX: &str = "queue";

/// Botón pulsado en una tarjeta de cola
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueButton {
    First,
    Prev,
    Shuffle,
    Next,
    Last,
}

impl QueueButton {
    fn action(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Prev => "prev",
            Self::Shuffle => "shuffle",
            Self::Next => "next",
            Self::Last => "last",
        }
    }

    fn emoji(self) -> char {
        match self {
            Self::First => '⏪',
            Self::Prev => '◀',
            Self::Shuffle => '🔀',
            Self::Next => '▶',
            Self::Last => '⏩',
        }
    }

    fn style(self) -> ButtonStyle {
        match self {
            Self::Prev | Self::Next => ButtonStyle::Primary,
            _ => ButtonStyle::Secondary,
        }
    }

    fn from_action(action: &str) -> Option<Self> {
        match action {
            "first" => Some(Self::First),
            "prev" => Some(Self::Prev),
            "shuffle" => Some(Self::Shuffle),
            "next" => Some(Self::Next),
            "last" => Some(Self::Last),
            _ => None,
        }
    }
}

/// Acción decodificada de un `custom_id`: qué botón y qué página mostrar después
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueAction {
    pub button: QueueButton,
    pub page: usize,
}

impl QueueAction {
    pub fn custom_id(&self) -> String {
        format!("{}:{}:{}", QUEUE_PREFIX, self.button.action(), self.page)
    }

    pub fn parse(custom_id: &str) -> Option<Self> {
        let mut parts = custom_id.splitn(3, ':');
        if parts.next()? != QUEUE_PREFIX {
            return None;
        }
        let button = QueueButton::from_action(parts.next()?)?;
        let page = parts.next()?.parse().ok().filter(|page| *page > 0)?;
        Some(Self { button, page })
    }
}

/// Botones que ofrece una página: primera/anterior fuera de la página 1,
/// mezclar siempre, siguiente/última fuera de la última página
pub fn queue_actions(page: &QueuePage) -> Vec<QueueAction> {
    let mut actions = Vec::with_capacity(5);
    if page.has_prev() {
        actions.push(QueueAction { button: QueueButton::First, page: 1 });
        actions.push(QueueAction { button: QueueButton::Prev, page: page.page_number - 1 });
    }
    if page.navigation.shuffle {
        actions.push(QueueAction { button: QueueButton::Shuffle, page: page.page_number });
    }
    if page.has_next() {
        actions.push(QueueAction { button: QueueButton::Next, page: page.page_number + 1 });
        actions.push(QueueAction { button: QueueButton::Last, page: page.total_pages });
    }
    actions
}

/// Fila de navegación de la tarjeta de cola
pub fn create_queue_buttons(page: &QueuePage) -> Vec<CreateActionRow> {
    let buttons: Vec<CreateButton> = queue_actions(page)
        .into_iter()
        .map(|action| {
            CreateButton::new(action.custom_id())
                .emoji(action.button.emoji())
                .style(action.button.style())
        })
        .collect();

    if buttons.is_empty() {
        Vec::new()
    } else {
        vec![CreateActionRow::Buttons(buttons)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::queue::{paginate, Playlist};
    use crate::sources::{normalize_extensions, TrackEntry};
    use pretty_assertions::assert_eq;

    fn page_of(count: usize, page: usize) -> QueuePage {
        let extensions = normalize_extensions(["mp3"]);
        let playlist = Playlist::from(
            (0..count)
                .map(|i| TrackEntry::new(format!("/music/Ponyo/{}.mp3", i), &extensions))
                .collect::<Vec<_>>(),
        );
        paginate(&playlist, Some(page)).unwrap()
    }

    fn ids(page: &QueuePage) -> Vec<String> {
        queue_actions(page).iter().map(QueueAction::custom_id).collect()
    }

    #[test]
    fn test_first_page_only_moves_forward() {
        assert_eq!(
            ids(&page_of(12, 1)),
            vec!["queue:shuffle:1", "queue:next:2", "queue:last:3"]
        );
    }

    #[test]
    fn test_middle_page_has_all_buttons() {
        assert_eq!(
            ids(&page_of(12, 2)),
            vec![
                "queue:first:1",
                "queue:prev:1",
                "queue:shuffle:2",
                "queue:next:3",
                "queue:last:3",
            ]
        );
    }

    #[test]
    fn test_single_page_only_shuffles() {
        assert_eq!(ids(&page_of(3, 1)), vec!["queue:shuffle:1"]);
    }

    #[test]
    fn test_parse_custom_ids() {
        assert_eq!(
            QueueAction::parse("queue:prev:4"),
            Some(QueueAction { button: QueueButton::Prev, page: 4 })
        );
        assert_eq!(QueueAction::parse("queue:shuffle:0"), None);
        assert_eq!(QueueAction::parse("queue:volume:1"), None);
        assert_eq!(QueueAction::parse("music_skip"), None);
    }
}
