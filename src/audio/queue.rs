use rand::{seq::SliceRandom, Rng};
use std::collections::VecDeque;
use tracing::info;

use crate::{error::PageOutOfRange, sources::TrackEntry};

/// Entradas por página en el listado de la cola
pub const PAGE_SIZE: usize = 5;

/// Playlist de una sesión.
///
/// El índice 0 (la cabeza) es siempre el track cargado en el dispositivo
/// mientras la sesión reproduce o está en pausa; ninguna operación de esta
/// estructura lo reordena salvo `rotate` y `drop_head`, que son el avance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Playlist {
    items: VecDeque<TrackEntry>,
}

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn head(&self) -> Option<&TrackEntry> {
        self.items.front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackEntry> {
        self.items.iter()
    }

    /// Avance en modo loop: la cabeza pasa al final
    pub fn rotate(&mut self) {
        if let Some(head) = self.items.pop_front() {
            self.items.push_back(head);
        }
    }

    /// Avance sin loop: la cabeza se descarta
    pub fn drop_head(&mut self) -> Option<TrackEntry> {
        self.items.pop_front()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Fisher–Yates sobre los índices 1..len, la cabeza no se mueve
    pub fn shuffle_tail<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.items.len() > 2 {
            self.items.make_contiguous()[1..].shuffle(rng);
        }
        info!("🔀 Cola mezclada ({} canciones)", self.items.len());
    }

    /// Reconstruye la playlist en orden de catálogo conservando la cabeza.
    ///
    /// La cabeza se elimina del catálogo reconstruido para no duplicarla.
    pub fn reset_from_catalog(&mut self, catalog: Vec<TrackEntry>) {
        let head = self.items.pop_front();
        self.items.clear();

        if let Some(head) = head {
            self.items.extend(catalog.into_iter().filter(|entry| entry.path != head.path));
            self.items.push_front(head);
        } else {
            self.items.extend(catalog);
        }
        info!("🔄 Cola reiniciada en orden de catálogo ({} canciones)", self.items.len());
    }

    /// Paths únicos presentes en la playlist
    #[cfg(test)]
    pub fn distinct_paths(&self) -> std::collections::HashSet<&std::path::Path> {
        self.items.iter().map(|entry| entry.path.as_path()).collect()
    }
}

impl From<Vec<TrackEntry>> for Playlist {
    fn from(entries: Vec<TrackEntry>) -> Self {
        Self {
            items: entries.into(),
        }
    }
}

/// Línea de un listado de la cola
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueLine {
    /// Posición absoluta en la cola, empezando en 1
    pub position: usize,
    pub label: String,
}

/// Qué botones de navegación se ofrecen para una página
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigation {
    pub first_prev: bool,
    pub shuffle: bool,
    pub next_last: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuePage {
    pub items: Vec<QueueLine>,
    pub page_number: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub navigation: Navigation,
}

impl QueuePage {
    pub fn has_prev(&self) -> bool {
        self.navigation.first_prev
    }

    pub fn has_next(&self) -> bool {
        self.navigation.next_last
    }
}

/// Calcula una página del listado de la cola.
///
/// Sin página pedida se muestra la primera. Una página fuera de
/// `[1, total_pages]` se rechaza; nunca se ajusta en silencio.
pub fn paginate(playlist: &Playlist, requested: Option<usize>) -> Result<QueuePage, PageOutOfRange> {
    let total_items = playlist.len();
    let total_pages = total_items.div_ceil(PAGE_SIZE).max(1);
    let page_number = requested.unwrap_or(1);

    if page_number == 0 || page_number > total_pages {
        return Err(PageOutOfRange {
            requested: page_number,
            total_pages,
        });
    }

    let start = (page_number - 1) * PAGE_SIZE;
    let items = playlist
        .iter()
        .enumerate()
        .skip(start)
        .take(PAGE_SIZE)
        .map(|(index, entry)| QueueLine {
            position: index + 1,
            label: entry.label(),
        })
        .collect();

    Ok(QueuePage {
        items,
        page_number,
        total_pages,
        total_items,
        navigation: Navigation {
            first_prev: page_number != 1,
            shuffle: true,
            next_last: page_number != total_pages,
        },
    })
}
