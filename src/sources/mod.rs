//! # Sources Module
//!
//! Local track store for Comfy Kino.
//!
//! The store is a root directory with one sub-folder per origin (a film, an
//! album, a game soundtrack...). Every folder holds its audio files plus one
//! shared metadata record and one cover image:
//!
//! ```text
//! music/
//! ├── Spirited Away/
//! │   ├── info.json      {"origin": "...", "year": 2001, "composer": "..."}
//! │   ├── cover.jpg
//! │   ├── One Summer's Day.mp3
//! │   └── The Dragon Boy.flac
//! └── Totoro/
//!     └── ...
//! ```
//!
//! - [`library`] scans the store into an ordered catalog of [`TrackEntry`]
//! - [`metadata`] resolves an entry into a full [`Track`] for announcements

pub mod library;
pub mod metadata;

use std::path::{Path, PathBuf};

pub use library::TrackLibrary;
pub use metadata::MetadataResolver;

/// Elemento de la playlist: todo lo que se puede derivar de la ruta sola
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackEntry {
    pub path: PathBuf,
    pub folder: String,
    pub display_name: String,
}

impl TrackEntry {
    /// Construye la entrada a partir de la ruta del archivo.
    ///
    /// `display_name` es el nombre del archivo sin su extensión, quitada sólo
    /// si coincide exactamente con una de `extensions`.
    pub fn new(path: impl Into<PathBuf>, extensions: &[String]) -> Self {
        let path = path.into();

        let folder = path
            .parent()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let display_name = strip_audio_extension(&file_name, extensions)
            .unwrap_or(&file_name)
            .to_string();

        Self {
            path,
            folder,
            display_name,
        }
    }

    /// Texto usado en los listados de la cola
    pub fn label(&self) -> String {
        format!("{} - {}", self.folder, self.display_name)
    }
}

/// Metadatos compartidos por todos los tracks de una carpeta
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct FolderMetadata {
    pub origin: String,
    #[serde(deserialize_with = "metadata::year_from_text_or_number")]
    pub year: String,
    pub composer: String,
}

/// Track completamente resuelto, listo para anunciarse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub path: PathBuf,
    pub folder: String,
    pub display_name: String,
    pub origin: String,
    pub year: String,
    pub composer: String,
    pub cover_path: PathBuf,
}

impl Track {
    pub fn from_parts(entry: TrackEntry, metadata: FolderMetadata, cover_path: PathBuf) -> Self {
        Self {
            path: entry.path,
            folder: entry.folder,
            display_name: entry.display_name,
            origin: metadata.origin,
            year: metadata.year,
            composer: metadata.composer,
            cover_path,
        }
    }
}

/// Quita la extensión de audio si el nombre termina exactamente en una de ellas
pub fn strip_audio_extension<'a>(file_name: &'a str, extensions: &[String]) -> Option<&'a str> {
    extensions
        .iter()
        .find_map(|ext| file_name.strip_suffix(ext.as_str()))
        .filter(|stem| !stem.is_empty())
}

/// Normaliza una lista de extensiones (`"mp3"`, `".FLAC"`) a la forma `".mp3"`
pub fn normalize_extensions<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{}", ext))
        .collect()
}
