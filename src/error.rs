//! Errores tipados del motor de colas.
//!
//! Los fallos de precondición del usuario (no estar en un canal de voz, no
//! haber sesión, página fuera de rango...) no son errores: se responden como
//! mensajes normales. Aquí sólo viven los fallos de recursos, que además de
//! responderse al usuario se propagan para que el adaptador los registre.

use serenity::model::id::GuildId;
use std::path::PathBuf;
use thiserror::Error;

/// Fallos al escanear la biblioteca de música
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("music library at {root} is unavailable: {source}")]
    Unavailable {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("music library at {root} has no playable tracks")]
    Empty { root: PathBuf },

    #[error("library scan task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Fallos al resolver los metadatos compartidos de una carpeta
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("track {path} is not inside a folder")]
    NoFolder { path: PathBuf },

    #[error("folder {folder} has no metadata record")]
    Missing { folder: PathBuf },

    #[error("metadata record {path} could not be read: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("metadata record {path} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Fallos del dispositivo de reproducción (conexión de voz + reproductor)
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("could not connect to the voice channel: {0}")]
    Connect(String),

    #[error("could not start playback: {0}")]
    Playback(String),

    #[error("playback control failed: {0}")]
    Control(String),

    #[error("could not leave the voice channel: {0}")]
    Disconnect(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("guild {0} already has an active session")]
    AlreadyActive(GuildId),
}

/// Página pedida fuera de `[1, total_pages]`
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("Page {requested} doesn't exist, pick a page between 1 and {total_pages}.")]
pub struct PageOutOfRange {
    pub requested: usize,
    pub total_pages: usize,
}

/// Error agregado que devuelven los handlers del motor
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Library(#[from] LibraryError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Device(#[from] DeviceError),
}
