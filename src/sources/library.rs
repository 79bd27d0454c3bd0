use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::{strip_audio_extension, TrackEntry};
use crate::error::LibraryError;

/// Catálogo de la biblioteca local: `<root>/<carpeta>/<archivo de audio>`
#[derive(Debug, Clone)]
pub struct TrackLibrary {
    root: PathBuf,
    extensions: Vec<String>,
}

impl TrackLibrary {
    pub fn new(root: impl Into<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            root: root.into(),
            extensions,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Escanea la biblioteca en orden carpeta-luego-archivo.
    ///
    /// Sólo se recorre un nivel de carpetas bajo la raíz; los archivos sueltos
    /// en la raíz y las entradas ocultas se ignoran. Una carpeta sin audio no
    /// aporta nada, pero una raíz ilegible es un error.
    pub fn scan(&self) -> Result<Vec<TrackEntry>, LibraryError> {
        std::fs::read_dir(&self.root).map_err(|source| LibraryError::Unavailable {
            root: self.root.clone(),
            source,
        })?;

        let walker = WalkDir::new(&self.root)
            .follow_links(true)
            .min_depth(2)
            .max_depth(2)
            .sort_by_file_name();

        let mut tracks = Vec::new();

        for entry in walker
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("⚠️ Entrada ilegible en la biblioteca: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let Some(name) = entry.file_name().to_str() else {
                debug!("Nombre no UTF-8 ignorado: {}", entry.path().display());
                continue;
            };

            if strip_audio_extension(name, &self.extensions).is_some() {
                tracks.push(TrackEntry::new(entry.path(), &self.extensions));
            }
        }

        info!(
            "📚 Biblioteca escaneada: {} canciones en {}",
            tracks.len(),
            self.root.display()
        );
        Ok(tracks)
    }

    /// Escanea en un hilo bloqueante para no frenar el runtime
    pub async fn scan_async(&self) -> Result<Vec<TrackEntry>, LibraryError> {
        let library = self.clone();
        tokio::task::spawn_blocking(move || library.scan()).await?
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}
