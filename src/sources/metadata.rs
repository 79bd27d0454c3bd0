use serde::{Deserialize, Deserializer};
use std::{io::ErrorKind, path::Path, path::PathBuf};
use tracing::debug;

use super::{FolderMetadata, Track, TrackEntry};
use crate::error::MetadataError;

/// Resuelve una ruta de track a su descriptor completo leyendo el registro
/// de metadatos compartido de su carpeta.
#[derive(Debug, Clone)]
pub struct MetadataResolver {
    extensions: Vec<String>,
    metadata_file: String,
    cover_file: String,
}

impl MetadataResolver {
    pub fn new(extensions: Vec<String>, metadata_file: String, cover_file: String) -> Self {
        Self {
            extensions,
            metadata_file,
            cover_file,
        }
    }

    pub async fn resolve(&self, track_path: &Path) -> Result<Track, MetadataError> {
        let folder = track_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| MetadataError::NoFolder {
                path: track_path.to_path_buf(),
            })?;

        let metadata = self.load_folder(folder).await?;
        let entry = TrackEntry::new(track_path, &self.extensions);

        Ok(Track::from_parts(
            entry,
            metadata,
            folder.join(&self.cover_file),
        ))
    }

    async fn load_folder(&self, folder: &Path) -> Result<FolderMetadata, MetadataError> {
        let record: PathBuf = folder.join(&self.metadata_file);

        let raw = match tokio::fs::read_to_string(&record).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(MetadataError::Missing {
                    folder: folder.to_path_buf(),
                })
            }
            Err(source) => {
                return Err(MetadataError::Unreadable {
                    path: record,
                    source,
                })
            }
        };

        let metadata = serde_json::from_str(&raw)
            .map_err(|source| MetadataError::Malformed { path: record.clone(), source })?;

        debug!("📄 Metadatos cargados de {}", record.display());
        Ok(metadata)
    }
}

/// `year` llega como texto (`"1988"`) o como número (`1988`)
pub(super) fn year_from_text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Year {
        Text(String),
        Number(i64),
    }

    Ok(match Year::deserialize(deserializer)? {
        Year::Text(text) => text,
        Year::Number(number) => number.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::normalize_extensions;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn resolver() -> MetadataResolver {
        MetadataResolver::new(
            normalize_extensions(["mp3", "flac"]),
            "info.json".to_string(),
            "cover.jpg".to_string(),
        )
    }

    #[tokio::test]
    async fn test_resolve_overlays_folder_metadata() {
        let dir = tempdir().unwrap();
        let folder = dir.path().join("Totoro");
        fs::create_dir_all(&folder).unwrap();
        fs::write(
            folder.join("info.json"),
            r#"{"origin": "My Neighbor Totoro", "year": 1988, "composer": "Joe Hisaishi", "notes": "ignored"}"#,
        )
        .unwrap();
        let song = folder.join("Path of the Wind.flac");
        fs::write(&song, b"x").unwrap();

        let track = resolver().resolve(&song).await.unwrap();
        assert_eq!(
            track,
            Track {
                path: song.clone(),
                folder: "Totoro".to_string(),
                display_name: "Path of the Wind".to_string(),
                origin: "My Neighbor Totoro".to_string(),
                year: "1988".to_string(),
                composer: "Joe Hisaishi".to_string(),
                cover_path: folder.join("cover.jpg"),
            }
        );
    }

    #[tokio::test]
    async fn test_resolve_accepts_textual_year() {
        let dir = tempdir().unwrap();
        let folder = dir.path().join("Kiki");
        fs::create_dir_all(&folder).unwrap();
        fs::write(
            folder.join("info.json"),
            r#"{"origin": "Kiki's Delivery Service", "year": "1989", "composer": "Joe Hisaishi"}"#,
        )
        .unwrap();

        let track = resolver().resolve(&folder.join("a.mp3")).await.unwrap();
        assert_eq!(track.year, "1989");
    }

    #[tokio::test]
    async fn test_resolve_missing_record() {
        let dir = tempdir().unwrap();
        let folder = dir.path().join("Bare");
        fs::create_dir_all(&folder).unwrap();

        let err = resolver().resolve(&folder.join("a.mp3")).await.unwrap_err();
        assert!(matches!(err, MetadataError::Missing { folder: f } if f == folder));
    }

    #[tokio::test]
    async fn test_resolve_malformed_record() {
        let dir = tempdir().unwrap();
        let folder = dir.path().join("Broken");
        fs::create_dir_all(&folder).unwrap();
        fs::write(folder.join("info.json"), r#"{"origin": "Half"}"#).unwrap();

        let err = resolver().resolve(&folder.join("a.mp3")).await.unwrap_err();
        assert!(matches!(err, MetadataError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_resolve_bare_file_name_has_no_folder() {
        let err = resolver().resolve(Path::new("a.mp3")).await.unwrap_err();
        assert!(matches!(err, MetadataError::NoFolder { .. }));
    }
}
