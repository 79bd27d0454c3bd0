use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::sources::normalize_extensions;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    // Discord
    pub discord_token: String,
    pub application_id: u64,
    pub guild_id: Option<u64>, // Para comandos de desarrollo

    // Biblioteca
    pub music_dir: PathBuf,
    pub metadata_file: String,
    pub cover_file: String,
    /// Extensiones normalizadas (`.mp3`, `.flac`)
    pub audio_extensions: Vec<String>,

    // Audio
    pub default_volume: f32,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Construye la configuración con una fuente de variables arbitraria
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let config = Self {
            // Discord
            discord_token: var("DISCORD_TOKEN").context("DISCORD_TOKEN no está definido")?,
            application_id: var("APPLICATION_ID")
                .context("APPLICATION_ID no está definido")?
                .trim()
                .parse()
                .context("APPLICATION_ID debe ser un número")?,
            guild_id: var("GUILD_ID").and_then(|s| s.trim().parse().ok()),

            // Biblioteca
            music_dir: var("MUSIC_DIR").map(PathBuf::from).unwrap_or(defaults.music_dir),
            metadata_file: var("METADATA_FILE").unwrap_or(defaults.metadata_file),
            cover_file: var("COVER_FILE").unwrap_or(defaults.cover_file),
            audio_extensions: match var("AUDIO_EXTENSIONS") {
                Some(raw) => normalize_extensions(raw.split(',')),
                None => defaults.audio_extensions,
            },

            // Audio
            default_volume: match var("DEFAULT_VOLUME") {
                Some(raw) => raw.trim().parse().context("DEFAULT_VOLUME debe ser un número")?,
                None => defaults.default_volume,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates configuration values for correctness.
    ///
    /// # Validation Rules
    ///
    /// - Volume must be between 0.0 and 2.0
    /// - At least one audio extension
    /// - Metadata and cover file names must not be empty
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.default_volume) {
            anyhow::bail!("Default volume must be between 0.0 and 2.0, got: {}", self.default_volume);
        }

        if self.audio_extensions.is_empty() {
            anyhow::bail!("At least one audio extension is required");
        }

        if self.metadata_file.trim().is_empty() || self.cover_file.trim().is_empty() {
            anyhow::bail!("Metadata and cover file names cannot be empty");
        }

        Ok(())
    }

    /// Returns a summary of the current configuration for logging.
    ///
    /// The Discord token is never included.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Discord: App ID {} (Guild: {})\n  \
            Library: {} ({}, cover {})\n  \
            Audio: {}% vol, extensions {}",
            self.application_id,
            self.guild_id.map_or("global".to_string(), |id| id.to_string()),
            self.music_dir.display(),
            self.metadata_file,
            self.cover_file,
            (self.default_volume * 100.0) as u32,
            self.audio_extensions.join(", "),
        )
    }
}

/// Default configuration values.
///
/// Used as fallbacks when environment variables are not provided.
impl Default for Config {
    fn default() -> Self {
        Self {
            // Discord (no defaults - must be provided)
            discord_token: String::new(),
            application_id: 0,
            guild_id: None,

            music_dir: "./music".into(),
            metadata_file: "info.json".to_string(),
            cover_file: "cover.jpg".to_string(),
            audio_extensions: normalize_extensions(["mp3", "flac"]),

            default_volume: 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_apply() {
        let config =
            Config::from_lookup(lookup(&[("DISCORD_TOKEN", "secret"), ("APPLICATION_ID", "42")]))
                .unwrap();

        assert_eq!(config.application_id, 42);
        assert_eq!(config.guild_id, None);
        assert_eq!(config.music_dir, PathBuf::from("./music"));
        assert_eq!(config.audio_extensions, vec![".mp3", ".flac"]);
        assert_eq!(config.default_volume, 0.5);
    }

    #[test]
    fn test_overrides_and_extension_normalization() {
        let config = Config::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "secret"),
            ("APPLICATION_ID", "42"),
            ("GUILD_ID", "7"),
            ("MUSIC_DIR", "/srv/music"),
            ("AUDIO_EXTENSIONS", "OGG, .wav"),
            ("DEFAULT_VOLUME", "1.5"),
        ]))
        .unwrap();

        assert_eq!(config.guild_id, Some(7));
        assert_eq!(config.music_dir, PathBuf::from("/srv/music"));
        assert_eq!(config.audio_extensions, vec![".ogg", ".wav"]);
        assert_eq!(config.default_volume, 1.5);
    }

    #[test]
    fn test_missing_token_fails() {
        assert!(Config::from_lookup(lookup(&[("APPLICATION_ID", "42")])).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let loud = Config::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "secret"),
            ("APPLICATION_ID", "42"),
            ("DEFAULT_VOLUME", "3"),
        ]));
        assert!(loud.is_err());

        let no_extensions = Config {
            audio_extensions: Vec::new(),
            ..Config::default()
        };
        assert!(no_extensions.validate().is_err());
    }

    #[test]
    fn test_summary_hides_token() {
        let config = Config {
            discord_token: "super-secret".to_string(),
            ..Config::default()
        };
        let summary = config.summary();
        assert!(!summary.contains("super-secret"));
        assert!(summary.contains("global"));
    }
}
