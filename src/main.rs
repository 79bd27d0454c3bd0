use anyhow::Result;
use serenity::{model::gateway::GatewayIntents, Client};
use songbird::{SerenityInit, Songbird};
use std::sync::Arc;
use tracing::{error, info};

mod audio;
mod bot;
mod config;
mod error;
mod sources;
mod ui;

use crate::audio::{engine::QueueEngine, player::SongbirdDevice, registry::SessionRegistry};
use crate::bot::KinoBot;
use crate::config::Config;
use crate::sources::{MetadataResolver, TrackLibrary};

#[tokio::main]
async fn main() -> Result<()> {
    // Inicializar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("comfy_kino=debug".parse()?)
                .add_directive("serenity=info".parse()?)
                .add_directive("songbird=info".parse()?),
        )
        .init();

    info!("🎞️ Iniciando Comfy Kino v{}", env!("CARGO_PKG_VERSION"));

    // Cargar configuración
    let config = Arc::new(Config::load()?);
    info!("{}", config.summary());

    let library = Arc::new(TrackLibrary::new(
        config.music_dir.clone(),
        config.audio_extensions.clone(),
    ));

    // Manejar health check si es necesario
    if std::env::args().any(|arg| arg == "--health-check") {
        return health_check(&library).await;
    }

    let resolver = Arc::new(MetadataResolver::new(
        config.audio_extensions.clone(),
        config.metadata_file.clone(),
        config.cover_file.clone(),
    ));

    // Configurar intents mínimos necesarios
    let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_VOICE_STATES;

    // Songbird se comparte entre el cliente y el dispositivo
    let songbird = Songbird::serenity();
    let device = Arc::new(SongbirdDevice::new(songbird.clone(), config.default_volume));

    let (engine, finished) = QueueEngine::new(
        Arc::new(SessionRegistry::new()),
        library,
        resolver,
        device,
    );
    tokio::spawn(engine.clone().run(finished));

    let handler = KinoBot::new(config.clone(), engine);

    // Construir cliente
    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .register_songbird_with(songbird)
        .await?;

    // Manejar shutdown graceful
    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Error al registrar Ctrl+C: {:?}", e);
            return;
        }
        info!("⚠️ Señal de shutdown recibida, cerrando...");
        shard_manager.shutdown_all().await;
    });

    // Iniciar bot
    info!("🚀 Bot iniciado exitosamente");
    if let Err(why) = client.start().await {
        error!("Error al ejecutar cliente: {:?}", why);
    }

    Ok(())
}

async fn health_check(library: &TrackLibrary) -> Result<()> {
    let tracks = library.scan_async().await?;

    if tracks.is_empty() {
        anyhow::bail!("No hay canciones en {}", library.root().display());
    }

    println!("OK ({} canciones)", tracks.len());
    Ok(())
}
