use serenity::model::id::GuildId;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::sync::{mpsc, OwnedMutexGuard};
use tracing::{debug, error, info, warn};

use super::{
    device::{FinishedEvents, FinishedNotifier, PlaybackDevice, TrackFinished},
    queue::{paginate, Playlist},
    registry::SessionRegistry,
    reply::{deliver, Announce, CommandContext, QueueView, Reply},
    session::{DeviceState, PlaybackSession},
};
use crate::{
    error::{EngineError, LibraryError},
    sources::{MetadataResolver, Track, TrackLibrary},
};

const NOT_IN_VOICE: &str = "You need to be in a voice channel first.";
const WRONG_CHANNEL: &str = "You need to be in the same voice channel as me.";
const STILL_CONNECTING: &str = "Hold on, I'm still joining the voice channel.";
const QUEUE_FINISHED: &str = "That's the end of the queue, see you next time.";

/// Cómo arranca una sesión nueva
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StartMode {
    /// `play`: catálogo en orden, sin loop
    InOrder,
    /// `start`: loop activado y cola mezclada antes del primer track
    ShuffleLoop,
}

/// Máquina de estados de las sesiones de reproducción.
///
/// Cada handler bloquea la sesión de su guild durante toda su ejecución, así
/// que dos comandos de la misma guild nunca se intercalan; las guilds
/// distintas avanzan en paralelo. El avance de la cola sólo ocurre en
/// [`QueueEngine::advance`], disparado por el fin de track del dispositivo.
pub struct QueueEngine {
    registry: Arc<SessionRegistry>,
    library: Arc<TrackLibrary>,
    resolver: Arc<MetadataResolver>,
    device: Arc<dyn PlaybackDevice>,
    finished_tx: mpsc::UnboundedSender<TrackFinished>,
    next_token: AtomicU64,
}

impl QueueEngine {
    pub fn new(
        registry: Arc<SessionRegistry>,
        library: Arc<TrackLibrary>,
        resolver: Arc<MetadataResolver>,
        device: Arc<dyn PlaybackDevice>,
    ) -> (Arc<Self>, FinishedEvents) {
        let (finished_tx, events) = FinishedEvents::channel();
        let engine = Arc::new(Self {
            registry,
            library,
            resolver,
            device,
            finished_tx,
            next_token: AtomicU64::new(1),
        });
        (engine, events)
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Consume las notificaciones de fin de track hasta que se cierre el canal
    pub async fn run(self: Arc<Self>, mut events: FinishedEvents) {
        info!("🔁 Bucle de avance de colas iniciado");
        while let Some(event) = events.recv().await {
            if let Err(e) = self.advance(event).await {
                error!("❌ Error al avanzar la cola en guild {}: {}", event.guild_id, e);
            }
        }
        if !self.registry.is_empty() {
            warn!(
                "⚠️ Bucle de avance terminado con {} sesiones activas",
                self.registry.len()
            );
        }
        info!("🛑 Bucle de avance de colas terminado");
    }

    // Comandos de arranque

    pub async fn play(&self, ctx: &CommandContext) -> Result<(), EngineError> {
        self.begin(ctx, StartMode::InOrder).await
    }

    pub async fn start(&self, ctx: &CommandContext) -> Result<(), EngineError> {
        self.begin(ctx, StartMode::ShuffleLoop).await
    }

    async fn begin(&self, ctx: &CommandContext, mode: StartMode) -> Result<(), EngineError> {
        let Some(channel_id) = ctx.voice_channel else {
            ctx.say(NOT_IN_VOICE).await;
            return Ok(());
        };

        let announcements = ctx.announcements.clone();
        let shared = match self.registry.create(ctx.guild_id, |id| {
            PlaybackSession::new(id, ctx.guild_id, channel_id, announcements)
        }) {
            Ok(shared) => shared,
            Err(e) => {
                debug!("{}", e);
                ctx.say("Um... I'm already playing music, sweetie.").await;
                return Ok(());
            }
        };
        let session_id = shared.lock().await.id;

        let catalog = match self.library.scan_async().await {
            Ok(catalog) if catalog.is_empty() => {
                shared.lock().await.device_state = DeviceState::Disconnected;
                self.registry.remove_session(ctx.guild_id, session_id);
                ctx.say("There's nothing in the music library to play.").await;
                return Err(LibraryError::Empty {
                    root: self.library.root().to_path_buf(),
                }
                .into());
            }
            Ok(catalog) => catalog,
            Err(e) => {
                shared.lock().await.device_state = DeviceState::Disconnected;
                self.registry.remove_session(ctx.guild_id, session_id);
                ctx.say("I couldn't read the music library.").await;
                return Err(e.into());
            }
        };

        {
            let mut session = shared.lock().await;
            if session.device_state != DeviceState::Connecting {
                debug!("Sesión detenida antes de cargar la cola en guild {}", ctx.guild_id);
                return Ok(());
            }
            session.playlist = Playlist::from(catalog);
            if mode == StartMode::ShuffleLoop {
                self.apply_loop_toggle(&mut session, ctx, Announce::Silent).await;
                self.apply_shuffle(&mut session, ctx, Announce::Silent).await;
            }
        }
        ctx.say("Queue initialized.").await;

        // La sesión queda sin bloquear mientras conecta: un `stop` puede entrar
        let connected = self.device.connect(ctx.guild_id, channel_id).await;

        let mut session = shared.clone().lock_owned().await;
        let handle = match connected {
            Ok(handle) => handle,
            Err(e) => {
                error!("❌ Error al conectar en guild {}: {}", ctx.guild_id, e);
                session.device_state = DeviceState::Disconnected;
                session.playlist.clear();
                self.registry.remove_session(ctx.guild_id, session_id);
                ctx.say("There was an error connecting.").await;
                return Err(e.into());
            }
        };

        if session.device_state != DeviceState::Connecting
            || !self.registry.contains_session(ctx.guild_id, session_id)
        {
            info!(
                "🚪 Sesión detenida mientras conectaba en guild {}, liberando conexión",
                ctx.guild_id
            );
            if let Err(e) = handle.disconnect().await {
                warn!("⚠️ Error al liberar conexión tardía: {}", e);
            }
            return Ok(());
        }
        session.device = Some(handle);
        info!("🔊 Conectado al canal de voz en guild {}", ctx.guild_id);

        let Some(head) = session.playlist.head().cloned() else {
            self.teardown(&mut session).await;
            return Ok(());
        };
        let track = match self.resolver.resolve(&head.path).await {
            Ok(track) => track,
            Err(e) => {
                error!("❌ Metadatos no disponibles para el primer track: {}", e);
                ctx.say(format!("I couldn't read the track details: {}", e)).await;
                self.teardown(&mut session).await;
                return Err(e.into());
            }
        };

        if let Err(e) = self.play_track(&mut session, track).await {
            ctx.say("I couldn't start playback.").await;
            self.teardown(&mut session).await;
            return Err(e);
        }
        Ok(())
    }

    // Comandos de transporte

    pub async fn skip(&self, ctx: &CommandContext) -> Result<(), EngineError> {
        let Some(session) = self.active_session(ctx, "There are no songs in the queue.").await else {
            return Ok(());
        };

        let name = session.head_name();
        if let Some(device) = &session.device {
            // El `finished` resultante hace el avance
            if let Err(e) = device.stop().await {
                error!("❌ Error al saltar {} en guild {}: {}", name, ctx.guild_id, e);
                ctx.say("I couldn't skip the current track.").await;
                return Err(e.into());
            }
        }
        info!("⏭️ Saltado {} en guild {} por {}", name, ctx.guild_id, ctx.user_id);
        ctx.say(format!("Skipped {}.", name)).await;
        Ok(())
    }

    pub async fn stop(&self, ctx: &CommandContext) -> Result<(), EngineError> {
        let Some(mut session) = self
            .session_for(ctx, "In order to stop I need to be playing first.")
            .await
        else {
            return Ok(());
        };

        info!("⏹️ Cola detenida en guild {} por {}", ctx.guild_id, ctx.user_id);
        self.teardown(&mut session).await;
        ctx.say("Stopped playing and deleted the queue.").await;
        Ok(())
    }

    pub async fn pause(&self, ctx: &CommandContext) -> Result<(), EngineError> {
        let Some(mut session) = self.active_session(ctx, "There is no queue to pause.").await else {
            return Ok(());
        };

        if session.device_state == DeviceState::Paused {
            ctx.say("The queue is already paused.").await;
            return Ok(());
        }

        if let Some(device) = &session.device {
            if let Err(e) = device.pause().await {
                error!("❌ Error al pausar en guild {}: {}", ctx.guild_id, e);
                ctx.say("I couldn't pause the queue.").await;
                return Err(e.into());
            }
        }
        session.device_state = DeviceState::Paused;
        info!("⏸️ Reproducción pausada en guild {} por {}", ctx.guild_id, ctx.user_id);
        ctx.say("The queue is now paused.").await;
        Ok(())
    }

    pub async fn unpause(&self, ctx: &CommandContext) -> Result<(), EngineError> {
        let Some(mut session) = self.active_session(ctx, "There is no queue to unpause.").await
        else {
            return Ok(());
        };

        if session.device_state == DeviceState::Playing {
            ctx.say("The queue is already unpaused.").await;
            return Ok(());
        }

        if let Some(device) = &session.device {
            if let Err(e) = device.resume().await {
                error!("❌ Error al reanudar en guild {}: {}", ctx.guild_id, e);
                ctx.say("I couldn't resume the queue.").await;
                return Err(e.into());
            }
        }
        session.device_state = DeviceState::Playing;
        info!("▶️ Reproducción reanudada en guild {} por {}", ctx.guild_id, ctx.user_id);
        ctx.say(format!(
            "The queue is now unpaused. Now playing {}",
            session.head_name()
        ))
        .await;
        Ok(())
    }

    // Comandos de cola

    pub async fn shuffle(&self, ctx: &CommandContext, announce: Announce) -> Result<(), EngineError> {
        let Some(mut session) = self.active_session(ctx, "There is no queue to shuffle.").await else {
            return Ok(());
        };

        self.apply_shuffle(&mut session, ctx, announce).await;
        Ok(())
    }

    pub async fn reset(&self, ctx: &CommandContext) -> Result<(), EngineError> {
        let Some(mut session) = self.active_session(ctx, "There is no queue to reset.").await else {
            return Ok(());
        };

        let catalog = match self.library.scan_async().await {
            Ok(catalog) => catalog,
            Err(e) => {
                ctx.say("I couldn't read the music library.").await;
                return Err(e.into());
            }
        };

        session.playlist.reset_from_catalog(catalog);
        ctx.say("The queue has been reset.").await;
        Ok(())
    }

    pub async fn toggle_loop(&self, ctx: &CommandContext, announce: Announce) -> Result<(), EngineError> {
        let Some(mut session) = self.active_session(ctx, "There is no queue to loop.").await else {
            return Ok(());
        };

        self.apply_loop_toggle(&mut session, ctx, announce).await;
        Ok(())
    }

    pub async fn queue(&self, ctx: &CommandContext, page: Option<usize>) -> Result<(), EngineError> {
        let Some(session) = self.session_for(ctx, "There is no queue to show.").await else {
            return Ok(());
        };

        match paginate(&session.playlist, page) {
            Ok(page) => {
                ctx.reply(Reply::Queue(QueueView {
                    page,
                    now_playing: session.current_track.clone(),
                    loop_enabled: session.loop_enabled,
                    paused: session.device_state == DeviceState::Paused,
                }))
                .await
            }
            Err(out_of_range) => ctx.say(out_of_range.to_string()).await,
        }
        Ok(())
    }

    pub async fn now_playing(&self, ctx: &CommandContext) -> Result<(), EngineError> {
        let Some(session) = self.active_session(ctx, "Nothing is playing right now.").await else {
            return Ok(());
        };

        match &session.current_track {
            Some(track) => ctx.reply(Reply::NowPlaying(track.clone())).await,
            None => ctx.say("Nothing is playing right now.").await,
        }
        Ok(())
    }

    /// El bot salió del canal de voz por fuera de los comandos
    pub async fn abandon(&self, guild_id: GuildId) {
        let Some(shared) = self.registry.get(guild_id) else {
            return;
        };
        let mut session = shared.lock_owned().await;
        if session.device_state == DeviceState::Connecting {
            // Salida de la llamada anterior que llega tarde
            debug!("Desconexión ignorada, la sesión de guild {} está conectando", guild_id);
            return;
        }
        info!("🔌 Sesión abandonada en guild {}", guild_id);
        self.teardown(&mut session).await;
    }

    // Avance

    /// Transición disparada por el fin de un track en el dispositivo.
    ///
    /// Con un solo track restante la sesión termina. Si no, la cabeza rota al
    /// final (loop) o se descarta, y se reproduce la nueva cabeza. El modo
    /// loop se evalúa aquí y no al saltar, así que un cambio de loop aplica
    /// desde el siguiente avance.
    pub async fn advance(&self, event: TrackFinished) -> Result<(), EngineError> {
        let Some(shared) = self.registry.get(event.guild_id) else {
            debug!("Fin de track sin sesión en guild {}", event.guild_id);
            return Ok(());
        };
        let mut session = shared.lock_owned().await;

        if session.playing_token != Some(event.token) || !session.is_active() {
            debug!(
                "Fin de track obsoleto (token {}) en guild {}",
                event.token, event.guild_id
            );
            return Ok(());
        }
        session.playing_token = None;

        if session.playlist.len() <= 1 {
            info!("📭 Cola terminada en guild {}", event.guild_id);
            self.teardown(&mut session).await;
            deliver(session.announcements.as_ref(), Reply::text(QUEUE_FINISHED)).await;
            return Ok(());
        }

        if session.loop_enabled {
            session.playlist.rotate();
        } else {
            session.playlist.drop_head();
        }

        let Some(track) = self.resolve_next_head(&mut session).await else {
            info!("📭 Ningún track restante tiene metadatos en guild {}", event.guild_id);
            self.teardown(&mut session).await;
            deliver(session.announcements.as_ref(), Reply::text(QUEUE_FINISHED)).await;
            return Ok(());
        };

        if let Err(e) = self.play_track(&mut session, track).await {
            deliver(
                session.announcements.as_ref(),
                Reply::text("Playback failed, so I stopped the queue."),
            )
            .await;
            self.teardown(&mut session).await;
            return Err(e);
        }
        Ok(())
    }

    /// Resuelve la cabeza, descartando los tracks cuyos metadatos fallan
    async fn resolve_next_head(&self, session: &mut PlaybackSession) -> Option<Track> {
        while let Some(entry) = session.playlist.head().cloned() {
            match self.resolver.resolve(&entry.path).await {
                Ok(track) => return Some(track),
                Err(e) => {
                    warn!("⚠️ Saltando {}: {}", entry.path.display(), e);
                    deliver(
                        session.announcements.as_ref(),
                        Reply::text(format!("Skipping {}: {}", entry.label(), e)),
                    )
                    .await;
                    session.playlist.drop_head();
                }
            }
        }
        None
    }

    // Funciones privadas

    async fn play_track(&self, session: &mut PlaybackSession, track: Track) -> Result<(), EngineError> {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let notifier = FinishedNotifier::new(
            self.finished_tx.clone(),
            TrackFinished {
                guild_id: session.guild_id,
                token,
            },
        );

        if let Some(device) = &session.device {
            device.play(&track.path, notifier).await?;
        }

        info!("🎵 Reproduciendo {} en guild {}", track.display_name, session.guild_id);
        session.playing_token = Some(token);
        session.device_state = DeviceState::Playing;
        session.current_track = Some(track.clone());
        deliver(session.announcements.as_ref(), Reply::NowPlaying(track)).await;
        Ok(())
    }

    /// Detiene, desconecta y saca la sesión del registro
    async fn teardown(&self, session: &mut PlaybackSession) {
        session.device_state = DeviceState::Disconnected;
        session.playing_token = None;
        session.current_track = None;
        session.playlist.clear();
        self.registry.remove_session(session.guild_id, session.id);

        if let Some(device) = session.device.take() {
            if let Err(e) = device.stop().await {
                debug!("Stop al cerrar la sesión: {}", e);
            }
            if let Err(e) = device.disconnect().await {
                warn!("⚠️ Error al salir del canal de voz: {}", e);
            }
        }
    }

    async fn apply_shuffle(&self, session: &mut PlaybackSession, ctx: &CommandContext, announce: Announce) {
        session.playlist.shuffle_tail(&mut rand::thread_rng());
        if announce == Announce::Verbose {
            ctx.say("The queue has been shuffled.").await;
        }
    }

    async fn apply_loop_toggle(
        &self,
        session: &mut PlaybackSession,
        ctx: &CommandContext,
        announce: Announce,
    ) {
        session.loop_enabled = !session.loop_enabled;
        info!(
            "🔁 Loop {} en guild {}",
            if session.loop_enabled { "activado" } else { "desactivado" },
            session.guild_id
        );

        if announce == Announce::Verbose {
            if session.loop_enabled {
                ctx.say("The queue is now in loop mode.").await;
            } else {
                ctx.say("The queue is no longer in loop mode.").await;
            }
        }
    }

    /// Precondiciones comunes: canal de voz, sesión existente y mismo canal
    async fn session_for(
        &self,
        ctx: &CommandContext,
        nothing: &str,
    ) -> Option<OwnedMutexGuard<PlaybackSession>> {
        let Some(channel_id) = ctx.voice_channel else {
            ctx.say(NOT_IN_VOICE).await;
            return None;
        };

        let Some(shared) = self.registry.get(ctx.guild_id) else {
            ctx.say(nothing).await;
            return None;
        };

        let session = shared.lock_owned().await;
        if session.device_state == DeviceState::Disconnected {
            // Se cerró mientras esperábamos el lock
            ctx.say(nothing).await;
            return None;
        }
        if session.voice_channel != channel_id {
            ctx.say(WRONG_CHANNEL).await;
            return None;
        }
        Some(session)
    }

    /// Como `session_for`, pero además exige reproducción o pausa
    async fn active_session(
        &self,
        ctx: &CommandContext,
        nothing: &str,
    ) -> Option<OwnedMutexGuard<PlaybackSession>> {
        let session = self.session_for(ctx, nothing).await?;
        if session.device_state == DeviceState::Connecting {
            ctx.say(STILL_CONNECTING).await;
            return None;
        }
        Some(session)
    }
}

impl std::fmt::Debug for QueueEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueEngine")
            .field("sessions", &self.registry.len())
            .field("library", &self.library.root())
            .finish()
    }
}
