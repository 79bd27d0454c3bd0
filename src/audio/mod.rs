//! # Audio Module
//!
//! Per-guild playback sessions for Comfy Kino.
//!
//! Every guild gets at most one [`session::PlaybackSession`]: a playlist built
//! from the local library, a loop flag and the state of its voice connection.
//! The playlist head is always the track loaded on the device.
//!
//! ## Architecture
//!
//! ### [`engine`] - Queue Engine
//! - Command handlers (`play`, `skip`, `shuffle`, ...) and their preconditions
//! - The advance transition, triggered only by the device's "finished" event
//!
//! ### [`registry`] - Session Registry
//! - `guild → session` map with atomic create
//!
//! ### [`queue`] - Playlist
//! - Rotate/drop advance, tail shuffle, catalog reset, pagination
//!
//! ### [`device`] / [`player`] - Playback Device
//! - Trait boundary the engine talks to, and its Songbird implementation
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use crate::audio::{engine::QueueEngine, registry::SessionRegistry};
//!
//! let (engine, events) = QueueEngine::new(Arc::new(SessionRegistry::new()), library, resolver, device);
//! tokio::spawn(engine.clone().run(events));
//! ```

pub mod device;
pub mod engine;
pub mod player;
pub mod queue;
pub mod registry;
pub mod reply;
pub mod session;
