//! Notesync - autosave and realtime-sync engine for note fields
//!
//! One `SessionActor` per open entity coordinates a local edit buffer, a
//! debounced write pipeline, and a push-based snapshot stream from the
//! document store. The actor mailbox serializes every event (keystrokes,
//! timer fires, write resolutions, snapshots), so staleness is handled with
//! generation and entity tags rather than locks.

pub mod actors;
pub mod api;
pub mod buffer;
pub mod config;
pub mod debounce;
pub mod error;
pub mod status;
pub mod store;
pub mod surface;

pub use actors::manager::SessionManager;
pub use config::SyncConfig;
pub use error::SessionError;
