//! chat_state - Application state container for branching chats
//!
//! This crate provides:
//! - `machine` - AppState, Action, the pure reducer and the Store
//! - `settings` / `storage` - user preferences and their key-value persistence
//! - `session` - streaming a completion into a node with a single commit

pub mod machine;
pub mod session;
pub mod settings;
pub mod storage;
pub mod telemetry;

// Re-export commonly used types
pub use machine::{reduce, Action, ActionKind, ActiveView, AppState, StateTransition, Store};
pub use session::{ChatSession, PendingResponse, SendOutcome};
pub use settings::{Settings, SettingsPatch};
pub use storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, SettingsError};
pub use telemetry::init_tracing;
