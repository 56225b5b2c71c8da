//! pedit Panel - live editing of remote node parameters
//!
//! Drives an editor over the parameter registry:
//! - Tracks which node and parameter are selected, and how it is edited
//! - Projects the selection into a declarative settings tree
//! - Applies settings-tree edits through a structural reducer
//! - Encodes typed edits and sends them after a per-parameter quiet interval
//! - Persists the selection between runs
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pedit_panel::{EditorConfig, EditorEvent, EditorSession, MemoryStore};
//!
//! # async fn example(transport: Arc<dyn pedit_panel::ParameterTransport>, snapshot: pedit_core::Snapshot) {
//! let session = EditorSession::new(&EditorConfig::new(), transport, Arc::new(MemoryStore::new()));
//! let trees = session.subscribe();
//! let (events, task) = session.spawn(64);
//!
//! events.send(EditorEvent::Snapshot(snapshot)).await.ok();
//! events.send(EditorEvent::SelectNode("camera".into())).await.ok();
//! events.send(EditorEvent::SelectParameter("gain".into())).await.ok();
//! events.send(EditorEvent::Edit("3.7".into())).await.ok();
//! events.send(EditorEvent::Shutdown).await.ok();
//! task.await.ok();
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod persist;
pub mod reducer;
pub mod selection;
pub mod session;
pub mod settings;
pub mod transport;
pub mod tree;
pub mod types;
pub mod view;

pub use config::{EditorConfig, DEFAULT_QUIET_INTERVAL_MS};
pub use dispatcher::{DispatchOutcome, UpdateDispatcher, DEFAULT_QUIET_INTERVAL};
pub use error::{ConfigError, EditError, EditorError, PersistError, SelectionError, TransportError};
pub use persist::{restore_selection, JsonFileStore, MemoryStore, PersistedState, StateStore};
pub use reducer::{reduce, reduce_with_defaults, SettingsAction};
pub use selection::SelectionMachine;
pub use session::{EditorEvent, EditorSession};
pub use settings::{
    InputSettings, InputType, NumericBounds, SelectionState, SettingsRecord, UnknownInputType,
};
pub use transport::{
    fetch_snapshot, DirectSetTransport, GetParametersRequest, MessageChannel, ParameterSetter,
    ParameterTransport, ServiceCallTransport, ServiceCaller, SetParametersRequest,
    SetParametersResponse,
};
pub use tree::{build_settings_tree, ConfigTree, FieldInput, FieldValue, SettingsField, SettingsNode};
pub use types::{ParameterUpdate, PendingEdit, SelectionPhase};
pub use view::{Control, EditorView, EditorWidget};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for embedding the editor
    pub use crate::{
        EditorConfig, EditorEvent, EditorSession, ParameterTransport, ParameterUpdate,
        SelectionMachine, SettingsAction,
    };
    pub use pedit_core::{ParameterAddress, ParameterRegistry, ParameterValue, Snapshot};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
