//! Editor session
//!
//! [`EditorSession`] is the single owner of the selection. Inbound snapshots,
//! tree actions, typed edits and dispatch outcomes are handled one at a time
//! in arrival order. After every change the settings tree is rebuilt and
//! published on a `watch` channel and the selection is saved.
//!
//! Dispatch outcomes are consumed by [`EditorSession::run`]. A session driven
//! through [`EditorSession::handle`] alone drains the outcomes that are
//! already waiting after each event instead.

use std::sync::Arc;

use pedit_core::Snapshot;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::config::EditorConfig;
use crate::dispatcher::{DispatchOutcome, UpdateDispatcher};
use crate::error::EditorError;
use crate::persist::{restore_selection, StateStore};
use crate::reducer::SettingsAction;
use crate::selection::SelectionMachine;
use crate::settings::{InputType, SelectionState};
use crate::transport::ParameterTransport;
use crate::tree::{build_settings_tree, ConfigTree};
use crate::view::EditorView;

/// Input to the session
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// Full snapshot replacing the registry
    Snapshot(Snapshot),
    /// Fetched listing of one node
    NodeSnapshot {
        /// Fetched node
        node: String,
        /// Its parameters
        snapshot: Snapshot,
    },
    /// Edit made in the settings tree
    Action(SettingsAction),
    /// Select a node
    SelectNode(String),
    /// Select a parameter of the selected node
    SelectParameter(String),
    /// Change how the selected parameter is edited
    SetInputType(InputType),
    /// Text typed into the editor widget
    Edit(String),
    /// Send pending updates now
    Flush,
    /// Flush and stop
    Shutdown,
}

/// Serialized owner of the editor state
pub struct EditorSession {
    machine: SelectionMachine,
    dispatcher: UpdateDispatcher,
    store: Arc<dyn StateStore>,
    tree: watch::Sender<ConfigTree>,
    outcomes: Option<mpsc::Receiver<DispatchOutcome>>,
}

impl EditorSession {
    /// Create session, restoring the selection from `store`
    #[must_use]
    pub fn new(
        config: &EditorConfig,
        transport: Arc<dyn ParameterTransport>,
        store: Arc<dyn StateStore>,
    ) -> Self {
        let restored = restore_selection(store.as_ref(), config.default_bounds);
        let machine = SelectionMachine::restored(restored, config.default_bounds);

        let (outcome_tx, outcome_rx) = mpsc::channel(config.outcome_channel_capacity.max(1));
        let dispatcher = UpdateDispatcher::new(transport)
            .with_quiet_interval(config.quiet_interval())
            .with_outcomes(outcome_tx);

        let (tree, _) = watch::channel(build_settings_tree(machine.state(), machine.registry()));
        tracing::info!(
            "Editor session started (quiet interval {:?})",
            config.quiet_interval()
        );
        Self {
            machine,
            dispatcher,
            store,
            tree,
            outcomes: Some(outcome_rx),
        }
    }

    /// Receiver of every published settings tree
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ConfigTree> {
        self.tree.subscribe()
    }

    /// Selection machine
    #[inline]
    #[must_use]
    pub fn machine(&self) -> &SelectionMachine {
        &self.machine
    }

    /// Dispatcher
    #[inline]
    #[must_use]
    pub fn dispatcher(&self) -> &UpdateDispatcher {
        &self.dispatcher
    }

    /// Last published tree
    #[must_use]
    pub fn tree(&self) -> ConfigTree {
        self.tree.borrow().clone()
    }

    /// Editor view for the current state
    #[must_use]
    pub fn view(&self) -> EditorView {
        EditorView::of(&self.machine)
    }

    /// Handle one event
    ///
    /// # Errors
    /// Refused selections and edits that do not parse; the state is left as
    /// the machine leaves it
    pub async fn handle(&mut self, event: EditorEvent) -> Result<(), EditorError> {
        let before = self.machine.state().clone();
        let result = self.apply(event).await;
        for outcome in self.waiting_outcomes() {
            self.confirm(&outcome);
        }
        self.publish(&before);
        result
    }

    /// Handle a dispatch outcome
    pub fn handle_outcome(&mut self, outcome: &DispatchOutcome) {
        let before = self.machine.state().clone();
        self.confirm(outcome);
        self.publish(&before);
    }

    fn confirm(&mut self, outcome: &DispatchOutcome) {
        if outcome.is_success() && self.machine.confirm(&outcome.update) {
            tracing::debug!("Confirmed pending edit of {}", outcome.update.address);
        }
    }

    /// Outcomes already queued; empty once [`Self::run`] owns the receiver
    fn waiting_outcomes(&mut self) -> Vec<DispatchOutcome> {
        let Some(outcomes) = self.outcomes.as_mut() else {
            return Vec::new();
        };
        std::iter::from_fn(|| outcomes.try_recv().ok()).collect()
    }

    async fn apply(&mut self, event: EditorEvent) -> Result<(), EditorError> {
        match event {
            EditorEvent::Snapshot(snapshot) => self.machine.refresh_data(&snapshot),
            EditorEvent::NodeSnapshot { node, snapshot } => {
                self.machine.refresh_node(&node, &snapshot);
            }
            EditorEvent::Action(action) => {
                self.machine.apply_action(&action);
            }
            EditorEvent::SelectNode(node) => self.machine.select_node(&node),
            EditorEvent::SelectParameter(name) => self.machine.select_parameter(&name)?,
            EditorEvent::SetInputType(input_type) => self.machine.set_input_type(input_type),
            EditorEvent::Edit(text) => {
                let update = self.machine.edit(&text)?;
                self.dispatcher.schedule(update);
            }
            EditorEvent::Flush | EditorEvent::Shutdown => self.dispatcher.flush().await,
        }
        Ok(())
    }

    /// Rebuild and publish the tree; save the selection if it changed
    fn publish(&self, before: &SelectionState) {
        let state = self.machine.state();
        if state != before {
            if let Err(e) = self.store.save(&self.machine.persisted_state()) {
                tracing::warn!("Failed to save editor state: {}", e);
            }
        }
        let tree = build_settings_tree(state, self.machine.registry());
        self.tree.send_if_modified(|current| {
            if *current == tree {
                false
            } else {
                *current = tree;
                true
            }
        });
    }

    /// Process events until the sender closes or a shutdown arrives
    pub async fn run(mut self, mut events: mpsc::Receiver<EditorEvent>) {
        let Some(mut outcomes) = self.outcomes.take() else {
            tracing::error!("Editor session already ran");
            return;
        };
        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else { break };
                    let shutdown = event == EditorEvent::Shutdown;
                    if let Err(e) = self.handle(event).await {
                        tracing::warn!("Editor event rejected: {}", e);
                    }
                    if shutdown {
                        break;
                    }
                }
                Some(outcome) = outcomes.recv() => self.handle_outcome(&outcome),
            }
        }
        while let Ok(outcome) = outcomes.try_recv() {
            self.handle_outcome(&outcome);
        }
        self.dispatcher.cancel_all();
        tracing::info!("Editor session stopped");
    }

    /// Run on a new task, returning the event sender and the task handle
    #[must_use]
    pub fn spawn(self, capacity: usize) -> (mpsc::Sender<EditorEvent>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(self.run(rx));
        (tx, handle)
    }
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("state", self.machine.state())
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}
