//! Selection state machine
//!
//! Owns the [`SelectionState`], the parameter registry it refers to and the
//! pending edit. Every mutation goes through [`SelectionMachine`], which keeps
//! the selection consistent with the registry:
//!
//! - `selected_parameter_name` is empty or names a parameter of the selected node
//! - the pending edit, when present, belongs to the selected parameter
//! - the available parameter list is recomputed only when the node's listing changes

use pedit_core::{encode, ParameterAddress, ParameterDescriptor, ParameterRegistry, ParameterValue, Snapshot};

use crate::error::{EditError, SelectionError};
use crate::persist::PersistedState;
use crate::reducer::{reduce_with_defaults, SettingsAction};
use crate::settings::{InputSettings, InputType, NumericBounds, SelectionState};
use crate::types::{ParameterUpdate, PendingEdit, SelectionPhase};

/// Selection state machine over a parameter registry
#[derive(Debug, Clone, Default)]
pub struct SelectionMachine {
    state: SelectionState,
    registry: ParameterRegistry,
    available: Vec<String>,
    pending: Option<PendingEdit>,
    /// Persisted parameter waiting for its node's listing to arrive
    restore_target: Option<String>,
    defaults: NumericBounds,
}

impl SelectionMachine {
    /// Create machine with nothing selected
    #[inline]
    #[must_use]
    pub fn new(defaults: NumericBounds) -> Self {
        Self {
            state: SelectionState {
                input: InputSettings::Number(defaults),
                ..SelectionState::default()
            },
            defaults,
            ..Self::default()
        }
    }

    /// Create machine from a restored state
    ///
    /// The registry starts empty, so the restored parameter is held back and
    /// selected once a snapshot lists it for the restored node.
    #[must_use]
    pub fn restored(mut state: SelectionState, defaults: NumericBounds) -> Self {
        let restore_target = if state.selected_node.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut state.selected_parameter_name)).filter(|p| !p.is_empty())
        };
        state.selected_parameter_name.clear();
        Self {
            state,
            restore_target,
            defaults,
            ..Self::default()
        }
    }

    /// Current selection
    #[inline]
    #[must_use]
    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Registry the selection refers to
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &ParameterRegistry {
        &self.registry
    }

    /// Current phase
    #[inline]
    #[must_use]
    pub fn phase(&self) -> SelectionPhase {
        self.state.phase()
    }

    /// Parameter names of the selected node
    #[inline]
    #[must_use]
    pub fn available_parameters(&self) -> &[String] {
        &self.available
    }

    /// Pending edit, if any
    #[inline]
    #[must_use]
    pub fn pending(&self) -> Option<&PendingEdit> {
        self.pending.as_ref()
    }

    /// Bounds applied to numeric inputs without stored bounds
    #[inline]
    #[must_use]
    pub fn defaults(&self) -> NumericBounds {
        self.defaults
    }

    /// Document to persist for the current selection
    ///
    /// A restored parameter still waiting for its node's listing is written
    /// back as the selected parameter, so saving before the first snapshot
    /// does not lose it.
    #[must_use]
    pub fn persisted_state(&self) -> PersistedState {
        let mut persisted = PersistedState::from(&self.state);
        if self.state.selected_parameter_name.is_empty() {
            if let Some(target) = &self.restore_target {
                persisted.settings.selected_parameter_name = Some(target.clone());
            }
        }
        persisted
    }

    /// Address of the selected parameter
    #[must_use]
    pub fn selected_address(&self) -> Option<ParameterAddress> {
        (self.phase() == SelectionPhase::ParameterSelected).then(|| {
            ParameterAddress::new(
                self.state.selected_node.clone(),
                self.state.selected_parameter_name.clone(),
            )
        })
    }

    /// Descriptor of the selected parameter
    #[must_use]
    pub fn selected_descriptor(&self) -> Option<&ParameterDescriptor> {
        if self.phase() != SelectionPhase::ParameterSelected {
            return None;
        }
        self.registry
            .find(&self.state.selected_node, &self.state.selected_parameter_name)
    }

    /// Select a node, clearing any parameter selection
    ///
    /// An unknown node is accepted and has no parameters until a snapshot
    /// lists it. An empty name deselects.
    pub fn select_node(&mut self, node: &str) {
        if self.state.selected_node != node {
            tracing::debug!("Selected node {:?}", node);
        }
        self.clear_parameter();
        self.state.selected_node = node.to_string();
        self.available = self.listed_parameters();
    }

    /// Select a parameter of the selected node
    ///
    /// Accepted from `ParameterSelected` as well as from
    /// `NodeSelectedNoParameter`: switching directly to another parameter of
    /// the same node passes through `NodeSelectedNoParameter`, dropping the
    /// previous parameter's pending edit before the new one is selected.
    ///
    /// # Errors
    /// No node selected, or the node has no parameter of that name
    pub fn select_parameter(&mut self, name: &str) -> Result<(), SelectionError> {
        if self.state.selected_node.is_empty() {
            tracing::warn!("Parameter {:?} selected before any node", name);
            return Err(SelectionError::NoNodeSelected);
        }
        if !self.available.iter().any(|p| p == name) {
            tracing::warn!(
                "Node {:?} has no parameter {:?}",
                self.state.selected_node,
                name
            );
            return Err(SelectionError::UnknownParameter {
                node: self.state.selected_node.clone(),
                name: name.to_string(),
            });
        }
        if self.state.selected_parameter_name == name {
            return Ok(());
        }

        self.clear_parameter();
        self.state.selected_parameter_name = name.to_string();
        tracing::debug!("Selected parameter {:?}", self.selected_address());
        Ok(())
    }

    /// Drop the parameter selection and its pending edit
    pub fn clear_parameter(&mut self) {
        self.state.selected_parameter_name.clear();
        self.pending = None;
        self.restore_target = None;
    }

    /// Replace the registry with a full snapshot
    pub fn refresh_data(&mut self, snapshot: &Snapshot) {
        self.registry.refresh(snapshot);
        self.reconcile();
    }

    /// Replace one node's listing with a fetched snapshot
    pub fn refresh_node(&mut self, node: &str, snapshot: &Snapshot) {
        if self.registry.merge_node(node, snapshot) {
            self.reconcile();
        }
    }

    /// Switch how the selected parameter is edited
    ///
    /// An input type that does not fit the parameter's kind is kept; the
    /// editor view reports the mismatch.
    pub fn set_input_type(&mut self, input_type: InputType) {
        if let Some(descriptor) = self.selected_descriptor() {
            if !input_type.accepts(descriptor.value.kind()) {
                tracing::debug!(
                    "Input type {} does not fit {} parameter {:?}",
                    input_type,
                    descriptor.value.kind(),
                    descriptor.name
                );
            }
        }
        self.state.input = InputSettings::switch_to(input_type, &self.state.input, self.defaults);
    }

    /// Apply a settings-tree action
    ///
    /// Node and parameter changes are routed through [`Self::select_node`]
    /// and [`Self::select_parameter`]. Returns whether the state changed.
    pub fn apply_action(&mut self, action: &SettingsAction) -> bool {
        let next = reduce_with_defaults(&self.state, action, self.defaults);
        if next == self.state {
            return false;
        }
        let before = self.state.clone();

        self.state.input = next.input;
        if next.selected_node != self.state.selected_node {
            self.select_node(&next.selected_node);
        } else if next.selected_parameter_name != self.state.selected_parameter_name {
            if next.selected_parameter_name.is_empty() {
                self.clear_parameter();
            } else if let Err(e) = self.select_parameter(&next.selected_parameter_name) {
                tracing::debug!("Settings action not applied: {}", e);
            }
        }
        self.state != before
    }

    /// Record an edit of the selected parameter
    ///
    /// The text is kept as the pending edit even when it does not parse, so
    /// the editor can show what was typed.
    ///
    /// # Errors
    /// No parameter selected, or the text does not parse as its kind
    pub fn edit(&mut self, text: &str) -> Result<ParameterUpdate, EditError> {
        let address = self.selected_address().ok_or(EditError::NoParameterSelected)?;
        let current = self
            .registry
            .lookup(&address)
            .map(|d| &d.value)
            .ok_or(EditError::NoParameterSelected)?;

        let encoded = encode(text, current);
        self.pending = Some(PendingEdit {
            address: address.clone(),
            text: text.to_string(),
            value: encoded.as_ref().ok().cloned(),
        });
        match encoded {
            Ok(value) => Ok(ParameterUpdate::new(address, value)),
            Err(e) => {
                tracing::debug!("Edit of {} does not parse: {}", address, e);
                Err(e.into())
            }
        }
    }

    /// Drop the pending edit once its value has been delivered
    ///
    /// Returns whether the pending edit matched the delivered update.
    pub fn confirm(&mut self, update: &ParameterUpdate) -> bool {
        let matches = self.pending.as_ref().is_some_and(|pending| {
            pending.address == update.address && pending.value.as_ref() == Some(&update.value)
        });
        if matches {
            self.pending = None;
        }
        matches
    }

    /// Value to show for the selected parameter
    ///
    /// A pending edit that parsed wins over the confirmed value.
    #[must_use]
    pub fn displayed_value(&self) -> Option<&ParameterValue> {
        let confirmed = &self.selected_descriptor()?.value;
        Some(
            self.pending
                .as_ref()
                .and_then(|p| p.value.as_ref())
                .unwrap_or(confirmed),
        )
    }

    /// Text to show for the selected parameter
    #[must_use]
    pub fn displayed_text(&self) -> Option<String> {
        let confirmed = &self.selected_descriptor()?.value;
        Some(
            self.pending
                .as_ref()
                .map_or_else(|| confirmed.to_string(), |p| p.text.clone()),
        )
    }

    fn listed_parameters(&self) -> Vec<String> {
        self.registry
            .parameter_names(&self.state.selected_node)
            .map(str::to_string)
            .collect()
    }

    /// Bring the selection back in line after the registry changed
    fn reconcile(&mut self) {
        let listed = self.listed_parameters();
        if listed != self.available {
            self.available = listed;
        }

        let selected = &self.state.selected_parameter_name;
        if !selected.is_empty() && !self.available.contains(selected) {
            tracing::info!(
                "Parameter {:?} of node {:?} vanished, clearing selection",
                selected,
                self.state.selected_node
            );
            self.clear_parameter();
        }

        if self.state.selected_parameter_name.is_empty() {
            if let Some(target) = self.restore_target.take() {
                if self.available.contains(&target) {
                    tracing::debug!("Restored parameter selection {:?}", target);
                    self.state.selected_parameter_name = target;
                } else {
                    self.restore_target = Some(target);
                }
            }
        }

        let confirmed = self.selected_descriptor().map(|d| d.value.clone());
        if let (Some(pending), Some(confirmed)) = (&self.pending, confirmed) {
            if pending.value.as_ref() == Some(&confirmed) {
                self.pending = None;
            }
        }
    }
}
