//! Core types for the editor
//!
//! Selection phases, the optimistic edit buffer and outbound updates.

use pedit_core::{ParameterAddress, ParameterValue};
use serde::{Deserialize, Serialize};

/// Phase of the selection state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionPhase {
    /// No node chosen yet
    NoNodeSelected,
    /// Node chosen, parameter not
    NodeSelectedNoParameter,
    /// Node and one of its parameters chosen
    ParameterSelected,
}

/// Last typed but not yet confirmed edit
///
/// Kept apart from the value in the registry, which is what the remote side
/// last confirmed.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEdit {
    /// Parameter being edited
    pub address: ParameterAddress,
    /// Text as typed
    pub text: String,
    /// Encoded value, `None` while the text does not parse
    pub value: Option<ParameterValue>,
}

/// A typed value to send to one parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterUpdate {
    /// Target parameter
    pub address: ParameterAddress,
    /// Value to set, of the parameter's declared kind
    pub value: ParameterValue,
}

impl ParameterUpdate {
    /// Create update
    #[inline]
    #[must_use]
    pub fn new(address: ParameterAddress, value: ParameterValue) -> Self {
        Self { address, value }
    }
}
