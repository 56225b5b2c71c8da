//! Fully-qualified parameter addresses
//!
//! Provides [`ParameterAddress`], the `(node, parameter)` pair behind a
//! fully-qualified name such as `camera.exposure`.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Separator between the node and parameter segments of a fully-qualified name
///
/// The name is split at the first occurrence, so parameter segments may
/// themselves contain dots (`qos_overrides.depth`).
pub const SEPARATOR: char = '.';

/// Address of one parameter on one node
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParameterAddress {
    /// Node segment
    pub node: String,
    /// Local parameter name (node prefix stripped)
    pub name: String,
}

impl ParameterAddress {
    /// Create address from its two segments
    #[inline]
    #[must_use]
    pub fn new(node: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            name: name.into(),
        }
    }

    /// Fully-qualified name, `<node>.<name>`
    #[inline]
    #[must_use]
    pub fn qualified(&self) -> String {
        self.to_string()
    }

    /// Name of the node's parameter-setting service
    #[inline]
    #[must_use]
    pub fn set_parameters_service(&self) -> String {
        format!("{}/set_parameters", self.node)
    }
}

impl Display for ParameterAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.node, self.name)
    }
}

impl FromStr for ParameterAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (node, name) = s
            .split_once(SEPARATOR)
            .ok_or_else(|| AddressError::MissingSeparator(s.to_string()))?;
        if node.trim().is_empty() {
            return Err(AddressError::EmptyNode(s.to_string()));
        }
        if name.trim().is_empty() {
            return Err(AddressError::EmptyParameter(s.to_string()));
        }
        Ok(Self::new(node, name))
    }
}

/// Errors splitting a fully-qualified parameter name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    /// No separator, so fewer than two segments
    #[error("parameter name {0:?} is not of the form node.param")]
    MissingSeparator(String),

    /// Node segment is empty
    #[error("parameter name {0:?} has an empty node segment")]
    EmptyNode(String),

    /// Parameter segment is empty
    #[error("parameter name {0:?} has an empty parameter segment")]
    EmptyParameter(String),
}
