//! Per-node parameter registry
//!
//! Provides [`ParameterRegistry`], which turns inbound snapshots into an
//! ordered per-node listing of typed parameters.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::address::{AddressError, ParameterAddress};
use crate::snapshot::Snapshot;
use crate::value::{decode_raw, CodecError, ParameterValue};

/// A parameter of one node, name without node prefix
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterDescriptor {
    /// Local parameter name
    pub name: String,
    /// Last value confirmed by the remote side
    pub value: ParameterValue,
}

impl ParameterDescriptor {
    /// Create descriptor
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, value: ParameterValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Node name to ordered parameter listing, both in arrival order
pub type NodeParameterSet = IndexMap<String, Vec<ParameterDescriptor>>;

/// Why a snapshot entry was left out of the registry
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SkipReason {
    /// Name did not split into node and parameter
    #[error(transparent)]
    MalformedName(#[from] AddressError),

    /// Value could not be decoded
    #[error(transparent)]
    UndecodableValue(#[from] CodecError),
}

/// Snapshot entry that was dropped during parsing
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedParameter {
    /// Fully-qualified name as received
    pub name: String,
    /// Reason for dropping
    pub reason: SkipReason,
}

/// Result of parsing a snapshot, with the entries that were dropped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseReport {
    /// Parsed listing
    pub parameters: NodeParameterSet,
    /// Dropped entries, in arrival order
    pub skipped: Vec<SkippedParameter>,
}

/// Registry of remote parameters grouped by node
///
/// The parsed listing is immutable once built: every refresh produces a new
/// listing and swaps it in, so clones of the registry stay valid snapshots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterRegistry {
    nodes: Arc<NodeParameterSet>,
}

impl ParameterRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create registry holding an already-parsed snapshot
    #[inline]
    #[must_use]
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            nodes: Arc::new(Self::parse(snapshot)),
        }
    }

    /// Parse a snapshot into a per-node listing
    ///
    /// Malformed names and undecodable values are logged and dropped; the
    /// rest of the snapshot is still parsed.
    #[must_use]
    pub fn parse(snapshot: &Snapshot) -> NodeParameterSet {
        Self::parse_with_report(snapshot).parameters
    }

    /// Parse a snapshot, also reporting dropped entries
    #[must_use]
    pub fn parse_with_report(snapshot: &Snapshot) -> ParseReport {
        let mut report = ParseReport::default();
        for raw in snapshot.iter() {
            match Self::parse_entry(&raw.name, &raw.value) {
                Ok((address, value)) => insert(&mut report.parameters, address, value),
                Err(reason) => {
                    tracing::warn!("Skipping parameter {:?}: {}", raw.name, reason);
                    report.skipped.push(SkippedParameter {
                        name: raw.name.clone(),
                        reason,
                    });
                }
            }
        }
        report
    }

    fn parse_entry(
        name: &str,
        raw: &serde_json::Value,
    ) -> Result<(ParameterAddress, ParameterValue), SkipReason> {
        let address: ParameterAddress = name.parse()?;
        let value = decode_raw(raw)?;
        Ok((address, value))
    }

    /// Replace the whole listing with a new snapshot
    ///
    /// Parameters absent from the snapshot disappear.
    pub fn refresh(&mut self, snapshot: &Snapshot) {
        let parsed = Self::parse(snapshot);
        tracing::debug!(
            "Registry refreshed: {} nodes, {} raw entries",
            parsed.len(),
            snapshot.len()
        );
        self.nodes = Arc::new(parsed);
    }

    /// Replace the listing of a single node
    ///
    /// Entries for other nodes are ignored. A node with no entries in the
    /// snapshot is removed. Returns whether the node's listing changed.
    pub fn merge_node(&mut self, node: &str, snapshot: &Snapshot) -> bool {
        let mut parsed = Self::parse(snapshot);
        let fetched = parsed.shift_remove(node);
        if !parsed.is_empty() {
            tracing::debug!(
                "Ignoring {} foreign nodes in snapshot for {}",
                parsed.len(),
                node
            );
        }
        if fetched.as_deref() == self.nodes.get(node).map(Vec::as_slice) {
            return false;
        }

        let mut next = (*self.nodes).clone();
        match fetched {
            Some(parameters) => {
                next.insert(node.to_string(), parameters);
            }
            None => {
                next.shift_remove(node);
            }
        }
        self.nodes = Arc::new(next);
        true
    }

    /// Parameters of a node, empty for an unknown node
    #[inline]
    #[must_use]
    pub fn get(&self, node: &str) -> &[ParameterDescriptor] {
        self.nodes.get(node).map_or(&[], Vec::as_slice)
    }

    /// Look up a single parameter
    #[inline]
    #[must_use]
    pub fn find(&self, node: &str, name: &str) -> Option<&ParameterDescriptor> {
        self.get(node).iter().find(|p| p.name == name)
    }

    /// Look up by address
    #[inline]
    #[must_use]
    pub fn lookup(&self, address: &ParameterAddress) -> Option<&ParameterDescriptor> {
        self.find(&address.node, &address.name)
    }

    /// Check if node is known
    #[inline]
    #[must_use]
    pub fn contains_node(&self, node: &str) -> bool {
        self.nodes.contains_key(node)
    }

    /// Node names in arrival order
    #[inline]
    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Parameter names of a node in arrival order
    #[inline]
    pub fn parameter_names<'a>(&'a self, node: &str) -> impl Iterator<Item = &'a str> {
        self.get(node).iter().map(|p| p.name.as_str())
    }

    /// Full listing
    #[inline]
    #[must_use]
    pub fn nodes(&self) -> &NodeParameterSet {
        &self.nodes
    }

    /// Number of nodes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if no nodes are known
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl From<NodeParameterSet> for ParameterRegistry {
    fn from(nodes: NodeParameterSet) -> Self {
        Self {
            nodes: Arc::new(nodes),
        }
    }
}

/// Names are unique per node: a repeated name overwrites in place
fn insert(set: &mut NodeParameterSet, address: ParameterAddress, value: ParameterValue) {
    let parameters = set.entry(address.node).or_default();
    match parameters.iter_mut().find(|p| p.name == address.name) {
        Some(existing) => {
            tracing::warn!("Duplicate parameter {:?} in snapshot", address.name);
            existing.value = value;
        }
        None => parameters.push(ParameterDescriptor::new(address.name, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn camera_snapshot() -> Snapshot {
        Snapshot::default()
            .with("camera.exposure", json!(120))
            .with("camera.gain", json!(2.5))
            .with("lidar.enabled", json!(true))
    }

    #[test]
    fn registry_new_empty() {
        let registry = ParameterRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.get("camera").is_empty());
    }

    #[test]
    fn registry_parse_groups_by_node_in_order() {
        let registry = ParameterRegistry::from_snapshot(&camera_snapshot());
        assert_eq!(
            registry.get("camera"),
            &[
                ParameterDescriptor::new("exposure", ParameterValue::Integer(120)),
                ParameterDescriptor::new("gain", ParameterValue::Double(2.5)),
            ]
        );
        assert_eq!(registry.node_names().collect::<Vec<_>>(), vec!["camera", "lidar"]);
    }

    #[test]
    fn registry_parse_drops_malformed_and_continues() {
        let snapshot = Snapshot::default()
            .with("noseparator", json!(1))
            .with(".param", json!(1))
            .with("node.", json!(1))
            .with("node.bad", json!({"type": 0}))
            .with("node.good", json!("ok"));
        let report = ParameterRegistry::parse_with_report(&snapshot);

        assert_eq!(report.skipped.len(), 4);
        assert!(matches!(
            report.skipped[0].reason,
            SkipReason::MalformedName(AddressError::MissingSeparator(_))
        ));
        assert!(matches!(
            report.skipped[3].reason,
            SkipReason::UndecodableValue(CodecError::UnknownTag(0))
        ));
        assert_eq!(
            report.parameters.get("node").map(Vec::len),
            Some(1)
        );
    }

    #[test]
    fn registry_duplicate_keeps_first_position() {
        let snapshot = Snapshot::default()
            .with("n.a", json!(1))
            .with("n.b", json!(2))
            .with("n.a", json!(3));
        let registry = ParameterRegistry::from_snapshot(&snapshot);
        assert_eq!(registry.parameter_names("n").collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(
            registry.find("n", "a").map(|p| &p.value),
            Some(&ParameterValue::Integer(3))
        );
    }

    #[test]
    fn registry_refresh_full_replace() {
        let mut registry = ParameterRegistry::from_snapshot(&camera_snapshot());
        registry.refresh(&Snapshot::default().with("camera.gain", json!(4.0)));

        assert_eq!(registry.parameter_names("camera").collect::<Vec<_>>(), vec!["gain"]);
        assert!(!registry.contains_node("lidar"));
    }

    #[test]
    fn registry_clone_is_stable_snapshot() {
        let mut registry = ParameterRegistry::from_snapshot(&camera_snapshot());
        let before = registry.clone();
        registry.refresh(&Snapshot::default());
        assert_eq!(before.len(), 2);
        assert!(registry.is_empty());
    }

    #[test]
    fn registry_merge_node_replaces_only_that_node() {
        let mut registry = ParameterRegistry::from_snapshot(&camera_snapshot());
        let fetched = Snapshot::default()
            .with("camera.white_balance", json!("auto"))
            .with("lidar.enabled", json!(false));

        assert!(registry.merge_node("camera", &fetched));
        assert_eq!(
            registry.parameter_names("camera").collect::<Vec<_>>(),
            vec!["white_balance"]
        );
        assert_eq!(
            registry.find("lidar", "enabled").map(|p| &p.value),
            Some(&ParameterValue::Bool(true))
        );
        assert!(!registry.merge_node("camera", &fetched));
    }

    #[test]
    fn registry_merge_node_removes_vanished_node() {
        let mut registry = ParameterRegistry::from_snapshot(&camera_snapshot());
        assert!(registry.merge_node("lidar", &Snapshot::default()));
        assert!(!registry.contains_node("lidar"));
        assert!(!registry.merge_node("unknown", &Snapshot::default()));
    }

    #[test]
    fn registry_lookup_by_address() {
        let registry = ParameterRegistry::from_snapshot(&camera_snapshot());
        let address = ParameterAddress::new("camera", "gain");
        assert!(registry.lookup(&address).is_some());
        assert!(registry.find("camera", "missing").is_none());
    }
}
