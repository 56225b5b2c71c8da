//! pedit Core
//!
//! Typed parameter values and the registry of parameters owned by remote nodes.
//!
//! # Core Concepts
//!
//! - [`ParameterValue`]: Tagged union over the nine parameter kinds
//! - [`WireParameterValue`]: Permissive wire shape, decoded by its type tag
//! - [`ParameterAddress`]: `(node, parameter)` pair behind `node.param`
//! - [`Snapshot`]: Inbound listing of raw parameters (push map or pull reply)
//! - [`ParameterRegistry`]: Ordered per-node listing built from snapshots
//!
//! # Example
//!
//! ```rust
//! use pedit_core::{encode, ParameterRegistry, ParameterValue, Snapshot};
//! use serde_json::json;
//!
//! let snapshot = Snapshot::default()
//!     .with("camera.exposure", json!(120))
//!     .with("camera.gain", json!(2.5));
//! let registry = ParameterRegistry::from_snapshot(&snapshot);
//!
//! let gain = registry.find("camera", "gain").unwrap();
//! assert_eq!(encode("3.7", &gain.value), Ok(ParameterValue::Double(3.7)));
//! ```

#![warn(unreachable_pub)]

mod address;
mod registry;
mod snapshot;
mod value;

pub use address::{AddressError, ParameterAddress, SEPARATOR};
pub use registry::{
    NodeParameterSet, ParameterDescriptor, ParameterRegistry, ParseReport, SkipReason,
    SkippedParameter,
};
pub use snapshot::{RawParameter, Snapshot, SnapshotError};
pub use value::{
    array_tokens, decode, decode_raw, encode, infer, parse_bool, CodecError, ParameterType,
    ParameterValue, WireParameterValue,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
