//! Transports to the remote parameter service
//!
//! The editor only needs two contracts: send a typed value to an address, and
//! receive a snapshot. [`ParameterTransport`] is the first. Two adapters map it
//! onto the ways hosts reach nodes:
//!
//! - [`ServiceCallTransport`]: call `<node>/set_parameters` with a typed body
//! - [`DirectSetTransport`]: set `<node>.<param>` to a plain JSON value
//!
//! [`fetch_snapshot`] pulls a snapshot over a request/reply [`MessageChannel`].

use pedit_core::{ParameterValue, Snapshot};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::TransportError;
use crate::types::ParameterUpdate;

/// Sends parameter updates to the remote side
#[async_trait::async_trait]
pub trait ParameterTransport: Send + Sync {
    /// Deliver one update
    async fn set_parameters(&self, update: &ParameterUpdate) -> Result<(), TransportError>;
}

/// Calls a named remote service with a JSON body
#[async_trait::async_trait]
pub trait ServiceCaller: Send + Sync {
    /// Call `service` and return its JSON reply; `Null` when it has none
    async fn call_service(&self, service: &str, request: JsonValue)
        -> Result<JsonValue, TransportError>;
}

/// Sets a parameter by fully-qualified name
#[async_trait::async_trait]
pub trait ParameterSetter: Send + Sync {
    /// Set `name` to `value`
    async fn set_parameter(&self, name: &str, value: JsonValue) -> Result<(), TransportError>;
}

/// Request/reply message channel to the remote side
#[async_trait::async_trait]
pub trait MessageChannel: Send + Sync {
    /// Send a message and wait for its reply
    async fn request(&self, message: JsonValue) -> Result<JsonValue, TransportError>;
}

/// Body of a `set_parameters` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetParametersRequest {
    /// Parameters to set on the node
    pub parameters: Vec<SetParameter>,
}

/// One entry of a `set_parameters` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetParameter {
    /// Local parameter name
    pub name: String,
    /// Serialized in the tagged wire shape
    pub value: ParameterValue,
}

impl SetParametersRequest {
    /// Request carrying one update
    #[must_use]
    pub fn single(update: &ParameterUpdate) -> Self {
        Self {
            parameters: vec![SetParameter {
                name: update.address.name.clone(),
                value: update.value.clone(),
            }],
        }
    }
}

/// Reply of a `set_parameters` call
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SetParametersResponse {
    /// One result per requested parameter
    #[serde(default)]
    pub results: Vec<SetParameterResult>,
}

/// Outcome of one entry of a `set_parameters` call
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SetParameterResult {
    /// Parameter was set
    pub successful: bool,
    /// Refusal reason, empty on success
    #[serde(default)]
    pub reason: String,
}

impl SetParametersResponse {
    /// First refusal in the reply
    ///
    /// # Errors
    /// [`TransportError::Rejected`] with the remote reason
    pub fn into_result(self) -> Result<(), TransportError> {
        match self.results.into_iter().find(|r| !r.successful) {
            Some(failed) => Err(TransportError::Rejected {
                reason: failed.reason,
            }),
            None => Ok(()),
        }
    }
}

/// Sends updates as `<node>/set_parameters` service calls
#[derive(Debug, Clone)]
pub struct ServiceCallTransport<C> {
    caller: C,
}

impl<C: ServiceCaller> ServiceCallTransport<C> {
    /// Create transport
    #[inline]
    #[must_use]
    pub fn new(caller: C) -> Self {
        Self { caller }
    }

    /// Underlying caller
    #[inline]
    #[must_use]
    pub fn caller(&self) -> &C {
        &self.caller
    }
}

#[async_trait::async_trait]
impl<C: ServiceCaller> ParameterTransport for ServiceCallTransport<C> {
    async fn set_parameters(&self, update: &ParameterUpdate) -> Result<(), TransportError> {
        let service = update.address.set_parameters_service();
        let request = serde_json::to_value(SetParametersRequest::single(update))
            .map_err(|e| TransportError::Encoding(e.to_string()))?;

        let reply = self.caller.call_service(&service, request).await?;
        if reply.is_null() {
            return Ok(());
        }
        let response: SetParametersResponse = serde_json::from_value(reply)
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
        response.into_result()
    }
}

/// Sets parameters directly by fully-qualified name
#[derive(Debug, Clone)]
pub struct DirectSetTransport<S> {
    setter: S,
}

impl<S: ParameterSetter> DirectSetTransport<S> {
    /// Create transport
    #[inline]
    #[must_use]
    pub fn new(setter: S) -> Self {
        Self { setter }
    }

    /// Underlying setter
    #[inline]
    #[must_use]
    pub fn setter(&self) -> &S {
        &self.setter
    }
}

#[async_trait::async_trait]
impl<S: ParameterSetter> ParameterTransport for DirectSetTransport<S> {
    async fn set_parameters(&self, update: &ParameterUpdate) -> Result<(), TransportError> {
        self.setter
            .set_parameter(&update.address.qualified(), update.value.to_json())
            .await
    }
}

/// Pull request for parameter values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetParametersRequest {
    /// Always [`Self::OP`]
    pub op: String,
    /// Fully-qualified names; empty asks for everything
    pub parameter_names: Vec<String>,
    /// Correlates the reply with this request
    pub id: String,
}

impl GetParametersRequest {
    /// Operation name of the request
    pub const OP: &'static str = "getParameters";

    /// Request with a fresh id
    #[must_use]
    pub fn new(parameter_names: Vec<String>) -> Self {
        Self {
            op: Self::OP.to_string(),
            parameter_names,
            id: Uuid::new_v4().to_string(),
        }
    }
}

/// Pull a snapshot over a message channel
///
/// A reply carrying a different `id` is rejected.
///
/// # Errors
/// Channel failure, a reply for another request, or a reply that is not a
/// snapshot
pub async fn fetch_snapshot<C: MessageChannel + ?Sized>(
    channel: &C,
    parameter_names: Vec<String>,
) -> Result<Snapshot, TransportError> {
    let request = GetParametersRequest::new(parameter_names);
    let message =
        serde_json::to_value(&request).map_err(|e| TransportError::Encoding(e.to_string()))?;
    let reply = channel.request(message).await?;

    if let Some(id) = reply.get("id").and_then(JsonValue::as_str) {
        if id != request.id {
            return Err(TransportError::InvalidResponse(format!(
                "reply id {id} does not match request {}",
                request.id
            )));
        }
    }
    let snapshot =
        Snapshot::from_value(reply).map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
    tracing::debug!("Fetched snapshot with {} parameters", snapshot.len());
    Ok(snapshot)
}
