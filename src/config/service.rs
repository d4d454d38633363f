//! Service configuration documents.
//!
//! A [`ServiceConfig`] is what operators submit to the configuration endpoint.
//! It is decoded once, drives tree construction, and is then dropped; only a
//! [`crate::routing::services::ServiceSummary`] of it is retained.
//!
//! Decoding is deliberately lenient: missing fields take their zero value,
//! `null` lists decode as empty, and unknown fields are ignored.

use serde::{Deserialize, Deserializer, Serialize};

/// One submitted service registration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceConfig {
    /// Source repository (informational).
    pub repo: String,

    /// Owning team (informational).
    pub team: String,

    /// Absolute URL of the backend origin, e.g. `http://backend.local:8100`.
    pub domain: String,

    /// Mount path under the services namespace, e.g. `/svc`.
    pub prefix: String,

    /// Keep the prefix segment when forwarding upstream.
    pub preserve_prefix: bool,

    /// Middleware keys applied to every route of the service.
    #[serde(deserialize_with = "null_as_default")]
    pub middleware: Vec<String>,

    /// The service's route tree.
    #[serde(deserialize_with = "null_as_default")]
    pub routes: Vec<ServiceConfigRoute>,
}

/// One node of a service's route tree.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceConfigRoute {
    /// Path pattern relative to the parent node.
    pub pattern: String,

    /// Declared response content type. Not used for forwarding.
    pub content_type: String,

    /// Middleware keys applied beneath this node, after the service chain.
    #[serde(deserialize_with = "null_as_default")]
    pub middleware: Vec<String>,

    /// Child routes. Any child makes this node a mount point.
    #[serde(deserialize_with = "null_as_default")]
    pub routes: Vec<ServiceConfigRoute>,
}

impl ServiceConfig {
    /// Decode a configuration document from a request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
