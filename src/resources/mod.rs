//! Typed definitions for each platform resource kind.
//!
//! Each definition turns into a [`ResourceDescriptor`]: constant platform defaults
//! plus the handful of fields that vary per tenant.

pub mod connections;
pub mod images;
pub mod queues;
pub mod tenant;
pub mod ui_config;

use serde_json::{Map, Value};

use crate::api::ResourceDescriptor;

pub use connections::{Connection, Route};
pub use queues::{CallPark, CallQueue, CallQueueAgent};
pub use tenant::{Device, Domain, Reseller, User};

/// Anything that can be published to the platform.
pub trait Resource {
    fn descriptor(&self) -> ResourceDescriptor;
}

/// Unwrap a `json!({...})` literal into its map; non-objects yield an empty map.
pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Percent-encode one path segment.
pub(crate) fn path_segment(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
