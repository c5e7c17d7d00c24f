//! Field extraction for Docker Engine API payloads
//!
//! The Docker API nests container labels differently per endpoint:
//! - list containers: `Labels` at the top level of each element
//!   (<https://docs.docker.com/engine/api/v1.28/#operation/ContainerList>)
//! - inspect container: `Config.Labels`
//!   (<https://docs.docker.com/engine/api/v1.28/#operation/ContainerInspect>)

use crate::error::{FilterError, FilterResult};
use serde_json::{Map, Value};

/// Field holding a container's identifier
pub const CONTAINER_IDENTIFIER: &str = "Id";

/// Field holding a container's configuration (inspect endpoint)
pub const CONTAINER_CONFIG: &str = "Config";

/// Field holding a container's labels
pub const CONTAINER_LABELS: &str = "Labels";

/// Label set by swarm on containers it creates for a service
pub const SERVICE_IDENTIFIER_LABEL: &str = "com.docker.swarm.service.id";

/// Nested object at `field`, or `None` if missing or not an object.
pub fn extract_json_field<'a>(
    object: &'a Map<String, Value>,
    field: &str,
) -> Option<&'a Map<String, Value>> {
    object.get(field).and_then(Value::as_object)
}

/// The container's own identifier.
///
/// A missing or non-string `Id` breaks the API contract and is an error.
pub fn container_identifier(object: &Map<String, Value>) -> FilterResult<&str> {
    object
        .get(CONTAINER_IDENTIFIER)
        .and_then(Value::as_str)
        .ok_or(FilterError::ContainerIdentifierNotFound)
}

/// Labels of an element of the list containers response
pub fn container_labels_from_list_object(
    object: &Map<String, Value>,
) -> Option<&Map<String, Value>> {
    extract_json_field(object, CONTAINER_LABELS)
}

/// Labels of an inspect container response, stored under `Config.Labels`
pub fn container_labels_from_inspect_object(
    object: &Map<String, Value>,
) -> Option<&Map<String, Value>> {
    extract_json_field(object, CONTAINER_CONFIG)
        .and_then(|config| extract_json_field(config, CONTAINER_LABELS))
}

/// Identifier of the swarm service owning the container, if labelled
pub fn service_identifier(labels: &Map<String, Value>) -> Option<&str> {
    labels.get(SERVICE_IDENTIFIER_LABEL).and_then(Value::as_str)
}
