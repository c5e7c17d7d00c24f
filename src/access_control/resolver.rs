//! Resource control resolution and access decisions
//!
//! Three small primitives the response filters are built from:
//! 1. Resolution: find the record bound to a resource identifier
//! 2. Decision: does a user (or one of their teams) satisfy a record
//! 3. Decoration: embed a record into a Docker JSON object

use crate::access_control::types::{ResourceControl, TeamId, UserId};
use crate::error::FilterResult;
use serde_json::{Map, Value};
use tracing::trace;

/// Field added to decorated Docker objects
pub const DECORATION_FIELD: &str = "Dockgate";

/// Key of the resource control inside the decoration field
pub const RESOURCE_CONTROL_FIELD: &str = "ResourceControl";

/// Find the resource control bound to `resource_id`.
///
/// Matching is exact; identifiers are never matched by prefix.
pub fn resource_control_by_resource_id<'a>(
    resource_id: &str,
    resource_controls: &'a [ResourceControl],
) -> Option<&'a ResourceControl> {
    resource_controls
        .iter()
        .find(|rc| rc.resource_id == resource_id)
}

/// Check whether a non-administrator may access a controlled resource.
///
/// Administrators never reach this check; callers bypass it for them.
pub fn can_user_access_resource(
    user_id: UserId,
    user_team_ids: &[TeamId],
    resource_control: &ResourceControl,
) -> bool {
    if resource_control.public {
        trace!(resource = %resource_control.resource_id, "Public resource");
        return true;
    }

    if resource_control.administrators_only {
        trace!(resource = %resource_control.resource_id, "Administrators only");
        return false;
    }

    if resource_control
        .user_accesses
        .iter()
        .any(|access| access.user_id == user_id)
    {
        trace!(resource = %resource_control.resource_id, user = %user_id, "Matched user access");
        return true;
    }

    resource_control
        .team_accesses
        .iter()
        .any(|access| user_team_ids.contains(&access.team_id))
}

/// Attach `resource_control` to `object` under [`DECORATION_FIELD`].
///
/// Decorating twice with the same record gives the same object; a second
/// record replaces the first.
pub fn decorate_object(
    object: &mut Map<String, Value>,
    resource_control: &ResourceControl,
) -> FilterResult<()> {
    let mut metadata = Map::new();
    metadata.insert(
        RESOURCE_CONTROL_FIELD.to_string(),
        serde_json::to_value(resource_control)?,
    );
    object.insert(DECORATION_FIELD.to_string(), Value::Object(metadata));
    Ok(())
}
