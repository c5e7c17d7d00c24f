//! Access control module
//!
//! Per-resource access control for Docker API responses.
//!
//! ## Access Control Model
//!
//! A resource control binds one Docker resource identifier (a container or a
//! swarm service id) to a policy:
//!
//! - `public` resources are visible to everyone
//! - `administrators_only` resources are visible to administrators only
//! - otherwise, listed users and members of listed teams may see the resource
//!
//! Administrators bypass every check; the filters only decorate their
//! responses. A resource with no control at all is visible to everyone.
//!
//! ## Example Configuration
//!
//! ```toml
//! [[resource_controls]]
//! resource_id = "4a2f0c9e1b7d"   # container id
//! users = [2]
//!
//! [[resource_controls]]
//! resource_id = "k3x9q1w0e8r7"   # swarm service id
//! type = "service"
//! teams = [1]
//! ```

pub mod context;
pub mod resolver;
pub mod store;
pub mod types;

pub use context::OperationContext;
pub use resolver::{
    DECORATION_FIELD, RESOURCE_CONTROL_FIELD, can_user_access_resource, decorate_object,
    resource_control_by_resource_id,
};
pub use store::{ResourceControlStore, StaticResourceControlStore};
pub use types::{
    AccessDecision, Identity, ResourceControl, ResourceType, TeamId, TeamResourceAccess, UserId,
    UserResourceAccess,
};
