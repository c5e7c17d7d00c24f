//! Per-request operation context

use crate::access_control::resolver::{can_user_access_resource, resource_control_by_resource_id};
use crate::access_control::types::{AccessDecision, Identity, ResourceControl, TeamId, UserId};

/// Everything a response filter needs to know about one request.
///
/// Built once per inbound request from the caller's identity and a snapshot
/// of the resource controls; never mutated and never shared between requests.
#[derive(Debug, Clone)]
pub struct OperationContext {
    is_admin: bool,
    user_id: UserId,
    user_team_ids: Vec<TeamId>,
    resource_controls: Vec<ResourceControl>,
}

impl OperationContext {
    pub fn new(identity: &Identity, resource_controls: Vec<ResourceControl>) -> Self {
        Self {
            is_admin: identity.is_admin,
            user_id: identity.user_id,
            user_team_ids: identity.team_ids.clone(),
            resource_controls,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn user_team_ids(&self) -> &[TeamId] {
        &self.user_team_ids
    }

    pub fn resource_controls(&self) -> &[ResourceControl] {
        &self.resource_controls
    }

    /// Resource control bound to `resource_id`, if any
    pub fn resource_control(&self, resource_id: &str) -> Option<&ResourceControl> {
        resource_control_by_resource_id(resource_id, &self.resource_controls)
    }

    /// Decide access to a controlled resource. Administrators always pass.
    pub fn decide(&self, resource_control: &ResourceControl) -> AccessDecision {
        if self.is_admin {
            return AccessDecision::Allowed;
        }
        can_user_access_resource(self.user_id, &self.user_team_ids, resource_control).into()
    }
}
