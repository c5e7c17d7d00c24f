//! Access control types
//!
//! Core types used by the access control system: identities, resource
//! control records and the per-record access decision.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a proxy user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u32);

/// Identifier of a team of proxy users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub u32);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of Docker resource a control record protects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    #[default]
    Container,
    Service,
    Volume,
    Network,
}

impl ResourceType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Container => "container",
            ResourceType::Service => "service",
            ResourceType::Volume => "volume",
            ResourceType::Network => "network",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user explicitly authorized on a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserResourceAccess {
    pub user_id: UserId,
}

/// A team explicitly authorized on a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TeamResourceAccess {
    pub team_id: TeamId,
}

/// Access policy bound to a single Docker resource identifier.
///
/// Serialized in the Docker Engine API's PascalCase style because the record
/// is embedded verbatim into decorated payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceControl {
    pub id: u32,
    pub resource_id: String,
    #[serde(rename = "Type")]
    pub resource_type: ResourceType,
    pub administrators_only: bool,
    pub public: bool,
    pub user_accesses: Vec<UserResourceAccess>,
    pub team_accesses: Vec<TeamResourceAccess>,
}

impl ResourceControl {
    /// Create a record that grants access to nobody but administrators
    /// until users or teams are added.
    pub fn new(id: u32, resource_id: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            id,
            resource_id: resource_id.into(),
            resource_type,
            administrators_only: false,
            public: false,
            user_accesses: Vec::new(),
            team_accesses: Vec::new(),
        }
    }

    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_accesses.push(UserResourceAccess { user_id });
        self
    }

    pub fn with_team(mut self, team_id: TeamId) -> Self {
        self.team_accesses.push(TeamResourceAccess { team_id });
        self
    }

    pub fn administrators_only(mut self) -> Self {
        self.administrators_only = true;
        self
    }

    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }
}

/// Identity of the caller, as established by the authenticator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub team_ids: Vec<TeamId>,
    pub is_admin: bool,
}

impl Identity {
    pub fn user(user_id: UserId, team_ids: Vec<TeamId>) -> Self {
        Self {
            user_id,
            team_ids,
            is_admin: false,
        }
    }

    pub fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            team_ids: Vec::new(),
            is_admin: true,
        }
    }
}

/// Result of checking a caller against one resource control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Access is allowed
    Allowed,
    /// Access is denied
    Denied,
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allowed)
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, AccessDecision::Denied)
    }
}

impl From<bool> for AccessDecision {
    fn from(allowed: bool) -> Self {
        if allowed {
            AccessDecision::Allowed
        } else {
            AccessDecision::Denied
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_control_serializes_pascal_case() {
        let rc = ResourceControl::new(7, "c1", ResourceType::Container)
            .with_user(UserId(1))
            .with_team(TeamId(2));

        let value = serde_json::to_value(&rc).unwrap();
        assert_eq!(
            value,
            json!({
                "Id": 7,
                "ResourceId": "c1",
                "Type": "container",
                "AdministratorsOnly": false,
                "Public": false,
                "UserAccesses": [{"UserId": 1}],
                "TeamAccesses": [{"TeamId": 2}]
            })
        );
    }

    #[test]
    fn test_resource_control_roundtrip() {
        let rc = ResourceControl::new(1, "s1", ResourceType::Service).public();
        let value = serde_json::to_value(&rc).unwrap();
        let back: ResourceControl = serde_json::from_value(value).unwrap();
        assert_eq!(back, rc);
    }

    #[test]
    fn test_access_decision_from_bool() {
        assert!(AccessDecision::from(true).is_allowed());
        assert!(AccessDecision::from(false).is_denied());
    }

    #[test]
    fn test_identity_constructors() {
        let user = Identity::user(UserId(3), vec![TeamId(1)]);
        assert!(!user.is_admin);
        assert_eq!(user.team_ids, vec![TeamId(1)]);

        let admin = Identity::admin(UserId(1));
        assert!(admin.is_admin);
        assert!(admin.team_ids.is_empty());
    }
}
