//! Container response filters
//!
//! Access control for the two container read endpoints of the Docker Engine
//! API:
//!
//! - list containers: administrators get every element decorated with its
//!   resource control; other users get the elements they may see, in
//!   upstream order, undecorated
//! - inspect container: the container's own resource control and then the
//!   control of the swarm service owning it must both let the caller in,
//!   otherwise the whole response is replaced by an access denied response
//!
//! A container without any resource control is visible to everyone.

use crate::access_control::{OperationContext, decorate_object};
use crate::config::FilteringConfig;
use crate::docker::fields::{
    container_identifier, container_labels_from_inspect_object, container_labels_from_list_object,
    service_identifier,
};
use crate::error::{FilterError, FilterResult};
use crate::proxy::response::{
    response_as_json_array, response_as_json_object, rewrite_access_denied_response,
    rewrite_response,
};
use crate::upstream::UpstreamResponse;
use axum::http::StatusCode;
use axum::response::Response;
use serde_json::{Map, Value};
use tracing::{debug, trace};

/// Tuning of the list filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListFilterOptions {
    /// Also apply the resource control of the owning swarm service
    pub service_inheritance: bool,
}

impl From<&FilteringConfig> for ListFilterOptions {
    fn from(config: &FilteringConfig) -> Self {
        Self {
            service_inheritance: config.list_service_inheritance,
        }
    }
}

/// Result of the list filter
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredList {
    /// Surviving containers, in upstream order
    pub containers: Vec<Value>,
    /// Number of containers hidden from the caller
    pub removed: usize,
}

/// Result of the inspect guard
#[derive(Debug, Clone, PartialEq)]
pub enum InspectOutcome {
    /// The caller may see the container; carries the (decorated) object
    Allowed(Map<String, Value>),
    /// A resource control along the ownership chain denied the caller
    Denied { resource_id: String },
}

/// What a container operation did, for logging and metrics
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOutcome {
    Listed { returned: usize, removed: usize },
    Allowed,
    Denied { resource_id: String },
}

impl FilterOutcome {
    pub fn is_denied(&self) -> bool {
        matches!(self, FilterOutcome::Denied { .. })
    }

    /// Short label used in logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            FilterOutcome::Listed { removed: 0, .. } => "listed",
            FilterOutcome::Listed { .. } => "filtered",
            FilterOutcome::Allowed => "allowed",
            FilterOutcome::Denied { .. } => "denied",
        }
    }
}

/// A rewritten response and what produced it
#[derive(Debug)]
pub struct OperationOutput {
    pub response: Response,
    pub outcome: FilterOutcome,
}

/// Where a payload keeps its labels
#[derive(Debug, Clone, Copy)]
enum LabelLayout {
    List,
    Inspect,
}

enum ChainVerdict {
    Granted,
    Denied(String),
}

/// Resource identifiers whose controls govern `container`, nearest first:
/// the container itself, then the swarm service that created it.
///
/// Collected up front so the object can be decorated while walking the chain.
fn ownership_chain(
    container: &Map<String, Value>,
    layout: LabelLayout,
    follow_service: bool,
) -> FilterResult<Vec<String>> {
    let mut chain = vec![container_identifier(container)?.to_string()];

    if follow_service {
        let labels = match layout {
            LabelLayout::List => container_labels_from_list_object(container),
            LabelLayout::Inspect => container_labels_from_inspect_object(container),
        };
        if let Some(service_id) = labels.and_then(service_identifier) {
            chain.push(service_id.to_string());
        }
    }

    Ok(chain)
}

/// Check every link of the chain in order and stop at the first denial.
///
/// Links without a resource control are skipped. With `decorate`, every
/// granting control is attached to the object, so a later link overwrites
/// an earlier one.
fn enforce_ownership_chain(
    container: &mut Map<String, Value>,
    chain: &[String],
    ctx: &OperationContext,
    decorate: bool,
) -> FilterResult<ChainVerdict> {
    for resource_id in chain {
        let Some(resource_control) = ctx.resource_control(resource_id) else {
            trace!(resource_id = %resource_id, "No resource control");
            continue;
        };

        if ctx.decide(resource_control).is_denied() {
            return Ok(ChainVerdict::Denied(resource_id.clone()));
        }

        if decorate {
            decorate_object(container, resource_control)?;
        }
    }

    Ok(ChainVerdict::Granted)
}

/// Filter or decorate a list containers payload.
///
/// Every element must carry its `Id`; a single element without one fails the
/// whole list.
pub fn filter_container_list(
    containers: Vec<Value>,
    ctx: &OperationContext,
    options: ListFilterOptions,
) -> FilterResult<FilteredList> {
    let mut kept = Vec::with_capacity(containers.len());
    let mut removed = 0;

    for element in containers {
        let Value::Object(mut container) = element else {
            return Err(FilterError::ContainerIdentifierNotFound);
        };

        let chain = ownership_chain(&container, LabelLayout::List, options.service_inheritance)?;
        match enforce_ownership_chain(&mut container, &chain, ctx, ctx.is_admin())? {
            ChainVerdict::Granted => kept.push(Value::Object(container)),
            ChainVerdict::Denied(resource_id) => {
                debug!(
                    container = %chain[0],
                    resource_id = %resource_id,
                    user_id = %ctx.user_id(),
                    "Container hidden from list"
                );
                removed += 1;
            }
        }
    }

    Ok(FilteredList {
        containers: kept,
        removed,
    })
}

/// Guard an inspect container payload.
///
/// The container's own control is checked first; a denial there ends the
/// check before the service control is looked at.
pub fn guard_container_inspect(
    mut container: Map<String, Value>,
    ctx: &OperationContext,
) -> FilterResult<InspectOutcome> {
    let chain = ownership_chain(&container, LabelLayout::Inspect, true)?;

    match enforce_ownership_chain(&mut container, &chain, ctx, true)? {
        ChainVerdict::Granted => Ok(InspectOutcome::Allowed(container)),
        ChainVerdict::Denied(resource_id) => {
            debug!(
                container = %chain[0],
                resource_id = %resource_id,
                user_id = %ctx.user_id(),
                "Container inspection denied"
            );
            Ok(InspectOutcome::Denied { resource_id })
        }
    }
}

/// Rewrite a successful list containers response
pub fn container_list_operation(
    upstream: UpstreamResponse,
    ctx: &OperationContext,
    options: ListFilterOptions,
) -> FilterResult<OperationOutput> {
    let containers = response_as_json_array(&upstream.body)?;
    let FilteredList {
        containers,
        removed,
    } = filter_container_list(containers, ctx, options)?;

    let returned = containers.len();
    let response = rewrite_response(&upstream.headers, &Value::Array(containers), StatusCode::OK);

    Ok(OperationOutput {
        response,
        outcome: FilterOutcome::Listed { returned, removed },
    })
}

/// Rewrite a successful inspect container response
pub fn container_inspect_operation(
    upstream: UpstreamResponse,
    ctx: &OperationContext,
) -> FilterResult<OperationOutput> {
    let container = response_as_json_object(&upstream.body)?;

    let output = match guard_container_inspect(container, ctx)? {
        InspectOutcome::Allowed(container) => OperationOutput {
            response: rewrite_response(&upstream.headers, &Value::Object(container), StatusCode::OK),
            outcome: FilterOutcome::Allowed,
        },
        InspectOutcome::Denied { resource_id } => OperationOutput {
            response: rewrite_access_denied_response(),
            outcome: FilterOutcome::Denied { resource_id },
        },
    };

    Ok(output)
}
