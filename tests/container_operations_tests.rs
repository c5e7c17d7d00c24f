//! Container filter tests
//!
//! Exercises the list filter and the inspect guard through the public API,
//! the way the proxy calls them.

use dockgate::access_control::{
    DECORATION_FIELD, Identity, OperationContext, RESOURCE_CONTROL_FIELD, ResourceControl,
    ResourceType, TeamId, UserId, decorate_object,
};
use dockgate::docker::{
    FilterOutcome, InspectOutcome, ListFilterOptions, container_inspect_operation,
    container_list_operation, filter_container_list, guard_container_inspect,
};
use dockgate::error::FilterError;
use dockgate::upstream::UpstreamResponse;

use axum::http::{HeaderMap, StatusCode};
use rstest::rstest;
use serde_json::{Map, Value, json};

fn controls() -> Vec<ResourceControl> {
    vec![
        ResourceControl::new(1, "c-owned", ResourceType::Container).with_user(UserId(2)),
        ResourceControl::new(2, "c-team", ResourceType::Container).with_team(TeamId(10)),
        ResourceControl::new(3, "c-public", ResourceType::Container).public(),
        ResourceControl::new(4, "c-admin", ResourceType::Container).administrators_only(),
        ResourceControl::new(5, "s-team", ResourceType::Service).with_team(TeamId(10)),
    ]
}

fn containers() -> Vec<Value> {
    vec![
        json!({"Id": "c-owned", "Names": ["/owned"], "Labels": {}}),
        json!({"Id": "c-free", "Names": ["/free"]}),
        json!({"Id": "c-team", "Names": ["/team"]}),
        json!({"Id": "c-public", "Names": ["/public"]}),
        json!({"Id": "c-admin", "Names": ["/admin"]}),
        json!({"Id": "c-task", "Labels": {"com.docker.swarm.service.id": "s-team"}}),
    ]
}

fn ids(containers: &[Value]) -> Vec<&str> {
    containers
        .iter()
        .map(|c| c["Id"].as_str().unwrap())
        .collect()
}

fn object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

fn task_container() -> Map<String, Value> {
    object(json!({
        "Id": "c1",
        "Name": "/web.1.x7",
        "Config": {"Labels": {"com.docker.swarm.service.id": "s1"}}
    }))
}

#[rstest]
#[case::owner(Identity::user(UserId(2), vec![]), vec!["c-owned", "c-free", "c-public", "c-task"])]
#[case::team_member(Identity::user(UserId(3), vec![TeamId(10)]), vec!["c-free", "c-team", "c-public", "c-task"])]
#[case::stranger(Identity::user(UserId(9), vec![TeamId(99)]), vec!["c-free", "c-public", "c-task"])]
fn test_list_keeps_accessible_containers_in_order(
    #[case] identity: Identity,
    #[case] expected: Vec<&str>,
) {
    let ctx = OperationContext::new(&identity, controls());
    let result = filter_container_list(containers(), &ctx, ListFilterOptions::default()).unwrap();

    assert_eq!(ids(&result.containers), expected);
    assert_eq!(result.removed, containers().len() - expected.len());
}

#[rstest]
#[case::team_member(Identity::user(UserId(3), vec![TeamId(10)]), true)]
#[case::stranger(Identity::user(UserId(9), vec![]), false)]
fn test_list_service_inheritance(#[case] identity: Identity, #[case] task_visible: bool) {
    let ctx = OperationContext::new(&identity, controls());
    let options = ListFilterOptions {
        service_inheritance: true,
    };
    let result = filter_container_list(containers(), &ctx, options).unwrap();

    assert_eq!(ids(&result.containers).contains(&"c-task"), task_visible);
}

#[test]
fn test_list_survivors_match_input_elements() {
    let ctx = OperationContext::new(&Identity::user(UserId(2), vec![]), controls());
    let result = filter_container_list(containers(), &ctx, ListFilterOptions::default()).unwrap();

    for survivor in &result.containers {
        assert!(containers().contains(survivor));
    }
}

#[test]
fn test_admin_list_keeps_length_and_decorates() {
    let ctx = OperationContext::new(&Identity::admin(UserId(1)), controls());
    let input = containers();
    let result = filter_container_list(input.clone(), &ctx, ListFilterOptions::default()).unwrap();

    assert_eq!(result.containers.len(), input.len());
    assert_eq!(result.removed, 0);

    for (before, after) in input.iter().zip(&result.containers) {
        let id = before["Id"].as_str().unwrap();
        match ctx.resource_control(id) {
            Some(rc) => {
                assert_eq!(
                    after[DECORATION_FIELD][RESOURCE_CONTROL_FIELD]["ResourceId"],
                    rc.resource_id.as_str()
                );
            }
            None => assert_eq!(after, before),
        }
    }
}

#[test]
fn test_decoration_is_idempotent() {
    let rc = ResourceControl::new(1, "c1", ResourceType::Container).with_user(UserId(2));
    let mut once = object(json!({"Id": "c1"}));
    decorate_object(&mut once, &rc).unwrap();

    let mut twice = once.clone();
    decorate_object(&mut twice, &rc).unwrap();

    assert_eq!(once, twice);
}

#[rstest]
#[case::container_denies_service_grants(
    vec![
        ResourceControl::new(1, "c1", ResourceType::Container).with_user(UserId(8)),
        ResourceControl::new(2, "s1", ResourceType::Service).public(),
    ],
    "c1"
)]
#[case::container_denies_service_denies(
    vec![
        ResourceControl::new(1, "c1", ResourceType::Container).administrators_only(),
        ResourceControl::new(2, "s1", ResourceType::Service).administrators_only(),
    ],
    "c1"
)]
#[case::container_grants_service_denies(
    vec![
        ResourceControl::new(1, "c1", ResourceType::Container).with_user(UserId(2)),
        ResourceControl::new(2, "s1", ResourceType::Service).with_user(UserId(8)),
    ],
    "s1"
)]
#[case::no_container_record_service_denies(
    vec![ResourceControl::new(2, "s1", ResourceType::Service).with_team(TeamId(4))],
    "s1"
)]
fn test_inspect_denials(#[case] controls: Vec<ResourceControl>, #[case] denied_by: &str) {
    let ctx = OperationContext::new(&Identity::user(UserId(2), vec![]), controls);

    let outcome = guard_container_inspect(task_container(), &ctx).unwrap();
    assert_eq!(
        outcome,
        InspectOutcome::Denied {
            resource_id: denied_by.to_string()
        }
    );
}

#[rstest]
#[case::no_records(vec![], None)]
#[case::container_only(
    vec![ResourceControl::new(1, "c1", ResourceType::Container).with_user(UserId(2))],
    Some(1)
)]
#[case::service_only(
    vec![ResourceControl::new(2, "s1", ResourceType::Service).public()],
    Some(2)
)]
#[case::both(
    vec![
        ResourceControl::new(1, "c1", ResourceType::Container).with_user(UserId(2)),
        ResourceControl::new(2, "s1", ResourceType::Service).with_user(UserId(2)),
    ],
    Some(2)
)]
fn test_inspect_grants(#[case] controls: Vec<ResourceControl>, #[case] decorated_with: Option<u64>) {
    let ctx = OperationContext::new(&Identity::user(UserId(2), vec![]), controls);

    let InspectOutcome::Allowed(container) = guard_container_inspect(task_container(), &ctx).unwrap()
    else {
        panic!("expected the container to be allowed");
    };

    let decoration = container
        .get(DECORATION_FIELD)
        .and_then(|d| d[RESOURCE_CONTROL_FIELD]["Id"].as_u64());
    assert_eq!(decoration, decorated_with);
}

#[test]
fn test_admin_inspect_is_never_denied() {
    let ctx = OperationContext::new(
        &Identity::admin(UserId(1)),
        vec![
            ResourceControl::new(1, "c1", ResourceType::Container).administrators_only(),
            ResourceControl::new(2, "s1", ResourceType::Service).with_user(UserId(8)),
        ],
    );

    let outcome = guard_container_inspect(task_container(), &ctx).unwrap();
    assert!(matches!(outcome, InspectOutcome::Allowed(_)));
}

#[test]
fn test_inspect_missing_identifier_is_an_error() {
    let ctx = OperationContext::new(&Identity::user(UserId(2), vec![]), controls());
    let upstream = UpstreamResponse::new(
        StatusCode::OK,
        HeaderMap::new(),
        r#"{"Name":"/web","Config":{"Labels":{}}}"#,
    );

    let result = container_inspect_operation(upstream, &ctx);
    assert!(matches!(
        result,
        Err(FilterError::ContainerIdentifierNotFound)
    ));
}

#[tokio::test]
async fn test_inspect_operation_preserves_field_order() {
    let ctx = OperationContext::new(
        &Identity::user(UserId(2), vec![]),
        vec![ResourceControl::new(1, "c1", ResourceType::Container).with_user(UserId(2))],
    );
    let upstream = UpstreamResponse::new(
        StatusCode::OK,
        HeaderMap::new(),
        r#"{"Name":"/web","Id":"c1","State":{"Running":true}}"#,
    );

    let output = container_inspect_operation(upstream, &ctx).unwrap();
    assert_eq!(output.outcome, FilterOutcome::Allowed);

    let body = axum::body::to_bytes(output.response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Map<String, Value> = serde_json::from_slice(&body).unwrap();
    let keys: Vec<&str> = body.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["Name", "Id", "State", DECORATION_FIELD]);
}

#[test]
fn test_list_operation_invalid_json() {
    let ctx = OperationContext::new(&Identity::admin(UserId(1)), vec![]);
    let upstream = UpstreamResponse::new(StatusCode::OK, HeaderMap::new(), "[{");

    assert!(matches!(
        container_list_operation(upstream, &ctx, ListFilterOptions::default()),
        Err(FilterError::Json(_))
    ));
}
