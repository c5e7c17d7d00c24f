//! Docker Engine API payload handling
//!
//! Field extraction for container payloads and the access control filters
//! applied to the container list and inspect responses.

pub mod containers;
pub mod fields;

pub use containers::{
    FilterOutcome, FilteredList, InspectOutcome, ListFilterOptions, OperationOutput,
    container_inspect_operation, container_list_operation, filter_container_list,
    guard_container_inspect,
};
