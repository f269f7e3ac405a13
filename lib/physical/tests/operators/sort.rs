use crate::common::{pattern, PushSource};
use rdf_delta_common::{CommonVariablePolicy, QueryContext};
use rdf_delta_model::algebra::GraphPattern;
use rdf_delta_physical::join::{sort_join_entries, CardinalityJoinEntriesSort, JoinEntry};

fn entry(name: &str, variables: &[&str], cardinality: u64) -> JoinEntry {
    let (_, output) = PushSource::new(variables, cardinality);
    JoinEntry::new(output, pattern("s", name, "o"))
}

fn operations(entries: &[JoinEntry]) -> Vec<GraphPattern> {
    entries.iter().map(|e| e.operation.clone()).collect()
}

fn expected(names: &[&str]) -> Vec<GraphPattern> {
    names.iter().map(|name| pattern("s", name, "o")).collect()
}

#[tokio::test]
async fn sort_is_stable_for_equal_cardinalities() {
    let entries = vec![
        entry("a", &["s", "x"], 5),
        entry("b", &["s", "y"], 2),
        entry("c", &["s", "z"], 5),
        entry("d", &["s"], 2),
    ];

    let sorted = sort_join_entries(
        &CardinalityJoinEntriesSort,
        entries,
        &QueryContext::new(),
        CommonVariablePolicy::Require,
    )
    .await
    .unwrap();

    assert_eq!(operations(&sorted), expected(&["b", "d", "a", "c"]));
}

#[tokio::test]
async fn sort_moves_entries_without_common_variables_to_the_back() {
    let entries = vec![
        entry("a", &["s"], 1),
        entry("b", &["t"], 1),
        entry("c", &["s", "u"], 3),
    ];

    let sorted = sort_join_entries(
        &CardinalityJoinEntriesSort,
        entries,
        &QueryContext::new(),
        CommonVariablePolicy::Require,
    )
    .await
    .unwrap();

    assert_eq!(operations(&sorted), expected(&["a", "c", "b"]));
}

#[tokio::test]
async fn sort_keeps_order_if_undefs_are_possible() {
    let mut first = entry("a", &["s"], 5);
    first.output.metadata.can_contain_undefs = true;
    let entries = vec![first, entry("b", &["t"], 1)];

    let sorted = sort_join_entries(
        &CardinalityJoinEntriesSort,
        entries,
        &QueryContext::new(),
        CommonVariablePolicy::Require,
    )
    .await
    .unwrap();

    assert_eq!(operations(&sorted), expected(&["a", "b"]));
}

#[tokio::test]
async fn sort_without_common_variables_depends_on_policy() {
    let entries = || vec![entry("a", &["x"], 5), entry("b", &["y"], 1)];

    let error = sort_join_entries(
        &CardinalityJoinEntriesSort,
        entries(),
        &QueryContext::new(),
        CommonVariablePolicy::Require,
    )
    .await
    .unwrap_err();
    assert_eq!(
        error.to_string(),
        "Bind join can only join entries with at least one common variable"
    );

    let sorted = sort_join_entries(
        &CardinalityJoinEntriesSort,
        entries(),
        &QueryContext::new(),
        CommonVariablePolicy::Allow,
    )
    .await
    .unwrap();
    assert_eq!(operations(&sorted), expected(&["b", "a"]));
}
