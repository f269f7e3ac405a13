use crate::common::{collect_sorted, entry, haltable_context, row, static_context, TableMediator};
use rdf_delta_common::error::DeltaError;
use rdf_delta_common::QueryOperationMediator;
use rdf_delta_engine::{EngineOptions, IncrementalEngine, OperationRequest};
use rdf_delta_model::Bindings;
use rdf_delta_physical::join::JoinEntry;
use std::sync::Arc;

fn subjects() -> Vec<Bindings> {
    vec![row(&[("s", "a")]), row(&[("s", "b")])]
}

fn objects() -> Vec<Bindings> {
    vec![
        row(&[("s", "a"), ("o", "1")]),
        row(&[("s", "b"), ("o", "2")]),
        row(&[("s", "c"), ("o", "3")]),
    ]
}

fn engine(options: EngineOptions) -> IncrementalEngine {
    let mediator = TableMediator::new(objects());
    IncrementalEngine::new(mediator as Arc<dyn QueryOperationMediator>, options)
}

fn two_entries() -> Vec<JoinEntry> {
    vec![
        entry(&["s", "o"], objects(), 100),
        entry(&["s"], subjects(), 2),
    ]
}

const JOINED: [&str; 2] = [
    "+ {?o -> \"1\", ?s -> \"a\"}",
    "+ {?o -> \"2\", ?s -> \"b\"}",
];

#[tokio::test]
async fn join_without_entries_fails() {
    let error = engine(EngineOptions::default())
        .evaluate(
            OperationRequest::InnerJoin {
                entries: Vec::new(),
            },
            &haltable_context(),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        DeltaError::InvalidEntryCount { actual: 0, .. }
    ));
}

#[tokio::test]
async fn join_of_single_entry_passes_through() {
    let entries = vec![entry(&["s"], subjects(), 2)];
    let output = engine(EngineOptions::default())
        .evaluate(OperationRequest::InnerJoin { entries }, &haltable_context())
        .await
        .unwrap();

    assert_eq!(output.physical_plan_metadata.operator, "pass-through");
    assert_eq!(
        collect_sorted(output.bindings.stream).await,
        ["+ {?s -> \"a\"}", "+ {?s -> \"b\"}"]
    );
}

#[tokio::test]
async fn join_selects_bind_join_for_small_driver() {
    let output = engine(EngineOptions::default())
        .evaluate(
            OperationRequest::InnerJoin {
                entries: two_entries(),
            },
            &haltable_context(),
        )
        .await
        .unwrap();

    assert_eq!(output.physical_plan_metadata.operator, "bind-join");
    let coefficients = output.physical_plan_metadata.coefficients.unwrap();
    assert!((coefficients.cost() - 22.0).abs() < f64::EPSILON);
    assert_eq!(collect_sorted(output.bindings.stream).await, JOINED);
}

#[tokio::test]
async fn join_selects_hash_join_for_entries_of_similar_size() {
    let entries = vec![
        entry(&["s", "o"], objects(), 3),
        entry(&["s"], subjects(), 2),
    ];
    let output = engine(EngineOptions::default())
        .evaluate(OperationRequest::InnerJoin { entries }, &haltable_context())
        .await
        .unwrap();

    assert_eq!(output.physical_plan_metadata.operator, "partial-hash-join");
    let coefficients = output.physical_plan_metadata.coefficients.unwrap();
    assert!((coefficients.cost() - 10.0).abs() < f64::EPSILON);
    assert_eq!(collect_sorted(output.bindings.stream).await, JOINED);
}

#[tokio::test]
async fn join_falls_back_to_hash_join_for_sources_that_cannot_halt() {
    let output = engine(EngineOptions::default())
        .evaluate(
            OperationRequest::InnerJoin {
                entries: two_entries(),
            },
            &static_context(),
        )
        .await
        .unwrap();

    assert_eq!(output.physical_plan_metadata.operator, "partial-hash-join");
    assert_eq!(collect_sorted(output.bindings.stream).await, JOINED);
}

#[tokio::test]
async fn join_of_three_entries_uses_multi_bind_join() {
    let entries = vec![
        entry(&["s", "o"], objects(), 100),
        entry(&["s"], subjects(), 2),
        entry(&["s", "t"], vec![row(&[("s", "a"), ("t", "x")])], 50),
    ];
    let output = engine(EngineOptions::default())
        .evaluate(OperationRequest::InnerJoin { entries }, &haltable_context())
        .await
        .unwrap();

    assert_eq!(output.physical_plan_metadata.operator, "multi-bind-join");
    assert_eq!(output.bindings.metadata.variables.len(), 3);
}

#[tokio::test]
async fn join_reports_rejections_of_all_actors() {
    let options = EngineOptions::default().without_partial_hash_join();
    let error = engine(options)
        .evaluate(
            OperationRequest::InnerJoin {
                entries: two_entries(),
            },
            &static_context(),
        )
        .await
        .unwrap_err();

    insta::assert_snapshot!(error, @"No join actor could join the entries: bind-join: A source can't halt or resume, multi-bind-join: A source can't halt or resume");
}

#[tokio::test]
async fn join_respects_disabled_actors() {
    let options = EngineOptions::default().without_bind_join();
    let output = engine(options)
        .evaluate(
            OperationRequest::InnerJoin {
                entries: two_entries(),
            },
            &haltable_context(),
        )
        .await
        .unwrap();

    assert_eq!(output.physical_plan_metadata.operator, "multi-bind-join");
    assert_eq!(collect_sorted(output.bindings.stream).await, JOINED);
}
