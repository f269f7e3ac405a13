use crate::common::{
    drain_ready, iri, is_finished, pattern, triple, var, MemoryDataset, PushSource,
};
use rdf_delta_common::error::DeltaError;
use rdf_delta_common::{CommonVariablePolicy, JoinOptions, QueryOperationMediator};
use rdf_delta_model::Bindings;
use rdf_delta_physical::join::{BindJoin, JoinEntry};
use std::sync::Arc;

fn subject(name: &str) -> Bindings {
    Bindings::new().with(var("s"), iri(name))
}

fn entries() -> (PushSource, Vec<JoinEntry>) {
    let (driver, driver_output) = PushSource::new(&["s"], 1);
    let (_, remaining_output) = PushSource::new(&["s", "o"], 100);
    let entries = vec![
        JoinEntry::new(remaining_output, pattern("s", "p", "o")),
        JoinEntry::new(driver_output, pattern("s", "type", "t")),
    ];
    (driver, entries)
}

#[tokio::test]
async fn bind_join_follows_sub_evaluations() {
    let dataset = MemoryDataset::new();
    dataset.insert(triple("a", "p", "1"));
    dataset.insert(triple("a", "p", "2"));
    dataset.insert(triple("b", "p", "3"));

    let (mut driver, entries) = entries();
    let join = BindJoin::new(Arc::clone(&dataset) as Arc<dyn QueryOperationMediator>);
    let mut output = join.execute(entries, &dataset.context()).await.unwrap();

    driver.add(subject("a"));
    let initial = drain_ready(&mut output.stream);
    dataset.insert(triple("a", "p", "4"));
    dataset.insert(triple("b", "p", "5"));
    let live = drain_ready(&mut output.stream);

    insta::assert_snapshot!(initial.join("\n"), @r#"
    + {?o -> "1", ?s -> <http://example.com/a>}
    + {?o -> "2", ?s -> <http://example.com/a>}
    "#);
    insta::assert_snapshot!(live.join("\n"), @r#"+ {?o -> "4", ?s -> <http://example.com/a>}"#);
    assert_eq!(
        output.metadata.variables,
        vec![var("s"), var("o")]
    );

    driver.finish();
    dataset.finish();
    assert!(drain_ready(&mut output.stream).is_empty());
    assert!(is_finished(&mut output.stream));
}

#[tokio::test]
async fn bind_join_deletion_replaces_sub_evaluation() {
    let dataset = MemoryDataset::new();
    dataset.insert(triple("a", "p", "1"));
    dataset.insert(triple("a", "p", "2"));

    let (mut driver, entries) = entries();
    let join = BindJoin::new(Arc::clone(&dataset) as Arc<dyn QueryOperationMediator>);
    let mut output = join.execute(entries, &dataset.context()).await.unwrap();

    driver.add(subject("a"));
    drain_ready(&mut output.stream);
    dataset.insert(triple("a", "p", "3"));
    drain_ready(&mut output.stream);

    driver.delete(subject("a"));
    let deleted = drain_ready(&mut output.stream);

    insta::assert_snapshot!(deleted.join("\n"), @r#"
    - {?o -> "1", ?s -> <http://example.com/a>}
    - {?o -> "2", ?s -> <http://example.com/a>}
    - {?o -> "3", ?s -> <http://example.com/a>}
    "#);
    assert_eq!(dataset.halts(), 1);
    assert_eq!(dataset.halts(), dataset.resumes());
    assert_eq!(dataset.mediations(), 2);

    // The replaced sub-evaluation no longer follows the dataset.
    dataset.insert(triple("a", "p", "4"));
    assert!(drain_ready(&mut output.stream).is_empty());

    driver.finish();
    dataset.finish();
    assert!(is_finished(&mut output.stream));
}

#[tokio::test]
async fn bind_join_deletion_forwards_pending_changes_of_old_sub_evaluation() {
    let dataset = MemoryDataset::new();
    dataset.insert(triple("a", "p", "1"));

    let (mut driver, entries) = entries();
    let join = BindJoin::new(Arc::clone(&dataset) as Arc<dyn QueryOperationMediator>);
    let mut output = join.execute(entries, &dataset.context()).await.unwrap();

    driver.add(subject("a"));
    drain_ready(&mut output.stream);

    // Both changes are queued in the sub-evaluation when the deletion arrives.
    dataset.insert(triple("a", "p", "2"));
    dataset.insert(triple("a", "p", "3"));
    driver.delete(subject("a"));
    let changes = drain_ready(&mut output.stream);

    insta::assert_snapshot!(changes.join("\n"), @r#"
    + {?o -> "2", ?s -> <http://example.com/a>}
    + {?o -> "3", ?s -> <http://example.com/a>}
    - {?o -> "1", ?s -> <http://example.com/a>}
    - {?o -> "2", ?s -> <http://example.com/a>}
    - {?o -> "3", ?s -> <http://example.com/a>}
    "#);
    assert_eq!(dataset.halts(), dataset.resumes());

    driver.finish();
    dataset.finish();
    assert!(is_finished(&mut output.stream));
}

#[tokio::test]
async fn bind_join_deletion_pops_most_recent_sub_evaluation() {
    let dataset = MemoryDataset::new();
    dataset.insert(triple("a", "p", "1"));

    let (mut driver, entries) = entries();
    let join = BindJoin::new(Arc::clone(&dataset) as Arc<dyn QueryOperationMediator>);
    let mut output = join.execute(entries, &dataset.context()).await.unwrap();

    driver.add(subject("a"));
    driver.add(subject("a"));
    assert_eq!(drain_ready(&mut output.stream).len(), 2);

    driver.delete(subject("a"));
    assert_eq!(drain_ready(&mut output.stream).len(), 1);

    // The remaining sub-evaluation is still live.
    dataset.insert(triple("a", "p", "2"));
    insta::assert_snapshot!(
        drain_ready(&mut output.stream).join("\n"),
        @r#"+ {?o -> "2", ?s -> <http://example.com/a>}"#
    );

    driver.delete(subject("a"));
    assert_eq!(drain_ready(&mut output.stream).len(), 2);
    assert_eq!(dataset.halts(), 2);
    assert_eq!(dataset.resumes(), 2);

    driver.finish();
    dataset.finish();
    assert!(is_finished(&mut output.stream));
}

#[tokio::test]
async fn bind_join_rejects_deletion_without_addition() {
    let dataset = MemoryDataset::new();
    let (driver, entries) = entries();
    let join = BindJoin::new(Arc::clone(&dataset) as Arc<dyn QueryOperationMediator>);
    let mut output = join.execute(entries, &dataset.context()).await.unwrap();

    driver.delete(subject("a"));

    assert_eq!(
        drain_ready(&mut output.stream),
        ["! Received deletion for non-existing addition"]
    );
    assert!(is_finished(&mut output.stream));
    assert_eq!(dataset.halts(), dataset.resumes());
}

#[tokio::test]
async fn bind_join_requires_two_entries() {
    let dataset = MemoryDataset::new();
    let (_, mut entries) = entries();
    let (_, extra) = PushSource::new(&["s"], 1);
    entries.push(JoinEntry::new(extra, pattern("s", "q", "x")));

    let join = BindJoin::new(Arc::clone(&dataset) as Arc<dyn QueryOperationMediator>);
    let error = join
        .execute(entries, &dataset.context())
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        DeltaError::InvalidEntryCount { actual: 3, .. }
    ));
}

#[tokio::test]
async fn bind_join_without_common_variables() {
    let dataset = MemoryDataset::new();
    dataset.insert(triple("a", "p", "1"));
    let create_entries = || {
        let (driver, driver_output) = PushSource::new(&["x"], 1);
        let (_, remaining_output) = PushSource::new(&["s", "o"], 100);
        let entries = vec![
            JoinEntry::new(driver_output, pattern("x", "type", "t")),
            JoinEntry::new(remaining_output, pattern("s", "p", "o")),
        ];
        (driver, entries)
    };

    let (_, entries) = create_entries();
    let join = BindJoin::new(Arc::clone(&dataset) as Arc<dyn QueryOperationMediator>);
    let error = join
        .execute(entries, &dataset.context())
        .await
        .unwrap_err();
    assert_eq!(
        error.to_string(),
        "Bind join can only join entries with at least one common variable"
    );

    let (driver, entries) = create_entries();
    let join = join.with_options(
        JoinOptions::default().with_common_variables(CommonVariablePolicy::Allow),
    );
    let mut output = join.execute(entries, &dataset.context()).await.unwrap();
    driver.add(Bindings::new().with(var("x"), iri("x1")));
    insta::assert_snapshot!(
        drain_ready(&mut output.stream).join("\n"),
        @r#"+ {?o -> "1", ?s -> <http://example.com/a>, ?x -> <http://example.com/x1>}"#
    );
}
