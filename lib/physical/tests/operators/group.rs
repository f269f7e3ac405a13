use crate::common::{drain_ready, is_finished, row, var, PushSource};
use rdf_delta_common::BindingsOutput;
use rdf_delta_functions::DefaultAggregatorFactory;
use rdf_delta_model::algebra::{AggregateExpression, AggregateFunction, Expression};
use rdf_delta_model::{Bindings, Literal, NamedNode, Variable};
use rdf_delta_physical::group::GroupOperator;
use std::sync::Arc;

fn aggregate(name: AggregateFunction, variable: &str, distinct: bool) -> AggregateExpression {
    AggregateExpression::FunctionCall {
        name,
        expr: Expression::Variable(var(variable)),
        distinct,
    }
}

fn group(
    variables: &[&str],
    aggregates: Vec<(Variable, AggregateExpression)>,
    input: BindingsOutput,
) -> BindingsOutput {
    GroupOperator::new(
        variables.iter().map(|v| var(v)).collect(),
        aggregates,
        Arc::new(DefaultAggregatorFactory::default()),
    )
    .execute(input)
}

fn integer(value: i64) -> Bindings {
    Bindings::new().with(var("x"), Literal::from(value))
}

#[test]
fn group_of_empty_input_has_empty_aggregates() {
    let (mut input, input_output) = PushSource::new(&["x"], 0);
    let aggregates = vec![
        (var("count"), aggregate(AggregateFunction::Count, "x", false)),
        (var("sum"), aggregate(AggregateFunction::Sum, "x", false)),
        (var("avg"), aggregate(AggregateFunction::Avg, "x", false)),
        (var("min"), aggregate(AggregateFunction::Min, "x", false)),
        (var("max"), aggregate(AggregateFunction::Max, "x", false)),
        (var("sample"), aggregate(AggregateFunction::Sample, "x", false)),
        (
            var("concat"),
            aggregate(AggregateFunction::GroupConcat { separator: None }, "x", false),
        ),
        (
            var("all"),
            AggregateExpression::CountSolutions { distinct: false },
        ),
    ];
    let mut output = group(&[], aggregates, input_output);
    input.finish();

    insta::assert_snapshot!(drain_ready(&mut output.stream).join("\n"), @r#"+ {?all -> "0"^^<http://www.w3.org/2001/XMLSchema#integer>, ?avg -> "0"^^<http://www.w3.org/2001/XMLSchema#integer>, ?concat -> "", ?count -> "0"^^<http://www.w3.org/2001/XMLSchema#integer>, ?sum -> "0"^^<http://www.w3.org/2001/XMLSchema#integer>}"#);
    assert!(is_finished(&mut output.stream));
}

#[test]
fn group_without_aggregates_emits_distinct_keys() {
    let (mut input, input_output) = PushSource::new(&["x"], 5);
    let mut output = group(&["x"], Vec::new(), input_output);

    for value in ["aaa", "aaa", "bbb", "ccc", "aaa"] {
        input.add(row(&[("x", value)]));
    }
    input.finish();

    assert_eq!(output.metadata.variables, vec![var("x")]);
    insta::assert_snapshot!(drain_ready(&mut output.stream).join("\n"), @r#"
    + {?x -> "aaa"}
    + {?x -> "bbb"}
    + {?x -> "ccc"}
    "#);
    assert!(is_finished(&mut output.stream));
}

#[test]
fn group_count_emits_transitions() {
    let (mut input, input_output) = PushSource::new(&["x"], 4);
    let aggregates = vec![(var("c"), aggregate(AggregateFunction::Count, "x", false))];
    let mut output = group(&[], aggregates, input_output);

    // The input is not ready yet, so the empty group is emitted.
    let paused = drain_ready(&mut output.stream);

    input.add(row(&[("x", "a")]));
    input.add(row(&[("x", "b")]));
    let added = drain_ready(&mut output.stream);

    input.delete(row(&[("x", "a")]));
    input.finish();
    let deleted = drain_ready(&mut output.stream);

    insta::assert_snapshot!(paused.join("\n"), @r#"+ {?c -> "0"^^<http://www.w3.org/2001/XMLSchema#integer>}"#);
    insta::assert_snapshot!(added.join("\n"), @r#"
    - {?c -> "0"^^<http://www.w3.org/2001/XMLSchema#integer>}
    + {?c -> "1"^^<http://www.w3.org/2001/XMLSchema#integer>}
    - {?c -> "1"^^<http://www.w3.org/2001/XMLSchema#integer>}
    + {?c -> "2"^^<http://www.w3.org/2001/XMLSchema#integer>}
    "#);
    insta::assert_snapshot!(deleted.join("\n"), @r#"
    - {?c -> "2"^^<http://www.w3.org/2001/XMLSchema#integer>}
    + {?c -> "1"^^<http://www.w3.org/2001/XMLSchema#integer>}
    "#);
    assert!(is_finished(&mut output.stream));
}

#[test]
fn group_burst_does_not_emit_empty_group() {
    let (mut input, input_output) = PushSource::new(&["x"], 2);
    let aggregates = vec![(var("c"), aggregate(AggregateFunction::Count, "x", false))];
    let mut output = group(&[], aggregates, input_output);

    input.add(row(&[("x", "a")]));
    input.add(row(&[("x", "b")]));
    input.finish();

    insta::assert_snapshot!(drain_ready(&mut output.stream).join("\n"), @r#"
    + {?c -> "1"^^<http://www.w3.org/2001/XMLSchema#integer>}
    - {?c -> "1"^^<http://www.w3.org/2001/XMLSchema#integer>}
    + {?c -> "2"^^<http://www.w3.org/2001/XMLSchema#integer>}
    "#);
}

#[test]
fn group_by_key_removes_empty_groups() {
    let (input, input_output) = PushSource::new(&["k", "x"], 3);
    let aggregates = vec![(var("s"), aggregate(AggregateFunction::Sum, "x", false))];
    let mut output = group(&["k"], aggregates, input_output);

    input.add(integer(1).with(var("k"), Literal::from("a")));
    input.add(integer(2).with(var("k"), Literal::from("a")));
    input.add(integer(5).with(var("k"), Literal::from("b")));
    input.delete(integer(5).with(var("k"), Literal::from("b")));

    assert_eq!(output.metadata.variables, vec![var("k"), var("s")]);
    insta::assert_snapshot!(drain_ready(&mut output.stream).join("\n"), @r#"
    + {?k -> "a", ?s -> "1"^^<http://www.w3.org/2001/XMLSchema#integer>}
    - {?k -> "a", ?s -> "1"^^<http://www.w3.org/2001/XMLSchema#integer>}
    + {?k -> "a", ?s -> "3"^^<http://www.w3.org/2001/XMLSchema#integer>}
    + {?k -> "b", ?s -> "5"^^<http://www.w3.org/2001/XMLSchema#integer>}
    - {?k -> "b", ?s -> "5"^^<http://www.w3.org/2001/XMLSchema#integer>}
    "#);
}

#[test]
fn group_distinct_count_ignores_duplicates() {
    let (input, input_output) = PushSource::new(&["x"], 3);
    let aggregates = vec![(var("c"), aggregate(AggregateFunction::Count, "x", true))];
    let mut output = group(&[], aggregates, input_output);

    input.add(row(&[("x", "a")]));
    input.add(row(&[("x", "a")]));
    input.delete(row(&[("x", "a")]));
    input.add(row(&[("x", "b")]));

    insta::assert_snapshot!(drain_ready(&mut output.stream).join("\n"), @r#"
    + {?c -> "1"^^<http://www.w3.org/2001/XMLSchema#integer>}
    - {?c -> "1"^^<http://www.w3.org/2001/XMLSchema#integer>}
    + {?c -> "2"^^<http://www.w3.org/2001/XMLSchema#integer>}
    "#);
}

#[test]
fn group_ignores_values_rejected_by_aggregate() {
    let (input, input_output) = PushSource::new(&["x"], 3);
    let aggregates = vec![(var("s"), aggregate(AggregateFunction::Sum, "x", false))];
    let mut output = group(&[], aggregates, input_output);

    input.add(integer(2));
    input.add(row(&[("x", "not a number")]));
    input.delete(row(&[("x", "not a number")]));
    // Unbound inputs fail to evaluate and are ignored as well.
    input.add(Bindings::new());

    insta::assert_snapshot!(drain_ready(&mut output.stream).join("\n"), @r#"+ {?s -> "2"^^<http://www.w3.org/2001/XMLSchema#integer>}"#);
}

#[test]
fn group_rejects_deletion_of_missing_group() {
    let (input, input_output) = PushSource::new(&["x"], 1);
    let mut output = group(&["x"], Vec::new(), input_output);

    input.delete(row(&[("x", "a")]));

    assert_eq!(
        drain_ready(&mut output.stream),
        ["! Received deletion for non-existing addition"]
    );
    assert!(is_finished(&mut output.stream));
}

#[test]
fn group_rejects_deletion_of_empty_implicit_group() {
    let (input, input_output) = PushSource::new(&["x"], 1);
    let aggregates = vec![(var("c"), aggregate(AggregateFunction::Count, "x", false))];
    let mut output = group(&[], aggregates, input_output);

    insta::assert_snapshot!(
        drain_ready(&mut output.stream).join("\n"),
        @r#"+ {?c -> "0"^^<http://www.w3.org/2001/XMLSchema#integer>}"#
    );
    input.delete(integer(1));

    assert_eq!(
        drain_ready(&mut output.stream),
        ["! Received deletion for non-existing addition"]
    );
    assert!(is_finished(&mut output.stream));
}

#[test]
fn group_with_unsupported_aggregate_fails() {
    let (mut input, input_output) = PushSource::new(&["x"], 1);
    let custom = AggregateFunction::Custom(NamedNode::new_unchecked("http://example.com/median"));
    let aggregates = vec![(var("m"), aggregate(custom, "x", false))];
    let mut output = group(&[], aggregates, input_output);

    input.finish();

    assert_eq!(
        drain_ready(&mut output.stream),
        ["! Unsupported aggregator <http://example.com/median>"]
    );
    assert!(is_finished(&mut output.stream));
}

#[test]
fn group_forwards_input_errors() {
    let (input, input_output) = PushSource::new(&["x"], 1);
    let mut output = group(&["x"], Vec::new(), input_output);

    input.add(row(&[("x", "a")]));
    input.push(Err(rdf_delta_common::error::DeltaError::other("input failed")));
    input.add(row(&[("x", "b")]));

    assert_eq!(
        drain_ready(&mut output.stream),
        ["+ {?x -> \"a\"}", "! input failed"]
    );
    assert!(is_finished(&mut output.stream));
}
