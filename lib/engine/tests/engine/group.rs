use crate::common::{collect_sorted, haltable_context, output, row, var, TableMediator};
use rdf_delta_common::QueryOperationMediator;
use rdf_delta_engine::{EngineOptions, IncrementalEngine, OperationRequest};
use rdf_delta_model::algebra::{AggregateExpression, AggregateFunction, Expression};
use std::sync::Arc;

#[tokio::test]
async fn group_request_counts_per_key() {
    let engine = IncrementalEngine::new(
        TableMediator::new(Vec::new()) as Arc<dyn QueryOperationMediator>,
        EngineOptions::default(),
    );
    let input = output(
        &["k", "x"],
        vec![
            row(&[("k", "a"), ("x", "1")]),
            row(&[("k", "a"), ("x", "2")]),
            row(&[("k", "b"), ("x", "3")]),
        ],
        3,
    );
    let request = OperationRequest::Group {
        variables: vec![var("k")],
        aggregates: vec![(
            var("values"),
            AggregateExpression::FunctionCall {
                name: AggregateFunction::GroupConcat {
                    separator: Some(",".to_owned()),
                },
                expr: Expression::Variable(var("x")),
                distinct: false,
            },
        )],
        input,
    };

    let output = engine.evaluate(request, &haltable_context()).await.unwrap();

    assert_eq!(output.physical_plan_metadata.operator, "group");
    assert_eq!(
        output.bindings.metadata.variables,
        vec![var("k"), var("values")]
    );
    insta::assert_debug_snapshot!(collect_sorted(output.bindings.stream).await, @r#"
    [
        "+ {?k -> \"a\", ?values -> \"1\"}",
        "+ {?k -> \"a\", ?values -> \"1,2\"}",
        "+ {?k -> \"b\", ?values -> \"3\"}",
        "- {?k -> \"a\", ?values -> \"1\"}",
    ]
    "#);
}
