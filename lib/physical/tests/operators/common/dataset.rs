use async_trait::async_trait;
use futures::channel::mpsc::{unbounded, UnboundedSender};
use rdf_delta_common::error::DeltaError;
use rdf_delta_common::{
    BindingsOutput, BindingsStreamMetadata, Cardinality, DeltaResult, Haltable, QueryContext,
    QueryOperationMediator, QuerySource,
};
use rdf_delta_model::algebra::{GraphPattern, NamedNodePattern, TermPattern, TriplePattern};
use rdf_delta_model::{Bindings, SignedBindings, Term, Triple, Variable};
use std::sync::{Arc, Mutex};

/// A streaming in-memory triple store that evaluates basic graph patterns.
///
/// Operations that consist of a single triple pattern are evaluated as live subscriptions: they
/// produce the current matches and then follow all changes until [MemoryDataset::finish] is
/// called. While the dataset is halted, and for all other operations, the stream ends after the
/// current matches.
#[derive(Debug, Default)]
pub struct MemoryDataset {
    state: Mutex<DatasetState>,
}

#[derive(Debug, Default)]
struct DatasetState {
    triples: Vec<Triple>,
    halted: usize,
    halts: usize,
    resumes: usize,
    mediations: usize,
    subscriptions: Vec<Subscription>,
}

#[derive(Debug)]
struct Subscription {
    pattern: TriplePattern,
    sender: UnboundedSender<DeltaResult<SignedBindings>>,
}

impl MemoryDataset {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn context(self: &Arc<Self>) -> QueryContext {
        QueryContext::new().with_source(Arc::clone(self) as Arc<dyn QuerySource>)
    }

    pub fn insert(&self, triple: Triple) {
        let mut state = self.state.lock().unwrap();
        state.notify(&triple, SignedBindings::addition);
        state.triples.push(triple);
    }

    pub fn remove(&self, triple: &Triple) {
        let mut state = self.state.lock().unwrap();
        let position = state.triples.iter().position(|t| t == triple).unwrap();
        state.triples.remove(position);
        state.notify(triple, SignedBindings::deletion);
    }

    /// Ends all live subscriptions.
    pub fn finish(&self) {
        self.state.lock().unwrap().subscriptions.clear();
    }

    pub fn halts(&self) -> usize {
        self.state.lock().unwrap().halts
    }

    pub fn resumes(&self) -> usize {
        self.state.lock().unwrap().resumes
    }

    pub fn mediations(&self) -> usize {
        self.state.lock().unwrap().mediations
    }
}

impl DatasetState {
    fn notify(&mut self, triple: &Triple, signed: fn(Bindings) -> SignedBindings) {
        self.subscriptions.retain(|s| !s.sender.is_closed());
        for subscription in &self.subscriptions {
            if let Some(bindings) = match_triple(&subscription.pattern, triple) {
                // Closed subscriptions are removed on the next change.
                subscription
                    .sender
                    .unbounded_send(Ok(signed(bindings)))
                    .ok();
            }
        }
    }

    fn evaluate(&self, pattern: &GraphPattern) -> DeltaResult<Vec<Bindings>> {
        match pattern {
            GraphPattern::Bgp { patterns } => {
                let mut result = vec![Bindings::new()];
                for pattern in patterns {
                    let matches = self
                        .triples
                        .iter()
                        .filter_map(|t| match_triple(pattern, t))
                        .collect::<Vec<_>>();
                    result = join(&result, &matches);
                }
                Ok(result)
            }
            GraphPattern::Join { left, right } => {
                Ok(join(&self.evaluate(left)?, &self.evaluate(right)?))
            }
            GraphPattern::Values { bindings, .. } if bindings.is_empty() => Ok(Vec::new()),
            _ => Err(DeltaError::other(format!("Unsupported operation {pattern}"))),
        }
    }
}

impl Haltable for MemoryDataset {
    fn halt(&self) {
        let mut state = self.state.lock().unwrap();
        state.halted += 1;
        state.halts += 1;
    }

    fn resume(&self) {
        let mut state = self.state.lock().unwrap();
        state.halted -= 1;
        state.resumes += 1;
    }
}

impl QuerySource for MemoryDataset {
    fn name(&self) -> &str {
        "memory"
    }

    fn as_haltable(&self) -> Option<&dyn Haltable> {
        Some(self)
    }
}

#[async_trait]
impl QueryOperationMediator for MemoryDataset {
    async fn mediate(
        &self,
        operation: &GraphPattern,
        _context: &QueryContext,
    ) -> DeltaResult<BindingsOutput> {
        let mut state = self.state.lock().unwrap();
        state.mediations += 1;

        let matches = state.evaluate(operation)?;
        let metadata = BindingsStreamMetadata::new(
            Cardinality::Estimate(matches.len() as u64),
            variables(operation),
        );

        let (sender, receiver) = unbounded();
        for bindings in matches {
            sender
                .unbounded_send(Ok(SignedBindings::addition(bindings)))
                .unwrap();
        }
        if let GraphPattern::Bgp { patterns } = operation {
            if let [pattern] = patterns.as_slice() {
                if state.halted == 0 {
                    state.subscriptions.push(Subscription {
                        pattern: pattern.clone(),
                        sender,
                    });
                }
            }
        }
        Ok(BindingsOutput::new(Box::pin(receiver), metadata))
    }
}

/// A source that cannot be halted.
#[derive(Debug)]
pub struct StaticSource;

impl QuerySource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }
}

fn join(left: &[Bindings], right: &[Bindings]) -> Vec<Bindings> {
    left.iter()
        .flat_map(|l| right.iter().filter_map(|r| l.merge(r)))
        .collect()
}

fn variables(pattern: &GraphPattern) -> Vec<Variable> {
    let mut result = Vec::new();
    pattern.on_in_scope_variable(|v| {
        if !result.contains(v) {
            result.push(v.clone());
        }
    });
    result
}

fn match_triple(pattern: &TriplePattern, triple: &Triple) -> Option<Bindings> {
    let mut bindings = Bindings::new();
    let predicate = match &pattern.predicate {
        NamedNodePattern::NamedNode(node) => TermPattern::NamedNode(node.clone()),
        NamedNodePattern::Variable(variable) => TermPattern::Variable(variable.clone()),
    };
    let matches = match_term(&pattern.subject, &triple.subject.clone().into(), &mut bindings)
        && match_term(&predicate, &triple.predicate.clone().into(), &mut bindings)
        && match_term(&pattern.object, &triple.object, &mut bindings);
    matches.then_some(bindings)
}

fn match_term(pattern: &TermPattern, term: &Term, bindings: &mut Bindings) -> bool {
    if let TermPattern::Variable(variable) = pattern {
        return match bindings.get(variable) {
            Some(existing) => existing == term,
            None => {
                bindings.insert(variable.clone(), term.clone());
                true
            }
        };
    }

    let constant = match pattern {
        TermPattern::NamedNode(node) => Term::from(node.clone()),
        TermPattern::BlankNode(node) => Term::from(node.clone()),
        TermPattern::Literal(literal) => Term::from(literal.clone()),
        _ => return false,
    };
    &constant == term
}
