//! Rebuilds signals from their plot specs.
//!
//! Children are resolved depth-first, left to right. Every resolved node is
//! cached under its `unique_id` before its parent consumes it, so a subtree
//! shared by several parents (or several traces) is computed once.

use std::collections::HashMap;
use std::sync::Arc;

use lp_core::{SourceId, SpecId};
use lp_math::{MathError, MathInput, MathRegistry, Operation};
use lp_spec::{PlotSpec, SpecError, SpecSource};
use lp_store::{Signal, SignalStore, StoreError};
use tracing::debug;

pub type ReproduceResult<T> = Result<T, ReproduceError>;

#[derive(Debug, thiserror::Error)]
pub enum ReproduceError {
    #[error("Source not open: {source_id}")]
    SourceMissing { source_id: SourceId },

    #[error("Variable '{name}' not found in {source_id}")]
    VariableMissing { source_id: SourceId, name: String },

    #[error("Unknown operator: {source_type}")]
    UnknownOperator { source_type: String },

    #[error("Inputs of '{spec}' come from different sources: {first} and {other}")]
    TimeBaseMismatch {
        spec: String,
        first: SourceId,
        other: SourceId,
    },

    /// A child spec failed; `source` is the child's own error.
    #[error("Input '{child}' ({child_id}) of '{spec}' failed: {source}")]
    Child {
        spec: String,
        child: String,
        child_id: SpecId,
        source: Box<ReproduceError>,
    },

    #[error("Operator {operator} failed for '{spec}': {source}")]
    Operator {
        spec: String,
        operator: String,
        source: MathError,
    },

    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ReproduceError {
    /// The innermost error, past every `Child` wrapper.
    pub fn root_cause(&self) -> &ReproduceError {
        match self {
            ReproduceError::Child { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Where a resolved node lives in the store.
#[derive(Debug, Clone)]
struct CacheEntry {
    source_id: SourceId,
    name: String,
}

/// Reproduction engine over a math registry.
///
/// The cache outlives a single call so a whole layout shares one set of
/// intermediate results. Entries only remember where a signal is stored;
/// hits re-fetch it, so offset changes and closed sources are observed.
#[derive(Debug)]
pub struct Reproducer<'r> {
    registry: &'r MathRegistry,
    cache: HashMap<SpecId, CacheEntry>,
    invocations: usize,
}

impl Reproducer<'static> {
    /// Engine over the process-wide built-in registry.
    pub fn builtin() -> Self {
        Self::new(MathRegistry::global())
    }
}

impl<'r> Reproducer<'r> {
    pub fn new(registry: &'r MathRegistry) -> Self {
        Self {
            registry,
            cache: HashMap::new(),
            invocations: 0,
        }
    }

    pub fn registry(&self) -> &'r MathRegistry {
        self.registry
    }

    /// Number of operator applications performed so far.
    pub fn operator_invocations(&self) -> usize {
        self.invocations
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Drop cached entries that live in `source_id`.
    pub fn forget_source(&mut self, source_id: &SourceId) {
        self.cache.retain(|_, entry| &entry.source_id != source_id);
    }

    /// Return the signal `spec` describes, building and registering any
    /// derived nodes that are not already available.
    pub fn reproduce(
        &mut self,
        store: &mut SignalStore,
        spec: &Arc<PlotSpec>,
    ) -> ReproduceResult<Signal> {
        if let Some(hit) = self.cached(store, spec) {
            debug!(spec = spec.name(), id = %spec.unique_id(), "reproduce cache hit");
            return Ok(hit);
        }

        let signal = match spec.source() {
            SpecSource::File {
                source,
                original_name,
            } => {
                let model = store
                    .model(source)
                    .map_err(|_| ReproduceError::SourceMissing {
                        source_id: source.clone(),
                    })?;
                let signal =
                    model
                        .get(original_name)
                        .map_err(|_| ReproduceError::VariableMissing {
                            source_id: source.clone(),
                            name: original_name.clone(),
                        })?;
                signal.with_plot_spec(Some(Arc::clone(spec)))
            }
            SpecSource::Math { operation, inputs } => {
                let mut resolved = Vec::with_capacity(inputs.len());
                for child in inputs {
                    let signal =
                        self.reproduce(store, child)
                            .map_err(|err| ReproduceError::Child {
                                spec: spec.name().to_string(),
                                child: child.name().to_string(),
                                child_id: child.unique_id().clone(),
                                source: Box::new(err),
                            })?;
                    resolved.push(signal);
                }
                self.apply(store, spec, operation, &resolved)?
            }
        };

        self.cache.insert(
            spec.unique_id().clone(),
            CacheEntry {
                source_id: signal.source_id().clone(),
                name: signal.name().to_string(),
            },
        );
        Ok(signal)
    }

    fn cached(&mut self, store: &SignalStore, spec: &Arc<PlotSpec>) -> Option<Signal> {
        let entry = self.cache.get(spec.unique_id())?;
        match store.get(&entry.source_id, &entry.name) {
            Ok(signal) if spec.is_file() => Some(signal.with_plot_spec(Some(Arc::clone(spec)))),
            Ok(signal) => Some(signal),
            Err(_) => {
                self.cache.remove(spec.unique_id());
                None
            }
        }
    }

    fn apply(
        &mut self,
        store: &mut SignalStore,
        spec: &Arc<PlotSpec>,
        operation: &Operation,
        inputs: &[Signal],
    ) -> ReproduceResult<Signal> {
        let first = inputs.first().ok_or_else(|| SpecError::MalformedPlotSpec {
            name: spec.name().to_string(),
            what: "math spec without inputs".to_string(),
        })?;
        for other in &inputs[1..] {
            if other.source_id() != first.source_id() {
                return Err(ReproduceError::TimeBaseMismatch {
                    spec: spec.name().to_string(),
                    first: first.source_id().clone(),
                    other: other.source_id().clone(),
                });
            }
        }

        // Already derived in this source by an earlier load.
        if let Some(existing) = store.model(first.source_id())?.find_derived(spec.unique_id()) {
            debug!(spec = spec.name(), name = existing.name(), "reusing derived signal");
            return Ok(existing);
        }

        let kind = operation.kind();
        let operator = self
            .registry
            .get(kind)
            .map_err(|_| ReproduceError::UnknownOperator {
                source_type: kind.source_type().to_string(),
            })?;
        let math_inputs: Vec<MathInput<'_>> = inputs.iter().map(Signal::as_math_input).collect();
        let data = operator
            .apply(&math_inputs, operation)
            .map_err(|source| ReproduceError::Operator {
                spec: spec.name().to_string(),
                operator: kind.source_type().to_string(),
                source,
            })?;
        self.invocations += 1;

        let signal = store.add_derived_unique(
            first.source_id(),
            spec.name(),
            data,
            Some(Arc::clone(spec)),
        )?;
        debug!(
            spec = spec.name(),
            name = signal.name(),
            source = %signal.source_id(),
            "registered reproduced signal"
        );
        Ok(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lp_store::RawTable;

    fn store() -> SignalStore {
        let mut store = SignalStore::new();
        store
            .open(
                RawTable::new("Engine.csv", vec![0.0, 1.0, 2.0, 3.0])
                    .with_column("x", vec![5.0, 5.0, 5.0, 5.0])
                    .with_column("one", vec![1_i64, 1, 1, 1]),
            )
            .unwrap();
        store
    }

    #[test]
    fn file_leaf_carries_loaded_spec() {
        let mut store = store();
        let spec = Arc::new(PlotSpec::file("Engine.csv", "x"));
        let signal = Reproducer::builtin().reproduce(&mut store, &spec).unwrap();
        assert_eq!(signal.plot_spec().unwrap().unique_id(), spec.unique_id());
    }

    #[test]
    fn missing_variable() {
        let mut store = store();
        let spec = Arc::new(PlotSpec::file("Engine.csv", "nope"));
        let err = Reproducer::builtin().reproduce(&mut store, &spec).unwrap_err();
        assert!(matches!(err, ReproduceError::VariableMissing { .. }));
    }

    #[test]
    fn child_failure_keeps_context() {
        let mut store = store();
        let leaf = Arc::new(PlotSpec::file("Trans.log", "gear"));
        let diff = Arc::new(PlotSpec::math("dgear", Operation::Diff, vec![leaf.clone()]).unwrap());
        let err = Reproducer::builtin().reproduce(&mut store, &diff).unwrap_err();
        match &err {
            ReproduceError::Child {
                spec,
                child,
                child_id,
                ..
            } => {
                assert_eq!(spec, "dgear");
                assert_eq!(child, "gear");
                assert_eq!(child_id, leaf.unique_id());
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(matches!(
            err.root_cause(),
            ReproduceError::SourceMissing { .. }
        ));
    }

    #[test]
    fn unknown_operator() {
        let mut store = store();
        let mut registry = MathRegistry::builtin();
        registry.remove(lp_math::OperatorKind::Integrate);
        let leaf = Arc::new(PlotSpec::file("Engine.csv", "one"));
        let spec = Arc::new(PlotSpec::math("i", Operation::Integrate, vec![leaf]).unwrap());
        let err = Reproducer::new(&registry)
            .reproduce(&mut store, &spec)
            .unwrap_err();
        assert!(matches!(err, ReproduceError::UnknownOperator { .. }));
    }

    #[test]
    fn cache_hit_skips_operator() {
        let mut store = store();
        let leaf = Arc::new(PlotSpec::file("Engine.csv", "one"));
        let spec = Arc::new(PlotSpec::math("i", Operation::Integrate, vec![leaf]).unwrap());
        let mut engine = Reproducer::builtin();
        let first = engine.reproduce(&mut store, &spec).unwrap();
        let again = engine.reproduce(&mut store, &spec).unwrap();
        assert_eq!(engine.operator_invocations(), 1);
        assert_eq!(first.data(), again.data());
        assert_eq!(first.data().to_f64_vec(), vec![0.0, 1.0, 2.0, 3.0]);
    }
}
