//! Operator lookup by kind.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use crate::error::{MathError, MathResult};
use crate::operator::{
    DiffOperator, ExprOperator, FilterOperator, IntegrateOperator, MathOperator,
    RunningMinMaxOperator, RunningWindowOperator,
};
use crate::params::OperatorKind;

/// Maps each operator kind to its implementation.
#[derive(Clone, Default)]
pub struct MathRegistry {
    operators: BTreeMap<OperatorKind, Arc<dyn MathOperator>>,
}

impl MathRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in operator.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(ExprOperator);
        registry.register(FilterOperator);
        registry.register(DiffOperator);
        registry.register(IntegrateOperator);
        registry.register(RunningMinMaxOperator);
        registry.register(RunningWindowOperator);
        registry
    }

    /// Process-wide built-in registry, created on first use.
    pub fn global() -> &'static MathRegistry {
        static GLOBAL: OnceLock<MathRegistry> = OnceLock::new();
        GLOBAL.get_or_init(MathRegistry::builtin)
    }

    /// Install `op`, replacing any operator of the same kind.
    pub fn register(&mut self, op: impl MathOperator + 'static) {
        self.register_shared(Arc::new(op));
    }

    pub fn register_shared(&mut self, op: Arc<dyn MathOperator>) {
        self.operators.insert(op.kind(), op);
    }

    pub fn remove(&mut self, kind: OperatorKind) -> Option<Arc<dyn MathOperator>> {
        self.operators.remove(&kind)
    }

    pub fn get(&self, kind: OperatorKind) -> MathResult<&dyn MathOperator> {
        self.operators
            .get(&kind)
            .map(|op| op.as_ref())
            .ok_or_else(|| MathError::UnknownOperator {
                source_type: kind.source_type().to_string(),
            })
    }

    /// Look up by the on-disk `source_type` tag.
    pub fn get_by_source_type(&self, source_type: &str) -> MathResult<&dyn MathOperator> {
        let kind = OperatorKind::from_source_type(source_type).ok_or_else(|| {
            MathError::UnknownOperator {
                source_type: source_type.to_string(),
            }
        })?;
        self.get(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = OperatorKind> + '_ {
        self.operators.keys().copied()
    }
}

impl std::fmt::Debug for MathRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.kinds()).finish()
    }
}
