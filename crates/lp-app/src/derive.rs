//! Interactive creation of derived signals.

use std::sync::Arc;

use lp_math::Operation;
use lp_spec::PlotSpec;
use lp_store::{Signal, SignalStore};

use crate::error::{AppError, AppResult};
use crate::reproduce::Reproducer;

/// Build a math spec over `inputs` and reproduce it.
///
/// Every input must carry the spec it was produced from; raw variables get
/// theirs when the source is opened.
pub fn derive_signal(
    store: &mut SignalStore,
    reproducer: &mut Reproducer<'_>,
    name: &str,
    operation: Operation,
    inputs: &[Signal],
) -> AppResult<Signal> {
    let specs = inputs
        .iter()
        .map(|input| {
            input.plot_spec().cloned().ok_or_else(|| {
                AppError::InvalidInput(format!(
                    "'{}' in {} has no plot spec",
                    input.name(),
                    input.source_id()
                ))
            })
        })
        .collect::<AppResult<Vec<_>>>()?;
    let spec = Arc::new(PlotSpec::math(name, operation, specs)?);
    Ok(reproducer.reproduce(store, &spec)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lp_store::RawTable;

    #[test]
    fn derived_signal_is_registered_with_spec() {
        let mut store = SignalStore::new();
        store
            .open(
                RawTable::new("Engine.csv", vec![0.0, 1.0, 2.0])
                    .with_column("a", vec![1.0, 2.0, 3.0])
                    .with_column("b", vec![10.0, 20.0, 30.0]),
            )
            .unwrap();
        let a = store.get("Engine.csv", "a").unwrap();
        let b = store.get("Engine.csv", "b").unwrap();
        let mut engine = Reproducer::builtin();
        let sum = derive_signal(
            &mut store,
            &mut engine,
            "sum",
            Operation::expr("x0 + x1"),
            &[a, b],
        )
        .unwrap();
        assert_eq!(sum.data().to_f64_vec(), vec![11.0, 22.0, 33.0]);
        let stored = store.get("Engine.csv", "sum").unwrap();
        assert_eq!(stored.plot_spec().unwrap().inputs().len(), 2);
    }

    #[test]
    fn input_without_spec_is_rejected() {
        let mut store = SignalStore::new();
        store
            .open(RawTable::new("s", vec![0.0, 1.0]).with_column("a", vec![1.0, 2.0]))
            .unwrap();
        let bare = store.add_derived("s", "bare", vec![0.0, 0.0]).unwrap();
        let err = derive_signal(
            &mut store,
            &mut Reproducer::builtin(),
            "d",
            Operation::Diff,
            &[bare],
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
