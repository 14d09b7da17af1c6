//! Per-source container of raw and derived variables.

use std::collections::HashMap;
use std::sync::Arc;

use lp_core::{Samples, SourceId, SpecId, avg_dt, ensure_sorted, nearest_tick};
use lp_spec::PlotSpec;

use crate::error::{StoreError, StoreResult};
use crate::loader::RawTable;
use crate::signal::Signal;

#[derive(Debug, Clone)]
struct Variable {
    data: Arc<Samples>,
    /// File leaf for raw variables, producing spec (if any) for derived ones.
    plot_spec: Option<Arc<PlotSpec>>,
    derived: bool,
}

/// One open source: a single time base shared by every variable in it.
#[derive(Debug, Clone)]
pub struct DataModel {
    source_id: SourceId,
    time: Arc<[f64]>,
    time_offset: f64,
    avg_dt: f64,
    variables: HashMap<String, Variable>,
    /// Raw names in table order, then derived names in insertion order.
    order: Vec<String>,
}

impl DataModel {
    /// Build from a loaded table, checking lengths, sortedness and name
    /// uniqueness.
    pub fn from_table(table: RawTable) -> StoreResult<Self> {
        let RawTable {
            source_id,
            time,
            columns,
        } = table;
        if let Err(err) = ensure_sorted(&time) {
            return Err(match err {
                lp_core::CoreError::UnsortedTime { index, .. } => {
                    StoreError::UnsortedTime { source_id, index }
                }
                other => other.into(),
            });
        }
        let n = time.len();
        let mut variables = HashMap::with_capacity(columns.len());
        let mut order = Vec::with_capacity(columns.len());
        for (name, data) in columns {
            if data.len() != n {
                return Err(StoreError::LengthMismatch {
                    what: format!("column '{name}' of {source_id}"),
                    expected: n,
                    actual: data.len(),
                });
            }
            if variables.contains_key(&name) {
                return Err(StoreError::NameClash { source_id, name });
            }
            let leaf = Arc::new(PlotSpec::file(source_id.clone(), name.clone()));
            variables.insert(
                name.clone(),
                Variable {
                    data: Arc::new(data),
                    plot_spec: Some(leaf),
                    derived: false,
                },
            );
            order.push(name);
        }
        Ok(Self {
            avg_dt: avg_dt(&time),
            source_id,
            time: time.into(),
            time_offset: 0.0,
            variables,
            order,
        })
    }

    pub fn source_id(&self) -> &SourceId {
        &self.source_id
    }

    /// Underlying time vector, without the offset.
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn shared_time(&self) -> Arc<[f64]> {
        Arc::clone(&self.time)
    }

    pub fn time_offset(&self) -> f64 {
        self.time_offset
    }

    pub(crate) fn set_time_offset(&mut self, offset: f64) {
        self.time_offset = offset;
    }

    pub fn avg_dt(&self) -> f64 {
        self.avg_dt
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn t_min(&self) -> Option<f64> {
        self.time.first().map(|t| t + self.time_offset)
    }

    pub fn t_max(&self) -> Option<f64> {
        self.time.last().map(|t| t + self.time_offset)
    }

    /// Last valid tick, `None` for an empty source.
    pub fn tick_max(&self) -> Option<usize> {
        self.time.len().checked_sub(1)
    }

    /// Tick nearest to effective time `t`.
    pub fn tick_at(&self, t: f64) -> Option<usize> {
        nearest_tick(&self.time, t - self.time_offset)
    }

    pub fn value_at(&self, name: &str, tick: usize) -> Option<f64> {
        self.variables.get(name)?.data.get(tick)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn is_derived(&self, name: &str) -> bool {
        self.variables.get(name).is_some_and(|v| v.derived)
    }

    /// Raw then derived names.
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn raw_names(&self) -> impl Iterator<Item = &str> {
        self.variable_names().filter(|n| !self.is_derived(n))
    }

    pub fn derived_names(&self) -> impl Iterator<Item = &str> {
        self.variable_names().filter(|n| self.is_derived(n))
    }

    /// Raw or derived variable with the current offset applied to its time.
    pub fn get(&self, name: &str) -> StoreResult<Signal> {
        let var = self
            .variables
            .get(name)
            .ok_or_else(|| StoreError::VariableMissing {
                source_id: self.source_id.clone(),
                name: name.to_string(),
            })?;
        let signal = Signal::new(
            name,
            self.source_id.clone(),
            Arc::clone(&var.data),
            self.shared_time(),
            self.time_offset,
        )?;
        Ok(signal.with_plot_spec(var.plot_spec.clone()))
    }

    /// Derived variable previously registered for the spec with `unique_id`.
    pub fn find_derived(&self, unique_id: &SpecId) -> Option<Signal> {
        let name = self.derived_names().find(|name| {
            self.variables[*name]
                .plot_spec
                .as_ref()
                .is_some_and(|spec| spec.unique_id() == unique_id)
        })?;
        self.get(name).ok()
    }

    pub(crate) fn insert_derived(
        &mut self,
        name: String,
        data: Samples,
        plot_spec: Option<Arc<PlotSpec>>,
    ) -> StoreResult<Signal> {
        if self.contains(&name) {
            return Err(StoreError::NameClash {
                source_id: self.source_id.clone(),
                name,
            });
        }
        if data.len() != self.len() {
            return Err(StoreError::LengthMismatch {
                what: format!("derived '{name}' of {}", self.source_id),
                expected: self.len(),
                actual: data.len(),
            });
        }
        self.variables.insert(
            name.clone(),
            Variable {
                data: Arc::new(data),
                plot_spec,
                derived: true,
            },
        );
        self.order.push(name.clone());
        self.get(&name)
    }

    pub(crate) fn remove_derived(&mut self, name: &str) -> StoreResult<()> {
        if !self.is_derived(name) {
            return Err(StoreError::VariableMissing {
                source_id: self.source_id.clone(),
                name: name.to_string(),
            });
        }
        self.variables.remove(name);
        self.order.retain(|n| n != name);
        Ok(())
    }

    /// `name`, or `name (2)`, `name (3)`, … whichever is free first.
    pub fn unique_name(&self, name: &str) -> String {
        if !self.contains(name) {
            return name.to_string();
        }
        (2..)
            .map(|k| format!("{name} ({k})"))
            .find(|candidate| !self.contains(candidate))
            .unwrap_or_else(|| name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RawTable {
        RawTable::new("Engine.csv", vec![0.0, 0.1, 0.2])
            .with_column("a", vec![1_i64, 2, 3])
            .with_column("b", vec![10.0, 20.0, 30.0])
    }

    #[test]
    fn basic_properties() {
        let model = DataModel::from_table(table()).unwrap();
        assert_eq!(model.len(), 3);
        assert_eq!(model.tick_max(), Some(2));
        assert!((model.avg_dt() - 0.1).abs() < 1e-12);
        assert_eq!(model.t_min(), Some(0.0));
        assert_eq!(model.t_max(), Some(0.2));
        assert_eq!(model.variable_names().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(model.value_at("a", 1), Some(2.0));
    }

    #[test]
    fn file_leaf_is_stable() {
        let model = DataModel::from_table(table()).unwrap();
        let first = model.get("a").unwrap();
        let second = model.get("a").unwrap();
        assert_eq!(
            first.plot_spec().unwrap().unique_id(),
            second.plot_spec().unwrap().unique_id()
        );
        assert!(first.data().is_integer());
    }

    #[test]
    fn rejects_bad_tables() {
        let short = RawTable::new("x", vec![0.0, 1.0]).with_column("a", vec![1.0]);
        assert!(matches!(
            DataModel::from_table(short),
            Err(StoreError::LengthMismatch { .. })
        ));
        let unsorted = RawTable::new("x", vec![0.0, 2.0, 1.0]);
        assert!(matches!(
            DataModel::from_table(unsorted),
            Err(StoreError::UnsortedTime { index: 2, .. })
        ));
        let dup = RawTable::new("x", vec![0.0])
            .with_column("a", vec![1.0])
            .with_column("a", vec![2.0]);
        assert!(matches!(
            DataModel::from_table(dup),
            Err(StoreError::NameClash { .. })
        ));
    }

    #[test]
    fn offset_shifts_effective_time_only() {
        let mut model = DataModel::from_table(table()).unwrap();
        model.set_time_offset(5.0);
        let s = model.get("b").unwrap();
        assert_eq!(s.base_time(), &[0.0, 0.1, 0.2]);
        let want = [5.0, 5.1, 5.2];
        assert!(s.time().iter().zip(want).all(|(t, w)| (t - w).abs() < 1e-12));
        assert_eq!(model.tick_at(5.09), Some(1));
        assert_eq!(model.t_min(), Some(5.0));
    }

    #[test]
    fn unique_names() {
        let mut model = DataModel::from_table(table()).unwrap();
        assert_eq!(model.unique_name("c"), "c");
        assert_eq!(model.unique_name("a"), "a (2)");
        model
            .insert_derived("a (2)".into(), vec![0.0; 3].into(), None)
            .unwrap();
        assert_eq!(model.unique_name("a"), "a (3)");
        assert_eq!(model.derived_names().collect::<Vec<_>>(), ["a (2)"]);
    }

    #[test]
    fn derived_lookup_by_spec() {
        let mut model = DataModel::from_table(table()).unwrap();
        let leaf = model.get("a").unwrap().plot_spec().cloned().unwrap();
        let spec = Arc::new(PlotSpec::math("d", lp_math::Operation::Diff, vec![leaf]).unwrap());
        assert!(model.find_derived(spec.unique_id()).is_none());
        model
            .insert_derived("d".into(), vec![0.0, 10.0, 10.0].into(), Some(spec.clone()))
            .unwrap();
        let found = model.find_derived(spec.unique_id()).unwrap();
        assert_eq!(found.name(), "d");
    }
}
