//! Query helpers for describing open sources and signals.

use lp_store::{DataModel, Signal, SignalStore};

use crate::error::{AppError, AppResult};

/// Summary of an open source.
#[derive(Debug, Clone)]
pub struct SourceSummary {
    pub source_id: String,
    pub sample_count: usize,
    pub time_range: Option<(f64, f64)>,
    pub avg_dt: f64,
    pub raw_count: usize,
    pub derived_count: usize,
}

/// Summary of one signal's values.
#[derive(Debug, Clone)]
pub struct SignalSummary {
    pub name: String,
    pub source_id: String,
    pub sample_count: usize,
    pub is_integer: bool,
    pub value_range: Option<(f64, f64)>,
    pub time_range: Option<(f64, f64)>,
    /// Rendered plot spec tree, if the signal has one.
    pub provenance: Option<String>,
}

pub fn source_summary(model: &DataModel) -> SourceSummary {
    SourceSummary {
        source_id: model.source_id().to_string(),
        sample_count: model.len(),
        time_range: model.t_min().zip(model.t_max()),
        avg_dt: model.avg_dt(),
        raw_count: model.raw_names().count(),
        derived_count: model.derived_names().count(),
    }
}

pub fn list_sources(store: &SignalStore) -> Vec<SourceSummary> {
    store
        .sources()
        .filter_map(|id| store.model(id).ok())
        .map(source_summary)
        .collect()
}

pub fn signal_summary(signal: &Signal) -> SignalSummary {
    let time = signal.time();
    SignalSummary {
        name: signal.name().to_string(),
        source_id: signal.source_id().to_string(),
        sample_count: signal.len(),
        is_integer: signal.data().is_integer(),
        value_range: signal.data().range(),
        time_range: time.first().copied().zip(time.last().copied()),
        provenance: signal.plot_spec().map(|spec| spec.to_string()),
    }
}

/// Values of `signal` at the given ticks.
pub fn sample_at(signal: &Signal, ticks: &[usize]) -> AppResult<Vec<(f64, f64)>> {
    let time = signal.time();
    ticks
        .iter()
        .map(|&tick| {
            let value = signal.data().get(tick).ok_or_else(|| {
                AppError::InvalidInput(format!(
                    "tick {tick} out of range for '{}' ({} samples)",
                    signal.name(),
                    signal.len()
                ))
            })?;
            Ok((time[tick], value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lp_store::RawTable;

    #[test]
    fn summaries_describe_the_store() {
        let mut store = SignalStore::new();
        store
            .open(
                RawTable::new("Trans.log", vec![0.0, 0.5, 1.0])
                    .with_column("gear", vec![1_i64, 3, 2]),
            )
            .unwrap();
        store.set_time_offset("Trans.log", 10.0).unwrap();

        let sources = list_sources(&store);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].time_range, Some((10.0, 11.0)));
        assert_eq!(sources[0].raw_count, 1);

        let gear = store.get("Trans.log", "gear").unwrap();
        let summary = signal_summary(&gear);
        assert!(summary.is_integer);
        assert_eq!(summary.value_range, Some((1.0, 3.0)));
        assert_eq!(summary.provenance.as_deref(), Some("Trans.log:gear"));

        assert_eq!(sample_at(&gear, &[2]).unwrap(), vec![(11.0, 2.0)]);
        assert!(sample_at(&gear, &[3]).is_err());
    }
}
