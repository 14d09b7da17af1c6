//! Read-only signal views.

use std::sync::Arc;

use lp_core::{Samples, SourceId, shifted};
use lp_math::MathInput;
use lp_spec::PlotSpec;

use crate::error::{StoreError, StoreResult};

/// Aligned time and data sequences plus provenance.
///
/// Sample buffers are shared with the owning [`DataModel`](crate::DataModel);
/// a `Signal` never mutates them. The time offset is captured when the
/// signal is fetched, so a later offset change needs a fresh `get`.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    name: String,
    source_id: SourceId,
    data: Arc<Samples>,
    base_time: Arc<[f64]>,
    time_offset: f64,
    plot_spec: Option<Arc<PlotSpec>>,
}

impl Signal {
    pub fn new(
        name: impl Into<String>,
        source_id: SourceId,
        data: Arc<Samples>,
        base_time: Arc<[f64]>,
        time_offset: f64,
    ) -> StoreResult<Self> {
        let name = name.into();
        if data.len() != base_time.len() {
            return Err(StoreError::LengthMismatch {
                what: format!("signal '{name}'"),
                expected: base_time.len(),
                actual: data.len(),
            });
        }
        Ok(Self {
            name,
            source_id,
            data,
            base_time,
            time_offset,
            plot_spec: None,
        })
    }

    pub fn with_plot_spec(mut self, spec: Option<Arc<PlotSpec>>) -> Self {
        self.plot_spec = spec;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_id(&self) -> &SourceId {
        &self.source_id
    }

    pub fn data(&self) -> &Samples {
        &self.data
    }

    pub fn shared_data(&self) -> Arc<Samples> {
        Arc::clone(&self.data)
    }

    /// Time vector without the source's offset. Operators run on this.
    pub fn base_time(&self) -> &[f64] {
        &self.base_time
    }

    pub fn time_offset(&self) -> f64 {
        self.time_offset
    }

    /// Effective time, `base_time + time_offset`.
    pub fn time(&self) -> Vec<f64> {
        shifted(&self.base_time, self.time_offset)
    }

    pub fn plot_spec(&self) -> Option<&Arc<PlotSpec>> {
        self.plot_spec.as_ref()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_math_input(&self) -> MathInput<'_> {
        MathInput::new(&self.data, &self.base_time)
    }
}
