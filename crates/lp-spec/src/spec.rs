//! The plot spec tree.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use lp_core::{SourceId, SpecId};
use lp_math::{Operation, OperatorKind};

use crate::dict::PlotSpecDict;
use crate::error::{SpecError, SpecResult};

/// Tag written as `source_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceType {
    File,
    Math(OperatorKind),
}

impl SourceType {
    pub const FILE_TAG: &'static str = "file";

    pub fn as_str(self) -> &'static str {
        match self {
            SourceType::File => Self::FILE_TAG,
            SourceType::Math(kind) => kind.source_type(),
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        if tag == Self::FILE_TAG {
            Some(SourceType::File)
        } else {
            OperatorKind::from_source_type(tag).map(SourceType::Math)
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a node's signal is produced.
#[derive(Debug, Clone, PartialEq)]
pub enum SpecSource {
    /// A raw variable of an open source.
    File {
        source: SourceId,
        original_name: String,
    },
    /// An operator applied to child specs, in order.
    Math {
        operation: Operation,
        inputs: Vec<Arc<PlotSpec>>,
    },
}

/// Immutable description of how a signal was produced.
///
/// Children are shared through `Arc`, so a subtree used twice keeps one
/// `unique_id` and is only reproduced once.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSpec {
    name: String,
    unique_id: SpecId,
    source: SpecSource,
}

impl PlotSpec {
    /// Leaf for raw variable `original_name` of `source`.
    pub fn file(source: impl Into<SourceId>, original_name: impl Into<String>) -> Self {
        let original_name = original_name.into();
        Self {
            name: original_name.clone(),
            unique_id: SpecId::generate(),
            source: SpecSource::File {
                source: source.into(),
                original_name,
            },
        }
    }

    /// Math node over `inputs`. Fails when the input count does not match
    /// the operator's arity or the parameters are out of range.
    pub fn math(
        name: impl Into<String>,
        operation: Operation,
        inputs: Vec<Arc<PlotSpec>>,
    ) -> SpecResult<Self> {
        let spec = Self {
            name: name.into(),
            unique_id: SpecId::generate(),
            source: SpecSource::Math { operation, inputs },
        };
        spec.validate_node()?;
        Ok(spec)
    }

    /// Same node under a different identity.
    pub fn with_id(mut self, unique_id: SpecId) -> Self {
        self.unique_id = unique_id;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unique_id(&self) -> &SpecId {
        &self.unique_id
    }

    pub fn source(&self) -> &SpecSource {
        &self.source
    }

    pub fn source_type(&self) -> SourceType {
        match &self.source {
            SpecSource::File { .. } => SourceType::File,
            SpecSource::Math { operation, .. } => SourceType::Math(operation.kind()),
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self.source, SpecSource::File { .. })
    }

    pub fn inputs(&self) -> &[Arc<PlotSpec>] {
        match &self.source {
            SpecSource::File { .. } => &[],
            SpecSource::Math { inputs, .. } => inputs,
        }
    }

    pub fn operation(&self) -> Option<&Operation> {
        match &self.source {
            SpecSource::File { .. } => None,
            SpecSource::Math { operation, .. } => Some(operation),
        }
    }

    /// `(file_source_identifier, original_name)` for file leaves.
    pub fn file_source(&self) -> Option<(&SourceId, &str)> {
        match &self.source {
            SpecSource::File {
                source,
                original_name,
            } => Some((source, original_name)),
            SpecSource::Math { .. } => None,
        }
    }

    fn validate_node(&self) -> SpecResult<()> {
        match &self.source {
            SpecSource::File {
                source,
                original_name,
            } => {
                if source.as_str().is_empty() {
                    return Err(SpecError::malformed(&self.name, "empty file_source_identifier"));
                }
                if original_name.is_empty() {
                    return Err(SpecError::malformed(&self.name, "empty original_name"));
                }
            }
            SpecSource::Math { operation, inputs } => {
                operation.validate()?;
                let expected = operation.arity()?;
                if expected == 0 {
                    return Err(SpecError::malformed(
                        &self.name,
                        "expression references no input variables",
                    ));
                }
                if inputs.len() != expected {
                    return Err(SpecError::ArityMismatch {
                        name: self.name.clone(),
                        operator: operation.kind().source_type().to_string(),
                        expected,
                        actual: inputs.len(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Check every node of the tree.
    pub fn validate(&self) -> SpecResult<()> {
        self.walk().try_for_each(PlotSpec::validate_node)
    }

    /// Depth-first, left-to-right, parents before children. Shared
    /// subtrees are visited once per occurrence.
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }

    pub fn leaves(&self) -> impl Iterator<Item = &PlotSpec> {
        self.walk().filter(|s| s.is_file())
    }

    /// Distinct sources referenced by the tree, in first-visit order.
    pub fn source_ids(&self) -> Vec<SourceId> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for (source, _) in self.leaves().filter_map(PlotSpec::file_source) {
            if seen.insert(source.clone()) {
                out.push(source.clone());
            }
        }
        out
    }

    pub fn to_dict(&self) -> PlotSpecDict {
        let mut dict = PlotSpecDict {
            name: self.name.clone(),
            unique_id: Some(self.unique_id.as_str().to_string()),
            source_type: self.source_type().as_str().to_string(),
            ..PlotSpecDict::default()
        };
        match &self.source {
            SpecSource::File {
                source,
                original_name,
            } => {
                dict.file_source_identifier = Some(source.as_str().to_string());
                dict.original_name = Some(original_name.clone());
            }
            SpecSource::Math { operation, inputs } => {
                if let Operation::Expr(p) = operation {
                    dict.expression = Some(p.expression.clone());
                }
                dict.operation_details = operation.to_details();
                dict.input_plot_specs = inputs.iter().map(|c| c.to_dict()).collect();
            }
        }
        dict
    }

    pub fn from_dict(dict: &PlotSpecDict) -> SpecResult<Self> {
        let name = dict.name.clone();
        let unique_id = dict
            .unique_id
            .clone()
            .and_then(SpecId::from_saved)
            .ok_or_else(|| SpecError::malformed(&name, "missing unique_id"))?;
        let source_type = SourceType::parse(&dict.source_type).ok_or_else(|| {
            if dict.source_type.is_empty() {
                SpecError::malformed(&name, "missing source_type")
            } else {
                SpecError::Math(lp_math::MathError::UnknownOperator {
                    source_type: dict.source_type.clone(),
                })
            }
        })?;

        let source = match source_type {
            SourceType::File => {
                if !dict.input_plot_specs.is_empty() {
                    return Err(SpecError::malformed(&name, "file spec with input_plot_specs"));
                }
                let source = dict
                    .file_source_identifier
                    .clone()
                    .ok_or_else(|| SpecError::malformed(&name, "missing file_source_identifier"))?;
                let original_name = dict
                    .original_name
                    .clone()
                    .ok_or_else(|| SpecError::malformed(&name, "missing original_name"))?;
                SpecSource::File {
                    source: SourceId::new(source),
                    original_name,
                }
            }
            SourceType::Math(kind) => {
                let operation = decode_operation(kind, dict)?;
                let inputs = dict
                    .input_plot_specs
                    .iter()
                    .map(|child| PlotSpec::from_dict(child).map(Arc::new))
                    .collect::<SpecResult<Vec<_>>>()?;
                SpecSource::Math { operation, inputs }
            }
        };

        let spec = Self {
            name,
            unique_id,
            source,
        };
        spec.validate_node()?;
        Ok(spec)
    }

    pub fn to_json_value(&self) -> SpecResult<serde_json::Value> {
        Ok(serde_json::to_value(self.to_dict())?)
    }

    pub fn from_json_value(value: serde_json::Value) -> SpecResult<Self> {
        let dict: PlotSpecDict = serde_json::from_value(value)?;
        Self::from_dict(&dict)
    }
}

/// `math_expr` may carry the expression at top level, inside
/// `operation_details`, or both.
fn decode_operation(kind: OperatorKind, dict: &PlotSpecDict) -> SpecResult<Operation> {
    if kind == OperatorKind::Expr {
        if let Some(expression) = &dict.expression {
            return Ok(Operation::expr(expression.clone()));
        }
    }
    Operation::from_details(kind, dict.operation_details.as_ref()).map_err(|e| match e {
        lp_math::MathError::InvalidParameter { what } => SpecError::malformed(&dict.name, what),
        other => SpecError::Math(other),
    })
}

impl fmt::Display for PlotSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            SpecSource::File {
                source,
                original_name,
            } => write!(f, "{source}:{original_name}"),
            SpecSource::Math { operation, inputs } => {
                write!(f, "{}[{}](", self.name, operation.describe())?;
                for (i, input) in inputs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{input}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Iterator returned by [`PlotSpec::walk`].
pub struct Walk<'a> {
    stack: Vec<&'a PlotSpec>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a PlotSpec;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack
            .extend(node.inputs().iter().rev().map(|c| c.as_ref()));
        Some(node)
    }
}
