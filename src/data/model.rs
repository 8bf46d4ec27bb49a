use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use anyhow::{bail, Result};

use crate::error::PlotError;

/// Column holding per-sample identifiers.
pub const NAME_COLUMN: &str = "name";
/// Column holding per-sample class targets.
pub const TARGET_COLUMN: &str = "target";
/// Column holding explicit predicted labels in a prediction set.
pub const PREDICTION_COLUMN: &str = "prediction";

// ---------------------------------------------------------------------------
// Value – a single cell of a stored table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring common dataframe dtypes.
/// Labels live in `BTreeMap` / `BTreeSet` downstream so `Value` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put Value in BTreeSet --

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::String(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl Value {
    /// Interpret the cell as a coordinate. Nulls become NaN.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            Value::Null => Some(f64::NAN),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

// ---------------------------------------------------------------------------
// RawTable – column-oriented view of a stored file, before interpretation
// ---------------------------------------------------------------------------

/// Storage type of a whole column, as the source format declares it (parquet)
/// or as inferred from every cell (JSON, CSV).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    Bool,
    Text,
    /// No declared type and no non-null cell to infer one from.
    Unknown,
}

impl ColumnKind {
    /// Infer a column type from its cells: integers widen to float when any
    /// float is present, and any other mix falls back to text.
    pub fn infer(values: &[Value]) -> Self {
        let mut kind = ColumnKind::Unknown;
        for v in values {
            let cell = match v {
                Value::Null => continue,
                Value::Integer(_) => ColumnKind::Integer,
                Value::Float(_) => ColumnKind::Float,
                Value::Bool(_) => ColumnKind::Bool,
                Value::String(_) => ColumnKind::Text,
            };
            kind = match (kind, cell) {
                (ColumnKind::Unknown, c) => c,
                (k, c) if k == c => k,
                (ColumnKind::Integer, ColumnKind::Float) | (ColumnKind::Float, ColumnKind::Integer) => {
                    ColumnKind::Float
                }
                _ => ColumnKind::Text,
            };
        }
        kind
    }
}

#[derive(Debug, Clone)]
pub struct RawColumn {
    pub name: String,
    pub kind: ColumnKind,
    pub values: Vec<Value>,
}

impl RawColumn {
    /// Column whose kind is inferred from its values.
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        RawColumn {
            name: name.into(),
            kind: ColumnKind::infer(&values),
            values,
        }
    }
}

/// Columns in file order; every column has `n_rows` cells.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub columns: Vec<RawColumn>,
    pub n_rows: usize,
}

impl RawTable {
    pub fn column(&self, name: &str) -> Option<&RawColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Sample identifiers from the `name` column, or the row index when absent.
    fn sample_names(&self) -> Vec<String> {
        match self.column(NAME_COLUMN) {
            Some(col) => col.values.iter().map(|v| v.to_string()).collect(),
            None => (0..self.n_rows).map(|i| i.to_string()).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Labeling – how the target column splits samples into groups
// ---------------------------------------------------------------------------

/// Result of inspecting the target column.
#[derive(Debug, Clone, PartialEq)]
pub enum Labeling {
    /// Non-float target: `labels` are the sorted distinct values of `per_sample`.
    Categorical {
        labels: Vec<Value>,
        per_sample: Vec<Value>,
    },
    /// Float target. Plotted as if unlabeled.
    Continuous,
    /// No target column.
    Absent,
}

impl Labeling {
    /// Classify a target column by its storage type. A float column is
    /// continuous whatever its cells hold, even when every cell is null.
    pub fn from_target(target: Option<&RawColumn>) -> Self {
        let Some(column) = target else {
            return Labeling::Absent;
        };
        if column.kind == ColumnKind::Float {
            return Labeling::Continuous;
        }

        let labels: BTreeSet<Value> = column.values.iter().cloned().collect();
        Labeling::Categorical {
            labels: labels.into_iter().collect(),
            per_sample: column.values.clone(),
        }
    }

    /// Number of label groups a plot will draw (one when unlabeled).
    pub fn group_count(&self) -> usize {
        match self {
            Labeling::Categorical { labels, .. } => labels.len(),
            Labeling::Continuous | Labeling::Absent => 1,
        }
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self, Labeling::Categorical { .. })
    }
}

// ---------------------------------------------------------------------------
// FeatureSet – the complete loaded feature set
// ---------------------------------------------------------------------------

/// Computed features per sample, with an optional class target.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    /// Sample identifiers (rows).
    pub sample_names: Vec<String>,
    /// Feature names (columns), excluding `name` and `target`.
    pub feature_names: Vec<String>,
    /// Column-major feature values: `features[f][s]`.
    features: Vec<Vec<f64>>,
    /// Per-sample target, kept apart from the plotted coordinates.
    pub target: Option<RawColumn>,
}

impl FeatureSet {
    /// Interpret a raw table: `name` and `target` are split off, every other
    /// column must be numeric.
    pub fn from_table(table: RawTable) -> Result<Self> {
        let sample_names = table.sample_names();
        let target = table.column(TARGET_COLUMN).cloned();

        let mut feature_names = Vec::new();
        let mut features = Vec::new();
        for col in table.columns {
            if col.name == NAME_COLUMN || col.name == TARGET_COLUMN {
                continue;
            }
            let values = numeric_column(&col, &sample_names)?;
            feature_names.push(col.name);
            features.push(values);
        }

        Ok(FeatureSet {
            sample_names,
            feature_names,
            features,
            target,
        })
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.sample_names.len()
    }

    /// Whether the feature set holds no samples.
    pub fn is_empty(&self) -> bool {
        self.sample_names.is_empty()
    }

    pub fn labeling(&self) -> Labeling {
        Labeling::from_target(self.target.as_ref())
    }

    /// Select the named feature columns, in the requested order.
    pub fn table<S: AsRef<str>>(&self, selected: &[S]) -> Result<FeatureTable> {
        if selected.is_empty() {
            bail!(PlotError::NoFeatures);
        }

        let mut columns = Vec::with_capacity(selected.len());
        let mut names = Vec::with_capacity(selected.len());
        for name in selected {
            let name = name.as_ref();
            let Some(idx) = self.feature_names.iter().position(|f| f == name) else {
                bail!(PlotError::UnknownFeature {
                    feature: name.to_string(),
                    available: self.feature_names.clone(),
                });
            };
            columns.push(self.features[idx].clone());
            names.push(name.to_string());
        }

        Ok(FeatureTable {
            feature_names: names,
            columns,
            n_samples: self.len(),
        })
    }
}

fn numeric_column(col: &RawColumn, sample_names: &[String]) -> Result<Vec<f64>> {
    col.values
        .iter()
        .enumerate()
        .map(|(row, v)| {
            v.as_f64().ok_or_else(|| {
                anyhow::Error::from(PlotError::NonNumericFeature {
                    feature: col.name.clone(),
                    sample: sample_names.get(row).cloned().unwrap_or_default(),
                    value: v.to_string(),
                })
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// FeatureTable – the selected columns used as plot coordinates
// ---------------------------------------------------------------------------

/// Rows = samples, columns = selected features (target excluded).
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    pub feature_names: Vec<String>,
    columns: Vec<Vec<f64>>,
    n_samples: usize,
}

impl FeatureTable {
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    pub fn column(&self, feature: usize) -> &[f64] {
        &self.columns[feature]
    }

    /// Values of one feature for the given sample rows.
    pub fn take(&self, feature: usize, rows: &[usize]) -> Vec<f64> {
        let col = &self.columns[feature];
        rows.iter().map(|&r| col[r]).collect()
    }
}

// ---------------------------------------------------------------------------
// PredictionSet – true targets against predicted labels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PredictionSet {
    /// Class labels in column order (probability columns, or sorted predictions).
    pub class_labels: Vec<String>,
    pub truth: Vec<String>,
    pub predicted: Vec<String>,
}

impl PredictionSet {
    /// Build from a table with a `target` column and either a `prediction`
    /// column or one probability column per class label.
    pub fn from_table(table: RawTable) -> Result<Self> {
        let Some(target) = table.column(TARGET_COLUMN) else {
            bail!("prediction set has no '{TARGET_COLUMN}' column");
        };
        let truth: Vec<String> = target.values.iter().map(|v| v.to_string()).collect();

        if let Some(pred) = table.column(PREDICTION_COLUMN) {
            let predicted: Vec<String> = pred.values.iter().map(|v| v.to_string()).collect();
            let class_labels: BTreeSet<String> = predicted.iter().cloned().collect();
            return Ok(PredictionSet {
                class_labels: class_labels.into_iter().collect(),
                truth,
                predicted,
            });
        }

        let sample_names = table.sample_names();
        let mut class_labels = Vec::new();
        let mut probabilities = Vec::new();
        for col in &table.columns {
            if col.name == NAME_COLUMN || col.name == TARGET_COLUMN {
                continue;
            }
            probabilities.push(numeric_column(col, &sample_names)?);
            class_labels.push(col.name.clone());
        }
        if class_labels.is_empty() {
            bail!(PlotError::NoClassLabels);
        }

        let predicted = (0..table.n_rows)
            .map(|row| {
                let mut best = 0;
                for (k, probs) in probabilities.iter().enumerate() {
                    // first maximum wins, NaN never does
                    if probs[row] > probabilities[best][row] || probabilities[best][row].is_nan() {
                        best = k;
                    }
                }
                class_labels[best].clone()
            })
            .collect();

        Ok(PredictionSet {
            class_labels,
            truth,
            predicted,
        })
    }

    pub fn len(&self) -> usize {
        self.truth.len()
    }

    pub fn is_empty(&self) -> bool {
        self.truth.is_empty()
    }

    /// Class labels followed by any other label seen in truth or predictions.
    pub fn all_labels(&self) -> Vec<String> {
        let mut labels = self.class_labels.clone();
        let extra: BTreeSet<&String> = self
            .truth
            .iter()
            .chain(self.predicted.iter())
            .filter(|l| !self.class_labels.contains(l))
            .collect();
        labels.extend(extra.into_iter().cloned());
        labels
    }

    /// Label → position lookup for [`Self::all_labels`].
    pub fn label_index(&self) -> BTreeMap<String, usize> {
        self.all_labels()
            .into_iter()
            .enumerate()
            .map(|(i, l)| (l, i))
            .collect()
    }
}
