use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{ColumnKind, FeatureSet, PredictionSet, RawColumn, RawTable, Value};
use crate::config::Engine;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a feature set with the given storage engine.
pub fn load_feature_set(path: &Path, engine: Engine) -> Result<FeatureSet> {
    let table = load_table(path, engine)?;
    let fset = FeatureSet::from_table(table)
        .with_context(|| format!("interpreting feature set {}", path.display()))?;
    log::info!(
        "Loaded feature set {} with {} samples and features {:?}",
        path.display(),
        fset.len(),
        fset.feature_names
    );
    Ok(fset)
}

/// Load a prediction set with the given storage engine.
pub fn load_prediction_set(path: &Path, engine: Engine) -> Result<PredictionSet> {
    let table = load_table(path, engine)?;
    let pset = PredictionSet::from_table(table)
        .with_context(|| format!("interpreting prediction set {}", path.display()))?;
    log::info!(
        "Loaded prediction set {} with {} samples and classes {:?}",
        path.display(),
        pset.len(),
        pset.class_labels
    );
    Ok(pset)
}

/// Read a file into a column table.  `Engine::Auto` dispatches by extension.
///
/// Supported formats:
/// * `.parquet` – one row per sample, scalar columns
/// * `.json`    – `[{ "name": ..., "target": ..., "feature": 1.0, ... }, ...]`
/// * `.csv`     – header row with the same column names
pub fn load_table(path: &Path, engine: Engine) -> Result<RawTable> {
    match engine {
        Engine::Auto => load_table(path, engine_for_extension(path)?),
        Engine::Parquet => load_parquet(path).with_context(|| format!("loading {}", path.display())),
        Engine::Json => load_json(path).with_context(|| format!("loading {}", path.display())),
        Engine::Csv => load_csv(path).with_context(|| format!("loading {}", path.display())),
    }
}

fn engine_for_extension(path: &Path) -> Result<Engine> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => Ok(Engine::Parquet),
        "json" => Ok(Engine::Json),
        "csv" => Ok(Engine::Csv),
        other => bail!("Unsupported file extension .{other} for {}", path.display()),
    }
}

// ---------------------------------------------------------------------------
// Column accumulation shared by the row-oriented readers
// ---------------------------------------------------------------------------

/// Collects cells row by row, keeping columns in first-seen order and
/// padding cells missing from a row with `Null`.
#[derive(Default)]
struct TableBuilder {
    index: BTreeMap<String, usize>,
    columns: Vec<RawColumn>,
    n_rows: usize,
}

impl TableBuilder {
    fn push_row<I>(&mut self, cells: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        for (name, value) in cells {
            let idx = match self.index.get(&name) {
                Some(&idx) => idx,
                None => {
                    let idx = self.columns.len();
                    self.columns
                        .push(RawColumn::new(name.clone(), vec![Value::Null; self.n_rows]));
                    self.index.insert(name, idx);
                    idx
                }
            };
            self.columns[idx].values.push(value);
        }
        self.n_rows += 1;
        for col in &mut self.columns {
            col.values.resize(self.n_rows, Value::Null);
        }
    }

    /// Column kinds are inferred once every row is in.
    fn finish(self) -> RawTable {
        let columns = self
            .columns
            .into_iter()
            .map(|col| RawColumn::new(col.name, col.values))
            .collect();
        RawTable {
            columns,
            n_rows: self.n_rows,
        }
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "name": "ts_0", "target": "class_a", "amplitude": 1.5, "std": 0.2 },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut builder = TableBuilder::default();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        builder.push_row(obj.iter().map(|(k, v)| (k.clone(), json_to_value(v))));
    }

    Ok(builder.finish())
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => Value::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        other => Value::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one sample per record.
fn load_csv(path: &Path) -> Result<RawTable> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut builder = TableBuilder::default();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if record.len() != headers.len() {
            bail!(
                "CSV row {row_no}: expected {} fields but found {}",
                headers.len(),
                record.len()
            );
        }
        builder.push_row(
            headers
                .iter()
                .zip(record.iter())
                .map(|(h, cell)| (h.clone(), guess_value_type(cell))),
        );
    }

    let mut table = builder.finish();
    // header-only files still declare their columns
    if table.columns.is_empty() {
        table.columns = headers
            .into_iter()
            .map(|name| RawColumn::new(name, Vec::new()))
            .collect();
    }
    Ok(table)
}

fn guess_value_type(s: &str) -> Value {
    if s.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::Float(f);
    }
    if s == "true" || s == "false" {
        return Value::Bool(s == "true");
    }
    Value::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one scalar column per feature.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`). Each column keeps the kind of its
/// Arrow type, so a `Float64` target is continuous even when every cell is
/// null, and an integer or `Utf8` one is categorical.
fn load_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;

    let mut columns: Vec<RawColumn> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| RawColumn {
            name: f.name().clone(),
            kind: column_kind(f.data_type()),
            values: Vec::new(),
        })
        .collect();

    let reader = builder.build().context("building parquet reader")?;

    let mut n_rows = 0;
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (col_idx, column) in columns.iter_mut().enumerate() {
            let array = normalize_column(batch.column(col_idx))
                .with_context(|| format!("column '{}'", column.name))?;
            for row in 0..batch.num_rows() {
                let value = extract_value(&array, row)
                    .with_context(|| format!("Row {}: column '{}'", n_rows + row, column.name))?;
                column.values.push(value);
            }
        }
        n_rows += batch.num_rows();
    }

    Ok(RawTable { columns, n_rows })
}

// -- Arrow helpers --

fn column_kind(data_type: &DataType) -> ColumnKind {
    match data_type {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => ColumnKind::Integer,
        DataType::Float16 | DataType::Float32 | DataType::Float64 => ColumnKind::Float,
        DataType::Boolean => ColumnKind::Bool,
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Dictionary(_, _) => ColumnKind::Text,
        _ => ColumnKind::Unknown,
    }
}

/// Widen a column to one of the types [`extract_value`] reads: pandas
/// categoricals (dictionary-encoded) become strings, narrow and unsigned
/// integers become `Int64`, half floats become `Float64`.
fn normalize_column(col: &ArrayRef) -> Result<ArrayRef> {
    let target = match col.data_type() {
        DataType::Dictionary(_, _) => DataType::Utf8,
        DataType::Int8
        | DataType::Int16
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => DataType::Int64,
        DataType::Float16 => DataType::Float64,
        _ => return Ok(Arc::clone(col)),
    };
    arrow::compute::cast(col, &target)
        .with_context(|| format!("casting {} column to {target}", col.data_type()))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_value(col: &ArrayRef, row: usize) -> Result<Value> {
    if col.is_null(row) {
        return Ok(Value::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => Value::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Value::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => Value::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => Value::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => Value::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => Value::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => Value::Bool(col.as_boolean().value(row)),
        other => bail!("unsupported column type {other:?}"),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use arrow::array::{Float64Array, Int16Array, Int64Array, UInt32Array};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use crate::data::model::Labeling;

    fn write_parquet(
        dir: &tempfile::TempDir,
        name: &str,
        columns: Vec<(&str, ArrayRef)>,
    ) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let fields: Vec<Field> = columns
            .iter()
            .map(|(n, a)| Field::new(*n, a.data_type().clone(), true))
            .collect();
        let schema = Arc::new(Schema::new(fields));
        let batch = RecordBatch::try_new(
            Arc::clone(&schema),
            columns.into_iter().map(|(_, a)| a).collect(),
        )
        .unwrap();

        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
        path
    }

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn json_records_fill_missing_cells_with_null() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "fset.json",
            r#"[{"name": "a", "x": 1.5, "target": 0}, {"name": "b", "y": 2, "target": 1}]"#,
        );

        let table = load_table(&path, Engine::Auto).unwrap();
        assert_eq!(table.n_rows, 2);
        let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["name", "target", "x", "y"]);
        assert_eq!(table.column("x").unwrap().values, vec![Value::Float(1.5), Value::Null]);
        assert_eq!(table.column("y").unwrap().values, vec![Value::Null, Value::Integer(2)]);
    }

    #[test]
    fn csv_cells_are_typed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "fset.csv", "name,amp,target\ns0,1.25,cls\ns1,,cls\n");

        let table = load_table(&path, Engine::Auto).unwrap();
        assert_eq!(
            table.column("amp").unwrap().values,
            vec![Value::Float(1.25), Value::Null]
        );
        assert_eq!(
            table.column("target").unwrap().values,
            vec![Value::String("cls".into()), Value::String("cls".into())]
        );
    }

    #[test]
    fn csv_header_only_keeps_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "empty.csv", "name,amp,target\n");

        let table = load_table(&path, Engine::Csv).unwrap();
        assert_eq!(table.n_rows, 0);
        assert_eq!(table.columns.len(), 3);
    }

    #[test]
    fn explicit_engine_ignores_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "fset.dat", r#"[{"a": 1}]"#);

        assert!(load_table(&path, Engine::Auto).is_err());
        let table = load_table(&path, Engine::Json).unwrap();
        assert_eq!(table.n_rows, 1);
    }

    #[test]
    fn missing_file_error_names_path() {
        let err = load_table(Path::new("/nonexistent/fset.parquet"), Engine::Auto).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/fset.parquet"));
    }

    #[test]
    fn unreadable_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "broken.json", "{ not json");
        assert!(load_feature_set(&path, Engine::Auto).is_err());
    }

    #[test]
    fn prediction_set_loads_from_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "pred.csv", "name,target,a,b\n0,a,0.7,0.3\n1,b,0.2,0.8\n");

        let pset = load_prediction_set(&path, Engine::Auto).unwrap();
        assert_eq!(pset.truth, vec!["a", "b"]);
        assert_eq!(pset.predicted, vec!["a", "b"]);
    }

    #[test]
    fn narrow_and_unsigned_integer_columns_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_parquet(
            &dir,
            "fset.parquet",
            vec![
                ("small", Arc::new(Int16Array::from(vec![-3, 7])) as ArrayRef),
                ("count", Arc::new(UInt32Array::from(vec![Some(4_000_000_000), None]))),
                ("target", Arc::new(Int64Array::from(vec![1, 2]))),
            ],
        );

        let table = load_table(&path, Engine::Auto).unwrap();
        assert_eq!(table.column("small").unwrap().kind, ColumnKind::Integer);
        assert_eq!(
            table.column("small").unwrap().values,
            vec![Value::Integer(-3), Value::Integer(7)]
        );
        assert_eq!(
            table.column("count").unwrap().values,
            vec![Value::Integer(4_000_000_000), Value::Null]
        );

        let fset = load_feature_set(&path, Engine::Auto).unwrap();
        assert_eq!(fset.feature_names, vec!["small", "count"]);
        assert!(fset.labeling().is_categorical());
        assert_eq!(fset.labeling().group_count(), 2);
    }

    #[test]
    fn all_null_float_target_is_continuous() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_parquet(
            &dir,
            "fset.parquet",
            vec![
                ("a", Arc::new(Float64Array::from(vec![1.0, 2.0])) as ArrayRef),
                ("target", Arc::new(Float64Array::from(vec![None::<f64>, None]))),
            ],
        );

        let fset = load_feature_set(&path, Engine::Parquet).unwrap();
        assert_eq!(fset.target.as_ref().unwrap().kind, ColumnKind::Float);
        assert_eq!(fset.labeling(), Labeling::Continuous);
    }

    #[test]
    fn json_and_csv_columns_get_inferred_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "fset.json", r#"[{"t": 1, "u": null}, {"t": 2.5, "u": null}]"#);
        let table = load_table(&path, Engine::Auto).unwrap();
        assert_eq!(table.column("t").unwrap().kind, ColumnKind::Float);
        assert_eq!(table.column("u").unwrap().kind, ColumnKind::Unknown);

        let path = write(&dir, "fset.csv", "t,u\n1,x\n2,y\n");
        let table = load_table(&path, Engine::Auto).unwrap();
        assert_eq!(table.column("t").unwrap().kind, ColumnKind::Integer);
        assert_eq!(table.column("u").unwrap().kind, ColumnKind::Text);
    }
}
