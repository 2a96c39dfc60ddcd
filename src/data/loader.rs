use std::collections::{HashMap, HashSet};
use std::io;
use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{DetectorSet, EventRecord, EventTable, Label, Significance, Table, Value};
use super::schema::Schema;
use crate::error::LoadError;

const SOURCE_A: &str = "source A";
const SOURCE_B: &str = "source B";
const MERGED: &str = "merged table";

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Read both sources and inner-join them on `schema.join_key`.
pub fn load_sources(
    path_a: &Path,
    path_b: &Path,
    schema: &Schema,
) -> std::result::Result<EventTable, LoadError> {
    let a = read_table(path_a).map_err(|e| {
        LoadError::source_read(format!("{SOURCE_A} ({})", path_a.display()), format!("{e:#}"))
    })?;
    let b = read_table(path_b).map_err(|e| {
        LoadError::source_read(format!("{SOURCE_B} ({})", path_b.display()), format!("{e:#}"))
    })?;

    let table = merge(&a, &b, schema)?;
    log::info!(
        "Joined {} events from {} x {} source rows on '{}' ({} columns)",
        table.len(),
        a.len(),
        b.len(),
        schema.join_key,
        table.columns.len()
    );
    Ok(table)
}

/// Load one tabular source.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row required
/// * `.json`    – `[{ "EventName": "S230518h", ... }, ...]`
/// * `.parquet` – any scalar columns
pub fn read_table(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => read_csv(path),
        "json" => read_json(path),
        "parquet" | "pq" => read_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// Join
// ---------------------------------------------------------------------------

/// Inner join of `a` and `b` on the schema's key column.
///
/// Output columns are the key, then A's other columns, then B's. A non-key
/// name present in both sources gets `suffix_a` / `suffix_b`. Rows follow
/// A's order; an A row matching several B rows yields one merged row per
/// match, in B's order. Null keys never match.
pub fn merge(a: &Table, b: &Table, schema: &Schema) -> std::result::Result<EventTable, LoadError> {
    let key = schema.join_key.as_str();
    let key_a = a
        .column_index(key)
        .ok_or_else(|| LoadError::schema(SOURCE_A, key))?;
    let key_b = b
        .column_index(key)
        .ok_or_else(|| LoadError::schema(SOURCE_B, key))?;

    let names_a: HashSet<&str> = non_key_columns(a, key_a).map(|(_, c)| c).collect();
    let names_b: HashSet<&str> = non_key_columns(b, key_b).map(|(_, c)| c).collect();

    let mut columns = vec![key.to_string()];
    columns.extend(
        non_key_columns(a, key_a).map(|(_, c)| suffixed(c, &names_b, &schema.suffix_a)),
    );
    columns.extend(
        non_key_columns(b, key_b).map(|(_, c)| suffixed(c, &names_a, &schema.suffix_b)),
    );

    let mut index: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, row) in b.rows.iter().enumerate() {
        if let Some(k) = row.get(key_b).and_then(Value::as_key) {
            index.entry(k).or_default().push(i);
        }
    }

    let mut joined: Vec<(String, Vec<Value>)> = Vec::new();
    let mut unmatched = 0usize;
    for row_a in &a.rows {
        let Some(k) = row_a.get(key_a).and_then(Value::as_key) else {
            unmatched += 1;
            continue;
        };
        let Some(matches) = index.get(&k) else {
            unmatched += 1;
            continue;
        };
        for &j in matches {
            let row_b = &b.rows[j];
            let mut values = Vec::with_capacity(columns.len());
            values.push(cell(row_a, key_a));
            values.extend(non_key_columns(a, key_a).map(|(i, _)| cell(row_a, i)));
            values.extend(non_key_columns(b, key_b).map(|(i, _)| cell(row_b, i)));
            joined.push((k.clone(), values));
        }
    }
    if unmatched > 0 {
        log::debug!("{unmatched} rows of {SOURCE_A} have no match in {SOURCE_B}");
    }

    type_records(columns, joined, schema)
}

fn non_key_columns(table: &Table, key_idx: usize) -> impl Iterator<Item = (usize, &str)> + '_ {
    table
        .columns
        .iter()
        .enumerate()
        .filter(move |(i, _)| *i != key_idx)
        .map(|(i, c)| (i, c.as_str()))
}

fn suffixed(name: &str, other_side: &HashSet<&str>, suffix: &str) -> String {
    if other_side.contains(name) {
        format!("{name}{suffix}")
    } else {
        name.to_string()
    }
}

fn cell(row: &[Value], idx: usize) -> Value {
    row.get(idx).cloned().unwrap_or(Value::Null)
}

/// Extract the typed fields the filter engine reads from each joined row.
fn type_records(
    columns: Vec<String>,
    joined: Vec<(String, Vec<Value>)>,
    schema: &Schema,
) -> std::result::Result<EventTable, LoadError> {
    let required = |name: &str| {
        columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| LoadError::schema(MERGED, name))
    };
    let primary = required(&schema.primary_label)?;
    let secondary = required(&schema.secondary_label)?;
    let significance = required(&schema.significance)?;
    let detectors = required(&schema.detectors)?;

    let records = joined
        .into_iter()
        .enumerate()
        .map(|(row_no, (event_id, values))| {
            let sig = Significance::from_value(&values[significance]).map_err(|e| {
                LoadError::source_read(MERGED, format!("merged row {row_no} ({event_id}): {e}"))
            })?;
            Ok(EventRecord {
                primary_label: Label::from_value(&values[primary]),
                secondary_label: Label::from_value(&values[secondary]),
                significance: sig,
                detectors: DetectorSet::from_value(&values[detectors]),
                event_id,
                values,
            })
        })
        .collect::<std::result::Result<Vec<_>, LoadError>>()?;

    Ok(EventTable {
        columns,
        records,
        key_column: schema.join_key.clone(),
    })
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

fn read_csv(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening CSV")?;
    read_csv_from(file)
}

/// CSV layout: header row with column names, one record per line.
/// Ragged rows are rejected.
pub fn read_csv_from<R: io::Read>(reader: R) -> Result<Table> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        bail!("CSV has no header row");
    }

    let mut table = Table::new(headers);
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        table
            .rows
            .push(record.iter().map(guess_value_type).collect());
    }
    Ok(table)
}

fn guess_value_type(s: &str) -> Value {
    let s = s.trim();
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
// JSON reader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "EventName": "S230518h", "FAR": 1.2e-9, "Detectors": "HL" },
///   ...
/// ]
/// ```
///
/// Columns are the union of keys across records; a missing key is Null.
fn read_json(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    let mut objects = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
        objects.push(obj);
    }

    let mut table = Table::new(columns);
    for obj in objects {
        let row = table
            .columns
            .iter()
            .map(|col| obj.get(col).map(json_to_value).unwrap_or(Value::Null))
            .collect();
        table.rows.push(row);
    }
    Ok(table)
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
// Parquet reader
// ---------------------------------------------------------------------------

/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn read_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut table = Table::new(columns);
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            let values = batch
                .columns()
                .iter()
                .map(|col| extract_value(col, row))
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("Row {row}"))?;
            table.rows.push(values);
        }
    }
    Ok(table)
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
        // Dictionary strings, small ints, ... go through Arrow's formatter.
        _ => {
            let text = array_value_to_string(col.as_ref(), row)
                .with_context(|| format!("formatting {:?} value", col.data_type()))?;
            guess_value_type(&text)
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use arrow::array::{BooleanArray, Float64Array, StringArray};
    use arrow::datatypes::{Field, Schema as ArrowSchema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use tempfile::TempDir;

    use super::*;

    const GRACEDB: &str = "\
EventName,HierarchicalClass,Significant,Detectors,FAR
S1,BBH,High,HL,1.5e-9
S2,NS,Low,HLV,2.0e-7
S3,Glitch,High,L,
S4,BBH,true,\"H1,V1\",3.1e-10
";

    const GWSKYNET: &str = "\
EventName,GDB_Class,FAR,SkyArea
S2,NS,2.1e-7,120.5
S1,BBH,1.4e-9,35.0
S4,Glitch,3.0e-10,800
S9,BBH,1.0e-3,10
";

    fn source(text: &str) -> Table {
        read_csv_from(text.as_bytes()).unwrap()
    }

    #[test]
    fn inner_join_keeps_only_shared_keys_in_a_order() {
        let table = merge(&source(GRACEDB), &source(GWSKYNET), &Schema::default()).unwrap();

        let ids: Vec<&str> = table.records.iter().map(|r| r.event_id.as_str()).collect();
        assert_eq!(ids, ["S1", "S2", "S4"]);
        for rec in &table.records {
            assert!(GRACEDB.contains(&rec.event_id));
            assert!(GWSKYNET.contains(&rec.event_id));
        }
    }

    #[test]
    fn colliding_columns_are_suffixed() {
        let table = merge(&source(GRACEDB), &source(GWSKYNET), &Schema::default()).unwrap();
        assert_eq!(
            table.columns,
            [
                "EventName",
                "HierarchicalClass",
                "Significant",
                "Detectors",
                "FAR_x",
                "GDB_Class",
                "FAR_y",
                "SkyArea"
            ]
        );
        let s2 = &table.records[1];
        assert_eq!(table.value(s2, "FAR_x"), Some(&Value::Float(2.0e-7)));
        assert_eq!(table.value(s2, "FAR_y"), Some(&Value::Float(2.1e-7)));
    }

    #[test]
    fn typed_fields_are_extracted() {
        let table = merge(&source(GRACEDB), &source(GWSKYNET), &Schema::default()).unwrap();
        let s4 = &table.records[2];
        assert_eq!(s4.primary_label, Label::Bbh);
        assert_eq!(s4.secondary_label, Label::Glitch);
        assert_eq!(s4.significance, Significance::High);
        assert_eq!(s4.detectors, "HV".parse::<DetectorSet>().unwrap());
        assert!(!s4.labels_agree());
        assert!(table.records[0].labels_agree());
    }

    #[test]
    fn duplicate_keys_produce_cross_product() {
        let a = source("EventName,HierarchicalClass,Significant,Detectors\nS1,BBH,High,HL\nS1,NS,Low,H\n");
        let b = source("EventName,GDB_Class\nS1,BBH\nS1,Glitch\nS1,NS\n");
        let table = merge(&a, &b, &Schema::default()).unwrap();

        assert_eq!(table.len(), 6);
        let pairs: Vec<(Label, Label)> = table
            .records
            .iter()
            .map(|r| (r.primary_label, r.secondary_label))
            .collect();
        assert_eq!(
            pairs,
            [
                (Label::Bbh, Label::Bbh),
                (Label::Bbh, Label::Glitch),
                (Label::Bbh, Label::Ns),
                (Label::Ns, Label::Bbh),
                (Label::Ns, Label::Glitch),
                (Label::Ns, Label::Ns),
            ]
        );
    }

    #[test]
    fn null_keys_never_match() {
        let a = source("EventName,HierarchicalClass,Significant,Detectors\n,BBH,High,HL\nS1,BBH,High,HL\n");
        let b = source("EventName,GDB_Class\n,BBH\nS1,BBH\n");
        let table = merge(&a, &b, &Schema::default()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.records[0].event_id, "S1");
    }

    #[test]
    fn missing_join_key_is_schema_error_for_either_source() {
        let good = source(GRACEDB);
        let bad = source("Event,GDB_Class\nS1,BBH\n");

        let err = merge(&good, &bad, &Schema::default()).unwrap_err();
        assert!(matches!(err, LoadError::Schema { ref origin, ref column }
            if origin == SOURCE_B && column == "EventName"));

        let err = merge(&bad, &good, &Schema::default()).unwrap_err();
        assert!(matches!(err, LoadError::Schema { ref origin, .. } if origin == SOURCE_A));
    }

    #[test]
    fn missing_typed_column_is_schema_error() {
        let a = source("EventName,HierarchicalClass,Significant\nS1,BBH,High\n");
        let b = source("EventName,GDB_Class\nS1,BBH\n");
        let err = merge(&a, &b, &Schema::default()).unwrap_err();
        assert!(matches!(err, LoadError::Schema { ref column, .. } if column == "Detectors"));
    }

    #[test]
    fn bad_significance_is_source_read_error() {
        let a = source("EventName,HierarchicalClass,Significant,Detectors\nS1,BBH,Maybe,HL\n");
        let b = source("EventName,GDB_Class\nS1,BBH\n");
        let err = merge(&a, &b, &Schema::default()).unwrap_err();
        assert!(matches!(err, LoadError::SourceRead { ref reason, .. }
            if reason.starts_with("merged row 0 (S1)")));
    }

    #[test]
    fn legacy_schema_joins_on_event_id() {
        let a = source("Event_ID,Object_Type,Significance,Detectors\n7,BBH,High,HL\n8,NS,Low,V\n");
        let b = source("Event_ID,Object_Type\n8,NS\n7,Glitch\n");
        let table = merge(&a, &b, &Schema::legacy()).unwrap();

        assert_eq!(table.columns, ["Event_ID", "Object_Type_x", "Significance", "Detectors", "Object_Type_y"]);
        assert_eq!(table.records[0].event_id, "7");
        assert_eq!(table.records[0].secondary_label, Label::Glitch);
        assert_eq!(table.records[1].primary_label, Label::Ns);
    }

    #[test]
    fn legacy_export_without_detectors_is_schema_error() {
        let a = source("Event_ID,Object_Type,Significance\n7,BBH,High\n");
        let b = source("Event_ID,Object_Type\n7,BBH\n");
        let err = merge(&a, &b, &Schema::legacy()).unwrap_err();
        assert!(matches!(err, LoadError::Schema { ref column, .. } if column == "Detectors"));
    }

    #[test]
    fn numeric_columns_exclude_key_and_text() {
        let table = merge(&source(GRACEDB), &source(GWSKYNET), &Schema::default()).unwrap();
        assert_eq!(table.numeric_columns(), ["FAR_x", "FAR_y", "SkyArea"]);
        assert_eq!(table.detector_codes().to_string(), "HLV");
    }

    #[test]
    fn ragged_csv_is_rejected() {
        let err = read_csv_from("EventName,GDB_Class\nS1,BBH,extra\n".as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("CSV row 0"));
    }

    #[test]
    fn load_sources_reads_csv_and_json() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("GraceDB.csv");
        let b = dir.path().join("GWSkyNet.json");
        fs::write(&a, GRACEDB).unwrap();
        fs::write(
            &b,
            r#"[{"EventName":"S2","GDB_Class":"NS","SkyArea":12.5},
                {"EventName":"S3","GDB_Class":"Glitch"}]"#,
        )
        .unwrap();

        let table = load_sources(&a, &b, &Schema::default()).unwrap();
        let ids: Vec<&str> = table.records.iter().map(|r| r.event_id.as_str()).collect();
        assert_eq!(ids, ["S2", "S3"]);
        assert_eq!(table.value(&table.records[1], "SkyArea"), Some(&Value::Null));
    }

    #[test]
    fn load_sources_reports_unreadable_source() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("GraceDB.csv");
        let b = dir.path().join("GWSkyNet.xlsx");
        fs::write(&a, GRACEDB).unwrap();
        fs::write(&b, "not a table").unwrap();

        let err = load_sources(&a, &b, &Schema::default()).unwrap_err();
        match err {
            LoadError::SourceRead { origin, reason } => {
                assert!(origin.starts_with(SOURCE_B));
                assert!(reason.contains(".xlsx"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let missing = dir.path().join("nope.csv");
        let err = load_sources(&missing, &a, &Schema::default()).unwrap_err();
        assert!(matches!(err, LoadError::SourceRead { .. }));
    }

    #[test]
    fn parquet_source_round_trips_scalar_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("GWSkyNet.parquet");

        let schema = Arc::new(ArrowSchema::new(vec![
            Field::new("EventName", DataType::Utf8, false),
            Field::new("GDB_Class", DataType::Utf8, true),
            Field::new("SkyArea", DataType::Float64, true),
            Field::new("Significant", DataType::Boolean, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["S1", "S2"])),
                Arc::new(StringArray::from(vec![Some("BBH"), None])),
                Arc::new(Float64Array::from(vec![Some(35.0), None])),
                Arc::new(BooleanArray::from(vec![true, false])),
            ],
        )
        .unwrap();
        let file = fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = read_table(&path).unwrap();
        assert_eq!(table.columns, ["EventName", "GDB_Class", "SkyArea", "Significant"]);
        assert_eq!(
            table.rows[1],
            [
                Value::String("S2".into()),
                Value::Null,
                Value::Null,
                Value::Bool(false)
            ]
        );
    }
}
