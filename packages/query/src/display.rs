//! Result presentation: table shaping, sorting, and summaries.

use std::cmp::Ordering;

use feed_log_feed_run_models::SortOrder;
use serde::Serialize;
use serde_json::{Map, Value};

/// Column name used for rows that are not objects.
pub const SCALAR_COLUMN: &str = "value";

/// How a result set is best presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayKind {
    /// Individual records.
    Table,
    /// Grouped or computed values.
    Chart,
}

/// Presentation hints attached to a successful query result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultDisplay {
    /// Suggested presentation.
    pub kind: DisplayKind,
    /// Flattened column paths in first-seen order.
    pub columns: Vec<String>,
    /// One-line description of the result set.
    pub summary: String,
}

/// Query results flattened into dot-path columns.
///
/// The original rows are kept alongside the flattened ones so sorting can be
/// done on flattened paths while the caller still gets nested documents back.
#[derive(Debug, Clone, Default)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: Vec<(Map<String, Value>, Value)>,
}

impl ResultTable {
    /// Builds a table from result rows.
    #[must_use]
    pub fn from_rows(rows: Vec<Value>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        let rows = rows
            .into_iter()
            .map(|row| {
                let mut flat = Map::new();
                match &row {
                    Value::Object(map) => flatten_into(&mut flat, None, map),
                    other => {
                        flat.insert(SCALAR_COLUMN.to_string(), other.clone());
                    }
                }
                for key in flat.keys() {
                    if !columns.iter().any(|c| c == key) {
                        columns.push(key.clone());
                    }
                }
                (flat, row)
            })
            .collect();

        Self { columns, rows }
    }

    /// Column paths in first-seen order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Flattened cell value at `row`, `column`.
    #[must_use]
    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        self.rows.get(row).and_then(|(flat, _)| flat.get(column))
    }

    /// Stable sort by one column.
    ///
    /// Numbers compare numerically and strings lexicographically. Rows with
    /// the column missing or null always sort last, whatever the order.
    pub fn sort_by(&mut self, column: &str, order: SortOrder) {
        self.rows.sort_by(|(a, _), (b, _)| {
            compare_cells(present(a.get(column)), present(b.get(column)), order)
        });
    }

    /// Consumes the table, returning the original rows in current order.
    #[must_use]
    pub fn into_rows(self) -> Vec<Value> {
        self.rows.into_iter().map(|(_, row)| row).collect()
    }
}

fn flatten_into(out: &mut Map<String, Value>, prefix: Option<&str>, map: &Map<String, Value>) {
    for (key, value) in map {
        let path = prefix.map_or_else(|| key.clone(), |p| format!("{p}.{key}"));
        match value {
            Value::Object(inner) if !inner.is_empty() => flatten_into(out, Some(&path), inner),
            _ => {
                out.insert(path, value.clone());
            }
        }
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn compare_cells(a: Option<&Value>, b: Option<&Value>, order: SortOrder) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ordering = compare_values(a, b);
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        }
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => {
            let a = a.as_f64().unwrap_or(f64::NAN);
            let b = b.as_f64().unwrap_or(f64::NAN);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

const fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Bool(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Summary line for a find result.
#[must_use]
pub fn find_summary(count: usize) -> String {
    format!("Found {count} records")
}

/// Summary line for an aggregate result.
#[must_use]
pub fn aggregate_summary(rows: &[Value]) -> String {
    match rows {
        [] => "No data found".to_string(),
        [Value::Object(only)] if only.len() == 2 && only.contains_key("_id") => {
            "Found 1 group(s)".to_string()
        }
        rows => format!("Processed {} record(s)", rows.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(table: &ResultTable, column: &str) -> Vec<Value> {
        (0..table.len())
            .map(|i| table.cell(i, column).cloned().unwrap_or(Value::Null))
            .collect()
    }

    #[test]
    fn flattens_nested_objects_to_dot_paths() {
        let table = ResultTable::from_rows(vec![
            json!({ "_id": "a", "progress": { "TOTAL_JOBS_IN_FEED": 10, "SWITCH_INDEX": true } }),
            json!({ "_id": "b", "status": "failed" }),
        ]);
        assert_eq!(
            table.columns(),
            [
                "_id",
                "progress.TOTAL_JOBS_IN_FEED",
                "progress.SWITCH_INDEX",
                "status"
            ]
        );
        assert_eq!(table.cell(0, "progress.TOTAL_JOBS_IN_FEED"), Some(&json!(10)));
        assert_eq!(table.cell(1, "progress.TOTAL_JOBS_IN_FEED"), None);
    }

    #[test]
    fn scalar_rows_use_value_column() {
        let table = ResultTable::from_rows(vec![json!(3), json!("x")]);
        assert_eq!(table.columns(), [SCALAR_COLUMN]);
    }

    #[test]
    fn sorts_numbers_numerically_with_missing_last() {
        let mut table = ResultTable::from_rows(vec![
            json!({ "n": 9 }),
            json!({ "other": 1 }),
            json!({ "n": 10 }),
            json!({ "n": null }),
            json!({ "n": 2.5 }),
        ]);

        table.sort_by("n", SortOrder::Asc);
        assert_eq!(
            names(&table, "n"),
            [json!(2.5), json!(9), json!(10), Value::Null, Value::Null]
        );

        table.sort_by("n", SortOrder::Desc);
        assert_eq!(
            names(&table, "n"),
            [json!(10), json!(9), json!(2.5), Value::Null, Value::Null]
        );
    }

    #[test]
    fn sorts_strings_and_keeps_original_rows() {
        let mut table = ResultTable::from_rows(vec![
            json!({ "_id": { "client": "Deal2" } }),
            json!({ "_id": { "client": "Deal1" } }),
        ]);
        table.sort_by("_id.client", SortOrder::Asc);
        assert_eq!(
            table.into_rows(),
            vec![
                json!({ "_id": { "client": "Deal1" } }),
                json!({ "_id": { "client": "Deal2" } }),
            ]
        );
    }

    #[test]
    fn aggregate_summaries() {
        assert_eq!(aggregate_summary(&[]), "No data found");
        assert_eq!(
            aggregate_summary(&[json!({ "_id": null, "avg": 4.2 })]),
            "Found 1 group(s)"
        );
        assert_eq!(
            aggregate_summary(&[json!({ "_id": "Deal1", "avg": 4.2, "count": 3 })]),
            "Processed 1 record(s)"
        );
        assert_eq!(
            aggregate_summary(&[json!({ "_id": "a", "n": 1 }), json!({ "_id": "b", "n": 2 })]),
            "Processed 2 record(s)"
        );
        assert_eq!(find_summary(7), "Found 7 records");
    }

    #[test]
    fn display_kind_serializes_lowercase() {
        let display = ResultDisplay {
            kind: DisplayKind::Chart,
            columns: vec!["_id".to_string()],
            summary: "No data found".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&display).unwrap(),
            json!({ "kind": "chart", "columns": ["_id"], "summary": "No data found" })
        );
    }
}
