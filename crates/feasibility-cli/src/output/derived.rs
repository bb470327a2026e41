use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;

/// A `DerivedTable` found somewhere inside a result, with its JSON path.
pub struct FoundTable<'a> {
    pub path: String,
    pub title: &'a str,
    pub rows: &'a [Value],
}

/// Leaves of a result that are not part of any derived table.
#[derive(Default)]
pub struct Walk<'a> {
    pub tables: Vec<FoundTable<'a>>,
    pub fields: Vec<(String, &'a Value)>,
    pub series: Vec<(String, &'a Value)>,
    pub records: Vec<(String, &'a [Value])>,
}

fn is_derived_table(map: &Map<String, Value>) -> bool {
    map.contains_key("title") && map.contains_key("span") && map.get("rows").is_some_and(Value::is_array)
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

/// Split a result into derived tables, scalar fields, numeric series and
/// arrays of flat records.
pub fn walk(value: &Value) -> Walk<'_> {
    let mut out = Walk::default();
    visit(value, String::new(), &mut out);
    out
}

fn visit<'a>(value: &'a Value, path: String, out: &mut Walk<'a>) {
    match value {
        Value::Object(map) if is_derived_table(map) => {
            let title = map.get("title").and_then(Value::as_str).unwrap_or_default();
            let rows = map
                .get("rows")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            out.tables.push(FoundTable { path, title, rows });
        }
        Value::Object(map) => {
            for (key, child) in map {
                visit(child, join(&path, key), out);
            }
        }
        Value::Array(items) if items.iter().all(is_scalar) => out.series.push((path, value)),
        Value::Array(items)
            if items
                .iter()
                .all(|i| i.as_object().is_some_and(|m| m.values().all(is_scalar))) =>
        {
            out.records.push((path, items.as_slice()))
        }
        Value::Array(items) => {
            for (idx, child) in items.iter().enumerate() {
                visit(child, format!("{path}[{idx}]"), out);
            }
        }
        _ => out.fields.push((path, value)),
    }
}

/// Header of a derived table: 序号 / 项目 / 合计 / one column per year.
pub fn header(rows: &[Value]) -> Vec<String> {
    let years = rows
        .iter()
        .filter_map(|r| r.get("per_year").and_then(Value::as_array))
        .map(Vec::len)
        .max()
        .unwrap_or(0);
    let mut header = vec!["序号".to_string(), "项目".to_string(), "合计".to_string()];
    header.extend((1..=years).map(|y| y.to_string()));
    header
}

/// One table row as cells; `format` renders every amount.
pub fn cells(row: &Value, years: usize, format: impl Fn(&Value) -> String) -> Vec<String> {
    let text = |key: &str| row.get(key).and_then(Value::as_str).unwrap_or_default().to_string();
    let mut cells = vec![
        text("sequence_code"),
        text("label"),
        row.get("total").map(&format).unwrap_or_default(),
    ];
    let per_year = row.get("per_year").and_then(Value::as_array);
    cells.extend((0..years).map(|i| {
        per_year
            .and_then(|v| v.get(i))
            .map(&format)
            .unwrap_or_default()
    }));
    cells
}

/// Amount rounded to two decimals for display.
pub fn display_amount(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => Decimal::from_str(s)
            .map(|d| d.round_dp(2).to_string())
            .unwrap_or_else(|_| s.clone()),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Amount at full precision for export.
pub fn raw_amount(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "result": {
                "table": {
                    "title": "营业收入估算表",
                    "span": "Operation",
                    "rows": [
                        {"sequence_code": "1", "label": "营业收入", "total": "200", "per_year": ["100", "100"], "row_kind": "Subtotal"},
                        {"sequence_code": "2", "label": "销项税额", "total": "23.0088495575", "per_year": ["11.50442477", "11.50442477"], "row_kind": "Item"}
                    ]
                },
                "net_revenue": ["88.49", "88.49"],
                "npv": "12.5"
            },
            "warnings": []
        })
    }

    #[test]
    fn test_walk_separates_tables() {
        let value = sample();
        let walk = walk(&value);
        assert_eq!(walk.tables.len(), 1);
        assert_eq!(walk.tables[0].path, "result.table");
        assert_eq!(walk.tables[0].title, "营业收入估算表");
        assert!(walk.series.iter().any(|(p, _)| p == "result.net_revenue"));
        assert!(walk.fields.iter().any(|(p, _)| p == "result.npv"));
    }

    #[test]
    fn test_row_cells() {
        let value = sample();
        let walk = walk(&value);
        let rows = walk.tables[0].rows;
        assert_eq!(header(rows), vec!["序号", "项目", "合计", "1", "2"]);
        assert_eq!(
            cells(&rows[1], 2, display_amount),
            vec!["2", "销项税额", "23.01", "11.50", "11.50"]
        );
    }
}
