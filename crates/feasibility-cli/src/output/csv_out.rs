use serde_json::Value;
use std::io;

use super::derived;

/// Write output as CSV to stdout. Derived tables are written one after the
/// other at full precision, each preceded by its title; results without
/// tables fall back to two-column field/value records.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(stdout.lock());

    let result = value.get("result").unwrap_or(value);
    let walk = derived::walk(result);

    if walk.tables.is_empty() {
        if let Some((_, records)) = walk.records.first() {
            write_records(&mut wtr, records);
        } else {
            let _ = wtr.write_record(["field", "value"]);
            for (key, val) in walk.fields.iter().chain(&walk.series) {
                let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
            }
        }
    } else {
        for (idx, table) in walk.tables.iter().enumerate() {
            if idx > 0 {
                let _ = wtr.write_record([""]);
            }
            let _ = wtr.write_record([table.title]);
            let header = derived::header(table.rows);
            let years = header.len() - 3;
            let _ = wtr.write_record(&header);
            for row in table.rows {
                let _ = wtr.write_record(derived::cells(row, years, derived::raw_amount));
            }
        }
    }

    let _ = wtr.flush();
}

fn write_records(wtr: &mut csv::Writer<io::StdoutLock<'_>>, records: &[Value]) {
    let Some(Value::Object(first)) = records.first() else {
        return;
    };
    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);

    for item in records {
        let row: Vec<String> = headers
            .iter()
            .map(|h| item.get(*h).map(format_csv_value).unwrap_or_default())
            .collect();
        let _ = wtr.write_record(&row);
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => arr.iter().map(format_csv_value).collect::<Vec<_>>().join(" "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
