use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::derived::{self, Walk};

/// Format output as tables using the tabled crate. Every derived table in
/// the result is rendered as 序号 / 项目 / 合计 / years; the remaining
/// scalar fields go into a Field/Value table.
pub fn print_table(value: &Value) {
    let result = value.get("result").unwrap_or(value);
    let walk = derived::walk(result);

    for table in &walk.tables {
        print_derived_table(table);
    }
    for (path, records) in &walk.records {
        println!("{path}");
        print_records(records);
    }
    print_fields(&walk);

    if let Value::Object(envelope) = value {
        if let Some(Value::Array(warnings)) = envelope.get("warnings") {
            if !warnings.is_empty() {
                println!("\nWarnings:");
                for w in warnings {
                    if let Value::String(s) = w {
                        println!("  - {}", s);
                    }
                }
            }
        }

        if let Some(Value::String(meth)) = envelope.get("methodology") {
            println!("\nMethodology: {}", meth);
        }
    }
}

fn print_derived_table(table: &derived::FoundTable<'_>) {
    let header = derived::header(table.rows);
    let years = header.len() - 3;
    let mut builder = Builder::default();
    builder.push_record(header);
    for row in table.rows {
        builder.push_record(derived::cells(row, years, derived::display_amount));
    }
    println!("{} ({})", table.title, table.path);
    println!("{}\n", Table::from(builder));
}

fn print_records(records: &[Value]) {
    let Some(Value::Object(first)) = records.first() else {
        println!("(empty)");
        return;
    };
    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(&headers);
    for item in records {
        let row: Vec<String> = headers
            .iter()
            .map(|h| item.get(h.as_str()).map(format_value).unwrap_or_default())
            .collect();
        builder.push_record(row);
    }
    println!("{}\n", Table::from(builder));
}

fn print_fields(walk: &Walk<'_>) {
    // Series repeat the rows of the derived tables; show them only when
    // there is no table to carry them.
    let series: &[(String, &Value)] = if walk.tables.is_empty() {
        &walk.series
    } else {
        &[]
    };
    if walk.fields.is_empty() && series.is_empty() {
        return;
    }

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in &walk.fields {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    for (key, val) in series {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
        scalar => derived::display_amount(scalar),
    }
}
