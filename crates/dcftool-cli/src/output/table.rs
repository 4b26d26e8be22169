use serde_json::Value;
use tabled::builder::Builder;
use tabled::Table;

/// Render the computation envelope as plain-text tables: per-year arrays
/// (projection rows, discounted cash flows) become one table each, scalar
/// and nested-object fields collapse into a field/value table.
pub fn print_table(value: &Value) {
    let envelope = value.as_object();
    let result = envelope
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Array(rows) => print_rows(rows),
        Value::Object(map) => {
            let mut scalars = Builder::default();
            scalars.push_record(["Field", "Value"]);
            let mut has_scalars = false;

            for (key, val) in map {
                match val {
                    Value::Array(rows) if rows.first().is_some_and(Value::is_object) => {
                        print_rows(rows);
                        println!();
                    }
                    Value::Object(nested) => {
                        for (k, v) in nested {
                            scalars.push_record([k.as_str(), &render(v)]);
                            has_scalars = true;
                        }
                    }
                    _ => {
                        scalars.push_record([key.as_str(), &render(val)]);
                        has_scalars = true;
                    }
                }
            }

            if has_scalars {
                println!("{}", Table::from(scalars));
            }
        }
        other => println!("{}", other),
    }

    if let Some(map) = envelope {
        if let Some(Value::Array(warnings)) = map.get("warnings") {
            if !warnings.is_empty() {
                println!("\nWarnings:");
                for w in warnings {
                    if let Value::String(s) = w {
                        println!("  - {}", s);
                    }
                }
            }
        }
        if let Some(Value::String(methodology)) = map.get("methodology") {
            println!("\nMethodology: {}", methodology);
        }
    }
}

fn print_rows(rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        println!("(empty)");
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(&headers);

    for row in rows {
        if let Value::Object(map) = row {
            builder.push_record(
                headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(render).unwrap_or_default()),
            );
        }
    }

    println!("{}", Table::from(builder));
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}
