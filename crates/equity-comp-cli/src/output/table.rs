use serde_json::Value;
use tabled::{builder::Builder, Table};

/// Format output as text tables.
///
/// Envelopes print the scalar result fields first, then each array-of-object
/// field (cap table rows, monthly expenses, schedule events) as its own
/// table, then warnings and methodology.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_section(result);
                print_envelope_footer(map);
            } else {
                print_section(value);
            }
        }
        Value::Array(arr) => print_rows(arr),
        _ => println!("{}", value),
    }
}

fn print_section(value: &Value) {
    let Value::Object(map) = value else {
        println!("{}", value);
        return;
    };

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut nested: Vec<(&String, &Vec<Value>)> = Vec::new();
    let mut scalars = 0;
    for (key, val) in map {
        match val {
            Value::Array(arr) if arr.first().is_some_and(Value::is_object) => {
                nested.push((key, arr));
            }
            _ => {
                builder.push_record([key.as_str(), &format_value(val)]);
                scalars += 1;
            }
        }
    }
    if scalars > 0 {
        println!("{}", Table::from(builder));
    }

    for (key, rows) in nested {
        println!("\n{}:", key);
        print_rows(rows);
    }
}

fn print_envelope_footer(envelope: &serde_json::Map<String, Value>) {
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

    if let Some(Value::String(methodology)) = envelope.get("methodology") {
        println!("\nMethodology: {}", methodology);
    }
}

fn print_rows(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    // headers come from the first object
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
