use serde_json::Value;

use super::{format_scalar, lookup, result_object};

/// Headline figure of each command, most specific first. Dotted keys reach
/// into nested objects.
const PRIORITY_KEYS: [&str; 9] = [
    "summary.total_value",
    "summary.median",
    "winner",
    "monthly_payment",
    "monthly_income",
    "total_return",
    "final_value",
    "total_interest",
    "total_value",
];

/// Print just the headline value, falling back to the first field.
pub fn print_minimal(value: &Value) {
    println!("{}", headline(value));
}

fn headline(value: &Value) -> String {
    let Some(result) = result_object(value) else {
        return format_scalar(value);
    };

    for key in PRIORITY_KEYS {
        if let Some(val) = lookup(result, key).filter(|v| !v.is_null()) {
            return format_scalar(val);
        }
    }

    match result.iter().next() {
        Some((key, val)) => format!("{key}: {}", format_scalar(val)),
        None => String::new(),
    }
}
