//! Frontmatter emission
//!
//! Line-oriented: arrays become `key:` plus `  - item` lines, multi-line
//! strings become block scalars, everything else is `key: value`. Scalars
//! are quoted by serde_yaml when their plain form would not parse back.

use serde_json::Value;

/// Renders ordered fields as a `---` fenced YAML block; empty input gives ""
pub fn frontmatter(fields: &[(String, Value)]) -> String {
    if fields.is_empty() {
        return String::new();
    }

    let mut out = String::from("---\n");
    for (key, value) in fields {
        emit_field(&mut out, key, value);
    }
    out.push_str("---");
    out
}

fn emit_field(out: &mut String, key: &str, value: &Value) {
    let key = quoted(key);
    match value {
        Value::Array(items) if items.is_empty() => {
            out.push_str(&format!("{}: []\n", key));
        }
        Value::Array(items) => {
            out.push_str(&format!("{}:\n", key));
            for item in items {
                match item {
                    Value::String(s) if s.contains('\n') => {
                        out.push_str("  - |\n");
                        block_lines(out, s, "    ");
                    }
                    other => out.push_str(&format!("  - {}\n", scalar(other))),
                }
            }
        }
        Value::String(s) if s.contains('\n') => {
            out.push_str(&format!("{}: |\n", key));
            block_lines(out, s, "  ");
        }
        other => {
            out.push_str(&format!("{}: {}\n", key, scalar(other)));
        }
    }
}

fn block_lines(out: &mut String, s: &str, indent: &str) {
    for line in s.lines() {
        if line.is_empty() {
            out.push('\n');
        } else {
            out.push_str(&format!("{}{}\n", indent, line));
        }
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => quoted(s),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        // JSON collections are valid YAML flow collections
        other => other.to_string(),
    }
}

/// Single-line string as a YAML scalar, quoted only when YAML needs it
fn quoted(s: &str) -> String {
    serde_yaml::to_string(s)
        .map(|out| out.trim_end_matches('\n').to_string())
        .unwrap_or_else(|_| format!("{:?}", s))
}
