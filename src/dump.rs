//! TDD-like text representation of evaluated values.
//!
//! The output reads back to an equal value as long as it contains no
//! fragments, which are printed as `<fragment "...">`.

use bigdecimal::BigDecimal;

use crate::constants::DUMP_INDENT;
use crate::strings::j_quote;
use crate::value::{Hash, Value};

/// Converts a value to TDD-like text. Hashes and sequences are printed one
/// item per line, indented; function call parameters stay on one line.
pub fn dump(value: &Value) -> String {
    let mut out = String::new();
    dump_value(&mut out, value, "");
    out
}

fn dump_value(out: &mut String, value: &Value, indent: &str) {
    match value {
        Value::Hash(map) => {
            let inner = format!("{indent}{DUMP_INDENT}");
            out.push_str("{\n");
            for (key, value) in map {
                out.push_str(&inner);
                out.push_str(&j_quote(key));
                out.push_str(": ");
                dump_value(out, value, &inner);
                out.push('\n');
            }
            out.push_str(indent);
            out.push('}');
        }
        Value::Sequence(items) => {
            let inner = format!("{indent}{DUMP_INDENT}");
            out.push_str("[\n");
            for item in items {
                out.push_str(&inner);
                dump_value(out, item, &inner);
                out.push('\n');
            }
            out.push_str(indent);
            out.push(']');
        }
        other => dump_value_single_line(out, other),
    }
}

fn dump_value_single_line(out: &mut String, value: &Value) {
    match value {
        Value::String(s) => out.push_str(&j_quote(s)),
        Value::Integer(n) => out.push_str(&n.to_string()),
        Value::Decimal(n) => out.push_str(&decimal_literal(n)),
        Value::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Hash(map) => {
            out.push('{');
            dump_hash_single_line(out, map);
            out.push('}');
        }
        Value::Sequence(items) => {
            out.push('[');
            dump_list_single_line(out, items);
            out.push(']');
        }
        Value::FunctionCall(call) => {
            out.push_str(call.name());
            out.push('(');
            dump_list_single_line(out, call.params());
            out.push(')');
        }
        Value::Fragment(fragment) => {
            out.push_str("<fragment ");
            out.push_str(&j_quote(fragment.as_str()));
            out.push('>');
        }
    }
}

/// A numeral that reads back as a decimal, never as an integer: it has a
/// fraction, or else an exponent (`15e2`, `7e0`, `12e-40`).
fn decimal_literal(n: &BigDecimal) -> String {
    let (digits, scale) = n.as_bigint_and_exponent();
    let digits = digits.to_string();
    let (sign, abs) = match digits.strip_prefix('-') {
        Some(abs) => ("-", abs),
        None => ("", digits.as_str()),
    };
    let len = abs.len() as i64;
    if scale <= 0 || scale > len + 6 {
        return format!("{digits}e{}", -scale);
    }
    if len > scale {
        let (int, frac) = abs.split_at((len - scale) as usize);
        format!("{sign}{int}.{frac}")
    } else {
        format!("{sign}0.{}{abs}", "0".repeat((scale - len) as usize))
    }
}

fn dump_hash_single_line(out: &mut String, map: &Hash) {
    for (i, (key, value)) in map.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&j_quote(key));
        out.push(':');
        dump_value_single_line(out, value);
    }
}

fn dump_list_single_line(out: &mut String, items: &[Value]) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        dump_value_single_line(out, item);
    }
}
