//! SOQL generation for condition-object finds.
//!
//! Conditions are JSON objects mapping field names to either a literal
//! (equality, or `IN` for arrays) or an operator object:
//!
//! ```text
//! { "Name": "Acme", "AnnualRevenue": { "$gte": 1000000 }, "Type": ["Customer", "Partner"] }
//! ```
//!
//! `$and` / `$or` take an array of nested condition objects.

use forcelink_types::{ConnectionError, FindQuery, Result};
use serde_json::{Map, Value};

/// Build a `SELECT` statement for a find.
pub fn build_find_soql(query: &FindQuery) -> Result<String> {
    check_identifier(&query.entity)?;

    let fields = match query.fields.as_deref() {
        Some(fields) if !fields.is_empty() => {
            for field in fields {
                check_identifier(field)?;
            }
            fields.join(", ")
        }
        _ => "Id".to_string(),
    };

    let mut soql = format!("SELECT {} FROM {}", fields, query.entity);

    if let Some(conditions) = &query.conditions {
        let clause = match conditions {
            Value::Object(map) => and_clause(map)?,
            Value::Null => String::new(),
            other => {
                return Err(invalid(format!(
                    "conditions must be an object, got {}",
                    other
                )));
            }
        };
        if !clause.is_empty() {
            soql.push_str(" WHERE ");
            soql.push_str(&clause);
        }
    }

    if let Some(sort) = query.options.sort.as_deref() {
        let order = order_by(sort)?;
        if !order.is_empty() {
            soql.push_str(" ORDER BY ");
            soql.push_str(&order);
        }
    }
    if let Some(limit) = query.options.limit {
        soql.push_str(&format!(" LIMIT {}", limit));
    }
    if let Some(offset) = query.options.offset {
        soql.push_str(&format!(" OFFSET {}", offset));
    }

    Ok(soql)
}

fn and_clause(map: &Map<String, Value>) -> Result<String> {
    let mut parts = Vec::with_capacity(map.len());
    for (key, value) in map {
        let part = match key.as_str() {
            "$and" => group(value, " AND ")?,
            "$or" => group(value, " OR ")?,
            field => field_clause(field, value)?,
        };
        parts.push(part);
    }
    Ok(parts.join(" AND "))
}

fn group(value: &Value, joiner: &str) -> Result<String> {
    let items = value
        .as_array()
        .ok_or_else(|| invalid("$and/$or expect an array of conditions"))?;
    if items.is_empty() {
        return Err(invalid("$and/$or must not be empty"));
    }
    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        let map = item
            .as_object()
            .ok_or_else(|| invalid("$and/$or entries must be objects"))?;
        let clause = and_clause(map)?;
        if map.len() > 1 {
            parts.push(format!("({})", clause));
        } else {
            parts.push(clause);
        }
    }
    Ok(format!("({})", parts.join(joiner)))
}

fn field_clause(field: &str, value: &Value) -> Result<String> {
    check_identifier(field)?;
    match value {
        Value::Object(ops) if ops.keys().all(|k| k.starts_with('$')) && !ops.is_empty() => {
            let mut parts = Vec::with_capacity(ops.len());
            for (op, operand) in ops {
                parts.push(operator_clause(field, op, operand)?);
            }
            Ok(parts.join(" AND "))
        }
        Value::Array(items) => Ok(format!("{} IN {}", field, list(items)?)),
        other => Ok(format!("{} = {}", field, literal(other)?)),
    }
}

fn operator_clause(field: &str, op: &str, operand: &Value) -> Result<String> {
    let symbol = match op {
        "$eq" => "=",
        "$ne" => "!=",
        "$gt" => ">",
        "$gte" => ">=",
        "$lt" => "<",
        "$lte" => "<=",
        "$like" => "LIKE",
        "$in" | "$nin" => {
            let items = operand
                .as_array()
                .ok_or_else(|| invalid(format!("{} expects an array", op)))?;
            let keyword = if op == "$in" { "IN" } else { "NOT IN" };
            return Ok(format!("{} {} {}", field, keyword, list(items)?));
        }
        other => return Err(invalid(format!("unsupported operator {}", other))),
    };
    Ok(format!("{} {} {}", field, symbol, literal(operand)?))
}

fn list(items: &[Value]) -> Result<String> {
    if items.is_empty() {
        return Err(invalid("IN list must not be empty"));
    }
    let values = items.iter().map(literal).collect::<Result<Vec<_>>>()?;
    Ok(format!("({})", values.join(", ")))
}

fn literal(value: &Value) -> Result<String> {
    match value {
        Value::Null => Ok("null".to_string()),
        Value::Bool(b) => Ok(if *b { "true" } else { "false" }.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(quote(s)),
        other => Err(invalid(format!("cannot use {} as a SOQL literal", other))),
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// `"-CreatedDate Name"` → `CreatedDate DESC, Name ASC`.
fn order_by(sort: &str) -> Result<String> {
    let mut parts = Vec::new();
    for token in sort.split(|c: char| c == ',' || c.is_whitespace()) {
        if token.is_empty() {
            continue;
        }
        let (field, direction) = match token.strip_prefix('-') {
            Some(field) => (field, "DESC"),
            None => (token.strip_prefix('+').unwrap_or(token), "ASC"),
        };
        check_identifier(field)?;
        parts.push(format!("{} {}", field, direction));
    }
    Ok(parts.join(", "))
}

/// Field and object names may only contain letters, digits, `_` and `.`
/// (relationship paths).
pub(crate) fn check_identifier(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(invalid(format!("invalid identifier '{}'", name)))
    }
}

fn invalid(message: impl Into<String>) -> ConnectionError {
    ConnectionError::InvalidRequest(message.into())
}
