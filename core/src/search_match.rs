use std::borrow::Cow;

use serde_json::{Number, Value};

/// A query normalized once for case-insensitive substring tests.
#[derive(Debug, Clone)]
pub(crate) struct PreparedQuery {
  q: String,
}

impl PreparedQuery {
  /// `None` for the empty query: nothing can match it.
  pub(crate) fn new(query: &str) -> Option<Self> {
    if query.is_empty() {
      return None;
    }
    Some(Self {
      q: query.to_lowercase(),
    })
  }

  pub(crate) fn matches_text(&self, text: &str) -> bool {
    text.to_lowercase().contains(&self.q)
  }

  /// Null and containers never match as whole values.
  pub(crate) fn matches_value(&self, value: &Value) -> bool {
    primitive_text(value).is_some_and(|t| self.matches_text(&t))
  }
}

/// The text a primitive is searched as. `None` for null, objects and arrays.
pub(crate) fn primitive_text(value: &Value) -> Option<Cow<'_, str>> {
  match value {
    Value::String(s) => Some(Cow::Borrowed(s.as_str())),
    Value::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
    Value::Number(n) => Some(Cow::Owned(number_text(n))),
    Value::Null | Value::Array(_) | Value::Object(_) => None,
  }
}

fn number_text(n: &Number) -> String {
  if n.is_i64() || n.is_u64() {
    return n.to_string();
  }
  match n.as_f64() {
    Some(f) if f == 0.0 => "0".to_string(),
    Some(f) if f.is_finite() && (f.abs() >= 1e21 || f.abs() < 1e-6) => exponent_text(f),
    // 2.0 -> "2"
    Some(f) if f.is_finite() && f.fract() == 0.0 => format!("{f:.0}"),
    Some(f) => f.to_string(),
    None => n.to_string(),
  }
}

/// Shortest digits in exponent form with an explicit sign: `1e+21`, `1.5e-7`.
fn exponent_text(f: f64) -> String {
  let s = format!("{f:e}");
  match s.split_once('e') {
    Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
    _ => s,
  }
}
