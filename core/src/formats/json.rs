use serde_json::Value;

use crate::engine::CoreError;

/// Parse hand-edited JSON.
///
/// Accepts a UTF-8 BOM, trailing NUL padding, `//` and `/* */` comments and trailing commas
/// (all outside string literals). If the cleaned text still is not one JSON value but has
/// several lines, each line is parsed as its own value (NDJSON) and the result is an array.
pub fn parse_tolerant(text: &str) -> Result<Value, CoreError> {
  let text = text.strip_prefix('\u{feff}').unwrap_or(text);
  let text = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
  let cleaned = strip_trailing_commas(&strip_comments(text));

  let err = match serde_json::from_str::<Value>(&cleaned) {
    Ok(v) => return Ok(v),
    Err(e) => e,
  };

  let lines: Vec<&str> = cleaned
    .lines()
    .map(str::trim)
    .filter(|l| !l.is_empty())
    .collect();
  if lines.len() > 1 {
    let mut out = Vec::with_capacity(lines.len());
    for l in lines {
      out.push(serde_json::from_str::<Value>(l)?);
    }
    return Ok(Value::Array(out));
  }
  Err(CoreError::Json(err))
}

/// Remove `//` line comments and `/* */` block comments outside strings.
fn strip_comments(s: &str) -> String {
  let bytes = s.as_bytes();
  let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
  let mut in_string = false;
  let mut escape = false;
  let mut i = 0;

  while i < bytes.len() {
    let b = bytes[i];
    if in_string {
      out.push(b);
      if escape {
        escape = false;
      } else if b == b'\\' {
        escape = true;
      } else if b == b'"' {
        in_string = false;
      }
      i += 1;
      continue;
    }

    match (b, bytes.get(i + 1).copied()) {
      (b'"', _) => {
        in_string = true;
        out.push(b);
        i += 1;
      }
      (b'/', Some(b'/')) => {
        // Keep the newline itself so NDJSON line structure survives.
        while i < bytes.len() && bytes[i] != b'\n' {
          i += 1;
        }
      }
      (b'/', Some(b'*')) => {
        i += 2;
        while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
          i += 1;
        }
        i = (i + 2).min(bytes.len());
      }
      _ => {
        out.push(b);
        i += 1;
      }
    }
  }
  // Only whole ASCII-delimited runs were removed, so the bytes are still UTF-8.
  String::from_utf8_lossy(&out).into_owned()
}

/// Drop a `,` whose next non-whitespace byte closes an object or array.
fn strip_trailing_commas(s: &str) -> String {
  let bytes = s.as_bytes();
  let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
  let mut in_string = false;
  let mut escape = false;

  for (i, &b) in bytes.iter().enumerate() {
    if in_string {
      out.push(b);
      if escape {
        escape = false;
      } else if b == b'\\' {
        escape = true;
      } else if b == b'"' {
        in_string = false;
      }
      continue;
    }
    match b {
      b'"' => {
        in_string = true;
        out.push(b);
      }
      b',' => {
        let next = bytes[i + 1..].iter().copied().find(|c| !c.is_ascii_whitespace());
        if !matches!(next, Some(b'}' | b']')) {
          out.push(b);
        }
      }
      _ => out.push(b),
    }
  }
  String::from_utf8_lossy(&out).into_owned()
}
