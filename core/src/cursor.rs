use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::engine::CoreError;

/// Position inside a children listing: index of the next child to return.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct Cursor {
  pub offset: u64,
}

pub(crate) fn encode_cursor(c: Cursor) -> String {
  // Serializing a single integer field cannot fail.
  let json = serde_json::to_vec(&c).unwrap_or_default();
  base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(json)
}

pub(crate) fn decode_cursor(token: Option<&str>) -> Result<Cursor, CoreError> {
  match token {
    None => Ok(Cursor { offset: 0 }),
    Some(t) if t.is_empty() => Ok(Cursor { offset: 0 }),
    Some(t) => {
      let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(t)
        .map_err(|e| CoreError::BadCursor(e.to_string()))?;
      let c: Cursor = serde_json::from_slice(&bytes).map_err(|e| CoreError::BadCursor(e.to_string()))?;
      Ok(c)
    }
  }
}
