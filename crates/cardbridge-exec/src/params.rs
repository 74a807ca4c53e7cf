//! Centralized parameter checks with stable error strings.
//!
//! The exact message per failure mode is part of the observable contract;
//! external clients match on these strings, so changing one is a breaking
//! change.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ParamError(pub String);

impl ParamError {
    fn missing(field: &str) -> Self {
        ParamError(format!("Missing required field: {field}"))
    }
}

/// A required list of 0-based indices.
pub fn require_index_list(params: &Map<String, Value>, field: &str) -> Result<Vec<usize>, ParamError> {
    let value = params.get(field).ok_or_else(|| ParamError::missing(field))?;
    let items = value.as_array().ok_or_else(|| {
        ParamError(format!("Invalid {field}: expected an array of integers"))
    })?;
    let mut indices = Vec::with_capacity(items.len());
    for item in items {
        // try_from also catches u64 values a 32-bit usize cannot hold.
        let index = item
            .as_u64()
            .and_then(|i| usize::try_from(i).ok())
            .ok_or_else(|| {
                ParamError(format!("Invalid {field}: indices must be non-negative integers"))
            })?;
        indices.push(index);
    }
    Ok(indices)
}

/// A required single 0-based index.
pub fn require_index(params: &Map<String, Value>, field: &str) -> Result<usize, ParamError> {
    let value = params.get(field).ok_or_else(|| ParamError::missing(field))?;
    value
        .as_u64()
        .and_then(|i| usize::try_from(i).ok())
        .ok_or_else(|| ParamError(format!("Invalid {field}: must be a non-negative integer")))
}

/// A required non-empty string.
pub fn require_str(params: &Map<String, Value>, field: &str) -> Result<String, ParamError> {
    let value = params.get(field).ok_or_else(|| ParamError::missing(field))?;
    let text = value
        .as_str()
        .ok_or_else(|| ParamError(format!("Invalid {field}: expected a string")))?;
    if text.is_empty() {
        return Err(ParamError(format!("Invalid {field}: must not be empty")));
    }
    Ok(text.to_string())
}

/// Lists of card indices must select at least one card.
pub fn require_non_empty(indices: &[usize], field: &str) -> Result<(), ParamError> {
    if indices.is_empty() {
        return Err(ParamError(format!(
            "Invalid {field}: at least one index is required"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn missing_field_message_is_stable() {
        let p = params(json!({}));
        assert_eq!(
            require_index_list(&p, "card_indices").unwrap_err().to_string(),
            "Missing required field: card_indices"
        );
        assert_eq!(
            require_index(&p, "shop_index").unwrap_err().to_string(),
            "Missing required field: shop_index"
        );
        assert_eq!(
            require_str(&p, "item_id").unwrap_err().to_string(),
            "Missing required field: item_id"
        );
    }

    #[test]
    fn negative_index_message_is_distinct_from_missing() {
        let p = params(json!({"card_indices": [0, -2], "shop_index": -1}));
        assert_eq!(
            require_index_list(&p, "card_indices").unwrap_err().to_string(),
            "Invalid card_indices: indices must be non-negative integers"
        );
        assert_eq!(
            require_index(&p, "shop_index").unwrap_err().to_string(),
            "Invalid shop_index: must be a non-negative integer"
        );
    }

    #[test]
    fn wrong_shapes_are_reported_per_field() {
        let p = params(json!({"card_indices": "zero", "item_id": 5}));
        assert_eq!(
            require_index_list(&p, "card_indices").unwrap_err().to_string(),
            "Invalid card_indices: expected an array of integers"
        );
        assert_eq!(
            require_str(&p, "item_id").unwrap_err().to_string(),
            "Invalid item_id: expected a string"
        );
    }

    #[test]
    fn indices_must_fit_the_address_width() {
        let too_big = u64::try_from(usize::MAX)
            .ok()
            .and_then(|max| max.checked_add(1));
        // On 64-bit targets every u64 index fits; nothing to reject there.
        let Some(too_big) = too_big else {
            return;
        };
        let p = params(json!({"card_indices": [0, too_big], "shop_index": too_big}));
        assert_eq!(
            require_index_list(&p, "card_indices").unwrap_err().to_string(),
            "Invalid card_indices: indices must be non-negative integers"
        );
        assert_eq!(
            require_index(&p, "shop_index").unwrap_err().to_string(),
            "Invalid shop_index: must be a non-negative integer"
        );
    }

    #[test]
    fn valid_values_pass_through() {
        let p = params(json!({"card_indices": [0, 3], "shop_index": 2, "item_id": "tarot_1"}));
        assert_eq!(require_index_list(&p, "card_indices").unwrap(), vec![0, 3]);
        assert_eq!(require_index(&p, "shop_index").unwrap(), 2);
        assert_eq!(require_str(&p, "item_id").unwrap(), "tarot_1");
        assert!(require_non_empty(&[1], "card_indices").is_ok());
        assert_eq!(
            require_non_empty(&[], "card_indices").unwrap_err().to_string(),
            "Invalid card_indices: at least one index is required"
        );
    }
}
