use serde_json::{Map, Value};

/// Upper bound on stored insult content, in characters.
pub const MAX_CONTENT_LEN: usize = 4096;

/// Canonical request input: the JSON body when one was sent, otherwise the
/// query string. Values from the query string are always strings.
pub type InputMap = Map<String, Value>;

// -- Insults --

/// Body of an insult creation request.
#[derive(Debug, Clone, PartialEq)]
pub struct AddInsultRequest {
    pub content: String,
    pub by: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AddInsultError {
    MissingContent,
    ContentTooLong,
    InvalidSubmitter,
}

impl AddInsultRequest {
    /// Pulls `content` and the optional `by` out of a request input map.
    /// `content` must be a non-empty string; `by`, when present and not
    /// null, must be an integer or a numeric string.
    pub fn from_input(input: &InputMap) -> Result<Self, AddInsultError> {
        let content = match input.get("content") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            _ => return Err(AddInsultError::MissingContent),
        };
        if content.chars().count() > MAX_CONTENT_LEN {
            return Err(AddInsultError::ContentTooLong);
        }

        let by = match input.get("by") {
            None | Some(Value::Null) => None,
            Some(v) => Some(parse_integer(v).ok_or(AddInsultError::InvalidSubmitter)?),
        };

        Ok(Self { content, by })
    }
}

// -- Keys --

/// Number of keys a `generateKeys` call should create. Anything absent or
/// falsy (null, false, 0, "") and anything non-numeric falls back to 1.
/// Fractions round up; magnitudes beyond `i64` saturate, so an oversized
/// count still reads as oversized.
pub fn requested_key_count(input: &InputMap) -> i64 {
    let count = match input.get("count") {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(saturating_count)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| !f.is_nan()).map(saturating_count))
        }
        _ => None,
    };

    match count {
        Some(0) | None => 1,
        Some(n) => n,
    }
}

fn saturating_count(f: f64) -> i64 {
    // `as` saturates at the i64 bounds.
    f.ceil() as i64
}

/// Integer view of a JSON value: integral numbers and numeric strings.
pub fn parse_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(v: Value) -> InputMap {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn key_count_defaults_to_one() {
        assert_eq!(requested_key_count(&input(json!({}))), 1);
        assert_eq!(requested_key_count(&input(json!({"count": null}))), 1);
        assert_eq!(requested_key_count(&input(json!({"count": 0}))), 1);
        assert_eq!(requested_key_count(&input(json!({"count": ""}))), 1);
        assert_eq!(requested_key_count(&input(json!({"count": false}))), 1);
        assert_eq!(requested_key_count(&input(json!({"count": "lots"}))), 1);
    }

    #[test]
    fn key_count_accepts_numbers_and_numeric_strings() {
        assert_eq!(requested_key_count(&input(json!({"count": 3}))), 3);
        assert_eq!(requested_key_count(&input(json!({"count": "5"}))), 5);
        assert_eq!(requested_key_count(&input(json!({"count": 2.0}))), 2);
        assert_eq!(requested_key_count(&input(json!({"count": 2.5}))), 3);
        assert_eq!(requested_key_count(&input(json!({"count": -4}))), -4);
    }

    #[test]
    fn key_count_saturates_out_of_range_numbers() {
        assert_eq!(requested_key_count(&input(json!({"count": 1e30}))), i64::MAX);
        assert_eq!(requested_key_count(&input(json!({"count": u64::MAX}))), i64::MAX);
        assert_eq!(requested_key_count(&input(json!({"count": "1e30"}))), i64::MAX);
        assert_eq!(requested_key_count(&input(json!({"count": -1e30}))), i64::MIN);
    }

    #[test]
    fn add_insult_requires_content() {
        assert_eq!(
            AddInsultRequest::from_input(&input(json!({}))),
            Err(AddInsultError::MissingContent)
        );
        assert_eq!(
            AddInsultRequest::from_input(&input(json!({"content": ""}))),
            Err(AddInsultError::MissingContent)
        );
        assert_eq!(
            AddInsultRequest::from_input(&input(json!({"content": 42}))),
            Err(AddInsultError::MissingContent)
        );
    }

    #[test]
    fn add_insult_parses_submitter() {
        let req = AddInsultRequest::from_input(&input(json!({"content": "hi", "by": "7"}))).unwrap();
        assert_eq!(req.by, Some(7));

        let req = AddInsultRequest::from_input(&input(json!({"content": "hi", "by": null}))).unwrap();
        assert_eq!(req.by, None);

        assert_eq!(
            AddInsultRequest::from_input(&input(json!({"content": "hi", "by": "someone"}))),
            Err(AddInsultError::InvalidSubmitter)
        );
    }

    #[test]
    fn add_insult_rejects_oversized_content() {
        let long = "x".repeat(MAX_CONTENT_LEN + 1);
        assert_eq!(
            AddInsultRequest::from_input(&input(json!({ "content": long }))),
            Err(AddInsultError::ContentTooLong)
        );
    }
}
