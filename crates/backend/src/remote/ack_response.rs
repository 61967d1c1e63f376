use serde_json::Value;

/// Opaque acknowledgement returned by the command endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct Ack(pub Value);

impl Ack {
    pub fn empty() -> Self {
        Self(Value::Null)
    }

    /// JSON bodies are kept as-is; anything else is kept as raw text.
    pub fn from_body(body: &str) -> Self {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Self(Value::Null);
        }
        match serde_json::from_str(trimmed) {
            Ok(value) => Self(value),
            Err(_) => Self(Value::String(trimmed.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_json_and_plain_text() {
        assert_eq!(Ack::from_body(""), Ack(Value::Null));
        assert_eq!(
            Ack::from_body(r#"{"orderId": 42}"#).0["orderId"],
            Value::from(42)
        );
        assert_eq!(Ack::from_body("OK\n"), Ack(Value::String("OK".to_string())));
    }
}
