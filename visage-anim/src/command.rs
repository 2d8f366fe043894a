//! Expression commands, as received one JSON object per line
//!
//! Accepts both the bare form `{"expression": "happy", "intensity": 0.8,
//! "text": "..."}` and a tool-call envelope `{"name": ..., "arguments": ...}`
//! whose arguments are an object or a JSON-encoded object.

use crate::error::AnimError;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpressionCommand {
    pub expression: String,
    pub intensity: f64,
    /// Text to feed to the sentiment estimator alongside the expression
    pub text: Option<String>,
}

impl ExpressionCommand {
    pub fn new(expression: impl Into<String>, intensity: f64) -> Self {
        Self {
            expression: expression.into(),
            intensity,
            text: None,
        }
    }

    pub fn from_json(line: &str) -> Result<Self, AnimError> {
        let value: Value = serde_json::from_str(line)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, AnimError> {
        let value = unwrap_envelope(value)?;
        let obj = value
            .as_object()
            .ok_or_else(|| AnimError::InvalidCommand("expected a JSON object".to_string()))?;

        let expression = match obj.get("expression") {
            None | Some(Value::Null) => "idle".to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                return Err(AnimError::InvalidCommand(format!(
                    "expression must be a string, got {}",
                    other
                )))
            }
        };

        let intensity = match obj.get("intensity") {
            None | Some(Value::Null) => 1.0,
            Some(Value::Number(n)) => n.as_f64().unwrap_or(1.0),
            Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| {
                AnimError::InvalidCommand(format!("intensity '{}' is not a number", s))
            })?,
            Some(other) => {
                return Err(AnimError::InvalidCommand(format!(
                    "intensity must be a number, got {}",
                    other
                )))
            }
        };

        let text = match obj.get("text") {
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        };

        Ok(Self {
            expression,
            intensity,
            text,
        })
    }
}

fn unwrap_envelope(value: Value) -> Result<Value, AnimError> {
    let is_envelope = value.get("name").is_some() && value.get("arguments").is_some();
    if !is_envelope {
        return Ok(value);
    }

    match value.get("arguments") {
        Some(Value::String(encoded)) => Ok(serde_json::from_str(encoded)?),
        Some(arguments) => Ok(arguments.clone()),
        None => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_command() {
        let cmd = ExpressionCommand::from_json(r#"{"expression":"happy","intensity":0.8,"text":"yay"}"#)
            .unwrap();
        assert_eq!(cmd.expression, "happy");
        assert_eq!(cmd.intensity, 0.8);
        assert_eq!(cmd.text.as_deref(), Some("yay"));
    }

    #[test]
    fn test_defaults() {
        let cmd = ExpressionCommand::from_json("{}").unwrap();
        assert_eq!(cmd, ExpressionCommand::new("idle", 1.0));
    }

    #[test]
    fn test_envelope_object() {
        let cmd = ExpressionCommand::from_json(
            r#"{"name":"set_expression","arguments":{"expression":"sad","intensity":0.3}}"#,
        )
        .unwrap();
        assert_eq!(cmd.expression, "sad");
        assert_eq!(cmd.intensity, 0.3);
    }

    #[test]
    fn test_envelope_encoded_arguments() {
        let cmd = ExpressionCommand::from_json(
            r#"{"name":"set_expression","arguments":"{\"expression\":\"thinking\",\"text\":\"hmm\"}"}"#,
        )
        .unwrap();
        assert_eq!(cmd.expression, "thinking");
        assert_eq!(cmd.intensity, 1.0);
        assert_eq!(cmd.text.as_deref(), Some("hmm"));
    }

    #[test]
    fn test_name_without_arguments_is_not_envelope() {
        let cmd = ExpressionCommand::from_json(r#"{"name":"x","expression":"happy"}"#).unwrap();
        assert_eq!(cmd.expression, "happy");
    }

    #[test]
    fn test_invalid_commands() {
        assert!(ExpressionCommand::from_json("not json").is_err());
        assert!(ExpressionCommand::from_json("[1, 2]").is_err());
        assert!(ExpressionCommand::from_json(r#"{"intensity":"lots"}"#).is_err());
        assert!(ExpressionCommand::from_json(r#"{"expression":5}"#).is_err());
    }

    #[test]
    fn test_string_intensity() {
        let cmd = ExpressionCommand::from_json(r#"{"expression":"happy","intensity":"0.5"}"#).unwrap();
        assert_eq!(cmd.intensity, 0.5);
    }
}
