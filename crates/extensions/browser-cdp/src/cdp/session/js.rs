//! JavaScript execution operations for CDP page session.

use serde_json::{Value, json};

use crate::cdp::error::CdpError;

use super::core::PageSession;

fn exception_text(result: &Value) -> Option<String> {
    let exception = result.get("exceptionDetails")?;
    let text = exception["exception"]["description"]
        .as_str()
        .or_else(|| exception["text"].as_str())
        .unwrap_or("Unknown error");
    Some(text.to_string())
}

impl PageSession {
    /// Evaluate a JavaScript expression, awaiting a returned promise, and
    /// return its value.
    pub async fn evaluate(&self, expression: &str) -> Result<Value, CdpError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                })),
            )
            .await?;

        if let Some(text) = exception_text(&result) {
            return Err(CdpError::JavaScript(text));
        }

        Ok(result["result"]["value"].clone())
    }

    /// Start a script without waiting for any promise it returns.
    ///
    /// Only synchronous exceptions are reported; the script is expected to
    /// report back through a binding.
    pub async fn run_script(&self, source: &str) -> Result<(), CdpError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": source,
                    "returnByValue": false,
                    "awaitPromise": false,
                })),
            )
            .await?;

        match exception_text(&result) {
            Some(text) => Err(CdpError::JavaScript(text)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exception_text_prefers_description() {
        let result = json!({
            "result": {"type": "object"},
            "exceptionDetails": {
                "text": "Uncaught",
                "exception": {"description": "ReferenceError: foo is not defined"}
            }
        });
        assert_eq!(
            exception_text(&result).as_deref(),
            Some("ReferenceError: foo is not defined")
        );
    }

    #[test]
    fn test_exception_text_absent() {
        let result = json!({"result": {"type": "undefined"}});
        assert!(exception_text(&result).is_none());
    }

    #[test]
    fn test_exception_text_falls_back_to_text() {
        let result = json!({"exceptionDetails": {"text": "SyntaxError"}});
        assert_eq!(exception_text(&result).as_deref(), Some("SyntaxError"));
    }
}
