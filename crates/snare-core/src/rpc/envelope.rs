//! JSON-RPC 2.0 envelopes as spoken by aria2.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::RpcError;

#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: &'a str,
    pub method: &'a str,
    pub params: Vec<Value>,
}

impl<'a> RpcRequest<'a> {
    /// The secret travels as the first positional parameter, `token:<secret>`.
    pub fn new(id: &'a str, method: &'a str, secret: &str, params: Vec<Value>) -> Self {
        let mut all = Vec::with_capacity(params.len() + 1);
        all.push(Value::String(format!("token:{}", secret)));
        all.extend(params);
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params: all,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RpcErrorObject {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// Any incoming message. Notifications have a `method` and no `id`.
#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
    #[serde(default)]
    pub method: Option<String>,
}

impl RpcResponse {
    /// Correlation key; numeric ids are matched by their decimal form.
    pub fn id_key(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn into_result(self) -> Result<Value, RpcError> {
        match self.error {
            Some(err) => Err(RpcError::Remote {
                code: err.code,
                message: err.message,
            }),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_prepends_token() {
        let req = RpcRequest::new("7", "aria2.addUri", "s3", vec![json!(["https://x.test/a"])]);
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(
            v,
            json!({
                "jsonrpc": "2.0",
                "id": "7",
                "method": "aria2.addUri",
                "params": ["token:s3", ["https://x.test/a"]]
            })
        );
    }

    #[test]
    fn error_envelope_is_verbatim() {
        let resp: RpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":"3","error":{"code":1,"message":"Unauthorized"}}"#,
        )
        .unwrap();
        assert_eq!(resp.id_key().as_deref(), Some("3"));
        let err = resp.into_result().unwrap_err();
        assert_eq!(err.to_string(), "Unauthorized");
    }

    #[test]
    fn numeric_id_and_notification() {
        let resp: RpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":12,"result":"2089b05ecca3d829"}"#).unwrap();
        assert_eq!(resp.id_key().as_deref(), Some("12"));
        assert_eq!(resp.into_result().unwrap(), json!("2089b05ecca3d829"));

        let note: RpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","method":"aria2.onDownloadStart","params":[{"gid":"1"}]}"#,
        )
        .unwrap();
        assert!(note.id_key().is_none());
        assert_eq!(note.method.as_deref(), Some("aria2.onDownloadStart"));
    }
}
