use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Inbound request as forwarded by the gateway.
///
/// Every field is optional at the wire level so that a missing `operation`
/// can be reported as its own error instead of a generic decode failure.
/// Unknown top-level fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Name of the operation to run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    /// Target table for storage operations. A non-string value decodes as
    /// absent, so only operations that need a table reject it.
    #[serde(
        default,
        deserialize_with = "lenient_table_name",
        skip_serializing_if = "Option::is_none"
    )]
    pub table_name: Option<String>,
    /// Operation-specific payload. `null` is treated as absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Request {
    /// Creates a request for `operation` with no table or payload.
    #[must_use]
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Self::default()
        }
    }

    /// Sets the target table.
    #[must_use]
    pub fn with_table(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    /// Sets the payload.
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Decodes a request from a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if `body` is not an object or a field has the wrong
    /// JSON type (e.g. a numeric `operation`).
    pub fn from_json(body: Value) -> Result<Self, serde_json::Error> {
        // serde would otherwise read a JSON array positionally.
        if !body.is_object() {
            return Err(serde_json::Error::custom(
                "request body must be a JSON object",
            ));
        }
        serde_json::from_value(body)
    }
}

fn lenient_table_name<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(name) => Some(name),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_full_request() {
        let req = Request::from_json(json!({
            "operation": "create",
            "tableName": "lambda-apigateway",
            "payload": {"Item": {"id": "1234ABCD", "number": 5}}
        }))
        .unwrap();

        assert_eq!(req.operation.as_deref(), Some("create"));
        assert_eq!(req.table_name.as_deref(), Some("lambda-apigateway"));
        assert_eq!(
            req.payload,
            Some(json!({"Item": {"id": "1234ABCD", "number": 5}}))
        );
    }

    #[test]
    fn missing_fields_decode_as_none() {
        let req = Request::from_json(json!({})).unwrap();
        assert_eq!(req, Request::default());
    }

    #[test]
    fn null_payload_is_absent() {
        let req = Request::from_json(json!({"operation": "echo", "payload": null})).unwrap();
        assert!(req.payload.is_none());
    }

    #[test]
    fn extra_fields_are_ignored() {
        let req = Request::from_json(json!({"operation": "ping", "requestContext": {}})).unwrap();
        assert_eq!(req, Request::new("ping"));
    }

    #[test]
    fn non_string_operation_is_rejected() {
        assert!(Request::from_json(json!({"operation": 5})).is_err());
    }

    #[test]
    fn non_object_body_is_rejected() {
        assert!(Request::from_json(json!(["create"])).is_err());
        assert!(Request::from_json(json!(["create", "t", {"Item": {"id": "a"}}])).is_err());
        assert!(Request::from_json(json!("create")).is_err());
        assert!(Request::from_json(json!(null)).is_err());
    }

    #[test]
    fn non_string_table_name_decodes_as_absent() {
        let req = Request::from_json(json!({"operation": "ping", "tableName": 5})).unwrap();
        assert_eq!(req, Request::new("ping"));

        let req = Request::from_json(json!({"operation": "list", "tableName": {"n": 1}})).unwrap();
        assert_eq!(req.table_name, None);
    }

    #[test]
    fn builder_serializes_with_camel_case() {
        let req = Request::new("list").with_table("t").with_payload(json!({}));
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"operation": "list", "tableName": "t", "payload": {}})
        );
    }
}
