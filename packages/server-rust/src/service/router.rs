//! Operation routing: dispatches a typed `Operation` to the storage backend.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use serde_json::Value;
use tablegate_core::{
    GetItemOutput, Item, Key, Request, ScanOutput, UpdateItemPayload, WriteOutput,
};
use tower::{Service, ServiceExt};
use tracing::debug;

use super::classify::classify_request;
use super::middleware::build_operation_pipeline;
use super::operation::{Operation, OperationError, OperationResponse};
use crate::traits::{BackendError, KeyValueBackend};

// ---------------------------------------------------------------------------
// TableHandle
// ---------------------------------------------------------------------------

/// A backend bound to one table for the duration of a single dispatch.
///
/// Created only by storage operations, so `echo`/`ping` never touch the
/// backend.
struct TableHandle<'a> {
    backend: &'a dyn KeyValueBackend,
    table: &'a str,
}

impl TableHandle<'_> {
    async fn put(&self, item: Item) -> Result<WriteOutput, BackendError> {
        self.backend.put_item(self.table, item).await
    }

    async fn get(&self, key: &Key) -> Result<GetItemOutput, BackendError> {
        self.backend.get_item(self.table, key).await
    }

    async fn update(&self, payload: &UpdateItemPayload) -> Result<WriteOutput, BackendError> {
        self.backend
            .update_item(self.table, &payload.key, &payload.attribute_updates)
            .await
    }

    async fn delete(&self, key: &Key) -> Result<WriteOutput, BackendError> {
        self.backend.delete_item(self.table, key).await
    }

    async fn scan(&self) -> Result<ScanOutput, BackendError> {
        self.backend.scan(self.table).await
    }
}

// ---------------------------------------------------------------------------
// OperationRouter
// ---------------------------------------------------------------------------

/// Routes requests to their operation handler.
///
/// The set of operations is the closed [`Operation`] enum, so dispatch is a
/// single `match` and the router holds no mutable state. The backend is
/// supplied at construction; the table comes with each operation.
#[derive(Clone)]
pub struct OperationRouter {
    backend: Arc<dyn KeyValueBackend>,
}

impl OperationRouter {
    #[must_use]
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self { backend }
    }

    /// The backend storage operations run against.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn KeyValueBackend> {
        &self.backend
    }

    fn bind<'a>(&'a self, table: &'a str) -> TableHandle<'a> {
        TableHandle {
            backend: self.backend.as_ref(),
            table,
        }
    }

    /// Executes an already classified operation and returns its result verbatim.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::Backend` if the backend rejects or fails the call.
    pub async fn dispatch(&self, op: Operation) -> Result<OperationResponse, OperationError> {
        debug!(
            request_id = %op.ctx().request_id,
            operation = %op.kind(),
            "dispatching operation"
        );

        let response = match op {
            Operation::Create { table, payload, .. } => {
                OperationResponse::Written(self.bind(&table).put(payload.item).await?)
            }
            Operation::Read { table, payload, .. } => {
                OperationResponse::Item(self.bind(&table).get(&payload.key).await?)
            }
            Operation::Update { table, payload, .. } => {
                OperationResponse::Written(self.bind(&table).update(&payload).await?)
            }
            Operation::Delete { table, payload, .. } => {
                OperationResponse::Written(self.bind(&table).delete(&payload.key).await?)
            }
            Operation::List { table, .. } => {
                OperationResponse::Items(self.bind(&table).scan().await?)
            }
            Operation::Echo { payload, .. } => OperationResponse::Echo(payload),
            Operation::Ping { .. } => OperationResponse::Pong,
        };
        Ok(response)
    }

    /// Classifies and executes `request` under a fresh request id.
    ///
    /// # Errors
    ///
    /// Returns the classification error (`MissingOperation`,
    /// `UnrecognizedOperation`, `MissingTable`, `InvalidPayload`) or the
    /// backend failure.
    pub async fn route(&self, request: Request) -> Result<OperationResponse, OperationError> {
        self.route_with_id(request, uuid::Uuid::new_v4().to_string())
            .await
    }

    /// Like [`route`](Self::route), using the transport's request id.
    ///
    /// # Errors
    ///
    /// See [`route`](Self::route).
    pub async fn route_with_id(
        &self,
        request: Request,
        request_id: impl Into<String>,
    ) -> Result<OperationResponse, OperationError> {
        let request_id = request_id.into();
        let op = match classify_request(request, request_id.as_str()) {
            Ok(op) => op,
            Err(err) => {
                debug!(request_id = %request_id, kind = %err.kind(), error = %err, "request rejected");
                return Err(err);
            }
        };
        build_operation_pipeline(self.clone()).oneshot(op).await
    }

    /// Decodes a raw JSON body and routes it.
    ///
    /// # Errors
    ///
    /// Returns `MalformedRequest` if the body is not a request object, else
    /// see [`route`](Self::route).
    pub async fn route_json(
        &self,
        body: Value,
        request_id: impl Into<String>,
    ) -> Result<OperationResponse, OperationError> {
        let request = Request::from_json(body).map_err(|e| OperationError::MalformedRequest {
            reason: e.to_string(),
        })?;
        self.route_with_id(request, request_id).await
    }
}

impl Service<Operation> for OperationRouter {
    type Response = OperationResponse;
    type Error = OperationError;
    type Future = Pin<Box<dyn Future<Output = Result<OperationResponse, OperationError>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, op: Operation) -> Self::Future {
        let router = self.clone();
        Box::pin(async move { router.dispatch(op).await })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use async_trait::async_trait;
    use serde_json::json;
    use tablegate_core::{
        AttributeUpdate, KeySchema, OperationKind, PutItemPayload, TableSchema,
    };

    use super::*;
    use crate::service::operation::OperationContext;
    use crate::storage::InMemoryBackend;

    /// Backend that fails every call, to check that nothing is swallowed.
    struct FailingBackend;

    #[async_trait]
    impl KeyValueBackend for FailingBackend {
        async fn create_table(&self, _schema: TableSchema) -> Result<(), BackendError> {
            Err(BackendError::Internal(anyhow::anyhow!("throttled")))
        }
        async fn table_schema(&self, table: &str) -> Result<TableSchema, BackendError> {
            Err(BackendError::table_not_found(table))
        }
        async fn put_item(&self, _t: &str, _i: Item) -> Result<WriteOutput, BackendError> {
            Err(BackendError::Internal(anyhow::anyhow!("throttled")))
        }
        async fn get_item(&self, _t: &str, _k: &Key) -> Result<GetItemOutput, BackendError> {
            Err(BackendError::Internal(anyhow::anyhow!("throttled")))
        }
        async fn update_item(
            &self,
            _t: &str,
            _k: &Key,
            _u: &BTreeMap<String, AttributeUpdate>,
        ) -> Result<WriteOutput, BackendError> {
            Err(BackendError::Internal(anyhow::anyhow!("throttled")))
        }
        async fn delete_item(&self, _t: &str, _k: &Key) -> Result<WriteOutput, BackendError> {
            Err(BackendError::Internal(anyhow::anyhow!("throttled")))
        }
        async fn scan(&self, _t: &str) -> Result<ScanOutput, BackendError> {
            Err(BackendError::Internal(anyhow::anyhow!("throttled")))
        }
    }

    fn router() -> OperationRouter {
        let backend = InMemoryBackend::with_tables([TableSchema::new(
            "lambda-apigateway",
            KeySchema::new("id"),
        )])
        .unwrap();
        OperationRouter::new(Arc::new(backend))
    }

    fn item(v: Value) -> Item {
        match v {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn service_dispatches_typed_operation() {
        let mut router = router();
        let ctx = OperationContext::new("req-1", OperationKind::Create);
        let op = Operation::Create {
            ctx,
            table: "lambda-apigateway".to_string(),
            payload: PutItemPayload {
                item: item(json!({"id": "x"})),
            },
        };

        let resp = ServiceExt::ready(&mut router)
            .await
            .unwrap()
            .call(op)
            .await
            .unwrap();
        assert_eq!(resp, OperationResponse::Written(WriteOutput {}));
        assert_eq!(router.backend().scan("lambda-apigateway").await.unwrap().count, 1);
    }

    #[tokio::test]
    async fn ping_and_echo_never_touch_backend() {
        let router = OperationRouter::new(Arc::new(FailingBackend));

        let resp = router.route(Request::new("ping")).await.unwrap();
        assert_eq!(resp, OperationResponse::Pong);

        let resp = router
            .route(Request::new("echo").with_table("missing").with_payload(json!({"a": 1})))
            .await
            .unwrap();
        assert_eq!(resp, OperationResponse::Echo(json!({"a": 1})));
    }

    #[tokio::test]
    async fn backend_failures_are_propagated() {
        let router = OperationRouter::new(Arc::new(FailingBackend));
        let err = router
            .route(Request::new("list").with_table("t"))
            .await
            .unwrap_err();
        assert!(matches!(err, OperationError::Backend(BackendError::Internal(_))));
        assert!(!err.is_client_error());
    }

    #[tokio::test]
    async fn unknown_table_is_a_backend_error() {
        let err = router()
            .route(Request::new("read").with_table("nope").with_payload(json!({"Key": {"id": "a"}})))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OperationError::Backend(BackendError::TableNotFound { ref table }) if table == "nope"
        ));
    }

    #[tokio::test]
    async fn route_json_rejects_non_object_body() {
        let router = router();
        for body in [
            json!("ping"),
            json!(["ping"]),
            json!(["create", "lambda-apigateway", {"Item": {"id": "arr"}}]),
        ] {
            let err = router.route_json(body, "req").await.unwrap_err();
            assert!(matches!(err, OperationError::MalformedRequest { .. }));
        }
        assert_eq!(router.backend().scan("lambda-apigateway").await.unwrap().count, 0);
    }

    #[tokio::test]
    async fn non_string_table_name_only_matters_for_storage_operations() {
        let router = router();
        let resp = router
            .route_json(json!({"operation": "ping", "tableName": 5}), "req")
            .await
            .unwrap();
        assert_eq!(resp, OperationResponse::Pong);

        let err = router
            .route_json(json!({"operation": "list", "tableName": 5}), "req")
            .await
            .unwrap_err();
        assert!(matches!(err, OperationError::MissingTable { .. }));
    }

    #[tokio::test]
    async fn update_then_read_returns_merged_item() {
        let router = router();
        router
            .route(Request::new("create").with_table("lambda-apigateway").with_payload(
                json!({"Item": {"id": "1234ABCD", "number": 5}}),
            ))
            .await
            .unwrap();
        router
            .route(Request::new("update").with_table("lambda-apigateway").with_payload(json!({
                "Key": {"id": "1234ABCD"},
                "AttributeUpdates": {"number": {"Value": 10}}
            })))
            .await
            .unwrap();

        let resp = router
            .route(
                Request::new("read")
                    .with_table("lambda-apigateway")
                    .with_payload(json!({"Key": {"id": "1234ABCD"}})),
            )
            .await
            .unwrap();
        assert_eq!(
            resp.into_json().unwrap(),
            json!({"Item": {"id": "1234ABCD", "number": 10}})
        );
    }
}
