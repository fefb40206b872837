//! Pipeline composition: wraps the router in the middleware stack.

use tower::ServiceBuilder;

use super::metrics::{MetricsLayer, MetricsService};
use crate::service::router::OperationRouter;

/// The router wrapped in all middleware layers.
pub type OperationPipeline = MetricsService<OperationRouter>;

/// Build the operation pipeline by wrapping the `OperationRouter` with middleware layers.
///
/// The only layer is `MetricsLayer` (tracing span, timing, outcome). The
/// router performs no retries, timeouts or load shedding; those belong to
/// the invoking transport.
#[must_use]
pub fn build_operation_pipeline(router: OperationRouter) -> OperationPipeline {
    ServiceBuilder::new().layer(MetricsLayer).service(router)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use tablegate_core::OperationKind;
    use tower::ServiceExt;

    use super::*;
    use crate::service::operation::{Operation, OperationContext, OperationResponse};
    use crate::storage::InMemoryBackend;

    #[tokio::test]
    async fn pipeline_routes_through_all_layers() {
        let router = OperationRouter::new(Arc::new(InMemoryBackend::new()));
        let svc = build_operation_pipeline(router);

        let op = Operation::Echo {
            ctx: OperationContext::new("req", OperationKind::Echo),
            payload: json!({"k": "v"}),
        };
        let resp = svc.oneshot(op).await.unwrap();
        assert_eq!(resp, OperationResponse::Echo(json!({"k": "v"})));
    }
}
