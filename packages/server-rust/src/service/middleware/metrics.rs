//! Metrics middleware for operations.
//!
//! Records operation duration and outcome using `tracing` spans, not a full
//! metrics crate.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use tower::{Layer, Service};
use tracing::{info_span, Instrument};

use crate::service::operation::{Operation, OperationError, OperationResponse};

// ---------------------------------------------------------------------------
// MetricsLayer
// ---------------------------------------------------------------------------

/// Tower layer that instruments operations with timing and outcome via `tracing` spans.
#[derive(Debug, Clone)]
pub struct MetricsLayer;

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsService { inner }
    }
}

// ---------------------------------------------------------------------------
// MetricsService
// ---------------------------------------------------------------------------

/// Service wrapper that records operation duration and outcome in tracing spans.
#[derive(Debug, Clone)]
pub struct MetricsService<S> {
    inner: S,
}

impl<S> Service<Operation> for MetricsService<S>
where
    S: Service<Operation, Response = OperationResponse, Error = OperationError> + Send,
    S::Future: Send + 'static,
{
    type Response = OperationResponse;
    type Error = OperationError;
    type Future = Pin<Box<dyn Future<Output = Result<OperationResponse, OperationError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, op: Operation) -> Self::Future {
        let kind = op.kind();
        let operation = kind.name();
        let request_id = op.ctx().request_id.clone();
        let table = op.ctx().table_name.clone().unwrap_or_default();

        let span = info_span!(
            "operation",
            request_id = %request_id,
            operation = operation,
            mutation = kind.is_mutation(),
            table = %table,
            duration_ms = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );

        let fut = self.inner.call(op);

        Box::pin(
            async move {
                let start = Instant::now();
                let result = fut.await;

                #[allow(clippy::cast_possible_truncation)]
                let duration_ms = start.elapsed().as_millis() as u64;

                let outcome = match &result {
                    Ok(_) => "ok",
                    Err(e) => e.kind().as_str(),
                };
                tracing::Span::current().record("duration_ms", duration_ms);
                tracing::Span::current().record("outcome", outcome);

                match &result {
                    Ok(_) => tracing::info!(duration_ms, outcome, "operation complete"),
                    Err(e) if e.is_client_error() => {
                        tracing::info!(duration_ms, outcome, error = %e, "operation rejected");
                    }
                    Err(e) => tracing::warn!(duration_ms, outcome, error = %e, "operation failed"),
                }

                result
            }
            .instrument(span),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use tablegate_core::OperationKind;
    use tower::ServiceExt;

    use super::*;
    use crate::service::operation::OperationContext;
    use crate::traits::BackendError;

    /// Immediately-completing service for metrics testing.
    struct ImmediateService {
        fail: bool,
    }

    impl Service<Operation> for ImmediateService {
        type Response = OperationResponse;
        type Error = OperationError;
        type Future =
            Pin<Box<dyn Future<Output = Result<OperationResponse, OperationError>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, _op: Operation) -> Self::Future {
            let fail = self.fail;
            Box::pin(async move {
                if fail {
                    Err(BackendError::Internal(anyhow::anyhow!("boom")).into())
                } else {
                    Ok(OperationResponse::Pong)
                }
            })
        }
    }

    fn ping() -> Operation {
        Operation::Ping {
            ctx: OperationContext::new("req-42", OperationKind::Ping),
        }
    }

    #[tokio::test]
    async fn metrics_layer_passes_through_response() {
        let svc = MetricsLayer.layer(ImmediateService { fail: false });
        let resp = svc.oneshot(ping()).await.unwrap();
        assert_eq!(resp, OperationResponse::Pong);
    }

    #[tokio::test]
    async fn metrics_layer_passes_through_error() {
        let svc = MetricsLayer.layer(ImmediateService { fail: true });
        let err = svc.oneshot(ping()).await.unwrap_err();
        assert!(matches!(err, OperationError::Backend(BackendError::Internal(_))));
    }
}
