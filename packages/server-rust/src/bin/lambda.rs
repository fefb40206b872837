//! Function entry point: runs the operation router under the Lambda runtime.

use std::path::PathBuf;

use clap::Parser;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tablegate_core::TableSchema;
use tablegate_server::logging::{init_logging, LogFormat};
use tablegate_server::service::{unwrap_gateway_body, BackendKind};
use tablegate_server::storage::build_backend;
use tablegate_server::{OperationResponse, OperationRouter, RouterConfig};
use tracing::{info, warn};

/// Router settings, read from flags or the function's environment.
#[derive(Debug, Parser)]
#[command(name = "tablegate-lambda", version, about)]
struct Cli {
    /// Tables to declare at startup, as `name:partitionKey[:sortKey]`.
    #[arg(long = "table", env = "TABLEGATE_TABLES", value_delimiter = ',')]
    tables: Vec<TableSchema>,

    /// Storage backend.
    #[arg(long, env = "TABLEGATE_BACKEND", value_enum, default_value_t = BackendKind::Memory)]
    backend: BackendKind,

    /// Database file for the `redb` backend.
    #[arg(long, env = "TABLEGATE_DB_PATH", default_value = "tablegate.redb")]
    db_path: PathBuf,

    /// Log output format.
    #[arg(long, env = "TABLEGATE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    log_format: LogFormat,
}

impl Cli {
    fn into_config(self) -> RouterConfig {
        RouterConfig {
            tables: self.tables,
            backend: self.backend,
            db_path: self.db_path,
            log_format: self.log_format,
        }
    }
}

async fn handle_request(
    router: &OperationRouter,
    event: LambdaEvent<Value>,
) -> Result<OperationResponse, Error> {
    let request_id = event.context.request_id;
    let routed = match unwrap_gateway_body(event.payload) {
        Ok(body) => router.route_json(body, request_id.as_str()).await,
        Err(err) => Err(err),
    };

    routed.map_err(|err| {
        if err.is_client_error() {
            info!(request_id = %request_id, kind = %err.kind(), error = %err, "request rejected");
        } else {
            warn!(request_id = %request_id, kind = %err.kind(), error = %err, "request failed");
        }
        Error::from(format!("{}: {err}", err.kind()))
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = Cli::parse().into_config();
    init_logging(config.log_format)?;

    let backend = build_backend(&config).await?;
    let router = OperationRouter::new(backend);
    info!(tables = config.tables.len(), "tablegate router started");

    let router = &router;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle_request(router, event).await
    }))
    .await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lambda_runtime::Context;
    use serde_json::json;
    use tablegate_core::KeySchema;
    use tablegate_server::storage::InMemoryBackend;

    use super::*;

    #[test]
    fn cli_parses_table_list() {
        let cli = Cli::try_parse_from([
            "tablegate-lambda",
            "--table",
            "lambda-apigateway:id,orders:customer:placed_at",
            "--backend",
            "redb",
            "--log-format",
            "compact",
        ])
        .unwrap();
        let config = cli.into_config();

        assert_eq!(
            config.tables,
            vec![
                TableSchema::new("lambda-apigateway", KeySchema::new("id")),
                TableSchema::new("orders", KeySchema::new("customer").with_sort_key("placed_at")),
            ]
        );
        assert_eq!(config.backend, BackendKind::Redb);
        assert_eq!(config.log_format, LogFormat::Compact);
    }

    #[test]
    fn cli_rejects_malformed_table() {
        assert!(Cli::try_parse_from(["tablegate-lambda", "--table", "orders"]).is_err());
    }

    fn event(payload: Value) -> LambdaEvent<Value> {
        let mut context = Context::default();
        context.request_id = "req-1".to_string();
        LambdaEvent::new(payload, context)
    }

    #[tokio::test]
    async fn handler_unwraps_gateway_body() {
        let router = OperationRouter::new(Arc::new(InMemoryBackend::new()));
        let resp = handle_request(&router, event(json!({"body": r#"{"operation":"ping"}"#})))
            .await
            .unwrap();
        assert_eq!(resp, OperationResponse::Pong);
    }

    #[tokio::test]
    async fn handler_reports_error_kind() {
        let router = OperationRouter::new(Arc::new(InMemoryBackend::new()));
        let err = handle_request(&router, event(json!({"operation": "bogus"})))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), r#"UnrecognizedOperation: unrecognized operation: "bogus""#);
    }
}
