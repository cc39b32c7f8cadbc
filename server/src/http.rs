use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::State,
    http::{self, HeaderName, HeaderValue, Method},
    response::{Html, IntoResponse},
    routing::get,
};
use platform_db::DbPool;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::{config::AppConfig, employees};

const LANDING_PAGE: &str = r#"<!DOCTYPE html>
<html>
    <head>
        <title>Employee registry</title>
    </head>
    <body>
        <h1>Web API for handling the list of employees</h1>
        <ul>
            <li><code>POST /new_employee</code> create an employee card</li>
            <li><code>GET /employees</code> list all employees</li>
            <li><code>GET /employees/{personnel_number}</code> find by personnel number</li>
            <li><code>GET /employees/{surname}/{name}/{patronymic}</code> find by full name</li>
            <li><code>PATCH /employees/{personnel_number}</code> update some fields</li>
            <li><code>DELETE /employee/{personnel_number}</code> delete an employee</li>
        </ul>
    </body>
</html>
"#;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<AppConfig>,
}

#[derive(Clone, Debug)]
pub struct ServeConfig {
    addr: SocketAddr,
}

impl ServeConfig {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::from((host, port)),
        }
    }
}

pub async fn serve(config: ServeConfig, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    info!(%config.addr, "employee registry listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    let allow_origin = if allowed.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed)
    };
    CorsLayer::new()
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_origin(allow_origin)
}

pub fn build_router(state: AppState) -> Router {
    let request_id = MakeRequestUuid;
    let header_name = HeaderName::from_static("x-request-id");
    Router::new()
        .route("/", get(landing_handler))
        .route("/health", get(health_handler))
        .merge(employees::routes())
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), request_id))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.cors_allowed_origins)),
        )
        .with_state(state)
}

async fn landing_handler() -> Html<&'static str> {
    Html(LANDING_PAGE)
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let db_ok = platform_db::ping(&state.pool).await;
    Json(HealthResponse {
        ok: db_ok,
        db_ok,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    db_ok: bool,
    version: &'static str,
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    };
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{
        body::Body,
        http::{Request, StatusCode, header::CONTENT_TYPE},
    };
    use http_body_util::BodyExt;
    use migration::{Migrator, MigratorTrait};
    use platform_db::DatabaseSettings;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;

    async fn test_router() -> Router {
        let database = DatabaseSettings {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            connect_timeout: Duration::from_secs(5),
        };
        let pool = platform_db::connect(&database).await.unwrap();
        Migrator::up(&pool, None).await.unwrap();
        let config = AppConfig {
            database,
            cors_allowed_origins: Vec::new(),
        };
        build_router(AppState {
            pool,
            config: Arc::new(config),
        })
    }

    async fn send(
        router: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    fn card(personnel_number: i32) -> Value {
        json!({
            "surname": "Petrov",
            "name": "Petr",
            "patronymic": "Petrovich",
            "year_of_birth": 1979,
            "personnel_number": personnel_number,
            "salary": 2100.0,
            "position": "Storekeeper",
            "legal_entity": "Acme LLC",
            "structural_subdivision": "Warehouse"
        })
    }

    #[tokio::test]
    async fn landing_page_and_health_respond() {
        let router = test_router().await;
        let (status, body) = send(&router, Method::GET, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_str().unwrap().contains("/new_employee"));

        let (status, body) = send(&router, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["db_ok"], json!(true));
    }

    #[tokio::test]
    async fn create_then_lookup_and_conflict_on_duplicate() {
        let router = test_router().await;
        let (status, body) = send(&router, Method::POST, "/new_employee", Some(card(42))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["personnel_number"], json!(42));
        let created_id = body["created_id"].clone();

        let (status, body) = send(&router, Method::POST, "/new_employee", Some(card(42))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["code"], json!("CONFLICT"));

        let (status, body) = send(&router, Method::GET, "/employees/42", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["personnel_number"], json!(42));
        assert_eq!(body["employee"]["id"], created_id);
        assert_eq!(body["employee"]["position"], json!("Storekeeper"));

        let (status, body) = send(&router, Method::GET, "/employees", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["employees"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_input_is_unprocessable() {
        let router = test_router().await;
        let mut too_old = card(1);
        too_old["year_of_birth"] = json!(1900);
        let (status, body) = send(&router, Method::POST, "/new_employee", Some(too_old)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], json!("INVALID_INPUT"));

        let (status, _) = send(
            &router,
            Method::POST,
            "/new_employee",
            Some(json!({"surname": "Petrov"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send(&router, Method::GET, "/employees/abc", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send(&router, Method::GET, "/employees/5", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn patch_changes_only_supplied_fields() {
        let router = test_router().await;
        send(&router, Method::POST, "/new_employee", Some(card(7))).await;

        let (status, body) = send(
            &router,
            Method::PATCH,
            "/employees/7",
            Some(json!({"salary": 5000.0})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["personnel_number"], json!(7));
        assert_eq!(body["updated_fields"], json!({"salary": 5000.0}));

        let (_, body) = send(&router, Method::GET, "/employees/7", None).await;
        assert_eq!(body["employee"]["salary"], json!(5000.0));
        assert_eq!(body["employee"]["year_of_birth"], json!(1979));
        assert_eq!(body["employee"]["surname"], json!("Petrov"));

        let (status, _) = send(
            &router,
            Method::PATCH,
            "/employees/8",
            Some(json!({"salary": 1.0})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn full_name_lookup_needs_exact_triple() {
        let router = test_router().await;
        send(&router, Method::POST, "/new_employee", Some(card(3))).await;

        let (status, body) =
            send(&router, Method::GET, "/employees/Petrov/Petr/Petrovich", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["employee"]["personnel_number"], json!(3));

        let (status, body) =
            send(&router, Method::GET, "/employees/Petrov/Petr/Ivanovich", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body["detail"],
            json!("employee with full name Petrov Petr Ivanovich not found")
        );
    }

    #[tokio::test]
    async fn delete_succeeds_once() {
        let router = test_router().await;
        let (status, _) = send(&router, Method::DELETE, "/employee/99", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        send(&router, Method::POST, "/new_employee", Some(card(99))).await;
        let (status, body) = send(&router, Method::DELETE, "/employee/99", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["personnel_number"], json!(99));
        assert_eq!(body["deleted_employee"]["surname"], json!("Petrov"));

        let (status, _) = send(&router, Method::DELETE, "/employee/99", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
