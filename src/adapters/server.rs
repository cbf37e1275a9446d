use crate::adapters::http::ReqwestUpstreamClient;
use crate::core::courses::CourseQueryHandler;
use crate::core::{ConfigProvider, CourseQuery, CourseSummary, CredentialDefaults, UpstreamClient};
use crate::utils::error::{RelayError, Result};
use axum::body::Bytes;
use axum::extract::{RawQuery, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Builds the relay's router around an injected handler.
pub fn router<U: UpstreamClient + 'static>(
    handler: CourseQueryHandler<U>,
    static_dir: impl AsRef<Path>,
) -> Router {
    let index = static_dir.as_ref().join("index.html");

    Router::new()
        .route_service("/", ServeFile::new(index))
        .route("/api/courses", get(list_courses::<U>).post(list_courses::<U>))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(handler))
}

/// 瀏覽器擴充功能的 origin 無法預先列舉
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

async fn list_courses<U: UpstreamClient + 'static>(
    State(handler): State<Arc<CourseQueryHandler<U>>>,
    method: Method,
    RawQuery(raw_query): RawQuery,
    body: Bytes,
) -> std::result::Result<Json<Vec<CourseSummary>>, RelayError> {
    // POST 只讀 body，不解析 query string
    let query = if method == Method::GET {
        raw_query
            .as_deref()
            .map(CourseQuery::from_query_string)
            .unwrap_or_default()
    } else {
        CourseQuery::default()
    };
    let courses = handler.handle(&method, &body, &query).await?;
    Ok(Json(courses))
}

pub struct RelayServer {
    handler: CourseQueryHandler<ReqwestUpstreamClient>,
    listen_addr: String,
    static_dir: String,
}

impl RelayServer {
    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let client =
            ReqwestUpstreamClient::new(config.timeout_seconds().map(Duration::from_secs))?;
        let defaults = CredentialDefaults {
            api_key: config.default_api_key().map(|k| k.to_string()),
            api_base_url: config.api_base_url().to_string(),
        };

        Ok(Self {
            handler: CourseQueryHandler::new(client, defaults),
            listen_addr: config.listen_addr(),
            static_dir: config.static_dir().to_string(),
        })
    }

    pub async fn start(self) -> Result<()> {
        let listener = TcpListener::bind(&self.listen_addr)
            .await
            .map_err(|e| RelayError::ServerError(format!("bind {}: {}", self.listen_addr, e)))?;

        let local_addr = listener
            .local_addr()
            .map_err(|e| RelayError::ServerError(e.to_string()))?;
        tracing::info!(
            "🚀 Course relay listening on http://{} (upstream default: {})",
            local_addr,
            self.handler.defaults().api_base_url
        );

        let app = router(self.handler, &self.static_dir);
        axum::serve(listener, app)
            .await
            .map_err(|e| RelayError::ServerError(e.to_string()))?;

        Ok(())
    }
}
