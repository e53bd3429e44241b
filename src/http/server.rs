//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum router with a single catch-all dispatch handler
//! - Wire up middleware (panic recovery, timeout, body limit, request ID, tracing)
//! - Classify each request and run its group's pipeline
//! - Hand the request to the static, API, module, SSR or HMR handler
//! - Render every handler failure as the 500 page
//!
//! # Design Decisions
//! - `handle_request` is the single failure boundary; nothing it returns
//!   can stop the accept loop
//! - Config, pipelines and routes are frozen before the server is built

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ws::WebSocketUpgrade, FromRequestParts, State},
    http::{request::Parts, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::controller::{ApiRequest, Dispatch, RouteDispatcher};
use crate::error::HandlerError;
use crate::http::dist::serve_dist;
use crate::http::request::{request_id_of, RequestContext, RequestUuid};
use crate::http::response::{error_response, html_response, panic_response};
use crate::http::static_files::serve_file;
use crate::http::websocket::{self, HmrContext};
use crate::lifecycle::Shutdown;
use crate::net::connection::ConnectionTracker;
use crate::observability::metrics;
use crate::pipeline::registry::API_GROUP;
use crate::project::{Location, Project};
use crate::routing::path::normalize;
use crate::routing::{DispatchDecision, Router as DispatchRouter};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub router: Arc<DispatchRouter>,
    pub project: Arc<dyn Project>,
    pub dispatcher: Arc<dyn Dispatch>,
    pub sessions: ConnectionTracker,
    pub shutdown: Shutdown,
}

impl AppState {
    fn hmr_context(&self) -> HmrContext {
        let settings = self.config.settings();
        HmrContext {
            project: Arc::clone(&self.project),
            base_url: settings.paths.base_url.clone(),
            dist_prefix: settings.dispatch.dist_prefix.clone(),
            sessions: self.sessions.clone(),
        }
    }
}

/// HTTP server for the application.
pub struct HttpServer {
    state: AppState,
}

impl HttpServer {
    /// Create a server over a frozen config and a project.
    pub fn new(config: Arc<ServerConfig>, project: Arc<dyn Project>) -> Self {
        let router = Arc::new(config.router());
        Self {
            state: AppState {
                config,
                router,
                project,
                dispatcher: Arc::new(RouteDispatcher),
                sessions: ConnectionTracker::new(),
                shutdown: Shutdown::new(),
            },
        }
    }

    /// Replace the controller dispatcher.
    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn Dispatch>) -> Self {
        self.state.dispatcher = dispatcher;
        self
    }

    /// Use an existing shutdown coordinator.
    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.state.shutdown = shutdown;
        self
    }

    /// Handle for stopping the server and every HMR session.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.state.shutdown.clone()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }

    /// Open HMR sockets.
    pub fn hmr_sessions(&self) -> &ConnectionTracker {
        &self.state.sessions
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn router(&self) -> Router {
        let settings = self.state.config.settings();
        Router::new()
            .route("/", any(dispatch_handler))
            .route("/{*path}", any(dispatch_handler))
            .with_state(self.state.clone())
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(TimeoutLayer::new(Duration::from_secs(settings.timeouts.request_secs)))
            .layer(RequestBodyLimitLayer::new(settings.limits.max_body_size))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(RequestUuid))
    }

    /// Serve on `listener` until the shutdown handle fires.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        let app = self.router();
        let shutdown = self.state.shutdown.notified();

        tracing::info!(address = %addr, dev = self.state.config.is_dev(), "Server ready on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("Draining connections");
            })
            .await?;

        tracing::info!(
            hmr_sessions = self.state.sessions.active_count(),
            oldest_session = ?self.state.sessions.oldest_age(),
            "HTTP server stopped"
        );
        Ok(())
    }
}

/// Catch-all handler: classify, gate, dispatch, and contain failures.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();
    let decision = state.router.resolve(parts.uri.path()).await;
    let class = decision.kind();

    let request_id = request_id_of(&parts.headers);
    tracing::debug!(
        request_id = %request_id,
        method = %parts.method,
        path = %parts.uri.path(),
        decision = class,
        "Request classified"
    );

    let response = match handle_request(&state, decision, parts, body).await {
        Ok(response) => response,
        Err(e) => error_response(&e, &request_id),
    };

    metrics::record_request(class, response.status().as_u16(), start);
    response
}

/// Produce the response for one classified request.
pub async fn handle_request(
    state: &AppState,
    decision: DispatchDecision,
    parts: Parts,
    body: Body,
) -> Result<Response, HandlerError> {
    let pathname = match &decision {
        DispatchDecision::Api(p) | DispatchDecision::Module(p) | DispatchDecision::Ssr(p) => p.clone(),
        DispatchDecision::StaticFile(_) | DispatchDecision::Hmr => normalize(parts.uri.path()),
    };
    let context = RequestContext::from_parts(&parts, pathname);
    if let Some(group) = decision.group() {
        state.config.pipelines().run(group, &context)?;
    }

    match decision {
        DispatchDecision::StaticFile(path) => serve_file(&path, &parts.headers).await,
        DispatchDecision::Api(pathname) => {
            let limit = state.config.settings().limits.max_body_size;
            let body = axum::body::to_bytes(body, limit).await?;
            let routes = state.config.routes();
            let target = routes
                .lookup(API_GROUP, &context.method, &pathname)
                .or_else(|| {
                    let stripped = state.router.api_prefix().strip(&pathname)?;
                    routes.lookup(API_GROUP, &context.method, stripped)
                });
            state
                .dispatcher
                .dispatch(target, ApiRequest { context, body })
                .await
        }
        DispatchDecision::Module(pathname) => {
            let dist_prefix = &state.config.settings().dispatch.dist_prefix;
            if let Some(response) =
                serve_dist(state.project.as_ref(), dist_prefix, &pathname, &parts.headers).await?
            {
                return Ok(response);
            }
            render_page(state, &context).await
        }
        DispatchDecision::Ssr(_) => render_page(state, &context).await,
        DispatchDecision::Hmr => Ok(hmr_upgrade(state, parts).await),
    }
}

async fn hmr_upgrade(state: &AppState, mut parts: Parts) -> Response {
    match WebSocketUpgrade::from_request_parts(&mut parts, state).await {
        Ok(ws) => websocket::upgrade(ws, state.hmr_context(), state.shutdown.subscribe()),
        Err(rejection) => rejection.into_response(),
    }
}

async fn render_page(state: &AppState, context: &RequestContext) -> Result<Response, HandlerError> {
    let location = Location::new(context.pathname.clone(), context.search.clone());
    let (status, html) = state.project.page_html(&location).await?;
    Ok(html_response(status, html))
}
