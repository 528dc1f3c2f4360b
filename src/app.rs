use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::auth::{MemorySessionStore, PgSessionStore, SessionStore};
use crate::config::{AppConfig, StoreBackend};
use crate::courses::{
    postgres, CourseStore, EnrollmentStore, MemoryCourseStore, MemoryEnrollmentStore, PgCourseStore,
    PgEnrollmentStore,
};
use crate::handlers;
use crate::middleware;
use crate::throttle::{MemoryCounterStore, Rate, RateLimiter, ThrottleError};

/// Everything a request needs, injected once at startup
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub courses: Arc<dyn CourseStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub enrollments: Arc<dyn EnrollmentStore>,
    pub limiter: Option<Arc<RateLimiter>>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        courses: Arc<dyn CourseStore>,
        sessions: Arc<dyn SessionStore>,
        enrollments: Arc<dyn EnrollmentStore>,
    ) -> Result<Self, ThrottleError> {
        let limiter = if config.api.enable_rate_limiting {
            let rate: Rate = config.api.rate_limit.parse()?;
            let store = Arc::new(MemoryCounterStore::new(config.api.rate_limit_max_entries));
            Some(Arc::new(RateLimiter::new(rate, store)))
        } else {
            None
        };

        Ok(Self {
            config: Arc::new(config),
            courses,
            sessions,
            enrollments,
            limiter,
        })
    }

    /// State backed entirely by in-process mock stores
    pub fn in_memory(config: AppConfig) -> Result<Self, ThrottleError> {
        Self::new(
            config,
            Arc::new(MemoryCourseStore::new()),
            Arc::new(MemorySessionStore::new()),
            Arc::new(MemoryEnrollmentStore::new()),
        )
    }

    /// Swap in a different throttle counter backend
    pub fn with_limiter(mut self, limiter: Option<Arc<RateLimiter>>) -> Self {
        self.limiter = limiter;
        self
    }

    /// Build stores for the configured backend
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        match &config.store.backend {
            StoreBackend::Memory => {
                info!("Using in-memory course, session and enrollment stores");
                Ok(Self::in_memory(config)?)
            }
            StoreBackend::Postgres { url, max_connections } => {
                let pool = postgres::connect(url, *max_connections).await?;
                let courses = PgCourseStore::new(pool.clone()).await?;
                let sessions = PgSessionStore::new(pool.clone()).await?;
                let enrollments = PgEnrollmentStore::new(pool).await?;
                info!("Using Postgres course, session and enrollment stores");
                Ok(Self::new(
                    config,
                    Arc::new(courses),
                    Arc::new(sessions),
                    Arc::new(enrollments),
                )?)
            }
        }
    }
}

pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    // Authenticate before throttling so anonymous calls never spend quota
    let programs = Router::new()
        .route(
            "/api/programs/v1/metadata/*course_id",
            get(handlers::programs::metadata_get).post(handlers::programs::metadata_post),
        )
        .route("/api/programs/v1/program-lookup", get(handlers::programs::lookup_list))
        .route("/api/programs/v1/program-lookup/", get(handlers::programs::lookup_list))
        .route_layer(
            ServiceBuilder::new()
                .layer(from_fn_with_state(state.clone(), middleware::authenticate))
                .layer(from_fn_with_state(state.clone(), middleware::throttle)),
        );

    let mut router = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .merge(programs)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    if config.security.enable_cors {
        router = router.layer(cors_layer(&config.security.cors_origins));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-csrftoken"),
        ])
        .allow_credentials(true)
}
