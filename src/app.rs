use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::get,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::config::SecurityConfig;
use crate::handlers;
use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Full router with the global layers configured from `state.config`
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let mut router = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .merge(client_routes())
        .merge(phone_routes())
        .merge(address_routes())
        .merge(order_routes())
        .merge(delivery_routes())
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    if config.security.enable_cors {
        router = router.layer(cors_layer(&config.security));
    }

    router
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

fn client_routes() -> Router<AppState> {
    use handlers::client;

    Router::new()
        .route("/clientes", get(client::list).post(client::create))
        .route(
            "/clientes/:id",
            get(client::get).put(client::update).delete(client::delete),
        )
}

fn phone_routes() -> Router<AppState> {
    use axum::routing::put;
    use handlers::phone;

    Router::new()
        .route("/clientes/:id/telefones", get(phone::list).post(phone::create))
        .route("/telefones/:id", put(phone::update).delete(phone::delete))
}

fn address_routes() -> Router<AppState> {
    use axum::routing::put;
    use handlers::address;

    Router::new()
        .route("/clientes/:id/enderecos", get(address::list).post(address::create))
        .route("/enderecos/:id", put(address::update).delete(address::delete))
}

fn order_routes() -> Router<AppState> {
    use handlers::order;

    Router::new()
        .route("/pedidos", get(order::list).post(order::create))
        .route(
            "/pedidos/:id",
            get(order::get).put(order::update).delete(order::delete),
        )
}

fn delivery_routes() -> Router<AppState> {
    use handlers::delivery;

    Router::new()
        .route("/entregas", get(delivery::list).post(delivery::create))
        .route(
            "/entregas/:id",
            get(delivery::get).put(delivery::update).delete(delivery::delete),
        )
}
