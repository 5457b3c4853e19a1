use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::handlers::{protected, public};
use crate::middleware::session_gate;
use crate::models::{
    Brands, Categories, Clients, Equipment, JobPositions, PersonnelMembers, Products, Resource, Services, Suppliers,
};
use crate::state::AppState;

/// The full router: public routes, the resource API and the session gate in
/// front of all of it, including the fallback.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .merge(public_routes())
        .merge(resource_routes::<Clients>("clients"))
        .merge(resource_routes::<Suppliers>("suppliers"))
        .merge(resource_routes::<Services>("services"))
        .merge(resource_routes::<JobPositions>("job-positions"))
        .merge(resource_routes::<Brands>("brands"))
        .merge(resource_routes::<Categories>("categories"))
        .merge(resource_routes::<Products>("products"))
        .merge(resource_routes::<Equipment>("equipment"))
        .merge(resource_routes::<PersonnelMembers>("personnel"))
        .merge(personnel_routes())
        .route("/api/profile", get(protected::profile::get).patch(protected::profile::update))
        .fallback(public::system::not_found)
        .layer(from_fn_with_state(state.clone(), session_gate))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    use public::{auth, system};

    Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .route("/api/health", get(system::health))
        .route("/auth/login", post(auth::login))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/callback", get(auth::callback))
}

fn resource_routes<R: Resource>(path: &str) -> Router<AppState> {
    use protected::resource;

    Router::new()
        .route(
            &format!("/api/{}", path),
            get(resource::list::<R>).post(resource::create::<R>),
        )
        .route(
            &format!("/api/{}/:id", path),
            get(resource::get::<R>)
                .patch(resource::update::<R>)
                .delete(resource::delete::<R>),
        )
}

fn personnel_routes() -> Router<AppState> {
    use protected::personnel;

    Router::new()
        .route(
            "/api/personnel/:id/positions",
            get(personnel::list).post(personnel::assign),
        )
        .route(
            "/api/personnel/:id/positions/:assignment_id",
            delete(personnel::unassign),
        )
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins = &config.security.cors_origins;
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
}
