use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use grimoire_api::auth::{self, AppState, AppStateInner};
use grimoire_api::middleware::require_auth;
use grimoire_api::{characters, compendium, encounters};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "grimoire_server=debug,grimoire_api=debug,grimoire_db=debug,tower_http=debug"
                        .into()
                }),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("GRIMOIRE_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("GRIMOIRE_DB_PATH").unwrap_or_else(|_| "grimoire.db".into());
    let host = std::env::var("GRIMOIRE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("GRIMOIRE_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database
    let db = grimoire_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let app_state: AppState = Arc::new(AppStateInner { db, jwt_secret });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(app_state.clone());

    let protected_routes = Router::new()
        .route("/characters", get(characters::list_characters))
        .route("/characters", post(characters::create_character))
        .route("/characters/{id}", get(characters::get_character))
        .route("/characters/{id}", put(characters::update_character))
        .route("/characters/{id}", delete(characters::delete_character))
        .route("/monsters", get(compendium::list_monsters))
        .route("/monsters/{id}", get(compendium::get_monster))
        .route("/spells", get(compendium::list_spells))
        .route("/spells/{slug}", get(compendium::get_spell))
        .route("/encounters", get(encounters::list_encounters))
        .route("/encounters", post(encounters::create_encounter))
        .route("/encounters/{id}", get(encounters::get_encounter))
        .route("/encounters/{id}", put(encounters::update_encounter))
        .route("/encounters/{id}", delete(encounters::delete_encounter))
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ))
        .with_state(app_state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Grimoire server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
