use std::sync::Arc;

use gatehouse::config::{init_db, Config};
use gatehouse::modules::auth::crud::{MySqlAuthStore, MySqlTokenStore};
use gatehouse::modules::auth::guard::RouteTable;
use gatehouse::modules::auth::interface::Mailer;
use gatehouse::modules::auth::session::SessionService;
use gatehouse::modules::auth::tokens::TokenService;
use gatehouse::services::jwt::JwtService;
use gatehouse::services::mailer::{HttpMailer, LogMailer};
use gatehouse::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatehouse=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Failed to load environment configuration");

    let db = init_db(&config.database_url)
        .await
        .expect("Failed to connect to MySQL");
    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .expect("Failed to run migrations");
    tracing::info!("Connected to MySQL");

    let store = Arc::new(MySqlAuthStore::new(db.clone()));
    let jwt_service = JwtService::new(config.jwt_secret, config.session_ttl_secs);

    let mailer: Arc<dyn Mailer> = match config.mail {
        Some(mail) => Arc::new(HttpMailer::new(
            mail.api_url,
            mail.api_key,
            mail.from,
            config.base_url,
        )),
        None => {
            tracing::warn!("MAIL_API_KEY not set, emails will only be logged");
            Arc::new(LogMailer)
        }
    };

    let tokens = TokenService::new(
        Arc::new(MySqlTokenStore::verification(db.clone())),
        Arc::new(MySqlTokenStore::password_reset(db.clone())),
        Arc::new(MySqlTokenStore::two_factor(db.clone())),
        config.token_ttls,
    );

    let sessions = SessionService::new(jwt_service, store.clone(), store.clone(), store.clone());

    let state = AppState {
        users: store.clone(),
        accounts: store.clone(),
        confirmations: store,
        tokens,
        mailer,
        sessions,
        routes: RouteTable::for_api_server(),
    };

    let app = gatehouse::create_app(state).await;

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000")
        .await
        .expect("Failed to bind 0.0.0.0:3000");
    tracing::info!("Server running on http://localhost:3000");
    axum::serve(listener, app).await.expect("Server error");
}
