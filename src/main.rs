use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use apartment_booking::config::AppConfig;
use apartment_booking::db;
use apartment_booking::db::backup::spawn_daily_backups;
use apartment_booking::handlers;
use apartment_booking::services::clock::{Clock, SystemClock};
use apartment_booking::services::mail::smtp::SmtpMailer;
use apartment_booking::services::mail::Mailer;
use apartment_booking::services::notifications::Notifier;
use apartment_booking::services::payment::swish::SwishGateway;
use apartment_booking::services::payment::PaymentGateway;
use apartment_booking::services::reservation::{ReservationService, ReservationSettings};
use apartment_booking::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let store = Arc::new(db::init_store(&config.bookings_file).await?);

    let payments: Option<Arc<dyn PaymentGateway>> = match SwishGateway::from_config(&config)? {
        Some(gateway) => {
            tracing::info!("using Swish payments (api: {})", config.swish_api_url);
            Some(Arc::new(gateway))
        }
        None => {
            tracing::warn!("SWISH_CERT_PATH not set, only manual bookings are possible");
            None
        }
    };

    let mailer: Option<Arc<dyn Mailer>> = match SmtpMailer::from_config(&config)? {
        Some(mailer) => {
            tracing::info!("sending mail via {}:{}", config.smtp_host, config.smtp_port);
            Some(Arc::new(mailer))
        }
        None => {
            tracing::warn!("SMTP_HOST not set, booking mail is disabled");
            None
        }
    };
    let notifier = Notifier::new(
        mailer,
        config.admin_email.clone(),
        config.apartment_name.clone(),
        config.daily_rate,
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let reservations = ReservationService::new(
        Arc::clone(&store),
        payments,
        notifier,
        Arc::clone(&clock),
        ReservationSettings::from_config(&config),
    );

    spawn_daily_backups(
        config.bookings_file.clone(),
        config.backup_dir.clone(),
        config.backup_keep,
        config.backup_hour,
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        store,
        reservations,
        clock,
    });

    let mut app = handlers::router(state)
        .fallback_service(ServeDir::new(&config.public_dir))
        .layer(TraceLayer::new_for_http());
    if !config.production {
        // local frontend dev servers run on another port
        app = app.layer(CorsLayer::very_permissive());
    }

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
