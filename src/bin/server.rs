use std::{env, fs::OpenOptions, net::SocketAddr, process::exit, sync::Arc};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use time::Duration;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{
    EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt,
};

use expense_tracker::{
    AppState, ImageStore, UPLOADS_PATH, build_router, graceful_shutdown, logging_middleware,
};

/// The REST API server for the expense tracker.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The port to serve the API from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// The canonical name of the server's timezone, e.g. "Pacific/Auckland".
    ///
    /// Used to work out the current date for the dashboard and spending alerts.
    #[arg(long, default_value = "Etc/UTC")]
    timezone: String,

    /// The directory uploaded profile images are saved to.
    #[arg(long, default_value = "uploads")]
    upload_dir: String,

    /// How long auth tokens stay valid, in minutes.
    #[arg(long, default_value_t = 60)]
    token_duration: i64,

    /// File path for the debug log.
    #[arg(long, default_value = "debug.log")]
    log_path: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    setup_logging(&args.log_path);

    if time_tz::timezones::get_by_name(&args.timezone).is_none() {
        eprintln!(
            "\"{}\" is not a valid canonical timezone name, e.g. \"Pacific/Auckland\".",
            args.timezone
        );
        exit(1);
    }

    if args.token_duration <= 0 {
        eprintln!("The token duration must be a positive number of minutes.");
        exit(1);
    }

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));

    let secret = env::var("SECRET").expect("The environment variable 'SECRET' must be set");

    let conn = Connection::open(&args.db_path).expect("Could not open the database.");
    let app_state = AppState::new(
        conn,
        &secret,
        &args.timezone,
        ImageStore::new(&args.upload_dir, UPLOADS_PATH),
    )
    .expect("Could not initialize the database.")
    .with_token_duration(Duration::minutes(args.token_duration));

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = build_router(app_state).layer(middleware::from_fn(logging_middleware));
    let router = add_tracing_layer(router);

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .expect("Server stopped unexpectedly.");
}

fn setup_logging(log_path: &str) {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .expect("Could not create log file");

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    // RUST_LOG overrides the default levels, e.g. `RUST_LOG=expense_tracker=trace`.
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            stdout_log
                .with_filter(filter::LevelFilter::INFO)
                .and_then(debug_log)
                .with_filter(filter::LevelFilter::DEBUG),
        )
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are logged where they are handled, so skip the default 5xx logging.
        .on_failure(());

    router.layer(tracing_layer)
}
