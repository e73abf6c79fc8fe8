use clap::Parser;
use color_eyre::eyre::{ensure, WrapErr};
use topic_quiz::{db::Db, models::QuestionBank, names, AppState};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// libSQL database: `file:<path>` for a local file, otherwise a server URL.
    #[arg(long, env)]
    database_url: String,

    /// libSQL authentication token for a remote database.
    #[arg(long, env)]
    auth_token: Option<String>,

    /// The address to bind to.
    #[arg(short, long, env, default_value = "127.0.0.1:1414")]
    address: String,

    /// Questions per round.
    #[arg(long, env, default_value_t = names::DEFAULT_BLOCK_SIZE)]
    block_size: usize,

    /// Mark the session cookie `Secure` (serve over HTTPS).
    #[arg(long, env)]
    secure_cookies: bool,

    /// JSON question bank to import on startup.
    #[arg(long, env)]
    seed_file: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "tower_http=debug,topic_quiz=debug".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .init();

    let args = Args::parse();
    ensure!(args.block_size > 0, "block size must be at least 1");

    let db = Db::new(args.database_url, args.auth_token).await?;

    if let Some(path) = args.seed_file {
        let raw = tokio::fs::read_to_string(&path)
            .await
            .wrap_err_with(|| format!("could not read {}", path.display()))?;
        let bank: QuestionBank = serde_json::from_str(&raw).wrap_err("invalid question bank")?;
        db.import_question_bank(bank).await?;
    }

    db.purge_stale_sessions(names::SESSION_MAX_AGE).await?;
    tokio::spawn(purge_sessions_periodically(db.clone()));

    let app = topic_quiz::router(AppState::new(db, args.block_size, args.secure_cookies));

    let address = args.address.parse::<std::net::SocketAddr>()?;
    let listener = tokio::net::TcpListener::bind(address).await?;
    tracing::info!("listening on {address}");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Sweeps session state idle for longer than the cookie lives.
async fn purge_sessions_periodically(db: Db) {
    let mut interval = tokio::time::interval(names::SESSION_PURGE_INTERVAL);
    // The first tick completes immediately; startup already purged.
    interval.tick().await;
    loop {
        interval.tick().await;
        if let Err(e) = db.purge_stale_sessions(names::SESSION_MAX_AGE).await {
            tracing::error!("could not purge stale sessions: {e:?}");
        }
    }
}
