//! Example consumer: a host application that mounts the autoadmin routers over its own models.
//!
//! Run from repo root: `cargo run -p example-consumer -- serve`
//! Create the first account: `cargo run -p example-consumer -- create-superuser --username admin --email admin@example.com`

mod models;

use autoadmin::{admin_router, connect, create_superuser, init_tracing, AdminConfig, AppState};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use tokio::net::TcpListener;

/// Discovery roots used when `ADMIN_DISCOVERY_ROOTS` is not set.
const DEFAULT_ROOTS: &[&str] = &["example_consumer::models", "autoadmin::auth"];

#[derive(Parser)]
#[command(name = "example-consumer", about = "Admin interface over the demo models")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the admin (default).
    Serve,
    /// Create an active superuser. The secret is read twice from stdin.
    CreateSuperuser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
    },
}

fn prompt(label: &str) -> std::io::Result<String> {
    print!("{}: ", label);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = AdminConfig::load()?;
    init_tracing(&config.log_level);
    if config.discovery_roots.is_empty() {
        config.discovery_roots = DEFAULT_ROOTS.iter().map(|r| r.to_string()).collect();
    }

    let pool = connect(&config.database_url).await?;
    let bind_addr = config.bind_addr.clone();
    let (state, report) = AppState::build(pool, config).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::CreateSuperuser { username, email } => {
            let secret = prompt("Password")?;
            let confirmation = prompt("Password (again)")?;
            let auth = &state.auth;
            let identity = create_superuser(
                auth.users().as_ref(),
                auth.hasher().as_ref(),
                &username,
                &email,
                &secret,
                &confirmation,
            )
            .await?;
            println!("Superuser '{}' created (id {}).", identity.username, identity.id);
        }
        Command::Serve => {
            for failure in &report.failures {
                tracing::warn!(error = %failure, "discovery failure");
            }
            tracing::info!(models = ?report.registered, "models registered");
            let app = admin_router(state);
            let listener = TcpListener::bind(&bind_addr).await?;
            tracing::info!("admin listening on http://{}/admin", listener.local_addr()?);
            axum::serve(listener, app).await?;
        }
    }
    Ok(())
}
