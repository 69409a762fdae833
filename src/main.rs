use anyhow::Context;
use clap::{Parser, Subcommand};
use dialoguer::Input;
use std::sync::Arc;
use tracing::info;

use escolar::auth::{issue_subject_token, verify_subject_token};
use escolar::config::load_dotenv;
use escolar::db::init_db_pool;
use escolar::models::{Email, SubjectId};
use escolar::{
    ChannelAuthProvider, DatabaseConfig, JwtConfig, PgRepository, SessionConfig,
    SessionCoordinator, Subject,
};
use escolar_core::AppError;

#[derive(Parser)]
#[command(name = "escolar")]
#[command(about = "Escolar - identity resolution tools", long_about = None)]
struct Cli {
    /// Print the Prometheus metrics rendering after the command
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a subject against the database and print the session state
    Resolve {
        /// Subject token (takes precedence over --subject-id/--email)
        #[arg(short = 't', long)]
        token: Option<String>,

        /// Subject id (UUID)
        #[arg(short = 's', long)]
        subject_id: Option<String>,

        /// Subject email
        #[arg(short = 'e', long)]
        email: Option<String>,
    },
    /// Print a signed subject token
    IssueToken {
        /// Subject id (UUID)
        #[arg(short = 's', long)]
        subject_id: Option<String>,

        /// Subject email
        #[arg(short = 'e', long)]
        email: Option<String>,
    },
    /// Apply database migrations
    Migrate,
}

#[tokio::main]
async fn main() {
    load_dotenv();
    let cli = Cli::parse();

    if let Err(e) = escolar::observability::init_tracing() {
        eprintln!("Failed to initialize logging: {:#}", e);
    }
    let metrics = if cli.metrics {
        escolar::observability::init_metrics()
    } else {
        None
    };

    let result = match cli.command {
        Commands::Resolve {
            token,
            subject_id,
            email,
        } => resolve(token, subject_id, email).await,
        Commands::IssueToken { subject_id, email } => issue_token(subject_id, email),
        Commands::Migrate => migrate().await,
    };

    if let Some(handle) = metrics {
        println!("{}", handle.render());
    }

    if let Err(e) = result {
        eprintln!("❌ {}", e);
        eprintln!("{}", e.to_json());
        std::process::exit(e.kind.exit_code());
    }
}

async fn resolve(
    token: Option<String>,
    subject_id: Option<String>,
    email: Option<String>,
) -> Result<(), AppError> {
    let subject = match token {
        Some(token) => {
            verify_subject_token(&token, &JwtConfig::from_env()).map_err(AppError::unauthorized)?
        }
        None => prompt_subject(subject_id, email)?,
    };

    let pool = init_db_pool(&DatabaseConfig::from_env())
        .await
        .map_err(AppError::database)?;
    let repo = Arc::new(PgRepository::new(pool));
    let auth = Arc::new(ChannelAuthProvider::with_subject(subject.clone()));

    info!(subject.id = %subject.id, "Resolving subject");
    let session = SessionCoordinator::spawn(repo, auth, SessionConfig::from_env());
    let state = session
        .wait_until(|s| !s.is_loading)
        .await
        .map_err(AppError::internal)?;
    let _ = session.shutdown().await;

    let json = serde_json::to_string_pretty(&state).context("Failed to serialize session state")?;
    println!("{}", json);

    if let Some(block) = &state.block_reason {
        println!("⛔ {}", block);
    }
    Ok(())
}

fn issue_token(subject_id: Option<String>, email: Option<String>) -> Result<(), AppError> {
    let subject = prompt_subject(subject_id, email)?;
    let token =
        issue_subject_token(&subject, &JwtConfig::from_env()).map_err(AppError::internal)?;
    println!("{}", token);
    Ok(())
}

async fn migrate() -> Result<(), AppError> {
    let pool = init_db_pool(&DatabaseConfig::from_env())
        .await
        .map_err(AppError::database)?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")
        .map_err(AppError::database)?;

    println!("✅ Migrations applied");
    Ok(())
}

/// Builds a subject from flags, prompting for whatever is missing.
fn prompt_subject(subject_id: Option<String>, email: Option<String>) -> Result<Subject, AppError> {
    let subject_id = match subject_id {
        Some(id) => id,
        None => Input::<String>::new()
            .with_prompt("Subject id")
            .interact_text()
            .context("Failed to read subject id")?,
    };
    let email = match email {
        Some(email) => email,
        None => Input::<String>::new()
            .with_prompt("Email")
            .interact_text()
            .context("Failed to read email")?,
    };

    let id: SubjectId = subject_id
        .trim()
        .parse()
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid subject id: {}", e)))?;
    let email = Email::new(email).map_err(AppError::bad_request)?;

    Ok(Subject::new(id, email))
}
