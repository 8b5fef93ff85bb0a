use std::path::PathBuf;

use clap::{Parser, Subcommand};
use folio::{seed, settings, storage, tokens, web};
use migration::{Migrator, MigratorTrait};
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "folio",
    version,
    about = "Professional profile backend with role/authority access control"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply migrations, sync the configured seed file and start the API (default)
    Serve,
    /// Apply pending migrations and exit
    Migrate,
    /// Apply migrations, then sync roles and users from a KDL seed file
    Seed {
        /// Seed file to apply
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // logging
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    // load settings
    let settings = settings::Settings::load(&cli.config)?;
    tracing::info!(?settings, "Loaded configuration");

    // init storage (database) and bring the schema up to date
    let db = storage::init(&settings.database).await?;
    Migrator::up(&db, None).await.into_diagnostic()?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Migrate => {
            tracing::info!("Migrations applied");
        }
        Command::Seed { file } => {
            seed::seed_from_file(&db, &file).await?;
        }
        Command::Serve => {
            if let Some(path) = settings.seed.path.clone() {
                seed::seed_from_file(&db, &path).await?;
            }

            // load or generate the token signing key
            let signer =
                tokens::TokenSigner::new(settings.keys.clone(), settings.tokens.clone()).await?;

            web::serve(settings, db, signer).await?;
        }
    }
    Ok(())
}
