//! filigate operator entry point.
//!
//! Runs migrations and answers access questions against a live database,
//! using the same gate request handlers go through.

use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use filigate_access::{AccessConfig, AccessError, AccessService};
use filigate_db::{DbConfig, DbError, DbManager};
use serde_json::json;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "filigate")]
#[command(about = "Tenant, schema and branch-scope access checks")]
struct Cli {
    #[command(flatten)]
    db: DbArgs,

    /// Most branch codes honoured from one --branches list
    #[arg(long, env = "FILIGATE_MAX_REQUESTED_BRANCHES", default_value_t = 500)]
    max_requested_branches: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct DbArgs {
    /// SurrealDB WebSocket address
    #[arg(long = "db-url", env = "FILIGATE_DB_URL", default_value = "127.0.0.1:8000")]
    url: String,

    #[arg(long = "db-namespace", env = "FILIGATE_DB_NAMESPACE", default_value = "filigate")]
    namespace: String,

    #[arg(long = "db-database", env = "FILIGATE_DB_DATABASE", default_value = "main")]
    database: String,

    #[arg(long = "db-user", env = "FILIGATE_DB_USER", default_value = "root")]
    username: String,

    #[arg(
        long = "db-password",
        env = "FILIGATE_DB_PASSWORD",
        default_value = "root",
        hide_env_values = true
    )]
    password: String,
}

impl From<DbArgs> for DbConfig {
    fn from(args: DbArgs) -> Self {
        DbConfig {
            url: args.url,
            namespace: args.namespace,
            database: args.database,
            username: args.username,
            password: args.password,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending schema migrations
    Migrate,

    /// Check whether an identity may open a schema
    CheckSchema {
        #[arg(long)]
        identity: Uuid,
        #[arg(long)]
        schema: String,
    },

    /// Print the branch filter a request would run with
    Scope {
        #[arg(long)]
        identity: Uuid,
        #[arg(long)]
        schema: String,
        /// Comma-separated branch codes, or "all"
        #[arg(long)]
        branches: Option<String>,
    },

    /// List the active tenants an identity can switch to
    Tenants {
        #[arg(long)]
        identity: Uuid,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("filigate=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Access(AccessError::Denied)) => {
            println!("denied");
            ExitCode::from(1)
        }
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let manager = DbManager::connect(&cli.db.into()).await?;

    if let Command::Migrate = cli.command {
        manager.migrate().await?;
        info!("migrations applied");
        return Ok(());
    }

    let stores = manager.stores();
    let service = AccessService::new(
        stores.profiles,
        stores.tenants,
        stores.tenant_grants,
        stores.branches,
        stores.branch_grants,
        AccessConfig {
            max_requested_branches: cli.max_requested_branches,
        },
    );

    match cli.command {
        Command::Migrate => {}
        Command::CheckSchema { identity, schema } => {
            if !service.can_access_schema(identity, &schema).await? {
                return Err(AccessError::Denied.into());
            }
            println!("allowed");
        }
        Command::Scope {
            identity,
            schema,
            branches,
        } => {
            let requested = service.parse_requested(branches.as_deref());
            let scope = service
                .authorize_query(identity, &schema, &requested)
                .await?;
            let out = json!({
                "tenant_id": scope.tenant.id,
                "schema": scope.tenant.schema_name,
                "basis": scope.basis,
                "branches": scope.filter,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Command::Tenants { identity } => {
            let tenants = service.list_accessible_tenants(identity).await?;
            println!("{}", serde_json::to_string_pretty(&tenants)?);
        }
    }

    Ok(())
}
