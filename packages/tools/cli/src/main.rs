//! Adminkit CLI (`akt`)
//!
//! 세션 토큰으로 API에 권한을 묻고, 역할/정책을 관리하는 운영 도구입니다.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod config;

use commands::{Invocation, OutputFormat};
use config::CliConfig;

#[derive(Parser)]
#[command(name = "akt")]
#[command(author, version, about = "Adminkit CLI - authorization and policy administration", long_about = None)]
struct Cli {
    /// API URL (overrides AKT_API_URL and saved config)
    #[arg(long, global = true)]
    api: Option<String>,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    // ─────────────────────────────────────────────────────────────────────────
    // Auth
    // ─────────────────────────────────────────────────────────────────────────
    /// Save a session token
    Login {
        #[arg(long)]
        token: String,
    },

    /// Remove the saved session token
    Logout,

    // ─────────────────────────────────────────────────────────────────────────
    // Authorization
    // ─────────────────────────────────────────────────────────────────────────
    /// Ask whether the current session holds a permission
    Authorize {
        /// Permission tag (e.g. user:update)
        permission: String,

        /// Resource attributes as a JSON object
        #[arg(long)]
        resource: Option<String>,
    },

    /// List roles
    Roles,

    /// Manage policies
    Policy {
        #[command(subcommand)]
        action: PolicyAction,
    },
}

#[derive(Subcommand)]
enum PolicyAction {
    /// List policies
    List {
        #[arg(long)]
        role: Option<i64>,
    },
    /// Create a policy
    Create {
        #[arg(long)]
        role: i64,
        #[arg(long)]
        effect: String,
        #[arg(long)]
        permission: String,
        /// Condition as JSON
        #[arg(long)]
        condition: Option<String>,
    },
    /// Delete a policy
    Delete { id: i64 },
    /// Evaluate a YAML policy document offline
    Check { fixture: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // 설정 로드
    let config = CliConfig::load()?;
    let inv = Invocation::new(config, cli.api.as_deref(), cli.format);

    // 명령 실행
    match cli.command {
        Commands::Login { token } => commands::auth::login(&inv, &token),
        Commands::Logout => commands::auth::logout(&inv),

        Commands::Authorize {
            permission,
            resource,
        } => commands::authorize::authorize(&inv, &permission, resource.as_deref()).await,

        Commands::Roles => commands::roles::list(&inv).await,

        Commands::Policy { action } => match action {
            PolicyAction::List { role } => commands::policy::list(&inv, role).await,
            PolicyAction::Create {
                role,
                effect,
                permission,
                condition,
            } => {
                commands::policy::create(&inv, role, &effect, &permission, condition.as_deref())
                    .await
            }
            PolicyAction::Delete { id } => commands::policy::delete(&inv, id).await,
            PolicyAction::Check { fixture } => commands::policy::check(&inv, &fixture).await,
        },
    }
}
