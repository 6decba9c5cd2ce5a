//! Mints a bearer token signed with the configured secret.
//!
//! Identity is issued elsewhere in production; this is for local use and smoke tests.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use uuid::Uuid;

use storage_service::{
    auth::{AccountRole, AuthConfig, AuthService},
    config,
};

#[derive(Clone, Copy, ValueEnum)]
enum Role {
    Customer,
    Employee,
}

impl From<Role> for AccountRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Customer => AccountRole::Customer,
            Role::Employee => AccountRole::Employee,
        }
    }
}

#[derive(Parser)]
#[command(name = "issue-token", about = "Issue a JWT for the storage service", version)]
struct Cli {
    #[arg(
        long,
        value_parser = clap::value_parser!(Uuid),
        help = "User identifier; random when omitted"
    )]
    user_id: Option<Uuid>,

    #[arg(long, value_enum, default_value_t = Role::Customer)]
    role: Role,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config().context("failed to load configuration")?;
    let auth = AuthService::new(AuthConfig::from(&cfg));

    let user_id = cli.user_id.unwrap_or_else(Uuid::new_v4);
    let token = auth.issue_token(user_id, cli.role.into())?;

    eprintln!("user_id: {}", user_id);
    println!("{}", token);
    Ok(())
}
