use clap::Args;
use serde_json::json;

use crate::auth::{generate_jwt, Claims};
use crate::cli::OutputFormat;
use crate::config::AppConfig;

#[derive(Args, Debug)]
pub struct TokenArgs {
    #[arg(long, help = "preferred_username claim")]
    pub username: String,

    #[arg(long, help = "user_id claim")]
    pub user_id: u64,

    #[arg(long, help = "Grant the administrator claim")]
    pub admin: bool,

    #[arg(long = "role", help = "Role claim, e.g. staff:course-v1:ORG+COURSE+RUN (repeatable)")]
    pub roles: Vec<String>,

    #[arg(long, help = "Token lifetime in hours (overrides SECURITY_JWT_EXPIRY_HOURS)")]
    pub hours: Option<u64>,
}

pub fn handle(args: TokenArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let mut security = AppConfig::from_env().security;
    if let Some(hours) = args.hours {
        security.jwt_expiry_hours = hours;
    }

    let claims = Claims::new(args.username, args.user_id, args.admin, args.roles, &security);
    let token = generate_jwt(&claims, &security)?;

    match output_format {
        OutputFormat::Text => println!("{}", token),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "token": token,
                "claims": claims,
            }))?
        ),
    }
    Ok(())
}
