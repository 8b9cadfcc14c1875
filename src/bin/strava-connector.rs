// ABOUTME: Command-line front end for the Strava connector
// ABOUTME: Authorizes the application, fetches athlete and activity data, and manages webhooks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
//!
//! Usage:
//! ```bash
//! # Print the approval URL, then wait for the redirect and save the token
//! strava-connector auth-url
//! strava-connector await-token --token-path token.json --wait-secs 300
//!
//! # Fetch data with a saved token
//! strava-connector athlete --token-path token.json
//! strava-connector activities --token-path token.json --per-page 50 --after 2024-01-01T00:00:00Z
//! strava-connector streams 1234567890 --keys time,distance,heartrate --token-path token.json
//!
//! # Manage the push subscription
//! strava-connector webhook create
//! strava-connector webhook view
//! strava-connector webhook delete 12345
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use strava_connector::config::ConnectorConfig;
use strava_connector::logging;
use strava_connector::strava_core::constants::pagination::DEFAULT_PER_PAGE;
use strava_connector::strava_core::Token;
use strava_connector::{
    handler_fn, read_token_file, write_token_file, CallContext, OAuth2Client, RateLimiter,
    StravaApi, TokenAgent, TokenSource, WebhookCoordinator,
};
use tokio::fs;
use tokio::signal;
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(
    name = "strava-connector",
    about = "Strava API connector",
    long_about = "Authorize against Strava, fetch athlete and activity data, and manage webhook subscriptions."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file (default: ~/.cassidy-connector-strava.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write the command output to this file
    #[arg(long, short = 'o', global = true)]
    output: Option<PathBuf>,

    /// Token file used by data commands
    #[arg(long, global = true)]
    token_path: Option<PathBuf>,

    /// Token JSON passed inline instead of a token file
    #[arg(long, global = true, conflicts_with = "token_path")]
    token: Option<String>,

    /// Deadline for the whole command, in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the URL the user visits to approve the application
    AuthUrl,

    /// Listen on the redirect URL, exchange the received code, and save the token
    AwaitToken {
        /// Give up after this many seconds
        #[arg(long)]
        wait_secs: Option<u64>,
    },

    /// Exchange an authorization code copied from the redirect
    Exchange {
        /// One-time authorization code
        code: String,
    },

    /// Fetch the authenticated athlete
    Athlete,

    /// Fetch every activity page
    Activities {
        /// Page size, clamped to 1..=200
        #[arg(long, default_value_t = DEFAULT_PER_PAGE)]
        per_page: u32,

        /// Only activities before this RFC 3339 time
        #[arg(long)]
        before: Option<DateTime<Utc>>,

        /// Only activities after this RFC 3339 time
        #[arg(long)]
        after: Option<DateTime<Utc>>,
    },

    /// Fetch a single activity
    Activity {
        /// Activity id
        id: i64,

        /// Include every segment effort
        #[arg(long)]
        include_all_efforts: bool,
    },

    /// Fetch activity streams
    Streams {
        /// Activity id
        id: i64,

        /// Comma-separated stream keys, e.g. time,distance,heartrate
        #[arg(long, value_delimiter = ',', required = true)]
        keys: Vec<String>,
    },

    /// Webhook subscription management
    Webhook {
        #[command(subcommand)]
        action: WebhookCommand,
    },
}

#[derive(Subcommand)]
enum WebhookCommand {
    /// Create the push subscription and keep serving events until interrupted
    Create,
    /// Serve an existing subscription's callback until interrupted
    Launch,
    /// Show the current subscription
    View,
    /// Delete a subscription
    Delete {
        /// Subscription id
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_from_env()?;

    let cli = Cli::parse();
    let config = ConnectorConfig::load(cli.config.as_deref()).context("loading configuration")?;
    config.validate()?;

    let ctx = cli
        .timeout_secs
        .map_or_else(CallContext::background, |secs| {
            CallContext::with_timeout(Duration::from_secs(secs))
        });

    let output = match &cli.command {
        Command::AuthUrl => {
            let client = OAuth2Client::new(config.oauth_config()?);
            Value::String(client.authorization_url()?)
        }
        Command::AwaitToken { wait_secs } => {
            let client = OAuth2Client::new(config.oauth_config()?);
            println!("Visit this URL to authorize the application:");
            println!("{}", client.authorization_url()?);

            let agent = TokenAgent::unauthenticated(client);
            let token = agent
                .await_initial_token(&ctx, wait_secs.map(Duration::from_secs))
                .await?;
            save_token(&cli, &config, &token).await?;
            serde_json::to_value(&token)?
        }
        Command::Exchange { code } => {
            let agent = TokenAgent::unauthenticated(OAuth2Client::new(config.oauth_config()?));
            let token = agent.exchange_authorization_code(&ctx, code).await?;
            save_token(&cli, &config, &token).await?;
            serde_json::to_value(&token)?
        }
        Command::Athlete
        | Command::Activities { .. }
        | Command::Activity { .. }
        | Command::Streams { .. } => run_data_command(&cli, &config, &ctx).await?,
        Command::Webhook { action } => run_webhook_command(action, &config, &ctx).await?,
    };

    emit(&output, cli.output.as_deref()).await
}

async fn run_data_command(cli: &Cli, config: &ConnectorConfig, ctx: &CallContext) -> Result<Value> {
    let token = load_token(cli, config).await?;
    if token.is_expired() {
        debug!(expiry = %token.expiry, "saved access token has expired, refreshing before the call");
    }
    let agent = Arc::new(TokenAgent::new(
        OAuth2Client::new(config.oauth_config()?),
        token,
    ));
    let api = StravaApi::with_base_url(
        &config.api_base_url,
        Arc::new(RateLimiter::strava()),
        Arc::clone(&agent) as Arc<dyn TokenSource>,
    );

    let result = match &cli.command {
        Command::Athlete => api.get_athlete(ctx).await,
        Command::Activities {
            per_page,
            before,
            after,
        } => api
            .list_activities(ctx, *per_page, *before, *after)
            .await
            .map(|pages| json!(pages)),
        Command::Activity {
            id,
            include_all_efforts,
        } => api.get_activity(ctx, *id, *include_all_efforts).await,
        Command::Streams { id, keys } => api.get_activity_streams(ctx, *id, keys.as_slice()).await,
        _ => bail!("not a data command"),
    };

    // Persist the latest token even when the call failed
    if cli.token.is_none() {
        if let Some(latest) = agent.snapshot().await {
            save_token(cli, config, &latest).await?;
        }
    }

    let (short_term, daily) = api.remaining_requests();
    info!(short_term, daily, "requests left in the current windows");
    Ok(result?)
}

async fn run_webhook_command(
    action: &WebhookCommand,
    config: &ConnectorConfig,
    ctx: &CallContext,
) -> Result<Value> {
    let handler = handler_fn(|event| async move {
        info!(
            object_type = %event.object_type,
            object_id = event.object_id,
            aspect_type = %event.aspect_type,
            owner_id = event.owner_id,
            "webhook event"
        );
        if event.is_deauthorization() {
            warn!(owner_id = event.owner_id, "athlete revoked access");
        }
    });
    let coordinator = WebhookCoordinator::new(config.webhook_config()?).with_handler(handler);

    match action {
        WebhookCommand::Create => {
            let (id, server) = coordinator.create_subscription(ctx).await?;
            println!("Subscription {id} created; serving events until interrupted");
            signal::ctrl_c().await?;
            server.shutdown().await?;
            Ok(json!({ "id": id }))
        }
        WebhookCommand::Launch => {
            let server = coordinator.launch_webhook_server().await?;
            println!("Serving webhook events on {}", server.local_addr());
            signal::ctrl_c().await?;
            server.shutdown().await?;
            Ok(Value::Null)
        }
        WebhookCommand::View => raw_json(coordinator.view_subscription(ctx).await?),
        WebhookCommand::Delete { id } => {
            raw_json(coordinator.delete_subscription(ctx, *id).await?)
        }
    }
}

/// Provider answers are passed through; an empty body becomes `null`
fn raw_json(body: String) -> Result<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
}

fn token_path(cli: &Cli, config: &ConnectorConfig) -> Option<PathBuf> {
    cli.token_path.clone().or_else(|| config.token_path.clone())
}

async fn load_token(cli: &Cli, config: &ConnectorConfig) -> Result<Token> {
    if let Some(inline) = &cli.token {
        return Token::from_json_str(inline).context("parsing --token");
    }
    let Some(path) = token_path(cli, config) else {
        bail!("a token is required: pass --token, --token-path, or set STRAVA_TOKEN_PATH");
    };
    read_token_file(&path)
        .await
        .with_context(|| format!("reading token file {}", path.display()))
}

async fn save_token(cli: &Cli, config: &ConnectorConfig, token: &Token) -> Result<()> {
    match token_path(cli, config) {
        Some(path) => {
            write_token_file(&path, token)
                .await
                .with_context(|| format!("writing token file {}", path.display()))?;
            info!(path = %path.display(), "token saved");
        }
        None => warn!("no token path configured, token not saved"),
    }
    Ok(())
}

async fn emit(value: &Value, output: Option<&Path>) -> Result<()> {
    if value.is_null() {
        return Ok(());
    }
    let rendered = match value {
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other)?,
    };
    println!("{rendered}");

    if let Some(path) = output {
        fs::write(path, &rendered)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}
