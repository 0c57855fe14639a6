//! CAS SSO command line tool.
//!
//! Exercises the adapter against a real CAS server: prints login/logout
//! redirects for a request URL, validates the ticket of a callback URL and
//! lists eligibility categories.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use cas_sso::{
    list_categories, list_categories_from, CasConfig, CasConfigJson, CasProvider, CasRequest,
    CasVersion, MemorySession,
};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "cas-sso")]
#[command(about = "CAS single sign-on adapter tool")]
struct Args {
    /// JSON configuration file (kebab-case keys)
    #[arg(long, env = "CAS_CONFIG")]
    config: Option<PathBuf>,

    /// CAS server URL (absolute, or a path resolved against the request host)
    #[arg(long, env = "CAS_SERVER_URL")]
    server_url: Option<String>,

    /// CAS protocol version (1, 2, 3)
    #[arg(long = "cas-version", env = "CAS_VERSION")]
    cas_version: Option<String>,

    /// Attribute used as the principal identifier
    #[arg(long, env = "CAS_USERNAME_ATTRIBUTE")]
    username_attribute: Option<String>,

    /// Force re-authentication at the CAS server
    #[arg(long, env = "CAS_RENEW")]
    renew: bool,

    /// Proxy-granting ticket callback URL
    #[arg(long, env = "CAS_PROXY_CALLBACK")]
    proxy_callback: Option<String>,

    /// Never trust the Referer header as redirect target
    #[arg(long, env = "CAS_IGNORE_REFERER")]
    ignore_referer: bool,

    /// Do not carry the redirect target in the service URL
    #[arg(long, env = "CAS_STORE_NEXT")]
    store_next: bool,

    /// Fallback redirect target after login
    #[arg(long, env = "CAS_REDIRECT_URL")]
    redirect_url: Option<String>,

    /// Fixed host to return to after logout
    #[arg(long, env = "CAS_LOGOUT_HOST")]
    logout_host: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, env = "CAS_VERBOSE")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the CAS login redirect for a request URL
    LoginUrl {
        /// Absolute URL of the login request
        url: String,
        /// Referer header of the request
        #[arg(long)]
        referer: Option<String>,
    },
    /// Print the CAS logout redirect for a request URL
    LogoutUrl {
        /// Absolute URL of the logout request
        url: String,
    },
    /// Validate the ticket carried by a callback URL and print the identity
    Verify {
        /// Absolute callback URL including the `ticket` parameter
        url: String,
    },
    /// List eligibility categories
    Categories {
        /// First year (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,
    },
}

fn build_config(args: &Args) -> Result<CasConfig> {
    let mut config = CasConfig::default();

    if let Some(path) = &args.config {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let overlay: CasConfigJson = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        overlay.apply_to(&mut config);
    }

    if let Some(url) = &args.server_url {
        config.server_url = Some(url.clone());
    }
    if let Some(version) = &args.cas_version {
        config.version = version.parse::<CasVersion>().map_err(|e| anyhow!(e))?;
    }
    if let Some(attr) = &args.username_attribute {
        config.username_attribute = attr.clone();
    }
    if args.renew {
        config.renew = true;
    }
    if let Some(callback) = &args.proxy_callback {
        config.proxy_callback = Some(callback.clone());
    }
    if args.ignore_referer {
        config.ignore_referer = true;
    }
    if args.store_next {
        config.store_next = true;
    }
    if let Some(url) = &args.redirect_url {
        config.redirect_url = url.clone();
    }
    if let Some(host) = &args.logout_host {
        config.logout_host = Some(host.clone());
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("{}={}", env!("CARGO_CRATE_NAME"), log_level))
        .with_writer(std::io::stderr)
        .json()
        .init();

    if let Command::Categories { year } = &args.command {
        let categories = match year {
            Some(year) => list_categories_from(*year),
            None => list_categories(None),
        };
        println!("{}", serde_json::to_string_pretty(&categories)?);
        return Ok(());
    }

    let config = build_config(&args)?;

    info!(
        server_url = ?config.server_url,
        version = %config.version,
        store_next = config.store_next,
        "Configuration loaded"
    );

    let provider = CasProvider::with_http_validator(config).context("Invalid CAS configuration")?;

    match args.command {
        Command::LoginUrl { url, referer } => {
            let mut request = CasRequest::from_url(&url)?;
            if let Some(referer) = referer {
                request = request.with_header("Referer", referer);
            }
            let redirect = provider.begin_login(&request)?;
            println!("{}", redirect.location);
        }
        Command::LogoutUrl { url } => {
            let request = CasRequest::from_url(&url)?;
            let redirect = provider.logout(&request, None)?;
            println!("{}", redirect.location);
        }
        Command::Verify { url } => {
            let request = CasRequest::from_url(&url)?;
            let mut session = MemorySession::new();
            match provider.complete_login(&request, &mut session).await? {
                Some(identity) => {
                    info!(user_id = %identity.user_id, "{}", provider.config().welcome_message(&identity.user_id));
                    println!("{}", serde_json::to_string_pretty(&identity)?);
                }
                None => {
                    info!("No ticket on callback URL, nothing to verify");
                }
            }
        }
        Command::Categories { .. } => {}
    }

    Ok(())
}
