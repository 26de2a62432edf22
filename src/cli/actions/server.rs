use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

use crate::api;
use crate::cli::commands::auth::Options;
use crate::engine::{Auth, config::AuthConfig};
use crate::provider::{Discord, GitHub, Google};
use crate::store::MemoryAdapter;
use crate::token::TokenSigner;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub auth: Options,
}

/// Execute the server action: assemble the engine and serve it.
///
/// # Errors
/// Returns an error if configuration is invalid or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let options = args.auth;

    let mut config = AuthConfig::new(options.base_url.clone())
        .with_base_path(options.base_path.clone())
        .with_session_ttl_seconds(options.session_ttl_seconds)
        .with_rolling_enabled(options.rolling_sessions)
        .with_access_token_ttl_seconds(options.access_token_ttl_seconds);
    if let Some(threshold) = options.renew_threshold_seconds {
        config = config.with_renew_threshold_seconds(threshold);
    }

    let signer = TokenSigner::new(options.jwt_secret);

    // Sessions live in process memory; a restart signs everyone out.
    warn!("Using the in-memory session store; sessions will not survive a restart");
    let adapter = Arc::new(MemoryAdapter::new());

    let mut auth = Auth::new(adapter, config, signer);

    if let Some(credentials) = options.google {
        let redirect = callback_url(&options.base_url, &options.base_path, "google")?;
        auth = auth.with_provider(Arc::new(Google::new(
            credentials.client_id,
            credentials.client_secret,
            redirect,
        )));
        info!("Registered OAuth provider: google");
    }
    if let Some(credentials) = options.github {
        let redirect = callback_url(&options.base_url, &options.base_path, "github")?;
        auth = auth.with_provider(Arc::new(GitHub::new(
            credentials.client_id,
            credentials.client_secret,
            redirect,
        )));
        info!("Registered OAuth provider: github");
    }
    if let Some(credentials) = options.discord {
        let redirect = callback_url(&options.base_url, &options.base_path, "discord")?;
        auth = auth.with_provider(Arc::new(Discord::new(
            credentials.client_id,
            credentials.client_secret,
            redirect,
        )));
        info!("Registered OAuth provider: discord");
    }

    api::serve(args.port, Arc::new(auth)).await
}

fn callback_url(base_url: &str, base_path: &str, provider: &str) -> Result<Url> {
    let url = format!(
        "{}{}/{provider}/callback",
        base_url.trim_end_matches('/'),
        base_path
    );
    Url::parse(&url).with_context(|| format!("invalid callback URL: {url}"))
}
