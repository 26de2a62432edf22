use anyhow::{Context, Result};
use clap::{Arg, Command};
use secrecy::SecretString;

#[must_use]
pub fn with_args(command: Command) -> Command {
    let command = with_engine_args(command);
    with_provider_args(command)
}

fn with_engine_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .help("Public base URL of the application; drives cookie security, the token issuer, and the default post-login redirect")
                .env("JANUA_BASE_URL")
                .default_value("http://localhost:8080"),
        )
        .arg(
            Arg::new("base-path")
                .long("base-path")
                .help("Path the auth routes are mounted under")
                .env("JANUA_BASE_PATH")
                .default_value("/api/auth"),
        )
        .arg(
            Arg::new("jwt-secret")
                .long("jwt-secret")
                .help("HMAC secret for signing access tokens")
                .env("JANUA_JWT_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new("session-ttl-seconds")
                .long("session-ttl-seconds")
                .help("Session lifetime in seconds")
                .env("JANUA_SESSION_TTL_SECONDS")
                .default_value("604800")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("rolling-sessions")
                .long("rolling-sessions")
                .help("Extend sessions that are used close to expiry")
                .env("JANUA_ROLLING_SESSIONS")
                .default_value("true")
                .value_parser(clap::value_parser!(bool)),
        )
        .arg(
            Arg::new("renew-threshold-seconds")
                .long("renew-threshold-seconds")
                .help("Remaining lifetime below which a rolling session is extended (default: half the session TTL)")
                .env("JANUA_RENEW_THRESHOLD_SECONDS")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("access-token-ttl-seconds")
                .long("access-token-ttl-seconds")
                .help("Access token (JWT) lifetime in seconds")
                .env("JANUA_ACCESS_TOKEN_TTL_SECONDS")
                .default_value("900")
                .value_parser(clap::value_parser!(i64)),
        )
}

// (name, --client-id, --client-secret, id env var, secret env var)
const PROVIDER_ARGS: [(&str, &str, &str, &str, &str); 3] = [
    (
        "google",
        "google-client-id",
        "google-client-secret",
        "JANUA_GOOGLE_CLIENT_ID",
        "JANUA_GOOGLE_CLIENT_SECRET",
    ),
    (
        "github",
        "github-client-id",
        "github-client-secret",
        "JANUA_GITHUB_CLIENT_ID",
        "JANUA_GITHUB_CLIENT_SECRET",
    ),
    (
        "discord",
        "discord-client-id",
        "discord-client-secret",
        "JANUA_DISCORD_CLIENT_ID",
        "JANUA_DISCORD_CLIENT_SECRET",
    ),
];

fn with_provider_args(mut command: Command) -> Command {
    for (provider, id_arg, secret_arg, id_env, secret_env) in PROVIDER_ARGS {
        command = command
            .arg(
                Arg::new(id_arg)
                    .long(id_arg)
                    .help(format!("OAuth client id for {provider}"))
                    .env(id_env)
                    .requires(secret_arg),
            )
            .arg(
                Arg::new(secret_arg)
                    .long(secret_arg)
                    .help(format!("OAuth client secret for {provider}"))
                    .env(secret_env)
                    .hide_env_values(true)
                    .requires(id_arg),
            );
    }
    command
}

#[derive(Debug, Clone)]
pub struct ProviderCredentials {
    pub client_id: String,
    pub client_secret: SecretString,
}

#[derive(Debug)]
pub struct Options {
    pub base_url: String,
    pub base_path: String,
    pub jwt_secret: SecretString,
    pub session_ttl_seconds: i64,
    pub rolling_sessions: bool,
    pub renew_threshold_seconds: Option<i64>,
    pub access_token_ttl_seconds: i64,
    pub google: Option<ProviderCredentials>,
    pub github: Option<ProviderCredentials>,
    pub discord: Option<ProviderCredentials>,
}

impl Options {
    /// Collect the auth arguments out of parsed matches.
    ///
    /// # Errors
    /// Returns an error when a required argument is missing.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let jwt_secret = matches
            .get_one::<String>("jwt-secret")
            .cloned()
            .context("missing required argument: --jwt-secret")?;

        Ok(Self {
            base_url: matches
                .get_one::<String>("base-url")
                .cloned()
                .unwrap_or_else(|| "http://localhost:8080".to_string()),
            base_path: matches
                .get_one::<String>("base-path")
                .cloned()
                .unwrap_or_else(|| "/api/auth".to_string()),
            jwt_secret: SecretString::from(jwt_secret),
            session_ttl_seconds: matches
                .get_one::<i64>("session-ttl-seconds")
                .copied()
                .unwrap_or(604_800),
            rolling_sessions: matches
                .get_one::<bool>("rolling-sessions")
                .copied()
                .unwrap_or(true),
            renew_threshold_seconds: matches.get_one::<i64>("renew-threshold-seconds").copied(),
            access_token_ttl_seconds: matches
                .get_one::<i64>("access-token-ttl-seconds")
                .copied()
                .unwrap_or(900),
            google: provider_credentials(matches, "google"),
            github: provider_credentials(matches, "github"),
            discord: provider_credentials(matches, "discord"),
        })
    }
}

fn provider_credentials(matches: &clap::ArgMatches, provider: &str) -> Option<ProviderCredentials> {
    let client_id = matches.get_one::<String>(&format!("{provider}-client-id"))?;
    let client_secret = matches.get_one::<String>(&format!("{provider}-client-secret"))?;
    Some(ProviderCredentials {
        client_id: client_id.clone(),
        client_secret: SecretString::from(client_secret.clone()),
    })
}
