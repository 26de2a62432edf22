//! Map validated CLI matches to the action the binary will execute.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::auth;
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        auth: auth_opts,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jwt_secret_is_required() {
        temp_env::with_vars([("JANUA_JWT_SECRET", None::<&str>)], || {
            let result =
                crate::cli::commands::new().try_get_matches_from(vec!["janua", "--port", "8080"]);
            assert!(result.is_err());
        });
    }

    #[test]
    fn minimal_invocation_dispatches_to_server() {
        let matches = crate::cli::commands::new().get_matches_from(vec![
            "janua",
            "--jwt-secret",
            "dispatch-secret",
        ]);
        let action = handler(&matches).unwrap();
        let Action::Server(args) = action;
        assert_eq!(args.port, 8080);
        assert_eq!(args.auth.base_path, "/api/auth");
    }
}
