//! Console path resolution

use crate::cli::app::AppContext;
use crate::routes::{self, LEGACY_LOGIN_PATH, Route};
use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;

#[derive(Args)]
pub struct RouteCommands {
    #[command(subcommand)]
    pub command: RouteSubcommands,
}

#[derive(Subcommand)]
pub enum RouteSubcommands {
    /// Show where a console path leads for the current session
    Resolve {
        /// Path with optional query, e.g. /admin/login?next=/users
        path: String,
    },
}

pub fn route_command(args: RouteCommands, ctx: &AppContext) -> Result<()> {
    match args.command {
        RouteSubcommands::Resolve { path } => {
            println!("{}", resolve(&path, ctx.session.is_authenticated())?);
            Ok(())
        }
    }
}

/// Final path a request lands on
fn resolve(path: &str, authenticated: bool) -> Result<String> {
    let (bare, query) = path.split_once('?').unwrap_or((path, ""));
    if bare.trim_end_matches('/') == LEGACY_LOGIN_PATH {
        return Ok(routes::legacy_login_redirect(query));
    }

    let Some(route) = Route::parse(bare) else {
        anyhow::bail!("Unknown route: {}", path.red());
    };
    if route.is_public() || authenticated {
        return Ok(route.path());
    }

    let next = routes::sanitize_next(&route.path());
    Ok(match next {
        Some(next) => format!("{}?next={}", routes::LOGIN_PATH, urlencoding::encode(&next)),
        None => routes::LOGIN_PATH.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_out_requests_go_to_login() {
        assert_eq!(
            resolve("/events/7/builder", false).unwrap(),
            "/login?next=%2Fevents%2F7%2Fbuilder"
        );
        assert_eq!(resolve("/events/7/builder", true).unwrap(), "/events/7/builder");
        assert_eq!(resolve("/login", false).unwrap(), "/login");
    }

    #[test]
    fn test_legacy_login() {
        assert_eq!(resolve("/admin/login?next=%2Fusers", false).unwrap(), "/login?next=%2Fusers");
        assert!(resolve("/nowhere", true).is_err());
    }
}
