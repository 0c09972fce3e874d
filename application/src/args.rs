//! [`Args`] definitions.

use std::time::Duration;

use clap::{Parser, Subcommand};

/// Session client of the HR dashboard.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    /// Base URL of the remote API, overriding the configured one.
    #[arg(long, env = "API_URL")]
    pub api_url: Option<String>,

    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    /// Parses command line arguments.
    ///
    /// # Errors
    ///
    /// Errors if failed to parse command line arguments.
    pub fn parse() -> Result<Self, clap::Error> {
        <Self as Parser>::try_parse()
    }
}

/// Command to run.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Logs in with the provided credentials.
    Login {
        /// Username to log in with.
        username: String,

        /// Password to log in with.
        #[arg(long, env = "PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Logs the current user out.
    Logout,

    /// Prints the currently logged in user.
    Whoami,

    /// Checks whether the current user has the role.
    HasRole {
        /// Role to check.
        role: String,
    },

    /// Checks whether the current user has any of the roles.
    HasAnyRole {
        /// Roles to check.
        #[arg(required = true)]
        roles: Vec<String>,
    },

    /// Fetches a resource of the remote API on behalf of the current user.
    Get {
        /// Path of the resource, relative to the API base URL.
        path: String,
    },

    /// Prints the session state each time it changes.
    Watch {
        /// Interval to re-read the stored session with, picking up the
        /// changes made by other processes.
        #[arg(long, value_parser = parse_duration)]
        interval: Option<Duration>,
    },
}

/// Parses a human-readable [`Duration`] (like `2s` or `1m 30s`).
fn parse_duration(s: &str) -> Result<Duration, String> {
    humantime_serde::re::humantime::parse_duration(s).map_err(|e| e.to_string())
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use clap::Parser as _;

    use super::{Args, Command};

    #[test]
    fn parses_subcommands() {
        let args = Args::try_parse_from([
            "application",
            "--api-url",
            "http://hr.example.com/api",
            "has-any-role",
            "ADMIN",
            "RRHH",
        ])
        .unwrap();

        assert_eq!(args.config, "config.toml");
        assert_eq!(args.api_url.as_deref(), Some("http://hr.example.com/api"));
        assert!(matches!(
            args.command,
            Command::HasAnyRole { roles } if roles == ["ADMIN", "RRHH"],
        ));
    }

    #[test]
    fn parses_watch_interval() {
        let args = Args::try_parse_from([
            "application",
            "watch",
            "--interval",
            "1m 30s",
        ])
        .unwrap();

        assert!(matches!(
            args.command,
            Command::Watch { interval: Some(i) } if i == Duration::from_secs(90),
        ));
    }

    #[test]
    fn requires_roles() {
        assert!(Args::try_parse_from(["application", "has-any-role"]).is_err());
    }
}
