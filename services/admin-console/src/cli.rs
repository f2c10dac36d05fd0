//! Command-line interface

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use console_http::PresentOptions;

#[derive(Debug, Parser)]
#[command(name = "admin-console", version, about = "Admin console API client")]
pub struct Cli {
    /// TOML configuration file
    #[arg(
        long,
        global = true,
        env = "CONFIG_PATH",
        default_value = "admin-console.toml"
    )]
    pub config: PathBuf,

    /// How request failures are shown on stderr
    #[arg(long, global = true, value_enum, default_value_t = ErrorDisplay::Toast)]
    pub errors: ErrorDisplay,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn present_options(&self) -> PresentOptions {
        match self.errors {
            ErrorDisplay::Silent => PresentOptions::silent(),
            ErrorDisplay::Toast => PresentOptions::toast(),
            ErrorDisplay::Modal => PresentOptions::modal("Request failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ErrorDisplay {
    /// Log only
    Silent,
    /// One-line message
    Toast,
    /// Titled block
    Modal,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Log in and store the issued token pair
    Login { username: String, password: String },
    /// End the session on the server and clear local credentials
    Logout,
    /// Show which credentials are stored
    Whoami,
    /// GET a service path
    Get(QueryArgs),
    /// POST a JSON body
    Post(BodyArgs),
    /// PUT a JSON body
    Put(BodyArgs),
    /// PATCH a JSON body
    Patch(BodyArgs),
    /// DELETE a service path
    Delete(QueryArgs),
}

#[derive(Debug, Clone, PartialEq, Args)]
pub struct QueryArgs {
    /// Service prefix, e.g. /usercenter
    pub service: String,
    pub path: String,
    /// Query parameters as key=value
    #[arg(value_parser = parse_key_val)]
    pub query: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Args)]
pub struct BodyArgs {
    /// Service prefix, e.g. /usercenter
    pub service: String,
    pub path: String,
    /// JSON request body; omitted means `{}`
    #[arg(value_parser = parse_json)]
    pub body: Option<serde_json::Value>,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .ok_or_else(|| format!("expected key=value, got `{s}`"))
}

fn parse_json(s: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(s).map_err(|e| format!("invalid JSON body: {e}"))
}
