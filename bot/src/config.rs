use clap::Parser;
use log::LevelFilter;
use std::net::SocketAddr;
use std::path::PathBuf;
use url::Url;

/// Adds spotify songs posted in discord to each subscriber's playlist.
#[derive(Parser, Debug)]
#[command(name = "bot", version)]
pub struct Config {
    /// Migrate the database and exit
    #[arg(long)]
    pub migrate: bool,

    #[arg(long, env = "DISCORD_TOKEN", hide_env_values = true)]
    pub discord_token: String,

    #[arg(long, env = "DATABASE_PATH", default_value = "./spooty.db3")]
    pub database_path: PathBuf,

    #[arg(long, env = "RSPOTIFY_CLIENT_ID")]
    pub spotify_client_id: String,

    #[arg(long, env = "RSPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    pub spotify_client_secret: String,

    /// Where spotify sends users after they authorize, must point at the
    /// callback route of the auth server
    #[arg(long, env = "SPOTIFY_REDIRECT_URI")]
    pub spotify_redirect_uri: Url,

    #[arg(long, env = "AUTH_SERVER_ADDR", default_value = "0.0.0.0:8081")]
    pub auth_server_addr: SocketAddr,

    /// Most playlist appends running at once
    #[arg(long, env = "MAX_IN_FLIGHT", default_value_t = 32)]
    pub max_in_flight: usize,

    /// Log level for the bot's own modules, everything else logs warnings
    #[arg(long, env = "LOG_LEVEL", default_value = "debug")]
    pub log_level: LevelFilter,
}
