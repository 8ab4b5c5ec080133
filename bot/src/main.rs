#![warn(
    clippy::cognitive_complexity,
    clippy::missing_const_for_fn,
    clippy::option_if_let_else
)]

mod auth_server;
mod chat;
mod config;
mod errors;
mod handler;
mod spotify;
mod structs;
#[cfg(test)]
mod test_utils;

use clap::Parser;
use log::LevelFilter;
use log::{error, info};
use serenity::http::Http;
use serenity::model::gateway::GatewayIntents;
use serenity::prelude::*;
use simple_logger::SimpleLogger;

use std::process;
use std::sync::Arc;

use auth_server::AuthState;
use config::Config;
use db::{Database, Writer};
use handler::commands::CommandContext;
use handler::dispatch::Dispatcher;
use handler::links::HttpExpander;
use handler::records::LinkStore;
use handler::Handler;
use spotify::{MusicService, Spotify};

fn migrate_db(database: &Database) {
    match database.migrate() {
        Ok(_) => info!("sucessfully loaded and migrated db"),
        Err(why) => {
            error!("Failed to migrate, exiting {why:?}");
            process::exit(-1);
        }
    };
}

#[tokio::main]
async fn main() {
    let config = Config::parse();
    SimpleLogger::new()
        .with_level(LevelFilter::Warn)
        .with_module_level("bot", config.log_level)
        .with_module_level("db", config.log_level)
        .with_utc_timestamps()
        .init()
        .unwrap();

    let database = Database::new(&config.database_path);
    migrate_db(&database);
    if config.migrate {
        return;
    }

    let writer = match Writer::start(&database) {
        Ok(writer) => writer,
        Err(why) => {
            error!("Failed to start db writer, exiting {why}");
            process::exit(-1);
        }
    };

    let spotify = Spotify::connect(
        &config.spotify_client_id,
        &config.spotify_client_secret,
        config.spotify_redirect_uri.clone(),
    )
    .await;
    let music: Arc<dyn MusicService> = match spotify {
        Ok(spotify) => Arc::new(spotify),
        Err(why) => {
            error!("Failed to connect to spotify, exiting {why}");
            process::exit(-1);
        }
    };
    let expander = match HttpExpander::new() {
        Ok(expander) => expander,
        Err(why) => {
            error!("Failed to build http client, exiting {why}");
            process::exit(-1);
        }
    };

    let auth = AuthState {
        db: database.clone(),
        writer: writer.clone(),
        music: music.clone(),
    };
    let auth_addr = config.auth_server_addr;
    tokio::spawn(async move {
        if let Err(why) = auth_server::serve(auth_addr, auth).await {
            error!("Auth server stopped: {why}");
        }
    });

    let chat = Arc::new(Http::new(&config.discord_token));
    let store = LinkStore::new(writer.clone(), chat.clone());
    let dispatcher = Dispatcher::new(
        database.clone(),
        store,
        chat,
        music.clone(),
        Arc::new(expander),
        config.max_in_flight,
    );
    let commands = CommandContext {
        db: database,
        writer,
        music,
    };

    let intents = GatewayIntents::GUILDS
        .union(GatewayIntents::GUILD_MESSAGES)
        .union(GatewayIntents::MESSAGE_CONTENT);

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(Handler::new(dispatcher, commands))
        .await
        .expect("Err creating client");

    // Shards will automatically attempt to reconnect, and will perform
    // exponential backoff until it reconnects.
    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }
}
