//! HTTP endpoint the music service redirects users to after they grant
//! access. Completes the flow started by the authorize command.

use crate::errors::Result;
use crate::spotify::MusicService;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Router,
};
use chrono::Utc;
use db::structs::AuthRequest;
use db::{Database, ReadOnlyDb, WriteableDb, Writer};
use log::{error, info, warn};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Clone)]
pub struct AuthState {
    pub db: Database,
    pub writer: Writer,
    pub music: Arc<dyn MusicService>,
}

#[derive(Debug, Deserialize)]
struct Callback {
    code: String,
    state: String,
}

pub fn router(state: AuthState) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/callback", get(callback))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AuthState) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Auth callback server listening on {addr}");

    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

async fn callback(
    State(state): State<AuthState>,
    Query(callback): Query<Callback>,
) -> (StatusCode, &'static str) {
    let request = match state
        .db
        .read_only_call(|db| db.get_auth_request(&callback.state))
    {
        Ok(Some(request)) => request,
        Ok(None) => {
            warn!("Callback with unknown state");
            return (StatusCode::UNAUTHORIZED, "Unauthorized");
        }
        Err(why) => {
            error!("Failed to look up auth request: {why}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
        }
    };

    if request.is_expired(Utc::now()) {
        warn!("Callback for expired auth request of account {}", request.account);
        let stale = request.state.clone();
        if let Err(why) = state
            .writer
            .submit_sync(move |db| Ok(db.delete_auth_request(&stale)?))
            .await
        {
            error!("Failed to delete expired auth request: {why}");
        }
        return (StatusCode::UNAUTHORIZED, "Unauthorized");
    }

    let account = request.account;
    match complete(&state, request, &callback.code).await {
        Ok(()) => {
            info!("Account {account} authorized");
            (StatusCode::OK, "Authorized!")
        }
        Err(why) => {
            error!("Failed to complete authorization for account {account}: {why}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}

/// Stores the credential and removes the request so the state can't be
/// used twice.
async fn complete(state: &AuthState, request: AuthRequest, code: &str) -> Result<()> {
    let credential = state.music.exchange_code(code, request.account).await?;
    state
        .writer
        .submit_sync(move |db| {
            db.save_credential(&credential)?;
            db.delete_auth_request(&request.state)?;
            Ok(())
        })
        .await?;
    Ok(())
}
