pub mod handlers;
pub mod types;

use axum::{routing::post, Router};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::account::store::AccountStore;
use crate::account::types::AccountEvent;

#[derive(Clone)]
pub struct RpcState {
    pub store: Arc<Mutex<AccountStore>>,
    pub account_id: String,
    pub events: broadcast::Sender<AccountEvent>,
}

pub struct RpcServer {
    state: RpcState,
    bind_addr: String,
}

impl RpcServer {
    pub fn new(
        store: Arc<Mutex<AccountStore>>,
        account_id: String,
        events: broadcast::Sender<AccountEvent>,
        port: u16,
    ) -> Self {
        Self {
            state: RpcState {
                store,
                account_id,
                events,
            },
            bind_addr: format!("0.0.0.0:{}", port),
        }
    }

    pub async fn start(self) {
        let app = Router::new()
            .route("/", post(handlers::handle_rpc_request))
            .layer(CorsLayer::permissive())
            .with_state(self.state);

        let listener = tokio::net::TcpListener::bind(&self.bind_addr)
            .await
            .expect("Failed to bind RPC server");

        info!("RPC server listening on {}", self.bind_addr);
        axum::serve(listener, app).await.expect("RPC server failed");
    }
}
