//! Node assembly: storage, account bootstrap, event fan-out, RPC.

use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::info;

use crate::account::store::AccountStore;
use crate::account::types::AccountEvent;
use crate::config::LodestoneConfig;
use crate::error::LodestoneError;
use crate::rpc::RpcServer;
use crate::storage::Storage;

pub struct Node {
    pub store: Arc<Mutex<AccountStore>>,
    pub events: broadcast::Sender<AccountEvent>,
    pub config: LodestoneConfig,
}

impl Node {
    pub fn new(config: LodestoneConfig) -> Result<Self, LodestoneError> {
        info!("Persistence: Opening Sled DB at '{}'...", config.node.db_path);
        let storage = Arc::new(Storage::open(&config.node.db_path)?);
        let mut store = AccountStore::with_storage(storage)?;

        let snapshot = store.open_or_create(&config.account.id)?;
        info!(
            "Account '{}' at nonce {} ({})",
            snapshot.record.id,
            snapshot.record.nonce,
            snapshot.record.phase()
        );

        let (events, _) = broadcast::channel(16);

        Ok(Self {
            store: Arc::new(Mutex::new(store)),
            events,
            config,
        })
    }

    /// Serve RPC until shutdown. Also drains the event channel into the log
    /// so oracle bindings are visible to operators.
    pub async fn start_rpc(self, port: u16) {
        let mut subscriber = self.events.subscribe();
        tokio::spawn(async move {
            while let Ok(event) = subscriber.recv().await {
                match event {
                    AccountEvent::OracleBound { account, oracle } => {
                        info!("event: oracle-bound on '{}' -> {}", account, oracle);
                    }
                }
            }
        });

        RpcServer::new(
            self.store,
            self.config.account.id.clone(),
            self.events,
            port,
        )
        .start()
        .await;
    }
}
