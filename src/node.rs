use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::blockchain::Ledger;
use crate::config::Config;
use crate::crypto::generate_node_address;
use crate::error::Result;
use crate::miner::{CycleOutcome, Miner};
use crate::minter::Minter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeState {
    Booting,
    Ready,
    ShuttingDown,
}

pub struct Node {
    pub config: Config,
    pub ledger: Ledger,
    pub address: String,
    pub state: Arc<RwLock<NodeState>>,
    miner: Arc<Miner>,
    minter: Arc<Minter>,
    shutdown: watch::Sender<bool>,
}

impl Node {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let ledger = Ledger::new(config.chain.clone())?;
        let address = config.node.address.clone().unwrap_or_else(generate_node_address);

        let miner = Arc::new(Miner::new(ledger.clone(), address.clone()));
        let minter = Arc::new(Minter::new(ledger.clone()));
        let (shutdown, _) = watch::channel(false);

        Ok(Self {
            config,
            ledger,
            address,
            state: Arc::new(RwLock::new(NodeState::Booting)),
            miner,
            minter,
            shutdown,
        })
    }

    pub fn block_interval(&self) -> Duration {
        Duration::from_secs(self.config.chain.block_time)
    }

    /// Starts the PoW and PoS tasks allowed by the chain config.
    pub fn spawn_producers(&self) -> Vec<JoinHandle<()>> {
        let period = self.block_interval();
        let mut handles = Vec::new();

        if self.config.chain.pow_enabled {
            let miner = self.miner.clone();
            handles.push(tokio::spawn(produce(
                "pow",
                period,
                self.shutdown.subscribe(),
                move || {
                    let miner = miner.clone();
                    async move {
                        match tokio::task::spawn_blocking(move || miner.run_cycle()).await {
                            Ok(outcome) => outcome,
                            Err(e) => CycleOutcome::Rejected(format!("mining task failed: {}", e)),
                        }
                    }
                },
            )));
        }

        if self.config.chain.pos_enabled {
            let minter = self.minter.clone();
            handles.push(tokio::spawn(produce(
                "pos",
                period,
                self.shutdown.subscribe(),
                move || {
                    let minter = minter.clone();
                    async move { minter.run_cycle() }
                },
            )));
        }

        handles
    }

    /// Signals every producer to stop and interrupts an in-flight nonce search.
    pub fn shutdown(&self) {
        self.miner.stop_handle().store(true, Ordering::Relaxed);
        self.shutdown.send_replace(true);
    }

    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Runs producers and the API server until ctrl-c.
    pub async fn run(self: Arc<Self>) -> std::result::Result<(), Box<dyn std::error::Error>> {
        info!("🚀 {} node starting", self.config.chain.chain_name);
        info!("📍 Node address: {}", self.address);
        info!("⛓️  Chain ID: {}", self.config.chain.chain_id);
        info!("🌐 RPC port: {}", self.config.node.api_port);

        let producers = self.spawn_producers();
        *self.state.write().await = NodeState::Ready;

        let api_node = Arc::new(crate::api::ApiNode::new_shared(
            self.ledger.clone(),
            self.address.clone(),
            Some(self.state.clone()),
        ));
        let api_shutdown = self.shutdown_signal();
        let port = self.config.node.api_port;
        let api_task = tokio::spawn(async move {
            if let Err(e) = crate::api::run_api_server(api_node, port, api_shutdown).await {
                error!("API server failed: {}", e);
            }
        });

        tokio::signal::ctrl_c().await?;
        info!("Shutdown requested");
        *self.state.write().await = NodeState::ShuttingDown;
        self.shutdown();

        for handle in producers {
            let _ = handle.await;
        }
        let _ = api_task.await;
        info!("Node stopped");
        Ok(())
    }
}

/// Fires `cycle` once per `period` until shutdown. The first tick lands one
/// full period after start.
async fn produce<F, Fut>(kind: &'static str, period: Duration, mut shutdown: watch::Receiver<bool>, cycle: F)
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = CycleOutcome>,
{
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => break,
        }
        if *shutdown.borrow() {
            break;
        }
        let outcome = cycle().await;
        if outcome.block().is_none() {
            debug!(producer = kind, ?outcome, "cycle produced no block");
        }
    }
    debug!(producer = kind, "producer stopped");
}
