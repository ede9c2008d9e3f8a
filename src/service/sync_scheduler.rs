use crate::db::Account;
use crate::error::BridgeError;
use crate::service::account_sync::AccountSync;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[derive(Debug)]
pub enum SyncSchedulerMessage {
    /// Run a sync cycle; the outcome is only logged.
    Tick,
    /// Run a sync cycle and reply with every stored account.
    RunNow(RpcReplyPort<Result<Vec<Account>, BridgeError>>),
}

/// Handle for the sync scheduler actor.
#[derive(Clone)]
pub struct SyncSchedulerHandle {
    actor: ActorRef<SyncSchedulerMessage>,
}

impl SyncSchedulerHandle {
    /// Queue a sync cycle without waiting for it.
    pub fn trigger(&self) {
        let _ = ractor::cast!(self.actor, SyncSchedulerMessage::Tick);
    }

    /// Queue a sync cycle behind any in-flight one and wait for its result.
    pub async fn run_now(&self) -> Result<Vec<Account>, BridgeError> {
        ractor::call!(self.actor, SyncSchedulerMessage::RunNow)
            .map_err(|e| BridgeError::Scheduler(format!("RunNow RPC failed: {e}")))?
    }

    /// Stop the actor and its ticker.
    pub fn stop(&self) {
        self.actor.stop(None);
    }
}

struct SyncSchedulerState {
    sync: Arc<AccountSync>,
    ticker: Option<JoinHandle<()>>,
}

struct SyncSchedulerActor;

#[ractor::async_trait]
impl Actor for SyncSchedulerActor {
    type Msg = SyncSchedulerMessage;
    type State = SyncSchedulerState;
    type Arguments = (Arc<AccountSync>, Option<Duration>);

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        arguments: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let (sync, interval) = arguments;
        let ticker = interval.map(|period| {
            info!(interval_secs = period.as_secs(), "Periodic account sync enabled");
            myself.send_interval(period, || SyncSchedulerMessage::Tick)
        });
        Ok(SyncSchedulerState { sync, ticker })
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        if let Some(ticker) = state.ticker.take() {
            ticker.abort();
        }
        Ok(())
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        // Messages are handled one at a time, so sync cycles never overlap.
        match message {
            SyncSchedulerMessage::Tick => match state.sync.sync().await {
                Ok(accounts) => info!(count = accounts.len(), "Scheduled account sync finished"),
                Err(e) => warn!(error = %e, "Scheduled account sync failed"),
            },
            SyncSchedulerMessage::RunNow(rp) => {
                let result = state.sync.sync().await;
                match result.as_ref() {
                    Ok(accounts) => info!(count = accounts.len(), "On-demand account sync finished"),
                    Err(e) => warn!(error = %e, "On-demand account sync failed"),
                }
                let _ = rp.send(result);
            }
        }
        Ok(())
    }
}

/// Spawn the scheduler. With `interval` unset it only runs on demand.
pub async fn spawn(
    sync: Arc<AccountSync>,
    interval: Option<Duration>,
) -> Result<SyncSchedulerHandle, BridgeError> {
    let (actor, _jh) = Actor::spawn(None, SyncSchedulerActor, (sync, interval))
        .await
        .map_err(|e| BridgeError::Scheduler(format!("failed to spawn sync scheduler: {e}")))?;
    Ok(SyncSchedulerHandle { actor })
}
