//! Connections from the crank to an arena host
//!
//! `LocalHost` runs an in-process `Arena` behind a mutex (one transaction at
//! a time, like the ledger). `RpcClient` talks JSON over HTTP to a remote
//! host. Both hand back structured `ArenaError`s.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::arena::{Arena, Instruction, Outcome};
use crate::combat::Battle;
use crate::core::error::{ArenaError, Result};
use crate::core::types::{BattleId, TxContext, UserId};
use crate::crank::clock::Clock;
use crate::market::Market;

pub trait ArenaClient: Send + Sync {
    fn battle(&self, id: BattleId) -> impl Future<Output = Result<Option<Battle>>> + Send;

    fn market(&self, id: BattleId) -> impl Future<Output = Result<Option<Market>>> + Send;

    /// Submit one signed transaction
    fn execute(&self, instruction: Instruction) -> impl Future<Output = Result<Outcome>> + Send;
}

/// In-process host
#[derive(Debug, Clone)]
pub struct LocalHost<C> {
    arena: Arc<Mutex<Arena>>,
    clock: C,
    slot: Arc<AtomicU64>,
    signer: UserId,
}

impl<C: Clock + Clone> LocalHost<C> {
    pub fn new(arena: Arena, clock: C, signer: UserId) -> Self {
        Self {
            arena: Arc::new(Mutex::new(arena)),
            clock,
            slot: Arc::new(AtomicU64::new(0)),
            signer,
        }
    }

    /// Another connection to the same arena, signing as `signer`
    pub fn connect(&self, signer: UserId) -> Self {
        Self {
            arena: Arc::clone(&self.arena),
            clock: self.clock.clone(),
            slot: Arc::clone(&self.slot),
            signer,
        }
    }

    pub fn arena(&self) -> Arc<Mutex<Arena>> {
        Arc::clone(&self.arena)
    }

    fn next_context(&self) -> TxContext {
        let slot = self.slot.fetch_add(1, Ordering::SeqCst);
        TxContext::new(self.signer, self.clock.now(), slot)
    }
}

impl<C: Clock + Clone> ArenaClient for LocalHost<C> {
    async fn battle(&self, id: BattleId) -> Result<Option<Battle>> {
        Ok(self.arena.lock().await.battle(id).cloned())
    }

    async fn market(&self, id: BattleId) -> Result<Option<Market>> {
        Ok(self.arena.lock().await.market(id).cloned())
    }

    async fn execute(&self, instruction: Instruction) -> Result<Outcome> {
        let mut arena = self.arena.lock().await;
        let ctx = self.next_context();
        arena.execute(&ctx, instruction)
    }
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Debug, Serialize)]
struct BattleIdParams {
    battle_id: BattleId,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<ArenaError>,
}

impl<T> RpcResponse<T> {
    fn into_result(self) -> Result<Option<T>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.result),
        }
    }
}

/// JSON-RPC client for a remote arena host.
///
/// The host signs with the operator's key; `signer` is sent so it can pick
/// the right one.
pub struct RpcClient {
    client: Client,
    endpoint: String,
    signer: UserId,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(endpoint: impl Into<String>, signer: UserId) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            signer,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call<P, T>(&self, method: &str, params: P) -> Result<Option<T>>
    where
        P: Serialize + Send,
        T: DeserializeOwned,
    {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/json")
            .header("x-arena-signer", self.signer.to_string())
            .json(&request)
            .send()
            .await
            .map_err(|e| ArenaError::Host(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ArenaError::Host(format!("HTTP {}: {}", status, error_text)));
        }

        let body: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| ArenaError::Host(e.to_string()))?;
        body.into_result()
    }
}

impl ArenaClient for RpcClient {
    async fn battle(&self, id: BattleId) -> Result<Option<Battle>> {
        self.call("getBattle", BattleIdParams { battle_id: id }).await
    }

    async fn market(&self, id: BattleId) -> Result<Option<Market>> {
        self.call("getMarket", BattleIdParams { battle_id: id }).await
    }

    async fn execute(&self, instruction: Instruction) -> Result<Outcome> {
        self.call("sendInstruction", instruction)
            .await?
            .ok_or_else(|| ArenaError::Host("Empty result for sendInstruction".into()))
    }
}
