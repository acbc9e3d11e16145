use crate::log_source::BoxedProvider;
use alloy::providers::ProviderBuilder;
use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use futures::future::join_all;
use resource_core::{ResourceError, Result};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Bytecode to attach at an address for the duration of a call batch.
#[derive(Debug, Clone, Default)]
pub struct StateOverrides {
    pub code: HashMap<Address, Bytes>,
}

impl StateOverrides {
    pub fn with_code(mut self, address: Address, code: Bytes) -> Self {
        self.code.insert(address, code);
        self
    }
}

/// One ABI-encoded call, addressed by a reference label within its group.
#[derive(Debug, Clone)]
pub struct Call {
    pub reference: String,
    pub calldata: Bytes,
}

/// Calls against one contract, addressed by a group reference label.
#[derive(Debug, Clone)]
pub struct CallGroup {
    pub reference: String,
    pub contract: Address,
    pub calls: Vec<Call>,
}

/// Results keyed by (group, call) reference. Individual call failures are
/// isolated; only transport-level problems fail the whole batch.
#[derive(Debug, Default)]
pub struct BatchResponse {
    results: HashMap<(String, String), std::result::Result<Bytes, String>>,
}

impl BatchResponse {
    pub fn insert(
        &mut self,
        group: &str,
        call: &str,
        result: std::result::Result<Bytes, String>,
    ) {
        self.results
            .insert((group.to_string(), call.to_string()), result);
    }

    pub fn get(&self, group: &str, call: &str) -> Result<&Bytes> {
        match self.results.get(&(group.to_string(), call.to_string())) {
            None => Err(ResourceError::MissingCallResult(
                group.to_string(),
                call.to_string(),
            )),
            Some(Err(reason)) => Err(ResourceError::CallFailed {
                group: group.to_string(),
                call: call.to_string(),
                reason: reason.clone(),
            }),
            Some(Ok(bytes)) => Ok(bytes),
        }
    }
}

/// Seam over batched `eth_call` with state overrides. The loader never talks
/// to a chain directly, so tests substitute canned responses here.
#[async_trait]
pub trait BatchCallExecutor: Send + Sync {
    async fn execute(
        &self,
        overrides: &StateOverrides,
        groups: &[CallGroup],
    ) -> Result<BatchResponse>;
}

/// Executor over plain JSON-RPC: one `eth_call` per call, all in flight
/// concurrently, each carrying the same state-override object.
pub struct RpcCallExecutor {
    provider: BoxedProvider,
}

impl RpcCallExecutor {
    pub fn new(rpc_url: &str) -> Result<Self> {
        let url: reqwest::Url = rpc_url
            .parse()
            .map_err(|e| ResourceError::Rpc(format!("Invalid HTTP URL: {}", e)))?;
        let provider = ProviderBuilder::new().connect_http(url);
        Ok(Self {
            provider: Arc::new(provider),
        })
    }

    pub fn from_provider(provider: BoxedProvider) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl BatchCallExecutor for RpcCallExecutor {
    async fn execute(
        &self,
        overrides: &StateOverrides,
        groups: &[CallGroup],
    ) -> Result<BatchResponse> {
        let override_object: serde_json::Value = overrides
            .code
            .iter()
            .map(|(address, code)| (format!("{address}"), json!({ "code": format!("{code}") })))
            .collect::<serde_json::Map<String, serde_json::Value>>()
            .into();

        let calls: Vec<(String, String, Address, Bytes)> = groups
            .iter()
            .flat_map(|group| {
                group.calls.iter().map(|call| {
                    (
                        group.reference.clone(),
                        call.reference.clone(),
                        group.contract,
                        call.calldata.clone(),
                    )
                })
            })
            .collect();

        let fetches = calls.iter().map(|(_, _, contract, calldata)| {
            let provider = self.provider.clone();
            let params = json!([
                { "to": format!("{contract}"), "data": format!("{calldata}") },
                "latest",
                override_object,
            ]);
            async move {
                provider
                    .client()
                    .request::<_, Bytes>("eth_call", params)
                    .await
                    .map_err(|e| format!("{e}"))
            }
        });

        let mut response = BatchResponse::default();
        let mut failed = 0usize;
        for ((group, call, _, _), result) in calls.iter().zip(join_all(fetches).await) {
            if result.is_err() {
                failed += 1;
            }
            response.insert(group, call, result);
        }
        if failed > 0 {
            debug!(failed, total = calls.len(), "Some batch calls reverted");
        }
        Ok(response)
    }
}
