use serde::Serialize;

use crate::registry::{BudgetSnapshot, CircuitState};
use crate::resolver::Market;

/// Health snapshot of the gateway's upstream protection state.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayStatus {
    pub providers: Vec<ProviderStatus>,
}

impl GatewayStatus {
    /// True when no provider circuit is open.
    pub fn all_circuits_closed(&self) -> bool {
        self.providers
            .iter()
            .all(|p| p.circuit != CircuitState::Open)
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    pub id: String,
    pub market: Market,
    pub circuit: CircuitState,
    pub failure_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<BudgetStatus>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetStatus {
    pub max_per_window: u32,
    pub used: u32,
    pub remaining: u32,
    pub blocked: bool,
    /// Seconds until the block lifts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

impl From<BudgetSnapshot> for BudgetStatus {
    fn from(snapshot: BudgetSnapshot) -> Self {
        Self {
            max_per_window: snapshot.max_per_window,
            used: snapshot.used,
            remaining: snapshot.remaining,
            blocked: snapshot.blocked,
            retry_after_secs: snapshot.blocked_for.map(|d| d.as_secs().max(1)),
        }
    }
}
