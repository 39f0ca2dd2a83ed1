use crate::domain::connection::{ConnectRequest, ConnectionStatus};
use crate::domain::payment::{CreateOrderRequest, ListOrdersRequest};
use crate::domain::proposal::GetProposalsRequest;
use crate::domain::wallet::{
    Estimates, GetBalanceRequest, GetIdentityRequest, RegisterIdentityRequest,
    ResidentCountryUpdateRequest, SendFeedbackRequest, SessionFilter,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Shared handle to a running engine. All façade calls and subscriptions
/// operate on the same instance.
pub type EngineRef = Arc<dyn NodeEngine>;

/// Opaque failure raised by the engine. Pass-through operations forward
/// these unchanged; no local recovery is attempted.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine is not running")]
    NotRunning,
    #[error("engine call failed: {source}")]
    Call {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl EngineError {
    pub fn call(message: impl Into<String>) -> Self {
        Self::Call {
            source: Box::new(std::io::Error::other(message.into())),
        }
    }
}

/// Non-success reply from the engine's connect/reconnect primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectFault {
    pub code: String,
    pub message: String,
}

impl ConnectFault {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Identity fields in the engine's own naming.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentityReply {
    pub identity_address: String,
    pub channel_address: String,
    pub registration_status: String,
}

/// Egress location in the engine's own naming.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationReply {
    pub ip: String,
    pub country: String,
}

pub type StatusCallback = Box<dyn Fn(String) + Send + Sync>;
/// Raw positional fields: duration, bytes received, bytes sent, tokens spent.
pub type StatisticsCallback = Box<dyn Fn(u64, u64, u64, f64) + Send + Sync>;
/// Identity address plus the new balance.
pub type BalanceCallback = Box<dyn Fn(String, f64) + Send + Sync>;
/// Raw order id and status strings.
pub type OrderUpdatedCallback = Box<dyn Fn(String, String) + Send + Sync>;

/// Port over the background node engine (tunneling, identity and payment
/// settlement all live behind it).
///
/// Methods returning collections of proposals or orders return an opaque
/// serialized byte payload; decoding is this crate's responsibility.
/// Registered callbacks are invoked on an engine-owned notification thread,
/// never on a caller's task, and the engine keeps at most one callback per
/// stream: registering again replaces the previous one.
#[async_trait]
pub trait NodeEngine: Send + Sync {
    /// `None` means the connection was established; `Some` carries the
    /// engine's error code and message.
    async fn connect(&self, req: &ConnectRequest) -> EngineResult<Option<ConnectFault>>;
    async fn reconnect(&self, req: &ConnectRequest) -> EngineResult<Option<ConnectFault>>;
    async fn disconnect(&self) -> EngineResult<()>;

    /// Unlocks the identity, creating a default one first if none exists.
    async fn get_identity(&self, req: &GetIdentityRequest) -> EngineResult<IdentityReply>;
    async fn identity_registration_fees(&self) -> EngineResult<f64>;
    async fn register_identity(&self, req: &RegisterIdentityRequest) -> EngineResult<()>;
    async fn export_identity(&self, address: &str, passphrase: &str) -> EngineResult<Vec<u8>>;
    async fn import_identity(&self, key: &[u8], passphrase: &str) -> EngineResult<String>;
    async fn registration_token_reward(&self, token: &str) -> EngineResult<f64>;
    async fn is_free_registration_eligible(&self, address: &str) -> EngineResult<bool>;

    async fn get_proposals(&self, req: &GetProposalsRequest) -> EngineResult<Vec<u8>>;
    async fn list_proposal_filter_presets(&self) -> EngineResult<Vec<u8>>;

    async fn get_balance(&self, req: &GetBalanceRequest) -> EngineResult<f64>;
    async fn force_balance_update(&self, req: &GetBalanceRequest) -> EngineResult<f64>;
    async fn create_order(&self, req: &CreateOrderRequest) -> EngineResult<Vec<u8>>;
    async fn list_orders(&self, req: &ListOrdersRequest) -> EngineResult<Vec<u8>>;
    async fn exchange_rate(&self, currency: &str) -> EngineResult<f64>;
    async fn calculate_estimates(&self, balance: f64) -> EngineResult<Estimates>;

    async fn location(&self) -> EngineResult<LocationReply>;
    async fn status(&self) -> EngineResult<ConnectionStatus>;
    async fn list_consumer_sessions(&self, filter: &SessionFilter) -> EngineResult<Vec<u8>>;
    async fn send_feedback(&self, req: &SendFeedbackRequest) -> EngineResult<()>;
    async fn resident_country(&self) -> EngineResult<String>;
    async fn update_resident_country(&self, req: &ResidentCountryUpdateRequest) -> EngineResult<()>;

    async fn register_status_callback(&self, cb: StatusCallback);
    async fn register_statistics_callback(&self, cb: StatisticsCallback);
    async fn register_balance_callback(&self, cb: BalanceCallback);
    async fn register_order_updated_callback(&self, cb: OrderUpdatedCallback);
}
