use crate::domain::connection::{ConnectRequest, ConnectionStatus};
use crate::domain::payment::{CreateOrderRequest, ListOrdersRequest, Order};
use crate::domain::ports::{
    BalanceCallback, ConnectFault, EngineError, EngineResult, IdentityReply, LocationReply,
    NodeEngine, OrderUpdatedCallback, StatisticsCallback, StatusCallback,
};
use crate::domain::proposal::{GetProposalsRequest, ProposalItem, ProposalsResponse};
use crate::domain::wallet::{
    Estimates, GetBalanceRequest, GetIdentityRequest, RegisterIdentityRequest,
    ResidentCountryUpdateRequest, SendFeedbackRequest, SessionFilter,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use tokio::sync::RwLock;
use tokio::sync::mpsc;

enum Notification {
    Status(String),
    Statistics {
        duration_secs: u64,
        bytes_received: u64,
        bytes_sent: u64,
        tokens_spent: f64,
    },
    Balance {
        address: String,
        amount: f64,
    },
    OrderUpdated {
        order_id: String,
        status: String,
    },
}

/// One callback slot per stream: registering again replaces the previous
/// subscriber, exactly like the real engine bridge.
#[derive(Default)]
struct CallbackSlots {
    status: Mutex<Option<StatusCallback>>,
    statistics: Mutex<Option<StatisticsCallback>>,
    balance: Mutex<Option<BalanceCallback>>,
    order_updated: Mutex<Option<OrderUpdatedCallback>>,
}

fn slot<T>(slot: &Mutex<T>) -> MutexGuard<'_, T> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

struct EngineInner {
    identity: IdentityReply,
    balance: f64,
    connect_fault: Option<ConnectFault>,
    proposals: Option<Vec<ProposalItem>>,
    proposals_payload_override: Option<Vec<u8>>,
    order: Option<Order>,
    order_payload_override: Option<Vec<u8>>,
    orders: Vec<Order>,
    orders_payload_override: Option<Vec<u8>>,
    filter_presets_payload: Vec<u8>,
    sessions_payload: Vec<u8>,
    status: ConnectionStatus,
    location: LocationReply,
    resident_country: String,
    exchange_rates: HashMap<String, f64>,
    registration_fee: f64,
    token_rewards: HashMap<String, f64>,
    free_registration_eligible: bool,
    op_error: Option<(String, String)>,
    feedback: Vec<SendFeedbackRequest>,
}

impl Default for EngineInner {
    fn default() -> Self {
        Self {
            identity: IdentityReply {
                identity_address: "0x62a2fd21a2b54a0de72373f0e4b04d6eb711df04".into(),
                channel_address: "0x8cf2fd21a2b54a0de72373f0e4b04d6eb711c1a0".into(),
                registration_status: "Registered".into(),
            },
            balance: 0.0,
            connect_fault: None,
            proposals: None,
            proposals_payload_override: None,
            order: None,
            order_payload_override: None,
            orders: Vec::new(),
            orders_payload_override: None,
            filter_presets_payload: b"[]".to_vec(),
            sessions_payload: b"[]".to_vec(),
            status: ConnectionStatus {
                state: "NotConnected".into(),
                provider_id: String::new(),
                service_type: String::new(),
            },
            location: LocationReply {
                ip: "127.0.0.1".into(),
                country: "GB".into(),
            },
            resident_country: "GB".into(),
            exchange_rates: HashMap::from([("USD".to_string(), 0.21), ("EUR".to_string(), 0.19)]),
            registration_fee: 0.15,
            token_rewards: HashMap::new(),
            free_registration_eligible: true,
            op_error: None,
            feedback: Vec::new(),
        }
    }
}

/// Scriptable in-process engine used by the demo binary and the tests.
///
/// State lives behind `Arc<RwLock<…>>` for shared concurrent access. Push
/// notifications go through a dedicated notification thread, so callbacks
/// run off the runtime and in emission order, like the real engine's
/// notification context. `Clone` shares the underlying engine.
#[derive(Clone)]
pub struct InMemoryEngine {
    inner: Arc<RwLock<EngineInner>>,
    callbacks: Arc<CallbackSlots>,
    notify_tx: mpsc::UnboundedSender<Notification>,
}

impl Default for InMemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEngine {
    pub fn new() -> Self {
        let (notify_tx, mut notify_rx) = mpsc::unbounded_channel();
        let callbacks = Arc::new(CallbackSlots::default());
        let slots = Arc::clone(&callbacks);
        thread::spawn(move || {
            while let Some(notification) = notify_rx.blocking_recv() {
                dispatch(&slots, notification);
            }
        });
        Self {
            inner: Arc::new(RwLock::new(EngineInner::default())),
            callbacks,
            notify_tx,
        }
    }

    // Scripting surface. Each setter overrides one piece of engine state
    // that the trait implementation below replies with.

    pub async fn script_identity(&self, identity: IdentityReply) {
        self.inner.write().await.identity = identity;
    }

    pub async fn script_balance(&self, balance: f64) {
        self.inner.write().await.balance = balance;
    }

    pub async fn script_connect_fault(&self, code: &str, message: &str) {
        self.inner.write().await.connect_fault = Some(ConnectFault::new(code, message));
    }

    pub async fn script_proposals(&self, proposals: Vec<ProposalItem>) {
        self.inner.write().await.proposals = Some(proposals);
    }

    /// Raw bytes returned by `get_proposals`, for malformed-payload cases.
    pub async fn script_proposals_payload(&self, payload: Vec<u8>) {
        self.inner.write().await.proposals_payload_override = Some(payload);
    }

    pub async fn script_order(&self, order: Order) {
        self.inner.write().await.order = Some(order);
    }

    /// Raw bytes returned by `create_order`, for malformed-payload cases.
    pub async fn script_order_payload(&self, payload: Vec<u8>) {
        self.inner.write().await.order_payload_override = Some(payload);
    }

    pub async fn script_orders(&self, orders: Vec<Order>) {
        self.inner.write().await.orders = orders;
    }

    /// Raw bytes returned by `list_orders`, for malformed-payload cases.
    pub async fn script_orders_payload(&self, payload: Vec<u8>) {
        self.inner.write().await.orders_payload_override = Some(payload);
    }

    pub async fn script_exchange_rate(&self, currency: &str, rate: f64) {
        self.inner
            .write()
            .await
            .exchange_rates
            .insert(currency.to_string(), rate);
    }

    pub async fn script_token_reward(&self, token: &str, reward: f64) {
        self.inner
            .write()
            .await
            .token_rewards
            .insert(token.to_string(), reward);
    }

    pub async fn script_registration_fee(&self, fee: f64) {
        self.inner.write().await.registration_fee = fee;
    }

    pub async fn script_free_registration_eligible(&self, eligible: bool) {
        self.inner.write().await.free_registration_eligible = eligible;
    }

    pub async fn script_sessions_payload(&self, payload: Vec<u8>) {
        self.inner.write().await.sessions_payload = payload;
    }

    pub async fn script_filter_presets_payload(&self, payload: Vec<u8>) {
        self.inner.write().await.filter_presets_payload = payload;
    }

    /// Makes the named operation fail with an opaque engine error.
    pub async fn script_op_error(&self, op: &str, message: &str) {
        self.inner.write().await.op_error = Some((op.to_string(), message.to_string()));
    }

    pub async fn last_feedback(&self) -> Option<SendFeedbackRequest> {
        self.inner.read().await.feedback.last().cloned()
    }

    // Notification surface. Emission is ordered per engine, not per stream:
    // the notification thread drains one queue.

    pub fn emit_status(&self, state: &str) {
        let _ = self.notify_tx.send(Notification::Status(state.to_string()));
    }

    pub fn emit_statistics(
        &self,
        duration_secs: u64,
        bytes_received: u64,
        bytes_sent: u64,
        tokens_spent: f64,
    ) {
        let _ = self.notify_tx.send(Notification::Statistics {
            duration_secs,
            bytes_received,
            bytes_sent,
            tokens_spent,
        });
    }

    pub fn emit_balance(&self, address: &str, amount: f64) {
        let _ = self.notify_tx.send(Notification::Balance {
            address: address.to_string(),
            amount,
        });
    }

    pub fn emit_order_update(&self, order_id: &str, status: &str) {
        let _ = self.notify_tx.send(Notification::OrderUpdated {
            order_id: order_id.to_string(),
            status: status.to_string(),
        });
    }

    async fn gate(&self, op: &str) -> EngineResult<()> {
        let inner = self.inner.read().await;
        match &inner.op_error {
            Some((failing, message)) if failing == op => Err(EngineError::call(message.clone())),
            _ => Ok(()),
        }
    }
}

fn dispatch(slots: &CallbackSlots, notification: Notification) {
    match notification {
        Notification::Status(state) => {
            if let Some(cb) = slot(&slots.status).as_ref() {
                cb(state);
            }
        }
        Notification::Statistics {
            duration_secs,
            bytes_received,
            bytes_sent,
            tokens_spent,
        } => {
            if let Some(cb) = slot(&slots.statistics).as_ref() {
                cb(duration_secs, bytes_received, bytes_sent, tokens_spent);
            }
        }
        Notification::Balance { address, amount } => {
            if let Some(cb) = slot(&slots.balance).as_ref() {
                cb(address, amount);
            }
        }
        Notification::OrderUpdated { order_id, status } => {
            if let Some(cb) = slot(&slots.order_updated).as_ref() {
                cb(order_id, status);
            }
        }
    }
}

fn encode<T: serde::Serialize>(value: &T) -> EngineResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|err| EngineError::call(err.to_string()))
}

#[async_trait]
impl NodeEngine for InMemoryEngine {
    async fn connect(&self, req: &ConnectRequest) -> EngineResult<Option<ConnectFault>> {
        self.gate("connect").await?;
        {
            let mut inner = self.inner.write().await;
            if let Some(fault) = inner.connect_fault.clone() {
                return Ok(Some(fault));
            }
            inner.status = ConnectionStatus {
                state: "Connected".into(),
                provider_id: req.provider_id.clone(),
                service_type: req.service_type.clone(),
            };
        }
        self.emit_status("Connecting");
        self.emit_status("Connected");
        Ok(None)
    }

    async fn reconnect(&self, req: &ConnectRequest) -> EngineResult<Option<ConnectFault>> {
        self.connect(req).await
    }

    async fn disconnect(&self) -> EngineResult<()> {
        self.gate("disconnect").await?;
        {
            let mut inner = self.inner.write().await;
            inner.status = ConnectionStatus {
                state: "NotConnected".into(),
                provider_id: String::new(),
                service_type: String::new(),
            };
        }
        self.emit_status("Disconnecting");
        self.emit_status("NotConnected");
        Ok(())
    }

    async fn get_identity(&self, req: &GetIdentityRequest) -> EngineResult<IdentityReply> {
        self.gate("get_identity").await?;
        let inner = self.inner.read().await;
        let mut identity = inner.identity.clone();
        if let Some(address) = &req.address {
            identity.identity_address = address.clone();
        }
        Ok(identity)
    }

    async fn identity_registration_fees(&self) -> EngineResult<f64> {
        self.gate("identity_registration_fees").await?;
        Ok(self.inner.read().await.registration_fee)
    }

    async fn register_identity(&self, _req: &RegisterIdentityRequest) -> EngineResult<()> {
        self.gate("register_identity").await?;
        self.inner.write().await.identity.registration_status = "InProgress".into();
        Ok(())
    }

    async fn export_identity(&self, address: &str, _passphrase: &str) -> EngineResult<Vec<u8>> {
        self.gate("export_identity").await?;
        encode(&serde_json::json!({
            "address": address,
            "crypto": { "cipher": "aes-128-ctr" },
            "version": 3,
        }))
    }

    async fn import_identity(&self, key: &[u8], _passphrase: &str) -> EngineResult<String> {
        self.gate("import_identity").await?;
        let keystore: serde_json::Value =
            serde_json::from_slice(key).map_err(|err| EngineError::call(err.to_string()))?;
        keystore
            .get("address")
            .and_then(|address| address.as_str())
            .map(str::to_string)
            .ok_or_else(|| EngineError::call("keystore has no address"))
    }

    async fn registration_token_reward(&self, token: &str) -> EngineResult<f64> {
        self.gate("registration_token_reward").await?;
        Ok(self
            .inner
            .read()
            .await
            .token_rewards
            .get(token)
            .copied()
            .unwrap_or(0.0))
    }

    async fn is_free_registration_eligible(&self, _address: &str) -> EngineResult<bool> {
        self.gate("is_free_registration_eligible").await?;
        Ok(self.inner.read().await.free_registration_eligible)
    }

    async fn get_proposals(&self, _req: &GetProposalsRequest) -> EngineResult<Vec<u8>> {
        self.gate("get_proposals").await?;
        let inner = self.inner.read().await;
        if let Some(payload) = &inner.proposals_payload_override {
            return Ok(payload.clone());
        }
        encode(&ProposalsResponse {
            proposals: inner.proposals.clone(),
        })
    }

    async fn list_proposal_filter_presets(&self) -> EngineResult<Vec<u8>> {
        self.gate("list_proposal_filter_presets").await?;
        Ok(self.inner.read().await.filter_presets_payload.clone())
    }

    async fn get_balance(&self, _req: &GetBalanceRequest) -> EngineResult<f64> {
        self.gate("get_balance").await?;
        Ok(self.inner.read().await.balance)
    }

    async fn force_balance_update(&self, req: &GetBalanceRequest) -> EngineResult<f64> {
        self.gate("force_balance_update").await?;
        let balance = self.inner.read().await.balance;
        self.emit_balance(&req.identity_address, balance);
        Ok(balance)
    }

    async fn create_order(&self, req: &CreateOrderRequest) -> EngineResult<Vec<u8>> {
        self.gate("create_order").await?;
        let inner = self.inner.read().await;
        if let Some(payload) = &inner.order_payload_override {
            return Ok(payload.clone());
        }
        match &inner.order {
            Some(order) => encode(order),
            None => Err(EngineError::call(format!(
                "no payment gateway for {}",
                req.pay_currency
            ))),
        }
    }

    async fn list_orders(&self, _req: &ListOrdersRequest) -> EngineResult<Vec<u8>> {
        self.gate("list_orders").await?;
        let inner = self.inner.read().await;
        if let Some(payload) = &inner.orders_payload_override {
            return Ok(payload.clone());
        }
        encode(&inner.orders)
    }

    async fn exchange_rate(&self, currency: &str) -> EngineResult<f64> {
        self.gate("exchange_rate").await?;
        self.inner
            .read()
            .await
            .exchange_rates
            .get(currency)
            .copied()
            .ok_or_else(|| EngineError::call(format!("no rate for {currency}")))
    }

    async fn calculate_estimates(&self, balance: f64) -> EngineResult<Estimates> {
        self.gate("calculate_estimates").await?;
        let usd_rate = self
            .inner
            .read()
            .await
            .exchange_rates
            .get("USD")
            .copied()
            .unwrap_or(0.0);
        Ok(Estimates {
            myst: balance,
            usd: balance * usd_rate,
        })
    }

    async fn location(&self) -> EngineResult<LocationReply> {
        self.gate("location").await?;
        Ok(self.inner.read().await.location.clone())
    }

    async fn status(&self) -> EngineResult<ConnectionStatus> {
        self.gate("status").await?;
        Ok(self.inner.read().await.status.clone())
    }

    async fn list_consumer_sessions(&self, _filter: &SessionFilter) -> EngineResult<Vec<u8>> {
        self.gate("list_consumer_sessions").await?;
        Ok(self.inner.read().await.sessions_payload.clone())
    }

    async fn send_feedback(&self, req: &SendFeedbackRequest) -> EngineResult<()> {
        self.gate("send_feedback").await?;
        self.inner.write().await.feedback.push(req.clone());
        Ok(())
    }

    async fn resident_country(&self) -> EngineResult<String> {
        self.gate("resident_country").await?;
        Ok(self.inner.read().await.resident_country.clone())
    }

    async fn update_resident_country(
        &self,
        req: &ResidentCountryUpdateRequest,
    ) -> EngineResult<()> {
        self.gate("update_resident_country").await?;
        self.inner.write().await.resident_country = req.country.clone();
        Ok(())
    }

    async fn register_status_callback(&self, cb: StatusCallback) {
        *slot(&self.callbacks.status) = Some(cb);
    }

    async fn register_statistics_callback(&self, cb: StatisticsCallback) {
        *slot(&self.callbacks.statistics) = Some(cb);
    }

    async fn register_balance_callback(&self, cb: BalanceCallback) {
        *slot(&self.callbacks.balance) = Some(cb);
    }

    async fn register_order_updated_callback(&self, cb: OrderUpdatedCallback) {
        *slot(&self.callbacks.order_updated) = Some(cb);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc::unbounded_channel;

    #[tokio::test]
    async fn test_scripted_connect_fault() {
        let engine = InMemoryEngine::new();
        engine
            .script_connect_fault("InsufficientBalance", "balance is 0")
            .await;

        let fault = engine
            .connect(&ConnectRequest::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fault.code, "InsufficientBalance");
    }

    #[tokio::test]
    async fn test_emission_order_is_preserved() {
        let engine = InMemoryEngine::new();
        let (tx, mut rx) = unbounded_channel();
        engine
            .register_status_callback(Box::new(move |state| {
                let _ = tx.send(state);
            }))
            .await;

        for state in ["Connecting", "Connected", "Disconnecting", "NotConnected"] {
            engine.emit_status(state);
        }
        for expected in ["Connecting", "Connected", "Disconnecting", "NotConnected"] {
            let got = tokio::time::timeout(Duration::from_secs(1), rx.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(got, expected);
        }
    }

    #[tokio::test]
    async fn test_registering_replaces_previous_callback() {
        let engine = InMemoryEngine::new();
        let (first_tx, mut first_rx) = unbounded_channel();
        let (second_tx, mut second_rx) = unbounded_channel();

        engine
            .register_balance_callback(Box::new(move |_, amount| {
                let _ = first_tx.send(amount);
            }))
            .await;
        engine
            .register_balance_callback(Box::new(move |_, amount| {
                let _ = second_tx.send(amount);
            }))
            .await;

        engine.emit_balance("0xaa", 3.5);
        let got = tokio::time::timeout(Duration::from_secs(1), second_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got, 3.5);
        assert!(first_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_op_error_gates_one_operation() {
        let engine = InMemoryEngine::new();
        engine.script_op_error("send_feedback", "smtp down").await;

        let err = engine
            .send_feedback(&SendFeedbackRequest::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("smtp down"));

        // Other operations are unaffected.
        assert!(engine.resident_country().await.is_ok());
    }
}
