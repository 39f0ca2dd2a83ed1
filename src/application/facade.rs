use crate::application::deferred::DeferredNode;
use crate::domain::connection::{ConnectRequest, ConnectionStatus, Location};
use crate::domain::payment::{CreateOrderRequest, ListOrdersRequest, Order};
use crate::domain::ports::{ConnectFault, EngineRef};
use crate::domain::proposal::{GetProposalsRequest, ProposalItem};
use crate::domain::wallet::{
    Estimates, GetBalanceRequest, GetIdentityRequest, Identity, RegisterIdentityRequest,
    RegistrationFees, ResidentCountryUpdateRequest, SendFeedbackRequest, SessionFilter,
};
use crate::error::{NodeError, Result, classify};
use crate::interfaces::json::payloads;
use std::sync::Arc;

/// Typed operation surface over the node engine.
///
/// Every operation awaits the deferred handle first, then forwards to the
/// corresponding engine primitive and translates the raw result. Results
/// are otherwise passed through untouched; mapping raw engine values to
/// presentation types belongs to the layers above. The engine instance is
/// shared and concurrent calls are not serialized here.
pub struct NodeClient {
    node: Arc<DeferredNode>,
}

impl NodeClient {
    pub fn new(node: Arc<DeferredNode>) -> Self {
        Self { node }
    }

    /// The bootstrap handle this client waits on.
    pub fn node(&self) -> &Arc<DeferredNode> {
        &self.node
    }

    async fn engine(&self) -> Result<EngineRef> {
        self.node.engine().await
    }

    /// Connects to the VPN service through the given proposal.
    pub async fn connect(&self, req: &ConnectRequest) -> Result<()> {
        let fault = self.engine().await?.connect(req).await?;
        Self::check_connect(fault)
    }

    /// Re-establishes the connection. Faults are classified by the same
    /// routine as `connect`.
    pub async fn reconnect(&self, req: &ConnectRequest) -> Result<()> {
        let fault = self.engine().await?.reconnect(req).await?;
        Self::check_connect(fault)
    }

    fn check_connect(fault: Option<ConnectFault>) -> Result<()> {
        match fault {
            None => Ok(()),
            Some(fault) => {
                tracing::error!(code = %fault.code, message = %fault.message, "connect rejected");
                Err(NodeError::Connect {
                    kind: classify(&fault.code, &fault.message),
                    message: fault.message,
                })
            }
        }
    }

    /// Disconnects from the VPN service. Best effort; an engine failure
    /// propagates unchanged.
    pub async fn disconnect(&self) -> Result<()> {
        Ok(self.engine().await?.disconnect().await?)
    }

    /// Unlocks the identity and returns its addresses and raw registration
    /// status. The engine creates a default identity if none exists yet.
    pub async fn identity(&self, req: &GetIdentityRequest) -> Result<Identity> {
        let reply = self.engine().await?.get_identity(req).await?;
        Ok(Identity {
            address: reply.identity_address,
            channel_address: reply.channel_address,
            registration_status: reply.registration_status,
        })
    }

    pub async fn registration_fees(&self) -> Result<RegistrationFees> {
        let fee = self.engine().await?.identity_registration_fees().await?;
        Ok(RegistrationFees { fee })
    }

    pub async fn register_identity(&self, req: &RegisterIdentityRequest) -> Result<()> {
        Ok(self.engine().await?.register_identity(req).await?)
    }

    /// Exports the identity keystore encrypted with `passphrase`.
    pub async fn export_identity(&self, address: &str, passphrase: &str) -> Result<Vec<u8>> {
        Ok(self.engine().await?.export_identity(address, passphrase).await?)
    }

    /// Imports a previously exported keystore and returns its address.
    pub async fn import_identity(&self, key: &[u8], passphrase: &str) -> Result<String> {
        Ok(self.engine().await?.import_identity(key, passphrase).await?)
    }

    pub async fn registration_token_reward(&self, token: &str) -> Result<f64> {
        Ok(self.engine().await?.registration_token_reward(token).await?)
    }

    pub async fn is_free_registration_eligible(&self, address: &str) -> Result<bool> {
        Ok(self
            .engine()
            .await?
            .is_free_registration_eligible(address)
            .await?)
    }

    /// Available proposals. Absence of proposals is a normal state: a
    /// missing, null or undecodable list comes back empty instead of as an
    /// error.
    pub async fn proposals(&self, req: &GetProposalsRequest) -> Result<Vec<ProposalItem>> {
        self.fetch_proposals(req).await
    }

    /// Proposals matching the saved filter preset named by
    /// `req.filter_id`; same leniency as `proposals`.
    pub async fn proposals_by_filter(
        &self,
        req: &GetProposalsRequest,
    ) -> Result<Vec<ProposalItem>> {
        self.fetch_proposals(req).await
    }

    async fn fetch_proposals(&self, req: &GetProposalsRequest) -> Result<Vec<ProposalItem>> {
        let bytes = self.engine().await?.get_proposals(req).await?;
        let proposals = match payloads::decode_proposals(&bytes) {
            Ok(response) => response.proposals.unwrap_or_default(),
            Err(err) => {
                tracing::warn!(error = %err, "undecodable proposal payload, treating as empty");
                Vec::new()
            }
        };
        Ok(proposals)
    }

    /// Saved proposal filter presets as the engine's raw payload.
    pub async fn filter_presets(&self) -> Result<Vec<u8>> {
        Ok(self.engine().await?.list_proposal_filter_presets().await?)
    }

    pub async fn balance(&self, req: &GetBalanceRequest) -> Result<f64> {
        Ok(self.engine().await?.get_balance(req).await?)
    }

    /// Makes the engine refresh the balance immediately; the new value is
    /// also pushed on the balance stream.
    pub async fn force_balance_update(&self, req: &GetBalanceRequest) -> Result<f64> {
        Ok(self.engine().await?.force_balance_update(req).await?)
    }

    /// Creates a top-up payment order. A payload that cannot be decoded is
    /// a hard error: without the order id the payment workflow cannot
    /// continue.
    pub async fn create_payment_order(&self, req: &CreateOrderRequest) -> Result<Order> {
        let bytes = self.engine().await?.create_order(req).await?;
        tracing::debug!(payload = %String::from_utf8_lossy(&bytes), "create order response");
        Ok(payloads::decode_order(&bytes)?)
    }

    /// Past payment orders, decoded strictly like `create_payment_order`.
    pub async fn orders(&self, req: &ListOrdersRequest) -> Result<Vec<Order>> {
        let bytes = self.engine().await?.list_orders(req).await?;
        Ok(payloads::decode_orders(&bytes)?)
    }

    pub async fn exchange_rate(&self, currency: &str) -> Result<f64> {
        Ok(self.engine().await?.exchange_rate(currency).await?)
    }

    pub async fn wallet_estimates(&self, balance: f64) -> Result<Estimates> {
        Ok(self.engine().await?.calculate_estimates(balance).await?)
    }

    /// Current egress location with country and IP.
    pub async fn location(&self) -> Result<Location> {
        let reply = self.engine().await?.location().await?;
        Ok(Location {
            ip: reply.ip,
            country_code: reply.country,
        })
    }

    /// Current connection status.
    pub async fn status(&self) -> Result<ConnectionStatus> {
        Ok(self.engine().await?.status().await?)
    }

    /// Recent consumer sessions as the engine's raw payload.
    pub async fn last_sessions(&self, filter: &SessionFilter) -> Result<Vec<u8>> {
        Ok(self.engine().await?.list_consumer_sessions(filter).await?)
    }

    pub async fn send_feedback(&self, req: &SendFeedbackRequest) -> Result<()> {
        Ok(self.engine().await?.send_feedback(req).await?)
    }

    pub async fn resident_country(&self) -> Result<String> {
        Ok(self.engine().await?.resident_country().await?)
    }

    pub async fn save_resident_country(&self, req: &ResidentCountryUpdateRequest) -> Result<()> {
        Ok(self.engine().await?.update_resident_country(req).await?)
    }
}
