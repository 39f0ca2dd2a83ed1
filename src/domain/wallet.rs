/// Client identity used for payment and registration.
///
/// `registration_status` is the raw engine string; mapping it to richer
/// types is left to callers so this crate never lags behind engine-side
/// additions.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub address: String,
    pub channel_address: String,
    pub registration_status: String,
}

/// Fee charged for registering an identity on chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegistrationFees {
    pub fee: f64,
}

/// Wallet-equivalent estimates for a token balance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimates {
    pub myst: f64,
    pub usd: f64,
}

/// Identity unlock parameters. The default request lets the engine create
/// and unlock its default identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetIdentityRequest {
    pub address: Option<String>,
    pub passphrase: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetBalanceRequest {
    pub identity_address: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegisterIdentityRequest {
    pub identity_address: String,
    pub token: Option<String>,
}

/// Filter for the consumer session history query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionFilter {
    pub max_entries: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SendFeedbackRequest {
    pub email: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResidentCountryUpdateRequest {
    pub identity_address: String,
    pub country: String,
}
