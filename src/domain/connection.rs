/// Parameters for a connect or reconnect attempt.
///
/// Produced by the caller and consumed once per call; this crate never
/// retries a connection request on its own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectRequest {
    pub identity_address: String,
    pub provider_id: String,
    pub service_type: String,
    pub dns_option: Option<String>,
}

/// Connection status as reported by the engine's `status` primitive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionStatus {
    pub state: String,
    pub provider_id: String,
    pub service_type: String,
}

/// Traffic counters pushed by the engine while a session is active.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistics {
    pub duration_secs: u64,
    pub bytes_received: u64,
    pub bytes_sent: u64,
    pub tokens_spent: f64,
}

/// Current egress location with country and IP.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub ip: String,
    pub country_code: String,
}
