use clap::Parser;
use dvpn_node_client::application::deferred::DeferredNode;
use dvpn_node_client::application::events::EventHub;
use dvpn_node_client::application::facade::NodeClient;
use dvpn_node_client::application::session::PaymentSession;
use dvpn_node_client::domain::connection::ConnectRequest;
use dvpn_node_client::domain::payment::{CreateOrderRequest, Order, OrderStatus};
use dvpn_node_client::domain::ports::EngineRef;
use dvpn_node_client::domain::proposal::{GetProposalsRequest, ProposalItem};
use dvpn_node_client::domain::wallet::{GetBalanceRequest, GetIdentityRequest};
use dvpn_node_client::infrastructure::in_memory::InMemoryEngine;
use miette::{IntoDiagnostic, Result, miette};
use rust_decimal_macros::dec;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

/// Demo session against the in-process engine: bootstrap, unlock the
/// identity, pick a proposal, connect, stream events, optionally settle a
/// top-up order, disconnect.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Only consider proposals from this country code
    #[arg(long)]
    country: Option<String>,

    /// Provider to connect through (defaults to the first proposal)
    #[arg(long)]
    provider: Option<String>,

    /// Create a simulated top-up order for this amount of MYST
    #[arg(long)]
    top_up: Option<f64>,

    /// Write the exported identity keystore to this path
    #[arg(long)]
    export_identity: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let engine = demo_engine().await;
    let node = Arc::new(DeferredNode::new());
    {
        let engine = engine.clone();
        node.start(move || async move {
            // Simulated node boot.
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(Arc::new(engine) as EngineRef)
        });
    }

    let client = Arc::new(NodeClient::new(Arc::clone(&node)));
    let events = EventHub::new(Arc::clone(&node));

    let identity = client
        .identity(&GetIdentityRequest::default())
        .await
        .into_diagnostic()?;
    println!(
        "identity: {} ({})",
        identity.address, identity.registration_status
    );

    let balance = client
        .balance(&GetBalanceRequest {
            identity_address: identity.address.clone(),
        })
        .await
        .into_diagnostic()?;
    println!("balance: {balance} MYST");

    let proposals = client
        .proposals(&GetProposalsRequest {
            refresh: true,
            ..Default::default()
        })
        .await
        .into_diagnostic()?;
    let candidates: Vec<&ProposalItem> = proposals
        .iter()
        .filter(|p| {
            cli.country
                .as_deref()
                .is_none_or(|c| p.country_code.eq_ignore_ascii_case(c))
        })
        .collect();
    println!("proposals: {}", candidates.len());
    let chosen = match cli.provider.as_deref() {
        Some(id) => candidates.iter().find(|p| p.provider_id == id),
        None => candidates.first(),
    }
    .ok_or_else(|| miette!("no proposal matches the requested provider/country"))?;

    let (status_tx, mut status_rx) = mpsc::unbounded_channel();
    events
        .on_status(move |state| {
            let _ = status_tx.send(state);
        })
        .await
        .into_diagnostic()?;
    events
        .on_statistics(|stats| {
            tracing::info!(
                duration = stats.duration_secs,
                received = stats.bytes_received,
                sent = stats.bytes_sent,
                tokens = stats.tokens_spent,
                "session statistics"
            );
        })
        .await
        .into_diagnostic()?;

    let request = ConnectRequest {
        identity_address: identity.address.clone(),
        provider_id: chosen.provider_id.clone(),
        service_type: chosen.service_type.clone(),
        dns_option: None,
    };
    client.connect(&request).await.into_diagnostic()?;
    wait_for_state(&mut status_rx, "Connected").await?;
    println!(
        "connected via {} ({})",
        chosen.provider_id, chosen.service_type
    );

    engine.emit_statistics(30, 1_048_576, 262_144, 0.005);

    if let Some(amount) = cli.top_up {
        let session = PaymentSession::new(Arc::clone(&client), EventHub::new(Arc::clone(&node)));
        let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();
        let order = session
            .create_order(
                &CreateOrderRequest {
                    identity_address: identity.address.clone(),
                    myst_amount: amount,
                    pay_currency: "MYST".into(),
                    lightning: false,
                },
                move |outcome| {
                    let _ = outcome_tx.send(outcome);
                },
            )
            .await
            .into_diagnostic()?;
        engine.emit_order_update(&order.id.to_string(), "paid");
        // The session itself never times out; the caller owns the deadline.
        let outcome = timeout(Duration::from_secs(2), outcome_rx.recv())
            .await
            .into_diagnostic()?
            .ok_or_else(|| miette!("payment outcome channel closed"))?;
        println!("order {}: {:?}", order.id, outcome);
    }

    if let Some(path) = &cli.export_identity {
        let keystore = client
            .export_identity(&identity.address, "demo")
            .await
            .into_diagnostic()?;
        std::fs::write(path, keystore).into_diagnostic()?;
        println!("identity keystore written to {}", path.display());
    }

    client.disconnect().await.into_diagnostic()?;
    wait_for_state(&mut status_rx, "NotConnected").await?;
    println!("disconnected");
    Ok(())
}

async fn wait_for_state(rx: &mut mpsc::UnboundedReceiver<String>, wanted: &str) -> Result<()> {
    let reached = async {
        while let Some(state) = rx.recv().await {
            tracing::info!(%state, "connection status");
            if state == wanted {
                return true;
            }
        }
        false
    };
    if timeout(Duration::from_secs(2), reached).await.into_diagnostic()? {
        Ok(())
    } else {
        Err(miette!("status stream ended before reaching {wanted}"))
    }
}

async fn demo_engine() -> InMemoryEngine {
    let engine = InMemoryEngine::new();
    engine.script_balance(12.5).await;
    engine
        .script_proposals(vec![
            proposal("0x10ab96cd9b3d52e4e04dfdaca8a5d1ca5f3f7bda", "wireguard", "DE", 2),
            proposal("0x27f1c4e9d05a1a8bfe4462c1c3dc4a7ce2e7a01c", "wireguard", "US", 3),
            proposal("0x3b8ed0ab38c1f0d4c4ad25d4a5cdd9c0a6b8ce22", "openvpn", "NL", 1),
        ])
        .await;
    engine
        .script_order(Order {
            id: 1,
            status: OrderStatus::Pending,
            currency: Some("MYST".into()),
            amount: Some(dec!(5.0)),
        })
        .await;
    engine
}

fn proposal(provider_id: &str, service_type: &str, country_code: &str, quality: u8) -> ProposalItem {
    ProposalItem {
        provider_id: provider_id.into(),
        service_type: service_type.into(),
        country_code: country_code.into(),
        ip_type: "residential".into(),
        quality_level: quality,
        price_per_gib: 0.12,
        price_per_hour: 0.0006,
    }
}
