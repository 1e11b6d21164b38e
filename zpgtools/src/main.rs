use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::*;
use zeno_payment_engine::{db_types::OrderId, PurchaseRequest};
use zpg_common::Shillings;
use zpgtools::{ClientConfig, PaymentServerClient, PollOutcome, PollerConfig, StatusPoller};

#[derive(Parser, Debug)]
#[command(version = "1.0.0", about = "Command-line client for the Zeno payment server")]
pub struct Arguments {
    /// The payment server to talk to. Overrides ZPG_SERVER_URL.
    #[arg(short = 'u', long = "server")]
    server: Option<url::Url>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[clap(name = "health", about = "Check that the payment server is up")]
    Health,
    #[clap(name = "purchase", about = "Start a mobile money payment")]
    Purchase(PurchaseParams),
    #[clap(name = "status", about = "Show the current status of an order")]
    Status { order_id: OrderId },
    #[clap(name = "poll", about = "Poll an order until it completes or fails")]
    Poll(PollParams),
    #[clap(name = "buy", about = "Start a payment and wait for the buyer to approve it")]
    Buy(PurchaseParams),
}

#[derive(Debug, Args)]
pub struct PurchaseParams {
    /// The buyer's mobile number, e.g. 0754123456 or +255754123456
    #[arg(short = 'p', long = "phone")]
    phone: String,
    /// The amount, in Tanzanian shillings. Defaults to ZPG_PRODUCT_PRICE
    #[arg(short = 'a', long = "amount")]
    amount: Option<i64>,
    #[arg(short = 'e', long = "email")]
    email: Option<String>,
    #[arg(short = 'n', long = "name")]
    name: Option<String>,
    /// Repeat requests with the same key return the original order instead of charging the buyer again
    #[arg(short = 'k', long = "idempotency-key")]
    idempotency_key: Option<String>,
}

#[derive(Debug, Args)]
pub struct PollParams {
    order_id: OrderId,
    /// Seconds between queries. Defaults to ZPG_POLL_INTERVAL
    #[arg(short = 'i', long = "interval")]
    interval: Option<u64>,
    /// Give up after this many queries. Defaults to ZPG_POLL_MAX_ATTEMPTS
    #[arg(short = 'm', long = "max-attempts")]
    max_attempts: Option<usize>,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();
    let cli = Arguments::parse();
    if let Err(e) = run(cli).await {
        eprintln!("❌️ {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Arguments) -> Result<()> {
    let mut config = ClientConfig::from_env_or_default().map_err(|e| anyhow!("Invalid ZPG_SERVER_URL. {e}"))?;
    if let Some(server) = cli.server {
        config.server_url = server;
    }
    let client = PaymentServerClient::new(config.server_url.clone())?;
    debug!("Using payment server at {}", client.server());
    match cli.command {
        Command::Health => {
            let response = client.health().await?;
            println!("{}", response.trim());
        },
        Command::Purchase(params) => {
            let order_id = start_payment(&client, &config, params).await?;
            println!("Check progress with `zpgtools status {order_id}`");
        },
        Command::Status { order_id } => match client.payment_status(&order_id).await? {
            Some(status) => println!("Order {}: {} (last updated {})", status.order_id, status.status, status.timestamp),
            None => println!("Order {order_id} does not exist"),
        },
        Command::Poll(params) => {
            let mut poller = config.poller;
            if let Some(secs) = params.interval {
                poller.interval = Duration::from_secs(secs.max(1));
            }
            if let Some(n) = params.max_attempts {
                poller.max_attempts = n.max(1);
            }
            let outcome = wait_for_payment(client, poller, params.order_id).await;
            report_outcome(&outcome);
        },
        Command::Buy(params) => {
            let order_id = start_payment(&client, &config, params).await?;
            println!("Approve the payment on your phone. Press Ctrl-C to stop waiting.");
            let outcome = wait_for_payment(client, config.poller, order_id).await;
            report_outcome(&outcome);
        },
    }
    Ok(())
}

async fn start_payment(client: &PaymentServerClient, config: &ClientConfig, params: PurchaseParams) -> Result<OrderId> {
    let amount = params.amount.map(Shillings::from).unwrap_or(config.product_price);
    let purchase = PurchaseRequest {
        buyer_email: params.email,
        buyer_name: params.name,
        buyer_phone: Some(params.phone),
        amount: Some(amount),
        idempotency_key: params.idempotency_key,
    };
    let response = client.process_payment(&purchase).await?;
    println!("Payment for {amount} started. Order id: {}", response.order_id);
    debug!("Payment details: {}", response.payment_details);
    Ok(response.order_id)
}

/// Polls until the order resolves, the attempts run out, or the user hits Ctrl-C.
async fn wait_for_payment(client: PaymentServerClient, config: PollerConfig, order_id: OrderId) -> PollOutcome {
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:5} {msg} [{elapsed}]") {
        pb.set_style(style.tick_strings(&["🕛 ", "🕐 ", "🕑 ", "🕒 ", "🕓 ", "🕔 ", "🕕 ", "🕖 ", "🕗 ", "🕘 ", "🕙 ", "🕚 "]));
    }
    pb.set_message(format!("Waiting for order {order_id}"));
    let handle = StatusPoller::new(client, config).spawn(order_id);
    let outcome = tokio::select! {
        outcome = handle.outcome() => outcome,
        _ = tokio::signal::ctrl_c() => PollOutcome::Cancelled,
    };
    pb.finish_and_clear();
    outcome
}

fn report_outcome(outcome: &PollOutcome) {
    match outcome {
        PollOutcome::Completed => println!("✅️ Payment received. Thank you!"),
        PollOutcome::Failed => println!("❌️ The payment failed or was declined."),
        PollOutcome::NotFound => println!("❓️ The payment server does not know this order."),
        PollOutcome::StillProcessing { attempts } => {
            println!("⏳️ Still processing after {attempts} checks. Check back later.")
        },
        PollOutcome::Cancelled => println!("Stopped waiting. The payment may still complete."),
    }
}
