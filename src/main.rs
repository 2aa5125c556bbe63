use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result, miette};
use rust_decimal::Decimal;
use stkpay::application::service::PaymentService;
use stkpay::application::session::SessionState;
use stkpay::config::Config;
use stkpay::domain::payment::{Amount, PaymentReference};
use tokio::sync::oneshot;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Push a payment prompt to a phone and wait for the payer to confirm
    Pay {
        /// Amount to charge
        #[arg(long)]
        amount: Decimal,

        /// Payer's phone, e.g. 0712345678 or 254712345678
        #[arg(long)]
        phone: String,
    },
    /// Query the gateway once for the status of a payment
    Status {
        #[arg(long)]
        reference: String,
    },
    /// List wallet history
    Activity,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().into_diagnostic()?;
    let service = PaymentService::from_config(&config).into_diagnostic()?;

    match cli.command {
        Command::Pay { amount, phone } => pay(&service, amount, &phone).await,
        Command::Status { reference } => {
            let report = service
                .check_status(&PaymentReference::new(reference))
                .await
                .into_diagnostic()?;
            println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
            Ok(())
        }
        Command::Activity => {
            let records = service.activity().await.into_diagnostic()?;
            println!("{}", serde_json::to_string_pretty(&records).into_diagnostic()?);
            Ok(())
        }
    }
}

async fn pay(service: &PaymentService, amount: Decimal, phone: &str) -> Result<()> {
    let amount = Amount::new(amount).into_diagnostic()?;
    let session = service.session(amount);

    let mut states = session.subscribe();
    tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = states.borrow_and_update().clone();
            match &state {
                SessionState::Processing => info!("Initiating STK push..."),
                SessionState::Polling { reference } => {
                    info!(reference = %reference, "Waiting for confirmation. Enter your PIN on your phone.")
                }
                other => info!(state = %other, "payment state changed"),
            }
        }
    });

    let (record_tx, record_rx) = oneshot::channel();
    let finished = tokio::select! {
        result = session.submit(phone, move |record| {
            let _ = record_tx.send(record);
        }) => result.into_diagnostic()?,
        _ = tokio::signal::ctrl_c() => {
            session.close();
            return Err(miette!("Payment cancelled"));
        }
    };

    match finished {
        SessionState::Success => {
            let record = record_rx.await.into_diagnostic()?;
            println!("{}", serde_json::to_string_pretty(&record).into_diagnostic()?);
            Ok(())
        }
        SessionState::Error { message } => Err(miette!("Payment failed: {}", message)),
        other => Err(miette!("Payment ended in unexpected state: {}", other)),
    }
}
