//! KYC Portal - QR intake and request console for bank staff.

use clap::{Parser, Subcommand};
use color_eyre::Result;
use color_eyre::eyre::{WrapErr, eyre};
use kycportal_api::KycApiClient;
use kycportal_cli::dashboard::{
    chain_receipt_message, ensure_action, find_request, payment_message, render_history,
    render_profiles, render_requests,
};
use kycportal_cli::decoder::decode_symbol;
use kycportal_cli::image_source::{decode_image_buffer, read_upload};
use kycportal_cli::qr_reader::CameraSource;
use kycportal_cli::{ConsoleNotifier, SubmissionController};
use kycportal_core::config::{get_config_path, load_config_from, save_config_to};
use kycportal_core::{
    AppConfig, ClientId, RequestId, RowAction, SessionState, parse_ether, parse_payload,
};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// KYC Portal - submit customer QR payloads and manage KYC requests.
#[derive(Parser, Debug)]
#[command(name = "kycportal")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Backend base URL (overrides the config file)
    #[arg(long = "api-url", global = true)]
    api_url: Option<String>,

    /// Camera device index used by `scan` (overrides the config file)
    #[arg(long, global = true)]
    camera: Option<u32>,

    /// Path of the config file to use instead of the platform default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Do not ask for confirmation before pay, check-reuse and delete
    #[arg(short, long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a QR image file and create a KYC request from it
    Upload {
        /// PNG or JPEG image containing the customer's QR code
        file: PathBuf,
    },
    /// Scan QR codes with the camera and create a KYC request
    Scan {
        /// Keep scanning after each created request
        #[arg(long)]
        continuous: bool,
    },
    /// Decode and validate a QR image without submitting it
    Decode { file: PathBuf },
    /// List KYC requests, refreshing pending identity checks first
    List,
    /// Send a request to Dukcapil for identity verification
    Verify { request_id: RequestId },
    /// Register or update a verified request on chain
    SendToChain { request_id: RequestId },
    /// Pay the reuse share to the home bank
    Pay {
        request_id: RequestId,
        /// Amount in ETH; the backend computes the share when omitted
        #[arg(long)]
        amount: Option<String>,
    },
    /// Pull and check reused KYC data after payment
    CheckReuse { request_id: RequestId },
    /// Delete a request
    Delete { request_id: RequestId },
    /// Show the on-chain KYC history of a client
    History { client_id: ClientId },
    /// List issued profile ids
    Profiles,
    /// Print the document URLs of a request
    Docs { request_id: RequestId },
    /// Show or write the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the effective configuration to the config file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    color_eyre::install()?;

    let level = if args.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("kycportal={}", level).parse()?)
        .add_directive(format!("kycportal_cli={}", level).parse()?)
        .add_directive(format!("kycportal_api={}", level).parse()?)
        .add_directive(format!("kycportal_core={}", level).parse()?);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => get_config_path()?,
    };
    let mut config = load_config_from(&config_path)
        .wrap_err_with(|| format!("Failed to load config from {}", config_path.display()))?;
    if let Some(url) = &args.api_url {
        config.api_base_url = url.clone();
    }
    if let Some(index) = args.camera {
        config.camera_index = index;
    }
    config.validate()?;
    tracing::debug!("Using backend at {}", config.api_base_url);

    match args.command {
        Command::Config { action } => run_config(action, &config, &config_path),
        Command::Decode { file } => run_decode(&file).await,
        command => {
            let client = KycApiClient::new(
                &config.api_base_url,
                Duration::from_secs(config.request_timeout_secs),
            )?;
            run_backend_command(command, client, &config, args.yes).await
        }
    }
}

fn run_config(action: ConfigAction, config: &AppConfig, path: &Path) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("# {}", path.display());
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        ConfigAction::Init => {
            save_config_to(config, path)?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}

async fn run_decode(file: &Path) -> Result<()> {
    let bytes = read_upload(file).await?;
    let frame = decode_image_buffer(&bytes)?;
    let text = decode_symbol(&frame)?;
    let payload = parse_payload(&text)?;
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

async fn run_backend_command(
    command: Command,
    client: KycApiClient,
    config: &AppConfig,
    assume_yes: bool,
) -> Result<()> {
    match command {
        Command::Upload { file } => {
            let mut controller = SubmissionController::new(Arc::new(client), ConsoleNotifier);
            let state = controller.upload(&file).await;
            report_outcome(state)
        }
        Command::Scan { continuous } => run_scan(client, config, continuous).await,
        Command::List => {
            let rows = client.load_and_sync().await?;
            print!("{}", render_requests(&rows));
            Ok(())
        }
        Command::Verify { request_id } => {
            checked_row(&client, request_id, RowAction::Verify).await?;
            client.send_to_dukcapil(request_id).await?;
            println!("✓ Request #{} sent to Dukcapil for verification.", request_id);
            Ok(())
        }
        Command::SendToChain { request_id } => {
            checked_row(&client, request_id, RowAction::SendToChain).await?;
            let receipt = client.send_to_chain(request_id).await?;
            println!("✓ {}", chain_receipt_message(&receipt));
            Ok(())
        }
        Command::Pay { request_id, amount } => {
            let amount_wei = amount.as_deref().map(parse_ether).transpose()?;
            checked_row(&client, request_id, RowAction::PayShare).await?;
            let prompt = match &amount {
                Some(eth) => format!("Pay {} ETH for request #{}?", eth.trim(), request_id),
                None => format!("Pay the reuse share for request #{}?", request_id),
            };
            if !confirm(&prompt, assume_yes)? {
                println!("Cancelled.");
                return Ok(());
            }
            let receipt = client.pay(request_id, amount_wei).await?;
            println!("✓ {}", payment_message(&receipt));
            Ok(())
        }
        Command::CheckReuse { request_id } => {
            checked_row(&client, request_id, RowAction::CheckReuse).await?;
            if !confirm(
                &format!("Fetch and verify reused data for request #{}?", request_id),
                assume_yes,
            )? {
                println!("Cancelled.");
                return Ok(());
            }
            let report = client.fetch_and_verify_reuse(request_id).await?;
            println!(
                "✓ {}",
                report
                    .message
                    .as_deref()
                    .unwrap_or("Data fetched and verified successfully!")
            );
            Ok(())
        }
        Command::Delete { request_id } => {
            let name = checked_row(&client, request_id, RowAction::Delete).await?;
            if !confirm(
                &format!(
                    "Delete request #{} ({})? This cannot be undone.",
                    request_id, name
                ),
                assume_yes,
            )? {
                println!("Cancelled.");
                return Ok(());
            }
            client.delete_request(request_id).await?;
            println!("✓ Request #{} deleted.", request_id);
            Ok(())
        }
        Command::History { client_id } => {
            let history = client.onchain_history(client_id).await?;
            print!("{}", render_history(client_id, &history));
            Ok(())
        }
        Command::Profiles => {
            let rows = client.profile_ids().await?;
            print!("{}", render_profiles(&rows));
            Ok(())
        }
        Command::Docs { request_id } => {
            println!("KTP:      {}", client.ktp_url(request_id));
            println!("Document: {}", client.docs_url(request_id));
            Ok(())
        }
        Command::Decode { .. } | Command::Config { .. } => {
            Err(eyre!("command does not use the backend"))
        }
    }
}

async fn run_scan(client: KycApiClient, config: &AppConfig, continuous: bool) -> Result<()> {
    let camera = CameraSource::new(
        config.camera_index,
        Duration::from_millis(config.frame_interval_ms),
    );
    let mut controller = SubmissionController::new(Arc::new(client), ConsoleNotifier);
    let (mut subscription, events) = camera.subscribe();
    println!("Scanning with camera {}. Press Ctrl-C to stop.", config.camera_index);

    let outcome = tokio::select! {
        state = controller.run_scan(events, continuous) => Some(state.clone()),
        _ = tokio::signal::ctrl_c() => None,
    };
    subscription.unsubscribe();

    match outcome {
        Some(state) => report_outcome(&state),
        None => {
            println!("Scan stopped.");
            Ok(())
        }
    }
}

/// Print the terminal state of one intake run.
fn report_outcome(state: &SessionState) -> Result<()> {
    match state.outcome() {
        Some(success) => {
            println!("{}", success.summary());
            Ok(())
        }
        None => Err(eyre!("No KYC request was created")),
    }
}

/// Fetch the row and make sure `action` is currently offered for it.
async fn checked_row(
    client: &KycApiClient,
    request_id: RequestId,
    action: RowAction,
) -> Result<String> {
    let rows = client.list_requests().await?;
    let row = find_request(&rows, request_id)?;
    ensure_action(row, action)?;
    Ok(row.customer_name.clone())
}

fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
