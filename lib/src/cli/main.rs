// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Command line utility for interacting with the Ledger Ontology app

use std::{path::Path, time::Duration};

use clap::Parser;
use log::{debug, error, info, warn, LevelFilter};
use serde::Serialize;

use ledger_ont::{
    address::{address_from_public_key, address_from_script_hash},
    apdu::{
        message::{MsgFormat, PersonalMsg},
        path::{Bip32Path, DEFAULT_PATH},
        sign::SignResp,
        transaction::{MAX_TRANSACTION_LEN, MAX_TRANSACTION_LEN_LARGE},
    },
    transport::{Exchange, TcpOptions},
    verify::check_tx_signature,
    Config, DeviceHandle, Filter, LedgerProvider, SignSession,
};

mod helpers;
use helpers::*;

/// Ledger command line utility
#[derive(Clone, PartialEq, Debug, Parser)]
struct Options {
    /// Supported transports for ledger discovery
    #[clap(long, value_enum, default_value = "any")]
    target: Filter,

    /// Device index (where more than one device is available)
    #[clap(long, default_value = "0")]
    device_index: usize,

    #[clap(flatten)]
    tcp: TcpOptions,

    /// Handle configuration file (TOML)
    #[clap(long)]
    config: Option<String>,

    /// Subcommand to execute
    #[clap(subcommand)]
    cmd: Actions,

    /// Enable verbose logging
    #[clap(long, default_value = "info")]
    log_level: LevelFilter,
}

#[derive(Clone, PartialEq, Debug, Parser)]
#[non_exhaustive]
enum Actions {
    /// List available devices
    List,

    /// Fetch application name and version
    AppInfo,

    /// Fetch the public key and address for a BIP32 path
    PublicKey {
        /// BIP32 derivation path
        #[clap(long, default_value = DEFAULT_PATH)]
        path: Bip32Path,

        /// Display the address on the device for confirmation
        #[clap(long)]
        confirm: bool,

        /// Write key information to a JSON file
        #[clap(long)]
        output: Option<String>,
    },

    /// Sign a hex encoded transaction
    SignTx {
        /// BIP32 derivation path
        #[clap(long, default_value = DEFAULT_PATH)]
        path: Bip32Path,

        /// Hex encoded transaction
        #[clap(long)]
        tx: TxHex,

        /// Allow transactions up to the Stax / Flex buffer size
        #[clap(long)]
        large: bool,

        /// Seconds to wait for user approval (unbounded if unset)
        #[clap(long)]
        user_timeout: Option<u64>,

        /// Write the signature to a JSON file
        #[clap(long)]
        output: Option<String>,
    },

    /// Sign a personal message
    SignMessage {
        /// BIP32 derivation path
        #[clap(long, default_value = DEFAULT_PATH)]
        path: Bip32Path,

        /// UTF-8 message to sign
        #[clap(long)]
        message: String,

        /// Message wire format
        #[clap(long, default_value = "legacy")]
        format: MsgFormat,

        /// Seconds to wait for user approval (unbounded if unset)
        #[clap(long)]
        user_timeout: Option<u64>,

        /// Write the signature to a JSON file
        #[clap(long)]
        output: Option<String>,
    },

    /// Decode a hex encoded transaction header (offline)
    TxInfo {
        /// Hex encoded transaction
        #[clap(long)]
        tx: TxHex,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Options::parse();

    // Setup logging
    simplelog::SimpleLogger::init(args.log_level, simplelog::Config::default())?;

    // Offline commands
    if let Actions::TxInfo { tx } = &args.cmd {
        return tx_info(tx);
    }

    // Load handle configuration
    let config = match &args.config {
        Some(c) => {
            debug!("Loading configuration from '{}'", c);
            Config::load(c)?
        }
        None => Config::default(),
    };

    let p = LedgerProvider::new(config)?;

    debug!("Using transport: {:?}", args.target);

    // List available devices
    let devices = p.list_devices(args.target, &args.tcp).await;
    if devices.is_empty() {
        return Err(anyhow::anyhow!("No devices found"));
    }

    // Handle list command
    if args.cmd == Actions::List {
        info!("Devices:");
        for (i, d) in devices.iter().enumerate() {
            info!("  {}: {}", i, d);
        }

        return Ok(());
    }

    // Select device by index
    let d = devices.get(args.device_index).ok_or_else(|| {
        anyhow::anyhow!(
            "Invalid device index: {} (max: {})",
            args.device_index,
            devices.len() - 1
        )
    })?;

    debug!("Using device {}: {}", args.device_index, d);

    // Connect to device
    let t = match p.connect(d).await {
        Ok(v) => v,
        Err(e) => {
            error!("Failed to connect to device: {}", d);
            return Err(e.into());
        }
    };

    // Execute command
    execute(t, args.cmd).await?;

    Ok(())
}

/// Execute a command with the provided transport
async fn execute<T>(t: DeviceHandle<T>, cmd: Actions) -> anyhow::Result<()>
where
    T: Exchange + Send + 'static,
{
    debug!("Executing command: {:?}", cmd);

    match cmd {
        Actions::AppInfo => {
            let name = t.get_app_name().await?;
            let version = t.get_version().await?;

            info!("app: {} {}", name, version);
        }
        Actions::PublicKey {
            path,
            confirm,
            output,
        } => {
            info!("requesting public key for path: {}", path);

            let r = match confirm {
                true => {
                    info!("confirm the address on the device");
                    t.get_public_key_confirm(&path).await?.finish().await?
                }
                false => t.get_public_key(&path).await?,
            };

            let o = KeyOutput {
                path: path.to_string(),
                public_key: hex::encode(r.public_key),
                chain_code: hex::encode(r.chain_code),
                address: address_from_public_key(&r.public_key)?,
            };

            info!("public key: {}", o.public_key);
            info!("chain code: {}", o.chain_code);
            info!("address:    {}", o.address);

            if let Some(f) = output {
                write_output(&f, &o).await?;
            }
        }
        Actions::SignTx {
            path,
            tx,
            large,
            user_timeout,
            output,
        } => {
            let tx = tx.0;

            let max = match large {
                true => MAX_TRANSACTION_LEN_LARGE,
                false => MAX_TRANSACTION_LEN,
            };
            tx.check_len(max)?;

            if let Err(e) = tx.header() {
                warn!("transaction header check failed: {}", e);
            }

            // Fetch key for signature verification
            let key = t.get_public_key(&path).await?;

            info!("signing transaction ({} bytes) with path: {}", tx.len(), path);

            let s = t.sign_tx(&path, &tx).await?;

            info!("approve or reject the transaction on the device");
            let r = await_session(s, user_timeout).await?;

            if !check_tx_signature(&key, &tx, &r) {
                return Err(anyhow::anyhow!("device signature failed verification"));
            }

            let o = SignOutput {
                path: path.to_string(),
                public_key: hex::encode(key.public_key),
                signature: hex::encode(r.signature()),
                v: r.v,
                tx_hash: Some(hex::encode(tx.hash())),
            };

            info!("signature: {} (v: {})", o.signature, o.v);

            if let Some(f) = output {
                write_output(&f, &o).await?;
            }
        }
        Actions::SignMessage {
            path,
            message,
            format,
            user_timeout,
            output,
        } => {
            let msg = PersonalMsg::new(message, format)?;
            let key = t.get_public_key(&path).await?;

            info!("signing {} message with path: {}", format, path);

            let s = t.sign_message(&path, &msg).await?;

            info!("approve or reject the message on the device");
            let r = await_session(s, user_timeout).await?;

            let o = SignOutput {
                path: path.to_string(),
                public_key: hex::encode(key.public_key),
                signature: hex::encode(r.signature()),
                v: r.v,
                tx_hash: None,
            };

            info!("signature: {} (v: {})", o.signature, o.v);

            if let Some(f) = output {
                write_output(&f, &o).await?;
            }
        }
        Actions::List | Actions::TxInfo { .. } => (),
    }

    Ok(())
}

/// Wait for a signing session, with an optional timeout in seconds
async fn await_session(s: SignSession, timeout: Option<u64>) -> anyhow::Result<SignResp> {
    let r = match timeout {
        Some(t) => s.finish_timeout(Duration::from_secs(t)).await,
        None => s.finish().await,
    };

    match r {
        Err(e) if e.is_denied() => Err(anyhow::anyhow!("request rejected by user")),
        r => Ok(r?),
    }
}

/// Display decoded transaction header fields
fn tx_info(tx: &TxHex) -> anyhow::Result<()> {
    let tx = tx.as_ref();
    let h = tx.header()?;

    info!("type:      {} (version {})", h.tx_type, h.version);
    info!("nonce:     {}", h.nonce);
    info!("gas price: {}", h.gas_price);
    info!("gas limit: {}", h.gas_limit);
    info!("payer:     {}", address_from_script_hash(&h.payer));
    info!("payload:   {} bytes", h.payload_len);

    match tx.contract() {
        Ok(c) => info!("contract:  {} {}", c.kind, hex::encode(c.address)),
        Err(e) => warn!("contract:  {}", e),
    }

    info!("hash:      {}", hex::encode(tx.hash()));

    Ok(())
}

/// Helper to write output files where `--output` is provided
async fn write_output(file_name: &str, value: &impl Serialize) -> anyhow::Result<()> {
    debug!("Writing output to '{}'", file_name);

    // Determine format from file name
    let p = Path::new(file_name);
    match p.extension().and_then(|e| e.to_str()) {
        // Encode to JSON for `.json` files
        Some("json") => {
            let s = serde_json::to_string_pretty(value)?;
            tokio::fs::write(p, s).await?;
        }
        _ => return Err(anyhow::anyhow!("unsupported output file format")),
    }

    Ok(())
}
