// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Ledger Ontology API Library (and CLI)
//!
//! Provides a [DeviceHandle] for requesting public keys and signatures from
//! the Ontology hardware wallet application, generic over `ledger-lib`
//! [Exchange] devices. Signing requests return a [Session] that resolves once
//! the user approves or rejects the request on the device.

/// Re-export transports for consumer use
pub mod transport;
use transport::*;
pub use transport::{Device, Exchange};

/// Re-export `ledger-ont-apdu` for consumers
pub use ledger_ont_apdu::{self as apdu};

pub mod address;

pub mod config;
pub use config::Config;

mod handle;
pub use handle::DeviceHandle;

mod error;
pub use error::{Error, ExchangeError};

mod session;
pub use session::{Session, SessionState, SignSession};

pub mod verify;

/// Ledger provider manages ledger devices and connections
#[derive(Clone, Debug, Default)]
pub struct LedgerProvider {
    config: Config,
}

/// Device discovery filter
#[derive(Copy, Clone, Debug, PartialEq, clap::ValueEnum, strum::Display)]
#[non_exhaustive]
pub enum Filter {
    /// List all devices available using supported transports
    Any,
    /// List only TCP (Speculos) devices
    Tcp,
}

/// Ledger device information for listing, used by connect
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum LedgerInfo {
    Tcp(TcpOptions),
}

/// Handle for a Speculos emulator device
pub type SpeculosHandle = DeviceHandle<SpeculosDevice>;

impl LedgerProvider {
    /// Create a new ledger provider, handles are created with the provided
    /// configuration
    pub fn new(config: Config) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self { config })
    }

    /// List available ledger devices, checking the provided TCP endpoint
    pub async fn list_devices(&self, filter: Filter, tcp: &TcpOptions) -> Vec<LedgerInfo> {
        let mut devices = vec![];

        if filter == Filter::Any || filter == Filter::Tcp {
            match SpeculosDevice::connect(tcp.socket_addr()).await {
                Ok(_) => devices.push(LedgerInfo::Tcp(tcp.clone())),
                Err(e) => log::debug!("No device at {}: {}", tcp.socket_addr(), e),
            }
        }

        log::debug!("Found {} devices: {:?}", devices.len(), devices);

        devices
    }

    /// Connect to a listed device
    pub async fn connect(&self, info: &LedgerInfo) -> Result<SpeculosHandle, Error> {
        let d = match info {
            LedgerInfo::Tcp(tcp) => SpeculosDevice::connect(tcp.socket_addr()).await?,
        };

        DeviceHandle::new(d, self.config.clone())
    }
}

impl std::fmt::Display for LedgerInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerInfo::Tcp(tcp_info) => {
                write!(
                    f,
                    "{:16} (TCP, {}:{})",
                    "Speculos", tcp_info.addr, tcp_info.port
                )
            }
        }
    }
}
