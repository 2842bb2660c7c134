// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Transports for exchanging raw APDUs with a device
//!
//! Devices implement [`Exchange`] from `ledger-lib`, moving complete command
//! frames to the device and returning the raw response (payload followed by
//! the status word). Framing, chunking and status handling live in
//! [`DeviceHandle`](crate::DeviceHandle).

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use async_trait::async_trait;
use log::{debug, warn};

pub use ledger_lib::{
    transport::{GenericDevice, TcpInfo, TcpTransport},
    Device, Error as TransportError, Exchange, Transport,
};

use ledger_ont_apdu::ApduError;

/// Largest accepted response, a full short APDU payload and the status word
pub const MAX_RESPONSE_LEN: usize = 256 + 2;

/// Speculos APDU socket options
#[derive(Clone, PartialEq, Debug, clap::Args)]
pub struct TcpOptions {
    /// Speculos APDU address
    #[clap(long, default_value = "127.0.0.1")]
    pub addr: IpAddr,

    /// Speculos APDU port
    #[clap(long, default_value = "9999")]
    pub port: u16,
}

impl Default for TcpOptions {
    fn default() -> Self {
        Self {
            addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 9999,
        }
    }
}

impl TcpOptions {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.addr, self.port)
    }
}

/// Speculos emulator device over the `ledger-lib` TCP transport
///
/// The connection is taken for the duration of each exchange and only kept
/// once a complete response has been read. A failed, timed out or cancelled
/// exchange drops the socket, so a late response is never read as the reply
/// to a following command. The next exchange reconnects.
pub struct SpeculosDevice {
    addr: SocketAddr,
    d: Option<GenericDevice>,
}

impl SpeculosDevice {
    /// Connect to a Speculos APDU socket
    pub async fn connect(addr: SocketAddr) -> Result<Self, TransportError> {
        let d = Self::open(addr).await?;

        Ok(Self { addr, d: Some(d) })
    }

    async fn open(addr: SocketAddr) -> Result<GenericDevice, TransportError> {
        let mut t = TcpTransport::new()?;
        let d = t.connect(TcpInfo { addr }).await?;

        Ok(d.into())
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Check whether a connection is currently held
    pub fn is_connected(&self) -> bool {
        self.d.is_some()
    }
}

#[async_trait]
impl Exchange for SpeculosDevice {
    async fn exchange(
        &mut self,
        command: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportError> {
        let mut d = match self.d.take() {
            Some(d) => d,
            None => {
                debug!("Reconnecting to {}", self.addr);
                Self::open(self.addr).await?
            }
        };

        let resp = match d.exchange(command, timeout).await {
            Ok(r) => r,
            Err(e) => {
                warn!("Exchange with {} failed, dropping connection", self.addr);
                return Err(e);
            }
        };

        if resp.len() > MAX_RESPONSE_LEN {
            warn!(
                "Oversized response from {} ({} bytes), dropping connection",
                self.addr,
                resp.len()
            );
            return Err(ApduError::InvalidLength.into());
        }

        self.d = Some(d);

        Ok(resp)
    }
}
