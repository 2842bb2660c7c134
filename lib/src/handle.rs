// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Handle for connected ledger devices
//!
//! This provides methods for interacting with the Ontology app
//! and is generic over [ledger_lib::Exchange] devices

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use encdec::{DecodeOwned, Encode};
use log::{debug, trace, warn};
use tokio::sync::{watch, Mutex};

use ledger_ont_apdu::{
    chunk::{chunk_count, sign_frames, MAX_CHUNKS},
    frame::{CommandFrame, ResponseFrame},
    message::PersonalMsg,
    path::Bip32Path,
    prelude::{AppNameReq, AppNameResp, PublicKeyReq, PublicKeyResp, VersionReq, VersionResp},
    status::SW_OK,
    transaction::Transaction,
    ApduError, ApduHeader, ApduReq, Instruction, ONT_APDU_CLA,
};

use crate::{
    config::{Config, StatusTable},
    session::{decode_exact, Session, SessionState, SignSession},
    transport::{Exchange, TransportError},
    Error, ExchangeError,
};

/// Transport deadline for exchanges pending on the user, sessions impose no
/// timeout of their own
const APPROVAL_WAIT: Duration = Duration::from_secs(24 * 60 * 60);

/// Allowance past the request timeout before the transport gives up, so
/// expiry is reported as [Error::RequestTimeout]
const TRANSPORT_GRACE: Duration = Duration::from_millis(250);

/// Ontology handle for a connected ledger device.
///
/// This is generic over [Exchange] types to support different
/// underlying transports. Requests are serialised through a shared lock,
/// signing sessions hold the lock until the device responds.
pub struct DeviceHandle<T: Exchange> {
    /// Transport for device communication
    t: Arc<Mutex<T>>,
    /// Handle configuration
    config: Arc<Config>,
    /// Status handling for exchanges
    link: Link,
    /// Signing session state
    state: Arc<watch::Sender<SessionState>>,
}

impl<T: Exchange> Clone for DeviceHandle<T> {
    fn clone(&self) -> Self {
        Self {
            t: self.t.clone(),
            config: self.config.clone(),
            link: self.link.clone(),
            state: self.state.clone(),
        }
    }
}

/// Create a [DeviceHandle] wrapper with the default configuration
impl<T: Exchange> From<T> for DeviceHandle<T> {
    fn from(t: T) -> Self {
        Self::with_parts(t, Config::default(), StatusTable::default())
    }
}

impl<T: Exchange> DeviceHandle<T> {
    /// Create a new handle with the provided configuration
    pub fn new(t: T, config: Config) -> Result<Self, Error> {
        config.validate()?;
        let table = config.status_table()?;

        Ok(Self::with_parts(t, config, table))
    }

    fn with_parts(t: T, config: Config, table: StatusTable) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);

        Self {
            t: Arc::new(Mutex::new(t)),
            link: Link {
                table: Arc::new(table),
                trace: config.trace_apdus,
            },
            config: Arc::new(config),
            state: Arc::new(state),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current signing session state
    pub fn session_state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Subscribe to signing session state changes
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }
}

impl<T: Exchange + Send + 'static> DeviceHandle<T> {
    /// Fetch the application version
    pub async fn get_version(&self) -> Result<VersionResp, Error> {
        debug!("Requesting app version");

        self.request::<_, VersionResp>(VersionReq {}).await
    }

    /// Fetch the application name
    pub async fn get_app_name(&self) -> Result<String, Error> {
        debug!("Requesting app name");

        let r = self.request::<_, AppNameResp>(AppNameReq {}).await?;

        Ok(r.name)
    }

    /// Fetch the public key and chain code for a BIP32 path
    pub async fn get_public_key(&self, path: &Bip32Path) -> Result<PublicKeyResp, Error> {
        debug!("Requesting public key for path: {}", path);
        check_path(path);

        self.request::<_, PublicKeyResp>(PublicKeyReq::new(path.clone(), false))
            .await
    }

    /// Fetch the public key for a BIP32 path, displaying the address for the
    /// user to confirm
    pub async fn get_public_key_confirm(
        &self,
        path: &Bip32Path,
    ) -> Result<Session<PublicKeyResp>, Error> {
        debug!("Requesting confirmed public key for path: {}", path);
        check_path(path);

        let req = PublicKeyReq::new(path.clone(), true);
        let data = encode_req(&req)?;
        let command = CommandFrame::new(req.header(), &data)?.to_vec();

        let t = self.t.clone().lock_owned().await;

        Ok(Session::launch(
            t,
            Instruction::GetPublicKey,
            command,
            self.link.clone(),
            self.state.clone(),
        ))
    }

    /// Start signing a transaction
    ///
    /// This transmits the path and all but the final transaction chunk, then
    /// returns a [SignSession] resolving once the user approves or rejects
    /// the transaction on the device.
    pub async fn sign_tx(&self, path: &Bip32Path, tx: &Transaction) -> Result<SignSession, Error> {
        debug!(
            "Signing transaction ({} bytes) with path: {}",
            tx.len(),
            path
        );

        self.sign(Instruction::SignTx, path, tx.as_bytes()).await
    }

    /// Start signing a personal message
    pub async fn sign_message(
        &self,
        path: &Bip32Path,
        msg: &PersonalMsg,
    ) -> Result<SignSession, Error> {
        debug!(
            "Signing {} message ({} bytes) with path: {}",
            msg.format(),
            msg.message().len(),
            path
        );

        self.sign(Instruction::SignMessage, path, &msg.serialize())
            .await
    }

    async fn sign(
        &self,
        ins: Instruction,
        path: &Bip32Path,
        payload: &[u8],
    ) -> Result<SignSession, Error> {
        check_path(path);

        if payload.is_empty() {
            return Err(Error::EmptyPayload);
        }

        let chunk_size = self.config.chunk_size;
        let n = chunk_count(payload.len(), chunk_size);
        if n > MAX_CHUNKS {
            return Err(Error::TooManyChunks(n));
        }

        let path = path.serialize();
        let frames = sign_frames(ONT_APDU_CLA, ins as u8, &path, payload, chunk_size)?;
        let (last, init) = frames.split_last().ok_or(Error::EmptyPayload)?;

        // Hold the transport for the whole request
        let mut t = self.t.clone().lock_owned().await;

        let timeout = Some(self.config.request_timeout());
        for (i, f) in init.iter().enumerate() {
            debug!("{ins} frame {}/{} (p1: {})", i + 1, frames.len(), f.header().p1);
            self.link.exchange(&mut *t, &f.to_vec(), timeout).await?;
        }

        debug!("{ins} final frame {}/{}", frames.len(), frames.len());

        Ok(Session::launch(
            t,
            ins,
            last.to_vec(),
            self.link.clone(),
            self.state.clone(),
        ))
    }

    /// Issue a single-frame request and decode the response
    pub async fn request<'a, REQ, RESP>(&self, req: REQ) -> Result<RESP, Error>
    where
        REQ: ApduReq<'a>,
        RESP: DecodeOwned<Output = RESP, Error = ApduError>,
    {
        let data = encode_req(&req)?;
        let resp = self.request_raw(req.header(), &data).await?;

        decode_exact::<RESP>(&resp)
    }

    /// Issue a single-frame request, returning the raw response payload
    pub async fn request_raw(&self, header: ApduHeader, data: &[u8]) -> Result<Vec<u8>, Error> {
        let command = CommandFrame::new(header, data)?.to_vec();

        let mut t = self.t.lock().await;

        self.link
            .exchange(&mut *t, &command, Some(self.config.request_timeout()))
            .await
    }
}

/// Raw exchange through the shared transport, making handles usable as a
/// [ledger_lib::Device]
#[async_trait]
impl<T: Exchange + Send> Exchange for DeviceHandle<T> {
    async fn exchange(
        &mut self,
        command: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportError> {
        self.t.lock().await.exchange(command, timeout).await
    }
}

/// Status word handling shared by handles and sessions
#[derive(Clone)]
pub(crate) struct Link {
    pub(crate) table: Arc<StatusTable>,
    pub(crate) trace: bool,
}

impl Link {
    /// Exchange a command frame, returning the payload of an OK response
    ///
    /// With `timeout` of `None` the exchange waits on the device for as long
    /// as the user takes.
    pub(crate) async fn exchange<T: Exchange + Send + ?Sized>(
        &self,
        t: &mut T,
        command: &[u8],
        timeout: Option<Duration>,
    ) -> Result<Vec<u8>, Error> {
        if self.trace {
            trace!("tx: {}", hex::encode(command));
        }

        let resp = match timeout {
            Some(d) => {
                let deadline = d.saturating_add(TRANSPORT_GRACE);
                tokio::time::timeout(d, t.exchange(command, deadline)).await??
            }
            None => t.exchange(command, APPROVAL_WAIT).await?,
        };

        if self.trace {
            trace!("rx: {}", hex::encode(&resp));
        }

        let r = ResponseFrame::parse(&resp)?;
        if r.status != SW_OK {
            let name = self.table.lookup(r.status).map(String::from);
            debug!(
                "Device returned status 0x{:04x} ({})",
                r.status,
                name.as_deref().unwrap_or("UNKNOWN")
            );

            return Err(ExchangeError {
                status: r.status,
                name,
                data: r.data.to_vec(),
            }
            .into());
        }

        Ok(r.data.to_vec())
    }
}

fn encode_req(req: &impl Encode<Error = ApduError>) -> Result<Vec<u8>, Error> {
    let mut b = vec![0u8; req.encode_len()?];
    let n = req.encode(&mut b)?;
    b.truncate(n);
    Ok(b)
}

fn check_path(path: &Bip32Path) {
    if !path.is_ontology() {
        warn!("Path {} is not an Ontology BIP44 path", path);
    }
}
