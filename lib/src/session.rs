// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Signing sessions for requests pending on user approval
//!
//! A session owns the device transport from the moment its request is issued
//! until the device responds. The final frame is exchanged on a background
//! task so the caller may wait for the outcome with or without a timeout,
//! while the handle publishes [`SessionState`] transitions:
//!
//! ```text
//! Idle -> AwaitingApproval -> Approved | Rejected | Failed -> Idle
//! ```

use std::{marker::PhantomData, sync::Arc, time::Duration};

use encdec::DecodeOwned;
use log::{debug, warn};
use tokio::sync::{oneshot, watch, OwnedMutexGuard};

use ledger_ont_apdu::{sign::SignResp, ApduError, CodecError, Instruction};

use crate::{handle::Link, transport::Exchange, Error};

/// Signing session state
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, strum::Display)]
pub enum SessionState {
    /// No request outstanding
    #[default]
    Idle,
    /// Final frame sent, waiting on the user
    AwaitingApproval,
    /// User approved, response received
    Approved,
    /// User rejected the request
    Rejected,
    /// Device returned an error or the exchange failed
    Failed,
}

/// Pending request awaiting user approval
pub struct Session<R> {
    ins: Instruction,
    rx: oneshot::Receiver<Result<Vec<u8>, Error>>,
    _r: PhantomData<fn() -> R>,
}

/// Pending transaction or message signature
pub type SignSession = Session<SignResp>;

impl<R> Session<R>
where
    R: DecodeOwned<Output = R, Error = ApduError>,
{
    /// Exchange the final frame on a background task, holding the transport
    /// until the device responds
    pub(crate) fn launch<T: Exchange + Send + 'static>(
        mut t: OwnedMutexGuard<T>,
        ins: Instruction,
        command: Vec<u8>,
        link: Link,
        state: Arc<watch::Sender<SessionState>>,
    ) -> Self {
        let (tx, rx) = oneshot::channel();

        state.send_replace(SessionState::AwaitingApproval);
        debug!("{ins} awaiting user approval");

        tokio::spawn(async move {
            let r = link.exchange(&mut *t, &command, None).await;

            let outcome = match &r {
                Ok(_) => SessionState::Approved,
                Err(e) if e.is_denied() => SessionState::Rejected,
                Err(_) => SessionState::Failed,
            };
            debug!("{ins} complete: {outcome}");
            state.send_replace(outcome);
            state.send_replace(SessionState::Idle);

            // Release the transport only once idle, a queued request
            // publishes its own state after acquiring it
            drop(t);

            if tx.send(r).is_err() {
                warn!("{ins} session dropped before completion");
            }
        });

        Self {
            ins,
            rx,
            _r: PhantomData,
        }
    }

    /// Instruction this session is pending on
    pub fn instruction(&self) -> Instruction {
        self.ins
    }

    /// Wait for the device response payload
    pub async fn finish_raw(self) -> Result<Vec<u8>, Error> {
        self.rx.await.map_err(|_| Error::SessionClosed)?
    }

    /// Wait for the device response, with no timeout
    pub async fn finish(self) -> Result<R, Error> {
        let data = self.finish_raw().await?;
        decode_exact::<R>(&data)
    }

    /// Wait for the device response, failing with [`Error::UserTimeout`] if
    /// the user does not respond in time
    ///
    /// The pending exchange is not cancelled and keeps the transport until
    /// the device answers.
    pub async fn finish_timeout(self, timeout: Duration) -> Result<R, Error> {
        tokio::time::timeout(timeout, self.finish())
            .await
            .map_err(|_| Error::UserTimeout)?
    }
}

/// Decode a response object, requiring the full payload to be consumed
pub(crate) fn decode_exact<R>(data: &[u8]) -> Result<R, Error>
where
    R: DecodeOwned<Output = R, Error = ApduError>,
{
    let (v, n) = R::decode_owned(data)?;
    if n != data.len() {
        return Err(CodecError::TrailingBytes(data.len() - n).into());
    }
    Ok(v)
}
