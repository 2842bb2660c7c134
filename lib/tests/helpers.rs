#![allow(dead_code)]

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use encdec::{Decode, Encode};
use log::{debug, LevelFilter};
use p256::ecdsa::{signature::Signer, Signature, SigningKey, VerifyingKey};
use sha2::{Digest, Sha256};
use simplelog::SimpleLogger;
use tokio::sync::mpsc;

use ledger_ont::{
    apdu::{
        chunk::{ChunkFlags, P1_CONFIRM, P1_START},
        frame::{CommandFrame, ResponseFrame},
        message::SIGN_MAGIC,
        path::Bip32Path,
        prelude::{AppNameResp, PublicKeyResp, VersionResp},
        sign::SignResp,
        status::{StatusCode, SW_DENY, SW_OK},
        ApduError, Instruction, ONT_APDU_CLA,
    },
    transport::{Exchange, TransportError},
};

/// Setup logging from the `LOG_LEVEL` environment variable
pub fn setup() {
    let log_level = match std::env::var("LOG_LEVEL").map(|v| LevelFilter::from_str(&v)) {
        Ok(Ok(l)) => l,
        _ => LevelFilter::Debug,
    };

    let _ = SimpleLogger::init(log_level, simplelog::Config::default());
}

/// Simulated user decision for pending requests
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Decision {
    Approve,
    Reject,
}

/// Approval handle for a [SimDevice]
#[derive(Clone)]
pub struct Approver(mpsc::Sender<Decision>);

impl Approver {
    pub async fn approve(&self) {
        self.0.send(Decision::Approve).await.unwrap();
    }

    pub async fn reject(&self) {
        self.0.send(Decision::Reject).await.unwrap();
    }
}

/// Pending chunked signing request
struct Pending {
    ins: Instruction,
    next: u8,
    payload: Vec<u8>,
}

/// Simulated Ontology app implementing [Exchange]
pub struct SimDevice {
    key: SigningKey,
    chain_code: [u8; 32],
    decisions: mpsc::Receiver<Decision>,
    pending: Option<Pending>,
    frames: Arc<Mutex<Vec<Vec<u8>>>>,
    fail_with: Option<u16>,
}

impl SimDevice {
    /// Create a simulated device with a signing key derived from `seed`
    pub fn new(seed: u8) -> (Self, Approver) {
        let (tx, rx) = mpsc::channel(4);

        let key = SigningKey::from_bytes(&[seed; 32].into()).unwrap();

        let d = Self {
            key,
            chain_code: [0xcc; 32],
            decisions: rx,
            pending: None,
            frames: Arc::new(Mutex::new(vec![])),
            fail_with: None,
        };

        (d, Approver(tx))
    }

    /// Return the provided status in place of a signature
    pub fn fail_with(mut self, status: u16) -> Self {
        self.fail_with = Some(status);
        self
    }

    /// Shared record of received command frames
    pub fn frames(&self) -> Arc<Mutex<Vec<Vec<u8>>>> {
        self.frames.clone()
    }

    /// Uncompressed device public key
    pub fn public_key(&self) -> [u8; 65] {
        let p = VerifyingKey::from(&self.key).to_encoded_point(false);

        let mut b = [0u8; 65];
        b.copy_from_slice(p.as_bytes());
        b
    }

    async fn handle(&mut self, command: &[u8]) -> Vec<u8> {
        let (f, _) = match CommandFrame::decode(command) {
            Ok(v) => v,
            Err(_) => return status(StatusCode::WrongDataLength as u16),
        };

        if f.header().cla != ONT_APDU_CLA {
            return status(StatusCode::ClaNotSupported as u16);
        }

        let ins = match Instruction::try_from(f.header().ins) {
            Ok(i) => i,
            Err(_) => return status(StatusCode::InsNotSupported as u16),
        };

        match ins {
            Instruction::GetVersion => ok(&VersionResp::new(1, 2, 3)),
            Instruction::GetAppName => ok(&AppNameResp::new("Ontology")),
            Instruction::GetPublicKey => {
                if Bip32Path::from_bytes(f.data()).is_err() {
                    return status(StatusCode::WrongDataLength as u16);
                }

                if f.header().p1 == P1_CONFIRM && self.decide().await != Decision::Approve {
                    return status(SW_DENY);
                }

                ok(&PublicKeyResp {
                    public_key: self.public_key(),
                    chain_code: self.chain_code,
                })
            }
            Instruction::SignTx | Instruction::SignMessage => self.sign(ins, &f).await,
        }
    }

    async fn sign(&mut self, ins: Instruction, f: &CommandFrame<'_>) -> Vec<u8> {
        let flags = ChunkFlags::from_bits_truncate(f.header().p2);

        // Path frame starts a new request
        if f.header().p1 == P1_START {
            if flags != ChunkFlags::MORE || Bip32Path::from_bytes(f.data()).is_err() {
                self.pending = None;
                return status(StatusCode::WrongP1P2 as u16);
            }

            self.pending = Some(Pending {
                ins,
                next: 1,
                payload: vec![],
            });

            return status(SW_OK);
        }

        // Chunks must follow in sequence
        let mut p = match self.pending.take() {
            Some(p) if p.ins == ins && p.next == f.header().p1 => p,
            Some(_) => return status(StatusCode::WrongP1P2 as u16),
            None => return status(StatusCode::BadState as u16),
        };

        p.payload.extend_from_slice(f.data());
        p.next = p.next.wrapping_add(1);

        if flags.contains(ChunkFlags::MORE) {
            self.pending = Some(p);
            return status(SW_OK);
        }

        debug!("sim: {} payload complete ({} bytes)", ins, p.payload.len());

        // Wait for the user
        if self.decide().await != Decision::Approve {
            return status(SW_DENY);
        }

        if let Some(s) = self.fail_with {
            return status(s);
        }

        let message = signed_message(ins, &p.payload);
        let sig: Signature = self.key.sign(&message);

        ok(&SignResp::new(sig.to_der().as_bytes(), 0x01).unwrap())
    }

    async fn decide(&mut self) -> Decision {
        self.decisions.recv().await.unwrap_or(Decision::Reject)
    }
}

#[async_trait]
impl Exchange for SimDevice {
    async fn exchange(
        &mut self,
        command: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportError> {
        debug!("sim rx: {} (timeout: {:?})", hex::encode(command), timeout);

        self.frames.lock().unwrap().push(command.to_vec());

        let r = self.handle(command).await;

        debug!("sim tx: {}", hex::encode(&r));

        Ok(r)
    }
}

/// Message signed by the simulated device for a completed payload
pub fn signed_message(ins: Instruction, payload: &[u8]) -> Vec<u8> {
    match ins {
        Instruction::SignTx => Sha256::digest(Sha256::digest(payload)).to_vec(),
        _ => [SIGN_MAGIC, payload].concat(),
    }
}

/// Decode recorded frames
pub fn decode_frames(frames: &[Vec<u8>]) -> Vec<CommandFrame<'_>> {
    frames
        .iter()
        .map(|f| CommandFrame::decode(f).unwrap().0)
        .collect()
}

fn status(sw: u16) -> Vec<u8> {
    ResponseFrame::new(&[], sw).to_vec()
}

fn ok(resp: &impl Encode<Error = ApduError>) -> Vec<u8> {
    let mut b = vec![0u8; resp.encode_len().unwrap()];
    let n = resp.encode(&mut b).unwrap();

    ResponseFrame::new(&b[..n], SW_OK).to_vec()
}
