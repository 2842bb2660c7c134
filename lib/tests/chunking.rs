use std::str::FromStr;

use ledger_ont::{
    apdu::{
        chunk::ChunkFlags, path::Bip32Path, transaction::Transaction, Instruction, ONT_APDU_CLA,
    },
    Config, DeviceHandle, Error,
};

mod helpers;
use helpers::{decode_frames, setup, SimDevice};

/// Build a well-formed invoke transaction with a payload of `n` bytes
fn tx_with_payload(n: usize) -> Transaction {
    let mut b = hex::decode("00d14c90b8e4c409000000000000400d030000000000825995774fc9f599e6f5270176b37495d8579826").unwrap();

    // Compact size payload length
    match n {
        0..=0xfc => b.push(n as u8),
        _ => {
            b.push(0xfd);
            b.extend_from_slice(&(n as u16).to_le_bytes());
        }
    }

    b.extend((0..n).map(|i| i as u8));
    b.push(0x00);

    Transaction::new(b).unwrap()
}

#[tokio::test]
async fn sign_frame_sequence() -> anyhow::Result<()> {
    setup();

    let path = Bip32Path::from_str("m/44'/1024'/0'/0/0")?;

    for (chunk_size, payload_len) in [(255, 100), (255, 600), (64, 1000), (1, 200)] {
        let (d, approver) = SimDevice::new(0x31);
        let frames = d.frames();

        let c = Config {
            chunk_size,
            ..Default::default()
        };
        let h = DeviceHandle::new(d, c)?;

        let tx = tx_with_payload(payload_len);
        tx.header()?;

        let s = h.sign_tx(&path, &tx).await?;
        approver.approve().await;
        s.finish().await?;

        let frames = frames.lock().unwrap().clone();
        let frames = decode_frames(&frames);

        let n = (tx.len() + chunk_size - 1) / chunk_size;
        assert_eq!(frames.len(), n + 1, "chunk size {chunk_size}, tx {} bytes", tx.len());

        // Path frame
        assert_eq!(frames[0].header().p1, 0);
        assert_eq!(frames[0].header().p2, ChunkFlags::MORE.bits());
        assert_eq!(frames[0].data(), &path.serialize()[..]);

        // Payload frames
        for (i, f) in frames[1..].iter().enumerate() {
            assert_eq!(f.header().cla, ONT_APDU_CLA);
            assert_eq!(f.header().ins, Instruction::SignTx as u8);
            assert_eq!(f.header().p1 as usize, i + 1);

            let p2 = match i + 1 == n {
                true => ChunkFlags::LAST,
                false => ChunkFlags::MORE,
            };
            assert_eq!(f.header().p2, p2.bits());
            assert!(f.data().len() <= chunk_size);
        }

        // Chunks reassemble the transaction
        let joined: Vec<u8> = frames[1..].iter().flat_map(|f| f.data().to_vec()).collect();
        assert_eq!(joined, tx.as_bytes());
    }

    Ok(())
}

#[tokio::test]
async fn too_many_chunks() -> anyhow::Result<()> {
    setup();

    let (d, _approver) = SimDevice::new(0x32);
    let frames = d.frames();

    let c = Config {
        chunk_size: 1,
        ..Default::default()
    };
    let h = DeviceHandle::new(d, c)?;

    let tx = tx_with_payload(300);
    let path = Bip32Path::from_str("m/44'/1024'/0'/0/0")?;

    let r = h.sign_tx(&path, &tx).await;
    assert!(matches!(r, Err(Error::TooManyChunks(n)) if n == tx.len()));

    // Nothing sent
    assert!(frames.lock().unwrap().is_empty());

    Ok(())
}

#[test]
fn invalid_chunk_size() {
    let (d, _approver) = SimDevice::new(0x33);

    let c = Config {
        chunk_size: 256,
        ..Default::default()
    };

    assert!(matches!(DeviceHandle::new(d, c), Err(Error::Config(_))));
}
