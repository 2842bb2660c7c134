use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use portpicker::pick_unused_port;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};

use ledger_ont::{
    apdu::{frame::header, ONT_APDU_CLA},
    transport::{Exchange, SpeculosDevice, TcpOptions},
    Config, DeviceHandle, Error, Filter, LedgerInfo, LedgerProvider,
};

mod helpers;
use helpers::setup;

const GET_VERSION: [u8; 5] = [0x80, 0x03, 0x00, 0x00, 0x00];
const UNKNOWN_INS: [u8; 5] = [0x80, 0x06, 0x00, 0x00, 0x00];
const OVERSIZED_INS: [u8; 5] = [0x80, 0x0a, 0x00, 0x00, 0x00];

/// Run a minimal Speculos APDU socket
///
/// GET_VERSION answers 1.2.3 after `delay`, INS 0x0a answers with a 300 byte
/// payload and everything else with 0x6d00.
async fn speculos(port: u16, delay: Option<Duration>) -> anyhow::Result<()> {
    let l = TcpListener::bind((Ipv4Addr::LOCALHOST, port)).await?;

    tokio::spawn(async move {
        while let Ok((mut s, _)) = l.accept().await {
            tokio::spawn(async move {
                loop {
                    let n = match s.read_u32().await {
                        Ok(n) => n as usize,
                        Err(_) => return,
                    };

                    let mut apdu = vec![0u8; n];
                    if s.read_exact(&mut apdu).await.is_err() {
                        return;
                    }

                    // Length excludes the status word
                    let resp = match apdu.get(1) {
                        Some(0x03) => {
                            if let Some(d) = delay {
                                tokio::time::sleep(d).await;
                            }
                            vec![0x00, 0x00, 0x00, 0x03, 0x01, 0x02, 0x03, 0x90, 0x00]
                        }
                        Some(0x0a) => {
                            let mut r = 300u32.to_be_bytes().to_vec();
                            r.extend_from_slice(&[0xaa; 300]);
                            r.extend_from_slice(&[0x90, 0x00]);
                            r
                        }
                        _ => vec![0x00, 0x00, 0x00, 0x00, 0x6d, 0x00],
                    };

                    if s.write_all(&resp).await.is_err() {
                        return;
                    }
                }
            });
        }
    });

    Ok(())
}

fn opts(port: u16) -> TcpOptions {
    TcpOptions {
        addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port,
    }
}

fn addr(port: u16) -> SocketAddr {
    opts(port).socket_addr()
}

#[tokio::test]
async fn tcp_framing() -> anyhow::Result<()> {
    setup();

    let port = pick_unused_port().unwrap();
    speculos(port, None).await?;

    let mut t = SpeculosDevice::connect(addr(port)).await?;

    let r = t.exchange(&GET_VERSION, Duration::from_secs(1)).await?;
    assert_eq!(r, &[0x01, 0x02, 0x03, 0x90, 0x00]);

    let r = t.exchange(&UNKNOWN_INS, Duration::from_secs(1)).await?;
    assert_eq!(r, &[0x6d, 0x00]);

    assert!(t.is_connected());

    Ok(())
}

#[tokio::test]
async fn tcp_timeout() -> anyhow::Result<()> {
    setup();

    let port = pick_unused_port().unwrap();
    speculos(port, Some(Duration::from_millis(200))).await?;

    let c = Config {
        request_timeout_ms: 50,
        ..Default::default()
    };
    let h = DeviceHandle::new(SpeculosDevice::connect(addr(port)).await?, c)?;

    assert!(matches!(h.get_version().await, Err(Error::RequestTimeout)));

    // The late GET_VERSION reply must not be read as the answer to this one
    let r = h
        .request_raw(header(ONT_APDU_CLA, 0x06, 0x00, 0x00), &[])
        .await;
    assert!(matches!(r, Err(Error::Exchange(e)) if e.status == 0x6d00));

    // Let the delayed reply land on the dropped socket, then retry
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(h.get_app_name().await.is_err());

    Ok(())
}

#[tokio::test]
async fn tcp_timeout_reconnects() -> anyhow::Result<()> {
    setup();

    let port = pick_unused_port().unwrap();
    speculos(port, Some(Duration::from_millis(200))).await?;

    let mut t = SpeculosDevice::connect(addr(port)).await?;

    let r = tokio::time::timeout(
        Duration::from_millis(50),
        t.exchange(&GET_VERSION, Duration::from_secs(1)),
    )
    .await;
    assert!(r.is_err());
    assert!(!t.is_connected());

    let r = t.exchange(&UNKNOWN_INS, Duration::from_secs(1)).await?;
    assert_eq!(r, &[0x6d, 0x00]);
    assert!(t.is_connected());

    // A timeout inside the transport drops the connection too
    let r = t.exchange(&GET_VERSION, Duration::from_millis(50)).await;
    assert!(r.is_err());
    assert!(!t.is_connected());

    let r = t.exchange(&UNKNOWN_INS, Duration::from_secs(1)).await?;
    assert_eq!(r, &[0x6d, 0x00]);

    Ok(())
}

#[tokio::test]
async fn tcp_oversized_response() -> anyhow::Result<()> {
    setup();

    let port = pick_unused_port().unwrap();
    speculos(port, None).await?;

    let mut t = SpeculosDevice::connect(addr(port)).await?;

    let r = t.exchange(&OVERSIZED_INS, Duration::from_secs(1)).await;
    assert!(r.is_err());
    assert!(!t.is_connected());

    let r = t.exchange(&GET_VERSION, Duration::from_secs(1)).await?;
    assert_eq!(r, &[0x01, 0x02, 0x03, 0x90, 0x00]);

    Ok(())
}

#[tokio::test]
async fn provider_connect() -> anyhow::Result<()> {
    setup();

    let port = pick_unused_port().unwrap();
    let p = LedgerProvider::new(Config::default())?;

    // Nothing listening
    assert!(p.list_devices(Filter::Any, &opts(port)).await.is_empty());

    speculos(port, None).await?;

    let devices = p.list_devices(Filter::Tcp, &opts(port)).await;
    assert_eq!(devices, vec![LedgerInfo::Tcp(opts(port))]);

    let h = p.connect(&devices[0]).await?;
    assert_eq!(h.get_version().await?.to_string(), "1.2.3");
    assert!(h.get_app_name().await.is_err());

    Ok(())
}
