/// MBAP Transport Loopback Demo
///
/// Starts an echo server over TCP and over UDP on localhost, then runs a few
/// requests through each using the same framing code.

use std::time::Duration;
use anyhow::Context;
use log::{info, warn};
use tokio::net::{TcpListener, UdpSocket};

use mbap_transport::{
    MbapTransport, ModbusTransport, Pdu, TcpTransport, TransportConfig, UdpStream, UdpTransport,
};

/// Answer every request with the same PDU until the peer goes away
async fn serve<T: ModbusTransport>(mut transport: T, label: &'static str) {
    loop {
        match transport.read_request().await {
            Ok(request) => {
                info!("{} server got {}", label, request);
                if let Err(e) = transport.write_response(&request).await {
                    warn!("{} server failed to respond: {}", label, e);
                    break;
                }
            }
            Err(e) => {
                info!("{} server stopping: {}", label, e);
                break;
            }
        }
    }
}

async fn run_requests<T: ModbusTransport>(client: &mut T, label: &str) -> anyhow::Result<()> {
    let requests = [
        Pdu::new(0x01, 0x03, vec![0x00, 0x00, 0x00, 0x0A]),
        Pdu::new(0x01, 0x06, vec![0x00, 0x64, 0x12, 0x34]),
        Pdu::new(0x02, 0x2B, vec![0x0E, 0x01, 0x00]),
    ];

    for request in &requests {
        let response = client
            .execute_request(request)
            .await
            .with_context(|| format!("{} request {} failed", label, request))?;
        println!("  {} -> {}", request, response);
    }

    let stats = client.get_stats();
    println!(
        "  {}: sent={} received={} stale={} foreign={} bytes_out={} bytes_in={}",
        label,
        stats.requests_sent,
        stats.responses_received,
        stats.stale_frames,
        stats.foreign_protocol_frames,
        stats.bytes_sent,
        stats.bytes_received
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let config = TransportConfig {
        timeout_ms: 2000,
        packet_logging: true,
    };

    println!("MBAP Transport Loopback Demo");
    println!("============================");

    // TCP
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let tcp_address = listener.local_addr()?;
    let server_config = config.clone();
    tokio::spawn(async move {
        if let Ok((socket, peer)) = listener.accept().await {
            info!("TCP client connected: {}", peer);
            serve(TcpTransport::new(socket, server_config), "TCP").await;
        }
    });

    println!("TCP on {}", tcp_address);
    let mut tcp_client = TcpTransport::connect(tcp_address, config.clone()).await?;
    run_requests(&mut tcp_client, "TCP").await?;
    tcp_client.close().await?;

    // UDP
    let server_socket = UdpSocket::bind("127.0.0.1:0").await?;
    let udp_address = server_socket.local_addr()?;
    let mut udp_client = UdpTransport::connect(udp_address, config.clone()).await?;

    let client_address = udp_client
        .get_ref()
        .context("UDP client closed")?
        .local_addr()?;
    server_socket.connect(client_address).await?;
    let server = tokio::spawn(serve(
        MbapTransport::new(UdpStream::new(server_socket), config.clone()),
        "UDP",
    ));

    println!("UDP on {}", udp_address);
    run_requests(&mut udp_client, "UDP").await?;
    udp_client.close().await?;

    // the UDP server only stops on its read deadline
    tokio::time::sleep(Duration::from_millis(100)).await;
    server.abort();

    Ok(())
}
