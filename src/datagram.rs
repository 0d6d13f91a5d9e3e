//! # Datagram Stream Adapter
//!
//! [`UdpStream`] puts a byte-stream face (`AsyncRead + AsyncWrite`) on a
//! socket that delivers one complete message per receive. The MBAP framing
//! code reads a frame in two steps, header then body. A UDP datagram carries
//! both in one message, so the adapter keeps whatever the first read did not
//! consume and serves it to the following reads before receiving again.
//!
//! ```rust,no_run
//! use mbap_transport::datagram::UdpStream;
//! use tokio::io::{AsyncReadExt, AsyncWriteExt};
//!
//! # async fn example() -> std::io::Result<()> {
//! let mut stream = UdpStream::connect("127.0.0.1:502".parse().unwrap()).await?;
//! stream.write_all(&[0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x01, 0x07]).await?;
//!
//! let mut header = [0u8; 7];
//! stream.read_exact(&mut header).await?;
//! # Ok(())
//! # }
//! ```

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::pin::Pin;
use std::task::{Context, Poll};
use futures::ready;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::UdpSocket;
use tracing::trace;

use crate::utils::format::bytes_to_hex;
use crate::MAX_TCP_FRAME_SIZE;

/// A socket that sends and receives whole messages
///
/// Implemented for a connected [`tokio::net::UdpSocket`].
pub trait DatagramSocket: Send + Unpin {
    /// Receive one datagram into `buf`, truncating it to the buffer capacity
    fn poll_recv(&self, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>>;

    /// Send `buf` as one datagram
    fn poll_send(&self, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>>;

    fn local_addr(&self) -> io::Result<SocketAddr>;

    fn peer_addr(&self) -> io::Result<SocketAddr>;
}

impl DatagramSocket for UdpSocket {
    fn poll_recv(&self, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        UdpSocket::poll_recv(self, cx, buf)
    }

    fn poll_send(&self, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        UdpSocket::poll_send(self, cx, buf)
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        UdpSocket::local_addr(self)
    }

    fn peer_addr(&self) -> io::Result<SocketAddr> {
        UdpSocket::peer_addr(self)
    }
}

/// Byte-stream adapter over a datagram socket
pub struct UdpStream<D = UdpSocket> {
    sock: D,
    rxbuf: Box<[u8]>,
    /// Unconsumed bytes of the last datagram, always stored at `rxbuf[..leftover]`
    leftover: usize,
}

impl UdpStream<UdpSocket> {
    /// Bind an ephemeral local port and connect it to `address`
    pub async fn connect(address: SocketAddr) -> io::Result<Self> {
        let local: SocketAddr = if address.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let sock = UdpSocket::bind(local).await?;
        sock.connect(address).await?;
        Ok(Self::new(sock))
    }
}

impl<D: DatagramSocket> UdpStream<D> {
    /// Wrap an already connected datagram socket
    pub fn new(sock: D) -> Self {
        Self {
            sock,
            rxbuf: vec![0u8; MAX_TCP_FRAME_SIZE].into_boxed_slice(),
            leftover: 0,
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.sock.local_addr()
    }

    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.sock.peer_addr()
    }

    /// Number of buffered bytes waiting to be read
    pub fn leftover(&self) -> usize {
        self.leftover
    }

    pub fn get_ref(&self) -> &D {
        &self.sock
    }

    /// Unwrap the socket, discarding any buffered bytes
    pub fn into_inner(self) -> D {
        self.sock
    }
}

impl<D: DatagramSocket> AsyncRead for UdpStream<D> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        if buf.remaining() == 0 {
            return Poll::Ready(Ok(()));
        }

        // only go to the network once the previous datagram is used up;
        // empty datagrams carry nothing and must not read as EOF
        while this.leftover == 0 {
            let mut recv_buf = ReadBuf::new(&mut this.rxbuf[..]);
            ready!(this.sock.poll_recv(cx, &mut recv_buf))?;
            this.leftover = recv_buf.filled().len();
            trace!(
                "received datagram of {} bytes: {}",
                this.leftover,
                bytes_to_hex(&this.rxbuf[..this.leftover])
            );
        }

        let copied = this.leftover.min(buf.remaining());
        buf.put_slice(&this.rxbuf[..copied]);

        // keep the unread tail at the front of the buffer
        this.rxbuf.copy_within(copied..this.leftover, 0);
        this.leftover -= copied;

        Poll::Ready(Ok(()))
    }
}

impl<D: DatagramSocket> AsyncWrite for UdpStream<D> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.sock.poll_send(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
