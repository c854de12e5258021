use log::{debug, trace};
use net2::TcpStreamExt;
use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::{Error, Result};

/// Largest frame a device can send back: MBAP header plus a 253-byte PDU.
pub const MAX_FRAME_LEN: usize = 260;

const TCP_KEEPALIVE_SECS: u64 = 60; // TCP keepalive interval

/// A byte pipe carrying one request/response exchange at a time.
///
/// Implementations block until the peer answers or the socket errors out.
/// Framing is the codec's business, not theirs.
pub trait Transport {
    fn send_and_receive(&mut self, frame: &[u8]) -> Result<Vec<u8>>;
}

/// One keep-alive TCP connection to the device.
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    /// Connects to `host:port`. With a timeout the same limit applies to
    /// connecting and to each read and write; without one, every call
    /// blocks until the OS gives up.
    pub fn connect(host: &str, port: u16, timeout: Option<Duration>) -> Result<Self> {
        let stream = match timeout {
            Some(limit) => {
                let addr = (host, port).to_socket_addrs()?.next().ok_or_else(|| {
                    Error::Connection(io::Error::new(
                        io::ErrorKind::AddrNotAvailable,
                        format!("no addresses found for {}", host),
                    ))
                })?;
                let stream = TcpStream::connect_timeout(&addr, limit)?;
                stream.set_read_timeout(Some(limit))?;
                stream.set_write_timeout(Some(limit))?;
                stream
            }
            None => TcpStream::connect((host, port))?,
        };
        stream.set_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))?;
        debug!("connected to {}:{}", host, port);

        Ok(Self { stream })
    }
}

impl Transport for TcpTransport {
    fn send_and_receive(&mut self, frame: &[u8]) -> Result<Vec<u8>> {
        self.stream.write_all(frame)?;
        self.stream.flush()?;
        trace!("sent {} bytes", frame.len());

        let mut response = vec![0; MAX_FRAME_LEN];
        let received = self.stream.read(&mut response)?;
        response.truncate(received);
        trace!("received {} bytes", received);

        Ok(response)
    }
}
