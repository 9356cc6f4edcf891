// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Sources that read from UDP sockets.
//!
//! Packets that can't be decoded are counted and skipped; the caller only
//! ever sees valid records or `None` once the timeout has elapsed.

use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use log::{debug, trace, warn};

use super::{MetadataSource, SourceError, VisSource};
use crate::{datagram::VisDatagram, metadata::MetadataRecord};

/// Metadata records are small; anything bigger than this is garbage.
const MAX_METADATA_BYTES: usize = 65_507;

fn bind(addr: &str) -> Result<UdpSocket, SourceError> {
    UdpSocket::bind(addr).map_err(|err| SourceError::Bind {
        addr: addr.to_string(),
        err,
    })
}

/// Receive packets until `decode` accepts one or `timeout` has elapsed.
fn recv_decoded<T, F>(
    socket: &UdpSocket,
    buf: &mut [u8],
    timeout: Duration,
    mut decode: F,
) -> Option<T>
where
    F: FnMut(&[u8]) -> Option<T>,
{
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return None;
        }
        // A zero read timeout means "block forever", hence the check above.
        if let Err(e) = socket.set_read_timeout(Some(remaining)) {
            warn!("Couldn't set the socket read timeout: {e}");
            return None;
        }
        match socket.recv(buf) {
            Ok(n) => {
                if let Some(t) = decode(&buf[..n]) {
                    return Some(t);
                }
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                return None
            }
            Err(e) => {
                warn!("Error receiving from UDP socket: {e}");
                return None;
            }
        }
    }
}

pub struct UdpVisSource {
    socket: UdpSocket,
    buf: Vec<u8>,
    channels_per_slice: usize,
    num_malformed: u64,
}

impl UdpVisSource {
    pub fn bind(addr: &str, channels_per_slice: usize) -> Result<UdpVisSource, SourceError> {
        let socket = bind(addr)?;
        debug!("Receiving visibility datagrams on {}", socket.local_addr()?);
        // Room for one byte more than a valid datagram, so that oversized
        // packets are noticed rather than truncated into valid-looking ones.
        let buf = vec![0; crate::datagram::datagram_size(channels_per_slice) + 1];
        Ok(UdpVisSource {
            socket,
            buf,
            channels_per_slice,
            num_malformed: 0,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, SourceError> {
        Ok(self.socket.local_addr()?)
    }

    /// The number of packets dropped because they couldn't be decoded.
    pub fn num_malformed(&self) -> u64 {
        self.num_malformed
    }
}

impl VisSource for UdpVisSource {
    fn next(&mut self, timeout: Duration) -> Option<VisDatagram> {
        let channels_per_slice = self.channels_per_slice;
        let num_malformed = &mut self.num_malformed;
        recv_decoded(&self.socket, &mut self.buf, timeout, |bytes| {
            match VisDatagram::decode(bytes, channels_per_slice) {
                Ok(d) => Some(d),
                Err(e) => {
                    *num_malformed += 1;
                    trace!("Dropping malformed visibility datagram: {e}");
                    None
                }
            }
        })
    }
}

/// Receives JSON-encoded metadata records, one per packet.
pub struct UdpMetadataSource {
    socket: UdpSocket,
    buf: Vec<u8>,
    num_malformed: u64,
}

impl UdpMetadataSource {
    pub fn bind(addr: &str) -> Result<UdpMetadataSource, SourceError> {
        let socket = bind(addr)?;
        debug!("Receiving metadata on {}", socket.local_addr()?);
        Ok(UdpMetadataSource {
            socket,
            buf: vec![0; MAX_METADATA_BYTES],
            num_malformed: 0,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, SourceError> {
        Ok(self.socket.local_addr()?)
    }

    pub fn num_malformed(&self) -> u64 {
        self.num_malformed
    }
}

impl MetadataSource for UdpMetadataSource {
    fn next(&mut self, timeout: Duration) -> Option<MetadataRecord> {
        let num_malformed = &mut self.num_malformed;
        recv_decoded(&self.socket, &mut self.buf, timeout, |bytes| {
            match MetadataRecord::from_json(bytes) {
                Ok(m) => Some(m),
                Err(e) => {
                    *num_malformed += 1;
                    warn!("Dropping undecodable metadata: {e}");
                    None
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{c32, tests::good_metadata};

    fn sender() -> UdpSocket {
        UdpSocket::bind("127.0.0.1:0").unwrap()
    }

    #[test]
    fn test_vis_source_skips_malformed_packets() {
        let mut src = UdpVisSource::bind("127.0.0.1:0", 4).unwrap();
        let addr = src.local_addr().unwrap();
        let tx = sender();

        let d = VisDatagram {
            timestamp: 1000,
            slice: 1,
            baseline_id: 2,
            beam_id: 1,
            vis: vec![c32::new(1.0, 2.0); 4],
        };
        let mut too_long = d.encode();
        too_long.push(0);
        tx.send_to(&too_long, addr).unwrap();
        tx.send_to(&d.encode()[..10], addr).unwrap();
        tx.send_to(&d.encode(), addr).unwrap();

        let got = src.next(Duration::from_secs(5));
        assert_eq!(got, Some(d));
        assert_eq!(src.num_malformed(), 2);

        assert!(src.next(Duration::from_millis(20)).is_none());
    }

    #[test]
    fn test_metadata_source() {
        let mut src = UdpMetadataSource::bind("127.0.0.1:0").unwrap();
        let addr = src.local_addr().unwrap();
        let tx = sender();

        let m = good_metadata(5_000_000, 1, 3);
        tx.send_to(b"not json", addr).unwrap();
        tx.send_to(m.to_json().unwrap().as_bytes(), addr).unwrap();

        assert_eq!(src.next(Duration::from_secs(5)), Some(m));
        assert_eq!(src.num_malformed(), 1);
        assert!(src.next(Duration::from_millis(20)).is_none());
    }
}
