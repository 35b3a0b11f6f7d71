//! OSC over UDP
//!
//! Encodes OSC 1.0 packets by hand: the relay only needs float messages and
//! immediate bundles, so there is no general-purpose OSC type system here.
//!
//! - A single sample becomes one message at the configured address with one
//!   `f` (float32) argument.
//! - A bundle becomes `#bundle` with an immediate timetag and one message per
//!   channel at `<address>/<channel>`.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};

use crate::error::{RelayError, Result};
use crate::types::SampleBundle;

use super::SampleSink;

/// Default OSC address for single-channel playback
pub const DEFAULT_OSC_ADDRESS: &str = "/sensor";

/// Timetag meaning "process immediately"
const IMMEDIATE: u64 = 1;

/// Append an OSC string: bytes, a terminating NUL, then padding to 4 bytes
fn push_osc_string(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(s.as_bytes());
    let pad = 4 - (s.len() % 4);
    buf.extend(std::iter::repeat(0u8).take(pad));
}

/// Encode a message with a single float32 argument
pub fn encode_message(address: &str, value: f32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(address.len() + 12);
    push_osc_string(&mut buf, address);
    push_osc_string(&mut buf, ",f");
    buf.extend_from_slice(&value.to_be_bytes());
    buf
}

/// Encode an immediate bundle of single-float messages
pub fn encode_bundle<'a>(messages: impl IntoIterator<Item = (&'a str, f32)>) -> Vec<u8> {
    let mut buf = Vec::new();
    push_osc_string(&mut buf, "#bundle");
    buf.extend_from_slice(&IMMEDIATE.to_be_bytes());
    for (address, value) in messages {
        let element = encode_message(address, value);
        buf.extend_from_slice(&(element.len() as i32).to_be_bytes());
        buf.extend_from_slice(&element);
    }
    buf
}

/// Join a base address and a channel name into an OSC address
fn channel_address(base: &str, channel: &str) -> String {
    let channel: String = channel
        .chars()
        .map(|c| match c {
            ' ' | '#' | '*' | ',' | '/' | '?' | '[' | ']' | '{' | '}' => '_',
            c => c,
        })
        .collect();
    format!("{}/{}", base.trim_end_matches('/'), channel)
}

/// Sends samples to an OSC server over UDP
#[derive(Debug)]
pub struct OscSink {
    socket: UdpSocket,
    address: String,
}

impl OscSink {
    /// Bind an ephemeral local socket and connect it to `target`
    pub fn connect(target: impl ToSocketAddrs, address: impl Into<String>) -> Result<Self> {
        let target = target
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| RelayError::Config("OSC target resolved to no address".to_string()))?;
        let address = address.into();
        if !address.starts_with('/') {
            return Err(RelayError::Config(format!(
                "OSC address must start with '/', got {:?}",
                address
            )));
        }

        let bind: SocketAddr = if target.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(bind)?;
        socket.connect(target)?;

        tracing::info!("OSC sink sending to {} at {}", target, address);
        Ok(Self { socket, address })
    }

    fn send_packet(&self, packet: &[u8]) -> Result<()> {
        let sent = self.socket.send(packet)?;
        if sent != packet.len() {
            return Err(RelayError::Io(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                format!("sent {} of {} bytes", sent, packet.len()),
            )));
        }
        Ok(())
    }
}

impl SampleSink for OscSink {
    fn send(&mut self, tag: &str, value: f64) -> Result<()> {
        tracing::trace!("{} {} = {}", self.address, tag, value);
        self.send_packet(&encode_message(&self.address, value as f32))
    }

    fn send_bundle(&mut self, bundle: &SampleBundle) -> Result<()> {
        let addresses: Vec<String> = bundle
            .samples
            .iter()
            .map(|(name, _)| channel_address(&self.address, name))
            .collect();
        let packet = encode_bundle(
            addresses
                .iter()
                .zip(&bundle.samples)
                .map(|(address, (_, value))| (address.as_str(), *value as f32)),
        );
        self.send_packet(&packet)
    }
}
