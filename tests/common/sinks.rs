//! Sink helpers for observing playback from tests

use opensignals_relay::{Result, SampleBundle, SampleSink};
use std::net::UdpSocket;
use std::sync::{Arc, Mutex};

/// Sink that records every delivery in a shared list
#[derive(Clone, Default)]
pub struct CollectingSink {
    pub samples: Arc<Mutex<Vec<(String, f64)>>>,
    pub bundles: Arc<Mutex<Vec<SampleBundle>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> Vec<(String, f64)> {
        self.samples.lock().unwrap().clone()
    }

    pub fn bundles(&self) -> Vec<SampleBundle> {
        self.bundles.lock().unwrap().clone()
    }
}

impl SampleSink for CollectingSink {
    fn send(&mut self, tag: &str, value: f64) -> Result<()> {
        self.samples.lock().unwrap().push((tag.to_string(), value));
        Ok(())
    }

    fn send_bundle(&mut self, bundle: &SampleBundle) -> Result<()> {
        self.bundles.lock().unwrap().push(bundle.clone());
        Ok(())
    }
}

/// Bind a local UDP socket standing in for the OSC server
pub fn osc_server() -> UdpSocket {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket.set_read_timeout(Some(super::test_timeout())).unwrap();
    socket
}
