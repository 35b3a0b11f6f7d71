//! Queue boundary between a playback run and a single writer.
//!
//! `ChannelSink` turns every delivery into a fully-formed [`SinkMessage`] and
//! pushes it onto a bounded crossbeam channel. Exactly one writer owns the
//! receiving end, so no collection is ever shared between threads.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::io::ErrorKind;
use std::thread::JoinHandle;

use crate::error::{RelayError, Result};
use crate::types::SampleBundle;

use super::SampleSink;

/// Default queue capacity. 1,024 messages ≈ 34s at the default 30 Hz.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Messages handed from a playback run to the writer
#[derive(Debug, Clone, PartialEq)]
pub enum SinkMessage {
    /// One tagged value
    Sample { tag: String, value: f64 },
    /// Every channel of one row
    Bundle(SampleBundle),
}

/// Producer side of the queue
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<SinkMessage>,
}

impl ChannelSink {
    /// Create a sink and the receiver its writer drains
    pub fn bounded(capacity: usize) -> (Self, Receiver<SinkMessage>) {
        let (tx, rx) = bounded(capacity);
        (Self { tx }, rx)
    }

    fn push(&self, msg: SinkMessage) -> Result<()> {
        // Never block the paced loop: a full queue drops this sample.
        self.tx.try_send(msg).map_err(|e| {
            let (kind, message) = match e {
                TrySendError::Full(_) => (ErrorKind::WouldBlock, "sink queue is full"),
                TrySendError::Disconnected(_) => {
                    (ErrorKind::BrokenPipe, "sink queue writer has disconnected")
                }
            };
            RelayError::Io(std::io::Error::new(kind, message))
        })
    }
}

impl SampleSink for ChannelSink {
    fn send(&mut self, tag: &str, value: f64) -> Result<()> {
        self.push(SinkMessage::Sample {
            tag: tag.to_string(),
            value,
        })
    }

    fn send_bundle(&mut self, bundle: &SampleBundle) -> Result<()> {
        self.push(SinkMessage::Bundle(bundle.clone()))
    }
}

/// Spawn the single writer that drains `rx` into `sink`.
///
/// The writer exits once every `ChannelSink` for `rx` has been dropped and
/// returns how many messages it delivered and how many failed.
pub fn spawn_writer<S>(rx: Receiver<SinkMessage>, mut sink: S) -> JoinHandle<(u64, u64)>
where
    S: SampleSink + 'static,
{
    std::thread::spawn(move || {
        let (mut delivered, mut failed) = (0u64, 0u64);
        for msg in rx {
            let result = match &msg {
                SinkMessage::Sample { tag, value } => sink.send(tag, *value),
                SinkMessage::Bundle(bundle) => sink.send_bundle(bundle),
            };
            match result {
                Ok(()) => delivered += 1,
                Err(e) => {
                    failed += 1;
                    tracing::warn!("Writer failed to deliver {:?}: {}", msg, e);
                }
            }
        }
        tracing::debug!("Sink writer exiting after {} messages", delivered + failed);
        (delivered, failed)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MockSampleSink;

    #[test]
    fn test_messages_arrive_in_order() {
        let (mut sink, rx) = ChannelSink::bounded(8);
        sink.send("CH1", 0.1).unwrap();
        sink.send_bundle(&SampleBundle {
            samples: vec![("CH1".to_string(), 0.2)],
        })
        .unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            SinkMessage::Sample {
                tag: "CH1".to_string(),
                value: 0.1
            }
        );
        assert!(matches!(rx.try_recv().unwrap(), SinkMessage::Bundle(b) if b.len() == 1));
    }

    #[test]
    fn test_full_queue_fails_without_blocking() {
        let (mut sink, _rx) = ChannelSink::bounded(1);
        sink.send("CH1", 0.1).unwrap();
        assert!(sink.send("CH1", 0.2).is_err());
    }

    #[test]
    fn test_disconnected_writer() {
        let (mut sink, rx) = ChannelSink::bounded(1);
        drop(rx);
        let err = sink.send("CH1", 0.1).unwrap_err();
        assert!(err.to_string().contains("disconnected"));
    }

    #[test]
    fn test_writer_drains_into_sink() {
        let mut mock = MockSampleSink::new();
        mock.expect_send()
            .withf(|tag, value| tag == "CH1" && *value == 0.5)
            .times(2)
            .returning(|_, _| Ok(()));

        let (mut sink, rx) = ChannelSink::bounded(4);
        let writer = spawn_writer(rx, mock);
        sink.send("CH1", 0.5).unwrap();
        sink.send("CH1", 0.5).unwrap();
        drop(sink);

        assert_eq!(writer.join().unwrap(), (2, 0));
    }
}
