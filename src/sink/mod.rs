//! Sample sinks
//!
//! A sink is the real-time consumer that receives normalized values tagged
//! with a channel name. Playback only depends on the [`SampleSink`] trait, so
//! the transport can be swapped without touching the scheduler.
//!
//! - [`OscSink`] - sends OSC messages over UDP
//! - [`ChannelSink`] - hands messages to a single writer thread over a queue

pub mod channel;
pub mod osc;

pub use channel::{spawn_writer, ChannelSink, SinkMessage, DEFAULT_QUEUE_CAPACITY};
pub use osc::{encode_bundle, encode_message, OscSink};

use crate::error::Result;
use crate::types::SampleBundle;

/// Unified interface for sample consumers
///
/// Implementations must be `Send` so a run can execute on its own thread.
/// Delivery is fire-and-forget: an error means this sample was not delivered,
/// and the caller decides whether to continue.
#[cfg_attr(test, mockall::automock)]
pub trait SampleSink: Send {
    /// Deliver one normalized value tagged with its channel name
    fn send(&mut self, tag: &str, value: f64) -> Result<()>;

    /// Deliver every channel of one row together.
    ///
    /// The default implementation sends the samples one by one.
    fn send_bundle(&mut self, bundle: &SampleBundle) -> Result<()> {
        for (tag, value) in &bundle.samples {
            self.send(tag, *value)?;
        }
        Ok(())
    }
}

impl<S: SampleSink + ?Sized> SampleSink for Box<S> {
    fn send(&mut self, tag: &str, value: f64) -> Result<()> {
        (**self).send(tag, value)
    }

    fn send_bundle(&mut self, bundle: &SampleBundle) -> Result<()> {
        (**self).send_bundle(bundle)
    }
}
