//! Streaming client for Ether Dream network laser DACs.
//!
//! The device exposes a small binary command/response protocol over a
//! persistent TCP connection and an internal ring buffer of 1799 samples.
//! This crate keeps that buffer fed at the rate the device drains it,
//! without overrunning it, while handling the connect/prepare/begin
//! handshake and recovering from buffer underruns.
//!
//! # Architecture
//!
//! - [`protocol`]: wire codec, little-endian command encoding and the
//!   fixed 22-byte standard response.
//! - [`demux`]: reassembles arbitrarily-chunked transport bytes into the
//!   response frames pending commands are waiting on, strictly in order.
//! - [`session`]: owns the connection, issues commands, and tracks device
//!   state as an explicit [`LinkState`] machine.
//! - [`scheduler`]: the flow-controlled send loop that paces batches
//!   against the device's reported buffer occupancy.
//! - [`discovery`]: listens for the device's periodic UDP beacon.
//!
//! # Getting Started
//!
//! ```no_run
//! use laser_stream::{recv_dac_broadcast, stream_addr, DacSession, Point, StreamScheduler};
//! use std::time::Duration;
//!
//! // Find a device on the network and connect.
//! let (beacon, source) = recv_dac_broadcast(Some(Duration::from_secs(5)))?;
//! println!("found DAC {} (max {} pps)", beacon.mac_string(), beacon.max_point_rate);
//!
//! let mut session = DacSession::new();
//! session.connect(stream_addr(source))?;
//! session.set_point_rate(30_000);
//!
//! // Stream whatever the geometry layer has ready.
//! session.set_source(|| -> Vec<Point> {
//!     // Pull the next batch of points from your renderer here.
//!     Vec::new()
//! });
//!
//! let mut scheduler = StreamScheduler::new(session);
//! let control = scheduler.control();
//! // Call `control.stop()` from another thread to end the stream.
//! scheduler.run()?;
//! # Ok::<(), laser_stream::Error>(())
//! ```
//!
//! # Concurrency Model
//!
//! Everything runs on the caller's thread. A command blocks until its
//! response has been read; while it waits, it is the one pumping the socket
//! into the demultiplexer. One session exclusively owns one transport.
//! There are no timeouts in this core; a stalled device stalls the
//! pipeline, and [`DacSession::close`] is the hard-cancel path.

pub mod demux;
pub mod discovery;
mod error;
pub mod protocol;
pub mod scheduler;
pub mod session;
mod source;

// Crate-level error types
pub use error::{Error, ProtocolError, Result};

// Wire protocol types
pub use protocol::{
    DacStatus, LightEngineState, PlaybackFlags, PlaybackState, Point, StandardResponse,
    BUFFER_CAPACITY, DAC_PORT,
};

// Session and scheduler
pub use scheduler::{SchedulerControl, StreamScheduler};
pub use session::{DacSession, LinkState};

// Sample source seam
pub use source::FrameSource;

// Discovery
pub use discovery::{recv_dac_broadcast, stream_addr, DacBroadcast, BROADCAST_PORT};
