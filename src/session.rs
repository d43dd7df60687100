//! The device session: connection lifecycle, command issue, and state tracking.
//!
//! A [`DacSession`] exclusively owns one TCP connection to one device. Every
//! command writes its bytes and then blocks until the matching response has
//! been pumped through the demultiplexer. While an operation waits, it is
//! the one reading the socket, so arbitrarily-chunked transport bytes are
//! reassembled into exactly the frames the ordered expectations demand.
//!
//! Session state is a single authoritative [`LinkState`] enum whose
//! transitions are triggered only by specific acknowledged responses, plus
//! the last decoded status block the device reported.

use log::{debug, error, warn};
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};

use crate::demux::ResponseDemux;
use crate::error::{Error, Result};
use crate::protocol::{
    Begin, CommandKind, DacStatus, Data, PlaybackFlags, PlaybackState, Point, SizeBytes,
    StandardResponse, Update, WriteBytes, BUFFER_CAPACITY, COMMAND_EMERGENCY_STOP, COMMAND_PING,
    COMMAND_PREPARE, COMMAND_STOP,
};
use crate::source::FrameSource;

/// Authoritative connection/playback state of a session.
///
/// Transitions happen only on acknowledged responses (or on `close`):
/// the connect handshake yields `Idle`, a `prepare` ACK yields `Prepared`,
/// a `begin` or `update` ACK yields `Playing`, and an underrun reported by
/// the device demotes `Playing` back to `Prepared` so that playback is
/// re-begun before further samples are trusted to play. A non-ACK response
/// code parks the session in `Faulted` until it is reconnected.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LinkState {
    /// No transport; the session must be connected before use.
    Disconnected,
    /// Connected, handshake observed, playback engine untouched.
    Idle,
    /// `prepare` acknowledged; the device accepts sample data.
    Prepared,
    /// `begin` (or `update`) acknowledged; the device is draining its buffer.
    Playing,
    /// The device answered with a non-ACK response code; the connection is
    /// unreliable and must be reconnected before further writes mean anything.
    Faulted { code: u8 },
}

/// A streaming protocol session with one DAC.
pub struct DacSession {
    stream: Option<TcpStream>,
    /// Peer address, remembered across `close` so `reconnect` can replay it.
    addr: Option<SocketAddr>,
    demux: ResponseDemux<CommandKind>,
    /// Responses completed by the demultiplexer but not yet consumed.
    ready: VecDeque<(CommandKind, Vec<u8>)>,
    state: LinkState,
    /// Last status block the device reported, if any.
    status: Option<DacStatus>,
    /// Configured playback rate for `begin`, in points per second.
    point_rate: u32,
    /// External sample source; survives `close` so a reconnected session
    /// resumes pulling from the same place.
    source: Option<Box<dyn FrameSource>>,
}

impl DacSession {
    /// Creates a disconnected session with no configured rate or source.
    pub fn new() -> Self {
        Self {
            stream: None,
            addr: None,
            demux: ResponseDemux::new(),
            ready: VecDeque::new(),
            state: LinkState::Disconnected,
            status: None,
            point_rate: 0,
            source: None,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Current session state.
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Last status block reported by the device, if any response has been seen.
    pub fn status(&self) -> Option<&DacStatus> {
        self.status.as_ref()
    }

    /// Device-reported playback state; `Idle` until a response has been seen.
    pub fn playback_state(&self) -> PlaybackState {
        self.status
            .map(|status| status.playback)
            .unwrap_or(PlaybackState::Idle)
    }

    /// Device-reported ring buffer fullness; 0 until a response has been seen.
    pub fn buffer_fullness(&self) -> u16 {
        self.status
            .map(|status| status.buffer_fullness)
            .unwrap_or(0)
    }

    /// Configured playback rate in points per second.
    pub fn point_rate(&self) -> u32 {
        self.point_rate
    }

    /// Sets the playback rate used by [`begin`](Self::begin).
    pub fn set_point_rate(&mut self, rate: u32) {
        self.point_rate = rate;
    }

    /// Returns true if a transport is currently open.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// The address of the most recent connect attempt, if any.
    pub fn addr(&self) -> Option<SocketAddr> {
        self.addr
    }

    /// Installs the sample source the scheduler pulls from.
    pub fn set_source<S: FrameSource + 'static>(&mut self, source: S) {
        self.source = Some(Box::new(source));
    }

    /// Removes the sample source, idling the scheduler.
    pub fn clear_source(&mut self) {
        self.source = None;
    }

    /// Returns true if a sample source is installed.
    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    /// Pulls one frame from the sample source, or `None` if no source is set.
    pub fn pull_frame(&mut self) -> Option<Vec<Point>> {
        self.source.as_mut().map(|source| source.next_frame())
    }

    // =========================================================================
    // Connection Lifecycle
    // =========================================================================

    /// Opens the transport and waits for the device's greeting.
    ///
    /// The device answers a freshly accepted connection with an unsolicited
    /// status response, as if a ping had been sent; the session registers a
    /// response slot without sending anything and resolves once that first
    /// response has been observed. Transport failures surface as
    /// [`Error::Transport`] so callers can decide to retry.
    pub fn connect(&mut self, addr: SocketAddr) -> Result<()> {
        if self.stream.is_some() {
            return Err(Error::Usage("connect called on a session that is already connected"));
        }

        let stream = TcpStream::connect(addr)?;
        // Sample batches are small and latency-sensitive.
        stream.set_nodelay(true)?;
        self.stream = Some(stream);
        self.addr = Some(addr);

        self.demux
            .expect(CommandKind::Connect, StandardResponse::SIZE_BYTES);
        match self.await_response() {
            Ok(response) => {
                debug!(
                    "connected to {} (fullness {}, playback {:?})",
                    addr, response.status.buffer_fullness, response.status.playback
                );
                Ok(())
            }
            Err(err) => {
                // Do not leave a half-open session behind a failed handshake.
                self.close();
                Err(err)
            }
        }
    }

    /// Resets the session to its initial state and drops the transport.
    ///
    /// Buffered bytes and pending response slots are discarded; their
    /// responses are simply never observed. Configuration survives: the
    /// sample source, the configured point rate, and the remembered address
    /// stay in place so the session can be reconnected and resumed.
    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
            debug!("closed connection");
        }
        self.demux.clear();
        self.ready.clear();
        self.status = None;
        self.state = LinkState::Disconnected;
    }

    /// Closes and reconnects to the address of the last `connect`.
    pub fn reconnect(&mut self) -> Result<()> {
        let addr = self
            .addr
            .ok_or(Error::Usage("reconnect called before any connect"))?;
        self.close();
        self.connect(addr)
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Pings the device and returns its status.
    pub fn ping(&mut self) -> Result<StandardResponse> {
        self.transact(CommandKind::Ping, &[COMMAND_PING])
    }

    /// Prepares the playback engine to accept sample data.
    pub fn prepare(&mut self) -> Result<StandardResponse> {
        self.transact(CommandKind::Prepare, &[COMMAND_PREPARE])
    }

    /// Stops playback.
    pub fn stop(&mut self) -> Result<StandardResponse> {
        self.transact(CommandKind::Stop, &[COMMAND_STOP])
    }

    /// Immediately halts output. The device must be re-prepared afterwards.
    pub fn emergency_stop(&mut self) -> Result<StandardResponse> {
        self.transact(CommandKind::EmergencyStop, &[COMMAND_EMERGENCY_STOP])
    }

    /// Starts playback at the configured point rate.
    ///
    /// Fails with a usage error, without sending any bytes, when no
    /// non-zero rate has been configured.
    pub fn begin(&mut self) -> Result<StandardResponse> {
        if self.point_rate == 0 {
            return Err(Error::Usage("begin requires a non-zero point rate"));
        }
        let mut bytes = Vec::with_capacity(Begin::SIZE_BYTES);
        bytes.write_bytes(Begin {
            low_water_mark: 0,
            point_rate: self.point_rate,
        })?;
        self.transact(CommandKind::Begin, &bytes)
    }

    /// Changes the playback rate while already playing.
    ///
    /// Same wire shape as `begin`, and an acknowledged `update` likewise
    /// leaves the session in `Playing`.
    pub fn update(&mut self, rate: u32) -> Result<StandardResponse> {
        if rate == 0 {
            return Err(Error::Usage("update requires a non-zero point rate"));
        }
        self.point_rate = rate;
        let mut bytes = Vec::with_capacity(Update::SIZE_BYTES);
        bytes.write_bytes(Update {
            low_water_mark: 0,
            point_rate: rate,
        })?;
        self.transact(CommandKind::Update, &bytes)
    }

    /// Queues a batch of samples into the device's ring buffer.
    ///
    /// The batch must fit the ring buffer; the scheduler sizes batches to
    /// the device's reported spare capacity. The returned response carries
    /// the refreshed status block; the device only reports buffer
    /// occupancy in responses, so an empty batch doubles as an occupancy
    /// poll.
    pub fn write_samples(&mut self, points: &[Point]) -> Result<StandardResponse> {
        if points.len() > BUFFER_CAPACITY {
            return Err(Error::Usage("sample batch exceeds the device buffer capacity"));
        }
        let mut bytes = Vec::with_capacity(3 + points.len() * Point::SIZE_BYTES);
        bytes.write_bytes(Data { points })?;
        self.transact(CommandKind::Data, &bytes)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Sends raw command bytes and blocks until the matching response.
    fn transact(&mut self, kind: CommandKind, bytes: &[u8]) -> Result<StandardResponse> {
        let stream = self
            .stream
            .as_mut()
            .ok_or(Error::Usage("session is not connected"))?;
        stream.write_all(bytes)?;

        self.demux.expect(kind, StandardResponse::SIZE_BYTES);
        self.await_response()
    }

    /// Pumps transport bytes through the demultiplexer until a response
    /// frame completes, then decodes and applies it.
    fn await_response(&mut self) -> Result<StandardResponse> {
        loop {
            if let Some((kind, frame)) = self.ready.pop_front() {
                let response = StandardResponse::decode(&frame)?;
                self.apply_response(kind, &response);
                if !response.is_ack() {
                    return Err(Error::InvalidResponse {
                        command: kind,
                        code: response.response,
                    });
                }
                return Ok(response);
            }

            let stream = self
                .stream
                .as_mut()
                .ok_or(Error::Usage("session is not connected"))?;
            let mut chunk = [0u8; 512];
            let count = stream.read(&mut chunk)?;
            if count == 0 {
                return Err(Error::Transport(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed by device",
                )));
            }
            self.ready.extend(self.demux.feed(&chunk[..count]));
        }
    }

    /// Updates session state from a decoded response.
    fn apply_response(&mut self, kind: CommandKind, response: &StandardResponse) {
        self.status = Some(response.status);

        if !response.is_ack() {
            error!(
                "device rejected {} with response code 0x{:02x}",
                kind, response.response
            );
            self.state = LinkState::Faulted {
                code: response.response,
            };
            return;
        }

        match kind {
            CommandKind::Connect => self.state = LinkState::Idle,
            CommandKind::Prepare => self.state = LinkState::Prepared,
            CommandKind::Begin | CommandKind::Update => self.state = LinkState::Playing,
            CommandKind::Stop | CommandKind::EmergencyStop => self.state = LinkState::Idle,
            CommandKind::Ping | CommandKind::Data => {}
        }

        if response
            .status
            .playback_flags
            .contains(PlaybackFlags::UNDERFLOWED)
            && self.state == LinkState::Playing
        {
            warn!(
                "device reported a buffer underrun (fullness {}); playback must be re-begun",
                response.status.buffer_fullness
            );
            self.state = LinkState::Prepared;
        }
    }
}

impl Default for DacSession {
    fn default() -> Self {
        Self::new()
    }
}
