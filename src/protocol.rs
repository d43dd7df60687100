//! Types and constants that precisely match the DAC's wire protocol.
//!
//! The device speaks a little-endian command/response protocol over a
//! persistent TCP connection on port 7765. Every command is a single opcode
//! byte followed by a fixed payload; most commands are answered with a fixed
//! 22-byte standard response carrying the device's status block.

use byteorder::{ByteOrder, ReadBytesExt, WriteBytesExt, LE};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;

use crate::error::ProtocolError;

// -------------------------------------------------------------------------------------------------
//  Constants
// -------------------------------------------------------------------------------------------------

/// TCP port the DAC listens on for the streaming protocol.
pub const DAC_PORT: u16 = 7765;

/// Number of sample slots in the device's internal ring buffer.
pub const BUFFER_CAPACITY: usize = 1799;

// Command opcodes
pub const COMMAND_PING: u8 = b'?';
pub const COMMAND_PREPARE: u8 = b'p';
pub const COMMAND_BEGIN: u8 = b'b';
pub const COMMAND_UPDATE: u8 = b'u';
pub const COMMAND_STOP: u8 = b's';
pub const COMMAND_EMERGENCY_STOP: u8 = 0xFF;
pub const COMMAND_DATA: u8 = b'd';

/// Response code for an acknowledged command. Anything else is a rejection.
pub const RESPONSE_ACK: u8 = b'a';

// -------------------------------------------------------------------------------------------------
//  Traits
// -------------------------------------------------------------------------------------------------

/// A trait for writing any of the protocol types to bytes.
pub trait WriteBytes {
    fn write_bytes<P: WriteToBytes>(&mut self, protocol: P) -> io::Result<()>;
}

/// A trait for reading any of the protocol types from bytes.
pub trait ReadBytes {
    fn read_bytes<P: ReadFromBytes>(&mut self) -> io::Result<P>;
}

/// Protocol types that may be written to bytes.
pub trait WriteToBytes {
    fn write_to_bytes<W: WriteBytesExt>(&self, writer: W) -> io::Result<()>;
}

/// Protocol types that may be read from bytes.
pub trait ReadFromBytes: Sized {
    fn read_from_bytes<R: ReadBytesExt>(reader: R) -> io::Result<Self>;
}

/// Types that have a constant size when written to or read from bytes.
pub trait SizeBytes {
    const SIZE_BYTES: usize;
}

// -------------------------------------------------------------------------------------------------
//  Point
// -------------------------------------------------------------------------------------------------

/// A single sample in the device's native format (18 bytes on the wire).
///
/// Coordinates are full-range signed 16-bit; colors are unsigned 16-bit.
/// `control`, `i` (intensity) and the two reserved user fields are part of
/// the wire format but default to zero.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    /// Control flags (reserved by the protocol).
    pub control: u16,
    /// X coordinate (-32768 to 32767).
    pub x: i16,
    /// Y coordinate (-32768 to 32767).
    pub y: i16,
    /// Red channel (0-65535).
    pub r: u16,
    /// Green channel (0-65535).
    pub g: u16,
    /// Blue channel (0-65535).
    pub b: u16,
    /// Intensity channel (0-65535).
    pub i: u16,
    /// Reserved user field.
    pub u1: u16,
    /// Reserved user field.
    pub u2: u16,
}

impl Point {
    /// Creates a point with the given position and color; all reserved
    /// fields are zero.
    pub fn new(x: i16, y: i16, r: u16, g: u16, b: u16) -> Self {
        Self {
            x,
            y,
            r,
            g,
            b,
            ..Default::default()
        }
    }

    /// Creates a blanked point (laser off) at the given position.
    pub fn blanked(x: i16, y: i16) -> Self {
        Self {
            x,
            y,
            ..Default::default()
        }
    }
}

impl WriteToBytes for Point {
    fn write_to_bytes<W: WriteBytesExt>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u16::<LE>(self.control)?;
        writer.write_i16::<LE>(self.x)?;
        writer.write_i16::<LE>(self.y)?;
        writer.write_u16::<LE>(self.r)?;
        writer.write_u16::<LE>(self.g)?;
        writer.write_u16::<LE>(self.b)?;
        writer.write_u16::<LE>(self.i)?;
        writer.write_u16::<LE>(self.u1)?;
        writer.write_u16::<LE>(self.u2)?;
        Ok(())
    }
}

impl ReadFromBytes for Point {
    fn read_from_bytes<R: ReadBytesExt>(mut reader: R) -> io::Result<Self> {
        let control = reader.read_u16::<LE>()?;
        let x = reader.read_i16::<LE>()?;
        let y = reader.read_i16::<LE>()?;
        let r = reader.read_u16::<LE>()?;
        let g = reader.read_u16::<LE>()?;
        let b = reader.read_u16::<LE>()?;
        let i = reader.read_u16::<LE>()?;
        let u1 = reader.read_u16::<LE>()?;
        let u2 = reader.read_u16::<LE>()?;
        Ok(Point {
            control,
            x,
            y,
            r,
            g,
            b,
            i,
            u1,
            u2,
        })
    }
}

impl SizeBytes for Point {
    const SIZE_BYTES: usize = 18;
}

// -------------------------------------------------------------------------------------------------
//  Status Block
// -------------------------------------------------------------------------------------------------

/// State of the device's light engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LightEngineState {
    Ready,
    Warmup,
    Cooldown,
    EmergencyStop,
}

impl LightEngineState {
    fn from_u8(byte: u8) -> Result<Self, ProtocolError> {
        match byte {
            0 => Ok(LightEngineState::Ready),
            1 => Ok(LightEngineState::Warmup),
            2 => Ok(LightEngineState::Cooldown),
            3 => Ok(LightEngineState::EmergencyStop),
            other => Err(ProtocolError::UnknownLightEngineState(other)),
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            LightEngineState::Ready => 0,
            LightEngineState::Warmup => 1,
            LightEngineState::Cooldown => 2,
            LightEngineState::EmergencyStop => 3,
        }
    }
}

/// State of the device's playback engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PlaybackState {
    /// Nothing queued; the playback engine must be prepared before data is accepted.
    Idle,
    /// Prepared and accepting data, waiting for `begin`.
    Prepared,
    /// Actively draining the ring buffer to the outputs.
    Playing,
}

impl PlaybackState {
    fn from_u8(byte: u8) -> Result<Self, ProtocolError> {
        match byte {
            0 => Ok(PlaybackState::Idle),
            1 => Ok(PlaybackState::Prepared),
            2 => Ok(PlaybackState::Playing),
            other => Err(ProtocolError::UnknownPlaybackState(other)),
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            PlaybackState::Idle => 0,
            PlaybackState::Prepared => 1,
            PlaybackState::Playing => 2,
        }
    }
}

/// Playback flag bitmask carried in the status block.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlaybackFlags(pub u16);

impl PlaybackFlags {
    /// The hardware shutter is open.
    pub const SHUTTER_OPEN: PlaybackFlags = PlaybackFlags(1 << 0);
    /// The ring buffer emptied faster than it was refilled since the last
    /// status; playback has halted and must be re-begun.
    pub const UNDERFLOWED: PlaybackFlags = PlaybackFlags(1 << 1);
    /// The emergency stop is engaged.
    pub const EMERGENCY_STOP: PlaybackFlags = PlaybackFlags(1 << 2);

    /// Returns true if all flags in `other` are set in `self`.
    pub fn contains(self, other: PlaybackFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the raw bitmask.
    pub fn bits(self) -> u16 {
        self.0
    }
}

/// The 20-byte status block the device reports in every standard response.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DacStatus {
    /// Protocol revision spoken by the device.
    pub protocol: u8,
    /// Light engine state.
    pub light_engine: LightEngineState,
    /// Playback engine state.
    pub playback: PlaybackState,
    /// Data source selector (0 = network streaming).
    pub source: u8,
    /// Light engine flag bits.
    pub light_engine_flags: u16,
    /// Playback flag bits.
    pub playback_flags: PlaybackFlags,
    /// Source flag bits.
    pub source_flags: u16,
    /// Number of samples currently queued in the device's ring buffer.
    pub buffer_fullness: u16,
    /// Current playback rate in points per second.
    pub point_rate: u32,
    /// Total points played since the playback engine started.
    pub point_count: u32,
}

impl DacStatus {
    /// Decode a status block from the front of `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() < Self::SIZE_BYTES {
            return Err(ProtocolError::ShortFrame {
                got: bytes.len(),
                need: Self::SIZE_BYTES,
            });
        }
        Ok(DacStatus {
            protocol: bytes[0],
            light_engine: LightEngineState::from_u8(bytes[1])?,
            playback: PlaybackState::from_u8(bytes[2])?,
            source: bytes[3],
            light_engine_flags: LE::read_u16(&bytes[4..6]),
            playback_flags: PlaybackFlags(LE::read_u16(&bytes[6..8])),
            source_flags: LE::read_u16(&bytes[8..10]),
            buffer_fullness: LE::read_u16(&bytes[10..12]),
            point_rate: LE::read_u32(&bytes[12..16]),
            point_count: LE::read_u32(&bytes[16..20]),
        })
    }
}

impl WriteToBytes for DacStatus {
    fn write_to_bytes<W: WriteBytesExt>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u8(self.protocol)?;
        writer.write_u8(self.light_engine.as_u8())?;
        writer.write_u8(self.playback.as_u8())?;
        writer.write_u8(self.source)?;
        writer.write_u16::<LE>(self.light_engine_flags)?;
        writer.write_u16::<LE>(self.playback_flags.0)?;
        writer.write_u16::<LE>(self.source_flags)?;
        writer.write_u16::<LE>(self.buffer_fullness)?;
        writer.write_u32::<LE>(self.point_rate)?;
        writer.write_u32::<LE>(self.point_count)?;
        Ok(())
    }
}

impl SizeBytes for DacStatus {
    const SIZE_BYTES: usize = 20;
}

// -------------------------------------------------------------------------------------------------
//  Standard Response (22 bytes)
// -------------------------------------------------------------------------------------------------

/// The fixed 22-byte frame the device returns after most commands.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StandardResponse {
    /// Response code; [`RESPONSE_ACK`] means acknowledged.
    pub response: u8,
    /// Echo of the command opcode being answered.
    pub command: u8,
    /// The device's current status.
    pub status: DacStatus,
}

impl StandardResponse {
    /// Decode a standard response from the front of `bytes`.
    ///
    /// Fails with a framing error when fewer than 22 bytes are supplied.
    /// Callers that read from the demultiplexer never hit this, since the
    /// demultiplexer only yields once the full frame has accumulated.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() < Self::SIZE_BYTES {
            return Err(ProtocolError::ShortFrame {
                got: bytes.len(),
                need: Self::SIZE_BYTES,
            });
        }
        Ok(StandardResponse {
            response: bytes[0],
            command: bytes[1],
            status: DacStatus::decode(&bytes[2..Self::SIZE_BYTES])?,
        })
    }

    /// Returns true if the device acknowledged the command.
    pub fn is_ack(&self) -> bool {
        self.response == RESPONSE_ACK
    }
}

impl WriteToBytes for StandardResponse {
    fn write_to_bytes<W: WriteBytesExt>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u8(self.response)?;
        writer.write_u8(self.command)?;
        writer.write_bytes(self.status)?;
        Ok(())
    }
}

impl SizeBytes for StandardResponse {
    const SIZE_BYTES: usize = 22;
}

// -------------------------------------------------------------------------------------------------
//  Commands
// -------------------------------------------------------------------------------------------------

/// Identifies which command a pending response slot belongs to.
///
/// `Connect` is not a wire command: it tags the unsolicited status response
/// the device sends when a new connection is accepted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Connect,
    Ping,
    Prepare,
    Begin,
    Update,
    Stop,
    EmergencyStop,
    Data,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandKind::Connect => "connect",
            CommandKind::Ping => "ping",
            CommandKind::Prepare => "prepare",
            CommandKind::Begin => "begin",
            CommandKind::Update => "update",
            CommandKind::Stop => "stop",
            CommandKind::EmergencyStop => "emergency stop",
            CommandKind::Data => "data",
        };
        write!(f, "{}", name)
    }
}

/// The `begin` command: start draining the ring buffer at the given rate.
///
/// The low-water-mark field is reserved by the protocol and always 0.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Begin {
    pub low_water_mark: u16,
    pub point_rate: u32,
}

impl WriteToBytes for Begin {
    fn write_to_bytes<W: WriteBytesExt>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u8(COMMAND_BEGIN)?;
        writer.write_u16::<LE>(self.low_water_mark)?;
        writer.write_u32::<LE>(self.point_rate)?;
        Ok(())
    }
}

impl SizeBytes for Begin {
    const SIZE_BYTES: usize = 7;
}

/// The `update` command: change the playback rate while already playing.
///
/// Same wire shape as [`Begin`].
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Update {
    pub low_water_mark: u16,
    pub point_rate: u32,
}

impl WriteToBytes for Update {
    fn write_to_bytes<W: WriteBytesExt>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u8(COMMAND_UPDATE)?;
        writer.write_u16::<LE>(self.low_water_mark)?;
        writer.write_u32::<LE>(self.point_rate)?;
        Ok(())
    }
}

impl SizeBytes for Update {
    const SIZE_BYTES: usize = 7;
}

/// The `data` command: queue a batch of samples into the ring buffer.
///
/// The batch length is written as a 16-bit count; callers must keep batches
/// under 65536 and within the device's ring buffer capacity.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Data<'a> {
    pub points: &'a [Point],
}

impl WriteToBytes for Data<'_> {
    fn write_to_bytes<W: WriteBytesExt>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u8(COMMAND_DATA)?;
        writer.write_u16::<LE>(self.points.len() as u16)?;
        for point in self.points {
            point.write_to_bytes(&mut writer)?;
        }
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------
//  Blanket Implementations
// -------------------------------------------------------------------------------------------------

impl<P> WriteToBytes for &P
where
    P: WriteToBytes,
{
    fn write_to_bytes<W: WriteBytesExt>(&self, writer: W) -> io::Result<()> {
        (*self).write_to_bytes(writer)
    }
}

impl<W> WriteBytes for W
where
    W: WriteBytesExt,
{
    fn write_bytes<P: WriteToBytes>(&mut self, protocol: P) -> io::Result<()> {
        protocol.write_to_bytes(self)
    }
}

impl<R> ReadBytes for R
where
    R: ReadBytesExt,
{
    fn read_bytes<P: ReadFromBytes>(&mut self) -> io::Result<P> {
        P::read_from_bytes(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_fixture() -> DacStatus {
        DacStatus {
            protocol: 0,
            light_engine: LightEngineState::Ready,
            playback: PlaybackState::Playing,
            source: 0,
            light_engine_flags: 0,
            playback_flags: PlaybackFlags::SHUTTER_OPEN,
            source_flags: 0,
            buffer_fullness: 1700,
            point_rate: 30_000,
            point_count: 123_456,
        }
    }

    // ==========================================================================
    // Point Tests
    // ==========================================================================

    #[test]
    fn test_point_new_zeroes_reserved_fields() {
        let point = Point::new(100, -100, 1, 2, 3);
        assert_eq!(point.control, 0);
        assert_eq!(point.i, 0);
        assert_eq!(point.u1, 0);
        assert_eq!(point.u2, 0);
    }

    #[test]
    fn test_point_blanked_zeroes_all_colors() {
        let point = Point::blanked(5, -7);
        assert_eq!(point.x, 5);
        assert_eq!(point.y, -7);
        assert_eq!(point.r, 0);
        assert_eq!(point.g, 0);
        assert_eq!(point.b, 0);
        assert_eq!(point.i, 0);
    }

    #[test]
    fn test_point_roundtrip_extreme_values() {
        let extremes = [
            Point {
                control: u16::MAX,
                x: i16::MIN,
                y: i16::MAX,
                r: u16::MAX,
                g: 0,
                b: u16::MAX,
                i: u16::MAX,
                u1: 0,
                u2: u16::MAX,
            },
            Point::new(i16::MAX, i16::MIN, 0, u16::MAX, 0),
            Point::default(),
        ];

        for original in extremes {
            let mut buffer = Vec::new();
            buffer.write_bytes(original).unwrap();
            assert_eq!(buffer.len(), Point::SIZE_BYTES);

            let parsed: Point = (&buffer[..]).read_bytes().unwrap();
            assert_eq!(parsed, original);
        }
    }

    #[test]
    fn test_point_byte_layout_is_little_endian() {
        let point = Point {
            control: 0x0102,
            x: 0x0304,
            y: -2, // 0xFFFE
            r: 0x0506,
            g: 0x0708,
            b: 0x090A,
            i: 0x0B0C,
            u1: 0x0D0E,
            u2: 0x0F10,
        };
        let mut buffer = Vec::new();
        buffer.write_bytes(point).unwrap();

        assert_eq!(
            buffer,
            vec![
                0x02, 0x01, // control
                0x04, 0x03, // x
                0xFE, 0xFF, // y
                0x06, 0x05, // r
                0x08, 0x07, // g
                0x0A, 0x09, // b
                0x0C, 0x0B, // i
                0x0E, 0x0D, // u1
                0x10, 0x0F, // u2
            ]
        );
    }

    // ==========================================================================
    // Command Encoding Tests
    // ==========================================================================

    #[test]
    fn test_begin_byte_layout() {
        let begin = Begin {
            low_water_mark: 0,
            point_rate: 30_000, // 0x7530
        };
        let mut buffer = Vec::new();
        buffer.write_bytes(begin).unwrap();

        assert_eq!(buffer, vec![b'b', 0x00, 0x00, 0x30, 0x75, 0x00, 0x00]);
        assert_eq!(buffer.len(), Begin::SIZE_BYTES);
    }

    #[test]
    fn test_update_matches_begin_wire_shape() {
        let begin = Begin {
            low_water_mark: 0,
            point_rate: 12_345,
        };
        let update = Update {
            low_water_mark: 0,
            point_rate: 12_345,
        };

        let mut begin_bytes = Vec::new();
        begin_bytes.write_bytes(begin).unwrap();
        let mut update_bytes = Vec::new();
        update_bytes.write_bytes(update).unwrap();

        // Identical except for the opcode byte.
        assert_eq!(begin_bytes[0], b'b');
        assert_eq!(update_bytes[0], b'u');
        assert_eq!(begin_bytes[1..], update_bytes[1..]);
    }

    #[test]
    fn test_data_byte_layout() {
        let points = [Point::new(1, -1, 0xAAAA, 0xBBBB, 0xCCCC)];
        let mut buffer = Vec::new();
        buffer.write_bytes(Data { points: &points }).unwrap();

        assert_eq!(buffer.len(), 3 + Point::SIZE_BYTES);
        assert_eq!(buffer[0], b'd');
        // Count, little-endian.
        assert_eq!(&buffer[1..3], &[0x01, 0x00]);
        // First point starts with its control word.
        assert_eq!(&buffer[3..5], &[0x00, 0x00]);
        // x = 1, y = -1
        assert_eq!(&buffer[5..7], &[0x01, 0x00]);
        assert_eq!(&buffer[7..9], &[0xFF, 0xFF]);
        assert_eq!(&buffer[9..11], &[0xAA, 0xAA]);
    }

    #[test]
    fn test_data_empty_batch_encodes_count_zero() {
        let mut buffer = Vec::new();
        buffer.write_bytes(Data { points: &[] }).unwrap();
        assert_eq!(buffer, vec![b'd', 0x00, 0x00]);
    }

    #[test]
    fn test_data_batch_roundtrip() {
        let points: Vec<Point> = (0..5)
            .map(|n| {
                Point::new(
                    (n * 1000) as i16,
                    -(n * 1000) as i16,
                    n as u16,
                    (n * 2) as u16,
                    (n * 3) as u16,
                )
            })
            .collect();

        let mut buffer = Vec::new();
        buffer.write_bytes(Data { points: &points }).unwrap();

        let mut cursor = &buffer[..];
        assert_eq!(cursor.read_u8().unwrap(), b'd');
        let count = cursor.read_u16::<LE>().unwrap();
        assert_eq!(count as usize, points.len());

        for original in &points {
            let parsed: Point = cursor.read_bytes().unwrap();
            assert_eq!(parsed, *original);
        }
        assert!(cursor.is_empty());
    }

    // ==========================================================================
    // Status / Response Tests
    // ==========================================================================

    #[test]
    fn test_status_roundtrip() {
        let status = status_fixture();
        let mut buffer = Vec::new();
        buffer.write_bytes(status).unwrap();
        assert_eq!(buffer.len(), DacStatus::SIZE_BYTES);

        let parsed = DacStatus::decode(&buffer).unwrap();
        assert_eq!(parsed, status);
    }

    #[test]
    fn test_standard_response_decode_field_offsets() {
        let mut bytes = vec![0u8; StandardResponse::SIZE_BYTES];
        bytes[0] = b'a'; // response code
        bytes[1] = b'd'; // echoed command
        bytes[4] = 2; // playback state = playing
        bytes[8] = 0x02; // playback flags low byte: underrun
        bytes[12] = 0x07; // buffer fullness = 0x0707
        bytes[13] = 0x07;
        bytes[14] = 0x30; // point rate = 30000
        bytes[15] = 0x75;

        let response = StandardResponse::decode(&bytes).unwrap();
        assert!(response.is_ack());
        assert_eq!(response.command, b'd');
        assert_eq!(response.status.playback, PlaybackState::Playing);
        assert!(response
            .status
            .playback_flags
            .contains(PlaybackFlags::UNDERFLOWED));
        assert_eq!(response.status.buffer_fullness, 0x0707);
        assert_eq!(response.status.point_rate, 30_000);
    }

    #[test]
    fn test_standard_response_roundtrip() {
        let response = StandardResponse {
            response: RESPONSE_ACK,
            command: COMMAND_PING,
            status: status_fixture(),
        };
        let mut buffer = Vec::new();
        buffer.write_bytes(response).unwrap();
        assert_eq!(buffer.len(), StandardResponse::SIZE_BYTES);

        let parsed = StandardResponse::decode(&buffer).unwrap();
        assert_eq!(parsed, response);
    }

    #[test]
    fn test_standard_response_short_frame_is_error() {
        let bytes = [0u8; 21];
        let err = StandardResponse::decode(&bytes).unwrap_err();
        assert_eq!(err, ProtocolError::ShortFrame { got: 21, need: 22 });
    }

    #[test]
    fn test_non_ack_response_code() {
        let mut bytes = vec![0u8; StandardResponse::SIZE_BYTES];
        bytes[0] = b'F'; // buffer full rejection
        let response = StandardResponse::decode(&bytes).unwrap();
        assert!(!response.is_ack());
    }

    #[test]
    fn test_unknown_playback_state_is_error() {
        let mut bytes = vec![0u8; StandardResponse::SIZE_BYTES];
        bytes[0] = b'a';
        bytes[4] = 9;
        let err = StandardResponse::decode(&bytes).unwrap_err();
        assert_eq!(err, ProtocolError::UnknownPlaybackState(9));
    }

    // ==========================================================================
    // PlaybackFlags Tests
    // ==========================================================================

    #[test]
    fn test_playback_flags_contains() {
        let flags = PlaybackFlags(0b011);
        assert!(flags.contains(PlaybackFlags::SHUTTER_OPEN));
        assert!(flags.contains(PlaybackFlags::UNDERFLOWED));
        assert!(!flags.contains(PlaybackFlags::EMERGENCY_STOP));
        assert!(!PlaybackFlags::default().contains(PlaybackFlags::UNDERFLOWED));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_point_serde_roundtrip() {
        let point = Point::new(-123, 456, 1, 2, 3);
        let json = serde_json::to_string(&point).expect("serialize to JSON");
        let restored: Point = serde_json::from_str(&json).expect("deserialize from JSON");
        assert_eq!(restored, point);
    }
}
