//! Device discovery via the DAC's periodic UDP broadcast.
//!
//! Once per second the device broadcasts a 36-byte beacon on UDP port 7654
//! announcing its MAC address, hardware/software revision, ring buffer
//! capacity, maximum point rate, and current status. Listening for one
//! beacon is enough to learn where (and whether) to connect.

use byteorder::{ByteOrder, WriteBytesExt, LE};
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};

use crate::error::{ProtocolError, Result};
use crate::protocol::{DacStatus, SizeBytes, WriteBytes, WriteToBytes, DAC_PORT};

/// UDP port the device broadcasts its beacon on.
pub const BROADCAST_PORT: u16 = 7654;

/// The 36-byte discovery beacon a device broadcasts once per second.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DacBroadcast {
    /// MAC address, a stable identifier that survives IP changes.
    pub mac_address: [u8; 6],
    /// Hardware revision.
    pub hw_revision: u16,
    /// Software revision.
    pub sw_revision: u16,
    /// Ring buffer capacity in samples.
    pub buffer_capacity: u16,
    /// Maximum supported playback rate in points per second.
    pub max_point_rate: u32,
    /// Status block at broadcast time.
    pub status: DacStatus,
}

impl DacBroadcast {
    /// Decode a beacon from the front of `bytes`.
    pub fn decode(bytes: &[u8]) -> std::result::Result<Self, ProtocolError> {
        if bytes.len() < Self::SIZE_BYTES {
            return Err(ProtocolError::ShortFrame {
                got: bytes.len(),
                need: Self::SIZE_BYTES,
            });
        }
        let mut mac_address = [0u8; 6];
        mac_address.copy_from_slice(&bytes[0..6]);
        Ok(DacBroadcast {
            mac_address,
            hw_revision: LE::read_u16(&bytes[6..8]),
            sw_revision: LE::read_u16(&bytes[8..10]),
            buffer_capacity: LE::read_u16(&bytes[10..12]),
            max_point_rate: LE::read_u32(&bytes[12..16]),
            status: DacStatus::decode(&bytes[16..Self::SIZE_BYTES])?,
        })
    }

    /// MAC address formatted as a stable device identifier.
    pub fn mac_string(&self) -> String {
        let m = &self.mac_address;
        format!(
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            m[0], m[1], m[2], m[3], m[4], m[5]
        )
    }
}

impl WriteToBytes for DacBroadcast {
    fn write_to_bytes<W: WriteBytesExt>(&self, mut writer: W) -> io::Result<()> {
        for &byte in &self.mac_address {
            writer.write_u8(byte)?;
        }
        writer.write_u16::<LE>(self.hw_revision)?;
        writer.write_u16::<LE>(self.sw_revision)?;
        writer.write_u16::<LE>(self.buffer_capacity)?;
        writer.write_u32::<LE>(self.max_point_rate)?;
        writer.write_bytes(self.status)?;
        Ok(())
    }
}

impl SizeBytes for DacBroadcast {
    const SIZE_BYTES: usize = 36;
}

/// Blocks until one discovery beacon arrives, returning it with its source.
///
/// Binds the broadcast port with address reuse so it can coexist with other
/// listeners on the same host. With `timeout` set, a quiet network surfaces
/// as a transport error of kind `WouldBlock`/`TimedOut`.
pub fn recv_dac_broadcast(timeout: Option<Duration>) -> Result<(DacBroadcast, SocketAddr)> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    let bind_addr: SocketAddr = ([0, 0, 0, 0], BROADCAST_PORT).into();
    socket.bind(&bind_addr.into())?;
    socket.set_read_timeout(timeout)?;

    let socket: UdpSocket = socket.into();
    let mut buf = [0u8; 64];
    let (count, from) = socket.recv_from(&mut buf)?;
    let broadcast = DacBroadcast::decode(&buf[..count])?;
    Ok((broadcast, from))
}

/// The TCP streaming address for a device that broadcast from `source`.
pub fn stream_addr(source: SocketAddr) -> SocketAddr {
    SocketAddr::new(source.ip(), DAC_PORT)
}
