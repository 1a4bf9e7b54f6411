/// Firmware/microcode version information and derived capabilities
///
/// Behavioural differences between firmware and microcode revisions are
/// resolved once into an immutable [`Capabilities`] record; higher-level
/// operations consult the record instead of re-checking raw version
/// numbers.
use crate::error::{DiscFerretError, Result};
use crate::protocol::{Status, CMD_GET_VERSION, VERSION_RESPONSE_MIN};

/// Microcode family identifier for standard DiscFerret microcode
pub const MICROCODE_TYPE_STANDARD: u16 = 0xDD55;

/// First firmware revision with the fast RAM transfer commands
pub const FIRMWARE_FAST_RAM_MIN: u16 = 0x001A;
/// First microcode revision with the index period counter (250us resolution)
pub const MICROCODE_INDEX_FREQ_MIN: u16 = 0x001F;
/// First microcode revision with the 10us index counter and measurement-available flag
pub const MICROCODE_INDEX_FREQ_FAST_MIN: u16 = 0x0020;
/// First microcode revision with the track-zero-hit status flag
pub const MICROCODE_TRACK0_FLAG_MIN: u16 = 0x0021;

/// Version information reported by a DiscFerret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    /// Hardware revision, four ASCII characters ("????" if unprogrammed)
    pub hardware_rev: String,
    /// Firmware version
    pub firmware_ver: u16,
    /// Microcode type (family identifier); only valid once microcode is loaded
    pub microcode_type: u16,
    /// Microcode version; only valid once microcode is loaded
    pub microcode_ver: u16,
}

impl VersionInfo {
    /// Parse a get-version response frame.
    ///
    /// Layout: status byte, four hardware revision characters, then
    /// firmware version, microcode type and microcode version as
    /// little-endian 16-bit fields.
    pub fn parse(response: &[u8]) -> Result<Self> {
        if response.len() < VERSION_RESPONSE_MIN {
            return Err(DiscFerretError::ShortResponse {
                opcode: CMD_GET_VERSION,
                expected: VERSION_RESPONSE_MIN,
                actual: response.len(),
            });
        }
        Status::from_byte(response[0]).check()?;
        Ok(VersionInfo {
            hardware_rev: String::from_utf8_lossy(&response[1..5]).into_owned(),
            firmware_ver: u16::from_le_bytes([response[5], response[6]]),
            microcode_type: u16::from_le_bytes([response[7], response[8]]),
            microcode_ver: u16::from_le_bytes([response[9], response[10]]),
        })
    }
}

/// Capability record derived from a [`VersionInfo`] snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capabilities {
    /// Device supports the fast RAM read/write commands
    pub fast_ram: bool,
    /// Microcode provides the index period counter
    pub index_freq_sense: bool,
    /// Microcode provides the "new measurement available" status flag
    pub index_freq_avail_flag: bool,
    /// Microcode provides the "track zero reached during seek" status flag
    pub track0_flag: bool,
    /// Seconds per count of the index period counter
    pub index_freq_multiplier: f64,
}

impl Capabilities {
    /// A record with every capability disabled
    pub fn none() -> Self {
        Capabilities {
            fast_ram: false,
            index_freq_sense: false,
            index_freq_avail_flag: false,
            track0_flag: false,
            index_freq_multiplier: 0.0,
        }
    }

    /// Derive the capability record for a version snapshot.
    ///
    /// Microcode-gated capabilities require the standard microcode family
    /// identifier; an unrecognised family enables none of them regardless
    /// of version number.
    pub fn resolve(info: &VersionInfo) -> Self {
        let mut caps = Capabilities::none();

        if info.firmware_ver >= FIRMWARE_FAST_RAM_MIN {
            caps.fast_ram = true;
        }

        if info.microcode_type == MICROCODE_TYPE_STANDARD {
            if info.microcode_ver >= MICROCODE_INDEX_FREQ_MIN {
                caps.index_freq_sense = true;
                caps.index_freq_multiplier = 250e-6;
            }
            if info.microcode_ver >= MICROCODE_INDEX_FREQ_FAST_MIN {
                caps.index_freq_multiplier = 10e-6;
                caps.index_freq_avail_flag = true;
            }
            if info.microcode_ver >= MICROCODE_TRACK0_FLAG_MIN {
                caps.track0_flag = true;
            }
        }

        caps
    }
}
