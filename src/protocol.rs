/// Command framing for the DiscFerret wire protocol
///
/// Every exchange is one request frame (opcode byte plus a fixed or
/// length-prefixed argument block) answered by one response frame (status
/// byte, optionally followed by a payload). Register addresses travel
/// big-endian; lengths, the RAM address pointer and version fields travel
/// little-endian. The functions here are pure and perform no I/O.
use crate::error::{DiscFerretError, Result};

/// No operation
pub const CMD_NOP: u8 = 0x00;
/// Put the FPGA into configuration-load mode
pub const CMD_FPGA_INIT: u8 = 0x01;
/// Load a chunk of configuration bitstream into the FPGA
pub const CMD_FPGA_LOAD: u8 = 0x02;
/// Poll the FPGA configuration state
pub const CMD_FPGA_POLL: u8 = 0x03;
/// Write an FPGA register
pub const CMD_FPGA_POKE: u8 = 0x04;
/// Read an FPGA register
pub const CMD_FPGA_PEEK: u8 = 0x05;
/// Set the acquisition RAM address pointer
pub const CMD_RAM_ADDR_SET: u8 = 0x06;
/// Get the acquisition RAM address pointer
pub const CMD_RAM_ADDR_GET: u8 = 0x07;
/// Write acquisition RAM, compatibility mode
pub const CMD_RAM_WRITE: u8 = 0x08;
/// Read acquisition RAM, compatibility mode
pub const CMD_RAM_READ: u8 = 0x09;
/// Write acquisition RAM, fast mode
pub const CMD_RAM_WRITE_FAST: u8 = 0x0A;
/// Read acquisition RAM, fast mode
pub const CMD_RAM_READ_FAST: u8 = 0x0B;
/// Soft-reset the device
pub const CMD_RESET: u8 = 0xFB;
/// Query hardware/firmware/microcode version information
pub const CMD_GET_VERSION: u8 = 0xFF;

/// Maximum bitstream bytes in one FPGA load chunk (64-byte packet minus 2-byte header)
pub const FPGA_CHUNK_MAX: usize = 62;
/// Maximum data bytes in one compatibility-mode RAM write (64-byte packet minus 3-byte header)
pub const RAM_WRITE_COMPAT_MAX: usize = 61;
/// Maximum data bytes in one compatibility-mode RAM read (64-byte response minus status byte)
pub const RAM_READ_COMPAT_MAX: usize = 63;
/// Maximum data bytes in one fast-mode RAM transfer
pub const RAM_FAST_MAX: usize = 65536;

/// Minimum length of a get-version response:
/// status, 4 hardware revision chars, three 16-bit version fields
pub const VERSION_RESPONSE_MIN: usize = 11;

/// Status byte returned in the first position of most response frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Command completed
    Ok,
    /// Device-side hardware malfunction
    HardwareError,
    /// Command payload length rejected
    InvalidLength,
    /// FPGA has no configuration loaded
    FpgaNotConfigured,
    /// FPGA rejected the configuration bitstream
    FpgaRefusedConfiguration,
    /// Command parameter rejected
    InvalidParameter,
    /// Status byte outside the documented domain
    Unknown(u8),
}

impl Status {
    /// Decode a raw status byte
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0 => Status::Ok,
            1 => Status::HardwareError,
            2 => Status::InvalidLength,
            3 => Status::FpgaNotConfigured,
            4 => Status::FpgaRefusedConfiguration,
            5 => Status::InvalidParameter,
            other => Status::Unknown(other),
        }
    }

    /// Map a non-Ok status onto the library error taxonomy
    pub fn check(self) -> Result<()> {
        match self {
            Status::Ok => Ok(()),
            Status::HardwareError => Err(DiscFerretError::Hardware),
            Status::InvalidLength => Err(DiscFerretError::InvalidParameter(
                "length rejected by device",
            )),
            Status::FpgaNotConfigured | Status::FpgaRefusedConfiguration => {
                Err(DiscFerretError::FpgaNotConfigured)
            }
            Status::InvalidParameter => Err(DiscFerretError::InvalidParameter(
                "parameter rejected by device",
            )),
            Status::Unknown(byte) => Err(DiscFerretError::UnexpectedStatus(byte)),
        }
    }
}

/// Encode a register read. The address travels big-endian.
pub fn encode_peek(addr: u16) -> [u8; 3] {
    [CMD_FPGA_PEEK, (addr >> 8) as u8, addr as u8]
}

/// Encode a register write. The address travels big-endian.
pub fn encode_poke(addr: u16, value: u8) -> [u8; 4] {
    [CMD_FPGA_POKE, (addr >> 8) as u8, addr as u8, value]
}

/// Encode a RAM address pointer write. The pointer is 24 bits, little-endian.
pub fn encode_ram_addr_set(addr: u32) -> Result<[u8; 4]> {
    if addr > 0x00FF_FFFF {
        return Err(DiscFerretError::InvalidParameter(
            "RAM address pointer exceeds 24 bits",
        ));
    }
    Ok([
        CMD_RAM_ADDR_SET,
        addr as u8,
        (addr >> 8) as u8,
        (addr >> 16) as u8,
    ])
}

/// Decode the 24-bit little-endian pointer from a RAM address read response
pub fn decode_ram_addr(payload: &[u8; 3]) -> u32 {
    u32::from(payload[0]) | u32::from(payload[1]) << 8 | u32::from(payload[2]) << 16
}

/// Encode one FPGA configuration chunk.
///
/// Each byte is bit-reversed before transmission: the configuration shift
/// register clocks bits in the opposite order to how they are stored in the
/// bitstream file.
pub fn encode_fpga_chunk(data: &[u8]) -> Result<Vec<u8>> {
    if data.is_empty() || data.len() > FPGA_CHUNK_MAX {
        return Err(DiscFerretError::InvalidParameter(
            "FPGA chunk must be 1..=62 bytes",
        ));
    }
    let mut frame = Vec::with_capacity(2 + data.len());
    frame.push(CMD_FPGA_LOAD);
    frame.push(data.len() as u8);
    frame.extend(data.iter().map(|b| b.reverse_bits()));
    Ok(frame)
}

/// Encode a compatibility-mode RAM write chunk. Length travels little-endian.
pub fn encode_ram_write_compat(data: &[u8]) -> Result<Vec<u8>> {
    if data.is_empty() || data.len() > RAM_WRITE_COMPAT_MAX {
        return Err(DiscFerretError::InvalidParameter(
            "compatibility RAM write chunk must be 1..=61 bytes",
        ));
    }
    let len = data.len() as u16;
    let mut frame = Vec::with_capacity(3 + data.len());
    frame.push(CMD_RAM_WRITE);
    frame.push(len as u8);
    frame.push((len >> 8) as u8);
    frame.extend_from_slice(data);
    Ok(frame)
}

/// Encode a compatibility-mode RAM read request. Length travels little-endian.
pub fn encode_ram_read_compat(len: usize) -> Result<[u8; 3]> {
    if len == 0 || len > RAM_READ_COMPAT_MAX {
        return Err(DiscFerretError::InvalidParameter(
            "compatibility RAM read chunk must be 1..=63 bytes",
        ));
    }
    Ok([CMD_RAM_READ, len as u8, (len >> 8) as u8])
}

/// Encode a fast-mode RAM write chunk.
///
/// The header carries (length - 1) little-endian, so a 16-bit field spans
/// the full 1..=65536 range.
pub fn encode_ram_write_fast(data: &[u8]) -> Result<Vec<u8>> {
    if data.is_empty() || data.len() > RAM_FAST_MAX {
        return Err(DiscFerretError::InvalidParameter(
            "fast RAM write chunk must be 1..=65536 bytes",
        ));
    }
    let n = (data.len() - 1) as u16;
    let mut frame = Vec::with_capacity(3 + data.len());
    frame.push(CMD_RAM_WRITE_FAST);
    frame.push(n as u8);
    frame.push((n >> 8) as u8);
    frame.extend_from_slice(data);
    Ok(frame)
}

/// Encode a fast-mode RAM read request. Same (length - 1) header as the write.
pub fn encode_ram_read_fast(len: usize) -> Result<[u8; 3]> {
    if len == 0 || len > RAM_FAST_MAX {
        return Err(DiscFerretError::InvalidParameter(
            "fast RAM read chunk must be 1..=65536 bytes",
        ));
    }
    let n = (len - 1) as u16;
    Ok([CMD_RAM_READ_FAST, n as u8, (n >> 8) as u8])
}
