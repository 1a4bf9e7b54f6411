/// Session handle for one claimed DiscFerret device
///
/// A [`DiscFerret`] owns its transport exclusively. Every operation is a
/// blocking request/response exchange with a fixed per-call timeout;
/// nothing is retried internally. The handle is not internally locked --
/// concurrent use requires external mutual exclusion, which the `&mut
/// self` receivers enforce at compile time.
use log::debug;

use crate::capabilities::{Capabilities, VersionInfo};
use crate::context::Context;
use crate::error::{DiscFerretError, Result};
use crate::protocol::{self, Status};
use crate::registers::{StatusWord, R_STATUS1, R_STATUS2};
use crate::transport::{Transport, UsbTransport, TIMEOUT};

/// An open, exclusively-owned connection to one DiscFerret.
///
/// Dropping the handle releases the underlying claim.
pub struct DiscFerret<T: Transport> {
    pub(crate) transport: T,
    pub(crate) capabilities: Capabilities,
    /// Head position; `None` until a recalibrate establishes track zero
    pub(crate) current_track: Option<u32>,
}

impl DiscFerret<UsbTransport> {
    /// Claim a device by serial number, or the first available one when
    /// `serial` is `None`.
    pub fn open(context: &Context, serial: Option<&str>) -> Result<Self> {
        let handle = context.open_handle(serial)?;
        let transport = UsbTransport::claim(handle)?;
        debug!("claimed DiscFerret (serial filter: {serial:?})");
        DiscFerret::with_transport(transport)
    }

    /// Claim the first available device
    pub fn open_first(context: &Context) -> Result<Self> {
        DiscFerret::open(context, None)
    }
}

impl<T: Transport> DiscFerret<T> {
    /// Build a session over an already-connected transport and resolve its
    /// capability record.
    pub fn with_transport(transport: T) -> Result<Self> {
        let mut device = DiscFerret {
            transport,
            capabilities: Capabilities::none(),
            current_track: None,
        };
        device.update_capabilities()?;
        Ok(device)
    }

    /// The capability record resolved for this session
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// The head position, if known
    pub fn current_track(&self) -> Option<u32> {
        self.current_track
    }

    /// One request/response round trip. Validates that the full request
    /// was accepted and returns the response byte count.
    pub(crate) fn exchange(&mut self, request: &[u8], response: &mut [u8]) -> Result<usize> {
        let sent = self.transport.send(request, TIMEOUT)?;
        if sent != request.len() {
            return Err(DiscFerretError::TransferLength {
                expected: request.len(),
                actual: sent,
            });
        }
        self.transport.receive(response, TIMEOUT)
    }

    /// Round trip for commands whose response is a lone status byte
    fn command_status(&mut self, request: &[u8]) -> Result<Status> {
        let mut response = [0u8; 64];
        let n = self.exchange(request, &mut response)?;
        if n < 1 {
            return Err(DiscFerretError::ShortResponse {
                opcode: request[0],
                expected: 1,
                actual: n,
            });
        }
        Ok(Status::from_byte(response[0]))
    }

    /// Protocol no-op; confirms the device is alive and in sync
    pub fn nop(&mut self) -> Result<()> {
        self.command_status(&[protocol::CMD_NOP])?.check()
    }

    /// Soft-reset the device
    pub fn reset(&mut self) -> Result<()> {
        self.command_status(&[protocol::CMD_RESET])?.check()
    }

    /// Read one FPGA register
    pub fn peek(&mut self, addr: u16) -> Result<u8> {
        let request = protocol::encode_peek(addr);
        let mut response = [0u8; 64];
        let n = self.exchange(&request, &mut response)?;
        if n < 2 {
            return Err(DiscFerretError::ShortResponse {
                opcode: protocol::CMD_FPGA_PEEK,
                expected: 2,
                actual: n,
            });
        }
        Status::from_byte(response[0]).check()?;
        Ok(response[1])
    }

    /// Write one FPGA register
    pub fn poke(&mut self, addr: u16, value: u8) -> Result<()> {
        self.command_status(&protocol::encode_poke(addr, value))?
            .check()
    }

    /// Read the 16-bit device status word
    pub fn status(&mut self) -> Result<StatusWord> {
        let status1 = self.peek(R_STATUS1)?;
        let status2 = self.peek(R_STATUS2)?;
        Ok(StatusWord::from_bytes(status1, status2))
    }

    /// Query hardware, firmware and microcode version information.
    ///
    /// Microcode fields are only meaningful once microcode is loaded.
    pub fn version_info(&mut self) -> Result<VersionInfo> {
        let mut response = [0u8; 64];
        let n = self.exchange(&[protocol::CMD_GET_VERSION], &mut response)?;
        VersionInfo::parse(&response[..n])
    }

    /// Re-derive the capability record from a fresh version snapshot.
    ///
    /// Runs automatically at session open and after a successful
    /// [`fpga_load`](Self::fpga_load); call it manually only if microcode
    /// was loaded some other way.
    pub fn update_capabilities(&mut self) -> Result<()> {
        let info = self.version_info()?;
        self.capabilities = Capabilities::resolve(&info);
        debug!(
            "capabilities for fw {:#06x} uc {:#06x}/{:#06x}: {:?}",
            info.firmware_ver, info.microcode_type, info.microcode_ver, self.capabilities
        );
        Ok(())
    }

    /// Read the acquisition RAM address pointer
    pub fn ram_addr(&mut self) -> Result<u32> {
        let mut response = [0u8; 64];
        let n = self.exchange(&[protocol::CMD_RAM_ADDR_GET], &mut response)?;
        if n < 4 {
            return Err(DiscFerretError::ShortResponse {
                opcode: protocol::CMD_RAM_ADDR_GET,
                expected: 4,
                actual: n,
            });
        }
        Status::from_byte(response[0]).check()?;
        Ok(protocol::decode_ram_addr(&[
            response[1],
            response[2],
            response[3],
        ]))
    }

    /// Set the acquisition RAM address pointer (24-bit)
    pub fn set_ram_addr(&mut self, addr: u32) -> Result<()> {
        self.command_status(&protocol::encode_ram_addr_set(addr)?)?
            .check()
    }

    /// Write a buffer to acquisition RAM at the current address pointer.
    ///
    /// The pointer auto-increments on the device. A failed chunk aborts
    /// the operation and leaves the pointer at an indeterminate position;
    /// re-set it before retrying.
    pub fn ram_write(&mut self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Err(DiscFerretError::InvalidParameter("empty RAM write buffer"));
        }
        let max = if self.capabilities.fast_ram {
            protocol::RAM_FAST_MAX
        } else {
            protocol::RAM_WRITE_COMPAT_MAX
        };
        for chunk in data.chunks(max) {
            let frame = if self.capabilities.fast_ram {
                protocol::encode_ram_write_fast(chunk)?
            } else {
                protocol::encode_ram_write_compat(chunk)?
            };
            self.command_status(&frame)?.check()?;
        }
        Ok(())
    }

    /// Read `len` bytes from acquisition RAM at the current address pointer.
    ///
    /// The pointer auto-increments on the device. A failed chunk aborts
    /// the operation and leaves the pointer at an indeterminate position.
    pub fn ram_read(&mut self, len: usize) -> Result<Vec<u8>> {
        if len == 0 {
            return Err(DiscFerretError::InvalidParameter("empty RAM read request"));
        }
        let mut out = vec![0u8; len];
        if self.capabilities.fast_ram {
            let mut offset = 0;
            while offset < len {
                let chunk = (len - offset).min(protocol::RAM_FAST_MAX);
                let request = protocol::encode_ram_read_fast(chunk)?;
                // Fast-mode reads return the raw data with no leading
                // status byte.
                let n = self.exchange(&request, &mut out[offset..offset + chunk])?;
                if n != chunk {
                    return Err(DiscFerretError::TransferLength {
                        expected: chunk,
                        actual: n,
                    });
                }
                offset += chunk;
            }
        } else {
            let mut offset = 0;
            while offset < len {
                let chunk = (len - offset).min(protocol::RAM_READ_COMPAT_MAX);
                let request = protocol::encode_ram_read_compat(chunk)?;
                let mut response = [0u8; 64];
                let n = self.exchange(&request, &mut response)?;
                if n != chunk + 1 {
                    return Err(DiscFerretError::TransferLength {
                        expected: chunk + 1,
                        actual: n,
                    });
                }
                Status::from_byte(response[0]).check()?;
                out[offset..offset + chunk].copy_from_slice(&response[1..=chunk]);
                offset += chunk;
            }
        }
        Ok(out)
    }

    /// Put the FPGA into configuration-load mode
    pub fn fpga_load_begin(&mut self) -> Result<()> {
        self.command_status(&[protocol::CMD_FPGA_INIT])?.check()
    }

    /// Send one bitstream chunk (at most 62 bytes) to the FPGA
    pub fn fpga_load_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.command_status(&protocol::encode_fpga_chunk(chunk)?)?
            .check()
    }

    /// Poll whether the FPGA currently holds a valid configuration
    pub fn fpga_configured(&mut self) -> Result<bool> {
        let status = self.command_status(&[protocol::CMD_FPGA_POLL])?;
        match status {
            Status::FpgaNotConfigured => Ok(false),
            other => {
                other.check()?;
                Ok(true)
            }
        }
    }

    /// Load a complete configuration bitstream into the FPGA.
    ///
    /// Runs the full sequence: enter load mode, confirm the device did,
    /// stream the bitstream in chunks, confirm the FPGA accepted it, then
    /// refresh the capability record (the microcode identity may have
    /// changed). A rejected chunk aborts the sequence; the caller must
    /// restart from the beginning.
    pub fn fpga_load(&mut self, bitstream: &[u8]) -> Result<()> {
        if bitstream.is_empty() {
            return Err(DiscFerretError::InvalidParameter("empty bitstream"));
        }
        debug!("loading {}-byte FPGA bitstream", bitstream.len());
        self.fpga_load_begin()?;
        // The device must confirm it dropped its configuration and entered
        // load mode; still reading "configured" here is a malfunction.
        if self.fpga_configured()? {
            return Err(DiscFerretError::Hardware);
        }
        for chunk in bitstream.chunks(protocol::FPGA_CHUNK_MAX) {
            self.fpga_load_chunk(chunk)?;
        }
        if !self.fpga_configured()? {
            return Err(DiscFerretError::FpgaNotConfigured);
        }
        self.update_capabilities()
    }
}
