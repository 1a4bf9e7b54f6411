/// Integration tests for discferret
///
/// Everything here runs against `SimFerret`, a simulated device that
/// implements the wire protocol over the `Transport` trait: command
/// parsing, register file, stepping, acquisition RAM and the FPGA load
/// state machine.
use std::time::Duration;

use discferret::protocol::{
    CMD_FPGA_INIT, CMD_FPGA_LOAD, CMD_FPGA_PEEK, CMD_FPGA_POKE, CMD_FPGA_POLL, CMD_GET_VERSION,
    CMD_NOP, CMD_RAM_ADDR_GET, CMD_RAM_ADDR_SET, CMD_RAM_READ, CMD_RAM_READ_FAST, CMD_RAM_WRITE,
    CMD_RAM_WRITE_FAST, CMD_RESET,
};
use discferret::{DiscFerret, DiscFerretError, SeekOutcome, Transport};

/// Simulated DiscFerret hardware
struct SimFerret {
    hardware_rev: [u8; 4],
    firmware_ver: u16,
    microcode_type: u16,
    microcode_ver: u16,
    /// Microcode identity that takes effect after a successful FPGA load
    post_load_microcode: (u16, u16),

    fpga_configured: bool,
    fpga_loading: bool,
    fpga_init_fails: bool,
    fpga_accepts: bool,
    fpga_expected: Vec<u8>,
    fpga_received: Vec<u8>,

    ram: Vec<u8>,
    ram_ptr: usize,

    /// Physical head position in tracks
    track: u32,
    track0_hit: bool,
    scratch: u8,

    index_count: u16,
    index_latched_low: u8,
    /// STATUS2 reads remaining before the measurement-available flag sets
    meas_ready_after: u32,

    pending: Option<Vec<u8>>,
}

impl SimFerret {
    fn new(firmware_ver: u16, microcode_type: u16, microcode_ver: u16) -> Self {
        SimFerret {
            hardware_rev: *b"R200",
            firmware_ver,
            microcode_type,
            microcode_ver,
            post_load_microcode: (microcode_type, microcode_ver),
            fpga_configured: true,
            fpga_loading: false,
            fpga_init_fails: false,
            fpga_accepts: true,
            fpga_expected: Vec::new(),
            fpga_received: Vec::new(),
            ram: Vec::new(),
            ram_ptr: 0,
            track: 0,
            track0_hit: false,
            scratch: 0,
            index_count: 0,
            index_latched_low: 0,
            meas_ready_after: 0,
            pending: None,
        }
    }

    fn status1(&self) -> u8 {
        let mut bits = 0u8;
        if self.track == 0 {
            bits |= 0x40; // track 0 pin
        }
        bits
    }

    fn status2(&mut self) -> u8 {
        let mut bits = 0u8;
        if self.track0_hit {
            bits |= 0x10;
        }
        if self.meas_ready_after == 0 {
            bits |= 0x08;
        } else {
            self.meas_ready_after -= 1;
        }
        bits
    }

    fn peek(&mut self, addr: u16) -> Vec<u8> {
        let value = match addr {
            0x0E => self.status1(),
            0x0F => self.status2(),
            0x30 => self.scratch,
            0x31 => !self.scratch,
            0x32 => 0x55,
            0x33 => 0xAA,
            0x40 => {
                self.index_latched_low = self.index_count as u8;
                (self.index_count >> 8) as u8
            }
            0x41 => self.index_latched_low,
            _ => 0x00,
        };
        vec![0x00, value]
    }

    fn poke(&mut self, addr: u16, value: u8) -> Vec<u8> {
        match addr {
            0x30 => self.scratch = value,
            0xFF => {
                let count = u32::from(value & 0x7F) + 1;
                if value & 0x80 != 0 {
                    self.track0_hit = self.track > 0 && count >= self.track;
                    self.track = self.track.saturating_sub(count);
                } else {
                    self.track0_hit = false;
                    self.track += count;
                }
            }
            _ => {}
        }
        vec![0x00]
    }

    fn ram_extend(&mut self, end: usize) {
        if self.ram.len() < end {
            self.ram.resize(end, 0);
        }
    }

    fn handle(&mut self, frame: &[u8]) -> Vec<u8> {
        match frame[0] {
            CMD_NOP | CMD_RESET => vec![0x00],
            CMD_GET_VERSION => {
                let mut resp = vec![0x00];
                resp.extend_from_slice(&self.hardware_rev);
                resp.extend_from_slice(&self.firmware_ver.to_le_bytes());
                resp.extend_from_slice(&self.microcode_type.to_le_bytes());
                resp.extend_from_slice(&self.microcode_ver.to_le_bytes());
                resp
            }
            CMD_FPGA_PEEK => {
                let addr = u16::from(frame[1]) << 8 | u16::from(frame[2]);
                self.peek(addr)
            }
            CMD_FPGA_POKE => {
                let addr = u16::from(frame[1]) << 8 | u16::from(frame[2]);
                self.poke(addr, frame[3])
            }
            CMD_FPGA_INIT => {
                if self.fpga_init_fails {
                    vec![0x01]
                } else {
                    self.fpga_configured = false;
                    self.fpga_loading = true;
                    self.fpga_received.clear();
                    vec![0x00]
                }
            }
            CMD_FPGA_LOAD => {
                if !self.fpga_loading {
                    return vec![0x03];
                }
                let len = usize::from(frame[1]);
                if len == 0 || len > 62 || frame.len() != 2 + len {
                    return vec![0x02];
                }
                // The wire carries bit-reversed bytes; store them restored.
                self.fpga_received
                    .extend(frame[2..].iter().map(|b| b.reverse_bits()));
                vec![0x00]
            }
            CMD_FPGA_POLL => {
                if self.fpga_loading
                    && self.fpga_accepts
                    && self.fpga_received == self.fpga_expected
                    && !self.fpga_expected.is_empty()
                {
                    self.fpga_loading = false;
                    self.fpga_configured = true;
                    let (uc_type, uc_ver) = self.post_load_microcode;
                    self.microcode_type = uc_type;
                    self.microcode_ver = uc_ver;
                }
                if self.fpga_configured {
                    vec![0x00]
                } else {
                    vec![0x03]
                }
            }
            CMD_RAM_ADDR_SET => {
                self.ram_ptr = usize::from(frame[1])
                    | usize::from(frame[2]) << 8
                    | usize::from(frame[3]) << 16;
                vec![0x00]
            }
            CMD_RAM_ADDR_GET => {
                vec![
                    0x00,
                    self.ram_ptr as u8,
                    (self.ram_ptr >> 8) as u8,
                    (self.ram_ptr >> 16) as u8,
                ]
            }
            CMD_RAM_WRITE => {
                let len = usize::from(frame[1]) | usize::from(frame[2]) << 8;
                if len == 0 || len > 61 || frame.len() != 3 + len {
                    return vec![0x02];
                }
                self.ram_extend(self.ram_ptr + len);
                self.ram[self.ram_ptr..self.ram_ptr + len].copy_from_slice(&frame[3..]);
                self.ram_ptr += len;
                vec![0x00]
            }
            CMD_RAM_WRITE_FAST => {
                let len = (usize::from(frame[1]) | usize::from(frame[2]) << 8) + 1;
                if frame.len() != 3 + len {
                    return vec![0x02];
                }
                self.ram_extend(self.ram_ptr + len);
                self.ram[self.ram_ptr..self.ram_ptr + len].copy_from_slice(&frame[3..]);
                self.ram_ptr += len;
                vec![0x00]
            }
            CMD_RAM_READ => {
                let len = usize::from(frame[1]) | usize::from(frame[2]) << 8;
                if len == 0 || len > 63 {
                    return vec![0x02];
                }
                self.ram_extend(self.ram_ptr + len);
                let mut resp = vec![0x00];
                resp.extend_from_slice(&self.ram[self.ram_ptr..self.ram_ptr + len]);
                self.ram_ptr += len;
                resp
            }
            CMD_RAM_READ_FAST => {
                let len = (usize::from(frame[1]) | usize::from(frame[2]) << 8) + 1;
                self.ram_extend(self.ram_ptr + len);
                let resp = self.ram[self.ram_ptr..self.ram_ptr + len].to_vec();
                self.ram_ptr += len;
                resp
            }
            other => panic!("simulated device got unknown opcode {other:#04x}"),
        }
    }
}

impl Transport for SimFerret {
    fn send(&mut self, data: &[u8], _timeout: Duration) -> discferret::Result<usize> {
        let response = self.handle(data);
        self.pending = Some(response);
        Ok(data.len())
    }

    fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> discferret::Result<usize> {
        let response = self
            .pending
            .take()
            .expect("simulated device has no response pending");
        let n = response.len().min(buf.len());
        buf[..n].copy_from_slice(&response[..n]);
        Ok(n)
    }
}

/// A fully featured unit: fast RAM, 10us index counter, all status flags
fn modern_device() -> DiscFerret<SimFerret> {
    DiscFerret::with_transport(SimFerret::new(0x001B, 0xDD55, 0x0021)).unwrap()
}

/// An early unit: compatibility RAM mode only, no microcode extras
fn legacy_device() -> DiscFerret<SimFerret> {
    DiscFerret::with_transport(SimFerret::new(0x0019, 0xDD55, 0x001E)).unwrap()
}

#[test]
fn test_open_resolves_full_capability_set() {
    let dev = modern_device();
    let caps = dev.capabilities();
    assert!(caps.fast_ram);
    assert!(caps.index_freq_sense);
    assert!(caps.index_freq_avail_flag);
    assert!(caps.track0_flag);
    assert_eq!(caps.index_freq_multiplier, 10e-6);
}

#[test]
fn test_open_resolves_legacy_capability_set() {
    let dev = legacy_device();
    let caps = dev.capabilities();
    assert!(!caps.fast_ram);
    assert!(!caps.index_freq_sense);
    assert!(!caps.track0_flag);
}

#[test]
fn test_version_info_fields() {
    let mut dev = modern_device();
    let info = dev.version_info().unwrap();
    assert_eq!(info.hardware_rev, "R200");
    assert_eq!(info.firmware_ver, 0x001B);
    assert_eq!(info.microcode_type, 0xDD55);
    assert_eq!(info.microcode_ver, 0x0021);
}

#[test]
fn test_nop_and_reset() {
    let mut dev = modern_device();
    dev.nop().unwrap();
    dev.reset().unwrap();
}

#[test]
fn test_scratchpad_registers() {
    let mut dev = modern_device();
    dev.poke(0x30, 0x5A).unwrap();
    assert_eq!(dev.peek(0x30).unwrap(), 0x5A);
    assert_eq!(dev.peek(0x31).unwrap(), 0xA5);
    assert_eq!(dev.peek(0x32).unwrap(), 0x55);
    assert_eq!(dev.peek(0x33).unwrap(), 0xAA);
}

#[test]
fn test_ram_pointer_round_trip() {
    let mut dev = modern_device();
    dev.set_ram_addr(0x07_5BCD).unwrap();
    assert_eq!(dev.ram_addr().unwrap(), 0x07_5BCD);
    assert!(matches!(
        dev.set_ram_addr(0x0100_0000),
        Err(DiscFerretError::InvalidParameter(_))
    ));
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[test]
fn test_ram_round_trip_fast_mode_boundaries() {
    // Chunk size, one over, one under.
    let mut dev = modern_device();
    for len in [65536usize, 65537, 65535] {
        let data = pattern(len);
        dev.set_ram_addr(0).unwrap();
        dev.ram_write(&data).unwrap();
        dev.set_ram_addr(0).unwrap();
        assert_eq!(dev.ram_read(len).unwrap(), data, "fast mode, length {len}");
    }
}

#[test]
fn test_ram_round_trip_compat_mode_boundaries() {
    // Write chunks at 61, reads at 63; cover both boundaries and a
    // multi-chunk length.
    let mut dev = legacy_device();
    for len in [60usize, 61, 62, 63, 64, 200] {
        let data = pattern(len);
        dev.set_ram_addr(0).unwrap();
        dev.ram_write(&data).unwrap();
        dev.set_ram_addr(0).unwrap();
        assert_eq!(dev.ram_read(len).unwrap(), data, "compat mode, length {len}");
    }
}

#[test]
fn test_ram_pointer_advances_past_writes() {
    let mut dev = modern_device();
    dev.set_ram_addr(0x100).unwrap();
    dev.ram_write(&pattern(300)).unwrap();
    assert_eq!(dev.ram_addr().unwrap(), 0x100 + 300);
}

#[test]
fn test_fpga_load_refreshes_capabilities() {
    // Unconfigured FPGA, garbage microcode identity before the load.
    let mut sim = SimFerret::new(0x001B, 0xFFFF, 0xFFFF);
    sim.fpga_configured = false;
    let bitstream = pattern(200);
    sim.fpga_expected = bitstream.clone();
    sim.post_load_microcode = (0xDD55, 0x0021);

    let mut dev = DiscFerret::with_transport(sim).unwrap();
    assert!(!dev.capabilities().index_freq_sense);

    dev.fpga_load(&bitstream).unwrap();
    assert!(dev.capabilities().index_freq_sense);
    assert!(dev.capabilities().track0_flag);
}

#[test]
fn test_fpga_load_rejection_reports_not_configured() {
    // Every chunk is accepted but the final poll never reports success.
    let mut sim = SimFerret::new(0x001B, 0xFFFF, 0xFFFF);
    sim.fpga_configured = false;
    sim.fpga_accepts = false;
    let bitstream = pattern(100);
    sim.fpga_expected = bitstream.clone();

    let mut dev = DiscFerret::with_transport(sim).unwrap();
    assert!(matches!(
        dev.fpga_load(&bitstream),
        Err(DiscFerretError::FpgaNotConfigured)
    ));
}

#[test]
fn test_fpga_load_begin_hardware_error() {
    let mut sim = SimFerret::new(0x001B, 0xFFFF, 0xFFFF);
    sim.fpga_configured = false;
    sim.fpga_init_fails = true;

    let mut dev = DiscFerret::with_transport(sim).unwrap();
    assert!(matches!(
        dev.fpga_load(&pattern(10)),
        Err(DiscFerretError::Hardware)
    ));
}

#[test]
fn test_recalibrate_budget_too_small() {
    // Head five tracks out, budget of one step.
    let mut sim = SimFerret::new(0x001B, 0xDD55, 0x0021);
    sim.track = 5;
    let mut dev = DiscFerret::with_transport(sim).unwrap();
    assert!(matches!(
        dev.recalibrate(1),
        Err(DiscFerretError::RecalFailed)
    ));
    assert_eq!(dev.current_track(), None);
}

#[test]
fn test_recalibrate_finds_track_zero() {
    let mut sim = SimFerret::new(0x001B, 0xDD55, 0x0021);
    sim.track = 70;
    let mut dev = DiscFerret::with_transport(sim).unwrap();
    dev.recalibrate(100).unwrap();
    assert_eq!(dev.current_track(), Some(0));
}

#[test]
fn test_recalibrate_without_hit_flag_uses_pin() {
    let mut sim = SimFerret::new(0x0019, 0xDD55, 0x001E);
    sim.track = 30;
    let mut dev = DiscFerret::with_transport(sim).unwrap();
    dev.recalibrate(100).unwrap();
    assert_eq!(dev.current_track(), Some(0));
}

#[test]
fn test_seek_flows() {
    let mut sim = SimFerret::new(0x001B, 0xDD55, 0x0021);
    sim.track = 12;
    let mut dev = DiscFerret::with_transport(sim).unwrap();

    dev.set_step_rate_us(3000).unwrap();
    dev.recalibrate(100).unwrap();

    assert_eq!(dev.seek_absolute(40).unwrap(), SeekOutcome::Completed(40));
    assert_eq!(dev.current_track(), Some(40));

    assert_eq!(dev.seek_relative(-10).unwrap(), SeekOutcome::Completed(30));
    assert_eq!(dev.current_track(), Some(30));

    // Overshooting zero stops at the track-zero indication.
    assert_eq!(dev.seek_relative(-300).unwrap(), SeekOutcome::TrackZero);
    assert_eq!(dev.current_track(), Some(0));
}

#[test]
fn test_seek_relative_from_unknown_position() {
    let mut sim = SimFerret::new(0x001B, 0xDD55, 0x0021);
    sim.track = 10;
    let mut dev = DiscFerret::with_transport(sim).unwrap();
    // Head moves, logical position stays unknown.
    assert_eq!(
        dev.seek_relative(5).unwrap(),
        SeekOutcome::PositionUnknown
    );
    assert_eq!(dev.current_track(), None);
    assert!(matches!(
        dev.seek_absolute(3),
        Err(DiscFerretError::TrackUnknown)
    ));
}

#[test]
fn test_index_frequency_full_flow() {
    let mut sim = SimFerret::new(0x001B, 0xDD55, 0x0021);
    // 20000 counts at 10us: 200ms per revolution, 300 RPM.
    sim.index_count = 20000;
    sim.meas_ready_after = 3;
    let mut dev = DiscFerret::with_transport(sim).unwrap();

    let time = dev.index_time(true).unwrap();
    assert!((time - 0.2).abs() < 1e-9);
    let rpm = dev.index_frequency(false).unwrap();
    assert!((rpm - 300.0).abs() < 1e-6);
}

#[test]
fn test_index_measurement_not_supported_on_old_microcode() {
    let mut dev = legacy_device();
    assert!(matches!(
        dev.index_time(false),
        Err(DiscFerretError::NotSupported)
    ));
}
