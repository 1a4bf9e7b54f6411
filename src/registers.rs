/// DiscFerret FPGA register map and status word definitions
///
/// Registers are addressed with opaque 16-bit keys through `peek`/`poke`.
/// The two status registers combine into a single 16-bit status word,
/// wrapped here as [`StatusWord`].

use std::fmt;

/// Disc drive control register
pub const R_DRIVE_CONTROL: u16 = 0x04;
/// Acquisition control register
pub const R_ACQCON: u16 = 0x05;
/// Acquisition start event
pub const R_ACQ_START_EVT: u16 = 0x06;
/// Acquisition stop event
pub const R_ACQ_STOP_EVT: u16 = 0x07;
/// Number of start event triggers required before acquisition starts
pub const R_ACQ_START_NUM: u16 = 0x08;
/// Number of stop event triggers required before acquisition stops
pub const R_ACQ_STOP_NUM: u16 = 0x09;
/// Acquisition clock divider ratio
pub const R_ACQ_CLKSEL: u16 = 0x0A;
/// Status register 1 (high byte of the status word)
pub const R_STATUS1: u16 = 0x0E;
/// Status register 2 (low byte of the status word)
pub const R_STATUS2: u16 = 0x0F;
/// Hard sector track mark detector threshold, acquisition start event
pub const R_ACQ_HSTMD_THR_START: u16 = 0x10;
/// Hard sector track mark detector threshold, acquisition stop event
pub const R_ACQ_HSTMD_THR_STOP: u16 = 0x11;
/// MFM sync word, acquisition start event, low byte
pub const R_MFM_SYNCWORD_START_L: u16 = 0x20;
/// MFM sync word, acquisition start event, high byte
pub const R_MFM_SYNCWORD_START_H: u16 = 0x21;
/// MFM sync word, acquisition stop event, low byte
pub const R_MFM_SYNCWORD_STOP_L: u16 = 0x22;
/// MFM sync word, acquisition stop event, high byte
pub const R_MFM_SYNCWORD_STOP_H: u16 = 0x23;
/// MFM sync word comparison mask, acquisition start event, low byte
pub const R_MFM_MASK_START_L: u16 = 0x24;
/// MFM sync word comparison mask, acquisition start event, high byte
pub const R_MFM_MASK_START_H: u16 = 0x25;
/// MFM sync word comparison mask, acquisition stop event, low byte
pub const R_MFM_MASK_STOP_L: u16 = 0x26;
/// MFM sync word comparison mask, acquisition stop event, high byte
pub const R_MFM_MASK_STOP_H: u16 = 0x27;
/// MFM sync word detector clock select
pub const R_MFM_CLKSEL: u16 = 0x2F;
/// TEST: scratchpad register (read/write)
pub const R_SCRATCHPAD: u16 = 0x30;
/// TEST: inverse scratchpad (read only, returns NOT of scratchpad)
pub const R_INVERSE_SCRATCHPAD: u16 = 0x31;
/// TEST: fixed 0x55 (read only)
pub const R_FIXED55: u16 = 0x32;
/// TEST: fixed 0xAA (read only)
pub const R_FIXEDAA: u16 = 0x33;
/// TEST: clock ticker, increments at 20MHz (read only)
pub const R_CLOCK_TICKER: u16 = 0x34;
/// TEST: clock ticker, increments at PLL clock rate (read only)
pub const R_CLOCK_TICKER_PLL: u16 = 0x35;
/// Index period counter, high byte.
///
/// Reading this register latches the low byte of the counter into
/// [`R_INDEX_FREQ_LOW`]; reading the low byte first produces an erroneous
/// result.
pub const R_INDEX_FREQ_HIGH: u16 = 0x40;
/// Index period counter, low byte -- see [`R_INDEX_FREQ_HIGH`]
pub const R_INDEX_FREQ_LOW: u16 = 0x41;
/// HSIO pin direction register
pub const R_HSIO_DIR: u16 = 0xE0;
/// HSIO pin settings register
pub const R_HSIO_PIN: u16 = 0xE1;
/// Stepping controller: step rate, 250us per count
pub const R_STEP_RATE: u16 = 0xF0;
/// Stepping controller: step command. Bit 7 = direction, bits 6..0 = step count - 1.
pub const R_STEP_CMD: u16 = 0xFF;

/// Step command: step towards track zero
pub const STEP_CMD_TOWARDS_ZERO: u8 = 0x80;
/// Step command: step away from track zero
pub const STEP_CMD_AWAYFROM_ZERO: u8 = 0x00;
/// Step command: bit mask for the step count field
pub const STEP_COUNT_MASK: u8 = 0x7F;
/// Largest number of steps one step command can issue
pub const STEP_BURST_MAX: u32 = 128;

/// DRIVE_CONTROL register bits
pub mod drive_control {
    /// Density output
    pub const DENSITY: u8 = 0x01;
    /// In Use output
    pub const INUSE: u8 = 0x02;
    /// Drive select 0
    pub const DS0: u8 = 0x04;
    /// Drive select 1
    pub const DS1: u8 = 0x08;
    /// Drive select 2
    pub const DS2: u8 = 0x10;
    /// Drive select 3
    pub const DS3: u8 = 0x20;
    /// Motor enable
    pub const MOTEN: u8 = 0x40;
    /// Side select
    pub const SIDESEL: u8 = 0x80;
}

/// ACQCON register bits
pub mod acqcon {
    /// Start a write operation
    pub const WRITE: u8 = 0x04;
    /// Abort the current read/write operation
    pub const ABORT: u8 = 0x02;
    /// Start a read operation
    pub const START: u8 = 0x01;
}

/// Events for the ACQ_START_EVT / ACQ_STOP_EVT registers
pub mod acq_event {
    /// Trigger immediately
    pub const IMMEDIATE: u8 = 0x00;
    /// Trigger at the next index pulse
    pub const INDEX: u8 = 0x01;
    /// Trigger at the next sync word match
    pub const SYNC_WORD: u8 = 0x02;
    /// Wait for a hard-sector track mark before checking the trigger
    pub const WAIT_HSTMD: u8 = 0x80;
}

/// Legal MFM_CLKSEL values
pub mod mfm_clksel {
    /// 1 megabit per second (IBM 2.88MB MFM)
    pub const MBPS_1: u8 = 0x00;
    /// 500kbps (IBM 1.44MB MFM)
    pub const KBPS_500: u8 = 0x01;
    /// 250kbps (IBM 720K MFM)
    pub const KBPS_250: u8 = 0x02;
    /// 125kbps FM
    pub const KBPS_125: u8 = 0x03;
}

/// Legal ACQ_CLKSEL values
pub mod acq_clksel {
    /// Full rate (100MHz)
    pub const MHZ_100: u8 = 0x00;
    /// Half rate (50MHz)
    pub const MHZ_50: u8 = 0x01;
    /// Quarter rate (25MHz)
    pub const MHZ_25: u8 = 0x02;
    /// Eighth rate (12.5MHz)
    pub const MHZ_12_5: u8 = 0x03;
}

/// The 16-bit device status word, `(STATUS1 << 8) | STATUS2`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusWord(pub u16);

impl StatusWord {
    /// Index pulse pin active - Bit 15
    pub const INDEX: u16 = 0x8000;
    /// Track 0 pin active - Bit 14
    pub const TRACK0: u16 = 0x4000;
    /// Disc write protected - Bit 13
    pub const WRITE_PROTECT: u16 = 0x2000;
    /// Disc changed - Bit 12
    pub const DISC_CHANGE: u16 = 0x1000;
    /// Density pin state - Bit 11
    pub const DENSITY: u16 = 0x0800;
    /// Stepping controller currently stepping - Bit 10
    pub const STEPPING: u16 = 0x0400;
    /// Acquisition RAM empty - Bit 9
    pub const RAM_EMPTY: u16 = 0x0200;
    /// Acquisition RAM full - Bit 8
    pub const RAM_FULL: u16 = 0x0100;
    /// Last seek terminated because track 0 was reached - Bit 4 (microcode-gated)
    pub const TRACK0_HIT: u16 = 0x0010;
    /// New index period measurement available - Bit 3 (microcode-gated)
    pub const NEW_INDEX_MEAS: u16 = 0x0008;
    /// Mask over the acquisition engine state bits
    pub const ACQSTATUS_MASK: u16 = 0x0007;
    /// Acquisition engine: writing to disc
    pub const ACQ_WRITING: u16 = 0x04;
    /// Acquisition engine: waiting for trigger
    pub const ACQ_WAITING: u16 = 0x02;
    /// Acquisition engine: acquiring
    pub const ACQ_ACQUIRING: u16 = 0x01;
    /// Acquisition engine: idle
    pub const ACQ_IDLE: u16 = 0x00;

    /// Combine the two raw status register bytes into a status word
    #[inline]
    pub fn from_bytes(status1: u8, status2: u8) -> Self {
        StatusWord(u16::from(status1) << 8 | u16::from(status2))
    }

    /// Check if the index pulse pin is active
    #[inline]
    pub fn index(&self) -> bool {
        (self.0 & Self::INDEX) != 0
    }

    /// Check if the track 0 pin is active
    #[inline]
    pub fn track0(&self) -> bool {
        (self.0 & Self::TRACK0) != 0
    }

    /// Check if the disc is write protected
    #[inline]
    pub fn write_protect(&self) -> bool {
        (self.0 & Self::WRITE_PROTECT) != 0
    }

    /// Check if the disc-change pin is active
    #[inline]
    pub fn disc_change(&self) -> bool {
        (self.0 & Self::DISC_CHANGE) != 0
    }

    /// Check the density pin state
    #[inline]
    pub fn density(&self) -> bool {
        (self.0 & Self::DENSITY) != 0
    }

    /// Check if the stepping controller is currently stepping
    #[inline]
    pub fn stepping(&self) -> bool {
        (self.0 & Self::STEPPING) != 0
    }

    /// Check if acquisition RAM is empty
    #[inline]
    pub fn ram_empty(&self) -> bool {
        (self.0 & Self::RAM_EMPTY) != 0
    }

    /// Check if acquisition RAM is full
    #[inline]
    pub fn ram_full(&self) -> bool {
        (self.0 & Self::RAM_FULL) != 0
    }

    /// Check if the last seek stopped because track 0 was reached.
    /// Only meaningful when the microcode provides the track-zero-hit flag.
    #[inline]
    pub fn track0_hit(&self) -> bool {
        (self.0 & Self::TRACK0_HIT) != 0
    }

    /// Check if a new index period measurement is available.
    /// Only meaningful when the microcode provides the flag.
    #[inline]
    pub fn new_index_measurement(&self) -> bool {
        (self.0 & Self::NEW_INDEX_MEAS) != 0
    }

    /// Raw acquisition engine state bits
    #[inline]
    pub fn acq_state(&self) -> u16 {
        self.0 & Self::ACQSTATUS_MASK
    }
}

impl fmt::Display for StatusWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut flags = Vec::new();
        if self.index() {
            flags.push("INDEX");
        }
        if self.track0() {
            flags.push("TRACK0");
        }
        if self.write_protect() {
            flags.push("WRPROT");
        }
        if self.disc_change() {
            flags.push("DISCCHG");
        }
        if self.density() {
            flags.push("DENSITY");
        }
        if self.stepping() {
            flags.push("STEPPING");
        }
        if self.ram_empty() {
            flags.push("RAMEMPTY");
        }
        if self.ram_full() {
            flags.push("RAMFULL");
        }
        if self.track0_hit() {
            flags.push("TRACK0HIT");
        }
        if self.new_index_measurement() {
            flags.push("NEWMEAS");
        }
        match self.acq_state() {
            Self::ACQ_WRITING => flags.push("ACQWRITE"),
            Self::ACQ_WAITING => flags.push("ACQWAIT"),
            Self::ACQ_ACQUIRING => flags.push("ACQREAD"),
            _ => {}
        }
        if flags.is_empty() {
            write!(f, "IDLE")
        } else {
            write!(f, "{}", flags.join("|"))
        }
    }
}
