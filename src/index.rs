/// Rotational timing measurement via the index period counter
///
/// The microcode counts time between index pulses into a 16-bit register
/// pair. The high byte must be read first: that read latches the low byte,
/// so the pair is consistent. Reading in the other order returns bytes
/// from different measurements.
use crate::device::DiscFerret;
use crate::error::{DiscFerretError, Result};
use crate::registers::{R_INDEX_FREQ_HIGH, R_INDEX_FREQ_LOW};
use crate::transport::Transport;

impl<T: Transport> DiscFerret<T> {
    /// Time in seconds between the two most recent index pulses.
    ///
    /// Requires index frequency sensing in the loaded microcode. With
    /// `wait` set and a microcode that flags new measurements, polls until
    /// a fresh measurement is available before reading; the poll is a
    /// busy-wait with no iteration limit.
    pub fn index_time(&mut self, wait: bool) -> Result<f64> {
        if !self.capabilities.index_freq_sense {
            return Err(DiscFerretError::NotSupported);
        }
        if wait && self.capabilities.index_freq_avail_flag {
            loop {
                let status = self.status()?;
                if status.new_index_measurement() {
                    break;
                }
            }
        }
        // High byte first; this latches the low byte.
        let high = self.peek(R_INDEX_FREQ_HIGH)?;
        let low = self.peek(R_INDEX_FREQ_LOW)?;
        let count = u16::from_be_bytes([high, low]);
        Ok(f64::from(count) * self.capabilities.index_freq_multiplier)
    }

    /// Rotational speed of the disc in revolutions per minute.
    pub fn index_frequency(&mut self, wait: bool) -> Result<f64> {
        let seconds = self.index_time(wait)?;
        if seconds == 0.0 {
            // A zero count means no revolution was measured.
            return Err(DiscFerretError::Hardware);
        }
        Ok(60.0 / seconds)
    }
}
