/// Stepper motor seek control and track position bookkeeping
///
/// The stepping controller takes bursts of at most 128 steps (direction
/// bit plus count-1 in a single register write); longer moves are split
/// into multiple bursts. After each burst the status word is polled until
/// the stepping bit clears. Track position is only ever updated by a
/// successful recalibrate or seek; any ambiguous outcome resets it to
/// unknown rather than guessing.
use log::debug;

use crate::error::{DiscFerretError, Result};
use crate::registers::{
    StatusWord, R_STEP_CMD, R_STEP_RATE, STEP_BURST_MAX, STEP_CMD_AWAYFROM_ZERO,
    STEP_CMD_TOWARDS_ZERO, STEP_COUNT_MASK,
};
use crate::device::DiscFerret;
use crate::transport::Transport;

/// Resolution of the step rate register, microseconds per count
pub const STEP_RATE_TICK_US: u32 = 250;
/// Largest programmable step rate in microseconds
pub const STEP_RATE_MAX_US: u32 = 255 * STEP_RATE_TICK_US;

/// Result of a completed seek operation.
///
/// Reaching track zero early and moving with an unknown starting position
/// are informative outcomes, not failures; the head has moved in every
/// case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekOutcome {
    /// The move completed; the head is now at this track
    Completed(u32),
    /// Track zero was reached during a zero-ward move and the move stopped
    /// there; the position is now known to be zero
    TrackZero,
    /// The move completed but the position was unknown beforehand and
    /// remains unknown; recalibrate to re-establish it
    PositionUnknown,
}

impl<T: Transport> DiscFerret<T> {
    /// Program the step pulse period in microseconds.
    ///
    /// The hardware timer has 250us resolution; rates above 63750us do not
    /// fit the register and are rejected.
    pub fn set_step_rate_us(&mut self, steprate_us: u32) -> Result<()> {
        if steprate_us > STEP_RATE_MAX_US {
            return Err(DiscFerretError::InvalidParameter(
                "step rate must be at most 63750 microseconds",
            ));
        }
        self.poke(R_STEP_RATE, (steprate_us / STEP_RATE_TICK_US) as u8)
    }

    /// Drive the head towards track zero until the track-zero indication
    /// is seen or `max_steps` steps have been issued.
    ///
    /// On success the position becomes known to be track zero. On budget
    /// exhaustion the position becomes unknown and
    /// [`RecalFailed`](DiscFerretError::RecalFailed) is returned.
    pub fn recalibrate(&mut self, max_steps: u32) -> Result<()> {
        if max_steps < 1 {
            return Err(DiscFerretError::InvalidParameter(
                "step budget must be at least 1",
            ));
        }
        debug!("recalibrating, budget {max_steps} steps");
        let mut remaining = max_steps;
        while remaining > 0 {
            let burst = remaining.min(STEP_BURST_MAX);
            let status = self.step_burst(true, burst)?;
            if self.track0_indicated(&status) {
                self.current_track = Some(0);
                return Ok(());
            }
            remaining -= burst;
        }
        self.current_track = None;
        Err(DiscFerretError::RecalFailed)
    }

    /// Seek a number of steps relative to the current position; negative
    /// values move towards track zero.
    ///
    /// A zero-ward move that reaches track zero stops immediately without
    /// consuming the remaining steps and reports
    /// [`SeekOutcome::TrackZero`]. A completed move from an unknown
    /// position reports [`SeekOutcome::PositionUnknown`]: the head has
    /// moved, but the logical position stays unknown.
    pub fn seek_relative(&mut self, delta: i32) -> Result<SeekOutcome> {
        if delta == 0 {
            return Err(DiscFerretError::InvalidParameter(
                "relative seek of zero steps",
            ));
        }
        let towards_zero = delta < 0;
        let mut remaining = delta.unsigned_abs();
        while remaining > 0 {
            let burst = remaining.min(STEP_BURST_MAX);
            let status = self.step_burst(towards_zero, burst)?;
            if towards_zero && self.track0_indicated(&status) {
                self.current_track = Some(0);
                return Ok(SeekOutcome::TrackZero);
            }
            remaining -= burst;
        }
        match self.current_track {
            None => Ok(SeekOutcome::PositionUnknown),
            Some(track) => {
                let new = i64::from(track) + i64::from(delta);
                if new < 0 {
                    // Moved below zero without a track-zero indication;
                    // the logical position can no longer be trusted.
                    self.current_track = None;
                    Ok(SeekOutcome::PositionUnknown)
                } else {
                    self.current_track = Some(new as u32);
                    Ok(SeekOutcome::Completed(new as u32))
                }
            }
        }
    }

    /// Seek to an absolute track number.
    ///
    /// Requires a known position; returns
    /// [`TrackUnknown`](DiscFerretError::TrackUnknown) without touching
    /// the hardware otherwise.
    pub fn seek_absolute(&mut self, track: u32) -> Result<SeekOutcome> {
        let current = self.current_track.ok_or(DiscFerretError::TrackUnknown)?;
        let delta = i64::from(track) - i64::from(current);
        let delta = i32::try_from(delta)
            .map_err(|_| DiscFerretError::InvalidParameter("seek distance out of range"))?;
        self.seek_relative(delta)
    }

    /// Issue one step burst and wait for the stepping controller to go
    /// idle. Returns the status word observed on completion.
    ///
    /// The wait is a busy poll with no backoff or iteration limit; an
    /// unresponsive device hangs here rather than the library guessing at
    /// head position.
    fn step_burst(&mut self, towards_zero: bool, count: u32) -> Result<StatusWord> {
        debug_assert!((1..=STEP_BURST_MAX).contains(&count));
        let direction = if towards_zero {
            STEP_CMD_TOWARDS_ZERO
        } else {
            STEP_CMD_AWAYFROM_ZERO
        };
        let command = direction | ((count - 1) as u8 & STEP_COUNT_MASK);
        self.poke(R_STEP_CMD, command)?;
        loop {
            let status = self.status()?;
            if !status.stepping() {
                return Ok(status);
            }
        }
    }

    /// Track-zero indication for the active microcode: the dedicated
    /// seek-terminated flag when available, else the raw pin state.
    fn track0_indicated(&self, status: &StatusWord) -> bool {
        if self.capabilities.track0_flag {
            status.track0_hit()
        } else {
            status.track0()
        }
    }
}
