/*!
# discferret

A Rust library for driving DiscFerret magnetic disc analyser hardware over
USB.

## Features

- Device discovery and exclusive session claiming
- Firmware/microcode capability detection with version-gated behaviour
- FPGA configuration bitstream upload
- Chunked acquisition RAM transfers in fast and compatibility wire modes
- Stepper seek control with track-zero detection and recalibration
- Disc rotation timing via the index period counter

## Quick Start

```rust,no_run
use discferret::{Context, DiscFerret};

let context = Context::new()?;

// Pick a unit
for info in context.list_devices()? {
    println!("{} ({})", info.product, info.serial_number);
}

// Claim the first one and bring it up
let mut ferret = DiscFerret::open_first(&context)?;
let microcode = std::fs::read("microcode.rbf")?;
ferret.fpga_load(&microcode)?;

// Find track zero and measure the spindle
ferret.set_step_rate_us(3000)?;
ferret.recalibrate(100)?;
println!("disc speed: {:.1} RPM", ferret.index_frequency(true)?);
# Ok::<(), Box<dyn std::error::Error>>(())
```

## Blocking model

Every operation is one synchronous request/response exchange with a fixed
per-call timeout. Nothing is retried internally and nothing is cancellable
mid-flight; polling loops (step completion, FPGA status, measurement
availability) busy-wait without backoff, so an unresponsive device can
hang them. A session owns its claimed device exclusively and is not
internally locked.

## Modules

- `context`: USB backend lifecycle and device discovery
- `device`: session handle, register access, RAM transfer, FPGA loading
- `seek`: stepper control and track position bookkeeping
- `index`: rotational timing measurement
- `capabilities`: version info and derived capability records
- `protocol`: wire protocol framing
- `registers`: FPGA register map and status word
- `transport`: bulk transport abstraction
- `error`: error types and Result alias
*/

#![warn(missing_docs)]

/// Firmware/microcode version information and derived capabilities
pub mod capabilities;
/// USB backend lifecycle and device discovery
pub mod context;
/// Session handle, register access, RAM transfer and FPGA loading
pub mod device;
/// Error types and Result alias
pub mod error;
/// Rotational timing measurement
pub mod index;
/// Wire protocol framing
pub mod protocol;
/// FPGA register map and status word definitions
pub mod registers;
/// Stepper seek control and track position bookkeeping
pub mod seek;
/// Bulk transport abstraction
pub mod transport;

// Re-export common types
pub use capabilities::{Capabilities, VersionInfo};
pub use context::{Context, DeviceInfo, PRODUCT_ID, VENDOR_ID};
pub use device::DiscFerret;
pub use error::{DiscFerretError, Result};
pub use registers::StatusWord;
pub use seek::SeekOutcome;
pub use transport::{MockTransport, Transport, UsbTransport};
