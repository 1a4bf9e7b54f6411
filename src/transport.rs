/// Bulk transport abstraction over a claimed device connection
///
/// The wire protocol only needs two primitives: send one request frame,
/// receive one response frame, each within a bounded timeout. Keeping them
/// behind a trait lets the whole protocol stack run against a simulated
/// device in tests.
use std::collections::VecDeque;
use std::time::Duration;

use log::trace;

use crate::error::{DiscFerretError, Result};

/// Bulk OUT endpoint used for request frames
pub(crate) const ENDPOINT_OUT: u8 = 0x01;
/// Bulk IN endpoint used for response frames
pub(crate) const ENDPOINT_IN: u8 = 0x81;

/// Timeout for every bulk transfer
pub(crate) const TIMEOUT: Duration = Duration::from_millis(500);

/// Blocking bulk send/receive over one claimed device connection.
///
/// Implementations report the exact byte counts transferred and surface
/// every failure; nothing is retried at this layer.
pub trait Transport {
    /// Send one request frame; returns the number of bytes accepted.
    fn send(&mut self, data: &[u8], timeout: Duration) -> Result<usize>;

    /// Receive one response frame into `buf`; returns the number of bytes read.
    fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;
}

/// Transport over a claimed USB device handle
pub struct UsbTransport {
    handle: rusb::DeviceHandle<rusb::Context>,
}

impl UsbTransport {
    /// Claim the command interface on an open device handle
    pub(crate) fn claim(handle: rusb::DeviceHandle<rusb::Context>) -> Result<Self> {
        handle.claim_interface(0)?;
        Ok(UsbTransport { handle })
    }
}

impl Transport for UsbTransport {
    fn send(&mut self, data: &[u8], timeout: Duration) -> Result<usize> {
        trace!("bulk out: {} bytes", data.len());
        let sent = self.handle.write_bulk(ENDPOINT_OUT, data, timeout)?;
        Ok(sent)
    }

    fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let read = self.handle.read_bulk(ENDPOINT_IN, buf, timeout)?;
        trace!("bulk in: {} bytes", read);
        Ok(read)
    }
}

impl Drop for UsbTransport {
    fn drop(&mut self) {
        // Best effort: the handle itself is closed by its own Drop.
        let _ = self.handle.release_interface(0);
    }
}

/// Scripted transport for tests.
///
/// Each expected exchange pairs the exact request frame the device should
/// see with the response frame it will answer. A request that deviates
/// from the script, or arrives after the script is exhausted, panics.
#[derive(Default)]
pub struct MockTransport {
    script: VecDeque<(Vec<u8>, Vec<u8>)>,
    pending: Option<Vec<u8>>,
}

impl MockTransport {
    /// Create a transport with an empty script
    pub fn new() -> Self {
        MockTransport::default()
    }

    /// Append one expected request/response exchange to the script
    pub fn expect(mut self, request: &[u8], response: &[u8]) -> Self {
        self.script.push_back((request.to_vec(), response.to_vec()));
        self
    }

    /// Check that every scripted exchange was consumed
    pub fn is_exhausted(&self) -> bool {
        self.script.is_empty() && self.pending.is_none()
    }
}

impl Transport for MockTransport {
    fn send(&mut self, data: &[u8], _timeout: Duration) -> Result<usize> {
        let (expected, response) = self
            .script
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected request past end of script: {data:02x?}"));
        assert_eq!(data, &expected[..], "request does not match script");
        self.pending = Some(response);
        Ok(data.len())
    }

    fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        let response = self
            .pending
            .take()
            .ok_or(DiscFerretError::Usb(rusb::Error::Timeout))?;
        let n = response.len().min(buf.len());
        buf[..n].copy_from_slice(&response[..n]);
        Ok(n)
    }
}
