use log::debug;

use crate::error::Result;
use crate::modbus::frame::{self, RegisterBlock, WriteEcho};
use crate::modbus::transport::Transport;

/// Issues one Modbus operation at a time over an exclusively-owned
/// transport. Taking `&mut self` keeps callers from pipelining requests
/// on the shared connection.
pub struct RegisterClient<T> {
    transport: T,
    unit_id: u8,
}

impl<T: Transport> RegisterClient<T> {
    pub fn new(transport: T, unit_id: u8) -> Self {
        Self { transport, unit_id }
    }

    /// Reads `count` holding registers starting at `address`.
    pub fn read_holding(&mut self, address: u16, count: u16) -> Result<RegisterBlock> {
        let request = frame::encode_read_holding(self.unit_id, address, count)?;
        let response = self.transport.send_and_receive(&request)?;
        let block = frame::decode_read_response(&response)?;
        debug!(
            "unit {}: read {}/{} registers at {}",
            self.unit_id,
            block.len(),
            count,
            address
        );
        Ok(block)
    }

    /// Writes one register, returning the device's echo of the request.
    pub fn write_single(&mut self, address: u16, value: u16) -> Result<WriteEcho> {
        let request = frame::encode_write_single(self.unit_id, address, value);
        let response = self.transport.send_and_receive(&request)?;
        let echo = frame::decode_write_response(&response)?;
        debug!("unit {}: wrote {} to register {}", self.unit_id, value, address);
        Ok(echo)
    }
}
