use log::{debug, info};

use crate::error::{Error, Result};
use crate::modbus::client::RegisterClient;
use crate::modbus::transport::Transport;
use crate::storage::{self, LimitRequest, StorageLimits};
use crate::sunspec::RegisterLayout;

/// Applies one requested change against a block read moments ago.
///
/// Writes the scaled limit first when the request carries one, then the
/// control bitmask, but only if the bitmask actually changed. Reports
/// whether anything was written so the caller knows a settle delay and
/// re-read are due.
pub struct SetLimits<'a, T> {
    client: &'a mut RegisterClient<T>,
    layout: &'a RegisterLayout,
    current: StorageLimits,
    request: LimitRequest,
}

impl<'a, T: Transport> SetLimits<'a, T> {
    pub fn new(
        client: &'a mut RegisterClient<T>,
        layout: &'a RegisterLayout,
        current: StorageLimits,
        request: LimitRequest,
    ) -> Self {
        Self {
            client,
            layout,
            current,
            request,
        }
    }

    pub fn run(&mut self) -> Result<bool> {
        let mut wrote = false;

        if let Some(percent) = self.request.percent {
            // Scaled with the exponent from the block just read; the device
            // may change it at any time, so nothing older would do.
            let raw = storage::percent_to_raw(percent, self.current.scale);
            let address = self.layout.limit_address(self.request.side);
            info!("writing limit {}% as {} to register {}", percent, raw, address);
            self.write_checked(address, raw)?;
            wrote = true;
        }

        let bits = storage::set_mask(
            self.current.control_bits,
            self.request.side,
            self.request.enable,
        );
        if bits != self.current.control_bits {
            let address = self.layout.storage_control_address();
            info!(
                "updating StorCtl_Mod {:#06x} -> {:#06x}",
                self.current.control_bits, bits
            );
            self.write_checked(address, bits)?;
            wrote = true;
        } else {
            debug!("StorCtl_Mod already {:#06x}, skipping write", bits);
        }

        Ok(wrote)
    }

    fn write_checked(&mut self, address: u16, value: u16) -> Result<()> {
        let echo = self.client.write_single(address, value)?;
        if echo.value != value {
            return Err(Error::Protocol(format!(
                "failed to set register {}, got back value {} (wanted {})",
                address, echo.value, value
            )));
        }
        Ok(())
    }
}
