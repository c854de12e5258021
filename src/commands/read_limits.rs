use crate::error::Result;
use crate::modbus::client::RegisterClient;
use crate::modbus::transport::Transport;
use crate::storage::{self, StorageLimits};
use crate::sunspec::RegisterLayout;

/// Fetches the full storage-control block and decodes the limit points.
pub struct ReadLimits<'a, T> {
    client: &'a mut RegisterClient<T>,
    layout: &'a RegisterLayout,
}

impl<'a, T: Transport> ReadLimits<'a, T> {
    pub fn new(client: &'a mut RegisterClient<T>, layout: &'a RegisterLayout) -> Self {
        Self { client, layout }
    }

    pub fn run(&mut self) -> Result<StorageLimits> {
        let block = self
            .client
            .read_holding(self.layout.base, self.layout.block_len())?;
        storage::read_limits(&block, self.layout)
    }
}
