// Module declarations for the crate's components
pub mod commands; // Read/apply operations against the device
pub mod error;    // Error handling and types
pub mod modbus;   // Modbus-TCP codec, transport and client
pub mod options;  // Command line options parsing
pub mod storage;  // Storage-control registers and scaling
pub mod sunspec;  // Model probe and register layout

pub use error::{Error, Result};

use std::thread;
use std::time::Duration;

use log::info;

use crate::commands::read_limits::ReadLimits;
use crate::commands::set_limits::SetLimits;
use crate::modbus::client::RegisterClient;
use crate::modbus::transport::{TcpTransport, Transport};
use crate::options::Options;
use crate::storage::{LimitRequest, StorageLimits};

/// Wait between a register write and the re-read that confirms it; the
/// device does not reflect writes immediately.
pub const SETTLE_DELAY: Duration = Duration::from_millis(2000);

/// Connects to the device named by the options and runs one session.
pub fn run(options: &Options) -> Result<StorageLimits> {
    let (host, port) = options.endpoint()?;
    let request = options.request()?;

    let transport = TcpTransport::connect(&host, port, options.timeout.map(Duration::from_secs))?;
    let mut client = RegisterClient::new(transport, options.unit);

    run_with(&mut client, request)
}

/// One full session: probe the model, read the limits, apply the request
/// if there is one, and re-read after a settle delay when anything was
/// written.
pub fn run_with<T: Transport>(
    client: &mut RegisterClient<T>,
    request: Option<LimitRequest>,
) -> Result<StorageLimits> {
    let layout = sunspec::resolve_layout(client)?;
    let mut limits = ReadLimits::new(client, &layout).run()?;

    if let Some(request) = request {
        let wrote = SetLimits::new(client, &layout, limits, request).run()?;
        if wrote {
            info!("settling for {:?} before re-reading", SETTLE_DELAY);
            thread::sleep(SETTLE_DELAY);
            limits = ReadLimits::new(client, &layout).run()?;
        }
    }

    Ok(limits)
}
