use clap::Parser;

use crate::error::{Error, Result};
use crate::storage::{LimitRequest, Side};

const DEFAULT_PORT: u16 = 502;

/// Read and set the battery charge/discharge limits of a SunSpec inverter
#[derive(Debug, Parser)]
#[clap(version)]
pub struct Options {
    /// Device address as <host>[:<port>]; the port defaults to 502
    pub host: String,

    /// Side to act on: in/i for the charge limit, out/o for the discharge
    /// limit; omit to just report the current limits
    pub side: Option<String>,

    /// New limit in percent (60 or 60%), or enable/disable to switch
    /// enforcement without changing the stored limit
    pub value: Option<String>,

    /// enable (or 1) / disable (or 0), when a limit was also given
    pub mode: Option<String>,

    /// Modbus unit id of the device
    #[clap(short, long, default_value_t = 1)]
    pub unit: u8,

    /// Socket timeout in seconds for connect, read and write
    #[clap(short, long)]
    pub timeout: Option<u64>,
}

impl Options {
    pub fn new() -> Self {
        Self::parse()
    }

    /// Splits the host argument into host and port. A colon in the first
    /// position is part of the host (a bare IPv6 literal such as `::1`),
    /// not a port separator.
    pub fn endpoint(&self) -> Result<(String, u16)> {
        match self.host.split_once(':') {
            Some((host, port)) if !host.is_empty() => {
                let port = port
                    .parse()
                    .map_err(|_| Error::Validation(format!("invalid port '{}'", port)))?;
                Ok((host.to_string(), port))
            }
            _ => Ok((self.host.clone(), DEFAULT_PORT)),
        }
    }

    /// Translates the positional arguments into a limit request.
    ///
    /// The value slot defaults to `0`, so a bare side argument disables
    /// that side. `0%` is the one way to ask for an actual zero limit; it
    /// enables enforcement and the mode slot is ignored in that form.
    pub fn request(&self) -> Result<Option<LimitRequest>> {
        let side = match &self.side {
            None => return Ok(None),
            Some(side) => parse_side(side)?,
        };

        let (percent, enable) = match self.value.as_deref().unwrap_or("0") {
            "enable" | "1" => (None, true),
            "disable" | "0" => (None, false),
            "0%" => (Some(0), true),
            value => {
                let digits = value.strip_suffix('%').unwrap_or(value);
                let percent: u16 = digits.parse().map_err(|_| {
                    Error::Validation(format!("invalid limit percent '{}'", value))
                })?;
                if percent > 100 {
                    return Err(Error::Validation(format!(
                        "limit percent {} outside 0..=100",
                        percent
                    )));
                }
                (Some(percent), parse_mode(self.mode.as_deref())?)
            }
        };

        Ok(Some(LimitRequest {
            side,
            percent,
            enable,
        }))
    }
}

fn parse_side(side: &str) -> Result<Side> {
    match side.chars().next().map(|first| first.to_ascii_lowercase()) {
        Some('i') => Ok(Side::Charge),
        Some('o') => Ok(Side::Discharge),
        _ => Err(Error::Validation(format!(
            "invalid side '{}', expected in|i|out|o",
            side
        ))),
    }
}

fn parse_mode(mode: Option<&str>) -> Result<bool> {
    match mode {
        None | Some("enable") | Some("1") => Ok(true),
        Some("disable") | Some("0") => Ok(false),
        Some(other) => Err(Error::Validation(format!(
            "invalid mode '{}', expected enable|1|disable|0",
            other
        ))),
    }
}
