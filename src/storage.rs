use crate::error::{Error, Result};
use crate::modbus::frame::RegisterBlock;
use crate::sunspec::RegisterLayout;

/// Which limit an operation acts on. Charge covers power flowing into the
/// battery (InWRte), discharge power flowing out of it (OutWRte).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Side {
    Charge,
    Discharge,
}

impl Side {
    /// StorCtl_Mod bit that enforces this side's limit.
    pub fn mask(self) -> u16 {
        match self {
            Side::Charge => 1 << 0,
            Side::Discharge => 1 << 1,
        }
    }
}

/// One requested change: which side, an optional new limit, and whether
/// enforcement ends up on or off.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LimitRequest {
    pub side: Side,
    pub percent: Option<u16>,
    pub enable: bool,
}

/// Snapshot of the storage-control registers from one block fetch.
///
/// The scale lives and dies with the snapshot. The device may change the
/// exponent between fetches, so it is never carried over.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StorageLimits {
    pub control_bits: u16,
    pub charge_raw: u16,
    pub discharge_raw: u16,
    pub scale: f64,
}

impl StorageLimits {
    /// Display percentage of one side's limit.
    pub fn percent(&self, side: Side) -> u16 {
        let raw = match side {
            Side::Charge => self.charge_raw,
            Side::Discharge => self.discharge_raw,
        };
        raw_to_percent(raw, self.scale)
    }

    /// Whether enforcement of one side's limit is switched on.
    pub fn enabled(&self, side: Side) -> bool {
        self.control_bits & side.mask() != 0
    }
}

/// Pulls the four points of interest out of a just-fetched block.
pub fn read_limits(block: &RegisterBlock, layout: &RegisterLayout) -> Result<StorageLimits> {
    let register = |offset: u16, name: &str| {
        block.get(offset).ok_or_else(|| {
            Error::Protocol(format!(
                "block of {} registers is missing {} (offset {})",
                block.len(),
                name,
                offset
            ))
        })
    };

    Ok(StorageLimits {
        control_bits: register(layout.storage_control, "StorCtl_Mod")?,
        charge_raw: register(layout.charge_limit, "InWRte")?,
        discharge_raw: register(layout.discharge_limit, "OutWRte")?,
        scale: effective_scale(register(layout.scale_factor, "InOutWRte_SF")?),
    })
}

/// Multiplier for raw limit registers. The exponent register is
/// two's-complement signed; -2 (0xfffe) is the common case and means raw
/// values are hundredths of a percent.
pub fn effective_scale(exponent: u16) -> f64 {
    10f64.powi(i32::from(exponent as i16))
}

/// Raw register value for a requested percentage under the current scale.
pub fn percent_to_raw(percent: u16, scale: f64) -> u16 {
    (f64::from(percent) / scale).round() as u16
}

/// Display percentage for a raw register value, truncated toward zero.
pub fn raw_to_percent(raw: u16, scale: f64) -> u16 {
    (f64::from(raw) * scale) as u16
}

/// Flips one side's enforcement bit; every other bit passes through.
pub fn set_mask(bits: u16, side: Side, enabled: bool) -> u16 {
    if enabled {
        bits | side.mask()
    } else {
        bits & !side.mask()
    }
}
