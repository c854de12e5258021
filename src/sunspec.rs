use log::debug;

use crate::error::{Error, Result};
use crate::modbus::client::RegisterClient;
use crate::modbus::transport::Transport;
use crate::storage::Side;

/// Register announcing which storage model the device exposes.
pub const MODEL_REGISTER: u16 = 215;

// Model code 2 is the integer map with a shared scale factor; every other
// code gets the float map at its own base.
const INTEGER_MODEL_CODE: u16 = 2;
const INTEGER_BASE: u16 = 40303;
const FLOAT_BASE: u16 = 40313;

// Points of interest, as offsets from the variant's base address.
const STORAGE_CONTROL_OFFSET: u16 = 5; // StorCtl_Mod
const DISCHARGE_LIMIT_OFFSET: u16 = 12; // OutWRte
const CHARGE_LIMIT_OFFSET: u16 = 13; // InWRte
const SCALE_FACTOR_OFFSET: u16 = 25; // InOutWRte_SF

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ModelVariant {
    Integer,
    Float,
}

/// Where the storage-control points live for one resolved model.
///
/// Produced once per session by `resolve_layout` and passed along
/// explicitly; nothing else knows about base addresses.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RegisterLayout {
    pub variant: ModelVariant,
    pub base: u16,
    pub storage_control: u16,
    pub discharge_limit: u16,
    pub charge_limit: u16,
    pub scale_factor: u16,
}

impl RegisterLayout {
    pub fn for_variant(variant: ModelVariant) -> Self {
        let base = match variant {
            ModelVariant::Integer => INTEGER_BASE,
            ModelVariant::Float => FLOAT_BASE,
        };
        Self {
            variant,
            base,
            storage_control: STORAGE_CONTROL_OFFSET,
            discharge_limit: DISCHARGE_LIMIT_OFFSET,
            charge_limit: CHARGE_LIMIT_OFFSET,
            scale_factor: SCALE_FACTOR_OFFSET,
        }
    }

    /// Registers a block fetch must cover to include every point.
    pub fn block_len(&self) -> u16 {
        self.scale_factor + 1
    }

    pub fn storage_control_address(&self) -> u16 {
        self.base + self.storage_control
    }

    /// Absolute address of one side's limit register.
    pub fn limit_address(&self, side: Side) -> u16 {
        let offset = match side {
            Side::Charge => self.charge_limit,
            Side::Discharge => self.discharge_limit,
        };
        self.base + offset
    }
}

/// Reads the model register and picks the layout for what it announces.
///
/// Must run before any other register access: every address after this
/// point is relative to the resolved base.
pub fn resolve_layout<T: Transport>(client: &mut RegisterClient<T>) -> Result<RegisterLayout> {
    let probe = client.read_holding(MODEL_REGISTER, 1)?;
    let code = probe.get(0).ok_or_else(|| {
        Error::Protocol("model probe returned an empty register block".to_string())
    })?;

    let variant = if code == INTEGER_MODEL_CODE {
        ModelVariant::Integer
    } else {
        ModelVariant::Float
    };
    let layout = RegisterLayout::for_variant(variant);
    debug!(
        "model code {} selects {:?} layout at base {}",
        code, variant, layout.base
    );

    Ok(layout)
}
