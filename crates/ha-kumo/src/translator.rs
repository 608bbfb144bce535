//! Vendor mode translation
//!
//! A [`VendorModeTable`] lists every mode string a vendor emits together with
//! the normalized mode and the observed action it stands for. Several vendor
//! strings may collapse into one mode (Kumo reports `auto`, `autoCool` and
//! `autoHeat` for `heat_cool`), so the reverse direction uses a separate
//! canonical list with one vendor string per mode.

use crate::error::TranslateError;
use ha_climate::{HvacAction, HvacMode};

/// Forward entry: one vendor string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VendorMode {
    pub vendor: &'static str,
    pub mode: HvacMode,
    pub action: HvacAction,
}

/// Immutable translation table of one vendor
#[derive(Debug)]
pub struct VendorModeTable {
    pub vendor: &'static str,
    /// Every vendor string the unit can report
    pub forward: &'static [VendorMode],
    /// Vendor string used to command each mode, in display order
    pub canonical: &'static [(HvacMode, &'static str)],
}

pub const KUMO_AUTO: &str = "auto";
pub const KUMO_AUTO_COOL: &str = "autoCool";
pub const KUMO_AUTO_HEAT: &str = "autoHeat";
pub const KUMO_COOL: &str = "cool";
pub const KUMO_HEAT: &str = "heat";
pub const KUMO_DRY: &str = "dry";
pub const KUMO_VENT: &str = "vent";
pub const KUMO_OFF: &str = "off";

/// Kumo mode vocabulary
pub static KUMO_MODES: VendorModeTable = VendorModeTable {
    vendor: "kumo",
    forward: &[
        VendorMode {
            vendor: KUMO_AUTO,
            mode: HvacMode::HeatCool,
            action: HvacAction::Idle,
        },
        VendorMode {
            vendor: KUMO_AUTO_COOL,
            mode: HvacMode::HeatCool,
            action: HvacAction::Cooling,
        },
        VendorMode {
            vendor: KUMO_AUTO_HEAT,
            mode: HvacMode::HeatCool,
            action: HvacAction::Heating,
        },
        VendorMode {
            vendor: KUMO_COOL,
            mode: HvacMode::Cool,
            action: HvacAction::Cooling,
        },
        VendorMode {
            vendor: KUMO_HEAT,
            mode: HvacMode::Heat,
            action: HvacAction::Heating,
        },
        VendorMode {
            vendor: KUMO_DRY,
            mode: HvacMode::Dry,
            action: HvacAction::Drying,
        },
        VendorMode {
            vendor: KUMO_VENT,
            mode: HvacMode::FanOnly,
            action: HvacAction::Fan,
        },
        VendorMode {
            vendor: KUMO_OFF,
            mode: HvacMode::Off,
            action: HvacAction::Off,
        },
    ],
    canonical: &[
        (HvacMode::HeatCool, KUMO_AUTO),
        (HvacMode::Cool, KUMO_COOL),
        (HvacMode::Heat, KUMO_HEAT),
        (HvacMode::Dry, KUMO_DRY),
        (HvacMode::FanOnly, KUMO_VENT),
        (HvacMode::Off, KUMO_OFF),
    ],
};

/// Translator over one injected table
#[derive(Debug, Clone, Copy)]
pub struct ModeTranslator {
    table: &'static VendorModeTable,
}

impl ModeTranslator {
    pub fn new(table: &'static VendorModeTable) -> Self {
        Self { table }
    }

    /// Translator over [`KUMO_MODES`]
    pub fn kumo() -> Self {
        Self::new(&KUMO_MODES)
    }

    pub fn table(&self) -> &'static VendorModeTable {
        self.table
    }

    fn lookup(&self, vendor: &str) -> Result<&'static VendorMode, TranslateError> {
        self.table
            .forward
            .iter()
            .find(|entry| entry.vendor == vendor)
            .ok_or_else(|| TranslateError::UnknownVendorMode(vendor.to_string()))
    }

    /// Setpoint mode a vendor string stands for
    pub fn to_normalized_mode(&self, vendor: &str) -> Result<HvacMode, TranslateError> {
        self.lookup(vendor).map(|entry| entry.mode)
    }

    /// Activity a vendor string reports
    pub fn to_normalized_action(&self, vendor: &str) -> Result<HvacAction, TranslateError> {
        self.lookup(vendor).map(|entry| entry.action)
    }

    /// Vendor string that commands `mode`
    pub fn to_vendor_mode(&self, mode: HvacMode) -> Result<&'static str, TranslateError> {
        self.table
            .canonical
            .iter()
            .find(|(m, _)| *m == mode)
            .map(|(_, vendor)| *vendor)
            .ok_or(TranslateError::UnsupportedModeForVendor(mode))
    }

    /// Modes the unit can be commanded into
    pub fn supported_modes(&self) -> Vec<HvacMode> {
        self.table.canonical.iter().map(|(mode, _)| *mode).collect()
    }
}
