//! Instrument presets: contract size, session applicability, and default
//! simulation inputs per symbol.
//!
//! The lookup is an explicit dependency (trait object or generic) rather
//! than a global table, so the simulation layer stays testable against a
//! stub provider.

use serde::{Deserialize, Serialize};

/// Default simulation inputs for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentPreset {
    /// Units per standard lot (e.g. 100 oz for XAUUSD).
    pub contract_size: f64,
    /// Whether FX session labels are meaningful for the instrument.
    pub sessions_enabled: bool,
    /// Default grid level distance.
    pub distance: f64,
    /// Default take-profit offset beyond the average entry.
    pub tp_offset: f64,
    /// Default global stop loss in USD (negative).
    pub stop_loss: f64,
    /// Per-lot per-night carry for longs (USD).
    pub swap_long: f64,
    /// Per-lot per-night carry for shorts (USD).
    pub swap_short: f64,
}

/// Source of per-instrument defaults, keyed by normalized symbol.
pub trait PresetProvider {
    /// Preset for a symbol, or `None` when unknown.
    fn preset(&self, symbol: &str) -> Option<InstrumentPreset>;

    /// Preset lookup with the generic fallback applied.
    fn preset_or_default(&self, symbol: &str) -> InstrumentPreset {
        self.preset(symbol).unwrap_or_else(generic_preset)
    }
}

/// Upper-case and strip separators: `xau/usd` -> `XAUUSD`.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol
        .chars()
        .filter(|c| *c != '.' && *c != '/')
        .collect::<String>()
        .to_uppercase()
}

/// Fallback for symbols with no preset entry.
pub fn generic_preset() -> InstrumentPreset {
    InstrumentPreset {
        contract_size: 100.0,
        sessions_enabled: true,
        distance: 1.0,
        tp_offset: 0.5,
        stop_loss: -100_000.0,
        swap_long: -5.0,
        swap_short: 1.0,
    }
}

/// Built-in table of known instruments.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinPresets;

impl PresetProvider for BuiltinPresets {
    fn preset(&self, symbol: &str) -> Option<InstrumentPreset> {
        match normalize_symbol(symbol).as_str() {
            "XAUUSD" => Some(InstrumentPreset {
                contract_size: 100.0,
                sessions_enabled: true,
                distance: 0.25,
                tp_offset: 0.06,
                stop_loss: -200_000.0,
                swap_long: -4.0,
                swap_short: 1.0,
            }),
            "XAGUSD" => Some(InstrumentPreset {
                contract_size: 5000.0,
                sessions_enabled: true,
                distance: 0.005,
                tp_offset: 0.002,
                stop_loss: -100_000.0,
                swap_long: -3.0,
                swap_short: 0.5,
            }),
            "EURUSD" => Some(InstrumentPreset {
                contract_size: 100_000.0,
                sessions_enabled: true,
                distance: 0.0005,
                tp_offset: 0.0002,
                stop_loss: -50_000.0,
                swap_long: -6.0,
                swap_short: 1.5,
            }),
            // Index: no FX sessions.
            "US30" => Some(InstrumentPreset {
                contract_size: 1.0,
                sessions_enabled: false,
                distance: 50.0,
                tp_offset: 20.0,
                stop_loss: -100_000.0,
                swap_long: -15.0,
                swap_short: 5.0,
            }),
            // 24/7 market: no FX sessions, both swaps negative.
            "BTCUSD" => Some(InstrumentPreset {
                contract_size: 1.0,
                sessions_enabled: false,
                distance: 100.0,
                tp_offset: 50.0,
                stop_loss: -200_000.0,
                swap_long: -20.0,
                swap_short: -20.0,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_separators() {
        assert_eq!(normalize_symbol("xau/usd"), "XAUUSD");
        assert_eq!(normalize_symbol("EURUSD.m"), "EURUSDM");
        assert_eq!(normalize_symbol("us30"), "US30");
    }

    #[test]
    fn test_known_symbol_lookup() {
        let preset = BuiltinPresets.preset("xauusd").unwrap();
        assert_eq!(preset.contract_size, 100.0);
        assert!(preset.sessions_enabled);
    }

    #[test]
    fn test_index_preset_disables_sessions() {
        let preset = BuiltinPresets.preset("US30").unwrap();
        assert!(!preset.sessions_enabled);
    }

    #[test]
    fn test_unknown_symbol_falls_back() {
        assert!(BuiltinPresets.preset("GBPJPY").is_none());
        assert_eq!(BuiltinPresets.preset_or_default("GBPJPY"), generic_preset());
    }
}
