use std::env;

pub const DEFAULT_FUEL: usize = 100_000;
pub const FUEL_VARIABLE: &str = "PROOFKIT_FUEL";

/// Kernel settings shared by every query against one environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelConfig {
    /// Reduction steps allowed per query, `None` is unbounded.
    pub fuel: Option<usize>,
}

impl Default for KernelConfig {
    fn default() -> Self {
        KernelConfig { fuel: Some(DEFAULT_FUEL) }
    }
}

impl KernelConfig {
    pub fn unlimited() -> Self { KernelConfig { fuel: None } }

    pub fn with_fuel(fuel: usize) -> Self { KernelConfig { fuel: Some(fuel) } }

    /// Reads `PROOFKIT_FUEL`; `0` or `none` disables the budget, garbage falls back to the default.
    pub fn from_env() -> Self {
        match env::var(FUEL_VARIABLE) {
            Ok(value) => Self::parse_fuel(&value),
            Err(_) => Self::default()
        }
    }

    fn parse_fuel(value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case("none") { return Self::unlimited() }
        match value.parse::<usize>() {
            Ok(0) => Self::unlimited(),
            Ok(fuel) => Self::with_fuel(fuel),
            Err(_) => {
                log::warn!("ignoring {}={:?}, expected a step count", FUEL_VARIABLE, value);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_fuel_values() {
        assert_eq!(KernelConfig::parse_fuel("250"), KernelConfig::with_fuel(250));
        assert_eq!(KernelConfig::parse_fuel(" none "), KernelConfig::unlimited());
        assert_eq!(KernelConfig::parse_fuel("0"), KernelConfig::unlimited());
        assert_eq!(KernelConfig::parse_fuel("lots"), KernelConfig::default());
    }
}
