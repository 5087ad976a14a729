//! Tunable process parameters.

use std::path::Path;

use arcstr::ArcStr;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use substrate::error::{with_err_context, ErrorContext, ErrorSource, Result};
use thiserror::Error;

/// An error in a user supplied parameter set.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("parameter `{0}` must not be empty")]
    Empty(&'static str),

    #[error("parameter `{param}` must be finite and positive, got {value}")]
    NotPositive { param: &'static str, value: f64 },
}

impl From<ConfigError> for ErrorSource {
    fn from(value: ConfigError) -> Self {
        ErrorSource::Other(Box::new(value))
    }
}

/// Parameters of the SG13G2 technology and its IO library.
///
/// The defaults are the foundry values. Lengths are in microns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
#[builder(pattern = "owned", default)]
pub struct Sg13g2Params {
    /// Manufacturing grid.
    pub grid: f64,
    /// Sheet resistance of the Rppd resistor in ohms per square, used for labels.
    pub rppd_sheet_resistance: f64,
    /// Sheet resistance of the Rsil resistor in ohms per square, used for labels.
    pub rsil_sheet_resistance: f64,
    pub dcdiode_actwidth: f64,
    pub dcdiode_actspace: f64,
    /// Cell name prefix of the n-type output clamps.
    #[builder(setter(into))]
    pub clamp_prefix: ArcStr,
    /// Cell names of the DC diodes next to the pad.
    pub diode_cells: Vec<ArcStr>,
    /// Net of the pad connection inside the clamp cells.
    #[builder(setter(into))]
    pub pad_net: ArcStr,
    #[builder(setter(into))]
    pub pad_label: ArcStr,
    #[builder(setter(into))]
    pub sub_label: ArcStr,
}

impl Default for Sg13g2Params {
    fn default() -> Self {
        Self {
            grid: 0.005,
            rppd_sheet_resistance: 396.917,
            rsil_sheet_resistance: 24.863,
            dcdiode_actwidth: 1.26,
            dcdiode_actspace: 0.99,
            clamp_prefix: arcstr::literal!("sg13g2_Clamp_N"),
            diode_cells: vec![
                arcstr::literal!("sg13g2_DCNDiode"),
                arcstr::literal!("sg13g2_DCPDiode"),
            ],
            pad_net: arcstr::literal!("pad"),
            pad_label: arcstr::literal!("PAD"),
            sub_label: arcstr::literal!("sub!"),
        }
    }
}

impl Sg13g2Params {
    #[inline]
    pub fn builder() -> Sg13g2ParamsBuilder {
        Sg13g2ParamsBuilder::default()
    }

    /// Parses parameters from TOML. Missing keys take their default value.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let value: Self = toml::from_str(input)?;
        value.check()?;
        Ok(value)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        with_err_context(
            std::fs::read_to_string(path)
                .map_err(substrate::error::SubstrateError::from)
                .and_then(|input| Self::from_toml_str(&input)),
            || ErrorContext::ReadFile(path.to_path_buf()),
        )
    }

    /// Checks values that the rule graph does not check itself.
    pub fn check(&self) -> std::result::Result<(), ConfigError> {
        for (param, value) in [
            ("rppd_sheet_resistance", self.rppd_sheet_resistance),
            ("rsil_sheet_resistance", self.rsil_sheet_resistance),
            ("dcdiode_actwidth", self.dcdiode_actwidth),
            ("dcdiode_actspace", self.dcdiode_actspace),
        ] {
            if !value.is_finite() || value <= 0. {
                return Err(ConfigError::NotPositive { param, value });
            }
        }
        for (param, value) in [
            ("clamp_prefix", &self.clamp_prefix),
            ("pad_net", &self.pad_net),
            ("pad_label", &self.pad_label),
            ("sub_label", &self.sub_label),
        ] {
            if value.is_empty() {
                return Err(ConfigError::Empty(param));
            }
        }
        if self.diode_cells.is_empty() {
            return Err(ConfigError::Empty("diode_cells"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let params = Sg13g2Params::from_toml_str("rppd_sheet_resistance = 400.0\n").unwrap();
        assert_eq!(params.rppd_sheet_resistance, 400.0);
        assert_eq!(params.rsil_sheet_resistance, 24.863);
        assert_eq!(params.pad_label, "PAD");
    }

    #[test]
    fn builder_overrides() {
        let params = Sg13g2Params::builder()
            .pad_label("IOPAD")
            .build()
            .unwrap();
        assert_eq!(params.pad_label, "IOPAD");
        assert_eq!(params.grid, 0.005);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = Sg13g2Params::from_toml_str("diode_cells = []\n").unwrap_err();
        assert!(err.to_string().contains("diode_cells"));
        assert!(Sg13g2Params::from_toml_str("dcdiode_actwidth = -1.0\n").is_err());
        assert!(Sg13g2Params::from_toml_str("grid = \"fine\"\n").is_err());
    }
}
