//! Simulation models of the SG13G2 devices.

use arcstr::ArcStr;
use indexmap::IndexMap;
use substrate::pdk::rules::{Diode, Mosfet, Resistor, RuleError, RuleGraph, RuleResult};
use substrate::pdk::DeviceClass;

/// How a device primitive is written to a SPICE netlist.
#[derive(Debug, Clone, PartialEq)]
pub struct SpiceModel {
    pub device: ArcStr,
    pub class: DeviceClass,
    pub model: ArcStr,
    /// Whether the model is a subcircuit (instantiated with `X`).
    pub is_subcircuit: bool,
    /// Sheet resistance of the netlisted resistor in ohms per square.
    ///
    /// This is the value the model expects, which differs from the one used for layout labels.
    pub sheet_resistance: Option<f64>,
    /// Renamed device parameters, from layout name to model name.
    pub param_aliases: IndexMap<ArcStr, ArcStr>,
}

impl SpiceModel {
    fn new(device: &str, class: DeviceClass, model: &str) -> Self {
        Self {
            device: ArcStr::from(device),
            class,
            model: ArcStr::from(model),
            is_subcircuit: true,
            sheet_resistance: None,
            param_aliases: IndexMap::new(),
        }
    }

    fn sheet_resistance(mut self, value: f64) -> Self {
        self.sheet_resistance = Some(value);
        self
    }

    fn alias(mut self, param: &str, model_param: &str) -> Self {
        self.param_aliases
            .insert(ArcStr::from(param), ArcStr::from(model_param));
        self
    }

    /// The model's name for device parameter `param`.
    pub fn param_name<'a>(&'a self, param: &'a str) -> &'a str {
        self.param_aliases
            .get(param)
            .map(|p| p.as_str())
            .unwrap_or(param)
    }
}

/// The model table, keyed by device primitive name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpiceModels {
    models: IndexMap<ArcStr, SpiceModel>,
}

impl SpiceModels {
    pub fn sg13g2() -> Self {
        let mut models = Self::default();
        models.add(SpiceModel::new("Rsil", DeviceClass::Res, "rsil").sheet_resistance(7.0));
        models.add(SpiceModel::new("Rppd", DeviceClass::Res, "rppd").sheet_resistance(260.0));
        for (device, model) in [("ndiode", "dantenna"), ("pdiode", "dpantenna")] {
            models.add(
                SpiceModel::new(device, DeviceClass::Diode, model)
                    .alias("width", "w")
                    .alias("height", "l"),
            );
        }
        for flavor in ["lv", "hv"] {
            for ty in ["n", "p"] {
                models.add(SpiceModel::new(
                    &format!("sg13g2_{flavor}_{ty}mos"),
                    DeviceClass::Mos,
                    &format!("sg13_{flavor}_{ty}mos"),
                ));
            }
        }
        models
    }

    pub fn add(&mut self, model: SpiceModel) {
        self.models.insert(model.device.clone(), model);
    }

    #[inline]
    pub fn get(&self, device: &str) -> Option<&SpiceModel> {
        self.models.get(device)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpiceModel> {
        self.models.values()
    }

    /// Checks that every model belongs to a registered device primitive of its class.
    pub fn validate(&self, rules: &RuleGraph) -> RuleResult<()> {
        for model in self.iter() {
            match model.class {
                DeviceClass::Mos => {
                    rules.get::<Mosfet>(&model.device)?;
                }
                DeviceClass::Res => {
                    rules.get::<Resistor>(&model.device)?;
                }
                DeviceClass::Diode => {
                    rules.get::<Diode>(&model.device)?;
                }
                DeviceClass::Other => {
                    if !rules.contains(&model.device) {
                        return Err(RuleError::NotFound(model.device.clone()));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diode_params_are_renamed() {
        let models = SpiceModels::sg13g2();
        let ndiode = models.get("ndiode").unwrap();
        assert_eq!(ndiode.model, "dantenna");
        assert_eq!(ndiode.param_name("width"), "w");
        assert_eq!(ndiode.param_name("height"), "l");
        assert_eq!(ndiode.param_name("m"), "m");

        let rppd = models.get("Rppd").unwrap();
        assert_eq!(rppd.sheet_resistance, Some(260.0));
        assert!(models.iter().all(|m| m.is_subcircuit));
        assert_eq!(models.get("sg13g2_hv_pmos").unwrap().model, "sg13_hv_pmos");
    }
}
