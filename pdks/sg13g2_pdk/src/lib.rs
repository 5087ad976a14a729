use std::path::PathBuf;

use arcstr::ArcStr;
use lazy_static::lazy_static;
use substrate::error::{with_err_context, ErrorContext, Result};
use substrate::layout::cell::Cell;
use substrate::layout::layers::Layers;
use substrate::pdk::annotate::PrimitiveLayoutHook;
use substrate::pdk::rules::RuleGraph;
use substrate::pdk::{Pdk, PdkParams};

use crate::annotate::DeviceAnnotator;
use crate::compliance::{ComplianceScanner, ComplianceTarget};
use crate::config::Sg13g2Params;
use crate::io::{IoHooks, IoSpec};
use crate::spice::SpiceModels;

pub mod annotate;
pub mod compliance;
pub mod config;
pub mod constants;
pub mod io;
pub mod layers;
pub mod spice;
pub mod tech;

pub use layers::build_layers;
pub use tech::build_technology;

lazy_static! {
    static ref TECHNOLOGY: RuleGraph = build_technology(&Sg13g2Params::default())
        .expect("failed to build the SG13G2 technology");
    static ref LAYERS: Layers = build_layers().expect("failed to parse the SG13G2 layer table");
    static ref IO_SPEC: IoSpec =
        IoSpec::new(&Sg13g2Params::default()).expect("failed to build the SG13G2 IO specification");
    static ref SCANNER: ComplianceScanner =
        ComplianceScanner::new(&LAYERS, &IO_SPEC, &Sg13g2Params::default())
            .expect("SG13G2 layer table lacks a label layer");
}

/// The SG13G2 rule graph with the default parameters, built on first use.
pub fn technology() -> &'static RuleGraph {
    &TECHNOLOGY
}

/// The SG13G2 layer table, parsed on first use.
pub fn layers() -> &'static Layers {
    &LAYERS
}

pub fn io_spec() -> &'static IoSpec {
    &IO_SPEC
}

/// Adds the LVS labels of `target` to `cell` using the default parameters.
pub fn scan_and_label(cell: &mut Cell, target: ComplianceTarget) -> Result<usize> {
    SCANNER.scan_and_label(cell, target)
}

/// The SG13G2 process.
pub struct Sg13g2Pdk {
    pub pdk_root: PathBuf,
    params: Sg13g2Params,
    rules: RuleGraph,
    layers: Layers,
    annotator: DeviceAnnotator,
    io: IoSpec,
    scanner: ComplianceScanner,
    models: SpiceModels,
}

impl Sg13g2Pdk {
    /// Builds the process with a custom parameter set.
    ///
    /// Fails if the rules, the layer table, the IO specification and the model
    /// table are not consistent with each other.
    pub fn with_params(pdk_root: impl Into<PathBuf>, params: Sg13g2Params) -> Result<Self> {
        params.check()?;
        let rules = with_err_context(build_technology(&params), || {
            ErrorContext::BuildTechnology(ArcStr::from(tech::TECH_NAME))
        })?;
        let layers = build_layers()?;
        with_err_context(layers.validate(&rules), || {
            ErrorContext::ValidateLayers(rules.name().clone())
        })?;
        let annotator = DeviceAnnotator::from_layers(&layers)?;

        let io = with_err_context(
            IoSpec::new(&params).and_then(|io| io.validate(&rules).map(|_| io)),
            || ErrorContext::Task(arcstr::literal!("checking the IO specification")),
        )?;
        let scanner = ComplianceScanner::new(&layers, &io, &params)?;

        let models = SpiceModels::sg13g2();
        with_err_context(models.validate(&rules), || {
            ErrorContext::Task(arcstr::literal!("checking the SPICE model table"))
        })?;

        Ok(Self {
            pdk_root: pdk_root.into(),
            params,
            rules,
            layers,
            annotator,
            io,
            scanner,
            models,
        })
    }

    #[inline]
    pub fn params(&self) -> &Sg13g2Params {
        &self.params
    }

    #[inline]
    pub fn io_spec(&self) -> &IoSpec {
        &self.io
    }

    #[inline]
    pub fn spice_models(&self) -> &SpiceModels {
        &self.models
    }

    #[inline]
    pub fn annotator(&self) -> &DeviceAnnotator {
        &self.annotator
    }

    /// Hooks for the IO cell factory, without a user callback.
    pub fn io_hooks(&self) -> IoHooks {
        IoHooks::new(self.scanner.clone())
    }

    /// The directory holding the ngspice model files.
    pub fn model_dir(&self) -> PathBuf {
        self.pdk_root.join("libs.tech/ngspice/models")
    }
}

impl Pdk for Sg13g2Pdk {
    fn new(params: &PdkParams) -> Result<Self> {
        Self::with_params(params.pdk_root.clone(), Sg13g2Params::default())
    }

    fn name(&self) -> &'static str {
        "sg13g2"
    }

    fn process(&self) -> &'static str {
        tech::TECH_NAME
    }

    /// The grid resolution in SG13G2 is 5 nanometers unless overridden.
    fn layout_grid(&self) -> i64 {
        self.rules.grid().nm()
    }

    fn rules(&self) -> &RuleGraph {
        &self.rules
    }

    fn layers(&self) -> &Layers {
        &self.layers
    }

    fn primitive_layout_hook(&self) -> Option<&dyn PrimitiveLayoutHook> {
        Some(&self.annotator)
    }
}
