//! The IO library specification and the hooks run when IO cells are created.

use arcstr::ArcStr;
use indexmap::IndexMap;
use substrate::error::{with_err_context, ErrorContext, Result};
use substrate::layout::cell::Cell;
use substrate::pdk::rules::{
    Auxiliary, Diode, Grid, MetalWire, Mosfet, Resistor, RuleGraph, RuleResult, SubstrateMarker,
};

use crate::compliance::{ComplianceScanner, ComplianceTarget};
use crate::config::Sg13g2Params;
use crate::constants::*;

/// A supply track running through the IO ring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSpec {
    pub name: ArcStr,
    pub bottom: i64,
    pub width: i64,
}

impl TrackSpec {
    #[inline]
    pub fn top(&self) -> i64 {
        self.bottom + self.width
    }
}

/// Sizing of the ESD clamp transistors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClampSpec {
    pub nmos_w: i64,
    pub nmos_l: i64,
    pub nmos_rows: usize,
    pub pmos_w: i64,
    pub pmos_l: i64,
    pub pmos_rows: usize,
    pub fingers_analog: usize,
    /// Number of active clamp fingers per output drive strength.
    pub drive: IndexMap<ArcStr, usize>,
    pub rcclampdrive: usize,
    pub rcclamp_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSpec {
    pub corerow_height: i64,
    pub corerow_nwell_height: i64,
    pub iorow_height: i64,
    pub iorow_nwell_height: i64,
    pub nwell_minspace: i64,
    pub levelup_core_space: i64,
}

/// The resistor of the supply RC clamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResVddSpec {
    pub prim: ArcStr,
    pub w: i64,
    pub lfinger: i64,
    pub fingers: usize,
    pub space: i64,
}

/// The DC diodes between the pad and the supplies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DcDiodeSpec {
    pub actwidth: i64,
    pub actspace: i64,
    pub actspace_end: i64,
    pub inneractheight: i64,
    pub diodeguard_space: i64,
    pub fingers: usize,
    pub implant_enclosure: i64,
    pub indicator: ArcStr,
    /// Distance from a diode origin to its pad connection, `1.5 * actwidth + actspace`.
    pub pad_offset: i64,
}

/// Pad and track geometry of the IO frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSpec {
    pub pad_width: i64,
    pub pad_y: i64,
    pub padpin_height: i64,
    pub pad_viacorner_distance: i64,
    pub pad_viametal_enclosure: i64,
    pub tracksegment_viapitch: i64,
    pub trackconn_viaspace: i64,
    pub trackconn_chspace: i64,
    pub tracksegment_maxpitch: i64,
    pub acttracksegment_maxpitch: i64,
    pub acttracksegment_space: i64,
    pub tracks: Vec<TrackSpec>,
    tracksegment_space: i64,
    tracksegment_space_overrides: IndexMap<ArcStr, i64>,
}

impl FrameSpec {
    /// The space between track segments drawn on `metal`.
    pub fn tracksegment_space(&self, metal: &str) -> i64 {
        self.tracksegment_space_overrides
            .get(metal)
            .copied()
            .unwrap_or(self.tracksegment_space)
    }

    pub fn track(&self, name: &str) -> Option<&TrackSpec> {
        self.tracks.iter().find(|t| t.name == name)
    }
}

/// The subset of the IO library specification the layout flow depends on.
///
/// Lengths are in nanometers. Devices are referred to by primitive name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoSpec {
    pub cell_width: i64,
    pub cell_height: i64,
    pub metal_bigspace: i64,
    pub topmetal_bigspace: i64,
    pub nmos: ArcStr,
    pub pmos: ArcStr,
    pub ionmos: ArcStr,
    pub iopmos: ArcStr,
    pub clamp: ClampSpec,
    pub nres: ArcStr,
    pub pres: ArcStr,
    pub ndiode: ArcStr,
    pub pdiode: ArcStr,
    pub secondres_width: i64,
    pub secondres_length: i64,
    pub secondres_active_space: i64,
    pub rows: RowSpec,
    pub resvdd: ResVddSpec,
    pub dcdiode: DcDiodeSpec,
    pub iovss_ptap_extra: ArcStr,
    pub frame: FrameSpec,
}

impl IoSpec {
    pub fn new(params: &Sg13g2Params) -> RuleResult<Self> {
        let grid = Grid::from_microns(params.grid)?;
        Ok(Self {
            cell_width: IO_CELL_WIDTH,
            cell_height: IO_CELL_HEIGHT,
            metal_bigspace: METAL_BIGSPACE,
            topmetal_bigspace: TOPMETAL_BIGSPACE,
            nmos: arcstr::literal!("sg13g2_lv_nmos"),
            pmos: arcstr::literal!("sg13g2_lv_pmos"),
            ionmos: arcstr::literal!("sg13g2_hv_nmos"),
            iopmos: arcstr::literal!("sg13g2_hv_pmos"),
            clamp: ClampSpec {
                nmos_w: CLAMPNMOS_W,
                nmos_l: CLAMPNMOS_L,
                nmos_rows: CLAMPNMOS_ROWS,
                pmos_w: CLAMPPMOS_W,
                pmos_l: CLAMPPMOS_L,
                pmos_rows: CLAMPPMOS_ROWS,
                fingers_analog: CLAMPFINGERS_ANALOG,
                drive: IndexMap::from([
                    (arcstr::literal!("4mA"), 2),
                    (arcstr::literal!("16mA"), 8),
                    (arcstr::literal!("30mA"), 15),
                ]),
                rcclampdrive: RCCLAMPDRIVE,
                rcclamp_rows: RCCLAMP_ROWS,
            },
            nres: arcstr::literal!("Rppd"),
            pres: arcstr::literal!("Rppd"),
            ndiode: arcstr::literal!("ndiode"),
            pdiode: arcstr::literal!("pdiode"),
            secondres_width: SECONDRES_WIDTH,
            secondres_length: SECONDRES_LENGTH,
            secondres_active_space: SECONDRES_ACTIVE_SPACE,
            rows: RowSpec {
                corerow_height: COREROW_HEIGHT,
                corerow_nwell_height: COREROW_NWELL_HEIGHT,
                iorow_height: IOROW_HEIGHT,
                iorow_nwell_height: IOROW_NWELL_HEIGHT,
                nwell_minspace: NWELL_MINSPACE,
                levelup_core_space: LEVELUP_CORE_SPACE,
            },
            resvdd: ResVddSpec {
                prim: arcstr::literal!("Rppd"),
                w: RESVDD_W,
                lfinger: RESVDD_LFINGER,
                fingers: RESVDD_FINGERS,
                space: RESVDD_SPACE,
            },
            dcdiode: DcDiodeSpec {
                actwidth: grid.to_nm(params.dcdiode_actwidth),
                actspace: grid.to_nm(params.dcdiode_actspace),
                actspace_end: DCDIODE_ACTSPACE_END,
                inneractheight: DCDIODE_INNERACTHEIGHT,
                diodeguard_space: DCDIODE_DIODEGUARD_SPACE,
                fingers: DCDIODE_FINGERS,
                implant_enclosure: DCDIODE_IMPLANT_ENCLOSURE,
                indicator: arcstr::literal!("Recog.esd"),
                pad_offset: grid.to_nm(1.5 * params.dcdiode_actwidth + params.dcdiode_actspace),
            },
            iovss_ptap_extra: arcstr::literal!("Substrate"),
            frame: FrameSpec {
                pad_width: PAD_WIDTH,
                pad_y: PAD_Y,
                padpin_height: PADPIN_HEIGHT,
                pad_viacorner_distance: PAD_VIACORNER_DISTANCE,
                pad_viametal_enclosure: PAD_VIAMETAL_ENCLOSURE,
                tracksegment_viapitch: TRACKSEGMENT_VIAPITCH,
                trackconn_viaspace: TRACKCONN_VIASPACE,
                trackconn_chspace: TRACKCONN_CHSPACE,
                tracksegment_maxpitch: TRACKSEGMENT_MAXPITCH,
                acttracksegment_maxpitch: ACTTRACKSEGMENT_MAXPITCH,
                acttracksegment_space: ACTTRACKSEGMENT_SPACE,
                tracks: TRACKS
                    .iter()
                    .map(|&(name, bottom, width)| TrackSpec {
                        name: ArcStr::from(name),
                        bottom,
                        width,
                    })
                    .collect(),
                tracksegment_space: TRACKSEGMENT_SPACE,
                tracksegment_space_overrides: IndexMap::from([(
                    arcstr::literal!("TopMetal2"),
                    TOPMETAL2_TRACKSEGMENT_SPACE,
                )]),
            },
        })
    }

    /// Checks that every primitive named by the specification exists in `rules`
    /// with the expected kind.
    pub fn validate(&self, rules: &RuleGraph) -> RuleResult<()> {
        for mos in [&self.nmos, &self.pmos, &self.ionmos, &self.iopmos] {
            rules.get::<Mosfet>(mos)?;
        }
        for res in [&self.nres, &self.pres, &self.resvdd.prim] {
            rules.get::<Resistor>(res)?;
        }
        for diode in [&self.ndiode, &self.pdiode] {
            rules.get::<Diode>(diode)?;
        }
        rules.get::<Auxiliary>(&self.dcdiode.indicator)?;
        rules.get::<SubstrateMarker>(&self.iovss_ptap_extra)?;
        for metal in self.frame.tracksegment_space_overrides.keys() {
            rules.get::<MetalWire>(metal)?;
        }
        Ok(())
    }
}

/// A callback run on a freshly created IO cell.
pub type CreateCallback = Box<dyn Fn(&mut Cell) -> Result<()> + Send + Sync>;

/// Hooks run by the IO cell factory after it generated a cell.
///
/// The compliance labels are added first; the user callback, if any, sees the
/// labeled cell.
pub struct IoHooks {
    scanner: ComplianceScanner,
    callback: Option<CreateCallback>,
}

impl IoHooks {
    pub fn new(scanner: ComplianceScanner) -> Self {
        Self {
            scanner,
            callback: None,
        }
    }

    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut Cell) -> Result<()> + Send + Sync + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    #[inline]
    pub fn scanner(&self) -> &ComplianceScanner {
        &self.scanner
    }

    /// Runs the hooks on `cell`, created as `target`. Returns the number of labels added.
    pub fn on_create(&self, cell: &mut Cell, target: ComplianceTarget) -> Result<usize> {
        let n = self.scanner.scan_and_label(cell, target)?;
        if let Some(callback) = &self.callback {
            let name = cell.name().clone();
            with_err_context(callback(cell), || {
                ErrorContext::Task(arcstr::format!("running create callback of {name}"))
            })?;
        }
        Ok(n)
    }
}

impl std::fmt::Debug for IoHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IoHooks")
            .field("scanner", &self.scanner)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tech::build_technology;

    #[test]
    fn spec_matches_rules() {
        let params = Sg13g2Params::default();
        let spec = IoSpec::new(&params).unwrap();
        spec.validate(&build_technology(&params).unwrap()).unwrap();
        assert_eq!(spec.dcdiode.pad_offset, 2_880);
        assert_eq!(spec.frame.track("vddvss").unwrap().top(), IO_CELL_HEIGHT - 1_000);
        assert_eq!(spec.frame.tracksegment_space("TopMetal2"), 5_000);
        assert_eq!(spec.frame.tracksegment_space("Metal3"), 2_000);
        assert_eq!(spec.clamp.drive["16mA"], 8);
    }
}
