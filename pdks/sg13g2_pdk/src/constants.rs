//! Dimensions of the SG13G2 IO library, in nanometers.

pub const IO_CELL_WIDTH: i64 = 80_000;
pub const IO_CELL_HEIGHT: i64 = 180_000;

pub const METAL_BIGSPACE: i64 = 600;
pub const TOPMETAL_BIGSPACE: i64 = 4_000;

pub const CLAMPNMOS_W: i64 = 4_400;
pub const CLAMPNMOS_L: i64 = 600;
pub const CLAMPNMOS_ROWS: usize = 1;
pub const CLAMPPMOS_W: i64 = 6_660;
pub const CLAMPPMOS_L: i64 = 600;
pub const CLAMPPMOS_ROWS: usize = 2;
pub const CLAMPFINGERS_ANALOG: usize = 20;
pub const RCCLAMPDRIVE: usize = 43;
pub const RCCLAMP_ROWS: usize = 4;

pub const SECONDRES_WIDTH: i64 = 1_000;
pub const SECONDRES_LENGTH: i64 = 2_000;
pub const SECONDRES_ACTIVE_SPACE: i64 = 600;

pub const COREROW_HEIGHT: i64 = 10_000;
pub const COREROW_NWELL_HEIGHT: i64 = 6_000;
pub const IOROW_HEIGHT: i64 = 8_500;
pub const IOROW_NWELL_HEIGHT: i64 = 5_250;
pub const NWELL_MINSPACE: i64 = 2_000;
pub const LEVELUP_CORE_SPACE: i64 = 1_000;

pub const RESVDD_W: i64 = 1_000;
pub const RESVDD_LFINGER: i64 = 20_000;
pub const RESVDD_FINGERS: usize = 26;
pub const RESVDD_SPACE: i64 = 650;

pub const DCDIODE_ACTSPACE_END: i64 = 1_380;
pub const DCDIODE_INNERACTHEIGHT: i64 = 27_780;
pub const DCDIODE_DIODEGUARD_SPACE: i64 = 1_320;
pub const DCDIODE_FINGERS: usize = 2;
pub const DCDIODE_IMPLANT_ENCLOSURE: i64 = 420;

pub const PAD_WIDTH: i64 = 70_000;
pub const PAD_Y: i64 = 55_320;
pub const PADPIN_HEIGHT: i64 = 3_000;
pub const PAD_VIACORNER_DISTANCE: i64 = 23_000;
pub const PAD_VIAMETAL_ENCLOSURE: i64 = 3_000;

pub const TRACKSEGMENT_VIAPITCH: i64 = 2_000;
pub const TRACKCONN_VIASPACE: i64 = 300;
pub const TRACKCONN_CHSPACE: i64 = 200;
pub const TRACKSEGMENT_MAXPITCH: i64 = 30_000;
pub const TRACKSEGMENT_SPACE: i64 = 2_000;
pub const TOPMETAL2_TRACKSEGMENT_SPACE: i64 = 5_000;
pub const ACTTRACKSEGMENT_MAXPITCH: i64 = 30_000;
pub const ACTTRACKSEGMENT_SPACE: i64 = 1_000;

/// Supply tracks of the IO ring as `(name, bottom, width)`.
pub const TRACKS: [(&str, i64, i64); 4] = [
    ("iovss", 6_000, 55_000),
    ("iovdd", 65_000, 55_000),
    ("secondiovss", 125_000, 10_000),
    ("vddvss", IO_CELL_HEIGHT - 41_000, 40_000),
];
