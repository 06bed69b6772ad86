//! Zone detectors: order blocks, fair value gaps, and the freshness check
//! shared by both.

pub mod freshness;
pub mod fvg;
pub mod orderblock;

pub use freshness::{first_touch, is_orderblock_fresh, is_zone_fresh, zones_intersect};
pub use fvg::{
    fill_fraction, find_fvgs, fvg_at, is_fvg_fresh, latest_fresh_fvg, latest_fvg, FvgConfig,
};
pub use orderblock::{
    detect_orderblock, engulfing_side, find_all_orderblocks, is_displacement, orderblock_at,
    trailing_median_body, OrderBlockConfig,
};
