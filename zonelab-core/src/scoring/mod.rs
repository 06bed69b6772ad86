//! Zone scoring: aging/volumatic score per order block and the OB + FVG
//! confluence score.

pub mod aging;
pub mod confluence;

pub use aging::{score_zone, volume_ratio, AgeStatus, AgingConfig, AgingWeights, ZoneAging};
pub use confluence::{proximity_factor, score_confluence, ConfluenceConfig, ConfluenceResult};
