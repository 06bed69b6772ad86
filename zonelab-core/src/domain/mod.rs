//! Domain types for zonelab

pub mod candle;
pub mod series;
pub mod zone;

pub use candle::Candle;
pub use series::Ohlcv;
pub use zone::{Bos, BosDirection, Fvg, OrderBlock, Swing, SwingKind, ZoneSide};
