//! Break of structure: a close beyond the latest confirmed swing.
//!
//! Scans forward in time keeping the most recently confirmed swing High and
//! swing Low. A swing becomes breakable at bar `swing.index + right_bars`.
//! Only closes count; a wick through the level is not a break. Each swing is
//! broken at most once, by its first qualifying close.

use std::collections::HashSet;

use crate::domain::{Bos, BosDirection, Ohlcv, Swing, SwingKind};
use crate::structure::swing::{find_swings_in, SwingConfig};

/// Detect breaks of structure, sorted by index.
///
/// `swings` may be supplied precomputed; otherwise they are found with
/// `config`. Either way `config.right_bars` sets the confirmation delay.
pub fn find_bos(series: &Ohlcv<'_>, swings: Option<&[Swing]>, config: &SwingConfig) -> Vec<Bos> {
    let mut ordered: Vec<Swing> = match swings {
        Some(s) => s.to_vec(),
        None => find_swings_in(series, config),
    };
    ordered.sort_by_key(|s| s.index);

    let close = series.close();
    let mut events = Vec::new();
    let mut broken: HashSet<(usize, SwingKind)> = HashSet::new();
    let mut latest_high: Option<Swing> = None;
    let mut latest_low: Option<Swing> = None;
    let mut next = 0;

    for (i, &c) in close.iter().enumerate() {
        while next < ordered.len() && ordered[next].confirmed_at(config.right_bars) <= i {
            let swing = ordered[next];
            match swing.kind {
                SwingKind::High => latest_high = Some(swing),
                SwingKind::Low => latest_low = Some(swing),
            }
            next += 1;
        }

        if let Some(high) = latest_high {
            if c > high.price && broken.insert((high.index, SwingKind::High)) {
                events.push(Bos {
                    index: i,
                    direction: BosDirection::Bullish,
                    broken_swing: high,
                    close_price: c,
                });
            }
        }

        if let Some(low) = latest_low {
            if c < low.price && broken.insert((low.index, SwingKind::Low)) {
                events.push(Bos {
                    index: i,
                    direction: BosDirection::Bearish,
                    broken_swing: low,
                    close_price: c,
                });
            }
        }
    }

    events
}

/// Direction of the most recent break, used as a simple trend bias.
pub fn structure_bias(events: &[Bos]) -> Option<BosDirection> {
    events.last().map(|b| b.direction)
}
