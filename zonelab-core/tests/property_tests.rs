//! Property tests for detector invariants.
//!
//! Uses proptest to verify:
//! 1. Order block zones are the engulfed candle's body, top >= bottom
//! 2. Fair value gaps are strictly positive in size
//! 3. Freshness checks are idempotent and honor closed-interval touches
//! 4. Each swing is broken at most once
//! 5. Aging score never rises with age; confluence score stays in 0..=100
//! 6. Screener forecast: crossed => 0 days, diverging => no forecast

use std::collections::HashSet;

use proptest::prelude::*;
use zonelab_core::domain::{Ohlcv, SwingKind};
use zonelab_core::scoring::{score_confluence, AgingConfig, ConfluenceConfig};
use zonelab_core::screener::forecast_cross_days;
use zonelab_core::structure::{find_bos, find_swings_in, SwingConfig};
use zonelab_core::zones::{
    find_all_orderblocks, find_fvgs, is_zone_fresh, FvgConfig, OrderBlockConfig,
};

// ── Strategies (proptest) ────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Columns {
    open: Vec<f64>,
    high: Vec<f64>,
    low: Vec<f64>,
    close: Vec<f64>,
}

impl Columns {
    fn view(&self) -> Ohlcv<'_> {
        Ohlcv::new(&self.open, &self.high, &self.low, &self.close, None).unwrap()
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Random walk of valid candles. Prices are rounded to cents so equal bodies
/// and exact boundary touches actually occur.
fn arb_series() -> impl Strategy<Value = Columns> {
    prop::collection::vec(
        (-3.0..3.0_f64, -3.0..3.0_f64, 0.0..1.5_f64, 0.0..1.5_f64),
        5..150,
    )
    .prop_map(|steps| {
        let mut cols = Columns {
            open: Vec::new(),
            high: Vec::new(),
            low: Vec::new(),
            close: Vec::new(),
        };
        let mut base = 1000.0;
        for (gap, move_, up, down) in steps {
            let open = round2(base + gap);
            let close = round2(open + move_);
            cols.open.push(open);
            cols.close.push(close);
            cols.high.push(round2(open.max(close) + up));
            cols.low.push(round2(open.min(close) - down));
            base = close;
        }
        cols
    })
}

// ── 1. Order block zones ─────────────────────────────────────────────

proptest! {
    #[test]
    fn orderblock_zone_is_engulfed_body(cols in arb_series()) {
        let series = cols.view();
        for ob in find_all_orderblocks(&series, &OrderBlockConfig::default(), false) {
            let i = ob.index;
            prop_assert!(ob.zone_top >= ob.zone_bottom);
            prop_assert_eq!(ob.displacement_index, i + 1);
            prop_assert_eq!(ob.zone_top, cols.open[i].max(cols.close[i]));
            prop_assert_eq!(ob.zone_bottom, cols.open[i].min(cols.close[i]));
            prop_assert_eq!(ob.has_fvg, ob.fvg.is_some());
            if let Some(g) = ob.fvg {
                prop_assert_eq!(g.direction, ob.direction);
            }
        }
    }

    #[test]
    fn fresh_orderblocks_are_a_subset(cols in arb_series()) {
        let series = cols.view();
        let config = OrderBlockConfig::default();
        let all = find_all_orderblocks(&series, &config, false);
        let fresh = find_all_orderblocks(&series, &config, true);
        prop_assert!(fresh.len() <= all.len());
        for ob in &fresh {
            prop_assert!(all.contains(ob));
        }
    }
}

// ── 2. Fair value gaps ───────────────────────────────────────────────

proptest! {
    #[test]
    fn fvg_gap_is_strictly_positive(cols in arb_series()) {
        let series = cols.view();
        for g in find_fvgs(&series, &FvgConfig::default(), false) {
            prop_assert!(g.gap_high > g.gap_low);
            prop_assert!(g.index >= 2);
        }
    }
}

// ── 3. Freshness ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn freshness_is_idempotent(
        cols in arb_series(),
        top in 990.0..1010.0_f64,
        height in 0.0..5.0_f64,
        from in 0usize..50,
        len in 0usize..100,
    ) {
        let bottom = top - height;
        let (h, l) = (&cols.high, &cols.low);
        let first = is_zone_fresh(top, bottom, h, l, from, from + len).unwrap();
        let second = is_zone_fresh(top, bottom, h, l, from, from + len).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn boundary_touch_invalidates(cols in arb_series(), idx in 0usize..150) {
        let i = idx % cols.high.len();
        let (h, l) = (&cols.high, &cols.low);
        // Zone sitting exactly on the bar's low.
        let top = l[i];
        prop_assert!(!is_zone_fresh(top, top - 1.0, h, l, i, i + 1).unwrap());
        // Zone sitting exactly on the bar's high.
        let bottom = h[i];
        prop_assert!(!is_zone_fresh(bottom + 1.0, bottom, h, l, i, i + 1).unwrap());
    }
}

// ── 4. BOS dedup ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn each_swing_broken_at_most_once(cols in arb_series()) {
        let series = cols.view();
        let config = SwingConfig::default();
        let swings = find_swings_in(&series, &config);
        let events = find_bos(&series, Some(&swings), &config);

        let mut seen: HashSet<(usize, SwingKind)> = HashSet::new();
        for e in &events {
            prop_assert!(seen.insert((e.broken_swing.index, e.broken_swing.kind)));
            prop_assert!(e.index >= e.broken_swing.index + config.right_bars);
        }
        prop_assert!(events.windows(2).all(|w| w[0].index <= w[1].index));
    }
}

// ── 5. Scoring bounds and monotonicity ───────────────────────────────

proptest! {
    #[test]
    fn aging_score_never_rises_with_age(
        a in 0usize..100,
        b in 0usize..100,
        fvg_fresh in any::<bool>(),
        ratio in 0.0..10.0_f64,
    ) {
        let cfg = AgingConfig::default();
        let (younger, older) = if a <= b { (a, b) } else { (b, a) };
        let s_young = cfg.volumatic_score(cfg.age_status(younger), fvg_fresh, ratio);
        let s_old = cfg.volumatic_score(cfg.age_status(older), fvg_fresh, ratio);
        prop_assert!(s_young >= s_old);
        prop_assert!(s_young <= 100);
    }

    #[test]
    fn confluence_score_is_bounded(
        cols in arb_series(),
        atr in prop::option::of(0.01..10.0_f64),
    ) {
        let series = cols.view();
        let obs = find_all_orderblocks(&series, &OrderBlockConfig::default(), false);
        let gaps = find_fvgs(&series, &FvgConfig::default(), false);
        let price = cols.close[cols.close.len() - 1];
        let cfg = ConfluenceConfig::default();

        let r = score_confluence(obs.last(), gaps.last(), true, price, atr, &cfg);
        prop_assert!(r.score <= 100);
        prop_assert!(r.proximity_bonus <= cfg.proximity_max);
        if obs.last().is_some() && gaps.last().is_some() {
            prop_assert!(r.has_confluence);
        }
    }
}

// ── 6. Screener forecast ─────────────────────────────────────────────

fn arb_line() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(50.0..150.0_f64, 6..30)
}

proptest! {
    #[test]
    fn crossed_means_zero_days(fast in arb_line(), lift in 0.0..20.0_f64) {
        // Slow sits at or below fast on the last bar.
        let mut slow = fast.clone();
        let n = slow.len();
        slow[n - 1] = fast[n - 1] - lift;
        prop_assert_eq!(forecast_cross_days(&fast, &slow), Some(0));
    }

    #[test]
    fn diverging_has_no_forecast(
        slow in arb_line(),
        below in 0.01..20.0_f64,
        widen in 0.01..5.0_f64,
    ) {
        // Fast ends `below` under slow and fell at least as fast over five bars.
        let n = slow.len();
        let mut fast = slow.clone();
        fast[n - 1] = slow[n - 1] - below;
        fast[n - 6] = fast[n - 1] - (slow[n - 1] - slow[n - 6]) + widen;
        prop_assert_eq!(forecast_cross_days(&fast, &slow), None);
    }
}
