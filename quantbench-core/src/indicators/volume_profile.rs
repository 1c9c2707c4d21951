//! Volume Profile over a rolling window of bars.
//!
//! The window's [lowest low, highest high] range is split into `bins` equal
//! price bins. Each bar's volume is spread across the bins its [low, high]
//! range overlaps, proportionally to the overlap; a bar with zero range puts
//! all of its volume in the bin containing its price.
//!
//! Point of Control (POC) is the bin with the most volume (lowest price on
//! ties). The Value Area grows outward from the POC one bin at a time,
//! always toward the neighbour holding more volume (upward on ties), until
//! it holds at least `value_area_fraction` of total volume.
//! Required candles: period.

use serde::{Deserialize, Serialize};

use super::rolling::{History, RollingWindow};
use super::{check_period, record, Indicator};
use crate::domain::Bar;
use crate::error::ConfigError;

pub const DEFAULT_VALUE_AREA_FRACTION: f64 = 0.70;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeProfileValue {
    /// Lower edge of the lowest bin.
    pub price_low: f64,
    /// Upper edge of the highest bin.
    pub price_high: f64,
    pub bin_width: f64,
    /// Volume per bin, lowest price first.
    pub volumes: Vec<f64>,
    pub total_volume: f64,
    pub poc_index: usize,
    /// Midpoint of the POC bin.
    pub poc_price: f64,
    /// Inclusive bin index range of the value area.
    pub value_area_bins: (usize, usize),
    pub value_area_low: f64,
    pub value_area_high: f64,
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

#[derive(Debug, Clone)]
pub struct VolumeProfile {
    period: usize,
    bins: usize,
    value_area_fraction: f64,
    name: String,
    window: RollingWindow<Sample>,
    history: History<VolumeProfileValue>,
}

impl VolumeProfile {
    pub fn new(period: usize, bins: usize) -> Result<Self, ConfigError> {
        Self::with_value_area(period, bins, DEFAULT_VALUE_AREA_FRACTION)
    }

    pub fn with_value_area(
        period: usize,
        bins: usize,
        value_area_fraction: f64,
    ) -> Result<Self, ConfigError> {
        let period = check_period("VolumeProfile", "period", period)?;
        let bins = check_period("VolumeProfile", "bins", bins)?;
        if !(value_area_fraction > 0.0 && value_area_fraction <= 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "value_area_fraction",
                value: value_area_fraction,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self {
            period,
            bins,
            value_area_fraction,
            name: format!("vp_{period}_{bins}"),
            window: RollingWindow::new(period),
            history: History::default(),
        })
    }

    fn profile(&self) -> VolumeProfileValue {
        let (price_low, price_high) = self
            .window
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
                (lo.min(s.low), hi.max(s.high))
            });
        let bin_width = (price_high - price_low) / self.bins as f64;
        let mut volumes = vec![0.0; self.bins];

        for s in self.window.iter() {
            let span = s.high - s.low;
            if bin_width == 0.0 {
                volumes[0] += s.volume;
            } else if span <= 0.0 {
                volumes[self.bin_of(s.close.clamp(price_low, price_high), price_low, bin_width)] +=
                    s.volume;
            } else {
                let first = self.bin_of(s.low, price_low, bin_width);
                let last = self.bin_of(s.high, price_low, bin_width);
                for (i, vol) in volumes.iter_mut().enumerate().take(last + 1).skip(first) {
                    let bin_lo = price_low + i as f64 * bin_width;
                    let bin_hi = bin_lo + bin_width;
                    let overlap = s.high.min(bin_hi) - s.low.max(bin_lo);
                    if overlap > 0.0 {
                        *vol += s.volume * overlap / span;
                    }
                }
            }
        }

        let total_volume: f64 = volumes.iter().sum();
        let poc_index = volumes
            .iter()
            .enumerate()
            .fold(0, |best, (i, &v)| if v > volumes[best] { i } else { best });
        let (va_lo, va_hi) = self.value_area(&volumes, poc_index, total_volume);

        VolumeProfileValue {
            price_low,
            price_high,
            bin_width,
            poc_price: price_low + (poc_index as f64 + 0.5) * bin_width,
            value_area_bins: (va_lo, va_hi),
            value_area_low: price_low + va_lo as f64 * bin_width,
            value_area_high: price_low + (va_hi + 1) as f64 * bin_width,
            volumes,
            total_volume,
            poc_index,
        }
    }

    fn bin_of(&self, price: f64, price_low: f64, bin_width: f64) -> usize {
        let idx = ((price - price_low) / bin_width).floor();
        if idx <= 0.0 {
            0
        } else {
            (idx as usize).min(self.bins - 1)
        }
    }

    fn value_area(&self, volumes: &[f64], poc: usize, total: f64) -> (usize, usize) {
        let target = total * self.value_area_fraction;
        let (mut lo, mut hi) = (poc, poc);
        let mut captured = volumes[poc];
        while captured < target && (lo > 0 || hi + 1 < volumes.len()) {
            let up = (hi + 1 < volumes.len()).then(|| volumes[hi + 1]);
            let down = (lo > 0).then(|| volumes[lo - 1]);
            match (up, down) {
                (Some(u), Some(d)) if u >= d => {
                    hi += 1;
                    captured += u;
                }
                (_, Some(d)) => {
                    lo -= 1;
                    captured += d;
                }
                (Some(u), None) => {
                    hi += 1;
                    captured += u;
                }
                (None, None) => break,
            }
        }
        (lo, hi)
    }
}

impl Indicator for VolumeProfile {
    type Output = VolumeProfileValue;

    fn name(&self) -> &str {
        &self.name
    }

    fn required_candles(&self) -> usize {
        self.period
    }

    fn update(&mut self, bar: &Bar) -> Option<VolumeProfileValue> {
        self.window.push(Sample {
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        });
        let value = self.window.is_full().then(|| self.profile());
        record(&mut self.history, value)
    }

    fn reset(&mut self) {
        self.window.clear();
        self.history.clear();
    }

    fn history(&self) -> &History<VolumeProfileValue> {
        &self.history
    }

    fn history_mut(&mut self) -> &mut History<VolumeProfileValue> {
        &mut self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    fn bar_with(high: f64, low: f64, volume: f64) -> Bar {
        let mut bar = make_bars(&[low])[0].clone();
        bar.open = low;
        bar.close = low;
        bar.high = high;
        bar.low = low;
        bar.volume = volume;
        bar
    }

    #[test]
    fn volume_spreads_by_overlap() {
        // Range 0..10 in 10 bins of width 1.
        // Bar A covers [0,10] with 100 → 10 per bin.
        // Bar B covers [4,6] with 40 → 20 in bins 4 and 5.
        let bars = vec![bar_with(10.0, 0.0, 100.0), bar_with(6.0, 4.0, 40.0)];
        let v = VolumeProfile::new(2, 10).unwrap().calculate(&bars, None).unwrap();
        assert_approx(v.bin_width, 1.0, DEFAULT_EPSILON);
        assert_approx(v.total_volume, 140.0, DEFAULT_EPSILON);
        assert_approx(v.volumes[0], 10.0, DEFAULT_EPSILON);
        assert_approx(v.volumes[4], 30.0, DEFAULT_EPSILON);
        assert_approx(v.volumes[5], 30.0, DEFAULT_EPSILON);
        // POC tie between bins 4 and 5 → lowest index
        assert_eq!(v.poc_index, 4);
        assert_approx(v.poc_price, 4.5, DEFAULT_EPSILON);
    }

    #[test]
    fn value_area_expands_toward_heavier_side() {
        // 70% of 140 = 98. Start at bin 4 (30).
        // up bin5 30 >= down bin3 10 → take 5 (60)
        // up bin6 10 == down bin3 10 → tie goes up, take 6 (70)
        // up bin7 10 == down bin3 10 → take 7 (80)
        // up bin8 10 == down bin3 10 → take 8 (90)
        // up bin9 10 == down bin3 10 → take 9 (100) ≥ 98
        let bars = vec![bar_with(10.0, 0.0, 100.0), bar_with(6.0, 4.0, 40.0)];
        let v = VolumeProfile::new(2, 10).unwrap().calculate(&bars, None).unwrap();
        assert_eq!(v.value_area_bins, (4, 9));
        assert_approx(v.value_area_low, 4.0, DEFAULT_EPSILON);
        assert_approx(v.value_area_high, 10.0, DEFAULT_EPSILON);
    }

    #[test]
    fn value_area_takes_lower_side_when_heavier() {
        // Bins of width 1 over [0,4]. Bar volumes concentrated low.
        let bars = vec![
            bar_with(4.0, 0.0, 40.0), // 10 per bin
            bar_with(1.0, 0.0, 50.0), // bin 0 +50
            bar_with(2.0, 1.0, 60.0), // bin 1 +60
        ];
        // volumes: [60, 70, 10, 10], total 150, target 105
        // POC = bin 1 (70). down bin0 60 > up bin2 10 → take 0 (130) ≥ 105
        let v = VolumeProfile::new(3, 4).unwrap().calculate(&bars, None).unwrap();
        assert_eq!(v.poc_index, 1);
        assert_eq!(v.value_area_bins, (0, 1));
    }

    #[test]
    fn zero_range_bar_lands_in_one_bin() {
        let bars = vec![bar_with(10.0, 0.0, 10.0), bar_with(2.5, 2.5, 90.0)];
        let v = VolumeProfile::new(2, 4).unwrap().calculate(&bars, None).unwrap();
        // width 2.5; price 2.5 sits at the lower edge of bin 1
        assert_approx(v.volumes[1], 2.5 + 90.0, DEFAULT_EPSILON);
        assert_eq!(v.poc_index, 1);
    }

    #[test]
    fn flat_window_collapses_to_first_bin() {
        let bars = vec![bar_with(5.0, 5.0, 10.0), bar_with(5.0, 5.0, 20.0)];
        let v = VolumeProfile::new(2, 8).unwrap().calculate(&bars, None).unwrap();
        assert_eq!(v.bin_width, 0.0);
        assert_approx(v.volumes[0], 30.0, DEFAULT_EPSILON);
        assert_eq!(v.poc_index, 0);
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(VolumeProfile::new(0, 10).is_err());
        assert!(VolumeProfile::new(10, 0).is_err());
        assert!(VolumeProfile::with_value_area(10, 10, 0.0).is_err());
        assert!(VolumeProfile::with_value_area(10, 10, 1.5).is_err());
    }
}
