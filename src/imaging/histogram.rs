//! Tone-distribution math: channel histograms and the lookup tables derived
//! from them.
//!
//! Everything here works on 8-bit channels, so a histogram is a fixed
//! `[u64; 256]` and a remapping is a fixed `[u8; 256]` lookup table.
//!
//! ## Matching
//!
//! [`match_tables`] brings two images to a *shared* tone distribution rather
//! than forcing one onto the other: both histograms are normalized and
//! averaged, and each image is mapped onto the cumulative distribution of that
//! average. Each level `i` goes to the lowest level `j` whose averaged
//! cumulative value reaches the image's own cumulative value at `i`.

/// Number of intensity levels per 8-bit channel.
pub const LEVELS: usize = 256;

/// Frequency of each level in one channel.
pub type Histogram = [u64; LEVELS];

/// Per-level remapping for one channel.
pub type Lut = [u8; LEVELS];

/// Slack when comparing cumulative fractions, so equal distributions map to
/// themselves despite rounding.
const CDF_EPSILON: f64 = 1e-9;

/// The identity lookup table.
pub fn identity_lut() -> Lut {
    std::array::from_fn(|i| i as u8)
}

/// Normalized cumulative distribution of a histogram.
///
/// An empty histogram yields all ones, which maps every level to 0 when
/// matched; callers never pass one for a real image.
fn cumulative(hist: &[f64; LEVELS]) -> [f64; LEVELS] {
    let total: f64 = hist.iter().sum();
    let mut out = [1.0; LEVELS];
    if total <= 0.0 {
        return out;
    }
    let mut running = 0.0;
    for (slot, &count) in out.iter_mut().zip(hist.iter()) {
        running += count;
        *slot = running / total;
    }
    out
}

fn normalized(hist: &Histogram) -> [f64; LEVELS] {
    let total: u64 = hist.iter().sum();
    if total == 0 {
        return [0.0; LEVELS];
    }
    std::array::from_fn(|i| hist[i] as f64 / total as f64)
}

/// Lookup tables mapping each of two channel histograms onto the cumulative
/// distribution of their average.
///
/// Returns `(left_lut, right_lut)`.
pub fn match_tables(left: &Histogram, right: &Histogram) -> (Lut, Lut) {
    let (l, r) = (normalized(left), normalized(right));
    let average: [f64; LEVELS] = std::array::from_fn(|i| (l[i] + r[i]) / 2.0);
    let target = cumulative(&average);

    (
        remap_onto(&cumulative(&l), &target),
        remap_onto(&cumulative(&r), &target),
    )
}

/// Map each level to the lowest target level whose cumulative value is at
/// least the source's cumulative value at that level.
fn remap_onto(source: &[f64; LEVELS], target: &[f64; LEVELS]) -> Lut {
    let mut lut = [0u8; LEVELS];
    // Both sequences are non-decreasing, so the search never moves backwards.
    let mut j = 0;
    for (i, &wanted) in source.iter().enumerate() {
        while j < LEVELS - 1 && target[j] + CDF_EPSILON < wanted {
            j += 1;
        }
        lut[i] = j as u8;
    }
    lut
}

/// Histogram equalization table for one channel.
///
/// Uses the classic step formulation: the population excluding the last
/// occupied level is divided into 255 steps, and each level maps to the
/// number of whole steps below it. Channels with a single occupied level, or
/// too few pixels to fill a step, get the identity table.
pub fn equalize_table(hist: &Histogram) -> Lut {
    let occupied: Vec<u64> = hist.iter().copied().filter(|&n| n > 0).collect();
    let Some(&last) = occupied.last() else {
        return identity_lut();
    };
    if occupied.len() <= 1 {
        return identity_lut();
    }

    let total: u64 = occupied.iter().sum();
    let step = (total - last) / 255;
    if step == 0 {
        return identity_lut();
    }

    let mut lut = [0u8; LEVELS];
    let mut n = step / 2;
    for (slot, &count) in lut.iter_mut().zip(hist.iter()) {
        *slot = (n / step).min(255) as u8;
        n += count;
    }
    lut
}
