// libs/scheduling-cell/src/services/partition.rs
use chrono::{DateTime, Utc};
use std::ops::Range;

use crate::models::Priority;

/// Index ranges of the High, Medium and Low bands (in that order) over an
/// ascending free-slot sequence of length `n`.
///
/// High takes the earliest fifth, Medium the next three fifths, and Low the
/// remainder, so the three sizes always sum to `n` and rounding loss lands in
/// the Low band.
pub fn band_ranges(n: usize) -> [Range<usize>; 3] {
    let high = n / 5;
    let medium = n * 3 / 5;

    [0..high, high..high + medium, high + medium..n]
}

fn band_index(priority: Priority) -> usize {
    match priority {
        Priority::High => 0,
        Priority::Medium => 1,
        Priority::Low => 2,
    }
}

/// Pick the slot a request at `requested` urgency should receive: the
/// earliest slot of its band, or of the next non-empty band probing the
/// High -> Medium -> Low ring when its own band is empty. `None` only when
/// there are no free slots at all.
pub fn select_slot(free: &[DateTime<Utc>], requested: Priority) -> Option<DateTime<Utc>> {
    let bands = band_ranges(free.len());
    let start = band_index(requested);

    (0..bands.len())
        .map(|step| bands[(start + step) % bands.len()].clone())
        .find(|band| !band.is_empty())
        .map(|band| free[band.start])
}
