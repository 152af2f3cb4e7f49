use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{Capture, Registration};
use crate::quota::{QUOTA_MAX, is_countable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Score {
    pub total: Decimal,
    pub counted_fish: i32,
}

/// Sums the final sizes of the first [`QUOTA_MAX`] countable captures.
///
/// Captures are taken in the order given, which callers keep as creation order.
/// They are not sorted by size: a fifth catch is left out because it
/// came fifth, even if it is the biggest.
pub fn compute_score(captures: &[Capture]) -> Score {
    let (total, counted) = captures
        .iter()
        .filter(|capture| is_countable(capture))
        .take(QUOTA_MAX)
        .fold((Decimal::ZERO, 0usize), |(total, count), capture| {
            (total + capture.final_size, count + 1)
        });

    Score {
        total,
        counted_fish: counted as i32,
    }
}

/// Returns `registration` with its stored score replaced by the recomputed one.
pub fn apply_score(registration: &Registration, captures: &[Capture]) -> (Registration, Score) {
    let score = compute_score(captures);
    tracing::debug!(
        registration_id = %registration.registration_id,
        total = %score.total,
        counted_fish = score.counted_fish,
        "recomputed registration score"
    );

    let updated = Registration {
        total_score: score.total,
        counted_fish: score.counted_fish,
        ..registration.clone()
    };
    (updated, score)
}
