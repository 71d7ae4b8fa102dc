//! Random starting-index sampling for Monte Carlo runs.

use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Future bars reserved per potential grid level.
pub const DEFAULT_LOOKAHEAD: usize = 10;

/// Outcome of a sampling request: the drawn indices, the lookahead
/// actually honored, and a diagnostic note when it had to shrink.
#[derive(Debug, Clone)]
pub struct SampledStarts {
    pub indices: Vec<usize>,
    pub lookahead: usize,
    pub note: Option<String>,
}

/// Draw `count` starting indices over a series of `series_len` bars,
/// reserving `max_levels * lookahead` future bars so a trade can exhaust
/// its grid. A short history shrinks the lookahead proportionally and
/// reports it in the note; sampling never fails outright.
///
/// Indices are distinct when the feasible range covers the request and
/// drawn with replacement otherwise. A seeded call is bit-reproducible
/// for identical `(series_len, max_levels, count, lookahead, seed)`.
pub fn sample_starts(
    series_len: usize,
    max_levels: usize,
    count: usize,
    lookahead: usize,
    seed: Option<u64>,
) -> SampledStarts {
    let mut rng = match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    let mut lookahead = lookahead.max(1);
    let mut note = None;
    if max_levels > 0 && series_len <= max_levels * lookahead {
        let reduced = (series_len / max_levels).saturating_sub(1).max(1);
        note = Some(format!(
            "history of {series_len} bars is short for {max_levels} grid levels; \
             lookahead reduced from {lookahead} to {reduced}"
        ));
        lookahead = reduced;
    }
    let feasible = series_len.saturating_sub(max_levels * lookahead).max(1);

    let indices = if count > feasible {
        (0..count).map(|_| rng.gen_range(0..feasible)).collect()
    } else {
        index::sample(&mut rng, feasible, count).into_vec()
    };

    SampledStarts {
        indices,
        lookahead,
        note,
    }
}
