//! Lot-scaling plans: a uniform multiplier or staged segments.
//!
//! The textual mini-language is `"<count>:<multiplier>,..."`, e.g.
//! `"10:1.1,5:1.2"` scales the first 10 additions by 1.1 and the next 5
//! by 1.2. Empty text means "uniform".

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// One staged segment: `count` additions at `multiplier`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanSegment {
    pub count: u32,
    pub multiplier: f64,
}

/// How lot sizes scale across grid additions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LotScaling {
    /// Same multiplier at every addition, `max_steps` total entries.
    Uniform { multiplier: f64, max_steps: u32 },
    /// Ordered segments, each covering `count` additions.
    Staged(Vec<PlanSegment>),
}

impl LotScaling {
    /// Parse staged-plan text. Empty or all-whitespace text falls back
    /// to `Uniform { q0, max_steps }`. Malformed tokens are an error,
    /// never silently skipped.
    pub fn parse(text: &str, q0: f64, max_steps: u32) -> Result<Self> {
        let mut segments = Vec::new();
        for token in text.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let (count, multiplier) = token
                .split_once(':')
                .with_context(|| format!("plan token `{token}` is missing `:`"))?;
            let count: u32 = count
                .trim()
                .parse()
                .with_context(|| format!("plan token `{token}` has a bad count"))?;
            let multiplier: f64 = multiplier
                .trim()
                .parse()
                .with_context(|| format!("plan token `{token}` has a bad multiplier"))?;
            if count == 0 {
                bail!("plan token `{token}`: count must be >= 1");
            }
            if multiplier <= 0.0 {
                bail!("plan token `{token}`: multiplier must be > 0");
            }
            segments.push(PlanSegment { count, multiplier });
        }
        if segments.is_empty() {
            Ok(Self::Uniform {
                multiplier: q0,
                max_steps,
            })
        } else {
            Ok(Self::Staged(segments))
        }
    }

    /// Hard cap on grid additions (entries beyond the initial one).
    pub fn max_additions(&self) -> u32 {
        match self {
            Self::Uniform { max_steps, .. } => max_steps.saturating_sub(1),
            Self::Staged(segments) => segments.iter().map(|s| s.count).sum(),
        }
    }

    /// Resolve into the per-addition multiplier generator consumed by
    /// the simulator.
    pub fn schedule(&self) -> MultiplierSchedule {
        let segments = match self {
            Self::Uniform {
                multiplier,
                max_steps,
            } => vec![PlanSegment {
                count: max_steps.saturating_sub(1),
                multiplier: *multiplier,
            }],
            Self::Staged(segments) => segments.clone(),
        };
        MultiplierSchedule {
            segments,
            seg_idx: 0,
            used_in_seg: 0,
        }
    }

    /// Theoretical total lot volume if every level fills.
    pub fn total_lots(&self, lot0: f64) -> f64 {
        let mut schedule = self.schedule();
        let mut total = lot0;
        let mut lot = lot0;
        for _ in 0..self.max_additions() {
            lot *= schedule.next_multiplier();
            total += lot;
        }
        total
    }
}

/// Stateful "next multiplier" generator resolved from a [`LotScaling`].
///
/// Past the last segment the final multiplier is retained, so the
/// generator is total; in practice the simulator's hard cap stops
/// additions before that point.
#[derive(Debug, Clone)]
pub struct MultiplierSchedule {
    segments: Vec<PlanSegment>,
    seg_idx: usize,
    used_in_seg: u32,
}

impl MultiplierSchedule {
    pub fn next_multiplier(&mut self) -> f64 {
        if self.segments.is_empty() {
            return 1.0;
        }
        if self.used_in_seg >= self.segments[self.seg_idx].count
            && self.seg_idx + 1 < self.segments.len()
        {
            self.seg_idx += 1;
            self.used_in_seg = 0;
        }
        self.used_in_seg += 1;
        self.segments[self.seg_idx].multiplier
    }
}
