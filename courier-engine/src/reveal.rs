//! Terminal decrypt/reveal sequence as a deterministic timeline.
//!
//! The sequence is a pure function of elapsed time since the final assembly
//! was accepted. Callers sample it with whatever clock they have; tests drive
//! it with explicit durations.

use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::Serialize;

use crate::constants::{
    REVEAL_CHAR_INTERVAL_MS, REVEAL_LEAD_IN_MS, REVEAL_SETTLE_MS, REVEAL_STEPS,
    REVEAL_SWEEP_STEP_PCT, REVEAL_SWEEP_TICK_MS, SCRAMBLE_ALPHABET,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealStage {
    LeadIn,
    Steps,
    Sweep,
    Decode,
    Settling,
    Complete,
}

/// Everything the presentation layer needs to draw one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealFrame {
    pub stage: RevealStage,
    pub visible_steps: Vec<&'static str>,
    pub progress_pct: u8,
    /// Tracking value with unrevealed positions scrambled; empty before decode.
    pub display: String,
    pub revealed_chars: usize,
}

impl RevealFrame {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.stage == RevealStage::Complete
    }
}

/// Absolute offsets (ms since acceptance) of each stage boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealTimeline {
    pub steps_start: u64,
    pub sweep_start: u64,
    pub decode_start: u64,
    pub decode_end: u64,
    pub complete_at: u64,
}

impl RevealTimeline {
    #[must_use]
    pub fn for_length(chars: usize) -> Self {
        let steps_start = REVEAL_LEAD_IN_MS;
        let sweep_start = steps_start + REVEAL_STEPS.iter().map(|(_, delay)| delay).sum::<u64>();
        let sweep_ticks = u64::from(100 / REVEAL_SWEEP_STEP_PCT);
        let decode_start = sweep_start + sweep_ticks * REVEAL_SWEEP_TICK_MS;
        let decode_end = decode_start + REVEAL_CHAR_INTERVAL_MS * chars as u64;
        Self {
            steps_start,
            sweep_start,
            decode_start,
            decode_end,
            complete_at: decode_end + REVEAL_SETTLE_MS,
        }
    }
}

/// One run of the reveal for a given tracking value.
#[derive(Debug, Clone)]
pub struct RevealSequence {
    tracking: Vec<char>,
    armed_at: DateTime<Utc>,
    timeline: RevealTimeline,
    rng: ChaCha20Rng,
}

impl RevealSequence {
    #[must_use]
    pub fn new(tracking: &str, armed_at: DateTime<Utc>, seed: u64) -> Self {
        let tracking: Vec<char> = tracking.chars().collect();
        Self {
            timeline: RevealTimeline::for_length(tracking.len()),
            tracking,
            armed_at,
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    #[must_use]
    pub const fn timeline(&self) -> RevealTimeline {
        self.timeline
    }

    #[must_use]
    pub const fn armed_at(&self) -> DateTime<Utc> {
        self.armed_at
    }

    /// Milliseconds since acceptance, clamped at zero for clocks that run backwards.
    #[must_use]
    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> u64 {
        u64::try_from((now - self.armed_at).num_milliseconds()).unwrap_or(0)
    }

    #[must_use]
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.elapsed_ms(now) >= self.timeline.steps_start
    }

    /// Sample the sequence at `now`. Scramble glyphs advance the internal RNG.
    pub fn frame(&mut self, now: DateTime<Utc>) -> RevealFrame {
        let elapsed = self.elapsed_ms(now);
        self.frame_at(elapsed)
    }

    pub fn frame_at(&mut self, elapsed: u64) -> RevealFrame {
        let t = self.timeline;
        let mut offset = t.steps_start;
        let mut visible_steps = Vec::new();
        for (label, delay) in REVEAL_STEPS {
            if elapsed < offset {
                break;
            }
            visible_steps.push(label);
            offset += delay;
        }

        let ticks = elapsed.saturating_sub(t.sweep_start) / REVEAL_SWEEP_TICK_MS;
        let progress_pct = if elapsed < t.sweep_start {
            0
        } else {
            u8::try_from(ticks.saturating_mul(u64::from(REVEAL_SWEEP_STEP_PCT)).min(100))
                .unwrap_or(100)
        };

        let (display, revealed_chars) = if elapsed < t.decode_start {
            (String::new(), 0)
        } else {
            let revealed = usize::try_from(
                (elapsed - t.decode_start) / REVEAL_CHAR_INTERVAL_MS,
            )
            .unwrap_or(usize::MAX)
            .min(self.tracking.len());
            (self.render(revealed), revealed)
        };

        let stage = match elapsed {
            e if e < t.steps_start => RevealStage::LeadIn,
            e if e < t.sweep_start => RevealStage::Steps,
            e if e < t.decode_start => RevealStage::Sweep,
            e if e < t.decode_end => RevealStage::Decode,
            e if e < t.complete_at => RevealStage::Settling,
            _ => RevealStage::Complete,
        };

        RevealFrame {
            stage,
            visible_steps,
            progress_pct,
            display,
            revealed_chars,
        }
    }

    fn render(&mut self, revealed: usize) -> String {
        let rng = &mut self.rng;
        self.tracking
            .iter()
            .enumerate()
            .map(|(index, &ch)| {
                if index < revealed {
                    ch
                } else {
                    char::from(SCRAMBLE_ALPHABET[rng.gen_range(0..SCRAMBLE_ALPHABET.len())])
                }
            })
            .collect()
    }
}
