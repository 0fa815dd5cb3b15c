//! Text-based cue synthesis for when forced alignment is unavailable.
//!
//! Timing is estimated by spreading the target duration across the
//! characters of the text, with bounded jitter so the result does not look
//! mechanically uniform. Deterministic apart from the jitter: for fixed
//! input the cue count and class sequence are stable across runs.

use crate::message::{LipSync, MouthCue};
use crate::viseme::{classify_window, Viseme};
use rand::Rng;

/// Floor so no cue collapses to zero width.
const MIN_CUE_SECS: f32 = 0.03;
/// Per-cue duration multiplier band around 1.0.
const JITTER_BAND: std::ops::Range<f32> = 0.85..1.15;
/// Silent gap inserted between words.
const WORD_GAP_SECS: std::ops::Range<f32> = 0.02..0.08;
/// Chance that a cue is re-rolled to a vowel class in the naturalness pass.
const VOWEL_REROLL_CHANCE: f64 = 0.08;

/// Seconds-per-character heuristic for when no audio exists to measure.
const SECS_PER_CHAR: f32 = 0.075;
const MIN_ESTIMATED_SECS: f32 = 0.5;

/// Estimate how long `text` would take to speak.
pub fn estimate_duration(text: &str) -> f32 {
    let chars = normalize(text)
        .iter()
        .map(|w| w.chars().count())
        .sum::<usize>();
    (chars as f32 * SECS_PER_CHAR).max(MIN_ESTIMATED_SECS)
}

/// Synthesize a cue sequence for `text` spanning at most `target_secs`.
pub fn synthesize(text: &str, target_secs: f32) -> LipSync {
    synthesize_with_rng(text, target_secs, &mut rand::thread_rng())
}

/// Same as [`synthesize`] but with a caller-supplied random source, so
/// tests can pin exact cue boundaries with a seeded generator.
pub fn synthesize_with_rng<R: Rng>(text: &str, target_secs: f32, rng: &mut R) -> LipSync {
    let words = normalize(text);
    let total_chars: usize = words.iter().map(|w| w.chars().count()).sum();
    if total_chars == 0 || target_secs <= 0.0 {
        return LipSync::default();
    }

    let avg_char_secs = target_secs / total_chars as f32;
    let mut cues = Vec::with_capacity(total_chars);
    let mut now = 0.0f32;

    for (word_index, word) in words.iter().enumerate() {
        let chars: Vec<char> = word.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let (viseme, consumed) = classify_window(chars[i], chars.get(i + 1).copied());
            let jitter = rng.gen_range(JITTER_BAND);
            let dur = (avg_char_secs * jitter).max(MIN_CUE_SECS);
            cues.push(MouthCue::new(now, now + dur, viseme));
            now += dur;
            i += consumed;
        }
        if word_index + 1 < words.len() {
            now += rng.gen_range(WORD_GAP_SECS);
        }
    }

    let mut lipsync = LipSync::new(cues);

    // Never overrun the requested duration.
    if now > target_secs {
        lipsync.rescale(target_secs / now);
    }

    // Silent stretches classify closure-heavy; opening a few cues back up
    // reads much more natural on an avatar.
    for cue in &mut lipsync.mouth_cues {
        if rng.gen_bool(VOWEL_REROLL_CHANCE) {
            cue.value = if rng.gen_bool(0.5) {
                Viseme::OpenVowel
            } else {
                Viseme::RoundedVowel
            };
        }
    }

    lipsync
}

/// Lowercase, drop everything but letters/digits/whitespace, split into
/// words. Returns the word list; the classifier walk runs over it.
fn normalize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    cleaned.split_whitespace().map(|w| w.to_string()).collect()
}
