use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Mouth-shape classes, one per articulation group.
///
/// The wire codes are the single letters rhubarb emits, so cues coming out
/// of the aligner and cues built by the fallback synthesizer share one type.
/// The classifier itself never produces `Puckered`; rounded vowels collapse
/// into `RoundedVowel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Viseme {
    /// p, b, m — lips closed.
    #[serde(rename = "A")]
    Bilabial,
    /// t, d, s, z, n, l, r, j and the sh/ch digraphs.
    #[serde(rename = "B")]
    Alveolar,
    /// k, g, c, q, x and the ng digraph.
    #[serde(rename = "C")]
    Velar,
    /// a, e, i, y — open vowel window.
    #[serde(rename = "D")]
    OpenVowel,
    /// o, u, w — rounded vowel window.
    #[serde(rename = "E")]
    RoundedVowel,
    /// Tight u/w shape; only ever seen in aligner output.
    #[serde(rename = "F")]
    Puckered,
    /// f, v and the ph digraph.
    #[serde(rename = "G")]
    Labiodental,
    /// The th digraph.
    #[serde(rename = "H")]
    Dental,
    /// Rest pose: h, digits, anything unclassified.
    #[serde(rename = "X")]
    Rest,
}

impl Viseme {
    pub fn as_letter(&self) -> &'static str {
        match self {
            Viseme::Bilabial => "A",
            Viseme::Alveolar => "B",
            Viseme::Velar => "C",
            Viseme::OpenVowel => "D",
            Viseme::RoundedVowel => "E",
            Viseme::Puckered => "F",
            Viseme::Labiodental => "G",
            Viseme::Dental => "H",
            Viseme::Rest => "X",
        }
    }
}

impl fmt::Display for Viseme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_letter())
    }
}

/// Two-character graphemes that read as a single phonetic unit. Checked
/// before any single-character rule so e.g. "th" never degrades to the
/// alveolar class of its leading 't'.
static DIGRAPHS: Lazy<HashMap<&'static str, Viseme>> = Lazy::new(|| {
    HashMap::from([
        ("th", Viseme::Dental),
        ("sh", Viseme::Alveolar),
        ("ch", Viseme::Alveolar),
        ("ph", Viseme::Labiodental),
        ("ng", Viseme::Velar),
    ])
});

/// Classify a two-character grapheme if the window starts one.
pub fn classify_digraph(current: char, next: char) -> Option<Viseme> {
    let mut key = String::with_capacity(2);
    key.push(current.to_ascii_lowercase());
    key.push(next.to_ascii_lowercase());
    DIGRAPHS.get(key.as_str()).copied()
}

/// Classify a single character. Total — anything without a rule is `Rest`.
pub fn classify_char(c: char) -> Viseme {
    match c.to_ascii_lowercase() {
        'p' | 'b' | 'm' => Viseme::Bilabial,
        't' | 'd' | 's' | 'z' | 'n' | 'l' | 'r' | 'j' => Viseme::Alveolar,
        'k' | 'g' | 'c' | 'q' | 'x' => Viseme::Velar,
        'a' | 'e' | 'i' | 'y' => Viseme::OpenVowel,
        'o' | 'u' | 'w' => Viseme::RoundedVowel,
        'f' | 'v' => Viseme::Labiodental,
        _ => Viseme::Rest,
    }
}

/// Classify the current character with one character of lookahead.
/// Returns the class and how many characters the match consumed (2 for a
/// digraph, otherwise 1).
pub fn classify_window(current: char, next: Option<char>) -> (Viseme, usize) {
    if let Some(n) = next {
        if let Some(v) = classify_digraph(current, n) {
            return (v, 2);
        }
    }
    (classify_char(current), 1)
}
