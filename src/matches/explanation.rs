//! Parsing of the backend's sigil-prefixed match explanations.
//!
//! Each line of an explanation starts with one emoji naming its category.
//! When the backend sends nothing usable, reasons are synthesised from the
//! score and the apartment's own fields so a card never shows an empty list.

use serde::Serialize;

use crate::models::Apartment;

/// Scores at or above this count as a good match
pub const GOOD_MATCH_THRESHOLD: f64 = 80.0;

/// Category of one explanation line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HintKind {
    Check,
    Cancel,
    Diamond,
    Warning,
    Lightbulb,
    Info,
}

impl HintKind {
    /// Emoji used to render this kind.
    pub fn sigil(self) -> &'static str {
        match self {
            HintKind::Check => "✅",
            HintKind::Cancel => "❌",
            HintKind::Diamond => "💎",
            HintKind::Warning => "🟡",
            HintKind::Lightbulb => "💡",
            HintKind::Info => "•",
        }
    }
}

const SIGILS: [(char, HintKind); 5] = [
    ('✅', HintKind::Check),
    ('❌', HintKind::Cancel),
    ('💎', HintKind::Diamond),
    ('🟡', HintKind::Warning),
    ('💡', HintKind::Lightbulb),
];

const VARIATION_SELECTOR: char = '\u{FE0F}';

/// One typed line of an explanation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hint {
    #[serde(rename = "type")]
    pub kind: HintKind,
    pub text: String,
}

impl Hint {
    pub fn new(kind: HintKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Hints for a match card. Always returns at least one entry.
pub fn explain(explanation: Option<&str>, score: f64, apartment: &Apartment) -> Vec<Hint> {
    let hints = explanation.map(parse_lines).unwrap_or_default();
    if hints.iter().any(|hint| hint.kind != HintKind::Info) {
        hints
    } else {
        fallback_hints(score, apartment)
    }
}

/// Split an explanation into hints, one per non-empty line, order preserved.
/// Lines without a known sigil become `Info`.
pub fn parse_lines(raw: &str) -> Vec<Hint> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_line)
        .collect()
}

fn parse_line(line: &str) -> Hint {
    let mut chars = line.chars();
    let kind = chars.next().and_then(|first| {
        SIGILS
            .iter()
            .find(|(sigil, _)| *sigil == first)
            .map(|(_, kind)| *kind)
    });

    match kind {
        Some(kind) => {
            let text = chars.as_str().trim_start_matches(VARIATION_SELECTOR).trim();
            Hint::new(kind, text)
        }
        None => Hint::new(HintKind::Info, line),
    }
}

/// Rough price band used when describing a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceBand {
    Budget,
    Moderate,
    Premium,
}

impl PriceBand {
    pub fn of(price: u32) -> Self {
        match price {
            0..=1499 => PriceBand::Budget,
            1500..=3000 => PriceBand::Moderate,
            _ => PriceBand::Premium,
        }
    }
}

/// Canned reasons keyed on the score threshold.
pub fn fallback_hints(score: f64, apartment: &Apartment) -> Vec<Hint> {
    if score >= GOOD_MATCH_THRESHOLD {
        good_match_hints(apartment)
    } else {
        poor_match_hints(apartment)
    }
}

fn good_match_hints(apartment: &Apartment) -> Vec<Hint> {
    let mut hints = vec![Hint::new(
        HintKind::Check,
        format!("Within your budget at ${}/month", apartment.price),
    )];

    hints.push(Hint::new(
        HintKind::Check,
        bedroom_phrase(apartment.bedrooms, "matches your bedroom needs"),
    ));

    if apartment.neighborhood.is_empty() {
        hints.push(Hint::new(HintKind::Check, "Located in a neighborhood you're interested in"));
    } else {
        hints.push(Hint::new(
            HintKind::Check,
            format!("Located in {}, one of your preferred neighborhoods", apartment.neighborhood),
        ));
    }

    if PriceBand::of(apartment.price) == PriceBand::Budget {
        hints.push(Hint::new(HintKind::Diamond, "Great value for the area"));
    }

    hints
}

fn poor_match_hints(apartment: &Apartment) -> Vec<Hint> {
    let mismatch = match PriceBand::of(apartment.price) {
        PriceBand::Premium => format!(
            "At ${}/month this is above your preferred price range",
            apartment.price
        ),
        _ => "Doesn't meet several of your key preferences".to_string(),
    };

    vec![
        Hint::new(HintKind::Cancel, mismatch),
        Hint::new(
            HintKind::Warning,
            bedroom_phrase(apartment.bedrooms, "may not fit what you're looking for"),
        ),
        Hint::new(HintKind::Lightbulb, "Try widening your price range to see more matches"),
        Hint::new(HintKind::Lightbulb, "Consider nearby neighborhoods for better options"),
    ]
}

fn bedroom_phrase(bedrooms: u32, tail: &str) -> String {
    match bedrooms {
        0 => format!("Studio layout {tail}"),
        1 => format!("1 bedroom {tail}"),
        n => format!("{n} bedrooms {tail}"),
    }
}
