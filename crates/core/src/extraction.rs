//! Rule-based attribute extraction from buyer utterances.
//!
//! Every rule is independent and only reports a field it can positively
//! justify. Keyword tables are ordered: the first hit wins, so the order of
//! each table is part of its contract.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::dialogue::states::Slot;
use crate::domain::profile::{CarType, DriveType, FuelType, Transmission};

/// Qualitative household words and the seating they imply.
pub const HOUSEHOLD_LEXICON: &[(&str, u32)] =
    &[("nuclear", 3), ("small", 4), ("medium", 5), ("big", 6), ("large", 7), ("joint", 7)];

pub const FUEL_KEYWORDS: &[(&str, FuelType)] = &[
    ("petrol", FuelType::Petrol),
    ("diesel", FuelType::Diesel),
    ("cng", FuelType::Cng),
    ("electric", FuelType::Electric),
];

pub const BODY_KEYWORDS: &[(&str, CarType)] = &[
    ("hatchback", CarType::Hatchback),
    ("sedan", CarType::Sedan),
    ("suv", CarType::Suv),
    ("mpv", CarType::Mpv),
    ("muv", CarType::Muv),
    ("van", CarType::Van),
    ("crossover", CarType::Crossover),
];

pub const TRANSMISSION_KEYWORDS: &[(&str, Transmission)] =
    &[("automatic", Transmission::Automatic), ("manual", Transmission::Manual)];

const CURRENCY: &str = r"(?:₹|\brs\.?|\binr)?\s*";
const AMOUNT: &str = r"(\d+(?:\.\d+)?)";
const UNIT: &str = r"(crores?|cr|lakhs?|lacs?|thousand|k)";

static SEAT_COUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+)\s*(?:seats?|seater|people|persons?|members)\b")
        .expect("seat count pattern is valid")
});

/// A number directly followed by one of these counts people, never rupees.
static HEADCOUNT_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:seats?|seater|people|persons?|members)\b")
        .expect("headcount suffix pattern is valid")
});

/// A reply that is only a small count, give or take filler: "5", "just 4",
/// "we are 6 of us".
static LONE_COUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(?:just|only|about|around|maybe|we are|we're|there are|there will be)\s+)*(\d{1,2})(?:\s+(?:of us|in total|total))?\s*[.!]*$",
    )
    .expect("lone count pattern is valid")
});

static DRIVE_PATTERNS: Lazy<Vec<(Regex, DriveType)>> = Lazy::new(|| {
    vec![
        (Regex::new(r"four[- ]?wheel|4wd").expect("4wd pattern"), DriveType::FourWheel),
        (Regex::new(r"rear[- ]?wheel").expect("rwd pattern"), DriveType::RearWheel),
        (Regex::new(r"front[- ]?wheel").expect("fwd pattern"), DriveType::FrontWheel),
    ]
});

static BUDGET_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:between|from)\s*{CURRENCY}{AMOUNT}\s*{UNIT}?\b\s*(?:to|and|-)\s*{CURRENCY}{AMOUNT}\s*{UNIT}?\b"
    ))
    .expect("budget range pattern is valid")
});

static BUDGET_CEILING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:under|below|less than|within|up to|upto)\s*{CURRENCY}{AMOUNT}\s*{UNIT}?\b"
    ))
    .expect("budget ceiling pattern is valid")
});

static BUDGET_FLOOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\b(?:above|over|more than)\s*{CURRENCY}{AMOUNT}\s*{UNIT}?\b"))
        .expect("budget floor pattern is valid")
});

static BUDGET_WITH_UNIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"{CURRENCY}{AMOUNT}\s*{UNIT}\b")).expect("unit amount pattern is valid")
});

static BUDGET_WITH_CURRENCY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:₹|\brs\.?|\binr)\s*(\d[\d,]*(?:\.\d+)?)")
        .expect("currency amount pattern is valid")
});

static MILEAGE_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"mileage\s*(?:between|from|of)?\s*{AMOUNT}\s*(?:to|and|-)\s*{AMOUNT}"
    ))
    .expect("mileage range pattern is valid")
});

static MILEAGE_FLOOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"mileage\s*(?:above|over|more than|at least)\s*{AMOUNT}"))
        .expect("mileage floor pattern is valid")
});

static MILEAGE_CEILING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"mileage\s*(?:under|below|less than)\s*{AMOUNT}"))
        .expect("mileage ceiling pattern is valid")
});

static BARE_AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(\d[\d,]*(?:\.\d+)?)\s*{UNIT}?\b")).expect("bare amount pattern is valid")
});

/// Sparse result of one extraction pass. `None` means "not mentioned", never
/// "explicitly cleared".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedAttributes {
    pub family_size: Option<u32>,
    pub fuel_type: Option<FuelType>,
    pub car_type: Option<CarType>,
    pub budget_min: Option<i64>,
    pub budget_max: Option<i64>,
    pub drive_type: Option<DriveType>,
    pub transmission: Option<Transmission>,
    pub mileage_min: Option<f64>,
    pub mileage_max: Option<f64>,
}

impl ExtractedAttributes {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Clone, Debug, Default)]
pub struct EntityExtractor;

impl EntityExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, utterance: &str) -> ExtractedAttributes {
        let text = utterance.to_lowercase();
        let (budget_min, budget_max) = extract_budget(&text);
        let (mileage_min, mileage_max) = extract_mileage(&text);

        ExtractedAttributes {
            family_size: extract_family_size(&text),
            fuel_type: first_keyword(&text, FUEL_KEYWORDS),
            car_type: first_keyword(&text, BODY_KEYWORDS),
            budget_min,
            budget_max,
            drive_type: extract_drive_type(&text),
            transmission: first_keyword(&text, TRANSMISSION_KEYWORDS),
            mileage_min,
            mileage_max,
        }
    }

    /// Runs the general rules, then lets the awaited slot accept a bare number
    /// ("just 5" when asked about family size, "800000" when asked about
    /// budget). A family-size answer must be the whole reply, so years and
    /// amounts elsewhere in a sentence are never read as a headcount.
    pub fn extract_for_slot(&self, utterance: &str, awaiting: Option<Slot>) -> ExtractedAttributes {
        let mut extracted = self.extract(utterance);
        let text = utterance.trim().to_lowercase();

        match awaiting {
            Some(Slot::FamilySize) if extracted.family_size.is_none() => {
                extracted.family_size = LONE_COUNT
                    .captures(&text)
                    .and_then(|captures| captures[1].parse::<u32>().ok())
                    .filter(|count| *count > 0);
            }
            Some(Slot::Budget) if extracted.budget_min.is_none() && extracted.budget_max.is_none() => {
                extracted.budget_max = BARE_AMOUNT.captures(&text).and_then(|captures| {
                    amount_in_rupees(&captures[1].replace(',', ""), captures.get(2).map(|m| m.as_str()))
                });
            }
            _ => {}
        }

        extracted
    }
}

fn extract_family_size(text: &str) -> Option<u32> {
    if let Some(captures) = SEAT_COUNT.captures(text) {
        return captures[1].parse::<u32>().ok().filter(|count| *count > 0);
    }

    HOUSEHOLD_LEXICON
        .iter()
        .find(|(word, _)| text.contains(word))
        .map(|(_, seats)| *seats)
}

fn first_keyword<T: Copy>(text: &str, table: &[(&str, T)]) -> Option<T> {
    table.iter().find(|(keyword, _)| text.contains(keyword)).map(|(_, value)| *value)
}

fn extract_drive_type(text: &str) -> Option<DriveType> {
    DRIVE_PATTERNS.iter().find(|(pattern, _)| pattern.is_match(text)).map(|(_, drive)| *drive)
}

fn extract_budget(text: &str) -> (Option<i64>, Option<i64>) {
    if let Some(captures) = budget_match(&BUDGET_RANGE, text) {
        let shared_unit = captures.get(2).or_else(|| captures.get(4)).map(|m| m.as_str());
        let upper_unit = captures.get(4).or_else(|| captures.get(2)).map(|m| m.as_str());
        let lower = amount_in_rupees(&captures[1], shared_unit);
        let upper = amount_in_rupees(&captures[3], upper_unit);
        if lower.is_some() || upper.is_some() {
            return (lower, upper);
        }
    }

    let ceiling = budget_match(&BUDGET_CEILING, text).and_then(|captures| {
        amount_in_rupees(&captures[1], captures.get(2).map(|m| m.as_str()))
    });
    let floor = budget_match(&BUDGET_FLOOR, text).and_then(|captures| {
        amount_in_rupees(&captures[1], captures.get(2).map(|m| m.as_str()))
    });
    if ceiling.is_some() || floor.is_some() {
        return (floor, ceiling);
    }

    let bare = budget_match(&BUDGET_WITH_UNIT, text)
        .and_then(|captures| amount_in_rupees(&captures[1], captures.get(2).map(|m| m.as_str())))
        .or_else(|| {
            BUDGET_WITH_CURRENCY
                .captures(text)
                .and_then(|captures| amount_in_rupees(&captures[1].replace(',', ""), None))
        });
    (None, bare)
}

fn extract_mileage(text: &str) -> (Option<f64>, Option<f64>) {
    if let Some(captures) = MILEAGE_RANGE.captures(text) {
        let lower = captures[1].parse::<f64>().ok();
        let upper = captures[2].parse::<f64>().ok();
        if lower.is_some() || upper.is_some() {
            return (lower, upper);
        }
    }

    let floor = MILEAGE_FLOOR.captures(text).and_then(|captures| captures[1].parse::<f64>().ok());
    let ceiling =
        MILEAGE_CEILING.captures(text).and_then(|captures| captures[1].parse::<f64>().ok());
    (floor, ceiling)
}

/// First match that is really about money: not preceded by "mileage"
/// ("mileage above 20") and not followed by a headcount ("up to 7 seats").
fn budget_match<'t>(pattern: &Regex, text: &'t str) -> Option<Captures<'t>> {
    pattern.captures_iter(text).find(|captures| {
        let Some(whole) = captures.get(0) else {
            return false;
        };
        !text[..whole.start()].trim_end().ends_with("mileage")
            && !HEADCOUNT_SUFFIX.is_match(&text[whole.end()..])
    })
}

fn amount_in_rupees(number: &str, unit: Option<&str>) -> Option<i64> {
    let value = number.parse::<f64>().ok()?;
    let multiplier = match unit {
        Some(unit) if unit.starts_with("cr") => 10_000_000.0,
        Some(unit) if unit.starts_with("la") => 100_000.0,
        Some("thousand") | Some("k") => 1_000.0,
        _ => 1.0,
    };
    let rupees = (value * multiplier).round();
    (rupees.is_finite() && rupees > 0.0 && rupees < i64::MAX as f64).then_some(rupees as i64)
}
