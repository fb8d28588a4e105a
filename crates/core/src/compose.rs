//! Templated recommendation text.

use serde::Serialize;
use tera::{Context, Tera};
use tracing::warn;

use crate::domain::vehicle::CatalogItem;

pub const FILLER_PITCH: &str =
    "Let me tell you about this model. Would you like to schedule a test drive?";
const NOT_AVAILABLE: &str = "N/A";
const PITCH_TEMPLATE: &str = "pitch.txt";
const LISTING_TEMPLATE: &str = "listing.txt";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PitchStyle {
    /// A model the buyer asked about by name.
    Showcase,
    /// The best-scoring item of a ranked list.
    TopPick,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListingStyle {
    Recommendations,
    Recap,
}

#[derive(Serialize)]
struct ListingRow {
    model: String,
    fuel: String,
    seats: String,
    mileage: String,
    price: String,
}

#[derive(Clone, Debug)]
pub struct ResponseComposer {
    tera: Tera,
    brand: String,
}

impl ResponseComposer {
    pub fn new(brand: impl Into<String>) -> Self {
        let mut tera = Tera::default();
        tera.autoescape_on(Vec::new());
        if let Err(error) = tera.add_raw_templates(vec![
            (PITCH_TEMPLATE, include_str!("../../../templates/showroom/pitch.txt")),
            (LISTING_TEMPLATE, include_str!("../../../templates/showroom/listing.txt")),
        ]) {
            warn!(
                event_name = "compose.templates.invalid",
                error = %error,
                "response templates failed to load; replies will use filler text"
            );
        }

        Self { tera, brand: brand.into() }
    }

    pub fn brand(&self) -> &str {
        &self.brand
    }

    pub fn pitch(&self, item: &CatalogItem, style: PitchStyle) -> String {
        let model = item.model.trim();
        if model.is_empty() {
            return FILLER_PITCH.to_string();
        }

        let opening = match style {
            PitchStyle::TopPick => {
                format!("🌟 My top recommendation is the {} {model} because:", self.brand)
            }
            PitchStyle::Showcase => format!("The {} {model} is a smart choice! Here's why:", self.brand),
        };

        let mut context = Context::new();
        context.insert("opening", &opening);
        context.insert("highlights", &highlights(item));
        context.insert("seats", &item.seats.map(|seats| seats.to_string()).unwrap_or_else(na));
        context.insert("fuel", &text_or_na(item.fuel_type.as_deref()));
        context.insert("price", &price_text(item));
        context.insert("closing", "Would you like to know more or book a test drive?");

        self.render(PITCH_TEMPLATE, &context).unwrap_or_else(|| FILLER_PITCH.to_string())
    }

    pub fn listing(&self, items: &[CatalogItem], style: ListingStyle) -> String {
        let (heading, closing, detailed) = match style {
            ListingStyle::Recommendations => (
                "🌟 Based on your needs, I recommend these models:",
                "Would you like me to suggest the best option from these?",
                true,
            ),
            ListingStyle::Recap => (
                "Here are the models I recommended earlier:",
                "Let me know if you'd like to know more about any of them.",
                false,
            ),
        };

        let rows = items
            .iter()
            .map(|item| ListingRow {
                model: text_or_na(Some(item.model.as_str())),
                fuel: text_or_na(item.fuel_type.as_deref()),
                seats: item.seats.map(|seats| seats.to_string()).unwrap_or_else(na),
                mileage: text_or_na(item.mileage.as_deref()),
                price: price_text(item),
            })
            .collect::<Vec<_>>();

        let mut context = Context::new();
        context.insert("heading", heading);
        context.insert("rows", &rows);
        context.insert("detailed", &detailed);
        context.insert("closing", closing);

        self.render(LISTING_TEMPLATE, &context).unwrap_or_else(|| FILLER_PITCH.to_string())
    }

    fn render(&self, template: &str, context: &Context) -> Option<String> {
        match self.tera.render(template, context) {
            Ok(rendered) => Some(rendered.trim_end().to_string()),
            Err(error) => {
                warn!(
                    event_name = "compose.render.failed",
                    template,
                    error = %error,
                    "response template failed to render"
                );
                None
            }
        }
    }
}

fn highlights(item: &CatalogItem) -> Vec<String> {
    let mut highlights = Vec::new();

    match item.price {
        Some(price) if price < 500_000 => {
            highlights.push("Very affordable and budget-friendly".to_string())
        }
        Some(price) if price < 800_000 => highlights.push("Great value for money".to_string()),
        _ => {}
    }

    if let (Some(figure), Some(text)) = (item.mileage_figure(), item.mileage.as_deref()) {
        if figure >= 23.0 {
            highlights.push(format!("Excellent mileage of {text} – perfect for daily commuters"));
        } else if figure >= 20.0 {
            highlights.push(format!("Good mileage of {text}"));
        }
    }

    if item.seats.is_some_and(|seats| seats <= 5) {
        highlights.push("Ideal for small families or city driving".to_string());
    }

    highlights
}

/// Formats whole rupees with thousands separators, e.g. `₹880,000`.
pub fn format_rupees(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    if amount < 0 {
        format!("-₹{grouped}")
    } else {
        format!("₹{grouped}")
    }
}

fn price_text(item: &CatalogItem) -> String {
    match (item.price, item.price_display.as_deref()) {
        (Some(price), _) => format_rupees(price),
        (None, Some(display)) if !display.trim().is_empty() => display.trim().to_string(),
        _ => na(),
    }
}

fn text_or_na(value: Option<&str>) -> String {
    value.map(str::trim).filter(|value| !value.is_empty()).map(str::to_string).unwrap_or_else(na)
}

fn na() -> String {
    NOT_AVAILABLE.to_string()
}
