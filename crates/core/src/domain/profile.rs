use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelType {
    Petrol,
    Diesel,
    Cng,
    Electric,
}

impl FuelType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Petrol => "Petrol",
            Self::Diesel => "Diesel",
            Self::Cng => "CNG",
            Self::Electric => "Electric",
        }
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarType {
    Hatchback,
    Sedan,
    Suv,
    Mpv,
    Muv,
    Van,
    Crossover,
}

impl CarType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Hatchback => "Hatchback",
            Self::Sedan => "Sedan",
            Self::Suv => "SUV",
            Self::Mpv => "MPV",
            Self::Muv => "MUV",
            Self::Van => "Van",
            Self::Crossover => "Crossover",
        }
    }
}

impl fmt::Display for CarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveType {
    FourWheel,
    RearWheel,
    FrontWheel,
}

impl DriveType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::FourWheel => "Four Wheel Drive",
            Self::RearWheel => "Rear Wheel Drive",
            Self::FrontWheel => "Front Wheel Drive",
        }
    }
}

impl fmt::Display for DriveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transmission {
    Automatic,
    Manual,
}

impl Transmission {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Automatic => "Automatic",
            Self::Manual => "Manual",
        }
    }
}

impl fmt::Display for Transmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accumulated buyer preferences for one conversation.
///
/// Fields are only ever written through `DialogueSession::merge`, which
/// enforces first-write-wins and keeps the budget and mileage bounds ordered.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeProfile {
    pub family_size: Option<u32>,
    pub fuel_type: Option<FuelType>,
    pub car_type: Option<CarType>,
    pub budget_min: Option<i64>,
    pub budget_max: Option<i64>,
    pub drive_type: Option<DriveType>,
    /// Remembered for the conversation; the catalog carries no gearbox data
    /// to filter on.
    pub transmission: Option<Transmission>,
    pub mileage_min: Option<f64>,
    pub mileage_max: Option<f64>,
}

impl AttributeProfile {
    pub fn has_budget(&self) -> bool {
        self.budget_min.is_some() || self.budget_max.is_some()
    }

    /// The amount candidates are scored against: the ceiling when known,
    /// otherwise the floor.
    pub fn budget_target(&self) -> Option<i64> {
        self.budget_max.or(self.budget_min)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
