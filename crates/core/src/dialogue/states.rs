use serde::{Deserialize, Serialize};

/// Required preferences, in the order they are asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    FamilySize,
    FuelType,
    CarType,
    Budget,
}

impl Slot {
    pub const ORDER: [Slot; 4] = [Slot::FamilySize, Slot::FuelType, Slot::CarType, Slot::Budget];

    pub fn prompt(&self) -> &'static str {
        match self {
            Self::FamilySize => {
                "May I know how many members are in your family or who will usually be traveling in the car?"
            }
            Self::FuelType => "Do you have a preference for fuel type: Petrol, Diesel, CNG, or Electric?",
            Self::CarType => "What kind of car do you want: hatchback, sedan, SUV, or MPV?",
            Self::Budget => "And what's your approximate budget for the car?",
        }
    }

    pub fn stage(&self) -> DialogueStage {
        match self {
            Self::FamilySize => DialogueStage::CollectingFamilySize,
            Self::FuelType => DialogueStage::CollectingFuel,
            Self::CarType => DialogueStage::CollectingCarType,
            Self::Budget => DialogueStage::CollectingBudget,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogueStage {
    CollectingFamilySize,
    CollectingFuel,
    CollectingCarType,
    CollectingBudget,
    Ready,
}

/// A value the merge boundary refused, with the reason.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MergeConflict {
    BudgetRange { min: i64, max: i64 },
    MileageRange { min: f64, max: f64 },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeOutcome {
    pub filled: Vec<Slot>,
    pub conflicts: Vec<MergeConflict>,
}

impl MergeOutcome {
    pub fn filled_any(&self) -> bool {
        !self.filled.is_empty()
    }
}
