use serde::{Deserialize, Serialize};

/// Cause area an opportunity belongs to. Serialized with the display labels the
/// front-end uses, so `Arts` travels as `"Arts & Culture"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Environment,
    Education,
    Health,
    #[serde(rename = "Animal Welfare")]
    AnimalWelfare,
    Community,
    #[serde(rename = "Arts & Culture")]
    Arts,
    #[serde(rename = "Crisis Relief")]
    CrisisRelief,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Environment,
        Category::Education,
        Category::Health,
        Category::AnimalWelfare,
        Category::Community,
        Category::Arts,
        Category::CrisisRelief,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Environment => "Environment",
            Category::Education => "Education",
            Category::Health => "Health",
            Category::AnimalWelfare => "Animal Welfare",
            Category::Community => "Community",
            Category::Arts => "Arts & Culture",
            Category::CrisisRelief => "Crisis Relief",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Availability {
    Weekdays,
    Weekends,
    Evenings,
    Flexible,
}

impl Availability {
    pub fn label(self) -> &'static str {
        match self {
            Availability::Weekdays => "Weekdays",
            Availability::Weekends => "Weekends",
            Availability::Evenings => "Evenings",
            Availability::Flexible => "Flexible",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    /// Avatar image URL.
    pub avatar: String,
    pub description: String,
}

/// A single volunteer listing. Field names follow the camelCase wire format of
/// the catalog files and the front-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub id: String,
    pub title: String,
    pub organization: Organization,
    pub category: Category,
    pub location: String,
    pub date: String,
    pub availability: Availability,
    pub description: String,
    pub skills: Vec<String>,
    pub image_url: String,
    pub spots_total: u32,
    pub spots_filled: u32,
}

impl Opportunity {
    pub fn has_valid_capacity(&self) -> bool {
        self.spots_filled <= self.spots_total
    }

    pub fn spots_remaining(&self) -> u32 {
        self.spots_total.saturating_sub(self.spots_filled)
    }

    pub fn is_full(&self) -> bool {
        self.spots_filled >= self.spots_total
    }

    /// Filled share of capacity in `0.0..=1.0`. Zero-capacity listings report 0.
    pub fn fill_ratio(&self) -> f64 {
        if self.spots_total == 0 {
            return 0.0;
        }
        (self.spots_filled as f64 / self.spots_total as f64).clamp(0.0, 1.0)
    }
}
