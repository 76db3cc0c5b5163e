//! Catalog: the in-memory, read-only set of opportunities for a session.
//!
//! Loaded once at startup, either from a JSON file or from the built-in seed
//! listings. Loading validates ids and capacity so every opportunity handed to
//! the display layer satisfies `spots_filled <= spots_total`.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::models::opportunity::{Availability, Category, Opportunity, Organization};
use crate::models::profile::UserProfile;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Duplicate opportunity id '{0}'")]
    DuplicateId(String),

    #[error("Opportunity '{id}' has {filled} spots filled but only {total} in total")]
    CapacityExceeded { id: String, filled: u32, total: u32 },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    opportunities: Vec<Opportunity>,
    /// id → position in `opportunities`
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Builds a catalog, rejecting duplicate ids and over-filled listings.
    pub fn new(opportunities: Vec<Opportunity>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(opportunities.len());
        for (position, opp) in opportunities.iter().enumerate() {
            if index.insert(opp.id.clone(), position).is_some() {
                return Err(CatalogError::DuplicateId(opp.id.clone()));
            }
            if !opp.has_valid_capacity() {
                return Err(CatalogError::CapacityExceeded {
                    id: opp.id.clone(),
                    filled: opp.spots_filled,
                    total: opp.spots_total,
                });
            }
        }
        Ok(Self {
            opportunities,
            index,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let opportunities: Vec<Opportunity> = serde_json::from_str(json)?;
        Self::new(opportunities)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let json = read_file(path)?;
        let catalog = Self::from_json(&json)?;
        info!(path = %path.display(), count = catalog.len(), "Catalog loaded from file");
        Ok(catalog)
    }

    /// Opportunities in catalog order. This order is the tie-break for every
    /// display sort.
    pub fn opportunities(&self) -> &[Opportunity] {
        &self.opportunities
    }

    pub fn get(&self, id: &str) -> Option<&Opportunity> {
        self.index.get(id).map(|&position| &self.opportunities[position])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.opportunities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opportunities.is_empty()
    }
}

pub fn load_profile(path: &Path) -> Result<UserProfile, CatalogError> {
    let json = read_file(path)?;
    let profile = serde_json::from_str(&json)?;
    info!(path = %path.display(), "Profile loaded from file");
    Ok(profile)
}

fn read_file(path: &Path) -> Result<String, CatalogError> {
    std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.display().to_string(),
        source,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Seed data
// ────────────────────────────────────────────────────────────────────────────

pub fn seed_profile() -> UserProfile {
    UserProfile {
        name: "Nyasha Moyo".to_string(),
        interests: vec![Category::Environment, Category::Community, Category::Education],
        availability: vec![Availability::Weekends, Availability::Flexible],
        skills: strings(&["Shona", "English", "Community Organizing", "Agriculture"]),
        bio: "Passionate about sustainable development in Zimbabwe. I grew up in Mutare and \
              now live in Harare. I want to use my weekends to support local conservation \
              efforts and youth education."
            .to_string(),
    }
}

pub fn seed_catalog() -> Catalog {
    let opportunities = seed_opportunities();
    let index = opportunities
        .iter()
        .enumerate()
        .map(|(position, opp)| (opp.id.clone(), position))
        .collect();
    Catalog {
        opportunities,
        index,
    }
}

fn seed_opportunities() -> Vec<Opportunity> {
    vec![
        Opportunity {
            id: "1".to_string(),
            title: "Mukuvisi Woodlands Conservation".to_string(),
            organization: org(
                "org1",
                "Harare Greening Project",
                "https://picsum.photos/id/10/100/100",
                "Preserving our indigenous woodlands in the heart of the city.",
            ),
            category: Category::Environment,
            location: "Mukuvisi Woodlands, Harare".to_string(),
            date: "Every Saturday, 8 AM - 11 AM".to_string(),
            availability: Availability::Weekends,
            description: "Join us for invasive species removal and trail maintenance. Help \
                          protect one of Harare's most vital green lungs and wildlife \
                          sanctuaries. Tools and refreshments provided."
                .to_string(),
            skills: strings(&["Physical Labor", "Conservation", "Teamwork"]),
            image_url: "https://picsum.photos/id/116/800/600".to_string(),
            spots_total: 25,
            spots_filled: 12,
        },
        Opportunity {
            id: "2".to_string(),
            title: "O-Level Math Tutor".to_string(),
            organization: org(
                "org2",
                "Educate Zimbabwe",
                "https://picsum.photos/id/20/100/100",
                "Empowering rural and urban youth through academic support.",
            ),
            category: Category::Education,
            location: "Highfield Library, Harare".to_string(),
            date: "Tuesdays & Thursdays, 3 PM - 5 PM".to_string(),
            availability: Availability::Weekdays,
            description: "Tutor Form 3 and 4 students preparing for their ZIMSEC exams. We \
                          urgently need help with Mathematics and Science subjects to boost \
                          pass rates."
                .to_string(),
            skills: strings(&["Mathematics", "Science", "Teaching", "Shona (Optional)"]),
            image_url: "https://picsum.photos/id/367/800/600".to_string(),
            spots_total: 10,
            spots_filled: 3,
        },
        Opportunity {
            id: "3".to_string(),
            title: "Community Garden Coordinator".to_string(),
            organization: org(
                "org3",
                "Bulawayo Food Security Network",
                "https://picsum.photos/id/75/100/100",
                "Fighting hunger through sustainable urban farming.",
            ),
            category: Category::Community,
            location: "Nkulumane, Bulawayo".to_string(),
            date: "Sundays, 9 AM - 1 PM".to_string(),
            availability: Availability::Weekends,
            description: "Assist in managing a community nutritional garden. Teach locals \
                          about drought-resistant crops (maize, sorghum) and drip irrigation \
                          techniques."
                .to_string(),
            skills: strings(&["Agriculture", "Leadership", "Ndebele (Preferred)"]),
            image_url: "https://picsum.photos/id/292/800/600".to_string(),
            spots_total: 8,
            spots_filled: 6,
        },
        Opportunity {
            id: "4".to_string(),
            title: "Zambezi River Cleanup".to_string(),
            organization: org(
                "org4",
                "Save the Zambezi",
                "https://picsum.photos/id/400/100/100",
                "Protecting our vital water sources and wildlife.",
            ),
            category: Category::Environment,
            location: "Victoria Falls River Bank".to_string(),
            date: "Monthly (Next: Oct 15th)".to_string(),
            availability: Availability::Weekends,
            description: "Help remove plastic waste from the banks of the Zambezi River to \
                          protect elephants, hippos, and birdlife. Transport provided from \
                          Victoria Falls town center."
                .to_string(),
            skills: strings(&["Environmental Awareness", "Swimming (Basic)", "Fitness"]),
            image_url: "https://picsum.photos/id/972/800/600".to_string(),
            spots_total: 40,
            spots_filled: 15,
        },
        Opportunity {
            id: "5".to_string(),
            title: "Gogo & Sekuru Support Visit".to_string(),
            organization: org(
                "org5",
                "Ubuntu Senior Care",
                "https://picsum.photos/id/500/100/100",
                "Bringing companionship to our elders.",
            ),
            category: Category::Health,
            location: "Chitungwiza".to_string(),
            date: "Flexible (2 hours/week)".to_string(),
            availability: Availability::Flexible,
            description: "Spend time with the elderly at the local care home. Share stories, \
                          read newspapers, or help with small errands. Embracing the spirit \
                          of Ubuntu."
                .to_string(),
            skills: strings(&["Listening", "Empathy", "Respect"]),
            image_url: "https://picsum.photos/id/838/800/600".to_string(),
            spots_total: 15,
            spots_filled: 5,
        },
        Opportunity {
            id: "6".to_string(),
            title: "Anti-Poaching Data Analyst".to_string(),
            organization: org(
                "org6",
                "Wildlife Guardians Africa",
                "https://picsum.photos/id/600/100/100",
                "Using technology to save our rhinos and elephants.",
            ),
            category: Category::AnimalWelfare,
            location: "Remote / Hybrid (Harare)".to_string(),
            date: "Flexible".to_string(),
            availability: Availability::Flexible,
            description: "Help us analyze patrol data from Mana Pools and Hwange National \
                          Park. Look for patterns to assist rangers in deploying resources \
                          effectively."
                .to_string(),
            skills: strings(&["Data Analysis", "Computer Literacy", "Conservation Interest"]),
            image_url: "https://picsum.photos/id/164/800/600".to_string(),
            spots_total: 3,
            spots_filled: 1,
        },
        Opportunity {
            id: "7".to_string(),
            title: "Shona Sculpture Workshop Assistant".to_string(),
            organization: org(
                "org7",
                "Domboshava Arts Centre",
                "https://picsum.photos/id/700/100/100",
                "Promoting Zimbabwean heritage through stone.",
            ),
            category: Category::Arts,
            location: "Domboshava".to_string(),
            date: "Saturdays, 10 AM - 3 PM".to_string(),
            availability: Availability::Weekends,
            description: "Assist master sculptors during tourist workshops. Help manage tools, \
                          welcome guests, and explain the history of Shona stone sculpture."
                .to_string(),
            skills: strings(&["Artistic", "Hospitality", "Cultural Knowledge"]),
            image_url: "https://picsum.photos/id/703/800/600".to_string(),
            spots_total: 5,
            spots_filled: 2,
        },
    ]
}

fn org(id: &str, name: &str, avatar: &str, description: &str) -> Organization {
    Organization {
        id: id.to_string(),
        name: name.to_string(),
        avatar: avatar.to_string(),
        description: description.to_string(),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
