//! Static Preferred Lab Network vendor and location data.
//!
//! Served to the presentation layer for the selection screens. The
//! table is static in this core; a live location service is a host
//! concern.

use serde::Serialize;

/// A participating lab vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Provider {
    Quest,
    LabCorp,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quest => "Quest",
            Self::LabCorp => "LabCorp",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Quest" => Some(Self::Quest),
            "LabCorp" => Some(Self::LabCorp),
            _ => None,
        }
    }

    /// Vendors offered on the selection screen, in display order.
    pub fn all() -> &'static [Provider] {
        &[Self::Quest, Self::LabCorp]
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A lab draw site in the network.
#[derive(Debug, Clone, Serialize)]
pub struct LabLocation {
    pub id: &'static str,
    pub provider: Provider,
    pub name: &'static str,
    pub address: &'static str,
    pub city: &'static str,
    pub state: &'static str,
    pub zip: &'static str,
    pub phone: &'static str,
    pub next_available: &'static str,
    pub estimated_cost: &'static str,
    pub distance: &'static str,
}

pub const LAB_LOCATIONS: &[LabLocation] = &[
    LabLocation {
        id: "1",
        provider: Provider::Quest,
        name: "Quest Diagnostics",
        address: "424 E 12300 S",
        city: "Draper",
        state: "UT",
        zip: "84020",
        phone: "(801) 631-5470",
        next_available: "Tomorrow at 8:45 AM",
        estimated_cost: "$40-60",
        distance: "6.6 miles",
    },
    LabLocation {
        id: "2",
        provider: Provider::Quest,
        name: "Quest Diagnostics",
        address: "348 E 4500 S, Suite 210",
        city: "Murray",
        state: "UT",
        zip: "84107",
        phone: "(801) 573-2740",
        next_available: "Tomorrow at 11:45 AM",
        estimated_cost: "$40-60",
        distance: "6.9 miles",
    },
    LabLocation {
        id: "3",
        provider: Provider::LabCorp,
        name: "LabCorp",
        address: "74 E Kimballs Ln, Suite 250",
        city: "Draper",
        state: "UT",
        zip: "84020",
        phone: "(801) 523-5044",
        next_available: "Tomorrow at 10:30 AM",
        estimated_cost: "$45-65",
        distance: "7 miles",
    },
    LabLocation {
        id: "4",
        provider: Provider::LabCorp,
        name: "Labcorp",
        address: "12176 S 1000 E",
        city: "Draper",
        state: "UT",
        zip: "84020",
        phone: "(801) 495-9514",
        next_available: "Today at 2:15 PM",
        estimated_cost: "$55-75",
        distance: "8 miles",
    },
    LabLocation {
        id: "5",
        provider: Provider::Quest,
        name: "Quest Diagnostics",
        address: "1250 E 3900 S, Bldg B Suite 50A",
        city: "Salt Lake City",
        state: "UT",
        zip: "84124",
        phone: "(801) 264-9675",
        next_available: "Tomorrow at 8:45 AM",
        estimated_cost: "$40-60",
        distance: "9 miles",
    },
];

/// Locations for one vendor, in table order.
pub fn by_provider(provider: Provider) -> Vec<&'static LabLocation> {
    LAB_LOCATIONS
        .iter()
        .filter(|l| l.provider == provider)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_location_has_an_id_and_phone() {
        for location in LAB_LOCATIONS {
            assert!(!location.id.is_empty());
            assert!(location.phone.starts_with('('));
        }
    }

    #[test]
    fn ids_are_unique() {
        let mut ids: Vec<_> = LAB_LOCATIONS.iter().map(|l| l.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), LAB_LOCATIONS.len());
    }

    #[test]
    fn by_provider_partitions_the_table() {
        let quest = by_provider(Provider::Quest);
        let labcorp = by_provider(Provider::LabCorp);
        assert_eq!(quest.len() + labcorp.len(), LAB_LOCATIONS.len());
        assert!(quest.iter().all(|l| l.provider == Provider::Quest));
    }

    #[test]
    fn provider_names_round_trip() {
        for provider in Provider::all() {
            assert_eq!(Provider::from_name(provider.as_str()), Some(*provider));
        }
        assert_eq!(Provider::from_name("Acme"), None);
    }
}
