//! 2010 ADA Standards clauses cited by the analyzers

use serde::Serialize;

const STANDARDS_URL: &str = "https://www.ada.gov/law-and-regs/design-standards/2010-stds/";

/// One standards clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdaCode {
    pub code: &'static str,
    pub title: &'static str,
    pub requirement: &'static str,
    pub measurement: &'static str,
    pub section: &'static str,
    /// Anchor within the standards document
    pub anchor: &'static str,
}

impl AdaCode {
    pub fn url(&self) -> String {
        format!("{}#{}", STANDARDS_URL, self.anchor)
    }
}

static ADA_CODES: &[AdaCode] = &[
    // Doors, doorways, and gates
    AdaCode {
        code: "404.2.3",
        title: "Clear Width",
        requirement: "Door openings shall provide a clear width of 32 inches (815 mm) minimum",
        measurement: "32 inches minimum",
        section: "404.2.3 - Doors, Doorways, and Gates",
        anchor: "section-404",
    },
    AdaCode {
        code: "404.2.5",
        title: "Thresholds",
        requirement: "Thresholds, if provided at doorways, shall be 1/2 inch (13 mm) high maximum",
        measurement: "0.5 inches maximum",
        section: "404.2.5 - Doors, Doorways, and Gates",
        anchor: "section-404",
    },
    AdaCode {
        code: "404.2.7",
        title: "Door Hardware",
        requirement: "Handles, pulls, latches, locks, and other operable parts shall be operable with one hand and shall not require tight grasping, pinching, or twisting of the wrist",
        measurement: "Operable with closed fist",
        section: "404.2.7 - Doors, Doorways, and Gates",
        anchor: "section-404",
    },
    // Parking spaces
    AdaCode {
        code: "502.2",
        title: "Vehicle Spaces",
        requirement: "Car parking spaces shall be 96 inches (2440 mm) wide minimum",
        measurement: "96 inches (8 feet) minimum width",
        section: "502.2 - Parking Spaces",
        anchor: "section-502",
    },
    AdaCode {
        code: "502.3",
        title: "Access Aisle",
        requirement: "Access aisles serving parking spaces shall be 60 inches (1525 mm) wide minimum",
        measurement: "60 inches (5 feet) minimum width",
        section: "502.3 - Parking Spaces",
        anchor: "section-502",
    },
    AdaCode {
        code: "502.4",
        title: "Floor and Ground Surfaces",
        requirement: "Parking spaces and access aisles shall comply with Section 302 (stable, firm, and slip resistant)",
        measurement: "Level surface, max slope 1:48",
        section: "502.4 - Parking Spaces",
        anchor: "section-502",
    },
    AdaCode {
        code: "502.6",
        title: "Identification (Signage)",
        requirement: "Parking space identification signs shall include the International Symbol of Accessibility and shall be 60 inches (1525 mm) minimum above the finish floor or ground surface",
        measurement: "Sign at 60 inches minimum height",
        section: "502.6 - Parking Spaces",
        anchor: "section-502",
    },
    // Accessible routes
    AdaCode {
        code: "403.5.1",
        title: "Clear Width",
        requirement: "The clear width of walking surfaces shall be 36 inches (915 mm) minimum",
        measurement: "36 inches minimum continuous width",
        section: "403.5.1 - Walking Surfaces",
        anchor: "section-403",
    },
    AdaCode {
        code: "307",
        title: "Protruding Objects",
        requirement: "Objects with leading edges more than 27 inches and not more than 80 inches above the floor shall protrude 4 inches maximum into the circulation path",
        measurement: "4 inches maximum protrusion",
        section: "307 - Protruding Objects",
        anchor: "section-307",
    },
    AdaCode {
        code: "302",
        title: "Floor or Ground Surfaces",
        requirement: "Floor and ground surfaces shall be stable, firm, and slip resistant",
        measurement: "Stable, firm, slip-resistant",
        section: "302 - Floor or Ground Surfaces",
        anchor: "section-302",
    },
    AdaCode {
        code: "303",
        title: "Changes in Level",
        requirement: "Changes in level up to 1/4 inch may be vertical. Changes between 1/4 inch and 1/2 inch shall be beveled",
        measurement: "0.25 inch max vertical, 0.5 inch max with bevel",
        section: "303 - Changes in Level",
        anchor: "section-303",
    },
    // Ramps
    AdaCode {
        code: "405.2",
        title: "Slope",
        requirement: "Ramp runs shall have a running slope not steeper than 1:12",
        measurement: "1:12 ratio maximum (8.33%)",
        section: "405.2 - Ramps",
        anchor: "section-405",
    },
    AdaCode {
        code: "405.5",
        title: "Clear Width",
        requirement: "The clear width of a ramp run shall be 36 inches (915 mm) minimum",
        measurement: "36 inches minimum",
        section: "405.5 - Ramps",
        anchor: "section-405",
    },
    AdaCode {
        code: "405.7",
        title: "Landings",
        requirement: "Ramps shall have landings at the top and bottom of each ramp run. Landings shall be 60 inches minimum in length",
        measurement: "60 inches minimum landing length",
        section: "405.7 - Ramps",
        anchor: "section-405",
    },
    AdaCode {
        code: "405.8",
        title: "Handrails",
        requirement: "Ramp runs with a rise greater than 6 inches shall have handrails complying with Section 505",
        measurement: "Required if rise > 6 inches",
        section: "405.8 - Ramps",
        anchor: "section-405",
    },
    AdaCode {
        code: "405.9",
        title: "Edge Protection",
        requirement: "Edge protection shall be provided on each side of ramp runs and at each side of ramp landings",
        measurement: "Curb or barrier required",
        section: "405.9 - Ramps",
        anchor: "section-405",
    },
    // Signs
    AdaCode {
        code: "703.2",
        title: "Raised Characters",
        requirement: "Raised characters shall be 5/8 inch (16 mm) minimum in height and 2 inches (51 mm) maximum in height",
        measurement: "0.625 - 2 inches height",
        section: "703.2 - Signs",
        anchor: "section-703",
    },
    AdaCode {
        code: "703.4",
        title: "Installation Height",
        requirement: "Signs shall be located 48 inches minimum above the finish floor measured to the baseline of the lowest character",
        measurement: "48-60 inches above floor",
        section: "703.4 - Signs",
        anchor: "section-703",
    },
    AdaCode {
        code: "703.5",
        title: "Visual Characters",
        requirement: "Characters and their background shall have a non-glare finish and contrast with light characters on dark background or vice versa",
        measurement: "High contrast required",
        section: "703.5 - Signs",
        anchor: "section-703",
    },
];

/// Look up a clause by its code, e.g. "404.2.3"
pub fn lookup(code: &str) -> Option<&'static AdaCode> {
    let code = code.trim();
    ADA_CODES.iter().find(|c| c.code == code)
}

pub fn all_codes() -> &'static [AdaCode] {
    ADA_CODES
}

/// Case-insensitive search over title, requirement and section
pub fn search(keyword: &str) -> Vec<&'static AdaCode> {
    let keyword = keyword.trim().to_lowercase();
    if keyword.is_empty() {
        return ADA_CODES.iter().collect();
    }
    ADA_CODES
        .iter()
        .filter(|c| {
            c.title.to_lowercase().contains(&keyword)
                || c.requirement.to_lowercase().contains(&keyword)
                || c.section.to_lowercase().contains(&keyword)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let door = lookup("404.2.3").unwrap();
        assert_eq!(door.title, "Clear Width");
        assert!(door.url().ends_with("#section-404"));
        assert!(lookup(" 405.8 ").is_some());
        assert!(lookup("N/A").is_none());
    }

    #[test]
    fn test_search_parking() {
        let codes: Vec<&str> = search("Parking").iter().map(|c| c.code).collect();
        assert!(codes.contains(&"502.2"));
        assert!(codes.contains(&"502.6"));
        assert!(!codes.contains(&"404.2.3"));
    }

    #[test]
    fn test_codes_are_unique() {
        let mut codes: Vec<&str> = all_codes().iter().map(|c| c.code).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), all_codes().len());
    }
}
