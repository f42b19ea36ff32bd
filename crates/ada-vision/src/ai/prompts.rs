//! Instruction templates for the model-backed analyzer
//!
//! Every template asks for the same JSON shape:
//! `{"violations": [...], "overall_assessment": str, "notes": str}`
//! so one parser handles all categories.

use crate::router::{normalize_label, Category};

// ============================================================================
// Shared preamble
// ============================================================================

pub const SYSTEM_PROMPT: &str = "You are an ADA (Americans with Disabilities Act) compliance expert \
specializing in accessibility auditing for retail spaces. You analyze images to identify \
potential accessibility violations based on ADA standards.

Your analysis should be:
- Specific: Reference exact ADA codes when possible
- Practical: Focus on visually detectable issues
- Cautious: Note when precise measurements cannot be determined from images alone
- Helpful: Provide actionable recommendations

Remember: Visual analysis has limitations. Always recommend professional verification \
for critical measurements.";

const RESPONSE_FORMAT: &str = r#"Provide your response in JSON format:
{
    "violations": [
        {
            "type": "<TYPES>",
            "severity": "Critical" | "Moderate" | "Minor",
            "ada_code": "section number",
            "description": "brief description of the issue",
            "recommendation": "how to fix it",
            "confidence": 0.0 to 1.0
        }
    ],
    "overall_assessment": "brief summary",
    "notes": "any limitations or caveats about the analysis"
}"#;

// ============================================================================
// Category templates
// ============================================================================

const DOORWAY_CHECKS: &str = "Analyze this doorway/entrance for ADA compliance.

Check for these potential violations:

1. **Door Width**: Does the opening appear to be at least 32 inches clear width?
   - ADA Code: 404.2.3
   - Note: Cannot measure exactly from photo, but assess if it appears narrow

2. **Threshold**: Is there a visible threshold or step?
   - ADA Code: 404.2.5
   - Maximum allowed: 0.5 inches (1/2 inch)

3. **Door Hardware**: Can you see the door handle/hardware?
   - ADA Code: 404.2.7
   - Should be operable with one hand without tight grasping

4. **Approach Clearance**: Is there adequate space to approach and open the door?
   - ADA Code: 404.2.4";

const PARKING_CHECKS: &str = "Analyze this parking area for ADA compliance.

Check for these potential violations:

1. **Accessible Parking Signage**: Are there signs with the International Symbol of Accessibility?
   - ADA Code: 502.6
   - Required: Sign at each accessible space, minimum 60 inches above ground

2. **Parking Space Dimensions**: Do the spaces appear adequately sized?
   - ADA Code: 502.2
   - Standard: 96 inches (8 feet) wide minimum
   - Van-accessible: 132 inches (11 feet) wide

3. **Access Aisle**: Is there a marked access aisle adjacent to the space?
   - ADA Code: 502.3
   - Minimum width: 60 inches (5 feet)

4. **Surface Condition**: Does the surface appear level and well-maintained?
   - ADA Code: 502.4
   - Maximum slope: 1:48 (2%)

5. **Location**: Is the accessible parking close to the accessible entrance?
   - ADA Code: 502.7";

const PATHWAY_CHECKS: &str = "Analyze this pathway/aisle for ADA compliance.

Check for these potential violations:

1. **Pathway Width**: Does the clear path appear to be at least 36 inches wide?
   - ADA Code: 403.5.1
   - Minimum: 36 inches continuous clear width

2. **Obstructions**: Are there any objects blocking or narrowing the path?
   - ADA Code: 307
   - Examples: displays, carts, merchandise, furniture

3. **Surface Condition**: Does the floor appear level and well-maintained?
   - ADA Code: 302
   - Should be stable, firm, and slip-resistant

4. **Protruding Objects**: Are there any objects protruding into the pathway?
   - ADA Code: 307.2
   - Objects can't protrude more than 4 inches if below 27 inches high

5. **Changes in Level**: Are there any visible steps, curbs, or level changes?
   - ADA Code: 303
   - Maximum: 0.5 inches, must be beveled if 0.25-0.5 inches";

const RAMP_CHECKS: &str = "Analyze this ramp for ADA compliance.

Check for these potential violations:

1. **Ramp Slope**: Does the ramp appear to have a gentle slope?
   - ADA Code: 405.2
   - Maximum: 1:12 ratio (8.33% grade, or 1 inch rise per 12 inches run)

2. **Width**: Does the ramp appear to be at least 36 inches wide?
   - ADA Code: 405.5
   - Minimum clear width: 36 inches

3. **Handrails**: Are there handrails on both sides?
   - ADA Code: 405.8
   - Required if rise is greater than 6 inches
   - Should be 34-38 inches above ramp surface

4. **Edge Protection**: Is there edge protection (curb or barrier)?
   - ADA Code: 405.9

5. **Landings**: Are there level landings at top and bottom?
   - ADA Code: 405.7
   - Minimum: 60 inches long";

const SIGNAGE_CHECKS: &str = "Analyze this signage for ADA compliance.

Check for these potential violations:

1. **Braille**: Is there visible braille below the text?
   - ADA Code: 703.2
   - Required for permanent room/space identification signs

2. **Character Height**: Are the characters appropriately sized?
   - ADA Code: 703.2
   - Raised characters: 5/8 to 2 inches high

3. **Mounting Height**: Can you assess if the sign appears at proper height?
   - ADA Code: 703.4
   - Should be 48-60 inches above floor (to baseline of lowest character)

4. **Color Contrast**: Is there adequate contrast between text and background?
   - ADA Code: 703.5

5. **Finish**: Does the sign appear to have a non-glare finish?
   - ADA Code: 703.5";

const GENERAL_CHECKS: &str = "Analyze this image for general ADA accessibility concerns.

Look for:

1. **Obstructions**: Objects blocking pathways or access
2. **Hazards**: Trip hazards, protruding objects, unstable items
3. **Reach Ranges**: Items placed too high or low for wheelchair users
   - Forward reach: 15-48 inches
   - Side reach: 9-54 inches (unobstructed)
4. **Clear Floor Space**: Adequate maneuvering space (30x48 inches minimum)
5. **Surface Conditions**: Level floors, slip resistance";

/// Labels that get the pathway template instead of the general one
const PATHWAY_LABELS: &[&str] = &["person", "chair", "couch", "bench", "potted_plant"];

/// Which instruction template a detection gets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Doorway,
    Parking,
    Pathway,
    Ramp,
    Signage,
    General,
}

impl PromptKind {
    pub fn for_label(label: &str) -> Self {
        match Category::from_label(label) {
            Category::Door => PromptKind::Doorway,
            Category::Parking => PromptKind::Parking,
            Category::Ramp => PromptKind::Ramp,
            Category::Signage => PromptKind::Signage,
            Category::Other => {
                let label = normalize_label(label);
                if PATHWAY_LABELS.contains(&label.as_str()) {
                    PromptKind::Pathway
                } else {
                    PromptKind::General
                }
            }
        }
    }

    fn checks(&self) -> &'static str {
        match self {
            PromptKind::Doorway => DOORWAY_CHECKS,
            PromptKind::Parking => PARKING_CHECKS,
            PromptKind::Pathway => PATHWAY_CHECKS,
            PromptKind::Ramp => RAMP_CHECKS,
            PromptKind::Signage => SIGNAGE_CHECKS,
            PromptKind::General => GENERAL_CHECKS,
        }
    }

    fn violation_types(&self) -> &'static str {
        match self {
            PromptKind::Doorway => "Door Width | Threshold | Hardware | Clearance",
            PromptKind::Parking => "Signage | Dimensions | Access Aisle | Surface | Location",
            PromptKind::Pathway => "Width | Obstruction | Surface | Protrusion | Level Change",
            PromptKind::Ramp => "Slope | Width | Handrails | Edge Protection | Landings",
            PromptKind::Signage => "Braille | Character Height | Mounting Height | Contrast | Finish",
            PromptKind::General => "descriptive type",
        }
    }
}

/// Category instructions plus the response format
pub fn build_category_prompt(kind: PromptKind) -> String {
    let mut prompt = String::from(kind.checks());
    prompt.push_str("\n\n");
    prompt.push_str(&RESPONSE_FORMAT.replace("<TYPES>", kind.violation_types()));
    prompt.push_str(
        "\n\nIf the relevant features are not visible, say so in the notes and use lower confidence scores. \
If no accessibility concerns are visible, return an empty violations array.",
    );
    prompt
}

/// Full prompt sent to the model for one detection
pub fn build_detection_prompt(label: &str) -> String {
    format!(
        "{}\n\n{}",
        SYSTEM_PROMPT,
        build_category_prompt(PromptKind::for_label(label))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_selection() {
        assert_eq!(PromptKind::for_label("Entrance"), PromptKind::Doorway);
        assert_eq!(PromptKind::for_label("truck"), PromptKind::Parking);
        assert_eq!(PromptKind::for_label("potted plant"), PromptKind::Pathway);
        assert_eq!(PromptKind::for_label("stop_sign"), PromptKind::Signage);
        assert_eq!(PromptKind::for_label("stairs"), PromptKind::Ramp);
        assert_eq!(PromptKind::for_label("umbrella"), PromptKind::General);
    }

    #[test]
    fn test_prompt_contents() {
        let prompt = build_detection_prompt("door");
        assert!(prompt.starts_with(SYSTEM_PROMPT));
        assert!(prompt.contains("404.2.3"));
        assert!(prompt.contains("\"overall_assessment\""));
        assert!(prompt.contains("Door Width | Threshold"));
        assert!(!prompt.contains("<TYPES>"));
    }
}
