//! Instruction text sent to the image model.

use std::fmt;
use std::str::FromStr;

use crate::error::TryOnError;

/// Default instruction for the initial try-on.
pub const STYLING_INSTRUCTION: &str = "\
You are a fashion-focused AI stylist. Your task is to generate a realistic virtual try-on preview.
The user has provided two images:
1. A photo of themselves (standing, facing camera, natural pose).
2. An outfit image (shirt, dress, jacket, pants, etc.).

Your goal is to overlay and blend the outfit seamlessly onto the user's body while adhering to these strict rules:
- **Preserve Identity:** Keep the user's natural skin tone, body shape, and facial details perfectly intact. Do not alter the person.
- **Accurate Fit:** Realistically adjust the outfit's scaling, folds, draping, and perspective to match the user's pose.
- **Photorealism:** Add natural shadows, lighting, and textures to make it look like the outfit is genuinely worn.
- **High-Quality Output:** The final image must be high-resolution and suitable for fashion e-commerce. It must look stylish, natural, and confidence-boosting, not like a photoshop edit.
";

/// Constraints appended to every free-text edit.
pub const IDENTITY_CLAUSE: &str = "- You MUST preserve the person's identity (face, body shape, skin tone).";

/// Suggested edit offered by `--accessorize`.
pub const ACCESSORIES_SUGGESTION: &str = "Add a stylish necklace and sunglasses";

/// Preset backgrounds offered instead of free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    /// Plain studio backdrop.
    WhiteStudio,
    /// Blurred street scene.
    CityStreet,
    /// Fashion show runway.
    Runway,
}

impl Background {
    /// All presets, in display order.
    pub const ALL: [Self; 3] = [Self::WhiteStudio, Self::CityStreet, Self::Runway];

    /// Human-readable preset name.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::WhiteStudio => "White Studio",
            Self::CityStreet => "City Street",
            Self::Runway => "Runway",
        }
    }

    /// Scene description used in the instruction.
    #[must_use]
    pub fn scene(self) -> &'static str {
        match self {
            Self::WhiteStudio => "a clean, minimalist white studio background with soft lighting.",
            Self::CityStreet => {
                "a stylish, slightly blurred city street scene, making it look like a fashion photoshoot."
            }
            Self::Runway => "a fashion show runway with dramatic lighting.",
        }
    }
}

impl fmt::Display for Background {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accepts the label (`White Studio`) or kebab/snake case (`white-studio`),
/// case-insensitively.
impl FromStr for Background {
    type Err = TryOnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = kebab(s.trim());
        Self::ALL
            .into_iter()
            .find(|bg| kebab(bg.label()) == key)
            .ok_or_else(|| TryOnError::UnknownBackground(s.to_string()))
    }
}

fn kebab(s: &str) -> String {
    s.chars().map(|c| if c == ' ' || c == '_' { '-' } else { c.to_ascii_lowercase() }).collect()
}

/// A change requested against an already generated image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refinement {
    /// Free-text edit.
    Edit(String),
    /// Swap the background for a preset scene.
    Background(Background),
}

impl Refinement {
    /// Build the instruction for this refinement.
    #[must_use]
    pub fn instruction(&self) -> String {
        match self {
            Self::Edit(text) => edit_instruction(text),
            Self::Background(bg) => background_instruction(*bg),
        }
    }

    /// Short description for logs and output file names.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Edit(text) => text.clone(),
            Self::Background(bg) => format!("{bg} background"),
        }
    }
}

/// Instruction applying a free-text edit while keeping the person intact.
#[must_use]
pub fn edit_instruction(text: &str) -> String {
    format!(
        "Based on the provided image of a person wearing an outfit, apply the following textual edit: \"{text}\".
{IDENTITY_CLAUSE}
- Only modify what is requested in the edit.
- The final image must be photorealistic and high-quality."
    )
}

/// Instruction replacing only the background with a preset scene.
#[must_use]
pub fn background_instruction(background: Background) -> String {
    format!(
        "Keep the person and their outfit exactly the same, but change the background to {}",
        background.scene()
    )
}
