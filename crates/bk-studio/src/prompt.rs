use serde::{Deserialize, Serialize};

/// What the user asked for.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The post text the image should illustrate.
    pub post: String,
    /// Optional free-form instructions that override everything else.
    #[serde(default)]
    pub custom_instructions: Option<String>,
}

impl GenerationRequest {
    pub fn new(post: impl Into<String>) -> Self {
        Self {
            post: post.into(),
            custom_instructions: None,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.custom_instructions = Some(instructions.into());
        self
    }

    /// Custom instructions, if present and not blank.
    pub fn instructions(&self) -> Option<&str> {
        self.custom_instructions
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

const REFERENCE_CLAUSE: &str = "Take the visual style from the attached reference images. \
Where this description and the references disagree, follow the references.";

const INSTRUCTION_PREFIX: &str = "Top priority, overriding everything above:";

/// Builds the final prompt sent to the image generator.
pub struct PromptComposer;

impl PromptComposer {
    /// Base prompt, then a reference-style clause when references are
    /// attached, then the user's instructions when present.
    pub fn compose(base: &str, has_references: bool, instructions: Option<&str>) -> String {
        let mut prompt = base.trim().to_string();
        if has_references {
            prompt.push(' ');
            prompt.push_str(REFERENCE_CLAUSE);
        }
        if let Some(instructions) = instructions.map(str::trim).filter(|s| !s.is_empty()) {
            prompt.push(' ');
            prompt.push_str(INSTRUCTION_PREFIX);
            prompt.push(' ');
            prompt.push_str(instructions);
        }
        prompt
    }
}
