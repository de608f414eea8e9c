//! Instruction templating.
//!
//! Deterministic text construction from a structured request. The instruction
//! is a pure function of the request fields, so identical requests always
//! produce byte-identical instructions regardless of which model consumes
//! them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Imaging modality of the requested scan.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    #[serde(rename = "MRI")]
    Mri,
    #[serde(rename = "CT")]
    Ct,
    #[serde(rename = "X-ray")]
    Xray,
    #[serde(rename = "Ultrasound")]
    Ultrasound,
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Modality::Mri => "MRI",
            Modality::Ct => "CT",
            Modality::Xray => "X-ray",
            Modality::Ultrasound => "Ultrasound",
        };
        f.write_str(label)
    }
}

/// One prompt-generation request from the presentation shell.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PromptRequest {
    /// What the scan should depict, e.g. "human brain".
    pub description: String,
    pub modality: Modality,
    /// Condition to highlight; empty/whitespace means absent.
    #[serde(default)]
    pub condition: Option<String>,
    /// Extra details to include; empty/whitespace means absent.
    #[serde(default)]
    pub details: Option<String>,
    /// Output length bound in tokens, pre-clamped by the shell.
    pub max_length: usize,
}

fn present(field: &Option<String>) -> Option<&str> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Build the generation instruction for a request.
///
/// The sentence fragments and their order are fixed; they are part of the
/// reproducibility contract and must not be reworded.
pub fn build_instruction(request: &PromptRequest) -> String {
    let mut instruction = format!(
        "Generate a {} scan of {}. Focus on the medical imaging context only.",
        request.modality, request.description
    );
    if let Some(condition) = present(&request.condition) {
        instruction.push_str(&format!(" Focus on capturing {}.", condition));
    }
    if let Some(details) = present(&request.details) {
        instruction.push_str(&format!(" Include details such as {}.", details));
    }
    instruction.push_str(
        " Avoid any extra information, references, or irrelevant content. \
         Keep the prompt focused only on the image generation task.",
    );
    instruction
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(condition: &str, details: &str) -> PromptRequest {
        PromptRequest {
            description: "human brain".to_string(),
            modality: Modality::Mri,
            condition: Some(condition.to_string()),
            details: Some(details.to_string()),
            max_length: 100,
        }
    }

    #[test]
    fn base_instruction_without_optional_fields() {
        let instruction = build_instruction(&request("", ""));
        assert_eq!(
            instruction,
            "Generate a MRI scan of human brain. Focus on the medical imaging context only. \
             Avoid any extra information, references, or irrelevant content. \
             Keep the prompt focused only on the image generation task."
        );
    }

    #[test]
    fn optional_fragments_appear_in_order() {
        let instruction = build_instruction(&request("a tumor in the left lobe", "high contrast"));
        let condition_pos = instruction
            .find("Focus on capturing a tumor in the left lobe.")
            .unwrap();
        let details_pos = instruction
            .find("Include details such as high contrast.")
            .unwrap();
        let closing_pos = instruction.find("Avoid any extra information").unwrap();
        assert!(condition_pos < details_pos);
        assert!(details_pos < closing_pos);
    }

    #[test]
    fn whitespace_only_fields_are_treated_as_absent() {
        let instruction = build_instruction(&request("   ", "\t\n"));
        assert!(!instruction.contains("Focus on capturing"));
        assert!(!instruction.contains("Include details such as"));
    }

    #[test]
    fn none_fields_match_empty_fields() {
        let mut with_none = request("", "");
        with_none.condition = None;
        with_none.details = None;
        assert_eq!(
            build_instruction(&with_none),
            build_instruction(&request("", ""))
        );
    }

    #[test]
    fn identical_requests_build_identical_instructions() {
        let a = request("fracture", "lateral view");
        let b = request("fracture", "lateral view");
        assert_eq!(build_instruction(&a), build_instruction(&b));
    }

    #[test]
    fn modality_labels_render_verbatim() {
        assert_eq!(Modality::Mri.to_string(), "MRI");
        assert_eq!(Modality::Ct.to_string(), "CT");
        assert_eq!(Modality::Xray.to_string(), "X-ray");
        assert_eq!(Modality::Ultrasound.to_string(), "Ultrasound");
    }
}
