use crate::api::models::{
    BaseModel, GeneratorRequestPayload, GeneratorSettings, LoraSelection, QueueSummary,
};
use crate::validation::{
    parse_non_negative_f64, parse_optional_i64, parse_positive_u32, parse_signed_strength,
    require_text, ValidationErrors,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

pub const DEFAULT_STEPS: &str = "30";
pub const DEFAULT_GUIDANCE: &str = "7";
pub const DEFAULT_DIMENSION: &str = "1024";
pub const DEFAULT_LORA_STRENGTH: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    BaseModels,
    Prompt,
    Loras,
    Review,
}

impl WizardStep {
    fn next(self) -> Self {
        match self {
            WizardStep::BaseModels => WizardStep::Prompt,
            WizardStep::Prompt => WizardStep::Loras,
            WizardStep::Loras | WizardStep::Review => WizardStep::Review,
        }
    }

    fn previous(self) -> Self {
        match self {
            WizardStep::BaseModels | WizardStep::Prompt => WizardStep::BaseModels,
            WizardStep::Loras => WizardStep::Prompt,
            WizardStep::Review => WizardStep::Loras,
        }
    }
}

/// LoRA row as typed into the form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoraDraft {
    pub lora_id: String,
    #[serde(default = "default_strength")]
    pub strength: String,
}

fn default_strength() -> String {
    DEFAULT_LORA_STRENGTH.to_string()
}

/// Raw form state; numeric fields stay strings until validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorDraft {
    pub base_model_ids: Vec<String>,
    pub prompt: String,
    pub negative_prompt: String,
    pub seed: String,
    pub guidance_scale: String,
    pub steps: String,
    pub width: String,
    pub height: String,
    pub loras: Vec<LoraDraft>,
}

impl Default for GeneratorDraft {
    fn default() -> Self {
        Self {
            base_model_ids: Vec::new(),
            prompt: String::new(),
            negative_prompt: String::new(),
            seed: String::new(),
            guidance_scale: DEFAULT_GUIDANCE.to_string(),
            steps: DEFAULT_STEPS.to_string(),
            width: DEFAULT_DIMENSION.to_string(),
            height: DEFAULT_DIMENSION.to_string(),
            loras: Vec::new(),
        }
    }
}

/// Why the queue currently refuses new jobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionBlocked {
    Paused,
    Declining,
    ViewerBlocked(Option<String>),
}

impl fmt::Display for SubmissionBlocked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionBlocked::Paused => f.write_str("the generator queue is paused"),
            SubmissionBlocked::Declining => {
                f.write_str("the generator queue is not accepting new requests")
            }
            SubmissionBlocked::ViewerBlocked(Some(reason)) => {
                write!(f, "you are blocked from submitting requests: {}", reason)
            }
            SubmissionBlocked::ViewerBlocked(None) => {
                f.write_str("you are blocked from submitting requests")
            }
        }
    }
}

/// Gate evaluated against the latest queue summary before posting.
pub fn submission_gate(summary: &QueueSummary) -> Result<(), SubmissionBlocked> {
    if summary.viewer_blocked {
        return Err(SubmissionBlocked::ViewerBlocked(
            summary
                .viewer_block_reason
                .as_deref()
                .map(str::trim)
                .filter(|reason| !reason.is_empty())
                .map(str::to_string),
        ));
    }
    if summary.paused {
        return Err(SubmissionBlocked::Paused);
    }
    if summary.declining {
        return Err(SubmissionBlocked::Declining);
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct GeneratorWizard {
    step: WizardStep,
    draft: GeneratorDraft,
    settings: Option<GeneratorSettings>,
    catalog: Vec<BaseModel>,
    errors: ValidationErrors,
}

impl GeneratorWizard {
    pub fn new(catalog: Vec<BaseModel>, settings: Option<GeneratorSettings>) -> Self {
        Self::with_draft(GeneratorDraft::default(), catalog, settings)
    }

    /// Starts from an existing draft. A blank negative prompt takes the
    /// configured default.
    pub fn with_draft(
        mut draft: GeneratorDraft,
        catalog: Vec<BaseModel>,
        settings: Option<GeneratorSettings>,
    ) -> Self {
        if draft.negative_prompt.trim().is_empty() {
            if let Some(negative) = settings
                .as_ref()
                .and_then(|settings| settings.default_negative_prompt.as_deref())
            {
                draft.negative_prompt = negative.to_string();
            }
        }
        Self {
            step: WizardStep::BaseModels,
            draft,
            settings,
            catalog,
            errors: ValidationErrors::new(),
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &GeneratorDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut GeneratorDraft {
        &mut self.draft
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn toggle_base_model(&mut self, id: &str) {
        if let Some(index) = self.draft.base_model_ids.iter().position(|item| item == id) {
            self.draft.base_model_ids.remove(index);
        } else {
            self.draft.base_model_ids.push(id.to_string());
        }
    }

    pub fn add_lora(&mut self, lora_id: &str) {
        if self.draft.loras.iter().any(|lora| lora.lora_id == lora_id) {
            return;
        }
        self.draft.loras.push(LoraDraft {
            lora_id: lora_id.to_string(),
            strength: default_strength(),
        });
    }

    pub fn remove_lora(&mut self, lora_id: &str) {
        self.draft.loras.retain(|lora| lora.lora_id != lora_id);
    }

    /// Validates the current step and advances when it is clean.
    pub fn next(&mut self) -> bool {
        self.errors = self.validate_step(self.step);
        if !self.errors.is_empty() {
            return false;
        }
        self.step = self.step.next();
        true
    }

    pub fn back(&mut self) {
        self.errors = ValidationErrors::new();
        self.step = self.step.previous();
    }

    /// Validates every step and assembles the queue payload.
    pub fn build_request(&mut self) -> Result<GeneratorRequestPayload, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let base_model_ids = self.check_base_models(&mut errors);
        let prompt = errors.check("prompt", require_text(&self.draft.prompt));
        let seed = errors.check("seed", parse_optional_i64(&self.draft.seed));
        let guidance_scale =
            errors.check("guidance_scale", parse_non_negative_f64(&self.draft.guidance_scale));
        let steps = self.check_steps(&mut errors);
        let width = self.check_dimension("width", &self.draft.width, &mut errors);
        let height = self.check_dimension("height", &self.draft.height, &mut errors);
        let loras = self.check_loras(&mut errors);

        self.errors = errors.clone();
        match (prompt, seed, guidance_scale, steps, width, height) {
            (Some(prompt), Some(seed), Some(guidance_scale), Some(steps), Some(width), Some(height))
                if errors.is_empty() =>
            {
                Ok(GeneratorRequestPayload {
                    base_model_ids,
                    prompt,
                    negative_prompt: self.draft.negative_prompt.trim().to_string(),
                    seed,
                    guidance_scale,
                    steps,
                    width,
                    height,
                    loras,
                })
            }
            _ => Err(errors),
        }
    }

    fn validate_step(&self, step: WizardStep) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        match step {
            WizardStep::BaseModels => {
                self.check_base_models(&mut errors);
            }
            WizardStep::Prompt => {
                errors.check("prompt", require_text(&self.draft.prompt));
                errors.check("seed", parse_optional_i64(&self.draft.seed));
                errors.check(
                    "guidance_scale",
                    parse_non_negative_f64(&self.draft.guidance_scale),
                );
                self.check_steps(&mut errors);
                self.check_dimension("width", &self.draft.width, &mut errors);
                self.check_dimension("height", &self.draft.height, &mut errors);
            }
            WizardStep::Loras => {
                self.check_loras(&mut errors);
            }
            WizardStep::Review => {}
        }
        errors
    }

    fn check_base_models(&self, errors: &mut ValidationErrors) -> Vec<String> {
        let mut seen = HashSet::new();
        let ids: Vec<String> = self
            .draft
            .base_model_ids
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .filter(|id| seen.insert(id.to_string()))
            .map(str::to_string)
            .collect();

        if ids.is_empty() {
            errors.add("base_model_ids", "select at least one base model");
            return ids;
        }

        if !self.catalog.is_empty() {
            for id in &ids {
                match self.catalog.iter().find(|model| &model.id == id) {
                    None => errors.add("base_model_ids", format!("unknown base model '{}'", id)),
                    Some(model) if !model.enabled => {
                        errors.add("base_model_ids", format!("base model '{}' is disabled", model.name))
                    }
                    Some(_) => {}
                }
            }
        }
        ids
    }

    fn check_steps(&self, errors: &mut ValidationErrors) -> Option<u32> {
        let steps = errors.check("steps", parse_positive_u32(&self.draft.steps))?;
        if let Some(max_steps) = self.settings.as_ref().map(|settings| settings.max_steps) {
            if max_steps > 0 && steps > max_steps {
                errors.add("steps", format!("must be at most {}", max_steps));
                return None;
            }
        }
        Some(steps)
    }

    fn check_dimension(&self, field: &str, raw: &str, errors: &mut ValidationErrors) -> Option<u32> {
        let value = errors.check(field, parse_positive_u32(raw))?;
        if let Some(max) = self.settings.as_ref().map(|settings| settings.max_dimension) {
            if max > 0 && value > max {
                errors.add(field, format!("must be at most {}", max));
                return None;
            }
        }
        Some(value)
    }

    fn check_loras(&self, errors: &mut ValidationErrors) -> Vec<LoraSelection> {
        if let Some(max_loras) = self.settings.as_ref().map(|settings| settings.max_loras) {
            if max_loras > 0 && self.draft.loras.len() > max_loras as usize {
                errors.add("loras", format!("at most {} LoRAs can be combined", max_loras));
            }
        }

        self.draft
            .loras
            .iter()
            .filter_map(|lora| {
                let lora_id = lora.lora_id.trim();
                if lora_id.is_empty() {
                    errors.add("loras", "LoRA id is required");
                    return None;
                }
                let field = format!("loras.{}.strength", lora_id);
                let strength = errors.check(&field, parse_signed_strength(&lora.strength))?;
                Some(LoraSelection {
                    lora_id: lora_id.to_string(),
                    strength,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageRef;

    fn catalog() -> Vec<BaseModel> {
        vec![
            BaseModel {
                id: "sdxl".into(),
                name: "SDXL 1.0".into(),
                family: Some("sdxl".into()),
                storage: StorageRef::default(),
                enabled: true,
            },
            BaseModel {
                id: "sd15".into(),
                name: "SD 1.5".into(),
                family: Some("sd15".into()),
                storage: StorageRef::default(),
                enabled: false,
            },
        ]
    }

    fn settings() -> GeneratorSettings {
        GeneratorSettings {
            enabled: true,
            max_steps: 50,
            max_dimension: 1536,
            max_loras: 2,
            default_negative_prompt: Some("lowres".into()),
        }
    }

    #[test]
    fn walks_steps_with_validation() {
        let mut wizard = GeneratorWizard::new(catalog(), Some(settings()));
        assert_eq!(wizard.draft().negative_prompt, "lowres");

        assert!(!wizard.next());
        assert!(wizard.errors().has_field("base_model_ids"));
        assert_eq!(wizard.step(), WizardStep::BaseModels);

        wizard.toggle_base_model("sdxl");
        assert!(wizard.next());
        assert_eq!(wizard.step(), WizardStep::Prompt);

        assert!(!wizard.next());
        assert!(wizard.errors().has_field("prompt"));

        wizard.draft_mut().prompt = "a lighthouse at dusk".into();
        assert!(wizard.next());
        assert!(wizard.next());
        assert_eq!(wizard.step(), WizardStep::Review);

        wizard.back();
        assert_eq!(wizard.step(), WizardStep::Loras);
    }

    #[test]
    fn builds_payload_with_loras() {
        let mut wizard = GeneratorWizard::new(catalog(), Some(settings()));
        wizard.toggle_base_model("sdxl");
        wizard.draft_mut().prompt = "  portrait  ".into();
        wizard.draft_mut().seed = "42".into();
        wizard.add_lora("lora-a");
        wizard.add_lora("lora-a");
        wizard.add_lora("lora-b");
        wizard.draft_mut().loras[1].strength = "-0.5".into();

        let payload = wizard.build_request().expect("valid request");
        assert_eq!(payload.base_model_ids, vec!["sdxl"]);
        assert_eq!(payload.prompt, "portrait");
        assert_eq!(payload.seed, Some(42));
        assert_eq!(payload.steps, 30);
        assert_eq!(payload.width, 1024);
        assert_eq!(
            payload.loras,
            vec![
                LoraSelection {
                    lora_id: "lora-a".into(),
                    strength: 1.0
                },
                LoraSelection {
                    lora_id: "lora-b".into(),
                    strength: -0.5
                },
            ]
        );
    }

    #[test]
    fn rejects_invalid_numbers_and_limits() {
        let mut wizard = GeneratorWizard::new(catalog(), Some(settings()));
        wizard.toggle_base_model("sd15");
        wizard.toggle_base_model("ghost");
        wizard.draft_mut().prompt = "x".into();
        wizard.draft_mut().steps = "80".into();
        wizard.draft_mut().width = "512.5".into();
        wizard.draft_mut().guidance_scale = "-2".into();
        wizard.add_lora("a");
        wizard.add_lora("b");
        wizard.add_lora("c");

        let errors = wizard.build_request().expect_err("invalid request");
        for field in ["base_model_ids", "steps", "width", "guidance_scale", "loras"] {
            assert!(errors.has_field(field), "expected error for {field}");
        }
        assert_eq!(errors.for_field("base_model_ids").count(), 2);
        assert!(!errors.has_field("height"));
    }

    #[test]
    fn default_negative_prompt_only_fills_blank_drafts() {
        let blank = GeneratorDraft {
            negative_prompt: "  ".into(),
            ..Default::default()
        };
        let wizard = GeneratorWizard::with_draft(blank, catalog(), Some(settings()));
        assert_eq!(wizard.draft().negative_prompt, "lowres");

        let typed = GeneratorDraft {
            negative_prompt: "watermark".into(),
            ..Default::default()
        };
        let wizard = GeneratorWizard::with_draft(typed, catalog(), Some(settings()));
        assert_eq!(wizard.draft().negative_prompt, "watermark");

        let wizard = GeneratorWizard::with_draft(GeneratorDraft::default(), catalog(), None);
        assert_eq!(wizard.draft().negative_prompt, "");
    }

    #[test]
    fn toggling_base_model_twice_deselects() {
        let mut wizard = GeneratorWizard::new(Vec::new(), None);
        wizard.toggle_base_model("x");
        wizard.toggle_base_model("x");
        assert!(wizard.draft().base_model_ids.is_empty());
    }

    #[test]
    fn submission_gate_checks_flags() {
        assert!(submission_gate(&QueueSummary::default()).is_ok());
        assert_eq!(
            submission_gate(&QueueSummary {
                paused: true,
                ..Default::default()
            }),
            Err(SubmissionBlocked::Paused)
        );
        assert_eq!(
            submission_gate(&QueueSummary {
                declining: true,
                ..Default::default()
            }),
            Err(SubmissionBlocked::Declining)
        );
        let blocked = submission_gate(&QueueSummary {
            paused: true,
            viewer_blocked: true,
            viewer_block_reason: Some("quota exceeded".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(
            blocked.to_string(),
            "you are blocked from submitting requests: quota exceeded"
        );
    }
}
