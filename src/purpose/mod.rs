//! Upload purposes recognized by the files endpoint.

use std::fmt;
use std::str::FromStr;

use crate::errors::{OpenAIError, OpenAIResult};

/// Why a file is being uploaded; constrains the file shape the API expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UploadPurpose {
    /// Training data for fine-tuning jobs.
    #[default]
    FineTune,
    /// Results of fine-tuning jobs.
    FineTuneResults,
    /// Files for the Assistants API.
    Assistants,
    /// Files generated by assistants.
    AssistantsOutput,
}

impl UploadPurpose {
    /// Every known purpose, in declaration order.
    pub const ALL: [UploadPurpose; 4] = [
        UploadPurpose::FineTune,
        UploadPurpose::FineTuneResults,
        UploadPurpose::Assistants,
        UploadPurpose::AssistantsOutput,
    ];

    /// Wire code sent in the `purpose` form field.
    pub const fn code(self) -> &'static str {
        match self {
            UploadPurpose::FineTune => "fine-tune",
            UploadPurpose::FineTuneResults => "fine-tune-results",
            UploadPurpose::Assistants => "assistants",
            UploadPurpose::AssistantsOutput => "assistants_output",
        }
    }

    /// Human-readable description.
    pub const fn description(self) -> &'static str {
        match self {
            UploadPurpose::FineTune => "Used to upload files for fine-tuning models.",
            UploadPurpose::FineTuneResults => "Used to upload results of fine-tuning jobs.",
            UploadPurpose::Assistants => "Used to upload files for the Assistants API.",
            UploadPurpose::AssistantsOutput => "Used to upload files generated by assistants.",
        }
    }

    /// Whether `.json` uploads with this purpose must be sent as JSONL.
    pub const fn requires_jsonl(self) -> bool {
        matches!(
            self,
            UploadPurpose::FineTune | UploadPurpose::FineTuneResults
        )
    }

    /// Exact lookup by wire code. Unlike [`resolve`], an empty code is not defaulted.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.code() == code)
    }
}

/// Resolves a purpose code; the empty code means [`UploadPurpose::FineTune`].
pub fn resolve(code: &str) -> OpenAIResult<UploadPurpose> {
    if code.is_empty() {
        return Ok(UploadPurpose::default());
    }

    UploadPurpose::from_code(code).ok_or_else(|| OpenAIError::InvalidPurpose {
        code: code.to_string(),
    })
}

impl fmt::Display for UploadPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for UploadPurpose {
    type Err = OpenAIError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        resolve(s)
    }
}
