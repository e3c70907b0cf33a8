use serde::{Deserialize, Serialize};
use std::fmt;

/// Error returned when a display label does not match any known selection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} label: {label}")]
pub struct UnknownLabel {
    /// Which selector rejected the label ("backend" or "mode").
    pub kind: &'static str,
    /// The label as received.
    pub label: String,
}

/// Conversational backends the panel can route prompts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendId {
    /// Google Gemini generateContent API.
    Gemini,
    /// Persona chat service.
    Character,
}

impl BackendId {
    /// Every backend in selector order.
    pub const ALL: [BackendId; 2] = [BackendId::Gemini, BackendId::Character];

    /// Display label shown in selectors and echoed into the transcript.
    pub fn label(self) -> &'static str {
        match self {
            BackendId::Gemini => "Gemini Model",
            BackendId::Character => "Character.AI Model",
        }
    }

    /// Resolve an exact display label.
    pub fn parse(label: &str) -> Result<Self, UnknownLabel> {
        Self::ALL
            .into_iter()
            .find(|backend| backend.label() == label)
            .ok_or_else(|| UnknownLabel {
                kind: "backend",
                label: label.to_string(),
            })
    }

    /// Next backend in selector order, wrapping around.
    pub fn next(self) -> Self {
        cycle(&Self::ALL, self, 1)
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Kind of generation requested for a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Forward the prompt to the selected backend.
    #[default]
    None,
    /// Placeholder image generation.
    Image,
    /// Placeholder audio generation.
    Audio,
    /// Placeholder video generation.
    Video,
    /// Placeholder processing of the attached file.
    File,
}

impl GenerationMode {
    /// Every mode in selector order.
    pub const ALL: [GenerationMode; 5] = [
        GenerationMode::None,
        GenerationMode::Image,
        GenerationMode::Audio,
        GenerationMode::Video,
        GenerationMode::File,
    ];

    pub fn label(self) -> &'static str {
        match self {
            GenerationMode::None => "None",
            GenerationMode::Image => "Image Generation (Dummy)",
            GenerationMode::Audio => "Audio Generation (Dummy)",
            GenerationMode::Video => "Video Generation (Dummy)",
            GenerationMode::File => "File Upload (Dummy)",
        }
    }

    pub fn parse(label: &str) -> Result<Self, UnknownLabel> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.label() == label)
            .ok_or_else(|| UnknownLabel {
                kind: "mode",
                label: label.to_string(),
            })
    }

    /// True when requests in this mode need attached content.
    pub fn requires_attachment(self) -> bool {
        self == GenerationMode::File
    }

    pub fn next(self) -> Self {
        cycle(&Self::ALL, self, 1)
    }

    pub fn prev(self) -> Self {
        cycle(&Self::ALL, self, Self::ALL.len() - 1)
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn cycle<T: Copy + PartialEq>(all: &[T], current: T, step: usize) -> T {
    let index = all.iter().position(|item| *item == current).unwrap_or(0);
    all[(index + step) % all.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn labels_parse_back_exactly() {
        for backend in BackendId::ALL {
            assert_eq!(BackendId::parse(backend.label()), Ok(backend));
        }
        for mode in GenerationMode::ALL {
            assert_eq!(GenerationMode::parse(mode.label()), Ok(mode));
        }
    }

    #[test]
    fn parse_is_case_sensitive() {
        let err = GenerationMode::parse("none").expect_err("lowercase label");
        assert_eq!(err.kind, "mode");
        assert_eq!(err.to_string(), "unknown mode label: none");
    }

    #[test]
    fn mode_cycling_wraps_both_ways() {
        assert_eq!(GenerationMode::File.next(), GenerationMode::None);
        assert_eq!(GenerationMode::None.prev(), GenerationMode::File);
        assert_eq!(GenerationMode::Image.prev(), GenerationMode::None);
        assert_eq!(BackendId::Character.next(), BackendId::Gemini);
    }
}
