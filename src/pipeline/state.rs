use crate::info::BuildInfo;

/// Value threaded through the pipeline steps.
///
/// Each step takes the state by value and hands back the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineState {
    pub image_name: String,
    pub info: Option<BuildInfo>,
}

impl PipelineState {
    pub fn new(image_name: impl Into<String>) -> Self {
        Self {
            image_name: image_name.into(),
            info: None,
        }
    }

    /// False until build info has been resolved with at least one tag
    pub fn should_continue(&self) -> bool {
        self.info.as_ref().is_some_and(|i| i.should_continue)
    }

    pub fn tags(&self) -> &[String] {
        self.info.as_ref().map(|i| i.tag.as_slice()).unwrap_or(&[])
    }

    /// Turns every remaining step into a no-op
    pub fn halt(mut self) -> Self {
        match self.info.as_mut() {
            Some(info) => info.should_continue = false,
            None => self.info = Some(BuildInfo::halted()),
        }
        self
    }
}

/// How a pipeline run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Every step ran or was gated off
    Completed { image: String, info: BuildInfo },
    /// The runtime gate stopped the run before any step
    Skipped,
}
