use crate::error::LedgerError;

/// Strict execution stages for completing a milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionStage {
    Initialized,
    Located,
    Built,
    Validated,
    Committed,
}

impl CompletionStage {
    pub fn name(self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::Located => "located",
            Self::Built => "built",
            Self::Validated => "validated",
            Self::Committed => "committed",
        }
    }
}

/// Tracks a completion flow through located->built->validated->committed.
///
/// Every advance names the stage it expects to leave, so jumping past
/// validation (or committing twice) is a hard error rather than a silent
/// ordering bug.
#[derive(Debug, Clone)]
pub struct CompletionStageMachine {
    trace_id: String,
    stage: CompletionStage,
}

impl CompletionStageMachine {
    pub fn new(trace_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            stage: CompletionStage::Initialized,
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn stage(&self) -> CompletionStage {
        self.stage
    }

    pub fn mark_located(&mut self) -> Result<(), LedgerError> {
        self.advance(CompletionStage::Initialized, CompletionStage::Located)
    }

    pub fn mark_built(&mut self) -> Result<(), LedgerError> {
        self.advance(CompletionStage::Located, CompletionStage::Built)
    }

    pub fn mark_validated(&mut self) -> Result<(), LedgerError> {
        self.advance(CompletionStage::Built, CompletionStage::Validated)
    }

    pub fn mark_committed(&mut self) -> Result<(), LedgerError> {
        self.advance(CompletionStage::Validated, CompletionStage::Committed)
    }

    fn advance(
        &mut self,
        expected_current: CompletionStage,
        next: CompletionStage,
    ) -> Result<(), LedgerError> {
        if self.stage != expected_current {
            return Err(LedgerError::stage_violation(
                expected_current.name(),
                self.stage.name(),
            ));
        }
        self.stage = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enforces_stage_order() {
        let mut machine = CompletionStageMachine::new("trace-a");
        assert!(machine.mark_located().is_ok());
        assert!(machine.mark_built().is_ok());
        assert!(machine.mark_validated().is_ok());
        assert!(machine.mark_committed().is_ok());
        assert_eq!(machine.stage(), CompletionStage::Committed);
    }

    #[test]
    fn rejects_skipping_validation() {
        let mut machine = CompletionStageMachine::new("trace-b");
        machine.mark_located().unwrap();
        machine.mark_built().unwrap();

        let err = machine.mark_committed().unwrap_err();
        assert!(err.to_string().contains("expected 'validated', got 'built'"));
    }

    #[test]
    fn rejects_double_commit() {
        let mut machine = CompletionStageMachine::new("trace-c");
        machine.mark_located().unwrap();
        machine.mark_built().unwrap();
        machine.mark_validated().unwrap();
        machine.mark_committed().unwrap();

        assert!(machine.mark_committed().is_err());
    }
}
