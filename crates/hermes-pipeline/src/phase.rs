//! Pipeline phases and extension hook names.

use std::fmt;

/// A bracketed pipeline phase.
///
/// The ordering follows the lifetime of an operation. Only `Init`, `Parse`
/// and `Validation` are driven by [`Pipeline::process`](crate::Pipeline::process);
/// `Execution` and `ResolveField` are driven by the executor through
/// [`Pipeline::execution_did_start`](crate::Pipeline::execution_did_start) and
/// [`Pipeline::resolve_field_did_start`](crate::Pipeline::resolve_field_did_start).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Phase {
    /// Extension initialization.
    Init = 1,
    /// Parsing the request text.
    Parse = 2,
    /// Validating the document against the schema.
    Validation = 3,
    /// Executing the selected operation.
    Execution = 4,
    /// Resolving a single field.
    ResolveField = 5,
}

impl Phase {
    /// Returns the phase name as used in hook names.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Init => "Init",
            Self::Parse => "Parse",
            Self::Validation => "Validation",
            Self::Execution => "Execution",
            Self::ResolveField => "ResolveField",
        }
    }

    /// Returns true if this phase runs inside [`Pipeline::process`](crate::Pipeline::process).
    #[must_use]
    pub const fn is_pre_execution(self) -> bool {
        (self as u8) <= 3
    }

    /// Returns all phases in order.
    #[must_use]
    pub const fn all() -> [Phase; 5] {
        [
            Self::Init,
            Self::Parse,
            Self::Validation,
            Self::Execution,
            Self::ResolveField,
        ]
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One extension hook, used to tag captured faults.
///
/// Renders as `Init`, `<Phase>DidStart`, `<Phase>FinishFunc` or `GetResult`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    /// [`Extension::init`](crate::Extension::init).
    Init,
    /// The start hook of a phase.
    DidStart(Phase),
    /// The finish callback of a phase.
    FinishFunc(Phase),
    /// [`Extension::get_result`](crate::Extension::get_result).
    GetResult,
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => f.write_str("Init"),
            Self::DidStart(phase) => write!(f, "{phase}DidStart"),
            Self::FinishFunc(phase) => write!(f, "{phase}FinishFunc"),
            Self::GetResult => f.write_str("GetResult"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_ordering() {
        assert!(Phase::Init < Phase::Parse);
        assert!(Phase::Parse < Phase::Validation);
        assert!(Phase::Validation < Phase::Execution);
        assert!(Phase::Execution < Phase::ResolveField);
    }

    #[test]
    fn test_phase_categories() {
        assert!(Phase::Init.is_pre_execution());
        assert!(Phase::Parse.is_pre_execution());
        assert!(Phase::Validation.is_pre_execution());
        assert!(!Phase::Execution.is_pre_execution());
        assert!(!Phase::ResolveField.is_pre_execution());
    }

    #[test]
    fn test_hook_names() {
        assert_eq!(Hook::Init.to_string(), "Init");
        assert_eq!(Hook::DidStart(Phase::Parse).to_string(), "ParseDidStart");
        assert_eq!(
            Hook::FinishFunc(Phase::Validation).to_string(),
            "ValidationFinishFunc"
        );
        assert_eq!(
            Hook::DidStart(Phase::ResolveField).to_string(),
            "ResolveFieldDidStart"
        );
        assert_eq!(Hook::GetResult.to_string(), "GetResult");
    }

    #[test]
    fn test_all_phases() {
        let phases = Phase::all();
        assert_eq!(phases.len(), 5);
        assert_eq!(phases[0], Phase::Init);
        assert_eq!(phases[4].name(), "ResolveField");
    }
}
