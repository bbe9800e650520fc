//! Host-facing filter status.
//!
//! The hosting scheduler distinguishes a rejection (unschedulable on this
//! node for this cycle) from an error (the filter itself failed, retry the
//! cycle).

use std::fmt;

use serde::Serialize;

use crate::decision::Verdict;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Code {
    Success,
    Unschedulable,
    Error,
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Code::Success => "Success",
            Code::Unschedulable => "Unschedulable",
            Code::Error => "Error",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    pub code: Code,
    pub reasons: Vec<String>,
}

impl Status {
    pub fn success() -> Self {
        Self {
            code: Code::Success,
            reasons: Vec::new(),
        }
    }

    pub fn new(code: Code, reason: impl Into<String>) -> Self {
        Self {
            code,
            reasons: vec![reason.into()],
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Code::Success
    }
}

impl From<Verdict> for Status {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Admit => Status::success(),
            Verdict::Reject { .. } => Status::new(Code::Unschedulable, verdict.to_string()),
            Verdict::Error(cause) => Status::new(Code::Error, cause),
        }
    }
}
