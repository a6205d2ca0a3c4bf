use std::fmt;

use crate::foundation::error::{EaselError, EaselResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordPathElem {
    Field(&'static str),
    Index(usize),
}

fn format_path(path: &[RecordPathElem]) -> String {
    let mut s = String::from("$");
    for p in path {
        match *p {
            RecordPathElem::Field(name) => {
                s.push('.');
                s.push_str(name);
            }
            RecordPathElem::Index(i) => {
                s.push('[');
                s.push_str(&i.to_string());
                s.push(']');
            }
        }
    }
    s
}

/// One structural problem found while rebuilding nodes from a record.
#[derive(Debug)]
pub struct ValidationIssue {
    pub path: Vec<RecordPathElem>,
    pub error: EaselError,
}

impl ValidationIssue {
    pub fn path_string(&self) -> String {
        format_path(&self.path)
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path_string(), self.error)
    }
}

/// Collects every issue in a record so they can be reported together.
#[derive(Debug, Default)]
pub struct ValidationContext {
    path: Vec<RecordPathElem>,
    issues: Vec<ValidationIssue>,
}

impl ValidationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, elem: RecordPathElem) {
        self.path.push(elem);
    }

    pub(crate) fn pop(&mut self) {
        self.path.pop();
    }

    /// Record `error` at the current path.
    pub fn add_error(&mut self, error: EaselError) {
        self.issues.push(ValidationIssue {
            path: self.path.clone(),
            error,
        });
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// `Ok` when nothing was recorded, the typed error when exactly one issue
    /// was recorded, otherwise [`EaselError::InvalidRecord`] holding all of them.
    pub fn into_result(mut self) -> EaselResult<()> {
        match self.issues.len() {
            0 => Ok(()),
            1 => Err(self.issues.remove(0).error),
            _ => Err(EaselError::InvalidRecord(self.issues)),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/record/validate.rs"]
mod tests;
