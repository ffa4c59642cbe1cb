use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Ledger key of a result batch: one course in one semester of one session.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BatchKey {
    pub session: String,
    pub semester: String,
    pub course_code: String,
}

impl BatchKey {
    /// Build a key, trimming each component. Empty components are rejected.
    pub fn new(
        session: impl AsRef<str>,
        semester: impl AsRef<str>,
        course_code: impl AsRef<str>,
    ) -> Result<Self, TypeError> {
        let component = |value: &str, name: &'static str| {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Err(TypeError::EmptyKeyComponent(name))
            } else {
                Ok(trimmed.to_string())
            }
        };
        Ok(Self {
            session: component(session.as_ref(), "session")?,
            semester: component(semester.as_ref(), "semester")?,
            course_code: component(course_code.as_ref(), "course_code")?,
        })
    }
}

impl fmt::Display for BatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.session, self.semester, self.course_code)
    }
}
