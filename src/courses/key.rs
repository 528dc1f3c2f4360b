use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CourseKeyError {
    #[error("Invalid course id: {0}")]
    Invalid(String),
}

/// Parsed course identifier.
///
/// Accepts `course-v1:ORG+COURSE+RUN` as well as the older slash-separated
/// `ORG/COURSE/RUN` form. The original spelling is kept as the canonical string
/// so stored settings stay addressable by whatever id the host platform issued.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CourseKey {
    org: String,
    course: String,
    run: String,
    deprecated: bool,
}

impl CourseKey {
    pub fn parse(raw: &str) -> Result<Self, CourseKeyError> {
        let invalid = || CourseKeyError::Invalid(raw.to_string());

        let (parts, deprecated): (Vec<&str>, bool) = match raw.strip_prefix("course-v1:") {
            Some(rest) => (rest.split('+').collect(), false),
            None => (raw.split('/').collect(), true),
        };

        let [org, course, run] = parts.as_slice() else {
            return Err(invalid());
        };

        for part in [org, course, run] {
            if !is_valid_part(part) {
                return Err(invalid());
            }
        }

        Ok(Self {
            org: org.to_string(),
            course: course.to_string(),
            run: run.to_string(),
            deprecated,
        })
    }

    pub fn org(&self) -> &str {
        &self.org
    }

}

fn is_valid_part(part: &str) -> bool {
    !part.is_empty()
        && part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '~' | '.' | ':'))
}

impl fmt::Display for CourseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.deprecated {
            write!(f, "{}/{}/{}", self.org, self.course, self.run)
        } else {
            write!(f, "course-v1:{}+{}+{}", self.org, self.course, self.run)
        }
    }
}

impl FromStr for CourseKey {
    type Err = CourseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
