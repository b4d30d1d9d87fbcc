use thiserror::Error;

use crate::model::ids::SubjectId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubjectError {
    #[error("subject name cannot be empty")]
    EmptyName,

    #[error("subject code must be 2-4 uppercase ASCII letters")]
    InvalidCode,

    #[error("subject weightage must be in (0, 100]")]
    InvalidWeightage,

    #[error("subject must declare at least one topic")]
    NoTopics,

    #[error("subject topic names cannot be empty")]
    EmptyTopic,
}

//
// ─── SUBJECT ───────────────────────────────────────────────────────────────────
//

/// An immutable syllabus catalog entry.
///
/// Subjects are seeded once at startup and never created by end users;
/// attempts reference them by id.
#[derive(Debug, Clone, PartialEq)]
pub struct Subject {
    id: SubjectId,
    name: String,
    code: String,
    weightage: f64,
    topics: Vec<String>,
}

impl Subject {
    /// Creates a new Subject.
    ///
    /// The code must be 2-4 uppercase ASCII letters and is expected to be
    /// unique across the catalog; uniqueness itself is enforced by the store.
    ///
    /// # Errors
    ///
    /// Returns `SubjectError` if the name is blank, the code is malformed,
    /// the weightage falls outside (0, 100], or the topic list is empty or
    /// contains a blank entry.
    pub fn new(
        id: SubjectId,
        name: impl Into<String>,
        code: impl Into<String>,
        weightage: f64,
        topics: Vec<String>,
    ) -> Result<Self, SubjectError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SubjectError::EmptyName);
        }

        let code = code.into();
        if !is_valid_code(&code) {
            return Err(SubjectError::InvalidCode);
        }

        if !weightage.is_finite() || weightage <= 0.0 || weightage > 100.0 {
            return Err(SubjectError::InvalidWeightage);
        }

        if topics.is_empty() {
            return Err(SubjectError::NoTopics);
        }
        let mut trimmed = Vec::with_capacity(topics.len());
        for topic in topics {
            let topic = topic.trim().to_owned();
            if topic.is_empty() {
                return Err(SubjectError::EmptyTopic);
            }
            trimmed.push(topic);
        }

        Ok(Self {
            id,
            name: name.trim().to_owned(),
            code,
            weightage,
            topics: trimmed,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> SubjectId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub fn weightage(&self) -> f64 {
        self.weightage
    }

    /// Ordered topic names as declared in the syllabus.
    #[must_use]
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    /// Returns true if `topic` is one of the declared topic names.
    ///
    /// Attempts are not rejected for off-catalog topics; this exists for
    /// display layers that want to flag them.
    #[must_use]
    pub fn has_topic(&self, topic: &str) -> bool {
        self.topics.iter().any(|t| t == topic)
    }
}

fn is_valid_code(code: &str) -> bool {
    (2..=4).contains(&code.len()) && code.bytes().all(|b| b.is_ascii_uppercase())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn topics(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| (*n).to_owned()).collect()
    }

    #[test]
    fn subject_new_happy_path() {
        let subject = Subject::new(
            SubjectId::new(2),
            "Networks, Signals and Systems",
            "NSS",
            13.0,
            topics(&["Network Theorems", "Laplace Transform"]),
        )
        .unwrap();

        assert_eq!(subject.id(), SubjectId::new(2));
        assert_eq!(subject.code(), "NSS");
        assert_eq!(subject.topics().len(), 2);
        assert!(subject.has_topic("Laplace Transform"));
        assert!(!subject.has_topic("Filters"));
    }

    #[test]
    fn subject_new_rejects_blank_name() {
        let err = Subject::new(SubjectId::new(1), "  ", "NSS", 10.0, topics(&["T"])).unwrap_err();
        assert_eq!(err, SubjectError::EmptyName);
    }

    #[test]
    fn subject_new_rejects_malformed_codes() {
        for code in ["N", "NETWO", "ns", "N5S", "NS S"] {
            let err =
                Subject::new(SubjectId::new(1), "Networks", code, 10.0, topics(&["T"])).unwrap_err();
            assert_eq!(err, SubjectError::InvalidCode, "code {code:?}");
        }
    }

    #[test]
    fn subject_new_rejects_weightage_out_of_range() {
        for weightage in [0.0, -1.0, 101.0, f64::NAN] {
            let err = Subject::new(SubjectId::new(1), "Networks", "NET", weightage, topics(&["T"]))
                .unwrap_err();
            assert_eq!(err, SubjectError::InvalidWeightage);
        }
    }

    #[test]
    fn subject_new_rejects_empty_topics() {
        let err = Subject::new(SubjectId::new(1), "Networks", "NET", 10.0, vec![]).unwrap_err();
        assert_eq!(err, SubjectError::NoTopics);

        let err = Subject::new(
            SubjectId::new(1),
            "Networks",
            "NET",
            10.0,
            topics(&["Transients", "   "]),
        )
        .unwrap_err();
        assert_eq!(err, SubjectError::EmptyTopic);
    }

    #[test]
    fn subject_trims_name_and_topics() {
        let subject = Subject::new(
            SubjectId::new(1),
            "  Networks  ",
            "NET",
            10.0,
            topics(&["  Transients  "]),
        )
        .unwrap();
        assert_eq!(subject.name(), "Networks");
        assert_eq!(subject.topics(), ["Transients"]);
    }
}
