//! Keyword router deciding whether a message goes to the team pipeline.

/// Keywords used by the HTTP layer.
pub const DEFAULT_MEDICAL_KEYWORDS: &[&str] = &[
    "pain",
    "fever",
    "infection",
    "diagnose",
    "treatment",
    "sepsis",
    "scan",
    "mri",
    "ct",
    "injury",
    "cancer",
    "stroke",
];

/// The shorter list used by the interactive CLI.
pub const MINIMAL_MEDICAL_KEYWORDS: &[&str] = &["pain", "fever", "diagnose", "treatment"];

/// Substring-based medical/general classifier.
///
/// Matching is plain substring containment on the lower-cased message, so
/// short keywords such as "ct" also fire inside longer words ("doctor").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRouter {
    keywords: Vec<String>,
}

impl QueryRouter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.into().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn minimal() -> Self {
        Self::new(MINIMAL_MEDICAL_KEYWORDS.iter().copied())
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Whether `message` should be answered by the team pipeline.
    pub fn is_medical(&self, message: &str) -> bool {
        let lowered = message.to_lowercase();
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

impl Default for QueryRouter {
    fn default() -> Self {
        Self::new(DEFAULT_MEDICAL_KEYWORDS.iter().copied())
    }
}
