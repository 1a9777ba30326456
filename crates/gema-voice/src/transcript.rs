//! Transcript Buffer — latest partial/final speech-to-text results.
//!
//! Mutated only from recognizer callbacks; read-only to the Silence Detector.

/// Ordered partial and final recognizer results for the current turn.
#[derive(Debug, Clone, Default)]
pub struct TranscriptBuffer {
    pub partial_results: Vec<String>,
    pub final_results: Vec<String>,
}

impl TranscriptBuffer {
    /// The "current" transcript: `partial_results[0]` if non-empty, else
    /// `final_results[0]`, else empty.
    pub fn current(&self) -> &str {
        self.partial_results
            .first()
            .filter(|s| !s.is_empty())
            .or_else(|| self.final_results.first())
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn set_partials(&mut self, results: Vec<String>) {
        self.partial_results = results;
    }

    pub fn set_finals(&mut self, results: Vec<String>) {
        self.final_results = results;
    }

    pub fn clear(&mut self) {
        self.partial_results.clear();
        self.final_results.clear();
    }
}
