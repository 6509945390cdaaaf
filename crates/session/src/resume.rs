//! Resume skip predicate.
//!
//! Replayed against the same deterministic enumeration order of source
//! URLs that produced the session's `lastCopied` marker, the filter
//! decides per URL whether it was already transferred in a prior run.

use crate::SessionError;

/// Filter state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeState {
    /// Everything up to and including the marker counts as already done.
    Skipping { marker: String },
    /// The marker has been passed (or there was none); nothing is skipped.
    Active,
}

/// Stateful skip decision, one instance per enumeration pass.
///
/// Known sharp edge: while in `Skipping`, every URL is skipped
/// unconditionally until one equals the marker. If the marker is never
/// presented (the enumeration order changed between runs, or the marked
/// URL no longer exists), the filter skips everything forever. Construct
/// a fresh filter for each pass and never share one across replays.
#[derive(Debug)]
pub struct ResumeFilter {
    state: ResumeState,
}

impl ResumeFilter {
    /// Builds a filter from the session's `lastCopied` marker. An empty
    /// marker means nothing was completed, so nothing is skipped.
    pub fn new(last_copied: &str) -> Self {
        let state = if last_copied.is_empty() {
            ResumeState::Active
        } else {
            ResumeState::Skipping {
                marker: last_copied.to_string(),
            }
        };
        Self { state }
    }

    /// Returns the current state.
    pub fn state(&self) -> &ResumeState {
        &self.state
    }

    /// Decides whether `source_url` was already transferred. The call
    /// whose input equals the marker still returns `true`; every call
    /// after it returns `false`. An empty URL is a caller error.
    pub fn should_skip(&mut self, source_url: &str) -> Result<bool, SessionError> {
        if source_url.is_empty() {
            return Err(SessionError::InvalidArgument(
                "empty source URL passed to resume filter".into(),
            ));
        }
        match &self.state {
            ResumeState::Active => Ok(false),
            ResumeState::Skipping { marker } => {
                if marker == source_url {
                    self.state = ResumeState::Active;
                }
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_marker_never_skips() {
        let mut filter = ResumeFilter::new("");
        assert_eq!(filter.state(), &ResumeState::Active);
        for url in ["a", "b", "c"] {
            assert!(!filter.should_skip(url).unwrap());
        }
    }

    #[test]
    fn skips_through_marker_then_activates() {
        let mut filter = ResumeFilter::new("b");
        let results: Vec<bool> = ["a", "b", "c", "d"]
            .iter()
            .map(|url| filter.should_skip(url).unwrap())
            .collect();
        assert_eq!(results, vec![true, true, false, false]);
        assert_eq!(filter.state(), &ResumeState::Active);
    }

    // Documented hazard: a marker that never shows up in the replay keeps
    // the filter skipping forever.
    #[test]
    fn marker_never_matched_skips_everything() {
        let mut filter = ResumeFilter::new("z");
        assert!(filter.should_skip("a").unwrap());
        assert!(filter.should_skip("b").unwrap());
        assert!(matches!(filter.state(), ResumeState::Skipping { .. }));
    }

    #[test]
    fn empty_url_is_invalid_argument() {
        let mut filter = ResumeFilter::new("");
        assert!(matches!(
            filter.should_skip("").unwrap_err(),
            SessionError::InvalidArgument(_)
        ));

        let mut skipping = ResumeFilter::new("m");
        assert!(matches!(
            skipping.should_skip("").unwrap_err(),
            SessionError::InvalidArgument(_)
        ));
    }
}
