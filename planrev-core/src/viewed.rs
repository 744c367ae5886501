//! Persisted "viewed" tracking for plan steps.
//!
//! The sidecar lives next to the plan as `<plan>.reviewed.json` and maps step
//! titles to a short content hash. A step counts as viewed only while its
//! current content still hashes to the stored value, so editing a step after
//! it was read makes it unviewed again without an explicit unmark.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::types::Step;

/// Errors returned by [`ViewedState::save`].
#[derive(Debug, Error)]
pub enum ViewedStateError {
    #[error("failed to serialize viewed state: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Step title to content hash, as stored in the sidecar file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewedState {
    #[serde(default)]
    pub steps: BTreeMap<String, String>,
}

/// Returns the sidecar path for a plan file.
pub fn state_path(plan_path: &Path) -> PathBuf {
    let mut name = plan_path.as_os_str().to_owned();
    name.push(".reviewed.json");
    PathBuf::from(name)
}

/// Computes the 16-hex-character content hash of a step.
///
/// SHA-256 over `title`, a NUL separator, and `body`, truncated to the first
/// eight bytes.
pub fn content_hash(step: &Step) -> String {
    let mut hasher = Sha256::new();
    hasher.update(step.title.as_bytes());
    hasher.update([0u8]);
    hasher.update(step.body.as_bytes());
    let digest = hasher.finalize();
    digest[..8].iter().map(|b| format!("{b:02x}")).collect()
}

impl ViewedState {
    /// Reads the sidecar at `path`.
    ///
    /// Never fails: a missing file or malformed JSON yields an empty state.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), error = %e, "cannot read viewed state");
                }
                return Self::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "ignoring malformed viewed state"
                );
                Self::default()
            }
        }
    }

    /// Writes the state to `path` as pretty JSON with a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns [`ViewedStateError`] if serialization or the file write fails.
    pub fn save(&self, path: &Path) -> Result<(), ViewedStateError> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        std::fs::write(path, json).map_err(|source| ViewedStateError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `true` when the step's title is recorded and its content is unchanged.
    pub fn is_step_viewed(&self, step: &Step) -> bool {
        self.steps
            .get(&step.title)
            .is_some_and(|stored| *stored == content_hash(step))
    }

    pub fn mark_viewed(&mut self, step: &Step) {
        self.steps.insert(step.title.clone(), content_hash(step));
    }

    pub fn unmark_viewed(&mut self, step: &Step) {
        self.steps.remove(&step.title);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(title: &str, body: &str) -> Step {
        Step {
            id: "S1".to_owned(),
            title: title.to_owned(),
            level: 2,
            body: body.to_owned(),
            ..Step::default()
        }
    }

    #[test]
    fn hash_is_sixteen_lowercase_hex() {
        let h = content_hash(&step("Auth", "body"));
        assert_eq!(h.len(), 16);
        assert!(h.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
    }

    #[test]
    fn separator_distinguishes_title_and_body() {
        assert_ne!(content_hash(&step("ab", "c")), content_hash(&step("a", "bc")));
    }

    #[test]
    fn body_change_makes_step_stale() {
        let mut s = step("Auth", "original");
        let mut state = ViewedState::default();
        state.mark_viewed(&s);
        assert!(state.is_step_viewed(&s));

        s.body = "edited".to_owned();
        assert!(!state.is_step_viewed(&s));
    }

    #[test]
    fn unmark_removes_entry() {
        let s = step("Auth", "x");
        let mut state = ViewedState::default();
        state.mark_viewed(&s);
        state.unmark_viewed(&s);
        assert!(!state.is_step_viewed(&s));
        assert!(state.steps.is_empty());
    }

    #[test]
    fn same_title_aliases() {
        let a = step("Setup", "same");
        let mut b = step("Setup", "same");
        b.id = "S2".to_owned();
        let mut state = ViewedState::default();
        state.mark_viewed(&a);
        assert!(state.is_step_viewed(&b));
    }

    #[test]
    fn state_path_appends_suffix() {
        let p = state_path(Path::new("/tmp/plans/my-plan.md"));
        assert_eq!(p, PathBuf::from("/tmp/plans/my-plan.md.reviewed.json"));
    }
}
