//! On-demand line diffs between local files and remote canonical content.
//!
//! The differ is purely diagnostic: it fetches the remote content for one
//! catalog entry, compares, and returns a finite unified-diff text. It
//! never writes, and a fetch failure simply surfaces as "diff unavailable"
//! to the caller.

use crate::catalog::CatalogEntry;
use crate::fetch::{Fetcher, RemoteCache};

/// Unified diff of one entry's local content against its remote canonical
/// content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff {
    /// Local path header used in the diff.
    pub local_label: String,
    /// Unified diff text; empty when local and remote are identical.
    pub text: String,
}

impl Diff {
    /// Whether local and remote content are identical.
    #[must_use]
    pub fn is_identical(&self) -> bool {
        self.text.is_empty()
    }
}

/// Compute the unified line diff for `entry`.
///
/// An absent local file diffs as empty content, so the result shows the
/// full remote content as additions. Binary-ish content is compared via
/// lossy UTF-8, which is adequate for shell script payloads.
///
/// # Errors
///
/// Returns [`crate::error::FetchError::Failed`] when the remote content is
/// unreachable; the caller reports this as "diff unavailable".
pub fn unified(
    entry: &CatalogEntry,
    fetcher: &dyn Fetcher,
    cache: &mut RemoteCache,
) -> Result<Diff, crate::error::FetchError> {
    let remote_bytes = cache.get(fetcher, &entry.remote_location)?.to_vec();
    let remote_text = String::from_utf8_lossy(&remote_bytes).into_owned();

    let local_text = std::fs::read(&entry.local_path)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default();

    let local_label = entry.local_path.display().to_string();
    let text = if local_text == remote_text {
        String::new()
    } else {
        similar::TextDiff::from_lines(&local_text, &remote_text)
            .unified_diff()
            .context_radius(3)
            .header(&local_label, "remote")
            .to_string()
    };

    Ok(Diff { local_label, text })
}
