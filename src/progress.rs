//! Progress UI for download runs.

use indicatif::{ProgressBar, ProgressStyle};

/// Builds the overall progress bar for a run of `total` files.
///
/// Returns a hidden bar when progress output is disabled, so callers can
/// tick unconditionally.
#[must_use]
pub fn overall_bar(total: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} files ({elapsed})")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overall_bar_hidden_when_disabled() {
        let bar = overall_bar(10, false);
        assert!(bar.is_hidden());
    }

    #[test]
    fn test_overall_bar_tracks_total_length() {
        let bar = overall_bar(42, true);
        assert_eq!(bar.length(), Some(42));
        bar.finish_and_clear();
    }
}
