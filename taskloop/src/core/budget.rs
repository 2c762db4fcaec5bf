//! Size estimation and budget-aware truncation for context assembly.
//!
//! Sizes are measured in abstract budget units derived deterministically
//! from text length. The ratio is fixed; callers never see characters or
//! bytes, only units, which keeps bucket arithmetic in the assembler
//! independent of the measurement scheme.

/// Fixed characters-per-unit ratio for estimation.
pub const CHARS_PER_UNIT: usize = 4;

/// Estimate the cost of `text` in budget units (ceiling division).
pub fn estimate(text: &str) -> usize {
    text.len().div_ceil(CHARS_PER_UNIT)
}

/// Whether adding `candidate` on top of `consumed` units stays within `ceiling`.
pub fn fits(consumed: usize, candidate: &str, ceiling: usize) -> bool {
    consumed + estimate(candidate) <= ceiling
}

/// Truncate `text` to a prefix whose estimated size is at most `unit_ceiling`.
///
/// Prefers breaking at a line boundary, then a word boundary. A boundary is
/// only accepted when it lies at or after 80% of the naive character cutoff;
/// a boundary further back would discard most of the budgeted content, so
/// the hard cut wins instead.
pub fn truncate(text: &str, unit_ceiling: usize) -> &str {
    if estimate(text) <= unit_ceiling {
        return text;
    }
    let max_chars = unit_ceiling * CHARS_PER_UNIT;
    let cut = floor_char_boundary(text, max_chars);
    let prefix = &text[..cut];
    let threshold = max_chars * 8 / 10;

    if let Some(pos) = prefix.rfind('\n')
        && pos >= threshold
    {
        return &prefix[..pos];
    }
    if let Some(pos) = prefix.rfind(' ')
        && pos >= threshold
    {
        return &prefix[..pos];
    }
    prefix
}

/// Largest index `<= at` that falls on a UTF-8 character boundary.
fn floor_char_boundary(text: &str, at: usize) -> usize {
    if at >= text.len() {
        return text.len();
    }
    let mut idx = at;
    while !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_rounds_up() {
        assert_eq!(estimate(""), 0);
        assert_eq!(estimate("abc"), 1);
        assert_eq!(estimate("abcd"), 1);
        assert_eq!(estimate("abcde"), 2);
    }

    #[test]
    fn fits_is_inclusive_of_ceiling() {
        assert!(fits(0, "abcd", 1));
        assert!(!fits(1, "abcd", 1));
        assert!(fits(3, "abcd", 4));
    }

    #[test]
    fn truncate_returns_short_text_unchanged() {
        let text = "short";
        assert_eq!(truncate(text, 10), text);
    }

    /// The defining property: a truncated blob always fits the ceiling.
    #[test]
    fn truncated_text_always_fits_ceiling() {
        let text = "word ".repeat(400);
        for ceiling in [1, 3, 10, 77, 499, 501] {
            let cut = truncate(&text, ceiling);
            assert!(
                estimate(cut) <= ceiling,
                "estimate {} > ceiling {}",
                estimate(cut),
                ceiling
            );
        }
    }

    #[test]
    fn truncate_prefers_line_boundary_near_cutoff() {
        // 36 chars of first line, newline at a position past 80% of the
        // 40-char cutoff for ceiling 10.
        let text = format!("{}\n{}", "a".repeat(36), "b".repeat(100));
        let cut = truncate(&text, 10);
        assert_eq!(cut, "a".repeat(36));
    }

    #[test]
    fn truncate_falls_back_to_word_boundary() {
        // No newline; space at char 35 of a 40-char cutoff.
        let text = format!("{} {}", "a".repeat(35), "b".repeat(100));
        let cut = truncate(&text, 10);
        assert_eq!(cut, "a".repeat(35));
    }

    #[test]
    fn truncate_hard_cuts_when_boundary_is_too_far_back() {
        // Space only at char 10, well before 80% of the 40-char cutoff.
        let text = format!("{} {}", "a".repeat(10), "b".repeat(100));
        let cut = truncate(&text, 10);
        assert_eq!(cut.len(), 40);
    }

    #[test]
    fn truncate_respects_utf8_boundaries() {
        let text = "é".repeat(100);
        let cut = truncate(&text, 10);
        assert!(cut.len() <= 40);
        assert!(text.is_char_boundary(cut.len()));
        assert!(estimate(cut) <= 10);
    }
}
