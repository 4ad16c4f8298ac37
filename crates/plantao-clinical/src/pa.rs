// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Blood pressure parsing and normalization.
//!
//! Canonical form is `SSSxDDD` (e.g. `120x80`). Shorthand like `12/8` is
//! never expanded by guessing: it comes back as ambiguous and the caregiver
//! is asked to resend in full form.

use crate::ranges::{PA_DIA_RANGE, PA_SYS_RANGE};

/// Result of parsing a blood-pressure string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaParse {
    /// Canonical `SSSxDDD`.
    Normalized(String),
    /// Shorthand that could mean more than one reading (`12/8`).
    Ambiguous,
    /// Not a blood pressure, or outside the safety ranges.
    Invalid,
}

/// Warning code attached when the PA is ambiguous.
pub const PA_AMBIGUOUS_WARNING: &str = "PA_ambigua";
/// Warning code attached when the PA is out of range.
pub const PA_INVALID_WARNING: &str = "PA_incoerente";

/// Parse `"120x80"`, `"120/80"`, `"120 x 80"` into canonical form.
pub fn normalize_pa(raw: &str) -> PaParse {
    let cleaned = raw.trim().to_lowercase();
    let parts: Vec<&str> = cleaned
        .split(|c| c == 'x' || c == '/')
        .map(str::trim)
        .collect();
    if parts.len() != 2 {
        return PaParse::Invalid;
    }
    let (sys, dia) = match (parts[0].parse::<i32>(), parts[1].parse::<i32>()) {
        (Ok(sys), Ok(dia)) => (sys, dia),
        _ => return PaParse::Invalid,
    };

    // Two-digit shorthand ("12/8", "13x9"): could mean 120x80 or 128; never guess.
    if sys < *PA_SYS_RANGE.start() && sys >= 7 && sys <= 26 {
        return PaParse::Ambiguous;
    }

    if PA_SYS_RANGE.contains(&sys) && PA_DIA_RANGE.contains(&dia) {
        PaParse::Normalized(format!("{sys}x{dia}"))
    } else {
        PaParse::Invalid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_forms_are_accepted() {
        assert_eq!(normalize_pa("120x80"), PaParse::Normalized("120x80".into()));
        assert_eq!(normalize_pa("120/80"), PaParse::Normalized("120x80".into()));
        assert_eq!(
            normalize_pa("120 X 80"),
            PaParse::Normalized("120x80".into())
        );
    }

    #[test]
    fn shorthand_is_ambiguous_never_guessed() {
        assert_eq!(normalize_pa("12/8"), PaParse::Ambiguous);
        assert_eq!(normalize_pa("13x9"), PaParse::Ambiguous);
    }

    #[test]
    fn range_edges() {
        assert_eq!(normalize_pa("70x40"), PaParse::Normalized("70x40".into()));
        assert_eq!(
            normalize_pa("260x160"),
            PaParse::Normalized("260x160".into())
        );
        assert_eq!(normalize_pa("261x80"), PaParse::Invalid);
        assert_eq!(normalize_pa("120x161"), PaParse::Invalid);
        assert_eq!(normalize_pa("120x39"), PaParse::Invalid);
    }

    #[test]
    fn garbage_is_invalid() {
        assert_eq!(normalize_pa("pressão boa"), PaParse::Invalid);
        assert_eq!(normalize_pa("120"), PaParse::Invalid);
        assert_eq!(normalize_pa(""), PaParse::Invalid);
    }
}
