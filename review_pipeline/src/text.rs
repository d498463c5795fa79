//! Deterministic review-text normalization.
//!
//! [`normalize`] is the cleaning function applied to every review body before
//! classification: collapse whitespace runs to a single space, strip anything
//! outside word characters and basic punctuation (`. , ! ?`), lowercase, and
//! trim. It is total (never fails) and idempotent.

/// Returns the normalized form of `raw`.
///
/// Output contains only lowercase word characters, single spaces, and the
/// punctuation set `. , ! ?`, with no leading or trailing whitespace.
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;

    for ch in raw.chars() {
        if ch.is_whitespace() {
            // Collapse runs; a leading run is dropped because nothing was
            // written yet.
            pending_space = !out.is_empty();
            continue;
        }
        for lc in ch.to_lowercase() {
            if !is_kept(lc) {
                continue;
            }
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(lc);
        }
    }

    out
}

fn is_kept(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || matches!(ch, '.' | ',' | '!' | '?')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_and_lowercases() {
        assert_eq!(
            normalize("  Great   app,\tfast\n transfers!  "),
            "great app, fast transfers!"
        );
    }

    #[test]
    fn strips_special_characters_keeps_punctuation() {
        assert_eq!(normalize("love it :) 100% #1 app?!"), "love it 100 1 app?!");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \t\n"), "");
        assert_eq!(normalize("@#$%^&*"), "");
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn output_alphabet_is_bounded(t in ".{0,64}") {
            let n = normalize(&t);
            for ch in n.chars() {
                prop_assert!(
                    ch == ' ' || ch.is_alphanumeric() || ch == '_'
                        || matches!(ch, '.' | ',' | '!' | '?'),
                    "unexpected char {ch:?} in {n:?}"
                );
            }
            prop_assert!(!n.contains("  "), "whitespace run in {n:?}");
            prop_assert_eq!(n.trim(), n.as_str());
        }

        #[test]
        fn idempotent(t in ".{0,64}") {
            let once = normalize(&t);
            prop_assert_eq!(normalize(&once), once.clone());
        }
    }
}
