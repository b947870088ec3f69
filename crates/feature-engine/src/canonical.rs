//! Text Canonicalization

use deunicode::deunicode;

/// Strip diacritics and uppercase a free-text name.
///
/// `"Chamartín"` becomes `"CHAMARTIN"`, `"Peñagrande"` becomes `"PENAGRANDE"`.
/// Whitespace and punctuation are kept as-is so that names such as
/// `"Fuencarral-El Pardo"` line up with the training columns.
pub fn canonicalize(text: &str) -> String {
    deunicode(text).to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strips_accents_and_uppercases() {
        assert_eq!(canonicalize("Chamartín"), "CHAMARTIN");
        assert_eq!(canonicalize("Tetuán"), "TETUAN");
        assert_eq!(canonicalize("Vicálvaro"), "VICALVARO");
        assert_eq!(canonicalize("Peñagrande"), "PENAGRANDE");
    }

    #[test]
    fn test_keeps_separators() {
        assert_eq!(canonicalize("Fuencarral-El Pardo"), "FUENCARRAL-EL PARDO");
        assert_eq!(canonicalize("San Blas-Canillejas"), "SAN BLAS-CANILLEJAS");
    }

    #[test]
    fn test_does_not_trim() {
        assert_eq!(canonicalize(" Retiro "), " RETIRO ");
    }

    proptest! {
        #[test]
        fn prop_canonicalize_is_idempotent(text in "\\PC{0,32}") {
            let once = canonicalize(&text);
            prop_assert_eq!(canonicalize(&once), once);
        }

        #[test]
        fn prop_canonical_form_is_ascii(text in "[a-zA-ZáéíóúüñÁÉÍÓÚÑ -]{0,32}") {
            prop_assert!(canonicalize(&text).is_ascii());
        }
    }
}
