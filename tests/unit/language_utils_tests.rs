/*!
 * Tests for language utilities
 */

use subforge::language_utils::{get_language_name, normalize_to_part2t, resolve_language_name};

#[test]
fn test_normalizeToPart2t_withVariousCodes_shouldNormalize() {
    assert_eq!(normalize_to_part2t("en").unwrap(), "eng");
    assert_eq!(normalize_to_part2t("FR").unwrap(), "fra");
    assert_eq!(normalize_to_part2t("fre").unwrap(), "fra");
    assert_eq!(normalize_to_part2t("deu").unwrap(), "deu");
    assert!(normalize_to_part2t("xx").is_err());
}

#[test]
fn test_getLanguageName_withCodes_shouldReturnEnglishName() {
    assert_eq!(get_language_name("zh").unwrap(), "Chinese");
    assert_eq!(get_language_name("ja").unwrap(), "Japanese");
}

#[test]
fn test_resolveLanguageName_withNames_shouldAcceptAnyCase() {
    assert_eq!(resolve_language_name("german").unwrap(), "German");
    assert_eq!(resolve_language_name("  French ").unwrap(), "French");
    assert!(resolve_language_name("Elvish").is_err());
}
