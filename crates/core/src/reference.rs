//! Fixed reference data: manual types, languages and product categories.

/// A code with its display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Code {
    pub code: &'static str,
    pub display: &'static str,
}

const fn code(code: &'static str, display: &'static str) -> Code {
    Code { code, display }
}

pub const MANUAL_TYPES: &[Code] = &[
    code("IM", "Instruction Manual"),
    code("SM", "Service Manual"),
    code("PM", "Parts Manual"),
    code("SPL", "Spare Parts List"),
    code("WP", "Wiring Plan"),
    code("TI", "Technical Information"),
];

/// `ma-NY` marks a multi-language document.
pub const MANUAL_LANGUAGES: &[Code] = &[
    code("ma-NY", "All Languages"),
    code("en-GB", "English (UK)"),
    code("sv-SE", "Swedish"),
    code("de-DE", "German"),
    code("da-DK", "Danish"),
    code("es-ES", "Spanish"),
    code("fi-FI", "Finnish"),
    code("fr-FR", "French"),
    code("el-GR", "Greek"),
    code("it-IT", "Italian"),
    code("nl-NL", "Dutch"),
    code("no-NO", "Norwegian"),
    code("pt-PT", "Portuguese"),
];

pub const PRODUCT_CATEGORIES: &[Code] = &[
    code("arc", "Welding Equipment"),
    code("gas", "Gas Equipment"),
    code("wel", "Welding Automation"),
    code("pls", "Manual Plasma Cutting"),
    code("cut", "Cutting Automation"),
    code("ppe", "PPE / Safety"),
    code("aac", "Accessories and Consumables"),
    code("rob", "Robotics"),
    code("arx", "Carbon Arc Gouging / Exothermic Cutting"),
];

fn lookup(table: &[Code], value: &str) -> Option<&'static str> {
    table.iter().find(|c| c.code == value).map(|c| c.display)
}

pub fn manual_type_name(code: &str) -> Option<&'static str> {
    lookup(MANUAL_TYPES, code)
}

pub fn language_name(code: &str) -> Option<&'static str> {
    lookup(MANUAL_LANGUAGES, code)
}

pub fn product_category_name(code: &str) -> Option<&'static str> {
    lookup(PRODUCT_CATEGORIES, code)
}

pub fn is_manual_type(code: &str) -> bool {
    manual_type_name(code).is_some()
}

pub fn is_language(code: &str) -> bool {
    language_name(code).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_resolve_known_codes() {
        assert_eq!(manual_type_name("SPL"), Some("Spare Parts List"));
        assert_eq!(language_name("ma-NY"), Some("All Languages"));
        assert_eq!(product_category_name("arx"), Some("Carbon Arc Gouging / Exothermic Cutting"));
    }

    #[test]
    fn lookups_are_case_sensitive() {
        assert!(!is_manual_type("im"));
        assert!(!is_language("EN-gb"));
        assert!(product_category_name("ARC").is_none());
    }
}
