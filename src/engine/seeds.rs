//! Built-in seed rules.

use crate::types::config::SeedRule;

/// Rules every fresh installation starts with, in matching order.
const DEFAULT_RULES: &[(&str, &str)] = &[
    ("hello", "Hi there!"),
    ("hi", "Hello!"),
    ("how are you", "I'm doing well, thank you!"),
    ("what's your name", "My name is Eris!"),
    ("goodbye", "Goodbye!"),
    ("bye", "See you later!"),
];

/// Returns the built-in `(input, output)` pairs.
pub fn default_rules() -> Vec<(String, String)> {
    DEFAULT_RULES
        .iter()
        .map(|(input, output)| (input.to_string(), output.to_string()))
        .collect()
}

/// Built-in rules followed by the extra ones from the configuration.
pub fn startup_rules(extra: &[SeedRule]) -> Vec<(String, String)> {
    let mut rules = default_rules();
    rules.extend(
        extra
            .iter()
            .map(|seed| (seed.input.clone(), seed.output.clone())),
    );
    rules
}
