pub mod demand;
pub mod resource;
pub mod user;

use bookcal_core::ValidationErrors;
use owo_colors::OwoColorize;

/// Prints every failure on its own line, then returns an error for the exit code.
pub fn rejected(what: &str, errors: &ValidationErrors) -> anyhow::Error {
    eprintln!("{} {}:", "✗".red(), what);
    for failure in errors.iter() {
        eprintln!("    {}", failure.red());
    }
    anyhow::anyhow!("{} rejected with {} error(s)", what, errors.len())
}
