//! Version command implementation.

use crate::config::TargetProvider;
use crate::error::Result;
use serde::Serialize;

#[derive(Serialize)]
struct VersionOutput<'a> {
    name: &'a str,
    version: &'a str,
    build: &'a str,
    providers: [&'a str; 2],
}

/// Execute the version command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(json: bool) -> Result<()> {
    let output = VersionOutput {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        build: if cfg!(debug_assertions) { "dev" } else { "release" },
        providers: [TargetProvider::Jira.as_str(), TargetProvider::Tm4j.as_str()],
    };

    if json {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!(
            "attmig {} ({}), targets: {}",
            output.version,
            output.build,
            output.providers.join(", ")
        );
    }
    Ok(())
}
