//! APK release stager - builds, aligns, signs and publishes Unity Android packages.

use apk_release_stager::cli::{self, OutputManager};
use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Run CLI and get exit code
    let exit_code = match cli::run().await {
        Ok(code) => code,
        Err(e) => {
            let output = OutputManager::new(false, false);
            output.error(&format!("Error: {e}"));
            for suggestion in e.recovery_suggestions() {
                output.error(&format!("hint: {suggestion}"));
            }
            e.exit_code()
        }
    };

    process::exit(exit_code);
}
