//! Challenge command - print the texts a hub accepts

use anyhow::Result;
use hubkit_lib::ChallengeTextProvider;

use crate::ui;

pub fn run(server_name: &str, verbose: bool) -> Result<()> {
    let challenges = ChallengeTextProvider::new(server_name);

    ui::header(&format!("Challenges for {}", challenges.server_name()));
    ui::key_value("Current", &challenges.current());
    for legacy in challenges.legacy() {
        ui::key_value("Legacy", &legacy);
    }

    if verbose {
        ui::info("Legacy tokens may sign any of these; v1 tokens embed one as hubChallenge");
    }
    Ok(())
}
