use anyhow::Result;
use vergen::{vergen, Config};

fn main() -> Result<()> {
    // Generate the default 'cargo:' instruction output, without the git
    // entries when building outside of a repository
    if vergen(Config::default()).is_err() {
        let mut config = Config::default();
        *config.git_mut().enabled_mut() = false;
        vergen(config)?;
    }
    Ok(())
}
