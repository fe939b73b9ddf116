use super::EXIT_SUCCESS;
use clap::CommandFactory;
use clap_complete::Shell;
use std::io::Write;

/// Render the completion script for `shell` and print it to stdout.
pub fn run<C: CommandFactory>(shell: Shell) -> Result<u8, String> {
    let mut command = C::command();
    let bin = command.get_name().to_owned();
    let mut script = Vec::new();
    clap_complete::generate(shell, &mut command, bin, &mut script);
    std::io::stdout()
        .write_all(&script)
        .map_err(|e| format!("failed to write {shell} completions: {e}"))?;
    Ok(EXIT_SUCCESS)
}
