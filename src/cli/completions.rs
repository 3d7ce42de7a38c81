//! Static shell completion scripts

use std::io::Write;

use clap::CommandFactory;
use clap_complete::{Shell, generate};

use crate::cli::Cli;
use crate::error::Result;

/// Write the completion script for `shell` to `out`
pub fn write_script(shell: Shell, out: &mut dyn Write) {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    generate(shell, &mut command, name, out);
}

/// Print the completion script for `shell` to stdout
pub fn run(shell: Shell) -> Result<()> {
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    write_script(shell, &mut lock);
    lock.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bash_script_mentions_commands() {
        let mut buf = Vec::new();
        write_script(Shell::Bash, &mut buf);
        let script = String::from_utf8(buf).unwrap();

        assert!(script.contains("solvecam"));
        assert!(script.contains("analyze"));
        assert!(script.contains("--fixtures"));
    }
}
