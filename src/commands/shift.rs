//! Reader shift tracking on this device.

use clap::{Args, Subcommand};

use super::{CommandError, Engine};

/// Start, stop or inspect the meter reading shift
#[derive(Debug, Args)]
pub struct ShiftCommand {
    #[command(subcommand)]
    command: ShiftSubcommand,
}

#[derive(Debug, Subcommand)]
enum ShiftSubcommand {
    /// Open a reading shift
    Start,
    /// Close the current shift
    Stop,
    /// Show whether a shift is open
    Status,
}

impl ShiftCommand {
    pub fn run(&self, engine: &Engine) -> Result<(), CommandError> {
        let cache = engine.cache();
        let active = cache.shift_active()?;

        match self.command {
            ShiftSubcommand::Start if active => println!("A shift is already open."),
            ShiftSubcommand::Start => {
                cache.set_shift_active(true)?;
                println!("Shift started.");
            }
            ShiftSubcommand::Stop if !active => println!("No shift is open."),
            ShiftSubcommand::Stop => {
                cache.set_shift_active(false)?;
                let pending = engine.pending_writes()?.len();
                println!("Shift closed.");
                if pending > 0 {
                    println!("{} write(s) still waiting to sync.", pending);
                }
            }
            ShiftSubcommand::Status => {
                println!("Shift: {}", if active { "open" } else { "closed" });
            }
        }

        Ok(())
    }
}
