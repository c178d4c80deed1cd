//! Demo command - manage demo mode

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use super::{ensure_funnel_dir, get_logger, log_command};
use funnel_core::services::DemoService;

#[derive(Subcommand)]
pub enum DemoCommands {
    /// Enable demo mode
    #[command(name = "on")]
    On,
    /// Disable demo mode
    #[command(name = "off")]
    Off,
    /// Show demo mode status
    Status,
}

pub fn run(command: Option<DemoCommands>) -> Result<()> {
    let funnel_dir = ensure_funnel_dir()?;
    let demo_service = DemoService::new(&funnel_dir);
    let logger = get_logger();

    match command {
        Some(DemoCommands::On) => {
            log_command(&logger, "demo on");
            demo_service.enable()?;
            println!("{}", "Demo mode enabled".green());
            println!("Generated branch sheets are in use. Run 'funnel report' to see a demo report.");
        }
        Some(DemoCommands::Off) => {
            log_command(&logger, "demo off");
            demo_service.disable()?;
            println!("{}", "Demo mode disabled".yellow());
        }
        Some(DemoCommands::Status) | None => {
            if demo_service.is_enabled()? {
                println!("Demo mode is {}", "ON".green());
            } else {
                println!("Demo mode is {}", "OFF".yellow());
            }
        }
    }

    Ok(())
}
