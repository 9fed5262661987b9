//! Interactive console chat with the bot.

use crate::app::build_bot;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::Result;
use crate::transport::console::{parse_line, ConsoleLine, ConsoleOutbox};
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
pub async fn run_chat(model: Option<String>, mut settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Bot, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'mediabot doctor' for detailed diagnostics.");
        return Err(e);
    }

    if let Some(model) = model {
        settings.llm.model = model;
    }
    let bot = build_bot(&settings)?;
    let outbox = ConsoleOutbox;

    println!("\n{}", style("mediabot chat").bold().cyan());
    println!(
        "{}",
        style("Type a message or a link, '#data' to press a button, 'file <path>' to upload, 'exit' to quit.").dim()
    );
    println!("{}\n", style("Try /start for the menu.").dim());

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        match parse_line(&input) {
            ConsoleLine::Empty => continue,
            ConsoleLine::Quit => {
                Output::info("Goodbye!");
                break;
            }
            ConsoleLine::Event(inbound) => {
                if let Err(e) = bot.handle(inbound, &outbox).await {
                    Output::error(&format!("Error: {}", e));
                }
                println!();
            }
        }
    }

    Ok(())
}
