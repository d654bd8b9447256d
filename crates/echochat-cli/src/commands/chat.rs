use anyhow::Result;
use colored::Colorize;
use echochat_core::{ChatError, ChatRole, StreamEvent};
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::cli::OutputFormat;
use crate::config::Settings;
use crate::output::json::print_json;

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Empty,
    Quit,
    History,
    Help,
    Message(String),
}

fn parse_input(line: &str) -> Input {
    let trimmed = line.trim();
    match trimmed {
        "" => Input::Empty,
        "/quit" | "/exit" => Input::Quit,
        "/history" => Input::History,
        "/help" => Input::Help,
        _ => Input::Message(trimmed.to_string()),
    }
}

fn print_help() {
    println!("{}", "Commands:".bold());
    println!("  /history  show the conversation so far");
    println!("  /help     show this help");
    println!("  /quit     leave the chat");
    println!("  Ctrl-C while a reply streams cancels it");
}

fn prompt() -> io::Result<()> {
    let mut stdout = io::stdout();
    write!(stdout, "{} ", "you>".cyan().bold())?;
    stdout.flush()
}

pub async fn run(settings: &Settings, format: OutputFormat) -> Result<()> {
    let mut consumer = super::connect(settings)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!(
        "Connected to {} (type /help for commands)",
        settings.server_url.bold()
    );

    loop {
        prompt()?;
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            println!();
            break;
        };

        let text = match parse_input(&line) {
            Input::Empty => continue,
            Input::Quit => break,
            Input::Help => {
                print_help();
                continue;
            }
            Input::History => {
                for message in consumer.history().messages() {
                    let label = match message.role() {
                        ChatRole::User => "you>".cyan().bold(),
                        ChatRole::Assistant => "echo>".green().bold(),
                    };
                    println!("{} {}", label, message.content());
                }
                continue;
            }
            Input::Message(text) => text,
        };

        print!("{} ", "echo>".green().bold());
        io::stdout().flush()?;

        let cancel = CancellationToken::new();
        let watcher = super::cancel_on_ctrl_c(&cancel);
        let mut stdout = io::stdout();
        let result = consumer
            .submit(text, &cancel, |event| {
                if let StreamEvent::Chunk { delta, .. } = event {
                    let _ = write!(stdout, "{}", delta);
                    let _ = stdout.flush();
                }
            })
            .await;
        watcher.abort();

        match result {
            Ok(_) => println!(),
            Err(ChatError::Cancelled) => println!(" {}", "[cancelled]".dimmed()),
            Err(err) => {
                println!();
                eprintln!("{} {}", "Error:".red().bold(), err);
            }
        }
    }

    if format.is_json() {
        print_json(consumer.history())?;
    }
    Ok(())
}
