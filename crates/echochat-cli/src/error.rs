use colored::Colorize;

pub fn handle_error(err: anyhow::Error) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), err);

    let msg = format!("{:#}", err).to_lowercase();

    if msg.contains("connection refused") || msg.contains("error sending request") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Make sure the server is running:");
        eprintln!("  {} echochat-server", "$".dimmed());
        eprintln!("  or point the client at it with --server <URL>.");
    }

    if msg.contains("no chunk received") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  The server stopped sending. Raise the limit with --timeout <SECS>");
        eprintln!("  or disable it with --timeout 0.");
    }

    if msg.contains("limit is") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Shorten the message; the server caps message length.");
    }

    std::process::exit(1);
}
