use anyhow::Result;
use echochat_core::StreamEvent;
use std::io::{self, Write};
use tokio_util::sync::CancellationToken;

use crate::cli::{OutputFormat, SendArgs};
use crate::config::Settings;
use crate::output::json::print_json;

pub async fn run(settings: &Settings, args: SendArgs, format: OutputFormat) -> Result<()> {
    let mut consumer = super::connect(settings)?;
    let cancel = CancellationToken::new();
    let watcher = super::cancel_on_ctrl_c(&cancel);

    let mut stdout = io::stdout();
    let result = consumer
        .submit(args.message, &cancel, |event| {
            if format.is_json() {
                return;
            }
            if let StreamEvent::Chunk { delta, .. } = event {
                let _ = write!(stdout, "{}", delta);
                let _ = stdout.flush();
            }
        })
        .await;
    watcher.abort();

    if !format.is_json() {
        println!();
    }
    let reply = result?;
    if format.is_json() {
        print_json(&reply)?;
    }
    Ok(())
}
