use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    ChatEvent, ChatSession, DialogueController, HttpComplaintClient, Message, OverlapPolicy,
    Sender,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::{self, error::RecvError},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::load_settings;

/// Terminal front end for the complaint assistant.
#[derive(Parser, Debug)]
#[command(name = "complaint_bot")]
struct Args {
    /// TOML settings file (default: ./complaint_bot.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Base URL of the complaint service.
    #[arg(long)]
    service_url: Option<String>,
    #[arg(long)]
    typing_delay_ms: Option<u64>,
    /// Refuse new input until the previous reply has been shown.
    #[arg(long)]
    reject_while_typing: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(url) = args.service_url {
        settings.service_url = url;
    }
    if let Some(delay) = args.typing_delay_ms {
        settings.typing_delay_ms = delay;
    }
    if args.reject_while_typing {
        settings.overlap_policy = OverlapPolicy::Reject;
    }
    settings.validate()?;

    let service = HttpComplaintClient::new(&settings.service_url, settings.request_timeout())
        .context("failed to build complaint service client")?;
    info!(service_url = %service.base_url(), "complaint service configured");

    let controller = DialogueController::new(Arc::new(service));
    for message in controller.transcript().messages() {
        print_message(message);
    }

    let session = ChatSession::spawn(controller, settings.session_options());
    let renderer = tokio::spawn(render_events(session.subscribe()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read input")? {
        if let Err(error) = session.submit(line) {
            warn!(%error, "input not accepted");
            println!("!! {error}");
        }
    }

    session.close().await;
    renderer.await.context("renderer task failed")?;
    Ok(())
}

async fn render_events(mut events: broadcast::Receiver<ChatEvent>) {
    loop {
        match events.recv().await {
            Ok(ChatEvent::Typing) => println!("bot is typing..."),
            Ok(ChatEvent::BotMessage(message)) => print_message(&message),
            Ok(ChatEvent::UserMessage(_) | ChatEvent::Idle) => {}
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "renderer fell behind"),
            Err(RecvError::Closed) => break,
        }
    }
}

fn print_message(message: &Message) {
    let prefix = match message.sender {
        Sender::Bot => "bot> ",
        Sender::User => "you> ",
    };
    for (index, line) in message.text.lines().enumerate() {
        if index == 0 {
            println!("{prefix}{line}");
        } else {
            println!("{:width$}{line}", "", width = prefix.len());
        }
    }
}
