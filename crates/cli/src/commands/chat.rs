//! `skycast chat`: Interactive or single-message chat mode.

use crate::bootstrap;
use skycast_agent::TurnReply;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

const EXIT_WORDS: [&str; 4] = ["exit", "quit", ":q", "q"];

pub async fn run(message: Option<String>, session: Option<String>) -> anyhow::Result<()> {
    let config = bootstrap::load_config()?;

    let session = session
        .filter(|s| !s.trim().is_empty())
        .or_else(|| config.session.default_session_id.clone().filter(|s| !s.trim().is_empty()))
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let services = bootstrap::build(config).await?;
    let graph = &services.graph;

    if let Some(msg) = message {
        // Single message mode
        eprint!("  Thinking...");
        let reply = graph.respond(Some(&session), &msg).await;
        eprint!("\r              \r");
        println!("{}", reply.answer);
        if reply.failed {
            anyhow::bail!("turn failed");
        }
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        Skycast — Interactive Mode            ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Model:     {}", services.config.provider.model);
    println!("  Session:   {session}");
    println!("  Store:     {}", services.memory.store_name());
    println!();
    println!("  Ask about your documents or the weather.");
    println!("  Type ':resume' to retry an interrupted turn, 'exit' to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if EXIT_WORDS.contains(&input.to_lowercase().as_str()) {
            break;
        }
        if input.is_empty() {
            prompt()?;
            continue;
        }

        eprint!("  ...");
        if input == ":resume" {
            match graph.resume(&session).await {
                Ok(Some(state)) => {
                    eprint!("\r     \r");
                    print_answer(state.answer().unwrap_or_default());
                }
                Ok(None) => {
                    eprint!("\r     \r");
                    println!("  Nothing to resume.");
                    println!();
                }
                Err(e) => {
                    eprint!("\r     \r");
                    eprintln!("  [Error] {}", e.user_message());
                    println!();
                }
            }
        } else {
            let reply: TurnReply = graph.respond(Some(&session), input).await;
            eprint!("\r     \r");
            if reply.failed {
                eprintln!("  [Error] {}", reply.answer);
                eprintln!("  (type ':resume' to try this turn again)");
                println!();
            } else {
                print_answer(&reply.answer);
            }
        }

        prompt()?;
    }

    println!();
    println!("  Goodbye! 👋");
    println!();
    Ok(())
}

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}

fn print_answer(answer: &str) {
    println!();
    for line in answer.lines() {
        println!("  Skycast > {line}");
    }
    println!();
}
