use std::sync::Arc;

use showroom_agent::{client_from_config, AgentRuntime};
use showroom_db::{connect_with_config, migrations, SqlCatalogRepository};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::commands::{async_runtime, load_config, CommandResult};

const EXIT_WORDS: &[&str] = &["exit", "quit", "bye"];
const RESET_WORD: &str = "reset";
const CLI_SESSION_ID: &str = "cli";

pub fn run() -> CommandResult {
    let config = match load_config("chat") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match async_runtime("chat") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;
        let llm = client_from_config(&config.llm)
            .map_err(|error| ("llm_client", error.to_string(), 7u8))?;

        let agent = AgentRuntime::from_config(
            &config,
            Arc::new(SqlCatalogRepository::new(pool.clone())),
            llm,
        );
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut stdout = tokio::io::stdout();
        let turns = run_session(&agent, CLI_SESSION_ID, stdin, &mut stdout)
            .await
            .map_err(|error| ("terminal_io", error.to_string(), 8u8))?;

        tracing::info!(
            event_name = "cli.chat.ended",
            correlation_id = CLI_SESSION_ID,
            turns,
            "chat session ended"
        );
        pool.close().await;
        Ok::<usize, (&'static str, String, u8)>(turns)
    });

    match result {
        Ok(turns) => CommandResult::success("chat", format!("chat session ended after {turns} turns")),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("chat", error_class, message, exit_code)
        }
    }
}

/// Reads buyer lines until an exit word or end of input and writes each reply.
/// `reset` starts the conversation over. Returns the number of turns handled.
pub async fn run_session<R, W>(
    agent: &AgentRuntime,
    session_id: &str,
    input: R,
    output: &mut W,
) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut turns = 0;

    write_line(
        output,
        &format!("🚗 Welcome to {}! I'm your personal car assistant.", agent.brand()),
    )
    .await?;

    loop {
        output.write_all("👤 You: ".as_bytes()).await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            let farewell = agent.end_session(session_id).await;
            write_line(output, &format!("\n🤖 {farewell}")).await?;
            break;
        };
        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        let lowered = text.to_lowercase();
        if EXIT_WORDS.contains(&lowered.as_str()) {
            let farewell = agent.end_session(session_id).await;
            write_line(output, &format!("🤖 {farewell}")).await?;
            break;
        }
        if lowered == RESET_WORD {
            let message = agent.reset_session(session_id).await;
            write_line(output, &format!("🤖 {message}")).await?;
            continue;
        }

        let outcome = agent.process_turn(session_id, text).await;
        turns += 1;
        write_line(output, &format!("🤖 Assistant: {}\n", outcome.reply)).await?;
    }

    output.flush().await?;
    Ok(turns)
}

async fn write_line<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> std::io::Result<()> {
    output.write_all(text.as_bytes()).await?;
    output.write_all(b"\n").await
}
