//! Interactive chat loop.

use mdteam_core::{ChatError, ChatService};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

/// Run the chat loop on stdin/stdout until `exit` or end of input.
pub async fn run_interactive(service: &ChatService, chat_id: &str) -> anyhow::Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    run_loop(service, chat_id, stdin, &mut stdout).await
}

async fn run_loop<R, W>(
    service: &ChatService,
    chat_id: &str,
    input: R,
    out: &mut W,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "Medical Chat (type 'exit' to quit)")?;
    writeln!(out, "Conversation: {}\n", chat_id)?;

    let mut lines = input.lines();
    loop {
        write!(out, "\x1b[1;34mYou:\x1b[0m ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };
        if line.trim().eq_ignore_ascii_case("exit") {
            break;
        }

        match service.handle(chat_id, &line).await {
            Ok(reply) => writeln!(out, "\n\x1b[1;32mBot:\x1b[0m {}\n", reply.reply)?,
            Err(ChatError::EmptyMessage) => continue,
            Err(e) => writeln!(out, "\n\x1b[31mError:\x1b[0m {}\n", e)?,
        }
    }
    Ok(())
}
