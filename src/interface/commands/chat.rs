//! # Chat Command
//!
//! Handles `taskgrid chat [MESSAGE]`.
//! Runs a single turn, or an interactive loop over stdin that keeps history
//! across turns. Turns are strictly serialized. Ctrl-C cancels the running
//! turn, and at the prompt it ends the session.

use anyhow::{Result, anyhow};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::application::ToolCallLoop;
use crate::application::context::with_file_context;
use crate::domain::config::{Config, ContextLimits, Settings, load_config};
use crate::domain::error::Error;
use crate::domain::paths;
use crate::domain::session::Session;
use crate::domain::types::FileOperationResult;
use crate::infrastructure::llm::{ChatMessage, OpenRouterClient};
use crate::infrastructure::tools::{ContextCollector, FileBroker};
use crate::strings::messages;

struct ChatContext {
    session: Session,
    config: Config,
    limits: ContextLimits,
    collector: ContextCollector,
    tool_loop: ToolCallLoop,
}

pub async fn handle_chat(working_dir: &Path, settings: &Settings, message: Option<String>) -> Result<()> {
    let config = load_config(working_dir)?.ok_or_else(|| {
        anyhow!(messages::no_configuration(
            &paths::openrouter_config_path(working_dir).display().to_string()
        ))
    })?;

    let broker = FileBroker::default();
    let client = Arc::new(OpenRouterClient::from_settings(settings)?);
    let tool_loop = ToolCallLoop::new(client, broker.clone()).with_observer(Arc::new(print_operation));

    let ctx = ChatContext {
        session: Session::new(working_dir.to_string_lossy().to_string()),
        config,
        limits: settings.context,
        collector: ContextCollector::new(broker),
        tool_loop,
    };

    let mut history: Vec<ChatMessage> = Vec::new();
    let mut interrupts = interrupt_listener();

    if let Some(text) = message {
        let reply = run_turn(&ctx, &mut history, text, &mut interrupts).await?;
        println!("{}", reply);
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        // Drop interrupts that arrived as the previous turn was finishing.
        while interrupts.try_recv().is_ok() {}

        eprint!("> ");
        let Some(line) = next_input(&mut lines, &mut interrupts).await? else { break };
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text == "/exit" || text == "/quit" {
            break;
        }

        match run_turn(&ctx, &mut history, text.to_string(), &mut interrupts).await {
            Ok(reply) => println!("{}\n", reply),
            Err(e) => {
                let err = e.downcast_ref::<Error>();
                if matches!(err, Some(Error::ConfigurationMissing(_))) {
                    return Err(e);
                }
                if matches!(err, Some(Error::Cancelled)) {
                    eprintln!("{}", messages::TURN_CANCELLED);
                } else {
                    eprintln!("Error: {:#}", e);
                }
            }
        }
    }

    Ok(())
}

/// One serialized turn. The user message is kept in `history` only if the turn succeeds.
async fn run_turn(
    ctx: &ChatContext,
    history: &mut Vec<ChatMessage>,
    text: String,
    interrupts: &mut mpsc::UnboundedReceiver<()>,
) -> Result<String> {
    history.push(ChatMessage::user(text));
    let mut turn_messages =
        with_file_context(&ctx.collector, &ctx.session, history, ctx.limits).await;

    let cancel = CancellationToken::new();
    let turn = ctx
        .tool_loop
        .run_turn(&ctx.session, &ctx.config, &mut turn_messages, &cancel);
    let result = until_interrupted(turn, &cancel, interrupts).await;

    match result {
        Ok(reply) => {
            history.push(ChatMessage::assistant(reply.clone()));
            Ok(reply)
        }
        Err(e) => {
            history.pop();
            Err(e.into())
        }
    }
}

/// One Ctrl-C listener for the whole session. Once installed it replaces the
/// default SIGINT handling, so every interrupt is delivered on the channel.
fn interrupt_listener() -> mpsc::UnboundedReceiver<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if tx.send(()).is_err() {
                break;
            }
        }
    });
    rx
}

/// Next input line, or `None` on EOF or an interrupt at the prompt.
async fn next_input<R>(
    lines: &mut Lines<R>,
    interrupts: &mut mpsc::UnboundedReceiver<()>,
) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    tokio::select! {
        line = lines.next_line() => Ok(line?),
        Some(()) = interrupts.recv() => Ok(None),
    }
}

/// Drives `turn` to completion. An interrupt cancels the token and the turn
/// is still awaited, so it unwinds through its own cancellation path.
async fn until_interrupted<F>(
    turn: F,
    cancel: &CancellationToken,
    interrupts: &mut mpsc::UnboundedReceiver<()>,
) -> F::Output
where
    F: Future,
{
    tokio::pin!(turn);
    tokio::select! {
        output = &mut turn => output,
        Some(()) = interrupts.recv() => {
            cancel.cancel();
            turn.await
        }
    }
}

fn print_operation(result: &FileOperationResult) {
    eprintln!(
        "{}",
        messages::operation_line(
            result.success,
            result.kind.as_str(),
            &result.path,
            result.message.as_deref().unwrap_or_default(),
        )
    );
}
