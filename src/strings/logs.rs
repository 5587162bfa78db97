pub fn turn_started(model: &str, messages: usize) -> String {
    format!("Starting turn with model {model} ({messages} messages)")
}

pub fn tool_round(count: usize) -> String {
    format!("Model requested {count} tool call(s)")
}

pub fn tool_dispatch(name: &str, path: &str) -> String {
    format!("Executing tool {name} on {path}")
}

pub fn tool_failed(name: &str, err: &str) -> String {
    format!("Tool {name} failed: {err}")
}

pub const EXTRA_TOOL_ROUND_IGNORED: &str =
    "Follow-up response requested more tool calls; only one tool round per turn is executed";

pub const TURN_FINISHED: &str = "Turn finished";

pub fn context_injected(files: usize, skipped: usize) -> String {
    format!("Injected file context: {files} file(s), {skipped} skipped")
}

pub fn logging_to(dir: &str) -> String {
    format!("Writing session log to {dir}")
}
