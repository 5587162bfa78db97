//! # Tool Call Loop
//!
//! Drives one conversation turn: primary request with the file tool schema,
//! sequential execution of any requested tool calls through the `FileBroker`,
//! then exactly one follow-up request for the final answer.
//!
//! Per-tool failures never abort the turn; they are reported back to the model
//! as structured failure payloads. Configuration and transport failures do.

use serde::Deserialize;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::config::{Config, OpenRouterConfig};
use crate::domain::error::{Error, Result};
use crate::domain::session::Session;
use crate::domain::traits::FileOperationObserver;
use crate::domain::types::{FileHandleRequest, FileOperationKind, FileOperationResult};
use crate::infrastructure::llm::{
    AssistantReply, ChatCompletion, ChatMessage, ChatRequest, FileTool, ToolCall, file_tools,
};
use crate::infrastructure::tools::FileBroker;
use crate::strings::{logs, messages};

/// Arguments shared by every file tool. `reason` is informational only.
#[derive(Debug, Default, Deserialize)]
struct ToolArguments {
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

pub struct ToolCallLoop {
    client: Arc<dyn ChatCompletion>,
    broker: FileBroker,
    observer: Option<FileOperationObserver>,
}

impl ToolCallLoop {
    pub fn new(client: Arc<dyn ChatCompletion>, broker: FileBroker) -> Self {
        Self {
            client,
            broker,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: FileOperationObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Runs one turn over `history` and returns the assistant's final text.
    ///
    /// When tools are used, the assistant message and one tool message per call
    /// are appended to `history`. Turns must be serialized by the caller.
    pub async fn run_turn(
        &self,
        session: &Session,
        config: &Config,
        history: &mut Vec<ChatMessage>,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let credentials = &config.openrouter;
        if credentials.api_key.trim().is_empty() {
            return Err(Error::configuration(messages::API_KEY_MISSING));
        }
        if credentials.model.trim().is_empty() {
            return Err(Error::configuration(messages::MODEL_NOT_SELECTED));
        }

        info!("{}", logs::turn_started(&credentials.model, history.len()));

        let reply = self.request(credentials, history, cancel).await?;
        if !reply.has_tool_calls() {
            info!("{}", logs::TURN_FINISHED);
            return Ok(reply.text());
        }

        let calls: Vec<ToolCall> = reply.tool_calls().to_vec();
        info!("{}", logs::tool_round(calls.len()));
        history.push(reply.into_message());

        // Strictly in request order: a later call may depend on an earlier write.
        for call in &calls {
            let result = self.execute_tool_call(session, call, cancel).await?;
            if let Some(observer) = &self.observer {
                observer(&result);
            }
            let content = self.tool_response(session, &result, cancel).await?;
            history.push(ChatMessage::tool(&call.id, content));
        }

        let follow_up = self
            .request(credentials, history, cancel)
            .await
            .map_err(|e| e.in_context(messages::FOLLOW_UP_REQUEST))?;

        if follow_up.has_tool_calls() {
            warn!("{}", logs::EXTRA_TOOL_ROUND_IGNORED);
        }
        info!("{}", logs::TURN_FINISHED);
        Ok(follow_up.text())
    }

    async fn request(
        &self,
        credentials: &OpenRouterConfig,
        history: &[ChatMessage],
        cancel: &CancellationToken,
    ) -> Result<AssistantReply> {
        let request = ChatRequest::new(&credentials.model, history, file_tools());
        cancellable(cancel, self.client.complete(&credentials.api_key, &request)).await
    }

    /// Executes one call. Only cancellation escapes as an error; every other
    /// failure becomes a `success: false` result.
    async fn execute_tool_call(
        &self,
        session: &Session,
        call: &ToolCall,
        cancel: &CancellationToken,
    ) -> Result<FileOperationResult> {
        let name = call.function.name.as_str();
        let tool = FileTool::from_name(name);
        let kind = tool.map(|t| t.kind()).unwrap_or(FileOperationKind::Read);

        let args = match parse_arguments(&call.function.arguments) {
            Ok(args) => args,
            Err(e) => {
                let err = Error::InvalidArguments {
                    tool: name.to_string(),
                    message: e.to_string(),
                };
                warn!("{}", logs::tool_failed(name, &err.to_string()));
                return Ok(FileOperationResult::failed(
                    kind,
                    "",
                    messages::tool_error(name, &err.to_string()),
                ));
            }
        };
        let path = args.path.clone().unwrap_or_default();

        let Some(tool) = tool else {
            let err = Error::UnknownTool(name.to_string());
            warn!("{}", logs::tool_failed(name, &err.to_string()));
            return Ok(FileOperationResult::failed(kind, path, err.to_string()));
        };

        debug!(reason = args.reason.as_deref().unwrap_or(""), "{}", logs::tool_dispatch(name, &path));

        let outcome = match handle_request(tool, args) {
            Ok(request) => self.dispatch(session, &request, cancel).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(result) => Ok(result),
            Err(e) if e.aborts_turn() => Err(e),
            Err(e) => {
                warn!("{}", logs::tool_failed(name, &e.to_string()));
                Ok(FileOperationResult::failed(
                    kind,
                    path,
                    messages::tool_error(name, &e.to_string()),
                ))
            }
        }
    }

    async fn dispatch(
        &self,
        session: &Session,
        request: &FileHandleRequest,
        cancel: &CancellationToken,
    ) -> Result<FileOperationResult> {
        let kind = request.operation;
        let path = request.path.as_str();
        let full_path = session.resolve(path);

        match kind {
            FileOperationKind::Read => {
                cancellable(cancel, self.broker.read(session, &full_path)).await?;
                Ok(FileOperationResult::succeeded(kind, path, messages::read_success(path)))
            }
            FileOperationKind::Write => {
                let content = request.content.as_deref().unwrap_or_default();
                cancellable(cancel, self.broker.write(session, &full_path, content)).await?;
                Ok(FileOperationResult::succeeded(kind, path, messages::write_success(path))
                    .with_content(content))
            }
            FileOperationKind::CreateDir => {
                cancellable(cancel, self.broker.create_directory(session, &full_path)).await?;
                Ok(FileOperationResult::succeeded(kind, path, messages::create_dir_success(path)))
            }
            FileOperationKind::List => {
                let entries = cancellable(cancel, self.broker.list(session, &full_path)).await?;
                Ok(FileOperationResult::succeeded(
                    kind,
                    path,
                    messages::directory_listing(path, &entries),
                ))
            }
            FileOperationKind::Delete => {
                cancellable(cancel, self.broker.delete(session, &full_path)).await?;
                Ok(FileOperationResult::succeeded(kind, path, messages::delete_success(path)))
            }
        }
    }

    /// JSON payload for the tool-role message. Successful reads embed the file
    /// as it is now, re-read after the operation.
    async fn tool_response(
        &self,
        session: &Session,
        result: &FileOperationResult,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let message = result.message.clone().unwrap_or_default();

        let payload = if !result.success {
            json!({"success": false, "error": message})
        } else {
            match result.kind {
                FileOperationKind::Read => {
                    let full_path = session.resolve(&result.path);
                    match cancellable(cancel, self.broker.read(session, &full_path)).await {
                        Ok(content) => json!({"success": true, "path": result.path, "content": content}),
                        Err(Error::Cancelled) => return Err(Error::Cancelled),
                        Err(e) => json!({
                            "success": false,
                            "error": messages::tool_error(FileTool::ReadFile.name(), &e.to_string())
                        }),
                    }
                }
                FileOperationKind::List => {
                    json!({"success": true, "path": result.path, "directory_listing": message})
                }
                _ => json!({"success": true, "message": message}),
            }
        };

        Ok(payload.to_string())
    }
}

/// Builds the broker request for a tool call. `path` is always required;
/// `write_file` also requires `content`.
fn handle_request(tool: FileTool, args: ToolArguments) -> Result<FileHandleRequest> {
    let missing = |field: &str| Error::InvalidArguments {
        tool: tool.name().to_string(),
        message: format!("missing required argument `{field}`"),
    };

    let path = args.path.ok_or_else(|| missing("path"))?;
    let request = FileHandleRequest::new(tool.kind(), path);
    match tool {
        FileTool::WriteFile => Ok(request.with_content(args.content.ok_or_else(|| missing("content"))?)),
        _ => Ok(request),
    }
}

fn parse_arguments(raw: &str) -> serde_json::Result<ToolArguments> {
    if raw.trim().is_empty() {
        return Ok(ToolArguments::default());
    }
    serde_json::from_str(raw)
}

/// Races `fut` against the token; cancellation wins ties.
async fn cancellable<T>(cancel: &CancellationToken, fut: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = fut => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::llm::OpenRouterClient;
    use serde_json::Value;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

    /// Matches requests by whether the history already carries tool results.
    struct HasToolMessages(bool);

    impl Match for HasToolMessages {
        fn matches(&self, request: &Request) -> bool {
            let Ok(body) = serde_json::from_slice::<Value>(&request.body) else {
                return false;
            };
            let has_tool = body["messages"]
                .as_array()
                .map(|msgs| msgs.iter().any(|m| m["role"] == "tool"))
                .unwrap_or(false);
            has_tool == self.0
        }
    }

    fn text_reply(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": text}}]
        }))
    }

    fn tool_reply(calls: &[(&str, &str, Value)]) -> ResponseTemplate {
        let tool_calls: Vec<Value> = calls
            .iter()
            .map(|(id, name, args)| {
                json!({"id": id, "type": "function",
                       "function": {"name": name, "arguments": args.to_string()}})
            })
            .collect();
        ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": null, "tool_calls": tool_calls}}]
        }))
    }

    async fn mount(server: &MockServer, has_tools: bool, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(HasToolMessages(has_tools))
            .respond_with(response)
            .mount(server)
            .await;
    }

    struct Harness {
        _tmp: TempDir,
        session: Session,
        observed: Arc<Mutex<Vec<FileOperationResult>>>,
        tool_loop: ToolCallLoop,
    }

    fn harness(server: &MockServer) -> Harness {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join(".taskgrid")).unwrap();
        let session = Session::new(tmp.path().to_string_lossy().to_string());

        let client = OpenRouterClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        let observed = Arc::new(Mutex::new(Vec::new()));
        let sink = observed.clone();
        let tool_loop = ToolCallLoop::new(Arc::new(client), FileBroker::default())
            .with_observer(Arc::new(move |r: &FileOperationResult| {
                sink.lock().unwrap().push(r.clone());
            }));

        Harness { _tmp: tmp, session, observed, tool_loop }
    }

    fn config() -> Config {
        Config::new("sk-test", "openai/gpt-4o")
    }

    async fn requests(server: &MockServer) -> Vec<Value> {
        server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_plain_reply_is_single_request() {
        let server = MockServer::start().await;
        mount(&server, false, text_reply("Hello there")).await;
        let h = harness(&server);

        let mut history = vec![ChatMessage::user("hi")];
        let reply = h
            .tool_loop
            .run_turn(&h.session, &config(), &mut history, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(reply, "Hello there");
        assert_eq!(history.len(), 1);
        let sent = requests(&server).await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["tool_choice"], "auto");
        assert_eq!(sent[0]["tools"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_scenario_write_file_then_confirm() {
        let server = MockServer::start().await;
        mount(
            &server,
            false,
            tool_reply(&[("call_1", "write_file",
                json!({"path": "notes.md", "content": "hi", "reason": "user asked"}))]),
        )
        .await;
        mount(&server, true, text_reply("Created notes.md for you.")).await;
        let h = harness(&server);

        let mut history = vec![ChatMessage::user("create a file notes.md with content 'hi'")];
        let reply = h
            .tool_loop
            .run_turn(&h.session, &config(), &mut history, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(reply, "Created notes.md for you.");
        let written = std::fs::read_to_string(h.session.sandbox_root_path().join("notes.md")).unwrap();
        assert_eq!(written, "hi");
        assert_eq!(requests(&server).await.len(), 2);

        let observed = h.observed.lock().unwrap();
        assert_eq!(observed.len(), 1);
        assert_eq!(observed[0].kind, FileOperationKind::Write);
        assert!(observed[0].success);
        assert_eq!(observed[0].content.as_deref(), Some("hi"));

        assert_eq!(history.len(), 3);
        assert_eq!(history[1].role(), "assistant");
        assert_eq!(
            history[2],
            ChatMessage::tool("call_1", json!({"success": true, "message": "Successfully wrote notes.md"}).to_string())
        );
    }

    #[tokio::test]
    async fn test_scenario_traversal_is_reported_back() {
        let server = MockServer::start().await;
        mount(
            &server,
            false,
            tool_reply(&[("call_x", "read_file",
                json!({"path": "../../etc/passwd", "reason": "curious"}))]),
        )
        .await;
        mount(&server, true, text_reply("I can't access that file.")).await;
        let h = harness(&server);

        let mut history = vec![ChatMessage::user("read ../../etc/passwd")];
        let reply = h
            .tool_loop
            .run_turn(&h.session, &config(), &mut history, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(reply, "I can't access that file.");

        let sent = requests(&server).await;
        assert_eq!(sent.len(), 2);
        let tool_msg = sent[1]["messages"]
            .as_array()
            .unwrap()
            .iter()
            .find(|m| m["role"] == "tool")
            .unwrap()
            .clone();
        assert_eq!(tool_msg["tool_call_id"], "call_x");
        let payload: Value = serde_json::from_str(tool_msg["content"].as_str().unwrap()).unwrap();
        assert_eq!(payload["success"], false);
        assert!(payload["error"].as_str().unwrap().contains("Invalid file path"));

        let observed = h.observed.lock().unwrap();
        assert!(!observed[0].success);
    }

    #[tokio::test]
    async fn test_scenario_missing_api_key_makes_no_requests() {
        let server = MockServer::start().await;
        mount(&server, false, text_reply("unreachable")).await;
        let h = harness(&server);

        let mut history = vec![ChatMessage::user("hi")];
        let err = h
            .tool_loop
            .run_turn(&h.session, &Config::new("", "openai/gpt-4o"), &mut history, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ConfigurationMissing(_)));
        assert_eq!(err.to_string(), "API key is missing");
        assert!(requests(&server).await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_model_is_configuration_error() {
        let server = MockServer::start().await;
        let h = harness(&server);

        let mut history = vec![ChatMessage::user("hi")];
        let err = h
            .tool_loop
            .run_turn(&h.session, &Config::new("sk", " "), &mut history, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Model is not selected");
        assert!(requests(&server).await.is_empty());
    }

    #[tokio::test]
    async fn test_calls_run_sequentially_in_request_order() {
        let server = MockServer::start().await;
        mount(
            &server,
            false,
            tool_reply(&[
                ("c1", "create_directory", json!({"path": "tasks", "reason": "r"})),
                ("c2", "write_file", json!({"path": "tasks/a.md", "content": "first", "reason": "r"})),
                ("c3", "write_file", json!({"path": "tasks/a.md", "content": "second", "reason": "r"})),
                ("c4", "read_file", json!({"path": "tasks/a.md", "reason": "r"})),
                ("c5", "list_directory", json!({"path": "tasks", "reason": "r"})),
            ]),
        )
        .await;
        mount(&server, true, text_reply("done")).await;
        let h = harness(&server);

        let mut history = vec![ChatMessage::user("set up tasks")];
        h.tool_loop
            .run_turn(&h.session, &config(), &mut history, &CancellationToken::new())
            .await
            .unwrap();

        let kinds: Vec<FileOperationKind> = h.observed.lock().unwrap().iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                FileOperationKind::CreateDir,
                FileOperationKind::Write,
                FileOperationKind::Write,
                FileOperationKind::Read,
                FileOperationKind::List,
            ]
        );

        // assistant message + five tool messages, ids in order
        let ids: Vec<&str> = history
            .iter()
            .filter_map(|m| match m {
                ChatMessage::Tool { tool_call_id, .. } => Some(tool_call_id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(ids, vec!["c1", "c2", "c3", "c4", "c5"]);

        let read: Value = serde_json::from_str(history[5].content().unwrap()).unwrap();
        assert_eq!(read["content"], "second");

        let list: Value = serde_json::from_str(history[6].content().unwrap()).unwrap();
        assert_eq!(list["directory_listing"], "Directory tasks contains:\n- a.md");
    }

    #[tokio::test]
    async fn test_unknown_tool_and_bad_arguments_do_not_abort() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(HasToolMessages(false))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "", "tool_calls": [
                    {"id": "u1", "type": "function", "function": {"name": "run_shell", "arguments": "{\"path\":\"x\"}"}},
                    {"id": "u2", "type": "function", "function": {"name": "read_file", "arguments": "{not json"}},
                    {"id": "u3", "type": "function", "function": {"name": "write_file", "arguments": "{\"path\":\"a.md\"}"}}
                ]}}]
            })))
            .mount(&server)
            .await;
        mount(&server, true, text_reply("sorry")).await;
        let h = harness(&server);

        let mut history = vec![ChatMessage::user("do things")];
        let reply = h
            .tool_loop
            .run_turn(&h.session, &config(), &mut history, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(reply, "sorry");

        let observed = h.observed.lock().unwrap();
        assert_eq!(observed.len(), 3);
        assert!(observed.iter().all(|r| !r.success));
        assert_eq!(observed[0].message.as_deref(), Some("Unknown tool: run_shell"));
        assert!(observed[1].message.as_deref().unwrap().starts_with("Error executing read_file: Invalid arguments"));
        assert!(observed[2].message.as_deref().unwrap().contains("missing required argument `content`"));
        assert!(!h.session.sandbox_root_path().join("a.md").exists());
    }

    #[tokio::test]
    async fn test_follow_up_failure_aborts_turn() {
        let server = MockServer::start().await;
        mount(
            &server,
            false,
            tool_reply(&[("c1", "list_directory", json!({"path": ".", "reason": "look"}))]),
        )
        .await;
        mount(&server, true, ResponseTemplate::new(503).set_body_string("upstream down")).await;
        let h = harness(&server);

        let mut history = vec![ChatMessage::user("list files")];
        let err = h
            .tool_loop
            .run_turn(&h.session, &config(), &mut history, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Follow-up API request failed: upstream down");
        // history keeps everything appended before the failing call
        assert_eq!(history.len(), 3);
    }

    #[tokio::test]
    async fn test_primary_failure_leaves_history_untouched() {
        let server = MockServer::start().await;
        mount(&server, false, ResponseTemplate::new(400).set_body_string("bad request")).await;
        let h = harness(&server);

        let mut history = vec![ChatMessage::user("hi")];
        let err = h
            .tool_loop
            .run_turn(&h.session, &config(), &mut history, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TransportFailure { status: Some(400), .. }));
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_extra_tool_round_is_not_executed() {
        let server = MockServer::start().await;
        mount(
            &server,
            false,
            tool_reply(&[("c1", "write_file", json!({"path": "one.md", "content": "1", "reason": "r"}))]),
        )
        .await;
        mount(
            &server,
            true,
            tool_reply(&[("c2", "write_file", json!({"path": "two.md", "content": "2", "reason": "r"}))]),
        )
        .await;
        let h = harness(&server);

        let mut history = vec![ChatMessage::user("write two files")];
        let reply = h
            .tool_loop
            .run_turn(&h.session, &config(), &mut history, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(reply, "");
        assert_eq!(requests(&server).await.len(), 2);
        assert!(h.session.sandbox_root_path().join("one.md").exists());
        assert!(!h.session.sandbox_root_path().join("two.md").exists());
    }

    #[tokio::test]
    async fn test_cancelled_turn_sends_nothing() {
        let server = MockServer::start().await;
        mount(&server, false, text_reply("unreachable")).await;
        let h = harness(&server);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut history = vec![ChatMessage::user("hi")];
        let err = h
            .tool_loop
            .run_turn(&h.session, &config(), &mut history, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Cancelled));
        assert!(requests(&server).await.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_between_tool_calls_skips_the_rest() {
        let server = MockServer::start().await;
        mount(
            &server,
            false,
            tool_reply(&[
                ("call_1", "write_file", json!({"path": "first.md", "content": "1", "reason": "r"})),
                ("call_2", "write_file", json!({"path": "second.md", "content": "2", "reason": "r"})),
            ]),
        )
        .await;
        mount(&server, true, text_reply("unreachable")).await;
        let h = harness(&server);

        // Cancels as soon as the first call has been reported.
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let client = OpenRouterClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        let tool_loop = ToolCallLoop::new(Arc::new(client), FileBroker::default()).with_observer(Arc::new(
            move |r: &FileOperationResult| {
                sink.lock().unwrap().push(r.path.clone());
                trigger.cancel();
            },
        ));

        let mut history = vec![ChatMessage::user("write two files")];
        let err = tool_loop
            .run_turn(&h.session, &config(), &mut history, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Cancelled));
        assert_eq!(*seen.lock().unwrap(), vec!["first.md".to_string()]);
        let root = h.session.sandbox_root_path();
        assert!(root.join("first.md").exists());
        assert!(!root.join("second.md").exists());
        assert_eq!(requests(&server).await.len(), 1);
        assert!(!history.iter().any(|m| m.role() == "tool"));
    }
}
