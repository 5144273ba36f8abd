//! Integration tests for the generation orchestrator with a scripted
//! inference client and a recording notifier.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::uninlined_format_args
)]

use marginalia::config::{MarginaliaConfig, PromptSlot};
use marginalia::context::ConversationContextStore;
use marginalia::llm::{GenerateOutcome, GenerateRequest, InferenceClient};
use marginalia::observability::Notifier;
use marginalia::services::GenerationService;
use marginalia::vault::FsVault;
use marginalia::{Error, Result};
use std::fs;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Inference stub that records requests and plays back a scripted outcome.
struct ScriptedClient {
    reachable: bool,
    outcome: Result<GenerateOutcome>,
    requests: Arc<Mutex<Vec<GenerateRequest>>>,
}

impl ScriptedClient {
    fn ok(response: &str, context: Option<Vec<i64>>) -> Self {
        Self {
            reachable: true,
            outcome: Ok(GenerateOutcome {
                response: response.to_string(),
                context,
            }),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn failing() -> Self {
        Self {
            reachable: true,
            outcome: Err(Error::OperationFailed {
                operation: "ollama_generate".to_string(),
                cause: "API returned status: 500".to_string(),
            }),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl InferenceClient for ScriptedClient {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn endpoint(&self) -> &str {
        "http://scripted:11434"
    }

    fn check_connection(&self) -> bool {
        self.reachable
    }

    fn generate(&self, request: &GenerateRequest) -> Result<GenerateOutcome> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.outcome {
            Ok(outcome) => Ok(outcome.clone()),
            Err(_) => Err(Error::OperationFailed {
                operation: "ollama_generate".to_string(),
                cause: "API returned status: 500".to_string(),
            }),
        }
    }
}

#[derive(Default, Clone)]
struct RecordingNotifier(Arc<Mutex<Vec<String>>>);

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.0.lock().unwrap().push(message.to_string());
    }
}

impl RecordingNotifier {
    fn messages(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

fn vault_with(files: &[(&str, &str)]) -> (TempDir, FsVault) {
    let dir = TempDir::new().expect("temp dir");
    for (path, content) in files {
        let full = dir.path().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).expect("create dirs");
        }
        fs::write(full, content).expect("write note");
    }
    let vault = FsVault::new(dir.path());
    (dir, vault)
}

fn base_config() -> MarginaliaConfig {
    MarginaliaConfig::default().with_model("llama3.2")
}

#[test]
fn test_full_pipeline_sends_expanded_filtered_text() {
    let note_body = "Entry text ![[Facts]]\n\n> [!ai] Reflection\n> stale answer";
    let (_dir, vault) = vault_with(&[
        ("today.md", note_body),
        ("Facts.md", "useful facts"),
    ]);
    let client = ScriptedClient::ok("fresh answer", None);
    let requests = Arc::clone(&client.requests);
    let service = GenerationService::new(base_config(), vault, client);

    let answer = service.generate("today.md", note_body, "reflection");
    assert_eq!(answer.as_deref(), Some("fresh answer"));

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let sent = &requests[0];
    assert_eq!(sent.model, "llama3.2");
    assert!(!sent.system.is_empty());
    assert!(sent.prompt.contains("Entry text"));
    assert!(sent.prompt.contains("useful facts"));
    assert!(!sent.prompt.contains("stale answer"));
}

#[test]
fn test_prompt_file_parameters_reach_the_request() {
    let (_dir, vault) = vault_with(&[
        ("note.md", "---\nprompt-file: prompts/deep.md\n---\nbody"),
        (
            "prompts/deep.md",
            "---\nmodel: qwen2\nnum_ctx: 8192\ntemperature: 0.2\ntop_p: 0.9\nrepeat_penalty: 1.2\n---\nThink deeply.",
        ),
    ]);
    let client = ScriptedClient::ok("out", None);
    let requests = Arc::clone(&client.requests);
    let config = base_config();
    let service = GenerationService::new(config, vault, client);

    assert!(service.generate("note.md", "body", "reflection").is_some());

    let requests = requests.lock().unwrap();
    let sent = &requests[0];
    assert_eq!(sent.model, "qwen2");
    assert_eq!(sent.system, "Think deeply.");
    assert_eq!(sent.num_ctx, Some(8192));
    assert_eq!(sent.temperature, Some(0.2));
    assert_eq!(sent.top_p, Some(0.9));
    assert_eq!(sent.repeat_penalty, Some(1.2));
}

#[test]
fn test_continuous_context_round_trip_and_expiry() {
    let (_dir, vault) = vault_with(&[
        ("note.md", "---\nprompt-file: prompts/chat.md\n---\nbody"),
        ("prompts/chat.md", "---\ncontinuous: true\n---\nKeep chatting."),
    ]);
    let client = ScriptedClient::ok("reply", Some(vec![11, 22, 33]));
    let requests = Arc::clone(&client.requests);
    let store = Arc::new(ConversationContextStore::new());
    let service = GenerationService::new(base_config(), vault, client)
        .with_context_store(Arc::clone(&store));

    assert!(service.generate("note.md", "body", "reflection").is_some());
    let key = ConversationContextStore::key("note.md", "prompts/chat.md");
    assert_eq!(store.get(&key), Some(vec![11, 22, 33]));

    assert!(service.generate("note.md", "body again", "reflection").is_some());
    let requests = requests.lock().unwrap();
    assert!(requests[0].context.is_none());
    assert_eq!(requests[1].context, Some(vec![11, 22, 33]));
}

#[test]
fn test_empty_continuation_tokens_clear_the_entry() {
    let (_dir, vault) = vault_with(&[
        ("note.md", "---\nprompt-file: prompts/chat.md\n---\nbody"),
        ("prompts/chat.md", "---\ncontinuous: true\n---\nKeep chatting."),
    ]);
    let store = Arc::new(ConversationContextStore::new());
    let key = ConversationContextStore::key("note.md", "prompts/chat.md");
    store.put(&key, vec![1, 2]);

    let client = ScriptedClient::ok("reply", None);
    let service = GenerationService::new(base_config(), vault, client)
        .with_context_store(Arc::clone(&store));

    assert!(service.generate("note.md", "body", "reflection").is_some());
    assert_eq!(store.get(&key), None);
}

#[test]
fn test_unreachable_server_notifies_and_aborts() {
    let (_dir, vault) = vault_with(&[("note.md", "body")]);
    let client = ScriptedClient {
        reachable: false,
        ..ScriptedClient::ok("x", None)
    };
    let requests = Arc::clone(&client.requests);
    let notifier = RecordingNotifier::default();
    let service = GenerationService::new(base_config(), vault, client)
        .with_notifier(Box::new(notifier.clone()));

    assert!(service.generate("note.md", "body", "reflection").is_none());
    assert!(requests.lock().unwrap().is_empty());
    assert!(
        notifier
            .messages()
            .iter()
            .any(|m| m.contains("unreachable"))
    );
}

#[test]
fn test_inference_failure_surfaces_as_none() {
    let (_dir, vault) = vault_with(&[("note.md", "body")]);
    let notifier = RecordingNotifier::default();
    let service = GenerationService::new(base_config(), vault, ScriptedClient::failing())
        .with_notifier(Box::new(notifier.clone()));

    assert!(service.generate("note.md", "body", "reflection").is_none());
    assert!(notifier.messages().iter().any(|m| m.contains("failed")));
}

#[test]
fn test_unknown_prompt_key_notifies() {
    let (_dir, vault) = vault_with(&[("note.md", "body")]);
    let notifier = RecordingNotifier::default();
    let service = GenerationService::new(base_config(), vault, ScriptedClient::ok("x", None))
        .with_notifier(Box::new(notifier.clone()));

    assert!(service.generate("note.md", "body", "missing-key").is_none());
    assert!(
        notifier
            .messages()
            .iter()
            .any(|m| m.contains("missing-key"))
    );
}

#[test]
fn test_missing_model_notifies_configuration_error() {
    let (_dir, vault) = vault_with(&[("note.md", "body")]);
    let notifier = RecordingNotifier::default();
    let service =
        GenerationService::new(MarginaliaConfig::default(), vault, ScriptedClient::ok("x", None))
            .with_notifier(Box::new(notifier.clone()));

    assert!(service.generate("note.md", "body", "reflection").is_none());
    assert!(
        notifier
            .messages()
            .iter()
            .any(|m| m.contains("no model configured"))
    );
}

#[test]
fn test_custom_slot_excluded_callouts_apply() {
    let mut config = base_config();
    config.add_prompt(
        "summary",
        PromptSlot {
            display_label: "Summary".to_string(),
            prompt_file: None,
            callout_heading: Some("[!ai] Summary".to_string()),
            exclude_callout_types: Some("ai\nsummary".to_string()),
        },
    );
    let body = "text\n> [!summary] old\n> drop this\nmore";
    let (_dir, vault) = vault_with(&[("note.md", body)]);
    let client = ScriptedClient::ok("new summary", None);
    let requests = Arc::clone(&client.requests);
    let service = GenerationService::new(config, vault, client);

    let answer = service.generate("note.md", body, "summary");
    assert!(answer.is_some());
    let requests = requests.lock().unwrap();
    assert!(!requests[0].prompt.contains("drop this"));
    assert!(requests[0].prompt.contains("more"));

    assert_eq!(
        service.format_response("new summary", "summary"),
        "> [!ai] Summary\n> new summary"
    );
}
