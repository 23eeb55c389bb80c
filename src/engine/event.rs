//! Payload normalization.
//!
//! Upstream hook event shapes are not guaranteed uniform: the body may be
//! absent, flat, or nested under an envelope key, and some launchers pass
//! the tool name and input through environment variables instead. This
//! module folds all of that into one canonical [`ToolEvent`]. Parse failures
//! at any level degrade to "no tool name"; normalization never aborts an
//! invocation.

use serde_json::{Map, Value};
use tracing::debug;

/// Envelope keys searched, depth-first, for nested event shapes.
const ENVELOPE_KEYS: &[&str] = &[
    "params",
    "parameters",
    "input",
    "data",
    "event",
    "payload",
    "request",
];

const TOOL_NAME_KEYS: &[&str] = &["tool_name", "toolName", "tool", "name"];

/// Bound on envelope recursion; adversarial nesting degrades to "no name".
const MAX_SEARCH_DEPTH: usize = 8;

/// Historical environment variable names for the tool name fallback.
pub const TOOL_NAME_ENV_VARS: &[&str] = &[
    "CLAUDE_TOOL_NAME",
    "CLAUDE_TOOL",
    "ANTHROPIC_TOOL_NAME",
    "TOOL_NAME",
];

/// Historical environment variable names for the JSON-encoded tool input.
pub const TOOL_INPUT_ENV_VARS: &[&str] = &[
    "CLAUDE_TOOL_INPUT",
    "CLAUDE_TOOLINPUT",
    "ANTHROPIC_TOOL_INPUT",
    "TOOL_INPUT",
];

/// Canonical view of one intercepted tool action.
#[derive(Debug, Clone, Default)]
pub struct ToolEvent {
    tool_name: String,
    payload: Option<Value>,
}

impl ToolEvent {
    /// Build an event from the raw stdin text and the process environment.
    pub fn from_process(raw: &str) -> Self {
        Self::from_sources(
            raw,
            first_env(TOOL_NAME_ENV_VARS),
            first_env(TOOL_INPUT_ENV_VARS),
        )
    }

    /// Build an event from explicit sources. The structured payload wins;
    /// environment fallbacks fill in only keys it lacks.
    pub fn from_sources(
        raw: &str,
        env_tool_name: Option<String>,
        env_tool_input: Option<String>,
    ) -> Self {
        let mut payload: Option<Value> = serde_json::from_str(raw.trim()).ok();

        let env_name = env_tool_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        let env_input: Option<Value> = env_tool_input
            .and_then(|text| serde_json::from_str(text.trim()).ok())
            .filter(Value::is_object);

        let mut env_obj = Map::new();
        if let Some(name) = &env_name {
            env_obj.insert("tool_name".to_string(), Value::String(name.clone()));
        }
        if let Some(input) = &env_input {
            env_obj.insert("tool_input".to_string(), input.clone());
        }

        if !env_obj.is_empty() {
            payload = match payload {
                Some(Value::Object(mut map)) => {
                    for (key, value) in env_obj {
                        map.entry(key).or_insert(value);
                    }
                    Some(Value::Object(map))
                }
                // A non-object body cannot carry the fallback keys.
                _ => Some(Value::Object(env_obj)),
            };
        }

        let tool_name = payload
            .as_ref()
            .map(|value| find_tool_name(value, 0))
            .unwrap_or_default();

        Self { tool_name, payload }
    }

    /// Resolved tool name; empty when none was found anywhere.
    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    /// Target file path for file-modification tools.
    pub fn file_path(&self) -> Option<String> {
        self.nested_input_str(&["file_path", "filePath"])
    }

    /// Command line for shell-execution tools.
    pub fn command(&self) -> Option<String> {
        self.nested_input_str(&["command", "cmd"])
    }

    fn nested_input_str(&self, keys: &[&str]) -> Option<String> {
        let obj = self.payload.as_ref()?.as_object()?;
        if let Some(found) = input_str(obj, keys) {
            return Some(found);
        }
        for envelope in ENVELOPE_KEYS {
            if let Some(Value::Object(inner)) = obj.get(*envelope) {
                if let Some(found) = input_str(inner, keys) {
                    return Some(found);
                }
            }
        }
        None
    }
}

fn input_str(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    let input = map
        .get("tool_input")
        .and_then(Value::as_object)
        .or_else(|| map.get("toolInput").and_then(Value::as_object))?;
    for key in keys {
        if let Some(Value::String(text)) = input.get(*key) {
            let text = text.trim();
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
    }
    None
}

fn find_tool_name(value: &Value, depth: usize) -> String {
    if depth > MAX_SEARCH_DEPTH {
        return String::new();
    }
    match value {
        Value::Object(map) => {
            for key in TOOL_NAME_KEYS {
                match map.get(*key) {
                    Some(Value::String(name)) if !name.trim().is_empty() => {
                        return name.trim().to_string();
                    }
                    Some(Value::Object(inner)) => {
                        for inner_key in ["tool_name", "toolName", "name"] {
                            if let Some(Value::String(name)) = inner.get(inner_key) {
                                if !name.trim().is_empty() {
                                    return name.trim().to_string();
                                }
                            }
                        }
                    }
                    _ => {}
                }
            }
            for envelope in ENVELOPE_KEYS {
                if let Some(inner) = map.get(*envelope) {
                    let name = find_tool_name(inner, depth + 1);
                    if !name.is_empty() {
                        return name;
                    }
                }
            }
            String::new()
        }
        Value::Array(items) => {
            for item in items {
                let name = find_tool_name(item, depth + 1);
                if !name.is_empty() {
                    return name;
                }
            }
            String::new()
        }
        _ => String::new(),
    }
}

fn first_env(keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Ok(value) = std::env::var(key) {
            if !value.trim().is_empty() {
                debug!(
                    var = key,
                    value = %redact_env_value(key, &value),
                    "using environment fallback"
                );
                return Some(value);
            }
        }
    }
    None
}

/// Redact environment values whose key suggests a credential.
pub fn redact_env_value(key: &str, value: &str) -> String {
    const SENSITIVE: &[&str] = &["TOKEN", "KEY", "SECRET", "PASSWORD"];
    let upper = key.to_ascii_uppercase();
    if SENSITIVE.iter().any(|marker| upper.contains(marker)) {
        "<redacted>".to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn event_from(value: Value) -> ToolEvent {
        ToolEvent::from_sources(&value.to_string(), None, None)
    }

    #[test]
    fn test_top_level_tool_name() {
        let event = event_from(json!({"tool_name": "Write", "tool_input": {}}));
        assert_eq!(event.tool_name(), "Write");
    }

    #[test]
    fn test_camel_case_and_alias_keys() {
        assert_eq!(event_from(json!({"toolName": "Bash"})).tool_name(), "Bash");
        assert_eq!(event_from(json!({"tool": "Grep"})).tool_name(), "Grep");
        assert_eq!(event_from(json!({"name": "Read"})).tool_name(), "Read");
    }

    #[test]
    fn test_tool_name_inside_object_value() {
        let event = event_from(json!({"tool": {"name": "Edit"}}));
        assert_eq!(event.tool_name(), "Edit");
    }

    #[test]
    fn test_tool_name_under_envelope_keys() {
        let event = event_from(json!({"params": {"request": {"tool_name": "Write"}}}));
        assert_eq!(event.tool_name(), "Write");

        let event = event_from(json!({"data": [{"irrelevant": 1}, {"toolName": "Bash"}]}));
        assert_eq!(event.tool_name(), "Bash");
    }

    #[test]
    fn test_search_depth_is_bounded() {
        let mut value = json!({"tool_name": "Write"});
        for _ in 0..20 {
            value = json!({"payload": value});
        }
        let event = event_from(value);
        assert_eq!(event.tool_name(), "");
    }

    #[test]
    fn test_malformed_input_degrades_to_empty_event() {
        let event = ToolEvent::from_sources("{not json", None, None);
        assert_eq!(event.tool_name(), "");
        assert_eq!(event.file_path(), None);
        assert_eq!(event.command(), None);
    }

    #[test]
    fn test_env_fallback_when_payload_absent() {
        let event = ToolEvent::from_sources(
            "",
            Some("Write".to_string()),
            Some(r#"{"file_path": "src/x.py"}"#.to_string()),
        );
        assert_eq!(event.tool_name(), "Write");
        assert_eq!(event.file_path(), Some("src/x.py".to_string()));
    }

    #[test]
    fn test_payload_wins_over_env_fallback() {
        let raw = json!({"tool_name": "Bash", "tool_input": {"command": "ls"}}).to_string();
        let event = ToolEvent::from_sources(
            &raw,
            Some("Write".to_string()),
            Some(r#"{"file_path": "src/x.py"}"#.to_string()),
        );
        assert_eq!(event.tool_name(), "Bash");
        assert_eq!(event.command(), Some("ls".to_string()));
        assert_eq!(event.file_path(), None);
    }

    #[test]
    fn test_env_fills_missing_keys_only() {
        let raw = json!({"tool_name": "Write"}).to_string();
        let event = ToolEvent::from_sources(
            &raw,
            Some("Bash".to_string()),
            Some(r#"{"file_path": "src/x.py"}"#.to_string()),
        );
        assert_eq!(event.tool_name(), "Write");
        assert_eq!(event.file_path(), Some("src/x.py".to_string()));
    }

    #[test]
    fn test_unparseable_env_input_is_ignored() {
        let event = ToolEvent::from_sources("", Some("Write".to_string()), Some("{bad".to_string()));
        assert_eq!(event.tool_name(), "Write");
        assert_eq!(event.file_path(), None);
    }

    #[test]
    fn test_file_path_and_command_extraction() {
        let event = event_from(json!({
            "tool_name": "Write",
            "toolInput": {"filePath": "  a/b.rs  "}
        }));
        assert_eq!(event.file_path(), Some("a/b.rs".to_string()));

        let event = event_from(json!({
            "request": {"tool_input": {"cmd": "git status"}}
        }));
        assert_eq!(event.command(), Some("git status".to_string()));
    }

    #[test]
    fn test_redaction() {
        assert_eq!(
            redact_env_value("ANTHROPIC_API_KEY", "sk-123"),
            "<redacted>"
        );
        assert_eq!(redact_env_value("MY_SECRET", "hunter2"), "<redacted>");
        assert_eq!(redact_env_value("GH_TOKEN", "abc"), "<redacted>");
        assert_eq!(redact_env_value("CLAUDE_TOOL_NAME", "Write"), "Write");
    }
}
