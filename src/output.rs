//! Shared output formatting for ticker commands.

use serde::Serialize;

use crate::error::{exit_codes, Error, Result};

pub const SCHEMA_VERSION: &str = "ticker.v1";

/// Subcommands whose name is reported together with their parent
const NESTED_COMMANDS: &[&str] = &["depends"];

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone)]
pub struct HumanOutput {
    header: String,
    summary: Vec<(String, String)>,
    details: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            summary: Vec::new(),
            details: Vec::new(),
            warnings: Vec::new(),
            next_steps: Vec::new(),
        }
    }

    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.summary.push((key.into(), value.into()));
    }

    pub fn push_detail(&mut self, value: impl Into<String>) {
        self.details.push(value.into());
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }

    /// Record a warning only when one is present
    pub fn push_optional_warning(&mut self, value: Option<String>) {
        if let Some(value) = value {
            self.warnings.push(value);
        }
    }

    pub fn push_next_step(&mut self, value: impl Into<String>) {
        self.next_steps.push(value.into());
    }
}

#[derive(Serialize)]
struct SuccessEnvelope<'a, T: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    status: &'static str,
    data: &'a T,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    next_steps: Vec<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
    code: i32,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    schema_version: &'static str,
    command: &'a str,
    status: &'static str,
    error: ErrorBody<'a>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    next_steps: Vec<String>,
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        let payload = SuccessEnvelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "success",
            data,
            warnings: human.map(|h| h.warnings.clone()).unwrap_or_default(),
            next_steps: human.map(|h| h.next_steps.clone()).unwrap_or_default(),
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if let Some(human) = human {
        if options.quiet {
            // Unsaved-change warnings are still reported under --quiet
            for warning in &human.warnings {
                eprintln!("warning: {warning}");
            }
            return Ok(());
        }
        println!("{}", format_human(human));
    }

    Ok(())
}

pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let next_steps = error_next_steps(err);
    if json {
        let payload = ErrorEnvelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "error",
            error: ErrorBody {
                message: &err.to_string(),
                code: err.exit_code(),
                kind: error_kind(err),
                details: err.details(),
            },
            next_steps,
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    eprintln!("error: {err}");
    if let Some(hint) = next_steps.first() {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

pub fn format_human(output: &HumanOutput) -> String {
    let mut lines = vec![output.header.clone()];

    push_summary(&mut lines, &output.summary);
    push_section(&mut lines, "Details", &output.details);
    push_section(&mut lines, "Warnings", &output.warnings);
    push_section(&mut lines, "Next steps", &output.next_steps);

    lines.join("\n")
}

pub fn infer_command_name_from_args() -> String {
    infer_command_name(std::env::args().skip(1))
}

/// Command name for error envelopes, e.g. `list` or `depends clear`.
/// Values of global flags that take an argument are skipped.
pub fn infer_command_name<I>(args: I) -> String
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let Some(command) = next_positional(&mut args) else {
        return "ticker".to_string();
    };

    if NESTED_COMMANDS.contains(&command.as_str()) {
        if let Some(sub) = next_positional(&mut args) {
            return format!("{command} {sub}");
        }
    }
    command
}

fn next_positional(args: &mut impl Iterator<Item = String>) -> Option<String> {
    while let Some(arg) = args.next() {
        if arg == "--dir" {
            args.next();
            continue;
        }
        if arg.starts_with('-') {
            continue;
        }
        return Some(arg);
    }
    None
}

fn error_kind(err: &Error) -> &'static str {
    match err.exit_code() {
        exit_codes::USER_ERROR => "user_error",
        exit_codes::RULE_BLOCKED => "rule_blocked",
        _ => "operation_failed",
    }
}

fn error_next_steps(err: &Error) -> Vec<String> {
    match err {
        Error::TaskNotFound(_) | Error::AmbiguousId { .. } | Error::StaleView => {
            vec!["ticker list".to_string()]
        }
        Error::DependencyNotFound(_) => vec!["ticker list --status pending".to_string()],
        Error::DependencyUnmet { dependency_id, .. } => {
            vec![format!("ticker toggle {dependency_id}")]
        }
        Error::DependencyMissing { .. } => {
            vec!["ticker depends clear <id>".to_string()]
        }
        Error::UnmetDueDateOrder { dependency_due, .. } => {
            vec![format!("ticker add <title> --due {dependency_due} --depends-on <id>")]
        }
        Error::InvalidConfig(_) => vec!["fix ticker.toml then retry".to_string()],
        _ => Vec::new(),
    }
}

fn push_summary(lines: &mut Vec<String>, summary: &[(String, String)]) {
    if summary.is_empty() {
        return;
    }

    lines.push(String::new());
    lines.push("Summary:".to_string());
    for (key, value) in summary {
        if value.is_empty() {
            lines.push(format!("- {key}"));
        } else {
            lines.push(format!("- {key}: {value}"));
        }
    }
}

fn push_section(lines: &mut Vec<String>, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }

    lines.push(String::new());
    lines.push(format!("{title}:"));
    for item in items {
        lines.push(format!("- {item}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn infers_plain_and_nested_commands() {
        assert_eq!(infer_command_name(args(&[])), "ticker");
        assert_eq!(infer_command_name(args(&["--json", "list"])), "list");
        assert_eq!(
            infer_command_name(args(&["--dir", "/tmp/data", "toggle", "abcd"])),
            "toggle"
        );
        assert_eq!(
            infer_command_name(args(&["depends", "--json", "clear", "abcd"])),
            "depends clear"
        );
    }

    #[test]
    fn error_kinds_follow_exit_codes() {
        assert_eq!(error_kind(&Error::EmptyTitle), "user_error");
        assert_eq!(
            error_kind(&Error::DependencyMissing {
                dependency_id: "x".to_string()
            }),
            "rule_blocked"
        );
        assert_eq!(
            error_kind(&Error::OperationFailed("boom".to_string())),
            "operation_failed"
        );
    }

    #[test]
    fn dependency_errors_suggest_next_step() {
        let unmet = Error::DependencyUnmet {
            dependency_id: "abc".to_string(),
            dependency_title: "A".to_string(),
        };
        assert_eq!(error_next_steps(&unmet), vec!["ticker toggle abc"]);
        assert!(error_next_steps(&Error::EmptyTitle).is_empty());
    }
}
