// crates/lootforge-eval/src/adapters.rs
// ============================================================================
// Module: Soft-Metric Adapter Invocation
// Description: Invokes a configured CLIP/LPIPS/SSIM adapter for one
//   candidate, over either a subprocess or an HTTP endpoint.
// Purpose: Produce one AdapterMetric per active adapter per target,
//   without ever aborting the eval stage on an adapter failure (§4.8
//   step 3).
// Dependencies: lootforge-core, lootforge-config, reqwest, serde_json
// ============================================================================

//! ## Overview
//! [`AdapterMode::Command`] spawns a subprocess, writes the invocation as
//! JSON to its stdin, and reads a JSON response from its stdout.
//! [`AdapterMode::Http`] POSTs the same JSON shape to a configured URL.
//! Both read one top-level numeric `value` field from the response.
//! [`invoke`] never panics and never aborts the caller: every failure
//! mode — timeout, non-zero exit, malformed JSON, connection refused — is
//! folded into an `Err(String)` the eval stage records as a health
//! failure instead of a stage abort.

use std::io::Read;
use std::io::Write;
use std::process::Command;
use std::process::Stdio;
use std::sync::mpsc;
use std::time::Duration;

use lootforge_config::adapter_config::AdapterMode;
use lootforge_core::identifiers::TargetId;
use serde_json::Value;
use serde_json::json;

/// One candidate's context, as sent to an adapter.
pub struct AdapterInvocation<'a> {
    /// The target this candidate belongs to.
    pub target_id: &'a TargetId,
    /// The selected candidate's file path.
    pub candidate_path: &'a str,
}

impl AdapterInvocation<'_> {
    /// Builds the JSON request body every adapter mode sends.
    fn to_json(&self) -> Value {
        json!({ "target_id": self.target_id.as_str(), "candidate_path": self.candidate_path })
    }
}

/// Invokes `mode` for `invocation`, returning the adapter's reported
/// metric value.
///
/// # Errors
///
/// Returns a human-readable failure description on timeout, non-zero
/// exit, a non-2xx HTTP response, or a response missing a numeric
/// `value` field. [`AdapterMode::Unconfigured`] always errors.
pub fn invoke(mode: &AdapterMode, invocation: &AdapterInvocation<'_>) -> Result<f64, String> {
    match mode {
        AdapterMode::Unconfigured => Err("adapter is not configured".to_string()),
        AdapterMode::Command { command, timeout_ms } => invoke_command(command, *timeout_ms, invocation),
        AdapterMode::Http { url, timeout_ms } => invoke_http(url, *timeout_ms, invocation),
    }
}

/// Spawns `command`, writes the invocation as JSON to its stdin, and
/// parses a `value` field from its JSON stdout, bounded by `timeout_ms`.
fn invoke_command(command: &str, timeout_ms: u64, invocation: &AdapterInvocation<'_>) -> Result<f64, String> {
    let mut parts = command.split_whitespace();
    let program = parts.next().ok_or_else(|| "adapter command is empty".to_string())?;
    let args: Vec<&str> = parts.collect();
    let request = serde_json::to_vec(&invocation.to_json()).map_err(|error| error.to_string())?;

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .map_err(|error| error.to_string())?;

    if let Some(mut stdin) = child.stdin.take() {
        let _ = stdin.write_all(&request);
    }

    let (sender, receiver) = mpsc::channel();
    std::thread::spawn(move || {
        let mut stdout = String::new();
        if let Some(mut pipe) = child.stdout.take() {
            let _ = pipe.read_to_string(&mut stdout);
        }
        let status = child.wait();
        let _ = sender.send((status, stdout));
    });

    match receiver.recv_timeout(Duration::from_millis(timeout_ms)) {
        Ok((Ok(status), stdout)) if status.success() => extract_value(&stdout),
        Ok((Ok(status), _stdout)) => Err(format!("adapter command exited with status {status}")),
        Ok((Err(error), _stdout)) => Err(error.to_string()),
        Err(_timeout) => Err("adapter command timed out".to_string()),
    }
}

/// POSTs the invocation as JSON to `url` and parses a `value` field from
/// the JSON response, bounded by `timeout_ms`.
fn invoke_http(url: &str, timeout_ms: u64, invocation: &AdapterInvocation<'_>) -> Result<f64, String> {
    let client = reqwest::blocking::Client::builder().timeout(Duration::from_millis(timeout_ms)).build().map_err(|error| error.to_string())?;
    let response = client.post(url).json(&invocation.to_json()).send().map_err(|error| error.to_string())?;
    if !response.status().is_success() {
        return Err(format!("adapter http call returned status {}", response.status()));
    }
    let body = response.text().map_err(|error| error.to_string())?;
    extract_value(&body)
}

/// Parses a top-level numeric `value` field out of a JSON response body.
fn extract_value(body: &str) -> Result<f64, String> {
    let payload: Value = serde_json::from_str(body).map_err(|error| error.to_string())?;
    payload.get("value").and_then(Value::as_f64).ok_or_else(|| "adapter response is missing a numeric value field".to_string())
}
