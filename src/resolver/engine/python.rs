// Python driver engine - drives provisioned packages through an
// out-of-process interpreter
//
// Each resolve call is one driver-script invocation. The driver prints a
// single JSON object on stdout:
//
//   {"ok": true, "result": ...}
//   {"ok": false, "error": "...", "traceback": "..."}
//
// Anything the runtime writes to stderr is forwarded to the host log
// sink; runtime tracebacks are captured with Python's own traceback
// module and logged on the host side.

use std::path::{Path, PathBuf};
use std::process::Command as StdCommand;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::traits::ResolverEngine;
use crate::resolver::errors::ResolveError;
use crate::resolver::models::TranscriptRecord;
use crate::resolver::process::{forward_runtime_stderr, run_with_timeout};

const PROBE_TIMEOUT: Duration = Duration::from_secs(30);
const CALL_TIMEOUT: Duration = Duration::from_secs(60);
const INSTALL_TIMEOUT: Duration = Duration::from_secs(300);

/// Stream driver: picks the best progressive stream and prints its URL.
const STREAM_DRIVER_TEMPLATE: &str = r#"import json, sys, traceback
sys.path.insert(0, {package_path})

def resolve(url):
    from pytube import YouTube
    streams = YouTube(url).streams.filter(progressive=True)
    return streams.order_by('resolution').desc().first().url

try:
    print(json.dumps({"ok": True, "result": resolve(sys.argv[1])}))
except Exception as exc:
    print(json.dumps({"ok": False, "error": "%s: %s" % (type(exc).__name__, exc),
                      "traceback": traceback.format_exc()}))
"#;

/// Transcript driver: prints the ordered segment list as JSON.
const TRANSCRIPT_DRIVER_TEMPLATE: &str = r#"import json, sys, traceback
sys.path.insert(0, {package_path})

def resolve(video_id):
    from youtube_transcript_api import YouTubeTranscriptApi
    return YouTubeTranscriptApi.get_transcript(video_id)

try:
    print(json.dumps({"ok": True, "result": resolve(sys.argv[1])}))
except Exception as exc:
    print(json.dumps({"ok": False, "error": "%s: %s" % (type(exc).__name__, exc),
                      "traceback": traceback.format_exc()}))
"#;

/// Shared interpreter handle.
///
/// Discovered once and reused by both resolver kinds: there is exactly
/// one runtime owner regardless of which session starts first.
#[derive(Debug, Clone)]
pub struct PyRuntime {
    interpreter: String,
}

impl PyRuntime {
    /// Locate a working interpreter. `YOUTUBE_RESOLVER_PYTHON` overrides
    /// the search (useful for venvs).
    pub fn discover() -> Result<Self, ResolveError> {
        if let Ok(custom) = std::env::var("YOUTUBE_RESOLVER_PYTHON") {
            return Ok(Self { interpreter: custom });
        }

        let candidates = ["python3", "/opt/homebrew/bin/python3", "/usr/local/bin/python3"];
        for cmd in candidates {
            if let Ok(output) = StdCommand::new(cmd).arg("--version").output() {
                if output.status.success() {
                    return Ok(Self {
                        interpreter: cmd.to_string(),
                    });
                }
            }
        }

        Err(ResolveError::Bootstrap(
            "no python3 interpreter found".to_string(),
        ))
    }

    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    /// Check whether `module` imports inside the runtime.
    pub fn has_module(&self, module: &str) -> bool {
        let code = format!("import {}", module);
        match StdCommand::new(&self.interpreter)
            .args(["-c", &code])
            .output()
        {
            Ok(out) => out.status.success(),
            Err(_) => false,
        }
    }

    /// Install a runtime-level dependency once, during bootstrap.
    ///
    /// The upstream transcript driver used to pip-install this lazily on
    /// its first call; resolving it here keeps network side effects out
    /// of the per-call path entirely.
    pub async fn ensure_module(&self, module: &str, pip_name: &str) -> Result<(), ResolveError> {
        if self.has_module(module) {
            return Ok(());
        }

        log::warn!("[PyRuntime] module {} missing, installing {}", module, pip_name);
        let args: Vec<String> = ["-m", "pip", "install", "--user", pip_name]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let output = run_with_timeout(&self.interpreter, &args, INSTALL_TIMEOUT)
            .await
            .map_err(ResolveError::Bootstrap)?;
        if !output.status.success() {
            return Err(ResolveError::Bootstrap(format!(
                "pip install {} failed: {}",
                pip_name,
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        if self.has_module(module) {
            Ok(())
        } else {
            Err(ResolveError::Bootstrap(format!(
                "{} still not importable after install",
                module
            )))
        }
    }
}

/// Which driver an engine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverKind {
    Stream,
    Transcript,
}

impl DriverKind {
    fn template(self) -> &'static str {
        match self {
            Self::Stream => STREAM_DRIVER_TEMPLATE,
            Self::Transcript => TRANSCRIPT_DRIVER_TEMPLATE,
        }
    }

    fn script_name(self) -> &'static str {
        match self {
            Self::Stream => "resolve_stream.py",
            Self::Transcript => "resolve_transcript.py",
        }
    }

    /// Module the import probe checks after provisioning.
    fn probe_module(self) -> &'static str {
        match self {
            Self::Stream => "pytube",
            Self::Transcript => "youtube_transcript_api",
        }
    }

    pub(crate) fn tag(self) -> &'static str {
        match self {
            Self::Stream => "StreamResolver",
            Self::Transcript => "TranscriptResolver",
        }
    }
}

#[derive(Debug, Deserialize)]
struct DriverPayload {
    ok: bool,
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    traceback: Option<String>,
}

/// Engine that invokes a rendered driver script against a provisioned
/// package, one subprocess per resolve call.
pub struct PyDriverEngine {
    runtime: PyRuntime,
    kind: DriverKind,
    script_path: PathBuf,
}

impl PyDriverEngine {
    /// Render the driver template against a provisioned package, write it
    /// next to the package, and verify the package actually imports. Any
    /// failure here permanently invalidates the owning session.
    pub async fn bootstrap(
        runtime: PyRuntime,
        kind: DriverKind,
        package_path: &Path,
    ) -> Result<Self, ResolveError> {
        let script = render_driver(kind, package_path)?;
        let script_path = package_path.with_file_name(kind.script_name());
        tokio::fs::write(&script_path, script).await?;

        import_probe(&runtime, kind, package_path).await?;
        log::debug!("[{}] driver ready at {}", kind.tag(), script_path.display());

        Ok(Self {
            runtime,
            kind,
            script_path,
        })
    }

    async fn invoke(&self, arg: &str) -> Result<serde_json::Value, ResolveError> {
        let args = vec![
            self.script_path.to_string_lossy().into_owned(),
            arg.to_string(),
        ];
        let output = run_with_timeout(self.runtime.interpreter(), &args, CALL_TIMEOUT)
            .await
            .map_err(ResolveError::Call)?;
        forward_runtime_stderr(self.kind.tag(), &output.stderr);

        if !output.status.success() {
            return Err(ResolveError::Call(format!(
                "driver exited with {}",
                output.status
            )));
        }

        let payload: DriverPayload = serde_json::from_slice(&output.stdout)
            .map_err(|e| ResolveError::Parse(format!("driver payload: {}", e)))?;
        if payload.ok {
            payload
                .result
                .ok_or_else(|| ResolveError::Parse("driver reported ok without a result".into()))
        } else {
            if let Some(tb) = payload.traceback {
                log::error!("[{}] runtime traceback:\n{}", self.kind.tag(), tb);
            }
            Err(ResolveError::Call(
                payload
                    .error
                    .unwrap_or_else(|| "unknown runtime error".to_string()),
            ))
        }
    }
}

#[async_trait]
impl ResolverEngine for PyDriverEngine {
    fn name(&self) -> &'static str {
        match self.kind {
            DriverKind::Stream => "py-driver-stream",
            DriverKind::Transcript => "py-driver-transcript",
        }
    }

    async fn resolve_stream(&self, locator: &str) -> Result<String, ResolveError> {
        let value = self.invoke(locator).await?;
        value
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| ResolveError::Parse("stream driver returned a non-string".to_string()))
    }

    async fn resolve_transcript(
        &self,
        video_id: &str,
    ) -> Result<Vec<TranscriptRecord>, ResolveError> {
        let value = self.invoke(video_id).await?;
        serde_json::from_value(value)
            .map_err(|e| ResolveError::Parse(format!("transcript payload: {}", e)))
    }
}

pub(crate) fn render_driver(kind: DriverKind, package_path: &Path) -> Result<String, ResolveError> {
    Ok(kind
        .template()
        .replace("{package_path}", &quote_path(package_path)?))
}

// JSON-quote the path so backslashes and quotes survive inside the script.
fn quote_path(path: &Path) -> Result<String, ResolveError> {
    serde_json::to_string(path.to_string_lossy().as_ref())
        .map_err(|e| ResolveError::Bootstrap(format!("cannot encode package path: {}", e)))
}

async fn import_probe(
    runtime: &PyRuntime,
    kind: DriverKind,
    package_path: &Path,
) -> Result<(), ResolveError> {
    let code = format!(
        "import sys; sys.path.insert(0, {}); import {}",
        quote_path(package_path)?,
        kind.probe_module()
    );
    let args = vec!["-c".to_string(), code];
    let output = run_with_timeout(runtime.interpreter(), &args, PROBE_TIMEOUT)
        .await
        .map_err(ResolveError::Bootstrap)?;
    if !output.status.success() {
        // Stderr carries the interpreter's own formatted traceback.
        return Err(ResolveError::Bootstrap(format!(
            "{} import probe failed: {}",
            kind.probe_module(),
            String::from_utf8_lossy(&output.stderr)
        )));
    }
    Ok(())
}
