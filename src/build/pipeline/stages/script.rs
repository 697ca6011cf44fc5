//! Subprocess stage backend.
//!
//! Each `*.hook` file is an executable started once per build and kept alive
//! until the build finishes. The host writes one JSON request per line to its
//! stdin and reads one JSON reply per line from its stdout:
//!
//! ```text
//! -> {"call":"describe"}
//! <- {"ok":{"entry_points":["before_build","transform"],"for_file":"index.md"}}
//! -> {"call":"before_build"}
//! <- {"ok":null}
//! -> {"call":"transform","payload":{"name":"index.html",...}}
//! <- {"ok":{"data":{"title":"Hello"}}}
//! -> {"call":"transform","payload":{...}}
//! <- {"error":"could not parse date"}
//! ```
//!
//! Closing stdin ends the session; the process is expected to exit with status 0.
//! The hook's stderr is passed through to the console.

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::build::pipeline::{EntryPoint, StageContext, StageError};

/// Environment variable telling a hook where the project root is.
pub const WORKING_DIR_ENV: &str = "FOLIO_WORKING_DIR";

#[derive(Serialize)]
#[serde(tag = "call", content = "payload", rename_all = "snake_case")]
enum Call<'a> {
    Describe,
    BeforeBuild,
    AfterBuild,
    Transform(&'a Value),
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum Reply {
    Ok(Value),
    Error(String),
}

/// What a hook declares about itself in reply to `describe`.
#[derive(Debug, Default, Deserialize)]
struct Manifest {
    #[serde(default)]
    entry_points: Vec<EntryPoint>,
    #[serde(default)]
    for_file: Option<String>,
}

/// A stage backed by a long-lived child process.
pub struct ScriptStage {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    manifest: Manifest,
}

impl ScriptStage {
    /// Start the hook and ask it to describe itself.
    pub fn spawn(path: &Path, working_dir: &Path) -> Result<Self, StageError> {
        let mut child = Command::new(path)
            .env(WORKING_DIR_ENV, working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| StageError::Spawn {
                path: path.to_path_buf(),
                source,
            })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(StageError::Exited);
        };

        let mut stage = Self {
            child,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout),
            manifest: Manifest::default(),
        };

        let manifest = stage.call(&Call::Describe)?;
        stage.manifest = serde_json::from_value(manifest)?;
        Ok(stage)
    }

    fn call(&mut self, call: &Call) -> Result<Value, StageError> {
        let stdin = self.stdin.as_mut().ok_or(StageError::Exited)?;
        let mut line = serde_json::to_string(call)?;
        line.push('\n');
        stdin.write_all(line.as_bytes())?;
        stdin.flush()?;

        let mut reply = String::new();
        if self.stdout.read_line(&mut reply)? == 0 {
            return Err(StageError::Exited);
        }

        match serde_json::from_str(&reply)? {
            Reply::Ok(value) => Ok(value),
            Reply::Error(message) => Err(StageError::Raised(message)),
        }
    }
}

impl StageContext for ScriptStage {
    fn has_entry_point(&self, entry: EntryPoint) -> bool {
        self.manifest.entry_points.contains(&entry)
    }

    fn target_filter(&self) -> Option<&str> {
        self.manifest.for_file.as_deref()
    }

    fn invoke(&mut self, entry: EntryPoint, payload: Option<&Value>) -> Result<Value, StageError> {
        let call = match (entry, payload) {
            (EntryPoint::BeforeBuild, _) => Call::BeforeBuild,
            (EntryPoint::AfterBuild, _) => Call::AfterBuild,
            (EntryPoint::Transform, Some(payload)) => Call::Transform(payload),
            (EntryPoint::Transform, None) => Call::Transform(&Value::Null),
        };
        self.call(&call)
    }

    fn close(&mut self) -> Result<(), StageError> {
        // Dropping stdin signals end of session.
        if self.stdin.take().is_none() {
            return Ok(());
        }
        let status = self.child.wait()?;
        if status.success() {
            Ok(())
        } else {
            Err(StageError::ExitStatus(status))
        }
    }
}

impl Drop for ScriptStage {
    fn drop(&mut self) {
        if self.stdin.take().is_some() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}
