//! JSONL session store: one append-only file per session.
//!
//! Each line is a record tagged with `kind`:
//!
//! - `session`: a snapshot of the session without its message log
//! - `message`: one appended message
//!
//! Loading takes the last snapshot and replays every message record onto it
//! in sequence order. A torn final line (crash mid-write) is skipped; a
//! malformed line anywhere else makes the file corrupt.

use roundtable_application::{PersistenceError, SessionRepository};
use roundtable_domain::{DiscussionSession, Message, SessionId, SessionSummary};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

const EXTENSION: &str = "jsonl";

#[derive(Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Record {
    Session {
        recorded_at: String,
        session: serde_json::Value,
    },
    Message {
        message: Message,
    },
}

/// Session repository writing one `<session id>.jsonl` file per session
pub struct JsonlSessionRepository {
    dir: PathBuf,
    writers: Mutex<HashMap<SessionId, BufWriter<File>>>,
}

impl JsonlSessionRepository {
    /// Open (and create if needed) the session directory
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        debug!("Session directory: {}", dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
            writers: Mutex::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &SessionId) -> Result<PathBuf, PersistenceError> {
        let name = id.as_str();
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(PersistenceError::Unavailable(format!(
                "session id '{}' cannot be used as a file name",
                name
            )));
        }
        Ok(self.dir.join(format!("{}.{}", name, EXTENSION)))
    }

    fn write_record(&self, id: &SessionId, record: &Record) -> Result<(), PersistenceError> {
        let line = serde_json::to_string(record)?;
        let mut writers = self.writers.lock().unwrap_or_else(|e| e.into_inner());
        let writer = match writers.entry(id.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(self.path_for(id)?)?;
                entry.insert(BufWriter::new(file))
            }
        };
        writeln!(writer, "{}", line)?;
        // Flush per record; the file is the durable copy
        writer.flush()?;
        Ok(())
    }

    fn read_file(path: &Path) -> Result<Option<DiscussionSession>, PersistenceError> {
        let contents = fs::read_to_string(path)?;
        let source_name = path.display().to_string();
        let lines: Vec<&str> = contents.lines().filter(|l| !l.trim().is_empty()).collect();

        let mut snapshot = None;
        let mut messages = Vec::new();
        for (index, line) in lines.iter().enumerate() {
            match serde_json::from_str::<Record>(line) {
                Ok(Record::Session { session, .. }) => snapshot = Some(session),
                Ok(Record::Message { message }) => messages.push(message),
                Err(e) if index + 1 == lines.len() => {
                    warn!("Skipping torn final record in {}: {}", source_name, e);
                }
                Err(e) => {
                    return Err(PersistenceError::Corrupt {
                        source_name,
                        reason: format!("line {}: {}", index + 1, e),
                    });
                }
            }
        }

        let Some(snapshot) = snapshot else {
            return Ok(None);
        };
        let mut session: DiscussionSession = serde_json::from_value(snapshot)?;
        messages.sort_by_key(|m| m.sequence);
        for message in messages {
            if message.sequence < session.next_sequence() {
                continue;
            }
            session
                .restore_message(message)
                .map_err(|e| PersistenceError::Corrupt {
                    source_name: source_name.clone(),
                    reason: e.to_string(),
                })?;
        }
        Ok(Some(session))
    }
}

/// Serialized session with the message log emptied
fn snapshot_without_log(session: &DiscussionSession) -> Result<serde_json::Value, PersistenceError> {
    let mut value = serde_json::to_value(session)?;
    if let Some(messages) = value.get_mut("messages") {
        *messages = serde_json::Value::Array(Vec::new());
    }
    Ok(value)
}

impl SessionRepository for JsonlSessionRepository {
    fn save_session(&self, session: &DiscussionSession) -> Result<(), PersistenceError> {
        let record = Record::Session {
            recorded_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            session: snapshot_without_log(session)?,
        };
        self.write_record(session.id(), &record)
    }

    fn append_message(&self, message: &Message) -> Result<(), PersistenceError> {
        self.write_record(
            &message.session_id,
            &Record::Message {
                message: message.clone(),
            },
        )
    }

    fn load_session(&self, id: &SessionId) -> Result<Option<DiscussionSession>, PersistenceError> {
        let path = self.path_for(id)?;
        if !path.exists() {
            return Ok(None);
        }
        Self::read_file(&path)
    }

    fn list_sessions(&self, project_id: Option<&str>) -> Result<Vec<SessionSummary>, PersistenceError> {
        let mut summaries = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            match Self::read_file(&path) {
                Ok(Some(session)) => {
                    if project_id.is_none_or(|p| session.project_id() == Some(p)) {
                        summaries.push(session.to_summary());
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("Skipping unreadable session file {}: {}", path.display(), e),
            }
        }
        summaries.sort_by_key(|s| s.created_at);
        Ok(summaries)
    }
}

impl Drop for JsonlSessionRepository {
    fn drop(&mut self) {
        let mut writers = self.writers.lock().unwrap_or_else(|e| e.into_inner());
        for writer in writers.values_mut() {
            let _ = writer.flush();
        }
    }
}
