//! In-process session store.

use roundtable_application::{PersistenceError, SessionRepository};
use roundtable_domain::{DiscussionSession, Message, SessionId, SessionSummary};
use std::collections::HashMap;
use std::sync::Mutex;

/// Keeps snapshots for the lifetime of the process
#[derive(Default)]
pub struct InMemorySessionRepository {
    sessions: Mutex<HashMap<SessionId, DiscussionSession>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionRepository for InMemorySessionRepository {
    fn save_session(&self, session: &DiscussionSession) -> Result<(), PersistenceError> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.insert(session.id().clone(), session.clone());
        Ok(())
    }

    fn append_message(&self, message: &Message) -> Result<(), PersistenceError> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let Some(session) = sessions.get_mut(&message.session_id) else {
            return Err(PersistenceError::Unavailable(format!(
                "message {} arrived before session {} was saved",
                message.id, message.session_id
            )));
        };
        // Already covered by a newer snapshot
        if message.sequence < session.next_sequence() {
            return Ok(());
        }
        session
            .restore_message(message.clone())
            .map_err(|e| PersistenceError::Corrupt {
                source_name: message.session_id.to_string(),
                reason: e.to_string(),
            })
    }

    fn load_session(&self, id: &SessionId) -> Result<Option<DiscussionSession>, PersistenceError> {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        Ok(sessions.get(id).cloned())
    }

    fn list_sessions(&self, project_id: Option<&str>) -> Result<Vec<SessionSummary>, PersistenceError> {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let mut summaries: Vec<SessionSummary> = sessions
            .values()
            .filter(|s| project_id.is_none_or(|p| s.project_id() == Some(p)))
            .map(DiscussionSession::to_summary)
            .collect();
        summaries.sort_by_key(|s| s.created_at);
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roundtable_domain::{
        MessageMetadata, ParticipantConfig, ParticipantId, ParticipantRole, SessionType, Topic,
    };

    fn session(id: &str, project: Option<&str>) -> DiscussionSession {
        let mut session = DiscussionSession::new(
            SessionId::new(id),
            project.map(str::to_string),
            Topic::try_new("The lighthouse keeper's daughter").unwrap(),
            SessionType::PlotCreation,
            vec![
                ParticipantConfig::new(ParticipantRole::Writer),
                ParticipantConfig::new(ParticipantRole::Editor),
            ],
            2,
        )
        .unwrap();
        session.start().unwrap();
        session
    }

    #[test]
    fn test_append_after_snapshot() {
        let repo = InMemorySessionRepository::new();
        let mut live = session("s1", None);
        repo.save_session(&live).unwrap();

        let writer = ParticipantId::new("writer");
        let message = live
            .append_agent_message(&writer, "She keeps the lamp lit.".into(), MessageMetadata::default(), None)
            .unwrap()
            .clone();
        repo.append_message(&message).unwrap();

        let loaded = repo.load_session(&SessionId::new("s1")).unwrap().unwrap();
        assert_eq!(loaded.messages().len(), 1);
        assert_eq!(loaded.messages()[0].content, "She keeps the lamp lit.");

        // A later snapshot already holding the message makes a replay a no-op
        repo.save_session(&live).unwrap();
        repo.append_message(&message).unwrap();
        let loaded = repo.load_session(&SessionId::new("s1")).unwrap().unwrap();
        assert_eq!(loaded.messages().len(), 1);
    }

    #[test]
    fn test_append_for_unsaved_session_fails() {
        let repo = InMemorySessionRepository::new();
        let mut live = session("s1", None);
        let message = live
            .append_human_message("Hello".into(), MessageMetadata::default())
            .unwrap()
            .clone();
        assert!(matches!(
            repo.append_message(&message),
            Err(PersistenceError::Unavailable(_))
        ));
    }

    #[test]
    fn test_list_filters_by_project() {
        let repo = InMemorySessionRepository::new();
        repo.save_session(&session("a", Some("novel"))).unwrap();
        repo.save_session(&session("b", Some("essay"))).unwrap();
        repo.save_session(&session("c", None)).unwrap();

        assert_eq!(repo.list_sessions(None).unwrap().len(), 3);
        let novel = repo.list_sessions(Some("novel")).unwrap();
        assert_eq!(novel.len(), 1);
        assert_eq!(novel[0].id, SessionId::new("a"));
        assert!(repo.load_session(&SessionId::new("zzz")).unwrap().is_none());
    }
}
