//! Agent profiles: one nickname per agent, set once.

use crate::connection::ConnectionContext;
use holonotes_core::{
    decode_record_entry, ActionHash, EntryType, NotesError, NotesResult, Profile, Record,
};

pub struct ProfileDirectory {
    ctx: ConnectionContext,
}

impl ProfileDirectory {
    pub fn new(ctx: &ConnectionContext) -> Self {
        Self { ctx: ctx.clone() }
    }

    pub async fn create_profile(&self, nickname: &str) -> NotesResult<ActionHash> {
        let nickname = nickname.trim();
        if nickname.is_empty() {
            return Err(NotesError::invalid_argument("nickname", "must not be empty"));
        }
        let record = self
            .ctx
            .store()?
            .create_profile(Profile {
                nickname: nickname.to_string(),
            })
            .await?;
        Ok(record.action_hash())
    }

    /// This agent's profile, `None` if not yet created.
    pub async fn my_profile(&self) -> NotesResult<Option<Profile>> {
        self.ctx
            .store()?
            .get_my_profile()
            .await?
            .as_ref()
            .map(decode_profile)
            .transpose()
    }

    pub async fn get_profile(&self, hash: ActionHash) -> NotesResult<Profile> {
        let record = self
            .ctx
            .store()?
            .get_profile(hash)
            .await?
            .ok_or(NotesError::not_found("profile", hash))?;
        decode_profile(&record)
    }
}

fn decode_profile(record: &Record) -> NotesResult<Profile> {
    Ok(decode_record_entry(EntryType::Profile, record)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientSettings;
    use holonotes_store::InMemoryLedger;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_profile_roundtrip_and_single_profile_rule() {
        let ledger = InMemoryLedger::new();
        let ctx =
            ConnectionContext::ready(ClientSettings::default(), Arc::new(ledger.agent_cell("alice")))
                .unwrap();
        let profiles = ProfileDirectory::new(&ctx);

        assert_eq!(profiles.my_profile().await.unwrap(), None);
        assert!(profiles.create_profile("  ").await.is_err());

        let hash = profiles.create_profile("al").await.unwrap();
        assert_eq!(profiles.get_profile(hash).await.unwrap().nickname, "al");
        assert_eq!(profiles.my_profile().await.unwrap().unwrap().nickname, "al");
        assert!(matches!(
            profiles.create_profile("again").await,
            Err(NotesError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_note_hash_is_not_a_profile() {
        let ledger = InMemoryLedger::new();
        let ctx =
            ConnectionContext::ready(ClientSettings::default(), Arc::new(ledger.agent_cell("alice")))
                .unwrap();
        let hash = crate::chain::RevisionChain::new(&ctx)
            .create(holonotes_core::Note::new("t", "c", holonotes_core::Timestamp::from_micros(1)))
            .await
            .unwrap();
        assert!(ProfileDirectory::new(&ctx)
            .get_profile(hash)
            .await
            .unwrap_err()
            .is_not_found());
    }
}
