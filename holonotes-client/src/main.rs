//! holonotes command-line client.
//!
//! Runs against an in-process ledger. When `signal_endpoint` is configured,
//! signals relayed from a remote node are merged into the live list too.

use holonotes_client::config::ClientConfig;
use holonotes_client::error::ClientError;
use holonotes_client::events::ClientEvent;
use holonotes_client::realtime::{spawn_signal_relay, SignalRelay};
use holonotes_client::{
    telemetry, ConnectionContext, LiveNoteListController, NoteComposer, NoteDetailSession,
    ProfileDirectory, RevisionChain, SessionState,
};
use holonotes_core::{ActionHash, NotesResult};
use holonotes_store::InMemoryLedger;
use std::io::BufRead;
use std::sync::Arc;
use tokio::sync::mpsc;

const HELP: &str = "\
commands:
  list                          show visible notes
  new <title> | <content>       create a note
  show <n>                      show the latest revision of note n
  history <n>                   show every revision and delete of note n
  edit <n> <title> | <content>  save a new revision of note n
  delete <n>                    delete note n
  refresh                       reload the list from the ledger
  profile <nickname>            set your nickname
  whoami                        show your profile
  quit";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), ClientError> {
    let config = ClientConfig::load()?;
    telemetry::init_logging(config.log_filter.as_deref())?;

    let ledger = InMemoryLedger::new();
    let ctx = ConnectionContext::new(config.settings());
    ctx.establish(Arc::new(ledger.agent_cell(&config.agent_name)))?;

    let mut list = LiveNoteListController::mount(&ctx)?;
    if let Err(err) = list.bootstrap().await {
        eprintln!("initial load failed: {err}");
    }

    let (event_tx, mut event_rx) = mpsc::channel::<ClientEvent>(256);
    spawn_input_reader(event_tx.clone());
    if let Some(endpoint) = &config.signal_endpoint {
        let _relay = spawn_signal_relay(
            SignalRelay::new(endpoint.clone(), config.reconnect.clone()),
            event_tx.clone(),
        );
    }

    let mut repl = Repl {
        chain: RevisionChain::new(&ctx),
        composer: NoteComposer::new(&ctx),
        profiles: ProfileDirectory::new(&ctx),
        ctx,
    };
    println!("{HELP}");

    loop {
        let step = tokio::select! {
            applied = list.next_signal() => Step::Signal(applied),
            Some(event) = event_rx.recv() => Step::Event(event),
        };
        match step {
            Step::Signal(Some(true)) => {
                println!("(a note arrived, {} visible)", list.current_view().len())
            }
            Step::Signal(Some(false)) => {}
            Step::Signal(None) => break,
            Step::Event(event) => {
                if repl.handle_event(&list, event).await? {
                    break;
                }
            }
        }
    }

    Ok(())
}

enum Step {
    Signal(Option<bool>),
    Event(ClientEvent),
}

fn spawn_input_reader(sender: mpsc::Sender<ClientEvent>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if sender.blocking_send(ClientEvent::Input(line)).is_err() {
                return;
            }
        }
        let _ = sender.blocking_send(ClientEvent::Input("quit".to_string()));
    });
}

struct Repl {
    ctx: ConnectionContext,
    chain: RevisionChain,
    composer: NoteComposer,
    profiles: ProfileDirectory,
}

impl Repl {
    async fn handle_event(
        &mut self,
        list: &LiveNoteListController,
        event: ClientEvent,
    ) -> Result<bool, ClientError> {
        match event {
            ClientEvent::Input(line) => {
                let line = line.trim();
                if line == "quit" || line == "exit" {
                    return Ok(true);
                }
                if let Err(err) = self.run_command(list, line).await {
                    println!("error: {err}");
                }
            }
            ClientEvent::Signal(signal) => {
                list.on_signal(&signal);
            }
            ClientEvent::RelayConnected => tracing::info!("relay connected"),
            ClientEvent::RelayDisconnected { reason } => {
                tracing::warn!(reason = %reason, "relay disconnected")
            }
            ClientEvent::RelayError(message) => tracing::warn!(error = %message, "relay error"),
        }
        Ok(false)
    }

    async fn run_command(&mut self, list: &LiveNoteListController, line: &str) -> NotesResult<()> {
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        match command {
            "" => {}
            "help" => println!("{HELP}"),
            "list" => self.print_list(list).await?,
            "refresh" => {
                list.bootstrap().await?;
                self.print_list(list).await?;
            }
            "new" => {
                let (title, content) = split_note(rest);
                let draft = self.composer.draft_mut();
                draft.title = title.to_string();
                draft.content = content.to_string();
                let hash = self.composer.submit().await?;
                println!("created {}", hash.short());
            }
            "show" => {
                let mut session = self.session(list, rest)?;
                session.load().await?;
                print_session(&session);
            }
            "history" => {
                let hash = pick(list, rest)?;
                for (i, revision) in self.chain.lineage(hash).await?.iter().enumerate() {
                    println!(
                        "  v{} {} {}: {}",
                        i + 1,
                        revision.hash.short(),
                        revision.note.title,
                        revision.note.content
                    );
                }
                for delete in self.chain.get_all_deletes(hash).await? {
                    println!("  deleted by {} ({})", delete.action.author.short(), delete.hash.short());
                }
            }
            "edit" => {
                let (index, text) = rest.split_once(' ').unwrap_or((rest, ""));
                let (title, content) = split_note(text);
                let mut session = self.session(list, index)?;
                session.load().await?;
                session.start_edit()?;
                if let Some(draft) = session.edit_draft() {
                    draft.title = title.to_string();
                    draft.content = content.to_string();
                }
                let revision = session.save().await?;
                println!("saved revision {}", revision.short());
            }
            "delete" => {
                let mut session = self.session(list, rest)?;
                session.load().await?;
                let delete_hash = session.delete().await?;
                println!("deleted ({})", delete_hash.short());
            }
            "profile" => {
                let hash = self.profiles.create_profile(rest).await?;
                println!("profile created {}", hash.short());
            }
            "whoami" => match self.profiles.my_profile().await? {
                Some(profile) => println!("{}", profile.nickname),
                None => println!("no profile yet"),
            },
            other => println!("unknown command {other:?}, try help"),
        }
        Ok(())
    }

    fn session(&self, list: &LiveNoteListController, index: &str) -> NotesResult<NoteDetailSession> {
        NoteDetailSession::open(&self.ctx, pick(list, index)?, Some(list.handle()))
    }

    async fn print_list(&self, list: &LiveNoteListController) -> NotesResult<()> {
        let view = list.current_view();
        if view.is_empty() {
            println!("no notes");
        }
        for (i, hash) in view.iter().enumerate() {
            match self.chain.get_latest(*hash).await {
                Ok(note) => println!("{:>3}. {} ({})", i + 1, note.title, note.created_at),
                Err(err) => println!("{:>3}. {} <{err}>", i + 1, hash.short()),
            }
        }
        Ok(())
    }
}

fn pick(list: &LiveNoteListController, index: &str) -> NotesResult<ActionHash> {
    let view = list.current_view();
    index
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|n| view.get(n).copied())
        .ok_or_else(|| {
            holonotes_core::NotesError::invalid_argument(
                "index",
                format!("{index:?} is not a listed note"),
            )
        })
}

fn split_note(text: &str) -> (&str, &str) {
    match text.split_once('|') {
        Some((title, content)) => (title.trim(), content.trim()),
        None => (text.trim(), ""),
    }
}

fn print_session(session: &NoteDetailSession) {
    match session.state() {
        SessionState::Loaded(loaded) => {
            println!("{}  [{}]", loaded.note.title, loaded.tip.short());
            println!("created {}", loaded.note.created_at);
            println!("{}", loaded.note.content);
        }
        SessionState::NotFound => println!("note not found"),
        other => println!("note is {}", other.name()),
    }
}
