//! Bot runtime executor

use super::sessions::SessionStore;
use super::traits::{ChatTransport, VisitorStore};
use super::{InboundContent, InboundMessage};
use crate::commands::{status_text, Command, DB_QUERY_FAILED_TEXT, DB_UNAVAILABLE_TEXT};
use crate::db::{DbError, VisitorRecord};
use crate::state_machine::{transition, Effect, Event, VisitContext};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Consumes inbound messages one at a time and drives every user's session
pub struct BotRuntime<S, T>
where
    S: VisitorStore,
    T: ChatTransport,
{
    sessions: SessionStore,
    store: S,
    transport: T,
    image_dir: PathBuf,
    inbound_rx: mpsc::Receiver<InboundMessage>,
    shutdown: CancellationToken,
}

impl<S, T> BotRuntime<S, T>
where
    S: VisitorStore,
    T: ChatTransport,
{
    pub fn new(
        store: S,
        transport: T,
        image_dir: PathBuf,
        inbound_rx: mpsc::Receiver<InboundMessage>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            sessions: SessionStore::new(),
            store,
            transport,
            image_dir,
            inbound_rx,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(image_dir = %self.image_dir.display(), "Starting bot runtime");

        loop {
            tokio::select! {
                biased;
                () = self.shutdown.cancelled() => break,
                message = self.inbound_rx.recv() => match message {
                    Some(message) => self.handle_message(message).await,
                    None => break,
                },
            }
        }

        tracing::info!(
            open_sessions = self.sessions.len(),
            "Bot runtime stopped"
        );
    }

    /// Handle one inbound message to completion, including any effects it
    /// triggers
    pub async fn handle_message(&mut self, message: InboundMessage) {
        let context = VisitContext::new(message.user_id, message.chat_id, &self.image_dir);

        let event = match message.content {
            InboundContent::Command(command) => {
                let Some(event) = self.handle_command(&context, command).await else {
                    return;
                };
                event
            }
            content if !self.sessions.is_active(context.user_id) => {
                tracing::debug!(
                    user_id = context.user_id,
                    ?content,
                    "Ignoring message outside a visit entry"
                );
                return;
            }
            InboundContent::Text(text) => Event::UserText { text },
            InboundContent::Photo(variants) => Event::UserPhoto { variants },
            InboundContent::Unsupported => Event::UserUnsupported,
        };

        self.process_event(&context, event).await;
    }

    /// Answer stateless commands directly; return the event for the ones
    /// that drive the conversation
    async fn handle_command(&self, context: &VisitContext, command: Command) -> Option<Event> {
        if let Some(text) = command.static_reply() {
            self.reply(context, text).await;
            return None;
        }

        match command {
            Command::InputVisit => Some(Event::Begin),
            Command::Cancel => Some(Event::Cancel),
            Command::Status => {
                self.report_status(context).await;
                None
            }
            Command::Unknown(name) => {
                tracing::debug!(command = %name, "Ignoring unknown command");
                None
            }
            Command::Start | Command::Info | Command::Help => None,
        }
    }

    async fn report_status(&self, context: &VisitContext) {
        let text = match self.store.count_visitors().await {
            Ok(count) => status_text(count),
            Err(DbError::Unavailable(e)) => {
                tracing::error!(error = %e, "Error while connecting to database");
                DB_UNAVAILABLE_TEXT.to_string()
            }
            Err(e) => {
                tracing::error!(error = %e, "Error while counting visitors");
                DB_QUERY_FAILED_TEXT.to_string()
            }
        };
        self.reply(context, &text).await;
    }

    async fn process_event(&mut self, context: &VisitContext, event: Event) {
        let mut state = self.sessions.state(context.user_id);

        // We need to process events in a loop to handle chained effects
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            let result = match transition(&state, context, current_event) {
                Ok(r) => r,
                Err(e) if e.is_user_facing() => {
                    self.reply(context, &e.to_string()).await;
                    break;
                }
                Err(e) => {
                    tracing::warn!(user_id = context.user_id, error = %e, "Dropped event");
                    break;
                }
            };

            state = result.new_state;

            for effect in result.effects {
                if let Some(generated_event) = self.execute_effect(context, effect).await {
                    events_to_process.push(generated_event);
                }
            }
        }

        tracing::debug!(user_id = context.user_id, state = state.kind(), "Session updated");
        self.sessions.put(context.user_id, state);
    }

    async fn execute_effect(&self, context: &VisitContext, effect: Effect) -> Option<Event> {
        match effect {
            Effect::Reply { text } => {
                self.reply(context, &text).await;
                None
            }

            Effect::StorePhoto { file_id, dest } => {
                if let Some(parent) = dest.parent() {
                    if let Err(e) = tokio::fs::create_dir_all(parent).await {
                        tracing::error!(dir = %parent.display(), error = %e, "Failed to create image directory");
                        return Some(Event::PhotoStoreFailed);
                    }
                }

                match self.transport.download_file(&file_id, &dest).await {
                    Ok(()) => {
                        tracing::info!(path = %dest.display(), "Visitor photo saved");
                        Some(Event::PhotoStored {
                            path: dest.to_string_lossy().into_owned(),
                        })
                    }
                    Err(e) => {
                        tracing::error!(file_id = %file_id, error = %e, "Failed to download photo");
                        Some(Event::PhotoStoreFailed)
                    }
                }
            }

            Effect::RecordVisit { details } => {
                let record = VisitorRecord::stamp(details, chrono::Local::now().naive_local());
                if self.store.insert_visitor(&record).await {
                    Some(Event::VisitRecorded {
                        recorded_at: record.timestamp,
                    })
                } else {
                    Some(Event::VisitRecordFailed)
                }
            }
        }
    }

    #[cfg(test)]
    pub fn open_sessions(&self) -> usize {
        self.sessions.len()
    }

    async fn reply(&self, context: &VisitContext, text: &str) {
        if let Err(e) = self.transport.send_text(context.chat_id, text).await {
            tracing::error!(chat_id = context.chat_id, error = %e, "Failed to send reply");
        }
    }
}
