//! Dialogue sessions
//!
//! Glue between a turn-taking transport and a turn handler. Intentionally
//! thin: speak the opening once, then strict one-utterance-in →
//! one-spoken-reply-out, with no reordering or batching of turns.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::engine::TurnHandler;
use crate::{Error, Result};

/// The turn-taking capability the environment provides: a lazy sequence of
/// recognized utterances in, spoken replies out. The session never inspects
/// audio, timing, or provider identity.
#[async_trait]
pub trait Transport: Send {
    /// Next recognized utterance; `None` ends the session
    async fn next_utterance(&mut self) -> Result<Option<String>>;

    /// Speak a reply; resolves once playback is scheduled
    async fn speak(&mut self, text: &str) -> Result<()>;
}

/// One conversation wired to one transport. The session exclusively owns
/// its handler; `apply` calls are serialized by `&mut self`.
pub struct DialogueSession<T, H> {
    transport: T,
    handler: H,
}

impl<T: Transport, H: TurnHandler> DialogueSession<T, H> {
    /// Compose a transport with a turn handler
    pub const fn new(transport: T, handler: H) -> Self {
        Self { transport, handler }
    }

    /// Run until the transport closes.
    ///
    /// `InvalidInput` and `Storage` errors are conversation-survivable: the
    /// current question is asked again and the session continues. Transport
    /// errors end the session.
    ///
    /// # Errors
    ///
    /// Returns error if the transport fails or the handler fails fatally
    pub async fn run(mut self) -> Result<()> {
        self.transport.speak(&self.handler.opening()).await?;

        while let Some(utterance) = self.transport.next_utterance().await? {
            let reply = match self.handler.apply(&utterance) {
                Ok(turn) => turn.reply().to_string(),
                Err(Error::InvalidInput(reason)) => {
                    tracing::debug!(%reason, "no-op turn");
                    self.handler.reprompt()
                }
                Err(Error::Storage(reason)) => {
                    // the engine has already advanced; keep talking
                    tracing::warn!(%reason, "record not persisted");
                    self.handler.reprompt()
                }
                Err(e) => return Err(e),
            };

            self.transport.speak(&reply).await?;
        }

        tracing::info!("transport closed, session over");
        Ok(())
    }
}

/// Keyboard transport for `intake console`
pub struct ConsoleTransport {
    lines: Lines<BufReader<Stdin>>,
}

impl ConsoleTransport {
    /// Create a transport reading utterances from stdin
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for ConsoleTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ConsoleTransport {
    async fn next_utterance(&mut self) -> Result<Option<String>> {
        use std::io::Write;
        print!("you> ");
        std::io::stdout().flush()?;
        Ok(self.lines.next_line().await?)
    }

    async fn speak(&mut self, text: &str) -> Result<()> {
        println!("{text}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::engine::SlotFillingEngine;
    use crate::schema::IntakeScript;
    use crate::store::IntakeStore;

    /// Transport that replays scripted utterances and collects replies
    struct ScriptedTransport {
        utterances: VecDeque<String>,
        spoken: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn next_utterance(&mut self) -> Result<Option<String>> {
            Ok(self.utterances.pop_front())
        }

        async fn speak(&mut self, text: &str) -> Result<()> {
            self.spoken.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn engine(dir: &tempfile::TempDir) -> SlotFillingEngine {
        let script = Arc::new(
            IntakeScript::from_json(
                r#"{
                    "id": "mini",
                    "title": "Mini",
                    "greeting": "Hi.",
                    "fields": [
                        {"name": "a", "label": "A", "kind": "scalar", "prompt": "A?"},
                        {"name": "b", "label": "B", "kind": "scalar", "prompt": "B?"}
                    ]
                }"#,
            )
            .unwrap(),
        );
        let store = IntakeStore::new(dir.path().join("mini_log.json"));
        SlotFillingEngine::new(script, store).unwrap()
    }

    #[tokio::test]
    async fn test_one_reply_per_utterance() {
        let dir = tempfile::tempdir().unwrap();
        let spoken = Arc::new(Mutex::new(Vec::new()));
        let transport = ScriptedTransport {
            utterances: ["one", "two"].into_iter().map(String::from).collect(),
            spoken: Arc::clone(&spoken),
        };

        DialogueSession::new(transport, engine(&dir))
            .run()
            .await
            .unwrap();

        let spoken = spoken.lock().unwrap();
        assert_eq!(
            *spoken,
            vec![
                "Hi. A?".to_string(),
                "B?".to_string(),
                "A: one, B: two".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_blank_utterance_reprompts() {
        let dir = tempfile::tempdir().unwrap();
        let spoken = Arc::new(Mutex::new(Vec::new()));
        let transport = ScriptedTransport {
            utterances: ["one", "   ", "two"].into_iter().map(String::from).collect(),
            spoken: Arc::clone(&spoken),
        };

        DialogueSession::new(transport, engine(&dir))
            .run()
            .await
            .unwrap();

        let spoken = spoken.lock().unwrap();
        assert_eq!(
            *spoken,
            vec![
                "Hi. A?".to_string(),
                "B?".to_string(),
                "B?".to_string(),
                "A: one, B: two".to_string(),
            ]
        );
    }
}
