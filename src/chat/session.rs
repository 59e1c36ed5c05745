//! Line-oriented chat session.
//!
//! Each line read is one message. After a reply the session waits for a
//! feedback line for at most the configured timeout:
//!
//! ```text
//! you> hello there
//! Eris: Hi there!
//! rate 1-5, type a better reply, or press Enter to skip
//! feedback> 2
//! ```
//!
//! A wait that times out is the same as no feedback. Messages are processed
//! one at a time, to completion.

use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};

use crate::engine::{FeedbackEffect, Responder};
use crate::types::config::Config;
use crate::types::Feedback;
use crate::ErisResult;

/// Counters for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Messages answered.
    pub messages: usize,
    /// Ratings recorded against a matched rule.
    pub ratings: usize,
    /// Rules rewritten from feedback text.
    pub overrides: usize,
    /// Feedback waits that ran out.
    pub timeouts: usize,
}

/// What the feedback wait produced.
enum FeedbackWait {
    Line(String),
    TimedOut,
    Closed,
}

/// Chat session over any async line reader and writer.
pub struct ChatSession<R, W> {
    reader: R,
    writer: W,
    /// Bytes of the line being read; kept across timed-out reads.
    pending: Vec<u8>,
    bot_name: String,
    feedback_timeout: Duration,
    prompt_for_rating: bool,
}

impl ChatSession<BufReader<Stdin>, Stdout> {
    /// Session on the process stdin/stdout.
    pub fn stdio(config: &Config) -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout(), config)
    }
}

impl<R, W> ChatSession<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates a session with settings taken from `config`.
    pub fn new(reader: R, writer: W, config: &Config) -> Self {
        Self {
            reader,
            writer,
            pending: Vec::new(),
            bot_name: config.general.bot_name.clone(),
            feedback_timeout: Duration::from_secs(config.feedback.timeout_secs),
            prompt_for_rating: config.feedback.prompt_for_rating,
        }
    }

    /// Overrides the feedback wait.
    pub fn with_feedback_timeout(mut self, timeout: Duration) -> Self {
        self.feedback_timeout = timeout;
        self
    }

    /// Runs until `/quit` or end of input.
    pub async fn run(&mut self, responder: &mut Responder) -> ErisResult<SessionSummary> {
        let mut summary = SessionSummary::default();

        self.write_line(&format!(
            "{} is listening. Type /help for commands.",
            self.bot_name
        ))
        .await?;

        loop {
            self.write_prompt("you> ").await?;

            let Some(line) = self.read_line().await? else {
                break;
            };

            let text = line.trim_end_matches(['\r', '\n']);
            if text.trim().is_empty() {
                continue;
            }

            match text.trim() {
                "/quit" | "/exit" => break,
                "/help" => {
                    self.write_help().await?;
                    continue;
                }
                "/rules" => {
                    self.write_rules(responder).await?;
                    continue;
                }
                _ => {}
            }

            let message_id = uuid::Uuid::new_v4();
            tracing::debug!(%message_id, text, "Message received");

            let reply = responder.respond(text).await;
            summary.messages += 1;
            self.write_line(&format!("{}: {}", self.bot_name, reply.response))
                .await?;

            if !self.prompt_for_rating {
                continue;
            }

            let closed = match self.wait_for_feedback().await? {
                FeedbackWait::Line(raw) => {
                    self.apply_feedback(responder, text, &raw, &mut summary)
                        .await?;
                    false
                }
                FeedbackWait::TimedOut => {
                    tracing::debug!(%message_id, "Feedback wait timed out");
                    summary.timeouts += 1;
                    self.write_line("").await?;
                    false
                }
                FeedbackWait::Closed => true,
            };

            if closed {
                break;
            }
        }

        tracing::info!(
            messages = summary.messages,
            ratings = summary.ratings,
            overrides = summary.overrides,
            timeouts = summary.timeouts,
            "Chat session ended"
        );

        Ok(summary)
    }

    async fn wait_for_feedback(&mut self) -> ErisResult<FeedbackWait> {
        self.write_line("rate 1-5, type a better reply, or press Enter to skip")
            .await?;
        self.write_prompt("feedback> ").await?;

        match tokio::time::timeout(self.feedback_timeout, self.read_line()).await {
            Err(_) => Ok(FeedbackWait::TimedOut),
            Ok(Ok(None)) => Ok(FeedbackWait::Closed),
            Ok(Ok(Some(line))) => Ok(FeedbackWait::Line(line)),
            Ok(Err(e)) => Err(e),
        }
    }

    /// Reads one line, or `None` at end of input.
    ///
    /// `read_until` leaves whatever it consumed in `pending` when it is
    /// cancelled, so a line cut off by the feedback timeout is completed by
    /// the next read instead of being lost.
    async fn read_line(&mut self) -> ErisResult<Option<String>> {
        let read = self.reader.read_until(b'\n', &mut self.pending).await?;
        if read == 0 && self.pending.is_empty() {
            return Ok(None);
        }

        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Ok(Some(line))
    }

    async fn apply_feedback(
        &mut self,
        responder: &mut Responder,
        text: &str,
        raw: &str,
        summary: &mut SessionSummary,
    ) -> ErisResult<()> {
        let feedback = match Feedback::parse(raw) {
            Ok(feedback) => feedback,
            Err(e) => {
                self.write_line(&format!("{e}; feedback ignored")).await?;
                return Ok(());
            }
        };

        match responder.feedback(text, feedback).await {
            Ok(FeedbackEffect::Rated(_)) => summary.ratings += 1,
            Ok(FeedbackEffect::Overridden { .. }) => {
                summary.overrides += 1;
                self.write_line("Got it, I'll answer that way next time.")
                    .await?;
            }
            Ok(FeedbackEffect::Ignored) => {}
            Err(e) => {
                // A failed write must not end the conversation.
                tracing::error!(text, error = %e, "Failed to apply feedback");
            }
        }

        Ok(())
    }

    async fn write_help(&mut self) -> ErisResult<()> {
        self.write_line("Commands:").await?;
        self.write_line("  /rules  list known rules").await?;
        self.write_line("  /help   show this help").await?;
        self.write_line("  /quit   end the session").await
    }

    async fn write_rules(&mut self, responder: &Responder) -> ErisResult<()> {
        self.write_line(&format!("{} rules:", responder.rules().len()))
            .await?;
        for rule in responder.rules().iter() {
            self.write_line(&format!(
                "  {:?} -> {:?}",
                rule.input_pattern, rule.output_pattern
            ))
            .await?;
        }
        Ok(())
    }

    async fn write_prompt(&mut self, prompt: &str) -> ErisResult<()> {
        self.writer.write_all(prompt.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn write_line(&mut self, line: &str) -> ErisResult<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RuleStore;
    use crate::types::DEFAULT_RESPONSE;

    fn test_responder() -> Responder {
        let mut responder = Responder::new(RuleStore::in_memory().unwrap()).unwrap();
        responder
            .seed([("hello", "Hi there!"), ("hi", "Hello!")])
            .unwrap();
        responder
    }

    async fn run_script(script: &str, responder: &mut Responder) -> (SessionSummary, String) {
        let mut output = Vec::new();
        let summary = {
            let mut session = ChatSession::new(script.as_bytes(), &mut output, &Config::default());
            session.run(responder).await.unwrap()
        };
        (summary, String::from_utf8(output).unwrap())
    }

    #[tokio::test]
    async fn test_scripted_conversation() {
        let mut responder = test_responder();

        let (summary, output) = run_script("hello world\n\nxyzzy\n4\n", &mut responder).await;

        assert_eq!(summary.messages, 2);
        assert_eq!(summary.ratings, 0);
        assert!(output.contains("Eris: Hi there!"));
        assert!(output.contains(&format!("Eris: {DEFAULT_RESPONSE}")));
    }

    #[tokio::test]
    async fn test_override_from_feedback_line() {
        let mut responder = test_responder();

        let (summary, _) = run_script(
            "new phrase\nCustom reply\nnew phrase\n5\n/quit\n",
            &mut responder,
        )
        .await;

        assert_eq!(summary.overrides, 1);
        assert_eq!(summary.ratings, 1);
        assert_eq!(responder.handle("new phrase", None).await, "Custom reply");
    }

    #[tokio::test]
    async fn test_invalid_rating_is_ignored() {
        let mut responder = test_responder();

        let (summary, output) = run_script("hello\n9\n/quit\n", &mut responder).await;

        assert_eq!(summary.ratings, 0);
        assert!(output.contains("out of range"));
        assert_eq!(responder.handle("hello", None).await, "Hi there!");
    }

    #[tokio::test]
    async fn test_rules_command() {
        let mut responder = test_responder();

        let (summary, output) = run_script("/rules\n/quit\n", &mut responder).await;

        assert_eq!(summary.messages, 0);
        assert!(output.contains("2 rules:"));
        assert!(output.contains("\"hello\" -> \"Hi there!\""));
    }

    #[tokio::test]
    async fn test_feedback_timeout_applies_nothing() {
        let mut responder = test_responder();
        let (client, server) = tokio::io::duplex(1024);
        let (server_read, server_write) = tokio::io::split(server);
        let (mut client_read, mut client_write) = tokio::io::split(client);

        let mut session = ChatSession::new(BufReader::new(server_read), server_write, &Config::default())
            .with_feedback_timeout(Duration::from_millis(50));

        let driver = async {
            client_write.write_all(b"hello\n").await.unwrap();
            tokio::time::sleep(Duration::from_millis(300)).await;
            client_write.write_all(b"/quit\n").await.unwrap();
        };
        let drain = async {
            let mut sink = Vec::new();
            let _ = tokio::io::AsyncReadExt::read_to_end(&mut client_read, &mut sink).await;
        };

        let (summary, _, _) = tokio::join!(session.run(&mut responder), driver, async {
            tokio::time::timeout(Duration::from_secs(1), drain).await.ok();
        });
        let summary = summary.unwrap();

        assert_eq!(summary.messages, 1);
        assert_eq!(summary.timeouts, 1);
        assert!(responder.revision_candidates().is_empty());
    }

    #[tokio::test]
    async fn test_line_cut_by_feedback_timeout_is_kept() {
        let mut responder = test_responder();
        let counters = crate::hooks::MetricsHook::install(responder.hooks_mut());
        let (client, server) = tokio::io::duplex(4096);
        let (server_read, server_write) = tokio::io::split(server);
        let (_client_read, mut client_write) = tokio::io::split(client);

        let mut session = ChatSession::new(BufReader::new(server_read), server_write, &Config::default())
            .with_feedback_timeout(Duration::from_millis(50));

        let driver = async {
            client_write.write_all(b"hello\n").await.unwrap();
            // Half a line arrives during the feedback wait
            client_write.write_all(b"hel").await.unwrap();
            tokio::time::sleep(Duration::from_millis(300)).await;
            client_write.write_all(b"lo again\n").await.unwrap();
            tokio::time::sleep(Duration::from_millis(300)).await;
            client_write.write_all(b"/quit\n").await.unwrap();
        };

        let (summary, _) = tokio::join!(session.run(&mut responder), driver);
        let summary = summary.unwrap();

        assert_eq!(summary.messages, 2);
        assert_eq!(summary.timeouts, 2);
        assert_eq!(counters.total_matches(), 2);
        assert_eq!(counters.total_misses(), 0);
    }
}
