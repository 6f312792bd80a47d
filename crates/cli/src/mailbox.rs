//! File-system transport.
//!
//! Inbound messages are `*.json` files `{from, subject, body}` dropped into
//! `<root>/inbox`; each is moved to `<root>/processed` once read. Outbound
//! envelopes are written to `<root>/outbox` as `{to, subject, body}`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use orchestrator::{RawMessage, Result, Transport};
use protocol::Envelope;
use serde_json::json;
use tracing::{debug, warn};

const INBOX: &str = "inbox";
const PROCESSED: &str = "processed";
const OUTBOX: &str = "outbox";

#[derive(Debug, Clone)]
pub struct MailboxTransport {
    root: PathBuf,
}

impl MailboxTransport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates the three mailbox directories.
    pub async fn prepare(&self) -> Result<()> {
        for dir in [self.inbox(), self.processed(), self.outbox()] {
            tokio::fs::create_dir_all(dir).await?;
        }
        Ok(())
    }

    pub fn inbox(&self) -> PathBuf {
        self.root.join(INBOX)
    }

    pub fn processed(&self) -> PathBuf {
        self.root.join(PROCESSED)
    }

    pub fn outbox(&self) -> PathBuf {
        self.root.join(OUTBOX)
    }

    async fn pending_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(self.inbox()).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    async fn archive(&self, path: &Path) -> Result<()> {
        if let Some(name) = path.file_name() {
            tokio::fs::rename(path, self.processed().join(name)).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for MailboxTransport {
    /// Only a failure to list the inbox is an error. A file that cannot be
    /// read or parsed is logged and archived with the rest.
    async fn poll(&mut self) -> Result<Vec<RawMessage>> {
        let mut messages = Vec::new();
        for path in self.pending_files().await? {
            match tokio::fs::read(&path).await {
                Ok(bytes) => match serde_json::from_slice::<RawMessage>(&bytes) {
                    Ok(message) => messages.push(message),
                    Err(e) => warn!(file = %path.display(), error = %e, "Unparsable mailbox file"),
                },
                Err(e) => warn!(file = %path.display(), error = %e, "Unreadable mailbox file"),
            }
            if let Err(e) = self.archive(&path).await {
                warn!(file = %path.display(), error = %e, "Failed to archive mailbox file");
            }
        }
        Ok(messages)
    }

    async fn send(&mut self, recipient: &str, subject: &str, envelope: &Envelope) -> Result<bool> {
        let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%6f");
        let path = self
            .outbox()
            .join(format!("{stamp}-{}.json", envelope.message_id));
        let body = json!({
            "to": recipient,
            "subject": subject,
            "body": envelope.to_value()?,
        });
        tokio::fs::write(&path, serde_json::to_vec_pretty(&body)?).await?;
        debug!(file = %path.display(), recipient, "Message written to outbox");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::EnvelopeBuilder;
    use serde_json::Value;

    async fn mailbox() -> (tempfile::TempDir, MailboxTransport) {
        let dir = tempfile::tempdir().unwrap();
        let mailbox = MailboxTransport::new(dir.path().join("mail"));
        mailbox.prepare().await.unwrap();
        (dir, mailbox)
    }

    #[tokio::test]
    async fn test_poll_reads_and_archives() {
        let (_dir, mut mailbox) = mailbox().await;
        let inbox = mailbox.inbox();
        tokio::fs::write(
            inbox.join("002.json"),
            r#"{"from": "b@test.com", "subject": "s2", "body": {"n": 2}}"#,
        )
        .await
        .unwrap();
        tokio::fs::write(
            inbox.join("001.json"),
            r#"{"from": "a@test.com", "subject": "s1", "body": {"n": 1}}"#,
        )
        .await
        .unwrap();
        tokio::fs::write(inbox.join("notes.txt"), "ignored").await.unwrap();

        let messages = mailbox.poll().await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].from, "a@test.com");
        assert_eq!(messages[1].body["n"], 2);

        assert!(mailbox.processed().join("001.json").exists());
        assert!(inbox.join("notes.txt").exists());
        assert!(mailbox.poll().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_file_is_archived() {
        let (_dir, mut mailbox) = mailbox().await;
        tokio::fs::write(mailbox.inbox().join("bad.json"), "{not json")
            .await
            .unwrap();

        assert!(mailbox.poll().await.unwrap().is_empty());
        assert!(mailbox.processed().join("bad.json").exists());
    }

    #[tokio::test]
    async fn test_non_utf8_file_does_not_block_inbox() {
        let (_dir, mut mailbox) = mailbox().await;
        let inbox = mailbox.inbox();
        tokio::fs::write(
            inbox.join("001.json"),
            r#"{"from": "a@test.com", "subject": "s1", "body": {"n": 1}}"#,
        )
        .await
        .unwrap();
        tokio::fs::write(inbox.join("002.json"), [0xff, 0xfe, 0x00, 0x7b])
            .await
            .unwrap();

        let messages = mailbox.poll().await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].from, "a@test.com");
        assert!(mailbox.processed().join("001.json").exists());
        assert!(mailbox.processed().join("002.json").exists());
        assert!(mailbox.poll().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_inbox_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut mailbox = MailboxTransport::new(dir.path().join("absent"));
        assert!(mailbox.poll().await.is_err());
    }

    #[tokio::test]
    async fn test_send_writes_outbox_file() {
        let (_dir, mut mailbox) = mailbox().await;
        let builder = EnvelopeBuilder::new("ref@test.com", "REF01", "L01", "S01");
        let out = builder.keep_alive_response("lm@test.com", None);

        assert!(mailbox
            .send(&out.recipient, &out.subject, &out.envelope)
            .await
            .unwrap());

        let mut entries = std::fs::read_dir(mailbox.outbox()).unwrap();
        let file = entries.next().unwrap().unwrap().path();
        let written: Value = serde_json::from_slice(&std::fs::read(file).unwrap()).unwrap();
        assert_eq!(written["to"], "lm@test.com");
        assert_eq!(written["body"]["message_type"], "RESPONSE_KEEP_ALIVE");
    }
}
