//! Poll loop tying a [`Transport`] to the [`SeasonOrchestrator`].

use std::future::Future;
use std::time::Duration;

use events::RefereeEvent;
use protocol::{
    validate_envelope, Envelope, ErrorCode, ErrorResponseBuilder, MessageType, OutgoingMessage,
    Role,
};
use referee_core::SEASON_PLACEHOLDER_GAME_ID;
use serde_json::Value;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::error::{OrchestratorError, Result};
use crate::season::SeasonOrchestrator;
use crate::transport::{RawMessage, Transport};

/// Delay before the single retry of a failed match-result report.
pub const REPORT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// How an inbound message is routed.
#[derive(Debug)]
enum Inbound {
    League(MessageType),
    Player(MessageType),
    Unknown(String),
}

impl Inbound {
    fn classify(raw: &RawMessage) -> Self {
        let Some(name) = raw.message_type() else {
            return Self::Unknown("missing message_type".into());
        };
        match MessageType::parse(&name) {
            Some(t) if t.is_league_control() => Self::League(t),
            Some(t) if t.is_player_message() => Self::Player(t),
            Some(t) => Self::Unknown(format!("{t} is not addressed to a referee")),
            None => Self::Unknown(format!("unknown message type '{name}'")),
        }
    }
}

pub struct RefereeRunner<T: Transport> {
    orchestrator: SeasonOrchestrator,
    transport: T,
    errors: ErrorResponseBuilder,
    poll_interval: Duration,
    retry_delay: Duration,
}

impl<T: Transport> RefereeRunner<T> {
    pub fn new(orchestrator: SeasonOrchestrator, transport: T) -> Self {
        let config = orchestrator.config();
        let errors = ErrorResponseBuilder::new(
            &config.referee_email,
            Role::Referee,
            Some(config.referee_id.clone()),
        );
        let poll_interval = Duration::from_secs(config.poll_interval_seconds);
        Self {
            orchestrator,
            transport,
            errors,
            poll_interval,
            retry_delay: REPORT_RETRY_DELAY,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn orchestrator(&self) -> &SeasonOrchestrator {
        &self.orchestrator
    }

    pub fn orchestrator_mut(&mut self) -> &mut SeasonOrchestrator {
        &mut self.orchestrator
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Polls until Ctrl-C.
    pub async fn run(&mut self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Could not listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Polls until `shutdown` resolves. A failing iteration is logged and
    /// the loop carries on.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!(
            referee_id = %self.orchestrator.config().referee_id,
            poll_interval_secs = self.poll_interval.as_secs(),
            "Referee runner started"
        );
        loop {
            if let Err(e) = self.run_once().await {
                warn!(error = %e, "Poll iteration failed");
            }
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, runner stopping");
                    break;
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
        Ok(())
    }

    /// One iteration: poll, route every message, send replies, then
    /// check player deadlines. Returns the number of inbound messages.
    pub async fn run_once(&mut self) -> Result<usize> {
        let inbound = self.transport.poll().await?;
        let count = inbound.len();
        if count > 0 {
            debug!(count, "Polled messages");
        }

        for raw in inbound {
            let outgoing = self.process(raw).await;
            self.deliver(outgoing).await;
        }

        let timeouts = self.orchestrator.check_timeouts().await;
        self.deliver(timeouts).await;
        Ok(count)
    }

    async fn process(&mut self, raw: RawMessage) -> Vec<OutgoingMessage> {
        match Inbound::classify(&raw) {
            Inbound::League(message_type) => {
                let game_id = match Envelope::from_value(raw.body.clone()) {
                    Ok(envelope) => self.orchestrator.context_game_id(&envelope).await,
                    Err(_) => SEASON_PLACEHOLDER_GAME_ID.to_string(),
                };
                let span = info_span!("league", game_id = %game_id, message_type = %message_type);
                self.process_league(message_type, raw).instrument(span).await
            }
            Inbound::Player(message_type) => {
                let game_id = raw
                    .body
                    .get("game_id")
                    .and_then(Value::as_str)
                    .unwrap_or(SEASON_PLACEHOLDER_GAME_ID)
                    .to_string();
                let span = info_span!("player", game_id = %game_id, message_type = %message_type);
                self.process_player(message_type, raw).instrument(span).await
            }
            Inbound::Unknown(reason) => {
                debug!(from = %raw.from, reason = %reason, "Ignoring message");
                self.reject(raw.message_type().unwrap_or_default(), &raw.from, reason);
                Vec::new()
            }
        }
    }

    async fn process_league(
        &mut self,
        message_type: MessageType,
        raw: RawMessage,
    ) -> Vec<OutgoingMessage> {
        let validation = validate_envelope(message_type, &raw.body);
        if !validation.is_valid {
            let detail = validation
                .errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            warn!(from = %raw.from, errors = %detail, "Invalid league message");
            self.reject(message_type.to_string(), &raw.from, detail.clone());
            return vec![self.error_reply(message_type, &raw, detail)];
        }

        match Envelope::from_value(raw.body) {
            Ok(envelope) => self.orchestrator.handle_control_message(&envelope).await,
            Err(e) => {
                warn!(from = %raw.from, error = %e, "Unreadable league envelope");
                self.reject(message_type.to_string(), &raw.from, e.to_string());
                Vec::new()
            }
        }
    }

    async fn process_player(
        &mut self,
        message_type: MessageType,
        raw: RawMessage,
    ) -> Vec<OutgoingMessage> {
        match self.orchestrator.route_player_message(&raw.body).await {
            Ok(outgoing) => outgoing,
            Err(e) => {
                match &e {
                    OrchestratorError::Protocol(_) => {
                        warn!(from = %raw.from, error = %e, "Invalid player message")
                    }
                    _ => info!(from = %raw.from, reason = %e, "Player message dropped"),
                }
                self.reject(message_type.to_string(), &raw.from, e.to_string());
                Vec::new()
            }
        }
    }

    fn error_reply(
        &self,
        message_type: MessageType,
        raw: &RawMessage,
        detail: String,
    ) -> OutgoingMessage {
        let envelope = self.errors.build(
            ErrorCode::InvalidMessage,
            detail,
            message_type.as_str(),
            true,
            &raw.from,
            raw.message_id().map(str::to_string),
        );
        OutgoingMessage::new(&raw.from, envelope)
    }

    fn reject(&self, message_type: String, sender: &str, reason: String) {
        self.orchestrator.events().emit(RefereeEvent::MessageRejected {
            message_type,
            sender: sender.to_string(),
            reason,
        });
    }

    async fn deliver(&mut self, outgoing: Vec<OutgoingMessage>) {
        for message in outgoing {
            self.send(&message).await;
        }
    }

    /// Sends one message; a match-result report gets one retry.
    async fn send(&mut self, message: &OutgoingMessage) -> bool {
        let mut delivered = self.try_send(message).await;
        if !delivered && message.is_match_result() {
            warn!(
                recipient = %message.recipient,
                delay_secs = self.retry_delay.as_secs(),
                "Match result not delivered, retrying once"
            );
            tokio::time::sleep(self.retry_delay).await;
            delivered = self.try_send(message).await;
        }
        if !delivered {
            warn!(
                recipient = %message.recipient,
                message_type = %message.envelope.message_type,
                "Message not delivered"
            );
        }
        self.orchestrator.events().emit(RefereeEvent::MessageSent {
            message_type: message.envelope.message_type.clone(),
            recipient: message.recipient.clone(),
            delivered,
        });
        delivered
    }

    async fn try_send(&mut self, message: &OutgoingMessage) -> bool {
        match self
            .transport
            .send(&message.recipient, &message.subject, &message.envelope)
            .await
        {
            Ok(delivered) => delivered,
            Err(e) => {
                warn!(recipient = %message.recipient, error = %e, "Send failed");
                false
            }
        }
    }
}

impl<T: Transport> std::fmt::Debug for RefereeRunner<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefereeRunner")
            .field("orchestrator", &self.orchestrator)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}
