use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::Config;
use crate::gateway::types::{GatewayCommand, GatewayEvent, InboundMessage};
use crate::message::{DeliveryStatus, Message};

/// Canned client answers the loopback gateway cycles through after a
/// reply has been "read".
const CLIENT_REPLIES: &[&str] = &[
    "Thanks coach, that helps!",
    "Hit a new personal best on bench today",
    "My lower back is a bit sore after deadlifts",
    "Sorry, I missed Thursday's session",
    "See you next week!",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopbackSettings {
    pub delivered_after: Duration,
    pub read_after: Duration,
    /// Delay between the read receipt and the scripted client answer
    pub reply_after: Duration,
}

impl LoopbackSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            delivered_after: Duration::from_millis(config.demo_delivered_after_ms),
            read_after: Duration::from_millis(
                config.demo_read_after_ms.max(config.demo_delivered_after_ms),
            ),
            reply_after: Duration::from_secs(2),
        }
    }
}

/// In-process gateway: pretends every transmission reaches the client,
/// reports `Delivered` and `Read` receipts on a timer, and has the client
/// answer with a scripted message.
pub struct LoopbackGateway {
    command_tx: mpsc::Sender<GatewayCommand>,
    pub event_rx: mpsc::Receiver<GatewayEvent>,
    task: JoinHandle<()>,
}

impl LoopbackGateway {
    pub fn spawn(settings: LoopbackSettings) -> Self {
        let (event_tx, event_rx) = mpsc::channel::<GatewayEvent>(256);
        let (command_tx, mut command_rx) = mpsc::channel::<GatewayCommand>(64);

        let task = tokio::spawn(async move {
            let mut replies = CLIENT_REPLIES.iter().cycle();
            while let Some(command) = command_rx.recv().await {
                match command {
                    GatewayCommand::Transmit { message_id, client_id, channel, text } => {
                        debug!(%message_id, client = %client_id, %channel, len = text.len(), "loopback transmit");
                        let reply = replies.next().copied().unwrap_or("ok");
                        let tx = event_tx.clone();
                        tokio::spawn(async move {
                            tokio::time::sleep(settings.delivered_after).await;
                            let delivered = GatewayEvent::ReceiptReceived {
                                message_id,
                                status: DeliveryStatus::Delivered,
                            };
                            if tx.send(delivered).await.is_err() {
                                return;
                            }

                            tokio::time::sleep(settings.read_after.saturating_sub(settings.delivered_after)).await;
                            let read = GatewayEvent::ReceiptReceived {
                                message_id,
                                status: DeliveryStatus::Read,
                            };
                            if tx.send(read).await.is_err() {
                                return;
                            }

                            tokio::time::sleep(settings.reply_after).await;
                            let answer = GatewayEvent::MessageReceived(InboundMessage {
                                client_id,
                                text: reply.to_string(),
                                channel,
                                timestamp: Utc::now(),
                            });
                            let _ = tx.send(answer).await;
                        });
                    }
                }
            }
        });

        Self { command_tx, event_rx, task }
    }

    /// Hand a stored coach reply to the gateway. Returns without waiting
    /// for any receipt.
    pub async fn transmit(&self, message: &Message) -> Result<()> {
        let Some(command) = GatewayCommand::transmit(message) else {
            warn!(id = %message.id(), "nothing to transmit");
            return Ok(());
        };
        self.command_tx
            .send(command)
            .await
            .context("loopback gateway stopped")?;
        Ok(())
    }

    pub async fn shutdown(self) -> Result<()> {
        drop(self.command_tx);
        self.task.await.context("loopback gateway task failed")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Channel;

    fn settings() -> LoopbackSettings {
        LoopbackSettings {
            delivered_after: Duration::from_millis(100),
            read_after: Duration::from_millis(300),
            reply_after: Duration::from_millis(50),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn transmit_yields_receipts_then_reply() {
        let mut gateway = LoopbackGateway::spawn(settings());
        let msg = Message::outbound("c1", "how was the session?", Channel::Whatsapp, Utc::now()).unwrap();
        gateway.transmit(&msg).await.unwrap();

        assert_eq!(
            gateway.event_rx.recv().await,
            Some(GatewayEvent::ReceiptReceived { message_id: msg.id(), status: DeliveryStatus::Delivered })
        );
        assert_eq!(
            gateway.event_rx.recv().await,
            Some(GatewayEvent::ReceiptReceived { message_id: msg.id(), status: DeliveryStatus::Read })
        );
        match gateway.event_rx.recv().await {
            Some(GatewayEvent::MessageReceived(inbound)) => {
                assert_eq!(inbound.client_id, "c1");
                assert_eq!(inbound.channel, Channel::Whatsapp);
                assert_eq!(inbound.text, CLIENT_REPLIES[0]);
            }
            other => panic!("Expected MessageReceived, got {:?}", other),
        }

        gateway.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn client_messages_are_not_transmitted() {
        let mut gateway = LoopbackGateway::spawn(settings());
        let inbound = Message::inbound("c1", "hi", Some(Channel::Email), Utc::now()).unwrap();
        gateway.transmit(&inbound).await.unwrap();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(gateway.event_rx.try_recv().is_err());
        gateway.shutdown().await.unwrap();
    }

    #[test]
    fn read_delay_never_precedes_delivery() {
        let config = Config {
            demo_delivered_after_ms: 5000,
            demo_read_after_ms: 10,
            ..Config::default()
        };
        let s = LoopbackSettings::from_config(&config);
        assert_eq!(s.read_after, s.delivered_after);
    }
}
