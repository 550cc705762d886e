//! Funnel runtime executor

use super::traits::{Messenger, OrderLog, PhotoFetcher, UpdateHandler};
use super::{Command, Inbound};
use crate::funnel::texts;
use crate::funnel::{
    transition, ChatId, ChatTarget, Effect, Event, FunnelContext, Keyboard, MessageId, Stage,
};
use crate::registry::Registry;
use crate::telegram::Update;
use async_trait::async_trait;
use std::sync::Arc;

/// Outcome of an owner reply, decided under the registry lock
enum QuoteOutcome {
    /// No pending quote for the replied-to message
    Unknown,
    /// The quote resolved but the reply carried no price text
    MissingPrice { chat: ChatId },
    /// The quote resolved but the client is no longer awaiting a price
    Stale { chat: ChatId },
    Relayed { chat: ChatId, effects: Vec<Effect> },
}

/// Generic funnel runtime that can work with any messenger, photo store and order log
pub struct FunnelRuntime<M, P, O>
where
    M: Messenger + 'static,
    P: PhotoFetcher + 'static,
    O: OrderLog + 'static,
{
    owner: ChatId,
    contact_url: String,
    registry: Registry,
    messenger: Arc<M>,
    photos: Arc<P>,
    orders: Arc<O>,
}

impl<M, P, O> FunnelRuntime<M, P, O>
where
    M: Messenger + 'static,
    P: PhotoFetcher + 'static,
    O: OrderLog + 'static,
{
    pub fn new(
        owner: ChatId,
        contact_url: impl Into<String>,
        registry: Registry,
        messenger: Arc<M>,
        photos: Arc<P>,
        orders: Arc<O>,
    ) -> Self {
        Self {
            owner,
            contact_url: contact_url.into(),
            registry,
            messenger,
            photos,
            orders,
        }
    }

    #[allow(dead_code)] // Used in tests
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Handle one inbound message to completion
    pub async fn handle(&self, inbound: Inbound) {
        tracing::debug!(kind = inbound.kind(), "Inbound message");

        match inbound {
            Inbound::Command { chat, command } => match command {
                Command::Start => self.process_event(chat, Event::Start).await,
                Command::Contact => self.process_event(chat, Event::Contact).await,
                Command::ExportOrders => self.export_orders(chat).await,
            },
            Inbound::Photo {
                chat,
                file_id,
                sender,
            } => {
                self.process_event(chat, Event::Photo { file_id, sender })
                    .await;
            }
            Inbound::Text {
                chat,
                text,
                sent_at,
            } => self.process_event(chat, Event::Text { text, sent_at }).await,
            Inbound::OwnerReply { replied_to, text } => {
                self.handle_owner_reply(replied_to, text).await;
            }
        }
    }

    /// Process an event and every event generated by its effects
    async fn process_event(&self, chat: ChatId, event: Event) {
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            let Some(effects) = self.apply(chat, current_event) else {
                continue;
            };
            events_to_process.extend(self.execute_effects(chat, effects).await);
        }
    }

    /// Pure transition plus commit, atomically under the registry lock
    fn apply(&self, chat: ChatId, event: Event) -> Option<Vec<Effect>> {
        let context = self.context(chat);
        let event_kind = event.kind();

        self.registry.with(|registries| {
            let stage = registries.stages.get(chat);
            match transition(stage, registries.captures.get(chat), &context, event) {
                Ok(result) => {
                    tracing::info!(
                        chat_id = %chat,
                        event = event_kind,
                        from = %stage,
                        to = %result.new_stage,
                        "Stage transition"
                    );
                    registries.commit(chat, result.new_stage, result.capture);
                    Some(result.effects)
                }
                Err(e) => {
                    tracing::debug!(chat_id = %chat, error = %e, "Ignoring event");
                    None
                }
            }
        })
    }

    /// Resolve, transition and consume in one critical section
    async fn handle_owner_reply(&self, replied_to: MessageId, text: Option<String>) {
        let price = text.filter(|t| !t.trim().is_empty());

        let outcome = self.registry.with(|registries| {
            let Some(chat) = registries.quotes.resolve(replied_to) else {
                return QuoteOutcome::Unknown;
            };
            let Some(price) = price else {
                return QuoteOutcome::MissingPrice { chat };
            };

            let stage = registries.stages.get(chat);
            let result = transition(
                stage,
                registries.captures.get(chat),
                &self.context(chat),
                Event::PriceQuoted { price },
            );
            registries.quotes.consume(replied_to);

            match result {
                Ok(result) => {
                    tracing::info!(
                        chat_id = %chat,
                        notification_id = %replied_to,
                        from = %stage,
                        to = %result.new_stage,
                        pending_quotes = registries.quotes.len(),
                        "Price relayed"
                    );
                    registries.commit(chat, result.new_stage, result.capture);
                    QuoteOutcome::Relayed {
                        chat,
                        effects: result.effects,
                    }
                }
                Err(e) => {
                    tracing::warn!(chat_id = %chat, error = %e, "Stale pending quote consumed");
                    QuoteOutcome::Stale { chat }
                }
            }
        });

        match outcome {
            QuoteOutcome::Unknown => {
                tracing::warn!(notification_id = %replied_to, "No pending quote for owner reply");
                self.send_logged(self.owner, texts::OWNER_CLIENT_NOT_FOUND, None)
                    .await;
            }
            QuoteOutcome::MissingPrice { chat } => {
                tracing::info!(chat_id = %chat, notification_id = %replied_to, "Owner reply without price text");
                self.send_logged(self.owner, texts::OWNER_PRICE_AS_TEXT, None)
                    .await;
            }
            QuoteOutcome::Stale { chat } => {
                tracing::debug!(chat_id = %chat, "Telling owner the client moved on");
                self.send_logged(self.owner, texts::OWNER_CLIENT_GONE, None)
                    .await;
            }
            QuoteOutcome::Relayed { chat, effects } => {
                for event in self.execute_effects(chat, effects).await {
                    self.process_event(chat, event).await;
                }
            }
        }
    }

    async fn export_orders(&self, chat: ChatId) {
        let path = if chat == self.owner {
            self.orders.export_path().await
        } else {
            None
        };

        let Some(path) = path else {
            tracing::info!(chat_id = %chat, "Order export refused");
            self.send_logged(chat, texts::EXPORT_DENIED, None).await;
            return;
        };

        if let Err(e) = self
            .messenger
            .send_document(chat, &path, Some(texts::EXPORT_CAPTION))
            .await
        {
            tracing::error!(error = %e, path = %path.display(), "Failed to send order log");
        }
    }

    /// Execute effects in order; failures are logged and never stop the batch
    async fn execute_effects(&self, chat: ChatId, effects: Vec<Effect>) -> Vec<Event> {
        let mut generated = Vec::new();
        for effect in effects {
            if let Some(event) = self.execute_effect(chat, effect).await {
                generated.push(event);
            }
        }
        generated
    }

    async fn execute_effect(&self, chat: ChatId, effect: Effect) -> Option<Event> {
        match effect {
            Effect::SendText { to, text, keyboard } => {
                self.send_logged(self.target(chat, to), &text, keyboard.as_ref())
                    .await;
                None
            }

            Effect::SendPhoto { to, photo, caption } => {
                let target = self.target(chat, to);
                if let Err(e) = self
                    .messenger
                    .send_photo(target, &photo, caption.as_deref())
                    .await
                {
                    tracing::error!(chat_id = %target, photo = %photo, error = %e, "Failed to send photo");
                }
                None
            }

            Effect::FetchPhoto { file_id, user_id } => {
                match self.photos.fetch_photo(&file_id, user_id).await {
                    Ok(photo) => {
                        tracing::info!(chat_id = %chat, file_id = %file_id, photo = %photo, "Client photo stored");
                        Some(Event::PhotoStored { file_id, photo })
                    }
                    Err(e) => {
                        tracing::error!(chat_id = %chat, file_id = %file_id, error = %e, "Failed to fetch client photo");
                        Some(Event::PhotoFailed {
                            file_id,
                            reason: e.to_string(),
                        })
                    }
                }
            }

            Effect::ForwardForAppraisal {
                file_id,
                photo,
                caption,
            } => {
                match self
                    .messenger
                    .send_photo(self.owner, &photo, Some(&caption))
                    .await
                {
                    Ok(notification) => {
                        self.register_quote(chat, &file_id, notification);
                        None
                    }
                    Err(e) => {
                        tracing::error!(chat_id = %chat, error = %e, "Failed to forward photo to owner");
                        Some(Event::ForwardFailed {
                            file_id,
                            reason: e.to_string(),
                        })
                    }
                }
            }

            Effect::AppendOrder { order } => {
                match self.orders.append(&order).await {
                    Ok(()) => tracing::info!(
                        chat_id = %chat,
                        client = %order.client_handle,
                        photo = %order.photo,
                        "Order recorded"
                    ),
                    // Best effort: the conversation still completes
                    Err(e) => tracing::error!(chat_id = %chat, error = %e, "Failed to append order"),
                }
                None
            }
        }
    }

    /// Bind the owner notification to `chat` if the upload is still the current submission
    fn register_quote(&self, chat: ChatId, file_id: &str, notification: MessageId) {
        let registered = self.registry.with(|registries| {
            let current = registries.stages.get(chat) == Stage::AwaitOwnerPrice
                && registries
                    .captures
                    .get(chat)
                    .is_some_and(|c| c.is_for(file_id));
            current.then(|| registries.quotes.register(notification, chat))
        });

        match registered {
            Some(Ok(())) => tracing::info!(
                chat_id = %chat,
                notification_id = %notification,
                "Photo forwarded for appraisal"
            ),
            Some(Err(collision)) => tracing::error!(
                chat_id = %chat,
                error = %collision,
                "Pending quote collision"
            ),
            None => tracing::warn!(
                chat_id = %chat,
                file_id = %file_id,
                notification_id = %notification,
                "Forward completed for a superseded submission"
            ),
        }
    }

    async fn send_logged(&self, chat: ChatId, text: &str, keyboard: Option<&Keyboard>) {
        if let Err(e) = self.messenger.send_text(chat, text, keyboard).await {
            tracing::error!(chat_id = %chat, error = %e, "Failed to send message");
        }
    }

    fn target(&self, chat: ChatId, to: ChatTarget) -> ChatId {
        match to {
            ChatTarget::Client => chat,
            ChatTarget::Owner => self.owner,
        }
    }

    fn context(&self, chat: ChatId) -> FunnelContext {
        FunnelContext::new(chat, self.contact_url.clone())
    }
}

#[async_trait]
impl<M, P, O> UpdateHandler for FunnelRuntime<M, P, O>
where
    M: Messenger + 'static,
    P: PhotoFetcher + 'static,
    O: OrderLog + 'static,
{
    async fn handle_update(&self, update: Update) {
        let update_id = update.update_id;
        let Some(message) = update.message else {
            tracing::debug!(update_id, "Update without message ignored");
            return;
        };

        match Inbound::classify(message, self.owner) {
            Some(inbound) => self.handle(inbound).await,
            None => tracing::debug!(update_id, "Unsupported message ignored"),
        }
    }
}
