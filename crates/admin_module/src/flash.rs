use shared::{
    domain::{FlashMessage, SessionId},
    error::ApiException,
};
use storage::Storage;

pub const FLASH_QUEUE_IDENTIFIER: &str = "core.template.flashMessages";

/// Per-request flash message queue.
///
/// Messages flagged `store_in_session` go to the session store and survive a
/// redirect; the rest only live until this request renders.
pub struct FlashMessageQueue<'a> {
    storage: &'a Storage,
    session_id: &'a SessionId,
    transient: Vec<FlashMessage>,
}

impl<'a> FlashMessageQueue<'a> {
    pub fn new(storage: &'a Storage, session_id: &'a SessionId) -> Self {
        Self {
            storage,
            session_id,
            transient: Vec::new(),
        }
    }

    pub async fn add_message(&mut self, message: FlashMessage) -> Result<(), ApiException> {
        if message.store_in_session {
            self.storage
                .enqueue_flash_message(self.session_id, FLASH_QUEUE_IDENTIFIER, &message)
                .await
                .map_err(ApiException::storage)?;
        } else {
            self.transient.push(message);
        }
        Ok(())
    }

    pub async fn render_all(self) -> Result<Vec<FlashMessage>, ApiException> {
        let mut messages = self
            .storage
            .drain_flash_messages(self.session_id, FLASH_QUEUE_IDENTIFIER)
            .await
            .map_err(ApiException::storage)?;
        messages.extend(self.transient);
        Ok(messages)
    }
}
