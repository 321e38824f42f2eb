use super::client::{ChatClient, DealChatRequest};
use super::decoder::{DecoderState, StreamDecoder, DEFAULT_PARSE_RETRY_LIMIT};
use super::{ChatError, ChatMessage, Role};
use crate::crm::models::{Contact, Deal};
use crate::notify::{Notice, Notifier};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use tracing::{info_span, warn, Instrument};

/// Conversation about one deal. Selecting another deal means a new session.
#[derive(Debug)]
pub struct ChatSession {
    deal: Deal,
    contact: Contact,
    messages: Vec<ChatMessage>,
    parse_retry_limit: Option<u32>,
}

impl ChatSession {
    pub fn new(deal: Deal, contact: Contact) -> Self {
        Self {
            deal,
            contact,
            messages: Vec::new(),
            parse_retry_limit: Some(DEFAULT_PARSE_RETRY_LIMIT),
        }
    }

    pub fn with_parse_retry_limit(mut self, limit: Option<u32>) -> Self {
        self.parse_retry_limit = limit;
        self
    }

    pub fn deal(&self) -> &Deal {
        &self.deal
    }

    pub fn contact(&self) -> &Contact {
        &self.contact
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn reset(&mut self) {
        self.messages.clear();
    }

    /// Send `text` and stream the assistant reply into the message list.
    ///
    /// Blank input is ignored. A failure is reported to `notifier` once and
    /// also returned.
    pub async fn send<N>(
        &mut self,
        client: &ChatClient,
        text: &str,
        notifier: &N,
    ) -> Result<(), ChatError>
    where
        N: Notifier + ?Sized,
    {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        self.messages.push(ChatMessage::user(text));

        let span = info_span!("deal_chat", deal_id = %self.deal.id, turn = self.messages.len());
        let result: Result<(), ChatError> = async {
            let request = DealChatRequest {
                messages: &self.messages,
                deal: &self.deal,
                contact: &self.contact,
            };
            let stream = client.open_stream(&request).await?;
            self.consume(stream).await
        }
        .instrument(span)
        .await;

        if let Err(err) = &result {
            warn!(error = %err, "chat send failed");
            notifier.notify(Notice::error("Chat Error", err.reason()));
        }
        result
    }

    /// Decode a response body into a new assistant message.
    ///
    /// On a transport error an assistant message that never received content
    /// is removed; partial content is kept.
    pub async fn consume<S>(&mut self, stream: S) -> Result<(), ChatError>
    where
        S: Stream<Item = Result<Bytes, ChatError>>,
    {
        self.messages.push(ChatMessage::assistant(String::new()));
        let mut decoder = StreamDecoder::with_retry_limit(self.parse_retry_limit);
        futures::pin_mut!(stream);

        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(bytes) => {
                    if !decoder.feed(&bytes).is_empty() {
                        self.replace_assistant_content(decoder.content());
                    }
                    if decoder.state() == &DecoderState::Completed {
                        return Ok(());
                    }
                }
                Err(err) => {
                    decoder.fail(err.reason());
                    self.discard_empty_assistant();
                    return Err(err);
                }
            }
        }

        if !decoder.finish().is_empty() {
            self.replace_assistant_content(decoder.content());
        }
        Ok(())
    }

    fn replace_assistant_content(&mut self, content: &str) {
        if let Some(last) = self.messages.last_mut() {
            if last.role == Role::Assistant {
                last.content = content.to_string();
            }
        }
    }

    fn discard_empty_assistant(&mut self) {
        if self
            .messages
            .last()
            .is_some_and(|m| m.role == Role::Assistant && m.content.is_empty())
        {
            self.messages.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crm::models::{ContactProperties, DealProperties, DealStage};
    use futures::stream;

    fn session() -> ChatSession {
        let deal = Deal {
            id: "d1".into(),
            properties: DealProperties {
                dealname: "Acme renewal".into(),
                amount: "1200".into(),
                dealstage: DealStage::QualifiedToBuy,
            },
        };
        let contact = Contact {
            id: "c1".into(),
            properties: ContactProperties {
                firstname: "Ada".into(),
                lastname: "Lovelace".into(),
                email: "ada@example.com".into(),
                ..Default::default()
            },
        };
        ChatSession::new(deal, contact)
    }

    fn chunks(parts: &[&'static str]) -> Vec<Result<Bytes, ChatError>> {
        parts
            .iter()
            .copied()
            .map(|p| Ok(Bytes::from_static(p.as_bytes())))
            .collect()
    }

    #[tokio::test]
    async fn test_consume_builds_assistant_message() {
        let mut session = session();
        session.messages.push(ChatMessage::user("hi"));
        let body = chunks(&[
            "data: {\"choices\":[{\"delta\":{\"con",
            "tent\":\"Hel\"}}]}\n: keep-alive\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\ndata: [DONE]\n",
        ]);
        session.consume(stream::iter(body)).await.unwrap();
        assert_eq!(
            session.messages(),
            &[ChatMessage::user("hi"), ChatMessage::assistant("Hello")]
        );
    }

    #[tokio::test]
    async fn test_error_before_content_discards_assistant() {
        let mut session = session();
        session.messages.push(ChatMessage::user("hi"));
        let mut body = chunks(&[": keep-alive\n"]);
        body.push(Err(ChatError::Stream("connection reset".into())));
        let err = session.consume(stream::iter(body)).await.unwrap_err();
        assert_eq!(err.reason(), "connection reset");
        assert_eq!(session.messages(), &[ChatMessage::user("hi")]);
    }

    #[tokio::test]
    async fn test_error_after_content_keeps_partial_reply() {
        let mut session = session();
        let mut body = chunks(&["data: {\"choices\":[{\"delta\":{\"content\":\"Part\"}}]}\n"]);
        body.push(Err(ChatError::Stream("connection reset".into())));
        assert!(session.consume(stream::iter(body)).await.is_err());
        assert_eq!(session.messages(), &[ChatMessage::assistant("Part")]);
    }

    #[tokio::test]
    async fn test_chunks_after_done_are_not_read() {
        let mut session = session();
        let mut body = chunks(&["data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\ndata: [DONE]\n"]);
        body.push(Err(ChatError::Stream("should not be seen".into())));
        session.consume(stream::iter(body)).await.unwrap();
        assert_eq!(session.messages(), &[ChatMessage::assistant("ok")]);
    }

    #[tokio::test]
    async fn test_retry_limit_drops_garbage_record() {
        let mut session = session().with_parse_retry_limit(Some(0));
        let body = chunks(&[
            "data: {garbage\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"fine\"}}]}\n",
        ]);
        session.consume(stream::iter(body)).await.unwrap();
        assert_eq!(session.messages(), &[ChatMessage::assistant("fine")]);
        assert_eq!(session.contact().full_name(), "Ada Lovelace");
    }

    #[test]
    fn test_reset_clears_messages() {
        let mut session = session();
        session.messages.push(ChatMessage::user("hi"));
        session.reset();
        assert!(session.messages().is_empty());
    }
}
