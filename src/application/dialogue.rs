//! Conversation engine
//!
//! One caller utterance in, one spoken reply out. The engine loads the call's
//! session, locks its language on the first words, runs the step handler and
//! stores the session again. Everything optional (intention question, final
//! read-back, cancellation, generative rephrasing) is switched by
//! [`Capabilities`].

use crate::domain::conversation::{
    Capabilities, CallSession, SessionStore, Slot, SlotValue, Step,
};
use crate::domain::extraction::RuleSlotReader;
use crate::domain::intent::{self, CancelAnswer, ConfirmationReply, PhoneChoice};
use crate::domain::language::{Language, LanguageDetector};
use crate::domain::lexicon::{Lexicon, ResponseKey};
use crate::domain::reservation::{persist_reservation, ReservationRecord, ReservationStore};
use crate::domain::response::{render, slot_vars, ResponseSelector};
use crate::domain::sentiment::Sentiment;
use crate::domain::shared::{Clock, DomainError, PhoneNumber, Result, SystemClock};
use crate::domain::strategy::{ReplyDraft, ReplyWriter, SlotReader, SlotRequest, TableReplyWriter};
use crate::domain::transcript::render_transcript;
use futures::FutureExt;
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const DEFAULT_PERSIST_TIMEOUT: Duration = Duration::from_secs(5);

/// Silent turns in a row after which the call is given up
pub const MAX_SILENCES: u32 = 2;

/// One caller turn as delivered by the transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRequest {
    pub caller_id: String,
    #[serde(default)]
    pub utterance: String,
    #[serde(default)]
    pub caller_number: Option<String>,
}

impl TurnRequest {
    pub fn new(caller_id: impl Into<String>, utterance: impl Into<String>) -> Self {
        Self {
            caller_id: caller_id.into(),
            utterance: utterance.into(),
            caller_number: None,
        }
    }

    pub fn with_caller_number(mut self, number: impl Into<String>) -> Self {
        self.caller_number = Some(number.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnResponse {
    pub text: String,
    /// The transport should hang up after speaking `text`
    pub is_final: bool,
    pub step: Step,
    pub language: Language,
}

/// Reply produced by a step handler
struct Reply {
    text: String,
    /// Fixed utterances (summary, apologies) are never rephrased
    rephrase: bool,
    sentiment: Sentiment,
}

pub struct ConversationEngine {
    lexicon: Arc<Lexicon>,
    selector: ResponseSelector,
    slot_reader: Arc<dyn SlotReader>,
    reply_writer: Arc<dyn ReplyWriter>,
    reservations: Arc<dyn ReservationStore>,
    sessions: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    capabilities: Capabilities,
    persist_timeout: Duration,
}

impl ConversationEngine {
    /// Engine with rule-based slot reading, table replies and the system clock
    pub fn new(
        lexicon: Arc<Lexicon>,
        sessions: Arc<dyn SessionStore>,
        reservations: Arc<dyn ReservationStore>,
    ) -> Self {
        Self {
            selector: ResponseSelector::new(lexicon.clone()),
            slot_reader: Arc::new(RuleSlotReader::new(lexicon.clone())),
            reply_writer: Arc::new(TableReplyWriter),
            lexicon,
            reservations,
            sessions,
            clock: Arc::new(SystemClock),
            capabilities: Capabilities::default(),
            persist_timeout: DEFAULT_PERSIST_TIMEOUT,
        }
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_slot_reader(mut self, reader: Arc<dyn SlotReader>) -> Self {
        self.slot_reader = reader;
        self
    }

    pub fn with_reply_writer(mut self, writer: Arc<dyn ReplyWriter>) -> Self {
        self.reply_writer = writer;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_persist_timeout(mut self, timeout: Duration) -> Self {
        self.persist_timeout = timeout;
        self
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    /// Process one caller utterance.
    ///
    /// Faults inside the step handler end the call with the technical-error
    /// utterance; only session storage failures are returned as errors.
    pub async fn handle_turn(&self, request: TurnRequest) -> Result<TurnResponse> {
        let now = self.clock.now();
        let mut session = match self.sessions.get(&request.caller_id).await? {
            Some(session) => session,
            None => {
                info!("New call {}", request.caller_id);
                counter!("calls_started_total").increment(1);
                CallSession::new(request.caller_id.clone(), request.caller_number.clone(), now)
            }
        };

        if session.step().is_terminal() {
            let language = session.language().unwrap_or(self.lexicon.default_language());
            debug!("Call {} already ended at {}", session.call_id(), session.step());
            return Ok(TurnResponse {
                text: self.speak(ResponseKey::Goodbye, &session, language, None),
                is_final: true,
                step: session.step(),
                language,
            });
        }

        let utterance = request.utterance.trim();
        if !utterance.is_empty() {
            session.record_caller(utterance, now);
            if session.language().is_none() {
                let detected = LanguageDetector::new(&self.lexicon).detect(utterance);
                session.lock_language(detected);
                info!("Call {} locked to language {}", session.call_id(), detected);
            }
        }
        let language = session.language().unwrap_or(self.lexicon.default_language());
        let from = session.step();

        let outcome = AssertUnwindSafe(self.advance(&mut session, utterance, language))
            .catch_unwind()
            .await;
        let reply = match outcome {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                error!("Turn failed for call {}: {}", session.call_id(), e);
                self.technical_error(&mut session, language)
            }
            Err(_) => {
                error!("Turn panicked for call {}", session.call_id());
                self.technical_error(&mut session, language)
            }
        };

        let text = self.polish(reply, session.step(), language).await;
        session.record_assistant(&text, self.clock.now());

        let step = session.step();
        if from != step {
            info!("Call {}: {} -> {}", session.call_id(), from, step);
        }
        counter!("dialogue_turns_total", "step" => step.as_str()).increment(1);

        self.sessions.put(session).await?;

        Ok(TurnResponse {
            text,
            is_final: step.is_terminal(),
            step,
            language,
        })
    }

    /// Drop sessions of calls that went quiet without ever ending, such as
    /// callers who hung up mid-dialogue. Returns how many were removed.
    pub async fn sweep_idle_sessions(&self, ttl: Duration) -> Result<usize> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| DomainError::ValidationError(format!("session ttl out of range: {}", e)))?;
        let purged = self.sessions.purge_idle(self.clock.now() - ttl).await?;
        if purged > 0 {
            info!("Swept {} idle sessions", purged);
            counter!("sessions_expired_total").increment(purged as u64);
        }
        Ok(purged)
    }

    /// Final reply for a turn that could not be processed at all
    pub fn unavailable(&self, language: Option<Language>) -> TurnResponse {
        let language = language.unwrap_or(self.lexicon.default_language());
        TurnResponse {
            text: self.selector.select(ResponseKey::TechnicalError, language, None),
            is_final: true,
            step: Step::Error,
            language,
        }
    }

    async fn advance(
        &self,
        session: &mut CallSession,
        utterance: &str,
        language: Language,
    ) -> Result<Reply> {
        let pack = self.lexicon.pack(language);
        let step = session.step();

        if self.capabilities.cancellation
            && step.is_cancellable()
            && !utterance.is_empty()
            && intent::is_cancellation_request(utterance, pack)
        {
            session.suspend()?;
            return Ok(self.reply(&[ResponseKey::CancelConfirm], session, language, utterance));
        }

        if utterance.is_empty() && step != Step::Greeting {
            return self.silence(session, language);
        }

        match step {
            Step::Greeting => self.greet(session, utterance, language),
            Step::AskIntention => {
                if intent::is_reservation_request(utterance, pack)
                    || intent::is_affirmative(utterance, pack)
                {
                    session.transition_to(Step::AskPeople)?;
                    Ok(self.reply(
                        &[ResponseKey::StartReservation, ResponseKey::QuestionPeople],
                        session,
                        language,
                        utterance,
                    ))
                } else {
                    Ok(self.retry(session, ResponseKey::ClarifyIntention, language, utterance))
                }
            }
            Step::AskPeople | Step::AskDate | Step::AskTime | Step::AskName | Step::AskPhoneNumber => {
                let Some(slot) = step.slot() else {
                    return Err(DomainError::Internal(format!("{} collects no slot", step)));
                };
                match self.read_slot(session, slot, utterance, language).await {
                    Some(value) => self.accept(session, value, language, utterance).await,
                    None => Ok(self.retry(session, retry_key(step), language, utterance)),
                }
            }
            Step::AskPhone => self.choose_phone(session, utterance, language).await,
            Step::Confirm => self.confirm(session, utterance, language).await,
            Step::Cancelling => self.answer_cancellation(session, utterance, language),
            Step::Complete => self.complete(session, language, Vec::new()).await,
            Step::Finished | Step::Cancelled | Step::Abandoned | Step::Error => Err(DomainError::InvalidOperation(
                format!("call {} already ended", session.call_id()),
            )),
        }
    }

    /// Opening turn. An empty line gets the welcome and the help offer; a
    /// greeting or a booking request goes straight to the party size.
    fn greet(&self, session: &mut CallSession, utterance: &str, language: Language) -> Result<Reply> {
        let pack = self.lexicon.pack(language);
        let wants_booking = !utterance.is_empty() && intent::is_reservation_request(utterance, pack);
        let greeted = !utterance.is_empty() && intent::is_greeting(utterance, pack);

        if self.capabilities.intention_step && !wants_booking && !greeted {
            session.transition_to(Step::AskIntention)?;
            return Ok(self.reply(
                &[ResponseKey::Welcome, ResponseKey::OfferHelp],
                session,
                language,
                utterance,
            ));
        }

        session.transition_to(Step::AskPeople)?;
        let keys: &[ResponseKey] = if wants_booking {
            &[ResponseKey::Welcome, ResponseKey::StartReservation, ResponseKey::QuestionPeople]
        } else {
            &[ResponseKey::Welcome, ResponseKey::QuestionPeople]
        };
        Ok(self.reply(keys, session, language, utterance))
    }

    async fn read_slot(
        &self,
        session: &CallSession,
        slot: Slot,
        utterance: &str,
        language: Language,
    ) -> Option<SlotValue> {
        let request = SlotRequest::new(slot, utterance, language, self.clock.today());
        let value = match self.slot_reader.read(&request).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Slot reader failed on call {}: {}", session.call_id(), e);
                None
            }
        };
        match value {
            Some(SlotValue::Phone(raw)) => match PhoneNumber::parse(&raw) {
                Ok(phone) => Some(SlotValue::Phone(phone.as_str().to_string())),
                Err(e) => {
                    debug!("Rejected phone '{}': {}", raw, e);
                    None
                }
            },
            Some(SlotValue::Name(name)) if name.trim().chars().count() < 2 => None,
            other => other,
        }
    }

    /// Store a slot and ask for whatever is still missing
    async fn accept(
        &self,
        session: &mut CallSession,
        value: SlotValue,
        language: Language,
        utterance: &str,
    ) -> Result<Reply> {
        let slot = value.slot();
        debug!("Call {} filled {} = {}", session.call_id(), slot, value);
        session.fill(value);

        match session.slots().first_missing() {
            Some(next) => {
                session.transition_to(Step::asking(next))?;
                Ok(self.reply(
                    &[ack_key(slot), question_key(Step::asking(next))],
                    session,
                    language,
                    utterance,
                ))
            }
            None => {
                let ack = self.speak(ack_key(slot), session, language, None);
                self.all_filled(session, language, vec![ack]).await
            }
        }
    }

    /// Every slot is known: read it back, or save right away
    async fn all_filled(
        &self,
        session: &mut CallSession,
        language: Language,
        mut lead: Vec<String>,
    ) -> Result<Reply> {
        if self.capabilities.final_confirmation {
            session.transition_to(Step::Confirm)?;
            lead.push(self.speak(ResponseKey::ConfirmSummary, session, language, None));
            return Ok(Reply {
                text: lead.join(" "),
                rephrase: false,
                sentiment: Sentiment::Neutral,
            });
        }
        session.transition_to(Step::Complete)?;
        self.complete(session, language, lead).await
    }

    async fn choose_phone(
        &self,
        session: &mut CallSession,
        utterance: &str,
        language: Language,
    ) -> Result<Reply> {
        if let Some(value) = self.read_slot(session, Slot::Phone, utterance, language).await {
            return self.accept(session, value, language, utterance).await;
        }

        let pack = self.lexicon.pack(language);
        match intent::classify_phone_choice(utterance, pack) {
            PhoneChoice::Same => match caller_phone(session) {
                Some(phone) => self.accept(session, SlotValue::Phone(phone), language, utterance).await,
                None => {
                    debug!("Call {} has no usable caller number", session.call_id());
                    session.transition_to(Step::AskPhoneNumber)?;
                    Ok(self.reply(&[ResponseKey::QuestionPhoneNumber], session, language, utterance))
                }
            },
            PhoneChoice::Other => {
                session.transition_to(Step::AskPhoneNumber)?;
                Ok(self.reply(&[ResponseKey::QuestionPhoneNumber], session, language, utterance))
            }
            PhoneChoice::Unclear => Ok(self.retry(session, ResponseKey::RetryPhone, language, utterance)),
        }
    }

    async fn confirm(
        &self,
        session: &mut CallSession,
        utterance: &str,
        language: Language,
    ) -> Result<Reply> {
        let pack = self.lexicon.pack(language);
        match intent::classify_confirmation(utterance, pack) {
            ConfirmationReply::Confirm => {
                session.transition_to(Step::Complete)?;
                self.complete(session, language, Vec::new()).await
            }
            ConfirmationReply::Change(slot) => {
                let next = Step::asking(slot);
                session.transition_to(next)?;
                Ok(self.reply(
                    &[ResponseKey::Acknowledge, question_key(next)],
                    session,
                    language,
                    utterance,
                ))
            }
            ConfirmationReply::Restart => {
                session.clear_slots();
                session.transition_to(Step::AskPeople)?;
                Ok(self.reply(
                    &[ResponseKey::Restart, ResponseKey::QuestionPeople],
                    session,
                    language,
                    utterance,
                ))
            }
            ConfirmationReply::Deny => {
                Ok(self.reply(&[ResponseKey::AskChange], session, language, utterance))
            }
            ConfirmationReply::Unclear => {
                Ok(self.retry(session, ResponseKey::ConfirmRetry, language, utterance))
            }
        }
    }

    fn answer_cancellation(
        &self,
        session: &mut CallSession,
        utterance: &str,
        language: Language,
    ) -> Result<Reply> {
        let pack = self.lexicon.pack(language);
        match intent::classify_cancel_answer(utterance, pack) {
            CancelAnswer::Yes => {
                session.transition_to(Step::Cancelled)?;
                counter!("calls_cancelled_total").increment(1);
                info!("Call {} cancelled by caller", session.call_id());
                Ok(self.fixed(ResponseKey::Cancelled, session, language))
            }
            CancelAnswer::No => {
                let next = session.resume()?;
                Ok(self.reply(
                    &[ResponseKey::Resume, question_key(next)],
                    session,
                    language,
                    utterance,
                ))
            }
            CancelAnswer::Unclear => {
                Ok(self.retry(session, ResponseKey::CancelRetry, language, utterance))
            }
        }
    }

    /// Persist the reservation and end the call
    async fn complete(
        &self,
        session: &mut CallSession,
        language: Language,
        mut lead: Vec<String>,
    ) -> Result<Reply> {
        let transcript = render_transcript(session, "completed", self.clock.now());
        let saved = match ReservationRecord::from_session(session, transcript) {
            Ok(record) => {
                match tokio::time::timeout(
                    self.persist_timeout,
                    persist_reservation(self.reservations.as_ref(), &record),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(DomainError::Timeout(format!(
                        "storing reservation took longer than {:?}",
                        self.persist_timeout
                    ))),
                }
            }
            Err(e) => Err(e),
        };

        match saved {
            Ok(id) => {
                session.transition_to(Step::Finished)?;
                counter!("reservations_saved_total").increment(1);
                info!("Call {} finished with reservation {}", session.call_id(), id);
                lead.push(self.speak(ResponseKey::Confirmed, session, language, None));
            }
            Err(e) => {
                error!("Reservation for call {} not saved: {}", session.call_id(), e);
                counter!("reservations_failed_total").increment(1);
                session.fail();
                lead = vec![self.speak(ResponseKey::PersistenceFailed, session, language, None)];
            }
        }

        Ok(Reply {
            text: lead.join(" "),
            rephrase: false,
            sentiment: Sentiment::Neutral,
        })
    }

    /// Nothing was heard. The first silence repeats the question in other
    /// words, a second one in a row ends the call.
    fn silence(&self, session: &mut CallSession, language: Language) -> Result<Reply> {
        let silences = session.record_silence();
        if silences >= MAX_SILENCES {
            session.transition_to(Step::Abandoned)?;
            counter!("calls_abandoned_total").increment(1);
            info!("Call {} abandoned after {} silent turns", session.call_id(), silences);
            return Ok(self.fixed(ResponseKey::Goodbye, session, language));
        }

        let vars = slot_vars(session.slots(), self.lexicon.pack(language));
        let previous = session.last_prompt();
        let text = [ResponseKey::NoInput, question_key(session.step())]
            .iter()
            .map(|key| {
                let template = self.selector.select_avoiding(*key, language, None, previous);
                render(&template, &vars)
            })
            .collect::<Vec<_>>()
            .join(" ");
        Ok(Reply {
            text,
            rephrase: true,
            sentiment: Sentiment::Neutral,
        })
    }

    fn technical_error(&self, session: &mut CallSession, language: Language) -> Reply {
        session.fail();
        self.fixed(ResponseKey::TechnicalError, session, language)
    }

    /// Stay on the current step and ask again in different words
    fn retry(
        &self,
        session: &mut CallSession,
        key: ResponseKey,
        language: Language,
        utterance: &str,
    ) -> Reply {
        session.record_miss();
        let pack = self.lexicon.pack(language);
        let sentiment = Sentiment::tag(utterance, pack, session.misses());
        debug!(
            "Call {} missed at {} ({} in a row, {})",
            session.call_id(),
            session.step(),
            session.misses(),
            sentiment
        );
        let template = self.selector.select_avoiding(
            key,
            language,
            Some(sentiment),
            session.last_prompt(),
        );
        Reply {
            text: render(&template, &slot_vars(session.slots(), pack)),
            rephrase: true,
            sentiment,
        }
    }

    fn reply(
        &self,
        keys: &[ResponseKey],
        session: &CallSession,
        language: Language,
        utterance: &str,
    ) -> Reply {
        let pack = self.lexicon.pack(language);
        let sentiment = Sentiment::tag(utterance, pack, session.misses());
        let text = keys
            .iter()
            .map(|key| self.speak(*key, session, language, Some(sentiment)))
            .collect::<Vec<_>>()
            .join(" ");
        Reply {
            text,
            rephrase: true,
            sentiment,
        }
    }

    fn fixed(&self, key: ResponseKey, session: &CallSession, language: Language) -> Reply {
        Reply {
            text: self.speak(key, session, language, None),
            rephrase: false,
            sentiment: Sentiment::Neutral,
        }
    }

    /// One rendered phrasing for `key`
    fn speak(
        &self,
        key: ResponseKey,
        session: &CallSession,
        language: Language,
        sentiment: Option<Sentiment>,
    ) -> String {
        let template = self.selector.select(key, language, sentiment);
        render(&template, &slot_vars(session.slots(), self.lexicon.pack(language)))
    }

    /// Offer the table reply to the generative writer when enabled
    async fn polish(&self, reply: Reply, step: Step, language: Language) -> String {
        if !self.capabilities.generative || !reply.rephrase {
            return reply.text;
        }
        let draft = ReplyDraft {
            step,
            language,
            sentiment: reply.sentiment,
            text: reply.text,
        };
        match self.reply_writer.write(&draft).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => draft.text,
            Err(e) => {
                warn!("Reply writer failed: {}", e);
                draft.text
            }
        }
    }
}

/// Number the caller is dialling from, when it is a valid callback number
fn caller_phone(session: &CallSession) -> Option<String> {
    session
        .caller_number()
        .into_iter()
        .chain(std::iter::once(session.call_id()))
        .find_map(|raw| PhoneNumber::parse(raw).ok())
        .map(|phone| phone.as_str().to_string())
}

fn question_key(step: Step) -> ResponseKey {
    match step {
        Step::AskPeople => ResponseKey::QuestionPeople,
        Step::AskDate => ResponseKey::QuestionDate,
        Step::AskTime => ResponseKey::QuestionTime,
        Step::AskName => ResponseKey::QuestionName,
        Step::AskPhone => ResponseKey::QuestionPhone,
        Step::AskPhoneNumber => ResponseKey::QuestionPhoneNumber,
        Step::Confirm => ResponseKey::ConfirmSummary,
        Step::Cancelling => ResponseKey::CancelConfirm,
        _ => ResponseKey::OfferHelp,
    }
}

fn retry_key(step: Step) -> ResponseKey {
    match step {
        Step::AskPeople => ResponseKey::RetryPeople,
        Step::AskDate => ResponseKey::RetryDate,
        Step::AskTime => ResponseKey::RetryTime,
        Step::AskName => ResponseKey::RetryName,
        Step::AskPhone => ResponseKey::RetryPhone,
        Step::AskPhoneNumber => ResponseKey::RetryPhoneNumber,
        Step::Confirm => ResponseKey::ConfirmRetry,
        Step::Cancelling => ResponseKey::CancelRetry,
        _ => ResponseKey::ClarifyIntention,
    }
}

fn ack_key(slot: Slot) -> ResponseKey {
    match slot {
        Slot::People => ResponseKey::AckPeople,
        Slot::Date => ResponseKey::AckDate,
        Slot::Time => ResponseKey::AckTime,
        Slot::Name => ResponseKey::AckName,
        Slot::Phone => ResponseKey::AckPhone,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::store::MockSessionStore;
    use crate::domain::reservation::MockReservationStore;
    use crate::domain::shared::FixedClock;
    use crate::domain::strategy::{MockReplyWriter, MockSlotReader};
    use crate::infrastructure::persistence::InMemoryReservationStore;
    use crate::infrastructure::session::InMemorySessionStore;
    use chrono::{NaiveDate, NaiveTime};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    fn engine_with(reservations: Arc<dyn ReservationStore>) -> ConversationEngine {
        let lexicon = Arc::new(Lexicon::embedded().unwrap());
        ConversationEngine::new(lexicon, Arc::new(InMemorySessionStore::new()), reservations)
            .with_clock(Arc::new(FixedClock::new(today())))
    }

    fn engine() -> (ConversationEngine, Arc<InMemoryReservationStore>) {
        let store = Arc::new(InMemoryReservationStore::new());
        (engine_with(store.clone()), store)
    }

    async fn say(engine: &ConversationEngine, text: &str) -> TurnResponse {
        engine
            .handle_turn(TurnRequest::new("CA1", text).with_caller_number("+34600111222"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_empty_first_turn_offers_help() {
        let (engine, _) = engine();
        let response = say(&engine, "").await;
        assert_eq!(response.step, Step::AskIntention);
        assert!(!response.is_final);

        let session = engine.sessions().get("CA1").await.unwrap().unwrap();
        assert_eq!(session.language(), None);
    }

    #[tokio::test]
    async fn test_greeting_goes_to_party_size() {
        let (engine, _) = engine();
        assert_eq!(say(&engine, "hola").await.step, Step::AskPeople);
    }

    #[tokio::test]
    async fn test_unrelated_opening_asks_intention() {
        let (engine, _) = engine();
        assert_eq!(say(&engine, "¿tienen terraza?").await.step, Step::AskIntention);
        assert_eq!(say(&engine, "quiero reservar").await.step, Step::AskPeople);
    }

    #[tokio::test]
    async fn test_full_flow_with_confirmation() {
        let (engine, store) = engine();
        say(&engine, "hola").await;
        say(&engine, "somos cuatro").await;
        say(&engine, "mañana").await;
        say(&engine, "a las nueve de la noche").await;
        say(&engine, "me llamo Marta").await;
        let summary = say(&engine, "sí, este mismo").await;
        assert_eq!(summary.step, Step::Confirm);
        assert!(summary.text.contains("Marta"));

        let done = say(&engine, "sí, correcto").await;
        assert_eq!(done.step, Step::Finished);
        assert!(done.is_final);

        let saved = store.reservations().await;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].party_size, 4);
        assert_eq!(saved[0].date, NaiveDate::from_ymd_opt(2025, 1, 16).unwrap());
        assert_eq!(saved[0].time, NaiveTime::from_hms_opt(21, 0, 0).unwrap());
        assert_eq!(saved[0].phone, "+34600111222");
        assert!(saved[0].transcript.contains("me llamo Marta"));
    }

    #[tokio::test]
    async fn test_change_from_confirmation() {
        let (engine, _) = engine();
        for line in ["hola", "dos", "mañana", "a las 21:00", "me llamo Ana", "sí"] {
            say(&engine, line).await;
        }
        assert_eq!(say(&engine, "no, la hora está mal").await.step, Step::AskTime);
        let back = say(&engine, "a las 22:00").await;
        assert_eq!(back.step, Step::Confirm);

        let session = engine.sessions().get("CA1").await.unwrap().unwrap();
        assert_eq!(session.slots().party_size, Some(2));
        assert_eq!(session.slots().time, NaiveTime::from_hms_opt(22, 0, 0));
    }

    #[tokio::test]
    async fn test_restart_clears_slots() {
        let (engine, _) = engine();
        for line in ["hola", "dos", "mañana", "a las 21:00", "me llamo Ana", "sí"] {
            say(&engine, line).await;
        }
        assert_eq!(say(&engine, "empezar de nuevo").await.step, Step::AskPeople);
        let session = engine.sessions().get("CA1").await.unwrap().unwrap();
        assert_eq!(session.slots().first_missing(), Some(Slot::People));
    }

    #[tokio::test]
    async fn test_other_number_asks_for_digits() {
        let (engine, _) = engine();
        let engine = engine.with_capabilities(Capabilities::express());
        for line in ["hola", "dos", "mañana", "a las 21:00", "me llamo Ana"] {
            say(&engine, line).await;
        }
        assert_eq!(say(&engine, "no, otro").await.step, Step::AskPhoneNumber);
        assert_eq!(say(&engine, "612").await.step, Step::AskPhoneNumber);
        assert_eq!(say(&engine, "612 345 678").await.step, Step::Finished);
    }

    #[tokio::test]
    async fn test_persistence_failure_ends_in_error() {
        let mut store = MockReservationStore::new();
        store
            .expect_begin()
            .returning(|| Err(DomainError::Persistence("connection refused".into())));
        let engine = engine_with(Arc::new(store)).with_capabilities(Capabilities::express());

        for line in ["hola", "dos", "mañana", "a las 21:00", "me llamo Ana"] {
            say(&engine, line).await;
        }
        let response = say(&engine, "sí, usa este").await;
        assert_eq!(response.step, Step::Error);
        assert!(response.is_final);

        let lexicon = Lexicon::embedded().unwrap();
        let apologies = lexicon.phrases(ResponseKey::PersistenceFailed, Language::Es, None);
        assert!(apologies.contains(&response.text));
    }

    #[tokio::test]
    async fn test_terminal_session_says_goodbye() {
        let (engine, _) = engine();
        say(&engine, "hola").await;
        say(&engine, "quiero cancelar").await;
        let cancelled = say(&engine, "sí").await;
        assert_eq!(cancelled.step, Step::Cancelled);

        let again = say(&engine, "hola?").await;
        assert!(again.is_final);
        assert_eq!(again.step, Step::Cancelled);
    }

    #[tokio::test]
    async fn test_silence_repeats_the_question() {
        let (engine, _) = engine();
        say(&engine, "hola").await;
        let response = say(&engine, "").await;
        assert_eq!(response.step, Step::AskPeople);
        assert!(!response.is_final);
    }

    #[tokio::test]
    async fn test_silence_asks_in_other_words() {
        let lexicon = Lexicon::embedded().unwrap();
        let questions = lexicon.phrases(ResponseKey::QuestionPeople, Language::Es, None);
        for _ in 0..10 {
            let (engine, _) = engine();
            let first = say(&engine, "hola").await.text;
            let again = say(&engine, "").await.text;
            for question in questions.iter().filter(|q| first.contains(q.as_str())) {
                assert!(!again.contains(question.as_str()), "repeated {:?}", question);
            }
        }
    }

    #[tokio::test]
    async fn test_second_silence_in_a_row_ends_the_call() {
        let (engine, _) = engine();
        say(&engine, "hola").await;
        say(&engine, "").await;
        let response = say(&engine, "").await;
        assert!(response.is_final);
        assert_eq!(response.step, Step::Abandoned);

        let after = say(&engine, "").await;
        assert!(after.is_final);
        assert_eq!(after.step, Step::Abandoned);
    }

    #[tokio::test]
    async fn test_speaking_resets_the_silence_count() {
        let (engine, _) = engine();
        say(&engine, "hola").await;
        say(&engine, "").await;
        assert_eq!(say(&engine, "somos dos").await.step, Step::AskDate);
        let response = say(&engine, "").await;
        assert!(!response.is_final);
        assert_eq!(response.step, Step::AskDate);
    }

    #[tokio::test]
    async fn test_sweep_removes_calls_left_mid_dialogue() {
        let lexicon = Arc::new(Lexicon::embedded().unwrap());
        let sessions = Arc::new(InMemorySessionStore::new());
        let reservations = Arc::new(InMemoryReservationStore::new());
        let engine = ConversationEngine::new(lexicon.clone(), sessions.clone(), reservations.clone())
            .with_clock(Arc::new(FixedClock::new(today())));
        say(&engine, "hola").await;
        say(&engine, "somos dos").await;

        let ttl = Duration::from_secs(15 * 60);
        assert_eq!(engine.sweep_idle_sessions(ttl).await.unwrap(), 0);
        assert!(sessions.get("CA1").await.unwrap().is_some());

        let next_day = ConversationEngine::new(lexicon, sessions.clone(), reservations)
            .with_clock(Arc::new(FixedClock::new(today().succ_opt().unwrap())));
        assert_eq!(next_day.sweep_idle_sessions(ttl).await.unwrap(), 1);
        assert!(sessions.get("CA1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reader_error_is_a_miss() {
        let mut reader = MockSlotReader::new();
        reader.expect_read().returning(|_| {
            Err(crate::domain::strategy::GenerationError::Transport("down".into()))
        });
        let (engine, _) = engine();
        let engine = engine.with_slot_reader(Arc::new(reader));
        say(&engine, "hola").await;
        let response = say(&engine, "cuatro").await;
        assert_eq!(response.step, Step::AskPeople);
    }

    #[tokio::test]
    async fn test_generative_writer_rephrases_but_not_summary() {
        let mut writer = MockReplyWriter::new();
        writer
            .expect_write()
            .returning(|draft| Ok(format!("[{}]", draft.step)));
        let (engine, _) = engine();
        let engine = engine
            .with_capabilities(Capabilities {
                generative: true,
                ..Capabilities::default()
            })
            .with_reply_writer(Arc::new(writer));

        assert_eq!(say(&engine, "hola").await.text, "[ask_people]");
        for line in ["dos", "mañana", "a las 21:00", "me llamo Ana"] {
            say(&engine, line).await;
        }
        let summary = say(&engine, "sí").await;
        assert_eq!(summary.step, Step::Confirm);
        assert!(!summary.text.starts_with('['));
    }

    #[tokio::test]
    async fn test_session_store_failure_is_returned() {
        let mut sessions = MockSessionStore::new();
        sessions
            .expect_get()
            .returning(|_| Err(DomainError::Internal("store offline".into())));
        let lexicon = Arc::new(Lexicon::embedded().unwrap());
        let engine = ConversationEngine::new(
            lexicon,
            Arc::new(sessions),
            Arc::new(InMemoryReservationStore::new()),
        );
        assert!(engine.handle_turn(TurnRequest::new("CA9", "hola")).await.is_err());
    }
}
