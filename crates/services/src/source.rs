use async_trait::async_trait;
use rand::seq::IndexedRandom;
use reqwest::StatusCode;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use trivia_core::model::{
    AnswerCheck, BatchSize, Directive, Packet, Question, QuestionFilters, QuestionType,
};

use crate::error::FetchError;

/// Source of random question batches.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Fetch up to `number` random questions matching `filters`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` if the request fails or the response is malformed.
    async fn random_questions(
        &self,
        filters: &QuestionFilters,
        number: BatchSize,
    ) -> Result<Vec<Question>, FetchError>;
}

/// Source of packet contents, addressed by set name and packet number.
#[async_trait]
pub trait PacketSource: Send + Sync {
    /// # Errors
    ///
    /// Returns `FetchError` if the request fails or the response is malformed.
    async fn packet(&self, set_name: &str, packet_number: u32) -> Result<Packet, FetchError>;

    /// # Errors
    ///
    /// Returns `FetchError` if the request fails or the response is malformed.
    async fn packet_tossups(
        &self,
        set_name: &str,
        packet_number: u32,
    ) -> Result<Vec<Question>, FetchError>;

    /// # Errors
    ///
    /// Returns `FetchError` if the request fails or the response is malformed.
    async fn packet_bonuses(
        &self,
        set_name: &str,
        packet_number: u32,
    ) -> Result<Vec<Question>, FetchError>;
}

/// Judges a given answer against an answerline.
#[async_trait]
pub trait AnswerJudge: Send + Sync {
    /// # Errors
    ///
    /// Returns `FetchError` if the request fails or the response is malformed.
    async fn check_answer(
        &self,
        answerline: &str,
        given_answer: &str,
    ) -> Result<AnswerCheck, FetchError>;
}

/// In-memory question service for testing and prototyping.
///
/// Every call counts as one request. Failures queued with
/// [`InMemorySource::fail_next`] are returned, in order, before any data.
#[derive(Clone, Default)]
pub struct InMemorySource {
    tossups: Arc<Mutex<Vec<Question>>>,
    bonuses: Arc<Mutex<Vec<Question>>>,
    packets: Arc<Mutex<HashMap<(String, u32), Packet>>>,
    failures: Arc<Mutex<VecDeque<StatusCode>>>,
    requests: Arc<AtomicUsize>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl InMemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_tossups(&self, questions: impl IntoIterator<Item = Question>) {
        lock(&self.tossups).extend(questions);
    }

    pub fn add_bonuses(&self, questions: impl IntoIterator<Item = Question>) {
        lock(&self.bonuses).extend(questions);
    }

    pub fn insert_packet(&self, set_name: impl Into<String>, packet_number: u32, packet: Packet) {
        lock(&self.packets).insert((set_name.into(), packet_number), packet);
    }

    /// Make the next request fail with `status`. Calls stack.
    pub fn fail_next(&self, status: StatusCode) {
        lock(&self.failures).push_back(status);
    }

    /// Total number of requests served so far, failed ones included.
    #[must_use]
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn begin_request(&self) -> Result<(), FetchError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        match lock(&self.failures).pop_front() {
            Some(status) => Err(FetchError::HttpStatus(status)),
            None => Ok(()),
        }
    }

    fn sample(&self, filters: &QuestionFilters, number: BatchSize) -> Vec<Question> {
        let pool = match filters.question_type() {
            QuestionType::Tossup => lock(&self.tossups),
            QuestionType::Bonus => lock(&self.bonuses),
        };
        let matching: Vec<&Question> = pool.iter().filter(|q| filters.matches(q)).collect();
        matching
            .choose_multiple(&mut rand::rng(), number.as_usize())
            .map(|q| (*q).clone())
            .collect()
    }

    fn lookup_packet(&self, set_name: &str, packet_number: u32) -> Packet {
        lock(&self.packets)
            .get(&(set_name.to_owned(), packet_number))
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl QuestionSource for InMemorySource {
    async fn random_questions(
        &self,
        filters: &QuestionFilters,
        number: BatchSize,
    ) -> Result<Vec<Question>, FetchError> {
        self.begin_request()?;
        Ok(self.sample(filters, number))
    }
}

#[async_trait]
impl PacketSource for InMemorySource {
    async fn packet(&self, set_name: &str, packet_number: u32) -> Result<Packet, FetchError> {
        self.begin_request()?;
        Ok(self.lookup_packet(set_name, packet_number))
    }

    async fn packet_tossups(
        &self,
        set_name: &str,
        packet_number: u32,
    ) -> Result<Vec<Question>, FetchError> {
        self.begin_request()?;
        Ok(self.lookup_packet(set_name, packet_number).tossups)
    }

    async fn packet_bonuses(
        &self,
        set_name: &str,
        packet_number: u32,
    ) -> Result<Vec<Question>, FetchError> {
        self.begin_request()?;
        Ok(self.lookup_packet(set_name, packet_number).bonuses)
    }
}

#[async_trait]
impl AnswerJudge for InMemorySource {
    /// Accepts an exact, case-insensitive match of the answerline with markup
    /// removed. Everything else is rejected.
    async fn check_answer(
        &self,
        answerline: &str,
        given_answer: &str,
    ) -> Result<AnswerCheck, FetchError> {
        self.begin_request()?;
        let expected = strip_markup(answerline);
        let directive = if !given_answer.trim().is_empty()
            && expected.trim().eq_ignore_ascii_case(given_answer.trim())
        {
            Directive::Accept
        } else {
            Directive::Reject
        };
        Ok(AnswerCheck::new(directive, None))
    }
}

fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tossup(id: u32, category: &str) -> Question {
        serde_json::from_value(json!({
            "_id": format!("t{id}"),
            "category": category,
            "answer": format!("answer {id}"),
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn samples_distinct_matching_questions() {
        let source = InMemorySource::new();
        source.add_tossups((0..10).map(|i| tossup(i, "Science")));
        source.add_tossups((10..15).map(|i| tossup(i, "History")));

        let filters = QuestionFilters::new(QuestionType::Tossup).with_categories(["History"]);
        let batch = source
            .random_questions(&filters, BatchSize::new(20).unwrap())
            .await
            .unwrap();

        assert_eq!(batch.len(), 5);
        assert!(batch.iter().all(|q| q.category() == Some("History")));
        assert_eq!(source.requests(), 1);
    }

    #[tokio::test]
    async fn queued_failures_come_first() {
        let source = InMemorySource::new();
        source.add_tossups([tossup(1, "Science")]);
        source.fail_next(StatusCode::SERVICE_UNAVAILABLE);

        let filters = QuestionFilters::default();
        let err = source
            .random_questions(&filters, BatchSize::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FetchError::HttpStatus(StatusCode::SERVICE_UNAVAILABLE)
        ));

        let batch = source
            .random_questions(&filters, BatchSize::default())
            .await
            .unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(source.requests(), 2);
    }

    #[tokio::test]
    async fn judges_against_plain_answerline() {
        let source = InMemorySource::new();
        let check = source
            .check_answer("<b><u>Mitochondria</u></b>", " mitochondria ")
            .await
            .unwrap();
        assert_eq!(check.directive, Directive::Accept);

        let check = source.check_answer("Mitochondria", "").await.unwrap();
        assert_eq!(check.directive, Directive::Reject);
    }

    #[tokio::test]
    async fn unknown_packets_are_empty() {
        let source = InMemorySource::new();
        let packet = source.packet("Missing Set", 1).await.unwrap();
        assert!(packet.is_empty());
    }
}
