use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use trivia_core::model::{
    AnswerCheck, BatchSize, Packet, Question, QuestionFilters, QuestionType,
};
use url::Url;

use crate::config::ClientConfig;
use crate::error::FetchError;
use crate::source::{AnswerJudge, PacketSource, QuestionSource};

/// Question service client over HTTP/JSON.
#[derive(Clone)]
pub struct HttpQuestionSource {
    client: Client,
    base_url: Url,
}

impl HttpQuestionSource {
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, FetchError> {
        let mut url = self.base_url.join(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let url = self.endpoint(path, query)?;
        log::debug!("GET {url}");
        let response = self.client.get(url).send().await?;
        read_json(response).await
    }

    async fn get_packet_part<T: DeserializeOwned>(
        &self,
        path: &str,
        set_name: &str,
        packet_number: u32,
    ) -> Result<T, FetchError> {
        let packet_number = packet_number.to_string();
        self.get_json(
            path,
            &[("setName", set_name), ("packetNumber", &packet_number)],
        )
        .await
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, FetchError> {
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::HttpStatus(status));
    }
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl QuestionSource for HttpQuestionSource {
    async fn random_questions(
        &self,
        filters: &QuestionFilters,
        number: BatchSize,
    ) -> Result<Vec<Question>, FetchError> {
        let url = self.endpoint("api/random-question", &[])?;
        let payload = RandomQuestionRequest::new(filters, number);
        log::debug!(
            "POST {url} ({} x{})",
            payload.question_type,
            payload.number
        );
        let response = self.client.post(url).json(&payload).send().await?;
        read_json(response).await
    }
}

#[async_trait]
impl PacketSource for HttpQuestionSource {
    async fn packet(&self, set_name: &str, packet_number: u32) -> Result<Packet, FetchError> {
        self.get_packet_part("api/packet", set_name, packet_number)
            .await
    }

    async fn packet_tossups(
        &self,
        set_name: &str,
        packet_number: u32,
    ) -> Result<Vec<Question>, FetchError> {
        let body: TossupsResponse = self
            .get_packet_part("api/packet-tossups", set_name, packet_number)
            .await?;
        Ok(body.tossups)
    }

    async fn packet_bonuses(
        &self,
        set_name: &str,
        packet_number: u32,
    ) -> Result<Vec<Question>, FetchError> {
        let body: BonusesResponse = self
            .get_packet_part("api/packet-bonuses", set_name, packet_number)
            .await?;
        Ok(body.bonuses)
    }
}

#[async_trait]
impl AnswerJudge for HttpQuestionSource {
    async fn check_answer(
        &self,
        answerline: &str,
        given_answer: &str,
    ) -> Result<AnswerCheck, FetchError> {
        self.get_json(
            "api/check-answer",
            &[("answerline", answerline), ("givenAnswer", given_answer)],
        )
        .await
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RandomQuestionRequest<'a> {
    question_type: QuestionType,
    difficulties: &'a BTreeSet<u8>,
    categories: &'a BTreeSet<String>,
    subcategories: &'a BTreeSet<String>,
    number: u32,
    min_year: u16,
    max_year: u16,
}

impl<'a> RandomQuestionRequest<'a> {
    fn new(filters: &'a QuestionFilters, number: BatchSize) -> Self {
        Self {
            question_type: filters.question_type(),
            difficulties: filters.difficulties(),
            categories: filters.categories(),
            subcategories: filters.subcategories(),
            number: number.value(),
            min_year: filters.years().min(),
            max_year: filters.years().max(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TossupsResponse {
    #[serde(default)]
    tossups: Vec<Question>,
}

#[derive(Debug, Deserialize)]
struct BonusesResponse {
    #[serde(default)]
    bonuses: Vec<Question>,
}
