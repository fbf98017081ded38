use std::sync::Arc;

use trivia_core::model::AnswerCheck;

use crate::error::FetchError;
use crate::source::AnswerJudge;

#[derive(Clone)]
pub struct AnswerService {
    judge: Arc<dyn AnswerJudge>,
}

impl AnswerService {
    #[must_use]
    pub fn new(judge: Arc<dyn AnswerJudge>) -> Self {
        Self { judge }
    }

    /// Ask the judge whether `given` satisfies `answerline`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` if the judge cannot be reached.
    pub async fn check(&self, answerline: &str, given: &str) -> Result<AnswerCheck, FetchError> {
        let check = self.judge.check_answer(answerline, given.trim()).await?;
        log::debug!("answer judged: {}", check.directive);
        Ok(check)
    }
}
