use thiserror::Error;

use crate::model::{FiltersError, QuestionError, SelectionError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Filters(#[from] FiltersError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
}
