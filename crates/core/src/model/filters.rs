use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::question::{Question, QuestionType};

pub const DEFAULT_BATCH_SIZE: u32 = 20;
pub const DEFAULT_MIN_YEAR: u16 = 2010;
pub const DEFAULT_MAX_YEAR: u16 = 2024;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FiltersError {
    #[error("batch size must be > 0")]
    InvalidBatchSize,

    #[error("invalid year range: {raw}")]
    InvalidYearRange { raw: String },

    #[error("minimum year {min} is after maximum year {max}")]
    InvertedYearRange { min: u16, max: u16 },
}

//
// ─── BATCH SIZE ────────────────────────────────────────────────────────────────
//

/// Number of questions requested per fetch. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct BatchSize(u32);

impl BatchSize {
    /// # Errors
    ///
    /// Returns `FiltersError::InvalidBatchSize` for zero.
    pub fn new(size: u32) -> Result<Self, FiltersError> {
        if size == 0 {
            return Err(FiltersError::InvalidBatchSize);
        }
        Ok(Self(size))
    }

    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn as_usize(&self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }
}

impl Default for BatchSize {
    fn default() -> Self {
        Self(DEFAULT_BATCH_SIZE)
    }
}

impl TryFrom<u32> for BatchSize {
    type Error = FiltersError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BatchSize> for u32 {
    fn from(size: BatchSize) -> Self {
        size.0
    }
}

impl fmt::Display for BatchSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── YEAR RANGE ────────────────────────────────────────────────────────────────
//

/// Inclusive range of tournament years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct YearRange {
    min: u16,
    max: u16,
}

impl YearRange {
    /// # Errors
    ///
    /// Returns `FiltersError::InvertedYearRange` if `min > max`.
    pub fn new(min: u16, max: u16) -> Result<Self, FiltersError> {
        if min > max {
            return Err(FiltersError::InvertedYearRange { min, max });
        }
        Ok(Self { min, max })
    }

    #[must_use]
    pub fn min(&self) -> u16 {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> u16 {
        self.max
    }

    #[must_use]
    pub fn contains(&self, year: u16) -> bool {
        (self.min..=self.max).contains(&year)
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_YEAR,
            max: DEFAULT_MAX_YEAR,
        }
    }
}

impl FromStr for YearRange {
    type Err = FiltersError;

    /// Parses `"2012-2019"`. Surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FiltersError::InvalidYearRange { raw: s.to_owned() };
        let (min, max) = s.trim().split_once('-').ok_or_else(invalid)?;
        let min = min.trim().parse().map_err(|_| invalid())?;
        let max = max.trim().parse().map_err(|_| invalid())?;
        Self::new(min, max)
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

//
// ─── FILTERS ───────────────────────────────────────────────────────────────────
//

/// Query used to request random questions.
///
/// Empty sets mean "no restriction". Sets are ordered so two filters built
/// from the same arguments compare equal regardless of insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionFilters {
    question_type: QuestionType,
    difficulties: BTreeSet<u8>,
    categories: BTreeSet<String>,
    subcategories: BTreeSet<String>,
    years: YearRange,
}

impl QuestionFilters {
    #[must_use]
    pub fn new(question_type: QuestionType) -> Self {
        Self {
            question_type,
            difficulties: BTreeSet::new(),
            categories: BTreeSet::new(),
            subcategories: BTreeSet::new(),
            years: YearRange::default(),
        }
    }

    #[must_use]
    pub fn with_difficulties(mut self, difficulties: impl IntoIterator<Item = u8>) -> Self {
        self.difficulties = difficulties.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_categories<S: Into<String>>(
        mut self,
        categories: impl IntoIterator<Item = S>,
    ) -> Self {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_subcategories<S: Into<String>>(
        mut self,
        subcategories: impl IntoIterator<Item = S>,
    ) -> Self {
        self.subcategories = subcategories.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_years(mut self, years: YearRange) -> Self {
        self.years = years;
        self
    }

    #[must_use]
    pub fn question_type(&self) -> QuestionType {
        self.question_type
    }

    #[must_use]
    pub fn difficulties(&self) -> &BTreeSet<u8> {
        &self.difficulties
    }

    #[must_use]
    pub fn categories(&self) -> &BTreeSet<String> {
        &self.categories
    }

    #[must_use]
    pub fn subcategories(&self) -> &BTreeSet<String> {
        &self.subcategories
    }

    #[must_use]
    pub fn years(&self) -> YearRange {
        self.years
    }

    /// Whether a question satisfies these filters.
    ///
    /// Fields missing from the question only fail a restriction that is
    /// actually set. The question type is not recorded on the question
    /// itself, so it is the caller's job to keep tossups and bonuses apart.
    #[must_use]
    pub fn matches(&self, question: &Question) -> bool {
        fn allowed<T: Ord>(set: &BTreeSet<T>, value: Option<T>) -> bool {
            set.is_empty() || value.is_some_and(|v| set.contains(&v))
        }

        allowed(&self.difficulties, question.difficulty())
            && allowed(&self.categories, question.category().map(str::to_owned))
            && allowed(&self.subcategories, question.subcategory().map(str::to_owned))
            && question.year().is_none_or(|year| self.years.contains(year))
    }
}

impl Default for QuestionFilters {
    fn default() -> Self {
        Self::new(QuestionType::Tossup)
    }
}
