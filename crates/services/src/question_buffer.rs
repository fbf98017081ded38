use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use trivia_core::model::{BatchSize, Question, QuestionFilters, normalize_batch};

use crate::error::FetchError;
use crate::source::QuestionSource;

/// Local prefetch buffer of random questions.
///
/// `next` answers from the buffer when it can, waits on a fetch only when
/// the buffer is empty, and starts a background refill as soon as a call
/// takes the last buffered question. The handle is cheap to clone; clones
/// share one buffer.
///
/// Background refills are spawned onto the current Tokio runtime and are
/// never cancelled.
#[derive(Clone)]
pub struct QuestionBuffer {
    inner: Arc<Inner>,
}

struct Inner {
    source: Arc<dyn QuestionSource>,
    batch_size: BatchSize,
    state: Mutex<BufferState>,
    cold_start: tokio::sync::Mutex<()>,
    refill: Mutex<Option<JoinHandle<()>>>,
}

struct BufferState {
    items: Vec<Question>,
    filters: QuestionFilters,
    /// Bumped whenever the filters change. A fetch only lands if the
    /// generation it started under is still current.
    generation: u64,
}

/// Filters and generation captured when a fetch starts.
struct FetchTicket {
    filters: QuestionFilters,
    generation: u64,
}

impl QuestionBuffer {
    #[must_use]
    pub fn new(source: Arc<dyn QuestionSource>, batch_size: BatchSize) -> Self {
        Self::with_filters(source, batch_size, QuestionFilters::default())
    }

    #[must_use]
    pub fn with_filters(
        source: Arc<dyn QuestionSource>,
        batch_size: BatchSize,
        filters: QuestionFilters,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                batch_size,
                state: Mutex::new(BufferState {
                    items: Vec::new(),
                    filters,
                    generation: 0,
                }),
                cold_start: tokio::sync::Mutex::new(()),
                refill: Mutex::new(None),
            }),
        }
    }

    #[must_use]
    pub fn batch_size(&self) -> BatchSize {
        self.inner.batch_size
    }

    #[must_use]
    pub fn filters(&self) -> QuestionFilters {
        self.inner.state().filters.clone()
    }

    /// Number of questions currently buffered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.state().items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.state().items.is_empty()
    }

    /// Set the filters used for subsequent fetches. Never fetches.
    ///
    /// Changing the filters drops whatever is buffered and invalidates any
    /// fetch still in flight. Passing the current filters again is a no-op.
    pub fn configure(&self, filters: QuestionFilters) {
        let mut state = self.inner.state();
        if state.filters == filters {
            return;
        }
        log::debug!(
            "question buffer reconfigured, dropping {} buffered",
            state.items.len()
        );
        state.filters = filters;
        state.items.clear();
        state.generation += 1;
    }

    /// Take one question from the buffer.
    ///
    /// Waits on a fetch only when the buffer is empty. Taking the last
    /// buffered question starts a background refill that this call does not
    /// wait for. Removal order is unspecified.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` if the buffer was empty and the fetch failed, or
    /// returned no questions.
    pub async fn next(&self) -> Result<Question, FetchError> {
        loop {
            if let Some(question) = self.take_one() {
                return Ok(question);
            }
            self.cold_start().await?;
        }
    }

    /// Wait for the most recently started background refill to finish.
    ///
    /// Returns immediately when no refill is pending. The refill is never
    /// cancelled.
    pub async fn wait_for_refill(&self) {
        let handle = self
            .inner
            .refill
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                log::warn!("question refill task failed: {err}");
            }
        }
    }

    fn take_one(&self) -> Option<Question> {
        let (question, refill) = {
            let mut state = self.inner.state();
            let question = state.items.pop()?;
            let refill = state.items.is_empty().then(|| state.ticket());
            (question, refill)
        };
        if let Some(ticket) = refill {
            self.spawn_refill(ticket);
        }
        Some(question)
    }

    /// Fill an empty buffer, waiting for the result.
    ///
    /// Only one cold start runs at a time. Callers that queued behind it find
    /// the buffer already filled and return without a request.
    async fn cold_start(&self) -> Result<(), FetchError> {
        let _guard = self.inner.cold_start.lock().await;

        let ticket = {
            let state = self.inner.state();
            if !state.items.is_empty() {
                return Ok(());
            }
            state.ticket()
        };

        log::debug!("question buffer empty, fetching {}", self.inner.batch_size);
        let batch = self.inner.fetch(&ticket.filters).await?;
        if batch.is_empty() {
            return Err(FetchError::NoQuestions);
        }
        self.inner.apply(batch, ticket.generation);
        Ok(())
    }

    fn spawn_refill(&self, ticket: FetchTicket) {
        log::debug!("question buffer drained, refilling in background");
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            match inner.fetch(&ticket.filters).await {
                Ok(batch) => inner.apply(batch, ticket.generation),
                Err(err) => log::warn!("background question refill failed: {err}"),
            }
        });
        // An older refill is detached, not cancelled.
        *self
            .inner
            .refill
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handle);
    }
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, BufferState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn fetch(&self, filters: &QuestionFilters) -> Result<Vec<Question>, FetchError> {
        let mut batch = self
            .source
            .random_questions(filters, self.batch_size)
            .await?;
        normalize_batch(&mut batch, filters.question_type());
        Ok(batch)
    }

    /// Replace the buffered items with `batch` unless the filters changed
    /// since the fetch started.
    fn apply(&self, batch: Vec<Question>, generation: u64) {
        let mut state = self.state();
        if state.generation != generation {
            log::debug!("discarding {} questions fetched for stale filters", batch.len());
            return;
        }
        state.items = batch;
    }
}

impl BufferState {
    fn ticket(&self) -> FetchTicket {
        FetchTicket {
            filters: self.filters.clone(),
            generation: self.generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InMemorySource;
    use serde_json::json;
    use trivia_core::model::QuestionType;

    fn tossups(count: usize) -> Vec<Question> {
        (0..count)
            .map(|i| serde_json::from_value(json!({ "_id": format!("t{i}") })).unwrap())
            .collect()
    }

    fn buffer(source: &InMemorySource, batch: u32) -> QuestionBuffer {
        QuestionBuffer::new(Arc::new(source.clone()), BatchSize::new(batch).unwrap())
    }

    #[tokio::test]
    async fn configure_never_fetches() {
        let source = InMemorySource::new();
        source.add_tossups(tossups(5));
        let buffer = buffer(&source, 5);

        let filters = QuestionFilters::new(QuestionType::Tossup).with_difficulties([3]);
        buffer.configure(filters.clone());
        buffer.configure(filters.clone());

        assert_eq!(source.requests(), 0);
        assert_eq!(buffer.filters(), filters);
    }

    #[tokio::test]
    async fn identical_configure_keeps_buffered_items() {
        let source = InMemorySource::new();
        source.add_tossups(tossups(5));
        let buffer = buffer(&source, 5);

        buffer.next().await.unwrap();
        assert_eq!(buffer.len(), 4);

        buffer.configure(QuestionFilters::default());
        assert_eq!(buffer.len(), 4);

        buffer.configure(QuestionFilters::default().with_categories(["Science"]));
        assert!(buffer.is_empty());
        assert_eq!(source.requests(), 1);
    }

    #[tokio::test]
    async fn stale_refill_is_discarded() {
        let source = InMemorySource::new();
        source.add_tossups(tossups(3));
        let buffer = buffer(&source, 1);

        // batch of one: the first next() drains the buffer and spawns a refill
        buffer.next().await.unwrap();
        buffer.configure(QuestionFilters::new(QuestionType::Bonus));
        buffer.wait_for_refill().await;

        assert_eq!(source.requests(), 2);
        assert!(buffer.is_empty());
    }

    #[tokio::test]
    async fn empty_batch_on_cold_start_is_an_error() {
        let source = InMemorySource::new();
        let buffer = buffer(&source, 5);

        let err = buffer.next().await.unwrap_err();
        assert!(matches!(err, FetchError::NoQuestions));
        assert!(buffer.is_empty());
        assert_eq!(source.requests(), 1);
    }

    #[tokio::test]
    async fn huge_batch_size_does_not_preallocate() {
        let source = InMemorySource::new();
        source.add_tossups(tossups(3));
        let buffer = buffer(&source, u32::MAX);

        assert!(buffer.is_empty());
        assert_eq!(buffer.batch_size().value(), u32::MAX);

        // the source hands back what it has; the buffer holds only that
        buffer.next().await.unwrap();
        assert_eq!(buffer.len(), 2);
        assert_eq!(source.requests(), 1);
    }
}
