mod answer;
mod filters;
mod packet;
mod question;
mod selection;
mod tally;

pub use answer::{AnswerCheck, Directive};
pub use filters::{
    BatchSize, DEFAULT_BATCH_SIZE, DEFAULT_MAX_YEAR, DEFAULT_MIN_YEAR, FiltersError,
    QuestionFilters, YearRange,
};
pub use packet::Packet;
pub use question::{Question, QuestionError, QuestionType, normalize_batch};
pub use selection::{
    DEFAULT_MAX_PACKET_NUMBER, PACKET_NUMBER_LIMIT, PacketRange, PacketSelection, SelectionError,
};
pub use tally::SessionTally;
