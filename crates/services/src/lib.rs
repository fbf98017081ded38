#![forbid(unsafe_code)]

pub mod answer_service;
pub mod config;
pub mod error;
pub mod http_source;
pub mod packet_service;
pub mod question_buffer;
pub mod source;

pub use answer_service::AnswerService;
pub use config::ClientConfig;
pub use error::{ConfigError, FetchError};
pub use http_source::HttpQuestionSource;
pub use packet_service::PacketService;
pub use question_buffer::QuestionBuffer;
pub use source::{AnswerJudge, InMemorySource, PacketSource, QuestionSource};
