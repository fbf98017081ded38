use std::fmt;

use trivia_core::model::{
    BatchSize, DEFAULT_MAX_PACKET_NUMBER, FiltersError, PacketSelection, QuestionError,
    QuestionFilters, QuestionType, SelectionError, YearRange,
};

#[derive(Debug)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    UnknownSubcommand(String),
    InvalidValue { flag: &'static str, raw: String },
    Invalid(trivia_core::Error),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownSubcommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidValue { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::Invalid(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<FiltersError> for ArgsError {
    fn from(err: FiltersError) -> Self {
        ArgsError::Invalid(err.into())
    }
}

impl From<QuestionError> for ArgsError {
    fn from(err: QuestionError) -> Self {
        ArgsError::Invalid(err.into())
    }
}

impl From<SelectionError> for ArgsError {
    fn from(err: SelectionError) -> Self {
        ArgsError::Invalid(err.into())
    }
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  trivia random [filters] [--count <n>]");
    eprintln!("  trivia play   [filters]");
    eprintln!("  trivia packet --set <name> [--packets <range>] [--question <n>] [--max-packet <n>]");
    eprintln!("  trivia check  --answerline <text> --given <text>");
    eprintln!();
    eprintln!("Filters:");
    eprintln!("  --type tossup|bonus   (default tossup)");
    eprintln!("  --difficulty <n>      repeatable");
    eprintln!("  --category <name>     repeatable");
    eprintln!("  --subcategory <name>  repeatable");
    eprintln!("  --years <min>-<max>   (default 2010-2024)");
    eprintln!();
    eprintln!("Common:");
    eprintln!("  --base-url <url>      question service (default http://localhost:3000/)");
    eprintln!("  --batch-size <n>      questions per fetch (default 20)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  TRIVIA_BASE_URL, TRIVIA_BATCH_SIZE, TRIVIA_TIMEOUT_SECS, RUST_LOG");
}

/// Flags accepted by every subcommand.
#[derive(Debug, Default)]
pub struct Common {
    pub base_url: Option<String>,
    pub batch_size: Option<BatchSize>,
}

#[derive(Debug)]
pub enum Command {
    Random {
        filters: QuestionFilters,
        count: u32,
    },
    Play {
        filters: QuestionFilters,
    },
    Packet {
        selection: PacketSelection,
    },
    Check {
        answerline: String,
        given: String,
    },
    Help,
}

#[derive(Debug)]
pub struct Args {
    pub common: Common,
    pub command: Command,
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_number<T: std::str::FromStr>(raw: String, flag: &'static str) -> Result<T, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidValue { flag, raw })
}

/// Accumulates filter flags until the command line is exhausted.
#[derive(Default)]
struct FilterFlags {
    question_type: Option<QuestionType>,
    difficulties: Vec<u8>,
    categories: Vec<String>,
    subcategories: Vec<String>,
    years: Option<YearRange>,
}

impl FilterFlags {
    fn build(self) -> QuestionFilters {
        QuestionFilters::new(self.question_type.unwrap_or(QuestionType::Tossup))
            .with_difficulties(self.difficulties)
            .with_categories(self.categories)
            .with_subcategories(self.subcategories)
            .with_years(self.years.unwrap_or_default())
    }
}

impl Args {
    /// Parse everything after the program name.
    ///
    /// # Errors
    ///
    /// Returns `ArgsError` for unknown subcommands or flags and invalid values.
    pub fn parse(argv: impl IntoIterator<Item = String>) -> Result<Self, ArgsError> {
        let mut args = argv.into_iter();
        let Some(subcommand) = args.next() else {
            return Ok(Self {
                common: Common::default(),
                command: Command::Help,
            });
        };

        let mut common = Common::default();
        let mut filters = FilterFlags::default();
        let mut count: u32 = 1;
        let mut set_name: Option<String> = None;
        let mut packets = String::new();
        let mut question = String::new();
        let mut max_packet = DEFAULT_MAX_PACKET_NUMBER;
        let mut answerline: Option<String> = None;
        let mut given: Option<String> = None;

        if matches!(subcommand.as_str(), "--help" | "-h" | "help") {
            return Ok(Self {
                common,
                command: Command::Help,
            });
        }
        if !matches!(subcommand.as_str(), "random" | "play" | "packet" | "check") {
            return Err(ArgsError::UnknownSubcommand(subcommand));
        }

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--base-url" => common.base_url = Some(require_value(&mut args, "--base-url")?),
                "--batch-size" => {
                    let raw = require_value(&mut args, "--batch-size")?;
                    common.batch_size = Some(BatchSize::new(parse_number(raw, "--batch-size")?)?);
                }
                "--type" => {
                    let raw = require_value(&mut args, "--type")?;
                    filters.question_type = Some(raw.parse()?);
                }
                "--difficulty" => {
                    let raw = require_value(&mut args, "--difficulty")?;
                    filters.difficulties.push(parse_number(raw, "--difficulty")?);
                }
                "--category" => filters
                    .categories
                    .push(require_value(&mut args, "--category")?),
                "--subcategory" => filters
                    .subcategories
                    .push(require_value(&mut args, "--subcategory")?),
                "--years" => {
                    let raw = require_value(&mut args, "--years")?;
                    filters.years = Some(raw.parse()?);
                }
                "--count" => {
                    let raw = require_value(&mut args, "--count")?;
                    count = parse_number(raw, "--count")?;
                }
                "--set" => set_name = Some(require_value(&mut args, "--set")?),
                "--packets" => packets = require_value(&mut args, "--packets")?,
                "--question" => question = require_value(&mut args, "--question")?,
                "--max-packet" => {
                    let raw = require_value(&mut args, "--max-packet")?;
                    max_packet = parse_number(raw, "--max-packet")?;
                }
                "--answerline" => answerline = Some(require_value(&mut args, "--answerline")?),
                "--given" => given = Some(require_value(&mut args, "--given")?),
                "--help" | "-h" => {
                    return Ok(Self {
                        common,
                        command: Command::Help,
                    });
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let command = match subcommand.as_str() {
            "random" => Command::Random {
                filters: filters.build(),
                count,
            },
            "play" => Command::Play {
                filters: filters.build(),
            },
            "packet" => {
                let set_name = set_name.ok_or(ArgsError::MissingFlag { flag: "--set" })?;
                Command::Packet {
                    selection: PacketSelection::new(&set_name, &packets, &question, max_packet)?,
                }
            }
            _ => Command::Check {
                answerline: answerline.ok_or(ArgsError::MissingFlag {
                    flag: "--answerline",
                })?,
                given: given.ok_or(ArgsError::MissingFlag { flag: "--given" })?,
            },
        };

        Ok(Self { common, command })
    }
}
