mod args;

use std::io::Write;
use std::sync::Arc;

use services::{
    AnswerService, ClientConfig, HttpQuestionSource, PacketService, QuestionBuffer,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use trivia_core::model::{
    Directive, Packet, PacketSelection, Question, QuestionFilters, QuestionType, SessionTally,
};

use crate::args::{Args, Command, print_usage};

type BoxError = Box<dyn std::error::Error>;
type InputLines = Lines<BufReader<Stdin>>;

fn init_logging() {
    let mut builder = env_logger::Builder::from_default_env();
    if std::env::var("RUST_LOG").is_err() {
        builder.filter_level(log::LevelFilter::Warn);
    }
    let _ = builder.try_init();
}

fn print_question(question: &Question, question_type: QuestionType) {
    match question_type {
        QuestionType::Tossup => {
            println!("{}", question.text().unwrap_or("(no question text)"));
            println!("ANSWER: {}", question.answer().unwrap_or("(no answer)"));
        }
        QuestionType::Bonus => {
            println!("{}", question.leadin().unwrap_or_default());
            let parts = question.parts().unwrap_or_default();
            let answers = question.answers().unwrap_or_default();
            for (i, part) in parts.iter().enumerate() {
                println!("[{}] {part}", i + 1);
                println!("ANSWER: {}", answers.get(i).copied().unwrap_or("(no answer)"));
            }
        }
    }
    if let (Some(set), Some(packet)) = (question.set_name(), question.packet_number()) {
        println!("<{set}, packet {packet}>");
    }
    println!();
}

fn print_packet(number: u32, packet: &Packet, skip: usize) {
    println!("=== packet {number} ===");
    for tossup in packet.tossups.iter().skip(skip) {
        print_question(tossup, QuestionType::Tossup);
    }
    for bonus in packet.bonuses.iter().skip(skip) {
        print_question(bonus, QuestionType::Bonus);
    }
}

async fn random(buffer: &QuestionBuffer, count: u32) -> Result<(), BoxError> {
    let question_type = buffer.filters().question_type();
    for _ in 0..count {
        let question = buffer.next().await?;
        print_question(&question, question_type);
    }
    Ok(())
}

async fn packet(packets: &PacketService, selection: &PacketSelection) -> Result<(), BoxError> {
    let loaded = packets.load_selection(selection).await?;
    for (i, (number, packet)) in loaded.iter().enumerate() {
        // the starting question only applies to the first packet
        let skip = if i == 0 { selection.start_index() } else { 0 };
        print_packet(*number, packet, skip);
    }
    Ok(())
}

async fn read_answer(lines: &mut InputLines, label: &str) -> Result<Option<String>, BoxError> {
    print!("{label}> ");
    std::io::stdout().flush()?;
    let line = lines.next_line().await?;
    Ok(line.filter(|line| line.trim() != ":q"))
}

/// Judge one answer, re-asking for as long as the judge prompts.
///
/// Returns `None` when the reader quits.
async fn judge(
    answers: &AnswerService,
    lines: &mut InputLines,
    label: &str,
    answerline: &str,
) -> Result<Option<Directive>, BoxError> {
    loop {
        let Some(given) = read_answer(lines, label).await? else {
            return Ok(None);
        };
        let check = answers.check(answerline, &given).await?;
        if check.directive != Directive::Prompt {
            return Ok(Some(check.directive));
        }
        match check.directed_prompt {
            Some(prompt) => println!("prompt: {prompt}"),
            None => println!("prompt"),
        }
    }
}

fn record(tally: &mut SessionTally, directive: Directive, points: f64) {
    match directive {
        Directive::Accept => {
            println!("correct");
            tally.shift("correct", 1.0);
            tally.shift("points", points);
        }
        Directive::Reject | Directive::Prompt => {
            println!("incorrect");
            tally.shift("incorrect", 1.0);
        }
    }
}

async fn play(buffer: &QuestionBuffer, answers: &AnswerService) -> Result<(), BoxError> {
    let question_type = buffer.filters().question_type();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tally = SessionTally::new();
    println!("type :q to stop");

    'questions: loop {
        let question = buffer.next().await?;
        match question_type {
            QuestionType::Tossup => {
                println!("{}", question.text().unwrap_or("(no question text)"));
                let answerline = question.answer().unwrap_or_default();
                let Some(directive) = judge(answers, &mut lines, "", answerline).await? else {
                    break 'questions;
                };
                record(&mut tally, directive, 10.0);
                tally.shift("tossups", 1.0);
                println!("ANSWER: {answerline}\n");
            }
            QuestionType::Bonus => {
                println!("{}", question.leadin().unwrap_or_default());
                let parts = question.parts().unwrap_or_default();
                let answerlines = question.answers().unwrap_or_default();
                for (i, part) in parts.iter().enumerate() {
                    println!("[{}] {part}", i + 1);
                    let answerline = answerlines.get(i).copied().unwrap_or_default();
                    let label = format!("[{}] ", i + 1);
                    let Some(directive) = judge(answers, &mut lines, &label, answerline).await?
                    else {
                        break 'questions;
                    };
                    record(&mut tally, directive, 10.0);
                    println!("ANSWER: {answerline}");
                }
                tally.shift("bonuses", 1.0);
                println!();
            }
        }
    }

    println!();
    for (key, value) in tally.iter() {
        println!("{key}: {value}");
    }
    Ok(())
}

async fn run() -> Result<(), BoxError> {
    let parsed = Args::parse(std::env::args().skip(1)).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    if matches!(parsed.command, Command::Help) {
        print_usage();
        return Ok(());
    }

    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = parsed.common.base_url.as_deref() {
        config = config.with_base_url(base_url)?;
    }
    if let Some(batch_size) = parsed.common.batch_size {
        config = config.with_batch_size(batch_size);
    }
    let source = Arc::new(HttpQuestionSource::new(&config)?);
    log::debug!("question service at {}", source.base_url());
    let buffer_for = |filters: QuestionFilters| {
        QuestionBuffer::with_filters(source.clone(), config.batch_size, filters)
    };

    match parsed.command {
        Command::Random { filters, count } => random(&buffer_for(filters), count).await,
        Command::Play { filters } => {
            let answers = AnswerService::new(source.clone());
            play(&buffer_for(filters), &answers).await
        }
        Command::Packet { selection } => {
            let packets = PacketService::new(source.clone());
            packet(&packets, &selection).await
        }
        Command::Check { answerline, given } => {
            let answers = AnswerService::new(source.clone());
            let check = answers.check(&answerline, &given).await?;
            match check.directed_prompt {
                Some(prompt) => println!("{} ({prompt})", check.directive),
                None => println!("{}", check.directive),
            }
            Ok(())
        }
        Command::Help => Ok(()),
    }
}

#[tokio::main]
async fn main() {
    init_logging();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
