use std::sync::Arc;

use reqwest::StatusCode;
use services::{
    AnswerJudge, ClientConfig, FetchError, HttpQuestionSource, PacketService, QuestionBuffer,
    QuestionSource,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use trivia_core::model::{BatchSize, Directive, QuestionFilters, QuestionType};

/// Serve exactly one canned response and hand back the raw request.
async fn serve_once(status_line: &'static str, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let body = body.to_owned();
    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = read_request(&mut stream).await;
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        let _ = stream.shutdown().await;
        request
    });
    (format!("http://{addr}/"), handle)
}

async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0_u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let body_len = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + body_len {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn client(base: &str) -> HttpQuestionSource {
    HttpQuestionSource::new(&ClientConfig::new(base).unwrap()).unwrap()
}

#[tokio::test]
async fn random_questions_posts_filters() {
    let (base, server) = serve_once(
        "200 OK",
        r#"[{"_id":"a","formatted_answer":"<b>A</b>"},{"_id":"b"}]"#,
    )
    .await;
    let source = client(&base);

    let filters = QuestionFilters::new(QuestionType::Tossup)
        .with_difficulties([3])
        .with_categories(["Literature"]);
    let batch = source
        .random_questions(&filters, BatchSize::new(2).unwrap())
        .await
        .unwrap();

    assert_eq!(batch.len(), 2);
    // the raw source does not normalize
    assert_eq!(batch[0].answer(), None);

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /api/random-question HTTP/1.1"));
    assert!(request.contains(r#""questionType":"tossup""#));
    assert!(request.contains(r#""difficulties":[3]"#));
    assert!(request.contains(r#""categories":["Literature"]"#));
    assert!(request.contains(r#""number":2"#));
    assert!(request.contains(r#""minYear":2010"#));
}

#[tokio::test]
async fn buffer_over_http_normalizes_batch() {
    let (base, server) = serve_once(
        "200 OK",
        r#"[{"_id":"a","answer":"A","formatted_answer":"<b>A</b>"}]"#,
    )
    .await;
    let source: Arc<dyn QuestionSource> = Arc::new(client(&base));
    let buffer = QuestionBuffer::new(source, BatchSize::new(1).unwrap());

    let question = buffer.next().await.unwrap();
    assert_eq!(question.answer(), Some("<b>A</b>"));
    server.await.unwrap();
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let (base, server) = serve_once("503 Service Unavailable", "{}").await;
    let source = client(&base);

    let err = source
        .random_questions(&QuestionFilters::default(), BatchSize::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FetchError::HttpStatus(StatusCode::SERVICE_UNAVAILABLE)
    ));
    server.await.unwrap();
}

#[tokio::test]
async fn malformed_json_is_a_decode_error() {
    let (base, server) = serve_once("200 OK", "[{not json").await;
    let source = client(&base);

    let err = source
        .random_questions(&QuestionFilters::default(), BatchSize::default())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Decode(_)));
    server.await.unwrap();
}

#[tokio::test]
async fn check_answer_decodes_directive_pair() {
    let (base, server) = serve_once("200 OK", r#"["prompt","less specific"]"#).await;
    let source = client(&base);

    let check = source
        .check_answer("<b>Battle of Hastings</b>", "Hastings")
        .await
        .unwrap();
    assert_eq!(check.directive, Directive::Prompt);
    assert_eq!(check.directed_prompt.as_deref(), Some("less specific"));

    let request = server.await.unwrap();
    assert!(request.starts_with(
        "GET /api/check-answer?answerline=%3Cb%3EBattle+of+Hastings%3C%2Fb%3E&givenAnswer=Hastings HTTP/1.1"
    ));
}

#[tokio::test]
async fn packet_lookups_hit_packet_endpoints() {
    let (base, server) = serve_once(
        "200 OK",
        r#"{"tossups":[{"_id":"t1"}],"bonuses":[{"_id":"b1"},{"_id":"b2"}]}"#,
    )
    .await;
    let service = PacketService::new(Arc::new(client(&base)));

    let packet = service.packet("2021 ACF Fall", 3).await.unwrap();
    assert_eq!(packet.tossups.len(), 1);
    assert_eq!(packet.bonuses.len(), 2);

    let request = server.await.unwrap();
    assert!(request.starts_with("GET /api/packet?setName=2021+ACF+Fall&packetNumber=3 HTTP/1.1"));

    let (base, server) = serve_once("200 OK", r#"{"bonuses":[{"_id":"b1"}]}"#).await;
    let service = PacketService::new(Arc::new(client(&base)));
    let bonuses = service.bonuses("2021 ACF Fall", 4).await.unwrap();
    assert_eq!(bonuses[0].id(), Some("b1"));

    let request = server.await.unwrap();
    assert!(request.starts_with("GET /api/packet-bonuses?setName=2021+ACF+Fall&packetNumber=4"));

    let (base, server) = serve_once("200 OK", r#"{"tossups":[{"_id":"t9"}]}"#).await;
    let service = PacketService::new(Arc::new(client(&base)));
    let tossups = service.tossups("2021 ACF Fall", 5).await.unwrap();
    assert_eq!(tossups.len(), 1);
    assert_eq!(tossups[0].id(), Some("t9"));

    let request = server.await.unwrap();
    assert!(request.starts_with(
        "GET /api/packet-tossups?setName=2021+ACF+Fall&packetNumber=5 HTTP/1.1"
    ));
}
