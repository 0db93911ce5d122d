use std::path::PathBuf;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::board::Board;
use crate::dataset::Dataset;
use crate::engine::{DisplayMode, FilterState, RowMarker, TypeSelection};
use crate::loader::{LoadError, LoadOptions, Loader, Source};
use crate::output::{self, Report};

const TEAM: &str = r#"{
    "Alice": {"statistics": {"totalGradedFields": 10}, "gradedAssignments": {"Worksheet_1": 6, "Quiz_1": 4}},
    "Bob": {"statistics": {"totalGradedFields": 5}, "gradedAssignments": {"Worksheet_1": 5}}
}"#;

fn board(raw: &str) -> Board {
    Board::new(Source::default(), Dataset::from_json(raw).unwrap(), None)
}

fn filter(search: &str, types: &[&str]) -> FilterState {
    FilterState {
        search: search.to_string(),
        types: TypeSelection::from_prefixes(types.iter().copied()),
    }
}

fn temp_file(name: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("graderboard-tests-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// Serves one canned HTTP response on a loopback port and returns its URL.
async fn serve_once(response: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        stream.write_all(response.as_bytes()).await.unwrap();
        let _ = stream.shutdown().await;
    });
    format!("http://{addr}/data/graders.json")
}

fn http_response(status: &str, headers: &[&str], body: &str) -> String {
    let mut out = format!("HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n", body.len());
    for h in headers {
        out.push_str(h);
        out.push_str("\r\n");
    }
    out.push_str("\r\n");
    out.push_str(body);
    out
}

#[test]
fn worksheet_only_ranks_alice_then_bob() {
    let b = board(TEAM);
    let lb = b.leaderboard(&filter("", &["Worksheet"]));
    assert_eq!(lb.mode, DisplayMode::Ranked);
    let rows: Vec<_> = lb
        .rows
        .iter()
        .map(|r| (r.item.name.as_str(), r.item.filtered_score, r.marker))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("Alice", 6, RowMarker::Rank { position: 1, podium: true }),
            ("Bob", 5, RowMarker::Rank { position: 2, podium: true }),
        ]
    );
    assert!(lb.rows.iter().all(|r| !r.expanded));
}

#[test]
fn quiz_only_is_unranked_single_row() {
    let lb = board(TEAM).leaderboard(&filter("", &["Quiz"]));
    assert_eq!(lb.mode, DisplayMode::Unranked);
    assert_eq!(lb.rows.len(), 1);
    assert_eq!(lb.rows[0].item.name, "Alice");
    assert_eq!(lb.rows[0].item.filtered_score, 4);
    assert_eq!(lb.rows[0].marker, RowMarker::Icon);
}

#[test]
fn search_switches_to_expanded_profile_rows() {
    let lb = board(TEAM).leaderboard(&filter("bo", &["Worksheet", "Quiz"]));
    assert_eq!(lb.mode, DisplayMode::Profile);
    assert_eq!(lb.rows.len(), 1);
    let row = &lb.rows[0];
    assert_eq!(row.item.name, "Bob");
    assert!(row.expanded);
    assert_eq!(row.item.assignments[0].display_name, "Worksheet 1");
    assert_eq!(row.item.assignments[0].count, 5);
}

#[test]
fn empty_selection_renders_no_results() {
    let b = board(TEAM);
    let f = filter("", &[]);
    let lb = b.leaderboard(&f);
    assert!(lb.is_empty());
    let text = String::from_utf8(output::render_text(&Report::ready(&b, &f, lb), false)).unwrap();
    assert!(text.contains("Team Total: 15 fields"));
    assert!(text.contains(output::NO_RESULTS_MESSAGE));
}

#[test]
fn team_total_ignores_filters() {
    let b = board(
        r#"{"A": {"statistics": {"totalGradedFields": 1200}}, "B": {"statistics": {"totalGradedFields": 34}}}"#,
    );
    let f = filter("zzz", &[]);
    let report = Report::ready(&b, &f, b.leaderboard(&f));
    assert_eq!(report.team_total_label().as_deref(), Some("Team Total: 1,234 fields"));
}

#[test]
fn ranked_text_view_lists_podium_markers() {
    let b = board(
        r#"{"D": {"gradedAssignments": {"Quiz_1": 1}},
            "C": {"gradedAssignments": {"Quiz_1": 2}},
            "B": {"gradedAssignments": {"Quiz_1": 3}},
            "A": {"gradedAssignments": {"Quiz_1": 4}}}"#,
    );
    let lb = b.leaderboard(&b.initial_filter());
    let text = output::render_leaderboard_text(&lb, false);
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("  #1  A"));
    assert!(lines[3].starts_with("  #4  D"));
    assert_eq!(
        lb.rows[3].marker,
        RowMarker::Rank { position: 4, podium: false }
    );
}

#[tokio::test]
async fn loads_file_source_with_mtime() {
    let path = temp_file("team.json", TEAM);
    let loader = Loader::new(&LoadOptions::default()).unwrap();
    let loaded = loader.load(&Source::File(path.clone())).await.unwrap();
    assert_eq!(loaded.dataset.len(), 2);
    assert!(loaded.last_modified.is_some());
    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn missing_file_is_a_read_error() {
    let loader = Loader::new(&LoadOptions::default()).unwrap();
    let err = loader
        .load(&Source::File(PathBuf::from("/definitely/not/here.json")))
        .await
        .unwrap_err();
    assert!(matches!(err, LoadError::FileRead { .. }));
}

#[tokio::test]
async fn malformed_json_is_a_parse_error() {
    let path = temp_file("broken.json", "{\"Alice\": ");
    let loader = Loader::new(&LoadOptions::default()).unwrap();
    let err = loader.load(&Source::File(path.clone())).await.unwrap_err();
    assert!(matches!(err, LoadError::Parse { .. }));
    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn fetches_url_and_reads_last_modified() {
    let url = serve_once(http_response(
        "200 OK",
        &[
            "Content-Type: application/json",
            "Last-Modified: Wed, 21 Oct 2015 07:28:00 GMT",
        ],
        TEAM,
    ))
    .await;
    let loader = Loader::new(&LoadOptions::default()).unwrap();
    let loaded = loader.load(&Source::parse(&url)).await.unwrap();
    assert_eq!(loaded.dataset.team_total(), 15);

    let b = Board::from_loaded(loaded);
    let f = b.initial_filter();
    let report = Report::ready(&b, &f, b.leaderboard(&f));
    assert_eq!(
        report.last_updated_label().as_deref(),
        Some("Last Updated: 2015-10-21 07:28:00 UTC")
    );
}

#[tokio::test]
async fn server_error_is_a_status_error() {
    let url = serve_once(http_response("500 Internal Server Error", &[], "oops")).await;
    let loader = Loader::new(&LoadOptions::default()).unwrap();
    let err = loader.load(&Source::parse(&url)).await.unwrap_err();
    assert!(matches!(err, LoadError::Status { status: 500, .. }));
}

#[test]
fn load_failure_report_has_no_labels() {
    let report = Report::load_failed();
    assert!(report.team_total_label().is_none());
    assert!(report.last_updated_label().is_none());
    let html = String::from_utf8(output::render_html(&report)).unwrap();
    assert!(html.contains(output::LOAD_ERROR_MESSAGE));
}
