//! Feed parsing, file tailing and ingestion

use std::fs::{self, OpenOptions};
use std::io::Write;

use junction_sim::simulation::{
    feed_line, ingest_line, parse_feed_line, FeedError, FeedTailer, GenerationMode, Intersection,
    JunctionConfig, JunctionStats, Road, TrafficGenerator,
};

fn append(path: &std::path::Path, text: &str) {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .unwrap();
    file.write_all(text.as_bytes()).unwrap();
}

#[test]
fn test_parse_plain_record() {
    let record = parse_feed_line("AB1CD234:C", 17).unwrap();
    assert_eq!(record.id().0, "AB1CD234");
    assert_eq!(record.road(), Road::C);
    assert_eq!(record.lane(), None);
    assert_eq!(record.arrival_time(), 17);
}

#[test]
fn test_parse_record_with_lane() {
    let record = parse_feed_line("XY9ZZ001:A:2\r", 0).unwrap();
    assert_eq!(record.road(), Road::A);
    assert_eq!(record.lane(), Some(2));
}

#[test]
fn test_parse_accepts_punctuation_in_id() {
    let record = parse_feed_line("AB-12:A", 3).unwrap();
    assert_eq!(record.id().0, "AB-12");
    assert_eq!(record.road(), Road::A);

    let record = parse_feed_line("#7_x.9:D:1", 3).unwrap();
    assert_eq!(record.id().0, "#7_x.9");
    assert_eq!(record.lane(), Some(1));
}

#[test]
fn test_malformed_lines_are_rejected() {
    let bad = [
        "",
        "AB1CD234",
        "AB1CD234:",
        "AB1CD234:E",
        "AB1CD234:AB",
        "AB1CD234:a",
        ":A",
        "AB 1:A",
        "AB\t1:A",
        "AB\u{7}1:A",
        "AB1CD234:A:0",
        "AB1CD234:A:9",
        "AB1CD234:A:x",
        "AB1CD234:A:1:2",
        "ABCDEFGHIJKLM:A",
    ];
    for line in bad {
        let result = parse_feed_line(line, 0);
        assert!(
            matches!(result, Err(FeedError::Malformed { .. })),
            "{:?} should be malformed, got {:?}",
            line,
            result
        );
    }
}

#[test]
fn test_generated_lines_parse_back() {
    let mut generator =
        TrafficGenerator::new_with_seed(GenerationMode::Priority { weight: 100 }, 2, 5);
    for record in generator.tick(3) {
        let parsed = parse_feed_line(&feed_line(&record), 3).unwrap();
        assert_eq!(parsed, record);
    }
}

#[test]
fn test_tailer_reads_complete_lines_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vehicles.data");
    append(&path, "AA1BB111:A\nAA1BB112:B\n");

    let mut tailer = FeedTailer::from_start(&path);
    assert_eq!(tailer.poll().unwrap(), vec!["AA1BB111:A", "AA1BB112:B"]);
    assert!(tailer.poll().unwrap().is_empty());

    // A half-written line waits for its newline
    append(&path, "AA1BB113:C");
    assert!(tailer.poll().unwrap().is_empty());
    append(&path, ":1\n");
    assert_eq!(tailer.poll().unwrap(), vec!["AA1BB113:C:1"]);
}

#[test]
fn test_tailer_from_end_skips_history() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vehicles.data");
    append(&path, "OLD1:A\nOLD2:B\n");

    let mut tailer = FeedTailer::from_end(&path).unwrap();
    assert!(tailer.poll().unwrap().is_empty());

    append(&path, "NEW1:D\n");
    assert_eq!(tailer.poll().unwrap(), vec!["NEW1:D"]);
}

#[test]
fn test_tailer_handles_missing_and_trimmed_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vehicles.data");

    let mut tailer = FeedTailer::from_end(&path).unwrap();
    assert_eq!(tailer.offset(), 0);
    assert!(tailer.poll().unwrap().is_empty());

    append(&path, "FIRST1:A\nFIRST2:A\n");
    assert_eq!(tailer.poll().unwrap().len(), 2);

    // Trimmed externally: start over from the beginning
    fs::write(&path, "NEXT1:B\n").unwrap();
    assert_eq!(tailer.poll().unwrap(), vec!["NEXT1:B"]);
}

#[test]
fn test_ingest_counts_rejections_and_malformed_lines() {
    let config = JunctionConfig {
        queue_capacity: 1,
        ..JunctionConfig::default()
    };
    let intersection = Intersection::new(config).unwrap();
    let mut stats = JunctionStats::default();

    ingest_line(&intersection, "CAR1:A", &mut stats);
    ingest_line(&intersection, "CAR2:A", &mut stats);
    ingest_line(&intersection, "CAR3:B:3", &mut stats);
    ingest_line(&intersection, "garbage", &mut stats);
    ingest_line(&intersection, "   ", &mut stats);

    assert_eq!(intersection.queue_sizes(), [1, 1, 0, 0]);
    assert_eq!(stats.road(Road::A).arrived, 2);
    assert_eq!(stats.road(Road::A).rejected, 1);
    assert_eq!(stats.road(Road::B).arrived, 1);
    assert_eq!(stats.malformed_lines, 1);
    assert_eq!(intersection.queue(Road::A).peek().unwrap().id().0, "CAR1");
}
