use hearts_bot::{GameDriver, GameRun, SeatConfig, StrategyKind};
use hearts_core::game::state::GameRules;
use hearts_train::{
    ArchiveWriter, DatasetFormat, Extractor, FilterPolicy, load_archive, read_dataset,
    replay_decisions, write_dataset, write_examples,
};
use sha2::{Digest, Sha256};

fn play(game_id: u64) -> GameRun {
    let seats = StrategyKind::ALL.map(|kind| SeatConfig::new(kind.as_str(), kind.spawn(game_id)));
    GameDriver::new(game_id, 1000 + game_id, GameRules::default(), seats)
        .run()
        .expect("game completes")
}

fn digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[test]
fn archived_extraction_matches_live_bytes() {
    let runs: Vec<GameRun> = (0..3).map(play).collect();
    let extractor = Extractor::new(FilterPolicy::default());

    let mut live = Vec::new();
    for run in &runs {
        live.extend(extractor.extract(&run.result, &run.decisions).unwrap());
    }

    let dir = tempfile::tempdir().unwrap();
    let archive_path = dir.path().join("games.jsonl");
    let mut archive = ArchiveWriter::create(&archive_path).unwrap();
    for run in &runs {
        archive.push(&run.result).unwrap();
    }
    archive.finish().unwrap();

    let archived_results = load_archive(&archive_path).unwrap();
    assert_eq!(archived_results.len(), runs.len());
    let mut archived = Vec::new();
    for (result, run) in archived_results.iter().zip(&runs) {
        assert_eq!(replay_decisions(result).unwrap(), run.decisions);
        archived.extend(extractor.extract_archived(result).unwrap());
    }

    for format in [DatasetFormat::Binary, DatasetFormat::Jsonl] {
        let live_bytes = write_examples(Vec::new(), format, &live).unwrap();
        let archived_bytes = write_examples(Vec::new(), format, &archived).unwrap();
        assert_eq!(digest(&live_bytes), digest(&archived_bytes), "{format}");
    }
}

#[test]
fn dataset_files_round_trip() {
    let run = play(9);
    let examples = Extractor::default()
        .extract(&run.result, &run.decisions)
        .unwrap();
    assert!(!examples.is_empty());

    let dir = tempfile::tempdir().unwrap();
    for format in [DatasetFormat::Binary, DatasetFormat::Jsonl] {
        let path = dir.path().join(format!("train.{format}"));
        assert_eq!(write_dataset(&path, format, &examples).unwrap(), examples.len());
        assert_eq!(read_dataset(&path, format).unwrap(), examples);
    }
}

#[test]
fn examples_carry_pre_move_hands() {
    let run = play(4);
    let examples = Extractor::new(FilterPolicy {
        max_round_points: 26,
        max_trick_points: 26,
    })
    .extract(&run.result, &run.decisions)
    .unwrap();
    assert_eq!(examples.len(), run.decisions.len());
    for example in &examples {
        assert!(example.hand.contains(&example.played_card));
        assert_eq!(example.hand.len() + example.previous_tricks.len(), 13);
    }
}
