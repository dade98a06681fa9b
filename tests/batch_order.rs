use std::fs;

use tfim_sim::{read_requests, run_batch, BatchOptions};
use tfim_tools::{DiagonalizeResult, ToolConfig, Toolbox};

fn request(length: u32) -> String {
    format!(r#"{{"tool":"diagonalize","L":{length},"h":0.7}}"#)
}

#[test]
fn batch_keeps_request_order() {
    let toolbox = Toolbox::from_config(ToolConfig::default());
    let lengths = [10u32, 2, 8, 13, 4, 6];
    let requests: Vec<String> = lengths.iter().map(|&l| request(l)).collect();
    let responses = run_batch(&toolbox, &requests, &BatchOptions { threads: 3 }).expect("batch");
    assert_eq!(responses.len(), lengths.len());
    for (length, response) in lengths.iter().zip(&responses) {
        if *length > 12 {
            assert!(!response.ok);
            continue;
        }
        let result: DiagonalizeResult = response.result_as().expect("result");
        assert_eq!(result.length, *length);
    }
}

#[test]
fn batch_matches_sequential_dispatch() {
    let toolbox = Toolbox::from_config(ToolConfig::default());
    let requests: Vec<String> = [4u32, 6, 8].iter().map(|&l| request(l)).collect();
    let parallel = run_batch(&toolbox, &requests, &BatchOptions::default()).expect("batch");
    for (line, response) in requests.iter().zip(&parallel) {
        let single: DiagonalizeResult = toolbox.dispatch_json(line).result_as().expect("single");
        let batched: DiagonalizeResult = response.result_as().expect("batched");
        assert_eq!(single.energy_per_site, batched.energy_per_site);
    }
}

#[test]
fn requests_load_from_arrays_and_json_lines() {
    let dir = tempfile::tempdir().expect("tempdir");

    let array = dir.path().join("requests.json");
    fs::write(&array, format!("[{}, {}]", request(4), request(6))).expect("write");
    let from_array = read_requests(&array).expect("array");
    assert_eq!(from_array.len(), 2);
    assert!(from_array[1].contains("\"L\":6"));

    let lines = dir.path().join("requests.jsonl");
    fs::write(&lines, format!("{}\n\n  {}\n", request(8), request(10))).expect("write");
    let from_lines = read_requests(&lines).expect("lines");
    assert_eq!(from_lines, vec![request(8), request(10)]);

    let missing = read_requests(&dir.path().join("absent.jsonl")).expect_err("missing");
    assert_eq!(missing.info().code, "batch.read");
}
