//! End-to-end command tests against temporary files.

use recordflow::{AppContext, Command, CommandDispatcher, SettingsLoader};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const PEOPLE_CSV: &str = "\
Name,Age,E-Mail Address,email
john doe,30,ignored,John@Example.com
JANE SMITH,17,,jane@example.com
bob,invalid,,not-an-email
";

struct Workspace {
    dir: TempDir,
    dispatcher: CommandDispatcher,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let settings = SettingsLoader::new(Some(dir.path().join("missing-config.json").as_path()))
            .with_env(|_| None)
            .with_override("data.directory", dir.path().join("data").to_string_lossy().as_ref())
            .load()
            .unwrap();
        let dispatcher = CommandDispatcher::new(AppContext::new(settings));
        Self { dir, dispatcher }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn run(&self, command: Command) -> (i32, String) {
        let mut out = Vec::new();
        let code = self
            .dispatcher
            .dispatch(&command, &mut std::io::empty(), &mut out);
        (code, String::from_utf8(out).unwrap())
    }
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_process_writes_default_output_next_to_input() {
    let ws = Workspace::new();
    let input = ws.write("people.csv", PEOPLE_CSV);

    let (code, out) = ws.run(Command::Process {
        file: input,
        output: None,
        skip_validation: false,
    });
    assert_eq!(code, 0, "{out}");
    assert!(out.contains("✅ Read 3 records"));
    assert!(out.contains("Validation: 2 of 3 processed records valid"));
    assert!(ws.path("data").is_dir());

    let written = fs::read_to_string(ws.path("processed_people.csv")).unwrap();
    let mut lines = written.lines();
    assert_eq!(
        lines.next(),
        Some("_processed_at,_row_index,age,age_category,e_mail_address,email,name")
    );
    let first = lines.next().unwrap();
    assert!(first.ends_with(",0,30,Adult,ignored,john@example.com,John Doe"), "{first}");
    let second = lines.next().unwrap();
    assert!(second.ends_with(",1,17,Minor,,jane@example.com,Jane Smith"), "{second}");
    let third = lines.next().unwrap();
    assert!(third.ends_with(",2,,,,not-an-email,Bob"), "{third}");
}

#[test]
fn test_process_rejects_non_csv_output() {
    let ws = Workspace::new();
    let input = ws.write("people.csv", PEOPLE_CSV);

    let (code, out) = ws.run(Command::Process {
        file: input,
        output: Some(ws.path("out.json")),
        skip_validation: true,
    });
    assert_eq!(code, 1);
    assert_eq!(out.trim(), "Error: Process output file must have .csv extension");
    assert!(!ws.path("out.json").exists());
}

#[test]
fn test_validate_writes_report_and_fails() {
    let ws = Workspace::new();
    let input = ws.write(
        "people.csv",
        "name,email,age\nAnn,ann@example.com,40\n,bad,200\nCid,cid@example.com,\n",
    );
    let report = ws.path("reports/errors.json");

    let (code, out) = ws.run(Command::Validate {
        file: input,
        output: Some(report.clone()),
        strict: false,
    });
    assert_eq!(code, 1);
    assert!(out.contains("Valid records: 2 (66.7%)"));
    assert!(out.contains("Invalid records: 1 (33.3%)"));
    assert!(out.contains("1. Row 2: Required field 'name' is missing or empty"));

    let report = read_json(&report);
    assert_eq!(
        report["summary"],
        json!({"total_records": 3, "valid_records": 2, "invalid_records": 1})
    );
    let fields: Vec<&str> = report["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["name", "email", "age"]);
}

#[test]
fn test_validate_all_valid_returns_zero() {
    let ws = Workspace::new();
    let input = ws.write("ok.csv", "name;email\nAnn;ann@example.com\n");
    let report = ws.path("errors.json");

    let (code, out) = ws.run(Command::Validate {
        file: input,
        output: Some(report.clone()),
        strict: false,
    });
    assert_eq!(code, 0);
    assert!(out.contains("All records are valid!"));
    assert!(!report.exists());
}

#[test]
fn test_validate_strict_counts_warnings() {
    let ws = Workspace::new();
    let input = ws.write("ws.csv", "name,email\n\" Ann \",ann@example.com\n");

    let (standard, _) = ws.run(Command::Validate {
        file: input.clone(),
        output: None,
        strict: false,
    });
    let (strict, out) = ws.run(Command::Validate {
        file: input,
        output: None,
        strict: true,
    });
    assert_eq!(standard, 0);
    assert_eq!(strict, 1);
    assert!(out.contains("leading or trailing whitespace"));
}

#[test]
fn test_validate_lists_at_most_ten_errors() {
    let ws = Workspace::new();
    let mut csv = String::from("name,email\n");
    for _ in 0..12 {
        csv.push_str(",\n");
    }
    let input = ws.write("many.csv", &csv);

    let (code, out) = ws.run(Command::Validate {
        file: input,
        output: None,
        strict: false,
    });
    assert_eq!(code, 1);
    assert!(out.contains("Validation Errors (24 total)"));
    assert!(out.contains("   10. Row 5:"));
    assert!(!out.contains("   11. "));
    assert!(out.contains("... and 14 more errors"));
}

#[test]
fn test_analyze_prints_and_saves_statistics() {
    let ws = Workspace::new();
    let input = ws.write("scores.csv", "name,score\nAnn,10\nBob,20\nCid\nDee,30\n");
    let output = ws.path("analysis.json");

    let (code, out) = ws.run(Command::Analyze {
        file: input,
        output: Some(output.clone()),
        include_nulls: true,
    });
    assert_eq!(code, 0, "{out}");
    assert!(out.contains("Total Records: 4"));
    assert!(out.contains("Non-null: 3/4"));
    assert!(out.contains("Null: 1"));
    assert!(out.contains("Range: 10.00 - 30.00"));
    assert!(out.contains("Average: 20.00"));

    let analysis = read_json(&output);
    assert_eq!(analysis["fields"], json!(["name", "score"]));
    assert_eq!(analysis["statistics"]["score"]["unique_count"], 3);
    assert!(analysis["statistics"]["name"].get("mean").is_none());
}

#[test]
fn test_convert_round_trip_keeps_records() {
    let ws = Workspace::new();
    let csv = ws.write("in.csv", "name,city\nAnn,Oslo\nBob,\n");
    let json_path = ws.path("out/records.json");
    let back = ws.path("back.csv");

    let (code, _) = ws.run(Command::Convert {
        input: csv.clone(),
        output: json_path.clone(),
        pretty: true,
    });
    assert_eq!(code, 0);
    let text = fs::read_to_string(&json_path).unwrap();
    assert!(text.starts_with("[\n  {\n    \"name\": \"Ann\""));
    assert_eq!(
        read_json(&json_path),
        json!([{"name": "Ann", "city": "Oslo"}, {"name": "Bob", "city": ""}])
    );

    let (code, _) = ws.run(Command::Convert {
        input: json_path,
        output: back.clone(),
        pretty: false,
    });
    assert_eq!(code, 0);
    assert_eq!(fs::read_to_string(back).unwrap(), "city,name\nOslo,Ann\n,Bob\n");
}

#[test]
fn test_convert_compact_and_single_object() {
    let ws = Workspace::new();
    let single = ws.write("one.json", r#"{"b": 2, "a": "x"}"#);
    let csv = ws.path("one.csv");

    let (code, out) = ws.run(Command::Convert {
        input: single,
        output: csv.clone(),
        pretty: false,
    });
    assert_eq!(code, 0);
    assert!(out.contains("Successfully converted 1 records"));
    assert_eq!(fs::read_to_string(&csv).unwrap(), "a,b\nx,2\n");

    let compact = ws.path("compact.json");
    let (code, _) = ws.run(Command::Convert {
        input: csv,
        output: compact.clone(),
        pretty: false,
    });
    assert_eq!(code, 0);
    assert_eq!(fs::read_to_string(compact).unwrap(), r#"[{"a":"x","b":"2"}]"#);
}

#[test]
fn test_convert_empty_document_writes_nothing() {
    let ws = Workspace::new();
    let input = ws.write("empty.json", "[]");
    let output = ws.path("empty.csv");

    let (code, out) = ws.run(Command::Convert {
        input,
        output: output.clone(),
        pretty: false,
    });
    assert_eq!(code, 0);
    assert!(out.contains("No records found in"));
    assert!(out.contains("nothing written"));
    assert!(!out.contains("Output saved to"));
    assert!(!output.exists());
}

#[test]
fn test_auto_encoding_setting_still_writes() {
    let dir = tempfile::tempdir().unwrap();
    let settings = SettingsLoader::new(Some(dir.path().join("none.json").as_path()))
        .with_env(|_| None)
        .with_override("files.encoding", "auto")
        .with_override("data.directory", dir.path().join("data").to_string_lossy().as_ref())
        .load()
        .unwrap();
    let dispatcher = CommandDispatcher::new(AppContext::new(settings));
    let input = dir.path().join("people.csv");
    fs::write(&input, PEOPLE_CSV).unwrap();
    let output = dir.path().join("people.json");

    let mut out = Vec::new();
    let code = dispatcher.dispatch(
        &Command::Convert {
            input,
            output: output.clone(),
            pretty: false,
        },
        &mut std::io::empty(),
        &mut out,
    );
    assert_eq!(code, 0, "{}", String::from_utf8_lossy(&out));
    assert_eq!(read_json(&output).as_array().unwrap().len(), 3);
}

#[test]
fn test_convert_rejects_non_object_entries() {
    let ws = Workspace::new();
    let input = ws.write("mixed.json", r#"[{"a": 1}, 2]"#);

    let (code, out) = ws.run(Command::Convert {
        input,
        output: ws.path("mixed.csv"),
        pretty: false,
    });
    assert_eq!(code, 1);
    assert!(out.contains("Error: Command failed - [FORMAT_ERROR]"));
    assert!(!ws.path("mixed.csv").exists());
}

#[test]
fn test_convert_missing_input() {
    let ws = Workspace::new();
    let input = ws.path("absent.csv");

    let (code, out) = ws.run(Command::Convert {
        input: input.clone(),
        output: ws.path("absent.json"),
        pretty: false,
    });
    assert_eq!(code, 1);
    assert!(out.contains(&format!("❌ Error: Input file '{}' not found", input.display())));
}
