use std::process::Command;
use tempfile::tempdir;

fn bin() -> String {
    env!("CARGO_BIN_EXE_oxibufr").to_string()
}

const BULLETIN: &str = r#"{
    "descriptors": ["B01001", "R01000", "B31001", "B12101", "C22000", "R01002", "B31031", "B33007"],
    "subsets": [[
        {"code": "B01001", "value": 16},
        {"code": "B31001", "value": 2},
        {"code": "B12101", "value": 27315},
        {"code": "B12101", "value": 27415, "attrs": [{"code": "B33007", "value": 70}]},
        {"code": "C22000", "value": "-+"}
    ]]
}"#;

#[test]
fn cli_validate_accepts_matching_bulletin() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("bulletin.json");
    std::fs::write(&input, BULLETIN).unwrap();

    let out = Command::new(bin())
        .args(["--json", "validate"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(out.status.success());
    let stats: serde_json::Value = serde_json::from_slice(&out.stderr).unwrap();
    assert_eq!(stats["valid"], true);
    assert_eq!(stats["subsets"], 1);
    assert_eq!(stats["checked"], 5);
}

#[test]
fn cli_validate_rejects_mismatch() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("bulletin.json");
    std::fs::write(&input, BULLETIN.replacen("\"B01001\", \"R01000\"", "\"B01002\", \"R01000\"", 1))
        .unwrap();

    let out = Command::new(bin()).arg("validate").arg(&input).output().unwrap();
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("B01002"), "{stderr}");
}

#[test]
fn cli_print_to_file_respects_force() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("bulletin.json");
    let output = dir.path().join("dump.txt");
    std::fs::write(&input, BULLETIN).unwrap();

    let st = Command::new(bin())
        .arg("print")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .status()
        .unwrap();
    assert!(st.success());
    let dump = std::fs::read_to_string(&output).unwrap();
    assert!(dump.starts_with("Subset 0:"));
    assert!(dump.contains("  [3] B33007[PER CENT CONFIDENCE]: 70"));

    // Existing output needs --force.
    let st = Command::new(bin())
        .arg("print")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .status()
        .unwrap();
    assert!(!st.success());

    let st = Command::new(bin())
        .arg("--force")
        .arg("print")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .status()
        .unwrap();
    assert!(st.success());
}

#[test]
fn cli_table_extends_builtin_entries() {
    let dir = tempdir().unwrap();
    let table = dir.path().join("table.json");
    let input = dir.path().join("bulletin.json");
    std::fs::write(
        &table,
        r#"[{"code": "B63001", "desc": "LOCAL COUNTER", "unit": "NUMERIC", "bit_len": 8}]"#,
    )
    .unwrap();
    std::fs::write(
        &input,
        r#"{"descriptors": ["B63001"], "subsets": [[{"code": "B63001", "value": 3}]]}"#,
    )
    .unwrap();

    let out = Command::new(bin()).arg("validate").arg(&input).output().unwrap();
    assert!(!out.status.success());

    let out = Command::new(bin())
        .arg("--table")
        .arg(&table)
        .arg("validate")
        .arg(&input)
        .output()
        .unwrap();
    assert!(out.status.success());
}

#[test]
fn cli_program_prints_structure() {
    let out = Command::new(bin())
        .args(["program", "B01001", "R01000", "B31001", "B12101"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.contains("B12101"));

    let out = Command::new(bin()).args(["program", "bogus"]).output().unwrap();
    assert!(!out.status.success());
}

#[test]
fn cli_config_works() {
    let out = Command::new(bin()).arg("config").output().unwrap();
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stderr);
    assert!(text.contains("MAX_FIELD_BITS=32"));
}

#[test]
fn cli_max_nesting_limits_print_and_validate() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("nested.json");
    std::fs::write(
        &input,
        r#"{"descriptors": ["R02001", "R01001", "B12101"],
            "subsets": [[{"code": "B12101", "value": 27315}]]}"#,
    )
    .unwrap();

    let out = Command::new(bin()).arg("print").arg(&input).output().unwrap();
    assert!(out.status.success());

    for cmd in ["print", "validate"] {
        let out = Command::new(bin())
            .arg(cmd)
            .arg(&input)
            .args(["--max-nesting", "1"])
            .output()
            .unwrap();
        assert!(!out.status.success(), "{cmd}");
        let stderr = String::from_utf8_lossy(&out.stderr);
        assert!(stderr.contains("nested 2 levels deep"), "{cmd}: {stderr}");
    }
}
