use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn bundle_patcher(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bundle-patcher"))
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run bundle-patcher")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn help_lists_commands() {
    let dir = TempDir::new().unwrap();
    let output = bundle_patcher(&["--help"], dir.path());
    assert!(output.status.success());
    let text = stdout(&output);
    for command in ["extract", "transform", "update", "status"] {
        assert!(text.contains(command), "missing {command} in:\n{text}");
    }
}

#[test]
fn extract_writes_payload() {
    let dir = TempDir::new().unwrap();
    let mut binary = b"\x7fELF\0\0".to_vec();
    binary.extend_from_slice(b"// @bun\nconsole.log(\"hi\");\n//# debugId=42\0");
    fs::write(dir.path().join("tool"), &binary).unwrap();

    let output = bundle_patcher(&["extract", "tool", "-o", "cli.js"], dir.path());
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(
        fs::read_to_string(dir.path().join("cli.js")).unwrap(),
        "console.log(\"hi\");"
    );
    assert!(stderr(&output).contains("header found at byte"), "{}", stderr(&output));
}

#[test]
fn extract_unframed_file_to_stdout() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("plain.js"), "run();\n").unwrap();

    let output = bundle_patcher(&["extract", "plain.js"], dir.path());
    assert!(output.status.success());
    assert_eq!(stdout(&output), "run();\n");
}

#[test]
fn transform_with_json_config() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("rules.json"),
        r#"{ "removeFunctionCalls": ["track"], "renameIdentifiers": { "cfg": "settings" } }"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("input.js"),
        "const cfg = load();\ntrack(cfg);\nrun(cfg);\n",
    )
    .unwrap();

    let output = bundle_patcher(
        &["transform", "input.js", "-c", "rules.json", "-o", "out.js"],
        dir.path(),
    );
    assert!(output.status.success(), "{}", stderr(&output));
    let code = fs::read_to_string(dir.path().join("out.js")).unwrap();
    assert!(code.ends_with("const settings = load();\nrun(settings);\n"), "{code}");
    assert!(stderr(&output).contains("input.js"));
}

#[test]
fn transform_prints_to_stdout_with_default_patches() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("app.mjs"),
        "import fs from \"fs\";\ncheckForUpdates();\n",
    )
    .unwrap();

    let output = bundle_patcher(&["transform", "app.mjs"], dir.path());
    assert!(output.status.success(), "{}", stderr(&output));
    let code = stdout(&output);
    assert!(code.contains("const fs = require(\"fs\");"));
    assert!(!code.contains("checkForUpdates"));
    // Unused default rules are reported, not fatal
    assert!(stderr(&output).contains("matched nothing"));
}

#[test]
fn in_place_rewrites_the_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("app.js"), "import a from \"a\";\n").unwrap();

    let output = bundle_patcher(&["transform", "app.js", "--in-place"], dir.path());
    assert!(output.status.success(), "{}", stderr(&output));
    let code = fs::read_to_string(dir.path().join("app.js")).unwrap();
    assert!(code.ends_with("const a = require(\"a\");\n"));
}

fn script_tree(dir: &Path) {
    fs::create_dir_all(dir.join("src/nested")).unwrap();
    fs::write(dir.join("src/main.js"), "import x from \"x\";\nx();\n").unwrap();
    fs::write(dir.join("src/nested/util.cjs"), "module.exports = 1;\n").unwrap();
    fs::write(dir.join("src/README.md"), "# not a script\n").unwrap();
}

#[test]
fn directory_dry_run_changes_nothing() {
    let dir = TempDir::new().unwrap();
    script_tree(dir.path());

    let output = bundle_patcher(&["transform", "src", "--dry-run"], dir.path());
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Transformed 2 of 2 file(s)"));
    assert_eq!(
        fs::read_to_string(dir.path().join("src/main.js")).unwrap(),
        "import x from \"x\";\nx();\n"
    );
}

#[test]
fn directory_to_output_mirrors_layout() {
    let dir = TempDir::new().unwrap();
    script_tree(dir.path());

    let output = bundle_patcher(&["transform", "src", "-o", "out"], dir.path());
    assert!(output.status.success(), "{}", stderr(&output));
    let main = fs::read_to_string(dir.path().join("out/main.js")).unwrap();
    assert!(main.ends_with("const x = require(\"x\");\nx();\n"));
    assert!(dir.path().join("out/nested/util.cjs").exists());
    assert!(!dir.path().join("out/README.md").exists());
}

#[test]
fn directory_needs_a_destination() {
    let dir = TempDir::new().unwrap();
    script_tree(dir.path());

    let output = bundle_patcher(&["transform", "src"], dir.path());
    assert!(!output.status.success());
    assert!(stderr(&output).contains("--output"), "{}", stderr(&output));
}

#[test]
fn unparseable_file_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("bad.js"), "}}}}\n").unwrap();

    let output = bundle_patcher(&["transform", "bad.js"], dir.path());
    assert!(!output.status.success());
    assert!(stderr(&output).contains("bad.js"), "{}", stderr(&output));
}

#[test]
fn update_rejects_invalid_settings() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("settings.toml"),
        "[release]\nlatest_url = \"https://dl.example.com/latest\"\nbinary_url = \"https://dl.example.com/tool\"\nbinary = \"tool\"\n\n[package]\nname = \"tool\"\n",
    )
    .unwrap();

    let output = bundle_patcher(&["update", "-s", "settings.toml"], dir.path());
    assert!(!output.status.success());
    assert!(stderr(&output).contains("{version}"), "{}", stderr(&output));
}
