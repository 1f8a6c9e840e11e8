use bundle_patcher::pipeline::{
    Fetch, FetchError, PackageState, Pipeline, PipelineError, PipelineSettings, RunOutcome,
};
use bundle_patcher::TransformError;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const LATEST_URL: &str = "https://dl.example.com/tool/latest";

/// A release channel served from memory.
struct FakeRelease {
    version: RefCell<String>,
    binary: RefCell<Option<Vec<u8>>>,
    requests: RefCell<Vec<String>>,
}

impl FakeRelease {
    fn new(version: &str, payload: &str) -> Self {
        Self {
            version: RefCell::new(version.to_string()),
            binary: RefCell::new(Some(framed(payload))),
            requests: RefCell::new(Vec::new()),
        }
    }

    fn publish(&self, version: &str, payload: Option<&str>) {
        *self.version.borrow_mut() = version.to_string();
        *self.binary.borrow_mut() = payload.map(framed);
    }

    fn publish_raw(&self, version: &str, bytes: &[u8]) {
        *self.version.borrow_mut() = version.to_string();
        *self.binary.borrow_mut() = Some(bytes.to_vec());
    }

    fn binary_url(&self) -> String {
        format!(
            "https://dl.example.com/tool/{}/linux-x64/tool",
            self.version.borrow()
        )
    }
}

impl Fetch for FakeRelease {
    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.requests.borrow_mut().push(url.to_string());
        if url == LATEST_URL {
            return Ok(format!("{}\n", self.version.borrow()).into_bytes());
        }
        match self.binary.borrow().as_ref() {
            Some(bytes) if url == self.binary_url() => Ok(bytes.clone()),
            _ => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

/// Wrap JavaScript the way the bundler embeds it in an executable.
fn framed(payload: &str) -> Vec<u8> {
    let mut bytes = b"\x7fELF\x02\x01\x01\0runtime".to_vec();
    bytes.extend_from_slice(b"// @bun\n");
    bytes.extend_from_slice(payload.as_bytes());
    bytes.extend_from_slice(b"\n//# debugId=0123abcd\0\0trailer");
    bytes
}

const PAYLOAD: &str = "\
import fs from \"fs\";
checkForUpdates();
fs.readFileSync(\"config.json\");
";

fn settings(dir: &Path) -> PipelineSettings {
    let mut settings = PipelineSettings::from_toml(&format!(
        r#"
[release]
latest_url = "{LATEST_URL}"
binary_url = "https://dl.example.com/tool/{{version}}/{{platform}}/{{binary}}"
binary = "tool"
platform = "linux-x64"

[package]
name = "tool"
dependencies = {{ "left-pad" = "^1.3.0" }}
"#
    ))
    .unwrap();
    settings.paths.output = Some(dir.join("out"));
    settings
}

fn setup() -> (TempDir, Pipeline<FakeRelease>) {
    let dir = TempDir::new().unwrap();
    let pipeline =
        Pipeline::from_settings(settings(dir.path()), FakeRelease::new("1.2.0", PAYLOAD)).unwrap();
    (dir, pipeline)
}

fn installed_path(outcome: &RunOutcome) -> PathBuf {
    match outcome {
        RunOutcome::Updated { path, .. } => path.clone(),
        other => panic!("expected an update, got {other:?}"),
    }
}

fn state(pipeline: &Pipeline<FakeRelease>) -> Option<PackageState> {
    PackageState::load(&pipeline.settings().paths.state_file())
}

#[test]
fn first_run_installs_patched_package() {
    let (_dir, pipeline) = setup();
    let outcome = pipeline.run().unwrap();

    let RunOutcome::Updated {
        previous,
        version,
        framed,
        report,
        ..
    } = &outcome
    else {
        panic!("expected an update, got {outcome:?}");
    };
    assert_eq!(previous, &None);
    assert_eq!(version, "1.2.0");
    assert!(*framed);
    assert_eq!(report.imports_converted, 1);
    assert_eq!(report.calls_removed, 1);

    let path = installed_path(&outcome);
    assert!(path.ends_with("tool"));
    let code = fs::read_to_string(path.join("cli.js")).unwrap();
    assert!(code.starts_with("(() => {"));
    assert!(code.contains("const fs = require(\"fs\");\nfs.readFileSync(\"config.json\");\n"));
    assert!(!code.contains("checkForUpdates"));
    assert!(!code.contains("debugId"));

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(path.join("package.json")).unwrap()).unwrap();
    assert_eq!(manifest["version"], "1.2.0");
    assert_eq!(manifest["main"], "cli.js");
    assert_eq!(manifest["bin"]["tool"], "cli.js");
    assert_eq!(manifest["type"], "commonjs");
    assert_eq!(manifest["dependencies"]["left-pad"], "^1.3.0");

    assert_eq!(
        state(&pipeline),
        Some(PackageState {
            name: "tool".to_string(),
            version: "1.2.0".to_string(),
            binary: "tool".to_string(),
        })
    );
}

#[cfg(unix)]
#[test]
fn entry_point_is_executable() {
    use std::os::unix::fs::PermissionsExt;

    let (_dir, pipeline) = setup();
    let path = installed_path(&pipeline.run().unwrap());
    let mode = fs::metadata(path.join("cli.js")).unwrap().permissions().mode();
    assert_eq!(mode & 0o111, 0o111);
}

#[test]
fn second_run_is_up_to_date_without_download() {
    let (_dir, pipeline) = setup();
    pipeline.run().unwrap();
    pipeline.fetcher().requests.borrow_mut().clear();

    match pipeline.run().unwrap() {
        RunOutcome::UpToDate { version } => assert_eq!(version, "1.2.0"),
        other => panic!("expected up to date, got {other:?}"),
    }
    assert_eq!(*pipeline.fetcher().requests.borrow(), vec![LATEST_URL.to_string()]);
}

#[test]
fn version_prefix_does_not_trigger_update() {
    let (_dir, pipeline) = setup();
    pipeline.run().unwrap();
    pipeline.fetcher().publish("v1.2.0", Some(PAYLOAD));
    assert!(matches!(pipeline.run().unwrap(), RunOutcome::UpToDate { .. }));
}

#[test]
fn force_reinstalls_current_version() {
    let (dir, pipeline) = setup();
    pipeline.run().unwrap();
    let pipeline = Pipeline::from_settings(
        settings(dir.path()),
        FakeRelease::new("1.2.0", "console.log(\"rebuilt\");\n"),
    )
    .unwrap()
    .force(true);

    let outcome = pipeline.run().unwrap();
    let RunOutcome::Updated { previous, .. } = &outcome else {
        panic!("expected an update, got {outcome:?}");
    };
    assert_eq!(previous.as_deref(), Some("1.2.0"));
    let code = fs::read_to_string(installed_path(&outcome).join("cli.js")).unwrap();
    assert!(code.contains("console.log(\"rebuilt\");"));
}

#[test]
fn new_release_replaces_package() {
    let (_dir, pipeline) = setup();
    pipeline.run().unwrap();
    pipeline.fetcher().publish("1.3.0", Some("console.log(\"v1.3\");\n"));

    let outcome = pipeline.run().unwrap();
    let path = installed_path(&outcome);
    let code = fs::read_to_string(path.join("cli.js")).unwrap();
    assert!(code.contains("v1.3"));
    assert!(!code.contains("config.json"));
    assert_eq!(state(&pipeline).unwrap().version, "1.3.0");

    // Staging and parked directories are cleaned up
    let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with('.'))
        .collect();
    assert!(leftovers.is_empty(), "{leftovers:?}");
}

#[test]
fn missing_binary_leaves_state_alone() {
    let (_dir, pipeline) = setup();
    pipeline.run().unwrap();
    pipeline.fetcher().publish("1.3.0", None);

    let err = pipeline.run().unwrap_err();
    assert!(
        matches!(err, PipelineError::Fetch(FetchError::Status { status: 404, .. })),
        "{err}"
    );
    assert_eq!(state(&pipeline).unwrap().version, "1.2.0");
}

#[test]
fn unparseable_payload_keeps_previous_install() {
    let (_dir, pipeline) = setup();
    let path = installed_path(&pipeline.run().unwrap());
    let before = fs::read_to_string(path.join("cli.js")).unwrap();
    pipeline.fetcher().publish("1.3.0", Some("}}}}\n"));

    let err = pipeline.run().unwrap_err();
    assert!(
        matches!(err, PipelineError::Transform(TransformError::Unparseable { .. })),
        "{err}"
    );
    assert_eq!(state(&pipeline).unwrap().version, "1.2.0");
    assert_eq!(fs::read_to_string(path.join("cli.js")).unwrap(), before);
}

fn updated_framing(outcome: &RunOutcome) -> bool {
    match outcome {
        RunOutcome::Updated { framed, .. } => *framed,
        other => panic!("expected an update, got {other:?}"),
    }
}

#[test]
fn header_only_binary_installs_text_before_trailer() {
    let (_dir, pipeline) = setup();
    pipeline.fetcher().publish_raw(
        "1.2.0",
        b"\x7fELF\0runtime// @bun\nconsole.log(1);\n\0\0\xff\xfe\x90trailer",
    );

    let outcome = pipeline.run().unwrap();
    assert!(!updated_framing(&outcome));
    let code = fs::read_to_string(installed_path(&outcome).join("cli.js")).unwrap();
    assert!(code.ends_with("console.log(1);\n"), "{code}");
    assert!(!code.contains("trailer"));
    assert_eq!(state(&pipeline).unwrap().version, "1.2.0");
}

#[test]
fn unframed_source_is_installed_as_is() {
    let (_dir, pipeline) = setup();
    pipeline
        .fetcher()
        .publish_raw("1.2.0", b"console.log(\"plain\");\n");

    let outcome = pipeline.run().unwrap();
    assert!(!updated_framing(&outcome));
    let code = fs::read_to_string(installed_path(&outcome).join("cli.js")).unwrap();
    assert!(code.ends_with("console.log(\"plain\");\n"), "{code}");
}

#[test]
fn empty_version_is_an_error() {
    let (_dir, pipeline) = setup();
    pipeline.fetcher().publish("  ", Some(PAYLOAD));
    assert!(matches!(pipeline.run().unwrap_err(), PipelineError::EmptyVersion));
}

#[test]
fn status_compares_installed_and_remote() {
    let (_dir, pipeline) = setup();
    let status = pipeline.status().unwrap();
    assert_eq!(status.installed, None);
    assert_eq!(status.remote, "1.2.0");
    assert!(!status.is_up_to_date());
    assert!(status.update_available());

    pipeline.run().unwrap();
    let status = pipeline.status().unwrap();
    assert!(status.is_up_to_date());
    assert!(!status.update_available());

    pipeline.fetcher().publish("1.3.0", None);
    let status = pipeline.status().unwrap();
    assert!(!status.is_up_to_date());
    assert!(status.update_available());

    pipeline.fetcher().publish("1.1.0", None);
    let status = pipeline.status().unwrap();
    assert!(!status.is_up_to_date());
    assert!(!status.update_available());
    assert_eq!(pipeline.fetcher().requests.borrow().last().unwrap(), LATEST_URL);
}
