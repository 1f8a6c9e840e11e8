use bundle_patcher::config::{load_from_json_str, load_from_str, PatchConfig};
use bundle_patcher::js::{transform, Bootstrap, TransformError, Transformer};

/// Code after the bootstrap snippet.
fn user_code(code: &str) -> &str {
    let snippet = Bootstrap::default().snippet();
    let at = code.find(&snippet).expect("bootstrap present") + snippet.len();
    &code[at..]
}

fn config(toml: &str) -> PatchConfig {
    load_from_str(toml).unwrap()
}

#[test]
fn bootstrap_comes_first_and_is_intact() {
    let out = transform("main();\n", &PatchConfig::default()).unwrap();
    assert!(out.code.starts_with(&Bootstrap::default().snippet()));
    assert!(out.code.contains("process.env[\"API_KEY\"] = \"offline-placeholder\";"));
    assert_eq!(user_code(&out.code), "main();\n");
}

#[test]
fn hashbang_stays_first() {
    let out = transform("#!/usr/bin/env node\nmain();\n", &PatchConfig::default()).unwrap();
    assert!(out.code.starts_with("#!/usr/bin/env node\n(() => {"));
    assert_eq!(user_code(&out.code), "main();\n");
}

#[test]
fn custom_bootstrap_values() {
    let bootstrap = Bootstrap {
        credentials_file: ".tool/auth.json".to_string(),
        env_var: "TOOL_KEY".to_string(),
        placeholder: "none".to_string(),
    };
    let out = Transformer::new(bootstrap)
        .transform("x;\n", &PatchConfig::default())
        .unwrap();
    assert!(out.code.contains("path.join(os.homedir(), \".tool/auth.json\")"));
    assert!(out.code.contains("process.env[\"TOOL_KEY\"] = \"none\";"));
}

#[test]
fn rules_never_touch_the_bootstrap() {
    let rules = config(
        r#"
[rules]
remove_function_calls = ["existsSync", "join"]
remove_identifiers = ["credentials"]
rename_identifiers = { fs = "fileSystem", os = "system" }
"#,
    );
    let source = "const fs = require(\"fs\");\nfs.readFileSync(path.join(a, b));\n";
    let out = transform(source, &rules).unwrap();
    assert!(out.code.starts_with(&Bootstrap::default().snippet()));
    assert_eq!(
        user_code(&out.code),
        "const fileSystem = require(\"fs\");\nfileSystem.readFileSync(void 0);\n"
    );
    let unmatched: Vec<_> = out.report.unmatched.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(unmatched, vec!["credentials", "os", "existsSync"]);
}

#[test]
fn every_import_form_becomes_require() {
    let source = "\
import \"./side-effect.js\";
import * as path from \"path\";
import { readFile, writeFile as write } from \"fs/promises\";
import chalk from \"chalk\";
import React, { useState } from \"react\";
run(path, readFile, write, chalk, React, useState);
";
    let out = transform(source, &PatchConfig::default()).unwrap();
    assert_eq!(
        user_code(&out.code),
        "\
require(\"./side-effect.js\");
const path = require(\"path\");
const { readFile, writeFile: write } = require(\"fs/promises\");
const chalk = require(\"chalk\");
const _imported = require(\"react\"); const React = _imported; const { useState } = _imported;
run(path, readFile, write, chalk, React, useState);
"
    );
    assert_eq!(out.report.imports_converted, 5);
}

#[test]
fn import_meta_properties() {
    let source = "const req = import.meta.require;\nconst url = import.meta.url;\nconst dir = import.meta.dirname;\n";
    let out = transform(source, &PatchConfig::default()).unwrap();
    assert_eq!(
        user_code(&out.code),
        "const req = require;\nconst url = require(\"url\").pathToFileURL(__filename).href;\nconst dir = __dirname;\n"
    );
    assert_eq!(out.report.meta_rewritten, 3);
}

#[test]
fn renamed_imports_keep_imported_names() {
    let rules = config("[rules]\nrename_identifiers = { readFile = \"read\", chalk = \"color\" }\n");
    let source = "import { readFile } from \"fs\";\nimport chalk from \"chalk\";\nreadFile(chalk);\n";
    let out = transform(source, &rules).unwrap();
    assert_eq!(
        user_code(&out.code),
        "const { readFile: read } = require(\"fs\");\nconst color = require(\"chalk\");\nread(color);\n"
    );
}

#[test]
fn rename_follows_scopes() {
    let rules = config("[rules]\nrename_identifiers = { token = \"secret\", ghost = \"spirit\" }\n");
    let source = "\
let token = load();
function check(token) {
  return token.length > 0;
}
console.log(token, window.token, { token });
ghost();
";
    let out = transform(source, &rules).unwrap();
    assert_eq!(
        user_code(&out.code),
        "\
let secret = load();
function check(secret) {
  return secret.length > 0;
}
console.log(secret, window.token, { token: secret });
ghost();
"
    );
    assert_eq!(out.report.bindings_renamed, 2);
    assert_eq!(out.report.unmatched.len(), 1);
    assert_eq!(out.report.unmatched[0].name, "ghost");
}

#[test]
fn exported_names_survive_renames() {
    let rules = config("[rules]\nrename_identifiers = { Store = \"Cache\", limit = \"max\" }\n");
    let source = "export class Store {}\nconst limit = 5;\nexport { limit };\nnew Store(limit);\n";
    let out = transform(source, &rules).unwrap();
    assert_eq!(
        user_code(&out.code),
        "class Cache {}\nexport { Cache as Store };\nconst max = 5;\nexport { max as limit };\nnew Cache(max);\n"
    );
}

#[test]
fn removal_rules_and_comments() {
    let rules = config(
        r#"
[rules]
remove_identifiers = ["autoUpdater", "legacy"]
remove_function_calls = ["checkForUpdates"]
"#,
    );
    let source = "\
// entry point
const autoUpdater = createUpdater();
function legacy() {
  checkForUpdates();
}
/* keep me */
async function main() {
  checkForUpdates();
  updater.checkForUpdates({ silent: true });
  const ok = checkForUpdates() && ready;
  start(ok);
}
";
    let out = transform(source, &rules).unwrap();
    assert_eq!(
        user_code(&out.code),
        "\
// entry point
/* keep me */
async function main() {
  const ok = void 0 && ready;
  start(ok);
}
"
    );
    assert_eq!(out.report.identifiers_removed, 2);
    assert_eq!(out.report.calls_removed, 3);
}

#[test]
fn body_replacement_from_json_config() {
    let rules = load_from_json_str(r#"{ "replaceFunctionBody": { "getChannel": "stable" } }"#).unwrap();
    let source = "\
function getChannel() {
  return fetchChannel();
}
const api = { getChannel: () => remote() };
";
    let out = transform(source, &rules).unwrap();
    assert_eq!(
        user_code(&out.code),
        "\
function getChannel() { return \"stable\"; }
const api = { getChannel: () => { return \"stable\"; } };
"
    );
    assert_eq!(out.report.bodies_replaced, 2);
}

#[test]
fn top_level_awaits_move_into_async_wrapper() {
    let rules = config("[rules]\nrename_identifiers = { db = \"store\" }\n");
    let source = "\
import db from \"./db.js\";
await db.connect();
async function later() {
  await db.close();
}
await import.meta.dirname;
console.log(\"ready\");
";
    let out = transform(source, &rules).unwrap();
    assert_eq!(
        user_code(&out.code),
        "\
const store = require(\"./db.js\");
async function later() {
  await store.close();
}
console.log(\"ready\");

;(async () => {
  await store.connect();
  await __dirname;
})();
"
    );
    assert_eq!(out.report.awaits_relocated, 2);
}

#[test]
fn relocated_await_keeps_terminator_outside_comment() {
    let out = transform("await warmUp() // prime caches
ready();
", &PatchConfig::default()).unwrap();
    let code = user_code(&out.code);
    assert!(code.contains("\n  await warmUp();"), "{code}");
    assert!(!code.contains("// prime caches;"), "{code}");
    assert_eq!(out.report.awaits_relocated, 1);
}

#[test]
fn recoverable_syntax_errors_are_tolerated() {
    let source = "const ok = 1;\nlet broken = ;\nok;\n";
    let out = transform(source, &PatchConfig::default()).unwrap();
    assert!(out.report.parse_errors > 0);
    assert_eq!(user_code(&out.code), source);
}

#[test]
fn unparseable_source_is_fatal() {
    let err = transform("}}}}\n", &PatchConfig::default()).unwrap_err();
    assert!(matches!(err, TransformError::Unparseable { .. }), "{err}");
}

#[test]
fn transform_is_stable_on_its_own_output_apart_from_the_bootstrap() {
    let rules = config("[rules]\nremove_function_calls = [\"checkForUpdates\"]\n");
    let first = transform("import a from \"a\";\ncheckForUpdates();\na();\n", &rules).unwrap();
    let body = user_code(&first.code).to_string();
    let second = transform(&body, &rules).unwrap();
    assert_eq!(user_code(&second.code), body);
    assert_eq!(second.report.total_rewrites(), 0);
}
