//! Credential bootstrap prepended to every transformed program.
//!
//! The snippet is an explicit initialization routine that runs once, before
//! any of the program's own top-level code: when the per-user credential
//! file is absent and the API key variable is unset, it sets the variable to
//! a placeholder so the program starts in offline mode.

use serde::{Deserialize, Serialize};
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Bootstrap {
    /// Credential file, relative to the user's home directory.
    pub credentials_file: String,
    /// Environment variable holding the API key.
    pub env_var: String,
    /// Value assigned when neither credential source is present.
    pub placeholder: String,
}

impl Default for Bootstrap {
    fn default() -> Self {
        Self {
            credentials_file: ".credentials.json".to_string(),
            env_var: "API_KEY".to_string(),
            placeholder: "offline-placeholder".to_string(),
        }
    }
}

/// Source text with the bootstrap snippet in place.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub text: String,
    /// Byte range of the snippet; no rewrite may touch it.
    pub protected: Range<usize>,
}

impl Prepared {
    /// First byte of the user's own code.
    pub fn user_start(&self) -> usize {
        self.protected.end
    }

    pub fn is_protected(&self, range: &Range<usize>) -> bool {
        range.start < self.protected.end && range.end > self.protected.start
    }
}

fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

impl Bootstrap {
    pub fn snippet(&self) -> String {
        let file = js_string(&self.credentials_file);
        let var = js_string(&self.env_var);
        let placeholder = js_string(&self.placeholder);
        format!(
            "(() => {{\n\
             \x20 const fs = require(\"fs\");\n\
             \x20 const path = require(\"path\");\n\
             \x20 const os = require(\"os\");\n\
             \x20 const credentials = path.join(os.homedir(), {file});\n\
             \x20 if (!fs.existsSync(credentials) && !process.env[{var}]) {{\n\
             \x20   process.env[{var}] = {placeholder};\n\
             \x20 }}\n\
             }})();\n"
        )
    }

    /// Prepend the snippet, keeping a `#!` line first.
    pub fn prepend(&self, source: &str) -> Prepared {
        let snippet = self.snippet();
        let (head, rest) = split_hashbang(source);

        let mut text = String::with_capacity(source.len() + snippet.len() + 1);
        text.push_str(head);
        if !head.is_empty() && !head.ends_with('\n') {
            text.push('\n');
        }
        let start = text.len();
        text.push_str(&snippet);
        let end = text.len();
        text.push_str(rest);

        Prepared {
            text,
            protected: start..end,
        }
    }
}

fn split_hashbang(source: &str) -> (&str, &str) {
    if !source.starts_with("#!") {
        return ("", source);
    }
    match source.find('\n') {
        Some(idx) => source.split_at(idx + 1),
        None => (source, ""),
    }
}
