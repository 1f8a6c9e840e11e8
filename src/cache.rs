//! Thread-local cache of compiled ast-grep patterns.
//!
//! Every transformed document runs the same `import.meta` patterns, so
//! each is compiled once per thread. The cache holds at most 256 patterns
//! and starts over when full.

use ast_grep_core::Pattern;
use ast_grep_language::SupportLang;
use std::cell::RefCell;
use std::collections::HashMap;

const MAX_CACHE_ENTRIES: usize = 256;

thread_local! {
    static PATTERN_CACHE: RefCell<HashMap<String, Pattern>> =
        RefCell::new(HashMap::new());
}

/// Compiled `pattern` for `lang`, from the cache when possible.
pub fn get_or_compile_pattern(pattern: &str, lang: SupportLang) -> Pattern {
    PATTERN_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        let key = format!("{lang:?}:{pattern}");
        if let Some(compiled) = cache.get(&key) {
            return compiled.clone();
        }
        if cache.len() >= MAX_CACHE_ENTRIES {
            cache.clear();
        }
        let compiled = Pattern::new(pattern, lang);
        cache.insert(key, compiled.clone());
        compiled
    })
}
