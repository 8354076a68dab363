// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command template interpolation

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Regex pattern for `${name}`, with an optional day offset: `${shortdate-1}`
// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
pub static VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([a-zA-Z_][a-zA-Z0-9_]*)(?:([+-])(\d{1,6}))?\}")
        .expect("constant regex pattern is valid")
});

/// Interpolate `${name}` placeholders with values from the vars map.
///
/// Offsets are not meaningful for plain maps; `${name+1}` is left as-is.
/// Unknown variables are left as-is.
pub fn interpolate(template: &str, vars: &HashMap<String, String>) -> String {
    interpolate_with(template, |name, offset| match offset {
        0 => vars.get(name).cloned(),
        _ => None,
    })
}

/// Interpolate placeholders through a resolver taking the variable name and
/// its signed offset (0 when absent). Unresolved placeholders are left as-is.
pub fn interpolate_with<F>(template: &str, resolve: F) -> String
where
    F: Fn(&str, i64) -> Option<String>,
{
    VAR_PATTERN
        .replace_all(template, |caps: &regex::Captures| {
            let name = &caps[1];
            let offset = match (caps.get(2), caps.get(3)) {
                (Some(sign), Some(n)) => {
                    let n: i64 = n.as_str().parse().unwrap_or(0);
                    if sign.as_str() == "-" {
                        -n
                    } else {
                        n
                    }
                }
                _ => 0,
            };
            resolve(name, offset).unwrap_or_else(|| caps[0].to_string())
        })
        .to_string()
}

/// Names of every variable referenced by `template`, in order of appearance.
pub fn variables(template: &str) -> Vec<&str> {
    VAR_PATTERN
        .captures_iter(template)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
