// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier newtypes for jobs, runs, and action runs.
//!
//! Run identifiers are structural rather than random: a job run is
//! `{job}.{run_num}` and an action run is `{job}.{run_num}.{action}`.
//! Job and action names never contain dots, so the parts can always be
//! recovered by splitting from the right.

/// Returns a string slice truncated to at most `n` characters.
pub fn short(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

/// Define a newtype ID wrapper around `SmolStr`.
///
/// Generates `new()`, `from_string()`, `as_str()`, `short()`, `Display`,
/// `From<String>`, `From<&str>`, `PartialEq<str>`, `PartialEq<&str>`,
/// `Borrow<str>`, and `Deref` implementations.
///
/// ```ignore
/// define_id! {
///     /// Doc comment for the ID type.
///     pub struct JobName;
/// }
/// ```
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub smol_str::SmolStr);

        impl $name {
            pub fn new(id: impl Into<smol_str::SmolStr>) -> Self {
                Self(id.into())
            }

            /// Create ID from existing string (for parsing/deserialization)
            pub fn from_string(id: impl Into<smol_str::SmolStr>) -> Self {
                Self(id.into())
            }

            #[allow(dead_code)]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns the ID truncated to at most `n` characters.
            pub fn short(&self, n: usize) -> &str {
                $crate::id::short(&self.0, n)
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::from_string(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::from_string(s)
            }
        }

        impl From<&String> for $name {
            fn from(s: &String) -> Self {
                Self::from_string(s.as_str())
            }
        }

        impl From<&$name> for $name {
            fn from(id: &$name) -> Self {
                id.clone()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                &self.0
            }
        }
    };
}

crate::define_id! {
    /// Unique name of a job, e.g. `nightly_backup`.
    pub struct JobName;
}

crate::define_id! {
    /// Identifier of one run of a job: `{job}.{run_num}`.
    pub struct JobRunId;
}

crate::define_id! {
    /// Identifier of one action within a job run: `{job}.{run_num}.{action}`.
    pub struct ActionRunId;
}

impl JobRunId {
    pub fn for_run(job: &JobName, run_num: u32) -> Self {
        Self::new(format!("{job}.{run_num}"))
    }

    /// Split into the owning job name and run number.
    pub fn parts(&self) -> Option<(JobName, u32)> {
        let (job, num) = self.0.rsplit_once('.')?;
        if job.is_empty() {
            return None;
        }
        Some((JobName::new(job), num.parse().ok()?))
    }

    pub fn job_name(&self) -> Option<JobName> {
        self.parts().map(|(job, _)| job)
    }
}

impl ActionRunId {
    pub fn for_action(run: &JobRunId, action: &str) -> Self {
        Self::new(format!("{run}.{action}"))
    }

    /// Split into the owning job run and the action name.
    pub fn parts(&self) -> Option<(JobRunId, &str)> {
        let (run, action) = self.0.rsplit_once('.')?;
        let run = JobRunId::new(run);
        run.parts()?;
        Some((run, action))
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
