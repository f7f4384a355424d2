use rand::RngCore;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTag {
    /// Runs the FFmpeg executable
    Ffmpeg,
    /// Produces the user-visible output file
    Output,
}

/// Position of a plan in its pass topology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Single,
    First,
    Second,
}

impl Pass {
    /// FFmpeg pass number, `None` for single-pass encodes
    pub fn number(self) -> Option<u8> {
        match self {
            Pass::Single => None,
            Pass::First => Some(1),
            Pass::Second => Some(2),
        }
    }

    /// Whether this pass writes the real output (and so gets the muxing tail)
    pub fn is_final(self) -> bool {
        !matches!(self, Pass::First)
    }
}

/// One external-process invocation: executable plus a final argument vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationPlan {
    pub name: String,
    pub executable: String,
    pub args: Vec<String>,
    /// A failure of this plan must stop the remaining plans
    pub abort_on_failure: bool,
    pub tags: BTreeSet<PlanTag>,
}

impl InvocationPlan {
    pub fn is_output(&self) -> bool {
        self.tags.contains(&PlanTag::Output)
    }

    /// Value passed to `-passlogfile`, if any
    pub fn pass_log(&self) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == "-passlogfile")
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    /// Build a process command. Arguments are passed as-is, never re-split.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.args(&self.args);
        cmd
    }

    /// Shell-quoted preview for humans
    pub fn display(&self) -> String {
        let mut out = quote(&self.executable);
        for arg in &self.args {
            let _ = write!(out, " {}", quote(arg));
        }
        out
    }
}

fn quote(token: &str) -> String {
    match shlex::try_quote(token) {
        Ok(quoted) => quoted.into_owned(),
        // Tokens with NUL bytes cannot be quoted; show them raw
        Err(_) => token.to_string(),
    }
}

/// Temp-file path shared by both passes of one two-pass encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassLogHandle {
    path: PathBuf,
}

impl PassLogHandle {
    pub fn new(temp_dir: &Path) -> Self {
        Self::with_rng(temp_dir, &mut rand::thread_rng())
    }

    /// Same as `new` with a caller-provided RNG (seeded in tests for stable names)
    pub fn with_rng<R: RngCore + ?Sized>(temp_dir: &Path, rng: &mut R) -> Self {
        let mut token = [0u8; 10];
        rng.fill_bytes(&mut token);
        let hex: String = token.iter().map(|b| format!("{:02x}", b)).collect();
        Self {
            path: temp_dir.join(format!("pass_log_file_{}.log", hex)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn as_arg(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

/// Argument accumulator that never produces empty tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgList {
    args: Vec<String>,
}

impl ArgList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push one token; blank tokens are dropped
    pub fn arg(&mut self, token: impl Into<String>) -> &mut Self {
        let token = token.into();
        if !token.trim().is_empty() {
            self.args.push(token);
        }
        self
    }

    /// Push `name value`; both are dropped when the value is blank
    pub fn flag(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        if !value.trim().is_empty() {
            self.args.push(name.to_string());
            self.args.push(value);
        }
        self
    }

    pub fn flag_opt<T: ToString>(&mut self, name: &str, value: Option<T>) -> &mut Self {
        if let Some(value) = value {
            self.flag(name, value.to_string());
        }
        self
    }

    pub fn extend<I, S>(&mut self, tokens: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for token in tokens {
            self.arg(token);
        }
        self
    }

    pub fn as_slice(&self) -> &[String] {
        &self.args
    }

    pub fn into_vec(self) -> Vec<String> {
        self.args
    }
}
