//! Print the contents of `src/scripts.rs`
//!
//! Run from the workspace root after `cargo build`:
//!
//! ```plain
//! $ cargo run -p make-docs > src/scripts.rs
//! ```

use std::io::{self, Write};
use std::process::Command;

struct Check {
    name: &'static str,
    about: &'static str,
}

const CHECKS: &[Check] = &[
    Check {
        name: "check-cswch",
        about: "Linux-only. Reads the `ctxt` counter from /proc/stat.",
    },
    Check {
        name: "check-intr",
        about: "Linux-only. Reads the `intr` counter from /proc/stat.",
    },
    Check {
        name: "check-load",
        about: "Linux-only. Reads /proc/loadavg, and /proc/stat with `--percpu`.",
    },
];

fn main() -> io::Result<()> {
    let preamble = "Documentation about the various scripts contained herein\n";

    let mut out = cp(preamble.split('\n'));
    out.push('\n');
    out.push_str(&cp(CHECKS.iter().map(|c| format!("- [{0}](#{0})", c.name))));
    out.push('\n');
    for check in CHECKS {
        out.push_str(&format!(
            "\
//!
//! # {0}
//!
//! {1}
//!
//! ```plain
//! $ {0} --help
",
            check.name, check.about
        ));
        out.push_str(&cp(help_text(check)?.split('\n')));
        out.push_str("\n//! ```\n");
    }
    out.push('\n');
    io::stdout().write_all(out.as_bytes())
}

/// Run the debug build of `check` with `--help`
fn help_text(check: &Check) -> io::Result<String> {
    let output = Command::new(format!("target/debug/{}", check.name))
        .arg("--help")
        .output()
        .map_err(|e| io::Error::new(e.kind(), format!("couldn't execute {}: {}", check.name, e)))?;
    String::from_utf8(output.stdout).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{} --help is not utf8: {}", check.name, e),
        )
    })
}

/// Comment each line in the iterator
fn cp<S: AsRef<str>, I: Iterator<Item = S>>(s: I) -> String {
    s.map(|s| format!("//! {}", s.as_ref()))
        .map(|s| s.trim().into())
        .collect::<Vec<String>>()
        .join("\n")
}
