#![allow(dead_code)]

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use portable_pty::CommandBuilder;
use portable_pty::PtySize;
use portable_pty::native_pty_system;
use regex_lite::Regex;

pub const ABSOLUTE_PREFIX: &str = r"\[\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\]";

pub fn ets_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_ets"))
}

/// Build one of the `ets-test-fixtures` binaries and return its path.
pub fn fixture(name: &str) -> anyhow::Result<PathBuf> {
    let run = escargot::CargoBuild::new()
        .package("ets-test-fixtures")
        .bin(name)
        .current_release()
        .current_target()
        .run()
        .with_context(|| format!("failed to build fixture {name}"))?;
    Ok(run.path().to_path_buf())
}

pub fn fixture_arg(name: &str) -> anyhow::Result<String> {
    Ok(fixture(name)?.display().to_string())
}

#[derive(Debug)]
pub struct ParsedLine {
    pub raw: String,
    pub prefix: Option<String>,
    pub output: String,
}

/// Split `output` into lines of the form `<prefix> <output>`, where prefix
/// must match `prefix_pattern`. A trailing CR on each line is ignored.
pub fn parse_output(output: &[u8], prefix_pattern: &str) -> anyhow::Result<Vec<ParsedLine>> {
    let line_pattern = Regex::new(&format!("^(?P<prefix>{prefix_pattern}) (?P<output>.*)$"))?;
    let text = String::from_utf8_lossy(output);
    let mut lines: Vec<&str> = text.split('\n').collect();
    if lines.last() == Some(&"") {
        lines.pop();
    }
    Ok(lines
        .into_iter()
        .map(|line| {
            let line = line.strip_suffix('\r').unwrap_or(line);
            match line_pattern.captures(line) {
                Some(caps) => ParsedLine {
                    raw: line.to_string(),
                    prefix: caps.name("prefix").map(|m| m.as_str().to_string()),
                    output: caps
                        .name("output")
                        .map(|m| m.as_str().to_string())
                        .unwrap_or_default(),
                },
                None => ParsedLine {
                    raw: line.to_string(),
                    prefix: None,
                    output: String::new(),
                },
            }
        })
        .collect())
}

/// Parse and return only the outputs, failing on any line without a prefix.
pub fn outputs(output: &[u8], prefix_pattern: &str) -> anyhow::Result<Vec<String>> {
    let parsed = parse_output(output, prefix_pattern)?;
    if let Some(bad) = parsed.iter().find(|line| line.prefix.is_none()) {
        anyhow::bail!("unexpected line: {:?}", bad.raw);
    }
    Ok(parsed.into_iter().map(|line| line.output).collect())
}

/// Run ets with `args` inside a pty of the given size and collect everything
/// it writes.
pub fn run_ets_in_pty(args: &[String], cols: u16, rows: u16) -> anyhow::Result<Vec<u8>> {
    let pair = native_pty_system().openpty(PtySize {
        rows,
        cols,
        pixel_width: 0,
        pixel_height: 0,
    })?;
    let mut command = CommandBuilder::new(ets_path());
    command.args(args);
    if let Ok(cwd) = std::env::current_dir() {
        command.cwd(cwd);
    }
    let mut child = pair.slave.spawn_command(command)?;
    drop(pair.slave);

    let mut reader = pair.master.try_clone_reader()?;
    let mut output = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => output.extend_from_slice(&buf[..n]),
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            // EIO once ets has exited and the slave side is closed.
            Err(_) => break,
        }
    }
    child.wait()?;
    Ok(output)
}
