//! Best-effort OS probe for the foreground process of a PTY's shell.
//!
//! The shell we spawn is the root of a small process tree; the interesting
//! program (an agent CLI, an editor) is the deepest live descendant. Every
//! failure path returns None and leaves the caller's prior view intact.

use super::ProcSnapshot;
use std::path::PathBuf;

pub fn snapshot(pid: u32) -> Option<ProcSnapshot> {
    let foreground = foreground_pid(pid)?;
    let program = program_of(foreground)?;
    let cwd = cwd_of(foreground);
    Some(ProcSnapshot { program, cwd })
}

#[cfg(target_os = "linux")]
fn foreground_pid(root: u32) -> Option<u32> {
    // Walk the children chain; the most recently started leaf is the
    // foreground job in practice.
    let mut current = root;
    loop {
        match last_child(current) {
            Some(child) => current = child,
            None => break,
        }
    }
    // Confirm the process still exists.
    if std::path::Path::new(&format!("/proc/{current}")).exists() {
        Some(current)
    } else {
        None
    }
}

#[cfg(target_os = "linux")]
fn last_child(pid: u32) -> Option<u32> {
    let tasks = std::fs::read_dir(format!("/proc/{pid}/task")).ok()?;
    let mut children: Vec<u32> = Vec::new();
    for task in tasks.flatten() {
        let path = task.path().join("children");
        if let Ok(contents) = std::fs::read_to_string(path) {
            children.extend(contents.split_whitespace().filter_map(|p| p.parse::<u32>().ok()));
        }
    }
    children.into_iter().max()
}

#[cfg(target_os = "linux")]
fn program_of(pid: u32) -> Option<String> {
    let comm = std::fs::read_to_string(format!("/proc/{pid}/comm")).ok()?;
    let name = comm.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(target_os = "linux")]
fn cwd_of(pid: u32) -> Option<PathBuf> {
    std::fs::read_link(format!("/proc/{pid}/cwd")).ok()
}

#[cfg(target_os = "macos")]
fn foreground_pid(root: u32) -> Option<u32> {
    let output = std::process::Command::new("ps")
        .args(["-axo", "pid=,ppid=,comm="])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let table = String::from_utf8_lossy(&output.stdout);

    let mut children: std::collections::HashMap<u32, Vec<u32>> = std::collections::HashMap::new();
    let mut seen = false;
    for line in table.lines() {
        let mut fields = line.split_whitespace();
        let (Some(pid), Some(ppid)) = (
            fields.next().and_then(|f| f.parse::<u32>().ok()),
            fields.next().and_then(|f| f.parse::<u32>().ok()),
        ) else {
            continue;
        };
        seen |= pid == root;
        children.entry(ppid).or_default().push(pid);
    }
    if !seen {
        return None;
    }

    let mut current = root;
    while let Some(kids) = children.get(&current) {
        match kids.iter().max() {
            Some(&next) => current = next,
            None => break,
        }
    }
    Some(current)
}

#[cfg(target_os = "macos")]
fn program_of(pid: u32) -> Option<String> {
    let output = std::process::Command::new("ps")
        .args(["-p", &pid.to_string(), "-o", "comm="])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let comm = String::from_utf8_lossy(&output.stdout);
    let name = comm.trim();
    if name.is_empty() {
        return None;
    }
    Some(super::program_name(name))
}

#[cfg(target_os = "macos")]
fn cwd_of(pid: u32) -> Option<PathBuf> {
    // lsof field output: lines prefixed 'n' carry the cwd path.
    let output = std::process::Command::new("lsof")
        .args(["-a", "-p", &pid.to_string(), "-d", "cwd", "-Fn"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout);
    text.lines()
        .find_map(|line| line.strip_prefix('n'))
        .map(PathBuf::from)
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn foreground_pid(_root: u32) -> Option<u32> {
    None
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn program_of(_pid: u32) -> Option<String> {
    None
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn cwd_of(_pid: u32) -> Option<PathBuf> {
    None
}
