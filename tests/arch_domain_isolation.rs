use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Domain pairs allowed to import each other. Everything else is a layering
/// violation: the leaf domains stay independent so they can be tested and
/// reasoned about in isolation.
const CROSS_DOMAIN_ALLOWLIST: &[(&str, &str)] = &[
    ("activity", "terminal"), // heuristics strip escapes before classifying
    ("sessions", "terminal"), // the registry owns PTY lifecycle
    ("sessions", "agents"),   // launch detection and log locators
    ("sessions", "activity"), // listInfo derives last-output lines
];

struct Violation {
    file: PathBuf,
    import: String,
}

#[test]
fn no_unexpected_cross_domain_imports() {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let root = manifest_dir.join("src/domains");
    let use_regex = Regex::new(r"(?s)use\s+crate::([^;]+);").expect("regex");
    let domain_regex = Regex::new(r"domains::([a-z_]+)").expect("regex");

    let mut violations = Vec::new();

    for entry in WalkDir::new(&root).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file()
            || entry.path().extension().and_then(|ext| ext.to_str()) != Some("rs")
        {
            continue;
        }
        let Some(source_domain) = domain_of(manifest_dir, entry.path()) else {
            continue;
        };
        let Ok(content) = fs::read_to_string(entry.path()) else {
            continue;
        };

        let mut seen = HashSet::new();
        for caps in use_regex.captures_iter(&content) {
            let import = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            for domain_caps in domain_regex.captures_iter(import) {
                let target = domain_caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                if target == source_domain || !seen.insert(target.to_string()) {
                    continue;
                }
                let allowed = CROSS_DOMAIN_ALLOWLIST
                    .iter()
                    .any(|(src, dst)| *src == source_domain && *dst == target);
                if !allowed {
                    violations.push(Violation {
                        file: entry
                            .path()
                            .strip_prefix(manifest_dir)
                            .unwrap_or(entry.path())
                            .to_path_buf(),
                        import: format!("{source_domain} -> {target}"),
                    });
                }
            }
        }
    }

    assert!(
        violations.is_empty(),
        "cross-domain import violations:\n{}",
        violations
            .iter()
            .map(|v| format!("  {}: {}", v.file.display(), v.import))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

fn domain_of(manifest_dir: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(manifest_dir).ok()?;
    let mut components = relative.components();
    loop {
        match components.next()? {
            Component::Normal(name) if name == "domains" => {
                if let Component::Normal(domain) = components.next()? {
                    return Some(domain.to_string_lossy().to_string());
                }
                return None;
            }
            _ => continue,
        }
    }
}
