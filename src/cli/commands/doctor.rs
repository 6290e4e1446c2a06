//! Doctor command - verify configuration, credentials and the dataset.

use crate::cli::Output;
use crate::config::{CanvasSettings, EmbeddingProvider, Settings};
use crate::dataset::Dataset;
use crate::timefmt::parse_timezone;
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

fn print_group(title: &str, checks: &[CheckResult]) {
    println!("{}", style(title).bold());
    for check in checks {
        check.print();
    }
    println!();
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("EduAI Doctor");
    println!();
    println!("Checking configuration and data...\n");

    let groups = [
        ("API Keys", check_api_keys(settings)),
        ("Data", check_data(settings)),
        ("Configuration", check_config(settings, config_path)),
    ];

    for (title, checks) in &groups {
        print_group(title, checks);
    }

    let checks: Vec<&CheckResult> = groups.iter().flat_map(|(_, c)| c).collect();
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using EduAI.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! EduAI is ready to use.");
    }

    Ok(())
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

fn check_api_keys(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let canvas = CanvasSettings::API_KEY_ENV;
    results.push(match settings.canvas.resolve_api_key() {
        Some(key) => CheckResult::ok(canvas, &format!("configured ({})", mask_key(&key))),
        None => CheckResult::warning(
            canvas,
            "not set",
            &format!("Needed for 'eduai fetch'. Set with: export {}='...'", canvas),
        ),
    });

    let chat = settings.chat.api_key_env.as_str();
    results.push(match settings.chat.resolve_api_key() {
        Some(key) => CheckResult::ok(chat, &format!("configured ({})", mask_key(&key))),
        None if settings.chat.api_base.is_none() => CheckResult::warning(
            chat,
            "not set, falling back to OPENAI_API_KEY",
            "Set chat.api_key_env to the variable holding your key",
        ),
        None => CheckResult::error(
            chat,
            "not set",
            &format!("Needed for chat. Set with: export {}='...'", chat),
        ),
    });

    if settings.embedding.provider == EmbeddingProvider::OpenAI {
        let embedding = settings.embedding.api_key_env.as_str();
        results.push(match settings.embedding.resolve_api_key() {
            Some(key) => {
                CheckResult::ok(embedding, &format!("configured ({})", mask_key(&key)))
            }
            None => CheckResult::error(
                embedding,
                "not set",
                "Needed for OpenAI embeddings, or set embedding.provider = \"local\"",
            ),
        });
    }

    results
}

fn check_data(settings: &Settings) -> Vec<CheckResult> {
    let path = settings.dataset_path();
    if !path.exists() {
        return vec![CheckResult::warning(
            "Dataset",
            &format!("{} (not fetched yet)", path.display()),
            "Run 'eduai fetch' to download your course data",
        )];
    }

    match Dataset::load(&path) {
        Ok(dataset) => {
            let size = std::fs::metadata(&path)
                .map(|m| format_size(m.len()))
                .unwrap_or_else(|_| "unknown size".to_string());
            vec![CheckResult::ok(
                "Dataset",
                &format!(
                    "{} ({}, {} courses)",
                    path.display(),
                    size,
                    dataset.courses.len()
                ),
            )]
        }
        Err(e) => vec![CheckResult::error(
            "Dataset",
            &format!("unreadable: {}", e),
            "Run 'eduai fetch' to rebuild it",
        )],
    }
}

fn check_config(settings: &Settings, config_path: &Path) -> Vec<CheckResult> {
    let mut results = Vec::new();

    results.push(if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: eduai config edit",
        )
    });

    results.push(match parse_timezone(&settings.time.timezone) {
        Ok(tz) => CheckResult::ok("Timezone", tz.name()),
        Err(_) => CheckResult::error(
            "Timezone",
            &format!("unknown timezone '{}'", settings.time.timezone),
            "Use an IANA name such as America/New_York",
        ),
    });

    results.push(match settings.canvas.cutoff() {
        Ok(cutoff) => CheckResult::ok("Cutoff date", &cutoff.to_rfc3339()),
        Err(_) => CheckResult::error(
            "Cutoff date",
            &format!("invalid '{}'", settings.canvas.cutoff_date),
            "Use RFC 3339, e.g. 2025-01-01T00:00:00Z",
        ),
    });

    results
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("short"), "****");
        assert_eq!(mask_key("7~abcdefghijklmnop"), "7~ab...mnop");
    }

    #[test]
    fn test_invalid_timezone_and_cutoff_are_errors() {
        let mut settings = Settings::default();
        settings.time.timezone = "Nowhere/Special".to_string();
        settings.canvas.cutoff_date = "January".to_string();

        let results = check_config(&settings, Path::new("/nonexistent/config.toml"));
        assert_eq!(results[0].status, CheckStatus::Warning);
        assert_eq!(results[1].status, CheckStatus::Error);
        assert_eq!(results[2].status, CheckStatus::Error);
    }

    #[test]
    fn test_dataset_checks() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        let mut settings = Settings::default();
        settings.dataset.path = path.to_string_lossy().to_string();

        assert_eq!(check_data(&settings)[0].status, CheckStatus::Warning);

        std::fs::write(&path, "not json").unwrap();
        assert_eq!(check_data(&settings)[0].status, CheckStatus::Error);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
    }
}
