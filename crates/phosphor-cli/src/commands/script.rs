use std::path::Path;

use phosphor_core::ScriptLine;

pub fn run(config_path: Option<&Path>, script_path: Option<&Path>) {
    let mut config = super::load_config(config_path).unwrap_or_else(|e| super::fail(e));
    if let Some(path) = script_path {
        config.script = Some(path.to_path_buf());
    }
    let lines = config.script_lines().unwrap_or_else(|e| super::fail(e));

    match render(&lines) {
        Ok(s) => println!("{s}"),
        Err(e) => super::fail(e),
    }
    eprintln!(
        "{} lines, {} typed, completes at {}ms",
        lines.len(),
        lines.iter().filter(|l| l.typed).count(),
        config.boot.total_ms
    );
}

fn render(lines: &[ScriptLine]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(lines)
}
