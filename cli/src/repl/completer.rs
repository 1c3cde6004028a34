use rustyline::completion::Pair;

use super::COMMANDS;

pub fn complete_line(line: &str, pos: usize, addresses: &[String]) -> (usize, Vec<Pair>) {
    let safe_pos = pos.min(line.len());
    let prefix = &line[..safe_pos];

    match prefix.split_once(' ') {
        None => {
            let commands = COMMANDS
                .iter()
                .map(|(name, _)| *name)
                .filter(|name| name.starts_with(prefix))
                .collect::<Vec<_>>();
            (0, pairs(&commands))
        }
        Some((command, arg)) if takes_address(command) => {
            let start = safe_pos - arg.len();
            let needle = arg.trim_start();
            let matches = addresses
                .iter()
                .map(String::as_str)
                .filter(|addr| addr.starts_with(needle))
                .collect::<Vec<_>>();
            (start + (arg.len() - needle.len()), pairs(&matches))
        }
        Some(_) => (safe_pos, Vec::new()),
    }
}

fn takes_address(command: &str) -> bool {
    COMMANDS
        .iter()
        .any(|(name, args)| *name == command && *args == "<addr>")
}

fn pairs(values: &[&str]) -> Vec<Pair> {
    values
        .iter()
        .map(|v| Pair {
            display: (*v).to_string(),
            replacement: (*v).to_string(),
        })
        .collect()
}
