use super::COMMANDS;

pub fn hint_for(line: &str, pos: usize) -> Option<String> {
    if pos < line.len() {
        return None;
    }

    let trimmed = line.trim_start();
    if !trimmed.starts_with('.') || trimmed.contains(' ') {
        return None;
    }

    if let Some((_, args)) = COMMANDS.iter().find(|(name, _)| *name == trimmed) {
        return (!args.is_empty()).then(|| format!(" {args}"));
    }

    let mut candidates = COMMANDS.iter().filter(|(name, _)| name.starts_with(trimmed));
    let (name, _) = candidates.next()?;
    if candidates.next().is_some() {
        return None;
    }
    Some(name[trimmed.len()..].to_string())
}
