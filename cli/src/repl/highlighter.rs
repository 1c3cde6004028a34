use std::borrow::Cow;

use owo_colors::OwoColorize;

use super::COMMANDS;

pub fn highlight_line(line: &str) -> Cow<'_, str> {
    let (command, rest) = match line.find(' ') {
        Some(split) => line.split_at(split),
        None => (line, ""),
    };
    if !COMMANDS.iter().any(|(name, _)| *name == command) {
        return Cow::Borrowed(line);
    }

    let rest = rest
        .split(' ')
        .map(|word| {
            if word.starts_with("0x") {
                word.cyan().to_string()
            } else {
                word.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    Cow::Owned(format!("{}{rest}", command.blue().bold()))
}

pub fn highlight_prompt(prompt: &str) -> Cow<'_, str> {
    if prompt == "> " {
        return Cow::Owned(format!("{} ", ">".bright_green().bold()));
    }
    Cow::Borrowed(prompt)
}

pub fn highlight_hint(hint: &str) -> Cow<'_, str> {
    Cow::Owned(hint.bright_black().to_string())
}
