mod completer;
mod helper;
mod highlighter;
mod hinter;

use heapscope::dump::{Edge, HeapGraph};
use heapscope::{GcRef, Inspector, NodeId, Runtime, snapshot};
use owo_colors::OwoColorize;
use rustyline::error::ReadlineError;
use rustyline::{Config, EditMode, Editor};

use self::helper::ReplHelper;

pub(crate) const COMMANDS: [(&str, &str); 9] = [
    (".help", ""),
    (".load", "<snapshot.json>"),
    (".stats", ""),
    (".roots", ""),
    (".children", "<addr>"),
    (".parents", "<addr>"),
    (".path", "<addr>"),
    (".unreached", ""),
    (".exit", ""),
];

struct Session {
    inspector: Inspector,
    loaded: Option<(Runtime, HeapGraph)>,
}

pub fn run(inspector: Inspector, loaded: Option<(Runtime, HeapGraph)>) -> Result<(), ReadlineError> {
    let config = Config::builder()
        .history_ignore_dups(true)?
        .completion_type(rustyline::CompletionType::List)
        .edit_mode(EditMode::Emacs)
        .build();

    let mut rl: Editor<ReplHelper, rustyline::history::DefaultHistory> =
        Editor::with_config(config)?;
    let mut session = Session { inspector, loaded };
    rl.set_helper(Some(ReplHelper::new(session.addresses())));

    println!(
        "{} {}",
        "heapscope explorer".bright_cyan().bold(),
        env!("CARGO_PKG_VERSION").bright_black()
    );
    println!("{}", "Type .help for commands".bright_black());

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                if trimmed == ".exit" || trimmed == "exit" {
                    break;
                }
                if session.handle_command(trimmed) {
                    if let Some(helper) = rl.helper_mut() {
                        helper.set_addresses(session.addresses());
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "^C".yellow());
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "bye".bright_black());
                break;
            }
            Err(err) => {
                eprintln!("{} {err}", "repl error:".red().bold());
                break;
            }
        }
    }

    Ok(())
}

impl Session {
    /// Runs one command. Returns `true` when a new snapshot was loaded.
    fn handle_command(&mut self, trimmed: &str) -> bool {
        let (command, arg) = match trimmed.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (trimmed, ""),
        };

        if command == ".help" {
            for (name, args) in COMMANDS {
                println!("{}", format!("{name:<10} {args}").bright_blue());
            }
            return false;
        }
        if command == ".load" {
            return self.load(arg);
        }

        let Some((runtime, graph)) = &self.loaded else {
            eprintln!("{}", "no snapshot loaded; use .load <file>".yellow());
            return false;
        };

        match command {
            ".stats" => {
                crate::print_summary(&heapscope::report::Summary::new(graph, runtime.heap()))
            }
            ".roots" => print_edge_list(graph.roots()),
            ".unreached" => crate::print_unreached(graph, runtime),
            ".children" | ".parents" | ".path" => {
                let Some(object) = parse_address(arg) else {
                    eprintln!("{} '{}'", "not an address:".red().bold(), arg);
                    return false;
                };
                match command {
                    ".children" => print_edge_list(graph.children(NodeId::Object(object))),
                    ".parents" => print_edge_list(graph.parents_of(object).into_iter()),
                    _ => match graph.retention_path(object) {
                        Some(path) => print_edge_list(path.into_iter()),
                        None => println!("{} is not reachable", object.to_string().red()),
                    },
                }
            }
            _ => eprintln!("{} {command}", "unknown command:".red().bold()),
        }
        false
    }

    fn load(&mut self, path: &str) -> bool {
        let loaded = snapshot::load_file(path)
            .map_err(heapscope::errors::HeapScopeError::from)
            .and_then(|runtime| {
                let graph = self.inspector.inspect(&runtime)?;
                Ok((runtime, graph))
            });
        match loaded {
            Ok((runtime, graph)) => {
                println!(
                    "{} {} objects reachable",
                    "loaded".green(),
                    graph.object_count()
                );
                self.loaded = Some((runtime, graph));
                true
            }
            Err(err) => {
                eprintln!("{:?}", miette::Report::new(err));
                false
            }
        }
    }

    fn addresses(&self) -> Vec<String> {
        self.loaded
            .as_ref()
            .map(|(_, graph)| graph.visited().map(|gc| gc.to_string()).collect())
            .unwrap_or_default()
    }
}

fn print_edge_list<'g>(edges: impl Iterator<Item = Edge<'g>>) {
    let mut any = false;
    for edge in edges {
        any = true;
        println!(
            "  {} {} {} {} {}",
            edge.parent.to_string().cyan(),
            "->".bright_black(),
            edge.child.to_string().cyan(),
            format!(": {}", edge.kind).yellow(),
            format!("{{ {} }}", edge.label).bright_white()
        );
    }
    if !any {
        println!("{}", "  (none)".bright_black());
    }
}

pub(crate) fn parse_address(text: &str) -> Option<GcRef> {
    let address = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok()?,
        None => text.parse().ok()?,
    };
    Some(GcRef::from_address(address))
}
