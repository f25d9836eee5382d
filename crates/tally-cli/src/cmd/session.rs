//! `tally session` — interactive counting session on one count.
//!
//! Undo history lives in memory and is scoped to the session, so the
//! counting commands run inside a line-oriented loop that keeps a single
//! store alive. Commands read from stdin, one per line, until `quit` or EOF.

use crate::output::OutputMode;
use clap::Args;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::str::FromStr;
use tally_core::Store;
use tally_core::bus::{EventKind, StoreEvent};
use tally_core::model::CountField;

#[derive(Args, Debug)]
pub struct SessionArgs {
    /// Count id to work on.
    pub id: String,
}

const HELP: &str = "\
commands:
  list                    show items (filtered view, incomplete first)
  inc <item> <field> [n]  add n (default 1) to cases|inners|individuals
  dec <item> <field> [n]  subtract n, clamped at zero
  done <item>             toggle an item's completed flag
  undo / redo             step through the session history
  history                 list restorable history entries
  restore <entry>         jump back to a history entry
  filter [text]           set or clear the item filter
  done-only on|off        show only completed items
  stats                   progress summary
  quit                    end the session";

pub fn run_session(args: &SessionArgs, _mode: OutputMode, data_dir: &Path) -> anyhow::Result<()> {
    let mut store = super::open_store(data_dir)?;
    super::require_count(&store, &args.id)?;
    store.show_count_view(&args.id);

    store.bus_mut().subscribe(EventKind::Notification, |event| {
        if let StoreEvent::Notification { text } = event {
            println!("· {text}");
        }
    });
    store.bus_mut().subscribe(EventKind::Celebration, |_| {
        println!("★ All items completed!");
    });

    let stdin = io::stdin();
    let mut out = io::stdout();
    writeln!(out, "counting \"{}\" (type help for commands)", args.id)?;

    for line in stdin.lock().lines() {
        let line = line?;
        match dispatch(&mut store, line.trim()) {
            Ok(Reply::Continue) => {}
            Ok(Reply::Quit) => break,
            Err(err) => eprintln!("error: {err}"),
        }
        out.flush()?;
    }
    Ok(())
}

enum Reply {
    Continue,
    Quit,
}

fn dispatch(store: &mut Store, line: &str) -> anyhow::Result<Reply> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(Reply::Continue);
    };
    let rest: Vec<&str> = words.collect();

    match command {
        "help" => println!("{HELP}"),
        "quit" | "exit" => return Ok(Reply::Quit),
        "list" => print_items(store),
        "stats" => print_stats(store),
        "inc" | "dec" => {
            let (index, field, amount) = parse_adjustment(&rest)?;
            let delta = if command == "inc" { amount } else { -amount };
            store.change_value(index, field, delta)?;
            print_item(store, index);
        }
        "done" => {
            let index = parse_index(rest.first().copied())?;
            store.toggle_completed(index)?;
            print_item(store, index);
        }
        "undo" => store.undo()?,
        "redo" => store.redo()?,
        "history" => print_history(store),
        "restore" => {
            let index = parse_index(rest.first().copied())?;
            store.restore_from_history(index)?;
        }
        "filter" => store.set_filter(rest.first().copied().unwrap_or("")),
        "done-only" => match rest.first().copied() {
            Some("on") => store.set_show_only_done(true),
            Some("off") => store.set_show_only_done(false),
            _ => anyhow::bail!("usage: done-only on|off"),
        },
        other => anyhow::bail!("unknown command \"{other}\" (type help)"),
    }
    Ok(Reply::Continue)
}

fn parse_index(word: Option<&str>) -> anyhow::Result<usize> {
    word.ok_or_else(|| anyhow::anyhow!("missing item number"))?
        .parse()
        .map_err(|_| anyhow::anyhow!("item number must be a non-negative integer"))
}

fn parse_adjustment(rest: &[&str]) -> anyhow::Result<(usize, CountField, i64)> {
    let index = parse_index(rest.first().copied())?;
    let field = rest
        .get(1)
        .ok_or_else(|| anyhow::anyhow!("missing field (cases|inners|individuals)"))?;
    let field = CountField::from_str(field).map_err(|err| anyhow::anyhow!("{err}"))?;
    let amount: i64 = match rest.get(2) {
        Some(word) => word
            .parse()
            .map_err(|_| anyhow::anyhow!("amount must be an integer"))?,
        None => 1,
    };
    Ok((index, field, amount))
}

fn print_items(store: &Store) {
    for (index, item) in store.filtered_items() {
        let mark = if item.completed { "x" } else { " " };
        println!(
            "{index:>3} [{mark}] {:<10} {:<30} cases {:>4}  inners {:>4}  singles {:>4}",
            item.pos_id, item.item_name, item.cases, item.inners, item.individuals
        );
    }
}

fn print_item(store: &Store, index: usize) {
    let Some(item) = store.current_count().and_then(|count| count.items.get(index)) else {
        return;
    };
    let mark = if item.completed { "x" } else { " " };
    println!(
        "{index:>3} [{mark}] {:<10} cases {:>4}  inners {:>4}  singles {:>4}",
        item.pos_id, item.cases, item.inners, item.individuals
    );
}

fn print_stats(store: &Store) {
    let Some(count) = store.current_count() else {
        return;
    };
    let stats = count.stats();
    println!(
        "{} items, {} done, {} to go ({} counted)",
        stats.total, stats.completed, stats.incomplete, stats.with_counts
    );
}

fn print_history(store: &Store) {
    let entries = store.history().past();
    if entries.is_empty() {
        println!("no history yet");
        return;
    }
    for (index, snapshot) in entries.iter().enumerate() {
        let stats = snapshot.state.stats();
        println!(
            "{index:>3}  {}  {} done / {} items",
            snapshot.timestamp.format("%H:%M:%S"),
            stats.completed,
            stats.total
        );
    }
}
