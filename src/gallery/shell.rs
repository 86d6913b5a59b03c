//! Terminal front end for the gallery.
//!
//! Owns the single `GalleryState` of the session, turns typed commands into
//! actions, performs the effects the controller asks for, and renders the
//! grid or the viewer as text after every step.

use super::{
    api::{GalleryClient, ListingError},
    controller::{Action, Effect, GalleryState, LoadPhase, PageSize},
    location::Bookmark,
    permalink::{PermalinkClassifier, ThreeSegmentClassifier},
    viewer::{Direction, ViewerAction},
};
use crate::config::BrowseArgs;
use anyhow::{Context, Result};
use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{self, Clear, ClearType},
};
use reqwest::Url;
use std::{
    fmt::Write as _,
    io::{self, Write},
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio_util::sync::CancellationToken;
use tracing::info;

const DEFAULT_SURFACE_WIDTH: u32 = 80;

const HELP: &str = "\
commands:
  n | next          next page
  p | prev          previous page
  size <n>          items per page (16, 32, 64, 128)
  open <n>          open item <n> of this page in the viewer
  click <column>    click the viewer at <column>; left half = previous, right half = next
  < | >             previous or next item in the viewer
  close             close the viewer
  reload            enumerate the bucket again
  help              this text
  q | quit          leave";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Next,
    Prev,
    Size(PageSize),
    Open(usize),
    Click(u32),
    Step(Direction),
    Close,
    Reload,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let mut parts = line.split_whitespace();
    let Some(word) = parts.next() else {
        return Err(String::new());
    };
    let arg = parts.next();

    let command = match (word, arg) {
        ("n" | "next", None) => Command::Next,
        ("p" | "prev", None) => Command::Prev,
        ("size", Some(n)) => Command::Size(n.parse()?),
        ("open", Some(n)) => match n.parse::<usize>() {
            Ok(i) if i >= 1 => Command::Open(i),
            _ => return Err(format!("`{}` is not an item number", n)),
        },
        ("click", Some(x)) => Command::Click(
            x.parse()
                .map_err(|_| format!("`{}` is not a column", x))?,
        ),
        ("<", None) => Command::Step(Direction::Prev),
        (">", None) => Command::Step(Direction::Next),
        ("close", None) => Command::Close,
        ("reload", None) => Command::Reload,
        ("help" | "?", None) => Command::Help,
        ("q" | "quit", None) => Command::Quit,
        _ => return Err(format!("unknown command `{}`, try `help`", line.trim())),
    };
    if parts.next().is_some() {
        return Err(format!("too many arguments in `{}`", line.trim()));
    }
    Ok(command)
}

struct Session {
    client: GalleryClient,
    classifier: ThreeSegmentClassifier,
    location: Bookmark,
    items_per_page: PageSize,
}

impl Session {
    /// Mount a fresh controller from the current location and load it.
    ///
    /// `None` when the user interrupted the load.
    async fn mount(&self) -> Result<Option<GalleryState>> {
        let state = GalleryState::mount(&self.location, self.items_per_page);
        print_screen(&self.render(&state))?;

        let cancel = CancellationToken::new();
        let watcher = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            })
        };
        let outcome = self.client.fetch_listing(&cancel).await;
        watcher.abort();

        if let Err(ListingError::Cancelled) = outcome {
            info!("listing interrupted, leaving");
            return Ok(None);
        }
        let (state, _) = state.update(Action::Loaded(outcome));
        Ok(Some(state))
    }

    fn apply_effects(&mut self, effects: Vec<Effect>) -> Result<()> {
        for effect in effects {
            match effect {
                Effect::SyncLocation { page } => self.location = self.location.with_page(page),
                Effect::ScrollToTop => {
                    execute!(io::stdout(), Clear(ClearType::All), MoveTo(0, 0))
                        .context("clearing terminal")?;
                }
            }
        }
        Ok(())
    }

    fn render(&self, state: &GalleryState) -> String {
        render(state, &self.location, &self.client, &self.classifier)
    }
}

/// Run the interactive browser until the user quits or stdin closes.
pub async fn run(args: BrowseArgs) -> Result<()> {
    let base = Url::parse(&args.server)
        .with_context(|| format!("parsing server URL `{}`", args.server))?;

    let mut location = Bookmark::new(base.clone());
    if let Some(page) = args.page {
        location = location.with_page(page);
    }
    let mut session = Session {
        client: GalleryClient::new(base),
        classifier: ThreeSegmentClassifier::new(args.permalink_template),
        location,
        items_per_page: args.items_per_page,
    };

    let Some(mut state) = session.mount().await? else {
        return Ok(());
    };
    print_screen(&session.render(&state))?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = next_input(&mut lines, interrupted()).await? else {
            break;
        };

        let action = match parse_command(&line) {
            Ok(Command::Quit) => break,
            Ok(Command::Help) => {
                println!("{}", HELP);
                continue;
            }
            Ok(Command::Reload) => {
                match session.mount().await? {
                    Some(fresh) => state = fresh,
                    None => break,
                }
                print_screen(&session.render(&state))?;
                continue;
            }
            Ok(Command::Next) => Action::NextPage,
            Ok(Command::Prev) => Action::PrevPage,
            Ok(Command::Size(size)) => {
                session.items_per_page = size;
                Action::SetItemsPerPage(size)
            }
            Ok(Command::Open(n)) => match state.window().get(n - 1) {
                Some(record) => Action::Select(record.key.clone()),
                None => {
                    println!("no item {} on this page", n);
                    continue;
                }
            },
            Ok(Command::Click(x)) => Action::Viewer(ViewerAction::Click {
                x,
                width: surface_width(),
            }),
            Ok(Command::Step(direction)) => Action::Viewer(ViewerAction::Advance(direction)),
            Ok(Command::Close) => Action::Viewer(ViewerAction::Close),
            Err(msg) => {
                if !msg.is_empty() {
                    println!("{}", msg);
                }
                continue;
            }
        };

        let (next, effects) = state.update(action);
        state = next;
        session.apply_effects(effects)?;
        print_screen(&session.render(&state))?;
    }

    Ok(())
}

/// Next line of input, or `None` once stdin closes or `interrupt` fires.
async fn next_input<R>(
    lines: &mut Lines<R>,
    interrupt: impl Future<Output = ()>,
) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    tokio::select! {
        line = lines.next_line() => line.context("reading stdin"),
        _ = interrupt => {
            info!("interrupted at the prompt, leaving");
            Ok(None)
        }
    }
}

/// Resolves on Ctrl-C. Never resolves if the signal cannot be watched.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn surface_width() -> u32 {
    terminal::size()
        .map(|(cols, _)| u32::from(cols))
        .unwrap_or(DEFAULT_SURFACE_WIDTH)
}

fn print_screen(screen: &str) -> Result<()> {
    let mut out = io::stdout().lock();
    out.write_all(screen.as_bytes())?;
    out.flush()?;
    Ok(())
}

fn render(
    state: &GalleryState,
    location: &Bookmark,
    client: &GalleryClient,
    classifier: &dyn PermalinkClassifier,
) -> String {
    let mut out = String::new();
    match &state.phase {
        LoadPhase::Loading => {
            let _ = writeln!(out, "Loading bucket listing...");
            return out;
        }
        LoadPhase::Failed(msg) => {
            let _ = writeln!(out, "!! Failed to load the gallery: {}", msg);
            let _ = writeln!(out, "!! type `reload` to try again");
            return out;
        }
        LoadPhase::Ready => {}
    }

    if let (Some(key), Some(record)) = (state.view.selected_key(), state.overlay_record()) {
        let position = state.snapshot.position_of(key).unwrap_or(0);
        let _ = writeln!(
            out,
            "[{}/{}] {}",
            position + 1,
            state.snapshot.len(),
            record.key
        );
        let _ = writeln!(out, "  modified {}", record.last_modified.to_rfc3339());
        match client.object_url(&record.key) {
            Some(url) => {
                let _ = writeln!(out, "  {}", url);
            }
            None => {
                let _ = writeln!(out, "  (this key cannot be requested by URL)");
            }
        }
        let permalink = state
            .view
            .overlay
            .as_ref()
            .and_then(|overlay| overlay.permalink(classifier));
        if let Some(link) = permalink {
            let _ = writeln!(out, "  post by {}: {}", link.author, link.url);
        }
        let _ = writeln!(out, "  (`<`, `>` or click <column> to move, `close` to return)");
        return out;
    }

    let window = state.window();
    let range = state.window_range();
    let _ = writeln!(
        out,
        "S3 Bucket Image Viewer  page {} of {}  ({} per page, {} objects)",
        state.view.current_page,
        state.page_count(),
        state.view.items_per_page,
        state.snapshot.len()
    );
    let _ = writeln!(out, "{}", location.url());
    if state.snapshot.is_empty() {
        let _ = writeln!(out, "  (bucket is empty)");
    } else if window.is_empty() {
        let _ = writeln!(out, "  (nothing to show on this page)");
    }
    for (i, record) in window.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>4}. {}  {}",
            i + 1,
            record.last_modified.format("%Y-%m-%d %H:%M"),
            record.key
        );
    }
    if !window.is_empty() {
        let _ = writeln!(
            out,
            "  items {}-{} of {}",
            range.start + 1,
            range.start + window.len(),
            state.snapshot.len()
        );
    }

    let controls = state.page_controls();
    let prev = if controls.prev_visible { "[< prev]" } else { "" };
    let next = if controls.next_visible { "[next >]" } else { "" };
    if !prev.is_empty() || !next.is_empty() {
        let _ = writeln!(out, "{:<10}{:>10}", prev, next);
    }
    out
}
