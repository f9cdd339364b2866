/// Line-oriented editing shell.
///
/// Each input line is split on whitespace and parsed with clap. Pages can be
/// referenced by id, slug, or 1-based position; components by id or 1-based
/// position within their page.
use std::io::{BufRead, Write};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use page_builder_core::{Block, BlockKind, Document, EditorSession, Page};

/// One shell line.
#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
struct Line {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ShellCommand {
    /// Append a page.
    AddPage { title: Vec<String> },
    /// Delete a page and its components.
    RemovePage { page: String },
    /// Change a page title.
    RenamePage { page: String, title: Vec<String> },
    /// Change a page slug.
    Slug { page: String, slug: String },
    /// Move a page to a 1-based position.
    MovePage { page: String, position: usize },
    /// Add a component (hero, text, image, button, course-grid, testimonial, spacer).
    Add {
        page: String,
        kind: String,
        /// 1-based insert position; defaults to the end.
        #[arg(long)]
        at: Option<usize>,
    },
    /// Replace a component's block with JSON, e.g. {"type":"spacer","props":{"height":8}}.
    Set {
        page: String,
        component: String,
        json: Vec<String>,
    },
    /// Delete a component.
    Remove { page: String, component: String },
    /// Move a component to a 1-based position on its page.
    Move {
        page: String,
        component: String,
        position: usize,
    },
    /// Hide a component.
    Hide { page: String, component: String },
    /// Unhide a component.
    ShowComponent { page: String, component: String },
    /// Copy a component in place.
    Duplicate { page: String, component: String },
    /// Change the site title.
    Title { title: Vec<String> },
    Undo,
    Redo,
    /// Print pages and components.
    List,
    /// Write the document and flush undo history.
    Save,
    /// Leave the shell.
    Quit {
        /// Quit even with unsaved changes.
        #[arg(long)]
        force: bool,
    },
}

/// Parses one input line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<ShellCommand>, clap::Error> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    Line::try_parse_from(line.split_whitespace()).map(|l| Some(l.command))
}

/// What the shell does after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Interactive editor over one document file.
pub struct Shell {
    session: EditorSession,
    pretty: bool,
}

impl Shell {
    pub fn new(session: EditorSession, pretty: bool) -> Self {
        Self { session, pretty }
    }

    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    /// Reads commands from `input` until `quit` or end of input.
    ///
    /// Command errors are reported to `out` and do not stop the shell.
    /// Undo history is flushed on exit.
    pub fn run(&mut self, input: impl BufRead, out: &mut impl Write) -> Result<()> {
        writeln!(
            out,
            "Editing {} (type `help` for commands)",
            self.session.title()
        )?;
        for line in input.lines() {
            let line = line.context("failed to read input")?;
            let command = match parse_line(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(e) => {
                    write!(out, "{e}")?;
                    continue;
                }
            };
            match self.execute(command, out) {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => writeln!(out, "error: {e:#}")?,
            }
        }
        self.session.flush_history()
    }

    pub fn execute(&mut self, command: ShellCommand, out: &mut impl Write) -> Result<Flow> {
        tracing::trace!(?command, "Shell command");
        match command {
            ShellCommand::AddPage { title } => {
                let title = join_words(&title, "title")?;
                let id = self.session.add_page(&title)?;
                let page = self.page(&id)?;
                writeln!(out, "added page {} (/{})", page.id, page.slug)?;
            }
            ShellCommand::RemovePage { page } => {
                let id = self.page_id(&page)?;
                self.session.remove_page(&id)?;
                writeln!(out, "removed page {id}")?;
            }
            ShellCommand::RenamePage { page, title } => {
                let id = self.page_id(&page)?;
                self.session.rename_page(&id, &join_words(&title, "title")?)?;
            }
            ShellCommand::Slug { page, slug } => {
                let id = self.page_id(&page)?;
                self.session.set_page_slug(&id, &slug)?;
            }
            ShellCommand::MovePage { page, position } => {
                let id = self.page_id(&page)?;
                self.session.move_page(&id, to_index(position)?)?;
            }
            ShellCommand::Add { page, kind, at } => {
                let page_id = self.page_id(&page)?;
                let kind: BlockKind = kind.parse()?;
                let index = at.map(to_index).transpose()?;
                let id = self
                    .session
                    .add_component(&page_id, Block::default_for(kind), index)?;
                writeln!(out, "added {kind} {id}")?;
            }
            ShellCommand::Set {
                page,
                component,
                json,
            } => {
                let (page_id, component_id) = self.component_id(&page, &component)?;
                let json = join_words(&json, "json")?;
                let block: Block =
                    serde_json::from_str(&json).context("invalid component JSON")?;
                self.session
                    .update_component(&page_id, &component_id, block)?;
            }
            ShellCommand::Remove { page, component } => {
                let (page_id, component_id) = self.component_id(&page, &component)?;
                self.session.remove_component(&page_id, &component_id)?;
                writeln!(out, "removed {component_id}")?;
            }
            ShellCommand::Move {
                page,
                component,
                position,
            } => {
                let (page_id, component_id) = self.component_id(&page, &component)?;
                self.session
                    .move_component(&page_id, &component_id, to_index(position)?)?;
            }
            ShellCommand::Hide { page, component } => {
                let (page_id, component_id) = self.component_id(&page, &component)?;
                self.session
                    .set_component_hidden(&page_id, &component_id, true)?;
            }
            ShellCommand::ShowComponent { page, component } => {
                let (page_id, component_id) = self.component_id(&page, &component)?;
                self.session
                    .set_component_hidden(&page_id, &component_id, false)?;
            }
            ShellCommand::Duplicate { page, component } => {
                let (page_id, component_id) = self.component_id(&page, &component)?;
                let id = self.session.duplicate_component(&page_id, &component_id)?;
                writeln!(out, "added copy {id}")?;
            }
            ShellCommand::Title { title } => {
                let mut settings = self.session.document().settings.clone();
                settings.site_title = join_words(&title, "title")?;
                self.session.update_settings(settings)?;
            }
            ShellCommand::Undo => {
                if !self.session.undo()? {
                    writeln!(out, "nothing to undo")?;
                }
            }
            ShellCommand::Redo => {
                if !self.session.redo()? {
                    writeln!(out, "nothing to redo")?;
                }
            }
            ShellCommand::List => {
                write_summary(self.session.document(), out)?;
                let history = self.session.history();
                writeln!(
                    out,
                    "history: step {} of {}{}",
                    history.cursor() + 1,
                    history.len(),
                    if self.session.is_dirty() { ", unsaved changes" } else { "" }
                )?;
            }
            ShellCommand::Save => {
                self.session.save(self.pretty)?;
                self.session.flush_history()?;
                writeln!(out, "saved {}", self.session.title())?;
            }
            ShellCommand::Quit { force } => {
                if self.session.is_dirty() && !force {
                    writeln!(out, "unsaved changes; run `save` or `quit --force`")?;
                    return Ok(Flow::Continue);
                }
                return Ok(Flow::Quit);
            }
        }
        Ok(Flow::Continue)
    }

    fn page(&self, reference: &str) -> Result<&Page> {
        let doc = self.session.document();
        let by_position = reference
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| doc.pages.get(i));
        doc.page(reference)
            .or_else(|| doc.page_by_slug(reference))
            .or(by_position)
            .with_context(|| format!("no page matches {reference:?}"))
    }

    fn page_id(&self, reference: &str) -> Result<String> {
        Ok(self.page(reference)?.id.clone())
    }

    fn component_id(&self, page: &str, component: &str) -> Result<(String, String)> {
        let page = self.page(page)?;
        let by_position = component
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| page.components.get(i));
        let found = page
            .component(component)
            .or(by_position)
            .with_context(|| format!("no component on page {} matches {component:?}", page.id))?;
        Ok((page.id.clone(), found.id.clone()))
    }
}

/// Writes a page/component listing of `doc`.
pub fn write_summary(doc: &Document, out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "{}", display_title(&doc.settings.site_title))?;
    if doc.pages.is_empty() {
        writeln!(out, "  (no pages)")?;
    }
    for (i, page) in doc.pages.iter().enumerate() {
        writeln!(
            out,
            "{:>3}. {} /{}  [{}]",
            i + 1,
            display_title(&page.title),
            page.slug,
            page.id
        )?;
        for (j, component) in page.components.iter().enumerate() {
            writeln!(
                out,
                "      {}. {:<12} {}{}  [{}]",
                j + 1,
                component.block.kind().as_str(),
                component.block.summary(),
                if component.hidden { " (hidden)" } else { "" },
                component.id
            )?;
        }
    }
    Ok(())
}

fn display_title(title: &str) -> &str {
    if title.is_empty() {
        "(untitled)"
    } else {
        title
    }
}

fn join_words(words: &[String], what: &str) -> Result<String> {
    if words.is_empty() {
        bail!("missing {what}");
    }
    Ok(words.join(" "))
}

/// Converts a 1-based position to an index.
fn to_index(position: usize) -> Result<usize> {
    position
        .checked_sub(1)
        .context("positions start at 1")
}
