//! Reaction-driven pagination over a single message.
//!
//! Lines are packed greedily into pages, the first page is posted, and a
//! fixed set of five reaction controls drives navigation until the view
//! is closed or its deadline passes. The deadline is absolute from
//! creation; activity does not extend it. Surface failures inside the
//! loop are logged and swallowed so the view degrades to "stops
//! updating" rather than surfacing errors to the invoking user.

use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

use crate::model::UserId;
use crate::surface::{MessageSurface, ReactionWaiter, SurfaceError};

pub const FIRST_EMOJI: &str = "\u{23EE}";
pub const LEFT_EMOJI: &str = "\u{2B05}";
pub const RIGHT_EMOJI: &str = "\u{27A1}";
pub const LAST_EMOJI: &str = "\u{23ED}";
pub const DELETE_EMOJI: &str = "\u{274C}";

/// The five controls in the order they are attached.
pub const PAGINATION_EMOJI: [&str; 5] = [
    FIRST_EMOJI,
    LEFT_EMOJI,
    RIGHT_EMOJI,
    LAST_EMOJI,
    DELETE_EMOJI,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    First,
    Previous,
    Next,
    Last,
    Close,
}

impl Control {
    pub fn from_emoji(emoji: &str) -> Option<Self> {
        match emoji {
            FIRST_EMOJI => Some(Control::First),
            LEFT_EMOJI => Some(Control::Previous),
            RIGHT_EMOJI => Some(Control::Next),
            LAST_EMOJI => Some(Control::Last),
            DELETE_EMOJI => Some(Control::Close),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PaginationError {
    #[error("no lines to paginate")]
    EmptyContent,
    #[error("line of {len} characters exceeds the page limit of {limit}")]
    LineTooLong { len: usize, limit: usize },
    #[error("failed to post pagination message: {0}")]
    Surface(#[from] SurfaceError),
}

/// Greedy line packer. A line is appended to the current page unless that
/// would exceed the size or line-count limit, in which case the page is
/// closed and a new one started with that line. A single line larger than
/// the page limit is a configuration error, never truncated.
#[derive(Debug)]
pub struct LinePaginator {
    max_size: usize,
    max_lines: Option<usize>,
    current: Vec<String>,
    line_count: usize,
    char_count: usize,
    pages: Vec<String>,
}

impl LinePaginator {
    pub fn new(max_size: usize, max_lines: Option<usize>) -> Self {
        Self {
            max_size,
            max_lines,
            current: Vec::new(),
            line_count: 0,
            char_count: 0,
            pages: Vec::new(),
        }
    }

    pub fn add_line(&mut self, line: &str, empty: bool) -> Result<(), PaginationError> {
        let len = line.chars().count();
        if len > self.max_size {
            return Err(PaginationError::LineTooLong {
                len,
                limit: self.max_size,
            });
        }

        if let Some(max_lines) = self.max_lines {
            if self.line_count >= max_lines {
                self.close_page();
            }
        }
        if self.char_count + len + 1 > self.max_size {
            self.close_page();
        }

        self.line_count += 1;
        self.char_count += len + 1;
        self.current.push(line.to_string());

        if empty {
            self.current.push(String::new());
            self.char_count += 1;
        }
        Ok(())
    }

    fn close_page(&mut self) {
        if self.current.is_empty() {
            return;
        }
        self.pages.push(self.current.join("\n"));
        self.current.clear();
        self.line_count = 0;
        self.char_count = 0;
    }

    pub fn into_pages(mut self) -> Vec<String> {
        if !self.current.is_empty() {
            self.close_page();
        }
        self.pages
    }
}

#[derive(Debug, Clone)]
pub struct PaginateOptions {
    pub max_size: usize,
    pub max_lines: Option<usize>,
    /// Insert a blank line between entries.
    pub empty_line: bool,
    /// Only this user may drive the view; `None` means anyone but the bot.
    pub restrict_to: Option<UserId>,
    pub timeout: Duration,
    pub footer_text: Option<String>,
    /// Fail with `EmptyContent` instead of rendering a placeholder page.
    pub error_on_empty: bool,
}

impl Default for PaginateOptions {
    fn default() -> Self {
        Self {
            max_size: 500,
            max_lines: None,
            empty_line: true,
            restrict_to: None,
            timeout: Duration::from_secs(300),
            footer_text: None,
            error_on_empty: false,
        }
    }
}

/// Apply one navigation control to the current page index.
/// `last` is the index of the final page.
pub fn transition(current: usize, last: usize, control: Control) -> usize {
    match control {
        Control::First => 0,
        Control::Last => last,
        Control::Previous => current.saturating_sub(1),
        Control::Next => (current + 1).min(last),
        Control::Close => current,
    }
}

/// Pack `lines` into pages per the options, substituting a placeholder
/// page when empty input is allowed.
pub fn pack(lines: &[String], opts: &PaginateOptions) -> Result<Vec<String>, PaginationError> {
    if lines.is_empty() {
        if opts.error_on_empty {
            return Err(PaginationError::EmptyContent);
        }
        debug!("no lines to paginate, substituting placeholder page");
        return Ok(vec!["(nothing to display)".to_string()]);
    }

    let mut paginator = LinePaginator::new(opts.max_size, opts.max_lines);
    for line in lines {
        paginator.add_line(line, opts.empty_line)?;
    }
    Ok(paginator.into_pages())
}

fn footer(opts: &PaginateOptions, page: usize, total: usize) -> Option<String> {
    match (&opts.footer_text, total) {
        (text, 1) => text.clone(),
        (Some(text), _) => Some(format!("{text} (Page {}/{total})", page + 1)),
        (None, _) => Some(format!("Page {}/{total}", page + 1)),
    }
}

/// Render `lines` as an interactive paginated view. Returns once the view
/// is closed, times out, or needed no interaction at all (single page).
pub async fn paginate<S, W>(
    lines: Vec<String>,
    surface: &S,
    events: &mut W,
    bot_user: UserId,
    opts: PaginateOptions,
) -> Result<(), PaginationError>
where
    S: MessageSurface,
    W: ReactionWaiter,
{
    let pages = pack(&lines, &opts)?;
    let total = pages.len();
    debug!(total, "paginator created");

    if total == 1 {
        surface.send(&pages[0], footer(&opts, 0, 1).as_deref()).await?;
        return Ok(());
    }

    let mut current = 0usize;
    let last = total - 1;
    let message = surface
        .send(&pages[current], footer(&opts, current, total).as_deref())
        .await?;

    for emoji in PAGINATION_EMOJI {
        if let Err(err) = surface.add_reaction(message, emoji).await {
            warn!(?err, emoji, "failed to attach pagination control");
        }
    }

    // One absolute deadline for the whole view; accepted events do not
    // extend it.
    let deadline = Instant::now() + opts.timeout;

    loop {
        let event = match timeout_at(deadline, events.next_reaction()).await {
            Err(_) => {
                debug!("pagination timed out");
                break;
            }
            Ok(None) => {
                debug!("reaction stream closed, ending pagination");
                break;
            }
            Ok(Some(event)) => event,
        };

        if event.message_id != message || event.user_id == bot_user {
            continue;
        }
        let Some(control) = Control::from_emoji(&event.emoji) else {
            continue;
        };
        if let Some(owner) = opts.restrict_to {
            if event.user_id != owner {
                continue;
            }
        }

        if control == Control::Close {
            debug!("got close control");
            break;
        }

        if let Err(err) = surface
            .remove_reaction(message, &event.emoji, event.user_id)
            .await
        {
            warn!(?err, "failed to consume navigation reaction");
        }

        let next = transition(current, last, control);
        if next == current {
            continue;
        }
        current = next;
        debug!(page = current + 1, total, "changing page");

        if let Err(err) = surface
            .edit(message, &pages[current], footer(&opts, current, total).as_deref())
            .await
        {
            warn!(?err, "failed to render page");
        }
    }

    if let Err(err) = surface.clear_reactions(message).await {
        warn!(?err, "failed to clear pagination controls");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("line {i}")).collect()
    }

    #[test]
    fn packing_preserves_order_and_units() {
        let input = lines(10);
        let mut paginator = LinePaginator::new(30, None);
        for line in &input {
            paginator.add_line(line, false).unwrap();
        }
        let pages = paginator.into_pages();
        assert!(pages.len() > 1);

        let rejoined: Vec<String> = pages
            .iter()
            .flat_map(|p| p.lines().map(str::to_string))
            .collect();
        assert_eq!(rejoined, input);
        for page in &pages {
            assert!(page.lines().all(|l| input.iter().any(|i| i == l)));
        }
    }

    #[test]
    fn max_lines_closes_pages() {
        let mut paginator = LinePaginator::new(1_000, Some(3));
        for line in lines(7) {
            paginator.add_line(&line, false).unwrap();
        }
        let pages = paginator.into_pages();
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].lines().count(), 3);
        assert_eq!(pages[2].lines().count(), 1);
    }

    #[test]
    fn exact_limit_line_stays_on_one_page() {
        let mut paginator = LinePaginator::new(10, None);
        paginator.add_line("aaaaaaaaaa", false).unwrap();
        let pages = paginator.into_pages();
        assert_eq!(pages, vec!["aaaaaaaaaa".to_string()]);
    }

    #[test]
    fn oversized_line_is_rejected() {
        let mut paginator = LinePaginator::new(10, None);
        let err = paginator.add_line("a very long line indeed", false).unwrap_err();
        assert!(matches!(err, PaginationError::LineTooLong { .. }));
    }

    #[test]
    fn empty_input_placeholder_or_error() {
        let opts = PaginateOptions::default();
        let pages = pack(&[], &opts).unwrap();
        assert_eq!(pages, vec!["(nothing to display)".to_string()]);

        let strict = PaginateOptions {
            error_on_empty: true,
            ..Default::default()
        };
        assert!(matches!(
            pack(&[], &strict),
            Err(PaginationError::EmptyContent)
        ));
    }

    #[test]
    fn transition_table() {
        // (current, last, control, expected)
        let cases = [
            (0, 4, Control::First, 0),
            (3, 4, Control::First, 0),
            (0, 4, Control::Last, 4),
            (4, 4, Control::Last, 4),
            (0, 4, Control::Previous, 0),
            (2, 4, Control::Previous, 1),
            (4, 4, Control::Next, 4),
            (2, 4, Control::Next, 3),
            (2, 4, Control::Close, 2),
        ];
        for (current, last, control, expected) in cases {
            assert_eq!(transition(current, last, control), expected);
        }
    }

    #[test]
    fn control_emoji_round_trip() {
        assert_eq!(Control::from_emoji(FIRST_EMOJI), Some(Control::First));
        assert_eq!(Control::from_emoji(DELETE_EMOJI), Some(Control::Close));
        assert_eq!(Control::from_emoji("\u{2b50}"), None);
    }

    #[test]
    fn footer_includes_page_counter_only_when_paginated() {
        let opts = PaginateOptions {
            footer_text: Some("Reminders".into()),
            ..Default::default()
        };
        assert_eq!(footer(&opts, 0, 1).as_deref(), Some("Reminders"));
        assert_eq!(
            footer(&opts, 1, 3).as_deref(),
            Some("Reminders (Page 2/3)")
        );
        let bare = PaginateOptions::default();
        assert_eq!(footer(&bare, 0, 1), None);
        assert_eq!(footer(&bare, 0, 3).as_deref(), Some("Page 1/3"));
    }
}
