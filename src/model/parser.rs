// File: src/model/parser.rs
//! Extracts a start date/time, run name and metaplot tag from human-written titles.
//!
//! Titles are supposed to look like `[Metaplot] Name of Run. 2021-08-16. 2300 UTC`,
//! but in practice the separators, ordering and spacing vary wildly. Parsing anchors on
//! the date: an ordered table of whole-title patterns is tried until one matches, the
//! text before the date becomes the name and the text after it the clock time.
use crate::error::ParseError;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::str::FromStr;

/// Label used when a time fragment carries no timezone.
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Everything a title (or calendar hint) tells us about a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporalHint {
    pub group_tag: String,
    pub name: String,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub timezone: String,
}

type Interpreter = fn(&Captures<'_>) -> Result<TemporalHint, ParseError>;

struct DatePattern {
    matcher: Regex,
    interpret: Interpreter,
}

impl DatePattern {
    fn new(pattern: &str, interpret: Interpreter) -> Self {
        Self {
            matcher: Regex::new(pattern).expect("date pattern should compile - this is a bug"),
            interpret,
        }
    }
}

// Order matters: the first pattern that matches the whole title wins.
// New layouts are supported by appending to this table.
static DATE_PATTERNS: Lazy<Vec<DatePattern>> = Lazy::new(|| {
    vec![
        // yyyy-mm-dd, any mix of '-', '.' and whitespace between the parts
        DatePattern::new(
            r"^(.+?)([0-9]{4})[-.\s]+([0-9]{1,2})[-.\s]+([0-9]{1,2})(.*)",
            anchor_on_date,
        ),
        // 202ymmdd (stops matching in 2030)
        DatePattern::new(r"^(.+?)(202[0-9])([0-9]{2})([0-9]{2})(.*)", anchor_on_date),
        // dd-mm-yyyy
        DatePattern::new(
            r"^(.+?)([0-9]{1,2})[-.\s]+([0-9]{1,2})[-.\s]+([0-9]{4})(.*)",
            anchor_on_reversed_date,
        ),
        // ddmm202y (stops matching in 2030)
        DatePattern::new(
            r"^(.+?)([0-9]{2})([0-9]{2})(202[0-9])(.*)",
            anchor_on_reversed_date,
        ),
    ]
});

// 'HHMM tz', 'HMM tz', 'HH:MM tz' or 'H:MM tz'
static TIME_WITH_ZONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^0-9]*([0-9]{1,2}):?([0-9]{2})\s+([\w/]+)")
        .expect("TIME_WITH_ZONE should compile - this is a bug")
});

static TIME_WITHOUT_ZONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^0-9]*([0-9]{1,2}):?([0-9]{2})")
        .expect("TIME_WITHOUT_ZONE should compile - this is a bug")
});

static METAPLOT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[(.*?)\](.*)").expect("METAPLOT should compile - this is a bug"));

// {CALENDAR_HINT: <title>}; the middle is loose so 'CALENDAR HINT' and 'CALENDAR\_HINT' work.
static CALENDAR_HINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{CALENDAR[^}\n]*?HINT:([^}\n]*)\}")
        .expect("CALENDAR_HINT should compile - this is a bug")
});

fn capture<'t>(caps: &Captures<'t>, idx: usize) -> &'t str {
    caps.get(idx).map(|m| m.as_str()).unwrap_or_default()
}

fn number<T: FromStr>(caps: &Captures<'_>, idx: usize) -> Result<T, ParseError> {
    let raw = capture(caps, idx);
    raw.parse::<T>()
        .map_err(|_| ParseError::Title(format!("'{}' is not a number", raw)))
}

/// Parses the clock part following a date, e.g. `. 2359 UTC` or ` @ 1:00`.
///
/// Hours and minutes are not range checked here; that happens when the start
/// instant is built.
pub fn parse_time_fragment(fragment: &str) -> Result<(u32, u32, String), ParseError> {
    if let Some(caps) = TIME_WITH_ZONE.captures(fragment) {
        return Ok((
            number(&caps, 1).map_err(|_| ParseError::Time(fragment.to_string()))?,
            number(&caps, 2).map_err(|_| ParseError::Time(fragment.to_string()))?,
            capture(&caps, 3).trim().to_string(),
        ));
    }

    if let Some(caps) = TIME_WITHOUT_ZONE.captures(fragment) {
        return Ok((
            number(&caps, 1).map_err(|_| ParseError::Time(fragment.to_string()))?,
            number(&caps, 2).map_err(|_| ParseError::Time(fragment.to_string()))?,
            DEFAULT_TIMEZONE.to_string(),
        ));
    }

    Err(ParseError::Time(fragment.to_string()))
}

/// Splits an optional leading `[Metaplot]` off the run name.
///
/// Only the first bracket pair is the metaplot; later ones stay in the name.
pub fn parse_name_fragment(fragment: &str) -> (String, String) {
    match METAPLOT.captures(fragment.trim_start()) {
        Some(caps) => (
            capture(&caps, 1).trim().to_string(),
            capture(&caps, 2).trim().to_string(),
        ),
        None => (String::new(), fragment.trim().to_string()),
    }
}

// year-month-day
fn anchor_on_date(caps: &Captures<'_>) -> Result<TemporalHint, ParseError> {
    let (group_tag, name) = parse_name_fragment(capture(caps, 1));
    let year = number(caps, 2)?;
    let month = number(caps, 3)?;
    let day = number(caps, 4)?;
    let (hour, minute, timezone) = parse_time_fragment(capture(caps, 5))?;
    Ok(TemporalHint {
        group_tag,
        name,
        year,
        month,
        day,
        hour,
        minute,
        timezone,
    })
}

// day-month-year
fn anchor_on_reversed_date(caps: &Captures<'_>) -> Result<TemporalHint, ParseError> {
    let (group_tag, name) = parse_name_fragment(capture(caps, 1));
    let day = number(caps, 2)?;
    let month = number(caps, 3)?;
    let year = number(caps, 4)?;
    let (hour, minute, timezone) = parse_time_fragment(capture(caps, 5))?;
    Ok(TemporalHint {
        group_tag,
        name,
        year,
        month,
        day,
        hour,
        minute,
        timezone,
    })
}

/// Parses a title against the date pattern table.
///
/// Once a date pattern matches, a bad clock fragment is reported as
/// [`ParseError::Time`] rather than falling through to later patterns.
pub fn parse_title(title: &str) -> Result<TemporalHint, ParseError> {
    for pattern in DATE_PATTERNS.iter() {
        if let Some(caps) = pattern.matcher.captures(title) {
            return (pattern.interpret)(&caps);
        }
    }

    Err(ParseError::Title(title.to_string()))
}

/// Returns the text of the first `{CALENDAR_HINT: ...}` block in a post body.
pub fn find_calendar_hint(body: &str) -> Option<&str> {
    CALENDAR_HINT
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Parses the first calendar hint found in a post body as if it were a title.
///
/// Later hint blocks are ignored even when the first one is broken.
pub fn parse_selftext(body: &str) -> Result<TemporalHint, ParseError> {
    let hint = find_calendar_hint(body).ok_or(ParseError::SelfText)?;
    parse_title(hint)
}

/// Resolves a post: a usable hint in the body overrides the title.
///
/// Titles cannot be edited after posting, so the hint is how authors fix a
/// malformed one. When no usable hint exists the title error is returned.
pub fn parse_post(title: &str, body: &str) -> Result<TemporalHint, ParseError> {
    if !body.is_empty()
        && let Ok(hint) = parse_selftext(body)
    {
        return Ok(hint);
    }
    parse_title(title)
}
