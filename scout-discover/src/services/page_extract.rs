//! Profile page extraction
//!
//! Pure functions turning a profile page into rank, recency and neighbor
//! data. Matching runs over a token stream of the page's visible text:
//! alphabetic runs and digit runs, each with its byte span, so patterns such
//! as `Gold II 45 LP`, `45LP` and `S14-2 Gold` can be recognized without
//! caring how the markup split them up.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use scout_common::{Division, Identity, RankInfo, Tier};

use crate::models::{Candidate, LastActivity, PlayerRecord, Region};

pub const BASE_URL: &str = "https://u.gg";

const PROFILE_PATH: &str = "/lol/profile/";

/// Max characters between `Ranked Solo` and the tier name
const RANKED_SOLO_WINDOW: usize = 100;

/// Max characters between the tier (and division) and the LP figure
const LP_WINDOW: usize = 50;

const SECOND_MS: u64 = 1_000;
const MINUTE_MS: u64 = 60 * SECOND_MS;
const HOUR_MS: u64 = 60 * MINUTE_MS;
const DAY_MS: u64 = 24 * HOUR_MS;
const WEEK_MS: u64 = 7 * DAY_MS;
const MONTH_MS: u64 = 30 * DAY_MS;

/// Long-form units, as written before "ago"
const LONG_UNITS: [(&str, u64); 6] = [
    ("second", SECOND_MS),
    ("minute", MINUTE_MS),
    ("hour", HOUR_MS),
    ("day", DAY_MS),
    ("week", WEEK_MS),
    ("month", MONTH_MS),
];

/// Abbreviated units (`5m ago`) and the name used in the label
const SHORT_UNITS: [(&str, &str, u64); 5] = [
    ("s", "second", SECOND_MS),
    ("m", "minute", MINUTE_MS),
    ("h", "hour", HOUR_MS),
    ("d", "day", DAY_MS),
    ("w", "week", WEEK_MS),
];

/// Profile page URL for an account
pub fn profile_url(region: Region, identity: &Identity) -> String {
    format!(
        "{}{}{}/{}-{}/overview",
        BASE_URL,
        PROFILE_PATH,
        region.site_code(),
        encode_component(&identity.name.to_lowercase()),
        encode_component(&identity.tag.to_lowercase())
    )
}

/// Build a profile record from a fetched page
pub fn parse_profile(
    html: &str,
    identity: &Identity,
    region: Region,
    url: &str,
    now: DateTime<Utc>,
) -> PlayerRecord {
    let text = html_to_text(html);
    let mut record = PlayerRecord::new(identity, region);
    record.rank = parse_rank(&text);
    record.last_activity = parse_last_activity(&text, now);
    record.profile_url = Some(url.to_string());
    record
}

// ----------------------------------------------------------------------------
// Text extraction
// ----------------------------------------------------------------------------

/// Visible text of an HTML document.
///
/// Tags become a single space; script, style and comment contents are
/// dropped; common character references are decoded.
pub fn html_to_text(html: &str) -> String {
    let lower = html.to_ascii_lowercase();
    let mut out = String::with_capacity(html.len() / 2);
    let mut i = 0;

    while i < html.len() {
        let rest = &html[i..];
        let lower_rest = &lower[i..];

        if lower_rest.starts_with("<!--") {
            i = lower_rest
                .find("-->")
                .map_or(html.len(), |end| i + end + "-->".len());
            out.push(' ');
        } else if rest.starts_with('<') {
            let raw = ["script", "style"]
                .into_iter()
                .find(|tag| lower_rest[1..].starts_with(tag));
            i = match raw {
                Some(tag) => {
                    let close = format!("</{}", tag);
                    lower_rest
                        .find(&close)
                        .and_then(|start| lower_rest[start..].find('>').map(|gt| i + start + gt + 1))
                        .unwrap_or(html.len())
                }
                None => rest.find('>').map_or(html.len(), |gt| i + gt + 1),
            };
            out.push(' ');
        } else if rest.starts_with('&') {
            match decode_entity(rest) {
                Some((decoded, consumed)) => {
                    out.push(decoded);
                    i += consumed;
                }
                None => {
                    out.push('&');
                    i += 1;
                }
            }
        } else {
            let Some(c) = rest.chars().next() else { break };
            out.push(c);
            i += c.len_utf8();
        }
    }

    out
}

/// Decode a character reference at the start of `s`; returns the char and bytes consumed
fn decode_entity(s: &str) -> Option<(char, usize)> {
    let end = s.get(..12).unwrap_or(s).find(';')?;
    let name = &s[1..end];

    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)?
        }
    };

    Some((c, end + 1))
}

// ----------------------------------------------------------------------------
// Tokens
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Word,
    Number,
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    kind: TokenKind,
    text: &'a str,
    start: usize,
    end: usize,
}

impl Token<'_> {
    fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Word && self.text.eq_ignore_ascii_case(word)
    }

    fn number(&self) -> Option<u64> {
        match self.kind {
            TokenKind::Number => self.text.parse().ok(),
            TokenKind::Word => None,
        }
    }

    fn tier(&self) -> Option<Tier> {
        match self.kind {
            TokenKind::Word => self.text.parse().ok(),
            TokenKind::Number => None,
        }
    }

    fn division(&self) -> Option<Division> {
        match self.kind {
            TokenKind::Word => self.text.parse().ok(),
            TokenKind::Number => None,
        }
    }
}

struct Scanner<'a> {
    text: &'a str,
    tokens: Vec<Token<'a>>,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        let mut tokens = Vec::new();
        let mut current: Option<(TokenKind, usize)> = None;

        for (i, c) in text.char_indices() {
            let kind = if c.is_ascii_digit() {
                Some(TokenKind::Number)
            } else if c.is_alphabetic() {
                Some(TokenKind::Word)
            } else {
                None
            };

            match current {
                Some((k, _)) if Some(k) == kind => {}
                Some((k, start)) => {
                    tokens.push(Token {
                        kind: k,
                        text: &text[start..i],
                        start,
                        end: i,
                    });
                    current = kind.map(|k| (k, i));
                }
                None => current = kind.map(|k| (k, i)),
            }
        }
        if let Some((kind, start)) = current {
            tokens.push(Token {
                kind,
                text: &text[start..],
                start,
                end: text.len(),
            });
        }

        Self { text, tokens }
    }

    fn get(&self, idx: usize) -> Option<&Token<'a>> {
        self.tokens.get(idx)
    }

    /// Only whitespace (or nothing) between two positions
    fn blank_between(&self, from: usize, to: usize) -> bool {
        self.text
            .get(from..to)
            .is_some_and(|gap| gap.chars().all(char::is_whitespace))
    }

    /// Token at `idx` directly follows `prev` with only whitespace between
    fn next_after(&self, prev: &Token<'a>, idx: usize) -> Option<&Token<'a>> {
        self.get(idx)
            .filter(|t| self.blank_between(prev.end, t.start))
    }

    /// Optional division right after the tier at `idx`; returns it and the last consumed index
    fn division_after(&self, idx: usize) -> (Option<Division>, usize) {
        let tier = &self.tokens[idx];
        match self.next_after(tier, idx + 1).and_then(Token::division) {
            Some(division) => (Some(division), idx + 1),
            None => (None, idx),
        }
    }

    /// `<n> LP` directly at `idx`
    fn lp_at(&self, idx: usize) -> Option<u32> {
        let number = self.get(idx)?;
        let lp = number.number()?;
        self.next_after(number, idx + 1)
            .filter(|t| t.is_word("lp"))?;
        u32::try_from(lp).ok()
    }
}

// ----------------------------------------------------------------------------
// Rank
// ----------------------------------------------------------------------------

/// Solo queue rank from page text.
///
/// Tries, in order: the `Ranked Solo` section, any `Tier [Div] N LP`, and
/// a past-season badge `S<n>[-<n>] Tier` (reported with 0 LP).
pub fn parse_rank(text: &str) -> Option<RankInfo> {
    let scanner = Scanner::new(text);
    ranked_solo_section(&scanner)
        .or_else(|| any_rank_with_lp(&scanner))
        .or_else(|| past_season_rank(&scanner))
}

fn ranked_solo_section(s: &Scanner<'_>) -> Option<RankInfo> {
    for i in 0..s.tokens.len().saturating_sub(1) {
        if !(s.tokens[i].is_word("ranked") && s.tokens[i + 1].is_word("solo")) {
            continue;
        }
        let anchor = s.tokens[i + 1].end;

        for j in i + 2..s.tokens.len() {
            if s.tokens[j].start - anchor > RANKED_SOLO_WINDOW {
                break;
            }
            let Some(tier) = s.tokens[j].tier() else {
                continue;
            };
            let (division, last) = s.division_after(j);
            let from = s.tokens[last].end;

            let lp = (last + 1..s.tokens.len())
                .take_while(|&k| s.tokens[k].start - from <= LP_WINDOW)
                .find_map(|k| s.lp_at(k));
            if let Some(lp) = lp {
                return Some(RankInfo::new(tier, division, lp));
            }
        }
    }
    None
}

fn any_rank_with_lp(s: &Scanner<'_>) -> Option<RankInfo> {
    (0..s.tokens.len()).find_map(|j| {
        let tier = s.tokens[j].tier()?;
        let (division, last) = s.division_after(j);
        s.next_after(&s.tokens[last], last + 1)?;
        let lp = s.lp_at(last + 1)?;
        Some(RankInfo::new(tier, division, lp))
    })
}

fn past_season_rank(s: &Scanner<'_>) -> Option<RankInfo> {
    (0..s.tokens.len()).find_map(|i| {
        let marker = &s.tokens[i];
        if marker.kind != TokenKind::Word || !marker.text.to_ascii_lowercase().ends_with('s') {
            return None;
        }
        let season = s.get(i + 1).filter(|t| t.kind == TokenKind::Number && t.start == marker.end)?;

        // Optional split suffix: `-<digit>`
        let mut last = i + 1;
        if let Some(split) = s.get(i + 2) {
            let dash = s.text.get(season.end..split.start) == Some("-");
            if dash && split.kind == TokenKind::Number && split.text.len() == 1 {
                last = i + 2;
            }
        }

        let tier = s.next_after(&s.tokens[last], last + 1)?.tier()?;
        Some(RankInfo::new(tier, None, 0))
    })
}

// ----------------------------------------------------------------------------
// Last activity
// ----------------------------------------------------------------------------

/// Most recent game from `N <unit>(s) ago`, falling back to `N<unit> ago`
pub fn parse_last_activity(text: &str, now: DateTime<Utc>) -> Option<LastActivity> {
    let scanner = Scanner::new(text);
    relative_time(&scanner, now, long_unit).or_else(|| relative_time(&scanner, now, short_unit))
}

fn long_unit(word: &str) -> Option<(&'static str, u64)> {
    let lower = word.to_ascii_lowercase();
    let singular = lower.strip_suffix('s').unwrap_or(&lower);
    LONG_UNITS
        .iter()
        .find(|(name, _)| *name == singular)
        .copied()
}

fn short_unit(word: &str) -> Option<(&'static str, u64)> {
    SHORT_UNITS
        .iter()
        .find(|(abbr, _, _)| abbr.eq_ignore_ascii_case(word))
        .map(|&(_, name, ms)| (name, ms))
}

fn relative_time(
    s: &Scanner<'_>,
    now: DateTime<Utc>,
    unit_of: fn(&str) -> Option<(&'static str, u64)>,
) -> Option<LastActivity> {
    (0..s.tokens.len()).find_map(|i| {
        let value = s.tokens[i].number()?;
        let unit_token = s.next_after(&s.tokens[i], i + 1)?;
        if unit_token.kind != TokenKind::Word {
            return None;
        }
        let (unit, unit_ms) = unit_of(unit_token.text)?;
        s.next_after(unit_token, i + 2).filter(|t| t.is_word("ago"))?;

        let ms_ago = value.checked_mul(unit_ms)?;
        let plural = if value > 1 { "s" } else { "" };
        Some(LastActivity::new(
            ms_ago,
            format!("{} {}{} ago", value, unit, plural),
            now,
        ))
    })
}

// ----------------------------------------------------------------------------
// Neighbors
// ----------------------------------------------------------------------------

/// Accounts linked from a profile page, in page order.
///
/// Links to the seed itself are skipped and each account appears once.
pub fn parse_neighbors(html: &str, seed: &Identity, region: Region) -> Vec<Candidate> {
    let mut seen = HashSet::from([seed.key()]);
    hrefs(html)
        .filter_map(profile_link_identity)
        .filter(|identity| seen.insert(identity.key()))
        .map(|identity| Candidate::new(identity, region))
        .collect()
}

/// Values of every `href` attribute
fn hrefs(html: &str) -> impl Iterator<Item = &str> {
    let lower = html.to_ascii_lowercase();
    let mut values = Vec::new();
    let mut from = 0;

    while let Some(pos) = lower[from..].find("href") {
        let mut i = from + pos + "href".len();
        from = i;

        let after = html[i..].trim_start();
        i = html.len() - after.len();
        let Some(after_eq) = after.strip_prefix('=') else {
            continue;
        };
        let value = after_eq.trim_start();
        i += after.len() - value.len();

        let (value, consumed) = match value.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let inner = &value[1..];
                match inner.find(quote) {
                    Some(end) => (&inner[..end], end + 2),
                    None => continue,
                }
            }
            _ => {
                let end = value
                    .find(|c: char| c.is_whitespace() || c == '>')
                    .unwrap_or(value.len());
                (&value[..end], end)
            }
        };
        values.push(value);
        from = i + consumed;
    }

    values.into_iter()
}

/// `…/lol/profile/<code>/<name>-<tag>/overview…` to an identity.
///
/// The tag is whatever follows the last `-`, so names may contain dashes.
fn profile_link_identity(href: &str) -> Option<Identity> {
    let start = href.find(PROFILE_PATH)? + PROFILE_PATH.len();
    let mut parts = href[start..].splitn(3, '/');

    let code = parts.next().filter(|c| !c.is_empty())?;
    let name_tag = parts.next().filter(|n| !n.is_empty())?;
    if !parts.next()?.starts_with("overview") {
        return None;
    }
    tracing::trace!(code, name_tag, "Profile link");

    let decoded = decode_component(name_tag)?;
    let (name, tag) = decoded.rsplit_once('-')?;
    if name.is_empty() || tag.is_empty() {
        return None;
    }
    Some(Identity::new(name, tag))
}

// ----------------------------------------------------------------------------
// URL components
// ----------------------------------------------------------------------------

/// Percent-encode everything except unreserved characters and `!*'()`
pub fn encode_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Decode `%XX` escapes; `None` on malformed escapes or invalid UTF-8
pub fn decode_component(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = s.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8(out).ok()
}
