// src/extract/rules.rs
//! Line classifier rules for event card text.
//!
//! Rules run in a fixed order and each one only looks at lines the earlier
//! rules left unclaimed:
//! 1. date-cue      first line mentioning a weekday, month or relative day
//! 2. venue-cue     first later line shaped like "Place, Street" (after the title)
//! 3. title         longest line other than the venue
//! 4. location-cue  first multi-word line that is neither the date nor the title
//! 5. title-fallback  a title that is really the date line gets replaced

/// Substrings that mark a line as a date/time snippet (matched lower-cased).
pub const DATE_CUES: &[&str] = &[
    "mon", "tue", "wed", "thu", "fri", "sat", "sun", //
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    "today", "tomorrow", "tonight", "this week", "next week",
];

const VENUE_SEPARATORS: &[char] = &[',', '·', '@'];

pub fn is_date_cue(line: &str) -> bool {
    let lower = line.trim().to_lowercase();
    DATE_CUES.iter().any(|cue| lower.contains(cue))
}

/// Plausible place line: more than one word and longer than five characters.
pub fn is_location_cue(line: &str) -> bool {
    let t = line.trim();
    t.split_whitespace().count() > 1 && t.chars().count() > 5
}

pub fn is_venue_marked(line: &str) -> bool {
    is_location_cue(line) && line.contains(VENUE_SEPARATORS)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLines {
    pub title: String,
    pub date_time: Option<String>,
    pub location: Option<String>,
}

/// Index of the longest line among `candidates`; ties keep the first.
fn longest(lines: &[&str], candidates: impl Iterator<Item = usize>) -> Option<usize> {
    let mut best: Option<usize> = None;
    for i in candidates {
        match best {
            Some(b) if lines[i].chars().count() <= lines[b].chars().count() => {}
            _ => best = Some(i),
        }
    }
    best
}

pub fn parse_lines(text: &str) -> ParsedLines {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    if lines.is_empty() {
        return ParsedLines {
            title: text.trim().to_string(),
            date_time: None,
            location: None,
        };
    }

    // 1) date-cue
    let date_idx = lines.iter().position(|l| is_date_cue(l));
    let not_date = |i: &usize| Some(*i) != date_idx;

    // 2) venue-cue: only once some other non-date line has been seen, since
    //    event cards put the name before the place.
    let venue_idx = (0..lines.len())
        .filter(not_date)
        .skip(1)
        .find(|&i| is_venue_marked(lines[i]));

    // 3) title; the date line may win here and is handled by rule 5
    let mut title_idx = longest(&lines, (0..lines.len()).filter(|i| Some(*i) != venue_idx))
        .or_else(|| longest(&lines, 0..lines.len()))
        .unwrap_or(0);

    // 4) location-cue
    let location_idx = venue_idx
        .filter(|&v| lines[v] != lines[title_idx])
        .or_else(|| {
            (0..lines.len())
                .filter(not_date)
                .find(|&i| is_location_cue(lines[i]) && lines[i] != lines[title_idx])
        });

    // 5) title-fallback
    if let Some(d) = date_idx {
        if lines[title_idx] == lines[d] {
            if let Some(i) = (d + 1..lines.len())
                .find(|&i| !is_date_cue(lines[i]) && !is_location_cue(lines[i]))
            {
                title_idx = i;
            }
        }
    }

    ParsedLines {
        title: lines[title_idx].to_string(),
        date_time: date_idx.map(|i| lines[i].to_string()),
        location: location_idx.map(|i| lines[i].to_string()),
    }
}
