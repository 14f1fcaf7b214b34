//! Calendar Codec
//!
//! Renders a match list into iCalendar text. Output depends only on the
//! matches and the `hide_scores` flag: no clock reads, fixed field order,
//! CRLF line endings. `DTSTAMP` reuses the start time for the same reason.

use std::fmt::Write;

use chrono::{DateTime, Duration, Utc};

use crate::source::Match;

/// Domain used in per-match `UID`s.
pub const UID_DOMAIN: &str = "esportscalendar.app";

const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const UNKNOWN_TEAM: &str = "TBD";

/// Renders `matches` as a VCALENDAR document.
///
/// Matches without a start time are skipped. Each event lasts one hour per
/// game in the match; a match with no games is a zero-length event.
pub fn render(matches: &[Match], hide_scores: bool) -> String {
    let mut ics = String::new();

    push_line(&mut ics, "BEGIN:VCALENDAR");
    push_line(&mut ics, "VERSION:2.0");
    push_line(&mut ics, "PRODID:-//EsportsCalendar//EN");
    push_line(&mut ics, "CALSCALE:GREGORIAN");
    push_line(&mut ics, "X-WR-CALNAME:Esports Calendar");
    push_line(&mut ics, "X-WR-TIMEZONE:UTC");

    for m in matches {
        if let Some(start) = m.expected_start_time {
            render_event(&mut ics, m, start, hide_scores);
        }
    }

    push_line(&mut ics, "END:VCALENDAR");
    ics
}

fn render_event(ics: &mut String, m: &Match, start: DateTime<Utc>, hide_scores: bool) {
    let end = start + Duration::hours(i64::from(m.amount_of_games.max(0)));

    push_line(ics, "BEGIN:VEVENT");
    push_line(ics, &format!("UID:{}@{}", m.id, UID_DOMAIN));
    push_line(ics, &format!("DTSTAMP:{}", timestamp(start)));
    push_line(ics, &format!("DTSTART:{}", timestamp(start)));
    push_line(ics, &format!("DTEND:{}", timestamp(end)));
    push_line(ics, &format!("SUMMARY:{}", escape_text(&summary(m, hide_scores))));
    push_line(
        ics,
        &format!("DESCRIPTION:{}", escape_text(&description(m, hide_scores))),
    );
    if let Some(location) = location(m) {
        push_line(ics, &format!("LOCATION:{}", escape_text(&location)));
    }
    push_line(ics, "STATUS:CONFIRMED");
    push_line(ics, "END:VEVENT");
}

fn push_line(ics: &mut String, line: &str) {
    ics.push_str(line);
    ics.push_str("\r\n");
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

fn score(m: &Match) -> String {
    format!("[{}-{}]", m.team1_score, m.team2_score)
}

/// `[Game] Tournament - Name [1-2]`
fn summary(m: &Match, hide_scores: bool) -> String {
    let mut summary = format!("[{}] ", m.game_name);
    if !m.tournament_name.is_empty() {
        let _ = write!(summary, "{} - ", m.tournament_name);
    }
    summary.push_str(&m.name);
    if m.finished && !hide_scores {
        let _ = write!(summary, " {}", score(m));
    }
    summary
}

/// `Team1 vs Team2 [1-2] - Tournament - League (Game)`
fn description(m: &Match, hide_scores: bool) -> String {
    let team = |name: &str| {
        if name.is_empty() {
            UNKNOWN_TEAM.to_string()
        } else {
            name.to_string()
        }
    };

    let mut description = format!("{} vs {}", team(&m.team1_name), team(&m.team2_name));
    if m.finished {
        if hide_scores {
            description.push_str(" [Finished]");
        } else {
            let _ = write!(description, " {}", score(m));
        }
    }
    let _ = write!(
        description,
        " - {} - {} ({})",
        m.tournament_name, m.league_name, m.game_name
    );
    description
}

/// Non-empty league and series names joined with ` - `, or None.
fn location(m: &Match) -> Option<String> {
    let parts: Vec<&str> = [m.league_name.as_str(), m.series_name.as_str()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" - "))
    }
}

/// Escapes a TEXT value: backslash first, then comma, semicolon and newline.
pub fn escape_text(value: &str) -> String {
    value
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\\', "\\\\")
        .replace(',', "\\,")
        .replace(';', "\\;")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::tests::sample_match;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
    }

    fn event_lines<'a>(ics: &'a str, prefix: &str) -> Vec<&'a str> {
        ics.split("\r\n").filter(|l| l.starts_with(prefix)).collect()
    }

    /// True if every `\` in the value starts a valid escape and no raw
    /// `,` or `;` is left.
    fn balanced(value: &str) -> bool {
        let mut chars = value.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some('\\' | ',' | ';' | 'n') => {}
                    _ => return false,
                },
                ',' | ';' | '\n' | '\r' => return false,
                _ => {}
            }
        }
        true
    }

    #[test]
    fn test_single_upcoming_match() {
        let start = at(2026, 10, 19, 18);
        let ics = render(&[sample_match(7, "A vs B", Some(start))], false);

        assert!(ics.starts_with("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n"));
        assert!(ics.ends_with("END:VCALENDAR\r\n"));
        assert_eq!(event_lines(&ics, "BEGIN:VEVENT").len(), 1);
        assert_eq!(event_lines(&ics, "UID:"), vec!["UID:7@esportscalendar.app"]);
        assert_eq!(event_lines(&ics, "DTSTART:"), vec!["DTSTART:20261019T180000Z"]);
        assert_eq!(event_lines(&ics, "DTEND:"), vec!["DTEND:20261019T190000Z"]);

        // unfinished: no score suffix
        assert_eq!(event_lines(&ics, "SUMMARY:"), vec!["SUMMARY:[LoL] Playoffs - A vs B"]);
        assert_eq!(event_lines(&ics, "DTSTAMP:"), vec!["DTSTAMP:20261019T180000Z"]);
    }

    #[test]
    fn test_duration_scales_with_games() {
        let mut m = sample_match(1, "A vs B", Some(at(2026, 1, 1, 10)));
        m.amount_of_games = 5;

        let ics = render(&[m], false);
        assert_eq!(event_lines(&ics, "DTEND:"), vec!["DTEND:20260101T150000Z"]);
    }

    #[test]
    fn test_zero_games_is_zero_length_event() {
        let mut m = sample_match(1, "A vs B", Some(at(2026, 1, 1, 10)));
        m.amount_of_games = 0;

        let ics = render(&[m], false);
        assert_eq!(event_lines(&ics, "DTSTART:"), vec!["DTSTART:20260101T100000Z"]);
        assert_eq!(event_lines(&ics, "DTEND:"), vec!["DTEND:20260101T100000Z"]);
    }

    #[test]
    fn test_finished_match_shows_score() {
        let mut m = sample_match(1, "A vs B", Some(at(2026, 1, 1, 10)));
        m.finished = true;
        m.team1_score = 2;
        m.team2_score = 1;

        let ics = render(&[m], false);
        assert_eq!(
            event_lines(&ics, "SUMMARY:"),
            vec!["SUMMARY:[LoL] Playoffs - A vs B [2-1]"]
        );
        assert_eq!(
            event_lines(&ics, "DESCRIPTION:"),
            vec!["DESCRIPTION:A vs B [2-1] - Playoffs - LEC (LoL)"]
        );
    }

    #[test]
    fn test_hide_scores_replaces_score_with_finished() {
        let mut m = sample_match(1, "A vs B", Some(at(2026, 1, 1, 10)));
        m.finished = true;
        m.team1_score = 2;
        m.team2_score = 1;

        let ics = render(&[m], true);
        assert_eq!(
            event_lines(&ics, "SUMMARY:"),
            vec!["SUMMARY:[LoL] Playoffs - A vs B"]
        );
        assert_eq!(
            event_lines(&ics, "DESCRIPTION:"),
            vec!["DESCRIPTION:A vs B [Finished] - Playoffs - LEC (LoL)"]
        );
        assert!(!ics.contains("2-1"));
    }

    #[test]
    fn test_unscheduled_matches_are_skipped() {
        let matches = vec![
            sample_match(1, "A vs B", None),
            sample_match(2, "C vs D", Some(at(2026, 1, 1, 10))),
        ];

        let ics = render(&matches, false);
        assert_eq!(event_lines(&ics, "UID:"), vec!["UID:2@esportscalendar.app"]);
    }

    #[test]
    fn test_empty_list_is_a_valid_calendar() {
        let ics = render(&[], false);
        assert!(ics.contains("BEGIN:VCALENDAR\r\n"));
        assert!(!ics.contains("VEVENT"));
    }

    #[test]
    fn test_location_parts() {
        let mut both = sample_match(1, "x", Some(at(2026, 1, 1, 10)));
        both.league_name = "LEC".to_string();
        both.series_name = "Summer 2026".to_string();
        let mut league_only = both.clone();
        league_only.series_name.clear();
        let mut neither = both.clone();
        neither.league_name.clear();
        neither.series_name.clear();

        assert_eq!(location(&both).as_deref(), Some("LEC - Summer 2026"));
        assert_eq!(location(&league_only).as_deref(), Some("LEC"));
        assert_eq!(location(&neither), None);

        let ics = render(&[neither], false);
        assert!(!ics.contains("LOCATION"));
    }

    #[test]
    fn test_missing_team_names_render_as_tbd() {
        let mut m = sample_match(1, "TBD vs TBD", Some(at(2026, 1, 1, 10)));
        m.team1_name.clear();
        m.team2_name.clear();

        let ics = render(&[m], false);
        assert!(event_lines(&ics, "DESCRIPTION:")[0].starts_with("DESCRIPTION:TBD vs TBD - "));
    }

    #[test]
    fn test_empty_tournament_is_omitted_from_summary() {
        let mut m = sample_match(1, "A vs B", Some(at(2026, 1, 1, 10)));
        m.tournament_name.clear();

        let ics = render(&[m], false);
        assert_eq!(event_lines(&ics, "SUMMARY:"), vec!["SUMMARY:[LoL] A vs B"]);
    }

    #[test]
    fn test_escape_order() {
        assert_eq!(escape_text(r"a\b"), r"a\\b");
        assert_eq!(escape_text("a,b;c"), r"a\,b\;c");
        assert_eq!(escape_text("line1\nline2"), r"line1\nline2");
        assert_eq!(escape_text("crlf\r\nend"), r"crlf\nend");
        // backslash before comma must not collapse into one escape
        assert_eq!(escape_text(r"\,"), r"\\\,");
    }

    #[test]
    fn test_rendering_is_deterministic_and_escaped() {
        let mut m = sample_match(1, "G2, Fnatic; \\ rematch\nday 2", Some(at(2026, 3, 4, 5)));
        m.tournament_name = "Spring; Finals".to_string();
        m.league_name = "LEC, EU".to_string();
        m.finished = true;
        let matches = vec![m, sample_match(2, "A vs B", Some(at(2026, 3, 5, 5)))];

        let first = render(&matches, false);
        let second = render(&matches, false);
        assert_eq!(first, second);

        for line in first.split("\r\n").filter(|l| !l.is_empty()) {
            let (_, value) = line.split_once(':').unwrap();
            if line.starts_with("SUMMARY")
                || line.starts_with("DESCRIPTION")
                || line.starts_with("LOCATION")
            {
                assert!(balanced(value), "unbalanced escaping in {:?}", line);
            }
        }
    }
}
