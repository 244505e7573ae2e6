// models/match_feed.rs
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// The feed is hand-edited; `null` means the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// How long after kickoff a match without an explicit status still counts as live.
pub const LIVE_WINDOW_HOURS: i64 = 2;

// Main Match model - mirrors the JSON feed exactly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub clubs: Clubs,
    #[serde(default, deserialize_with = "null_as_default")]
    pub streams: Streams,
    #[serde(default, deserialize_with = "null_as_default")]
    pub score: Score,
    #[serde(default, deserialize_with = "null_as_default")]
    pub competition: Competition,
    #[serde(default, deserialize_with = "null_as_default")]
    pub kickoff: Kickoff,
    #[serde(default, deserialize_with = "null_as_default")]
    pub venue: Venue,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Clubs {
    #[serde(default, deserialize_with = "null_as_default")]
    pub home: Club,
    #[serde(default, deserialize_with = "null_as_default")]
    pub away: Club,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Club {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub logo: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Score {
    #[serde(default, deserialize_with = "null_as_default")]
    pub home: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub away: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String, // "FT", "LIVE", "" (upcoming)
    #[serde(
        rename = "type",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Competition {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub matchday: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Kickoff {
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String, // YYYY-MM-DD
    #[serde(default, deserialize_with = "null_as_default")]
    pub time: String, // HH:MM
    #[serde(default, deserialize_with = "null_as_default")]
    pub timezone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub city: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub country: String,
}

// Empty string = stream not available
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Streams {
    #[serde(default, deserialize_with = "null_as_default")]
    pub src1: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub src2: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hls1: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hls2: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mhls1: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mhls2: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamKind {
    #[serde(rename = "hls")]
    Hls,
    #[serde(rename = "mobile-hls")]
    MobileHls,
    #[serde(rename = "iframe")]
    Iframe,
}

impl StreamKind {
    pub fn is_hls(&self) -> bool {
        matches!(self, StreamKind::Hls | StreamKind::MobileHls)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSource {
    pub kind: StreamKind,
    pub url: String,
    pub label: String,
}

impl Streams {
    /// Available sources, desktop HLS first, then mobile HLS, then embeds.
    pub fn sources(&self) -> Vec<StreamSource> {
        let candidates = [
            (StreamKind::Hls, &self.hls1, "HD 1"),
            (StreamKind::Hls, &self.hls2, "HD 2"),
            (StreamKind::MobileHls, &self.mhls1, "Mobile 1"),
            (StreamKind::MobileHls, &self.mhls2, "Mobile 2"),
            (StreamKind::Iframe, &self.src1, "Embed 1"),
            (StreamKind::Iframe, &self.src2, "Embed 2"),
        ];

        candidates
            .into_iter()
            .filter(|(_, url, _)| !url.trim().is_empty())
            .map(|(kind, url, label)| StreamSource {
                kind,
                url: url.trim().to_string(),
                label: label.to_string(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPhase {
    Upcoming,
    Live,
    Finished,
}

impl Kickoff {
    /// Kickoff instant in UTC, if date and time parse.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").ok()?;
        let time = NaiveTime::parse_from_str(self.time.trim(), "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(self.time.trim(), "%H:%M:%S"))
            .ok()?;
        let local = NaiveDateTime::new(date, time);
        let offset = parse_utc_offset(&self.timezone).or_else(|| FixedOffset::east_opt(0))?;

        offset
            .from_local_datetime(&local)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Accepts "", "UTC", "GMT", "+03:00", "UTC+1", "GMT-05:30", "+0200".
pub fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let trimmed = raw.trim();
    let rest = trimmed
        .strip_prefix("UTC")
        .or_else(|| trimmed.strip_prefix("GMT"))
        .unwrap_or(trimmed);

    if rest.is_empty() {
        return FixedOffset::east_opt(0);
    }

    let (sign, digits) = match rest.as_bytes()[0] {
        b'+' => (1, &rest[1..]),
        b'-' => (-1, &rest[1..]),
        _ => return None,
    };

    // Feed values are untrusted; anything but ASCII digits is rejected before
    // byte-indexed splitting.
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit() || b == b':') {
        return None;
    }

    let (hours, minutes) = match digits.split_once(':') {
        Some((h, m)) => (h, m),
        None if digits.len() == 4 => digits.split_at(2),
        None => (digits, "0"),
    };
    if hours.is_empty() || minutes.is_empty() {
        return None;
    }

    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 14 || minutes > 59 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

impl Match {
    pub fn phase_at(&self, now: DateTime<Utc>) -> MatchPhase {
        match self.score.status.trim().to_ascii_uppercase().as_str() {
            "LIVE" | "HT" => return MatchPhase::Live,
            "FT" | "AET" | "PEN" => return MatchPhase::Finished,
            _ => {}
        }

        let Some(kickoff) = self.kickoff.instant() else {
            return MatchPhase::Upcoming;
        };

        let elapsed = now - kickoff;
        if elapsed < Duration::zero() {
            MatchPhase::Upcoming
        } else if elapsed <= Duration::hours(LIVE_WINDOW_HOURS) {
            MatchPhase::Live
        } else {
            MatchPhase::Finished
        }
    }

    pub fn stream_sources(&self) -> Vec<StreamSource> {
        self.streams.sources()
    }
}

// Query parameters for the match list
#[derive(Debug, Default, Deserialize)]
pub struct MatchQuery {
    pub phase: Option<MatchPhase>,
    pub competition: Option<String>,
}

impl MatchQuery {
    pub fn matches(&self, game: &Match, now: DateTime<Utc>) -> bool {
        if let Some(competition) = &self.competition {
            if &game.competition.id != competition {
                return false;
            }
        }
        match self.phase {
            Some(phase) => game.phase_at(now) == phase,
            None => true,
        }
    }
}
