use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use std::path::Path;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Last path segment of `url` without its extension.
pub fn name_from_url(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let segment = parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .next_back()?
        .to_string();
    let stem = Path::new(&segment).file_stem()?.to_string_lossy().into_owned();
    (!stem.is_empty()).then_some(stem)
}

/// `tools/<year>/<month>/<day>/<name>[-thumbnail]-<unix seconds>.png`
///
/// Keys are only unique to the second: two uploads of the same source within
/// one second collide.
pub fn derive_key(clock: &dyn Clock, source_url: Option<&str>, is_thumbnail: bool) -> String {
    let now = clock.now();
    let mut name = source_url
        .and_then(name_from_url)
        .unwrap_or_else(|| rand::thread_rng().gen_range(1..=1000).to_string());

    if is_thumbnail {
        name.push_str("-thumbnail");
    }

    format!(
        "tools/{}/{}/{}/{}-{}.png",
        now.year(),
        now.month(),
        now.day(),
        name,
        now.timestamp()
    )
}
