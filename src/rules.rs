//! Cache-Control rule evaluation: pick a header from a file's content type and age.

use anyhow::{Context, Result, bail};
use std::time::Duration;

use crate::utils::bloblog_toml::CacheControlSection;

const DAY_SECS: u64 = 24 * 60 * 60;

/// An age written as `<count><unit>`: `d` days, `w` weeks, `m` 30-day months, `y` 365-day years.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AgeSpec(Duration);

impl AgeSpec {
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let Some(unit) = s.chars().last() else {
            bail!("empty age");
        };
        let count: u64 = s[..s.len() - unit.len_utf8()]
            .parse()
            .with_context(|| format!("invalid age count in {s:?}"))?;
        let days_per_unit = match unit {
            'd' => 1,
            'w' => 7,
            'm' => 30,
            'y' => 365,
            other => bail!("unknown age unit {other:?} in {s:?}"),
        };
        let secs = count
            .checked_mul(days_per_unit)
            .and_then(|days| days.checked_mul(DAY_SECS))
            .with_context(|| format!("age {s:?} out of range"))?;
        Ok(AgeSpec(Duration::from_secs(secs)))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    pub fn as_secs(&self) -> u64 {
        self.0.as_secs()
    }
}

/// Files older than `item` get `max-age=<max>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgeBracket {
    pub item: AgeSpec,
    pub max: AgeSpec,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheRule {
    pub mimetypes: Vec<String>,
    pub settings: String,
    /// Ascending by `item`.
    pub brackets: Vec<AgeBracket>,
}

impl CacheRule {
    fn matches(&self, content_type: &str) -> bool {
        self.mimetypes.iter().any(|m| m == content_type)
    }
}

/// Default header plus ordered rules. Built once from config; evaluation is pure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheControlRules {
    pub default_max_age: u64,
    pub default_settings: String,
    pub rules: Vec<CacheRule>,
}

impl CacheControlRules {
    /// Parse every age in the config section. An unknown unit here aborts before any work starts.
    pub fn from_config(section: &CacheControlSection) -> Result<Self> {
        let mut rules = Vec::with_capacity(section.rules.len());
        for (i, raw) in section.rules.iter().enumerate() {
            if raw.mimetype.is_empty() {
                bail!("cache_control rule {i} has no mimetype");
            }
            let brackets = raw
                .age
                .iter()
                .map(|b| {
                    Ok(AgeBracket {
                        item: AgeSpec::parse(&b.item)?,
                        max: AgeSpec::parse(&b.max)?,
                    })
                })
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("cache_control rule {i}"))?;
            rules.push(CacheRule {
                mimetypes: raw.mimetype.clone(),
                settings: raw.settings.clone(),
                brackets,
            });
        }
        Ok(CacheControlRules {
            default_max_age: section.default.max_age,
            default_settings: section.default.settings.clone(),
            rules,
        })
    }

    pub fn default_header(&self) -> String {
        header(self.default_max_age, &self.default_settings)
    }

    /// Header for a file of `content_type` last modified at `last_modified_ns`, as seen at `now_ns`.
    ///
    /// Within a matching rule every bracket whose `item` age is exceeded overrides the previous
    /// choice. The first bracket that is not exceeded ends the evaluation for this file. A matching
    /// rule whose brackets were all exceeded lets later rules still apply.
    pub fn evaluate(&self, content_type: &str, last_modified_ns: i64, now_ns: i64) -> String {
        let elapsed = Duration::from_nanos(now_ns.saturating_sub(last_modified_ns).max(0) as u64);
        let mut chosen = self.default_header();
        for rule in self.rules.iter().filter(|r| r.matches(content_type)) {
            for bracket in &rule.brackets {
                if elapsed > bracket.item.as_duration() {
                    chosen = header(bracket.max.as_secs(), &rule.settings);
                } else {
                    return chosen;
                }
            }
        }
        chosen
    }
}

fn header(max_age: u64, settings: &str) -> String {
    if settings.is_empty() {
        format!("max-age={max_age}")
    } else {
        format!("max-age={max_age},{settings}")
    }
}
