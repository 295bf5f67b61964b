//! Course records and the shaper that produces them from loose input.
//!
//! Course lists arrive from catalog rows and AI suggestions with
//! inconsistent fields: the code may be embedded in the name, the title
//! may be missing, ids may be numbers. [`CourseShaper::shape`] turns a
//! [`RawCourse`] into a canonical [`CourseRecord`], optionally enriched
//! from an injected [`Catalog`].

use std::collections::HashMap;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Description used when neither the input nor the catalog has one.
pub const DEFAULT_DESCRIPTION: &str = "Course details coming soon.";

/// Credits used when neither the input nor the catalog has a count.
pub const DEFAULT_CREDITS: u32 = 3;

/// A canonical course: the resolver's input. Never mutated by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseRecord {
    /// Opaque identifier; may be empty.
    pub id: String,
    /// Course code such as `ICS 111`; may be empty.
    pub code: String,
    /// Display name.
    pub name: String,
    pub credits: u32,
    /// Free-text location hint.
    pub location: String,
    pub description: String,
}

/// A JSON scalar that may arrive as a number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Interpret as a positive credit count. Text is parsed; fractional
    /// values are rounded. Zero, negative, and unparsable values yield
    /// `None`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn as_credits(&self) -> Option<u32> {
        let value = match self {
            Self::Integer(n) => {
                return u32::try_from(*n).ok().filter(|&n| n > 0);
            }
            Self::Float(f) => *f,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        (0.5..=f64::from(u32::MAX))
            .contains(&value)
            .then(|| value.round() as u32)
    }

    /// Whether this scalar carries no usable value (an empty string).
    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(s) if s.trim().is_empty())
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Loosely-typed course input: a catalog row or an AI suggestion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCourse {
    pub id: Option<Scalar>,
    pub name: Option<String>,
    pub title: Option<String>,
    pub code: Option<String>,
    pub course_code: Option<String>,
    pub credits: Option<Scalar>,
    pub credit: Option<Scalar>,
    pub num_units: Option<Scalar>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub course_desc: Option<String>,
}

/// One catalog row, in the catalog's own field names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogEntry {
    pub course_prefix: String,
    pub course_number: String,
    pub course_title: String,
    pub num_units: Option<Scalar>,
    pub dept_name: String,
    pub course_desc: String,
}

impl CatalogEntry {
    /// Lookup key: prefix and number joined, normalized by
    /// [`normalize_code`].
    #[must_use]
    pub fn key(&self) -> String {
        normalize_code(&format!("{} {}", self.course_prefix, self.course_number))
    }
}

/// Immutable course catalog keyed by normalized code.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: HashMap<String, CatalogEntry>,
}

impl Catalog {
    /// Index catalog rows. Rows with an empty key are skipped; later rows
    /// replace earlier rows with the same key.
    #[must_use]
    pub fn new(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let entries = entries
            .into_iter()
            .filter_map(|entry| {
                let key = entry.key();
                (!key.is_empty()).then_some((key, entry))
            })
            .collect();
        Self { entries }
    }

    /// Look up a row by code or name (normalized by [`normalize_code`]).
    #[must_use]
    pub fn lookup(&self, code_or_name: &str) -> Option<&CatalogEntry> {
        self.entries.get(&normalize_code(code_or_name))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Normalize a course code for catalog lookup: lower-case with all
/// whitespace removed.
///
/// ```
/// use pathway_engine::course::normalize_code;
///
/// assert_eq!(normalize_code("ICS 111"), "ics111");
/// assert_eq!(normalize_code(" Math\t241 "), "math241");
/// ```
#[must_use]
pub fn normalize_code(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Turns [`RawCourse`] input into [`CourseRecord`]s.
#[derive(Debug, Clone)]
pub struct CourseShaper {
    code_fragment: Regex,
    default_location: String,
}

impl CourseShaper {
    /// Code-shaped fragment: 2-4 capitals, optional whitespace, 3 digits,
    /// optional capital suffix.
    const CODE_FRAGMENT: &'static str = r"([A-Z]{2,4})\s*([0-9]{3}[A-Z]?)";

    /// Build a shaper that labels location-less courses with
    /// `default_location`.
    ///
    /// # Errors
    ///
    /// Returns an error if the code-fragment pattern fails to compile.
    pub fn new(default_location: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            code_fragment: Regex::new(Self::CODE_FRAGMENT)?,
            default_location: default_location.to_string(),
        })
    }

    /// Shape one raw course. `fallback_id` is used for the id (and code and
    /// name, when nothing better exists); it is typically the list index.
    #[must_use]
    pub fn shape(
        &self,
        raw: &RawCourse,
        fallback_id: &str,
        catalog: Option<&Catalog>,
    ) -> CourseRecord {
        let raw_name = non_empty(raw.name.as_deref()).unwrap_or_default();
        let fragment = self
            .code_fragment
            .find(raw_name)
            .map(|m| m.as_str());
        let catalog_key = normalize_code(fragment.unwrap_or(raw_name));
        let entry = catalog.and_then(|c| {
            if catalog_key.is_empty() {
                None
            } else {
                c.lookup(&catalog_key)
            }
        });
        let catalog_title = entry.and_then(|e| non_empty(Some(&e.course_title)));

        let code = fragment
            .or_else(|| non_empty(raw.course_code.as_deref()))
            .or_else(|| non_empty(raw.code.as_deref()))
            .or_else(|| non_empty(Some(raw_name)))
            .unwrap_or(fallback_id)
            .to_string();

        let mut name = if let Some(title) = non_empty(raw.title.as_deref()) {
            title.to_string()
        } else if let Some(fragment) = fragment {
            let rest = raw_name
                .replacen(fragment, "", 1)
                .trim_start_matches(|c: char| c.is_whitespace() || c == '-' || c == ':')
                .trim()
                .to_string();
            if rest.is_empty() {
                catalog_title.unwrap_or(raw_name).to_string()
            } else {
                rest
            }
        } else {
            catalog_title
                .or_else(|| non_empty(Some(raw_name)))
                .map_or_else(|| format!("Course {fallback_id}"), str::to_string)
        };
        if name.is_empty() || name == code {
            name = catalog_title.unwrap_or("Course").to_string();
        }

        let credits = raw
            .credits
            .as_ref()
            .and_then(Scalar::as_credits)
            .or_else(|| entry.and_then(|e| e.num_units.as_ref()?.as_credits()))
            .or_else(|| raw.credit.as_ref().and_then(Scalar::as_credits))
            .or_else(|| raw.num_units.as_ref().and_then(Scalar::as_credits))
            .unwrap_or(DEFAULT_CREDITS);

        let id = raw
            .id
            .as_ref()
            .filter(|id| !id.is_blank())
            .map(ToString::to_string)
            .or_else(|| (!catalog_key.is_empty()).then(|| catalog_key.clone()))
            .unwrap_or_else(|| fallback_id.to_string());

        let location = non_empty(raw.location.as_deref())
            .or_else(|| entry.and_then(|e| non_empty(Some(&e.dept_name))))
            .unwrap_or(&self.default_location)
            .to_string();

        let description = non_empty(raw.description.as_deref())
            .or_else(|| non_empty(raw.course_desc.as_deref()))
            .or_else(|| entry.and_then(|e| non_empty(Some(&e.course_desc))))
            .unwrap_or(DEFAULT_DESCRIPTION)
            .to_string();

        CourseRecord {
            id,
            code,
            name,
            credits,
            location,
            description,
        }
    }

    /// Shape a list, using each item's index as its fallback id.
    #[must_use]
    pub fn shape_all(&self, raw: &[RawCourse], catalog: Option<&Catalog>) -> Vec<CourseRecord> {
        raw.iter()
            .enumerate()
            .map(|(i, course)| self.shape(course, &i.to_string(), catalog))
            .collect()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}
