//! Course resolver: maps a [`CourseRecord`] to a [`ResolvedMeta`].
//!
//! Resolution is an explicit, ordered rule chain evaluated first-match-wins:
//!
//! 1. [`Rule::CodeKey`]: the normalized course code against the meta table.
//! 2. [`Rule::NameKey`]: the normalized display name against the same table.
//! 3. [`Rule::Pattern`]: each configured matcher, in configuration order.
//!
//! When nothing matches, the free-text location hint is resolved through
//! the [`BuildingRegistry`] (which itself falls back) and time, duration,
//! and color are left unset for the schedule builder to synthesize.
//! Resolution never fails.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, MatcherSpec};
use crate::course::CourseRecord;
use crate::registry::{BuildingRegistry, normalize_key};

/// Partial resolution result: a location plus whatever timing and color
/// the matching rule supplies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedMeta {
    /// Location key (canonical once the resolver is built).
    pub location: String,
    /// Start, in minutes from midnight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_minutes: Option<i32>,
    /// Duration in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i32>,
    /// CSS color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl ResolvedMeta {
    /// Meta placing a course at `location` with nothing else set.
    #[must_use]
    pub fn at(location: &str) -> Self {
        Self {
            location: location.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn starting_at(mut self, minutes: i32) -> Self {
        self.start_minutes = Some(minutes);
        self
    }

    #[must_use]
    pub const fn lasting(mut self, minutes: i32) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    #[must_use]
    pub fn colored(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }
}

/// Which course field a pattern matcher is tested against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchField {
    /// The display name.
    #[default]
    Name,
    /// The course code.
    Code,
    /// The code when non-empty, otherwise the name.
    CodeOrName,
}

impl MatchField {
    /// The text this field selects from `course`.
    #[must_use]
    pub fn select(self, course: &CourseRecord) -> &str {
        match self {
            Self::Name => &course.name,
            Self::Code => &course.code,
            Self::CodeOrName if course.code.trim().is_empty() => &course.name,
            Self::CodeOrName => &course.code,
        }
    }
}

/// A compiled, case-insensitive pattern matcher.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    regex: Regex,
    field: MatchField,
    meta: ResolvedMeta,
}

impl PatternMatcher {
    /// Whether the matcher's pattern matches the selected field of `course`.
    #[must_use]
    pub fn matches(&self, course: &CourseRecord) -> bool {
        self.regex.is_match(self.field.select(course))
    }

    /// The pattern source.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    #[must_use]
    pub const fn field(&self) -> MatchField {
        self.field
    }

    #[must_use]
    pub const fn meta(&self) -> &ResolvedMeta {
        &self.meta
    }
}

/// One step of the rule chain.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Exact match on the normalized course code.
    CodeKey,
    /// Exact match on the normalized display name.
    NameKey,
    /// A configured pattern matcher.
    Pattern(PatternMatcher),
}

/// Which rule produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedBy {
    CodeKey,
    NameKey,
    /// Index into the configured matcher list.
    Matcher(usize),
    /// No rule matched; the location came from the course's location hint.
    LocationHint,
}

impl std::fmt::Display for ResolvedBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CodeKey => f.write_str("code key"),
            Self::NameKey => f.write_str("name key"),
            Self::Matcher(i) => write!(f, "matcher {i}"),
            Self::LocationHint => f.write_str("location hint"),
        }
    }
}

/// The ordered rule chain over a shared registry and meta table.
#[derive(Debug, Clone)]
pub struct CourseResolver {
    registry: Arc<BuildingRegistry>,
    table: HashMap<String, ResolvedMeta>,
    rules: Vec<Rule>,
}

impl CourseResolver {
    /// Compile the meta table and matchers.
    ///
    /// Meta locations are canonicalized through the registry (so aliases
    /// are accepted) and table keys are normalized.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownLocation`] when a meta entry or
    /// matcher names a location the registry cannot resolve, and
    /// [`ConfigError::InvalidPattern`] when a matcher fails to compile.
    pub fn new(
        registry: Arc<BuildingRegistry>,
        course_meta: &BTreeMap<String, ResolvedMeta>,
        matchers: &[MatcherSpec],
    ) -> Result<Self, ConfigError> {
        let canonical = |context: String, meta: &ResolvedMeta| -> Result<ResolvedMeta, ConfigError> {
            let key = registry
                .try_resolve_key(&meta.location)
                .ok_or_else(|| ConfigError::UnknownLocation {
                    context,
                    key: meta.location.clone(),
                })?;
            Ok(ResolvedMeta {
                location: key.to_string(),
                ..meta.clone()
            })
        };

        let mut table = HashMap::with_capacity(course_meta.len());
        for (key, meta) in course_meta {
            let meta = canonical(format!("course meta {key:?}"), meta)?;
            table.insert(normalize_key(key), meta);
        }

        let mut rules = Vec::with_capacity(matchers.len() + 2);
        rules.push(Rule::CodeKey);
        rules.push(Rule::NameKey);
        for (index, spec) in matchers.iter().enumerate() {
            let regex = RegexBuilder::new(&spec.pattern)
                .case_insensitive(true)
                .build()
                .map_err(|source| ConfigError::InvalidPattern { index, source })?;
            rules.push(Rule::Pattern(PatternMatcher {
                regex,
                field: spec.field,
                meta: canonical(format!("matcher {index}"), &spec.meta)?,
            }));
        }

        Ok(Self {
            registry,
            table,
            rules,
        })
    }

    /// The rule chain in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    #[must_use]
    pub fn registry(&self) -> &BuildingRegistry {
        &self.registry
    }

    /// Resolve a course. Never fails.
    #[must_use]
    pub fn resolve(&self, course: &CourseRecord) -> ResolvedMeta {
        self.resolve_with_rule(course).0
    }

    /// Resolve a course and report which rule matched.
    #[must_use]
    pub fn resolve_with_rule(&self, course: &CourseRecord) -> (ResolvedMeta, ResolvedBy) {
        let mut matcher_index = 0;
        for rule in &self.rules {
            let hit = match rule {
                Rule::CodeKey => self
                    .table_entry(&course.code)
                    .map(|meta| (meta.clone(), ResolvedBy::CodeKey)),
                Rule::NameKey => self
                    .table_entry(&course.name)
                    .map(|meta| (meta.clone(), ResolvedBy::NameKey)),
                Rule::Pattern(matcher) => {
                    let index = matcher_index;
                    matcher_index += 1;
                    matcher
                        .matches(course)
                        .then(|| (matcher.meta.clone(), ResolvedBy::Matcher(index)))
                }
            };
            if let Some((meta, by)) = hit {
                tracing::trace!(
                    code = %course.code,
                    name = %course.name,
                    rule = %by,
                    location = %meta.location,
                    "resolved course"
                );
                return (meta, by);
            }
        }

        if self.registry.try_resolve_key(&course.location).is_none() {
            tracing::debug!(
                code = %course.code,
                hint = %course.location,
                fallback = %self.registry.fallback().key,
                "unresolved location hint, using fallback"
            );
        }
        let location = self.registry.resolve_key(&course.location).to_string();
        (ResolvedMeta::at(&location), ResolvedBy::LocationHint)
    }

    fn table_entry(&self, text: &str) -> Option<&ResolvedMeta> {
        let key = normalize_key(text);
        if key.is_empty() {
            return None;
        }
        self.table.get(&key)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::CampusConfig;

    fn manoa() -> CourseResolver {
        let config = CampusConfig::default();
        let registry = BuildingRegistry::new(
            &config.locations,
            &config.aliases,
            &config.fallback_location,
        )
        .unwrap();
        CourseResolver::new(Arc::new(registry), &config.course_meta, &config.matchers).unwrap()
    }

    fn course(code: &str, name: &str) -> CourseRecord {
        CourseRecord {
            code: code.to_string(),
            name: name.to_string(),
            ..CourseRecord::default()
        }
    }

    #[test]
    fn code_key_wins_first() {
        let (meta, by) = manoa().resolve_with_rule(&course("ICS 111", "Lab Science"));
        assert_eq!(by, ResolvedBy::CodeKey);
        assert_eq!(meta.location, "post");
        assert_eq!(meta.start_minutes, Some(510));
        assert_eq!(meta.duration_minutes, Some(75));
    }

    #[test]
    fn name_key_matches_when_code_misses() {
        let (meta, by) = manoa().resolve_with_rule(&course("XYZ 999", "Elective"));
        assert_eq!(by, ResolvedBy::NameKey);
        assert_eq!(meta.location, "campuscenter");
        assert_eq!(meta.start_minutes, Some(840));
    }

    #[test]
    fn empty_code_lab_goes_to_lab_building() {
        let (meta, by) = manoa().resolve_with_rule(&course("", "Intro Lab"));
        assert_eq!(by, ResolvedBy::Matcher(2));
        assert_eq!(meta.location, "watanabe");
        assert_eq!(meta.duration_minutes, Some(105));
    }

    #[test]
    fn lab_match_is_case_insensitive() {
        let meta = manoa().resolve(&course("", "ADVANCED LABORATORY"));
        assert_eq!(meta.location, "watanabe");
    }

    #[test]
    fn writing_lab_takes_earlier_matcher() {
        let (meta, by) = manoa().resolve_with_rule(&course("", "Writing Lab"));
        assert_eq!(by, ResolvedBy::Matcher(1));
        assert_eq!(meta.location, "kuykendall");
        assert_eq!(meta.duration_minutes, Some(65));
    }

    #[test]
    fn code_or_name_uses_name_when_code_empty() {
        let (meta, by) = manoa().resolve_with_rule(&course("", "HSL 101 Intro"));
        assert_eq!(by, ResolvedBy::Matcher(0));
        assert_eq!(meta.location, "moore");
    }

    #[test]
    fn code_or_name_prefers_code() {
        // Code "HSL 399" is not in the table; the matcher sees the code.
        let (meta, by) = manoa().resolve_with_rule(&course("HSL 399", "Storytelling"));
        assert_eq!(by, ResolvedBy::Matcher(0));
        assert_eq!(meta.location, "moore");
    }

    #[test]
    fn unmatched_course_uses_location_hint() {
        let mut c = course("PHIL 100", "Introduction to Ethics");
        c.location = "Sakamaki Hall".to_string();
        let (meta, by) = manoa().resolve_with_rule(&c);
        assert_eq!(by, ResolvedBy::LocationHint);
        // The hint does not normalize to any key or alias.
        assert_eq!(meta.location, "campuscenter");
        assert_eq!(meta.start_minutes, None);
        assert_eq!(meta.duration_minutes, None);
        assert_eq!(meta.color, None);

        c.location = "Saunders Hall".to_string();
        assert_eq!(manoa().resolve(&c).location, "saunders");
    }

    #[test]
    fn resolution_never_fails_on_empty_course() {
        let (meta, by) = manoa().resolve_with_rule(&CourseRecord::default());
        assert_eq!(by, ResolvedBy::LocationHint);
        assert_eq!(meta.location, "campuscenter");
    }

    #[test]
    fn chain_starts_with_table_rules() {
        let resolver = manoa();
        assert!(matches!(resolver.rules()[0], Rule::CodeKey));
        assert!(matches!(resolver.rules()[1], Rule::NameKey));
        assert_eq!(resolver.rules().len(), 9);
        match &resolver.rules()[4] {
            Rule::Pattern(m) => {
                assert_eq!(m.pattern(), "math|calculus|f[q]");
                assert_eq!(m.field(), MatchField::Name);
                assert_eq!(m.meta().location, "keller");
            }
            other => panic!("expected pattern rule, got {other:?}"),
        }
    }

    #[test]
    fn meta_locations_are_canonicalized() {
        let config = CampusConfig::default();
        let registry = Arc::new(
            BuildingRegistry::new(&config.locations, &config.aliases, "campuscenter").unwrap(),
        );
        let mut meta = BTreeMap::new();
        meta.insert("ICS 999".to_string(), ResolvedMeta::at("Keller Hall"));
        let resolver = CourseResolver::new(registry, &meta, &[]).unwrap();
        assert_eq!(resolver.resolve(&course("ics999", "")).location, "keller");
    }

    #[test]
    fn unknown_meta_location_rejected() {
        let config = CampusConfig::default();
        let registry = Arc::new(
            BuildingRegistry::new(&config.locations, &config.aliases, "campuscenter").unwrap(),
        );
        let matchers = vec![MatcherSpec {
            pattern: "x".to_string(),
            field: MatchField::Name,
            meta: ResolvedMeta::at("atlantis"),
        }];
        let err = CourseResolver::new(registry, &BTreeMap::new(), &matchers).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownLocation { key, .. } if key == "atlantis"));
    }

    #[test]
    fn invalid_pattern_rejected() {
        let config = CampusConfig::default();
        let registry = Arc::new(
            BuildingRegistry::new(&config.locations, &config.aliases, "campuscenter").unwrap(),
        );
        let matchers = vec![MatcherSpec {
            pattern: "(unclosed".to_string(),
            field: MatchField::Name,
            meta: ResolvedMeta::at("post"),
        }];
        let err = CourseResolver::new(registry, &BTreeMap::new(), &matchers).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { index: 0, .. }));
    }

    #[test]
    fn match_field_serde_is_kebab_case() {
        let json = serde_json::to_string(&MatchField::CodeOrName).unwrap();
        assert_eq!(json, "\"code-or-name\"");
        let field: MatchField = serde_json::from_str("\"code\"").unwrap();
        assert_eq!(field, MatchField::Code);
    }

    #[test]
    fn resolved_meta_omits_unset_fields() {
        let json = serde_json::to_string(&ResolvedMeta::at("post")).unwrap();
        assert_eq!(json, r#"{"location":"post"}"#);
    }
}
