//! Filter rule sets and the admission decision for directory entries.
//!
//! Precedence per entry type: any include match admits, otherwise any exclude match rejects,
//! otherwise the entry is admitted. When an entry type has include patterns, a catch-all `*`
//! exclude is appended so only matches get through.

use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};
use std::fmt;

use crate::{EntryType, FilterRule, RuleKind};

/// Pattern appended to the excludes of an entry type that has includes.
pub const CATCH_ALL_PATTERN: &str = "*";

/// Shell-style matching on a single name: `*` may match anything (including a leading dot),
/// case-sensitive.
const NAME_MATCH: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Names never contain a separator, so `**` means the same as `*`. The `glob` crate reads
/// `**` as a recursive wildcard and rejects it outside a whole path component.
fn collapse_stars(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if c == '*' && out.ends_with('*') {
            continue;
        }
        out.push(c);
    }
    out
}

/// Outcome of checking one name against a [`FilterRuleSet`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Admission {
    /// Matched an include pattern.
    Included(String),
    /// Matched an exclude pattern (and no include).
    Excluded(String),
    /// Matched nothing.
    Implicit,
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        !matches!(self, Admission::Excluded(_))
    }

    /// Human-readable description used for filter debug records.
    pub fn describe(&self, entry_type: EntryType, name: &str) -> String {
        match self {
            Admission::Included(p) => {
                format!("Entry explicitly INCLUDED: [{entry_type}] [{p}] [{name}]")
            }
            Admission::Excluded(p) => {
                format!("Entry explicitly EXCLUDED: [{entry_type}] [{p}] [{name}]")
            }
            Admission::Implicit => format!("Entry IMPLICITLY included: [{entry_type}] [{name}]"),
        }
    }
}

/// Ordered include and exclude patterns for one entry type.
#[derive(Clone, Debug, Default)]
pub struct TypeRules {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl TypeRules {
    pub fn includes(&self) -> impl Iterator<Item = &str> {
        self.include.iter().map(Pattern::as_str)
    }

    pub fn excludes(&self) -> impl Iterator<Item = &str> {
        self.exclude.iter().map(Pattern::as_str)
    }

    fn check(&self, name: &str) -> Admission {
        if let Some(p) = self.include.iter().find(|p| p.matches_with(name, NAME_MATCH)) {
            return Admission::Included(p.as_str().to_string());
        }
        if let Some(p) = self.exclude.iter().find(|p| p.matches_with(name, NAME_MATCH)) {
            return Admission::Excluded(p.as_str().to_string());
        }
        Admission::Implicit
    }
}

/// Effective rules for both entry types. Built once, read-only afterwards.
#[derive(Clone, Debug, Default)]
pub struct FilterRuleSet {
    dir: TypeRules,
    file: TypeRules,
}

impl FilterRuleSet {
    /// Compile `rules` in order. Fails on the first invalid glob pattern.
    pub fn new(rules: &[FilterRule]) -> Result<Self> {
        let mut set = Self::default();
        for rule in rules {
            let pattern = Pattern::new(&collapse_stars(&rule.pattern)).with_context(|| {
                format!(
                    "invalid {} {} pattern {:?}",
                    rule.entry_type,
                    kind_str(rule.kind),
                    rule.pattern
                )
            })?;
            let target = set.rules_mut(rule.entry_type);
            match rule.kind {
                RuleKind::Include => target.include.push(pattern),
                RuleKind::Exclude => target.exclude.push(pattern),
            }
        }
        for target in [&mut set.dir, &mut set.file] {
            if !target.include.is_empty() {
                target
                    .exclude
                    .push(Pattern::new(CATCH_ALL_PATTERN).context("catch-all pattern")?);
            }
        }
        Ok(set)
    }

    pub fn rules(&self, entry_type: EntryType) -> &TypeRules {
        match entry_type {
            EntryType::Dir => &self.dir,
            EntryType::File => &self.file,
        }
    }

    fn rules_mut(&mut self, entry_type: EntryType) -> &mut TypeRules {
        match entry_type {
            EntryType::Dir => &mut self.dir,
            EntryType::File => &mut self.file,
        }
    }

    /// Full admission decision for a base name.
    pub fn check(&self, entry_type: EntryType, name: &str) -> Admission {
        self.rules(entry_type).check(name)
    }

    pub fn permits(&self, entry_type: EntryType, name: &str) -> bool {
        self.check(entry_type, name).is_admitted()
    }
}

fn kind_str(kind: RuleKind) -> &'static str {
    match kind {
        RuleKind::Include => "include",
        RuleKind::Exclude => "exclude",
    }
}

impl fmt::Display for FilterRuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry_type in [EntryType::Dir, EntryType::File] {
            let rules = self.rules(entry_type);
            writeln!(
                f,
                "{entry_type}: include={:?} exclude={:?}",
                rules.includes().collect::<Vec<_>>(),
                rules.excludes().collect::<Vec<_>>()
            )?;
        }
        Ok(())
    }
}
