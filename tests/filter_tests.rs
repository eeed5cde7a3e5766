use pathscan::engine::{Admission, CATCH_ALL_PATTERN, FilterRuleSet};
use pathscan::{EntryType, FilterRule, RuleKind};

fn rule_set(rules: &[FilterRule]) -> FilterRuleSet {
    FilterRuleSet::new(rules).unwrap()
}

// --- default (no rules) ---

#[test]
fn test_no_rules_admits_everything() {
    let set = rule_set(&[]);
    for name in ["a.txt", ".git", "node_modules", "", "weird name [1]"] {
        assert!(set.permits(EntryType::Dir, name));
        assert!(set.permits(EntryType::File, name));
        assert_eq!(set.check(EntryType::File, name), Admission::Implicit);
    }
}

// --- synthesized catch-all ---

#[test]
fn test_include_only_rejects_non_matching() {
    let set = rule_set(&[FilterRule::include_file("*.txt")]);
    assert!(set.permits(EntryType::File, "a.txt"));
    assert!(!set.permits(EntryType::File, "b.log"));
    assert!(!set.permits(EntryType::File, ".hidden"));
    assert_eq!(
        set.check(EntryType::File, "b.log"),
        Admission::Excluded(CATCH_ALL_PATTERN.to_string())
    );
}

#[test]
fn test_catch_all_only_for_type_with_includes() {
    let set = rule_set(&[FilterRule::include_file("*.txt")]);
    assert!(set.permits(EntryType::Dir, "anything"));
    assert_eq!(set.rules(EntryType::Dir).excludes().count(), 0);
    assert_eq!(
        set.rules(EntryType::File).excludes().collect::<Vec<_>>(),
        vec![CATCH_ALL_PATTERN]
    );
}

#[test]
fn test_catch_all_appended_after_explicit_excludes() {
    let set = rule_set(&[
        FilterRule::exclude_dir("target"),
        FilterRule::include_dir("src*"),
    ]);
    assert_eq!(
        set.rules(EntryType::Dir).excludes().collect::<Vec<_>>(),
        vec!["target", CATCH_ALL_PATTERN]
    );
    assert!(set.permits(EntryType::Dir, "src"));
    assert!(!set.permits(EntryType::Dir, "target"));
    assert!(!set.permits(EntryType::Dir, "docs"));
}

// --- precedence ---

#[test]
fn test_include_beats_exclude() {
    let set = rule_set(&[
        FilterRule::exclude_file("*.log"),
        FilterRule::include_file("keep.log"),
    ]);
    assert_eq!(
        set.check(EntryType::File, "keep.log"),
        Admission::Included("keep.log".to_string())
    );
    assert!(!set.permits(EntryType::File, "drop.log"));
}

#[test]
fn test_exclude_without_include_keeps_default_permissive() {
    let set = rule_set(&[FilterRule::exclude_dir(".git")]);
    assert!(!set.permits(EntryType::Dir, ".git"));
    assert!(set.permits(EntryType::Dir, ".github"));
    assert!(set.permits(EntryType::File, ".git"));
}

#[test]
fn test_first_matching_pattern_reported() {
    let set = rule_set(&[
        FilterRule::include_file("*.rs"),
        FilterRule::include_file("main.*"),
    ]);
    assert_eq!(
        set.check(EntryType::File, "main.rs"),
        Admission::Included("*.rs".to_string())
    );
}

// --- glob syntax ---

#[test]
fn test_glob_question_mark_and_class() {
    let set = rule_set(&[
        FilterRule::include_file("?.c"),
        FilterRule::include_file("log[0-9]"),
    ]);
    assert!(set.permits(EntryType::File, "a.c"));
    assert!(!set.permits(EntryType::File, "ab.c"));
    assert!(set.permits(EntryType::File, "log7"));
    assert!(!set.permits(EntryType::File, "logx"));
}

#[test]
fn test_glob_star_matches_leading_dot() {
    let set = rule_set(&[FilterRule::exclude_file("*")]);
    assert!(!set.permits(EntryType::File, ".env"));
}

#[test]
fn test_repeated_stars_match_like_one() {
    let set = rule_set(&[
        FilterRule::include_file("a**"),
        FilterRule::include_file("*.tar**"),
    ]);
    assert!(set.permits(EntryType::File, "abc"));
    assert!(set.permits(EntryType::File, "a"));
    assert!(set.permits(EntryType::File, "x.tar.gz"));
    assert!(!set.permits(EntryType::File, "bac"));
    assert_eq!(
        set.rules(EntryType::File).includes().collect::<Vec<_>>(),
        vec!["a*", "*.tar*"]
    );
}

#[test]
fn test_glob_is_case_sensitive() {
    let set = rule_set(&[FilterRule::include_file("*.TXT")]);
    assert!(set.permits(EntryType::File, "A.TXT"));
    assert!(!set.permits(EntryType::File, "a.txt"));
}

#[test]
fn test_invalid_pattern_is_error() {
    let err = FilterRuleSet::new(&[FilterRule::new(
        EntryType::File,
        RuleKind::Include,
        "[unclosed",
    )])
    .unwrap_err();
    assert!(format!("{err:#}").contains("[unclosed"));
}

// --- describe ---

#[test]
fn test_describe_mentions_pattern_and_name() {
    let set = rule_set(&[FilterRule::exclude_dir(".git")]);
    let msg = set.check(EntryType::Dir, ".git").describe(EntryType::Dir, ".git");
    assert!(msg.contains("EXCLUDED"));
    assert!(msg.contains("[dir]"));
    assert!(msg.contains("[.git]"));
}
