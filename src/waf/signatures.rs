//! Categorized attack-signature detection.
//!
//! Rule sets are compiled once at process start and are immutable for the
//! process lifetime. Detection is a pure function of the payload string: one
//! matching pattern anywhere is sufficient to block — there is no scoring.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Attack categories recognized by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttackCategory {
    SqlInjection,
    XssHtmlInjection,
    CommandInjection,
    Ssti,
    NoSqlLdapXpath,
    EmailHeaderCrlf,
    Deserialization,
}

impl fmt::Display for AttackCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttackCategory::SqlInjection => "SQL Injection",
            AttackCategory::XssHtmlInjection => "XSS / HTML Injection",
            AttackCategory::CommandInjection => "Command Injection",
            AttackCategory::Ssti => "SSTI",
            AttackCategory::NoSqlLdapXpath => "NoSQL / LDAP / XPath",
            AttackCategory::EmailHeaderCrlf => "Email Header Injection / CRLF",
            AttackCategory::Deserialization => "Object / Deserialization",
        };
        f.write_str(name)
    }
}

/// A compiled signature with its source pattern retained for audit records.
pub struct SignatureRule {
    pub pattern: &'static str,
    regex: Regex,
}

/// All rules of one category.
pub struct RuleSet {
    pub category: AttackCategory,
    pub rules: Vec<SignatureRule>,
}

/// A single detector hit: which category, which pattern.
pub type Match = (AttackCategory, &'static str);

fn compile(patterns: &[&'static str]) -> Vec<SignatureRule> {
    patterns
        .iter()
        .map(|&pattern| SignatureRule {
            pattern,
            // Case-insensitive, dot-matches-newline, as the rule corpus assumes.
            regex: Regex::new(&format!("(?is){pattern}"))
                .expect("built-in signature pattern must compile"),
        })
        .collect()
}

static RULE_SETS: LazyLock<Vec<RuleSet>> = LazyLock::new(|| {
    vec![
        RuleSet {
            category: AttackCategory::SqlInjection,
            rules: compile(&[
                r"\bunion\b.*\bselect\b",
                r"\bselect\b.*\bfrom\b",
                r"\bdrop\b\s+\btable\b",
                r"\bdrop\b\s+\bdatabase\b",
                r"\binsert\b\s+\binto\b",
                r"\bupdate\b.*\bset\b",
                r"\bdelete\b\s+\bfrom\b",
                r"\bor\b\s+1\s*=\s*1\b",
                r"\bexec\b",
                r"xp_cmdshell",
                r"information_schema",
                r"load_file\s*\(",
                r"outfile\b",
                r"benchmark\s*\(",
                r"\bsleep\s*\(",
            ]),
        },
        RuleSet {
            category: AttackCategory::XssHtmlInjection,
            rules: compile(&[
                // tags
                r"<\s*script\b",
                r"<\s*iframe\b",
                r"<\s*img\b",
                r"<\s*svg\b",
                r"<\s*math\b",
                r"<\s*object\b",
                r"<\s*embed\b",
                // event handlers or inline JS
                r"\bon\w+\s*=",
                r"javascript\s*:",
                r"data:text/html",
                r"document\.write",
                r"window\.location",
                r"\balert\s*\(",
            ]),
        },
        RuleSet {
            category: AttackCategory::CommandInjection,
            rules: compile(&[
                r";\s*",
                r"\b&&\b",
                r"\|\|",
                r"`[^`]*`",
                r"\$\([^\)]*\)",
                r"\bwhoami\b",
                r"\bdir\b",
                r"\bls\b",
            ]),
        },
        RuleSet {
            category: AttackCategory::Ssti,
            rules: compile(&[
                r"\{\{.*\}\}",
                r"\{%.*%\}",
                r"\$\{.*\}",
                r"<%.*%>",
                r"#\{.*\}",
            ]),
        },
        RuleSet {
            category: AttackCategory::NoSqlLdapXpath,
            rules: compile(&[
                r"\$where",
                r"\$regex",
                r"\$gt\b",
                r"\$lt\b",
                r"\(uid=",
                r"objectClass",
            ]),
        },
        RuleSet {
            category: AttackCategory::EmailHeaderCrlf,
            rules: compile(&[r"[\r\n].*(bcc:|cc:|to:)", r"[\r\n]"]),
        },
        RuleSet {
            category: AttackCategory::Deserialization,
            rules: compile(&[
                r#"O:\d+:".*":"#,
                r"a:\d+:\{",
                r"pickle\.loads",
                r"__import__",
                r"eval\s*\(",
            ]),
        },
    ]
});

/// Scan a payload against every rule set. Returns one entry per matching
/// `(category, pattern)` pair, in rule-table order.
pub fn detect(payload: &str) -> Vec<Match> {
    let mut matches = Vec::new();
    for set in RULE_SETS.iter() {
        for rule in &set.rules {
            if rule.regex.is_match(payload) {
                matches.push((set.category, rule.pattern));
            }
        }
    }
    matches
}

/// Deduplicate matches across detection passes, preserving first-seen order.
pub fn dedup_matches(matches: Vec<Match>) -> Vec<Match> {
    let mut seen = HashSet::new();
    matches.into_iter().filter(|m| seen.insert(*m)).collect()
}
