//! Root-cause hypotheses.
//!
//! A small rule table maps observed evidence to a [`HypothesisKind`]; each kind
//! carries a fixed list of recommended actions. Rules are evaluated in table
//! order and every matching rule contributes one hypothesis. When nothing
//! matches the result is a single [`HypothesisKind::Unknown`].

use crate::incident::report::{CorrelationStrength, ErrorAnalysis, MetricCorrelation};
use crate::monitoring::logging::{LogCategory, LogEntry};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Category of a suspected root cause.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HypothesisKind {
    DatabaseIssue,
    SystemOverload,
    ResourceExhaustion,
    AuthenticationDegradation,
    Unknown,
}

impl HypothesisKind {
    /// Short explanation.
    pub fn description(&self) -> &'static str {
        match self {
            HypothesisKind::DatabaseIssue => "Database connectivity or performance issue",
            HypothesisKind::SystemOverload => "System overload causing cascading failures",
            HypothesisKind::ResourceExhaustion => "Resource exhaustion on affected hosts",
            HypothesisKind::AuthenticationDegradation => "Authentication service degradation",
            HypothesisKind::Unknown => "Unknown root cause",
        }
    }

    /// Recommended actions, most urgent first.
    pub fn actions(&self) -> &'static [&'static str] {
        match self {
            HypothesisKind::DatabaseIssue => &[
                "Check database connection pool utilization",
                "Review slow query logs",
                "Verify database server health",
            ],
            HypothesisKind::SystemOverload => &[
                "Scale out affected services",
                "Check for cascading failures between dependent services",
                "Review recent deployments",
            ],
            HypothesisKind::ResourceExhaustion => &[
                "Inspect CPU and memory usage of affected hosts",
                "Scale out affected services",
                "Review recent deployments",
            ],
            HypothesisKind::AuthenticationDegradation => &[
                "Check identity provider status",
                "Review authentication error logs",
                "Verify token signing keys and expiry",
            ],
            HypothesisKind::Unknown => &[
                "Review the incident timeline manually",
                "Escalate to the on-call engineer",
            ],
        }
    }
}

impl std::fmt::Display for HypothesisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// A candidate explanation with the evidence that produced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RootCauseHypothesis {
    pub kind: HypothesisKind,
    pub description: String,
    pub evidence: Vec<String>,
}

impl RootCauseHypothesis {
    fn new(kind: HypothesisKind, evidence: Vec<String>) -> Self {
        Self {
            kind,
            description: kind.description().to_string(),
            evidence,
        }
    }
}

/// Signals the rule table inspects.
pub struct Evidence<'a> {
    pub error_analysis: &'a ErrorAnalysis,
    pub timeline: &'a [LogEntry],
    pub correlation: &'a [MetricCorrelation],
    /// Error count above which an overload is suspected
    pub overload_error_count: usize,
}

/// What a rule looks for. Keyword matches ignore case.
#[derive(Clone, Debug, PartialEq)]
pub enum Pattern {
    /// An error type containing any keyword
    ErrorTypeContains(Vec<String>),
    /// Error count above the overload threshold
    ErrorCountAboveOverload,
    /// A high correlation on a metric whose name contains any keyword
    HighCorrelationOn(Vec<String>),
    /// A log of the category whose message contains the keyword
    CategoryLogContains(LogCategory, String),
}

/// Pattern to hypothesis mapping.
#[derive(Clone, Debug, PartialEq)]
pub struct HypothesisRule {
    pub pattern: Pattern,
    pub kind: HypothesisKind,
}

fn keywords(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_lowercase()).collect()
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    let haystack = haystack.to_lowercase();
    needles.iter().any(|n| haystack.contains(&n.to_lowercase()))
}

impl HypothesisRule {
    /// Create a rule.
    pub fn new(pattern: Pattern, kind: HypothesisKind) -> Self {
        Self { pattern, kind }
    }

    /// The built-in rule table.
    pub fn defaults() -> Vec<HypothesisRule> {
        vec![
            HypothesisRule::new(
                Pattern::ErrorTypeContains(keywords(&["database", "connection"])),
                HypothesisKind::DatabaseIssue,
            ),
            HypothesisRule::new(Pattern::ErrorCountAboveOverload, HypothesisKind::SystemOverload),
            HypothesisRule::new(
                Pattern::HighCorrelationOn(keywords(&["cpu", "memory"])),
                HypothesisKind::ResourceExhaustion,
            ),
            HypothesisRule::new(
                Pattern::CategoryLogContains(LogCategory::Security, "auth".to_string()),
                HypothesisKind::AuthenticationDegradation,
            ),
        ]
    }

    /// Evidence lines if the rule matches.
    pub fn matches(&self, evidence: &Evidence<'_>) -> Option<Vec<String>> {
        let found: Vec<String> = match &self.pattern {
            Pattern::ErrorTypeContains(words) => evidence
                .error_analysis
                .error_types
                .iter()
                .filter(|(name, _)| contains_any(name, words))
                .map(|(name, count)| format!("{} x{}", name, count))
                .collect(),
            Pattern::ErrorCountAboveOverload => {
                let count = evidence.error_analysis.error_count;
                if count > evidence.overload_error_count {
                    vec![format!(
                        "{} errors exceed overload threshold of {}",
                        count, evidence.overload_error_count
                    )]
                } else {
                    Vec::new()
                }
            }
            Pattern::HighCorrelationOn(words) => evidence
                .correlation
                .iter()
                .filter(|c| c.strength == CorrelationStrength::High)
                .filter(|c| contains_any(&c.metric.name, words))
                .map(|c| format!("{} = {}", c.metric.name, c.metric.value))
                .collect(),
            Pattern::CategoryLogContains(category, word) => {
                let words = std::slice::from_ref(word);
                evidence
                    .timeline
                    .iter()
                    .filter(|e| e.category == *category && contains_any(&e.message, words))
                    .map(|e| e.message.clone())
                    .collect()
            }
        };

        if found.is_empty() {
            None
        } else {
            Some(found)
        }
    }
}

/// Apply `rules` in order. Falls back to a single Unknown hypothesis.
pub fn generate_hypotheses(
    rules: &[HypothesisRule],
    evidence: &Evidence<'_>,
) -> Vec<RootCauseHypothesis> {
    let mut hypotheses: Vec<RootCauseHypothesis> = rules
        .iter()
        .filter_map(|rule| {
            rule.matches(evidence)
                .map(|found| RootCauseHypothesis::new(rule.kind, found))
        })
        .collect();

    if hypotheses.is_empty() {
        hypotheses.push(RootCauseHypothesis::new(HypothesisKind::Unknown, Vec::new()));
    }

    hypotheses
}

/// Concatenated actions of every hypothesis, first occurrence kept.
pub fn recommended_actions(hypotheses: &[RootCauseHypothesis]) -> Vec<String> {
    let mut seen = HashSet::new();
    hypotheses
        .iter()
        .flat_map(|h| h.kind.actions().iter())
        .filter(|action| seen.insert(**action))
        .map(|action| action.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{now, TimeRange};
    use crate::incident::report::ErrorAnalysis;
    use crate::monitoring::logging::LogLevel;
    use crate::monitoring::metrics::{Metric, MetricValue};
    use std::collections::BTreeMap;

    fn analysis(error_count: usize, types: &[(&str, usize)]) -> ErrorAnalysis {
        ErrorAnalysis {
            window: TimeRange::last_minutes(now(), 60),
            error_count,
            error_types: types
                .iter()
                .map(|(n, c)| (n.to_string(), *c))
                .collect::<BTreeMap<_, _>>(),
            affected_users: Vec::new(),
            critical_errors: Vec::new(),
            progression: Vec::new(),
        }
    }

    fn correlation(name: &str, value: f64, strength: CorrelationStrength) -> MetricCorrelation {
        MetricCorrelation {
            metric: Metric::new(name, MetricValue::gauge(value, "%").unwrap()).unwrap(),
            related_logs: Vec::new(),
            strength,
        }
    }

    fn kinds(hypotheses: &[RootCauseHypothesis]) -> Vec<HypothesisKind> {
        hypotheses.iter().map(|h| h.kind).collect()
    }

    #[test]
    fn test_no_evidence_is_unknown() {
        let a = analysis(0, &[]);
        let evidence = Evidence {
            error_analysis: &a,
            timeline: &[],
            correlation: &[],
            overload_error_count: 50,
        };
        let hypotheses = generate_hypotheses(&HypothesisRule::defaults(), &evidence);
        assert_eq!(kinds(&hypotheses), vec![HypothesisKind::Unknown]);
        assert_eq!(
            recommended_actions(&hypotheses),
            vec!["Review the incident timeline manually", "Escalate to the on-call engineer"]
        );
    }

    #[test]
    fn test_database_error_type_matches_case_insensitively() {
        let a = analysis(3, &[("DatabaseError", 2), ("ConnectionReset", 1)]);
        let evidence = Evidence {
            error_analysis: &a,
            timeline: &[],
            correlation: &[],
            overload_error_count: 50,
        };
        let hypotheses = generate_hypotheses(&HypothesisRule::defaults(), &evidence);
        assert_eq!(kinds(&hypotheses), vec![HypothesisKind::DatabaseIssue]);
        assert_eq!(hypotheses[0].evidence.len(), 2);
    }

    #[test]
    fn test_overload_requires_strictly_more_errors() {
        let rule = HypothesisRule::new(Pattern::ErrorCountAboveOverload, HypothesisKind::SystemOverload);

        for (count, expected) in [(50, false), (51, true)] {
            let a = analysis(count, &[]);
            let evidence = Evidence {
                error_analysis: &a,
                timeline: &[],
                correlation: &[],
                overload_error_count: 50,
            };
            assert_eq!(rule.matches(&evidence).is_some(), expected);
        }
    }

    #[test]
    fn test_resource_exhaustion_needs_high_cpu_or_memory() {
        let a = analysis(0, &[]);
        let correlations = vec![
            correlation("cpu_usage", 70.0, CorrelationStrength::Medium),
            correlation("queue_depth", 99.0, CorrelationStrength::High),
        ];
        let evidence = Evidence {
            error_analysis: &a,
            timeline: &[],
            correlation: &correlations,
            overload_error_count: 50,
        };
        assert_eq!(
            kinds(&generate_hypotheses(&HypothesisRule::defaults(), &evidence)),
            vec![HypothesisKind::Unknown]
        );

        let correlations = vec![correlation("Memory_Usage", 95.0, CorrelationStrength::High)];
        let evidence = Evidence {
            correlation: &correlations,
            ..evidence
        };
        assert_eq!(
            kinds(&generate_hypotheses(&HypothesisRule::defaults(), &evidence)),
            vec![HypothesisKind::ResourceExhaustion]
        );
    }

    #[test]
    fn test_auth_rule_only_reads_security_logs() {
        let a = analysis(0, &[]);
        let timeline = vec![
            LogEntry::new(LogLevel::Warn, "auth token refresh slow"),
            LogEntry::new(LogLevel::Warn, "Auth provider rejected token")
                .with_category(LogCategory::Security),
        ];
        let evidence = Evidence {
            error_analysis: &a,
            timeline: &timeline,
            correlation: &[],
            overload_error_count: 50,
        };
        let hypotheses = generate_hypotheses(&HypothesisRule::defaults(), &evidence);
        assert_eq!(kinds(&hypotheses), vec![HypothesisKind::AuthenticationDegradation]);
        assert_eq!(hypotheses[0].evidence, vec!["Auth provider rejected token"]);
    }

    #[test]
    fn test_actions_deduplicated_in_order() {
        let hypotheses = vec![
            RootCauseHypothesis::new(HypothesisKind::SystemOverload, Vec::new()),
            RootCauseHypothesis::new(HypothesisKind::ResourceExhaustion, Vec::new()),
        ];
        let actions = recommended_actions(&hypotheses);
        assert_eq!(
            actions,
            vec![
                "Scale out affected services",
                "Check for cascading failures between dependent services",
                "Review recent deployments",
                "Inspect CPU and memory usage of affected hosts",
            ]
        );
    }
}
