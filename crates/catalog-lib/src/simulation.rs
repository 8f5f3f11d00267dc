//! Simulated AI payloads.
//!
//! Nothing here talks to a model. Each generator combines a fixed template
//! for the requested kind with pseudo-random scores drawn from the supplied
//! RNG, so callers decide whether output is reproducible (seeded RNG in
//! tests) or varies per call (thread RNG in the service).

use rand::Rng;
use serde::Serialize;

use crate::error::{Error, Result};

/// A request field restricted to a fixed set of wire values.
pub trait Choice: Sized + Copy + 'static {
    /// Name of the request field carrying the value.
    const FIELD: &'static str;

    /// Every accepted value.
    const ALL: &'static [Self];

    /// Wire name of the value.
    fn as_str(self) -> &'static str;

    /// Case-insensitive parse.
    fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|choice| choice.as_str().eq_ignore_ascii_case(value.trim()))
    }

    /// Wire names of every accepted value, in declaration order.
    fn supported() -> Vec<&'static str> {
        Self::ALL.iter().map(|choice| choice.as_str()).collect()
    }

    /// Parse a required field, failing with [`Error::UnsupportedValue`] when it
    /// is absent or not one of [`Choice::ALL`].
    fn require(value: Option<&str>) -> Result<Self> {
        value
            .and_then(Self::parse)
            .ok_or_else(|| Error::UnsupportedValue {
                field: Self::FIELD,
                value: value.map(str::to_string),
                supported: Self::supported(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    CodeQuality,
    Security,
    Performance,
    Architecture,
    Dependencies,
}

impl Choice for AnalysisType {
    const FIELD: &'static str = "analysis_type";
    const ALL: &'static [Self] = &[
        Self::CodeQuality,
        Self::Security,
        Self::Performance,
        Self::Architecture,
        Self::Dependencies,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::CodeQuality => "code_quality",
            Self::Security => "security",
            Self::Performance => "performance",
            Self::Architecture => "architecture",
            Self::Dependencies => "dependencies",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowType {
    CiCd,
    Testing,
    Deployment,
    Monitoring,
}

impl Choice for WorkflowType {
    const FIELD: &'static str = "workflow_type";
    const ALL: &'static [Self] = &[Self::CiCd, Self::Testing, Self::Deployment, Self::Monitoring];

    fn as_str(self) -> &'static str {
        match self {
            Self::CiCd => "ci_cd",
            Self::Testing => "testing",
            Self::Deployment => "deployment",
            Self::Monitoring => "monitoring",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationTarget {
    Frontend,
    Backend,
    Database,
    Infrastructure,
}

impl Choice for OptimizationTarget {
    const FIELD: &'static str = "target";
    const ALL: &'static [Self] = &[
        Self::Frontend,
        Self::Backend,
        Self::Database,
        Self::Infrastructure,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::Frontend => "frontend",
            Self::Backend => "backend",
            Self::Database => "database",
            Self::Infrastructure => "infrastructure",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentScope {
    WebApplication,
    Api,
    Infrastructure,
    Cloud,
}

impl Choice for AssessmentScope {
    const FIELD: &'static str = "scope";
    const ALL: &'static [Self] = &[
        Self::WebApplication,
        Self::Api,
        Self::Infrastructure,
        Self::Cloud,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::WebApplication => "web_application",
            Self::Api => "api",
            Self::Infrastructure => "infrastructure",
            Self::Cloud => "cloud",
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// =============================================================================
// Software analysis
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct MetricScore {
    pub name: String,
    pub score: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub severity: String,
    pub title: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SoftwareAnalysis {
    pub analysis_type: AnalysisType,
    pub target: String,
    pub overall_score: u8,
    pub metrics: Vec<MetricScore>,
    pub findings: Vec<Finding>,
    pub estimated_effort_hours: u32,
    pub confidence: f64,
}

type FindingTemplate = (&'static str, &'static str, &'static str);

fn analysis_template(kind: AnalysisType) -> ([&'static str; 4], [FindingTemplate; 2]) {
    match kind {
        AnalysisType::CodeQuality => (
            ["maintainability", "readability", "test_coverage", "complexity"],
            [
                (
                    "medium",
                    "Long functions in request handlers",
                    "Extract validation and mapping into helpers",
                ),
                (
                    "low",
                    "Inconsistent naming in utility modules",
                    "Adopt a shared lint configuration",
                ),
            ],
        ),
        AnalysisType::Security => (
            ["authentication", "input_validation", "dependency_hygiene", "secrets_management"],
            [
                (
                    "high",
                    "Unvalidated input reaches query builder",
                    "Validate and parameterise all user input",
                ),
                (
                    "medium",
                    "Secrets present in environment files",
                    "Move secrets into a managed vault",
                ),
            ],
        ),
        AnalysisType::Performance => (
            ["response_time", "throughput", "memory_efficiency", "caching"],
            [
                (
                    "medium",
                    "Repeated queries inside loops",
                    "Batch lookups or add a read-through cache",
                ),
                ("low", "Large uncompressed payloads", "Enable response compression"),
            ],
        ),
        AnalysisType::Architecture => (
            ["modularity", "coupling", "scalability", "observability"],
            [
                ("medium", "Shared database between services", "Introduce service-owned schemas"),
                (
                    "low",
                    "Missing correlation ids in logs",
                    "Propagate a request id through every hop",
                ),
            ],
        ),
        AnalysisType::Dependencies => (
            ["freshness", "license_compliance", "vulnerability_exposure", "footprint"],
            [
                ("high", "Dependencies with known advisories", "Upgrade to patched releases"),
                ("low", "Unused packages in manifest", "Remove unused dependencies"),
            ],
        ),
    }
}

/// Simulated static analysis of a code base.
pub fn software_analysis<R: Rng + ?Sized>(
    kind: AnalysisType,
    target: Option<&str>,
    rng: &mut R,
) -> SoftwareAnalysis {
    let (metric_names, findings) = analysis_template(kind);

    let metrics: Vec<MetricScore> = metric_names
        .iter()
        .map(|name| MetricScore {
            name: name.to_string(),
            score: rng.random_range(60..=100),
        })
        .collect();

    let overall = metrics.iter().map(|m| u32::from(m.score)).sum::<u32>() / metrics.len() as u32;

    SoftwareAnalysis {
        analysis_type: kind,
        target: target.unwrap_or("repository").to_string(),
        overall_score: overall as u8,
        metrics,
        findings: findings
            .iter()
            .map(|(severity, title, recommendation)| Finding {
                severity: severity.to_string(),
                title: title.to_string(),
                recommendation: recommendation.to_string(),
            })
            .collect(),
        estimated_effort_hours: rng.random_range(4..=40),
        confidence: round2(rng.random_range(0.80..0.99)),
    }
}

// =============================================================================
// Automation workflow
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowStep {
    pub order: u8,
    pub name: String,
    pub description: String,
    pub estimated_duration: String,
}

/// Static workflow template. Nothing is scheduled or executed.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowTemplate {
    pub id: String,
    pub name: String,
    pub workflow_type: WorkflowType,
    pub status: String,
    pub steps: Vec<WorkflowStep>,
}

/// The four-step template for `kind`.
pub fn automation_workflow(kind: WorkflowType, name: Option<&str>) -> WorkflowTemplate {
    let (execute, duration) = match kind {
        WorkflowType::CiCd => ("Build, lint and package every commit", "10 minutes"),
        WorkflowType::Testing => ("Run unit, integration and end-to-end suites", "20 minutes"),
        WorkflowType::Deployment => (
            "Roll out to staging, then production with canaries",
            "30 minutes",
        ),
        WorkflowType::Monitoring => ("Evaluate health checks and alert thresholds", "5 minutes"),
    };

    let step = |order: u8, name: &str, description: &str, estimated: &str| WorkflowStep {
        order,
        name: name.to_string(),
        description: description.to_string(),
        estimated_duration: estimated.to_string(),
    };

    WorkflowTemplate {
        id: format!("wf-{}", kind.as_str().replace('_', "-")),
        name: name
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} workflow", kind.as_str())),
        workflow_type: kind,
        status: "template".to_string(),
        steps: vec![
            step(1, "Trigger", "Start on push, schedule or manual dispatch", "instant"),
            step(2, "Validate", "Check configuration and prerequisites", "2 minutes"),
            step(3, "Execute", execute, duration),
            step(4, "Report", "Publish results and notify the team", "1 minute"),
        ],
    }
}

// =============================================================================
// Performance optimisation
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceBaseline {
    pub response_time_ms: u32,
    pub throughput_rps: u32,
    pub error_rate_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    pub target: OptimizationTarget,
    pub current: PerformanceBaseline,
    pub projected_improvement_percent: u8,
    pub recommendations: Vec<String>,
}

/// Simulated performance review.
pub fn performance_optimization<R: Rng + ?Sized>(
    target: OptimizationTarget,
    rng: &mut R,
) -> PerformanceReport {
    let recommendations: &[&str] = match target {
        OptimizationTarget::Frontend => &[
            "Split bundles by route",
            "Serve images in modern formats",
            "Defer non-critical scripts",
        ],
        OptimizationTarget::Backend => &[
            "Cache hot read paths",
            "Move slow work to background jobs",
            "Pool outbound connections",
        ],
        OptimizationTarget::Database => &[
            "Add indexes for frequent filters",
            "Eliminate N+1 query patterns",
            "Archive cold rows",
        ],
        OptimizationTarget::Infrastructure => &[
            "Autoscale on request latency",
            "Place a CDN in front of static assets",
            "Rightsize overprovisioned instances",
        ],
    };

    PerformanceReport {
        target,
        current: PerformanceBaseline {
            response_time_ms: rng.random_range(200..=900),
            throughput_rps: rng.random_range(50..=500),
            error_rate_percent: round2(rng.random_range(0.0..2.5)),
        },
        projected_improvement_percent: rng.random_range(15..=60),
        recommendations: strings(recommendations),
    }
}

// =============================================================================
// Security assessment
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct VulnerabilityCounts {
    pub critical: u8,
    pub high: u8,
    pub medium: u8,
    pub low: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct SecurityAssessment {
    pub scope: AssessmentScope,
    pub risk_score: f64,
    pub risk_level: String,
    pub vulnerabilities: VulnerabilityCounts,
    pub compliance_checks: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Maps a 0-10 risk score onto a label.
pub fn risk_level(score: f64) -> &'static str {
    if score >= 7.0 {
        "high"
    } else if score >= 4.0 {
        "medium"
    } else {
        "low"
    }
}

/// Simulated security assessment.
pub fn security_assessment<R: Rng + ?Sized>(
    scope: AssessmentScope,
    rng: &mut R,
) -> SecurityAssessment {
    let recommendations: &[&str] = match scope {
        AssessmentScope::WebApplication => &[
            "Enforce a strict content security policy",
            "Rotate session tokens on privilege change",
        ],
        AssessmentScope::Api => &[
            "Rate limit every public endpoint",
            "Validate request bodies against a schema",
        ],
        AssessmentScope::Infrastructure => &[
            "Close unused inbound ports",
            "Automate operating system patching",
        ],
        AssessmentScope::Cloud => &[
            "Apply least-privilege IAM policies",
            "Enable audit logging in every region",
        ],
    };

    let risk_score = f64::from(rng.random_range(10u8..=90)) / 10.0;

    SecurityAssessment {
        scope,
        risk_score,
        risk_level: risk_level(risk_score).to_string(),
        vulnerabilities: VulnerabilityCounts {
            critical: rng.random_range(0..=2),
            high: rng.random_range(0..=5),
            medium: rng.random_range(1..=10),
            low: rng.random_range(2..=15),
        },
        compliance_checks: strings(&["OWASP Top 10", "CIS Benchmarks", "GDPR data handling"]),
        recommendations: strings(recommendations),
    }
}

// =============================================================================
// Monitoring
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct SystemMetrics {
    pub cpu_percent: u8,
    pub memory_percent: u8,
    pub response_time_ms: u32,
    pub requests_per_minute: u32,
    pub error_rate_percent: f64,
    pub uptime_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub severity: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonitoringSnapshot {
    pub metrics: SystemMetrics,
    pub anomalies_detected: u8,
    pub alerts: Vec<Alert>,
    pub predictions: Vec<String>,
}

/// Simulated live monitoring snapshot. Alerts are derived from the sampled
/// metrics so the payload stays self-consistent.
pub fn monitoring_snapshot<R: Rng + ?Sized>(rng: &mut R) -> MonitoringSnapshot {
    let metrics = SystemMetrics {
        cpu_percent: rng.random_range(10..=95),
        memory_percent: rng.random_range(30..=92),
        response_time_ms: rng.random_range(50..=400),
        requests_per_minute: rng.random_range(100..=2000),
        error_rate_percent: round2(rng.random_range(0.0..2.0)),
        uptime_percent: round2(rng.random_range(99.5..99.99)),
    };

    let mut alerts = Vec::new();
    if metrics.cpu_percent > 80 {
        alerts.push(Alert {
            severity: "warning".to_string(),
            message: format!("CPU usage at {}%", metrics.cpu_percent),
        });
    }
    if metrics.memory_percent > 85 {
        alerts.push(Alert {
            severity: "warning".to_string(),
            message: format!("Memory usage at {}%", metrics.memory_percent),
        });
    }
    if metrics.response_time_ms > 300 {
        alerts.push(Alert {
            severity: "info".to_string(),
            message: format!("Response time elevated at {} ms", metrics.response_time_ms),
        });
    }

    MonitoringSnapshot {
        metrics,
        anomalies_detected: rng.random_range(0..=3),
        alerts,
        predictions: strings(&[
            "Traffic expected to peak between 14:00 and 16:00 UTC",
            "No capacity changes required in the next 24 hours",
        ]),
    }
}

// =============================================================================
// Models
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub status: String,
    pub version: String,
    pub accuracy: f64,
    pub description: String,
}

/// Static list of the simulated models behind the AI endpoints.
pub fn ai_models() -> Vec<ModelInfo> {
    let model = |id: &str, name: &str, kind: &str, accuracy: f64, description: &str| ModelInfo {
        id: id.to_string(),
        name: name.to_string(),
        kind: kind.to_string(),
        status: "active".to_string(),
        version: "1.0.0".to_string(),
        accuracy,
        description: description.to_string(),
    };

    vec![
        model(
            "code-analyzer",
            "Code Analyzer",
            "analysis",
            0.94,
            "Scores code quality, architecture and dependency health",
        ),
        model(
            "workflow-designer",
            "Workflow Designer",
            "automation",
            0.91,
            "Suggests automation workflow templates",
        ),
        model(
            "perf-advisor",
            "Performance Advisor",
            "optimization",
            0.89,
            "Recommends performance improvements per tier",
        ),
        model(
            "threat-scanner",
            "Threat Scanner",
            "security",
            0.96,
            "Estimates security risk and vulnerability exposure",
        ),
        model(
            "anomaly-watch",
            "Anomaly Watch",
            "monitoring",
            0.92,
            "Detects anomalies in live service metrics",
        ),
    ]
}
