//! Static catalog tables.
//!
//! These are the only source of catalog content. Ids are assigned here and
//! must stay stable; [`crate::CatalogStore::new`] rejects duplicates.

use crate::catalog::{CatalogEntry, Category, EntryId};

#[allow(clippy::too_many_arguments)]
fn entry(
    id: EntryId,
    name: &str,
    description: &str,
    price: &str,
    category: Category,
    features: &[&str],
    technologies: &[&str],
    icon: &str,
    color: &str,
    delivery_time: &str,
) -> CatalogEntry {
    CatalogEntry {
        id,
        name: name.to_string(),
        description: description.to_string(),
        price: price.to_string(),
        category,
        features: features.iter().map(|s| s.to_string()).collect(),
        technologies: technologies.iter().map(|s| s.to_string()).collect(),
        icon: icon.to_string(),
        color: color.to_string(),
        delivery_time: delivery_time.to_string(),
    }
}

/// The services collection.
pub fn services() -> Vec<CatalogEntry> {
    vec![
        entry(
            1,
            "Custom Web Application Development",
            "Full-stack web applications built around your business processes, from prototype to production.",
            "From $8,000",
            Category::Development,
            &["Responsive UI", "REST & GraphQL APIs", "Role-based access", "CI/CD setup"],
            &["React", "TypeScript", "Node.js", "PostgreSQL"],
            "code",
            "#3B82F6",
            "6-10 weeks",
        ),
        entry(
            2,
            "Mobile App Development",
            "Native-feeling iOS and Android apps from a single cross-platform codebase.",
            "From $12,000",
            Category::Development,
            &["Offline support", "Push notifications", "App store submission", "Analytics"],
            &["React Native", "Swift", "Kotlin", "Firebase"],
            "smartphone",
            "#8B5CF6",
            "8-12 weeks",
        ),
        entry(
            3,
            "AI Integration & Automation",
            "Embed language models and intelligent automation into existing products and workflows.",
            "From $10,000",
            Category::Ai,
            &["LLM integration", "Prompt engineering", "Workflow automation", "Evaluation harness"],
            &["Python", "LangChain", "OpenAI API", "Vector databases"],
            "cpu",
            "#10B981",
            "4-8 weeks",
        ),
        entry(
            4,
            "Machine Learning Solutions",
            "Custom models for forecasting, classification and recommendation, trained on your data.",
            "From $15,000",
            Category::Ai,
            &["Model training", "Feature engineering", "Model monitoring", "A/B evaluation"],
            &["PyTorch", "scikit-learn", "MLflow", "Kubernetes"],
            "brain",
            "#14B8A6",
            "8-14 weeks",
        ),
        entry(
            5,
            "Cloud Migration & DevOps",
            "Move workloads to the cloud with infrastructure as code and automated delivery pipelines.",
            "From $9,000",
            Category::Cloud,
            &[
                "Migration planning",
                "Infrastructure as code",
                "CI/CD pipelines",
                "Cost optimisation",
            ],
            &["AWS", "Terraform", "Docker", "GitHub Actions"],
            "cloud",
            "#F59E0B",
            "4-10 weeks",
        ),
        entry(
            6,
            "Managed Cloud Infrastructure",
            "Round-the-clock operation of your cloud estate with monitoring, patching and incident response.",
            "From $2,500/month",
            Category::Cloud,
            &["24/7 monitoring", "Backup & recovery", "Security patching", "Monthly reports"],
            &["Azure", "Google Cloud", "Prometheus", "Grafana"],
            "server",
            "#F97316",
            "Ongoing",
        ),
        entry(
            7,
            "Cybersecurity Assessment",
            "Penetration testing and security review of applications, APIs and cloud configuration.",
            "From $6,000",
            Category::Security,
            &["Penetration testing", "Code review", "Threat modelling", "Remediation plan"],
            &["OWASP ZAP", "Burp Suite", "Nmap", "Snyk"],
            "shield",
            "#EF4444",
            "2-4 weeks",
        ),
        entry(
            8,
            "Data Analytics & Business Intelligence",
            "Dashboards and reporting that turn operational data into decisions.",
            "From $7,000",
            Category::Data,
            &["Interactive dashboards", "KPI design", "Self-service reporting", "Data modelling"],
            &["Power BI", "dbt", "Snowflake", "SQL"],
            "bar-chart",
            "#6366F1",
            "4-6 weeks",
        ),
        entry(
            9,
            "Data Engineering Pipelines",
            "Reliable batch and streaming pipelines that feed analytics and machine learning.",
            "From $11,000",
            Category::Data,
            &["Batch & streaming ingestion", "Data quality checks", "Orchestration", "Lineage"],
            &["Apache Kafka", "Apache Airflow", "Spark", "BigQuery"],
            "database",
            "#0EA5E9",
            "6-10 weeks",
        ),
        entry(
            10,
            "Technology Consulting",
            "Architecture reviews, technology strategy and hands-on guidance for engineering teams.",
            "$150/hour",
            Category::Consulting,
            &["Architecture review", "Technology roadmap", "Team mentoring", "Vendor selection"],
            &["Cloud architecture", "Microservices", "Domain-driven design"],
            "briefcase",
            "#64748B",
            "Flexible",
        ),
    ]
}

/// The software collection.
pub fn software() -> Vec<CatalogEntry> {
    vec![
        entry(
            101,
            "ProjectPilot",
            "Lightweight project tracking with sprint boards, time logging and client portals.",
            "$29/user/month",
            Category::Development,
            &["Kanban boards", "Time tracking", "Client portal", "Git integration"],
            &["Vue.js", "Go", "PostgreSQL"],
            "layout",
            "#2563EB",
            "Instant",
        ),
        entry(
            102,
            "InsightDesk",
            "Support desk with AI-assisted ticket triage and suggested replies.",
            "$49/agent/month",
            Category::Ai,
            &["Ticket triage", "Suggested replies", "Knowledge base", "SLA tracking"],
            &["Python", "FastAPI", "Redis"],
            "message-square",
            "#059669",
            "Instant",
        ),
        entry(
            103,
            "VaultGuard",
            "Secrets management and access auditing for small engineering teams.",
            "$199/month",
            Category::Security,
            &["Secret rotation", "Audit trail", "SSO", "CLI & API access"],
            &["Rust", "HashiCorp Vault", "OIDC"],
            "lock",
            "#DC2626",
            "1 day setup",
        ),
        entry(
            104,
            "MetricFlow",
            "Hosted metrics warehouse with ready-made SaaS dashboards.",
            "$399/month",
            Category::Data,
            &["Prebuilt connectors", "Dashboards", "Scheduled reports", "Alerting"],
            &["ClickHouse", "TypeScript", "Kafka"],
            "activity",
            "#7C3AED",
            "2 days setup",
        ),
        entry(
            105,
            "CloudCost Lens",
            "Cloud spend visibility with anomaly alerts and rightsizing recommendations.",
            "2% of managed spend",
            Category::Cloud,
            &["Spend dashboards", "Anomaly alerts", "Rightsizing", "Budget forecasts"],
            &["AWS Cost Explorer API", "Azure Cost Management", "Go"],
            "dollar-sign",
            "#D97706",
            "Instant",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn services_table_has_ten_unique_ids() {
        let services = services();
        assert_eq!(services.len(), 10);
        let ids: HashSet<_> = services.iter().map(|s| s.id).collect();
        assert_eq!(ids.len(), 10);
    }

    #[test]
    fn software_ids_do_not_collide_with_services() {
        let service_ids: HashSet<_> = services().iter().map(|s| s.id).collect();
        assert!(software().iter().all(|s| !service_ids.contains(&s.id)));
    }

    #[test]
    fn every_entry_is_presentable() {
        for entry in services().iter().chain(software().iter()) {
            assert!(!entry.name.is_empty());
            assert!(!entry.features.is_empty(), "{} has no features", entry.name);
            assert!(entry.color.starts_with('#'));
        }
    }
}
