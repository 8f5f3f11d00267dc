//! Simulated AI endpoints.

use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;

use catalog_lib::simulation::{
    ai_models, automation_workflow, monitoring_snapshot, performance_optimization,
    security_assessment, software_analysis, ModelInfo, MonitoringSnapshot, PerformanceReport,
    SecurityAssessment, SoftwareAnalysis, WorkflowTemplate,
};
use catalog_service_shared::{
    record_simulation, ApiError, ApiJson, ApiResponse, AppState, AutomationWorkflowRequest,
    PerformanceOptimizationRequest, RequestContext, SecurityAssessmentRequest,
    SoftwareAnalysisRequest, Validate,
};

use super::Simulated;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/software-analysis", post(analyse_software))
        .route("/automation-workflow", post(create_workflow))
        .route("/performance-optimization", post(optimize_performance))
        .route("/security-assessment", post(assess_security))
        .route("/intelligent-monitoring", get(monitoring))
        .route("/models", get(models))
}

type Simulation<T> = Result<ApiResponse<Simulated<T>>, ApiError>;

async fn analyse_software(
    ctx: RequestContext,
    ApiJson(body): ApiJson<SoftwareAnalysisRequest>,
) -> Simulation<SoftwareAnalysis> {
    let request = body.validate()?;
    let analysis = software_analysis(
        request.analysis_type,
        request.target.as_deref(),
        &mut rand::rng(),
    );

    record_simulation("software_analysis");
    Ok(ApiResponse::new(
        "Software analysis completed",
        &ctx,
        Simulated::new(analysis),
    ))
}

async fn create_workflow(
    ctx: RequestContext,
    ApiJson(body): ApiJson<AutomationWorkflowRequest>,
) -> Simulation<WorkflowTemplate> {
    let request = body.validate()?;
    let workflow = automation_workflow(request.workflow_type, request.name.as_deref());

    record_simulation("automation_workflow");
    Ok(ApiResponse::new(
        "Automation workflow created",
        &ctx,
        Simulated::new(workflow),
    ))
}

async fn optimize_performance(
    ctx: RequestContext,
    ApiJson(body): ApiJson<PerformanceOptimizationRequest>,
) -> Simulation<PerformanceReport> {
    let target = body.validate()?;
    let report = performance_optimization(target, &mut rand::rng());

    record_simulation("performance_optimization");
    Ok(ApiResponse::new(
        "Performance optimization analysis completed",
        &ctx,
        Simulated::new(report),
    ))
}

async fn assess_security(
    ctx: RequestContext,
    ApiJson(body): ApiJson<SecurityAssessmentRequest>,
) -> Simulation<SecurityAssessment> {
    let scope = body.validate()?;
    let assessment = security_assessment(scope, &mut rand::rng());

    record_simulation("security_assessment");
    Ok(ApiResponse::new(
        "Security assessment completed",
        &ctx,
        Simulated::new(assessment),
    ))
}

async fn monitoring(ctx: RequestContext) -> ApiResponse<Simulated<MonitoringSnapshot>> {
    let snapshot = monitoring_snapshot(&mut rand::rng());
    record_simulation("intelligent_monitoring");
    ApiResponse::new("Monitoring data retrieved", &ctx, Simulated::new(snapshot))
}

#[derive(Debug, Serialize)]
struct ModelList {
    data: Vec<ModelInfo>,
    count: usize,
}

async fn models(ctx: RequestContext) -> ApiResponse<ModelList> {
    let data = ai_models();
    ApiResponse::new(
        "AI models retrieved successfully",
        &ctx,
        ModelList {
            count: data.len(),
            data,
        },
    )
}
