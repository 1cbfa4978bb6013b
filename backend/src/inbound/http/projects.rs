//! Project lifecycle and archive download.

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::domain::ProjectId;
use crate::domain::ports::CreateProjectRequest;
use crate::inbound::http::ApiResult;
use crate::inbound::http::download::attachment;
use crate::inbound::http::schemas::{ErrorSchema, ProjectSchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id};

const PROJECT_ID: FieldName = FieldName::new("id");

/// Body of `POST /api/v1/projects`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectBody {
    #[schema(example = "Harbour Depot")]
    pub name: String,
    #[schema(example = "Jeddah")]
    pub location: String,
}

/// Open a project owned by the requester's tenant.
#[utoipa::path(
    post,
    path = "/api/v1/projects",
    request_body = CreateProjectBody,
    responses(
        (status = 201, description = "Project created", body = ProjectSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Not an admin", body = ErrorSchema)
    ),
    tags = ["projects"],
    operation_id = "createProject"
)]
#[post("/projects")]
pub async fn create_project(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateProjectBody>,
) -> ApiResult<HttpResponse> {
    let requester = session.require_user_id()?;
    let CreateProjectBody { name, location } = payload.into_inner();
    let project = state
        .projects
        .create_project(CreateProjectRequest {
            requester,
            name,
            location,
        })
        .await?;
    info!(project_id = %project.id(), "project created");
    Ok(HttpResponse::Created().json(project))
}

/// Archive a project with no open or pending advances.
#[utoipa::path(
    post,
    path = "/api/v1/projects/{id}/archive",
    params(("id" = String, Path, format = Uuid)),
    responses(
        (status = 200, description = "Project archived", body = ProjectSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Not an admin", body = ErrorSchema),
        (status = 404, description = "Unknown project", body = ErrorSchema),
        (status = 409, description = "Project still has live advances", body = ErrorSchema)
    ),
    tags = ["projects"],
    operation_id = "archiveProject"
)]
#[post("/projects/{id}/archive")]
pub async fn archive_project(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let requester = session.require_user_id()?;
    let project_id: ProjectId = parse_id(&path.into_inner(), PROJECT_ID)?;
    let project = state.projects.archive_project(&requester, &project_id).await?;
    info!(project_id = %project_id, "project archived");
    Ok(HttpResponse::Ok().json(project))
}

/// Download the archive workbook of a project.
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}/report",
    params(("id" = String, Path, format = Uuid)),
    responses(
        (status = 200, description = "Archive workbook", content_type = "application/octet-stream"),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Unknown project", body = ErrorSchema)
    ),
    tags = ["reports"],
    operation_id = "projectArchive"
)]
#[get("/projects/{id}/report")]
pub async fn project_archive(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let requester = session.require_user_id()?;
    let project_id: ProjectId = parse_id(&path.into_inner(), PROJECT_ID)?;
    let file = state.reports.project_archive(&requester, &project_id).await?;
    Ok(attachment(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_fixtures::{admin, project};
    use crate::domain::{Error, ProjectStatus};
    use crate::domain::ports::ExportedFile;
    use crate::inbound::http::test_utils::{MockPorts, requester, signed_in, test_app};
    use actix_web::http::{StatusCode, header};
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::{Value, json};

    fn api() -> actix_web::Scope {
        web::scope("/api/v1")
            .service(create_project)
            .service(archive_project)
            .service(project_archive)
    }

    #[rstest]
    #[actix_web::test]
    async fn create_returns_the_new_project() {
        let created = project(&admin("Hana"), ProjectStatus::Active);
        let mut ports = MockPorts::default();
        ports
            .projects
            .expect_create_project()
            .withf(|request| {
                request.requester == requester()
                    && request.name == "Harbour Depot"
                    && request.location == "Jeddah"
            })
            .return_once(move |_| Ok(created));
        let app = actix_test::init_service(test_app(ports, api())).await;
        let cookie = signed_in(&app).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/projects")
                .cookie(cookie)
                .set_json(json!({"name": "Harbour Depot", "location": "Jeddah"}))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["status"], "ACTIVE");
    }

    #[rstest]
    #[actix_web::test]
    async fn archive_conflict_is_reported() {
        let mut ports = MockPorts::default();
        ports
            .projects
            .expect_archive_project()
            .return_once(|_, _| Err(Error::conflict("project has open advances")));
        let app = actix_test::init_service(test_app(ports, api())).await;
        let cookie = signed_in(&app).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(&format!("/api/v1/projects/{}/archive", ProjectId::random()))
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["message"], "project has open advances");
    }

    #[rstest]
    #[actix_web::test]
    async fn archive_rejects_malformed_ids() {
        let app = actix_test::init_service(test_app(MockPorts::default(), api())).await;
        let cookie = signed_in(&app).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/projects/depot/archive")
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[rstest]
    #[actix_web::test]
    async fn report_is_served_as_an_attachment() {
        let project_id = ProjectId::random();
        let mut ports = MockPorts::default();
        ports
            .reports
            .expect_project_archive()
            .withf(move |_, id| *id == project_id)
            .return_once(|_, _| {
                Ok(ExportedFile {
                    file_name: "harbour-depot-archive.json".to_owned(),
                    content_type: "application/json".to_owned(),
                    bytes: b"{\"sheets\":[]}".to_vec(),
                })
            });
        let app = actix_test::init_service(test_app(ports, api())).await;
        let cookie = signed_in(&app).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/api/v1/projects/{project_id}/report"))
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        assert!(disposition.contains("harbour-depot-archive.json"));
    }
}
