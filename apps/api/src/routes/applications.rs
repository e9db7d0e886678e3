use axum::{
    body::Body,
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tokio_util::io::ReaderStream;
use tracing::info;
use uuid::Uuid;

use crate::errors::{AppError, APPLICATION_NOT_FOUND, RESUME_NOT_FOUND};
use crate::models::application::{Application, ApplicationPatch, NewApplication, ResumeRef};
use crate::state::AppState;
use crate::uploads::{ResumeStorage, UploadError, PDF_MIME};

const RESUME_FIELD: &str = "resume";

#[derive(Serialize)]
pub struct ApplicationResponse {
    pub message: &'static str,
    pub data: Application,
}

#[derive(Serialize)]
pub struct ApplicationListResponse {
    pub message: &'static str,
    pub data: Vec<Application>,
    pub count: usize,
}

/// Fields collected from an application form. A stored resume belongs to
/// the caller, who must remove it if the request fails later on.
#[derive(Debug, Default)]
struct ApplicationForm {
    name: Option<String>,
    email: Option<String>,
    resume: Option<ResumeRef>,
}

/// A missing or non-multipart body is an upload error like any other
/// malformed form, so it answers with the usual JSON error body.
async fn read_form(
    multipart: Result<Multipart, MultipartRejection>,
    resumes: &ResumeStorage,
) -> Result<ApplicationForm, AppError> {
    let mut multipart =
        multipart.map_err(|rejection| UploadError::Malformed(rejection.body_text()))?;
    let mut form = ApplicationForm::default();
    if let Err(e) = collect_fields(&mut multipart, resumes, &mut form).await {
        discard_upload(resumes, form.resume.as_ref()).await;
        return Err(e);
    }
    Ok(form)
}

async fn collect_fields(
    multipart: &mut Multipart,
    resumes: &ResumeStorage,
    form: &mut ApplicationForm,
) -> Result<(), AppError> {
    while let Some(field) = multipart.next_field().await.map_err(UploadError::from)? {
        let field_name = field.name().unwrap_or("").to_string();
        let is_file = field.file_name().is_some();

        match field_name.as_str() {
            RESUME_FIELD => {
                if form.resume.is_some() {
                    return Err(UploadError::UnexpectedField.into());
                }
                form.resume = Some(resumes.receive(field).await?);
            }
            _ if is_file => return Err(UploadError::UnexpectedField.into()),
            "name" => form.name = Some(field.text().await.map_err(UploadError::from)?),
            "email" => form.email = Some(field.text().await.map_err(UploadError::from)?),
            _ => {}
        }
    }
    Ok(())
}

async fn discard_upload(resumes: &ResumeStorage, resume: Option<&ResumeRef>) {
    if let Some(resume) = resume {
        resumes.remove(&resume.path).await;
    }
}

/// Empty text fields count as not sent. Whitespace-only values are kept so
/// validation reports them after trimming.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Unknown and malformed ids both answer 404.
fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(APPLICATION_NOT_FOUND.to_string()))
}

/// POST /api/applications
pub async fn handle_create(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<ApplicationResponse>), AppError> {
    let store = state.store()?.clone();
    let ApplicationForm {
        name,
        email,
        resume,
    } = read_form(multipart, &state.resumes).await?;

    let (name, email) = match (non_empty(name), non_empty(email)) {
        (Some(name), Some(email)) => (name, email),
        _ => {
            discard_upload(&state.resumes, resume.as_ref()).await;
            return Err(AppError::BadRequest(
                "Name and email are required".to_string(),
            ));
        }
    };
    let resume =
        resume.ok_or_else(|| AppError::BadRequest("Resume file is required".to_string()))?;

    let new = NewApplication {
        name,
        email,
        resume_path: resume.path.clone(),
        resume_file_name: resume.file_name,
    };

    match store.create(new).await {
        Ok(application) => Ok((
            StatusCode::CREATED,
            Json(ApplicationResponse {
                message: "Application submitted successfully",
                data: application,
            }),
        )),
        Err(e) => {
            state.resumes.remove(&resume.path).await;
            Err(e.into())
        }
    }
}

/// GET /api/applications
pub async fn handle_list(
    State(state): State<AppState>,
) -> Result<Json<ApplicationListResponse>, AppError> {
    let applications = state.store()?.find_all().await?;
    Ok(Json(ApplicationListResponse {
        message: "Applications retrieved successfully",
        count: applications.len(),
        data: applications,
    }))
}

/// GET /api/applications/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApplicationResponse>, AppError> {
    let id = parse_id(&id)?;
    let application = state.store()?.find_by_id(id).await?;
    Ok(Json(ApplicationResponse {
        message: "Application retrieved successfully",
        data: application,
    }))
}

/// GET /api/applications/:id/resume
pub async fn handle_download_resume(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    let application = state.store()?.find_by_id(id).await?;

    let (file, len) = state
        .resumes
        .open(&application.resume_path)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::NotFound(RESUME_NOT_FOUND.to_string()))?;

    let file_name = application.resume_file_name.replace(['"', '\\'], "_");
    let disposition = format!("attachment; filename=\"{file_name}\"");

    Ok((
        [
            (header::CONTENT_TYPE, PDF_MIME.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, len.to_string()),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}

/// PUT /api/applications/:id
pub async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ApplicationResponse>, AppError> {
    let id = parse_id(&id)?;
    let store = state.store()?.clone();
    let ApplicationForm {
        name,
        email,
        resume,
    } = read_form(multipart, &state.resumes).await?;

    let patch = ApplicationPatch {
        name: non_empty(name),
        email: non_empty(email),
        resume: resume.clone(),
    };

    let updated = match store.update_by_id(id, patch).await {
        Ok(updated) => updated,
        Err(e) => {
            discard_upload(&state.resumes, resume.as_ref()).await;
            return Err(e.into());
        }
    };

    // The old file goes only once the record points at the new one.
    if let Some(replaced) = &updated.replaced_resume_path {
        state.resumes.remove(replaced).await;
        info!("Replaced resume for application {id}");
    }

    Ok(Json(ApplicationResponse {
        message: "Application updated successfully",
        data: updated.application,
    }))
}

/// DELETE /api/applications/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApplicationResponse>, AppError> {
    let id = parse_id(&id)?;
    let deleted = state.store()?.delete_by_id(id).await?;
    state.resumes.remove(&deleted.resume_path).await;

    Ok(Json(ApplicationResponse {
        message: "Application deleted successfully",
        data: deleted,
    }))
}
