use actix_multipart::{Field, Multipart};
use actix_web::{delete, get, post, web, HttpResponse, Responder};
use futures_util::TryStreamExt;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    core::{jwt_auth::JwtMiddleware, AppError, AppSuccessResponse, BlobStore},
    db::{access, downloads, resources},
    models::pagination::{PaginationMeta, PaginationQuery},
    models::resources::{CreateResourceMeta, PrivacyLevel, ResourceFilters, ResourceType},
    models::reviews::render_average_rating,
};

async fn read_text_field(field: &mut Field) -> Result<String, AppError> {
    let mut data = Vec::new();
    while let Some(chunk) = field
        .try_next()
        .await
        .map_err(|e| AppError::invalid_operation(format!("Invalid multipart field: {}", e)))?
    {
        data.extend_from_slice(&chunk);
    }
    String::from_utf8(data).map_err(|_| AppError::invalid_operation("Field must be valid UTF-8"))
}

async fn read_file_field(
    field: &mut Field,
    max_size: usize,
) -> Result<(String, String, Vec<u8>), AppError> {
    let filename = field
        .content_disposition()
        .get_filename()
        .ok_or_else(|| AppError::invalid_operation("Filename is required"))?
        .to_string();

    let mime_type = field
        .content_type()
        .map(|ct| ct.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let mut bytes = Vec::new();
    while let Some(chunk) = field
        .try_next()
        .await
        .map_err(|e| AppError::invalid_operation(format!("Failed to read file data: {}", e)))?
    {
        bytes.extend_from_slice(&chunk);
        if bytes.len() > max_size {
            return Err(AppError::invalid_operation(format!(
                "File size exceeds maximum limit ({}MB)",
                max_size / (1024 * 1024)
            )));
        }
    }

    Ok((filename, mime_type, bytes))
}

fn parse_enum_field<T: serde::de::DeserializeOwned>(name: &str, raw: &str) -> Result<T, AppError> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|_| AppError::invalid_operation(format!("Invalid value for {}: {}", name, raw)))
}

#[instrument(name = "Upload Resource", skip(pool, store, payload))]
#[post("/upload")]
pub async fn upload_resource(
    pool: web::Data<PgPool>,
    store: web::Data<BlobStore>,
    auth: JwtMiddleware,
    mut payload: Multipart,
) -> Result<impl Responder, AppError> {
    let viewer = access::load_viewer(&pool, auth.user_id).await?;

    let mut meta = CreateResourceMeta::default();
    let mut file_data: Option<(String, String, Vec<u8>)> = None;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| AppError::invalid_operation(format!("Invalid file upload format: {}", e)))?
    {
        let field_name = field
            .content_disposition()
            .get_name()
            .unwrap_or("")
            .to_string();

        match field_name.as_str() {
            "title" => meta.title = read_text_field(&mut field).await?,
            "description" => {
                let value = read_text_field(&mut field).await?;
                if !value.is_empty() {
                    meta.description = Some(value);
                }
            }
            "subject_name" => meta.subject_name = read_text_field(&mut field).await?,
            "semester" => meta.semester = read_text_field(&mut field).await?,
            "branch_or_department" => {
                meta.branch_or_department = read_text_field(&mut field).await?
            }
            "academic_year_or_batch" => {
                let value = read_text_field(&mut field).await?;
                if !value.is_empty() {
                    meta.academic_year_or_batch = Some(value);
                }
            }
            "resource_type" => {
                let value = read_text_field(&mut field).await?;
                meta.resource_type = Some(parse_enum_field::<ResourceType>("resource_type", &value)?);
            }
            "privacy_level" => {
                let value = read_text_field(&mut field).await?;
                meta.privacy_level = parse_enum_field::<PrivacyLevel>("privacy_level", &value)?;
            }
            "tags" => {
                let value = read_text_field(&mut field).await?;
                meta.tags = value
                    .split(',')
                    .map(|tag| tag.trim().to_string())
                    .filter(|tag| !tag.is_empty())
                    .collect();
            }
            "file" => {
                file_data = Some(read_file_field(&mut field, store.max_file_size()).await?);
            }
            _ => {
                while field
                    .try_next()
                    .await
                    .map_err(|_| AppError::invalid_operation("Failed to skip unknown field"))?
                    .is_some()
                {}
            }
        }
    }

    if meta.title.trim().is_empty() {
        return Err(AppError::invalid_operation("Title is required"));
    }
    if meta.subject_name.trim().is_empty() {
        return Err(AppError::invalid_operation("Subject is required"));
    }
    if meta.semester.trim().is_empty() {
        return Err(AppError::invalid_operation("Semester is required"));
    }

    let (filename, mime_type, bytes) =
        file_data.ok_or_else(|| AppError::invalid_operation("File is required"))?;

    let stored = store.put_file(viewer.id, &filename, &mime_type, &bytes)?;

    let (resource, _) = match resources::create_resource(&pool, &viewer, meta, stored.clone()).await
    {
        Ok(created) => created,
        Err(e) => {
            // The row never landed, so the blob must not stay behind
            store.remove_file(&stored.file_path);
            return Err(e);
        }
    };

    tracing::info!("Resource {} uploaded by user {}", resource.id, viewer.id);

    Ok(HttpResponse::Created().json(AppSuccessResponse {
        success: true,
        data: resource,
        message: "Resource uploaded successfully".to_string(),
        pagination: None,
    }))
}

#[instrument(name = "List Resources", skip(pool, auth))]
#[get("")]
pub async fn list_resources(
    pool: web::Data<PgPool>,
    auth: JwtMiddleware,
    filters: web::Query<ResourceFilters>,
    mut pagination: web::Query<PaginationQuery>,
) -> Result<impl Responder, AppError> {
    let viewer = access::load_viewer(&pool, auth.user_id).await?;
    pagination.validate();

    let (items, total) = resources::list_resources(
        &pool,
        &viewer,
        &filters,
        pagination.per_page,
        pagination.offset(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: items,
        message: "Resources retrieved successfully".to_string(),
        pagination: Some(PaginationMeta::new(
            pagination.page,
            pagination.per_page,
            total,
        )),
    }))
}

#[instrument(name = "Get Resource", skip(pool, auth))]
#[get("/{resource_id}")]
pub async fn get_resource(
    pool: web::Data<PgPool>,
    auth: JwtMiddleware,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let viewer = access::load_viewer(&pool, auth.user_id).await?;
    let resource = resources::get_resource(&pool, &viewer, path.into_inner()).await?;

    // The stored mean keeps full precision; the detail payload carries
    // the one-decimal display form alongside it.
    let mut data = serde_json::to_value(&resource).map_err(AppError::internal_error)?;
    if let serde_json::Value::Object(ref mut fields) = data {
        fields.insert(
            "average_rating_display".to_string(),
            render_average_rating(resource.resource.average_rating).into(),
        );
    }

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data,
        message: "Resource retrieved successfully".to_string(),
        pagination: None,
    }))
}

#[instrument(name = "Delete Resource", skip(pool, auth))]
#[delete("/{resource_id}")]
pub async fn delete_resource(
    pool: web::Data<PgPool>,
    auth: JwtMiddleware,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let viewer = access::load_viewer(&pool, auth.user_id).await?;
    let resource = resources::soft_delete_resource(
        &pool,
        &viewer,
        path.into_inner(),
        auth.claims.is_moderator(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: serde_json::json!({ "id": resource.id }),
        message: "Resource deleted successfully".to_string(),
        pagination: None,
    }))
}

#[instrument(name = "Download Resource", skip(pool, store, auth))]
#[get("/{resource_id}/download")]
pub async fn download_resource(
    pool: web::Data<PgPool>,
    store: web::Data<BlobStore>,
    auth: JwtMiddleware,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let resource_id = path.into_inner();
    let viewer = access::load_viewer(&pool, auth.user_id).await?;

    let resource = resources::get_resource(&pool, &viewer, resource_id).await?;
    downloads::record_download(&pool, &viewer, resource_id).await?;

    let bytes = store.get_file(&resource.resource.file_path)?;

    tracing::info!("Resource {} downloaded by user {}", resource_id, viewer.id);

    Ok(HttpResponse::Ok()
        .content_type(resource.resource.mime_type.as_str())
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", resource.resource.file_name),
        ))
        .insert_header(("Content-Length", resource.resource.file_size.to_string()))
        .body(bytes))
}

#[instrument(name = "Get Download Stats", skip(pool, auth))]
#[get("/{resource_id}/download-stats")]
pub async fn get_download_stats(
    pool: web::Data<PgPool>,
    auth: JwtMiddleware,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let resource_id = path.into_inner();
    let viewer = access::load_viewer(&pool, auth.user_id).await?;
    access::visible_resource(&pool, &viewer, resource_id).await?;

    let stats = downloads::get_download_stats(&pool, resource_id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: stats,
        message: "Download stats retrieved successfully".to_string(),
        pagination: None,
    }))
}
