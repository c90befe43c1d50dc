//! File answers, uploaded before the registration is submitted

use axum::extract::{Multipart, State};
use axum::Json;
use tracing::info;
use uuid::Uuid;
use crate::handlers::{parse_id, AppState};
use crate::middleware::CurrentUser;
use crate::services::StoredFile;
use crate::utils::errors::{CampusEventsError, Result};

struct UploadForm {
    event_id: Option<Uuid>,
    field_id: Option<Uuid>,
    file_name: String,
    content_type: Option<String>,
    data: Option<Vec<u8>>,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm> {
    let mut form = UploadForm {
        event_id: None,
        field_id: None,
        file_name: "upload".to_string(),
        content_type: None,
        data: None,
    };

    let invalid = |_| CampusEventsError::Validation("Invalid upload".to_string());
    while let Some(field) = multipart.next_field().await.map_err(invalid)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "event_id" => form.event_id = Some(parse_id(&field.text().await.map_err(invalid)?, "event_id")?),
            "field_id" => form.field_id = Some(parse_id(&field.text().await.map_err(invalid)?, "field_id")?),
            "file" => {
                if let Some(name) = field.file_name() {
                    form.file_name = name.to_string();
                }
                form.content_type = field.content_type().map(str::to_string);
                form.data = Some(field.bytes().await.map_err(invalid)?.to_vec());
            }
            _ => {}
        }
    }

    Ok(form)
}

pub async fn upload(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> Result<Json<StoredFile>> {
    let form = read_form(multipart).await?;

    let event_id = form
        .event_id
        .ok_or_else(|| CampusEventsError::Validation("Missing event_id".to_string()))?;
    let field_id = form
        .field_id
        .ok_or_else(|| CampusEventsError::Validation("Missing field_id".to_string()))?;
    let data = form
        .data
        .ok_or_else(|| CampusEventsError::Validation("Missing file".to_string()))?;

    let stored = state
        .services
        .registration
        .upload_answer_file(event_id, field_id, &form.file_name, form.content_type.as_deref(), data)
        .await?;

    info!(user_id = %user.id, event_id = %event_id, field_id = %field_id, path = %stored.path, "Registration file uploaded");
    Ok(Json(stored))
}
