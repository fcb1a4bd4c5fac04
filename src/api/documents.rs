use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::now;
use crate::auth::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::model::{
    document::{Document, DocumentCategory, NewDocument},
    role::ELEVATED,
};
use crate::storage::{Area, DOCUMENT_EXTS, FileStorage, PAYSLIP_EXTS, sanitize_filename};
use crate::store::Store;

#[derive(Debug, Deserialize, IntoParams)]
pub struct UploadDocumentQuery {
    /// Owner of the document
    pub user_id: u64,
    /// Original file name; its extension decides the allowed type
    pub filename: String,
    pub category: Option<DocumentCategory>,
    /// YYYY-MM-DD
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct UploadPayslipQuery {
    pub filename: String,
    /// Defaults to the uploader
    pub user_id: Option<u64>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchQuery {
    /// Substring of the file name
    pub q: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DocumentResponse {
    #[serde(flatten)]
    pub document: Document,
    pub is_expired: bool,
}

impl From<Document> for DocumentResponse {
    fn from(document: Document) -> Self {
        let is_expired = document.is_expired(now().date());
        Self {
            document,
            is_expired,
        }
    }
}

fn respond(docs: Vec<Document>) -> Vec<DocumentResponse> {
    docs.into_iter().map(DocumentResponse::from).collect()
}

/// Stores the bytes and records the document. The stored file is removed
/// again if the record cannot be written.
async fn store_document(
    store: &Store,
    storage: &FileStorage,
    owner_id: u64,
    filename: &str,
    category: DocumentCategory,
    expiry_date: Option<NaiveDate>,
    allowed: &[&str],
    body: &[u8],
) -> AppResult<Document> {
    store
        .users
        .find_by_id(owner_id)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    let stored_name = storage.save(Area::Documents, filename, allowed, body).await?;
    let created = store
        .documents
        .create(NewDocument {
            filename: sanitize_filename(filename),
            stored_name: stored_name.clone(),
            category,
            upload_date: now(),
            expiry_date,
            user_id: owner_id,
        })
        .await;

    match created {
        Ok(doc) => Ok(doc),
        Err(e) => {
            if let Err(cleanup) = storage.remove(Area::Documents, &stored_name).await {
                tracing::error!(error = %cleanup, stored_name = %stored_name, "Failed to remove orphaned upload");
            }
            Err(e)
        }
    }
}

/// Upload a document for any user. The request body is the raw file.
#[utoipa::path(
    post,
    path = "/api/documents",
    params(UploadDocumentQuery),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 201, description = "Document stored", body = DocumentResponse),
        (status = 400, description = "Empty, oversized or disallowed file"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Documents"
)]
pub async fn upload_document(
    auth: AuthUser,
    store: web::Data<Store>,
    storage: web::Data<FileStorage>,
    query: web::Query<UploadDocumentQuery>,
    body: web::Bytes,
) -> actix_web::Result<impl Responder> {
    auth.require(ELEVATED)?;

    let doc = store_document(
        &store,
        &storage,
        query.user_id,
        &query.filename,
        query.category.unwrap_or_default(),
        query.expiry_date,
        DOCUMENT_EXTS,
        &body,
    )
    .await?;

    tracing::info!(document_id = doc.id, user_id = doc.user_id, "Document uploaded");
    Ok(HttpResponse::Created().json(DocumentResponse::from(doc)))
}

#[utoipa::path(
    get,
    path = "/api/documents",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching documents", body = [DocumentResponse]),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Documents"
)]
pub async fn search_documents(
    auth: AuthUser,
    store: web::Data<Store>,
    query: web::Query<SearchQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require(ELEVATED)?;

    let q = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    let docs = store.documents.search(q).await?;
    Ok(HttpResponse::Ok().json(respond(docs)))
}

#[utoipa::path(
    get,
    path = "/api/documents/mine",
    responses((status = 200, description = "My documents, newest first", body = [DocumentResponse])),
    security(("bearer_auth" = [])),
    tag = "Documents"
)]
pub async fn my_documents(
    auth: AuthUser,
    store: web::Data<Store>,
) -> actix_web::Result<impl Responder> {
    let docs = store.documents.list_for_user(auth.user_id, None).await?;
    Ok(HttpResponse::Ok().json(respond(docs)))
}

#[utoipa::path(
    get,
    path = "/api/payslips/mine",
    responses((status = 200, description = "My payslips, newest first", body = [DocumentResponse])),
    security(("bearer_auth" = [])),
    tag = "Documents"
)]
pub async fn my_payslips(
    auth: AuthUser,
    store: web::Data<Store>,
) -> actix_web::Result<impl Responder> {
    let docs = store
        .documents
        .list_for_user(auth.user_id, Some(DocumentCategory::Payslip))
        .await?;
    Ok(HttpResponse::Ok().json(respond(docs)))
}

/// Upload a PDF payslip. The request body is the raw file.
#[utoipa::path(
    post,
    path = "/api/payslips",
    params(UploadPayslipQuery),
    request_body(content = Vec<u8>, content_type = "application/pdf"),
    responses(
        (status = 201, description = "Payslip stored", body = DocumentResponse),
        (status = 400, description = "Not a PDF or empty"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Documents"
)]
pub async fn upload_payslip(
    auth: AuthUser,
    store: web::Data<Store>,
    storage: web::Data<FileStorage>,
    query: web::Query<UploadPayslipQuery>,
    body: web::Bytes,
) -> actix_web::Result<impl Responder> {
    auth.require(ELEVATED)?;

    let owner_id = query.user_id.unwrap_or(auth.user_id);
    let doc = store_document(
        &store,
        &storage,
        owner_id,
        &query.filename,
        DocumentCategory::Payslip,
        None,
        PAYSLIP_EXTS,
        &body,
    )
    .await?;

    tracing::info!(document_id = doc.id, user_id = owner_id, "Payslip uploaded");
    Ok(HttpResponse::Created().json(DocumentResponse::from(doc)))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::Value;

    use crate::api::test_support::{TestCtx, get, post};
    use crate::model::role::Role;

    #[actix_web::test]
    async fn upload_search_and_list() {
        let ctx = TestCtx::new();
        let (_, manager) = ctx.user("mia", Role::Manager).await;
        let (emp, emp_token) = ctx.user("eve", Role::Employee).await;
        let app = test_app!(ctx);

        let uri = format!(
            "/api/documents?user_id={}&filename=Contract%202026.pdf&category=Contract&expiry_date=2000-01-01",
            emp.id
        );
        let req = post(&uri, &manager).set_payload("%PDF-1.4").to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(created["filename"], "Contract_2026.pdf");
        assert_eq!(created["category"], "Contract");
        assert_eq!(created["is_expired"], true);

        let stored = created["stored_name"].as_str().unwrap();
        assert!(ctx.dir.path().join("documents").join(stored).exists());

        let req = post("/api/payslips?filename=jan.pdf", &manager)
            .set_payload("%PDF-1.4")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
        let uri = format!("/api/payslips?filename=feb.pdf&user_id={}", emp.id);
        let req = post(&uri, &manager).set_payload("%PDF-1.4").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = get("/api/documents?q=Contract", &manager).to_request();
        let found: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(found.as_array().unwrap().len(), 1);

        let req = get("/api/documents/mine", &emp_token).to_request();
        let mine: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(mine.as_array().unwrap().len(), 2);

        let req = get("/api/payslips/mine", &emp_token).to_request();
        let payslips: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(payslips.as_array().unwrap().len(), 1);
        assert_eq!(payslips[0]["filename"], "feb.pdf");
    }

    #[actix_web::test]
    async fn rejects_disallowed_and_unauthorized_uploads() {
        let ctx = TestCtx::new();
        let (_, manager) = ctx.user("mia", Role::Manager).await;
        let (emp, emp_token) = ctx.user("eve", Role::Employee).await;
        let app = test_app!(ctx);

        let req = post("/api/payslips?filename=jan.docx", &manager)
            .set_payload("x")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let uri = format!("/api/documents?user_id={}&filename=a.exe", emp.id);
        let req = post(&uri, &manager).set_payload("x").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let uri = format!("/api/documents?user_id={}&filename=a.pdf", emp.id);
        let req = post(&uri, &emp_token).set_payload("x").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = post("/api/documents?user_id=999&filename=a.pdf", &manager)
            .set_payload("x")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }
}
