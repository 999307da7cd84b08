use actix_web::{get, post, web, HttpResponse, Result as WebResult};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::ai::models::GenerateRequest;
use crate::ai::{AiError, ArticleGenerator};
use crate::api::models::{
    AnalyzeRequest, AnalyzeResponse, ArticleResponse, ConversationResponse, PaginationQuery,
    UnreadCountResponse,
};
use crate::db::{service::DbService, DbPool, User};

fn ai_error_response(err: AiError) -> HttpResponse {
    let body = json!({
        "success": false,
        "error": err.kind(),
        "message": err.to_string(),
    });

    match err {
        AiError::Validation(_) => HttpResponse::BadRequest().json(body),
        AiError::StaleSession => HttpResponse::Gone().json(body),
        AiError::BackendUnavailable => HttpResponse::ServiceUnavailable().json(body),
        AiError::MalformedOutput(_) => HttpResponse::BadGateway().json(body),
    }
}

// --- AI writing flow ---

#[post("/ai/analyze")]
pub async fn analyze_prompt(
    generator: web::Data<Arc<ArticleGenerator>>,
    req: web::Json<AnalyzeRequest>,
) -> WebResult<HttpResponse> {
    match generator.analyze(&req.user_input).await {
        Ok(analysis) => Ok(HttpResponse::Ok().json(AnalyzeResponse {
            success: true,
            analysis,
        })),
        Err(e) => Ok(ai_error_response(e)),
    }
}

#[post("/ai/generate")]
pub async fn generate_article(
    generator: web::Data<Arc<ArticleGenerator>>,
    req: web::Json<GenerateRequest>,
) -> WebResult<HttpResponse> {
    match generator.generate(&req).await {
        Ok(article) => Ok(HttpResponse::Ok().json(ArticleResponse {
            success: true,
            article,
        })),
        Err(e) => Ok(ai_error_response(e)),
    }
}

#[post("/ai/regenerate")]
pub async fn regenerate_article(
    generator: web::Data<Arc<ArticleGenerator>>,
    req: web::Json<GenerateRequest>,
) -> WebResult<HttpResponse> {
    match generator.regenerate(&req).await {
        Ok(article) => Ok(HttpResponse::Ok().json(ArticleResponse {
            success: true,
            article,
        })),
        Err(e) => Ok(ai_error_response(e)),
    }
}

// --- Message history (how offline receivers catch up) ---

#[get("/messages/unread/count")]
pub async fn unread_count(
    pool: web::Data<DbPool>,
    user: web::ReqData<User>,
) -> WebResult<HttpResponse> {
    let conn = pool.lock().unwrap();

    match DbService::unread_count(&conn, user.id) {
        Ok(count) => Ok(HttpResponse::Ok().json(UnreadCountResponse {
            success: true,
            count,
        })),
        Err(e) => Ok(HttpResponse::InternalServerError().body(e.to_string())),
    }
}

#[get("/messages/{user_id}")]
pub async fn conversation(
    pool: web::Data<DbPool>,
    user: web::ReqData<User>,
    other_id: web::Path<Uuid>,
    query: web::Query<PaginationQuery>,
) -> WebResult<HttpResponse> {
    let conn = pool.lock().unwrap();
    let other_id = other_id.into_inner();

    let messages = match DbService::conversation(&conn, user.id, other_id, query.limit, query.offset)
    {
        Ok(messages) => messages,
        Err(e) => return Ok(HttpResponse::InternalServerError().body(e.to_string())),
    };

    match DbService::conversation_total(&conn, user.id, other_id) {
        Ok(total) => Ok(HttpResponse::Ok().json(ConversationResponse {
            success: true,
            messages,
            total,
        })),
        Err(e) => Ok(HttpResponse::InternalServerError().body(e.to_string())),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(analyze_prompt)
            .service(generate_article)
            .service(regenerate_article)
            .service(unread_count)
            .service(conversation),
    );
}
