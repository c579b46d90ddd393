/// Search handlers
use crate::error::Result;
use crate::services::search;
use crate::AppState;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct SearchRequest {
    #[validate(length(min = 1, max = 500, message = "input must be 1-500 characters"))]
    pub input: String,
}

impl SearchRequest {
    fn checked(&self) -> Result<&str> {
        self.validate()?;
        let input = self.input.trim();
        if input.is_empty() {
            return Err(crate::AppError::ValidationError("input is required".to_string()));
        }
        Ok(input)
    }
}

/// Spell-correct the query through the model, then search everything
pub async fn search_with_ai(
    state: web::Data<AppState>,
    req: web::Json<SearchRequest>,
) -> Result<HttpResponse> {
    let input = req.checked()?;
    let keyword = search::resolve_keyword(state.ai.as_ref(), input).await;
    let results = search::search_all(&state.db, &keyword).await?;
    Ok(HttpResponse::Ok().json(results))
}

/// Classify the query into a category and list what belongs to it
pub async fn filter_by_category(
    state: web::Data<AppState>,
    req: web::Json<SearchRequest>,
) -> Result<HttpResponse> {
    let input = req.checked()?;
    match search::resolve_category(state.ai.as_ref(), input).await {
        Some(category) => {
            let results = search::category_content(&state.db, category).await?;
            Ok(HttpResponse::Ok().json(results))
        }
        None => Ok(HttpResponse::Ok().json(serde_json::json!({
            "category": null,
            "channels": [],
            "videos": [],
            "shorts": [],
        }))),
    }
}
