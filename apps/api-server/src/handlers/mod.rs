//! HTTP handlers and route configuration.

mod comments;
mod content;
mod health;

use actix_web::web;
use commentary_core::throttle::{RequestContext, ThrottleChain};

use crate::middleware::error::{AppError, AppResult};

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            // Comments
            .service(
                web::scope("/comments")
                    .route("", web::get().to(comments::list))
                    .route("", web::post().to(comments::create))
                    .route("/{id}", web::get().to(comments::retrieve))
                    .route("/{id}", web::put().to(comments::update))
                    .route("/{id}", web::patch().to(comments::partial_update))
                    .route("/{id}", web::delete().to(comments::destroy)),
            )
            // Content
            .service(
                web::scope("/content")
                    .route("", web::get().to(content::list))
                    .route("", web::post().to(content::create))
                    .route("/{slug}", web::get().to(content::retrieve))
                    .route("/{slug}", web::put().to(content::update))
                    .route("/{slug}", web::patch().to(content::partial_update))
                    .route("/{slug}", web::delete().to(content::destroy)),
            ),
    );
}

/// JSON body whose parse failure is held back until the throttles have run.
type Body<T> = Result<web::Json<T>, actix_web::Error>;

/// Run the chain and turn a denial into a 429.
async fn enforce(chain: &ThrottleChain, ctx: RequestContext<'_>) -> AppResult<()> {
    let decision = chain.check(&ctx).await;
    if decision.is_allowed() {
        Ok(())
    } else {
        Err(AppError::Throttled {
            wait: decision.wait(),
        })
    }
}

fn parsed<T>(body: Body<T>) -> AppResult<T> {
    body.map(web::Json::into_inner)
        .map_err(|e| AppError::BadRequest(e.to_string()))
}
