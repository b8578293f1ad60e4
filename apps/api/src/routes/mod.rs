pub mod health;
pub mod pagination;
pub mod resources;

use axum::{routing::get, Router};

use crate::errors::AppError;
use crate::models::{Company, Education, PreviousJob, Project, Resume, Skill};
use crate::state::AppState;
use crate::store::Stored;

async fn route_not_found() -> AppError {
    AppError::NotFound("No route matches the request".to_string())
}

/// Mounts the collection and item routes for one entity.
fn resource<E: Stored>(router: Router<AppState>, collection: &str) -> Router<AppState> {
    router
        .route(
            &format!("/{collection}/"),
            get(resources::list::<E>).post(resources::create::<E>),
        )
        .route(
            &format!("/{collection}/:id/"),
            get(resources::retrieve::<E>)
                .put(resources::update::<E>)
                .patch(resources::partial_update::<E>)
                .delete(resources::destroy::<E>),
        )
}

pub fn build_router(state: AppState) -> Router {
    let router = Router::new().route("/health", get(health::health_handler));
    let router = resource::<Resume>(router, "resumes");
    let router = resource::<Skill>(router, "skills");
    let router = resource::<Education>(router, "educations");
    let router = resource::<Project>(router, "projects");
    let router = resource::<PreviousJob>(router, "previousjobs");
    let router = resource::<Company>(router, "companies");
    router.fallback(route_not_found).with_state(state)
}
