use crate::api;
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::stats::public_stats,
        api::auth::register,
        api::auth::login,
        api::auth::me,
        api::books::list_books,
        api::books::list_genres,
        api::books::get_book,
        api::books::recommendations,
        api::reviews::list_book_reviews,
        api::reviews::create_review,
        api::reviews::my_review,
        api::reviews::update_review,
        api::reviews::delete_review,
        api::reviews::my_reviews,
        api::reviews::admin_list_reviews,
        api::reviews::admin_delete_review,
        api::favorites::list_favorites,
        api::favorites::toggle_favorite,
        api::favorites::check_favorite,
        api::favorites::remove_favorite,
        api::favorites::statistics,
        api::favorites::admin_statistics,
        api::admin::dashboard,
        api::admin::book_statistics,
        api::admin::create_book,
        api::admin::update_book,
        api::admin::delete_book,
        api::google_books::search,
        api::google_books::download_cover,
    ),
    components(
        schemas(
            crate::models::book::Book,
            crate::models::book::BookInput,
            crate::models::review::Review,
            crate::models::review::ReviewUser,
            crate::models::review::ReviewBook,
            crate::modules::integrations::google_books::BookCandidate,
            crate::services::analytics_service::Dashboard,
            crate::services::analytics_service::Totals,
            crate::services::analytics_service::BookStatistics,
            crate::services::analytics_service::PublicStats,
            crate::services::analytics_service::UserFavoriteStatistics,
            crate::services::analytics_service::AdminFavoriteStatistics,
            crate::services::analytics_service::GenreCount,
            crate::services::analytics_service::YearCount,
            crate::services::analytics_service::RatingBucket,
            crate::services::analytics_service::DailyCount,
            crate::services::analytics_service::FavoritedBook,
            crate::services::analytics_service::UserCount,
            api::auth::RegisterRequest,
            api::auth::LoginRequest,
            api::google_books::DownloadCoverRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "bookify", description = "Bookify catalog API")
    )
)]
pub struct ApiDoc;
