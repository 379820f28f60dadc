use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::presentation::handlers::ListQuery;
use crate::presentation::handlers::auth::{
    SignupDto, SignupResponseDto, TokenRequestDto, TokenResponseDto,
};
use crate::presentation::handlers::categories::{
    CategoryDto, CreateCategoryDto, ListCategoriesResponseDto,
};
use crate::presentation::handlers::comments::{
    CommentDto, CreateCommentDto, ListCommentsResponseDto, UpdateCommentDto,
};
use crate::presentation::handlers::genres::{CreateGenreDto, GenreDto, ListGenresResponseDto};
use crate::presentation::handlers::reviews::{
    CreateReviewDto, ListReviewsResponseDto, ReviewDto, UpdateReviewDto,
};
use crate::presentation::handlers::titles::{
    CreateTitleDto, ListTitlesResponseDto, TitleDto, TitleListQuery, UpdateTitleDto,
};
use crate::presentation::handlers::users::{
    CreateUserDto, ListUsersResponseDto, UpdateMeDto, UpdateUserDto, UserDto,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::handlers::auth::signup,
        crate::presentation::handlers::auth::token,
        crate::presentation::handlers::users::list_users,
        crate::presentation::handlers::users::create_user,
        crate::presentation::handlers::users::me,
        crate::presentation::handlers::users::update_me,
        crate::presentation::handlers::users::get_user,
        crate::presentation::handlers::users::update_user,
        crate::presentation::handlers::users::delete_user,
        crate::presentation::handlers::categories::list_categories,
        crate::presentation::handlers::categories::create_category,
        crate::presentation::handlers::categories::delete_category,
        crate::presentation::handlers::genres::list_genres,
        crate::presentation::handlers::genres::create_genre,
        crate::presentation::handlers::genres::delete_genre,
        crate::presentation::handlers::titles::list_titles,
        crate::presentation::handlers::titles::get_title,
        crate::presentation::handlers::titles::create_title,
        crate::presentation::handlers::titles::update_title,
        crate::presentation::handlers::titles::delete_title,
        crate::presentation::handlers::reviews::list_reviews,
        crate::presentation::handlers::reviews::create_review,
        crate::presentation::handlers::reviews::get_review,
        crate::presentation::handlers::reviews::update_review,
        crate::presentation::handlers::reviews::delete_review,
        crate::presentation::handlers::comments::list_comments,
        crate::presentation::handlers::comments::create_comment,
        crate::presentation::handlers::comments::get_comment,
        crate::presentation::handlers::comments::update_comment,
        crate::presentation::handlers::comments::delete_comment
    ),
    components(
        schemas(
            SignupDto,
            SignupResponseDto,
            TokenRequestDto,
            TokenResponseDto,
            UserDto,
            CreateUserDto,
            UpdateUserDto,
            UpdateMeDto,
            ListUsersResponseDto,
            CategoryDto,
            CreateCategoryDto,
            ListCategoriesResponseDto,
            GenreDto,
            CreateGenreDto,
            ListGenresResponseDto,
            TitleDto,
            CreateTitleDto,
            UpdateTitleDto,
            TitleListQuery,
            ListTitlesResponseDto,
            ReviewDto,
            CreateReviewDto,
            UpdateReviewDto,
            ListReviewsResponseDto,
            CommentDto,
            CreateCommentDto,
            UpdateCommentDto,
            ListCommentsResponseDto,
            ListQuery
        )
    ),
    tags(
        (name = "auth", description = "Signup and confirmation-code token exchange"),
        (name = "users", description = "User administration and self-service profile"),
        (name = "categories", description = "Category catalog"),
        (name = "genres", description = "Genre catalog"),
        (name = "titles", description = "Reviewable titles"),
        (name = "reviews", description = "Reviews on titles"),
        (name = "comments", description = "Comments on reviews")
    ),
    modifiers(&SecurityAddon)
)]
pub(crate) struct ApiDoc;

pub(crate) struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let mut components = openapi.components.take().unwrap_or_default();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        openapi.components = Some(components);
    }
}
