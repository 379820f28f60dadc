pub(crate) mod catalog_repository;
pub(crate) mod feedback_repository;
pub(crate) mod repositories;
pub(crate) mod user_repository;

#[derive(Debug, Clone, Copy)]
pub(crate) struct Pagination {
    pub(crate) limit: u32,
    pub(crate) offset: u32,
}
