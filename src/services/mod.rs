pub mod admin_service;
pub mod book_service;
pub mod image_service;
pub mod order_service;
