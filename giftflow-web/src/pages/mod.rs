pub mod admin;
pub mod landing;
pub mod message;
pub mod not_found;
pub mod outfits;
pub mod places;
pub mod puzzle;
pub mod summary;
