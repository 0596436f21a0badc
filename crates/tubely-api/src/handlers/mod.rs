pub mod health;
pub mod media;
pub mod thumbnail_upload;
pub mod video_upload;
pub mod videos;
