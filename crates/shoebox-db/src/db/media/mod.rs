pub mod album;
pub mod asset;
pub mod photo;

pub use album::AlbumRepository;
pub use asset::AssetRepository;
pub use photo::PhotoRepository;
