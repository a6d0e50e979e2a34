mod client;
mod key;
mod thumbnail;

pub use client::{OssClient, UploadedImage, is_remote};
pub use key::{Clock, FixedClock, SystemClock, derive_key, name_from_url};
pub use thumbnail::half_size_png;
