//! Value types shared by the store, the registry and the backends.

mod key_filter;
mod listing_page;
mod object_location;
mod presigned_url;
mod region;
mod stored_object;

pub use key_filter::{KeyFilter, SUBMISSION_MARKER};
pub use listing_page::ListingPage;
pub use object_location::ObjectLocation;
pub use presigned_url::PresignedUrl;
pub use region::{Bucket, Region};
pub use stored_object::{PutOptions, StoredObject};
