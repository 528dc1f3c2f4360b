pub mod lookup;
pub mod metadata;

pub use lookup::list as lookup_list;
pub use metadata::get as metadata_get;
pub use metadata::post as metadata_post;
