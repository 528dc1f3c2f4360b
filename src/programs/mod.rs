pub mod hijri;
pub mod lookup;
pub mod metadata;
pub mod permissions;
pub mod service;

pub use lookup::{is_valid_national_id, list_program_lookups, LookupEntry, ProgramLookup};
pub use metadata::{ProgramMetadata, ValidationErrors, TRAINER_TYPE};
pub use permissions::{has_program_lookup_access, has_studio_write_access};
pub use service::{get_program_metadata, update_program_metadata, PROGRAM_METADATA_KEY};
