pub mod collation;

pub use collation::{
    collate, collate_with_identities, collate_with_identities_and_options, collate_with_options,
    CollateOutput, Collation, Submissions,
};
