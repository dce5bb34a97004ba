//! Fix-ups for known-bad map entity lumps.
//!
//! `entfix-gen` diffs `old/` against `new/` entity files at build time and
//! writes a Rust table of Add/Copy/Run edit scripts. At run time
//! [`FixTable::apply`] rebuilds the corrected lump when the map name, size
//! and checksum of a loaded lump match an entry exactly.

pub mod apply;
pub mod binary_diff;
pub mod checksum;
pub mod create;
pub mod error;
pub mod literal_pool;
pub mod patch_format;
pub mod render;
pub mod rolling_hash;
pub mod util;

pub use apply::map_base_name;
pub use checksum::crc_block;
pub use error::IntegrityError;
pub use patch_format::{concat_literals, EfFix, EfOp, EfPatch, FixTable};
