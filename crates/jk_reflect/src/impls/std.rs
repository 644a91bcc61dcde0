//! Standard types without reflected structure.
//!
//! The `builtin` feature registers codecs for them and adds `uuid::Uuid`
//! and the `chrono` date-times, see `codec::builtin`.

use core::time::Duration;
use std::path::PathBuf;

crate::impl_opaque!(char);
crate::impl_opaque!(Duration);
crate::impl_opaque!(PathBuf);

#[cfg(feature = "builtin")]
mod builtin {
    use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
    use uuid::Uuid;

    crate::impl_opaque!(Uuid);
    crate::impl_opaque!(DateTime<Utc>);
    crate::impl_opaque!(DateTime<FixedOffset>);
    crate::impl_opaque!(NaiveDateTime);
}
