//! Backend contracts.
//!
//! A backend plugs into a [`crate::Database`] through an [`Extension`],
//! which hands out a [`DaoFactory`]. The factory produces record-level
//! [`RecordDao`]s; callers use the typed [`Dao`] wrapper.

mod dao;
mod extension;
mod factory;

pub use dao::{Dao, RecordDao};
pub(crate) use extension::ExtensionRules;
pub use extension::Extension;
pub use factory::DaoFactory;
