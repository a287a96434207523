//! # entiorm Serial
//!
//! Reference backend for entiorm.
//!
//! Entity tables are held in memory while a database is started and saved
//! as a single CBOR snapshot, `<directory>/<name>.ser`, when it stops. The
//! next start of a database with the same name loads that snapshot back.
//!
//! ## Example
//!
//! ```
//! use entiorm_core::{entity, DatabaseBuilder};
//! use entiorm_serial::{SerialConfig, SerialDatabaseBuilder};
//!
//! entity! {
//!     #[derive(Debug, Default, PartialEq)]
//!     struct Task as "tasks" {
//!         #[key]
//!         id: i64,
//!         title: String,
//!         done: bool,
//!     }
//! }
//!
//! let db = SerialDatabaseBuilder::create("todo", 1)
//!     .unwrap()
//!     .with_config(SerialConfig::in_memory())
//!     .with_credentials("user", "password")
//!     .build()
//!     .unwrap();
//!
//! let tasks = db.dao::<Task, i64>().unwrap();
//! tasks.create(&Task { id: 1, title: "write docs".into(), done: false }).unwrap();
//! assert_eq!(tasks.retrieve(&1).unwrap().unwrap().title, "write docs");
//! db.close().unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod config;
mod dao;
mod extension;
mod factory;
mod store;

pub use builder::SerialDatabaseBuilder;
pub use config::{SerialConfig, StorageMode};
pub use dao::SerialDao;
pub use extension::{SerialExtension, SNAPSHOT_EXTENSION};
pub use factory::SerialDaoFactory;
