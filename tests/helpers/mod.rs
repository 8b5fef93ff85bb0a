pub mod builders;
pub mod db;

pub use builders::{principal, RoleBuilder, UserBuilder};
pub use db::TestDb;
